use core::fmt;
use core::fmt::{Display, Formatter};

use heapless::Deque;

#[cfg(feature = "defmt")]
use defmt::Format;

use crate::{analog, gps, ll, power};

/// Depth of the error stack
pub const ERROR_STACK_DEPTH: usize = 32;

/// An error that can occur while handling a node request
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub enum Error {
    /// Error occured while accessing the registers
    Register(ll::Error),

    /// The GPS receiver failed
    Gps(gps::Error),

    /// A power domain could not be switched
    Power(power::Error),

    /// An analog conversion failed
    Analog(analog::Error),

    /// The GPS power is governed by the power enable bit, which is cleared
    RadioPower,

    /// The board has no GPS
    UnsupportedBoard(u8),
}

impl Error {
    /// Code published in the ERROR_STACK register
    ///
    /// The high byte identifies the source, the low byte the detail.
    pub fn code(&self) -> u16 {
        let (source, detail) = match *self {
            Error::Register(ll::Error::UnknownAddress(addr)) => (0x01, addr),
            Error::Register(ll::Error::ReadOnly(addr)) => (0x02, addr),
            Error::Register(ll::Error::Bus(code)) => (0x03, code),
            Error::Gps(gps::Error::Timeout) => (0x10, 0x00),
            Error::Gps(gps::Error::Checksum) => (0x10, 0x01),
            Error::Gps(gps::Error::Format) => (0x10, 0x02),
            Error::Gps(gps::Error::Device(code)) => (0x11, code),
            Error::Power(power::Error::Domain) => (0x20, 0x00),
            Error::Power(power::Error::Switch) => (0x20, 0x01),
            Error::Analog(analog::Error::Channel) => (0x30, 0x00),
            Error::Analog(analog::Error::Conversion) => (0x30, 0x01),
            Error::RadioPower => (0x40, 0x00),
            Error::UnsupportedBoard(id) => (0x41, id),
        };

        ((source as u16) << 8) | detail as u16
    }
}

impl From<ll::Error> for Error {
    fn from(error: ll::Error) -> Self {
        Error::Register(error)
    }
}

impl From<gps::Error> for Error {
    fn from(error: gps::Error) -> Self {
        Error::Gps(error)
    }
}

impl From<power::Error> for Error {
    fn from(error: power::Error) -> Self {
        Error::Power(error)
    }
}

impl From<analog::Error> for Error {
    fn from(error: analog::Error) -> Self {
        Error::Analog(error)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::Register(error) => write!(f, "register: {}", error),
            Error::Gps(error) => write!(f, "gps: {}", error),
            Error::Power(error) => write!(f, "power: {}", error),
            Error::Analog(error) => write!(f, "analog: {}", error),
            Error::RadioPower => write!(f, "gps power disabled in static mode"),
            Error::UnsupportedBoard(id) => write!(f, "board {} has no gps", id),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Errors recorded while handling requests, for later inspection
///
/// Operations that must not abort a request (publishing fields, powering
/// down) record their failures here. When full, the oldest entry is dropped.
#[derive(Clone, Debug, Default)]
pub struct ErrorStack {
    errors: Deque<Error, ERROR_STACK_DEPTH>,
}

impl ErrorStack {
    /// Create an empty stack
    pub const fn new() -> Self {
        ErrorStack {
            errors: Deque::new(),
        }
    }

    /// Record an error
    pub fn stack(&mut self, error: Error) {
        log::warn!("stacking error {} (0x{:04x})", error, error.code());

        if self.errors.is_full() {
            self.errors.pop_front();
        }

        // Can't fail, there is room after the check above.
        let _ = self.errors.push_back(error);
    }

    /// Remove and return the oldest error
    pub fn pop(&mut self) -> Option<Error> {
        self.errors.pop_front()
    }

    /// Number of recorded errors
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether no error is recorded
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Iterate over the recorded errors, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Error> {
        self.errors.iter()
    }

    /// Drop every recorded error
    pub fn clear(&mut self) {
        self.errors.clear();
    }
}
