//! GPS receiver abstraction
//!
//! The receiver driver (UART, NMEA parsing, power sequencing) lives outside of
//! this crate. The controller only needs the blocking acquisition primitives
//! and the timepulse configuration defined by [`Gps`].

use core::fmt;

#[cfg(feature = "defmt")]
use defmt::Format;

/// Base of the years published in the time registers
pub const YEAR_BASE: u16 = 2000;

/// Date and time of day, UTC
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GpsTime {
    /// Full year, e.g. 2024
    pub year: u16,
    /// Month, 1 to 12
    pub month: u8,
    /// Day of month, 1 to 31
    pub date: u8,
    /// Hours, 0 to 23
    pub hours: u8,
    /// Minutes, 0 to 59
    pub minutes: u8,
    /// Seconds, 0 to 59
    pub seconds: u8,
}

/// Geographic position
///
/// Angles are split in degrees, arc minutes and thousandths of arc second,
/// the way they are published in the position registers.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    /// Latitude degrees, 0 to 90
    pub lat_degrees: u8,
    /// Latitude arc minutes, 0 to 59
    pub lat_minutes: u8,
    /// Latitude thousandths of arc second, 0 to 59999
    pub lat_seconds: u32,
    /// Northern hemisphere
    pub lat_north: bool,
    /// Longitude degrees, 0 to 180
    pub long_degrees: u8,
    /// Longitude arc minutes, 0 to 59
    pub long_minutes: u8,
    /// Longitude thousandths of arc second, 0 to 59999
    pub long_seconds: u32,
    /// Eastern hemisphere
    pub long_east: bool,
    /// Altitude in metres
    pub altitude: u32,
}

/// Result of a successful acquisition
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub struct Fix<T> {
    /// The acquired value
    pub value: T,
    /// Time it took to get the fix, in seconds
    pub duration: u32,
}

/// Timepulse output settings
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimepulseConfig {
    /// Output the pulse or keep the pin idle
    pub active: bool,
    /// Pulse frequency in Hz
    pub frequency_hz: u32,
    /// High time in percent of the period
    pub duty_cycle_percent: u8,
}

impl Default for TimepulseConfig {
    fn default() -> Self {
        TimepulseConfig {
            active: false,
            frequency_hz: 10_000_000,
            duty_cycle_percent: 50,
        }
    }
}

/// An error reported by the GPS receiver
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub enum Error {
    /// No fix within the allowed time
    Timeout,

    /// A sentence failed its checksum
    Checksum,

    /// A sentence could not be parsed
    Format,

    /// Receiver specific failure code
    Device(u8),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Timeout => write!(f, "fix timeout"),
            Error::Checksum => write!(f, "sentence checksum error"),
            Error::Format => write!(f, "sentence format error"),
            Error::Device(code) => write!(f, "receiver error {}", code),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// GPS receiver driver
///
/// Acquisition methods block until a fix is found or `timeout_seconds`
/// elapsed, in which case they return [`Error::Timeout`]. The receiver must be
/// powered by the caller.
pub trait Gps {
    /// Wait for a time fix
    fn get_time(&mut self, timeout_seconds: u32) -> Result<Fix<GpsTime>, Error>;

    /// Wait for a position fix
    fn get_position(&mut self, timeout_seconds: u32) -> Result<Fix<Position>, Error>;

    /// Apply the timepulse output settings
    fn configure_timepulse(&mut self, config: &TimepulseConfig) -> Result<(), Error>;

    /// Enable or disable the receiver backup supply
    fn set_backup(&mut self, enable: bool) -> Result<(), Error>;

    /// Returns the state of the receiver backup supply
    fn get_backup(&mut self) -> Result<bool, Error>;
}
