//! Analog front-end abstraction
//!
//! Conversions are started and polled through non-blocking `nb` primitives;
//! the controller drives them to completion with [`nb::block!`].

use core::fmt;

#[cfg(feature = "defmt")]
use defmt::Format;

/// Analog inputs sampled on a measurement trigger
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub enum AnalogChannel {
    /// MCU supply voltage
    Vmcu,
    /// GPS receiver supply voltage
    Vgps,
    /// Active antenna supply voltage
    Vant,
}

/// An error that can occur during a conversion
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub enum Error {
    /// The channel isn't wired on this board
    Channel,

    /// The converter reported a failure
    Conversion,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Channel => write!(f, "invalid analog channel"),
            Error::Conversion => write!(f, "analog conversion failure"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Converter with calibrated outputs
///
/// Returns [`nb::Error::WouldBlock`] while a conversion is in progress.
pub trait AnalogFrontEnd {
    /// Voltage of `channel` in millivolts, divider ratio applied
    fn voltage_mv(&mut self, channel: AnalogChannel) -> nb::Result<u32, Error>;

    /// MCU die temperature in degrees Celsius
    fn temperature(&mut self) -> nb::Result<i8, Error>;
}
