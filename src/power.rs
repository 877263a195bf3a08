//! Board power domains
//!
//! Subsystems like the GPS receiver or the analog front-end sit behind their
//! own supply switch. [`PowerControl`] turns them on and off, the controller
//! tracks which state it last applied.

use core::fmt;

use embedded_hal::digital::OutputPin;

#[cfg(feature = "defmt")]
use defmt::Format;

/// A switchable supply domain of the board
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PowerDomain {
    /// Voltage dividers and references of the ADC inputs
    Analog,
    /// GPS receiver and active antenna
    Gps,
    /// Radio front-end
    Radio,
}

/// An error that can occur while switching a power domain
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub enum Error {
    /// The domain doesn't exist on this board
    Domain,

    /// The supply switch could not be driven
    Switch,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Domain => write!(f, "invalid power domain"),
            Error::Switch => write!(f, "power switch failure"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Switches power domains on and off
pub trait PowerControl {
    /// Power the domain on
    fn enable(&mut self, domain: PowerDomain) -> Result<(), Error>;

    /// Power the domain off
    fn disable(&mut self, domain: PowerDomain) -> Result<(), Error>;
}

/// Power switch driven by GPIO enable pins
///
/// Each supported domain has its own active-high enable pin. Requests for a
/// domain without a pin fail with [`Error::Domain`].
pub struct GpioPowerSwitch<ANALOG, GPS> {
    analog: ANALOG,
    gps: GPS,
}

impl<ANALOG, GPS> GpioPowerSwitch<ANALOG, GPS>
where
    ANALOG: OutputPin,
    GPS: OutputPin,
{
    /// Create the switch from the enable pins
    pub fn new(analog: ANALOG, gps: GPS) -> Self {
        GpioPowerSwitch { analog, gps }
    }

    /// Release the enable pins
    pub fn release(self) -> (ANALOG, GPS) {
        (self.analog, self.gps)
    }

    fn set(&mut self, domain: PowerDomain, on: bool) -> Result<(), Error> {
        match (domain, on) {
            (PowerDomain::Analog, true) => self.analog.set_high().map_err(|_| Error::Switch),
            (PowerDomain::Analog, false) => self.analog.set_low().map_err(|_| Error::Switch),
            (PowerDomain::Gps, true) => self.gps.set_high().map_err(|_| Error::Switch),
            (PowerDomain::Gps, false) => self.gps.set_low().map_err(|_| Error::Switch),
            (PowerDomain::Radio, _) => Err(Error::Domain),
        }
    }
}

impl<ANALOG, GPS> PowerControl for GpioPowerSwitch<ANALOG, GPS>
where
    ANALOG: OutputPin,
    GPS: OutputPin,
{
    fn enable(&mut self, domain: PowerDomain) -> Result<(), Error> {
        self.set(domain, true)
    }

    fn disable(&mut self, domain: PowerDomain) -> Result<(), Error> {
        self.set(domain, false)
    }
}
