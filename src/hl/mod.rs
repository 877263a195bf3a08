//! High-level interface to a GPSM node
//!
//! The entry point to this API is the [Gpsm] struct. Please refer to the
//! documentation there for more details.
//!
//! This module implements the node logic on top of the [register-level
//! interface]: control bits written by the bus trigger time fixes, position
//! fixes, analog measurements and timepulse changes, and the results are
//! published back in the registers.
//!
//! [register-level interface]: ../ll/index.html

use core::fmt;

pub use error::*;
pub use fix::*;
#[allow(unused_imports)]
pub use measure::*;
#[allow(unused_imports)]
pub use power::*;
#[allow(unused_imports)]
pub use ready::*;
#[allow(unused_imports)]
pub use timepulse::*;
#[allow(unused_imports)]
pub use uninitialized::*;

use crate::{configs::PowerMode, ll};

mod error;
mod fix;
mod measure;
#[cfg(test)]
mod mock;
mod power;
mod ready;
mod timepulse;
mod uninitialized;

/// Entry point to the GPSM controller API
///
/// Owns the register store (`BUS`), the GPS receiver (`GPS`), the power
/// switches (`PWR`) and the analog front-end (`ADC`). A new instance starts
/// [`Uninitialized`]; [`Gpsm::init`] publishes the default configuration and
/// returns a [`Ready`] controller.
pub struct Gpsm<BUS, GPS, PWR, ADC, State> {
    ll: ll::Node<BUS>,
    gps: GPS,
    power: PWR,
    adc: ADC,
    flags: Flags,
    errors: ErrorStack,
    fix_state: FixState,
    last_fix_outcome: FixState,
    state: State,
}

// Can't be derived without putting requirements on the collaborators.
impl<BUS, GPS, PWR, ADC, State> fmt::Debug for Gpsm<BUS, GPS, PWR, ADC, State>
where
    State: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Gpsm {{ state: ")?;
        self.state.fmt(f)?;
        write!(f, ", flags: {:?}, .. }}", self.flags)?;

        Ok(())
    }
}

/// Configuration last applied to the hardware
///
/// Compared against the control register to skip redundant transitions.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Flags {
    /// The GPS domain is powered
    pub power: bool,
    /// The timepulse output is running
    pub timepulse: bool,
    /// Current power mode
    pub power_mode: PowerMode,
    /// Mirror of the power enable bit
    pub power_enable: bool,
    /// The backup supply is enabled
    pub backup: bool,
}

/// Indicates that the `Gpsm` instance is not initialized yet
#[derive(Copy, Clone, Debug)]
pub struct Uninitialized;

/// Indicates that the `Gpsm` instance is ready to serve bus requests
#[derive(Copy, Clone, Debug)]
pub struct Ready;
