//! Node-side support crate for the DINFox bus
//!
//! Provides the compact value encodings used in DINFox registers, the
//! register field access protocol, and the controller of the GPSM node, which
//! serves time fixes, position fixes and the timepulse output of a GPS
//! receiver.
//!
//! The recommended way to run a node is the [high-level interface]. If you
//! only need to read or write register fields, you can use the
//! [register-level interface] instead. The [`dinfox`] module holds the value
//! codec shared by every node type.
//!
//! Hardware access goes through small traits ([`gps::Gps`],
//! [`power::PowerControl`], [`analog::AnalogFrontEnd`]) so the crate is
//! portable and can be tested on the host. A [`power::GpioPowerSwitch`] built
//! on [`embedded-hal`] output pins is provided.
//!
//! [high-level interface]: hl/index.html
//! [register-level interface]: ll/index.html
//! [`embedded-hal`]: https://crates.io/crates/embedded-hal
#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod analog;
pub mod configs;
pub mod dinfox;
pub mod gps;
pub mod hl;
pub mod ll;
pub mod power;

/// Redirection of nb::block
pub mod block {
    pub use nb::block;
}

pub use crate::{
    block::block,
    configs::Config,
    hl::{Error, ErrorStack, FixKind, FixState, Flags, Gpsm, Ready, Uninitialized},
};
