//! Register-level interface to a DINFox node
//!
//! This module implements the register field access protocol: a node exposes
//! a map of 32-bit registers, each one split into named fields given by a
//! mask. Fields are read and written without disturbing their siblings.
//!
//! The register store itself is an external collaborator, abstracted by
//! [`RegisterBus`]. [`RegisterFile`] is the RAM-backed store a node firmware
//! uses to hold its own registers.
//!
//! Users of this library should typically go through the [high-level
//! interface], which keeps the registers consistent with the controller state.
//!
//! **NOTE**: Field write methods accept types that may have more bits than the
//! field. Values that are too large are silently truncated.
//!
//! [high-level interface]: ../hl/index.html

use core::{fmt, marker::PhantomData};

#[cfg(feature = "defmt")]
use defmt::Format;

use crate::dinfox;

/// Register store of a node
///
/// Implemented by whatever holds the registers: the node's own RAM, or a
/// transport reaching a remote node.
pub trait RegisterBus {
    /// Read the full register at `addr`
    fn read_register(&mut self, addr: u8) -> Result<u32, Error>;

    /// Write the bits of `value` selected by `mask` to the register at `addr`
    ///
    /// Bits outside `mask` must be preserved.
    fn write_register(&mut self, addr: u8, mask: u32, value: u32) -> Result<(), Error>;
}

impl<T> RegisterBus for &mut T
where
    T: RegisterBus + ?Sized,
{
    fn read_register(&mut self, addr: u8) -> Result<u32, Error> {
        (**self).read_register(addr)
    }

    fn write_register(&mut self, addr: u8, mask: u32, value: u32) -> Result<(), Error> {
        (**self).write_register(addr, mask, value)
    }
}

/// An error that can occur when accessing the registers of a node
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub enum Error {
    /// No register at this address
    UnknownAddress(u8),

    /// The register can't be written from the bus
    ReadOnly(u8),

    /// The transport to the register store failed, with a transport specific
    /// code
    Bus(u8),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnknownAddress(addr) => write!(f, "unknown register address 0x{:02x}", addr),
            Error::ReadOnly(addr) => write!(f, "register 0x{:02x} is read-only", addr),
            Error::Bus(code) => write!(f, "register bus error {}", code),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Entry point to the register-level API
///
/// Please consider using [hl::Gpsm] instead.
///
/// [hl::Gpsm]: ../hl/struct.Gpsm.html
#[derive(Copy, Clone, Debug)]
pub struct Node<BUS> {
    bus: BUS,
}

impl<BUS> Node<BUS> {
    /// Create a new instance of `Node` on top of a register store
    pub fn new(bus: BUS) -> Self {
        Node { bus }
    }

    /// Allow access to the register store
    pub fn bus(&mut self) -> &mut BUS {
        &mut self.bus
    }

    /// Release the register store
    pub fn release(self) -> BUS {
        self.bus
    }
}

impl<BUS> Node<BUS>
where
    BUS: RegisterBus,
{
    /// Read the full register at `addr`
    #[inline]
    pub fn read_register(&mut self, addr: u8) -> Result<u32, Error> {
        self.bus.read_register(addr)
    }

    /// Masked write of the register at `addr`
    #[inline]
    pub fn write_register(&mut self, addr: u8, mask: u32, value: u32) -> Result<(), Error> {
        self.bus.write_register(addr, mask, value)
    }

    /// Read the field selected by `mask` in the register at `addr`
    #[inline]
    pub fn read_field(&mut self, addr: u8, mask: u32) -> Result<u32, Error> {
        let reg = self.bus.read_register(addr)?;

        Ok(dinfox::get_field(reg, mask))
    }

    /// Write `value` to the field selected by `mask` in the register at `addr`
    ///
    /// Read-modify-write: the register is read, the field bits are replaced
    /// and the result is written back. Not atomic with respect to other
    /// writers of the same store.
    #[inline]
    pub fn write_field(&mut self, addr: u8, mask: u32, value: u32) -> Result<(), Error> {
        let reg = self.bus.read_register(addr)?;
        let reg = dinfox::set_field(reg, mask, value);

        self.bus.write_register(addr, mask, reg)
    }
}

/// Provides access to a register
///
/// You can get an instance for a given register using one of the methods on
/// [`Node`].
pub struct RegAccessor<'s, R, BUS>(&'s mut Node<BUS>, PhantomData<R>);

impl<'s, R, BUS> RegAccessor<'s, R, BUS>
where
    R: Register,
    BUS: RegisterBus,
{
    /// Read from the register
    #[inline]
    pub fn read(&mut self) -> Result<R::Read, Error> {
        let value = self.0.bus.read_register(R::ADDR)?;

        Ok(R::read(value))
    }

    /// Write the fields set by `f`, leaving the other fields untouched
    #[inline]
    pub fn write<F>(&mut self, f: F) -> Result<(), Error>
    where
        F: FnOnce(&mut R::Write) -> &mut R::Write,
    {
        let mut w = R::write(0);
        f(&mut w);

        let (mask, value) = R::masked(&w);
        self.0.bus.write_register(R::ADDR, mask, value)
    }

    /// Modify the register
    ///
    /// `f` gets the current content and the fields it sets are written back.
    #[inline]
    pub fn modify<F>(&mut self, f: F) -> Result<(), Error>
    where
        F: for<'w> FnOnce(&R::Read, &'w mut R::Write) -> &'w mut R::Write,
    {
        let current = self.0.bus.read_register(R::ADDR)?;
        let r = R::read(current);
        let mut w = R::write(current);

        f(&r, &mut w);

        let (mask, value) = R::masked(&w);
        self.0.bus.write_register(R::ADDR, mask, value)
    }
}

/// Bus access rights of a register
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub enum Access {
    /// Only the node updates the register
    ReadOnly,
    /// The bus may write the register
    ReadWrite,
}

/// Implemented for all registers
///
/// This is a mostly internal trait that should not be implemented or used
/// directly by users of this crate. It is exposed through the public API
/// though, so it can't be made private.
pub trait Register {
    /// The register address
    const ADDR: u8;

    /// Bus access rights
    const ACCESS: Access;

    /// The type that is used to read from the register
    type Read;

    /// The type that is used to write to the register
    type Write;

    /// Wrap a raw register value for reading
    fn read(value: u32) -> Self::Read;

    /// Start a write on top of a raw register value
    fn write(value: u32) -> Self::Write;

    /// Returns the mask of the fields that were set, and the register value
    fn masked(w: &Self::Write) -> (u32, u32);
}

/// Generates register implementations
macro_rules! impl_register {
    (
        $(
            $addr:expr,
            $rw:tt,
            $name:ident($name_lower:ident) {
            #[$doc:meta]
            $(
                $field:ident,
                $mask:expr,
                $ty:ty;
                #[$field_doc:meta]
            )*
            }
        )*
    ) => {
        /// Register addresses
        pub mod addr {
            $(
                #[$doc]
                pub const $name: u8 = $addr;
            )*
        }

        $(
            #[$doc]
            #[allow(non_camel_case_types)]
            pub struct $name;

            impl Register for $name {
                const ADDR: u8 = $addr;
                const ACCESS: Access = impl_access!($rw);

                type Read = $name_lower::R;
                type Write = $name_lower::W;

                fn read(value: u32) -> Self::Read {
                    $name_lower::R(value)
                }

                fn write(value: u32) -> Self::Write {
                    $name_lower::W { value, mask: 0 }
                }

                fn masked(w: &Self::Write) -> (u32, u32) {
                    (w.mask, w.value)
                }
            }

            #[$doc]
            pub mod $name_lower {
                use core::fmt;

                use crate::dinfox;

                $(
                    #[$field_doc]
                    #[allow(non_upper_case_globals)]
                    pub const $field: u32 = $mask;
                )*

                /// Used to read from the register
                #[derive(Copy, Clone)]
                pub struct R(pub(crate) u32);

                impl R {
                    /// Raw register content
                    #[inline(always)]
                    pub fn bits(&self) -> u32 {
                        self.0
                    }

                    $(
                        #[$field_doc]
                        #[inline(always)]
                        pub fn $field(&self) -> $ty {
                            dinfox::get_field(self.0, $mask) as $ty
                        }
                    )*
                }

                impl fmt::Debug for R {
                    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                        write!(f, "0x{:08x}", self.0)
                    }
                }

                #[cfg(feature = "defmt")]
                impl defmt::Format for R {
                    fn format(&self, f: defmt::Formatter) {
                        defmt::write!(f, "0x{:08x}", self.0);
                    }
                }

                /// Used to write to the register
                pub struct W {
                    pub(crate) value: u32,
                    pub(crate) mask: u32,
                }

                impl W {
                    $(
                        #[$field_doc]
                        #[inline(always)]
                        pub fn $field(&mut self, value: $ty) -> &mut Self {
                            self.value = dinfox::set_field(self.value, $mask, value as u32);
                            self.mask |= $mask;
                            self
                        }
                    )*
                }
            }
        )*

        /// Returns the bus access rights of the register at `addr`
        ///
        /// Returns `None` if there is no register at this address.
        pub fn access(address: u8) -> Option<Access> {
            $(
                if address == $addr {
                    return Some(<$name as Register>::ACCESS);
                }
            )*

            None
        }

        impl<BUS> Node<BUS> {
            $(
                #[$doc]
                pub fn $name_lower(&mut self) -> RegAccessor<$name, BUS> {
                    RegAccessor(self, PhantomData)
                }
            )*
        }
    };
}

// Helper macro, used internally by `impl_register!`
macro_rules! impl_access {
    (RO) => {
        Access::ReadOnly
    };
    (RW) => {
        Access::ReadWrite
    };
}

// All registers are implemented in this macro invocation. It follows the
// following syntax:
// <address>, <RO/RW>, <name-upper>(name-lower) { /// <doc>
//     <field 1>, <mask>, <type>; /// <doc>
//     <field 2>, <mask>, <type>; /// <doc>
//     ...
// }
//
// The common block comes first, every node type exposes it. The GPSM block
// follows.
impl_register! {
    0x00, RO, NODE_ID(node_id) { /// Node identity
        node_addr, 0x0000_00FF, u8; /// Bus address of the node
        board_id,  0x0000_FF00, u8; /// Board identifier
    }
    0x01, RO, HW_VERSION(hw_version) { /// Hardware version
        major, 0x0000_00FF, u8; /// Major version
        minor, 0x0000_FF00, u8; /// Minor version
    }
    0x02, RO, SW_VERSION_0(sw_version_0) { /// Software version
        major,        0x0000_00FF, u8; /// Major version
        minor,        0x0000_FF00, u8; /// Minor version
        commit_index, 0x00FF_0000, u8; /// Commits since the version tag
        dtyf,         0x0100_0000, u8; /// Dirty flag
    }
    0x03, RO, SW_VERSION_1(sw_version_1) { /// Software commit
        commit_id, 0x0FFF_FFFF, u32; /// Abbreviated commit hash
    }
    0x04, RO, ERROR_STACK(error_stack) { /// Error stack output
        error, 0x0000_FFFF, u16; /// Oldest stacked error code, 0 if empty
    }
    0x05, RO, STATUS_0(status_0) { /// Common status
        esf, 0x0000_0001, u8; /// Error stack not empty
    }
    0x06, RW, CONTROL_0(control_0) { /// Common control
        mtrg, 0x0000_0001, u8; /// Analog measurement trigger
    }
    0x07, RO, ANALOG_DATA_0(analog_data_0) { /// MCU measurements
        vmcu, 0x0000_FFFF, u16; /// MCU supply voltage (compact voltage)
        tmcu, 0x00FF_0000, u8;  /// MCU temperature (compact temperature)
    }
    0x08, RW, CONFIGURATION_0(configuration_0) { /// Fix timeouts
        time_timeout,     0x0000_00FF, u8; /// Time fix timeout (compact duration)
        position_timeout, 0x0000_FF00, u8; /// Position fix timeout (compact duration)
    }
    0x09, RW, CONFIGURATION_1(configuration_1) { /// Timepulse frequency
        timepulse_frequency, 0xFFFF_FFFF, u32; /// Frequency in Hz
    }
    0x0A, RW, CONFIGURATION_2(configuration_2) { /// Timepulse duty cycle
        timepulse_duty_cycle, 0x0000_00FF, u8; /// Duty cycle in percent
    }
    0x0B, RO, STATUS_1(status_1) { /// GPS status
        tfs,    0x0000_0001, u8; /// Time fix status
        pfs,    0x0000_0002, u8; /// Position fix status
        bkenst, 0x0000_0004, u8; /// Backup enable status
        tpst,   0x0000_0008, u8; /// Timepulse status
        pwst,   0x0000_0010, u8; /// Power status
    }
    0x0C, RW, CONTROL_1(control_1) { /// GPS control
        ttrg, 0x0000_0001, u8; /// Time fix trigger
        ptrg, 0x0000_0002, u8; /// Position fix trigger
        tpen, 0x0000_0004, u8; /// Timepulse enable
        pwmd, 0x0000_0008, u8; /// Power mode (0 dynamic, 1 static)
        pwen, 0x0000_0010, u8; /// Power enable in static mode
        bken, 0x0000_0020, u8; /// Backup enable
    }
    0x0D, RO, ANALOG_DATA_1(analog_data_1) { /// GPS measurements
        vgps, 0x0000_FFFF, u16; /// GPS supply voltage (compact voltage)
        vant, 0xFFFF_0000, u16; /// Active antenna voltage (compact voltage)
    }
    0x0E, RO, TIME_DATA_0(time_data_0) { /// Fix date
        date,  0x0000_FF00, u8; /// Day of month
        month, 0x00FF_0000, u8; /// Month
        year,  0xFF00_0000, u8; /// Year minus 2000
    }
    0x0F, RO, TIME_DATA_1(time_data_1) { /// Fix time of day
        second, 0x0000_00FF, u8; /// Seconds
        minute, 0x0000_FF00, u8; /// Minutes
        hour,   0x00FF_0000, u8; /// Hours
    }
    0x10, RO, TIME_DATA_2(time_data_2) { /// Time fix duration
        fix_duration, 0x0000_00FF, u8; /// Fix duration (compact duration)
    }
    0x11, RO, POSITION_DATA_0(position_data_0) { /// Latitude
        second, 0x0001_FFFF, u32; /// Thousandths of arc second
        minute, 0x007E_0000, u8;  /// Arc minutes
        degree, 0x7F80_0000, u8;  /// Degrees
        nf,     0x8000_0000, u8;  /// North flag
    }
    0x12, RO, POSITION_DATA_1(position_data_1) { /// Longitude
        second, 0x0001_FFFF, u32; /// Thousandths of arc second
        minute, 0x007E_0000, u8;  /// Arc minutes
        degree, 0x7F80_0000, u8;  /// Degrees
        ef,     0x8000_0000, u8;  /// East flag
    }
    0x13, RO, POSITION_DATA_2(position_data_2) { /// Altitude
        altitude, 0xFFFF_FFFF, u32; /// Altitude in metres
    }
    0x14, RO, POSITION_DATA_3(position_data_3) { /// Position fix duration
        fix_duration, 0x0000_00FF, u8; /// Fix duration (compact duration)
    }
}

/// Number of registers of a GPSM node
pub const GPSM_REGISTER_COUNT: usize = 0x15;

/// RAM-backed register store
///
/// Holds `N` consecutive registers starting at address 0.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RegisterFile<const N: usize> {
    registers: [u32; N],
}

impl<const N: usize> RegisterFile<N> {
    /// Create a register file with every register cleared
    pub const fn new() -> Self {
        RegisterFile { registers: [0; N] }
    }

    /// Raw view of all registers
    pub fn registers(&self) -> &[u32; N] {
        &self.registers
    }
}

impl<const N: usize> Default for RegisterFile<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RegisterBus for RegisterFile<N> {
    fn read_register(&mut self, addr: u8) -> Result<u32, Error> {
        self.registers
            .get(addr as usize)
            .copied()
            .ok_or(Error::UnknownAddress(addr))
    }

    fn write_register(&mut self, addr: u8, mask: u32, value: u32) -> Result<(), Error> {
        let reg = self
            .registers
            .get_mut(addr as usize)
            .ok_or(Error::UnknownAddress(addr))?;

        *reg = (*reg & !mask) | (value & mask);

        Ok(())
    }
}
