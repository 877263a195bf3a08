//! DINFox compact value representations
//!
//! Physical measurements are shrunk into a single byte or a 16-bit word before
//! they are published in the node registers. Most representations carry a unit
//! selector next to the value: the encoder picks the smallest unit that keeps
//! the value within the field width, at the cost of precision when it has to
//! escalate.
//!
//! All conversions are total. Values that don't fit even in the largest unit
//! are truncated to the value width, RF power wraps around.
//!
//! | Kind        | Width | Unit bits | Value bits |
//! |-------------|-------|-----------|------------|
//! | Duration    | 8     | 7..6      | 5..0       |
//! | Temperature | 8     | -         | 7..0 (i8)  |
//! | Voltage     | 16    | 15        | 14..0      |
//! | Current     | 16    | 15..14    | 13..0      |
//! | RF power    | 8     | -         | 7..0       |

#[cfg(feature = "defmt")]
use defmt::Format;

/// Number of bits of the value part of a compact duration.
pub const TIME_VALUE_BITS: u32 = 6;
/// Mask of the value part of a compact duration.
pub const TIME_VALUE_MASK: u8 = (1 << TIME_VALUE_BITS) - 1;

/// Number of bits of the value part of a compact voltage.
pub const VOLTAGE_VALUE_BITS: u32 = 15;
/// Mask of the value part of a compact voltage.
pub const VOLTAGE_VALUE_MASK: u16 = (1 << VOLTAGE_VALUE_BITS) - 1;

/// Number of bits of the value part of a compact current.
pub const CURRENT_VALUE_BITS: u32 = 14;
/// Mask of the value part of a compact current.
pub const CURRENT_VALUE_MASK: u16 = (1 << CURRENT_VALUE_BITS) - 1;

/// Offset between dBm and the unsigned RF power representation.
pub const RF_POWER_OFFSET: i16 = 174;

/// Published instead of a voltage when the measurement failed.
pub const VOLTAGE_ERROR_VALUE: u16 = 0xFFFF;
/// Published instead of a current when the measurement failed.
pub const CURRENT_ERROR_VALUE: u16 = 0xFFFF;
/// Published instead of a temperature when the measurement failed.
///
/// Collides with a genuine 127 °C reading, which the boards never reach.
pub const TEMPERATURE_ERROR_VALUE: u8 = 0x7F;
/// Published instead of an RF power when the measurement failed.
pub const RF_POWER_ERROR_VALUE: u8 = 0x00;

const SECONDS_PER_MINUTE: u32 = 60;
const MINUTES_PER_HOUR: u32 = 60;
const HOURS_PER_DAY: u32 = 24;

const MV_PER_DV: u32 = 100;

const UA_PER_DMA: u32 = 100;
const DMA_PER_MA: u32 = 10;
const MA_PER_DA: u32 = 100;

/// Returns the index of the lowest set bit of `mask`
///
/// A zero mask has no field; `0` is returned but callers must not rely on it.
#[inline(always)]
pub const fn field_offset(mask: u32) -> u32 {
    if mask == 0 {
        0
    } else {
        mask.trailing_zeros()
    }
}

/// Extracts the field selected by `mask` from `reg`
///
/// ``` rust
/// use dinfox_node::dinfox::get_field;
///
/// assert_eq!(get_field(0x0000_AB00, 0x0000_FF00), 0xAB);
/// ```
#[inline(always)]
pub const fn get_field(reg: u32, mask: u32) -> u32 {
    (reg & mask) >> field_offset(mask)
}

/// Returns `reg` with the field selected by `mask` replaced by `value`
///
/// Bits of `value` that don't fit in the field are discarded, sibling fields
/// are left untouched.
#[inline(always)]
pub const fn set_field(reg: u32, mask: u32, value: u32) -> u32 {
    (reg & !mask) | (value.wrapping_shl(field_offset(mask)) & mask)
}

/// Unit of a compact duration
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[repr(u8)]
pub enum TimeUnit {
    /// 1 second
    Second = 0b00,
    /// 60 seconds
    Minute = 0b01,
    /// 3600 seconds
    Hour = 0b10,
    /// 86400 seconds
    Day = 0b11,
}

impl TimeUnit {
    const SHIFT: u32 = TIME_VALUE_BITS;

    /// Returns the unit stored in a compact duration
    pub const fn from_raw(raw: u8) -> Self {
        match raw >> Self::SHIFT {
            0b00 => TimeUnit::Second,
            0b01 => TimeUnit::Minute,
            0b10 => TimeUnit::Hour,
            _ => TimeUnit::Day,
        }
    }

    /// Number of seconds per unit
    pub const fn seconds(self) -> u32 {
        match self {
            TimeUnit::Second => 1,
            TimeUnit::Minute => SECONDS_PER_MINUTE,
            TimeUnit::Hour => SECONDS_PER_MINUTE * MINUTES_PER_HOUR,
            TimeUnit::Day => SECONDS_PER_MINUTE * MINUTES_PER_HOUR * HOURS_PER_DAY,
        }
    }
}

/// Converts a number of seconds into a compact duration
///
/// Escalates second, minute, hour, day until the value fits in 6 bits. Above
/// 63 days the day count is truncated.
///
/// ``` rust
/// use dinfox_node::dinfox::{decode_duration, encode_duration};
///
/// // Fits as is.
/// assert_eq!(decode_duration(encode_duration(45)), 45);
///
/// // Escalated to minutes, the remaining seconds are lost.
/// assert_eq!(decode_duration(encode_duration(150)), 120);
/// ```
pub const fn encode_duration(seconds: u32) -> u8 {
    let max = TIME_VALUE_MASK as u32;
    let mut value = seconds;
    let mut unit = TimeUnit::Second;

    if value > max {
        value /= SECONDS_PER_MINUTE;
        unit = TimeUnit::Minute;

        if value > max {
            value /= MINUTES_PER_HOUR;
            unit = TimeUnit::Hour;

            if value > max {
                value /= HOURS_PER_DAY;
                unit = TimeUnit::Day;
            }
        }
    }

    ((unit as u8) << TimeUnit::SHIFT) | ((value & max) as u8)
}

/// Converts a compact duration back into seconds
pub const fn decode_duration(raw: u8) -> u32 {
    ((raw & TIME_VALUE_MASK) as u32) * TimeUnit::from_raw(raw).seconds()
}

/// Converts a temperature in degrees Celsius into its compact representation
///
/// The byte holds the two's complement of the temperature.
pub const fn encode_temperature(degrees: i8) -> u8 {
    degrees as u8
}

/// Converts a compact temperature back into degrees Celsius
pub const fn decode_temperature(raw: u8) -> i8 {
    raw as i8
}

/// Unit of a compact voltage
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[repr(u8)]
pub enum VoltageUnit {
    /// Millivolt
    Millivolt = 0b0,
    /// Decivolt (100 mV)
    Decivolt = 0b1,
}

impl VoltageUnit {
    const SHIFT: u32 = VOLTAGE_VALUE_BITS;

    /// Returns the unit stored in a compact voltage
    pub const fn from_raw(raw: u16) -> Self {
        if (raw >> Self::SHIFT) == 0 {
            VoltageUnit::Millivolt
        } else {
            VoltageUnit::Decivolt
        }
    }

    /// Number of millivolts per unit
    pub const fn millivolts(self) -> u32 {
        match self {
            VoltageUnit::Millivolt => 1,
            VoltageUnit::Decivolt => MV_PER_DV,
        }
    }
}

/// Converts a voltage in millivolts into a compact voltage
///
/// Voltages above 32767 mV are stored in decivolts, rounded down.
pub const fn encode_voltage(mv: u32) -> u16 {
    let max = VOLTAGE_VALUE_MASK as u32;

    let (unit, value) = if mv > max {
        (VoltageUnit::Decivolt, mv / MV_PER_DV)
    } else {
        (VoltageUnit::Millivolt, mv)
    };

    ((unit as u16) << VoltageUnit::SHIFT) | ((value & max) as u16)
}

/// Converts a compact voltage back into millivolts
pub const fn decode_voltage(raw: u16) -> u32 {
    ((raw & VOLTAGE_VALUE_MASK) as u32) * VoltageUnit::from_raw(raw).millivolts()
}

/// Unit of a compact current
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[repr(u8)]
pub enum CurrentUnit {
    /// Microampere
    Microamp = 0b00,
    /// Tenth of a milliampere (100 µA)
    DeciMilliamp = 0b01,
    /// Milliampere
    Milliamp = 0b10,
    /// Tenth of an ampere (100 mA)
    DeciAmp = 0b11,
}

impl CurrentUnit {
    const SHIFT: u32 = CURRENT_VALUE_BITS;

    /// Returns the unit stored in a compact current
    pub const fn from_raw(raw: u16) -> Self {
        match raw >> Self::SHIFT {
            0b00 => CurrentUnit::Microamp,
            0b01 => CurrentUnit::DeciMilliamp,
            0b10 => CurrentUnit::Milliamp,
            _ => CurrentUnit::DeciAmp,
        }
    }

    /// Number of microamperes per unit
    pub const fn microamps(self) -> u32 {
        match self {
            CurrentUnit::Microamp => 1,
            CurrentUnit::DeciMilliamp => UA_PER_DMA,
            CurrentUnit::Milliamp => UA_PER_DMA * DMA_PER_MA,
            CurrentUnit::DeciAmp => UA_PER_DMA * DMA_PER_MA * MA_PER_DA,
        }
    }
}

/// Converts a current in microamperes into a compact current
///
/// Same escalation scheme as [`encode_duration`], with factors 100, 10 and
/// 100 between the units.
pub const fn encode_current(ua: u32) -> u16 {
    let max = CURRENT_VALUE_MASK as u32;
    let mut value = ua;
    let mut unit = CurrentUnit::Microamp;

    if value > max {
        value /= UA_PER_DMA;
        unit = CurrentUnit::DeciMilliamp;

        if value > max {
            value /= DMA_PER_MA;
            unit = CurrentUnit::Milliamp;

            if value > max {
                value /= MA_PER_DA;
                unit = CurrentUnit::DeciAmp;
            }
        }
    }

    ((unit as u16) << CurrentUnit::SHIFT) | ((value & max) as u16)
}

/// Converts a compact current back into microamperes
pub const fn decode_current(raw: u16) -> u32 {
    ((raw & CURRENT_VALUE_MASK) as u32) * CurrentUnit::from_raw(raw).microamps()
}

/// Converts an RF power in dBm into its compact representation
///
/// Only [-174, 81] dBm is representable, anything else wraps.
pub const fn encode_rf_power(dbm: i16) -> u8 {
    dbm.wrapping_add(RF_POWER_OFFSET) as u8
}

/// Converts a compact RF power back into dBm
pub const fn decode_rf_power(raw: u8) -> i16 {
    (raw as i16) - RF_POWER_OFFSET
}
