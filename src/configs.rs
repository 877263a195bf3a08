//! Node configuration
//!
//! This module houses the settings applied when a node starts, and the board
//! descriptor table that replaces per-board compilation.

use crate::gps::TimepulseConfig;

#[cfg(feature = "defmt")]
use defmt::Format;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// Start-up configuration of a GPSM node
pub struct Config {
    /// Bus address of the node
    pub node_addr: u8,
    /// Board the firmware runs on
    pub board: Board,
    /// Hardware revision, major and minor
    pub hw_version: (u8, u8),
    /// Firmware version published in the version registers
    pub sw_version: SoftwareVersion,
    /// Default time fix timeout in seconds
    ///
    /// Stored as a compact duration, so it may be rounded down.
    pub time_timeout_seconds: u32,
    /// Default position fix timeout in seconds
    ///
    /// Stored as a compact duration, so it may be rounded down.
    pub position_timeout_seconds: u32,
    /// Default timepulse settings. `active` is ignored, the timepulse always
    /// starts disabled.
    pub timepulse: TimepulseConfig,
    /// Initial power mode
    pub power_mode: PowerMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            node_addr: 0x40,
            board: Board::Gpsm,
            hw_version: (1, 0),
            sw_version: SoftwareVersion::default(),
            time_timeout_seconds: 180,
            position_timeout_seconds: 180,
            timepulse: TimepulseConfig::default(),
            power_mode: PowerMode::default(),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// Firmware version
pub struct SoftwareVersion {
    /// Major version
    pub major: u8,
    /// Minor version
    pub minor: u8,
    /// Number of commits since the version tag
    pub commit_index: u8,
    /// Abbreviated commit hash, 28 bits
    pub commit_id: u32,
    /// Built from a dirty tree
    pub dirty: bool,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// Who decides whether the GPS is powered
pub enum PowerMode {
    /// The controller powers the GPS for each operation and turns it off
    /// afterwards
    #[default]
    Dynamic = 0b0,
    /// The GPS power follows the power enable bit, operations fail while it
    /// is off
    Static = 0b1,
}

impl PowerMode {
    /// Decodes the power mode bit
    pub fn from_bit(bit: u8) -> Self {
        if bit == 0 {
            PowerMode::Dynamic
        } else {
            PowerMode::Static
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// Boards of the DINFox family
pub enum Board {
    /// Low voltage relay module
    Lvrm = 0,
    /// Battery and power supply module
    Bpsm = 1,
    /// DC-DC regulator module
    Ddrm = 2,
    /// UHF radio module
    Uhfm = 3,
    /// GPS module
    Gpsm = 4,
    /// Sensor module
    Sm = 5,
    /// Regulated relay module
    Rrm = 7,
    /// Mains power meter and control module
    Mpmcm = 9,
    /// Battery charger module
    Bcm = 11,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
/// Features of a board
pub struct Capabilities {
    /// GPS receiver with timepulse output
    pub gps: bool,
    /// Radio transceiver
    pub radio: bool,
    /// Relay or regulator output
    pub output: bool,
    /// Number of voltage inputs, MCU supply excluded
    pub voltage_inputs: u8,
    /// Output current measurement
    pub current_sense: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
/// Static description of a board
pub struct BoardDescriptor {
    /// The board
    pub board: Board,
    /// Short name
    pub name: &'static str,
    /// Features
    pub capabilities: Capabilities,
}

const fn descriptor(
    board: Board,
    name: &'static str,
    gps: bool,
    radio: bool,
    output: bool,
    voltage_inputs: u8,
    current_sense: bool,
) -> BoardDescriptor {
    BoardDescriptor {
        board,
        name,
        capabilities: Capabilities {
            gps,
            radio,
            output,
            voltage_inputs,
            current_sense,
        },
    }
}

/// Descriptor table of every supported board
pub static BOARDS: [BoardDescriptor; 9] = [
    descriptor(Board::Lvrm, "LVRM", false, false, true, 2, true),
    descriptor(Board::Bpsm, "BPSM", false, false, true, 3, false),
    descriptor(Board::Ddrm, "DDRM", false, false, true, 2, true),
    descriptor(Board::Uhfm, "UHFM", false, true, false, 1, false),
    descriptor(Board::Gpsm, "GPSM", true, false, false, 2, false),
    descriptor(Board::Sm, "SM", false, false, false, 4, false),
    descriptor(Board::Rrm, "RRM", false, false, true, 2, true),
    descriptor(Board::Mpmcm, "MPMCM", false, false, false, 4, true),
    descriptor(Board::Bcm, "BCM", false, false, true, 3, true),
];

impl Board {
    /// Board identifier published in the NODE_ID register
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Looks a board up by identifier
    pub fn from_id(id: u8) -> Option<Self> {
        BOARDS
            .iter()
            .find(|descriptor| descriptor.board.id() == id)
            .map(|descriptor| descriptor.board)
    }

    /// Returns the descriptor of the board
    pub fn descriptor(self) -> &'static BoardDescriptor {
        // Every variant has exactly one entry in `BOARDS`.
        BOARDS
            .iter()
            .find(|descriptor| descriptor.board == self)
            .unwrap_or(&BOARDS[0])
    }
}
