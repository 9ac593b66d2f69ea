//! Strongly typed parameter enumerations for the AS7343 driver.
//!
//! These enums map directly to datasheet field encodings and are used across
//! [`Config`](crate::config::Config) and the high-level driver APIs. Prefer these
//! types over raw integers to keep configuration values valid and explicit.
//!
//! # Examples
//!
//! ```rust
//! use as7343::params::{AutoSmux, Gain};
//!
//! let gain = Gain::X256;
//! let smux = AutoSmux::Channels18;
//! assert_eq!(gain.factor_x2(), 512);
//! assert_eq!(smux.channel_count(), 18);
//! ```

use modular_bitfield::prelude::Specifier;

/// Register banks selected through `CFG0.REG_BANK`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 1]
pub enum RegisterBank {
    /// Registers at `0x80` and above (default after reset).
    Bank0 = 0,
    /// Registers `0x58` to `0x7F`.
    Bank1 = 1,
}

impl RegisterBank {
    /// Address at which bank 0 begins.
    pub const BOUNDARY: u8 = 0x80;

    /// Returns the bank that must be active to access `address`.
    pub const fn for_address(address: u8) -> Self {
        if address >= Self::BOUNDARY {
            Self::Bank0
        } else {
            Self::Bank1
        }
    }
}

/// Spectral engine analog gain (`CFG1.AGAIN`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Gain {
    /// 0.5x gain.
    X0_5 = 0,
    /// 1x gain.
    X1 = 1,
    /// 2x gain.
    X2 = 2,
    /// 4x gain.
    X4 = 3,
    /// 8x gain.
    X8 = 4,
    /// 16x gain.
    X16 = 5,
    /// 32x gain.
    X32 = 6,
    /// 64x gain.
    X64 = 7,
    /// 128x gain.
    X128 = 8,
    /// 256x gain (power-on default).
    X256 = 9,
    /// 512x gain.
    X512 = 10,
    /// 1024x gain.
    X1024 = 11,
    /// 2048x gain.
    X2048 = 12,
}

impl Gain {
    /// Every gain step, lowest first.
    pub const ALL: [Self; 13] = [
        Self::X0_5,
        Self::X1,
        Self::X2,
        Self::X4,
        Self::X8,
        Self::X16,
        Self::X32,
        Self::X64,
        Self::X128,
        Self::X256,
        Self::X512,
        Self::X1024,
        Self::X2048,
    ];

    /// Decodes a raw `AGAIN` value.
    pub const fn from_raw(raw: u8) -> Option<Self> {
        if (raw as usize) < Self::ALL.len() {
            Some(Self::ALL[raw as usize])
        } else {
            None
        }
    }

    /// Returns twice the amplification factor, keeping 0.5x integral.
    pub const fn factor_x2(self) -> u16 {
        1 << (self as u16)
    }

    /// Returns the amplification factor.
    pub fn factor(self) -> f32 {
        self.factor_x2() as f32 / 2.0
    }
}

/// Flicker detection gain (`FD_TIME2.FD_GAIN`), same doubling ladder as [`Gain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FlickerGain {
    /// 0.5x gain.
    X0_5 = 0,
    /// 1x gain.
    X1 = 1,
    /// 2x gain.
    X2 = 2,
    /// 4x gain.
    X4 = 3,
    /// 8x gain.
    X8 = 4,
    /// 16x gain.
    X16 = 5,
    /// 32x gain.
    X32 = 6,
    /// 64x gain.
    X64 = 7,
    /// 128x gain.
    X128 = 8,
    /// 256x gain.
    X256 = 9,
    /// 512x gain.
    X512 = 10,
    /// 1024x gain.
    X1024 = 11,
    /// 2048x gain.
    X2048 = 12,
}

impl FlickerGain {
    /// Decodes a raw gain code; codes above 12 are reserved.
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::X0_5),
            1 => Some(Self::X1),
            2 => Some(Self::X2),
            3 => Some(Self::X4),
            4 => Some(Self::X8),
            5 => Some(Self::X16),
            6 => Some(Self::X32),
            7 => Some(Self::X64),
            8 => Some(Self::X128),
            9 => Some(Self::X256),
            10 => Some(Self::X512),
            11 => Some(Self::X1024),
            12 => Some(Self::X2048),
            _ => None,
        }
    }
}

/// Automatic SMUX channel read-out (`CFG20.AUTO_SMUX`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum AutoSmux {
    /// One cycle: FZ, FY, FXL, NIR, VIS, FD.
    Channels6 = 0b00,
    /// Two cycles, adding F2, F3, F4, F6, VIS, FD.
    Channels12 = 0b10,
    /// Three cycles, adding F1, F7, F8, F5, VIS, FD.
    Channels18 = 0b11,
}

impl AutoSmux {
    /// Decodes a raw `AUTO_SMUX` value; `0b01` is reserved.
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0b00 => Some(Self::Channels6),
            0b10 => Some(Self::Channels12),
            0b11 => Some(Self::Channels18),
            _ => None,
        }
    }

    /// Number of data registers populated per full measurement.
    pub const fn channel_count(self) -> usize {
        match self {
            Self::Channels6 => 6,
            Self::Channels12 => 12,
            Self::Channels18 => 18,
        }
    }
}

/// Command executed by the SMUX engine when `ENABLE.SMUXEN` is set (`CFG6.SMUX_CMD`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SmuxCommand {
    /// Load the default SMUX configuration from ROM.
    RomInit = 0b00,
    /// Copy the SMUX chain into RAM.
    Read = 0b01,
    /// Write the RAM configuration into the SMUX chain.
    Write = 0b10,
}

impl SmuxCommand {
    /// Decodes a raw `SMUX_CMD` value; `0b11` is reserved.
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0b00 => Some(Self::RomInit),
            0b01 => Some(Self::Read),
            0b10 => Some(Self::Write),
            _ => None,
        }
    }
}

/// Direction of the GPIO pin (`GPIO.GPIO_IN_EN`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 1]
pub enum GpioMode {
    /// Pin driven from `GPIO_OUT`.
    Output = 0,
    /// Pin sampled into `GPIO_IN`.
    Input = 1,
}

/// Channel compared against the spectral thresholds (`CFG12.SP_TH_CH`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ThresholdChannel {
    /// ADC channel 0.
    Channel0 = 0,
    /// ADC channel 1.
    Channel1 = 1,
    /// ADC channel 2.
    Channel2 = 2,
    /// ADC channel 3.
    Channel3 = 3,
    /// ADC channel 4.
    Channel4 = 4,
    /// ADC channel 5.
    Channel5 = 5,
}

impl ThresholdChannel {
    /// Decodes a raw `SP_TH_CH` value.
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Channel0),
            1 => Some(Self::Channel1),
            2 => Some(Self::Channel2),
            3 => Some(Self::Channel3),
            4 => Some(Self::Channel4),
            5 => Some(Self::Channel5),
            _ => None,
        }
    }
}

/// FIFO level that raises the first FIFO interrupt (`CFG8.FIFO_TH`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 2]
pub enum FifoThreshold {
    /// One entry.
    Level1 = 0b00,
    /// Four entries.
    Level4 = 0b01,
    /// Eight entries.
    Level8 = 0b10,
    /// Sixteen entries.
    Level16 = 0b11,
}

/// Spectral interrupt persistence filter (`PERS.APERS`).
///
/// The raw value is not a cycle count; see [`Persistence::cycles`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Persistence(u8);

impl Persistence {
    /// Interrupt on every measurement cycle.
    pub const EVERY_CYCLE: Self = Self(0);

    /// Builds a persistence setting from its raw 4-bit encoding.
    pub const fn new(raw: u8) -> Option<Self> {
        if raw <= 0x0F { Some(Self(raw)) } else { None }
    }

    /// Returns the raw 4-bit encoding.
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Consecutive out-of-range cycles required before the interrupt fires.
    ///
    /// Zero means every cycle raises the interrupt regardless of thresholds.
    pub const fn cycles(self) -> u8 {
        match self.0 {
            0..=3 => self.0,
            n => (n - 3) * 5,
        }
    }
}

impl Default for Persistence {
    fn default() -> Self {
        Self::EVERY_CYCLE
    }
}

/// Ambient flicker frequency reported by the flicker detection engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlickerFrequency {
    /// No valid detection.
    None,
    /// 100 Hz modulation (50 Hz mains).
    Hz100,
    /// 120 Hz modulation (60 Hz mains).
    Hz120,
}

impl FlickerFrequency {
    /// Returns the frequency in hertz, or `0` when nothing was detected.
    pub const fn hz(self) -> u16 {
        match self {
            Self::None => 0,
            Self::Hz100 => 100,
            Self::Hz120 => 120,
        }
    }
}
