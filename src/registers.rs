//! Register map definitions for the AS7343 spectral sensor.
//!
//! Addresses below [`RegisterBank::BOUNDARY`] live in bank 1, everything else in
//! bank 0. `CFG0` (which carries the bank select bit) is reachable from both.
#![allow(unused_parens)]

use modular_bitfield::prelude::*;

use crate::params::{FifoThreshold, GpioMode, RegisterBank};

/// 7-bit I2C address of the AS7343.
pub const I2C_ADDRESS: u8 = 0x39;
/// Value of the `ID` register on a genuine AS7343.
pub const EXPECTED_DEVICE_ID: u8 = 0x81;

/// Register address of `AUXID`.
pub const REG_AUXID: u8 = 0x58;
/// Register address of `REVID`.
pub const REG_REVID: u8 = 0x59;
/// Register address of `ID`.
pub const REG_ID: u8 = 0x5A;
/// Register address of `CFG10`.
pub const REG_CFG10: u8 = 0x65;
/// Register address of `CFG12`.
pub const REG_CFG12: u8 = 0x66;
/// Register address of `GPIO`.
pub const REG_GPIO: u8 = 0x6B;
/// Register address of `ENABLE`.
pub const REG_ENABLE: u8 = 0x80;
/// Register address of `ATIME`.
pub const REG_ATIME: u8 = 0x81;
/// Register address of `WTIME`.
pub const REG_WTIME: u8 = 0x83;
/// Register address of `SP_TH_L` (low byte, 16-bit little-endian).
pub const REG_SP_TH_L: u8 = 0x84;
/// Register address of `SP_TH_H` (low byte, 16-bit little-endian).
pub const REG_SP_TH_H: u8 = 0x86;
/// Register address of `STATUS2`.
pub const REG_STATUS2: u8 = 0x90;
/// Register address of `STATUS3`.
pub const REG_STATUS3: u8 = 0x91;
/// Register address of `STATUS`.
pub const REG_STATUS: u8 = 0x93;
/// Register address of `ASTATUS`.
pub const REG_ASTATUS: u8 = 0x94;
/// Register address of `DATA_0_L`, the first of 18 little-endian channel words.
pub const REG_DATA_0: u8 = 0x95;
/// Register address of `STATUS5`.
pub const REG_STATUS5: u8 = 0xBB;
/// Register address of `STATUS4`.
pub const REG_STATUS4: u8 = 0xBC;
/// Register address of `CFG0`.
pub const REG_CFG0: u8 = 0xBF;
/// Register address of `CFG1`.
pub const REG_CFG1: u8 = 0xC6;
/// Register address of `CFG3`.
pub const REG_CFG3: u8 = 0xC7;
/// Register address of `CFG8`.
pub const REG_CFG8: u8 = 0xC9;
/// Register address of `CFG9`.
pub const REG_CFG9: u8 = 0xCA;
/// Register address of `LED`.
pub const REG_LED: u8 = 0xCD;
/// Register address of `PERS`.
pub const REG_PERS: u8 = 0xCF;
/// Register address of `ASTEP` (low byte, 16-bit little-endian).
pub const REG_ASTEP: u8 = 0xD4;
/// Register address of `CFG20`.
pub const REG_CFG20: u8 = 0xD6;
/// Register address of `AGC_GAIN_MAX`.
pub const REG_AGC_GAIN_MAX: u8 = 0xD7;
/// Register address of `AZ_CONFIG`.
pub const REG_AZ_CONFIG: u8 = 0xDE;
/// Register address of `FD_CFG0`.
pub const REG_FD_CFG0: u8 = 0xDF;
/// Register address of `FD_TIME1`.
pub const REG_FD_TIME1: u8 = 0xE0;
/// Register address of `FD_TIME2`.
pub const REG_FD_TIME2: u8 = 0xE2;
/// Register address of `FD_STATUS`.
pub const REG_FD_STATUS: u8 = 0xE3;
/// Register address of `CFG6`.
pub const REG_CFG6: u8 = 0xF5;
/// Register address of `INTENAB`.
pub const REG_INTENAB: u8 = 0xF9;
/// Register address of `CONTROL`.
pub const REG_CONTROL: u8 = 0xFA;
/// Register address of `FIFO_MAP`.
pub const REG_FIFO_MAP: u8 = 0xFC;
/// Register address of `FIFO_LVL`.
pub const REG_FIFO_LVL: u8 = 0xFD;
/// Register address of `FDATA` (low byte, 16-bit little-endian FIFO output).
pub const REG_FDATA: u8 = 0xFE;

/// Number of spectral data channels exposed by the data block.
pub const CHANNEL_COUNT: usize = 18;
/// Size in bytes of the contiguous channel data block.
pub const CHANNEL_DATA_BYTES: usize = CHANNEL_COUNT * 2;

/// Returns the address of the low byte of channel `index`.
pub const fn data_register(index: u8) -> u8 {
    REG_DATA_0 + index * 2
}

/// Access permissions encoded for each register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterAccess {
    /// Read-only register.
    ReadOnly,
    /// Read/write register.
    ReadWrite,
    /// Status register whose flags are cleared by writing ones.
    WriteOneToClear,
}

/// Minimal metadata exposed by every register value type.
pub trait Register: From<u8> + Into<u8> + Copy {
    /// Register address as documented in the datasheet.
    const ADDRESS: u8;
    /// Access permission classification.
    const ACCESS: RegisterAccess;
    /// Bank that must be selected before touching the register.
    const BANK: RegisterBank = RegisterBank::for_address(Self::ADDRESS);
}

// Byte conversions and register metadata shared by every single-byte bitfield.
macro_rules! byte_register {
    ($ty:ident, $addr:expr, $access:ident) => {
        impl From<u8> for $ty {
            fn from(value: u8) -> Self {
                Self::from_bytes([value])
            }
        }

        impl From<$ty> for u8 {
            fn from(value: $ty) -> Self {
                value.into_bytes()[0]
            }
        }

        impl Register for $ty {
            const ADDRESS: u8 = $addr;
            const ACCESS: RegisterAccess = RegisterAccess::$access;
        }
    };
}

/// Bitfield representation of the `ENABLE` register (address `0x80`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enable {
    // Power on (bit 0).
    pub pon: bool,
    // Spectral measurement enable (bit 1).
    pub sp_en: bool,
    #[skip]
    __: B1,
    // Wait time between measurements enable (bit 3).
    pub wen: bool,
    // SMUX command execution (bit 4, self-clearing).
    pub smuxen: bool,
    #[skip]
    __: B1,
    // Flicker detection enable (bit 6).
    pub fden: bool,
    #[skip]
    __: B1,
}

byte_register!(Enable, REG_ENABLE, ReadWrite);

/// Bitfield representation of the `CFG0` register (address `0xBF`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cfg0 {
    #[skip]
    __: B2,
    // Wait time multiplied by 16 (bit 2).
    pub wlong: bool,
    #[skip]
    __: B1,
    // Register bank select (bit 4).
    pub reg_bank: RegisterBank,
    // Low power idle (bit 5).
    pub low_power: bool,
    #[skip]
    __: B2,
}

byte_register!(Cfg0, REG_CFG0, ReadWrite);

/// Bitfield representation of the `CFG1` register (address `0xC6`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cfg1 {
    // Spectral analog gain, see `Gain` (bits 4:0).
    pub again: B5,
    #[skip]
    __: B3,
}

byte_register!(Cfg1, REG_CFG1, ReadWrite);

/// Bitfield representation of the `CFG3` register (address `0xC7`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cfg3 {
    #[skip]
    __: B4,
    // Sleep after interrupt (bit 4).
    pub sai: bool,
    #[skip]
    __: B3,
}

byte_register!(Cfg3, REG_CFG3, ReadWrite);

/// Bitfield representation of the `CFG8` register (address `0xC9`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cfg8 {
    #[skip]
    __: B6,
    // FIFO threshold (bits 7:6).
    pub fifo_th: FifoThreshold,
}

byte_register!(Cfg8, REG_CFG8, ReadWrite);

/// Bitfield representation of the `CFG9` register (address `0xCA`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cfg9 {
    #[skip]
    __: B4,
    // System interrupt on SMUX completion (bit 4).
    pub sien_smux: bool,
    #[skip]
    __: B1,
    // System interrupt on flicker detection change (bit 6).
    pub sien_fd: bool,
    #[skip]
    __: B1,
}

byte_register!(Cfg9, REG_CFG9, ReadWrite);

/// Bitfield representation of the `CFG10` register (address `0x65`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cfg10 {
    // Flicker detection persistence (bits 2:0).
    pub fd_pers: B3,
    #[skip]
    __: B5,
}

byte_register!(Cfg10, REG_CFG10, ReadWrite);

/// Bitfield representation of the `CFG12` register (address `0x66`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cfg12 {
    // Spectral threshold channel, see `ThresholdChannel` (bits 2:0).
    pub sp_th_ch: B3,
    #[skip]
    __: B5,
}

byte_register!(Cfg12, REG_CFG12, ReadWrite);

/// Bitfield representation of the `CFG20` register (address `0xD6`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cfg20 {
    #[skip]
    __: B5,
    // Automatic SMUX channel read-out, see `AutoSmux` (bits 6:5).
    pub auto_smux: B2,
    // 8-bit flicker FIFO entries (bit 7).
    pub fd_fifo_8b: bool,
}

byte_register!(Cfg20, REG_CFG20, ReadWrite);

/// Bitfield representation of the `GPIO` register (address `0x6B`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gpio {
    // Sampled pin level (bit 0).
    pub gpio_in: bool,
    // Output drive level (bit 1).
    pub gpio_out: bool,
    // Input enable (bit 2).
    pub gpio_in_en: GpioMode,
    // Invert output (bit 3).
    pub gpio_inv: bool,
    #[skip]
    __: B4,
}

byte_register!(Gpio, REG_GPIO, ReadWrite);

/// Bitfield representation of the `LED` register (address `0xCD`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Led {
    // Drive current step, 4 mA + 2 mA per step (bits 6:0).
    pub led_drive: B7,
    // LED active (bit 7).
    pub led_act: bool,
}

byte_register!(Led, REG_LED, ReadWrite);

/// Bitfield representation of the `PERS` register (address `0xCF`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pers {
    // Spectral interrupt persistence (bits 3:0).
    pub apers: B4,
    #[skip]
    __: B4,
}

byte_register!(Pers, REG_PERS, ReadWrite);

/// Bitfield representation of the `STATUS` register (address `0x93`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    // System interrupt (bit 0).
    pub sint: bool,
    #[skip]
    __: B1,
    // FIFO buffer interrupt (bit 2).
    pub fint: bool,
    // Spectral channel interrupt (bit 3).
    pub aint: bool,
    #[skip]
    __: B3,
    // Spectral saturation (bit 7).
    pub asat: bool,
}

byte_register!(Status, REG_STATUS, WriteOneToClear);

/// Bitfield representation of the `STATUS2` register (address `0x90`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status2 {
    // Flicker detection digital saturation (bit 0).
    pub fdsat_dig: bool,
    // Flicker detection analog saturation (bit 1).
    pub fdsat_ana: bool,
    #[skip]
    __: B1,
    // Spectral analog saturation (bit 3).
    pub asat_ana: bool,
    // Spectral digital saturation (bit 4).
    pub asat_dig: bool,
    #[skip]
    __: B1,
    // Spectral measurement complete and valid (bit 6).
    pub avalid: bool,
    #[skip]
    __: B1,
}

byte_register!(Status2, REG_STATUS2, ReadOnly);

/// Bitfield representation of the `STATUS3` register (address `0x91`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status3 {
    #[skip]
    __: B4,
    // Spectral value below the low threshold (bit 4).
    pub int_sp_l: bool,
    // Spectral value above the high threshold (bit 5).
    pub int_sp_h: bool,
    #[skip]
    __: B2,
}

byte_register!(Status3, REG_STATUS3, ReadOnly);

/// Bitfield representation of the `STATUS4` register (address `0xBC`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status4 {
    // Initialisation busy (bit 0).
    pub int_busy: bool,
    // Sleep after interrupt active (bit 1).
    pub sai_act: bool,
    // Spectral trigger error (bit 2).
    pub sp_trig: bool,
    #[skip]
    __: B1,
    // Flicker detection trigger error (bit 4).
    pub fd_trig: bool,
    // Over temperature (bit 5).
    pub ov_temp: bool,
    #[skip]
    __: B1,
    // FIFO overflow (bit 7).
    pub fifo_ov: bool,
}

byte_register!(Status4, REG_STATUS4, ReadOnly);

/// Bitfield representation of the `STATUS5` register (address `0xBB`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status5 {
    #[skip]
    __: B2,
    // SMUX operation finished (bit 2).
    pub sint_smux: bool,
    // Flicker detection status changed (bit 3).
    pub sint_fd: bool,
    #[skip]
    __: B4,
}

byte_register!(Status5, REG_STATUS5, ReadOnly);

/// Bitfield representation of the `ASTATUS` register (address `0x94`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AStatus {
    // Gain applied to the latched data set (bits 3:0).
    pub again_status: B4,
    #[skip]
    __: B3,
    // Latched data set saturated (bit 7).
    pub asat_status: bool,
}

byte_register!(AStatus, REG_ASTATUS, ReadOnly);

/// Bitfield representation of the `FD_TIME2` register (address `0xE2`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FdTime2 {
    // Flicker integration time bits 10:8 (bits 2:0).
    pub fd_time_high: B3,
    // Flicker detection gain, see `FlickerGain` (bits 7:3).
    pub fd_gain: B5,
}

byte_register!(FdTime2, REG_FD_TIME2, ReadWrite);

/// Bitfield representation of the `AGC_GAIN_MAX` register (address `0xD7`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgcGainMax {
    #[skip]
    __: B4,
    // Flicker AGC gain ceiling, see `FlickerGain` (bits 7:4).
    pub agc_fd_gain_max: B4,
}

byte_register!(AgcGainMax, REG_AGC_GAIN_MAX, ReadWrite);

/// Bitfield representation of the `FD_CFG0` register (address `0xDF`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FdCfg0 {
    #[skip]
    __: B7,
    // Push flicker raw data into the FIFO (bit 7).
    pub fifo_write_fd: bool,
}

byte_register!(FdCfg0, REG_FD_CFG0, ReadWrite);

/// Bitfield representation of the `CFG6` register (address `0xF5`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cfg6 {
    #[skip]
    __: B3,
    // SMUX command run on the next `SMUXEN`, see `SmuxCommand` (bits 4:3).
    pub smux_cmd: B2,
    #[skip]
    __: B3,
}

byte_register!(Cfg6, REG_CFG6, ReadWrite);

/// Bitfield representation of the `FIFO_MAP` register (address `0xFC`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FifoMap {
    // Push `ASTATUS` into the FIFO (bit 0).
    pub astatus: bool,
    // Push data channels 0 to 5 into the FIFO, one bit each (bits 6:1).
    pub channels: B6,
    #[skip]
    __: B1,
}

byte_register!(FifoMap, REG_FIFO_MAP, ReadWrite);

/// Bitfield representation of the `FD_STATUS` register (address `0xE3`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FdStatus {
    // 100 Hz flicker detected (bit 0).
    pub fd_100hz: bool,
    // 120 Hz flicker detected (bit 1).
    pub fd_120hz: bool,
    // 100 Hz detection result valid (bit 2).
    pub fd_100hz_valid: bool,
    // 120 Hz detection result valid (bit 3).
    pub fd_120hz_valid: bool,
    // Flicker detection saturated (bit 4).
    pub fd_saturation: bool,
    // Flicker measurement complete (bit 5).
    pub fd_measurement_valid: bool,
    #[skip]
    __: B2,
}

byte_register!(FdStatus, REG_FD_STATUS, WriteOneToClear);

/// Bitfield representation of the `INTENAB` register (address `0xF9`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntEnable {
    // System interrupt enable (bit 0).
    pub sien: bool,
    #[skip]
    __: B1,
    // FIFO interrupt enable (bit 2).
    pub fien: bool,
    // Spectral interrupt enable (bit 3).
    pub sp_ien: bool,
    #[skip]
    __: B3,
    // Spectral saturation interrupt enable (bit 7).
    pub asien: bool,
}

byte_register!(IntEnable, REG_INTENAB, ReadWrite);

/// Bitfield representation of the `CONTROL` register (address `0xFA`).
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Control {
    // Clear sleep-after-interrupt state (bit 0, self-clearing).
    pub clear_sai_act: bool,
    // Clear FIFO (bit 1, self-clearing).
    pub fifo_clr: bool,
    // Manual autozero (bit 2, self-clearing).
    pub sp_man_az: bool,
    // Software reset (bit 3, self-clearing).
    pub sw_reset: bool,
    #[skip]
    __: B4,
}

byte_register!(Control, REG_CONTROL, ReadWrite);

/// Mask applied to `AUXID` reads.
pub const AUXID_MASK: u8 = 0x0F;
/// Mask applied to `REVID` reads.
pub const REVID_MASK: u8 = 0x07;
/// Largest flicker integration time encodable across `FD_TIME1`/`FD_TIME2`.
pub const FD_TIME_MAX: u16 = 0x07FF;
/// Mask of the six channel bits of `FIFO_MAP`.
pub const FIFO_MAP_CHANNELS_MAX: u8 = 0x3F;
/// Largest LED drive step.
pub const LED_DRIVE_MAX: u8 = 0x7F;
/// `ASTEP` value reserved by the datasheet.
pub const ASTEP_RESERVED: u16 = 0xFFFF;
/// Integration step length in nanoseconds.
pub const ASTEP_NS: u32 = 2_780;
