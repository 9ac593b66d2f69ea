//! Spectral channel identities and the decoded channel data block.

use crate::params::AutoSmux;
use crate::registers::{CHANNEL_COUNT, CHANNEL_DATA_BYTES};

/// Logical channel slots of the data block in 18-channel auto-SMUX mode.
///
/// In 6- and 12-channel mode only the first 6 or 12 slots are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Channel {
    /// FZ, 450 nm.
    Fz450 = 0,
    /// FY, 555 nm.
    Fy555 = 1,
    /// FXL, 600 nm.
    Fxl600 = 2,
    /// Near infrared, 855 nm.
    Nir855 = 3,
    /// Clear photodiode, first SMUX cycle.
    Vis1 = 4,
    /// Flicker photodiode, first SMUX cycle.
    Fd1 = 5,
    /// F2, 425 nm.
    F2_425 = 6,
    /// F3, 475 nm.
    F3_475 = 7,
    /// F4, 515 nm.
    F4_515 = 8,
    /// F6, 640 nm.
    F6_640 = 9,
    /// Clear photodiode, second SMUX cycle.
    Vis2 = 10,
    /// Flicker photodiode, second SMUX cycle.
    Fd2 = 11,
    /// F1, 405 nm.
    F1_405 = 12,
    /// F7, 690 nm.
    F7_690 = 13,
    /// F8, 745 nm.
    F8_745 = 14,
    /// F5, 550 nm.
    F5_550 = 15,
    /// Clear photodiode, third SMUX cycle.
    Vis3 = 16,
    /// Flicker photodiode, third SMUX cycle.
    Fd3 = 17,
}

impl Channel {
    /// All slots in data block order.
    pub const ALL: [Self; CHANNEL_COUNT] = [
        Self::Fz450,
        Self::Fy555,
        Self::Fxl600,
        Self::Nir855,
        Self::Vis1,
        Self::Fd1,
        Self::F2_425,
        Self::F3_475,
        Self::F4_515,
        Self::F6_640,
        Self::Vis2,
        Self::Fd2,
        Self::F1_405,
        Self::F7_690,
        Self::F8_745,
        Self::F5_550,
        Self::Vis3,
        Self::Fd3,
    ];

    /// Returns the slot at `index`, if any.
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < CHANNEL_COUNT {
            Some(Self::ALL[index])
        } else {
            None
        }
    }

    /// Position of the channel in the data block.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Peak wavelength in nanometres, or `None` for the clear and flicker slots.
    pub const fn wavelength_nm(self) -> Option<u16> {
        match self {
            Self::F1_405 => Some(405),
            Self::F2_425 => Some(425),
            Self::Fz450 => Some(450),
            Self::F3_475 => Some(475),
            Self::F4_515 => Some(515),
            Self::F5_550 => Some(550),
            Self::Fy555 => Some(555),
            Self::Fxl600 => Some(600),
            Self::F6_640 => Some(640),
            Self::F7_690 => Some(690),
            Self::F8_745 => Some(745),
            Self::Nir855 => Some(855),
            Self::Vis1 | Self::Vis2 | Self::Vis3 | Self::Fd1 | Self::Fd2 | Self::Fd3 => None,
        }
    }

    /// Whether the slot is populated under the given auto-SMUX mode.
    pub const fn is_read_in(self, mode: AutoSmux) -> bool {
        self.index() < mode.channel_count()
    }
}

/// Last channel values read from the data block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelData {
    counts: [u16; CHANNEL_COUNT],
}

impl ChannelData {
    /// Zeroed channel data.
    pub const fn new() -> Self {
        Self {
            counts: [0; CHANNEL_COUNT],
        }
    }

    /// Decodes the raw little-endian data block.
    pub fn from_le_bytes(raw: &[u8; CHANNEL_DATA_BYTES]) -> Self {
        let mut counts = [0u16; CHANNEL_COUNT];
        for (count, pair) in counts.iter_mut().zip(raw.chunks_exact(2)) {
            *count = u16::from_le_bytes([pair[0], pair[1]]);
        }
        Self { counts }
    }

    /// Returns the count at `index`, or `0` when the index is out of range.
    pub fn get(&self, index: usize) -> u16 {
        self.counts.get(index).copied().unwrap_or(0)
    }

    /// Returns the count for a named slot.
    pub fn channel(&self, channel: Channel) -> u16 {
        self.counts[channel.index()]
    }

    /// Returns every slot as a slice.
    pub fn as_slice(&self) -> &[u16] {
        &self.counts
    }
}

impl Default for ChannelData {
    fn default() -> Self {
        Self::new()
    }
}
