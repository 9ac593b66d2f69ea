//! Configuration primitives for the AS7343 driver.

use crate::params::{AutoSmux, Gain, Persistence, ThresholdChannel};
use crate::registers::{ASTEP_NS, ASTEP_RESERVED};

/// User-facing measurement configuration for the AS7343 sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Spectral analog gain.
    pub gain: Gain,
    /// Automatic SMUX channel read-out.
    pub auto_smux: AutoSmux,
    /// Number of integration steps minus one (`ATIME`).
    pub atime: u8,
    /// Integration step size minus one, in 2.78 µs units (`ASTEP`).
    pub astep: u16,
    /// Wait time between measurements (`WTIME`).
    pub wait_time: u8,
    /// Enables the wait state between measurements.
    pub wait_enabled: bool,
    /// Channel compared against the spectral thresholds.
    pub threshold_channel: ThresholdChannel,
    /// Spectral interrupt persistence.
    pub persistence: Persistence,
}

impl Config {
    /// Begins building a [`Config`] using the builder pattern.
    pub fn new() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Checks whether this configuration is valid according to datasheet rules.
    pub fn validate(&self) -> core::result::Result<(), ConfigError> {
        if self.astep == ASTEP_RESERVED {
            return Err(ConfigError::ReservedStep);
        }

        if self.atime == 0 && self.astep == 0 {
            return Err(ConfigError::ZeroIntegration);
        }

        Ok(())
    }

    /// Integration time in microseconds for a single ADC cycle.
    pub fn integration_time_us(&self) -> u32 {
        integration_time_us(self.atime, self.astep)
    }
}

/// Integration time in microseconds for the given `ATIME`/`ASTEP` pair.
pub fn integration_time_us(atime: u8, astep: u16) -> u32 {
    let steps = (atime as u64 + 1) * (astep as u64 + 1);
    (steps * ASTEP_NS as u64 / 1_000) as u32
}

/// Builder for [`Config`] allowing piecemeal construction.
#[derive(Debug, Clone, Copy)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Creates a new builder seeded with [`Config::default()`].
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Overrides the analog gain.
    pub fn gain(mut self, gain: Gain) -> Self {
        self.config.gain = gain;
        self
    }

    /// Overrides the auto-SMUX mode.
    pub fn auto_smux(mut self, auto_smux: AutoSmux) -> Self {
        self.config.auto_smux = auto_smux;
        self
    }

    /// Sets the integration step count and size.
    pub fn integration(mut self, atime: u8, astep: u16) -> Self {
        self.config.atime = atime;
        self.config.astep = astep;
        self
    }

    /// Sets and enables the wait time between measurements.
    pub fn wait_time(mut self, wait_time: u8) -> Self {
        self.config.wait_time = wait_time;
        self.config.wait_enabled = true;
        self
    }

    /// Sets the spectral threshold channel.
    pub fn threshold_channel(mut self, channel: ThresholdChannel) -> Self {
        self.config.threshold_channel = channel;
        self
    }

    /// Sets the spectral interrupt persistence.
    pub fn persistence(mut self, persistence: Persistence) -> Self {
        self.config.persistence = persistence;
        self
    }

    /// Finalizes the builder and returns the [`Config`].
    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gain: Gain::X256,
            auto_smux: AutoSmux::Channels6,
            atime: 0,
            astep: 999,
            wait_time: 0,
            wait_enabled: false,
            threshold_channel: ThresholdChannel::Channel0,
            persistence: Persistence::EVERY_CYCLE,
        }
    }
}

/// Validation errors generated while verifying a [`Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// `ASTEP` is set to the reserved value 65535.
    ReservedStep,
    /// Both `ATIME` and `ASTEP` are zero, which yields no integration.
    ZeroIntegration,
}
