#![no_std]
//! Platform-agnostic driver for the ams-OSRAM AS7343 spectral sensor.
//!
//! The AS7343 splits its register file into two banks selected by `CFG0.REG_BANK`.
//! [`As7343`] tracks the selected bank and switches it transparently before each
//! access, and every single-field update is a read-modify-write so neighbouring
//! bits are never disturbed.
//!
//! ```rust,no_run
//! use as7343::{As7343, Config};
//! use as7343::params::{AutoSmux, Gain};
//! # use embedded_hal_mock::eh1::{delay::NoopDelay, i2c::Mock};
//! # let i2c = Mock::new(&[]);
//! # let mut delay = NoopDelay::new();
//!
//! let config = Config::new()
//!     .gain(Gain::X64)
//!     .auto_smux(AutoSmux::Channels18)
//!     .build();
//! let mut sensor = As7343::new_i2c(i2c, config);
//! sensor.init(&mut delay).unwrap();
//!
//! let data = sensor.read_all_channels().unwrap();
//! let _nir = data.get(3);
//! ```

mod error;
mod log;

pub mod channels;
pub mod config;
pub mod device;
pub mod interface;
pub mod params;
pub mod registers;

pub use crate::channels::{Channel, ChannelData};
pub use crate::config::Config;
pub use crate::device::As7343;
pub use crate::error::{Error, Result};
