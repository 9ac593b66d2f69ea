//! Bus interface abstraction for the AS7343 driver.

pub mod i2c;

/// Abstraction over the low-level bus access required by the driver.
///
/// Implementations only move bytes; register bank selection is handled by
/// [`As7343`](crate::As7343).
pub trait As7343Interface {
    /// Error type produced by the concrete bus implementation.
    type Error;

    /// Writes a single register.
    fn write_register(&mut self, register: u8, value: u8) -> core::result::Result<(), Self::Error>;

    /// Reads a single register.
    fn read_register(&mut self, register: u8) -> core::result::Result<u8, Self::Error>;

    /// Reads consecutive registers into `buf` and returns the number of bytes transferred.
    fn read_many(&mut self, register: u8, buf: &mut [u8]) -> core::result::Result<usize, Self::Error>;

    /// Writes multiple consecutive registers from the provided buffer.
    fn write_many(&mut self, register: u8, data: &[u8]) -> core::result::Result<(), Self::Error>;

    /// Writes a little-endian 16-bit register pair.
    fn write_word(&mut self, register: u8, value: u16) -> core::result::Result<(), Self::Error> {
        self.write_many(register, &value.to_le_bytes())
    }
}
