//! Error handling primitives for the AS7343 driver.

/// Crate-wide result type alias.
pub type Result<T, E> = core::result::Result<T, Error<E>>;

/// Error variants produced by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Any error reported by the underlying bus interface.
    Interface(E),
    /// No bus interface has been attached to the driver.
    NotAttached,
    /// The provided configuration parameters are invalid.
    InvalidConfig,
    /// A bulk read transferred fewer bytes than requested.
    ShortRead {
        /// Number of bytes requested.
        expected: usize,
        /// Number of bytes the bus reported.
        actual: usize,
    },
    /// The `ID` register did not contain the AS7343 part number.
    DeviceIdMismatch(u8),
    /// The device reported a field encoding outside the documented set.
    InvalidValue(u8),
}

impl<E> From<E> for Error<E> {
    fn from(err: E) -> Self {
        Self::Interface(err)
    }
}
