//! Internal logging shims.
//!
//! Forward to `defmt` when the `defmt` feature is enabled and expand to nothing
//! otherwise, so call sites never need their own `cfg` guards.

macro_rules! trace {
    ($($e:expr),* $(,)?) => {
        #[cfg(feature = "defmt")]
        ::defmt::trace!($($e),*);
        #[cfg(not(feature = "defmt"))]
        { $( let _ = &$e; )* }
    };
}

pub(crate) use trace;

macro_rules! debug {
    ($($e:expr),* $(,)?) => {
        #[cfg(feature = "defmt")]
        ::defmt::debug!($($e),*);
        #[cfg(not(feature = "defmt"))]
        { $( let _ = &$e; )* }
    };
}

pub(crate) use debug;

macro_rules! warn_impl {
    ($($e:expr),* $(,)?) => {
        #[cfg(feature = "defmt")]
        ::defmt::warn!($($e),*);
        #[cfg(not(feature = "defmt"))]
        { $( let _ = &$e; )* }
    };
}

pub(crate) use warn_impl as warn;
