//! Logging macros.
//! Forwarded to `tracing` when the `tracing` feature is on, no-ops otherwise.

#[cfg(feature = "tracing")]
pub(crate) use tracing::{debug, info};

#[cfg(not(feature = "tracing"))]
macro_rules! debug {
    ($($t: tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! info {
    ($($t: tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub(crate) use debug;
#[cfg(not(feature = "tracing"))]
pub(crate) use info;
