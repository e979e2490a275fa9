//! Logging.
//!
//! With the `tracing` feature the `debug!`, `info!` and `warn!` macros are the
//! `tracing` ones; without it they expand to nothing. The locator's per-path
//! events go through the helpers below so every front end sees the same
//! messages.

use crate::locate::{Rejection, TapeSegment};

#[cfg(feature = "tracing")]
pub use tracing::{debug, info, warn};

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub use crate::{debug, info, warn};

/// An accepted tape, at info level.
#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
pub fn tape_identified(segment: &TapeSegment) {
    info!(
        path = %segment.path_id,
        length = segment.length,
        width = segment.width,
        "{segment}"
    );
}

/// A skipped sentinel path, at warn level.
#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
pub fn candidate_rejected(rejection: &Rejection) {
    warn!(path = %rejection.path_id, "{rejection}");
}
