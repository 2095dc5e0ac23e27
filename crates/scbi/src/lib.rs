//! Decode SCBI solar-heating controller CAN traffic into named readings.
//!
//! A controller on the bus broadcasts sensor values, relay states and yield
//! statistics as CAN frames. This crate turns those frames into
//! `(kind, name, value)` parameter records and hands them to a publisher.
//!
//! # Crate Structure
//!
//! - [`transport`]: SocketCAN frame source with timeout and shutdown wake
//! - [`frame`]: identifier codec and payload decoder (pure, no I/O)
//! - [`bridge`]: receive → decode → publish loop (behind `bridge` feature)

/// Re-export transport types.
pub mod transport {
    pub use scbi_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use scbi_frame::*;
}

/// Re-export bridge types (requires `bridge` feature).
#[cfg(feature = "bridge")]
pub mod bridge {
    pub use scbi_bridge::*;
}
