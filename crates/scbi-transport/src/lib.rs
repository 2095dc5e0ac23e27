//! SocketCAN frame source for SCBI heating-controller buses.
//!
//! Provides the lowest layer of the bridge: a raw CAN socket that can be
//! waited on with a timeout and interrupted for shutdown.
//! Everything else builds on the [`FrameSource`] trait provided here.

pub mod error;
pub mod traits;

#[cfg(target_os = "linux")]
pub mod socket;
#[cfg(target_os = "linux")]
pub mod wake;

pub use error::{Result, TransportError};
pub use traits::{CanFrame, FrameSource, Received, CAN_MAX_DLEN};

#[cfg(target_os = "linux")]
pub use socket::CanSocket;
#[cfg(target_os = "linux")]
pub use wake::Waker;
