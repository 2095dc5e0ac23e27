//! Dispatch loop bridging an SCBI CAN bus to a parameter publisher.
//!
//! This is the "just works" layer: hand a [`Bridge`] any
//! [`FrameSource`](scbi_transport::FrameSource) and any [`Publisher`], then
//! [`run`](Bridge::run) it until the shutdown flag clears.

pub mod dispatch;
pub mod error;
pub mod publisher;
pub mod queue;

pub use dispatch::{Bridge, BridgeConfig, BridgeStats, Cycle};
pub use error::{BridgeError, Result};
pub use publisher::Publisher;
pub use queue::{ParameterQueue, DEFAULT_QUEUE_CAPACITY};
