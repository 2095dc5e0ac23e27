//! SCBI CAN identifier codec and payload decoder.
//!
//! This is the core value-add layer of the bridge. Every frame is decoded in
//! two pure steps:
//! - the 32-bit identifier becomes an [`Envelope`] of discriminator fields
//! - the payload becomes zero or more [`ParameterRecord`]s, selected by the
//!   envelope's function code
//!
//! No I/O happens here; unknown codes survive decoding untouched.

pub mod codec;
pub mod error;
pub mod id;
pub mod layout;
pub mod param;

pub use codec::{decode_frame, decode_payload, RawFrame, MAX_PAYLOAD};
pub use error::{PayloadError, Result};
pub use id::{decode_id, encode_id, Envelope, Function, MessageKind, Program, ProtocolVariant};
pub use layout::{
    OverviewPeriod, OverviewStat, Payload, RelayExtFunction, RelayMode, RelayState, SensorReading,
    SensorType, FIXED_LAYOUT_LEN,
};
pub use param::{ParameterKind, ParameterRecord};
