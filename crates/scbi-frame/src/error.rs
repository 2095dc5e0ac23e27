use crate::id::{Function, ProtocolVariant};

/// Anomalies reported while decoding a frame payload.
///
/// None of these are fatal; callers log them and move on to the next frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    /// The payload is shorter than the fixed layout of its function.
    #[error("short payload for {function} ({len} bytes, {required} required)")]
    ShortPayload {
        function: Function,
        len: usize,
        required: usize,
    },

    /// Bulk and update variants have no defined single-frame layout.
    #[error("unsupported protocol variant {0}")]
    UnsupportedVariant(ProtocolVariant),
}

pub type Result<T> = std::result::Result<T, PayloadError>;
