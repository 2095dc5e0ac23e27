/// Errors that can occur in bridge operations.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] scbi_transport::TransportError),

    /// The parameter queue is at capacity; the record was dropped.
    #[error("parameter queue full ({capacity} records)")]
    QueueFull { capacity: usize },

    /// A publisher failed to deliver or service its connection.
    #[error("publish failed: {0}")]
    Publish(String),

    /// I/O error inside a publisher.
    #[error("publisher I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
