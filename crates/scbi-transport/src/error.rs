/// Errors that can occur in CAN transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The raw CAN socket could not be created or bound.
    #[error("failed to open CAN socket: {0}")]
    Open(std::io::Error),

    /// The interface name could not be resolved to an interface index.
    #[error("failed to address CAN interface {interface}: {source}")]
    Address {
        interface: String,
        source: std::io::Error,
    },

    /// An I/O error occurred while waiting for or reading a frame.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The interface name does not fit into `IFNAMSIZ`.
    #[error("interface name too long ({len} bytes, max {max}): {interface}")]
    InterfaceNameTooLong {
        interface: String,
        len: usize,
        max: usize,
    },

    /// The kernel handed out a frame that could not be interpreted.
    #[error("malformed CAN frame: {0}")]
    Malformed(std::io::Error),

    /// The transport has been woken for shutdown.
    #[error("transport shut down")]
    Shutdown,
}

pub type Result<T> = std::result::Result<T, TransportError>;
