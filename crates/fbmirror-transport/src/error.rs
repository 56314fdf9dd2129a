/// Errors that can occur while opening or using a serial link.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the port at the given address.
    #[error("failed to open {address}: {source}")]
    Open {
        address: String,
        source: std::io::Error,
    },

    /// Failed to enumerate the host's serial ports.
    #[error("failed to enumerate serial ports: {0}")]
    Enumerate(String),

    /// An I/O error occurred on an open link.
    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The link has already been closed.
    #[error("link closed")]
    Closed,
}

impl From<serialport::Error> for TransportError {
    fn from(err: serialport::Error) -> Self {
        TransportError::Io(err.into())
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
