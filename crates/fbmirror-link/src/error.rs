/// Errors that can occur while managing the device link.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Transport-level error (open, enumerate, link I/O).
    #[error("transport error: {0}")]
    Transport(#[from] fbmirror_transport::TransportError),

    /// I/O error on an open connection.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before or during the operation.
    #[error("connection closed")]
    Closed,

    /// The run signal was cleared before the connection was established.
    #[error("cancelled")]
    Cancelled,

    /// A worker thread could not be started.
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, LinkError>;
