//! Error types for link-cable networking

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    /// Failed to reach the peer
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },
    /// Failed to bind the listening socket
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    /// Socket failed after the connection was established
    #[error("link I/O failed: {0}")]
    Io(#[from] io::Error),
}
