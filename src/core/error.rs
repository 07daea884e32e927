use std::io;
use thiserror::Error;

/// Custom error types for CCU Timesync
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Protocol format error: {0}")]
    ProtocolFormat(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Not connected")]
    NotConnected,
}

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates a new connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Error::Connection(msg.into())
    }

    /// Creates a new transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Error::Transport(msg.into())
    }

    /// Creates a new protocol format error
    pub fn protocol_format(msg: impl Into<String>) -> Self {
        Error::ProtocolFormat(msg.into())
    }

    /// Creates a new timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Error::Timeout(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::protocol_format("test error");
        assert!(matches!(err, Error::ProtocolFormat(_)));
        assert_eq!(err.to_string(), "Protocol format error: test error");
    }

    #[test]
    fn test_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::Other, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_not_connected_display() {
        assert_eq!(Error::NotConnected.to_string(), "Not connected");
    }
}
