use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::core::{ConnectionState, DeviceConfig, Error, Result, RECV_CHUNK_SIZE};
use crate::protocol::TERMINATOR;

/// One fully assembled frame, or whatever had accumulated when the peer
/// closed its end
struct Frame {
    text: String,
    peer_closed: bool,
}

/// Client for the device's carriage-return-framed control stream
///
/// Owns a single outbound TCP connection. The device protocol has no request
/// identifiers, so the caller must finish (or abandon) one exchange before
/// starting the next; at most one send and one receive may be in flight per
/// client. Every operation resolves to a value before returning, and dropping
/// an in-flight future (for instance from a `tokio::select!` arm) cancels the
/// underlying I/O.
pub struct DeviceClient {
    /// Client configuration
    config: DeviceConfig,
    /// The device connection, present only while usable
    stream: Option<TcpStream>,
    /// Connection lifecycle state
    state: ConnectionState,
}

impl DeviceClient {
    /// Creates a client for the configured device; no I/O happens until
    /// [`connect`](Self::connect)
    pub fn new(config: DeviceConfig) -> Self {
        DeviceClient {
            config,
            stream: None,
            state: ConnectionState::Unconnected,
        }
    }

    /// Returns the connection lifecycle state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Returns whether the client currently holds a usable connection
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected && self.stream.is_some()
    }

    /// Opens the connection to the configured device
    ///
    /// Resolution and connect failures come back as [`Error::Connection`] and
    /// leave the client in the `Closed` state; calling again retries from
    /// scratch. Connecting while already connected is a no-op.
    pub async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }

        self.state = ConnectionState::Connecting;
        let addr = match super::resolve(&self.config.host, self.config.port).await {
            Ok(addr) => addr,
            Err(e) => {
                self.state = ConnectionState::Closed;
                return Err(e);
            }
        };

        match TcpStream::connect(addr).await {
            Ok(stream) => {
                debug!(%addr, "connected to device");
                self.stream = Some(stream);
                self.state = ConnectionState::Connected;
                Ok(())
            }
            Err(e) => {
                warn!(%addr, error = %e, "device connection failed");
                self.state = ConnectionState::Closed;
                Err(Error::connection(format!(
                    "failed to connect to {}: {}",
                    addr, e
                )))
            }
        }
    }

    /// Sends one command string to the device
    ///
    /// The command must be ASCII (the device understands nothing else) and
    /// should carry its own terminator. Returns [`Error::NotConnected`]
    /// without touching the socket when no connection is open. The whole
    /// buffer is written before this resolves; there is no partial-write
    /// retry above what the transport itself does.
    pub async fn send_command(&mut self, command: &str) -> Result<()> {
        if !command.is_ascii() {
            return Err(Error::protocol_format(
                "device commands must be ASCII".to_string(),
            ));
        }

        let stream = match (self.state, self.stream.as_mut()) {
            (ConnectionState::Connected, Some(stream)) => stream,
            _ => return Err(Error::NotConnected),
        };

        let written = stream.write_all(command.as_bytes()).await;
        match written {
            Ok(()) => {
                debug!(len = command.len(), "command sent");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "send failed, closing connection");
                self.stream = None;
                self.state = ConnectionState::Closed;
                Err(Error::transport(format!("send failed: {}", e)))
            }
        }
    }

    /// Receives one response from the device
    ///
    /// Reads fixed-size chunks into a per-call accumulator until the last
    /// byte of a chunk is the carriage-return terminator, then returns the
    /// assembled text (terminator included). A clean close by the peer
    /// delivers the accumulation instead, provided more than one byte
    /// arrived; the device firmware occasionally emits a stray byte before
    /// closing, and a single byte is not a response (a quirk kept for
    /// compatibility, not a protocol rule).
    ///
    /// When [`DeviceConfig::read_timeout`] is set, the whole assembly loop
    /// runs under that deadline and expiry yields [`Error::Timeout`]; with
    /// `None` the call waits as long as the peer stays silent.
    pub async fn receive_response(&mut self) -> Result<String> {
        let read_timeout = self.config.read_timeout;
        let stream = match (self.state, self.stream.as_mut()) {
            (ConnectionState::Connected, Some(stream)) => stream,
            _ => return Err(Error::NotConnected),
        };

        let outcome = match read_timeout {
            Some(limit) => match timeout(limit, assemble_frame(stream)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(Error::timeout(format!(
                    "no complete response within {:?}",
                    limit
                ))),
            },
            None => assemble_frame(stream).await,
        };

        let frame = match outcome {
            Ok(frame) => frame,
            Err(e) => {
                // On expiry a partial frame may still be in flight; either
                // way the stream can no longer start a clean exchange.
                warn!(error = %e, "receive failed, closing connection");
                self.stream = None;
                self.state = ConnectionState::Closed;
                return Err(e);
            }
        };

        if frame.peer_closed {
            debug!("peer closed during receive");
            self.stream = None;
            self.state = ConnectionState::Closed;
            if frame.text.len() > 1 {
                return Ok(frame.text);
            }
            return Err(Error::connection(
                "connection closed before a response was assembled".to_string(),
            ));
        }

        debug!(len = frame.text.len(), "response assembled");
        Ok(frame.text)
    }

    /// Shuts the connection down in both directions and releases it
    ///
    /// Idempotent: closing an already closed or never-connected client does
    /// nothing.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                debug!(error = %e, "shutdown reported an error");
            }
            debug!("device connection closed");
            self.state = ConnectionState::Closed;
        } else if self.state == ConnectionState::Connecting {
            self.state = ConnectionState::Closed;
        }
    }
}

/// Accumulates chunks until a chunk ends with the terminator or the peer
/// closes
///
/// Only the final byte of each chunk is inspected, which matches the device's
/// one-message-per-exchange framing; the message itself has no length cap.
async fn assemble_frame(stream: &mut TcpStream) -> Result<Frame> {
    let mut chunk = [0u8; RECV_CHUNK_SIZE];
    let mut accumulator = BytesMut::new();

    loop {
        let n = stream
            .read(&mut chunk)
            .await
            .map_err(|e| Error::transport(format!("read failed: {}", e)))?;

        if n == 0 {
            return Ok(Frame {
                text: String::from_utf8_lossy(&accumulator).into_owned(),
                peer_closed: true,
            });
        }

        accumulator.extend_from_slice(&chunk[..n]);

        if chunk[n - 1] == TERMINATOR {
            return Ok(Frame {
                text: String::from_utf8_lossy(&accumulator).into_owned(),
                peer_closed: false,
            });
        }
    }
}
