use chrono::{DateTime, Utc};
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::core::{Error, Result, SntpConfig, SNTP_PACKET_SIZE};
use crate::protocol::{codec, SNTP_CLIENT_REQUEST};

/// One-shot SNTP client for fetching authoritative UTC time
///
/// Each [`fetch_time`](Self::fetch_time) call is an independent exchange on a
/// fresh ephemeral socket; there is no session state to share or poison. The
/// result is strictly UTC; converting to local time is the caller's business.
pub struct SntpClient {
    /// Client configuration
    config: SntpConfig,
}

impl SntpClient {
    /// Creates a client for the configured time server
    pub fn new(config: SntpConfig) -> Self {
        SntpClient { config }
    }

    /// Creates a client for the given server with default port and timeout
    pub fn with_server(server: impl Into<String>) -> Self {
        SntpClient {
            config: SntpConfig::new(server),
        }
    }

    /// Fetches the current UTC time from the configured server
    ///
    /// Sends the fixed 48-byte client request and decodes the transmit
    /// timestamp of the reply. Waits at most [`SntpConfig::timeout`] for the
    /// reply; an unreachable or filtered server yields [`Error::Timeout`]
    /// rather than a hang.
    pub async fn fetch_time(&self) -> Result<DateTime<Utc>> {
        let addr = super::resolve(&self.config.server, self.config.port).await?;

        let bind_addr = if addr.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(bind_addr).await?;
        socket
            .connect(addr)
            .await
            .map_err(|e| Error::connection(format!("failed to reach {}: {}", addr, e)))?;

        let mut request = [0u8; SNTP_PACKET_SIZE];
        request[0] = SNTP_CLIENT_REQUEST;
        socket
            .send(&request)
            .await
            .map_err(|e| Error::transport(format!("send failed: {}", e)))?;

        let mut reply = [0u8; SNTP_PACKET_SIZE];
        let received = match timeout(self.config.timeout, socket.recv(&mut reply)).await {
            Ok(Ok(len)) => len,
            Ok(Err(e)) => return Err(Error::transport(format!("receive failed: {}", e))),
            Err(_) => {
                warn!(server = %self.config.server, timeout = ?self.config.timeout, "no SNTP reply");
                return Err(Error::timeout(format!(
                    "no reply from {} within {:?}",
                    self.config.server, self.config.timeout
                )));
            }
        };

        let instant = codec::decode_sntp_timestamp(&reply[..received])?;
        debug!(server = %self.config.server, %instant, "time fetched");
        Ok(instant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio::task::JoinHandle;

    /// Starts a scripted time server that answers one request with the given
    /// reply bytes, after checking the request header byte.
    async fn spawn_server(reply: Vec<u8>) -> (SocketAddr, JoinHandle<()>) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let mut buf = [0u8; SNTP_PACKET_SIZE];
            let (len, peer) = socket.recv_from(&mut buf).await.unwrap();
            assert_eq!(len, SNTP_PACKET_SIZE);
            assert_eq!(buf[0], SNTP_CLIENT_REQUEST);
            socket.send_to(&reply, peer).await.unwrap();
        });
        (addr, handle)
    }

    fn client_for(addr: SocketAddr, timeout: Duration) -> SntpClient {
        SntpClient::new(SntpConfig {
            server: addr.ip().to_string(),
            port: addr.port(),
            timeout,
        })
    }

    #[tokio::test]
    async fn test_fetch_time_decodes_reply() {
        let mut reply = vec![0u8; SNTP_PACKET_SIZE];
        // Transmit timestamp: the Unix epoch in 1900-based seconds
        reply[40..44].copy_from_slice(&0x83AA7E80u32.to_be_bytes());

        let (addr, handle) = spawn_server(reply).await;
        let client = client_for(addr, Duration::from_secs(5));

        let instant = client.fetch_time().await.unwrap();
        assert_eq!(instant, Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap());
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_time_times_out() {
        // A bound socket that never answers
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();

        let client = client_for(addr, Duration::from_millis(100));
        let result = client.fetch_time().await;
        assert!(matches!(result, Err(Error::Timeout(_))));
    }

    #[tokio::test]
    async fn test_fetch_time_rejects_short_reply() {
        let (addr, handle) = spawn_server(vec![0u8; 4]).await;
        let client = client_for(addr, Duration::from_secs(5));

        let result = client.fetch_time().await;
        assert!(matches!(result, Err(Error::ProtocolFormat(_))));
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_resolution_failure_is_connection_error() {
        let client = SntpClient::with_server("host.invalid");
        let result = client.fetch_time().await;
        assert!(matches!(result, Err(Error::Connection(_))));
    }
}
