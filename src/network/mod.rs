//! Network clients for the device stream protocol and the SNTP exchange
//!
//! Both clients resolve host names through the runtime's resolver and report
//! failures as values; nothing in this module panics on I/O errors.

mod device;
mod sntp;

pub use self::device::DeviceClient;
pub use self::sntp::SntpClient;

use std::net::SocketAddr;

use tokio::net::lookup_host;

use crate::core::{Error, Result};

/// Resolves a host:port pair to its first socket address
pub(crate) async fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    let mut addrs = lookup_host((host, port))
        .await
        .map_err(|e| Error::connection(format!("failed to resolve {}: {}", host, e)))?;
    addrs
        .next()
        .ok_or_else(|| Error::connection(format!("no addresses found for {}", host)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_literal_address() {
        let addr = resolve("127.0.0.1", 10001).await.unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:10001");
    }

    #[tokio::test]
    async fn test_resolve_failure_is_connection_error() {
        let result = resolve("host.invalid", 10001).await;
        assert!(matches!(result, Err(Error::Connection(_))));
    }
}
