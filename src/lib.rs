//! CCU Timesync: async clients for a carriage-return-framed CCU control
//! protocol over TCP and for SNTP time fetch over UDP.
//!
//! The library covers three pieces: a framed stream client that talks to the
//! device ([`DeviceClient`]), a one-shot SNTP client that fetches UTC time
//! from a remote server ([`SntpClient`]), and the pure codec for the device's
//! clock command strings ([`protocol::codec`]). Orchestration of a full
//! read-update-verify cycle is left to the caller.
pub mod core;

pub mod network;
pub mod protocol;

// Re-export commonly used items
pub use crate::core::{ClockTime, DeviceConfig, Error, Result, SntpConfig};
pub use crate::network::{DeviceClient, SntpClient};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
