//! Core types shared by the network clients and the protocol codec
//!
//! This module contains the error type, structured time value, and the
//! configuration structs used throughout the library.

pub mod error;
pub mod types;

pub use self::error::{Error, Result};
pub use self::types::{
    ClockTime,
    ConnectionState,
    DeviceConfig,
    SntpConfig,
};

/// Default TCP port of the device's control interface
pub const DEFAULT_DEVICE_PORT: u16 = 10001;

/// Well-known UDP port for the NTP service
pub const NTP_PORT: u16 = 123;

/// Fixed size of an SNTP request/response packet in bytes
pub const SNTP_PACKET_SIZE: usize = 48;

/// Size of one receive chunk when assembling a device response
pub const RECV_CHUNK_SIZE: usize = 256;

/// Default receive timeout for the SNTP exchange in milliseconds
pub const DEFAULT_SNTP_TIMEOUT_MS: u64 = 3000;
