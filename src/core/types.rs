use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use super::error::{Error, Result};

/// Connection lifecycle of the device stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No connection has been attempted yet
    Unconnected,
    /// A connect is in flight
    Connecting,
    /// The stream is open and usable
    Connected,
    /// The connection was closed, orderly or after a fatal error
    Closed,
}

/// A calendar timestamp as the device's clock protocol represents it
///
/// The device has no notion of time zone; whether a `ClockTime` means UTC or
/// local time is decided by the caller that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockTime {
    /// Four-digit year
    pub year: i32,
    /// Month (1-12)
    pub month: u32,
    /// Day of month (1-31)
    pub day: u32,
    /// Hour (0-23)
    pub hour: u32,
    /// Minute (0-59)
    pub minute: u32,
    /// Second (0-59)
    pub second: u32,
}

impl ClockTime {
    /// Creates a clock time from its calendar fields
    pub fn new(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Self {
        ClockTime {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    /// Converts to a calendar date-time, rejecting impossible field values
    pub fn to_naive(&self) -> Result<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
            .and_then(|d| d.and_hms_opt(self.hour, self.minute, self.second))
            .ok_or_else(|| {
                Error::protocol_format(format!("invalid calendar fields: {}", self))
            })
    }

    /// Converts to a UTC instant, rejecting impossible field values
    pub fn to_utc(&self) -> Result<DateTime<Utc>> {
        Ok(Utc.from_utc_datetime(&self.to_naive()?))
    }
}

impl From<NaiveDateTime> for ClockTime {
    fn from(dt: NaiveDateTime) -> Self {
        ClockTime {
            year: dt.year(),
            month: dt.month(),
            day: dt.day(),
            hour: dt.hour(),
            minute: dt.minute(),
            second: dt.second(),
        }
    }
}

impl From<DateTime<Utc>> for ClockTime {
    fn from(dt: DateTime<Utc>) -> Self {
        dt.naive_utc().into()
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Configuration for the device stream client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Device host name or IP address
    pub host: String,
    /// Device control port
    pub port: u16,
    /// Deadline for assembling one response; `None` waits indefinitely,
    /// which is how the device firmware expects to be talked to
    pub read_timeout: Option<Duration>,
}

impl DeviceConfig {
    /// Creates a config for the given host on the default control port
    pub fn new(host: impl Into<String>) -> Self {
        DeviceConfig {
            host: host.into(),
            ..Default::default()
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            host: String::new(),
            port: super::DEFAULT_DEVICE_PORT,
            read_timeout: None,
        }
    }
}

/// Configuration for the SNTP time fetch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SntpConfig {
    /// Time server host name or IP address
    pub server: String,
    /// Time service port
    pub port: u16,
    /// How long to wait for the server's reply
    pub timeout: Duration,
}

impl SntpConfig {
    /// Creates a config for the given time server on the well-known port
    pub fn new(server: impl Into<String>) -> Self {
        SntpConfig {
            server: server.into(),
            ..Default::default()
        }
    }
}

impl Default for SntpConfig {
    fn default() -> Self {
        SntpConfig {
            // The reference utility's default time source
            server: "time.nist.gov".to_string(),
            port: super::NTP_PORT,
            timeout: Duration::from_millis(super::DEFAULT_SNTP_TIMEOUT_MS),
        }
    }
}
