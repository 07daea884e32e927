use std::borrow::Cow;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::core::{ClockTime, Error, Result, SNTP_PACKET_SIZE};
use super::{RESPONSE_TEMPLATE, SET_CLOCK_PREFIX};

/// Byte offset of the 14 timestamp digits within [`RESPONSE_TEMPLATE`]
const TIMESTAMP_OFFSET: usize = 14;

/// Length of the yyyymmddhhmmss timestamp field
const TIMESTAMP_LEN: usize = 14;

/// Byte offset of the transmit-timestamp seconds field in an SNTP reply
const TRANSMIT_SECONDS_OFFSET: usize = 40;

/// Decodes a get-clock response into a structured clock time
///
/// The device occasionally drops the first byte or two of a reply. A response
/// shorter than the template is left-padded with the template's own leading
/// characters before the fixed-offset fields are extracted, which recovers
/// the constant prefix without inventing timestamp digits.
pub fn decode_clock_response(raw: &str) -> Result<ClockTime> {
    let padded: Cow<'_, str> = if raw.len() < RESPONSE_TEMPLATE.len() {
        let missing = RESPONSE_TEMPLATE.len() - raw.len();
        Cow::Owned(format!("{}{}", &RESPONSE_TEMPLATE[..missing], raw))
    } else {
        Cow::Borrowed(raw)
    };

    let digits = padded
        .get(TIMESTAMP_OFFSET..TIMESTAMP_OFFSET + TIMESTAMP_LEN)
        .ok_or_else(|| {
            Error::protocol_format(format!("response too short to decode: {:?}", raw))
        })?;

    let naive = NaiveDateTime::parse_from_str(digits, "%Y%m%d%H%M%S").map_err(|e| {
        Error::protocol_format(format!("bad timestamp field {:?}: {}", digits, e))
    })?;

    Ok(naive.into())
}

/// Encodes a set-clock command for the given clock time
///
/// Produces `R,DSCLK,yyyymmddhhmmss` followed by the terminator. The device
/// sends no response to this command.
pub fn encode_set_clock(time: &ClockTime) -> String {
    format!(
        "{}{:04}{:02}{:02}{:02}{:02}{:02}\r",
        SET_CLOCK_PREFIX, time.year, time.month, time.day, time.hour, time.minute, time.second
    )
}

/// Decodes the transmit timestamp of an SNTP reply into a UTC instant
///
/// Bytes 40-43 carry whole seconds and bytes 44-47 the 2^-32 fraction, both
/// big-endian, counted from the NTP epoch 1900-01-01T00:00:00Z.
pub fn decode_sntp_timestamp(packet: &[u8]) -> Result<DateTime<Utc>> {
    if packet.len() < SNTP_PACKET_SIZE {
        return Err(Error::protocol_format(format!(
            "SNTP reply too short: {} bytes, expected {}",
            packet.len(),
            SNTP_PACKET_SIZE
        )));
    }

    let seconds = u32::from_be_bytes(
        packet[TRANSMIT_SECONDS_OFFSET..TRANSMIT_SECONDS_OFFSET + 4]
            .try_into()
            .unwrap(),
    ) as u64;
    let fraction = u32::from_be_bytes(
        packet[TRANSMIT_SECONDS_OFFSET + 4..TRANSMIT_SECONDS_OFFSET + 8]
            .try_into()
            .unwrap(),
    ) as u64;

    let milliseconds = seconds * 1000 + ((fraction * 1000) >> 32);

    let epoch = NaiveDate::from_ymd_opt(1900, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap();

    Ok(Utc.from_utc_datetime(&(epoch + Duration::milliseconds(milliseconds as i64))))
}
