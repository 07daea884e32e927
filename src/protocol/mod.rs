//! Wire formats for the device line protocol and the SNTP exchange
//!
//! The device speaks ASCII commands terminated by a single carriage return,
//! with no length prefix and no escaping. The SNTP side is the fixed 48-byte
//! binary packet of RFC 2030.

pub mod codec;

pub use self::codec::{decode_clock_response, decode_sntp_timestamp, encode_set_clock};

/// Carriage-return byte that terminates every device command and response
pub const TERMINATOR: u8 = 0x0D;

/// Command that asks the device for its current clock
pub const GET_CLOCK_COMMAND: &str = "R,DGCLK\r";

/// Shape of a get-clock response; doubles as the padding source when the
/// transport drops leading bytes of a reply
pub const RESPONSE_TEMPLATE: &str = "R,RQRES,DGCLK,yyyymmddhhmmss\r";

/// Prefix of the set-clock command
pub const SET_CLOCK_PREFIX: &str = "R,DSCLK,";

/// First byte of an SNTP client request: Leap Indicator 0, Version 3, Mode 3
pub const SNTP_CLIENT_REQUEST: u8 = 0x1B;
