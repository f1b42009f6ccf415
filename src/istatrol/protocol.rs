//! Wire constants of the ISTAtrol firmware.
//!
//! The controller answers a single vendor control request. Its USB stack
//! filters on `bmRequestType`: values below 0x80 are rejected outright,
//! 0x80..=0x9F return one byte only, and 0xA0..=0xFF return the full
//! zero-padded response. 0xC0 (IN, vendor, device) is used. Do not
//! "simplify" the request type to anything below 0xA0.

use std::time::Duration;

use nusb::transfer::{ControlType, Recipient};

pub const DEFAULT_VENDOR_ID: u16 = 0x16c0;
pub const DEFAULT_PRODUCT_ID: u16 = 0x05e1;

pub const CONTROL_TYPE: ControlType = ControlType::Vendor;
pub const RECIPIENT: Recipient = Recipient::Device;

/// `bmRequestType` put on the wire for [`CONTROL_TYPE`] and [`RECIPIENT`]
/// with direction IN.
pub const REQUEST_TYPE: u8 = 0x80 | ((CONTROL_TYPE as u8) << 5) | RECIPIENT as u8;

const _: () = assert!(REQUEST_TYPE == 0xc0);
const _: () = assert!(REQUEST_TYPE >= 0xa0);

pub const REQUEST: u8 = b'c';
pub const VALUE: u16 = 0;
pub const INDEX: u16 = 0;

/// The response must be requested with at least this length or the
/// transfer overflows.
pub const RESPONSE_LENGTH: u16 = 10;

pub const TRANSFER_TIMEOUT: Duration = Duration::from_secs(1);

pub const READING_OFFSET: usize = 0;
pub const EDGE_MARKER_OFFSET: usize = 2;
pub const COUNTER_OFFSET: usize = 3;

/// Bytes 0..5 are consumed, the rest is reserved.
pub const MIN_RESPONSE_LENGTH: usize = 5;

pub const EDGE_OPENED: u8 = b'+';
pub const EDGE_CLOSED: u8 = b'-';

// Least-squares fit of measured reading/temperature pairs. Keep bit-exact.
pub const CALIBRATION_SLOPE: f64 = -0.00791;
pub const CALIBRATION_OFFSET: f64 = 71.445927;
