use std::num::ParseIntError;

use clap::Parser;
use istatrol::istatrol::protocol::{DEFAULT_PRODUCT_ID, DEFAULT_VENDOR_ID};

#[derive(Debug, Parser)]
#[command(version, about = "Poll an ISTAtrol heating valve controller over USB")]
pub struct Args {
    #[arg(long, env = "ISTATROL_VENDOR_ID", value_parser = parse_usb_id, default_value_t = DEFAULT_VENDOR_ID)]
    pub vendor_id: u16,

    #[arg(long, env = "ISTATROL_PRODUCT_ID", value_parser = parse_usb_id, default_value_t = DEFAULT_PRODUCT_ID)]
    pub product_id: u16,

    /// Seconds between two samples.
    #[arg(long, default_value_t = 60)]
    pub interval_secs: u64,

    /// Seconds to wait before reopening the device after a failure.
    #[arg(long, default_value_t = 10)]
    pub backoff_secs: u64,
}

/// Accepts `0x16c0` style hex or plain decimal.
fn parse_usb_id(s: &str) -> Result<u16, ParseIntError> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usb_ids() {
        assert_eq!(parse_usb_id("0x16c0"), Ok(0x16c0));
        assert_eq!(parse_usb_id("0X05E1"), Ok(0x05e1));
        assert_eq!(parse_usb_id("1505"), Ok(1505));
        assert!(parse_usb_id("0x10000").is_err());
        assert!(parse_usb_id("valve").is_err());
    }

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["istatrol-terminal"]).unwrap();
        assert_eq!(args.interval_secs, 60);
        assert_eq!(args.backoff_secs, 10);
    }
}
