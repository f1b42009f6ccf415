use chrono::{DateTime, Local};

use crate::istatrol::{
    DeviceError,
    protocol::{
        CALIBRATION_OFFSET, CALIBRATION_SLOPE, COUNTER_OFFSET, EDGE_CLOSED, EDGE_MARKER_OFFSET,
        EDGE_OPENED, MIN_RESPONSE_LENGTH, READING_OFFSET,
    },
};

/// Response buffer of one control transfer.
pub type RawSample = Vec<u8>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValveEdge {
    Opened,
    Closed,
    None,
}

impl ValveEdge {
    pub fn from_marker(marker: u8) -> Self {
        match marker {
            EDGE_OPENED => ValveEdge::Opened,
            EDGE_CLOSED => ValveEdge::Closed,
            _ => ValveEdge::None,
        }
    }

    /// Suffix appended to a report line.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValveEdge::Opened => "  (Valve opened)",
            ValveEdge::Closed => "  (Valve closed)",
            ValveEdge::None => "",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DecodedSample {
    pub reading_raw: u16,

    pub temperature_celsius: f64,

    pub valve_edge: ValveEdge,

    /// Valve/position counter. Not part of the report.
    pub counter: u16,

    pub measured_at: DateTime<Local>,
}

impl PartialEq for DecodedSample {
    // The timestamp is display-only.
    fn eq(&self, other: &Self) -> bool {
        self.reading_raw == other.reading_raw
            && self.temperature_celsius == other.temperature_celsius
            && self.valve_edge == other.valve_edge
            && self.counter == other.counter
    }
}

pub fn reading_to_celsius(reading_raw: u16) -> f64 {
    CALIBRATION_SLOPE * reading_raw as f64 + CALIBRATION_OFFSET
}

pub fn decode(raw: &[u8], last_reading: Option<u16>) -> Result<DecodedSample, DeviceError> {
    decode_at(raw, last_reading, Local::now())
}

/// A reading equal to `last_reading` is treated as stale and its edge
/// marker is ignored.
pub fn decode_at(
    raw: &[u8],
    last_reading: Option<u16>,
    measured_at: DateTime<Local>,
) -> Result<DecodedSample, DeviceError> {
    if raw.len() < MIN_RESPONSE_LENGTH {
        return Err(DeviceError::MalformedResponse {
            expected: MIN_RESPONSE_LENGTH,
            got: raw.len(),
        });
    }

    let reading_raw = u16::from_le_bytes([raw[READING_OFFSET], raw[READING_OFFSET + 1]]);
    let counter = u16::from_le_bytes([raw[COUNTER_OFFSET], raw[COUNTER_OFFSET + 1]]);

    let valve_edge = match last_reading {
        Some(last) if last == reading_raw => ValveEdge::None,
        _ => ValveEdge::from_marker(raw[EDGE_MARKER_OFFSET]),
    };

    Ok(DecodedSample {
        reading_raw,
        temperature_celsius: reading_to_celsius(reading_raw),
        valve_edge,
        counter,
        measured_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(reading: u16, marker: u8) -> Vec<u8> {
        let [low, high] = reading.to_le_bytes();
        vec![low, high, marker, 0x00, 0x00, 0, 0, 0, 0, 0]
    }

    #[test]
    fn zero_reading_is_calibration_offset() {
        let sample = decode(&response(0, b' '), None).unwrap();
        assert_eq!(sample.temperature_celsius, 71.445927);
    }

    #[test]
    fn reading_9033_is_freezing_point() {
        let sample = decode(&response(9033, b' '), None).unwrap();
        assert!(sample.temperature_celsius.abs() < 0.01);
    }

    #[test]
    fn reading_is_little_endian() {
        let sample = decode(&[0x34, 0x12, b' ', 0x78, 0x56], None).unwrap();
        assert_eq!(sample.reading_raw, 0x1234);
        assert_eq!(sample.counter, 0x5678);
    }

    #[test]
    fn opened_edge_on_first_reading() {
        let sample = decode(&[0x01, 0x00, b'+', 0x00, 0x00, 0, 0, 0, 0, 0], None).unwrap();
        assert_eq!(sample.reading_raw, 1);
        assert!((sample.temperature_celsius - 71.438017).abs() < 1e-6);
        assert_eq!(sample.valve_edge, ValveEdge::Opened);
    }

    #[test]
    fn edge_markers() {
        assert_eq!(
            decode(&response(100, b'+'), Some(99)).unwrap().valve_edge,
            ValveEdge::Opened
        );
        assert_eq!(
            decode(&response(100, b'-'), Some(99)).unwrap().valve_edge,
            ValveEdge::Closed
        );
        for marker in [b' ', b'0', b'c', 0x00, 0xff] {
            assert_eq!(
                decode(&response(100, marker), Some(99)).unwrap().valve_edge,
                ValveEdge::None
            );
        }
    }

    #[test]
    fn repeated_reading_suppresses_edge() {
        let first = decode(&response(4200, b'+'), None).unwrap();
        assert_eq!(first.valve_edge, ValveEdge::Opened);

        let second = decode(&response(4200, b'-'), Some(first.reading_raw)).unwrap();
        assert_eq!(second.valve_edge, ValveEdge::None);
    }

    #[test]
    fn decode_is_deterministic() {
        let raw = response(5000, b'-');
        let a = decode(&raw, Some(4999)).unwrap();
        let b = decode(&raw, Some(4999)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn short_response_is_malformed() {
        for len in 0..MIN_RESPONSE_LENGTH {
            let raw = vec![0u8; len];
            match decode(&raw, None) {
                Err(DeviceError::MalformedResponse { expected, got }) => {
                    assert_eq!(expected, 5);
                    assert_eq!(got, len);
                }
                other => panic!("expected MalformedResponse, got {other:?}"),
            }
        }
    }

    #[test]
    fn edge_suffixes() {
        assert_eq!(ValveEdge::Opened.as_str(), "  (Valve opened)");
        assert_eq!(ValveEdge::Closed.as_str(), "  (Valve closed)");
        assert_eq!(ValveEdge::None.as_str(), "");
    }
}
