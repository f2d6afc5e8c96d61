// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sensor record and line decoder.
//!
//! The field device emits one CSV line per sample:
//!
//! ```text
//! theta,psi,phi,axraw,ayraw,azraw,axvolt,ayvolt,azvolt
//! 12.50,-3.20,0.00,100,200,300,1.10,2.20,3.30
//! ```
//!
//! Angles and voltages are decimal floating point, raw samples are base-10
//! integers. No range checks are applied beyond "parses as a number".

use crate::protocol::AngleSample;
use thiserror::Error;

/// Field delimiter on the device line.
pub const FIELD_DELIMITER: char = ',';

/// Number of fields in one device line.
pub const FIELD_COUNT: usize = 9;

/// Field names in wire order.
pub const FIELD_NAMES: [&str; FIELD_COUNT] = [
    "theta", "psi", "phi", "axraw", "ayraw", "azraw", "axvolt", "ayvolt", "azvolt",
];

/// Reasons a line is rejected by [`decode_line`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("expected 9 fields, found {0}")]
    FieldCount(usize),

    #[error("field '{field}' is not a finite number: {value:?}")]
    InvalidFloat { field: &'static str, value: String },

    #[error("field '{field}' is not a base-10 integer: {value:?}")]
    InvalidInteger { field: &'static str, value: String },
}

/// One decoded measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record {
    /// Orientation angles in degrees.
    pub theta: f64,
    pub psi: f64,
    pub phi: f64,

    /// Raw accelerometer ADC samples.
    pub axraw: i64,
    pub ayraw: i64,
    pub azraw: i64,

    /// Accelerometer voltages. Local diagnostics only, never sent upstream.
    pub axvolt: f64,
    pub ayvolt: f64,
    pub azvolt: f64,
}

impl Record {
    /// The six fields forwarded to the hub.
    pub fn uplink(&self) -> AngleSample {
        AngleSample {
            theta: self.theta,
            psi: self.psi,
            phi: self.phi,
            axraw: self.axraw,
            ayraw: self.ayraw,
            azraw: self.azraw,
        }
    }
}

impl std::str::FromStr for Record {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_line(s)
    }
}

/// Decode one trimmed device line into a [`Record`].
pub fn decode_line(line: &str) -> Result<Record, DecodeError> {
    let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
    if fields.len() != FIELD_COUNT {
        return Err(DecodeError::FieldCount(fields.len()));
    }

    Ok(Record {
        theta: parse_float(fields[0], 0)?,
        psi: parse_float(fields[1], 1)?,
        phi: parse_float(fields[2], 2)?,
        axraw: parse_int(fields[3], 3)?,
        ayraw: parse_int(fields[4], 4)?,
        azraw: parse_int(fields[5], 5)?,
        axvolt: parse_float(fields[6], 6)?,
        ayvolt: parse_float(fields[7], 7)?,
        azvolt: parse_float(fields[8], 8)?,
    })
}

fn parse_float(raw: &str, index: usize) -> Result<f64, DecodeError> {
    let value = raw.trim();
    // `f64::from_str` accepts "NaN" and "inf"; neither is a measurement.
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(DecodeError::InvalidFloat {
            field: FIELD_NAMES[index],
            value: value.to_string(),
        }),
    }
}

fn parse_int(raw: &str, index: usize) -> Result<i64, DecodeError> {
    let value = raw.trim();
    value
        .parse::<i64>()
        .map_err(|_| DecodeError::InvalidInteger {
            field: FIELD_NAMES[index],
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_reference_line() {
        let record = decode_line("12.50,-3.20,0.00,100,200,300,1.10,2.20,3.30").unwrap();

        assert_eq!(record.theta, 12.5);
        assert_eq!(record.psi, -3.2);
        assert_eq!(record.phi, 0.0);
        assert_eq!((record.axraw, record.ayraw, record.azraw), (100, 200, 300));
        assert_eq!(record.axvolt, 1.1);
        assert_eq!(record.ayvolt, 2.2);
        assert_eq!(record.azvolt, 3.3);
    }

    #[test]
    fn uplink_drops_voltages() {
        let record = decode_line("12.50,-3.20,0.00,100,200,300,1.10,2.20,3.30").unwrap();
        let json = serde_json::to_value(record.uplink()).unwrap();

        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 6);
        assert_eq!(json["theta"], 12.5);
        assert_eq!(json["azraw"], 300);
        assert!(obj.get("axvolt").is_none());
    }

    #[test]
    fn rejects_short_line() {
        assert_eq!(decode_line("1.0,2.0"), Err(DecodeError::FieldCount(2)));
    }

    #[test]
    fn rejects_long_line() {
        let err = decode_line("1,2,3,4,5,6,7,8,9,10").unwrap_err();
        assert_eq!(err, DecodeError::FieldCount(10));
    }

    #[test]
    fn rejects_header_label() {
        let err = decode_line("theta,psi,phi,axraw,ayraw,azraw,axvolt,ayvolt,azvolt").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidFloat { field: "theta", .. }));
    }

    #[test]
    fn rejects_fractional_raw_sample() {
        let err = decode_line("1.0,2.0,3.0,100.5,200,300,1.1,2.2,3.3").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidInteger { field: "axraw", .. }));
    }

    #[test]
    fn rejects_nan_and_infinity() {
        assert!(decode_line("NaN,2.0,3.0,1,2,3,1.1,2.2,3.3").is_err());
        assert!(decode_line("1.0,2.0,3.0,1,2,3,inf,2.2,3.3").is_err());
    }

    #[test]
    fn tolerates_spaces_around_fields() {
        let record = decode_line("1.5, 2.5 ,3.5,10, 20,30,0.1,0.2,0.3").unwrap();
        assert_eq!(record.psi, 2.5);
        assert_eq!(record.ayraw, 20);
    }

    #[test]
    fn out_of_range_values_pass_through() {
        let record = decode_line("720.0,-999.9,0,-5,99999,0,42.0,-1.0,0").unwrap();
        assert_eq!(record.theta, 720.0);
        assert_eq!(record.axraw, -5);
    }

    #[test]
    fn from_str_matches_decode_line() {
        let line = "1,2,3,4,5,6,7,8,9";
        let parsed: Record = line.parse().unwrap();
        assert_eq!(parsed, decode_line(line).unwrap());
    }
}
