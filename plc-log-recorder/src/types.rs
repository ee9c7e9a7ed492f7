//! Core types for the PLC change recorder
//!
//! This module defines the values the decoder produces, the notifications the
//! recorder consumes, the entries the sink writes and the error types shared by
//! every stage of the pipeline.

use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;
use std::path::PathBuf;

/// Timestamp format used for log lines
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Result type for recorder operations
pub type Result<T> = std::result::Result<T, RecorderError>;

/// A single change notification delivered by the controller's notification layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Symbol path of the variable (e.g. `MAIN.fTemperature`)
    pub symbol_path: String,
    /// Wire type identifier as reported by the controller (e.g. `ADST_REAL64`)
    pub wire_type_id: String,
    /// Declared type name (e.g. `LREAL`, `TIME_OF_DAY`, `POINTER TO INT`)
    pub type_name: String,
    /// Raw value bytes, little-endian as delivered by the controller
    pub payload: Vec<u8>,
}

impl Notification {
    /// Create a new notification
    pub fn new(
        symbol_path: impl Into<String>,
        wire_type_id: impl Into<String>,
        type_name: impl Into<String>,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            symbol_path: symbol_path.into(),
            wire_type_id: wire_type_id.into(),
            type_name: type_name.into(),
            payload,
        }
    }
}

/// Decode failures for a single payload
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Truncated buffer: need {needed} bytes, got {available}")]
    Truncated { needed: usize, available: usize },

    #[error("String payload has no zero terminator")]
    MissingTerminator,

    #[error("Invalid temporal payload: {0}")]
    InvalidTemporal(String),
}

/// Errors raised by the recorder and its sink
#[derive(Debug, thiserror::Error)]
pub enum RecorderError {
    #[error("Symbol lookup failed for '{0}': {1}")]
    Symbol(String, String),

    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A decoded variable value
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedValue {
    Bool(bool),
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Real32(f32),
    Real64(f64),
    /// ASCII string read up to its zero terminator
    String(String),
    /// Address surrogate for `POINTER TO ...` types (the pointer is not dereferenced)
    Pointer(u32),
    /// Formatted duration or time of day
    Temporal(String),
    /// Calendar date (`DATE`)
    Date(NaiveDate),
    /// Calendar date and time (`DATE_AND_TIME`)
    DateTime(NaiveDateTime),
    /// Nothing decodable (void, unsupported big types, ...)
    None,
}

impl DecodedValue {
    /// True for the integer and floating types that take part in threshold comparison
    pub fn is_numeric(&self) -> bool {
        self.as_f64().is_some()
    }

    /// True for 32/64-bit floats
    pub fn is_float(&self) -> bool {
        matches!(self, DecodedValue::Real32(_) | DecodedValue::Real64(_))
    }

    /// Common real-number representation used for threshold comparison
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DecodedValue::Int8(v) => Some(*v as f64),
            DecodedValue::UInt8(v) => Some(*v as f64),
            DecodedValue::Int16(v) => Some(*v as f64),
            DecodedValue::UInt16(v) => Some(*v as f64),
            DecodedValue::Int32(v) => Some(*v as f64),
            DecodedValue::UInt32(v) => Some(*v as f64),
            DecodedValue::Int64(v) => Some(*v as f64),
            DecodedValue::UInt64(v) => Some(*v as f64),
            DecodedValue::Real32(v) => Some(*v as f64),
            DecodedValue::Real64(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedValue::Bool(v) => write!(f, "{}", if *v { "true" } else { "false" }),
            DecodedValue::Int8(v) => write!(f, "{}", v),
            DecodedValue::UInt8(v) => write!(f, "{}", v),
            DecodedValue::Int16(v) => write!(f, "{}", v),
            DecodedValue::UInt16(v) => write!(f, "{}", v),
            DecodedValue::Int32(v) => write!(f, "{}", v),
            DecodedValue::UInt32(v) => write!(f, "{}", v),
            DecodedValue::Int64(v) => write!(f, "{}", v),
            DecodedValue::UInt64(v) => write!(f, "{}", v),
            DecodedValue::Real32(v) => write!(f, "{}", v),
            DecodedValue::Real64(v) => write!(f, "{}", v),
            DecodedValue::String(s) => write!(f, "{}", s),
            DecodedValue::Pointer(v) => write!(f, "{}", v),
            DecodedValue::Temporal(s) => write!(f, "{}", s),
            DecodedValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            DecodedValue::DateTime(dt) => write!(f, "{}", dt.format(TIMESTAMP_FORMAT)),
            DecodedValue::None => Ok(()),
        }
    }
}

/// One line of the change log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Local wall-clock time of the change
    pub timestamp: NaiveDateTime,
    /// Symbol path of the variable
    pub symbol_path: String,
    /// Canonical value rendered as text
    pub value: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - Variable '{}' changed to: {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.symbol_path,
            self.value
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_conversions() {
        assert_eq!(DecodedValue::Int8(-5).as_f64(), Some(-5.0));
        assert_eq!(DecodedValue::UInt64(42).as_f64(), Some(42.0));
        assert_eq!(DecodedValue::Real32(1.5).as_f64(), Some(1.5));
        assert!(DecodedValue::Real64(0.25).is_float());
        assert!(!DecodedValue::Int32(1).is_float());

        assert_eq!(DecodedValue::Bool(true).as_f64(), None);
        assert_eq!(DecodedValue::Pointer(0x1000).as_f64(), None);
        assert!(!DecodedValue::String("x".into()).is_numeric());
    }

    #[test]
    fn test_value_display() {
        assert_eq!(DecodedValue::Bool(true).to_string(), "true");
        assert_eq!(DecodedValue::Int16(-300).to_string(), "-300");
        assert_eq!(DecodedValue::Real64(3.14).to_string(), "3.14");
        assert_eq!(
            DecodedValue::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()).to_string(),
            "2024-02-29"
        );
        assert_eq!(DecodedValue::None.to_string(), "");
    }

    #[test]
    fn test_log_entry_format() {
        let entry = LogEntry {
            timestamp: NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_opt(13, 4, 5)
                .unwrap(),
            symbol_path: "MAIN.nCounter".to_string(),
            value: "17".to_string(),
        };
        assert_eq!(
            entry.to_string(),
            "2024-05-01 13:04:05 - Variable 'MAIN.nCounter' changed to: 17"
        );
    }
}
