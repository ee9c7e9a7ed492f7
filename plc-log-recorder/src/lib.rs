//! PLC Change Recorder Library
//!
//! Decodes change notifications for controller variables, filters out
//! insignificant changes and appends the rest to a size-bounded, rotating
//! text log.
//!
//! # Architecture
//!
//! The pipeline has four stages:
//! - [`catalog`]: maps a wire type and type name to a decode rule
//! - [`value_decoder`]: turns raw little-endian payloads into typed values
//! - [`change_filter`]: per-variable threshold and decimal-precision checks
//! - [`sink`]: `Log.txt` with numbered rotation
//!
//! [`ChangeRecorder`] ties them together and [`Dispatcher`] feeds it from
//! worker threads while keeping each variable's events in order.
//!
//! The library does NOT:
//! - Connect to or subscribe on a controller
//! - Read configuration files
//! - Query historical log data
//!
//! # Example Usage
//!
//! ```no_run
//! use plc_log_recorder::{
//!     ChangeRecorder, Notification, RecorderConfig, RotatingLog, SymbolInfo, VariableConfig,
//! };
//!
//! let config = RecorderConfig::new().with_directory("logs").with_max_lines(5_000);
//! let sink = RotatingLog::open(&config).unwrap();
//! let mut recorder = ChangeRecorder::with_log_reporter(sink);
//!
//! recorder.register(
//!     &VariableConfig::new("MAIN.fTemperature").with_decimals(1).with_threshold(0.5),
//!     &SymbolInfo::new("ADST_REAL64", "LREAL"),
//! );
//!
//! let payload = 21.37f64.to_le_bytes().to_vec();
//! let outcome = recorder.handle(&Notification::new(
//!     "MAIN.fTemperature",
//!     "ADST_REAL64",
//!     "LREAL",
//!     payload,
//! ));
//! println!("{:?}", outcome);
//! ```

// Public modules
pub mod catalog;
pub mod change_filter;
pub mod config;
pub mod dispatch;
pub mod recorder;
pub mod sink;
pub mod status;
pub mod types;
pub mod value_decoder;

// Re-export main types for convenience
pub use catalog::{classify, resolve_wire_type, DecodeRule, TemporalKind, TypeNameClass, WireType};
pub use change_filter::{Admission, TrackedVariable};
pub use config::{RecorderConfig, VariableConfig};
pub use dispatch::{DispatchStats, Dispatcher};
pub use recorder::{
    ChangeRecorder, Outcome, Registration, RegistrationSummary, SymbolInfo, SymbolResolver,
};
pub use sink::RotatingLog;
pub use status::{LogReporter, MemoryReporter, Severity, StatusReporter};
pub use types::{DecodeError, DecodedValue, LogEntry, Notification, RecorderError, Result};
pub use value_decoder::decode;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Smoke test: the free decode function and the catalog agree
        let value = decode(&[0x2A], resolve_wire_type("ADST_UINT8"), "USINT").unwrap();
        assert_eq!(value, DecodedValue::UInt8(42));
    }
}
