//! Main recorder API
//!
//! [`ChangeRecorder`] owns the table of tracked variables and the rotating
//! log. Variables are registered once at startup; afterwards each
//! notification runs decode → filter → append under its variable's lock, so
//! events for one variable are processed strictly one at a time while
//! different variables may be handled concurrently.

use crate::catalog::{resolve_wire_type, DecodeRule};
use crate::change_filter::TrackedVariable;
use crate::config::VariableConfig;
use crate::sink::RotatingLog;
use crate::status::{LogReporter, StatusReporter};
use crate::types::{DecodeError, DecodedValue, LogEntry, Notification, Result};
use crate::value_decoder::ValueDecoder;
use chrono::{Local, NaiveDateTime};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Type metadata for a symbol, as reported by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInfo {
    pub wire_type_id: String,
    pub type_name: String,
}

impl SymbolInfo {
    pub fn new(wire_type_id: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            wire_type_id: wire_type_id.into(),
            type_name: type_name.into(),
        }
    }
}

/// Looks up type metadata for a symbol path
pub trait SymbolResolver {
    fn resolve(&self, symbol_path: &str) -> Result<SymbolInfo>;
}

/// Result of registering one variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    Registered(DecodeRule),
    /// The type can never be decoded; the variable is not tracked
    Skipped(String),
    /// The path (compared case-insensitively) is already registered
    Duplicate,
}

/// Paths registered and skipped by [`ChangeRecorder::register_all`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationSummary {
    pub registered: Vec<String>,
    pub skipped: Vec<String>,
}

/// What happened to one notification
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Written to the log
    Logged(LogEntry),
    /// Decoded but below the change threshold
    Suppressed,
    /// No variable registered under this path
    Unregistered,
    /// Decoded to nothing; ignored
    Empty,
    DecodeFailed(DecodeError),
    /// Admitted but the append failed; the entry is lost
    SinkFailed(String),
}

/// Decode → filter → persist pipeline for a fixed set of variables
pub struct ChangeRecorder<R = LogReporter> {
    /// Keyed by lower-cased symbol path
    variables: HashMap<String, Mutex<TrackedVariable>>,
    sink: RotatingLog,
    reporter: R,
}

impl ChangeRecorder<LogReporter> {
    /// Create a recorder that reports through the `log` facade
    pub fn with_log_reporter(sink: RotatingLog) -> Self {
        Self::new(sink, LogReporter)
    }
}

impl<R: StatusReporter> ChangeRecorder<R> {
    pub fn new(sink: RotatingLog, reporter: R) -> Self {
        Self {
            variables: HashMap::new(),
            sink,
            reporter,
        }
    }

    /// Register a variable with its resolved type metadata.
    ///
    /// The decode rule is resolved here and cached. Types that can never be
    /// decoded are skipped with a single warning.
    pub fn register(&mut self, config: &VariableConfig, symbol: &SymbolInfo) -> Registration {
        let key = config.path.to_lowercase();
        if self.variables.contains_key(&key) {
            self.reporter.warning(&format!(
                "Variable '{}' is configured more than once, keeping the first entry",
                config.path
            ));
            return Registration::Duplicate;
        }

        let wire_type = resolve_wire_type(&symbol.wire_type_id);
        match DecodeRule::resolve(wire_type, &symbol.type_name) {
            Ok(rule) => {
                log::debug!(
                    "Registered '{}' as {} / {} -> {:?}",
                    config.path,
                    wire_type,
                    symbol.type_name,
                    rule
                );
                self.variables
                    .insert(key, Mutex::new(TrackedVariable::new(config, rule)));
                Registration::Registered(rule)
            }
            Err(unsupported) => {
                self.reporter.warning(&format!(
                    "Skipping '{}' of type '{}' ({}): {}",
                    config.path, symbol.type_name, symbol.wire_type_id, unsupported
                ));
                Registration::Skipped(unsupported.reason)
            }
        }
    }

    /// Resolve and register every configured variable.
    pub fn register_all<S: SymbolResolver + ?Sized>(
        &mut self,
        configs: &[VariableConfig],
        resolver: &S,
    ) -> RegistrationSummary {
        let mut summary = RegistrationSummary::default();

        for config in configs {
            let symbol = match resolver.resolve(&config.path) {
                Ok(symbol) => symbol,
                Err(e) => {
                    self.reporter.error(&e.to_string());
                    summary.skipped.push(config.path.clone());
                    continue;
                }
            };

            match self.register(config, &symbol) {
                Registration::Registered(_) => summary.registered.push(config.path.clone()),
                Registration::Skipped(_) | Registration::Duplicate => {
                    summary.skipped.push(config.path.clone())
                }
            }
        }

        self.reporter.status(&format!(
            "Tracking {} variable(s), skipped {}",
            summary.registered.len(),
            summary.skipped.len()
        ));
        summary
    }

    /// Process a notification, timestamped with the local wall clock
    pub fn handle(&self, notification: &Notification) -> Outcome {
        self.handle_at(notification, Local::now().naive_local())
    }

    /// Process a notification with an explicit timestamp.
    ///
    /// The notification's own type fields are not consulted; the rule cached at
    /// registration decides how the payload is decoded.
    pub fn handle_at(&self, notification: &Notification, timestamp: NaiveDateTime) -> Outcome {
        let Some(slot) = self.variables.get(&notification.symbol_path.to_lowercase()) else {
            log::trace!("Ignoring notification for unregistered '{}'", notification.symbol_path);
            return Outcome::Unregistered;
        };

        let mut variable = slot.lock();

        let value = match ValueDecoder::decode(&notification.payload, variable.rule()) {
            Ok(DecodedValue::None) => {
                log::debug!("'{}' decoded to nothing, ignoring", variable.path());
                return Outcome::Empty;
            }
            Ok(value) => value,
            Err(e) => {
                self.reporter.warning(&format!(
                    "Dropping notification for '{}': {}",
                    variable.path(),
                    e
                ));
                return Outcome::DecodeFailed(e);
            }
        };

        let admission = variable.admit(value);
        if !admission.log {
            return Outcome::Suppressed;
        }

        match self
            .sink
            .append(variable.path(), &admission.canonical.to_string(), timestamp)
        {
            Ok(entry) => {
                log::debug!("{}", entry);
                Outcome::Logged(entry)
            }
            Err(e) => {
                let message = format!("Failed to log change of '{}': {}", variable.path(), e);
                self.reporter.error(&message);
                Outcome::SinkFailed(message)
            }
        }
    }

    /// Number of tracked variables
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// True if a variable is registered under this path (case-insensitive)
    pub fn is_registered(&self, symbol_path: &str) -> bool {
        self.variables.contains_key(&symbol_path.to_lowercase())
    }

    /// Last admitted value of a variable
    pub fn last_value(&self, symbol_path: &str) -> Option<DecodedValue> {
        self.variables
            .get(&symbol_path.to_lowercase())
            .and_then(|slot| slot.lock().last_value().cloned())
    }
}
