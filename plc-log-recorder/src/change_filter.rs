//! Change detection
//!
//! Each registered variable is a [`TrackedVariable`] holding its settings, its
//! cached decode rule and the last value that was logged. [`TrackedVariable::admit`]
//! is the only place that state changes.
//!
//! Threshold comparisons run against the last *logged* value: a rejected value
//! never becomes the new reference point, so slow drifts are still recorded once
//! they add up to the threshold.

use crate::catalog::DecodeRule;
use crate::config::VariableConfig;
use crate::types::DecodedValue;

/// Decision for one decoded value
#[derive(Debug, Clone, PartialEq)]
pub struct Admission {
    /// True if the value should be written to the log
    pub log: bool,
    /// Value after decimal truncation; this is what gets stored and logged
    pub canonical: DecodedValue,
}

/// Per-variable record: settings, decode rule and last logged value
#[derive(Debug, Clone)]
pub struct TrackedVariable {
    path: String,
    decimals: Option<u32>,
    threshold: Option<f64>,
    rule: DecodeRule,
    last_value: Option<DecodedValue>,
}

impl TrackedVariable {
    /// Build a tracked variable from its configuration and resolved decode rule
    pub fn new(config: &VariableConfig, rule: DecodeRule) -> Self {
        Self {
            path: config.path.clone(),
            decimals: config.decimals,
            threshold: config.effective_threshold(),
            rule,
            last_value: None,
        }
    }

    /// Symbol path as configured
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Decode rule resolved at registration
    pub fn rule(&self) -> DecodeRule {
        self.rule
    }

    /// Last value that was admitted, if any
    pub fn last_value(&self) -> Option<&DecodedValue> {
        self.last_value.as_ref()
    }

    /// Decide whether `value` is a loggable change and record it if so.
    pub fn admit(&mut self, value: DecodedValue) -> Admission {
        if !value.is_numeric() {
            return self.accept(value);
        }

        let candidate = match self.decimals {
            Some(decimals) if value.is_float() => truncate_decimals(&value, decimals),
            _ => value,
        };

        // NaN on either side has no distance to compare, so it never freezes the variable
        let reference = self
            .last_value
            .as_ref()
            .and_then(DecodedValue::as_f64)
            .filter(|v| !v.is_nan());
        let current = candidate.as_f64().filter(|v| !v.is_nan());
        let (Some(threshold), Some(last), Some(current)) = (self.threshold, reference, current)
        else {
            return self.accept(candidate);
        };

        let change = (current - last).abs();
        if change + comparison_tolerance(&candidate, current, last) >= threshold {
            self.accept(candidate)
        } else {
            log::trace!(
                "'{}' changed by {} (< {}), not logged",
                self.path,
                change,
                threshold
            );
            Admission {
                log: false,
                canonical: candidate,
            }
        }
    }

    fn accept(&mut self, canonical: DecodedValue) -> Admission {
        self.last_value = Some(canonical.clone());
        Admission {
            log: true,
            canonical,
        }
    }
}

/// Rounding slack for the threshold test.
///
/// Decimal steps such as 0.2 → 0.3 come out a few ulps short of the threshold
/// in binary; a change within a few ulps of the threshold counts as reaching it.
fn comparison_tolerance(candidate: &DecodedValue, current: f64, last: f64) -> f64 {
    let epsilon = match candidate {
        DecodedValue::Real32(_) => f32::EPSILON as f64,
        _ => f64::EPSILON,
    };
    4.0 * epsilon * current.abs().max(last.abs()).max(1.0)
}

/// Truncate a float to `decimals` fractional digits.
///
/// Works on the value's `Display` form, which is locale-independent and
/// always uses `.` as the separator. Integers and values whose truncated text
/// does not parse back are returned unchanged.
pub fn truncate_decimals(value: &DecodedValue, decimals: u32) -> DecodedValue {
    match value {
        DecodedValue::Real32(v) => truncate_text(&v.to_string(), decimals)
            .and_then(|text| text.parse::<f32>().ok())
            .map(DecodedValue::Real32)
            .unwrap_or_else(|| value.clone()),
        DecodedValue::Real64(v) => truncate_text(&v.to_string(), decimals)
            .and_then(|text| text.parse::<f64>().ok())
            .map(DecodedValue::Real64)
            .unwrap_or_else(|| value.clone()),
        _ => value.clone(),
    }
}

/// Cut the fractional part of a decimal string; `None` if it has no separator
fn truncate_text(text: &str, decimals: u32) -> Option<String> {
    let (whole, fraction) = text.split_once('.')?;
    if decimals == 0 {
        return Some(whole.to_string());
    }

    let kept: String = fraction.chars().take(decimals as usize).collect();
    Some(format!("{}.{}", whole, kept))
}
