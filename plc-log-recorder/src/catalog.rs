//! Type catalog
//!
//! Maps a controller wire-type identifier and a declared type name to a
//! [`DecodeRule`]. Type names that denote durations, dates and times of day
//! override the wire type: a `TIME` variable is decoded as a duration even
//! though the controller reports it as a plain 32-bit unsigned integer.
//!
//! Rules are resolved once per variable at registration and cached, so the
//! per-notification path never does string matching.

use std::fmt;

/// Binary encoding category of a variable's raw payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    Void,
    Bit,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Real32,
    Real64,
    Real80,
    String,
    WString,
    /// Structured or pointer types; only pointers are decodable
    BigType,
}

/// Symbolic name, numeric ADS code, wire type
const WIRE_TYPES: &[(&str, u32, WireType)] = &[
    ("VOID", 0, WireType::Void),
    ("INT16", 2, WireType::Int16),
    ("INT32", 3, WireType::Int32),
    ("REAL32", 4, WireType::Real32),
    ("REAL64", 5, WireType::Real64),
    ("INT8", 16, WireType::Int8),
    ("UINT8", 17, WireType::UInt8),
    ("UINT16", 18, WireType::UInt16),
    ("UINT32", 19, WireType::UInt32),
    ("INT64", 20, WireType::Int64),
    ("UINT64", 21, WireType::UInt64),
    ("STRING", 30, WireType::String),
    ("WSTRING", 31, WireType::WString),
    ("REAL80", 32, WireType::Real80),
    ("BIT", 33, WireType::Bit),
    ("BIGTYPE", 65, WireType::BigType),
];

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = WIRE_TYPES
            .iter()
            .find(|(_, _, wt)| wt == self)
            .map(|(name, _, _)| *name)
            .unwrap_or("VOID");
        write!(f, "ADST_{}", name)
    }
}

/// Parse a wire-type identifier.
///
/// Accepts `ADST_INT16`, `INT16` (any case) or the numeric code `2`.
/// Unknown identifiers resolve to [`WireType::Void`].
pub fn resolve_wire_type(type_id: &str) -> WireType {
    let id = type_id.trim();

    if let Ok(code) = id.parse::<u32>() {
        return WIRE_TYPES
            .iter()
            .find(|(_, c, _)| *c == code)
            .map(|(_, _, wt)| *wt)
            .unwrap_or(WireType::Void);
    }

    let upper = id.to_ascii_uppercase();
    let name = upper.strip_prefix("ADST_").unwrap_or(&upper);
    match WIRE_TYPES.iter().find(|(n, _, _)| *n == name) {
        Some((_, _, wt)) => *wt,
        None => {
            log::trace!("Unknown wire type id '{}', treating as void", type_id);
            WireType::Void
        }
    }
}

/// Controller duration/date/time types recognized by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalKind {
    /// `LTIME`: 64-bit nanosecond duration
    LTime,
    /// `TIME`: 32-bit millisecond duration
    Time,
    /// `DATE`: 32-bit seconds since the Unix epoch, date part only
    Date,
    /// `DATE_AND_TIME`: 32-bit seconds since the Unix epoch
    DateAndTime,
    /// `TIME_OF_DAY` / `TOD`: 32-bit milliseconds since midnight
    TimeOfDay,
}

impl TemporalKind {
    /// Number of payload bytes the kind reads
    pub fn width(&self) -> usize {
        match self {
            TemporalKind::LTime => 8,
            _ => 4,
        }
    }
}

/// Outcome of classifying a type name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeNameClass {
    Temporal(TemporalKind),
    /// Recognized but not decodable; variables of this type are skipped
    Blocked(&'static str),
    /// Decoded by wire type
    Plain,
}

/// Classify a declared type name.
pub fn classify(type_name: &str) -> TypeNameClass {
    let upper = type_name.trim().to_ascii_uppercase();
    match upper.as_str() {
        "LTIME" => TypeNameClass::Temporal(TemporalKind::LTime),
        "TIME" => TypeNameClass::Temporal(TemporalKind::Time),
        "DATE" => TypeNameClass::Temporal(TemporalKind::Date),
        "DATE_AND_TIME" => TypeNameClass::Temporal(TemporalKind::DateAndTime),
        "TIME_OF_DAY" | "TOD" => TypeNameClass::Temporal(TemporalKind::TimeOfDay),
        "LDATE" | "LDATE_AND_TIME" => TypeNameClass::Blocked("long date types are not supported"),
        name if is_wide_string(name) => TypeNameClass::Blocked("wide strings are not supported"),
        _ => TypeNameClass::Plain,
    }
}

/// `WSTRING` or `WSTRING(n)`
fn is_wide_string(upper_name: &str) -> bool {
    upper_name == "WSTRING" || upper_name.starts_with("WSTRING(")
}

/// Reason a variable cannot be decoded
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct Unsupported {
    pub reason: String,
}

impl Unsupported {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// How a variable's payload is decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeRule {
    Temporal(TemporalKind),
    Bool,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Real32,
    Real64,
    String,
    Pointer,
    /// Decodes to [`crate::DecodedValue::None`]
    Nothing,
}

impl DecodeRule {
    /// Classify a wire type and type name into a rule.
    ///
    /// Never fails: anything that cannot be decoded maps to [`DecodeRule::Nothing`].
    /// Blocked type names also map to `Nothing`; use [`DecodeRule::resolve`] at
    /// registration to reject them.
    pub fn classify(wire_type: WireType, type_name: &str) -> Self {
        match classify(type_name) {
            TypeNameClass::Temporal(kind) => DecodeRule::Temporal(kind),
            TypeNameClass::Blocked(_) => DecodeRule::Nothing,
            TypeNameClass::Plain => Self::from_wire_type(wire_type, type_name),
        }
    }

    fn from_wire_type(wire_type: WireType, type_name: &str) -> Self {
        match wire_type {
            WireType::Bit => DecodeRule::Bool,
            WireType::Int8 => DecodeRule::Int8,
            WireType::UInt8 => DecodeRule::UInt8,
            WireType::Int16 => DecodeRule::Int16,
            WireType::UInt16 => DecodeRule::UInt16,
            WireType::Int32 => DecodeRule::Int32,
            WireType::UInt32 => DecodeRule::UInt32,
            WireType::Int64 => DecodeRule::Int64,
            WireType::UInt64 => DecodeRule::UInt64,
            WireType::Real32 => DecodeRule::Real32,
            WireType::Real64 => DecodeRule::Real64,
            WireType::String => DecodeRule::String,
            WireType::BigType if type_name.to_ascii_uppercase().contains("POINTER") => {
                DecodeRule::Pointer
            }
            WireType::BigType | WireType::Void | WireType::Real80 | WireType::WString => {
                DecodeRule::Nothing
            }
        }
    }

    /// Resolve a rule for registration, rejecting types that can never produce a value.
    pub fn resolve(wire_type: WireType, type_name: &str) -> Result<Self, Unsupported> {
        if let TypeNameClass::Blocked(reason) = classify(type_name) {
            return Err(Unsupported::new(reason));
        }

        match Self::classify(wire_type, type_name) {
            DecodeRule::Nothing => Err(Unsupported::new(match wire_type {
                WireType::WString => "wide strings are not supported",
                WireType::BigType => "only pointer big types are supported",
                WireType::Void => "unknown or void wire type",
                _ => "wire type is not supported",
            })),
            rule => Ok(rule),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_wire_type_names() {
        assert_eq!(resolve_wire_type("ADST_INT16"), WireType::Int16);
        assert_eq!(resolve_wire_type("adst_real64"), WireType::Real64);
        assert_eq!(resolve_wire_type("UINT32"), WireType::UInt32);
        assert_eq!(resolve_wire_type(" ADST_BIT "), WireType::Bit);
        assert_eq!(resolve_wire_type("ADST_BIGTYPE"), WireType::BigType);
    }

    #[test]
    fn test_resolve_wire_type_codes() {
        assert_eq!(resolve_wire_type("2"), WireType::Int16);
        assert_eq!(resolve_wire_type("33"), WireType::Bit);
        assert_eq!(resolve_wire_type("65"), WireType::BigType);
        assert_eq!(resolve_wire_type("999"), WireType::Void);
    }

    #[test]
    fn test_unknown_wire_type_is_void() {
        assert_eq!(resolve_wire_type("ADST_QUATERNION"), WireType::Void);
        assert_eq!(resolve_wire_type(""), WireType::Void);
    }

    #[test]
    fn test_wire_type_display() {
        assert_eq!(WireType::UInt16.to_string(), "ADST_UINT16");
        assert_eq!(WireType::BigType.to_string(), "ADST_BIGTYPE");
    }

    #[test]
    fn test_classify_temporal_names() {
        assert_eq!(classify("LTIME"), TypeNameClass::Temporal(TemporalKind::LTime));
        assert_eq!(classify("TIME"), TypeNameClass::Temporal(TemporalKind::Time));
        assert_eq!(classify("date"), TypeNameClass::Temporal(TemporalKind::Date));
        assert_eq!(
            classify("DATE_AND_TIME"),
            TypeNameClass::Temporal(TemporalKind::DateAndTime)
        );
        assert_eq!(classify("TIME_OF_DAY"), classify("TOD"));
        assert_eq!(classify("TOD"), TypeNameClass::Temporal(TemporalKind::TimeOfDay));
    }

    #[test]
    fn test_classify_blocked_names() {
        assert!(matches!(classify("LDATE"), TypeNameClass::Blocked(_)));
        assert!(matches!(classify("LDATE_AND_TIME"), TypeNameClass::Blocked(_)));
        assert!(matches!(classify("WSTRING(80)"), TypeNameClass::Blocked(_)));
        assert_eq!(classify("LREAL"), TypeNameClass::Plain);
        assert_eq!(classify("STRING(80)"), TypeNameClass::Plain);
    }

    #[test]
    fn test_temporal_name_overrides_wire_type() {
        assert_eq!(
            DecodeRule::classify(WireType::UInt32, "TIME"),
            DecodeRule::Temporal(TemporalKind::Time)
        );
        assert_eq!(
            DecodeRule::classify(WireType::Real64, "TOD"),
            DecodeRule::Temporal(TemporalKind::TimeOfDay)
        );
    }

    #[test]
    fn test_big_type_pointer() {
        assert_eq!(
            DecodeRule::classify(WireType::BigType, "POINTER TO INT"),
            DecodeRule::Pointer
        );
        assert_eq!(DecodeRule::classify(WireType::BigType, "ST_Motor"), DecodeRule::Nothing);
    }

    #[test]
    fn test_resolve_rejects_unsupported() {
        assert!(DecodeRule::resolve(WireType::WString, "WSTRING(80)").is_err());
        assert!(DecodeRule::resolve(WireType::UInt64, "LDATE").is_err());
        assert!(DecodeRule::resolve(WireType::BigType, "ST_Motor").is_err());
        assert!(DecodeRule::resolve(WireType::Void, "FB_Thing").is_err());
        assert_eq!(
            DecodeRule::resolve(WireType::Int16, "INT"),
            Ok(DecodeRule::Int16)
        );
    }
}
