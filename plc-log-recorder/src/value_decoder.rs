//! Value Decoding Engine
//!
//! Turns the raw payload of a change notification into a [`DecodedValue`].
//! All payloads are little-endian. Duration, date and time-of-day types are
//! rendered to their display form here; nothing downstream re-parses them.

use crate::catalog::{DecodeRule, TemporalKind, WireType};
use crate::types::{DecodeError, DecodedValue};
use byteorder::{ByteOrder, LittleEndian};
use chrono::DateTime;

const NANOS_PER_MILLI: u64 = 1_000_000;
const MILLIS_PER_SECOND: u64 = 1_000;
const MILLIS_PER_MINUTE: u64 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: u64 = 60 * MILLIS_PER_MINUTE;
const MILLIS_PER_DAY: u64 = 24 * MILLIS_PER_HOUR;

/// Decode a payload given its wire type and declared type name.
///
/// Temporal type names take precedence over the wire type. Types that cannot
/// be decoded yield [`DecodedValue::None`] rather than an error.
pub fn decode(bytes: &[u8], wire_type: WireType, type_name: &str) -> Result<DecodedValue, DecodeError> {
    ValueDecoder::decode(bytes, DecodeRule::classify(wire_type, type_name))
}

/// Value decoder - extracts typed values from notification payloads
pub struct ValueDecoder;

impl ValueDecoder {
    /// Decode a payload with an already resolved rule
    pub fn decode(bytes: &[u8], rule: DecodeRule) -> Result<DecodedValue, DecodeError> {
        let value = match rule {
            DecodeRule::Temporal(kind) => Self::decode_temporal(bytes, kind)?,
            DecodeRule::Bool => DecodedValue::Bool(Self::take(bytes, 1)?[0] != 0),
            DecodeRule::Int8 => DecodedValue::Int8(Self::take(bytes, 1)?[0] as i8),
            DecodeRule::UInt8 => DecodedValue::UInt8(Self::take(bytes, 1)?[0]),
            DecodeRule::Int16 => DecodedValue::Int16(LittleEndian::read_i16(Self::take(bytes, 2)?)),
            DecodeRule::UInt16 => DecodedValue::UInt16(LittleEndian::read_u16(Self::take(bytes, 2)?)),
            DecodeRule::Int32 => DecodedValue::Int32(LittleEndian::read_i32(Self::take(bytes, 4)?)),
            DecodeRule::UInt32 => DecodedValue::UInt32(LittleEndian::read_u32(Self::take(bytes, 4)?)),
            DecodeRule::Int64 => DecodedValue::Int64(LittleEndian::read_i64(Self::take(bytes, 8)?)),
            DecodeRule::UInt64 => DecodedValue::UInt64(LittleEndian::read_u64(Self::take(bytes, 8)?)),
            DecodeRule::Real32 => DecodedValue::Real32(LittleEndian::read_f32(Self::take(bytes, 4)?)),
            DecodeRule::Real64 => DecodedValue::Real64(LittleEndian::read_f64(Self::take(bytes, 8)?)),
            DecodeRule::String => DecodedValue::String(Self::read_ascii_z(bytes)?),
            DecodeRule::Pointer => DecodedValue::Pointer(LittleEndian::read_u32(Self::take(bytes, 4)?)),
            DecodeRule::Nothing => DecodedValue::None,
        };

        Ok(value)
    }

    /// First `width` bytes of the buffer, or a truncation error
    fn take(bytes: &[u8], width: usize) -> Result<&[u8], DecodeError> {
        if bytes.len() < width {
            log::warn!(
                "Payload requires {} bytes but only {} were delivered",
                width,
                bytes.len()
            );
            return Err(DecodeError::Truncated {
                needed: width,
                available: bytes.len(),
            });
        }
        Ok(&bytes[..width])
    }

    /// Read a zero-terminated ASCII string from the start of the buffer.
    ///
    /// Bytes outside the ASCII range are replaced with `?`.
    fn read_ascii_z(bytes: &[u8]) -> Result<String, DecodeError> {
        let end = bytes
            .iter()
            .position(|&b| b == 0)
            .ok_or(DecodeError::MissingTerminator)?;

        Ok(bytes[..end]
            .iter()
            .map(|&b| if b.is_ascii() { b as char } else { '?' })
            .collect())
    }

    fn decode_temporal(bytes: &[u8], kind: TemporalKind) -> Result<DecodedValue, DecodeError> {
        let raw = Self::take(bytes, kind.width())?;

        match kind {
            TemporalKind::LTime => {
                let nanos = LittleEndian::read_u64(raw);
                Ok(DecodedValue::Temporal(Self::format_ltime(nanos)))
            }
            TemporalKind::Time => {
                let millis = LittleEndian::read_u32(raw) as u64;
                Ok(DecodedValue::Temporal(Self::format_duration_millis(millis)))
            }
            TemporalKind::TimeOfDay => {
                let millis = LittleEndian::read_u32(raw) as u64;
                Ok(DecodedValue::Temporal(Self::format_time_of_day(millis)?))
            }
            TemporalKind::Date | TemporalKind::DateAndTime => {
                let secs = LittleEndian::read_u32(raw) as i64;
                let datetime = DateTime::from_timestamp(secs, 0)
                    .ok_or_else(|| {
                        DecodeError::InvalidTemporal(format!("{} seconds is out of range", secs))
                    })?
                    .naive_utc();

                if kind == TemporalKind::Date {
                    Ok(DecodedValue::Date(datetime.date()))
                } else {
                    Ok(DecodedValue::DateTime(datetime))
                }
            }
        }
    }

    /// `DD:HH:MM:SS.mmm.uuu` from a nanosecond count.
    ///
    /// The last group is the sub-millisecond remainder cut to its leading
    /// three digits (microseconds), never rounded.
    fn format_ltime(nanos: u64) -> String {
        let millis = nanos / NANOS_PER_MILLI;
        let sub_milli = nanos % NANOS_PER_MILLI;
        format!("{}.{:03}", Self::format_duration_millis(millis), sub_milli / 1_000)
    }

    /// `DD:HH:MM:SS.mmm` from a millisecond count
    fn format_duration_millis(millis: u64) -> String {
        format!(
            "{:02}:{:02}:{:02}:{:02}.{:03}",
            millis / MILLIS_PER_DAY,
            (millis % MILLIS_PER_DAY) / MILLIS_PER_HOUR,
            (millis % MILLIS_PER_HOUR) / MILLIS_PER_MINUTE,
            (millis % MILLIS_PER_MINUTE) / MILLIS_PER_SECOND,
            millis % MILLIS_PER_SECOND
        )
    }

    /// `HH:MM:SS.mmm` from milliseconds since midnight
    fn format_time_of_day(millis: u64) -> Result<String, DecodeError> {
        if millis >= MILLIS_PER_DAY {
            return Err(DecodeError::InvalidTemporal(format!(
                "time of day {} ms exceeds one day",
                millis
            )));
        }

        Ok(format!(
            "{:02}:{:02}:{:02}.{:03}",
            millis / MILLIS_PER_HOUR,
            (millis % MILLIS_PER_HOUR) / MILLIS_PER_MINUTE,
            (millis % MILLIS_PER_MINUTE) / MILLIS_PER_SECOND,
            millis % MILLIS_PER_SECOND
        ))
    }
}
