//! General utilities: hex and integer conversions, timestamps

use chrono::{Local, TimeZone};
use thiserror::Error;

/// Largest integer a JSON number (IEEE double) represents exactly
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// Errors from parsing user- or RPC-supplied values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Invalid integer: {0:?}")]
    InvalidInteger(String),

    #[error("Integer does not fit in 128 bits: {0}")]
    Overflow(String),

    #[error("Invalid hex string: {0:?}")]
    InvalidHex(String),

    #[error("Invalid address {input:?}: {reason}")]
    InvalidAddress { input: String, reason: String },
}

/// Converts the integer to a hex string without `0x`.
///
/// With `extend_to`, the string is left-padded with zeros to that many BYTES
/// (twice as many characters). Otherwise it is padded to an even length.
pub fn bigint_to_hex(n: u128, extend_to: Option<usize>) -> String {
    let digits = format!("{n:x}");
    match extend_to {
        Some(bytes) => format!("{digits:0>width$}", width = bytes * 2),
        None if digits.len() % 2 == 1 => format!("0{digits}"),
        None => digits,
    }
}

/// Converts bytes to a lowercase hex string without `0x`, of length `2 * bytes.len()`
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Strips an optional `0x`/`0X` prefix and decodes the hex digits
pub fn hex_to_bytes(input: &str) -> Result<Vec<u8>, ParseError> {
    let digits = strip_hex_prefix(input).unwrap_or(input);
    hex::decode(digits).map_err(|_| ParseError::InvalidHex(input.to_string()))
}

pub(crate) fn strip_hex_prefix(input: &str) -> Option<&str> {
    input.strip_prefix("0x").or_else(|| input.strip_prefix("0X"))
}

/// A value that can be read as an unsigned big integer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BigIntInput<'a> {
    /// Decimal digits, or hex digits after `0x`
    Str(&'a str),
    Int(u128),
    /// Big-endian bytes
    Bytes(&'a [u8]),
}

impl<'a> From<&'a str> for BigIntInput<'a> {
    fn from(value: &'a str) -> Self {
        BigIntInput::Str(value)
    }
}

impl From<u128> for BigIntInput<'_> {
    fn from(value: u128) -> Self {
        BigIntInput::Int(value)
    }
}

impl From<u64> for BigIntInput<'_> {
    fn from(value: u64) -> Self {
        BigIntInput::Int(value.into())
    }
}

impl<'a> From<&'a [u8]> for BigIntInput<'a> {
    fn from(value: &'a [u8]) -> Self {
        BigIntInput::Bytes(value)
    }
}

/// Parses a big-integer-compatible value
pub fn parse_bigint<'a>(value: impl Into<BigIntInput<'a>>) -> Result<u128, ParseError> {
    match value.into() {
        BigIntInput::Int(n) => Ok(n),
        BigIntInput::Str(s) => parse_str(s),
        BigIntInput::Bytes(bytes) => parse_bytes(bytes),
    }
}

/// Parses a big-integer-compatible value, returning None for a missing or unparsable one
pub fn parse_bigint_or_none(value: Option<BigIntInput<'_>>) -> Option<u128> {
    value.and_then(|v| parse_bigint(v).ok())
}

fn parse_str(input: &str) -> Result<u128, ParseError> {
    let trimmed = input.trim();
    let (digits, radix) = match strip_hex_prefix(trimmed) {
        Some(hex) => (hex, 16),
        None => (trimmed, 10),
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(ParseError::InvalidInteger(input.to_string()));
    }

    u128::from_str_radix(digits, radix).map_err(|_| ParseError::Overflow(input.to_string()))
}

fn parse_bytes(bytes: &[u8]) -> Result<u128, ParseError> {
    if bytes.is_empty() {
        return Err(ParseError::InvalidInteger(String::new()));
    }

    let significant = match bytes.iter().position(|b| *b != 0) {
        Some(first) => &bytes[first..],
        None => return Ok(0),
    };
    if significant.len() > 16 {
        return Err(ParseError::Overflow(format!("0x{}", bytes_to_hex(bytes))));
    }

    Ok(significant.iter().fold(0u128, |acc, b| (acc << 8) | u128::from(*b)))
}

/// Checks that the string is a canonical non-negative decimal integer
/// (no sign, no leading zeros, at most [`MAX_SAFE_INTEGER`]).
pub fn is_positive_integer_str(s: &str) -> bool {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    if s.len() > 1 && s.starts_with('0') {
        return false;
    }
    s.parse::<u64>().map(|n| n <= MAX_SAFE_INTEGER).unwrap_or(false)
}

/// Formats a UNIX timestamp in milliseconds as local "HH:MM:SS"
pub fn format_timestamp(timestamp_ms: i64) -> String {
    match Local.timestamp_millis_opt(timestamp_ms).single() {
        Some(time) => time.format("%H:%M:%S").to_string(),
        None => "--:--:--".to_string(),
    }
}
