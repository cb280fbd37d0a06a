//! Text helpers for the configuration rows and values an HMI exchanges
//! over a stream. None of this touches the buffers.

extern crate alloc;

use alloc::{format, string::String};
use core::{fmt, str::FromStr};

/// Row of fields split from one line, at most `N` of them.
pub type Row<'a, const N: usize> = heapless::Vec<&'a str, N>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextError {
    TooManyFields { limit: usize },
    UnknownValueType,
}

impl fmt::Display for TextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextError::TooManyFields { limit } => write!(f, "more than {limit} fields in row"),
            TextError::UnknownValueType => f.write_str("unknown value type"),
        }
    }
}

impl core::error::Error for TextError {}

/// Strip leading and trailing spaces. Tabs and newlines are kept.
pub fn trim(s: &str) -> &str {
    s.trim_matches(' ')
}

/// Split `line` on `delimiter`, trimming each field.
///
/// A delimiter at the very end does not start another field, so
/// `"a,b,"` gives two fields while `"a,,b"` gives three.
pub fn split_fields(line: &str, delimiter: char) -> impl Iterator<Item = &str> {
    let body = line.strip_suffix(delimiter).unwrap_or(line);
    (!line.is_empty())
        .then(|| body.split(delimiter))
        .into_iter()
        .flatten()
        .map(trim)
}

pub fn split_row<const N: usize>(line: &str, delimiter: char) -> Result<Row<'_, N>, TextError> {
    let mut row = Row::new();
    for field in split_fields(line, delimiter) {
        row.push(field)
            .map_err(|_| TextError::TooManyFields { limit: N })?;
    }
    Ok(row)
}

/// True for an empty line or one made only of ASCII whitespace
/// (vertical tab included).
pub fn is_whitespace_only(line: &str) -> bool {
    line.bytes()
        .all(|b| b.is_ascii_whitespace() || b == 0x0B)
}

/// Exactly `expected` fields and none of them empty.
pub fn validate_row(fields: &[&str], expected: usize) -> bool {
    fields.len() == expected && fields.iter().all(|f| !f.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    String,
    Bool,
}

impl ValueType {
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::UInt8 => "uint8",
            ValueType::UInt16 => "uint16",
            ValueType::UInt32 => "uint32",
            ValueType::UInt64 => "uint64",
            ValueType::Int8 => "int8",
            ValueType::Int16 => "int16",
            ValueType::Int32 => "int32",
            ValueType::Int64 => "int64",
            ValueType::Float => "float",
            ValueType::Double => "double",
            ValueType::String => "string",
            ValueType::Bool => "bool",
        }
    }

    /// Whether `data` is a well-formed value of this type.
    pub fn accepts(&self, data: &str) -> bool {
        match self {
            ValueType::UInt8 => is_uint8(data),
            ValueType::UInt16 => is_uint16(data),
            ValueType::UInt32 => is_uint32(data),
            ValueType::UInt64 => is_uint64(data),
            ValueType::Int8 => is_int8(data),
            ValueType::Int16 => is_int16(data),
            ValueType::Int32 => is_int32(data),
            ValueType::Int64 => is_int64(data),
            ValueType::Float => is_float(data),
            ValueType::Double => is_double(data),
            ValueType::String => true,
            ValueType::Bool => is_boolean(data),
        }
    }
}

impl FromStr for ValueType {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = match s {
            "uint8" => ValueType::UInt8,
            "uint16" => ValueType::UInt16,
            "uint32" => ValueType::UInt32,
            "uint64" => ValueType::UInt64,
            "int8" => ValueType::Int8,
            "int16" => ValueType::Int16,
            "int32" => ValueType::Int32,
            "int64" => ValueType::Int64,
            "float" => ValueType::Float,
            "double" => ValueType::Double,
            "string" => ValueType::String,
            "bool" => ValueType::Bool,
            _ => return Err(TextError::UnknownValueType),
        };
        Ok(t)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Check `data` against the type called `type_name`. Unknown names never match.
pub fn check_value_type(data: &str, type_name: &str) -> bool {
    type_name
        .parse::<ValueType>()
        .is_ok_and(|t| t.accepts(data))
}

// Leading whitespace is skipped, anything trailing is rejected.
fn parses<T: FromStr>(data: &str) -> Option<T> {
    data.trim_start().parse().ok()
}

pub fn is_uint8(data: &str) -> bool {
    parses::<u8>(data).is_some()
}

pub fn is_uint16(data: &str) -> bool {
    parses::<u16>(data).is_some()
}

pub fn is_uint32(data: &str) -> bool {
    parses::<u32>(data).is_some()
}

pub fn is_uint64(data: &str) -> bool {
    parses::<u64>(data).is_some()
}

pub fn is_int8(data: &str) -> bool {
    parses::<i8>(data).is_some()
}

pub fn is_int16(data: &str) -> bool {
    parses::<i16>(data).is_some()
}

pub fn is_int32(data: &str) -> bool {
    parses::<i32>(data).is_some()
}

pub fn is_int64(data: &str) -> bool {
    parses::<i64>(data).is_some()
}

pub fn is_float(data: &str) -> bool {
    parses::<f32>(data).is_some_and(f32::is_finite)
}

pub fn is_double(data: &str) -> bool {
    parses::<f64>(data).is_some_and(f64::is_finite)
}

/// `true` or `false` in any letter case.
pub fn is_boolean(data: &str) -> bool {
    data.eq_ignore_ascii_case("true") || data.eq_ignore_ascii_case("false")
}

/// Non-empty and decimal digits only, so `"1.5"` and `"-1"` are not numbers.
pub fn is_number(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

pub fn ends_with(s: &str, suffix: &str) -> bool {
    s.ends_with(suffix)
}

/// Fixed-point rendering with `precision` digits after the point.
pub fn decimal_to_string(value: impl Into<f64>, precision: u8) -> String {
    format!("{:.*}", precision as usize, value.into())
}
