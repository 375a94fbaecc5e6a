//! EDM primitive types and their literal grammar.
//!
//! Two textual forms exist for every primitive value:
//!
//! - *content text*: the text of a property element, e.g. `42` or
//!   `2003-12-13T18:30:02` ([`SimpleValue::parse_text`] / [`SimpleValue::text`])
//! - *key literal*: the form used inside key clauses and URIs, e.g. `42L`,
//!   `'O''Neil'` or `guid'...'` ([`SimpleValue::parse_key_literal`] /
//!   [`SimpleValue::to_literal`])

use core::fmt;
use core::fmt::Write as _;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use rust_decimal::Decimal;
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};
use uuid::Uuid;

/// The EDM primitive type vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdmSimpleType {
    /// `Edm.Binary`
    Binary,
    /// `Edm.Boolean`
    Boolean,
    /// `Edm.Byte`
    Byte,
    /// `Edm.DateTime`, a local date and time without offset.
    DateTime,
    /// `Edm.DateTimeOffset`
    DateTimeOffset,
    /// `Edm.Decimal`
    Decimal,
    /// `Edm.Double`
    Double,
    /// `Edm.Guid`
    Guid,
    /// `Edm.Int16`
    Int16,
    /// `Edm.Int32`
    Int32,
    /// `Edm.Int64`
    Int64,
    /// `Edm.SByte`
    SByte,
    /// `Edm.Single`
    Single,
    /// `Edm.String`
    String,
    /// `Edm.Time`, a time of day.
    Time,
}

impl EdmSimpleType {
    /// Resolve a fully-qualified `Edm.*` name.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "Edm.Binary" => Self::Binary,
            "Edm.Boolean" => Self::Boolean,
            "Edm.Byte" => Self::Byte,
            "Edm.DateTime" => Self::DateTime,
            "Edm.DateTimeOffset" => Self::DateTimeOffset,
            "Edm.Decimal" => Self::Decimal,
            "Edm.Double" => Self::Double,
            "Edm.Guid" => Self::Guid,
            "Edm.Int16" => Self::Int16,
            "Edm.Int32" => Self::Int32,
            "Edm.Int64" => Self::Int64,
            "Edm.SByte" => Self::SByte,
            "Edm.Single" => Self::Single,
            "Edm.String" => Self::String,
            "Edm.Time" => Self::Time,
            _ => return None,
        })
    }

    /// The fully-qualified `Edm.*` name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Binary => "Edm.Binary",
            Self::Boolean => "Edm.Boolean",
            Self::Byte => "Edm.Byte",
            Self::DateTime => "Edm.DateTime",
            Self::DateTimeOffset => "Edm.DateTimeOffset",
            Self::Decimal => "Edm.Decimal",
            Self::Double => "Edm.Double",
            Self::Guid => "Edm.Guid",
            Self::Int16 => "Edm.Int16",
            Self::Int32 => "Edm.Int32",
            Self::Int64 => "Edm.Int64",
            Self::SByte => "Edm.SByte",
            Self::Single => "Edm.Single",
            Self::String => "Edm.String",
            Self::Time => "Edm.Time",
        }
    }
}

impl fmt::Display for EdmSimpleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A literal failed its type's grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralError {
    /// Content text did not parse as the given primitive type.
    Invalid {
        /// The type the text was decoded against.
        kind: EdmSimpleType,
        /// The offending text.
        text: String,
    },
    /// A key literal was not recognized by the literal grammar.
    Malformed {
        /// The offending literal.
        text: String,
    },
}

impl fmt::Display for LiteralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid { kind, text } => {
                write!(f, "invalid {} literal: {:?}", kind.name(), text)
            }
            Self::Malformed { text } => write!(f, "malformed key literal: {:?}", text),
        }
    }
}

impl std::error::Error for LiteralError {}

/// A decoded EDM primitive value.
#[derive(Debug, Clone, PartialEq)]
pub enum SimpleValue {
    /// `Edm.Binary`
    Binary(Vec<u8>),
    /// `Edm.Boolean`
    Boolean(bool),
    /// `Edm.Byte`
    Byte(u8),
    /// `Edm.DateTime`
    DateTime(PrimitiveDateTime),
    /// `Edm.DateTimeOffset`
    DateTimeOffset(OffsetDateTime),
    /// `Edm.Decimal`
    Decimal(Decimal),
    /// `Edm.Double`
    Double(f64),
    /// `Edm.Guid`
    Guid(Uuid),
    /// `Edm.Int16`
    Int16(i16),
    /// `Edm.Int32`
    Int32(i32),
    /// `Edm.Int64`
    Int64(i64),
    /// `Edm.SByte`
    SByte(i8),
    /// `Edm.Single`
    Single(f32),
    /// `Edm.String`
    String(String),
    /// `Edm.Time`
    Time(Time),
}

const DATETIME_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    version = 2,
    "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
);

const TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!(version = 2, "[hour]:[minute]:[second][optional [.[subsecond]]]");

impl SimpleValue {
    /// The primitive type this value belongs to.
    pub fn simple_type(&self) -> EdmSimpleType {
        match self {
            Self::Binary(_) => EdmSimpleType::Binary,
            Self::Boolean(_) => EdmSimpleType::Boolean,
            Self::Byte(_) => EdmSimpleType::Byte,
            Self::DateTime(_) => EdmSimpleType::DateTime,
            Self::DateTimeOffset(_) => EdmSimpleType::DateTimeOffset,
            Self::Decimal(_) => EdmSimpleType::Decimal,
            Self::Double(_) => EdmSimpleType::Double,
            Self::Guid(_) => EdmSimpleType::Guid,
            Self::Int16(_) => EdmSimpleType::Int16,
            Self::Int32(_) => EdmSimpleType::Int32,
            Self::Int64(_) => EdmSimpleType::Int64,
            Self::SByte(_) => EdmSimpleType::SByte,
            Self::Single(_) => EdmSimpleType::Single,
            Self::String(_) => EdmSimpleType::String,
            Self::Time(_) => EdmSimpleType::Time,
        }
    }

    /// Decode element content text against a primitive type.
    pub fn parse_text(kind: EdmSimpleType, text: &str) -> Result<Self, LiteralError> {
        let invalid = || LiteralError::Invalid {
            kind,
            text: text.to_string(),
        };
        Ok(match kind {
            EdmSimpleType::Binary => Self::Binary(BASE64.decode(text).map_err(|_| invalid())?),
            EdmSimpleType::Boolean => match text {
                "true" | "1" => Self::Boolean(true),
                "false" | "0" => Self::Boolean(false),
                _ => return Err(invalid()),
            },
            EdmSimpleType::Byte => Self::Byte(text.parse().map_err(|_| invalid())?),
            EdmSimpleType::DateTime => Self::DateTime(
                PrimitiveDateTime::parse(text, DATETIME_FORMAT).map_err(|_| invalid())?,
            ),
            EdmSimpleType::DateTimeOffset => Self::DateTimeOffset(
                OffsetDateTime::parse(text, &Rfc3339).map_err(|_| invalid())?,
            ),
            EdmSimpleType::Decimal => Self::Decimal(text.parse().map_err(|_| invalid())?),
            EdmSimpleType::Double => Self::Double(text.parse().map_err(|_| invalid())?),
            EdmSimpleType::Guid => Self::Guid(Uuid::parse_str(text).map_err(|_| invalid())?),
            EdmSimpleType::Int16 => Self::Int16(text.parse().map_err(|_| invalid())?),
            EdmSimpleType::Int32 => Self::Int32(text.parse().map_err(|_| invalid())?),
            EdmSimpleType::Int64 => Self::Int64(text.parse().map_err(|_| invalid())?),
            EdmSimpleType::SByte => Self::SByte(text.parse().map_err(|_| invalid())?),
            EdmSimpleType::Single => Self::Single(text.parse().map_err(|_| invalid())?),
            EdmSimpleType::String => Self::String(text.to_string()),
            EdmSimpleType::Time => {
                Self::Time(Time::parse(text, TIME_FORMAT).map_err(|_| invalid())?)
            }
        })
    }

    /// Render the value as element content text, the inverse of
    /// [`parse_text`](Self::parse_text).
    pub fn text(&self) -> String {
        match self {
            Self::Binary(bytes) => BASE64.encode(bytes),
            Self::Boolean(v) => v.to_string(),
            Self::Byte(v) => v.to_string(),
            Self::DateTime(v) => datetime_text(v),
            Self::DateTimeOffset(v) => {
                let mut out = datetime_text(&PrimitiveDateTime::new(v.date(), v.time()));
                push_offset(v.offset(), &mut out);
                out
            }
            Self::Decimal(v) => v.to_string(),
            Self::Double(v) => v.to_string(),
            Self::Guid(v) => v.to_string(),
            Self::Int16(v) => v.to_string(),
            Self::Int32(v) => v.to_string(),
            Self::Int64(v) => v.to_string(),
            Self::SByte(v) => v.to_string(),
            Self::Single(v) => v.to_string(),
            Self::String(v) => v.clone(),
            Self::Time(v) => time_text(v),
        }
    }

    /// Decode a key literal: a quoted string, a suffixed number, or a
    /// type-prefixed quoted form such as `guid'...'`.
    pub fn parse_key_literal(text: &str) -> Result<Self, LiteralError> {
        let malformed = || LiteralError::Malformed {
            text: text.to_string(),
        };

        if text.starts_with('\'') {
            return Ok(Self::String(unquote(text)?));
        }
        if let Some(inner) = prefixed(text, "guid") {
            return Self::parse_text(EdmSimpleType::Guid, inner)
                .map_err(|_| malformed());
        }
        if let Some(inner) = prefixed(text, "datetimeoffset") {
            return Self::parse_text(EdmSimpleType::DateTimeOffset, inner)
                .map_err(|_| malformed());
        }
        if let Some(inner) = prefixed(text, "datetime") {
            return Self::parse_text(EdmSimpleType::DateTime, inner)
                .map_err(|_| malformed());
        }
        if let Some(inner) = prefixed(text, "time") {
            return Self::parse_text(EdmSimpleType::Time, inner)
                .map_err(|_| malformed());
        }
        if let Some(inner) = prefixed(text, "binary").or_else(|| prefixed(text, "X")) {
            return Ok(Self::Binary(hex_decode(inner).ok_or_else(malformed)?));
        }
        match text {
            "true" => return Ok(Self::Boolean(true)),
            "false" => return Ok(Self::Boolean(false)),
            _ => {}
        }

        // Numeric literal, optionally suffixed.
        if let Some(body) = text.strip_suffix(['L', 'l']) {
            return Ok(Self::Int64(body.parse().map_err(|_| malformed())?));
        }
        if let Some(body) = text.strip_suffix(['M', 'm']) {
            return Ok(Self::Decimal(body.parse().map_err(|_| malformed())?));
        }
        if let Some(body) = text.strip_suffix(['F', 'f']) {
            return Ok(Self::Single(body.parse().map_err(|_| malformed())?));
        }
        if let Some(body) = text.strip_suffix(['D', 'd']) {
            return Ok(Self::Double(body.parse().map_err(|_| malformed())?));
        }
        if text.contains(['.', 'e', 'E']) {
            return Ok(Self::Double(text.parse().map_err(|_| malformed())?));
        }
        if let Ok(v) = text.parse::<i32>() {
            return Ok(Self::Int32(v));
        }
        text.parse::<i64>().map(Self::Int64).map_err(|_| malformed())
    }

    /// Render the value as a key literal, the inverse of
    /// [`parse_key_literal`](Self::parse_key_literal).
    pub fn to_literal(&self) -> String {
        match self {
            Self::Binary(bytes) => format!("binary'{}'", hex_encode(bytes)),
            Self::Boolean(v) => v.to_string(),
            Self::Byte(v) => v.to_string(),
            Self::DateTime(_) => format!("datetime'{}'", self.text()),
            Self::DateTimeOffset(_) => format!("datetimeoffset'{}'", self.text()),
            Self::Decimal(v) => format!("{v}M"),
            Self::Double(v) => v.to_string(),
            Self::Guid(v) => format!("guid'{v}'"),
            Self::Int16(v) => v.to_string(),
            Self::Int32(v) => v.to_string(),
            Self::Int64(v) => format!("{v}L"),
            Self::SByte(v) => v.to_string(),
            Self::Single(v) => format!("{v}f"),
            Self::String(v) => quote(v),
            Self::Time(_) => format!("time'{}'", self.text()),
        }
    }
}

fn datetime_text(dt: &PrimitiveDateTime) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
        dt.year(),
        u8::from(dt.month()),
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second(),
    );
    push_fraction(dt.nanosecond(), &mut out);
    out
}

fn time_text(t: &Time) -> String {
    let mut out = String::new();
    let _ = write!(out, "{:02}:{:02}:{:02}", t.hour(), t.minute(), t.second());
    push_fraction(t.nanosecond(), &mut out);
    out
}

fn push_fraction(nanos: u32, out: &mut String) {
    if nanos != 0 {
        let digits = format!("{nanos:09}");
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
}

fn push_offset(offset: UtcOffset, out: &mut String) {
    if offset.is_utc() {
        out.push('Z');
    } else {
        let (h, m, _) = offset.as_hms();
        let sign = if h < 0 || m < 0 { '-' } else { '+' };
        let _ = write!(out, "{sign}{:02}:{:02}", h.abs(), m.abs());
    }
}

/// Match `prefix'inner'`, returning the inner text.
fn prefixed<'t>(text: &'t str, prefix: &str) -> Option<&'t str> {
    text.strip_prefix(prefix)?
        .strip_prefix('\'')?
        .strip_suffix('\'')
}

fn unquote(text: &str) -> Result<String, LiteralError> {
    let malformed = || LiteralError::Malformed {
        text: text.to_string(),
    };
    let inner = text
        .strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .ok_or_else(malformed)?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\'' {
            // only the '' escape may contain a quote
            match chars.next() {
                Some('\'') => out.push('\''),
                _ => return Err(malformed()),
            }
        } else {
            out.push(c);
        }
    }
    Ok(out)
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn hex_decode(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 {
        return None;
    }
    text.as_bytes()
        .chunks(2)
        .map(|pair| {
            let s = core::str::from_utf8(pair).ok()?;
            u8::from_str_radix(s, 16).ok()
        })
        .collect()
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02X}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn parses_int_text() {
        assert_eq!(
            SimpleValue::parse_text(EdmSimpleType::Int32, "42").unwrap(),
            SimpleValue::Int32(42)
        );
    }

    #[test]
    fn rejects_bad_int_text() {
        let err = SimpleValue::parse_text(EdmSimpleType::Int32, "forty-two").unwrap_err();
        assert!(matches!(err, LiteralError::Invalid { kind: EdmSimpleType::Int32, .. }));
    }

    #[test]
    fn datetime_text_round_trips_with_fraction() {
        let v = SimpleValue::parse_text(EdmSimpleType::DateTime, "2008-09-18T23:46:19.343").unwrap();
        assert_eq!(v, SimpleValue::DateTime(datetime!(2008-09-18 23:46:19.343)));
        assert_eq!(v.text(), "2008-09-18T23:46:19.343");
    }

    #[test]
    fn datetime_text_without_fraction() {
        let v = SimpleValue::parse_text(EdmSimpleType::DateTime, "2003-12-13T18:30:02").unwrap();
        assert_eq!(v.text(), "2003-12-13T18:30:02");
    }

    #[test]
    fn quoted_literal_unescapes_doubled_quotes() {
        assert_eq!(
            SimpleValue::parse_key_literal("'O''Neil'").unwrap(),
            SimpleValue::String("O'Neil".to_string())
        );
    }

    #[test]
    fn quoted_literal_keeps_interior_parens() {
        assert_eq!(
            SimpleValue::parse_key_literal("'X (EASTING)'").unwrap(),
            SimpleValue::String("X (EASTING)".to_string())
        );
    }

    #[test]
    fn suffixed_numbers() {
        assert_eq!(SimpleValue::parse_key_literal("7").unwrap(), SimpleValue::Int32(7));
        assert_eq!(
            SimpleValue::parse_key_literal("7L").unwrap(),
            SimpleValue::Int64(7)
        );
        assert_eq!(
            SimpleValue::parse_key_literal("2.5M").unwrap(),
            SimpleValue::Decimal("2.5".parse().unwrap())
        );
    }

    #[test]
    fn guid_literal() {
        let text = "guid'12345678-aaaa-bbbb-cccc-ddddeeeeffff'";
        let v = SimpleValue::parse_key_literal(text).unwrap();
        assert_eq!(v.to_literal(), text);
    }

    #[test]
    fn literal_rendering_round_trips() {
        for literal in ["'a''b'", "17", "9000000000L", "true"] {
            let v = SimpleValue::parse_key_literal(literal).unwrap();
            assert_eq!(v.to_literal(), literal);
        }
    }

    #[test]
    fn binary_hex_literal() {
        assert_eq!(
            SimpleValue::parse_key_literal("binary'00FF'").unwrap(),
            SimpleValue::Binary(vec![0x00, 0xFF])
        );
    }
}
