//! Value coercion registry.
//!
//! Every literal token in a query is turned into a typed [`Value`] by a
//! named converter. A token may pick its converter with a `name:` prefix
//! (`number:10`, `date:2009-01-01`, `re:^t`); otherwise the parser's default
//! converter, [`Converter::Auto`], applies.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

use crate::parser::ParseError;
use crate::value::{Pattern, Value, number_text};

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})T(\d{2}):(\d{2}):(\d{2})(?:\.(\d{1,3}))?Z$")
        .expect("static pattern")
});

const ISO_TEMPLATE: &str = "0000-01-01T00:00:00Z";

/// A named scalar converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Converter {
    /// Keywords, exact numbers, quoted strings, else decoded text
    #[default]
    Auto,
    /// Any numeric text
    Number,
    /// Milliseconds since the Unix epoch
    Epoch,
    /// Partial ISO-8601 date, completed from `0000-01-01T00:00:00Z`
    IsoDate,
    /// ISO-8601 UTC timestamp with generic fallbacks
    Date,
    /// `true` is true, anything else is false
    Boolean,
    /// Percent-decoded text, never reinterpreted
    String,
    /// Case-insensitive regular expression (`re:`)
    Regex,
    /// Case-sensitive regular expression (`RE:`)
    RegexCaseSensitive,
    /// Shell glob translated to a case-insensitive regular expression
    Glob,
}

impl Converter {
    /// Look up a converter by its prefix name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "auto" => Some(Converter::Auto),
            "number" => Some(Converter::Number),
            "epoch" => Some(Converter::Epoch),
            "isodate" => Some(Converter::IsoDate),
            "date" => Some(Converter::Date),
            "boolean" => Some(Converter::Boolean),
            "string" => Some(Converter::String),
            "re" => Some(Converter::Regex),
            "RE" => Some(Converter::RegexCaseSensitive),
            "glob" => Some(Converter::Glob),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Converter::Auto => "auto",
            Converter::Number => "number",
            Converter::Epoch => "epoch",
            Converter::IsoDate => "isodate",
            Converter::Date => "date",
            Converter::Boolean => "boolean",
            Converter::String => "string",
            Converter::Regex => "re",
            Converter::RegexCaseSensitive => "RE",
            Converter::Glob => "glob",
        }
    }

    /// Convert literal text into a value
    pub fn convert(self, text: &str) -> Result<Value, ParseError> {
        match self {
            Converter::Auto => auto(text),
            Converter::Number => number(text),
            Converter::Epoch => epoch(text),
            Converter::IsoDate => date(&complete_iso_date(text)),
            Converter::Date => date(text),
            Converter::Boolean => Ok(Value::Boolean(text == "true")),
            Converter::String => percent_decode(text).map(Value::String),
            Converter::Regex => regex(&percent_decode(text)?, true),
            Converter::RegexCaseSensitive => regex(&percent_decode(text)?, false),
            Converter::Glob => glob(&percent_decode(text)?),
        }
    }
}

fn auto(text: &str) -> Result<Value, ParseError> {
    match text {
        "true" => return Ok(Value::Boolean(true)),
        "false" => return Ok(Value::Boolean(false)),
        "null" | "undefined" => return Ok(Value::Null),
        "Infinity" => return Ok(Value::Float(f64::INFINITY)),
        "-Infinity" => return Ok(Value::Float(f64::NEG_INFINITY)),
        _ => {}
    }
    if let Some(n) = exact_number(text) {
        return Ok(n);
    }
    let decoded = percent_decode(text)?;
    if decoded.len() >= 2 && decoded.starts_with('\'') && decoded.ends_with('\'') {
        let inner = &decoded[1..decoded.len() - 1];
        return serde_json::from_str::<String>(&format!("\"{}\"", inner))
            .map(Value::String)
            .map_err(|e| ParseError::InvalidLiteral(format!("Invalid quoted string {}: {}", text, e)));
    }
    Ok(Value::String(decoded))
}

/// A number only when the text is exactly how that number would be written
fn exact_number(text: &str) -> Option<Value> {
    if let Ok(n) = text.parse::<i64>() {
        return (n.to_string() == text).then_some(Value::Integer(n));
    }
    let n = text.parse::<f64>().ok()?;
    (n.is_finite() && number_text(n) == text).then_some(Value::Float(n))
}

fn number(text: &str) -> Result<Value, ParseError> {
    parse_number(text).ok_or_else(|| ParseError::InvalidLiteral(format!("Invalid number {}", text)))
}

fn parse_number(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(Value::Integer(0));
    }
    match trimmed {
        "Infinity" | "+Infinity" => return Some(Value::Float(f64::INFINITY)),
        "-Infinity" => return Some(Value::Float(f64::NEG_INFINITY)),
        _ => {}
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(Value::Integer(n));
    }
    if trimmed.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    trimmed.parse::<f64>().ok().map(Value::Float)
}

fn epoch(text: &str) -> Result<Value, ParseError> {
    let invalid = || ParseError::InvalidLiteral(format!("Invalid date {}", text));
    let ms = match parse_number(text).ok_or_else(invalid)? {
        Value::Integer(n) => n,
        Value::Float(n) if n.is_finite() => n.trunc() as i64,
        _ => return Err(invalid()),
    };
    Value::from_epoch_millis(ms).ok_or_else(invalid)
}

fn complete_iso_date(text: &str) -> String {
    let mut date = String::new();
    let len = text.chars().count();
    if len < 4 {
        date.push_str(&"0000"[..4 - len]);
    }
    date.push_str(text);
    let filled = date.chars().count();
    if filled < ISO_TEMPLATE.len() {
        date.push_str(&ISO_TEMPLATE[filled..]);
    }
    date
}

fn date(text: &str) -> Result<Value, ParseError> {
    parse_date(text)
        .map(Value::Date)
        .ok_or_else(|| ParseError::InvalidLiteral(format!("Invalid date {}", text)))
}

fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    if let Some(caps) = ISO_DATE.captures(text) {
        let part = |i: usize| caps.get(i).map_or(0, |m| m.as_str().parse::<u32>().unwrap_or(0));
        let year = caps[1].parse::<i32>().ok()?;
        let base = Utc
            .with_ymd_and_hms(year, part(2), part(3), part(4), part(5), part(6))
            .single()?;
        return Some(base + chrono::Duration::milliseconds(part(7) as i64));
    }
    if let Ok(d) = DateTime::parse_from_rfc3339(text) {
        return Some(d.with_timezone(&Utc));
    }
    if let Ok(d) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Some(d.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|d| d.and_utc());
    }
    if text.len() == 4 && text.chars().all(|c| c.is_ascii_digit()) {
        let year = text.parse::<i32>().ok()?;
        return Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single();
    }
    None
}

fn regex(source: &str, case_insensitive: bool) -> Result<Value, ParseError> {
    Pattern::new(source, case_insensitive)
        .map(Value::Regex)
        .map_err(|e| ParseError::InvalidLiteral(format!("Invalid regular expression {}: {}", source, e)))
}

fn glob(pattern: &str) -> Result<Value, ParseError> {
    let mut source = regex::escape(pattern)
        .replace(r"\*", ".*")
        .replace(r"\?", ".?");
    match source.strip_prefix(".*") {
        Some(rest) => source = rest.to_string(),
        None => source.insert(0, '^'),
    }
    match source.strip_suffix(".*") {
        Some(rest) => source = rest.to_string(),
        None => source.push('$'),
    }
    regex(&source, true)
}

/// Decode `%XX` escapes; fails on malformed escapes or invalid UTF-8
pub fn percent_decode(text: &str) -> Result<String, ParseError> {
    if !text.contains('%') {
        return Ok(text.to_string());
    }
    let malformed = || ParseError::InvalidLiteral(format!("Malformed percent-encoding in {}", text));
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = text.get(i + 1..i + 3).ok_or_else(malformed)?;
            let byte = u8::from_str_radix(hex, 16).map_err(|_| malformed())?;
            out.push(byte);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|_| malformed())
}

/// Encode everything except ASCII alphanumerics and `- _ . *`.
///
/// The kept set is a subset of the bare-token alphabet, so encoded text is
/// always a single token; parentheses and the other grammar punctuation are
/// always escaped.
pub fn percent_encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'*' => {
                out.push(byte as char)
            }
            // lowercase hex keeps the `%3C`/`%3E` operator rewrite away from them
            b'<' | b'>' => out.push_str(&format!("%{:02x}", byte)),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
