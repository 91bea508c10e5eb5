//! Scalar codec: caller-supplied values ⇄ typed store literals.
//!
//! Date-like kinds accept an ordered list of input formats and are always
//! re-emitted in one canonical format:
//!
//! | kind     | canonical output                 |
//! |----------|----------------------------------|
//! | Date     | `YYYY-MM-DD[offset]`             |
//! | DateTime | `YYYY-MM-DDThh:mm:ss.sss[offset]`|
//! | Time     | `hh:mm:ss[offset]`               |
//!
//! The offset is `Z` for UTC and `±hh:mm` otherwise. Inputs without an
//! offset are read as UTC.

use crate::error::SchemaError;
use crate::naming::{Datatype, ScalarKind};
use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use ontograph_sparql::Term;
use regex::Regex;
use serde_json::Value;

static MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("static regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));
static INTEGER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?\d+$").expect("static regex"));
static DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)$").expect("static regex"));
static FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").expect("static regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OffsetRule {
    /// No offset allowed.
    Absent,
    /// `±hh:mm` only.
    Numeric,
    /// `Z` or `±hh:mm`.
    ZuluOrNumeric,
}

struct Format {
    body: &'static str,
    offset: OffsetRule,
}

const DATE_FORMATS: &[Format] = &[
    Format { body: "%Y-%m-%d", offset: OffsetRule::Absent },
    Format { body: "%Y-%m-%d", offset: OffsetRule::ZuluOrNumeric },
    Format { body: "%Y-%m-%d", offset: OffsetRule::Numeric },
];

const DATE_TIME_FORMATS: &[Format] = &[
    Format { body: "%Y-%m-%dT%H:%M:%S", offset: OffsetRule::Numeric },
    Format { body: "%Y-%m-%dT%H:%M:%S", offset: OffsetRule::ZuluOrNumeric },
    Format { body: "%Y-%m-%dT%H:%M:%S%.3f", offset: OffsetRule::Numeric },
    Format { body: "%Y-%m-%dT%H:%M:%S%.3f", offset: OffsetRule::ZuluOrNumeric },
];

const TIME_FORMATS: &[Format] = &[
    Format { body: "%H:%M:%S", offset: OffsetRule::Absent },
    Format { body: "%H:%M:%S", offset: OffsetRule::Numeric },
    Format { body: "%H:%M:%S", offset: OffsetRule::ZuluOrNumeric },
];

/// Encode a caller-supplied scalar as a store term.
pub fn encode(datatype: Datatype, raw: &Value) -> Result<Term, SchemaError> {
    let lexical = lexical_form(datatype, raw)?;
    let invalid = || SchemaError::invalid_scalar(datatype.safe_name(), lexical.clone());

    let canonical = match datatype {
        Datatype::Boolean => match lexical.as_str() {
            "true" | "1" => "true".to_string(),
            "false" | "0" => "false".to_string(),
            _ => return Err(invalid()),
        },
        Datatype::Integer => canonical_integer(lexical.trim()).ok_or_else(invalid)?,
        Datatype::Number => {
            let trimmed = lexical.trim();
            if !DECIMAL.is_match(trimmed) {
                return Err(invalid());
            }
            trimmed.to_string()
        }
        Datatype::Float => canonical_float(lexical.trim()).ok_or_else(invalid)?,
        Datatype::Text => return Ok(Term::plain(lexical)),
        Datatype::Url => {
            url::Url::parse(&lexical).map_err(|_| invalid())?;
            return Ok(Term::iri(lexical));
        }
        Datatype::Date => encode_date(&lexical).ok_or_else(invalid)?,
        Datatype::DateTime => encode_date_time(&lexical).ok_or_else(invalid)?,
        Datatype::Time => encode_time(&lexical).ok_or_else(invalid)?,
    };

    match datatype.xsd_local() {
        Some(local) => Ok(Term::typed(canonical, Term::xsd(local))),
        None => Ok(Term::iri(canonical)),
    }
}

/// Clean an ontology comment for display: drop markup, flatten newlines
/// (including escaped `\n`), collapse whitespace and trim.
pub fn decode(comment: &str) -> String {
    let stripped = MARKUP.replace_all(comment, "");
    let flattened = stripped.replace("\\n", " ").replace('\n', " ");
    WHITESPACE.replace_all(&flattened, " ").trim().to_string()
}

/// Convert a stored lexical value to the JSON value of the wrapper's
/// `value` field. Values that do not parse as the expected primitive are
/// passed through as strings.
pub fn to_json(datatype: Datatype, lexical: &str) -> Value {
    match datatype.scalar_kind() {
        ScalarKind::Boolean => match lexical {
            "true" | "1" => Value::Bool(true),
            "false" | "0" => Value::Bool(false),
            other => Value::String(other.to_string()),
        },
        ScalarKind::Int => lexical
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(lexical.to_string())),
        ScalarKind::Float => lexical
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(lexical.to_string())),
        ScalarKind::String => Value::String(lexical.to_string()),
    }
}

fn lexical_form(datatype: Datatype, raw: &Value) -> Result<String, SchemaError> {
    match raw {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(SchemaError::invalid_scalar(
            datatype.safe_name(),
            other.to_string(),
        )),
    }
}

// ============================================================================
// Numeric kinds
// ============================================================================

/// `xsd:integer` is unbounded, so only the digits are checked. Drops a
/// leading `+`, leading zeros and the sign of zero.
fn canonical_integer(input: &str) -> Option<String> {
    if !INTEGER.is_match(input) {
        return None;
    }
    let (negative, digits) = match input.as_bytes()[0] {
        b'-' => (true, &input[1..]),
        b'+' => (false, &input[1..]),
        _ => (false, input),
    };
    let digits = digits.trim_start_matches('0');
    Some(match (negative, digits.is_empty()) {
        (_, true) => "0".to_string(),
        (true, false) => format!("-{digits}"),
        (false, false) => digits.to_string(),
    })
}

/// Decimal or scientific notation, or one of the special values `INF`,
/// `-INF` and `NaN` spelled exactly as `xsd:float` spells them.
fn canonical_float(input: &str) -> Option<String> {
    match input {
        "INF" | "+INF" => return Some("INF".to_string()),
        "-INF" => return Some("-INF".to_string()),
        "NaN" => return Some("NaN".to_string()),
        _ => {}
    }
    if !FLOAT.is_match(input) || !input.parse::<f64>().ok()?.is_finite() {
        return None;
    }
    Some(input.to_string())
}

// ============================================================================
// Date-like kinds
// ============================================================================

fn encode_date(input: &str) -> Option<String> {
    DATE_FORMATS.iter().find_map(|format| {
        let (body, offset) = split_offset(input, format.offset)?;
        let date = NaiveDate::parse_from_str(body, format.body).ok()?;
        Some(format!("{}{}", date.format("%Y-%m-%d"), render_offset(offset)))
    })
}

fn encode_date_time(input: &str) -> Option<String> {
    DATE_TIME_FORMATS.iter().find_map(|format| {
        let (body, offset) = split_offset(input, format.offset)?;
        let moment = NaiveDateTime::parse_from_str(body, format.body).ok()?;
        Some(format!(
            "{}{}",
            moment.format("%Y-%m-%dT%H:%M:%S%.3f"),
            render_offset(offset)
        ))
    })
}

fn encode_time(input: &str) -> Option<String> {
    TIME_FORMATS.iter().find_map(|format| {
        let (body, offset) = split_offset(input, format.offset)?;
        let time = NaiveTime::parse_from_str(body, format.body).ok()?;
        Some(format!("{}{}", time.format("%H:%M:%S"), render_offset(offset)))
    })
}

/// Split a trailing offset according to `rule`. `None` when the input does
/// not carry the kind of offset the rule requires.
fn split_offset(input: &str, rule: OffsetRule) -> Option<(&str, FixedOffset)> {
    let utc = FixedOffset::east_opt(0)?;
    if let Some(body) = input.strip_suffix('Z') {
        return match rule {
            OffsetRule::ZuluOrNumeric => Some((body, utc)),
            _ => None,
        };
    }
    match numeric_offset(input) {
        Some((body, offset)) => match rule {
            OffsetRule::Numeric | OffsetRule::ZuluOrNumeric => Some((body, offset)),
            OffsetRule::Absent => None,
        },
        None => match rule {
            OffsetRule::Absent => Some((input, utc)),
            _ => None,
        },
    }
}

fn numeric_offset(input: &str) -> Option<(&str, FixedOffset)> {
    if input.len() < 6 || !input.is_char_boundary(input.len() - 6) {
        return None;
    }
    let (body, tail) = input.split_at(input.len() - 6);
    let bytes = tail.as_bytes();
    let sign = match bytes[0] {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    if bytes[3] != b':' {
        return None;
    }
    let hours: i32 = tail.get(1..3)?.parse().ok()?;
    let minutes: i32 = tail.get(4..6)?.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    let offset = FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))?;
    Some((body, offset))
}

fn render_offset(offset: FixedOffset) -> String {
    let seconds = offset.local_minus_utc();
    if seconds == 0 {
        return "Z".to_string();
    }
    let sign = if seconds < 0 { '-' } else { '+' };
    let seconds = seconds.abs();
    format!("{sign}{:02}:{:02}", seconds / 3600, (seconds % 3600) / 60)
}
