//! Header editor parsing
//!
//! Accepts a JSON object (`{"Accept": "application/json"}`) or one
//! `Key: Value` pair per line. JSON that fails to parse falls back to the
//! line form; only text with nothing parseable in either form is an error.

use crate::error::RequestBuildError;
use crate::models::Header;

pub fn parse_headers(text: &str) -> Result<Vec<Header>, RequestBuildError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let json_error = if text.starts_with('{') {
        match serde_json::from_str::<serde_json::Value>(text) {
            Ok(serde_json::Value::Object(map)) => return headers_from_object(map),
            Ok(_) => Some(String::from("expected an object")),
            Err(e) => Some(e.to_string()),
        }
    } else {
        None
    };

    let headers = parse_lines(text);
    if headers.is_empty() {
        let reason = match json_error {
            Some(e) => format!("not a JSON object ({}) and no `Key: Value` lines", e),
            None => String::from("no `Key: Value` lines found"),
        };
        return Err(RequestBuildError::InvalidHeaders { reason });
    }
    Ok(headers)
}

/// A well-formed JSON object is taken as meant: every entry must be a valid header
fn headers_from_object(
    map: serde_json::Map<String, serde_json::Value>,
) -> Result<Vec<Header>, RequestBuildError> {
    map.into_iter()
        .map(|(key, value)| {
            let value = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            if !is_token(&key) {
                return Err(RequestBuildError::InvalidHeaders {
                    reason: format!("`{}` is not a valid header name", key),
                });
            }
            if !is_field_value(&value) {
                return Err(RequestBuildError::InvalidHeaders {
                    reason: format!("value of `{}` contains control characters", key),
                });
            }
            Ok(Header::new(key, value))
        })
        .collect()
}

fn parse_lines(text: &str) -> Vec<Header> {
    let mut headers = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match line.split_once(':') {
            Some((key, value)) if is_token(key.trim()) && is_field_value(value.trim()) => {
                headers.push(Header::new(key.trim(), value.trim()));
            }
            _ => tracing::warn!(line, "Skipping unparsable header line"),
        }
    }
    headers
}

/// RFC 9110 field-name characters
fn is_token(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b))
}

/// Field values may hold tabs but no other control characters
fn is_field_value(value: &str) -> bool {
    value.bytes().all(|b| b == b'\t' || (b >= 0x20 && b != 0x7f))
}
