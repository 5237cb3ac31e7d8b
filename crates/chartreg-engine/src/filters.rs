//! Kubernetes-oriented template filters
//!
//! These extend MiniJinja with the Helm-flavored helpers chart templates
//! lean on most.

use base64::Engine as _;
use minijinja::{Error, ErrorKind, Value};

/// Convert a value to YAML format
///
/// Usage: {{ values.config | toyaml }}
pub fn toyaml(value: Value) -> Result<String, Error> {
    let json_value: serde_json::Value = serde_json::to_value(&value)
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))?;

    let yaml = serde_yaml::to_string(&json_value)
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))?;

    Ok(yaml.trim_start_matches("---\n").trim_end().to_string())
}

/// Convert a value to compact JSON
///
/// Usage: {{ values.config | tojson }}
pub fn tojson(value: Value) -> Result<String, Error> {
    let json_value: serde_json::Value = serde_json::to_value(&value)
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))?;

    serde_json::to_string(&json_value)
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, e.to_string()))
}

/// Base64 encode a string
///
/// Usage: {{ secret | b64encode }}
#[must_use]
pub fn b64encode(value: String) -> String {
    base64::engine::general_purpose::STANDARD.encode(value.as_bytes())
}

/// Base64 decode a string
///
/// Usage: {{ encoded | b64decode }}
pub fn b64decode(value: String) -> Result<String, Error> {
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(value.as_bytes())
        .map_err(|e| {
            Error::new(ErrorKind::InvalidOperation, format!("base64 decode error: {e}"))
        })?;

    String::from_utf8(decoded)
        .map_err(|e| Error::new(ErrorKind::InvalidOperation, format!("UTF-8 decode error: {e}")))
}

/// Quote a string with double quotes
///
/// Usage: {{ name | quote }}
#[must_use]
pub fn quote(value: Value) -> String {
    let s = if let Some(str_val) = value.as_str() {
        str_val.to_string()
    } else {
        value.to_string()
    };
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Indent every line, prefixed with a newline (Helm's nindent)
///
/// Usage: {{ content | nindent(4) }}
#[must_use]
pub fn nindent(value: String, spaces: usize) -> String {
    format!("\n{}", indent(value, spaces))
}

/// Indent every non-empty line
///
/// Usage: {{ content | indent(4) }}
#[must_use]
pub fn indent(value: String, spaces: usize) -> String {
    let pad = " ".repeat(spaces);
    let mut result = String::with_capacity(value.len() + spaces * value.lines().count());
    let mut first = true;

    for line in value.lines() {
        if !first {
            result.push('\n');
        }
        first = false;

        if !line.is_empty() {
            result.push_str(&pad);
            result.push_str(line);
        }
    }

    result
}

/// Require a value, fail the render if it is undefined or empty
///
/// Usage: {{ values.host | required("host must be set") }}
pub fn required(value: Value, message: Option<String>) -> Result<Value, Error> {
    let missing = value.is_undefined()
        || value.is_none()
        || value.as_str().is_some_and(str::is_empty);

    if missing {
        let msg = message.unwrap_or_else(|| "required value is missing".to_string());
        Err(Error::new(ErrorKind::InvalidOperation, msg))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toyaml() {
        let value = Value::from_serialize(serde_json::json!({"a": 1, "b": "x"}));
        let yaml = toyaml(value).unwrap();
        assert!(yaml.contains("a: 1"));
        assert!(yaml.contains("b: x"));
        assert!(!yaml.ends_with('\n'));
    }

    #[test]
    fn test_b64_roundtrip() {
        let encoded = b64encode("secret".to_string());
        assert_eq!(encoded, "c2VjcmV0");
        assert_eq!(b64decode(encoded).unwrap(), "secret");
    }

    #[test]
    fn test_quote_escapes() {
        let quoted = quote(Value::from("say \"hi\""));
        assert_eq!(quoted, "\"say \\\"hi\\\"\"");
    }

    #[test]
    fn test_nindent() {
        let out = nindent("a: 1\nb: 2".to_string(), 2);
        assert_eq!(out, "\n  a: 1\n  b: 2");
    }

    #[test]
    fn test_indent_skips_empty_lines() {
        let out = indent("a\n\nb".to_string(), 2);
        assert_eq!(out, "  a\n\n  b");
    }

    #[test]
    fn test_required_rejects_empty() {
        assert!(required(Value::from(""), None).is_err());
        assert!(required(Value::UNDEFINED, Some("boom".into())).is_err());
        assert!(required(Value::from("ok"), None).is_ok());
    }
}
