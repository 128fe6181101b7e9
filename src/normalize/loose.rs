//! Serde helpers for upstream fields whose JSON type is not stable
//! (numbers that sometimes arrive as strings, ids that are sometimes numbers).

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Number, numeric string, or anything else (→ None).
pub fn opt_f64<'de, D>(d: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_f64(&Value::deserialize(d)?))
}

/// String, or a number rendered as text. Empty strings become None.
pub fn opt_string<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_string(&Value::deserialize(d)?))
}

pub fn value_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64().filter(|x| x.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|x| x.is_finite()),
        _ => None,
    }
}

pub fn value_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "opt_f64")]
        n: Option<f64>,
        #[serde(default, deserialize_with = "opt_string")]
        s: Option<String>,
    }

    fn sample(json: &str) -> Sample {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn numbers_in_any_shape() {
        assert_eq!(sample(r#"{"n": 0.615}"#).n, Some(0.615));
        assert_eq!(sample(r#"{"n": "0.615"}"#).n, Some(0.615));
        assert_eq!(sample(r#"{"n": "-"}"#).n, None);
        assert_eq!(sample(r#"{"n": null}"#).n, None);
        assert_eq!(sample(r#"{}"#).n, None);
    }

    #[test]
    fn strings_in_any_shape() {
        assert_eq!(sample(r#"{"s": "LG"}"#).s.as_deref(), Some("LG"));
        assert_eq!(sample(r#"{"s": 1156.1}"#).s.as_deref(), Some("1156.1"));
        assert_eq!(sample(r#"{"s": "  "}"#).s, None);
        assert_eq!(sample(r#"{"s": false}"#).s, None);
    }
}
