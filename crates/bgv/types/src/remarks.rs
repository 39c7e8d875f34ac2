//! Remarks attached to a check result
//!
//! Providers return remarks in whatever shape suits them: a sentence, a
//! list of findings, or a nested provider object. The wire shape decides
//! the variant; each variant has exactly one formatter.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form result detail for a check
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Remarks {
    /// A single sentence
    Text(String),
    /// A list of findings
    List(Vec<String>),
    /// Provider-specific structured detail
    Structured(Map<String, Value>),
}

impl Remarks {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::List(items) => items.iter().all(|i| i.trim().is_empty()),
            Self::Structured(map) => map.is_empty(),
        }
    }
}

impl std::fmt::Display for Remarks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s.trim()),
            Self::List(items) => {
                let items: Vec<&str> = items
                    .iter()
                    .map(|i| i.trim())
                    .filter(|i| !i.is_empty())
                    .collect();
                f.write_str(&items.join("; "))
            }
            Self::Structured(map) => f.write_str(&format_object(map)),
        }
    }
}

fn format_object(map: &Map<String, Value>) -> String {
    map.iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| format!("{}: {}", humanize_key(k), format_value(v)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "yes".to_string(),
        Value::Bool(false) => "no".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(format_value)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => format!("({})", format_object(map)),
    }
}

/// `match_score` / `matchScore` -> `Match score`
fn humanize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for (i, ch) in key.chars().enumerate() {
        if ch == '_' || ch == '-' {
            out.push(' ');
        } else if ch.is_uppercase() && i > 0 {
            out.push(' ');
            out.extend(ch.to_lowercase());
        } else if i == 0 {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
    }
    out
}
