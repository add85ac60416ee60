//! Sensitive value masking.
//!
//! [`clean_dict`] replaces, deletes, nulls or hashes the values of selected
//! keys at any depth, with per-key skip rules for values that must survive
//! (e.g. internal test accounts). Optionally every string in the result is
//! truncated.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{Result, StructureError};

pub const DEFAULT_REPLACEMENT_MARKER: &str = "replaced (etl)";
pub const DEFAULT_TRUNCATION_SUFFIX: &str = "…";

/// How a matching value is cleaned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanMode {
    /// Swap in the replacement marker.
    #[default]
    Replace,
    /// Drop the key.
    Delete,
    /// Set the value to `null`.
    Empty,
    /// SHA-256 hex digest of the string (or of the JSON text for non-strings).
    Hash,
    /// FarmHash Fingerprint64 of the same text, as an unsigned integer.
    #[serde(rename = "farm_fingerprint")]
    FarmFingerprint,
}

impl fmt::Display for CleanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CleanMode::Replace => "replace",
            CleanMode::Delete => "delete",
            CleanMode::Empty => "empty",
            CleanMode::Hash => "hash",
            CleanMode::FarmFingerprint => "farm_fingerprint",
        })
    }
}

impl FromStr for CleanMode {
    type Err = StructureError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(CleanMode::Replace),
            "delete" => Ok(CleanMode::Delete),
            "empty" => Ok(CleanMode::Empty),
            "hash" => Ok(CleanMode::Hash),
            "farm_fingerprint" => Ok(CleanMode::FarmFingerprint),
            _ => Err(StructureError::UnknownOption(format!(
                "'{s}': clean mode must be one of replace, delete, empty, hash, farm_fingerprint"
            ))),
        }
    }
}

/// A value that should be left as-is even though its key is being cleaned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "match", content = "pattern", rename_all = "lowercase")]
pub enum SkipRule {
    /// The value contains this substring.
    Contains(String),
    /// The value matches this regular expression.
    Regex(String),
}

#[derive(Debug, Clone)]
pub struct CleanOptions {
    pub mode: CleanMode,
    pub replacement_marker: String,
    /// Per-key rules; a value matching any rule for its key is kept.
    pub skip_rules: BTreeMap<String, Vec<SkipRule>>,
    /// Truncate every string in the result to this many characters.
    pub truncate_strings: Option<usize>,
    pub truncation_suffix: String,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            mode: CleanMode::default(),
            replacement_marker: DEFAULT_REPLACEMENT_MARKER.to_string(),
            skip_rules: BTreeMap::new(),
            truncate_strings: None,
            truncation_suffix: DEFAULT_TRUNCATION_SUFFIX.to_string(),
        }
    }
}

enum CompiledRule {
    Contains(String),
    Regex(Regex),
}

impl CompiledRule {
    fn matches(&self, text: &str) -> bool {
        match self {
            CompiledRule::Contains(needle) => text.contains(needle.as_str()),
            CompiledRule::Regex(re) => re.is_match(text),
        }
    }
}

struct Cleaner<'a> {
    keys: HashSet<&'a str>,
    rules: BTreeMap<&'a str, Vec<CompiledRule>>,
    opts: &'a CleanOptions,
}

/// Return a copy of `value` with every `keys_to_clean` entry cleaned.
///
/// `null` and `""` values are never touched, in any mode.
///
/// # Errors
///
/// Returns [`StructureError::InvalidPattern`] if a skip rule holds an
/// invalid regular expression.
///
/// # Examples
///
/// ```
/// use etl_structures::{clean_dict, CleanOptions};
/// use serde_json::json;
///
/// let data = json!({"password": "secret", "profile": {"password": "x", "email": "a@b.c"}});
/// let cleaned = clean_dict(&data, &["password"], &CleanOptions::default()).unwrap();
/// assert_eq!(
///     cleaned,
///     json!({"password": "replaced (etl)", "profile": {"password": "replaced (etl)", "email": "a@b.c"}})
/// );
/// ```
pub fn clean_dict<S: AsRef<str>>(
    value: &Value,
    keys_to_clean: &[S],
    opts: &CleanOptions,
) -> Result<Value> {
    let rules = opts
        .skip_rules
        .iter()
        .map(|(key, rules)| Ok((key.as_str(), compile_rules(rules)?)))
        .collect::<Result<BTreeMap<_, _>>>()?;
    let cleaner = Cleaner {
        keys: keys_to_clean.iter().map(AsRef::as_ref).collect(),
        rules,
        opts,
    };
    debug!(keys = cleaner.keys.len(), mode = %opts.mode, "cleaning record");
    Ok(cleaner.clean(value))
}

fn compile_rules(rules: &[SkipRule]) -> Result<Vec<CompiledRule>> {
    rules
        .iter()
        .map(|rule| match rule {
            SkipRule::Contains(s) => Ok(CompiledRule::Contains(s.clone())),
            SkipRule::Regex(p) => Regex::new(p)
                .map(CompiledRule::Regex)
                .map_err(|e| StructureError::InvalidPattern(format!("'{p}': {e}"))),
        })
        .collect()
}

impl Cleaner<'_> {
    fn clean(&self, value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let mut out = Map::new();
                for (key, child) in map {
                    if !self.keys.contains(key.as_str()) {
                        out.insert(key.clone(), self.clean(child));
                    } else if is_untouchable(child) || self.skipped(key, child) {
                        out.insert(key.clone(), self.truncate_all(child));
                    } else if let Some(cleaned) = self.apply_mode(child) {
                        out.insert(key.clone(), cleaned);
                    }
                }
                Value::Object(out)
            }
            Value::Array(items) => Value::Array(items.iter().map(|i| self.clean(i)).collect()),
            other => self.truncate_all(other),
        }
    }

    fn skipped(&self, key: &str, value: &Value) -> bool {
        let Some(rules) = self.rules.get(key) else {
            return false;
        };
        let text = text_of(value);
        rules.iter().any(|rule| rule.matches(&text))
    }

    /// `None` means the key is dropped.
    fn apply_mode(&self, value: &Value) -> Option<Value> {
        match self.opts.mode {
            CleanMode::Replace => Some(self.truncate(self.opts.replacement_marker.clone())),
            CleanMode::Delete => None,
            CleanMode::Empty => Some(Value::Null),
            CleanMode::Hash => {
                let digest = Sha256::digest(text_of(value).as_bytes());
                Some(self.truncate(hex::encode(digest)))
            }
            CleanMode::FarmFingerprint => Some(Value::from(farmhash::fingerprint64(
                text_of(value).as_bytes(),
            ))),
        }
    }

    fn truncate_all(&self, value: &Value) -> Value {
        if self.opts.truncate_strings.is_none() {
            return value.clone();
        }
        match value {
            Value::String(s) => self.truncate(s.clone()),
            Value::Array(items) => Value::Array(items.iter().map(|i| self.truncate_all(i)).collect()),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.truncate_all(v)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    fn truncate(&self, s: String) -> Value {
        match self.opts.truncate_strings {
            Some(limit) if s.chars().count() > limit => {
                let mut cut: String = s.chars().take(limit).collect();
                cut.push_str(&self.opts.truncation_suffix);
                Value::String(cut)
            }
            _ => Value::String(s),
        }
    }
}

fn is_untouchable(value: &Value) -> bool {
    matches!(value, Value::Null) || value.as_str().is_some_and(str::is_empty)
}

/// The string itself, or compact JSON text for anything else.
fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
