//! Whitelist normalisation of flat records.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{kind_name, Result, StructureError};

pub const DEFAULT_EXTRA_KEY: &str = "extra_collected";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraOptions {
    /// Key the unknown entries are collected under.
    pub extra_key: String,
    /// Add an empty `extra_key` object even when nothing was moved.
    pub always_add_extra: bool,
}

impl Default for ExtraOptions {
    fn default() -> Self {
        Self {
            extra_key: DEFAULT_EXTRA_KEY.to_string(),
            always_add_extra: false,
        }
    }
}

/// Keep `allowed` keys at the top level and move every other key under
/// `opts.extra_key`.
///
/// Returns the new object and the sorted names of the moved keys. Keys in
/// both levels of the output are sorted. An input entry already named
/// `extra_key` is renamed to `{extra_key}_original` (appending further
/// `_original`, `_original2`, … suffixes while the name is taken), and
/// every `{extra_key}_original*` entry stays at the top level.
///
/// # Errors
///
/// Returns [`StructureError::NotAnObject`] if `value` is not a JSON object.
///
/// # Examples
///
/// ```
/// use etl_structures::{move_unknown_keys_to_extra, ExtraOptions};
/// use serde_json::json;
///
/// let data = json!({"id": 123, "name": "alex", "age": 30, "city": "berlin"});
/// let (record, moved) = move_unknown_keys_to_extra(&data, &["id", "name"], &ExtraOptions::default()).unwrap();
/// assert_eq!(
///     serde_json::Value::Object(record),
///     json!({"extra_collected": {"age": 30, "city": "berlin"}, "id": 123, "name": "alex"})
/// );
/// assert_eq!(moved, ["age", "city"]);
/// ```
pub fn move_unknown_keys_to_extra<S: AsRef<str>>(
    value: &Value,
    allowed: &[S],
    opts: &ExtraOptions,
) -> Result<(Map<String, Value>, Vec<String>)> {
    let Value::Object(input) = value else {
        return Err(StructureError::NotAnObject(kind_name(value).to_string()));
    };
    let allowed: BTreeSet<&str> = allowed.iter().map(AsRef::as_ref).collect();
    let extra_key = opts.extra_key.as_str();

    let mut entries: BTreeMap<String, Value> = input
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    if let Some(existing) = entries.remove(extra_key) {
        let renamed = free_name(&entries, &format!("{extra_key}_original"));
        entries.insert(renamed, existing);
    }

    let preserved_prefix = format!("{extra_key}_original");
    let mut kept = BTreeMap::new();
    let mut extra = Map::new();
    let mut moved = Vec::new();
    // BTreeMap iteration keeps both outputs sorted
    for (key, v) in entries {
        if allowed.contains(key.as_str()) || key.starts_with(&preserved_prefix) {
            kept.insert(key, v);
        } else {
            moved.push(key.clone());
            extra.insert(key, v);
        }
    }
    if !extra.is_empty() || opts.always_add_extra {
        kept.insert(extra_key.to_string(), Value::Object(extra));
    }

    debug!(kept = kept.len(), moved = moved.len(), extra_key, "moved unknown keys");
    Ok((kept.into_iter().collect(), moved))
}

/// `base` if free, otherwise `base_original`, `base_original2`, …
fn free_name(taken: &BTreeMap<String, Value>, base: &str) -> String {
    if !taken.contains_key(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| match n {
            1 => format!("{base}_original"),
            n => format!("{base}_original{n}"),
        })
        .find(|candidate| !taken.contains_key(candidate))
        .unwrap_or_else(|| format!("{base}_original"))
}

// ── Tests ───────────────────────────────────────────────────────────────────
