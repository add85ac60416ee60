//! Recursive key and value pruning.
//!
//! [`prune_data`] removes unwanted keys at any nesting level, drops values
//! matching a list or predicate, and optionally strips empty values left
//! behind. The input is never mutated.
//!
//! Depth counts container levels: the root container is depth 0. Keys are
//! filtered while `depth <= max_depth` and children are descended into while
//! `depth < max_depth`.

use std::fmt;

use serde_json::{Map, Value};
use tracing::debug;

type KeyPredicate = Box<dyn Fn(&str) -> bool + Send + Sync>;
type ValuePredicate = Box<dyn Fn(&Value) -> bool + Send + Sync>;

/// What [`prune_data`] removes.
#[derive(Default)]
pub struct PruneOptions {
    keys: Vec<String>,
    key_predicate: Option<KeyPredicate>,
    values: Vec<Value>,
    value_predicate: Option<ValuePredicate>,
    /// Drop `null`, `""`, `{}` and `[]` (never `0` or `false`).
    pub remove_empty: bool,
    /// `None` means unlimited.
    pub max_depth: Option<usize>,
}

impl PruneOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove these keys wherever they appear.
    pub fn keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Remove keys for which `predicate` returns true.
    pub fn key_predicate(mut self, predicate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.key_predicate = Some(Box::new(predicate));
        self
    }

    /// Remove values equal to any of these.
    pub fn values(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.values.extend(values);
        self
    }

    /// Remove values for which `predicate` returns true. Evaluated after the
    /// value's own children have been pruned.
    pub fn value_predicate(
        mut self,
        predicate: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.value_predicate = Some(Box::new(predicate));
        self
    }

    pub fn remove_empty(mut self, remove_empty: bool) -> Self {
        self.remove_empty = remove_empty;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    fn removes_key(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key) || self.key_predicate.as_ref().is_some_and(|p| p(key))
    }

    fn removes_value(&self, value: &Value) -> bool {
        self.values.contains(value) || self.value_predicate.as_ref().is_some_and(|p| p(value))
    }

    fn is_noop(&self) -> bool {
        self.keys.is_empty()
            && self.key_predicate.is_none()
            && self.values.is_empty()
            && self.value_predicate.is_none()
            && !self.remove_empty
    }

    fn can_filter(&self, depth: usize) -> bool {
        self.max_depth.is_none_or(|max| depth <= max)
    }

    fn can_recurse(&self, depth: usize) -> bool {
        self.max_depth.is_none_or(|max| depth < max)
    }
}

impl fmt::Debug for PruneOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PruneOptions")
            .field("keys", &self.keys)
            .field("key_predicate", &self.key_predicate.is_some())
            .field("values", &self.values)
            .field("value_predicate", &self.value_predicate.is_some())
            .field("remove_empty", &self.remove_empty)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

/// Return a pruned copy of `value`.
///
/// With no active filter and `remove_empty` off, the input is returned
/// unchanged. If `remove_empty` empties the root, an empty value of the
/// root's own kind is returned.
///
/// # Examples
///
/// ```
/// use etl_structures::{prune_data, PruneOptions};
/// use serde_json::json;
///
/// let data = json!({"a": 1, "x": {"secret": 2, "keep": 3}});
/// let pruned = prune_data(&data, &PruneOptions::new().keys(["secret"]));
/// assert_eq!(pruned, json!({"a": 1, "x": {"keep": 3}}));
/// ```
pub fn prune_data(value: &Value, opts: &PruneOptions) -> Value {
    if opts.is_noop() {
        return value.clone();
    }
    debug!(?opts, "pruning data");

    let pruned = prune_node(value, 0, opts);
    if opts.remove_empty && is_empty(&pruned) {
        return empty_like(value);
    }
    pruned
}

fn prune_node(value: &Value, depth: usize, opts: &PruneOptions) -> Value {
    match value {
        Value::Object(map) => {
            let can_filter = opts.can_filter(depth);
            let can_recurse = opts.can_recurse(depth);
            let mut out = Map::new();
            for (key, child) in map {
                if can_filter && opts.removes_key(key) {
                    continue;
                }
                let child = if can_recurse {
                    prune_node(child, depth + 1, opts)
                } else {
                    child.clone()
                };
                if opts.remove_empty && is_empty(&child) {
                    continue;
                }
                // arrays apply value filters to their own elements instead
                if !child.is_array() && opts.removes_value(&child) {
                    continue;
                }
                out.insert(key.clone(), child);
            }
            Value::Object(out)
        }
        Value::Array(items) => {
            let can_recurse = opts.can_recurse(depth);
            let out = items
                .iter()
                .map(|item| {
                    if can_recurse {
                        prune_node(item, depth + 1, opts)
                    } else {
                        item.clone()
                    }
                })
                .filter(|item| !(opts.remove_empty && is_empty(item)))
                .filter(|item| !opts.removes_value(item))
                .collect();
            Value::Array(out)
        }
        other => other.clone(),
    }
}

/// `null`, `""`, `{}` and `[]` are empty; `0` and `false` are not.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

fn empty_like(value: &Value) -> Value {
    match value {
        Value::Object(_) => Value::Object(Map::new()),
        Value::Array(_) => Value::Array(Vec::new()),
        Value::String(_) => Value::String(String::new()),
        other => other.clone(),
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
