//! Tree visualisation of nested JSON.
//!
//! ```text
//! [dict len=3]
//! ├─ a: 1 (int)
//! ├─ b [list len=2]
//! │  ├─ [0]: 2 (int)
//! │  └─ [1]: 3 (int)
//! └─ c [dict len=1]
//!    └─ d: x (str)
//! ```

use std::io::Write;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{kind_name, Result};

const BRANCH: &str = "├─ ";
const LAST_BRANCH: &str = "└─ ";
const PIPE: &str = "│  ";
const SPACE: &str = "   ";
const ELLIPSIS: char = '…';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkOptions {
    /// Append ` (int)`, ` (str)`, … to leaves.
    pub show_types: bool,
    /// Wrap string leaves in quotes, escaping `\` and `"`.
    pub quote_strings: bool,
    /// Containers at this depth are shown but not descended into. The root is
    /// depth 0.
    pub max_depth: Option<usize>,
    /// Arrays only; object members are always all shown.
    pub max_items_per_container: Option<usize>,
    /// Leaf text longer than this many characters is cut and gets `…`.
    pub truncate_value_len: Option<usize>,
    pub sort_keys: bool,
    /// Tag containers as `[dict len=N]` instead of `[dict]`.
    pub show_lengths: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            show_types: false,
            quote_strings: false,
            max_depth: None,
            max_items_per_container: None,
            truncate_value_len: None,
            sort_keys: true,
            show_lengths: false,
        }
    }
}

/// Write the tree for `value` to `out`, one line per node, and return the
/// [`collect`]ed copy.
///
/// # Errors
///
/// Returns [`StructureError::Io`](crate::StructureError::Io) if writing fails.
pub fn walk<W: Write>(value: &Value, opts: &WalkOptions, out: &mut W) -> Result<Value> {
    let lines = render_tree(value, opts);
    debug!(lines = lines.len(), max_depth = ?opts.max_depth, "rendering tree");
    for line in &lines {
        writeln!(out, "{line}")?;
    }
    Ok(collect(value, opts))
}

/// Copy of `value` with the depth and item limits applied.
///
/// Containers reached at `max_depth` become empty containers of the same kind,
/// arrays keep their first `max_items_per_container` items, and object keys are
/// sorted when `sort_keys` is set.
pub fn collect(value: &Value, opts: &WalkOptions) -> Value {
    collect_at(value, opts, 0)
}

fn collect_at(value: &Value, opts: &WalkOptions, depth: usize) -> Value {
    let at_limit = opts.max_depth.is_some_and(|max| depth >= max);
    match value {
        Value::Object(_) if at_limit => Value::Object(Map::new()),
        Value::Array(_) if at_limit => Value::Array(Vec::new()),
        Value::Object(_) | Value::Array(_) => children(value, opts)
            .into_iter()
            .fold(Container::like(value), |mut acc, (label, child)| {
                acc.push(label, collect_at(child, opts, depth + 1));
                acc
            })
            .into_value(),
        leaf => leaf.clone(),
    }
}

/// Render the tree as lines, without trailing newlines.
pub fn render_tree(value: &Value, opts: &WalkOptions) -> Vec<String> {
    let mut lines = Vec::new();
    match tag(value, opts.show_lengths) {
        Some(root_tag) => {
            lines.push(root_tag);
            render_children(value, opts, "", 0, &mut lines);
        }
        None => lines.push(leaf_text(value, opts)),
    }
    lines
}

fn render_children(value: &Value, opts: &WalkOptions, prefix: &str, depth: usize, lines: &mut Vec<String>) {
    if opts.max_depth.is_some_and(|max| depth >= max) {
        return;
    }
    let kids = children(value, opts);
    let count = kids.len();
    for (idx, (label, child)) in kids.into_iter().enumerate() {
        let is_last = idx + 1 == count;
        let connector = if is_last { LAST_BRANCH } else { BRANCH };
        match tag(child, opts.show_lengths) {
            Some(child_tag) => {
                lines.push(format!("{prefix}{connector}{label} {child_tag}"));
                let nested = format!("{prefix}{}", if is_last { SPACE } else { PIPE });
                render_children(child, opts, &nested, depth + 1, lines);
            }
            None => lines.push(format!("{prefix}{connector}{label}: {}", leaf_text(child, opts))),
        }
    }
}

/// `(label, child)` pairs: object keys (optionally sorted) or `[i]` indices
/// for the first `max_items_per_container` array items.
fn children<'a>(value: &'a Value, opts: &WalkOptions) -> Vec<(String, &'a Value)> {
    match value {
        Value::Object(map) => {
            let mut kids: Vec<_> = map.iter().map(|(k, v)| (k.clone(), v)).collect();
            if opts.sort_keys {
                kids.sort_by(|a, b| a.0.cmp(&b.0));
            }
            kids
        }
        Value::Array(items) => {
            let limit = opts.max_items_per_container.unwrap_or(items.len());
            items
                .iter()
                .take(limit)
                .enumerate()
                .map(|(i, v)| (format!("[{i}]"), v))
                .collect()
        }
        _ => Vec::new(),
    }
}

fn tag(value: &Value, show_lengths: bool) -> Option<String> {
    let (kind, len) = match value {
        Value::Object(map) => ("dict", map.len()),
        Value::Array(items) => ("list", items.len()),
        _ => return None,
    };
    Some(if show_lengths {
        format!("[{kind} len={len}]")
    } else {
        format!("[{kind}]")
    })
}

fn leaf_text(value: &Value, opts: &WalkOptions) -> String {
    let mut text = match value {
        Value::String(s) => {
            let s = truncate(s, opts.truncate_value_len);
            if opts.quote_strings {
                format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
            } else {
                s
            }
        }
        other => truncate(&other.to_string(), opts.truncate_value_len),
    };
    if opts.show_types {
        text.push_str(&format!(" ({})", kind_name(value)));
    }
    text
}

fn truncate(s: &str, limit: Option<usize>) -> String {
    match limit {
        Some(n) if s.chars().count() > n => {
            let mut cut: String = s.chars().take(n).collect();
            cut.push(ELLIPSIS);
            cut
        }
        _ => s.to_string(),
    }
}

/// Empty object or array that is filled in label order.
enum Container {
    Object(Map<String, Value>),
    Array(Vec<Value>),
}

impl Container {
    fn like(value: &Value) -> Self {
        match value {
            Value::Object(_) => Container::Object(Map::new()),
            _ => Container::Array(Vec::new()),
        }
    }

    fn push(&mut self, label: String, value: Value) {
        match self {
            Container::Object(map) => {
                map.insert(label, value);
            }
            Container::Array(items) => items.push(value),
        }
    }

    fn into_value(self) -> Value {
        match self {
            Container::Object(map) => Value::Object(map),
            Container::Array(items) => Value::Array(items),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
