//! # etl-structures
//!
//! Helpers for the messy JSON records ETL jobs pull out of APIs: drop noise,
//! mask sensitive fields, pin records to a known schema, coerce string fields
//! to real types, and print a readable tree when debugging a payload.
//!
//! Every function takes a borrowed [`serde_json::Value`] and returns a new
//! one; inputs are never mutated.
//!
//! ## Modules
//!
//! - [`prune`] — recursive key/value removal (`prune_data`)
//! - [`clean`] — masking of sensitive keys (`clean_dict`)
//! - [`extra`] — whitelist normalisation (`move_unknown_keys_to_extra`)
//! - [`convert`] — schema-driven type coercion (`convert_dict_types`)
//! - [`walk`] — tree rendering and depth-limited copies
//! - [`error`] — Error types
//!
//! ## Example
//!
//! ```
//! use etl_structures::{clean_dict, prune_data, CleanOptions, PruneOptions};
//! use serde_json::json;
//!
//! let record = json!({"user": {"email": "a@b.c", "tags": []}, "debug": true});
//! let pruned = prune_data(&record, &PruneOptions::new().keys(["debug"]).remove_empty(true));
//! let masked = clean_dict(&pruned, &["email"], &CleanOptions::default()).unwrap();
//! assert_eq!(masked, json!({"user": {"email": "replaced (etl)"}}));
//! ```

pub mod clean;
pub mod convert;
pub mod error;
pub mod extra;
pub mod prune;
pub mod walk;

pub use clean::{clean_dict, CleanMode, CleanOptions, SkipRule, DEFAULT_REPLACEMENT_MARKER, DEFAULT_TRUNCATION_SUFFIX};
pub use convert::{convert_dict_types, ConvertOptions, ConvertType, Schema, DEFAULT_DATETIME_FORMATS};
pub use error::{Result, StructureError};
pub use extra::{move_unknown_keys_to_extra, ExtraOptions, DEFAULT_EXTRA_KEY};
pub use prune::{is_empty, prune_data, PruneOptions};
pub use walk::{collect, render_tree, walk, WalkOptions};
