//! Merging fetched documents onto their defaults.
//!
//! Each field resolves through a [`Precedence`]. The policy has a default
//! precedence plus per-field overrides, so a document can say "take whatever
//! the server sent" for most fields but "keep the placeholder when the
//! server value is empty" for a handful of others.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::record::is_blank;

/// How a fetched value competes with a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precedence {
    /// The fetched value wins whenever the key is present.
    PreferFetched,
    /// The fetched value wins unless it is blank (see [`is_blank`]).
    PreferFetchedNonEmpty,
    /// The default always wins; the fetched value is only used when there
    /// is no default.
    KeepDefault,
}

/// Field-level precedence rules for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct MergePolicy {
    default: Precedence,
    overrides: HashMap<String, Precedence>,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self::new(Precedence::PreferFetched)
    }
}

impl MergePolicy {
    pub fn new(default: Precedence) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    /// Overrides the precedence of one top-level field.
    pub fn field(mut self, name: impl Into<String>, precedence: Precedence) -> Self {
        self.overrides.insert(name.into(), precedence);
        self
    }

    pub fn precedence_for(&self, field: &str) -> Precedence {
        self.overrides.get(field).copied().unwrap_or(self.default)
    }
}

/// Merges `fetched` onto `defaults`.
///
/// Keys only present in `fetched` are kept. When both sides hold objects the
/// merge recurses, carrying the field's precedence down.
pub fn merge_with_defaults(
    defaults: &Map<String, Value>,
    fetched: &Map<String, Value>,
    policy: &MergePolicy,
) -> Map<String, Value> {
    let mut merged = defaults.clone();
    for (key, value) in fetched {
        let precedence = policy.precedence_for(key);
        let resolved = match merged.get(key) {
            Some(default) => resolve(default, value, precedence),
            None => value.clone(),
        };
        merged.insert(key.clone(), resolved);
    }
    merged
}

fn resolve(default: &Value, fetched: &Value, precedence: Precedence) -> Value {
    if let (Value::Object(d), Value::Object(f)) = (default, fetched) {
        return Value::Object(merge_with_defaults(d, f, &MergePolicy::new(precedence)));
    }
    match precedence {
        Precedence::PreferFetched => fetched.clone(),
        Precedence::PreferFetchedNonEmpty if is_blank(Some(fetched)) => default.clone(),
        Precedence::PreferFetchedNonEmpty => fetched.clone(),
        Precedence::KeepDefault => default.clone(),
    }
}
