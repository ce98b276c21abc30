//! Composite form fields: ordered, repeatable entries.
//!
//! Phone numbers, e-mail addresses, achievements and author tags are edited
//! as lists with add / update / remove-at-index. Some of them must always
//! keep at least one slot.

use serde_json::Value;

use crate::error::{HubError, Result};

/// An ordered list of entries with a lower bound on its length.
#[derive(Debug, Clone, PartialEq)]
pub struct Repeatable<T> {
    field: String,
    items: Vec<T>,
    min_items: usize,
}

impl<T: Clone> Repeatable<T> {
    pub fn new(field: impl Into<String>, items: Vec<T>, min_items: usize) -> Self {
        Self {
            field: field.into(),
            items,
            min_items,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn min_items(&self) -> usize {
        self.min_items
    }

    pub fn add(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn update(&mut self, index: usize, item: T) -> Result<()> {
        let slot = self.items.get_mut(index).ok_or_else(|| {
            HubError::not_found("entry", format!("{}[{}]", self.field, index))
        })?;
        *slot = item;
        Ok(())
    }

    /// Removes the entry at `index`.
    ///
    /// Fails without changing anything when the index is out of range or the
    /// removal would drop below the minimum.
    pub fn remove_at(&mut self, index: usize) -> Result<T> {
        if index >= self.items.len() {
            return Err(HubError::not_found(
                "entry",
                format!("{}[{}]", self.field, index),
            ));
        }
        if self.items.len() <= self.min_items {
            return Err(HubError::Validation {
                fields: vec![self.field.clone()],
            });
        }
        Ok(self.items.remove(index))
    }
}

impl Repeatable<Value> {
    /// Wraps a JSON field; non-array values start empty.
    pub fn from_value(field: impl Into<String>, value: Option<&Value>, min_items: usize) -> Self {
        let items = value
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Self::new(field, items, min_items)
    }

    pub fn to_value(&self) -> Value {
        Value::Array(self.items.clone())
    }
}

/// Splits a comma-separated tag string into trimmed, non-empty tags.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Joins tags back into their editable form.
pub fn join_tags(tags: &[String]) -> String {
    tags.join(", ")
}
