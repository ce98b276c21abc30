//! Singleton document synchronizer (contact, biography, home, author).

use std::sync::Arc;

use leadhub_core::api::ApiTransport;
use leadhub_core::composite::Repeatable;
use leadhub_core::document::DocumentSpec;
use leadhub_core::envelope::{ensure_success, extract_document};
use leadhub_core::merge::merge_with_defaults;
use leadhub_core::record::{Attachment, DraftAttachment};
use leadhub_core::{HubError, Result};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::feedback::FeedbackCenter;

struct DocumentState {
    fields: Map<String, Value>,
    /// Last value merged from the server.
    saved: Map<String, Value>,
    attachments: Vec<DraftAttachment>,
    loaded: bool,
    saving: bool,
    mounted: bool,
}

/// Keeps one singleton document in step with the backend.
///
/// Until the first successful load the document holds its defaults, so a
/// form can always render every field.
#[derive(Clone)]
pub struct DocumentSynchronizer {
    api: Arc<dyn ApiTransport>,
    spec: DocumentSpec,
    state: Arc<RwLock<DocumentState>>,
}

impl DocumentSynchronizer {
    pub fn new(api: Arc<dyn ApiTransport>, spec: DocumentSpec) -> Self {
        let defaults = spec.defaults.clone();
        Self {
            api,
            spec,
            state: Arc::new(RwLock::new(DocumentState {
                fields: defaults.clone(),
                saved: defaults,
                attachments: Vec::new(),
                loaded: false,
                saving: false,
                mounted: true,
            })),
        }
    }

    pub fn spec(&self) -> &DocumentSpec {
        &self.spec
    }

    pub async fn fields(&self) -> Map<String, Value> {
        self.state.read().await.fields.clone()
    }

    pub async fn get(&self, path: &str) -> Option<Value> {
        let state = self.state.read().await;
        lookup(&state.fields, path).cloned()
    }

    pub async fn is_loaded(&self) -> bool {
        self.state.read().await.loaded
    }

    /// Whether there are local changes or attachments not yet saved.
    pub async fn is_dirty(&self) -> bool {
        let state = self.state.read().await;
        state.fields != state.saved || !state.attachments.is_empty()
    }

    pub async fn unmount(&self) {
        self.state.write().await.mounted = false;
    }

    /// Number of live handles sharing this synchronizer's state.
    pub(crate) fn handle_count(&self) -> usize {
        Arc::strong_count(&self.state)
    }

    /// Fetches the document and merges it onto the defaults.
    ///
    /// On failure the current fields stay as they are.
    pub async fn load(&self) -> Result<Map<String, Value>> {
        tracing::debug!("[DocSync:{}] Loading {}", self.spec.name, self.spec.fetch);
        let response = self.api.get(&self.spec.fetch).await?;
        let fetched = match extract_document(response.body)? {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        let merged = merge_with_defaults(&self.spec.defaults, &fetched, &self.spec.policy);

        let mut state = self.state.write().await;
        if !state.mounted {
            return Ok(merged);
        }
        state.fields = merged.clone();
        state.saved = merged.clone();
        state.attachments.clear();
        state.loaded = true;
        tracing::info!("[DocSync:{}] Loaded", self.spec.name);
        Ok(merged)
    }

    /// Sets a field. Dotted paths reach into nested objects and arrays
    /// (`profile.firstName`, `phoneNumbers.0.number`).
    pub async fn set(&self, path: &str, value: Value) -> Result<()> {
        let mut state = self.state.write().await;
        let slot = lookup_mut(&mut state.fields, path)
            .ok_or_else(|| HubError::not_found("field", path))?;
        *slot = value;
        Ok(())
    }

    /// The repeatable field `field` with its minimum length.
    pub async fn repeatable(&self, field: &str) -> Repeatable<Value> {
        let state = self.state.read().await;
        Repeatable::from_value(field, state.fields.get(field), self.spec.min_items(field))
    }

    pub async fn add_item(&self, field: &str, item: Value) -> Result<()> {
        self.edit_repeatable(field, |list| {
            list.add(item);
            Ok(())
        })
        .await
    }

    pub async fn update_item(&self, field: &str, index: usize, item: Value) -> Result<()> {
        self.edit_repeatable(field, |list| list.update(index, item))
            .await
    }

    pub async fn remove_item(&self, field: &str, index: usize) -> Result<()> {
        self.edit_repeatable(field, |list| list.remove_at(index).map(|_| ()))
            .await
    }

    async fn edit_repeatable(
        &self,
        field: &str,
        edit: impl FnOnce(&mut Repeatable<Value>) -> Result<()>,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let mut list =
            Repeatable::from_value(field, state.fields.get(field), self.spec.min_items(field));
        edit(&mut list)?;
        state.fields.insert(field.to_string(), list.to_value());
        Ok(())
    }

    /// Attaches a file to one of the document's asset parts.
    pub async fn attach(&self, part: &str, attachment: Attachment) -> Result<()> {
        if !self.spec.asset_parts.iter().any(|p| *p == part) {
            return Err(HubError::unsupported(&self.spec.name, "this attachment"));
        }
        let mut state = self.state.write().await;
        state.attachments.retain(|a| a.part != part);
        state.attachments.push(DraftAttachment {
            part: part.to_string(),
            attachment,
        });
        Ok(())
    }

    /// Discards local changes.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        state.fields = state.saved.clone();
        state.attachments.clear();
    }

    /// Saves the document and re-fetches it.
    ///
    /// The save itself is one long operation: a single loading notification
    /// that turns into success or error. The refetch runs afterwards; if it
    /// fails the saved fields are kept as the server value and the failure
    /// is reported on its own.
    pub async fn save(&self, feedback: &FeedbackCenter) -> Result<Map<String, Value>> {
        let toast = feedback.begin(format!("Saving {}...", self.spec.name));
        let result = self.persist().await;
        toast.finish(result, format!("{} saved", self.spec.name))?;

        match self.load().await {
            Ok(fields) => Ok(fields),
            Err(e) => {
                tracing::warn!("[DocSync:{}] Refresh after save failed: {}", self.spec.name, e);
                feedback.error(&e);
                Ok(self.mark_saved().await)
            }
        }
    }

    async fn persist(&self) -> Result<()> {
        let body = {
            let mut state = self.state.write().await;
            if state.saving {
                return Err(HubError::Busy {
                    id: self.spec.name.clone(),
                });
            }
            state.saving = true;
            self.spec.save_body(&state.fields, &state.attachments)
        };

        let result = match self.api.put(&self.spec.save, body).await {
            Ok(response) => ensure_success(&response.body),
            Err(e) => Err(e),
        };
        self.state.write().await.saving = false;

        match &result {
            Ok(()) => tracing::info!("[DocSync:{}] Saved, refreshing", self.spec.name),
            Err(e) => tracing::warn!("[DocSync:{}] Save failed: {}", self.spec.name, e),
        }
        result
    }

    /// Treats the current fields as the server value.
    async fn mark_saved(&self) -> Map<String, Value> {
        let mut state = self.state.write().await;
        state.saved = state.fields.clone();
        state.attachments.clear();
        state.fields.clone()
    }
}

fn lookup<'a>(fields: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = fields.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Like [`lookup`], but the last segment may name a new object key.
fn lookup_mut<'a>(fields: &'a mut Map<String, Value>, path: &str) -> Option<&'a mut Value> {
    let segments: Vec<&str> = path.split('.').collect();
    let (last, parents) = segments.split_last()?;
    let Some((first, rest)) = parents.split_first() else {
        return Some(fields.entry(last.to_string()).or_insert(Value::Null));
    };

    let mut current = fields.get_mut(*first)?;
    for segment in rest {
        current = child_mut(current, segment)?;
    }
    match current {
        Value::Object(map) => Some(map.entry(last.to_string()).or_insert(Value::Null)),
        other => child_mut(other, last),
    }
}

fn child_mut<'a>(value: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match value {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(items) => items.get_mut(segment.parse::<usize>().ok()?),
        _ => None,
    }
}
