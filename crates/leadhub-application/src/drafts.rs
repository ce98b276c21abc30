//! Form drafts for list panels.
//!
//! Each panel has one "add new" draft and one draft per record under inline
//! edit. Drafts validate before submission and carry a `submitting` flag so
//! that a second submit of the same form is rejected while the first runs.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use leadhub_core::collection::CollectionSpec;
use leadhub_core::composite::{self, Repeatable};
use leadhub_core::record::{Attachment, Draft, SyncRecord};
use leadhub_core::validation::validate_draft;
use leadhub_core::{HubError, Result};
use serde_json::Value;

use crate::sync::{EntityListSynchronizer, Reconciliation};

/// Which form a draft belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DraftKey {
    New,
    Edit(String),
}

impl DraftKey {
    fn label(&self) -> &str {
        match self {
            DraftKey::New => "new",
            DraftKey::Edit(id) => id,
        }
    }
}

/// One form's in-progress values.
#[derive(Debug, Clone, Default)]
pub struct FormDraft {
    draft: Draft,
    minimums: HashMap<String, usize>,
    submitting: bool,
}

impl FormDraft {
    fn new(draft: Draft, minimums: HashMap<String, usize>) -> Self {
        Self {
            draft,
            minimums,
            submitting: false,
        }
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.draft.set(field, value);
    }

    pub fn attach(&mut self, part: impl Into<String>, attachment: Attachment) {
        self.draft.attach(part, attachment);
    }

    /// Sets a tag list from its comma-separated form.
    pub fn set_tags(&mut self, field: &str, raw: &str) {
        let tags: Vec<Value> = composite::parse_tags(raw)
            .into_iter()
            .map(Value::String)
            .collect();
        self.draft.set(field, Value::Array(tags));
    }

    pub fn items(&self, field: &str) -> Repeatable<Value> {
        Repeatable::from_value(field, self.draft.get(field), self.minimum(field))
    }

    pub fn add_item(&mut self, field: &str, item: Value) {
        let mut list = self.items(field);
        list.add(item);
        self.draft.set(field, list.to_value());
    }

    pub fn update_item(&mut self, field: &str, index: usize, item: Value) -> Result<()> {
        let mut list = self.items(field);
        list.update(index, item)?;
        self.draft.set(field, list.to_value());
        Ok(())
    }

    pub fn remove_item(&mut self, field: &str, index: usize) -> Result<Value> {
        let mut list = self.items(field);
        let removed = list.remove_at(index)?;
        self.draft.set(field, list.to_value());
        Ok(removed)
    }

    fn minimum(&self, field: &str) -> usize {
        self.minimums.get(field).copied().unwrap_or(0)
    }
}

/// Drafts of one collection panel.
pub struct FormDraftManager {
    spec: CollectionSpec,
    minimums: HashMap<String, usize>,
    drafts: Mutex<HashMap<DraftKey, FormDraft>>,
}

impl FormDraftManager {
    pub fn new(spec: CollectionSpec) -> Self {
        Self {
            spec,
            minimums: HashMap::new(),
            drafts: Mutex::new(HashMap::new()),
        }
    }

    /// Repeatable `field` must keep at least `min` entries.
    pub fn minimum(mut self, field: impl Into<String>, min: usize) -> Self {
        self.minimums.insert(field.into(), min);
        self
    }

    /// Opens the edit draft for `record`, starting from its current value.
    ///
    /// An already open draft for the same record is kept.
    pub fn open_edit<R: SyncRecord>(&self, record: &R) -> Result<()> {
        let key = DraftKey::Edit(record.record_id().to_string());
        let mut drafts = self.lock();
        if !drafts.contains_key(&key) {
            let draft = Draft::from_record(record)?;
            drafts.insert(key, FormDraft::new(draft, self.minimums.clone()));
        }
        Ok(())
    }

    /// Applies `edit` to a draft, opening an empty one for [`DraftKey::New`].
    pub fn edit<T>(&self, key: &DraftKey, edit: impl FnOnce(&mut FormDraft) -> T) -> Result<T> {
        let mut drafts = self.lock();
        if *key == DraftKey::New {
            drafts
                .entry(DraftKey::New)
                .or_insert_with(|| FormDraft::new(Draft::new(), self.minimums.clone()));
        }
        let form = drafts
            .get_mut(key)
            .ok_or_else(|| HubError::not_found("draft", key.label()))?;
        Ok(edit(form))
    }

    pub fn get(&self, key: &DraftKey) -> Option<FormDraft> {
        self.lock().get(key).cloned()
    }

    pub fn close(&self, key: &DraftKey) {
        self.lock().remove(key);
    }

    /// Submits a draft through `sync`.
    ///
    /// Validation failures block the request. On success the draft is
    /// closed; on failure it stays as it was so the admin can retry.
    pub async fn submit<R: SyncRecord>(
        &self,
        key: &DraftKey,
        sync: &EntityListSynchronizer<R>,
    ) -> Result<Reconciliation<R>> {
        let draft = self.begin_submit(key)?;

        let result = match key {
            DraftKey::New => sync.create(draft).await,
            DraftKey::Edit(id) => sync.update(id, draft).await,
        };

        let mut drafts = self.lock();
        match &result {
            Ok(_) => {
                drafts.remove(key);
            }
            Err(_) => {
                if let Some(form) = drafts.get_mut(key) {
                    form.submitting = false;
                }
            }
        }
        result
    }

    fn begin_submit(&self, key: &DraftKey) -> Result<Draft> {
        let mut drafts = self.lock();
        let form = drafts
            .get_mut(key)
            .ok_or_else(|| HubError::not_found("draft", key.label()))?;
        if form.submitting {
            return Err(HubError::Busy {
                id: key.label().to_string(),
            });
        }

        let mut draft = form.draft.clone();
        if let Some(derive) = self.spec.derive {
            derive(draft.fields_mut());
        }
        validate_draft(&self.spec.required, &draft)?;

        form.submitting = true;
        Ok(draft)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<DraftKey, FormDraft>> {
        self.drafts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
