//! Entity list synchronizer.
//!
//! One generic component backs every list panel (news, events, gallery,
//! books, inquiries). It owns the local list, tags entries with pending
//! operations and reconciles them with whatever the server answers.
//!
//! # Reconciliation rules
//!
//! - Nothing is added locally before the server confirms a create.
//! - Updates replace the entry with the server's record, never the patch.
//! - A response without a usable record (no `data`, no identity, or missing
//!   derived fields) triggers a full [`load`](EntityListSynchronizer::load).
//! - A failed mutation puts the entry back exactly as it was before the call.
//! - After [`unmount`](EntityListSynchronizer::unmount) late responses are
//!   dropped without touching the list.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use leadhub_core::api::{ApiTransport, MultipartForm, RequestBody};
use leadhub_core::collection::{CollectionSpec, InsertPosition};
use leadhub_core::envelope::{ensure_success, extract_list, extract_record};
use leadhub_core::record::{Draft, DraftAttachment, SyncRecord};
use leadhub_core::validation::{missing_fields, validate_fields};
use leadhub_core::{HubError, Result};
use serde_json::Value;
use tokio::sync::RwLock;

/// Local state of one entry.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryState<R> {
    /// Matches the last server answer.
    Synced,
    /// Locally edited; `saved` is the last server-confirmed value.
    Edited { saved: R },
    /// An update is in flight.
    Saving,
    /// A delete is in flight.
    Deleting,
}

impl<R> EntryState<R> {
    pub fn is_pending(&self) -> bool {
        matches!(self, EntryState::Saving | EntryState::Deleting)
    }
}

/// A record in the local list together with its state tag.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<R> {
    pub record: R,
    pub state: EntryState<R>,
}

impl<R: SyncRecord> Entry<R> {
    fn synced(record: R) -> Self {
        Self {
            record,
            state: EntryState::Synced,
        }
    }

    pub fn id(&self) -> &str {
        self.record.record_id()
    }
}

/// How a successful mutation was reconciled.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation<T> {
    /// The response carried the record; it was merged into the list.
    Merged(T),
    /// The response was insufficient; the list was re-fetched.
    Reloaded,
}

/// Explicit user confirmation before destructive operations.
#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Confirms everything (`--yes`).
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysConfirm;

#[async_trait]
impl Confirmer for AlwaysConfirm {
    async fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

struct ListState<R> {
    entries: Vec<Entry<R>>,
    mounted: bool,
    /// Sequence number of the most recently started load.
    load_seq: u64,
    /// Sequence number of the load whose result is shown.
    applied_seq: u64,
}

/// Keeps a local list of `R` in step with one backend collection.
#[derive(Clone)]
pub struct EntityListSynchronizer<R: SyncRecord> {
    api: Arc<dyn ApiTransport>,
    spec: CollectionSpec,
    state: Arc<RwLock<ListState<R>>>,
}

impl<R: SyncRecord> EntityListSynchronizer<R> {
    /// Creates a mounted synchronizer with an empty list.
    pub fn new(api: Arc<dyn ApiTransport>, spec: CollectionSpec) -> Self {
        Self {
            api,
            spec,
            state: Arc::new(RwLock::new(ListState {
                entries: Vec::new(),
                mounted: true,
                load_seq: 0,
                applied_seq: 0,
            })),
        }
    }

    pub fn spec(&self) -> &CollectionSpec {
        &self.spec
    }

    pub async fn entries(&self) -> Vec<Entry<R>> {
        self.state.read().await.entries.clone()
    }

    pub async fn records(&self) -> Vec<R> {
        self.state
            .read()
            .await
            .entries
            .iter()
            .map(|e| e.record.clone())
            .collect()
    }

    pub async fn find(&self, id: &str) -> Option<Entry<R>> {
        self.state
            .read()
            .await
            .entries
            .iter()
            .find(|e| e.id() == id)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }

    /// Whether a mutation for `id` is in flight.
    pub async fn is_pending(&self, id: &str) -> bool {
        self.find(id).await.is_some_and(|e| e.state.is_pending())
    }

    pub async fn is_mounted(&self) -> bool {
        self.state.read().await.mounted
    }

    /// Stops applying responses. In-flight requests still complete, but
    /// their results are discarded.
    pub async fn unmount(&self) {
        self.state.write().await.mounted = false;
        tracing::debug!("[ListSync:{}] Unmounted", self.spec.name);
    }

    /// Number of live handles sharing this synchronizer's state.
    pub(crate) fn handle_count(&self) -> usize {
        Arc::strong_count(&self.state)
    }

    /// Replaces the local list with the server's.
    ///
    /// On failure the previous list stays as it was. Entries with an
    /// operation in flight keep their tag; unsaved local edits are dropped.
    pub async fn load(&self) -> Result<usize> {
        let seq = {
            let mut state = self.state.write().await;
            state.load_seq += 1;
            state.load_seq
        };

        tracing::debug!("[ListSync:{}] Loading {}", self.spec.name, self.spec.endpoints.list);
        let response = self.api.get(&self.spec.endpoints.list).await?;
        let mut items = extract_list(response.body)?;
        self.spec.sort_values(&mut items);
        let records = self.decode_list(items)?;

        let mut state = self.state.write().await;
        if !state.mounted || seq < state.applied_seq {
            tracing::debug!("[ListSync:{}] Dropping stale load #{}", self.spec.name, seq);
            return Ok(state.entries.len());
        }

        let entries: Vec<Entry<R>> = records
            .into_iter()
            .map(|record| {
                let pending = state
                    .entries
                    .iter()
                    .find(|e| e.id() == record.record_id())
                    .map(|e| &e.state)
                    .filter(|s| s.is_pending())
                    .cloned();
                Entry {
                    record,
                    state: pending.unwrap_or(EntryState::Synced),
                }
            })
            .collect();

        state.entries = entries;
        state.applied_seq = seq;
        tracing::info!(
            "[ListSync:{}] Loaded {} record(s)",
            self.spec.name,
            state.entries.len()
        );
        Ok(state.entries.len())
    }

    /// Creates a record from a draft.
    ///
    /// Validation runs first and blocks the request. The new record is only
    /// added once the server returns it, at the collection's insert position.
    pub async fn create(&self, mut draft: Draft) -> Result<Reconciliation<R>> {
        let path = self
            .spec
            .endpoints
            .create
            .clone()
            .ok_or_else(|| HubError::unsupported(&self.spec.name, "create"))?;

        if let Some(derive) = self.spec.derive {
            derive(draft.fields_mut());
        }
        validate_fields(&self.spec.required, draft.fields(), |part| {
            draft.has_attachment(part)
        })?;

        let response = self.api.post(&path, draft.to_body()).await?;
        ensure_success(&response.body)?;

        match self.complete_record(&response.body)? {
            Some(record) => {
                self.insert_confirmed(record.clone()).await;
                tracing::info!(
                    "[ListSync:{}] Created {}",
                    self.spec.name,
                    record.record_id()
                );
                Ok(Reconciliation::Merged(record))
            }
            None => {
                self.reload_after("create").await?;
                Ok(Reconciliation::Reloaded)
            }
        }
    }

    /// Sends the entry with `patch` applied and replaces it with the
    /// server's answer.
    ///
    /// The outgoing record is the entry's current value (including unsaved
    /// local edits) overlaid with the patch fields. Files attached to the
    /// patch switch the request to multipart.
    pub async fn update(&self, id: &str, patch: Draft) -> Result<Reconciliation<R>> {
        let path = self
            .spec
            .endpoints
            .update_path(id)
            .ok_or_else(|| HubError::unsupported(&self.spec.name, "update"))?;

        let (snapshot, outgoing) = {
            let mut state = self.state.write().await;
            let entry = find_entry(&mut state.entries, id)?;

            let mut fields = entry.record.to_fields()?;
            for (name, value) in patch.fields() {
                fields.insert(name.clone(), value.clone());
            }
            if let Some(derive) = self.spec.derive {
                derive(&mut fields);
            }
            validate_fields(&self.spec.required, &fields, |part| {
                patch.has_attachment(part)
            })?;

            let mut outgoing = Draft::with_defaults(fields);
            for a in patch.attachments() {
                outgoing.attach_many(a.part.clone(), a.attachment.clone());
            }

            let snapshot = entry.clone();
            entry.state = EntryState::Saving;
            (snapshot, outgoing)
        };

        let result = self.send_update(&path, outgoing).await;
        match result {
            Ok(Some(record)) => {
                self.replace_confirmed(id, record.clone()).await;
                tracing::info!("[ListSync:{}] Updated {}", self.spec.name, id);
                Ok(Reconciliation::Merged(record))
            }
            Ok(None) => {
                // Clear the tag so the reload can take the fresh record.
                self.restore(vec![snapshot]).await;
                self.reload_after("update").await?;
                Ok(Reconciliation::Reloaded)
            }
            Err(e) => {
                tracing::warn!("[ListSync:{}] Update of {} failed: {}", self.spec.name, id, e);
                self.restore(vec![snapshot]).await;
                Err(e)
            }
        }
    }

    /// Saves the unsaved local edits of one entry.
    pub async fn save(&self, id: &str) -> Result<Reconciliation<R>> {
        self.update(id, Draft::new()).await
    }

    /// Changes one field of an entry locally, without sending anything.
    pub async fn edit_local(&self, id: &str, field: &str, value: Value) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.mounted {
            return Ok(());
        }
        let entry = find_entry(&mut state.entries, id)?;

        let mut fields = entry.record.to_fields()?;
        fields.insert(field.to_string(), value);
        if let Some(derive) = self.spec.derive {
            derive(&mut fields);
        }
        let edited = R::from_fields(fields)?;

        let saved = match std::mem::replace(&mut entry.state, EntryState::Synced) {
            EntryState::Edited { saved } => saved,
            _ => entry.record.clone(),
        };
        entry.record = edited;
        if entry.record != saved {
            entry.state = EntryState::Edited { saved };
        }
        Ok(())
    }

    /// Throws away unsaved local edits of one entry.
    pub async fn discard_edits(&self, id: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let entry = find_entry(&mut state.entries, id)?;
        if let EntryState::Edited { saved } = std::mem::replace(&mut entry.state, EntryState::Synced)
        {
            entry.record = saved;
        }
        Ok(())
    }

    /// Deletes a record after explicit confirmation.
    ///
    /// Returns `Ok(false)` when the user declined; no request is sent then.
    /// The entry is tagged as deleting while the request is in flight and
    /// restored if the server refuses.
    pub async fn delete(&self, id: &str, confirmer: &dyn Confirmer) -> Result<bool> {
        let path = self
            .spec
            .endpoints
            .delete_path(id)
            .ok_or_else(|| HubError::unsupported(&self.spec.name, "delete"))?;

        {
            let mut state = self.state.write().await;
            find_entry(&mut state.entries, id)?;
        }

        let prompt = format!("Delete {} entry '{}'?", self.spec.name, id);
        if !confirmer.confirm(&prompt).await {
            tracing::debug!("[ListSync:{}] Delete of {} declined", self.spec.name, id);
            return Ok(false);
        }

        let snapshot = {
            let mut state = self.state.write().await;
            let entry = find_entry(&mut state.entries, id)?;
            let snapshot = entry.clone();
            entry.state = EntryState::Deleting;
            snapshot
        };

        let result = match self.api.delete(&path).await {
            Ok(response) => ensure_success(&response.body),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                let mut state = self.state.write().await;
                if state.mounted {
                    state.entries.retain(|e| e.id() != id);
                }
                tracing::info!("[ListSync:{}] Deleted {}", self.spec.name, id);
                Ok(true)
            }
            Err(e) => {
                tracing::warn!("[ListSync:{}] Delete of {} failed: {}", self.spec.name, id, e);
                self.restore(vec![snapshot]).await;
                Err(e)
            }
        }
    }

    /// Sends the whole list through the collection's bulk endpoint.
    ///
    /// Every entry is validated first. `attachments` carry new files, one per
    /// record, on the part named by the bulk descriptor. The returned list
    /// replaces the local one; without it the list is re-fetched.
    pub async fn save_all(
        &self,
        attachments: Vec<DraftAttachment>,
    ) -> Result<Reconciliation<Vec<R>>> {
        let bulk = self
            .spec
            .bulk_save
            .clone()
            .ok_or_else(|| HubError::unsupported(&self.spec.name, "bulk save"))?;

        let (snapshot, payload) = {
            let mut state = self.state.write().await;
            if let Some(busy) = state.entries.iter().find(|e| e.state.is_pending()) {
                return Err(HubError::Busy {
                    id: busy.id().to_string(),
                });
            }

            let mut missing = BTreeSet::new();
            let mut payload = Vec::with_capacity(state.entries.len());
            for entry in &state.entries {
                let file_part = bulk.file_part(entry.id());
                let has_file = attachments.iter().any(|a| a.part == file_part);

                let mut fields = entry.record.to_fields()?;
                if let Some(derive) = self.spec.derive {
                    derive(&mut fields);
                }
                missing.extend(missing_fields(&self.spec.required, &fields, |_| has_file));
                fields.insert(bulk.new_file_flag.clone(), Value::Bool(has_file));
                payload.push(Value::Object(fields));
            }
            if !missing.is_empty() {
                return Err(HubError::validation(missing));
            }

            let snapshot = state.entries.clone();
            for entry in state.entries.iter_mut() {
                entry.state = EntryState::Saving;
            }
            (snapshot, payload)
        };

        let mut form = MultipartForm::new().text(bulk.list_part.clone(), Value::Array(payload).to_string());
        for a in attachments {
            form = form.file(a.part, a.attachment);
        }

        let result = match self.api.post(&bulk.path, RequestBody::Multipart(form)).await {
            Ok(response) => ensure_success(&response.body).map(|()| response.body),
            Err(e) => Err(e),
        };

        let body = match result {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("[ListSync:{}] Bulk save failed: {}", self.spec.name, e);
                self.restore(snapshot).await;
                return Err(e);
            }
        };

        let returned = match body.get("data") {
            Some(Value::Array(items)) => {
                let mut items = items.clone();
                self.spec.sort_values(&mut items);
                Some(self.decode_list(items)?)
            }
            _ => None,
        };

        match returned {
            Some(records) => {
                let mut state = self.state.write().await;
                if state.mounted {
                    state.entries = records.iter().cloned().map(Entry::synced).collect();
                }
                tracing::info!(
                    "[ListSync:{}] Bulk saved {} record(s)",
                    self.spec.name,
                    records.len()
                );
                Ok(Reconciliation::Merged(records))
            }
            None => {
                self.restore(snapshot).await;
                self.reload_after("bulk save").await?;
                Ok(Reconciliation::Reloaded)
            }
        }
    }

    async fn send_update(&self, path: &str, outgoing: Draft) -> Result<Option<R>> {
        let response = self.api.put(path, outgoing.to_body()).await?;
        ensure_success(&response.body)?;
        self.complete_record(&response.body)
    }

    /// The record carried by a mutation response, if it is complete.
    fn complete_record(&self, body: &Value) -> Result<Option<R>> {
        match extract_record(body)? {
            Some(record) if self.spec.is_complete(&record) => Ok(Some(record_from_value(record)?)),
            _ => Ok(None),
        }
    }

    fn decode_list(&self, items: Vec<Value>) -> Result<Vec<R>> {
        items.into_iter().map(record_from_value).collect()
    }

    async fn reload_after(&self, operation: &str) -> Result<()> {
        tracing::info!(
            "[ListSync:{}] {} response incomplete, reloading",
            self.spec.name,
            operation
        );
        self.load().await.map(|_| ())
    }

    async fn insert_confirmed(&self, record: R) {
        let mut state = self.state.write().await;
        if !state.mounted {
            return;
        }
        let id = record.record_id().to_string();
        if let Some(existing) = state.entries.iter_mut().find(|e| e.id() == id) {
            *existing = Entry::synced(record);
            return;
        }
        match self.spec.insert {
            InsertPosition::Prepend => state.entries.insert(0, Entry::synced(record)),
            InsertPosition::Append => state.entries.push(Entry::synced(record)),
        }
    }

    async fn replace_confirmed(&self, id: &str, record: R) {
        let mut state = self.state.write().await;
        if !state.mounted {
            return;
        }
        if let Some(entry) = state.entries.iter_mut().find(|e| e.id() == id) {
            *entry = Entry::synced(record);
        }
    }

    /// Puts entries back to their pre-call snapshot.
    async fn restore(&self, snapshot: Vec<Entry<R>>) {
        let mut state = self.state.write().await;
        if !state.mounted {
            return;
        }
        for saved in snapshot {
            if let Some(entry) = state.entries.iter_mut().find(|e| e.id() == saved.id()) {
                *entry = saved;
            }
        }
    }
}

/// Finds an entry that is free for a new operation.
fn find_entry<'a, R: SyncRecord>(entries: &'a mut [Entry<R>], id: &str) -> Result<&'a mut Entry<R>> {
    let entry = entries
        .iter_mut()
        .find(|e| e.id() == id)
        .ok_or_else(|| HubError::not_found("record", id))?;
    if entry.state.is_pending() {
        return Err(HubError::Busy { id: id.to_string() });
    }
    Ok(entry)
}

fn record_from_value<R: SyncRecord>(value: Value) -> Result<R> {
    match value {
        Value::Object(fields) => R::from_fields(fields),
        other => Err(HubError::Serialization {
            format: "JSON".to_string(),
            message: format!("expected a record object, got {}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedTransport;
    use leadhub_core::api::Method;
    use leadhub_core::record::{Attachment, Event, NewsItem, Record};
    use serde_json::json;

    struct Decline;

    #[async_trait]
    impl Confirmer for Decline {
        async fn confirm(&self, _prompt: &str) -> bool {
            false
        }
    }

    fn news_sync(api: &Arc<ScriptedTransport>) -> EntityListSynchronizer<NewsItem> {
        EntityListSynchronizer::new(api.clone(), CollectionSpec::news())
    }

    fn news(id: &str, date: &str) -> Value {
        json!({
            "_id": id,
            "title": format!("title {}", id),
            "date": date,
            "description": "d",
            "newsurl": "http://x"
        })
    }

    async fn loaded_news(api: &Arc<ScriptedTransport>) -> EntityListSynchronizer<NewsItem> {
        api.respond(
            Method::Get,
            "/news/getnews",
            json!({ "data": [news("n2", "2024-01-01"), news("n3", "2024-03-01")] }),
        );
        let sync = news_sync(api);
        sync.load().await.unwrap();
        sync
    }

    fn ids<R: SyncRecord>(records: &[R]) -> Vec<String> {
        records.iter().map(|r| r.record_id().to_string()).collect()
    }

    #[tokio::test]
    async fn test_load_sorts_newest_first() {
        let api = ScriptedTransport::new();
        let sync = loaded_news(&api).await;
        assert_eq!(ids(&sync.records().await), ["n3", "n2"]);
    }

    #[tokio::test]
    async fn test_load_twice_is_idempotent() {
        let api = ScriptedTransport::new();
        let sync = loaded_news(&api).await;
        let first = sync.entries().await;

        api.respond(
            Method::Get,
            "/news/getnews",
            json!({ "data": [news("n2", "2024-01-01"), news("n3", "2024-03-01")] }),
        );
        sync.load().await.unwrap();
        assert_eq!(sync.entries().await, first);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_list() {
        let api = ScriptedTransport::new();
        let sync = loaded_news(&api).await;
        let before = sync.entries().await;

        api.fail(Method::Get, "/news/getnews", HubError::server_status(500, "boom"));
        assert!(sync.load().await.is_err());
        assert_eq!(sync.entries().await, before);
    }

    #[tokio::test]
    async fn test_create_prepends_server_record() {
        let api = ScriptedTransport::new();
        let sync = loaded_news(&api).await;
        api.respond(
            Method::Post,
            "/news/insertnews",
            json!({ "success": true, "data": news("n1", "2024-05-01") }),
        );

        let draft = Draft::new()
            .field("title", "title n1")
            .field("date", "2024-05-01")
            .field("description", "d")
            .field("newsurl", "http://x");
        let result = sync.create(draft).await.unwrap();

        assert!(matches!(result, Reconciliation::Merged(ref r) if r.id == "n1"));
        assert_eq!(ids(&sync.records().await), ["n1", "n3", "n2"]);
    }

    #[tokio::test]
    async fn test_create_validation_sends_nothing() {
        let api = ScriptedTransport::new();
        let sync = loaded_news(&api).await;

        let err = sync.create(Draft::new().field("title", "x")).await.unwrap_err();
        assert_eq!(err.missing_fields(), ["date", "description", "newsurl"]);
        assert_eq!(api.count(Method::Post, "/news/insertnews"), 0);
        assert_eq!(sync.len().await, 2);
    }

    #[tokio::test]
    async fn test_create_without_record_reloads() {
        let api = ScriptedTransport::new();
        let sync = loaded_news(&api).await;
        api.respond(Method::Post, "/news/insertnews", json!({ "success": true }));
        api.respond(
            Method::Get,
            "/news/getnews",
            json!({ "data": [news("n1", "2024-05-01"), news("n2", "2024-01-01"), news("n3", "2024-03-01")] }),
        );

        let draft = Draft::new()
            .field("title", "t")
            .field("date", "2024-05-01")
            .field("description", "d")
            .field("newsurl", "u");
        assert_eq!(sync.create(draft).await.unwrap(), Reconciliation::Reloaded);
        assert_eq!(sync.len().await, 3);
    }

    #[tokio::test]
    async fn test_update_uses_server_answer() {
        let api = ScriptedTransport::new();
        let sync = loaded_news(&api).await;
        let mut confirmed = news("n2", "2024-01-01");
        confirmed["title"] = json!("Server title");
        api.respond(
            Method::Put,
            "/news/updatenews/n2",
            json!({ "success": true, "data": confirmed }),
        );

        sync.update("n2", Draft::new().field("title", "Local title"))
            .await
            .unwrap();

        let entry = sync.find("n2").await.unwrap();
        assert_eq!(entry.record.title, "Server title");
        assert_eq!(entry.state, EntryState::Synced);

        let sent = api.requests().pop().unwrap();
        let RequestBody::Json(body) = sent.body else {
            panic!("expected JSON body");
        };
        assert_eq!(body["title"], "Local title");
        assert_eq!(body["newsurl"], "http://x");
    }

    #[tokio::test]
    async fn test_failed_update_restores_entry() {
        let api = ScriptedTransport::new();
        let sync = loaded_news(&api).await;
        sync.edit_local("n2", "title", json!("edited")).await.unwrap();
        let before = sync.entries().await;

        api.fail(Method::Put, "/news/updatenews/n2", HubError::transport("reset"));
        let err = sync.save("n2").await.unwrap_err();

        assert!(err.is_transport());
        assert_eq!(sync.entries().await, before);
    }

    #[tokio::test]
    async fn test_edit_and_discard() {
        let api = ScriptedTransport::new();
        let sync = loaded_news(&api).await;

        sync.edit_local("n3", "title", json!("draft")).await.unwrap();
        let entry = sync.find("n3").await.unwrap();
        assert_eq!(entry.record.title, "draft");
        assert!(matches!(entry.state, EntryState::Edited { .. }));

        sync.discard_edits("n3").await.unwrap();
        let entry = sync.find("n3").await.unwrap();
        assert_eq!(entry.record.title, "title n3");
        assert_eq!(entry.state, EntryState::Synced);
    }

    #[tokio::test]
    async fn test_delete_confirmed_removes_entry() {
        let api = ScriptedTransport::new();
        let sync = loaded_news(&api).await;
        api.respond(Method::Delete, "/news/deletenews/n2", json!({ "success": true }));

        assert!(sync.delete("n2", &AlwaysConfirm).await.unwrap());
        assert_eq!(ids(&sync.records().await), ["n3"]);
    }

    #[tokio::test]
    async fn test_delete_declined_sends_nothing() {
        let api = ScriptedTransport::new();
        let sync = loaded_news(&api).await;

        assert!(!sync.delete("n2", &Decline).await.unwrap());
        assert_eq!(api.count(Method::Delete, "/news/deletenews/n2"), 0);
        assert_eq!(sync.len().await, 2);
    }

    #[tokio::test]
    async fn test_delete_rejected_keeps_entry() {
        let api = ScriptedTransport::new();
        let sync = loaded_news(&api).await;
        let before = sync.entries().await;
        api.respond(
            Method::Delete,
            "/news/deletenews/n3",
            json!({ "success": false, "message": "locked" }),
        );

        let err = sync.delete("n3", &AlwaysConfirm).await.unwrap_err();
        assert_eq!(err.user_message(), "locked");
        assert_eq!(sync.entries().await, before);
    }

    #[tokio::test]
    async fn test_second_mutation_is_busy() {
        let api = ScriptedTransport::new();
        let sync = loaded_news(&api).await;
        let gate = api.hold("/news/deletenews/n2");
        api.respond(Method::Delete, "/news/deletenews/n2", json!({ "success": true }));

        let pending = {
            let sync = sync.clone();
            tokio::spawn(async move { sync.delete("n2", &AlwaysConfirm).await })
        };
        while !sync.is_pending("n2").await {
            tokio::task::yield_now().await;
        }

        let err = sync.update("n2", Draft::new()).await.unwrap_err();
        assert_eq!(err, HubError::Busy { id: "n2".to_string() });

        gate.notify_one();
        assert!(pending.await.unwrap().unwrap());
        assert_eq!(api.count(Method::Put, "/news/updatenews/n2"), 0);
    }

    #[tokio::test]
    async fn test_unmount_drops_late_load() {
        let api = ScriptedTransport::new();
        let sync = news_sync(&api);
        let gate = api.hold("/news/getnews");
        api.respond(Method::Get, "/news/getnews", json!({ "data": [news("n1", "2024-01-01")] }));

        let pending = {
            let sync = sync.clone();
            tokio::spawn(async move { sync.load().await })
        };
        while api.count(Method::Get, "/news/getnews") == 0 {
            tokio::task::yield_now().await;
        }
        sync.unmount().await;
        gate.notify_one();

        pending.await.unwrap().unwrap();
        assert!(sync.is_empty().await);
        assert!(!sync.is_mounted().await);
    }

    #[tokio::test]
    async fn test_event_update_without_derived_fields_reloads() {
        let api = ScriptedTransport::new();
        api.respond(
            Method::Get,
            "/event/getevent",
            json!({ "data": [{ "_id": "e1", "title": "Rally", "date": "2024-03-15", "description": "d", "day": "15", "month": "Mar" }] }),
        );
        let sync: EntityListSynchronizer<Event> =
            EntityListSynchronizer::new(api.clone(), CollectionSpec::events());
        sync.load().await.unwrap();

        api.respond(
            Method::Put,
            "/event/updateevent/e1",
            json!({ "success": true, "data": { "_id": "e1", "title": "Rally", "date": "2024-04-02" } }),
        );
        api.respond(
            Method::Get,
            "/event/getevent",
            json!({ "data": [{ "_id": "e1", "title": "Rally", "date": "2024-04-02", "description": "d", "day": "02", "month": "Apr" }] }),
        );

        let result = sync
            .update("e1", Draft::new().field("date", "2024-04-02"))
            .await
            .unwrap();
        assert_eq!(result, Reconciliation::Reloaded);
        let event = sync.find("e1").await.unwrap().record;
        assert_eq!(event.month.as_deref(), Some("Apr"));
    }

    #[tokio::test]
    async fn test_gallery_requires_image_or_upload() {
        let api = ScriptedTransport::new();
        let sync: EntityListSynchronizer<Record> =
            EntityListSynchronizer::new(api.clone(), CollectionSpec::gallery());

        let draft = Draft::new().field("title", "Visit").field("year", 2024);
        let err = sync.create(draft.clone()).await.unwrap_err();
        assert_eq!(err.missing_fields(), ["image"]);

        api.respond(
            Method::Post,
            "/gallery/insertgallery",
            json!({ "data": { "_id": "g1", "title": "Visit", "year": 2024, "image": "https://cdn/g1.jpg" } }),
        );
        let mut draft = draft;
        draft.attach("image", Attachment::new("g1.jpg", vec![1, 2, 3]));
        sync.create(draft).await.unwrap();

        let sent = api.requests().pop().unwrap();
        assert!(matches!(sent.body, RequestBody::Multipart(_)));
        assert_eq!(ids(&sync.records().await), ["g1"]);
    }

    #[tokio::test]
    async fn test_inquiries_reject_create() {
        let api = ScriptedTransport::new();
        let sync: EntityListSynchronizer<Record> =
            EntityListSynchronizer::new(api.clone(), CollectionSpec::inquiries());
        let err = sync.create(Draft::new()).await.unwrap_err();
        assert!(matches!(err, HubError::Unsupported { .. }));
    }

    #[tokio::test]
    async fn test_bulk_save_flags_new_images() {
        let api = ScriptedTransport::new();
        api.respond(
            Method::Get,
            "/event/getevent",
            json!({ "data": [
                { "_id": "e1", "title": "A", "date": "2024-01-05", "description": "d" },
                { "_id": "e2", "title": "B", "date": "2024-02-05", "description": "d" }
            ] }),
        );
        let sync: EntityListSynchronizer<Event> =
            EntityListSynchronizer::new(api.clone(), CollectionSpec::events());
        sync.load().await.unwrap();
        api.respond(
            Method::Post,
            "/event/inserteventdata",
            json!({ "success": true, "data": [
                { "_id": "e1", "title": "A", "date": "2024-01-05", "description": "d", "day": "05", "month": "Jan", "imageUrl": "https://cdn/e1.jpg" },
                { "_id": "e2", "title": "B", "date": "2024-02-05", "description": "d", "day": "05", "month": "Feb" }
            ] }),
        );

        let attachments = vec![DraftAttachment {
            part: "image-e1".to_string(),
            attachment: Attachment::new("e1.jpg", vec![9]),
        }];
        let result = sync.save_all(attachments).await.unwrap();
        assert!(matches!(result, Reconciliation::Merged(ref list) if list.len() == 2));

        let sent = api.requests().pop().unwrap();
        let RequestBody::Multipart(form) = sent.body else {
            panic!("expected multipart");
        };
        let events: Value = serde_json::from_str(form.text_value("events").unwrap()).unwrap();
        assert_eq!(events[0]["isNewImage"], true);
        assert_eq!(events[1]["isNewImage"], false);
        assert_eq!(events[0]["month"], "Jan");
        assert_eq!(form.file_names(), vec!["image-e1"]);

        let e1 = sync.find("e1").await.unwrap().record;
        assert_eq!(e1.image_url.as_deref(), Some("https://cdn/e1.jpg"));
    }

    #[tokio::test]
    async fn test_rejected_create_leaves_list_unchanged() {
        let api = ScriptedTransport::new();
        let sync = loaded_news(&api).await;
        let before = sync.entries().await;
        api.respond(
            Method::Post,
            "/news/insertnews",
            json!({ "success": false, "message": "Duplicate title" }),
        );

        let draft = Draft::new()
            .field("title", "title n2")
            .field("date", "2024-05-01")
            .field("description", "d")
            .field("newsurl", "http://x");
        let err = sync.create(draft).await.unwrap_err();

        assert_eq!(err.user_message(), "Duplicate title");
        assert_eq!(sync.entries().await, before);
        assert_eq!(api.count(Method::Get, "/news/getnews"), 1);
    }

    #[tokio::test]
    async fn test_failed_bulk_save_restores_entries() {
        let api = ScriptedTransport::new();
        api.respond(
            Method::Get,
            "/event/getevent",
            json!({ "data": [
                { "_id": "e1", "title": "A", "date": "2024-01-05", "description": "d", "day": "5", "month": "Jan" },
                { "_id": "e2", "title": "B", "date": "2024-02-05", "description": "d", "day": "5", "month": "Feb" }
            ] }),
        );
        api.fail(
            Method::Post,
            "/event/inserteventdata",
            HubError::server_status(500, "Upload failed"),
        );
        let sync: EntityListSynchronizer<Event> =
            EntityListSynchronizer::new(api.clone(), CollectionSpec::events());
        sync.load().await.unwrap();
        let before = sync.entries().await;

        let err = sync.save_all(Vec::new()).await.unwrap_err();

        assert_eq!(err.user_message(), "Upload failed");
        assert_eq!(sync.entries().await, before);
        assert!(!sync.is_pending("e1").await);
    }
}
