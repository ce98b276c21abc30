//! Collection definitions: endpoints and per-collection rules.
//!
//! A [`CollectionSpec`] is everything the generic synchronizer needs to
//! know about one admin panel's data: where to fetch and mutate it, how to
//! order it, where new records go, which fields must be filled in and which
//! fields the server derives.

use serde_json::{Map, Value};

use crate::composite;
use crate::dates;
use crate::record::DEFAULT_IDENTITY_FIELD;

/// The list collections managed by the admin panels.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum CollectionKind {
    News,
    Events,
    Gallery,
    Books,
    Inquiries,
}

impl CollectionKind {
    /// The built-in spec for this collection.
    pub fn spec(self) -> CollectionSpec {
        match self {
            CollectionKind::News => CollectionSpec::news(),
            CollectionKind::Events => CollectionSpec::events(),
            CollectionKind::Gallery => CollectionSpec::gallery(),
            CollectionKind::Books => CollectionSpec::books(),
            CollectionKind::Inquiries => CollectionSpec::inquiries(),
        }
    }
}

/// Endpoint set of one collection. `{id}` in a path is replaced with the
/// record identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub list: String,
    pub create: Option<String>,
    pub update: Option<String>,
    pub delete: Option<String>,
}

impl Endpoints {
    pub fn new(list: impl Into<String>) -> Self {
        Self {
            list: list.into(),
            create: None,
            update: None,
            delete: None,
        }
    }

    pub fn create(mut self, path: impl Into<String>) -> Self {
        self.create = Some(path.into());
        self
    }

    pub fn update(mut self, path: impl Into<String>) -> Self {
        self.update = Some(path.into());
        self
    }

    pub fn delete(mut self, path: impl Into<String>) -> Self {
        self.delete = Some(path.into());
        self
    }

    pub fn update_path(&self, id: &str) -> Option<String> {
        self.update.as_deref().map(|p| p.replace("{id}", id))
    }

    pub fn delete_path(&self, id: &str) -> Option<String> {
        self.delete.as_deref().map(|p| p.replace("{id}", id))
    }
}

/// Ordering applied to a freshly loaded list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortRule {
    /// Keep server order.
    Unsorted,
    /// Newest first by a date field; undated records go last.
    NewestFirst { field: &'static str },
}

/// Where a created record lands in the local list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    Prepend,
    Append,
}

/// A field that must be filled in before submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Field(&'static str),
    /// Satisfied by a non-empty field (an existing URL) or a file on `part`.
    FieldOrUpload {
        field: &'static str,
        part: &'static str,
    },
}

impl Requirement {
    pub fn name(&self) -> &'static str {
        match self {
            Requirement::Field(field) | Requirement::FieldOrUpload { field, .. } => field,
        }
    }
}

/// Recomputes derived fields and normalizes edited values before a record
/// is stored locally or submitted.
pub type DeriveFn = fn(&mut Map<String, Value>);

/// Endpoint that replaces a whole collection in one multipart request.
///
/// The list goes out as JSON text in `list_part`; a new file for record `id`
/// goes in the part `{file_prefix}-{id}` and the record is flagged with
/// `new_file_flag`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkSave {
    pub path: String,
    pub list_part: String,
    pub file_prefix: String,
    pub new_file_flag: String,
}

impl BulkSave {
    pub fn file_part(&self, id: &str) -> String {
        format!("{}-{}", self.file_prefix, id)
    }
}

/// Everything the synchronizer needs to know about a collection.
#[derive(Debug, Clone)]
pub struct CollectionSpec {
    pub name: String,
    pub endpoints: Endpoints,
    pub identity_field: &'static str,
    pub sort: SortRule,
    pub insert: InsertPosition,
    pub required: Vec<Requirement>,
    /// Fields a server response must carry to be trusted as complete.
    pub derived_fields: Vec<&'static str>,
    pub derive: Option<DeriveFn>,
    /// URL fields that reference uploaded assets.
    pub asset_fields: Vec<&'static str>,
    pub bulk_save: Option<BulkSave>,
}

impl CollectionSpec {
    pub fn new(name: impl Into<String>, endpoints: Endpoints) -> Self {
        Self {
            name: name.into(),
            endpoints,
            identity_field: DEFAULT_IDENTITY_FIELD,
            sort: SortRule::Unsorted,
            insert: InsertPosition::Append,
            required: Vec::new(),
            derived_fields: Vec::new(),
            derive: None,
            asset_fields: Vec::new(),
            bulk_save: None,
        }
    }

    pub fn sort(mut self, sort: SortRule) -> Self {
        self.sort = sort;
        self
    }

    pub fn insert(mut self, insert: InsertPosition) -> Self {
        self.insert = insert;
        self
    }

    pub fn require(mut self, requirement: Requirement) -> Self {
        self.required.push(requirement);
        self
    }

    pub fn require_fields(mut self, fields: &[&'static str]) -> Self {
        self.required
            .extend(fields.iter().copied().map(Requirement::Field));
        self
    }

    pub fn derived(mut self, fields: &[&'static str], derive: DeriveFn) -> Self {
        self.derived_fields = fields.to_vec();
        self.derive = Some(derive);
        self
    }

    pub fn assets(mut self, fields: &[&'static str]) -> Self {
        self.asset_fields = fields.to_vec();
        self
    }

    /// Sets a normalization hook without declaring derived fields.
    pub fn normalize(mut self, derive: DeriveFn) -> Self {
        self.derive = Some(derive);
        self
    }

    pub fn bulk_save(mut self, bulk: BulkSave) -> Self {
        self.bulk_save = Some(bulk);
        self
    }

    pub fn news() -> Self {
        Self::new(
            "News",
            Endpoints::new("/news/getnews")
                .create("/news/insertnews")
                .update("/news/updatenews/{id}")
                .delete("/news/deletenews/{id}"),
        )
        .sort(SortRule::NewestFirst { field: "date" })
        .insert(InsertPosition::Prepend)
        .require_fields(&["title", "date", "description", "newsurl"])
    }

    pub fn events() -> Self {
        Self::new(
            "Events",
            Endpoints::new("/event/getevent")
                .create("/event/insertevent")
                .update("/event/updateevent/{id}")
                .delete("/event/deleteevent/{id}"),
        )
        .insert(InsertPosition::Append)
        .require_fields(&["title", "date", "description"])
        .derived(&["day", "month"], derive_event_date)
        .assets(&["imageUrl"])
        .bulk_save(BulkSave {
            path: "/event/inserteventdata".to_string(),
            list_part: "events".to_string(),
            file_prefix: "image".to_string(),
            new_file_flag: "isNewImage".to_string(),
        })
    }

    pub fn gallery() -> Self {
        Self::new(
            "Gallery",
            Endpoints::new("/gallery/getdata")
                .create("/gallery/insertgallery")
                .update("/gallery/update/{id}")
                .delete("/gallery/delete/{id}"),
        )
        .insert(InsertPosition::Prepend)
        .require_fields(&["title", "year"])
        .require(Requirement::FieldOrUpload {
            field: "image",
            part: "image",
        })
        .assets(&["image"])
    }

    pub fn books() -> Self {
        Self::new(
            "Books",
            Endpoints::new("/store")
                .create("/store")
                .update("/store/{id}")
                .delete("/store/{id}"),
        )
        .insert(InsertPosition::Append)
        .require_fields(&["title"])
        .normalize(normalize_book_tags)
        .assets(&["coverImage"])
    }

    pub fn inquiries() -> Self {
        Self::new(
            "Inquiries",
            Endpoints::new("/inquiry/getmessages").delete("/inquiry/deletemessage/{id}"),
        )
        .sort(SortRule::NewestFirst { field: "createdAt" })
    }

    /// Orders a freshly fetched list according to the sort rule.
    ///
    /// The sort is stable, so records with equal dates keep server order.
    pub fn sort_values(&self, items: &mut [Value]) {
        if let SortRule::NewestFirst { field } = self.sort {
            items.sort_by(|a, b| {
                let da = a.get(field).and_then(Value::as_str).and_then(dates::parse_date);
                let db = b.get(field).and_then(Value::as_str).and_then(dates::parse_date);
                // None sorts before Some, so comparing reversed puts undated last.
                db.cmp(&da)
            });
        }
    }

    /// Whether a mutation response is complete enough to reconcile from.
    pub fn is_complete(&self, record: &Value) -> bool {
        let has_identity = record
            .get(self.identity_field)
            .and_then(Value::as_str)
            .is_some_and(|id| !id.is_empty());
        has_identity
            && self
                .derived_fields
                .iter()
                .all(|field| record.get(*field).is_some_and(|v| !v.is_null()))
    }
}

/// Keeps `day`/`month` in step with `date`.
pub fn derive_event_date(fields: &mut Map<String, Value>) {
    let parts = fields
        .get("date")
        .and_then(Value::as_str)
        .and_then(dates::date_parts);
    let (day, month) = parts.unwrap_or_default();
    fields.insert("day".to_string(), Value::String(day));
    fields.insert("month".to_string(), Value::String(month));
}

/// Book tags are edited as one comma-separated string and stored as a list.
pub fn normalize_book_tags(fields: &mut Map<String, Value>) {
    if let Some(Value::String(raw)) = fields.get("tags") {
        let tags = composite::parse_tags(raw)
            .into_iter()
            .map(Value::String)
            .collect();
        fields.insert("tags".to_string(), Value::Array(tags));
    }
}
