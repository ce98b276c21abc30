//! Drafts: records that have not been persisted yet.

use serde_json::{Map, Value};

use super::model::SyncRecord;
use crate::api::{MultipartForm, RequestBody};
use crate::error::Result;

/// A file picked for upload, held in memory until submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A file bound to a named multipart part (`image`, `coverImage`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftAttachment {
    pub part: String,
    pub attachment: Attachment,
}

/// An in-progress record.
///
/// The identity is absent for "add new" forms and set when a draft edits an
/// existing record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    id: Option<String>,
    fields: Map<String, Value>,
    attachments: Vec<DraftAttachment>,
}

impl Draft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a draft from field defaults.
    pub fn with_defaults(defaults: Map<String, Value>) -> Self {
        Self {
            fields: defaults,
            ..Self::default()
        }
    }

    /// Starts an edit draft from an existing record.
    pub fn from_record<R: SyncRecord>(record: &R) -> Result<Self> {
        Ok(Self {
            id: Some(record.record_id().to_string()),
            fields: record.to_fields()?,
            attachments: Vec::new(),
        })
    }

    /// Builder-style field setter.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Binds a file to a part, replacing an earlier file on the same part.
    pub fn attach(&mut self, part: impl Into<String>, attachment: Attachment) {
        let part = part.into();
        self.attachments.retain(|a| a.part != part);
        self.attachments.push(DraftAttachment { part, attachment });
    }

    /// Appends a file to a repeatable part (e.g. `galleryFiles`).
    pub fn attach_many(&mut self, part: impl Into<String>, attachment: Attachment) {
        self.attachments.push(DraftAttachment {
            part: part.into(),
            attachment,
        });
    }

    pub fn detach(&mut self, part: &str) {
        self.attachments.retain(|a| a.part != part);
    }

    pub fn attachments(&self) -> &[DraftAttachment] {
        &self.attachments
    }

    pub fn has_attachment(&self, part: &str) -> bool {
        self.attachments.iter().any(|a| a.part == part)
    }

    /// Encodes the draft as a request body.
    ///
    /// Without attachments the fields go out as JSON. With attachments every
    /// field becomes a text part (strings verbatim, anything else as JSON
    /// text) followed by the file parts.
    pub fn to_body(&self) -> RequestBody {
        if self.attachments.is_empty() {
            return RequestBody::Json(Value::Object(self.fields.clone()));
        }

        let mut form = MultipartForm::new();
        for (name, value) in &self.fields {
            form = form.text(name.clone(), text_of(value));
        }
        for a in &self.attachments {
            form = form.file(a.part.clone(), a.attachment.clone());
        }
        RequestBody::Multipart(form)
    }
}

/// Text encoding of a field for multipart submission.
fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
