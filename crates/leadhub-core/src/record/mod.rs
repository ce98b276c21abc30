//! Record domain module.
//!
//! # Module Structure
//!
//! - `model`: the [`SyncRecord`] contract and the untyped [`Record`]
//! - `draft`: unsaved [`Draft`]s and their file [`Attachment`]s
//! - `content`: typed records for the list collections

pub mod content;
mod draft;
mod model;

pub use content::{Book, Event, NewsItem};
pub use draft::{Attachment, Draft, DraftAttachment};
pub use model::{DEFAULT_IDENTITY_FIELD, Record, SyncRecord, is_blank};
