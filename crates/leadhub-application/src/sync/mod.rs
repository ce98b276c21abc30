//! Synchronizers between local state and the backend.
//!
//! - `list`: generic [`EntityListSynchronizer`] for the list collections
//! - `document`: [`DocumentSynchronizer`] for singleton documents

mod document;
mod list;

pub use document::DocumentSynchronizer;
pub use list::{
    AlwaysConfirm, Confirmer, Entry, EntityListSynchronizer, EntryState, Reconciliation,
};
