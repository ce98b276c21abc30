//! Application layer of the LeadHub admin client.
//!
//! Wires the domain types of `leadhub-core` to a transport: the session
//! store, list and document synchronizers, form drafts, feedback and the
//! [`AdminContext`] that owns them for one run.

pub mod context;
pub mod dashboard;
pub mod drafts;
pub mod feedback;
pub mod navigation;
pub mod session_store;
pub mod sync;

#[cfg(test)]
mod test_support;

pub use context::AdminContext;
pub use dashboard::{CollectionSummary, DashboardSummary, load_dashboard};
pub use drafts::{DraftKey, FormDraft, FormDraftManager};
pub use feedback::{FeedbackCenter, OperationToast, RecordingSink};
pub use navigation::Navigator;
pub use session_store::SessionStore;
pub use sync::{
    AlwaysConfirm, Confirmer, DocumentSynchronizer, EntityListSynchronizer, Entry, EntryState,
    Reconciliation,
};
