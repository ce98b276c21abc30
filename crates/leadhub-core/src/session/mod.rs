//! Admin session domain.

mod model;

pub use model::{Credentials, CredentialsUpdate, SessionState, User};
