//! The editing session for a Questree questionnaire.
//!
//! [`QuestionnaireStore`] caches the flat section and question collections
//! fetched from any [`QuestionnaireBackend`](questree_core::backend::QuestionnaireBackend),
//! applies CRUD operations through it, and publishes an immutable
//! [`QuestionnaireState`] snapshot to observers after every change. The
//! nested tree is derived from each snapshot on demand.

pub mod error;
pub mod state;
pub mod store;

pub use error::{Error, Result};
pub use state::{EditMode, QuestionnaireState};
pub use store::{ChangeSubscription, QuestionnaireStore};
