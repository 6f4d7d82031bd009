//! JSON REST API for Questree.
//!
//! Exposes an axum [`Router`] over a shared [`QuestionnaireStore`]. Reads are
//! answered from the store's cached snapshot; writes go through the store so
//! the snapshot stays consistent with the backend.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", questree_api::api_router(store.clone()))
//! ```

pub mod error;
pub mod questions;
pub mod sections;
pub mod tree;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, patch, post},
};
use questree_core::backend::QuestionnaireBackend;
use questree_session::QuestionnaireStore;
use serde::Deserialize;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `QUESTREE_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("questree.db") }

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<B>(store: Arc<QuestionnaireStore<B>>) -> Router<()>
where
  B: QuestionnaireBackend + 'static,
{
  Router::new()
    .route("/tree", get(tree::handler::<B>))
    // Sections
    .route("/sections", get(sections::list::<B>).post(sections::create::<B>))
    .route("/sections/reorder", post(sections::reorder::<B>))
    .route(
      "/sections/{id}",
      patch(sections::update::<B>).delete(sections::delete_one::<B>),
    )
    .route("/sections/{id}/reorder", post(sections::reorder_questions::<B>))
    // Questions
    .route("/questions", post(questions::create::<B>))
    .route(
      "/questions/{id}",
      get(questions::get_one::<B>)
        .patch(questions::update::<B>)
        .delete(questions::delete_one::<B>),
    )
    .route("/questions/{id}/move", post(questions::move_one::<B>))
    .route("/questions/{id}/visible", get(questions::visible::<B>))
    .with_state(store)
}

#[cfg(test)]
mod tests;
