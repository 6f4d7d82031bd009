//! Handler for `GET /tree`.

use std::sync::Arc;

use axum::{Json, extract::State};
use questree_core::{backend::QuestionnaireBackend, section::SectionWithQuestions};
use questree_session::QuestionnaireStore;

use crate::error::ApiError;

/// `GET /tree`: every section with its nested questions.
///
/// Answers 409 when the cached collections do not form a valid forest.
pub async fn handler<B>(
  State(store): State<Arc<QuestionnaireStore<B>>>,
) -> Result<Json<Vec<SectionWithQuestions>>, ApiError>
where
  B: QuestionnaireBackend,
{
  let tree = store.snapshot().tree_checked()?;
  Ok(Json(tree))
}
