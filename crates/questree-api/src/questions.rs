//! Handlers for `/questions` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/questions/:id` | The question with its subtree; 404 if not found |
//! | `POST`   | `/questions` | Body: [`NewQuestion`]; returns 201 + stored question |
//! | `PATCH`  | `/questions/:id` | Body: [`QuestionPatch`] |
//! | `DELETE` | `/questions/:id` | Deletes the subtree; returns the deleted ids |
//! | `POST`   | `/questions/:id/move` | Body: `{"parent_id":..,"section_id":..}` |
//! | `GET`    | `/questions/:id/visible` | `?answer=<parent answer>` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use questree_core::{
  backend::QuestionnaireBackend,
  condition,
  mutate,
  patch::QuestionPatch,
  question::{NewQuestion, Question, QuestionId, QuestionNode},
  section::SectionId,
};
use questree_session::{QuestionnaireState, QuestionnaireStore};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ApiError;

fn cached(state: &QuestionnaireState, id: QuestionId) -> Result<&Question, ApiError> {
  state
    .question(id)
    .ok_or_else(|| ApiError::NotFound(format!("question {id} not found")))
}

/// Reject a placement the backend would refuse anyway.
fn check_placement(
  state: &QuestionnaireState,
  section_id: SectionId,
  parent_id: Option<QuestionId>,
) -> Result<(), ApiError> {
  if state.section(section_id).is_none() {
    return Err(ApiError::BadRequest(format!("unknown section {section_id}")));
  }
  if let Some(parent) = parent_id
    && state.question(parent).is_none()
  {
    return Err(ApiError::BadRequest(format!("unknown parent question {parent}")));
  }
  Ok(())
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /questions/:id`
pub async fn get_one<B>(
  State(store): State<Arc<QuestionnaireStore<B>>>,
  Path(id): Path<QuestionId>,
) -> Result<Json<QuestionNode>, ApiError>
where
  B: QuestionnaireBackend,
{
  let tree = store.tree();
  let node = tree
    .iter()
    .find_map(|section| mutate::find(&section.questions, id))
    .cloned()
    .ok_or_else(|| ApiError::NotFound(format!("question {id} not found")))?;
  Ok(Json(node))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /questions`
pub async fn create<B>(
  State(store): State<Arc<QuestionnaireStore<B>>>,
  Json(input): Json<NewQuestion>,
) -> Result<impl IntoResponse, ApiError>
where
  B: QuestionnaireBackend,
{
  check_placement(&store.snapshot(), input.section_id, input.parent_id)?;
  let question = store.create_question(input).await?;
  Ok((StatusCode::CREATED, Json(question)))
}

// ─── Update / delete ──────────────────────────────────────────────────────────

/// `PATCH /questions/:id`
pub async fn update<B>(
  State(store): State<Arc<QuestionnaireStore<B>>>,
  Path(id): Path<QuestionId>,
  Json(patch): Json<QuestionPatch>,
) -> Result<Json<Question>, ApiError>
where
  B: QuestionnaireBackend,
{
  cached(&store.snapshot(), id)?;
  let question = store.update_question(id, patch).await?;
  Ok(Json(question))
}

/// `DELETE /questions/:id`
pub async fn delete_one<B>(
  State(store): State<Arc<QuestionnaireStore<B>>>,
  Path(id): Path<QuestionId>,
) -> Result<Json<Vec<QuestionId>>, ApiError>
where
  B: QuestionnaireBackend,
{
  cached(&store.snapshot(), id)?;
  let deleted = store.delete_question(id).await?;
  Ok(Json(deleted))
}

// ─── Move ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MoveBody {
  /// New parent; absent or `null` moves the question to the section root.
  #[serde(default)]
  pub parent_id:  Option<QuestionId>,
  pub section_id: SectionId,
}

/// `POST /questions/:id/move`
pub async fn move_one<B>(
  State(store): State<Arc<QuestionnaireStore<B>>>,
  Path(id): Path<QuestionId>,
  Json(body): Json<MoveBody>,
) -> Result<StatusCode, ApiError>
where
  B: QuestionnaireBackend,
{
  check_placement(&store.snapshot(), body.section_id, body.parent_id)?;
  store.move_question(id, body.parent_id, body.section_id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Visibility ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct VisibleParams {
  /// The respondent's answer to the parent question, if any.
  pub answer: Option<String>,
}

/// `GET /questions/:id/visible[?answer=<answer>]`
pub async fn visible<B>(
  State(store): State<Arc<QuestionnaireStore<B>>>,
  Path(id): Path<QuestionId>,
  Query(params): Query<VisibleParams>,
) -> Result<Json<Value>, ApiError>
where
  B: QuestionnaireBackend,
{
  let state = store.snapshot();
  let question = cached(&state, id)?;
  let visible =
    condition::evaluate(question.condition.as_ref(), params.answer.as_deref());
  Ok(Json(json!({ "visible": visible })))
}
