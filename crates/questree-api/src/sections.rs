//! Handlers for `/sections` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/sections` | Ordered by `order_index` |
//! | `POST`   | `/sections` | Body: `{"name":"...","description":"..."}`; appended last |
//! | `PATCH`  | `/sections/:id` | Body: [`SectionPatch`] |
//! | `DELETE` | `/sections/:id` | Also removes the section's questions |
//! | `POST`   | `/sections/reorder` | Body: `{"ids":[..]}` |
//! | `POST`   | `/sections/:id/reorder` | Body: `{"ids":[..]}`, question ids |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use questree_core::{
  backend::QuestionnaireBackend,
  patch::SectionPatch,
  question::QuestionId,
  section::{Section, SectionId},
};
use questree_session::QuestionnaireStore;
use serde::Deserialize;

use crate::error::ApiError;

fn ensure_section<B: QuestionnaireBackend>(
  store: &QuestionnaireStore<B>,
  id: SectionId,
) -> Result<(), ApiError> {
  store
    .snapshot()
    .section(id)
    .map(|_| ())
    .ok_or_else(|| ApiError::NotFound(format!("section {id} not found")))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /sections`
pub async fn list<B>(
  State(store): State<Arc<QuestionnaireStore<B>>>,
) -> Json<Vec<Section>>
where
  B: QuestionnaireBackend,
{
  let mut sections = store.snapshot().sections;
  sections.sort_by_key(|s| s.order_index);
  Json(sections)
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:        String,
  #[serde(default)]
  pub description: Option<String>,
}

/// `POST /sections`
pub async fn create<B>(
  State(store): State<Arc<QuestionnaireStore<B>>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  B: QuestionnaireBackend,
{
  if body.name.trim().is_empty() {
    return Err(ApiError::BadRequest("section name must not be empty".into()));
  }
  let section = store.create_section(body.name, body.description).await?;
  Ok((StatusCode::CREATED, Json(section)))
}

// ─── Update / delete ──────────────────────────────────────────────────────────

/// `PATCH /sections/:id`
pub async fn update<B>(
  State(store): State<Arc<QuestionnaireStore<B>>>,
  Path(id): Path<SectionId>,
  Json(patch): Json<SectionPatch>,
) -> Result<Json<Section>, ApiError>
where
  B: QuestionnaireBackend,
{
  ensure_section(&store, id)?;
  let section = store.update_section(id, patch).await?;
  Ok(Json(section))
}

/// `DELETE /sections/:id`
pub async fn delete_one<B>(
  State(store): State<Arc<QuestionnaireStore<B>>>,
  Path(id): Path<SectionId>,
) -> Result<StatusCode, ApiError>
where
  B: QuestionnaireBackend,
{
  ensure_section(&store, id)?;
  store.delete_section(id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Reorder ──────────────────────────────────────────────────────────────────

/// Body of both reorder endpoints: ids in their new order.
#[derive(Debug, Deserialize)]
pub struct ReorderBody<Id> {
  pub ids: Vec<Id>,
}

/// `POST /sections/reorder`
pub async fn reorder<B>(
  State(store): State<Arc<QuestionnaireStore<B>>>,
  Json(body): Json<ReorderBody<SectionId>>,
) -> Result<StatusCode, ApiError>
where
  B: QuestionnaireBackend,
{
  store.reorder_sections(&body.ids).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /sections/:id/reorder`: reorder sibling questions of a section.
pub async fn reorder_questions<B>(
  State(store): State<Arc<QuestionnaireStore<B>>>,
  Path(id): Path<SectionId>,
  Json(body): Json<ReorderBody<QuestionId>>,
) -> Result<StatusCode, ApiError>
where
  B: QuestionnaireBackend,
{
  ensure_section(&store, id)?;
  store.reorder_questions(id, &body.ids).await?;
  Ok(StatusCode::NO_CONTENT)
}
