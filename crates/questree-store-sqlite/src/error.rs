//! Error type for `questree-store-sqlite`.

use questree_core::{question::QuestionId, section::SectionId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] questree_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("section not found: {0}")]
  SectionNotFound(SectionId),

  #[error("question not found: {0}")]
  QuestionNotFound(QuestionId),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
