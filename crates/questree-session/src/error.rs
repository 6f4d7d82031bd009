//! Error type for `questree-session`.

use questree_core::question::QuestionId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The backend rejected or failed a request. The cache is left untouched.
  #[error("backend error: {0}")]
  Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("question not found: {0}")]
  QuestionNotFound(QuestionId),

  #[error("cannot move question {question}: {reason}")]
  InvalidMove {
    question: QuestionId,
    reason:   String,
  },

  #[error("malformed questionnaire: {0}")]
  Tree(#[from] questree_core::Error),
}

impl Error {
  pub(crate) fn backend<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Backend(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
