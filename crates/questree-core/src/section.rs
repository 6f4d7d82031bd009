//! Sections: the top-level groups of a questionnaire.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::question::QuestionNode;

/// Store-assigned integer identity of a [`Section`].
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SectionId(pub i64);

impl fmt::Display for SectionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// A named group of questions, ordered among its peers by `order_index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
  pub id:          SectionId,
  pub name:        String,
  pub description: Option<String>,
  pub order_index: i64,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

/// Input to [`crate::backend::QuestionnaireBackend::insert_section`].
/// Identity and timestamps are always assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSection {
  pub name:        String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub order_index: i64,
}

/// A section decorated with its root-level question trees.
///
/// Derived on read, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionWithQuestions {
  #[serde(flatten)]
  pub section:   Section,
  pub questions: Vec<QuestionNode>,
}
