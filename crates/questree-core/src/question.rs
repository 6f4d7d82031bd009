//! Questions: the prompts that make up a questionnaire.
//!
//! Questions are flat records that point at their owning section and,
//! optionally, at a parent question. The nested [`QuestionNode`] view is
//! assembled on read by [`crate::tree`].

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, section::SectionId};

/// Store-assigned integer identity of a [`Question`].
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct QuestionId(pub i64);

impl fmt::Display for QuestionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

// ─── Type tag ────────────────────────────────────────────────────────────────

/// The input widget a question is answered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
  /// Single-line free text.
  Text,
  /// Multi-line free text.
  Textarea,
  Select,
  Checkbox,
  Radio,
  #[serde(alias = "yes_no")]
  YesNo,
  Number,
  Date,
  /// Informational text; expects no answer.
  Message,
  /// A heading that only groups its children.
  Group,
}

impl QuestionType {
  /// The tag stored in the `type` column. Must match the serde names above.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Text => "text",
      Self::Textarea => "textarea",
      Self::Select => "select",
      Self::Checkbox => "checkbox",
      Self::Radio => "radio",
      Self::YesNo => "yesno",
      Self::Number => "number",
      Self::Date => "date",
      Self::Message => "message",
      Self::Group => "group",
    }
  }
}

impl fmt::Display for QuestionType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for QuestionType {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "text" => Ok(Self::Text),
      "textarea" => Ok(Self::Textarea),
      "select" => Ok(Self::Select),
      "checkbox" => Ok(Self::Checkbox),
      "radio" => Ok(Self::Radio),
      "yesno" | "yes_no" => Ok(Self::YesNo),
      "number" => Ok(Self::Number),
      "date" => Ok(Self::Date),
      "message" => Ok(Self::Message),
      "group" => Ok(Self::Group),
      other => Err(Error::UnknownQuestionType(other.to_owned())),
    }
  }
}

// ─── Question ────────────────────────────────────────────────────────────────

/// A single prompt, possibly nested under another question of the same
/// section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
  pub id:          QuestionId,
  pub section_id:  SectionId,
  pub parent_id:   Option<QuestionId>,
  pub text:        String,
  #[serde(rename = "type")]
  pub kind:        QuestionType,
  /// Type-specific payload, e.g. the choices of a `select`.
  pub options:     Option<serde_json::Value>,
  /// Display rule evaluated by [`crate::condition::evaluate`].
  pub condition:   Option<serde_json::Value>,
  /// Position among siblings sharing the same parent.
  pub order_index: i64,
  pub is_required: bool,
  pub notes:       Option<String>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

/// Input to [`crate::backend::QuestionnaireBackend::insert_question`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewQuestion {
  pub section_id:  SectionId,
  #[serde(default)]
  pub parent_id:   Option<QuestionId>,
  pub text:        String,
  #[serde(rename = "type")]
  pub kind:        QuestionType,
  #[serde(default)]
  pub options:     Option<serde_json::Value>,
  #[serde(default)]
  pub condition:   Option<serde_json::Value>,
  #[serde(default)]
  pub order_index: i64,
  #[serde(default)]
  pub is_required: bool,
  #[serde(default)]
  pub notes:       Option<String>,
}

impl NewQuestion {
  /// Convenience constructor with all optional fields set to their defaults.
  pub fn new(
    section_id: SectionId,
    text: impl Into<String>,
    kind: QuestionType,
  ) -> Self {
    Self {
      section_id,
      parent_id: None,
      text: text.into(),
      kind,
      options: None,
      condition: None,
      order_index: 0,
      is_required: false,
      notes: None,
    }
  }
}

// ─── Tree node ───────────────────────────────────────────────────────────────

/// A question decorated with its ordered children.
///
/// Always rebuilt from the flat collection; never written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionNode {
  #[serde(flatten)]
  pub question: Question,
  pub children: Vec<QuestionNode>,
}

impl QuestionNode {
  /// A node with no children.
  pub fn leaf(question: Question) -> Self {
    Self { question, children: Vec::new() }
  }

  pub fn id(&self) -> QuestionId { self.question.id }
}
