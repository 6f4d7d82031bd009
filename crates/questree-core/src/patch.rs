//! Partial updates for sections and questions.
//!
//! Every field is optional; `None` leaves the stored value alone. Nullable
//! columns use `Option<Option<T>>` so that "leave unchanged" (`None`, field
//! absent from JSON) and "set to null" (`Some(None)`, explicit `null`) stay
//! distinct.

use serde::{Deserialize, Deserializer, Serialize};

use crate::{
  question::{QuestionId, QuestionType},
  section::SectionId,
};

/// Deserialise a present field (even `null`) as `Some(..)`; pair with
/// `#[serde(default)]` so an absent field stays `None`.
fn nullable<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Option::<T>::deserialize(de).map(Some)
}

// ─── Sections ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionPatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name:        Option<String>,
  #[serde(
    default,
    deserialize_with = "nullable",
    skip_serializing_if = "Option::is_none"
  )]
  pub description: Option<Option<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub order_index: Option<i64>,
}

// ─── Questions ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionPatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub section_id:  Option<SectionId>,
  #[serde(
    default,
    deserialize_with = "nullable",
    skip_serializing_if = "Option::is_none"
  )]
  pub parent_id:   Option<Option<QuestionId>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub text:        Option<String>,
  #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
  pub kind:        Option<QuestionType>,
  #[serde(
    default,
    deserialize_with = "nullable",
    skip_serializing_if = "Option::is_none"
  )]
  pub options:     Option<Option<serde_json::Value>>,
  #[serde(
    default,
    deserialize_with = "nullable",
    skip_serializing_if = "Option::is_none"
  )]
  pub condition:   Option<Option<serde_json::Value>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub order_index: Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub is_required: Option<bool>,
  #[serde(
    default,
    deserialize_with = "nullable",
    skip_serializing_if = "Option::is_none"
  )]
  pub notes:       Option<Option<String>>,
}

impl QuestionPatch {
  /// A patch that only changes the sibling position.
  pub fn order(order_index: i64) -> Self {
    Self { order_index: Some(order_index), ..Self::default() }
  }

  /// Whether the patch changes where the question sits in the tree.
  pub fn moves(&self) -> bool { self.parent_id.is_some() || self.section_id.is_some() }
}
