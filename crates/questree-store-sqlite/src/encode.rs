//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, structured payloads (`options`,
//! `condition`) as compact JSON, and question types as their wire tag.

use chrono::{DateTime, Utc};
use questree_core::{
  patch::{QuestionPatch, SectionPatch},
  question::{Question, QuestionId, QuestionType},
  section::{Section, SectionId},
};
use rusqlite::types::Value as SqlValue;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── JSON payloads ───────────────────────────────────────────────────────────

pub fn encode_json(value: Option<&serde_json::Value>) -> Option<String> {
  value.map(serde_json::Value::to_string)
}

pub fn decode_json(s: Option<&str>) -> Result<Option<serde_json::Value>> {
  Ok(s.map(serde_json::from_str::<serde_json::Value>).transpose()?)
}

// ─── Patches ─────────────────────────────────────────────────────────────────

/// A `column = value` pair for an `UPDATE ... SET` clause.
pub type Assignment = (&'static str, SqlValue);

fn text_or_null(value: Option<String>) -> SqlValue {
  value.map_or(SqlValue::Null, SqlValue::Text)
}

/// Columns touched by `patch`, in a fixed order. Fields the patch leaves
/// alone are not listed, so concurrent patches to different fields of the
/// same row never overwrite each other.
pub fn section_assignments(patch: &SectionPatch) -> Vec<Assignment> {
  let mut sets = Vec::new();
  if let Some(name) = &patch.name {
    sets.push(("name", SqlValue::Text(name.clone())));
  }
  if let Some(description) = &patch.description {
    sets.push(("description", text_or_null(description.clone())));
  }
  if let Some(order_index) = patch.order_index {
    sets.push(("order_index", SqlValue::Integer(order_index)));
  }
  sets
}

pub fn question_assignments(patch: &QuestionPatch) -> Vec<Assignment> {
  let mut sets = Vec::new();
  if let Some(section_id) = patch.section_id {
    sets.push(("section_id", SqlValue::Integer(section_id.0)));
  }
  if let Some(parent_id) = patch.parent_id {
    sets.push((
      "parent_id",
      parent_id.map_or(SqlValue::Null, |p| SqlValue::Integer(p.0)),
    ));
  }
  if let Some(text) = &patch.text {
    sets.push(("text", SqlValue::Text(text.clone())));
  }
  if let Some(kind) = patch.kind {
    sets.push(("type", SqlValue::Text(kind.as_str().to_owned())));
  }
  if let Some(options) = &patch.options {
    sets.push(("options", text_or_null(encode_json(options.as_ref()))));
  }
  if let Some(condition) = &patch.condition {
    sets.push(("condition", text_or_null(encode_json(condition.as_ref()))));
  }
  if let Some(order_index) = patch.order_index {
    sets.push(("order_index", SqlValue::Integer(order_index)));
  }
  if let Some(is_required) = patch.is_required {
    sets.push(("is_required", SqlValue::Integer(i64::from(is_required))));
  }
  if let Some(notes) = &patch.notes {
    sets.push(("notes", text_or_null(notes.clone())));
  }
  sets
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const SECTION_COLUMNS: &str =
  "id, name, description, order_index, created_at, updated_at";

pub const QUESTION_COLUMNS: &str = "id, section_id, parent_id, text, type, \
                                    options, condition, order_index, \
                                    is_required, notes, created_at, updated_at";

/// Raw values read directly from a `sections` row.
pub struct RawSection {
  pub id:          i64,
  pub name:        String,
  pub description: Option<String>,
  pub order_index: i64,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawSection {
  /// Read a row selected with [`SECTION_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      name:        row.get(1)?,
      description: row.get(2)?,
      order_index: row.get(3)?,
      created_at:  row.get(4)?,
      updated_at:  row.get(5)?,
    })
  }

  pub fn into_section(self) -> Result<Section> {
    Ok(Section {
      id:          SectionId(self.id),
      name:        self.name,
      description: self.description,
      order_index: self.order_index,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from a `questions` row.
pub struct RawQuestion {
  pub id:          i64,
  pub section_id:  i64,
  pub parent_id:   Option<i64>,
  pub text:        String,
  pub kind:        String,
  pub options:     Option<String>,
  pub condition:   Option<String>,
  pub order_index: i64,
  pub is_required: bool,
  pub notes:       Option<String>,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawQuestion {
  /// Read a row selected with [`QUESTION_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      section_id:  row.get(1)?,
      parent_id:   row.get(2)?,
      text:        row.get(3)?,
      kind:        row.get(4)?,
      options:     row.get(5)?,
      condition:   row.get(6)?,
      order_index: row.get(7)?,
      is_required: row.get(8)?,
      notes:       row.get(9)?,
      created_at:  row.get(10)?,
      updated_at:  row.get(11)?,
    })
  }

  pub fn into_question(self) -> Result<Question> {
    Ok(Question {
      id:          QuestionId(self.id),
      section_id:  SectionId(self.section_id),
      parent_id:   self.parent_id.map(QuestionId),
      text:        self.text,
      kind:        self.kind.parse::<QuestionType>()?,
      options:     decode_json(self.options.as_deref())?,
      condition:   decode_json(self.condition.as_deref())?,
      order_index: self.order_index,
      is_required: self.is_required,
      notes:       self.notes,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}
