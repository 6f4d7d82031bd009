//! The `QuestionnaireBackend` trait and its change-feed types.
//!
//! The trait is implemented by storage backends (e.g.
//! `questree-store-sqlite`). The editing façade (`questree-session`) and the
//! API depend on this abstraction, not on any concrete backend.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::{
  patch::{QuestionPatch, SectionPatch},
  question::{NewQuestion, Question, QuestionId},
  section::{NewSection, Section, SectionId},
};

// ─── Change feed ─────────────────────────────────────────────────────────────

/// The table a change happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Table {
  Sections,
  Questions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
  Insert,
  Update,
  Delete,
}

/// Emitted on the backend's change feed after every committed write, from
/// any client. Consumers should treat it as "something changed" and reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
  pub table: Table,
  pub kind:  ChangeKind,
}

impl ChangeEvent {
  pub fn new(table: Table, kind: ChangeKind) -> Self { Self { table, kind } }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the relational store that owns sections and questions.
///
/// Writes return the canonical stored record so callers can update their
/// caches without a round trip. Identity and timestamps are always assigned
/// by the backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait QuestionnaireBackend: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Sections ──────────────────────────────────────────────────────────

  /// All sections ordered by `order_index`.
  fn list_sections(
    &self,
  ) -> impl Future<Output = Result<Vec<Section>, Self::Error>> + Send + '_;

  /// The largest `order_index` among sections, or `None` when there are
  /// none.
  fn max_section_order(
    &self,
  ) -> impl Future<Output = Result<Option<i64>, Self::Error>> + Send + '_;

  fn insert_section(
    &self,
    input: NewSection,
  ) -> impl Future<Output = Result<Section, Self::Error>> + Send + '_;

  /// Apply a partial update. Errors if the section does not exist.
  fn update_section(
    &self,
    id: SectionId,
    patch: SectionPatch,
  ) -> impl Future<Output = Result<Section, Self::Error>> + Send + '_;

  /// Delete a section. Errors if the section does not exist.
  fn delete_section(
    &self,
    id: SectionId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Batch-write `(id, order_index)` pairs in one request.
  fn reorder_sections<'a>(
    &'a self,
    order: &'a [(SectionId, i64)],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Questions ─────────────────────────────────────────────────────────

  /// All questions ordered by `order_index`.
  fn list_questions(
    &self,
  ) -> impl Future<Output = Result<Vec<Question>, Self::Error>> + Send + '_;

  fn insert_question(
    &self,
    input: NewQuestion,
  ) -> impl Future<Output = Result<Question, Self::Error>> + Send + '_;

  /// Apply a partial update. Errors if the question does not exist.
  fn update_question(
    &self,
    id: QuestionId,
    patch: QuestionPatch,
  ) -> impl Future<Output = Result<Question, Self::Error>> + Send + '_;

  /// Delete every question in `ids` in one request. Missing ids are ignored.
  fn delete_questions<'a>(
    &'a self,
    ids: &'a [QuestionId],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Move a subtree in one atomic request.
  ///
  /// `ids[0]` is placed under `parent_id`; every id, including the rest of
  /// the subtree, is moved to `section_id`. Either all rows change or none
  /// do. Errors if `ids[0]` does not exist; an empty `ids` is a no-op.
  fn move_subtree<'a>(
    &'a self,
    ids: &'a [QuestionId],
    parent_id: Option<QuestionId>,
    section_id: SectionId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Change feed ───────────────────────────────────────────────────────

  /// Subscribe to change notifications for both tables.
  fn changes(&self) -> broadcast::Receiver<ChangeEvent>;
}
