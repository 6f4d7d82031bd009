//! [`SqliteStore`]: the SQLite implementation of [`QuestionnaireBackend`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, types::Value as SqlValue};
use tokio::sync::broadcast;

use questree_core::{
  backend::{ChangeEvent, ChangeKind, QuestionnaireBackend, Table},
  patch::{QuestionPatch, SectionPatch},
  question::{NewQuestion, Question, QuestionId},
  section::{NewSection, Section, SectionId},
};

use crate::{
  Error, Result,
  encode::{
    Assignment, QUESTION_COLUMNS, RawQuestion, RawSection, SECTION_COLUMNS,
    encode_dt, encode_json, question_assignments, section_assignments,
  },
  schema::SCHEMA,
};

/// How many unread change events a slow subscriber may fall behind by before
/// it observes a lag.
const CHANGE_FEED_CAPACITY: usize = 64;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A questionnaire store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection and the change feed are shared,
/// so a write through any clone is seen by subscribers of every clone.
#[derive(Clone)]
pub struct SqliteStore {
  conn:    tokio_rusqlite::Connection,
  changes: broadcast::Sender<ChangeEvent>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::with_connection(conn).await
  }

  /// Open an in-memory store: useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::with_connection(conn).await
  }

  async fn with_connection(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
    let store = Self { conn, changes };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Announce a committed write. Having no subscribers is not an error.
  fn notify(&self, table: Table, kind: ChangeKind) {
    let _ = self.changes.send(ChangeEvent::new(table, kind));
  }

  /// Fetch one section by id.
  pub async fn get_section(&self, id: SectionId) -> Result<Option<Section>> {
    let raw: Option<RawSection> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {SECTION_COLUMNS} FROM sections WHERE id = ?1"),
            rusqlite::params![id.0],
            RawSection::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSection::into_section).transpose()
  }

  /// Fetch one question by id.
  pub async fn get_question(&self, id: QuestionId) -> Result<Option<Question>> {
    let raw: Option<RawQuestion> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = ?1"),
            rusqlite::params![id.0],
            RawQuestion::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawQuestion::into_question).transpose()
  }
}

/// Set `assignments` plus `updated_at` on row `id` of `table` and read the
/// row back, inside one transaction. `None` when no such row exists.
fn update_row<R>(
  conn: &mut rusqlite::Connection,
  table: &str,
  columns: &str,
  id: i64,
  mut assignments: Vec<Assignment>,
  updated_at: String,
  from_row: impl FnOnce(&rusqlite::Row<'_>) -> rusqlite::Result<R>,
) -> rusqlite::Result<Option<R>> {
  assignments.push(("updated_at", SqlValue::Text(updated_at)));
  let set_clause = assignments
    .iter()
    .enumerate()
    .map(|(i, (column, _))| format!("{column} = ?{}", i + 1))
    .collect::<Vec<_>>()
    .join(", ");
  let id_param = assignments.len() + 1;
  let mut values: Vec<SqlValue> =
    assignments.into_iter().map(|(_, value)| value).collect();
  values.push(SqlValue::Integer(id));

  let tx = conn.transaction()?;
  let changed = tx.execute(
    &format!("UPDATE {table} SET {set_clause} WHERE id = ?{id_param}"),
    rusqlite::params_from_iter(values),
  )?;
  if changed == 0 {
    return Ok(None);
  }
  let row = tx.query_row(
    &format!("SELECT {columns} FROM {table} WHERE id = ?1"),
    rusqlite::params![id],
    from_row,
  )?;
  tx.commit()?;
  Ok(Some(row))
}

// ─── QuestionnaireBackend impl ───────────────────────────────────────────────

impl QuestionnaireBackend for SqliteStore {
  type Error = Error;

  // ── Sections ──────────────────────────────────────────────────────────────

  async fn list_sections(&self) -> Result<Vec<Section>> {
    let raws: Vec<RawSection> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SECTION_COLUMNS} FROM sections ORDER BY order_index, id"
        ))?;
        let rows = stmt
          .query_map([], RawSection::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSection::into_section).collect()
  }

  async fn max_section_order(&self) -> Result<Option<i64>> {
    let max = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT MAX(order_index) FROM sections",
          [],
          |row| row.get::<_, Option<i64>>(0),
        )?)
      })
      .await?;
    Ok(max)
  }

  async fn insert_section(&self, input: NewSection) -> Result<Section> {
    let now    = Utc::now();
    let at_str = encode_dt(now);
    let name   = input.name.clone();
    let desc   = input.description.clone();
    let order  = input.order_index;

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sections (name, description, order_index, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?4)",
          rusqlite::params![name, desc, order, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    self.notify(Table::Sections, ChangeKind::Insert);
    Ok(Section {
      id:          SectionId(id),
      name:        input.name,
      description: input.description,
      order_index: input.order_index,
      created_at:  now,
      updated_at:  now,
    })
  }

  async fn update_section(
    &self,
    id: SectionId,
    patch: SectionPatch,
  ) -> Result<Section> {
    let assignments = section_assignments(&patch);
    let at_str = encode_dt(Utc::now());

    let raw = self
      .conn
      .call(move |conn| {
        Ok(update_row(
          conn,
          "sections",
          SECTION_COLUMNS,
          id.0,
          assignments,
          at_str,
          RawSection::from_row,
        )?)
      })
      .await?
      .ok_or(Error::SectionNotFound(id))?;

    let section = raw.into_section()?;
    self.notify(Table::Sections, ChangeKind::Update);
    Ok(section)
  }

  async fn delete_section(&self, id: SectionId) -> Result<()> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM sections WHERE id = ?1", rusqlite::params![id.0])?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::SectionNotFound(id));
    }
    self.notify(Table::Sections, ChangeKind::Delete);
    Ok(())
  }

  async fn reorder_sections(&self, order: &[(SectionId, i64)]) -> Result<()> {
    let pairs: Vec<(i64, i64)> = order.iter().map(|(id, idx)| (id.0, *idx)).collect();
    let at_str = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "UPDATE sections SET order_index = ?1, updated_at = ?2 WHERE id = ?3",
          )?;
          for (id, idx) in &pairs {
            stmt.execute(rusqlite::params![idx, at_str, id])?;
          }
        }
        tx.commit()?;
        Ok(())
      })
      .await?;

    self.notify(Table::Sections, ChangeKind::Update);
    Ok(())
  }

  // ── Questions ─────────────────────────────────────────────────────────────

  async fn list_questions(&self) -> Result<Vec<Question>> {
    let raws: Vec<RawQuestion> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {QUESTION_COLUMNS} FROM questions ORDER BY order_index, id"
        ))?;
        let rows = stmt
          .query_map([], RawQuestion::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawQuestion::into_question).collect()
  }

  async fn insert_question(&self, input: NewQuestion) -> Result<Question> {
    let now         = Utc::now();
    let at_str      = encode_dt(now);
    let section_id  = input.section_id.0;
    let parent_id   = input.parent_id.map(|p| p.0);
    let text        = input.text.clone();
    let kind        = input.kind.as_str();
    let options     = encode_json(input.options.as_ref());
    let condition   = encode_json(input.condition.as_ref());
    let order_index = input.order_index;
    let is_required = input.is_required;
    let notes       = input.notes.clone();

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO questions (
             section_id, parent_id, text, type, options, condition,
             order_index, is_required, notes, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
          rusqlite::params![
            section_id,
            parent_id,
            text,
            kind,
            options,
            condition,
            order_index,
            is_required,
            notes,
            at_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    self.notify(Table::Questions, ChangeKind::Insert);
    Ok(Question {
      id:          QuestionId(id),
      section_id:  input.section_id,
      parent_id:   input.parent_id,
      text:        input.text,
      kind:        input.kind,
      options:     input.options,
      condition:   input.condition,
      order_index: input.order_index,
      is_required: input.is_required,
      notes:       input.notes,
      created_at:  now,
      updated_at:  now,
    })
  }

  async fn update_question(
    &self,
    id: QuestionId,
    patch: QuestionPatch,
  ) -> Result<Question> {
    let assignments = question_assignments(&patch);
    let at_str = encode_dt(Utc::now());

    let raw = self
      .conn
      .call(move |conn| {
        Ok(update_row(
          conn,
          "questions",
          QUESTION_COLUMNS,
          id.0,
          assignments,
          at_str,
          RawQuestion::from_row,
        )?)
      })
      .await?
      .ok_or(Error::QuestionNotFound(id))?;

    let question = raw.into_question()?;
    self.notify(Table::Questions, ChangeKind::Update);
    Ok(question)
  }

  async fn delete_questions(&self, ids: &[QuestionId]) -> Result<()> {
    if ids.is_empty() {
      return Ok(());
    }
    let raw_ids: Vec<i64> = ids.iter().map(|id| id.0).collect();

    let changed = self
      .conn
      .call(move |conn| {
        let placeholders = vec!["?"; raw_ids.len()].join(", ");
        Ok(conn.execute(
          &format!("DELETE FROM questions WHERE id IN ({placeholders})"),
          rusqlite::params_from_iter(raw_ids.iter()),
        )?)
      })
      .await?;

    if changed > 0 {
      self.notify(Table::Questions, ChangeKind::Delete);
    }
    Ok(())
  }

  async fn move_subtree(
    &self,
    ids: &[QuestionId],
    parent_id: Option<QuestionId>,
    section_id: SectionId,
  ) -> Result<()> {
    let Some((&root, descendants)) = ids.split_first() else {
      return Ok(());
    };
    let descendants: Vec<i64> = descendants.iter().map(|id| id.0).collect();
    let parent = parent_id.map(|p| p.0);
    let section = section_id.0;
    let at_str = encode_dt(Utc::now());

    let moved = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "UPDATE questions SET section_id = ?1, updated_at = ?2 WHERE id = ?3",
          )?;
          for id in &descendants {
            stmt.execute(rusqlite::params![section, at_str, id])?;
          }
        }
        let changed = tx.execute(
          "UPDATE questions
              SET parent_id = ?1, section_id = ?2, updated_at = ?3
            WHERE id = ?4",
          rusqlite::params![parent, section, at_str, root.0],
        )?;
        // Dropping `tx` without committing rolls the descendants back.
        if changed == 0 {
          return Ok(false);
        }
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !moved {
      return Err(Error::QuestionNotFound(root));
    }
    self.notify(Table::Questions, ChangeKind::Update);
    Ok(())
  }

  // ── Change feed ───────────────────────────────────────────────────────────

  fn changes(&self) -> broadcast::Receiver<ChangeEvent> { self.changes.subscribe() }
}
