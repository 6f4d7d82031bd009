//! [`QuestionnaireStore`]: the stateful editing façade over a backend.

use std::sync::Arc;

use tokio::{
  sync::{
    broadcast::error::{RecvError, TryRecvError},
    watch,
  },
  task::JoinHandle,
};
use tracing::{debug, info, instrument, warn};

use questree_core::{
  backend::QuestionnaireBackend,
  patch::{QuestionPatch, SectionPatch},
  question::{NewQuestion, Question, QuestionId, QuestionNode},
  section::{NewSection, Section, SectionId, SectionWithQuestions},
  tree::descendant_ids,
};

use crate::{EditMode, Error, QuestionnaireState, Result};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Caches sections and questions from a [`QuestionnaireBackend`] and keeps
/// that cache consistent with every write it performs.
///
/// The cache is only changed after the backend confirms a write. Each change
/// replaces the whole [`QuestionnaireState`] in one step and notifies every
/// receiver obtained from [`Self::watch`].
///
/// Cloning is cheap; clones share the backend and the state.
pub struct QuestionnaireStore<B> {
  backend: Arc<B>,
  state:   Arc<watch::Sender<QuestionnaireState>>,
}

impl<B> Clone for QuestionnaireStore<B> {
  fn clone(&self) -> Self {
    Self {
      backend: Arc::clone(&self.backend),
      state:   Arc::clone(&self.state),
    }
  }
}

impl<B: QuestionnaireBackend> QuestionnaireStore<B> {
  /// Wrap `backend` with an empty cache. Call [`Self::load`] to populate it.
  pub fn new(backend: B) -> Self {
    let (state, _) = watch::channel(QuestionnaireState::default());
    Self { backend: Arc::new(backend), state: Arc::new(state) }
  }

  pub fn backend(&self) -> &B { &self.backend }

  // ── Observation ───────────────────────────────────────────────────────

  /// A receiver that is notified after every state change.
  pub fn watch(&self) -> watch::Receiver<QuestionnaireState> {
    self.state.subscribe()
  }

  /// A copy of the current state.
  pub fn snapshot(&self) -> QuestionnaireState { self.state.borrow().clone() }

  /// The nested questionnaire derived from the current state.
  pub fn tree(&self) -> Vec<SectionWithQuestions> { self.state.borrow().tree() }

  // ── Loading ───────────────────────────────────────────────────────────

  /// Replace the cache with the backend's current sections and questions.
  ///
  /// Both collections are fetched concurrently. If either request fails the
  /// previous cache is kept, `error` records the failure, and the error is
  /// returned.
  #[instrument(skip(self))]
  pub async fn load(&self) -> Result<()> {
    self.state.send_modify(|s| {
      s.loading = true;
      s.error = None;
    });

    let fetched = tokio::try_join!(
      self.backend.list_sections(),
      self.backend.list_questions(),
    );

    match fetched {
      Ok((sections, questions)) => {
        debug!(
          sections = sections.len(),
          questions = questions.len(),
          "questionnaire loaded"
        );
        self.state.send_modify(|s| {
          s.sections = sections;
          s.questions = questions;
          s.loading = false;
        });
        Ok(())
      }
      Err(e) => {
        warn!(error = %e, "failed to load questionnaire");
        let message = e.to_string();
        self.state.send_modify(|s| {
          s.loading = false;
          s.error = Some(message);
        });
        Err(Error::backend(e))
      }
    }
  }

  // ── Sections ──────────────────────────────────────────────────────────

  /// Create a section after every existing one.
  #[instrument(skip(self, description))]
  pub async fn create_section(
    &self,
    name: String,
    description: Option<String>,
  ) -> Result<Section> {
    let order_index = self
      .backend
      .max_section_order()
      .await
      .map_err(Error::backend)?
      .map_or(0, |max| max + 1);

    let section = self
      .backend
      .insert_section(NewSection { name, description, order_index })
      .await
      .map_err(Error::backend)?;

    info!(id = %section.id, order_index, "section created");
    self.state.send_modify(|s| s.put_section(section.clone()));
    Ok(section)
  }

  #[instrument(skip(self, patch))]
  pub async fn update_section(
    &self,
    id: SectionId,
    patch: SectionPatch,
  ) -> Result<Section> {
    let section = self
      .backend
      .update_section(id, patch)
      .await
      .map_err(Error::backend)?;

    self.state.send_modify(|s| s.put_section(section.clone()));
    Ok(section)
  }

  /// Delete a section and drop its questions from the cache, whatever the
  /// backend does with them.
  #[instrument(skip(self))]
  pub async fn delete_section(&self, id: SectionId) -> Result<()> {
    self.backend.delete_section(id).await.map_err(Error::backend)?;

    info!("section deleted");
    self.state.send_modify(|s| {
      s.sections.retain(|section| section.id != id);
      s.questions.retain(|question| question.section_id != id);
    });
    Ok(())
  }

  /// Give the sections in `ordered_ids` the positions 0..n in one batch, then
  /// reload.
  #[instrument(skip(self))]
  pub async fn reorder_sections(&self, ordered_ids: &[SectionId]) -> Result<()> {
    let order: Vec<(SectionId, i64)> = ordered_ids
      .iter()
      .zip(0..)
      .map(|(id, idx)| (*id, idx))
      .collect();
    self
      .backend
      .reorder_sections(&order)
      .await
      .map_err(Error::backend)?;
    self.load().await
  }

  // ── Questions ─────────────────────────────────────────────────────────

  /// Create a question and close the editor.
  #[instrument(skip(self, input), fields(section_id = %input.section_id))]
  pub async fn create_question(&self, input: NewQuestion) -> Result<Question> {
    let question = self
      .backend
      .insert_question(input)
      .await
      .map_err(Error::backend)?;

    info!(id = %question.id, "question created");
    self.state.send_modify(|s| {
      s.put_question(question.clone());
      s.selected = None;
      s.edit_mode = None;
    });
    Ok(question)
  }

  /// Apply a partial update and close the editor.
  ///
  /// A patch that touches `parent_id` or `section_id` is checked like
  /// [`Self::move_question`]; the placement is written first as one atomic
  /// subtree move, then the remaining fields, and the cache is reloaded.
  #[instrument(skip(self, patch))]
  pub async fn update_question(
    &self,
    id: QuestionId,
    mut patch: QuestionPatch,
  ) -> Result<Question> {
    let moved = patch.moves();
    if moved {
      let (parent, section, subtree) =
        self.plan_move(id, patch.parent_id.take(), patch.section_id.take())?;
      self
        .backend
        .move_subtree(&subtree, parent, section)
        .await
        .map_err(Error::backend)?;
    }

    let question = match self.backend.update_question(id, patch).await {
      Ok(question) => question,
      Err(e) => {
        if moved {
          // The move is committed; bring the cache in line with it.
          let _ = self.load().await;
        }
        return Err(Error::backend(e));
      }
    };

    self.state.send_modify(|s| {
      s.put_question(question.clone());
      s.selected = None;
      s.edit_mode = None;
    });
    if moved {
      self.load().await?;
    }
    Ok(question)
  }

  /// Delete a question together with every descendant in one batch.
  ///
  /// Returns the ids that were deleted, parent first.
  #[instrument(skip(self))]
  pub async fn delete_question(&self, id: QuestionId) -> Result<Vec<QuestionId>> {
    let mut ids = descendant_ids(&self.state.borrow().questions, id);
    if ids.is_empty() {
      ids.push(id);
    }

    self
      .backend
      .delete_questions(&ids)
      .await
      .map_err(Error::backend)?;

    info!(count = ids.len(), "question subtree deleted");
    self.state.send_modify(|s| {
      s.questions.retain(|q| !ids.contains(&q.id));
      s.selected = None;
    });
    Ok(ids)
  }

  /// Give the questions in `ordered_ids` the sibling positions 0..n, one
  /// request at a time, then reload.
  ///
  /// Stops at the first failed write; positions written before it stay.
  #[instrument(skip(self, ordered_ids), fields(count = ordered_ids.len()))]
  pub async fn reorder_questions(
    &self,
    section_id: SectionId,
    ordered_ids: &[QuestionId],
  ) -> Result<()> {
    for (id, order_index) in ordered_ids.iter().zip(0..) {
      self
        .backend
        .update_question(*id, QuestionPatch::order(order_index))
        .await
        .map_err(Error::backend)?;
    }
    self.load().await
  }

  /// Move a question under `new_parent` (or to the root) of `new_section`,
  /// then reload.
  ///
  /// Descendants follow the question into the new section in the same
  /// backend request, so a failure leaves the stored tree as it was.
  #[instrument(skip(self))]
  pub async fn move_question(
    &self,
    id: QuestionId,
    new_parent: Option<QuestionId>,
    new_section: SectionId,
  ) -> Result<()> {
    let (parent, section, subtree) =
      self.plan_move(id, Some(new_parent), Some(new_section))?;

    self
      .backend
      .move_subtree(&subtree, parent, section)
      .await
      .map_err(Error::backend)?;

    info!(moved = subtree.len(), "question moved");
    self.load().await
  }

  /// Resolve a placement change for `id` against the cache. Unset parts keep
  /// the question's current value.
  ///
  /// Rejects a parent that is the question itself or one of its descendants,
  /// a parent that is not cached, and a parent in another section. Returns
  /// the target parent, the target section and the subtree rooted at `id`,
  /// root first.
  fn plan_move(
    &self,
    id: QuestionId,
    new_parent: Option<Option<QuestionId>>,
    new_section: Option<SectionId>,
  ) -> Result<(Option<QuestionId>, SectionId, Vec<QuestionId>)> {
    let state = self.state.borrow();
    let current = state.question(id).ok_or(Error::QuestionNotFound(id))?;
    let parent = new_parent.unwrap_or(current.parent_id);
    let section = new_section.unwrap_or(current.section_id);
    let subtree = descendant_ids(&state.questions, id);

    if let Some(parent) = parent {
      let invalid = |reason: String| Error::InvalidMove { question: id, reason };
      if subtree.contains(&parent) {
        return Err(invalid(format!(
          "{parent} is the question itself or a descendant"
        )));
      }
      match state.question(parent) {
        None => return Err(invalid(format!("parent {parent} does not exist"))),
        Some(p) if p.section_id != section => {
          return Err(invalid(format!(
            "parent {parent} belongs to section {}",
            p.section_id
          )));
        }
        Some(_) => {}
      }
    }
    Ok((parent, section, subtree))
  }

  // ── Selection ─────────────────────────────────────────────────────────

  /// Select a question for the editor. Purely local.
  pub fn select_question(&self, node: Option<QuestionNode>, mode: Option<EditMode>) {
    self.state.send_modify(|s| {
      s.selected = node;
      s.edit_mode = mode;
    });
  }
}

// ─── Change subscription ─────────────────────────────────────────────────────

impl<B> QuestionnaireStore<B>
where
  B: QuestionnaireBackend + 'static,
{
  /// Reload the cache whenever the backend reports a change, from any
  /// client.
  ///
  /// Events that pile up while a reload is running are folded into the next
  /// reload. The returned handle must be kept alive; call
  /// [`ChangeSubscription::unsubscribe`] (or drop it) to stop listening.
  pub fn subscribe_to_changes(&self) -> ChangeSubscription {
    let mut feed = self.backend.changes();
    let store = self.clone();

    let task = tokio::spawn(async move {
      loop {
        match feed.recv().await {
          Ok(event) => debug!(?event, "backend changed"),
          Err(RecvError::Lagged(skipped)) => {
            debug!(skipped, "change feed lagged");
          }
          Err(RecvError::Closed) => break,
        }
        // Everything queued so far is covered by the reload below.
        loop {
          match feed.try_recv() {
            Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
          }
        }

        if let Err(e) = store.load().await {
          warn!(error = %e, "reload after change failed");
        }
      }
      debug!("change feed closed");
    });

    ChangeSubscription { task }
  }
}

/// Handle for a running [`QuestionnaireStore::subscribe_to_changes`]
/// listener.
#[derive(Debug)]
pub struct ChangeSubscription {
  task: JoinHandle<()>,
}

impl ChangeSubscription {
  /// Stop listening for changes.
  pub fn unsubscribe(self) { self.task.abort(); }

  pub fn is_active(&self) -> bool { !self.task.is_finished() }
}

impl Drop for ChangeSubscription {
  fn drop(&mut self) { self.task.abort(); }
}
