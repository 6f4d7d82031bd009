//! The snapshot published by [`crate::QuestionnaireStore`].

use questree_core::{
  question::{Question, QuestionId, QuestionNode},
  section::{Section, SectionId, SectionWithQuestions},
  tree::{build_tree, build_tree_checked},
};

/// What the question editor is currently doing with the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
  Create,
  Edit,
}

/// Everything an observer needs to render the editor.
///
/// Each change produces a new value; observers never see a partially-applied
/// update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionnaireState {
  pub sections:  Vec<Section>,
  pub questions: Vec<Question>,
  pub loading:   bool,
  /// Message of the last failed load, cleared when a new load starts.
  pub error:     Option<String>,
  pub selected:  Option<QuestionNode>,
  pub edit_mode: Option<EditMode>,
}

impl QuestionnaireState {
  /// The nested questionnaire for this snapshot. Unreachable questions are
  /// left out.
  pub fn tree(&self) -> Vec<SectionWithQuestions> {
    build_tree(&self.sections, &self.questions)
  }

  /// Like [`Self::tree`] but fails on dangling parents, cycles, and other
  /// structural damage.
  pub fn tree_checked(&self) -> questree_core::Result<Vec<SectionWithQuestions>> {
    build_tree_checked(&self.sections, &self.questions)
  }

  pub fn section(&self, id: SectionId) -> Option<&Section> {
    self.sections.iter().find(|s| s.id == id)
  }

  pub fn question(&self, id: QuestionId) -> Option<&Question> {
    self.questions.iter().find(|q| q.id == id)
  }

  /// Insert `section`, replacing a cached record with the same id.
  pub(crate) fn put_section(&mut self, section: Section) {
    match self.sections.iter_mut().find(|s| s.id == section.id) {
      Some(slot) => *slot = section,
      None => self.sections.push(section),
    }
  }

  /// Insert `question`, replacing a cached record with the same id.
  pub(crate) fn put_question(&mut self, question: Question) {
    match self.questions.iter_mut().find(|q| q.id == question.id) {
      Some(slot) => *slot = question,
      None => self.questions.push(question),
    }
  }
}
