//! Error types for `questree-core`.

use thiserror::Error;

use crate::{question::QuestionId, section::SectionId};

/// Errors raised by the core model.
///
/// Most variants describe structural problems in a flat section/question
/// collection. Only the checked tree functions ([`crate::tree::validate`] and
/// [`crate::tree::build_tree_checked`]) produce those; the plain builder
/// tolerates bad input by omitting unreachable questions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("question id {0} appears more than once")]
  DuplicateQuestion(QuestionId),

  #[error("question {question} references missing parent {parent}")]
  DanglingParent {
    question: QuestionId,
    parent:   QuestionId,
  },

  #[error(
    "question {question} is in section {section} but its parent {parent} is \
     in section {parent_section}"
  )]
  SectionMismatch {
    question:       QuestionId,
    section:        SectionId,
    parent:         QuestionId,
    parent_section: SectionId,
  },

  #[error("question {0} is part of a parent cycle")]
  ParentCycle(QuestionId),

  #[error("unknown question type: {0:?}")]
  UnknownQuestionType(String),

  #[error("question {question} references unknown section {section}")]
  UnknownSection {
    question: QuestionId,
    section:  SectionId,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
