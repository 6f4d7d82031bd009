//! Tree Builder: turns flat section/question rows into nested trees.
//!
//! Questions are kept as a flat arena indexed by id; the nested
//! [`QuestionNode`] view is built on demand from a parent → children index
//! and never holds back-references.
//!
//! [`build_tree`] never fails: questions that cannot be reached from a
//! section root (dangling parents, parent cycles) are simply omitted, and no
//! record is ever placed twice, so malformed input always terminates.
//! [`build_tree_checked`] rejects such input instead.

use std::collections::{HashMap, HashSet};

use crate::{
  Error, Result,
  question::{Question, QuestionId, QuestionNode},
  section::{Section, SectionId, SectionWithQuestions},
};

// ─── Arena ───────────────────────────────────────────────────────────────────

/// Read-only index over a flat question slice.
#[derive(Debug)]
pub struct QuestionArena<'a> {
  questions: &'a [Question],
  /// First occurrence of each id.
  by_id:     HashMap<QuestionId, usize>,
  /// Sibling lists keyed by parent (`None` = root), stable-sorted by
  /// `order_index`.
  children:  HashMap<Option<QuestionId>, Vec<usize>>,
}

impl<'a> QuestionArena<'a> {
  pub fn new(questions: &'a [Question]) -> Self {
    let mut by_id = HashMap::with_capacity(questions.len());
    let mut children: HashMap<Option<QuestionId>, Vec<usize>> = HashMap::new();

    for (idx, question) in questions.iter().enumerate() {
      by_id.entry(question.id).or_insert(idx);
      children.entry(question.parent_id).or_default().push(idx);
    }
    for siblings in children.values_mut() {
      siblings.sort_by_key(|&idx| questions[idx].order_index);
    }

    Self { questions, by_id, children }
  }

  pub fn get(&self, id: QuestionId) -> Option<&'a Question> {
    self.by_id.get(&id).map(|&idx| &self.questions[idx])
  }

  /// Direct children of `parent` in sibling order.
  pub fn children_of(
    &self,
    parent: Option<QuestionId>,
  ) -> impl Iterator<Item = &'a Question> + '_ {
    let questions = self.questions;
    self
      .children
      .get(&parent)
      .into_iter()
      .flatten()
      .map(move |&idx| &questions[idx])
  }

  /// Build the subtree below `parent` across all sections.
  pub fn build(&self, parent: Option<QuestionId>) -> Vec<QuestionNode> {
    let mut placed = vec![false; self.questions.len()];
    self.expand(parent, None, &mut placed)
  }

  /// Build the root-level trees of one section. Children living in another
  /// section than their parent are not followed.
  pub fn build_section(&self, section_id: SectionId) -> Vec<QuestionNode> {
    let mut placed = vec![false; self.questions.len()];
    self.expand(None, Some(section_id), &mut placed)
  }

  fn expand(
    &self,
    parent: Option<QuestionId>,
    section: Option<SectionId>,
    placed: &mut [bool],
  ) -> Vec<QuestionNode> {
    let Some(siblings) = self.children.get(&parent) else {
      return Vec::new();
    };

    let mut nodes = Vec::with_capacity(siblings.len());
    for &idx in siblings {
      let question = &self.questions[idx];
      if placed[idx] || section.is_some_and(|s| question.section_id != s) {
        continue;
      }
      placed[idx] = true;
      let children = self.expand(Some(question.id), section, placed);
      nodes.push(QuestionNode { question: question.clone(), children });
    }
    nodes
  }

  /// `id` followed by every descendant, in pre-order. Empty if `id` is not in
  /// the arena.
  pub fn descendant_ids(&self, id: QuestionId) -> Vec<QuestionId> {
    if !self.by_id.contains_key(&id) {
      return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let mut stack = vec![id];
    while let Some(current) = stack.pop() {
      if !seen.insert(current) {
        continue;
      }
      out.push(current);
      let children: Vec<QuestionId> =
        self.children_of(Some(current)).map(|q| q.id).collect();
      // Reversed so the first sibling is popped next.
      stack.extend(children.into_iter().rev());
    }
    out
  }
}

// ─── Builders ────────────────────────────────────────────────────────────────

/// Build the nested tree of `questions` below `parent` (`None` = roots),
/// ordered by `order_index`, ties keeping input order.
pub fn build_question_tree(
  questions: &[Question],
  parent: Option<QuestionId>,
) -> Vec<QuestionNode> {
  QuestionArena::new(questions).build(parent)
}

/// Build the full questionnaire: sections ordered by `order_index`, each
/// carrying its root questions expanded recursively.
pub fn build_tree(
  sections: &[Section],
  questions: &[Question],
) -> Vec<SectionWithQuestions> {
  let arena = QuestionArena::new(questions);

  let mut ordered: Vec<&Section> = sections.iter().collect();
  ordered.sort_by_key(|s| s.order_index);

  ordered
    .into_iter()
    .map(|section| SectionWithQuestions {
      section:   section.clone(),
      questions: arena.build_section(section.id),
    })
    .collect()
}

/// [`build_tree`] after [`validate`]; fails fast on malformed input.
pub fn build_tree_checked(
  sections: &[Section],
  questions: &[Question],
) -> Result<Vec<SectionWithQuestions>> {
  validate(sections, questions)?;
  Ok(build_tree(sections, questions))
}

/// `id` and all of its descendants in pre-order.
pub fn descendant_ids(questions: &[Question], id: QuestionId) -> Vec<QuestionId> {
  QuestionArena::new(questions).descendant_ids(id)
}

// ─── Validation ──────────────────────────────────────────────────────────────

/// Check that the flat collection forms a well-shaped forest.
///
/// Reports, in this order of precedence: duplicate ids, unknown sections,
/// dangling parents, parents in another section, and parent cycles.
pub fn validate(sections: &[Section], questions: &[Question]) -> Result<()> {
  let mut ids = HashSet::with_capacity(questions.len());
  for question in questions {
    if !ids.insert(question.id) {
      return Err(Error::DuplicateQuestion(question.id));
    }
  }

  let section_ids: HashSet<SectionId> = sections.iter().map(|s| s.id).collect();
  let arena = QuestionArena::new(questions);

  for question in questions {
    if !section_ids.contains(&question.section_id) {
      return Err(Error::UnknownSection {
        question: question.id,
        section:  question.section_id,
      });
    }

    let Some(parent_id) = question.parent_id else {
      continue;
    };
    let Some(parent) = arena.get(parent_id) else {
      return Err(Error::DanglingParent {
        question: question.id,
        parent:   parent_id,
      });
    };
    if parent.section_id != question.section_id {
      return Err(Error::SectionMismatch {
        question:       question.id,
        section:        question.section_id,
        parent:         parent_id,
        parent_section: parent.section_id,
      });
    }
  }

  // With every parent present and unique, anything the root walk cannot reach
  // sits on a parent cycle.
  let mut placed = vec![false; questions.len()];
  arena.expand(None, None, &mut placed);
  if let Some(idx) = placed.iter().position(|p| !p) {
    return Err(Error::ParentCycle(questions[idx].id));
  }

  Ok(())
}
