//! Tests for the tree builder, validation, and tree mutator.

use chrono::{TimeZone, Utc};

use crate::{
  Error,
  mutate::{find, flatten, remove, update},
  question::{Question, QuestionId, QuestionNode, QuestionType},
  section::{Section, SectionId},
  tree::{build_question_tree, build_tree, build_tree_checked, descendant_ids, validate},
};

fn section(id: i64, order_index: i64, name: &str) -> Section {
  let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
  Section {
    id: SectionId(id),
    name: name.into(),
    description: None,
    order_index,
    created_at: at,
    updated_at: at,
  }
}

fn question(id: i64, parent: Option<i64>, order_index: i64) -> Question {
  question_in(1, id, parent, order_index)
}

fn question_in(
  section_id: i64,
  id: i64,
  parent: Option<i64>,
  order_index: i64,
) -> Question {
  let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
  Question {
    id: QuestionId(id),
    section_id: SectionId(section_id),
    parent_id: parent.map(QuestionId),
    text: format!("question {id}"),
    kind: QuestionType::Text,
    options: None,
    condition: None,
    order_index,
    is_required: false,
    notes: None,
    created_at: at,
    updated_at: at,
  }
}

fn ids(nodes: &[QuestionNode]) -> Vec<i64> {
  nodes.iter().map(|n| n.id().0).collect()
}

/// The three-question scenario: 10 ⊃ 11, then 12.
fn scenario() -> Vec<Question> {
  vec![
    question(10, None, 0),
    question(11, Some(10), 0),
    question(12, None, 1),
  ]
}

/// A deeper forest used by the property-style tests.
fn forest() -> Vec<Question> {
  vec![
    question(5, Some(2), 1),
    question(1, None, 0),
    question(2, Some(1), 0),
    question(3, Some(1), 1),
    question(4, Some(2), 0),
    question(6, None, 1),
    question(7, Some(6), 0),
    question(8, Some(4), 0),
  ]
}

// ─── Builder ─────────────────────────────────────────────────────────────────

#[test]
fn sections_are_ordered_by_order_index() {
  let sections = vec![section(1, 1, "B"), section(2, 0, "A")];
  let tree = build_tree(&sections, &[]);
  let names: Vec<_> = tree.iter().map(|s| s.section.name.as_str()).collect();
  assert_eq!(names, ["A", "B"]);
}

#[test]
fn nested_scenario_builds_expected_shape() {
  let tree = build_question_tree(&scenario(), None);

  assert_eq!(ids(&tree), [10, 12]);
  assert_eq!(ids(&tree[0].children), [11]);
  assert!(tree[0].children[0].children.is_empty());
  assert!(tree[1].children.is_empty());
}

#[test]
fn siblings_sort_by_order_index_and_ties_keep_input_order() {
  let questions = vec![
    question(1, None, 2),
    question(2, None, 1),
    question(3, None, 1),
    question(4, None, 0),
  ];
  let tree = build_question_tree(&questions, None);
  assert_eq!(ids(&tree), [4, 2, 3, 1]);
}

#[test]
fn sections_only_receive_their_own_root_questions() {
  let sections = vec![section(1, 0, "A"), section(2, 1, "B")];
  let questions = vec![
    question_in(1, 1, None, 0),
    question_in(2, 2, None, 0),
    question_in(2, 3, Some(2), 0),
  ];

  let tree = build_tree(&sections, &questions);
  assert_eq!(ids(&tree[0].questions), [1]);
  assert_eq!(ids(&tree[1].questions), [2]);
  assert_eq!(ids(&tree[1].questions[0].children), [3]);
}

#[test]
fn subtree_below_a_given_parent() {
  let tree = build_question_tree(&forest(), Some(QuestionId(2)));
  assert_eq!(ids(&tree), [4, 5]);
  assert_eq!(ids(&tree[0].children), [8]);
}

#[test]
fn flatten_visits_every_question_once() {
  let questions = forest();
  let tree = build_question_tree(&questions, None);

  let mut seen: Vec<i64> = flatten(&tree).iter().map(|n| n.id().0).collect();
  assert_eq!(seen, [1, 2, 4, 8, 5, 3, 6, 7]);

  seen.sort_unstable();
  let mut expected: Vec<i64> = questions.iter().map(|q| q.id.0).collect();
  expected.sort_unstable();
  assert_eq!(seen, expected);
}

#[test]
fn cycles_and_dangling_parents_are_omitted_without_looping() {
  let questions = vec![
    question(1, None, 0),
    question(2, Some(3), 0),
    question(3, Some(2), 0),
    question(4, Some(99), 0),
    question(5, Some(5), 0),
  ];
  let tree = build_question_tree(&questions, None);
  assert_eq!(ids(&tree), [1]);
  assert!(tree[0].children.is_empty());
}

#[test]
fn duplicate_ids_do_not_recurse_forever() {
  let questions = vec![question(1, None, 0), question(1, Some(1), 0)];
  let tree = build_question_tree(&questions, None);
  assert_eq!(flatten(&tree).len(), 2);
}

// ─── Validation ──────────────────────────────────────────────────────────────

#[test]
fn well_formed_input_validates() {
  let sections = vec![section(1, 0, "A")];
  assert!(validate(&sections, &forest()).is_ok());
  let tree = build_tree_checked(&sections, &forest()).unwrap();
  assert_eq!(flatten(&tree[0].questions).len(), forest().len());
}

#[test]
fn validate_rejects_cycles() {
  let sections = vec![section(1, 0, "A")];
  let questions = vec![
    question(1, None, 0),
    question(2, Some(3), 0),
    question(3, Some(2), 0),
  ];
  assert_eq!(
    build_tree_checked(&sections, &questions).unwrap_err(),
    Error::ParentCycle(QuestionId(2))
  );
}

#[test]
fn validate_rejects_dangling_parent() {
  let sections = vec![section(1, 0, "A")];
  let questions = vec![question(1, Some(42), 0)];
  assert_eq!(
    validate(&sections, &questions).unwrap_err(),
    Error::DanglingParent { question: QuestionId(1), parent: QuestionId(42) }
  );
}

#[test]
fn validate_rejects_cross_section_parent() {
  let sections = vec![section(1, 0, "A"), section(2, 1, "B")];
  let questions = vec![question_in(1, 1, None, 0), question_in(2, 2, Some(1), 0)];
  assert!(matches!(
    validate(&sections, &questions),
    Err(Error::SectionMismatch { question: QuestionId(2), .. })
  ));
}

#[test]
fn validate_rejects_duplicates_and_unknown_sections() {
  let sections = vec![section(1, 0, "A")];
  assert_eq!(
    validate(&sections, &[question(1, None, 0), question(1, None, 1)]),
    Err(Error::DuplicateQuestion(QuestionId(1)))
  );
  assert!(matches!(
    validate(&sections, &[question_in(7, 1, None, 0)]),
    Err(Error::UnknownSection { .. })
  ));
}

// ─── Descendants ─────────────────────────────────────────────────────────────

#[test]
fn descendant_ids_include_the_whole_subtree() {
  assert_eq!(
    descendant_ids(&scenario(), QuestionId(10)),
    [QuestionId(10), QuestionId(11)]
  );
  assert_eq!(
    descendant_ids(&forest(), QuestionId(2)),
    [QuestionId(2), QuestionId(4), QuestionId(8), QuestionId(5)]
  );
}

#[test]
fn descendant_ids_of_unknown_id_is_empty() {
  assert!(descendant_ids(&forest(), QuestionId(404)).is_empty());
}

#[test]
fn descendant_ids_terminate_on_cycles() {
  let questions = vec![question(1, Some(2), 0), question(2, Some(1), 0)];
  assert_eq!(
    descendant_ids(&questions, QuestionId(1)),
    [QuestionId(1), QuestionId(2)]
  );
}

// ─── Mutator ─────────────────────────────────────────────────────────────────

#[test]
fn find_succeeds_exactly_for_present_ids() {
  let questions = forest();
  let tree = build_question_tree(&questions, None);

  for q in &questions {
    assert_eq!(find(&tree, q.id).map(QuestionNode::id), Some(q.id));
  }
  assert!(find(&tree, QuestionId(404)).is_none());
}

#[test]
fn update_replaces_fields_but_keeps_children() {
  let tree = build_question_tree(&forest(), None);
  let before = find(&tree, QuestionId(2)).unwrap().clone();

  let mut replacement = QuestionNode::leaf(before.question.clone());
  replacement.question.text = "edited".into();
  replacement.question.is_required = true;

  let updated = update(&tree, &replacement);
  let after = find(&updated, QuestionId(2)).unwrap();

  assert_eq!(after.question, replacement.question);
  assert_eq!(after.children, before.children);
  // The input tree is untouched.
  assert_eq!(find(&tree, QuestionId(2)).unwrap().question.text, "question 2");
}

#[test]
fn remove_drops_only_the_target_subtree() {
  let tree = build_question_tree(&forest(), None);

  let pruned = remove(&tree, QuestionId(4));
  assert!(find(&pruned, QuestionId(4)).is_none());
  assert!(find(&pruned, QuestionId(8)).is_none());

  // Sibling subtrees keep their size.
  let count = |t: &[QuestionNode], id| flatten(&find(t, id).unwrap().children).len();
  assert_eq!(count(&pruned, QuestionId(6)), count(&tree, QuestionId(6)));
  assert_eq!(count(&pruned, QuestionId(3)), count(&tree, QuestionId(3)));
  assert_eq!(ids(&find(&pruned, QuestionId(2)).unwrap().children), [5]);
}

#[test]
fn remove_root_question() {
  let tree = build_question_tree(&scenario(), None);
  let pruned = remove(&tree, QuestionId(10));
  assert_eq!(ids(&pruned), [12]);
}
