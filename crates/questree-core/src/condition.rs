//! Condition Evaluator: decides whether a question is shown given the answer
//! to its direct parent.
//!
//! Conditions are stored as free-form JSON. Two shapes are understood:
//!
//! ```json
//! { "parent_value": "yes", "action": "show" }
//! { "if": { "parent_value": "yes" }, "then": "show" }
//! ```
//!
//! Anything else (including a missing or empty `parent_value`) is treated as
//! "always visible"; evaluation never fails.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::question::{QuestionId, QuestionNode};

/// What to do when the parent answer matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionAction {
  #[default]
  Show,
  Hide,
}

/// A parsed display condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
  /// `{ parent_value, action }`: hidden on match only when `action` is
  /// `"hide"`.
  Direct {
    parent_value: Value,
    action:       ConditionAction,
  },
  /// `{ if: { parent_value }, then }`: shown on match only when `then` is
  /// `"show"`.
  Branch {
    parent_value: Value,
    then:         ConditionAction,
  },
}

impl Condition {
  /// Shown only when the parent answer equals `value`.
  pub fn show_when(value: impl Into<String>) -> Self {
    Self::Direct {
      parent_value: Value::String(value.into()),
      action:       ConditionAction::Show,
    }
  }

  /// Hidden when the parent answer equals `value`.
  pub fn hide_when(value: impl Into<String>) -> Self {
    Self::Direct {
      parent_value: Value::String(value.into()),
      action:       ConditionAction::Hide,
    }
  }

  /// Recognise one of the supported shapes. Returns `None` for anything that
  /// should not restrict visibility.
  pub fn parse(raw: &Value) -> Option<Self> {
    if let Some(parent_value) = raw.get("parent_value").filter(|v| is_truthy(v)) {
      let action = match raw.get("action").and_then(Value::as_str) {
        Some("hide") => ConditionAction::Hide,
        _ => ConditionAction::Show,
      };
      return Some(Self::Direct { parent_value: parent_value.clone(), action });
    }

    let parent_value = raw
      .get("if")
      .and_then(|branch| branch.get("parent_value"))
      .filter(|v| is_truthy(v))?;
    let then = match raw.get("then").and_then(Value::as_str) {
      Some("show") => ConditionAction::Show,
      _ => ConditionAction::Hide,
    };
    Some(Self::Branch { parent_value: parent_value.clone(), then })
  }

  /// Whether the guarded question is visible for `parent_answer`.
  pub fn is_visible(&self, parent_answer: Option<&str>) -> bool {
    let (expected, on_match) = match self {
      Self::Direct { parent_value, action } => (parent_value, *action),
      Self::Branch { parent_value, then } => (parent_value, *then),
    };
    let matches = matches!(
      (expected, parent_answer),
      (Value::String(expected), Some(answer)) if expected == answer
    );
    match on_match {
      ConditionAction::Show => matches,
      ConditionAction::Hide => !matches,
    }
  }

  /// The JSON payload to store in a question's `condition` column. Branch
  /// conditions are normalised to the direct shape.
  pub fn into_value(self) -> Value {
    let (parent_value, action) = match self {
      Self::Direct { parent_value, action } => (parent_value, action),
      Self::Branch { parent_value, then } => (parent_value, then),
    };
    serde_json::json!({ "parent_value": parent_value, "action": action })
  }
}

/// JavaScript-style truthiness, which is what stored conditions were written
/// against.
fn is_truthy(value: &Value) -> bool {
  match value {
    Value::Null => false,
    Value::Bool(b) => *b,
    Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
    Value::String(s) => !s.is_empty(),
    Value::Array(_) | Value::Object(_) => true,
  }
}

/// Decide whether a question with `condition` is visible, given the answer to
/// its parent.
pub fn evaluate(condition: Option<&Value>, parent_answer: Option<&str>) -> bool {
  condition
    .and_then(Condition::parse)
    .is_none_or(|c| c.is_visible(parent_answer))
}

/// Walk `tree` and return every question visible under `answers`.
///
/// Roots are evaluated against no parent answer; a hidden question hides its
/// whole subtree. Output is in pre-order.
pub fn visible_questions<'a>(
  tree: &'a [QuestionNode],
  answers: &HashMap<QuestionId, String>,
) -> Vec<&'a QuestionNode> {
  fn walk<'a>(
    nodes: &'a [QuestionNode],
    parent_answer: Option<&str>,
    answers: &HashMap<QuestionId, String>,
    out: &mut Vec<&'a QuestionNode>,
  ) {
    for node in nodes {
      if !evaluate(node.question.condition.as_ref(), parent_answer) {
        continue;
      }
      out.push(node);
      let answer = answers.get(&node.id()).map(String::as_str);
      walk(&node.children, answer, answers, out);
    }
  }

  let mut out = Vec::new();
  walk(tree, None, answers, &mut out);
  out
}
