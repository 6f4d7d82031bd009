//! Tree Mutator: id-based lookups and edits on an already-built question
//! tree.
//!
//! None of these functions modify their input; edits return a fresh tree.

use crate::question::{QuestionId, QuestionNode};

/// Depth-first pre-order search for the first node with `id`.
pub fn find(tree: &[QuestionNode], id: QuestionId) -> Option<&QuestionNode> {
  tree.iter().find_map(|node| {
    if node.id() == id {
      Some(node)
    } else {
      find(&node.children, id)
    }
  })
}

/// Replace the fields of every node matching `updated`'s id.
///
/// The replaced node keeps its existing children; whatever children
/// `updated` carries are ignored, so callers can edit a node's own fields
/// without supplying its subtree.
pub fn update(tree: &[QuestionNode], updated: &QuestionNode) -> Vec<QuestionNode> {
  tree
    .iter()
    .map(|node| {
      if node.id() == updated.id() {
        QuestionNode {
          question: updated.question.clone(),
          children: node.children.clone(),
        }
      } else {
        QuestionNode {
          question: node.question.clone(),
          children: update(&node.children, updated),
        }
      }
    })
    .collect()
}

/// Remove every node with `id`, at any depth, together with its subtree.
pub fn remove(tree: &[QuestionNode], id: QuestionId) -> Vec<QuestionNode> {
  tree
    .iter()
    .filter(|node| node.id() != id)
    .map(|node| QuestionNode {
      question: node.question.clone(),
      children: remove(&node.children, id),
    })
    .collect()
}

/// Every node in pre-order: each parent immediately followed by its
/// flattened children.
pub fn flatten(tree: &[QuestionNode]) -> Vec<&QuestionNode> {
  fn walk<'a>(nodes: &'a [QuestionNode], out: &mut Vec<&'a QuestionNode>) {
    for node in nodes {
      out.push(node);
      walk(&node.children, out);
    }
  }

  let mut out = Vec::new();
  walk(tree, &mut out);
  out
}
