//! Core types and tree logic for the Questree questionnaire editor.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the data model, the pure tree/condition functions, and the
//! [`backend::QuestionnaireBackend`] abstraction every storage crate
//! implements.

pub mod backend;
pub mod condition;
pub mod error;
pub mod mutate;
pub mod patch;
pub mod question;
pub mod section;
pub mod tree;

pub use error::{Error, Result};

#[cfg(test)]
mod tests;
