//! Flash-card quiz domain.
//!
//! The handlers here sit behind the dispatch core; the only piece with any
//! branching complexity is the arithmetic evaluator that replaces dynamic
//! evaluation of question expressions.

pub mod arith;
pub mod handlers;

pub use handlers::{routes, QuizService, DEFAULT_QUESTION_BANK};
