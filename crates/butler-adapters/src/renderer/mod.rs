//! Expression engine adapters.
//!
//! The marker language is intentionally small: field access, literals,
//! function calls and pipelines. No control flow.

mod lexer;
mod marker;
mod parser;

pub use marker::MarkerEngine;
