//! Validation Engine
//!
//! Table-driven checks over parsed lines, kept apart from parsing.

pub mod engine;

pub use engine::{
    validate_document, validate_line, validate_program, Diagnostic, Severity, ValidationResult,
};
