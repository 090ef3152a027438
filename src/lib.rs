//! RS-274 (G-code) toolkit
//!
//! This library provides:
//! - A lexer and parser turning G-code lines into an owned AST
//! - Canonical stringification and numeric evaluation of that AST
//! - Flavor-based configuration tables (G-codes, letters, modal groups,
//!   execution order, default parameters)
//! - A machine facade and validation engine built on those tables

pub mod ast;
pub mod config;
pub mod error;
pub mod flavor;
pub mod machine;
pub mod parser;
pub mod validation;

pub use ast::{
    BinaryOperator, Comment, Line, LineItem, Number, ParameterIndex, ParameterResolver,
    ParameterSetting, Program, RealValue, UnaryOperator, Word,
};
pub use config::Config;
pub use error::{
    ConfigLoadError, Error, EvaluationError, LexicalError, ParseError, ValidationError,
};
pub use flavor::{Flavor, FlavorRegistry};
pub use machine::{Annotation, Machine};
pub use parser::{parse_line, parse_lines, parse_program, parse_real_value, Parser};
pub use validation::{validate_document, validate_line, Diagnostic};
