//! Error types
//!
//! One enum per failure domain, plus the umbrella [`Error`] returned by the
//! parsing entry points. Positions are zero-based character offsets within
//! the line being processed.

use thiserror::Error;

/// Failure to split a line into tokens
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexicalError {
    #[error("unexpected character '{character}' at position {position}")]
    UnexpectedCharacter { position: usize, character: char },

    #[error("comments cannot be nested, found '(' at position {position}")]
    NestedComment { position: usize },

    #[error("comment opened at position {position} is not closed")]
    UnterminatedComment { position: usize },

    #[error("parameter name opened at position {position} is not closed")]
    UnterminatedName { position: usize },
}

impl LexicalError {
    pub fn position(&self) -> usize {
        match self {
            LexicalError::UnexpectedCharacter { position, .. }
            | LexicalError::NestedComment { position }
            | LexicalError::UnterminatedComment { position }
            | LexicalError::UnterminatedName { position } => *position,
        }
    }
}

/// A token sequence that does not reduce to a line
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unexpected {found} at position {position}, expected {expected}")]
    UnexpectedToken {
        position: usize,
        found: String,
        expected: &'static str,
    },

    #[error("unexpected end of line at position {position}, expected {expected}")]
    UnexpectedEnd {
        position: usize,
        expected: &'static str,
    },
}

impl ParseError {
    pub fn position(&self) -> usize {
        match self {
            ParseError::UnexpectedToken { position, .. }
            | ParseError::UnexpectedEnd { position, .. } => *position,
        }
    }
}

/// Construction-time rejection of an AST node
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("'{0}' is not a valid word letter")]
    InvalidLetter(char),

    #[error("comment cannot contain a nested parenthesis: {0:?}")]
    CommentContainsParenthesis(String),

    #[error("{0} is not a valid parameter index")]
    InvalidParameterIndex(f64),

    #[error("'{0}' is not a valid parameter name")]
    InvalidParameterName(String),

    #[error("line number must be a non-negative number, got {0}")]
    InvalidLineNumber(f64),
}

/// Failure to turn an expression tree into a number
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("parameter #{0} cannot be resolved without a machine context")]
    UnresolvedParameter(String),

    #[error("parameter #{0} has no value")]
    UnknownParameter(String),

    #[error("division by zero in {0}")]
    DivisionByZero(&'static str),

    #[error("{operation}[{argument}] is undefined")]
    Domain {
        operation: &'static str,
        argument: f64,
    },
}

/// Inconsistent configuration tables
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("execution order index {found} is out of sequence, expected {expected}")]
    UnexpectedIndex { found: u32, expected: u32 },

    #[error("{table} references unknown G-code '{code}'")]
    UnknownGcode { table: String, code: String },

    #[error("invalid range '{0}': start is after stop")]
    InvalidRange(String),

    #[error("malformed range '{0}'")]
    MalformedRange(String),

    #[error("duplicate {table} entry '{key}'")]
    DuplicateEntry { table: &'static str, key: String },

    #[error("G-code '{code}' already belongs to {table} {existing}")]
    AlreadyAssigned {
        code: String,
        table: &'static str,
        existing: String,
    },

    #[error("{table} {key} has no entries")]
    MissingEntry { table: &'static str, key: String },

    #[error("'{0}' is not a valid G-code")]
    InvalidCode(String),

    #[error("'{0}' is not a valid letter")]
    InvalidLetter(String),

    #[error("failed to parse flavor TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Umbrella error of the parsing entry points
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Lexical(#[from] LexicalError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    /// A line of a batch failed; carries the 1-based line number and text
    #[error("line {number}: {source}\n  {text}")]
    Line {
        number: usize,
        text: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Character offset of the failure within its line, when known
    pub fn position(&self) -> Option<usize> {
        match self {
            Error::Lexical(e) => Some(e.position()),
            Error::Parse(e) => Some(e.position()),
            Error::Line { source, .. } => source.position(),
            Error::Validation(_) | Error::Evaluation(_) => None,
        }
    }
}
