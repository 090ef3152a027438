//! Validation Engine
//!
//! Checks that need the configuration tables: conflicting modal codes,
//! repeated words and codes the flavor does not know. Findings are
//! diagnostics, not errors; a line with diagnostics still parses.

use std::collections::{HashMap, HashSet};

use crate::ast::{Line, Program};
use crate::flavor::{Flavor, GroupKind, ModalGroupId};
use crate::parser::Parser;

/// Most M words allowed on one line
pub const MAX_M_WORDS: usize = 4;

/// Severity of a diagnostic message
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Error,
    Warning,
}

/// A diagnostic message for a validation issue
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub line: usize,
    pub message: String,
    pub severity: Severity,
}

/// Result of validating a document or line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, line: usize, message: String) {
        self.diagnostics.push(Diagnostic {
            line,
            message,
            severity: Severity::Error,
        });
    }

    pub fn add_warning(&mut self, line: usize, message: String) {
        self.diagnostics.push(Diagnostic {
            line,
            message,
            severity: Severity::Warning,
        });
    }

    pub fn is_valid(&self) -> bool {
        !self
            .diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn extend(&mut self, other: ValidationResult) {
        self.diagnostics.extend(other.diagnostics);
    }
}

/// Validate a single parsed line
pub fn validate_line(line_num: usize, line: &Line, flavor: &Flavor) -> ValidationResult {
    let mut result = ValidationResult::new();
    let mut modal_groups: HashMap<ModalGroupId, String> = HashMap::new();
    let mut letters: HashSet<char> = HashSet::new();
    let mut m_words = 0;

    for word in line.iter_words() {
        if word.letter() == 'M' {
            m_words += 1;
        }

        if !word.is_gm() {
            if !letters.insert(word.letter()) {
                result.add_error(
                    line_num,
                    format!("Word '{}' appears more than once", word.letter()),
                );
            }
            continue;
        }

        let Some(code) = word.code() else {
            result.add_warning(
                line_num,
                format!("Cannot classify '{}': value is not a literal", word),
            );
            continue;
        };

        let Some(gcode) = flavor.gcodes().get(&code) else {
            result.add_warning(line_num, format!("Unknown code '{}'", code));
            continue;
        };

        // G group 0 holds the non-modal codes
        let Some(id) = gcode
            .modal_group()
            .filter(|id| *id != ModalGroupId::new(GroupKind::G, 0))
        else {
            continue;
        };
        if let Some(previous) = modal_groups.insert(id, code.clone()) {
            let meaning = flavor
                .modal_groups()
                .get(id)
                .map(|group| group.meaning())
                .unwrap_or_default();
            result.add_error(
                line_num,
                format!(
                    "'{}' and '{}' are both in modal group {} ({})",
                    previous, code, id, meaning
                ),
            );
        }
    }

    if m_words > MAX_M_WORDS {
        result.add_error(
            line_num,
            format!(
                "{} M words on one line, at most {} are allowed",
                m_words, MAX_M_WORDS
            ),
        );
    }

    result
}

/// Validate every line of a parsed program, numbering lines from 1
pub fn validate_program(program: &Program, flavor: &Flavor) -> ValidationResult {
    let mut result = ValidationResult::new();
    for (index, line) in program.iter().enumerate() {
        result.extend(validate_line(index + 1, line, flavor));
    }
    result
}

/// Validate a whole document line by line.
///
/// Unlike [`Parser::parse_lines`], a line that fails to parse is reported
/// as an error diagnostic and validation carries on with the next line.
pub fn validate_document(content: &str, flavor: &Flavor) -> ValidationResult {
    let mut parser = Parser::new();
    let mut result = ValidationResult::new();

    for (index, text) in content.lines().enumerate() {
        let line_num = index + 1;
        match parser.parse(text) {
            Ok(line) => result.extend(validate_line(line_num, &line, flavor)),
            Err(e) => result.add_error(line_num, e.to_string()),
        }
    }

    result
}
