//! G-code Parser
//!
//! Tokenizes one line at a time and reduces it to an AST [`Line`]. A
//! [`Parser`] builds a fresh line on every call, so one instance can parse
//! many lines; concurrent callers each need their own instance.

mod grammar;
pub mod lexer;

use std::str::FromStr;

use log::debug;

use crate::ast::{Line, Program, RealValue, Word};
use crate::error::Error;

pub use lexer::{tokenize_line, Lexer, NumberKind, Token, TokenKind};

use grammar::Grammar;

#[derive(Debug, Default)]
pub struct Parser {
    lexer: Lexer,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a single line of G-code.
    ///
    /// A trailing line terminator is ignored. On error no part of the line
    /// is returned.
    pub fn parse(&mut self, line: &str) -> Result<Line, Error> {
        let text = line.trim_end_matches(['\r', '\n']);
        let tokens = self.lexer.tokenize(text)?;
        let parsed = Grammar::new(&tokens, self.lexer.len()).line()?;
        debug!("parsed {:?} into {} items", text, parsed.len());
        Ok(parsed)
    }

    /// Parse a sequence of lines into a program, stopping at the first
    /// failure.
    ///
    /// Blank lines are skipped. The error carries the 1-based line number
    /// and the text of the failing line.
    pub fn parse_lines<I, S>(&mut self, lines: I) -> Result<Program, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut program = Program::new();
        for (i, text) in lines.into_iter().enumerate() {
            let text = text.as_ref();
            if text.trim().is_empty() {
                continue;
            }
            let line = self.parse(text).map_err(|source| Error::Line {
                number: i + 1,
                text: text.to_string(),
                source: Box::new(source),
            })?;
            program.push(line);
        }
        debug!("parsed program of {} lines", program.len());
        Ok(program)
    }

    /// Parse a whole file's contents
    pub fn parse_program(&mut self, text: &str) -> Result<Program, Error> {
        self.parse_lines(text.lines())
    }

    /// Parse a standalone real value such as `[1 + #2]`
    pub fn parse_real_value(&mut self, text: &str) -> Result<RealValue, Error> {
        let tokens = self.lexer.tokenize(text)?;
        let mut grammar = Grammar::new(&tokens, self.lexer.len());
        let value = grammar.real_value()?;
        grammar.finish()?;
        Ok(value)
    }

    /// Parse a standalone word such as `X[2 * 3]`
    pub fn parse_word(&mut self, text: &str) -> Result<Word, Error> {
        let tokens = self.lexer.tokenize(text)?;
        let mut grammar = Grammar::new(&tokens, self.lexer.len());
        let word = grammar.word()?;
        grammar.finish()?;
        Ok(word)
    }
}

/// Parse a single line of G-code into structured data
pub fn parse_line(line: &str) -> Result<Line, Error> {
    Parser::new().parse(line)
}

pub fn parse_lines<I, S>(lines: I) -> Result<Program, Error>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Parser::new().parse_lines(lines)
}

pub fn parse_program(text: &str) -> Result<Program, Error> {
    Parser::new().parse_program(text)
}

pub fn parse_real_value(text: &str) -> Result<RealValue, Error> {
    Parser::new().parse_real_value(text)
}

impl FromStr for RealValue {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_real_value(s)
    }
}

impl FromStr for Word {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Parser::new().parse_word(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LexicalError;

    #[test]
    fn test_parse_simple_command() {
        let line = parse_line("G1 X10 Y20").unwrap();
        let words: Vec<String> = line.iter_words().map(|w| w.to_string()).collect();
        assert_eq!(words, vec!["G1", "X10", "Y20"]);
        assert_eq!(line.comment(), None);
    }

    #[test]
    fn test_parse_with_comment() {
        let line = parse_line("G1 X10 ; move to X10\r\n").unwrap();
        assert_eq!(line.comment(), Some("move to X10"));
        assert_eq!(line.to_string(), "G1 X10 ; move to X10");
    }

    #[test]
    fn test_parse_comment_only() {
        let line = parse_line("; this is a comment").unwrap();
        assert!(line.is_empty());
        assert_eq!(line.comment(), Some("this is a comment"));
    }

    #[test]
    fn test_parse_empty_line() {
        let line = parse_line("   ").unwrap();
        assert!(line.is_empty());
        assert_eq!(line.to_string(), "");
    }

    #[test]
    fn test_parser_is_reusable() {
        let mut parser = Parser::new();
        let first = parser.parse("G0 X1").unwrap();
        let second = parser.parse("G1 Y2").unwrap();
        assert_eq!(first.to_string(), "G0 X1");
        assert_eq!(second.to_string(), "G1 Y2");
    }

    #[test]
    fn test_parse_program_skips_blank_lines() {
        let program = parse_program("G0 X0\n\n  \nG1 X1\n").unwrap();
        assert_eq!(program.len(), 2);
        assert_eq!(program.to_string(), "G0 X0\nG1 X1");
    }

    #[test]
    fn test_parse_lines_reports_failing_line() {
        let error = parse_lines(["G0 X0", "", "G0 X0 Y@"]).unwrap_err();
        match error {
            Error::Line {
                number,
                text,
                source,
            } => {
                assert_eq!(number, 3);
                assert_eq!(text, "G0 X0 Y@");
                assert_eq!(
                    *source,
                    Error::Lexical(LexicalError::UnexpectedCharacter {
                        position: 7,
                        character: '@'
                    })
                );
            }
            other => panic!("expected a line error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_str() {
        let value: RealValue = "[2 ** 3]".parse().unwrap();
        assert_eq!(value.evaluate(), Ok(8.0));
        assert!("[2 ** 3] 4".parse::<RealValue>().is_err());

        let word: Word = "x[2 * 3]".parse().unwrap();
        assert_eq!(word.to_string(), "X[2 * 3]");
        assert!("N10".parse::<Word>().is_err());
    }
}
