//! G-code Lexer
//!
//! Splits one line of G-code into typed tokens. Alphabetic tokens are
//! matched case-insensitively and the longest operator keyword wins over a
//! single letter, so `cos` is one token and `C` followed by `OS` never is.
//! Positions are zero-based character offsets.

use std::fmt::{self, Display, Formatter};

use crate::ast::{BinaryOperator, Number, UnaryOperator, WORD_LETTERS};
use crate::error::LexicalError;

/// Classification of a numeric literal, used only by the grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberKind {
    /// No decimal point, no minus sign (`0`, `12`, `+3`)
    PositiveInteger,
    /// Decimal point and a value above zero (`1.5`, `.2`)
    PositiveReal,
    /// Everything else (`-1`, `0.0`, `-.5`)
    Real,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Word letter or `N`, always uppercase
    Letter(char),
    Number { value: Number, kind: NumberKind },
    UnaryOperator(UnaryOperator),
    /// Also used for the block delete `/`
    BinaryOperator(BinaryOperator),
    LeftBracket,
    RightBracket,
    EqualSign,
    ParameterSign,
    /// `<name>` following `#`, without the angle brackets
    ParameterName(String),
    InlineComment(String),
    EndOfLineComment(String),
}

impl TokenKind {
    /// Whether a following sign must be read as a binary operator
    fn ends_operand(&self) -> bool {
        matches!(
            self,
            TokenKind::Number { .. } | TokenKind::RightBracket | TokenKind::ParameterName(_)
        )
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            TokenKind::Letter(c) => write!(f, "letter '{}'", c),
            TokenKind::Number { value, .. } => write!(f, "number {}", value),
            TokenKind::UnaryOperator(op) => write!(f, "operator '{}'", op),
            TokenKind::BinaryOperator(op) => write!(f, "operator '{}'", op),
            TokenKind::LeftBracket => f.write_str("'['"),
            TokenKind::RightBracket => f.write_str("']'"),
            TokenKind::EqualSign => f.write_str("'='"),
            TokenKind::ParameterSign => f.write_str("'#'"),
            TokenKind::ParameterName(name) => write!(f, "parameter name <{}>", name),
            TokenKind::InlineComment(_) => f.write_str("comment"),
            TokenKind::EndOfLineComment(_) => f.write_str("end of line comment"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

enum Keyword {
    Unary(UnaryOperator),
    Binary(BinaryOperator),
}

/// Lazy tokenizer over one line at a time.
///
/// A lexer can be reused: [`Lexer::input`] resets it on a new line. After
/// an error the iterator is fused.
#[derive(Debug, Default)]
pub struct Lexer {
    chars: Vec<char>,
    cursor: usize,
    after_operand: bool,
    done: bool,
}

impl Lexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&mut self, line: &str) {
        self.chars.clear();
        self.chars.extend(line.chars());
        self.cursor = 0;
        self.after_operand = false;
        self.done = false;
    }

    pub fn tokenize(&mut self, line: &str) -> Result<Vec<Token>, LexicalError> {
        self.input(line);
        self.collect()
    }

    /// Number of characters in the current input
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.cursor + offset).copied()
    }

    fn starts_with_ignore_case(&self, text: &str) -> bool {
        let mut offset = 0;
        for expected in text.chars() {
            match self.peek_at(offset) {
                Some(c) if c.eq_ignore_ascii_case(&expected) => offset += 1,
                _ => return false,
            }
        }
        true
    }

    /// Longest operator token at the cursor
    fn match_keyword(&self) -> Option<(Keyword, usize)> {
        let unary = UnaryOperator::ALL
            .into_iter()
            .map(|op| (Keyword::Unary(op), op.token()));
        let binary = BinaryOperator::ALL
            .into_iter()
            .map(|op| (Keyword::Binary(op), op.token()));
        unary
            .chain(binary)
            .filter(|(_, token)| self.starts_with_ignore_case(token))
            .max_by_key(|(_, token)| token.len())
            .map(|(keyword, token)| (keyword, token.chars().count()))
    }

    fn starts_number(&self) -> bool {
        let digit_at = |offset| self.peek_at(offset).is_some_and(|c: char| c.is_ascii_digit());
        let (sign, offset) = match self.peek_at(0) {
            Some('+' | '-') => (true, 1),
            _ => (false, 0),
        };
        if sign && self.after_operand {
            return false;
        }
        digit_at(offset) || (self.peek_at(offset) == Some('.') && digit_at(offset + 1))
    }

    fn lex_number(&mut self) -> TokenKind {
        let mut text = String::new();
        let mut negative = false;
        if let Some(sign @ ('+' | '-')) = self.peek_at(0) {
            negative = sign == '-';
            text.push(sign);
            self.cursor += 1;
        }
        let mut has_dot = false;
        while let Some(c) = self.peek_at(0) {
            if c.is_ascii_digit() {
                text.push(c);
            } else if c == '.' && !has_dot {
                has_dot = true;
                text.push(c);
            } else {
                break;
            }
            self.cursor += 1;
        }

        // The scan only accepts digits, one dot and a leading sign, with at
        // least one digit, which every float parser accepts.
        let float = text.parse::<f64>().unwrap_or_default();
        let value = if has_dot {
            Number::Decimal(float)
        } else {
            text.parse::<i64>()
                .map(Number::Integer)
                .unwrap_or(Number::Decimal(float))
        };
        let kind = match (has_dot, negative) {
            (false, false) => NumberKind::PositiveInteger,
            (true, _) if float > 0.0 => NumberKind::PositiveReal,
            _ => NumberKind::Real,
        };
        TokenKind::Number { value, kind }
    }

    fn lex_inline_comment(&mut self) -> Result<TokenKind, LexicalError> {
        let start = self.cursor;
        let mut text = String::new();
        self.cursor += 1;
        loop {
            match self.peek_at(0) {
                Some(')') => {
                    self.cursor += 1;
                    return Ok(TokenKind::InlineComment(text));
                }
                Some('(') => {
                    return Err(LexicalError::NestedComment {
                        position: self.cursor,
                    });
                }
                Some(c) => {
                    text.push(c);
                    self.cursor += 1;
                }
                None => return Err(LexicalError::UnterminatedComment { position: start }),
            }
        }
    }

    fn lex_parameter_name(&mut self) -> Result<TokenKind, LexicalError> {
        let start = self.cursor;
        let mut name = String::new();
        self.cursor += 1;
        loop {
            match self.peek_at(0) {
                Some('>') if !name.is_empty() => {
                    self.cursor += 1;
                    return Ok(TokenKind::ParameterName(name));
                }
                Some(c) if c.is_ascii_alphanumeric() || c == '_' => {
                    name.push(c);
                    self.cursor += 1;
                }
                Some(c) => {
                    return Err(LexicalError::UnexpectedCharacter {
                        position: self.cursor,
                        character: c,
                    });
                }
                None => return Err(LexicalError::UnterminatedName { position: start }),
            }
        }
    }

    fn lex_end_of_line_comment(&mut self) -> TokenKind {
        let text: String = self.chars[self.cursor + 1..].iter().collect();
        self.cursor = self.chars.len();
        TokenKind::EndOfLineComment(text.trim().to_string())
    }

    fn next_token(&mut self) -> Option<Result<Token, LexicalError>> {
        while matches!(self.peek_at(0), Some(' ' | '\t')) {
            self.cursor += 1;
        }
        let position = self.cursor;
        let c = self.peek_at(0)?;

        let kind = match c {
            '[' => {
                self.cursor += 1;
                TokenKind::LeftBracket
            }
            ']' => {
                self.cursor += 1;
                TokenKind::RightBracket
            }
            '=' => {
                self.cursor += 1;
                TokenKind::EqualSign
            }
            '#' => {
                self.cursor += 1;
                TokenKind::ParameterSign
            }
            '(' => match self.lex_inline_comment() {
                Ok(kind) => kind,
                Err(e) => return Some(Err(e)),
            },
            '<' => match self.lex_parameter_name() {
                Ok(kind) => kind,
                Err(e) => return Some(Err(e)),
            },
            ';' => self.lex_end_of_line_comment(),
            _ if self.starts_number() => self.lex_number(),
            _ => match self.match_keyword() {
                Some((keyword, length)) => {
                    self.cursor += length;
                    match keyword {
                        Keyword::Unary(op) => TokenKind::UnaryOperator(op),
                        Keyword::Binary(op) => TokenKind::BinaryOperator(op),
                    }
                }
                None => {
                    let letter = c.to_ascii_uppercase();
                    if letter == 'N' || WORD_LETTERS.contains(&letter) {
                        self.cursor += 1;
                        TokenKind::Letter(letter)
                    } else {
                        return Some(Err(LexicalError::UnexpectedCharacter {
                            position,
                            character: c,
                        }));
                    }
                }
            },
        };

        self.after_operand = kind.ends_operand();
        Some(Ok(Token { kind, position }))
    }
}

impl Iterator for Lexer {
    type Item = Result<Token, LexicalError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.next_token();
        if !matches!(item, Some(Ok(_))) {
            self.done = true;
        }
        item
    }
}

/// Tokenize a single line of G-code
pub fn tokenize_line(line: &str) -> Result<Vec<Token>, LexicalError> {
    Lexer::new().tokenize(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(line: &str) -> Vec<TokenKind> {
        tokenize_line(line)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    fn integer(n: i64) -> TokenKind {
        TokenKind::Number {
            value: Number::Integer(n),
            kind: if n >= 0 {
                NumberKind::PositiveInteger
            } else {
                NumberKind::Real
            },
        }
    }

    #[test]
    fn test_tokenize_simple_command() {
        assert_eq!(
            kinds("G1 X10 Y-2"),
            vec![
                TokenKind::Letter('G'),
                integer(1),
                TokenKind::Letter('X'),
                integer(10),
                TokenKind::Letter('Y'),
                integer(-2),
            ]
        );
    }

    #[test]
    fn test_positions() {
        let tokens = tokenize_line("G1  X10").unwrap();
        let positions: Vec<usize> = tokens.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![0, 1, 4, 5]);
    }

    #[test]
    fn test_number_kinds() {
        let number_kind = |text: &str| match &kinds(text)[0] {
            TokenKind::Number { kind, .. } => *kind,
            other => panic!("expected a number, got {:?}", other),
        };
        assert_eq!(number_kind("12"), NumberKind::PositiveInteger);
        assert_eq!(number_kind("0"), NumberKind::PositiveInteger);
        assert_eq!(number_kind("+3"), NumberKind::PositiveInteger);
        assert_eq!(number_kind("1.5"), NumberKind::PositiveReal);
        assert_eq!(number_kind(".5"), NumberKind::PositiveReal);
        assert_eq!(number_kind("5."), NumberKind::PositiveReal);
        assert_eq!(number_kind("0.0"), NumberKind::Real);
        assert_eq!(number_kind("-1"), NumberKind::Real);
        assert_eq!(number_kind("-.5"), NumberKind::Real);
    }

    #[test]
    fn test_sign_after_operand_is_an_operator() {
        assert_eq!(
            kinds("[3-4]"),
            vec![
                TokenKind::LeftBracket,
                integer(3),
                TokenKind::BinaryOperator(BinaryOperator::Subtract),
                integer(4),
                TokenKind::RightBracket,
            ]
        );
        assert_eq!(
            kinds("[3 - -4]"),
            vec![
                TokenKind::LeftBracket,
                integer(3),
                TokenKind::BinaryOperator(BinaryOperator::Subtract),
                integer(-4),
                TokenKind::RightBracket,
            ]
        );
    }

    #[test]
    fn test_keywords_are_case_insensitive_and_longest_match() {
        assert_eq!(
            kinds("COS Cos cos"),
            vec![TokenKind::UnaryOperator(UnaryOperator::Cosine); 3]
        );
        assert_eq!(
            kinds("** * MOD xor"),
            vec![
                TokenKind::BinaryOperator(BinaryOperator::Power),
                TokenKind::BinaryOperator(BinaryOperator::Multiply),
                TokenKind::BinaryOperator(BinaryOperator::Modulo),
                TokenKind::BinaryOperator(BinaryOperator::ExclusiveOr),
            ]
        );
        assert_eq!(
            kinds("asin a"),
            vec![
                TokenKind::UnaryOperator(UnaryOperator::ArcSine),
                TokenKind::Letter('A'),
            ]
        );
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            kinds("G0 ( rapid  move ) ;  done "),
            vec![
                TokenKind::Letter('G'),
                integer(0),
                TokenKind::InlineComment(" rapid  move ".to_string()),
                TokenKind::EndOfLineComment("done".to_string()),
            ]
        );
    }

    #[test]
    fn test_nested_comment() {
        assert_eq!(
            tokenize_line("(comment (wrong) 2)"),
            Err(LexicalError::NestedComment { position: 9 })
        );
    }

    #[test]
    fn test_unterminated_comment() {
        assert_eq!(
            tokenize_line("G0 (open"),
            Err(LexicalError::UnterminatedComment { position: 3 })
        );
    }

    #[test]
    fn test_unexpected_character() {
        assert_eq!(
            tokenize_line("G0 X0 Y@"),
            Err(LexicalError::UnexpectedCharacter {
                position: 7,
                character: '@'
            })
        );
        assert_eq!(
            tokenize_line("E1"),
            Err(LexicalError::UnexpectedCharacter {
                position: 0,
                character: 'E'
            })
        );
    }

    #[test]
    fn test_parameter_names() {
        assert_eq!(
            kinds("#<tool_2>-1"),
            vec![
                TokenKind::ParameterSign,
                TokenKind::ParameterName("tool_2".to_string()),
                TokenKind::BinaryOperator(BinaryOperator::Subtract),
                integer(1),
            ]
        );
        assert_eq!(
            tokenize_line("#<feed"),
            Err(LexicalError::UnterminatedName { position: 1 })
        );
        assert_eq!(
            tokenize_line("#<a b>"),
            Err(LexicalError::UnexpectedCharacter {
                position: 3,
                character: ' '
            })
        );
        assert_eq!(
            tokenize_line("#<>"),
            Err(LexicalError::UnexpectedCharacter {
                position: 2,
                character: '>'
            })
        );
    }

    #[test]
    fn test_lexer_is_reusable_and_fused() {
        let mut lexer = Lexer::new();
        lexer.input("G0 @ X1");
        assert!(lexer.next().unwrap().is_ok());
        assert!(lexer.next().unwrap().is_ok());
        assert!(lexer.next().unwrap().is_err());
        assert!(lexer.next().is_none());

        assert_eq!(lexer.tokenize("m3").unwrap().len(), 2);
    }

    #[test]
    fn test_tokenize_empty_line() {
        assert!(tokenize_line("  \t ").unwrap().is_empty());
    }
}
