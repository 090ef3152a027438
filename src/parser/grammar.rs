//! Reduction of a token sequence to AST nodes
//!
//! ```text
//! line             = ["/"] [line_number] {segment} [end_of_line_comment]
//! line_number      = "N" (positive_integer | positive_real)
//! segment          = word | inline_comment | parameter_setting
//! word             = letter real_value
//! parameter_setting = "#" parameter_index "=" real_value
//! parameter_index  = "<" name ">" | real_value
//! real_value       = number | expression | "#" parameter_index
//!                  | ordinary_unary expression | "atan" expression "/" expression
//! expression       = "[" real_value {binary_op real_value} "]"
//! ```
//!
//! Binary operators inside one pair of brackets fold left to right; nesting
//! is expressed only with brackets.

use crate::ast::{
    BinaryOperator, Comment, Line, ParameterIndex, ParameterSetting, RealValue, UnaryOperator,
    Word,
};
use crate::error::{Error, ParseError};

use super::lexer::{NumberKind, Token, TokenKind};

pub(crate) struct Grammar<'a> {
    tokens: &'a [Token],
    index: usize,
    /// Character length of the line, reported for a premature end
    end: usize,
}

impl<'a> Grammar<'a> {
    pub(crate) fn new(tokens: &'a [Token], end: usize) -> Self {
        Self {
            tokens,
            index: 0,
            end,
        }
    }

    fn peek(&self) -> Option<&'a TokenKind> {
        self.tokens.get(self.index).map(|token| &token.kind)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.index)?;
        self.index += 1;
        Some(token)
    }

    fn unexpected(&self, token: Option<&Token>, expected: &'static str) -> Error {
        let error = match token {
            Some(token) => ParseError::UnexpectedToken {
                position: token.position,
                found: token.kind.to_string(),
                expected,
            },
            None => ParseError::UnexpectedEnd {
                position: self.end,
                expected,
            },
        };
        error.into()
    }

    fn expect(&mut self, kind: &TokenKind, expected: &'static str) -> Result<(), Error> {
        match self.advance() {
            Some(token) if token.kind == *kind => Ok(()),
            other => Err(self.unexpected(other, expected)),
        }
    }

    /// Fails unless every token has been consumed
    pub(crate) fn finish(&mut self) -> Result<(), Error> {
        match self.advance() {
            None => Ok(()),
            other => Err(self.unexpected(other, "end of line")),
        }
    }

    pub(crate) fn line(&mut self) -> Result<Line, Error> {
        let mut line = Line::new();

        if let Some(TokenKind::BinaryOperator(BinaryOperator::Divide)) = self.peek() {
            self.advance();
            line.set_deleted(true);
        }

        if let Some(TokenKind::Letter('N')) = self.peek() {
            self.advance();
            match self.advance() {
                Some(Token {
                    kind:
                        TokenKind::Number {
                            value,
                            kind: NumberKind::PositiveInteger | NumberKind::PositiveReal,
                        },
                    ..
                }) => line.set_line_number(Some(value.value()))?,
                other => return Err(self.unexpected(other, "positive line number")),
            }
        }

        while let Some(kind) = self.peek() {
            match kind {
                TokenKind::EndOfLineComment(text) => {
                    self.advance();
                    line.set_comment(Some(text.clone()))?;
                    self.finish()?;
                }
                TokenKind::InlineComment(text) => {
                    self.advance();
                    line.push(Comment::new(text.as_str())?);
                }
                TokenKind::ParameterSign => {
                    self.advance();
                    let index = self.parameter_index()?;
                    self.expect(&TokenKind::EqualSign, "'='")?;
                    let value = self.real_value()?;
                    line.push(ParameterSetting::new(index, value));
                }
                TokenKind::Letter(letter) if *letter != 'N' => {
                    self.advance();
                    let value = self.real_value()?;
                    line.push(Word::new(*letter, value)?);
                }
                _ => {
                    let token = self.tokens.get(self.index);
                    return Err(self.unexpected(token, "word, comment or parameter setting"));
                }
            }
        }

        Ok(line)
    }

    pub(crate) fn word(&mut self) -> Result<Word, Error> {
        match self.advance() {
            Some(Token {
                kind: TokenKind::Letter(letter),
                ..
            }) if *letter != 'N' => {
                let value = self.real_value()?;
                Ok(Word::new(*letter, value)?)
            }
            other => Err(self.unexpected(other, "word letter")),
        }
    }

    pub(crate) fn real_value(&mut self) -> Result<RealValue, Error> {
        let token = self.advance();
        match token.map(|token| &token.kind) {
            Some(TokenKind::Number { value, .. }) => Ok(RealValue::Literal(*value)),
            Some(TokenKind::LeftBracket) => self.inner_expression(),
            Some(TokenKind::ParameterSign) => Ok(RealValue::Parameter(self.parameter_index()?)),
            Some(TokenKind::UnaryOperator(UnaryOperator::ArcTangent)) => {
                let argument = self.expression()?;
                self.expect(&TokenKind::BinaryOperator(BinaryOperator::Divide), "'/'")?;
                let divisor = self.expression()?;
                Ok(RealValue::binary(
                    BinaryOperator::Divide,
                    RealValue::unary(UnaryOperator::ArcTangent, argument),
                    divisor,
                ))
            }
            Some(TokenKind::UnaryOperator(operator)) => {
                let argument = self.expression()?;
                Ok(RealValue::unary(*operator, argument))
            }
            _ => Err(self.unexpected(token, "real value")),
        }
    }

    /// What follows `#`: a name in angle brackets, or a value coerced to an index
    fn parameter_index(&mut self) -> Result<ParameterIndex, Error> {
        if let Some(TokenKind::ParameterName(name)) = self.peek() {
            self.advance();
            return Ok(ParameterIndex::named(name.as_str())?);
        }
        Ok(ParameterIndex::from_value(self.real_value()?)?)
    }

    fn expression(&mut self) -> Result<RealValue, Error> {
        self.expect(&TokenKind::LeftBracket, "'['")?;
        self.inner_expression()
    }

    /// Everything after `[`, up to and including the matching `]`
    fn inner_expression(&mut self) -> Result<RealValue, Error> {
        let mut value = self.real_value()?;
        loop {
            match self.advance() {
                Some(Token {
                    kind: TokenKind::BinaryOperator(operator),
                    ..
                }) => {
                    let right = self.real_value()?;
                    value = RealValue::binary(*operator, value, right);
                }
                Some(Token {
                    kind: TokenKind::RightBracket,
                    ..
                }) => return Ok(value),
                other => return Err(self.unexpected(other, "binary operator or ']'")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::tokenize_line;

    fn parse(text: &str) -> Result<Line, Error> {
        let tokens = tokenize_line(text)?;
        Grammar::new(&tokens, text.chars().count()).line()
    }

    #[test]
    fn test_left_fold_inside_brackets() {
        let tokens = tokenize_line("[1 + 2 * 3]").unwrap();
        let value = Grammar::new(&tokens, 11).real_value().unwrap();
        // No precedence climbing: ((1 + 2) * 3)
        assert_eq!(value.evaluate(), Ok(9.0));
        assert_eq!(value.to_string(), "[[1 + 2] * 3]");
    }

    #[test]
    fn test_atan_forms() {
        let tokens = tokenize_line("atan[1]/[1]").unwrap();
        let value = Grammar::new(&tokens, 11).real_value().unwrap();
        assert_eq!(
            value,
            RealValue::binary(
                BinaryOperator::Divide,
                RealValue::unary(UnaryOperator::ArcTangent, 1),
                1
            )
        );

        assert_eq!(value.to_string(), "[atan[1] / [1]]");
    }

    #[test]
    fn test_atan_requires_bracketed_divisor() {
        let error = parse("X atan[1]").unwrap_err();
        assert_eq!(
            error,
            Error::Parse(ParseError::UnexpectedEnd {
                position: 9,
                expected: "'/'",
            })
        );

        let error = parse("X atan[1]/2").unwrap_err();
        assert_eq!(
            error,
            Error::Parse(ParseError::UnexpectedToken {
                position: 10,
                found: "number 2".to_string(),
                expected: "'['",
            })
        );

        // The combo takes the `/`, so the fold cannot continue with a bare 3
        assert!(parse("X[8 / atan[1] / 3]").is_err());
        let line = parse("X[8 / atan[1] / [3]]").unwrap();
        assert_eq!(line.to_string(), "X[8 / [atan[1] / [3]]]");
    }

    #[test]
    fn test_unary_requires_brackets() {
        let error = parse("X cos 45").unwrap_err();
        assert_eq!(
            error,
            Error::Parse(ParseError::UnexpectedToken {
                position: 6,
                found: "number 45".to_string(),
                expected: "'['",
            })
        );
    }

    #[test]
    fn test_named_parameters() {
        let line = parse("#<feed>=[#<feed> * 2] F#<feed>").unwrap();
        assert_eq!(line.to_string(), "#<feed>=[#<feed> * 2] F#<feed>");
        let setting = line.iter_parameter_settings().next().unwrap();
        assert_eq!(setting.index(), &ParameterIndex::Named("feed".to_string()));

        // A name is only valid after `#`
        assert!(parse("X<feed>").is_err());
    }

    #[test]
    fn test_line_number_must_be_positive() {
        assert!(parse("N-1 G0").is_err());
        assert!(parse("N G0").is_err());
        assert_eq!(parse("N0 G0").unwrap().to_string(), "N0 G0");
    }

    #[test]
    fn test_block_delete_only_at_start() {
        assert!(parse("/ G0").unwrap().deleted());
        assert!(parse("G0 / X1").is_err());
    }

    #[test]
    fn test_missing_bracket_reports_end_of_line() {
        let error = parse("X[1 + 2").unwrap_err();
        assert_eq!(
            error,
            Error::Parse(ParseError::UnexpectedEnd {
                position: 7,
                expected: "binary operator or ']'",
            })
        );
    }

    #[test]
    fn test_parameter_setting() {
        let line = parse("#1=[#2 + 1] ##3=2.5").unwrap();
        assert_eq!(line.to_string(), "#1=[#2 + 1] ##3=2.5");
        assert_eq!(line.iter_parameter_settings().count(), 2);
    }

    #[test]
    fn test_fractional_parameter_index_is_rejected() {
        assert!(matches!(
            parse("#1.5=2"),
            Err(Error::Validation(_))
        ));
    }
}
