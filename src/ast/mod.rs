//! Abstract Syntax Tree for RS-274 G-code
//!
//! A [`Program`] owns [`Line`]s, a line owns its [`LineItem`]s, and every
//! real value owns its sub-expressions. Nothing is shared, so `clone` is a
//! deep copy.
//!
//! `Display` produces canonical G-code text: parsing it again yields an
//! identical tree.

pub mod expr;

use std::fmt::{self, Display, Formatter};
use std::ops::Index;

use crate::error::ValidationError;

pub use expr::{
    BinaryInfo, BinaryOperator, Number, ParameterIndex, ParameterResolver, RealValue, UnaryInfo,
    UnaryOperator,
};

/// Letters a word may start with. `N` is reserved for line numbers.
pub const WORD_LETTERS: [char; 20] = [
    'A', 'B', 'C', 'D', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'P', 'Q', 'R', 'S', 'T', 'X',
    'Y', 'Z',
];

pub const AXIS_LETTERS: [char; 6] = ['A', 'B', 'C', 'X', 'Y', 'Z'];

pub fn is_word_letter(letter: char) -> bool {
    WORD_LETTERS.contains(&letter.to_ascii_uppercase())
}

/// Inline comments are closed by `)`, end-of-line comments run to the end
fn check_comment(text: &str, forbidden: &[char]) -> Result<(), ValidationError> {
    if text.contains(forbidden) {
        Err(ValidationError::CommentContainsParenthesis(text.to_string()))
    } else {
        Ok(())
    }
}

/// A letter paired with a real value, e.g. `G1` or `X[#1 + 2]`
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    letter: char,
    value: RealValue,
}

impl Word {
    pub fn new(letter: char, value: impl Into<RealValue>) -> Result<Self, ValidationError> {
        let letter = letter.to_ascii_uppercase();
        if !WORD_LETTERS.contains(&letter) {
            return Err(ValidationError::InvalidLetter(letter));
        }
        Ok(Self {
            letter,
            value: value.into(),
        })
    }

    pub fn letter(&self) -> char {
        self.letter
    }

    pub fn value(&self) -> &RealValue {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut RealValue {
        &mut self.value
    }

    pub fn set_value(&mut self, value: impl Into<RealValue>) {
        self.value = value.into();
    }

    /// G and M words select codes from the G-code table
    pub fn is_gm(&self) -> bool {
        matches!(self.letter, 'G' | 'M')
    }

    pub fn is_axis(&self) -> bool {
        AXIS_LETTERS.contains(&self.letter)
    }

    /// Canonical code of a G/M word with a literal value, e.g. `G38.2`.
    /// `G1.0` and `G01` both give `G1`.
    pub fn code(&self) -> Option<String> {
        if !self.is_gm() {
            return None;
        }
        let number = self.value.as_literal()?;
        Some(format!("{}{}", self.letter, Number::normalized(number.value())))
    }
}

/// Whether `letter` glued to `value` would read back as an operator keyword,
/// as `A` followed by `cos[0]` reads as `acos[0]`
fn collides_with_keyword(letter: char, value: &str) -> bool {
    let starts_with = |token: &str| {
        let mut chars = token.chars();
        chars.next().is_some_and(|c| c.eq_ignore_ascii_case(&letter))
            && value
                .get(..chars.as_str().len())
                .is_some_and(|rest| rest.eq_ignore_ascii_case(chars.as_str()))
    };
    UnaryOperator::ALL
        .iter()
        .map(|op| op.token())
        .chain(BinaryOperator::ALL.iter().map(|op| op.token()))
        .any(starts_with)
}

impl Display for Word {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let value = self.value.to_string();
        if collides_with_keyword(self.letter, &value) {
            write!(f, "{} {}", self.letter, value)
        } else {
            write!(f, "{}{}", self.letter, value)
        }
    }
}

/// An inline `(comment)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    text: String,
}

impl Comment {
    pub fn new(text: impl Into<String>) -> Result<Self, ValidationError> {
        let text = text.into();
        check_comment(&text, &['(', ')'])?;
        Ok(Self { text })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) -> Result<(), ValidationError> {
        let text = text.into();
        check_comment(&text, &['(', ')'])?;
        self.text = text;
        Ok(())
    }
}

impl Display for Comment {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "({})", self.text)
    }
}

/// `#index=value`
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSetting {
    index: ParameterIndex,
    value: RealValue,
}

impl ParameterSetting {
    pub fn new(index: impl Into<ParameterIndex>, value: impl Into<RealValue>) -> Self {
        Self {
            index: index.into(),
            value: value.into(),
        }
    }

    pub fn index(&self) -> &ParameterIndex {
        &self.index
    }

    pub fn value(&self) -> &RealValue {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<RealValue>) {
        self.value = value.into();
    }
}

impl Display for ParameterSetting {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "#{}={}", self.index, self.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LineItem {
    Word(Word),
    Comment(Comment),
    ParameterSetting(ParameterSetting),
}

impl LineItem {
    pub fn as_word(&self) -> Option<&Word> {
        match self {
            LineItem::Word(word) => Some(word),
            _ => None,
        }
    }
}

impl From<Word> for LineItem {
    fn from(value: Word) -> Self {
        LineItem::Word(value)
    }
}

impl From<Comment> for LineItem {
    fn from(value: Comment) -> Self {
        LineItem::Comment(value)
    }
}

impl From<ParameterSetting> for LineItem {
    fn from(value: ParameterSetting) -> Self {
        LineItem::ParameterSetting(value)
    }
}

impl Display for LineItem {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            LineItem::Word(word) => word.fmt(f),
            LineItem::Comment(comment) => comment.fmt(f),
            LineItem::ParameterSetting(setting) => setting.fmt(f),
        }
    }
}

/// One block of G-code.
///
/// Items keep their insertion order so that the line prints back the way
/// it was written; RS-274 gives that order no meaning beyond "last setting
/// of a parameter wins".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Line {
    deleted: bool,
    line_number: Option<Number>,
    comment: Option<String>,
    items: Vec<LineItem>,
}

impl Line {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deleted(mut self, deleted: bool) -> Self {
        self.deleted = deleted;
        self
    }

    pub fn with_line_number(mut self, number: f64) -> Result<Self, ValidationError> {
        self.set_line_number(Some(number))?;
        Ok(self)
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Result<Self, ValidationError> {
        self.set_comment(Some(comment.into()))?;
        Ok(self)
    }

    /// Block delete flag (leading `/`)
    pub fn deleted(&self) -> bool {
        self.deleted
    }

    pub fn set_deleted(&mut self, deleted: bool) {
        self.deleted = deleted;
    }

    pub fn toggle_deleted(&mut self) {
        self.deleted = !self.deleted;
    }

    pub fn line_number(&self) -> Option<Number> {
        self.line_number
    }

    /// Whole values are stored as integers, so `N2.0` prints as `N2`.
    pub fn set_line_number(&mut self, number: Option<f64>) -> Result<(), ValidationError> {
        self.line_number = match number {
            Some(n) if !n.is_finite() || n < 0.0 => {
                return Err(ValidationError::InvalidLineNumber(n));
            }
            Some(n) => Some(Number::normalized(n)),
            None => None,
        };
        Ok(())
    }

    pub fn clear_line_number(&mut self) {
        self.line_number = None;
    }

    /// End-of-line comment, without the leading `;`
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn set_comment(&mut self, comment: Option<String>) -> Result<(), ValidationError> {
        if let Some(text) = &comment {
            check_comment(text, &['('])?;
        }
        self.comment = comment;
        Ok(())
    }

    /// Drop the end-of-line comment and every inline comment
    pub fn strip_comments(&mut self) {
        self.comment = None;
        self.items
            .retain(|item| !matches!(item, LineItem::Comment(_)));
    }

    pub fn push(&mut self, item: impl Into<LineItem>) {
        self.items.push(item.into());
    }

    pub fn remove(&mut self, index: usize) -> Option<LineItem> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LineItem> {
        self.items.iter()
    }

    pub fn iter_words(&self) -> impl Iterator<Item = &Word> {
        self.items.iter().filter_map(LineItem::as_word)
    }

    pub fn iter_words_mut(&mut self) -> impl Iterator<Item = &mut Word> {
        self.items.iter_mut().filter_map(|item| match item {
            LineItem::Word(word) => Some(word),
            _ => None,
        })
    }

    pub fn iter_comments(&self) -> impl Iterator<Item = &Comment> {
        self.items.iter().filter_map(|item| match item {
            LineItem::Comment(comment) => Some(comment),
            _ => None,
        })
    }

    pub fn iter_parameter_settings(&self) -> impl Iterator<Item = &ParameterSetting> {
        self.items.iter().filter_map(|item| match item {
            LineItem::ParameterSetting(setting) => Some(setting),
            _ => None,
        })
    }
}

impl Index<usize> for Line {
    type Output = LineItem;

    fn index(&self, index: usize) -> &LineItem {
        &self.items[index]
    }
}

impl<'a> IntoIterator for &'a Line {
    type Item = &'a LineItem;
    type IntoIter = std::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl Display for Line {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let mut parts: Vec<String> = Vec::with_capacity(self.items.len() + 3);
        if self.deleted {
            parts.push("/".to_string());
        }
        if let Some(number) = self.line_number {
            parts.push(format!("N{}", number));
        }
        parts.extend(self.items.iter().map(|item| item.to_string()));
        match self.comment.as_deref() {
            Some(comment) if !comment.is_empty() => parts.push(format!("; {}", comment)),
            _ => (),
        }
        write!(f, "{}", parts.join(" "))
    }
}

/// An ordered sequence of lines
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    lines: Vec<Line>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: Line) {
        self.lines.push(line);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Line> {
        self.lines.iter()
    }

    /// Lines without the block delete flag
    pub fn iter_not_deleted(&self) -> impl Iterator<Item = &Line> {
        self.lines.iter().filter(|line| !line.deleted())
    }
}

impl Index<usize> for Program {
    type Output = Line;

    fn index(&self, index: usize) -> &Line {
        &self.lines[index]
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Line;
    type IntoIter = std::slice::Iter<'a, Line>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

impl FromIterator<Line> for Program {
    fn from_iter<I: IntoIterator<Item = Line>>(iter: I) -> Self {
        Self {
            lines: iter.into_iter().collect(),
        }
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", line)?;
        }
        Ok(())
    }
}
