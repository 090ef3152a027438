//! Machine facade
//!
//! Pairs a [`Parser`] with the tables of one [`Flavor`] and binds parsed
//! words to their table entries.

use std::sync::Arc;

use crate::ast::{Line, LineItem, Program, Word};
use crate::error::Error;
use crate::flavor::{ExecutionGroup, Flavor, Gcode, Letter, ModalGroup};
use crate::parser::Parser;

/// What the tables say about one word of a line
#[derive(Debug, Clone, Copy)]
pub struct Annotation<'a> {
    pub word: &'a Word,
    pub gcode: Option<&'a Gcode>,
    pub letter: Option<&'a Letter>,
    pub modal_group: Option<&'a ModalGroup>,
    pub execution_group: Option<&'a ExecutionGroup>,
}

impl Annotation<'_> {
    /// Meaning of the code if the word selects one, otherwise of the letter
    pub fn meaning(&self) -> Option<&str> {
        self.gcode
            .map(Gcode::meaning)
            .or_else(|| self.letter.map(Letter::meaning))
    }
}

/// A line item with the execution order group that processes it
#[derive(Debug, Clone, Copy)]
pub struct ExecutionStep<'a> {
    pub group: &'a ExecutionGroup,
    pub item: &'a LineItem,
}

#[derive(Debug)]
pub struct Machine {
    config: Arc<Flavor>,
    parser: Parser,
}

impl Machine {
    pub fn new(config: Arc<Flavor>) -> Self {
        Self {
            config,
            parser: Parser::new(),
        }
    }

    pub fn config(&self) -> &Flavor {
        &self.config
    }

    pub fn parse(&mut self, line: &str) -> Result<Line, Error> {
        self.parser.parse(line)
    }

    pub fn parse_lines<I, S>(&mut self, lines: I) -> Result<Program, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.parser.parse_lines(lines)
    }

    pub fn parse_program(&mut self, text: &str) -> Result<Program, Error> {
        self.parser.parse_program(text)
    }

    pub fn annotate_word<'a>(&'a self, word: &'a Word) -> Annotation<'a> {
        let gcode = self.config.gcode_for_word(word);
        Annotation {
            word,
            gcode,
            letter: self.config.letters().get(word.letter()),
            modal_group: gcode.and_then(|gcode| self.config.modal_group_of(gcode)),
            execution_group: gcode.and_then(|gcode| self.config.execution_group_of(gcode)),
        }
    }

    /// Annotations of every word of a line, in line order
    pub fn annotate<'a>(&'a self, line: &'a Line) -> Vec<Annotation<'a>> {
        line.iter_words()
            .map(|word| self.annotate_word(word))
            .collect()
    }

    /// Comments and codes of a line in the order they take effect.
    ///
    /// Words that only carry arguments (axes, offsets, parameter settings)
    /// belong to no execution group and are left out. Items of the same
    /// group keep their line order.
    pub fn execution_plan<'a>(&'a self, line: &'a Line) -> Vec<ExecutionStep<'a>> {
        let order = self.config.execution_order();
        let comment_group = order.comment_index().and_then(|index| order.get(index));

        let mut steps: Vec<ExecutionStep<'a>> = line
            .iter()
            .filter_map(|item| {
                let group = match item {
                    LineItem::Comment(_) => comment_group,
                    LineItem::Word(word) => self
                        .config
                        .gcode_for_word(word)
                        .and_then(|gcode| self.config.execution_group_of(gcode)),
                    LineItem::ParameterSetting(_) => None,
                };
                group.map(|group| ExecutionStep { group, item })
            })
            .collect();
        steps.sort_by_key(|step| step.group.index());
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flavor::builtin_flavor;

    fn machine() -> Machine {
        Machine::new(Arc::new(builtin_flavor().unwrap()))
    }

    #[test]
    fn test_annotate_words() {
        let mut machine = machine();
        let line = machine.parse("G1 X10 F200").unwrap();
        let annotations = machine.annotate(&line);
        assert_eq!(annotations.len(), 3);

        assert_eq!(annotations[0].meaning(), Some("linear interpolation"));
        assert_eq!(annotations[0].modal_group.unwrap().meaning(), "motion");
        assert_eq!(annotations[0].execution_group.unwrap().index(), 20);

        assert_eq!(annotations[1].meaning(), Some("X-axis of machine"));
        assert!(annotations[1].gcode.is_none());

        assert_eq!(annotations[2].meaning(), Some("set feed rate"));
        assert_eq!(annotations[2].execution_group.unwrap().index(), 3);
        assert!(annotations[2].modal_group.is_none());
    }

    #[test]
    fn test_execution_plan() {
        let mut machine = machine();
        let line = machine.parse("G0 X1 M3 (start) S1000 G17").unwrap();
        let plan: Vec<String> = machine
            .execution_plan(&line)
            .iter()
            .map(|step| step.item.to_string())
            .collect();
        assert_eq!(plan, vec!["(start)", "S1000", "M3", "G17", "G0"]);
    }
}
