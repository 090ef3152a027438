//! Configuration tables
//!
//! A [`Flavor`] is built once from a [`FlavorFile`] and is read-only
//! afterwards. G-codes are loaded first; modal groups and execution order
//! then resolve their code lists against the G-code table and set the
//! back-links on each [`Gcode`].

use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Display, Formatter};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use super::schema::{
    ExecutionGroupDef, FlavorFile, GcodeDef, GroupKind, LetterDef, ModalGroupDef, ParameterDef,
};
use crate::ast::{Number, ParameterResolver, Word, AXIS_LETTERS};
use crate::error::ConfigLoadError;

/// Execution order marker for comment processing
pub const COMMENT_MARKER: &str = "COMMENT";

static RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z])(\d+(?:\.\d+)?)\s*-\s*([A-Za-z])?(\d+(?:\.\d+)?)$")
        .expect("range pattern is valid")
});

static CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z])(\d+(?:\.\d+)?)?$")
        .expect("code pattern is valid")
});

/// Canonical spelling of a code: uppercase letter, number without leading
/// zeros or a trailing `.0` (`g01` and `G1.0` both give `G1`)
pub fn normalize_code(code: &str) -> Result<String, ConfigLoadError> {
    let invalid = || ConfigLoadError::InvalidCode(code.to_string());
    let captures = CODE.captures(code.trim()).ok_or_else(invalid)?;
    let letter = captures[1].to_ascii_uppercase();
    match captures.get(2) {
        Some(number) => {
            let value: f64 = number.as_str().parse().map_err(|_| invalid())?;
            Ok(format!("{}{}", letter, Number::normalized(value)))
        }
        None => Ok(letter),
    }
}

/// Sort key: letter, then the integer part zero-padded so that `G4` sorts
/// before `G10` and `G38` before `G38.2`
fn sort_key(code: &str) -> (char, String) {
    let mut chars = code.chars();
    let letter = chars.next().unwrap_or_default();
    let rest = chars.as_str();
    let (integer, fraction) = match rest.find('.') {
        Some(dot) => rest.split_at(dot),
        None => (rest, ""),
    };
    (letter, format!("{:0>5}{}", integer, fraction))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModalGroupId {
    pub kind: GroupKind,
    pub index: u32,
}

impl ModalGroupId {
    pub fn new(kind: GroupKind, index: u32) -> Self {
        Self { kind, index }
    }
}

impl Display for ModalGroupId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.index, self.kind)
    }
}

/// One entry of the G-code table
#[derive(Debug, Clone, PartialEq)]
pub struct Gcode {
    code: String,
    meaning: String,
    doc: Option<String>,
    modal_group: Option<ModalGroupId>,
    execution_order: Option<u32>,
}

impl Gcode {
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn meaning(&self) -> &str {
        &self.meaning
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn modal_group(&self) -> Option<ModalGroupId> {
        self.modal_group
    }

    /// Index of the execution order group
    pub fn execution_order(&self) -> Option<u32> {
        self.execution_order
    }
}

#[derive(Debug, Clone, Default)]
pub struct GcodeSet {
    gcodes: HashMap<String, Gcode>,
    sorted: Vec<String>,
}

impl GcodeSet {
    fn from_defs(defs: Vec<GcodeDef>) -> Result<Self, ConfigLoadError> {
        let mut gcodes = HashMap::with_capacity(defs.len());
        for def in defs {
            let code = normalize_code(&def.code)?;
            if gcodes.contains_key(&code) {
                return Err(ConfigLoadError::DuplicateEntry {
                    table: "gcode",
                    key: code,
                });
            }
            let gcode = Gcode {
                code: code.clone(),
                meaning: def.meaning,
                doc: def.doc,
                modal_group: None,
                execution_order: None,
            };
            gcodes.insert(code, gcode);
        }
        let mut sorted: Vec<String> = gcodes.keys().cloned().collect();
        sorted.sort_by_cached_key(|code| sort_key(code));
        Ok(Self { gcodes, sorted })
    }

    pub fn get(&self, code: &str) -> Option<&Gcode> {
        self.gcodes.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.gcodes.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.gcodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gcodes.is_empty()
    }

    /// Codes in canonical order
    pub fn sorted(&self) -> &[String] {
        &self.sorted
    }

    pub fn iter(&self) -> impl Iterator<Item = &Gcode> {
        self.sorted.iter().filter_map(|code| self.gcodes.get(code))
    }

    /// Every code from `start` to `stop` inclusive, in canonical order
    pub fn range(&self, start: &str, stop: &str) -> Result<&[String], ConfigLoadError> {
        let position = |code: &str| {
            self.sorted
                .iter()
                .position(|c| c == code)
                .ok_or_else(|| ConfigLoadError::UnknownGcode {
                    table: "range".to_string(),
                    code: code.to_string(),
                })
        };
        let first = position(start)?;
        let last = position(stop)?;
        if first > last {
            return Err(ConfigLoadError::InvalidRange(format!("{}-{}", start, stop)));
        }
        Ok(&self.sorted[first..=last])
    }

    /// Resolve one entry of a group: a single code or a range like `G1-G3`
    pub fn expand(&self, entry: &str, table: &str) -> Result<Vec<String>, ConfigLoadError> {
        if let Some(captures) = RANGE.captures(entry.trim()) {
            let letter = &captures[1];
            let stop_letter = captures.get(3).map_or(letter, |m| m.as_str());
            if !letter.eq_ignore_ascii_case(stop_letter) {
                return Err(ConfigLoadError::MalformedRange(entry.to_string()));
            }
            let start = normalize_code(&format!("{}{}", letter, &captures[2]))?;
            let stop = normalize_code(&format!("{}{}", letter, &captures[4]))?;
            return self.range(&start, &stop).map(<[String]>::to_vec);
        }
        if entry.contains('-') {
            return Err(ConfigLoadError::MalformedRange(entry.to_string()));
        }
        let code = normalize_code(entry)?;
        if self.contains(&code) {
            Ok(vec![code])
        } else {
            Err(ConfigLoadError::UnknownGcode {
                table: table.to_string(),
                code,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModalGroup {
    id: ModalGroupId,
    meaning: String,
    gcodes: Vec<String>,
}

impl ModalGroup {
    pub fn id(&self) -> ModalGroupId {
        self.id
    }

    pub fn meaning(&self) -> &str {
        &self.meaning
    }

    pub fn gcodes(&self) -> &[String] {
        &self.gcodes
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModalGroupSet {
    groups: BTreeMap<ModalGroupId, ModalGroup>,
}

impl ModalGroupSet {
    pub fn get(&self, id: ModalGroupId) -> Option<&ModalGroup> {
        self.groups.get(&id)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModalGroup> {
        self.groups.values()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionItem {
    Comment,
    Gcode(String),
}

impl Display for ExecutionItem {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ExecutionItem::Comment => f.write_str(COMMENT_MARKER),
            ExecutionItem::Gcode(code) => f.write_str(code),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionGroup {
    index: u32,
    meaning: String,
    items: Vec<ExecutionItem>,
}

impl ExecutionGroup {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn meaning(&self) -> &str {
        &self.meaning
    }

    pub fn items(&self) -> &[ExecutionItem] {
        &self.items
    }

    pub fn is_comment(&self) -> bool {
        self.items.contains(&ExecutionItem::Comment)
    }
}

/// Execution order groups, indexed 1..=N without gaps
#[derive(Debug, Clone, Default)]
pub struct ExecutionOrder {
    groups: Vec<ExecutionGroup>,
}

impl ExecutionOrder {
    pub fn get(&self, index: u32) -> Option<&ExecutionGroup> {
        let position = usize::try_from(index).ok()?.checked_sub(1)?;
        self.groups.get(position)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExecutionGroup> {
        self.groups.iter()
    }

    /// Index of the group that processes comments
    pub fn comment_index(&self) -> Option<u32> {
        self.groups
            .iter()
            .find(|group| group.is_comment())
            .map(ExecutionGroup::index)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Letter {
    letter: char,
    meaning: String,
}

impl Letter {
    pub fn letter(&self) -> char {
        self.letter
    }

    pub fn meaning(&self) -> &str {
        &self.meaning
    }
}

#[derive(Debug, Clone, Default)]
pub struct LetterSet {
    letters: BTreeMap<char, Letter>,
}

impl LetterSet {
    fn from_defs(defs: Vec<LetterDef>) -> Result<Self, ConfigLoadError> {
        let mut letters = BTreeMap::new();
        for def in defs {
            let mut chars = def.letter.trim().chars();
            let letter = match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphabetic() => c.to_ascii_uppercase(),
                _ => return Err(ConfigLoadError::InvalidLetter(def.letter)),
            };
            if letters.contains_key(&letter) {
                return Err(ConfigLoadError::DuplicateEntry {
                    table: "letter",
                    key: letter.to_string(),
                });
            }
            letters.insert(
                letter,
                Letter {
                    letter,
                    meaning: def.meaning,
                },
            );
        }
        Ok(Self { letters })
    }

    pub fn get(&self, letter: char) -> Option<&Letter> {
        self.letters.get(&letter.to_ascii_uppercase())
    }

    pub fn len(&self) -> usize {
        self.letters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Letter> {
        self.letters.values()
    }

    /// Letters that select entries of the G-code table
    pub fn gm_letters(&self) -> Vec<&Letter> {
        self.iter()
            .filter(|letter| matches!(letter.letter, 'G' | 'M'))
            .collect()
    }

    pub fn axis_letters(&self) -> Vec<&Letter> {
        self.iter()
            .filter(|letter| AXIS_LETTERS.contains(&letter.letter))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    index: u32,
    value: f64,
    meaning: String,
}

impl Parameter {
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Default value
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn meaning(&self) -> &str {
        &self.meaning
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParameterSet {
    parameters: BTreeMap<u32, Parameter>,
}

impl ParameterSet {
    fn from_defs(defs: Vec<ParameterDef>) -> Result<Self, ConfigLoadError> {
        let mut parameters = BTreeMap::new();
        for def in defs {
            if parameters.contains_key(&def.index) {
                return Err(ConfigLoadError::DuplicateEntry {
                    table: "parameter",
                    key: def.index.to_string(),
                });
            }
            parameters.insert(
                def.index,
                Parameter {
                    index: def.index,
                    value: def.value,
                    meaning: def.meaning,
                },
            );
        }
        Ok(Self { parameters })
    }

    pub fn get(&self, index: u32) -> Option<&Parameter> {
        self.parameters.get(&index)
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.values()
    }
}

/// Resolves parameters to their default values
impl ParameterResolver for ParameterSet {
    fn numbered(&self, index: u32) -> Option<f64> {
        self.get(index).map(Parameter::value)
    }
}

/// Complete set of tables describing one machine
#[derive(Debug, Clone)]
pub struct Flavor {
    pub name: String,
    pub version: Option<String>,
    pub description: Option<String>,
    gcodes: GcodeSet,
    letters: LetterSet,
    modal_groups: ModalGroupSet,
    execution_order: ExecutionOrder,
    parameters: ParameterSet,
}

impl Flavor {
    /// Build and cross-check every table of a flavor file
    pub fn load(file: FlavorFile) -> Result<Self, ConfigLoadError> {
        let mut gcodes = GcodeSet::from_defs(file.gcodes)?;
        let letters = LetterSet::from_defs(file.letters)?;
        let parameters = ParameterSet::from_defs(file.parameters)?;
        let modal_groups = load_modal_groups(&mut gcodes, file.modal_groups)?;
        let execution_order = load_execution_order(&mut gcodes, file.execution_order)?;

        debug!(
            "loaded flavor '{}': {} gcodes, {} letters, {} modal groups, {} execution groups, {} parameters",
            file.flavor.name,
            gcodes.len(),
            letters.len(),
            modal_groups.len(),
            execution_order.len(),
            parameters.len()
        );

        Ok(Self {
            name: file.flavor.name,
            version: file.flavor.version,
            description: file.flavor.description,
            gcodes,
            letters,
            modal_groups,
            execution_order,
            parameters,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigLoadError> {
        Self::load(FlavorFile::from_toml(content)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn gcodes(&self) -> &GcodeSet {
        &self.gcodes
    }

    pub fn letters(&self) -> &LetterSet {
        &self.letters
    }

    pub fn modal_groups(&self) -> &ModalGroupSet {
        &self.modal_groups
    }

    pub fn execution_order(&self) -> &ExecutionOrder {
        &self.execution_order
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    /// Table entry selected by a word: `G1` or `M3` by code, `F`, `S` and
    /// `T` by letter alone
    pub fn gcode_for_word(&self, word: &Word) -> Option<&Gcode> {
        match word.code() {
            Some(code) => self.gcodes.get(&code),
            None if word.is_gm() => None,
            None => self.gcodes.get(&word.letter().to_string()),
        }
    }

    pub fn modal_group_of(&self, gcode: &Gcode) -> Option<&ModalGroup> {
        self.modal_groups.get(gcode.modal_group?)
    }

    pub fn execution_group_of(&self, gcode: &Gcode) -> Option<&ExecutionGroup> {
        self.execution_order.get(gcode.execution_order?)
    }

    /// Meaning of a word: the G-code table entry when there is one,
    /// otherwise the letter's meaning
    pub fn describe_word(&self, word: &Word) -> Option<&str> {
        self.gcode_for_word(word)
            .map(Gcode::meaning)
            .or_else(|| self.letters.get(word.letter()).map(Letter::meaning))
    }
}

fn load_modal_groups(
    gcodes: &mut GcodeSet,
    defs: Vec<ModalGroupDef>,
) -> Result<ModalGroupSet, ConfigLoadError> {
    let mut groups = BTreeMap::new();
    for def in defs {
        let id = ModalGroupId::new(def.kind, def.index);
        if groups.contains_key(&id) {
            return Err(ConfigLoadError::DuplicateEntry {
                table: "modal group",
                key: id.to_string(),
            });
        }
        if def.gcodes.is_empty() {
            return Err(ConfigLoadError::MissingEntry {
                table: "modal group",
                key: id.to_string(),
            });
        }

        let mut members = Vec::new();
        for entry in &def.gcodes {
            members.extend(gcodes.expand(entry, "modal group")?);
        }
        for code in &members {
            if let Some(gcode) = gcodes.gcodes.get_mut(code) {
                if let Some(existing) = gcode.modal_group {
                    return Err(ConfigLoadError::AlreadyAssigned {
                        code: code.clone(),
                        table: "modal group",
                        existing: existing.to_string(),
                    });
                }
                gcode.modal_group = Some(id);
            }
        }

        groups.insert(
            id,
            ModalGroup {
                id,
                meaning: def.meaning,
                gcodes: members,
            },
        );
    }
    Ok(ModalGroupSet { groups })
}

fn load_execution_order(
    gcodes: &mut GcodeSet,
    defs: Vec<ExecutionGroupDef>,
) -> Result<ExecutionOrder, ConfigLoadError> {
    let mut groups = Vec::with_capacity(defs.len());
    for (expected, def) in (1..).zip(defs) {
        if def.index != expected {
            return Err(ConfigLoadError::UnexpectedIndex {
                found: def.index,
                expected,
            });
        }
        if def.gcodes.is_empty() {
            return Err(ConfigLoadError::MissingEntry {
                table: "execution order group",
                key: def.index.to_string(),
            });
        }

        let mut items = Vec::new();
        for entry in &def.gcodes {
            if entry.trim() == COMMENT_MARKER {
                items.push(ExecutionItem::Comment);
                continue;
            }
            for code in gcodes.expand(entry, "execution order")? {
                if let Some(gcode) = gcodes.gcodes.get_mut(&code) {
                    if let Some(existing) = gcode.execution_order {
                        return Err(ConfigLoadError::AlreadyAssigned {
                            code,
                            table: "execution order group",
                            existing: existing.to_string(),
                        });
                    }
                    gcode.execution_order = Some(def.index);
                }
                items.push(ExecutionItem::Gcode(code));
            }
        }

        groups.push(ExecutionGroup {
            index: def.index,
            meaning: def.meaning,
            items,
        });
    }
    Ok(ExecutionOrder { groups })
}
