//! Flavor Schema Types
//!
//! Raw shape of a flavor TOML file. Nothing here is cross-checked; see
//! [`Flavor::load`](super::Flavor::load) for the resolved tables.

use std::fmt::{self, Display, Formatter};

use serde::Deserialize;

use crate::error::ConfigLoadError;

/// Root flavor file structure (matches TOML)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FlavorFile {
    pub flavor: FlavorMeta,
    #[serde(default)]
    pub gcodes: Vec<GcodeDef>,
    #[serde(default)]
    pub letters: Vec<LetterDef>,
    #[serde(default)]
    pub modal_groups: Vec<ModalGroupDef>,
    #[serde(default)]
    pub execution_order: Vec<ExecutionGroupDef>,
    #[serde(default)]
    pub parameters: Vec<ParameterDef>,
}

/// Flavor metadata
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FlavorMeta {
    pub name: String,
    pub version: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GcodeDef {
    pub code: String,
    pub meaning: String,
    pub doc: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LetterDef {
    pub letter: String,
    pub meaning: String,
}

/// G and M modal groups are numbered independently
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKind {
    #[default]
    G,
    M,
}

impl Display for GroupKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            GroupKind::G => f.write_str("G"),
            GroupKind::M => f.write_str("M"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModalGroupDef {
    pub index: u32,
    #[serde(default)]
    pub kind: GroupKind,
    pub meaning: String,
    /// Codes or ranges such as `G1-G3`
    pub gcodes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ExecutionGroupDef {
    pub index: u32,
    pub meaning: String,
    /// Codes, ranges, or `COMMENT`
    pub gcodes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ParameterDef {
    pub index: u32,
    pub value: f64,
    pub meaning: String,
}

impl FlavorFile {
    pub fn from_toml(content: &str) -> Result<Self, ConfigLoadError> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_file() {
        let file = FlavorFile::from_toml(
            r#"
[flavor]
name = "test"
"#,
        )
        .unwrap();
        assert_eq!(file.flavor.name, "test");
        assert_eq!(file.flavor.version, None);
        assert!(file.gcodes.is_empty());
        assert!(file.execution_order.is_empty());
    }

    #[test]
    fn test_group_kind_defaults_to_g() {
        let file = FlavorFile::from_toml(
            r#"
[flavor]
name = "test"

[[modal_groups]]
index = 1
meaning = "motion"
gcodes = ["G0", "G1-G3"]

[[modal_groups]]
index = 7
kind = "M"
meaning = "spindle turning"
gcodes = ["M3", "M4", "M5"]

[[parameters]]
index = 5220
value = 1
meaning = "coordinate system number"
"#,
        )
        .unwrap();
        assert_eq!(file.modal_groups[0].kind, GroupKind::G);
        assert_eq!(file.modal_groups[0].gcodes, vec!["G0", "G1-G3"]);
        assert_eq!(file.modal_groups[1].kind, GroupKind::M);
        assert_eq!(file.parameters[0].value, 1.0);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            FlavorFile::from_toml("[flavor"),
            Err(ConfigLoadError::Toml(_))
        ));
    }
}
