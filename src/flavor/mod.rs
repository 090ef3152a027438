//! Flavor System
//!
//! A flavor is the set of configuration tables of one machine: G-codes,
//! letters, modal groups, execution order and default parameters.

pub mod registry;
pub mod schema;
pub mod tables;

pub use registry::{builtin_flavor, FlavorRegistry, BUILTIN_FLAVOR};
pub use schema::{FlavorFile, GroupKind};
pub use tables::{
    normalize_code, ExecutionGroup, ExecutionItem, ExecutionOrder, Flavor, Gcode, GcodeSet,
    Letter, LetterSet, ModalGroup, ModalGroupId, ModalGroupSet, Parameter, ParameterSet,
    COMMENT_MARKER,
};
