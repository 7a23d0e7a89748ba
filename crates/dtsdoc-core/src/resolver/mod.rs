//! Package.json `exports` resolution.
//!
//! [`ExportsTree`] is the parsed shape of the field; [`resolve_exports`]
//! selects one target per subpath under a [`ConditionSet`] and produces an
//! [`ExportMap`] of absolute paths.

mod exports;
mod tree;

pub use exports::{resolve_exports, ConditionSet, ExportMap, DEFAULT_CONDITION};
pub use tree::ExportsTree;
