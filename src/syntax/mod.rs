//! Go source syntax: the parsed file model and build constraints.
//!
//! Parsing is delegated to tree-sitter; [`parse_source`] lowers its tree into
//! the owned [`ast`] types held by a [`SourceFile`].

pub mod ast;
pub mod constraint;
mod file;
mod literal;
mod parser;

pub use constraint::{BuildConstraints, BuildTags, ConstraintError};
pub use file::SourceFile;
pub use literal::unquote;
pub use parser::parse_source;
