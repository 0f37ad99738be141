//! # gosrc-base
//!
//! In-memory, queryable model of a Go source tree: packages, their files,
//! struct declarations with resolved field types, and the methods bound to
//! them.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! project → Path resolution, directory scanning, the Loader entry point
//!   ↓
//! hir     → Packages, type resolution, records/fields/methods
//!   ↓
//! syntax  → tree-sitter lowering, build constraints
//!   ↓
//! base    → Primitives (FileId, TextRange, LineCol, Position)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use gosrc::{BuildContext, Loader, OpenOptions};
//!
//! let loader = Loader::new(BuildContext::from_env());
//! let dir = loader.open("github.com/me/project/model", OpenOptions::default())?;
//! for package in dir.packages() {
//!     for record in package.records_with_marker("model") {
//!         for field in record.fields()? {
//!             println!("{}.{} {}", record.name(), field.name(), field.ty());
//!         }
//!     }
//! }
//! # Ok::<(), gosrc::Error>(())
//! ```

/// Foundation types: FileId, spans, positions
pub mod base;

/// Crate error type
pub mod error;

/// Package model and type resolution
pub mod hir;

/// Filesystem-facing loading
pub mod project;

/// Go source parsing and build constraints
pub mod syntax;

pub use base::{FileId, LineCol, LineIndex, Position, TextRange, TextSize};
pub use error::{BoxError, Error, ImportFailure, Result};
pub use hir::{
    Directory, ExternalResolver, Field, FileSet, Method, Package, Record, RecordId, Shape, Type,
    TypeChecker, TypeInfo,
};
pub use project::{BuildContext, CanonicalPackageRef, Loader, OpenOptions, RootSet};
pub use syntax::{BuildTags, SourceFile};
