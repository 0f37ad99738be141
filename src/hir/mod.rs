//! Package model: files grouped into packages, resolved types and the
//! record/field/method views over them.
//!
//! ```text
//! Directory ─┬─ Package ─┬─ SourceFile ...
//!            │           ├─ TypeInfo (once, unless files-only)
//!            │           └─ records() → Record → fields() → Field
//!            │                                  └ methods() → Method
//!            └─ Package (`_test`, when requested)
//! ```

mod check;
mod ids;
mod package;
mod record;
mod sizes;
mod source;
mod tag;
mod types;

pub use check::{
    CheckRequest, DeclChecker, ExprId, ImportResolver, PackageTypes, TypeChecker, TypeError,
    TypeInfo, default_package_name,
};
pub use ids::RecordId;
pub use package::{Directory, ExternalResolver, Package};
pub use record::{Field, Method, Record};
pub use sizes::StdSizes;
pub use source::FileSet;
pub use tag::StructTag;
pub use types::{BasicKind, ItemTypeName, Shape, StructField, Type, TypeName};
