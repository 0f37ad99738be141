//! One parsed Go source file.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use smol_str::SmolStr;

use super::ast::{Comment, ImportSpec, MethodDecl, StructType, TypeDecl, TypeSpec};
use super::constraint::{BuildConstraints, BuildTags};
use crate::base::{FileId, TextRange};

static GO_GENERATE_COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"go:generate ([0-9A-Za-z_\.]+)").expect("go:generate pattern is valid")
});

/// A parsed `.go` file: its declarations, comments and build constraints.
///
/// Created by the scanner and then moved into exactly one
/// [`Package`](crate::hir::Package). Never mutated afterwards.
#[derive(Clone, Debug)]
pub struct SourceFile {
    pub(crate) id: FileId,
    pub(crate) path: PathBuf,
    pub(crate) package_name: SmolStr,
    pub(crate) package_range: TextRange,
    pub(crate) imports: Vec<ImportSpec>,
    pub(crate) type_decls: Vec<TypeDecl>,
    pub(crate) methods: Vec<MethodDecl>,
    pub(crate) comments: Vec<Comment>,
    pub(crate) constraints: BuildConstraints,
}

impl SourceFile {
    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the file.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new(""))
    }

    /// Name from the `package` clause.
    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn package_range(&self) -> TextRange {
        self.package_range
    }

    /// `*_test.go` files.
    pub fn is_test(&self) -> bool {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with("_test.go"))
    }

    pub fn imports(&self) -> &[ImportSpec] {
        &self.imports
    }

    pub fn import_paths(&self) -> impl Iterator<Item = &str> {
        self.imports.iter().map(|import| import.path.as_str())
    }

    pub fn type_decls(&self) -> &[TypeDecl] {
        &self.type_decls
    }

    /// Method declarations (functions with a receiver), in source order.
    pub fn methods(&self) -> &[MethodDecl] {
        &self.methods
    }

    /// Every comment of the file, in source order.
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn constraints(&self) -> &BuildConstraints {
        &self.constraints
    }

    /// Whether the file belongs to a build with the given tags.
    pub fn passes(&self, tags: &BuildTags) -> bool {
        self.constraints.passes(tags)
    }

    /// Struct type specs in source order, with the declaration carrying their doc.
    ///
    /// The position of a spec in this sequence is its record's local id.
    pub fn struct_specs(&self) -> impl Iterator<Item = (&TypeDecl, &TypeSpec, &StructType)> {
        self.type_decls.iter().flat_map(|decl| {
            decl.specs
                .iter()
                .filter_map(move |spec| spec.struct_type().map(|st| (decl, spec, st)))
        })
    }

    /// Generator names from `//go:generate <name> ...` comments.
    pub fn go_generate_tags(&self) -> Vec<&str> {
        self.comments
            .iter()
            .filter_map(|comment| GO_GENERATE_COMMENT.captures(&comment.text))
            .filter_map(|captures| captures.get(1))
            .map(|tag| tag.as_str())
            .collect()
    }
}

impl fmt::Display for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.path.display(), self.package_name)
    }
}
