//! Packages and the directories they come from.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use smol_str::SmolStr;

use super::check::TypeInfo;
use super::ids::RecordId;
use super::record::{Method, Record};
use super::source::FileSet;
use crate::base::{FileId, Position, TextSize};
use crate::error::{BoxError, Error, Result};
use crate::syntax::SourceFile;

/// The files of one directory that declare the same package name.
///
/// A package owns its files. Type information is attached at most once, after
/// the package is built; packages opened files-only never get any.
#[derive(Debug)]
pub struct Package {
    name: SmolStr,
    path: String,
    dir: PathBuf,
    lookup_root: PathBuf,
    file_set: Arc<FileSet>,
    files: Vec<SourceFile>,
    type_info: OnceLock<Arc<TypeInfo>>,
}

impl Package {
    pub fn new(
        name: impl Into<SmolStr>,
        path: impl Into<String>,
        dir: impl Into<PathBuf>,
        lookup_root: impl Into<PathBuf>,
        file_set: Arc<FileSet>,
        files: Vec<SourceFile>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            dir: dir.into(),
            lookup_root: lookup_root.into(),
            file_set,
            files,
            type_info: OnceLock::new(),
        }
    }

    /// A package with no files, for resolvers that describe packages which
    /// do not exist on disk.
    pub fn synthetic(name: impl Into<SmolStr>, path: impl Into<String>) -> Self {
        Self::new(name, path, PathBuf::new(), PathBuf::new(), Arc::default(), Vec::new())
    }

    /// Declared package name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Import path, relative to [`lookup_root`](Self::lookup_root).
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Root the package was found under; empty for absolute inputs.
    pub fn lookup_root(&self) -> &Path {
        &self.lookup_root
    }

    pub fn file_set(&self) -> &Arc<FileSet> {
        &self.file_set
    }

    /// `_test` packages built from `*_test.go` files.
    pub fn is_test_package(&self) -> bool {
        self.name.ends_with("_test")
    }

    /// Attaches type information; returns `false` if some was already attached.
    pub fn attach_type_info(&self, info: Arc<TypeInfo>) -> bool {
        self.type_info.set(info).is_ok()
    }

    pub fn has_type_info(&self) -> bool {
        self.type_info.get().is_some()
    }

    pub fn type_info(&self) -> Result<&TypeInfo> {
        self.type_info
            .get()
            .map(Arc::as_ref)
            .ok_or_else(|| Error::MissingTypeInfo {
                package: self.path.clone(),
            })
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn file(&self, id: FileId) -> Option<&SourceFile> {
        self.files.iter().find(|file| file.id() == id)
    }

    pub fn find_file_by_path(&self, path: &Path) -> Option<&SourceFile> {
        self.files.iter().find(|file| file.path() == path)
    }

    /// Files carrying a `//go:generate <tag>` comment.
    pub fn files_by_go_generate_tag(&self, tag: &str) -> Vec<&SourceFile> {
        self.files
            .iter()
            .filter(|file| file.go_generate_tags().contains(&tag))
            .collect()
    }

    /// Distinct import paths of all files, in first-seen order.
    pub fn import_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = Vec::new();
        for path in self.files.iter().flat_map(SourceFile::import_paths) {
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
        paths
    }

    /// Struct types declared in the package, file by file in source order.
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.files.iter().flat_map(move |file| {
            file.struct_specs()
                .enumerate()
                .map(move |(local, (decl, spec, body))| {
                    Record::new(self, RecordId::new(file.id(), local as u32), file, decl, spec, body)
                })
        })
    }

    /// Records whose declaration doc has a `//go:<marker>` line.
    pub fn records_with_marker<'p>(&'p self, marker: &'p str) -> impl Iterator<Item = Record<'p>> {
        self.records().filter(move |record| record.has_marker(marker))
    }

    pub fn record(&self, id: RecordId) -> Option<Record<'_>> {
        let file = self.file(id.file)?;
        let (decl, spec, body) = file.struct_specs().nth(id.local as usize)?;
        Some(Record::new(self, id, file, decl, spec, body))
    }

    pub fn record_by_name(&self, name: &str) -> Option<Record<'_>> {
        self.records().find(|record| record.name() == name)
    }

    /// Method declarations with exactly one receiver parameter.
    pub fn methods(&self) -> impl Iterator<Item = Method<'_>> {
        self.files.iter().flat_map(move |file| {
            file.methods()
                .iter()
                .filter(|decl| decl.receivers.len() == 1)
                .map(move |decl| Method::new(self, file, decl))
        })
    }

    /// Methods whose receiver's base type is called `type_name`.
    pub fn methods_of<'p>(&'p self, type_name: &'p str) -> impl Iterator<Item = Method<'p>> {
        self.methods()
            .filter(move |method| method.receiver_type_name() == Some(type_name))
    }

    pub fn position(&self, file: FileId, offset: TextSize) -> Option<Position> {
        self.file_set.position(file, offset)
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.path, self.name)
    }
}

/// The packages found in one directory: the primary package and possibly an
/// external `_test` package, in the order their files were first seen.
#[derive(Debug)]
pub struct Directory {
    file_set: Arc<FileSet>,
    packages: Vec<Package>,
}

impl Directory {
    pub fn new(file_set: Arc<FileSet>, packages: Vec<Package>) -> Self {
        Self { file_set, packages }
    }

    pub fn file_set(&self) -> &Arc<FileSet> {
        &self.file_set
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn package(&self, name: &str) -> Option<&Package> {
        self.packages.iter().find(|package| package.name() == name)
    }

    pub fn into_packages(self) -> Vec<Package> {
        self.packages
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Supplies packages for import paths that resolve under no root.
///
/// The returned package is used as-is: it is not scanned, filtered or
/// checked by the loader.
pub trait ExternalResolver: Send + Sync {
    fn import(&self, path: &str) -> std::result::Result<Package, BoxError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_source;

    fn package(sources: &[(&str, &str)]) -> Package {
        let file_set = Arc::new(FileSet::new());
        let files = sources
            .iter()
            .map(|(name, text)| {
                let path = PathBuf::from("/src/demo").join(name);
                let id = file_set.file_id(&path);
                file_set.set_contents(id, *text);
                parse_source(id, &path, text).unwrap()
            })
            .collect();
        Package::new("demo", "demo", "/src/demo", "/src", file_set, files)
    }

    #[test]
    fn test_records_in_source_order() {
        let pkg = package(&[
            ("a.go", "package demo\n\ntype A struct{}\ntype N int\ntype B struct{}\n"),
            ("b.go", "package demo\n\n//go:model\ntype C struct{}\n"),
        ]);

        let names: Vec<_> = pkg.records().map(|r| r.name().to_string()).collect();
        assert_eq!(names, ["A", "B", "C"]);

        let ids: Vec<_> = pkg.records().map(|r| r.id()).collect();
        assert_eq!(ids[1], RecordId::new(FileId::new(0), 1));
        assert_eq!(ids[2], RecordId::new(FileId::new(1), 0));
        assert_eq!(pkg.record(ids[1]).map(|r| r.name().to_string()).as_deref(), Some("B"));
        assert!(pkg.record(RecordId::new(FileId::new(0), 5)).is_none());

        let marked: Vec<_> = pkg.records_with_marker("model").map(|r| r.name().to_string()).collect();
        assert_eq!(marked, ["C"]);
    }

    #[test]
    fn test_type_info_attaches_once() {
        let pkg = package(&[("a.go", "package demo\n")]);
        assert!(matches!(pkg.type_info(), Err(Error::MissingTypeInfo { .. })));

        let info = Arc::new(TypeInfo {
            package: Arc::default(),
            types: Default::default(),
        });
        assert!(pkg.attach_type_info(Arc::clone(&info)));
        assert!(!pkg.attach_type_info(info));
        assert!(pkg.type_info().is_ok());
    }

    #[test]
    fn test_file_lookups() {
        let pkg = package(&[
            ("a.go", "package demo\n\nimport \"fmt\"\n\n//go:generate stringer -type=Kind\n"),
            ("b.go", "package demo\n\nimport (\n\t\"fmt\"\n\t\"os\"\n)\n"),
        ]);

        assert_eq!(pkg.import_paths(), ["fmt", "os"]);
        let generated = pkg.files_by_go_generate_tag("stringer");
        assert_eq!(generated.len(), 1);
        assert_eq!(generated[0].path(), Path::new("/src/demo/a.go"));
        assert!(pkg.find_file_by_path(Path::new("/src/demo/b.go")).is_some());
        assert!(pkg.file(FileId::new(9)).is_none());
    }

    #[test]
    fn test_synthetic_package() {
        let pkg = Package::synthetic("ext", "example.com/ext");
        assert_eq!(pkg.to_string(), "example.com/ext (ext)");
        assert!(pkg.files().is_empty());
        assert!(!pkg.is_test_package());
    }
}
