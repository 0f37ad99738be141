//! Opening packages by path.
//!
//! [`Loader`] ties the pieces together: it resolves an input path against the
//! configured roots, scans and filters the directory, groups files into
//! packages and has each package type checked. Every `open` builds a fresh
//! snapshot with its own [`FileSet`] and its own import cache.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use tracing::{debug, trace};

use super::context::BuildContext;
use super::resolve::{CanonicalPackageRef, PathResolver, clean};
use super::scan::scan_dir;
use crate::error::{Error, ImportFailure, Result};
use crate::hir::{
    CheckRequest, DeclChecker, Directory, ExternalResolver, FileSet, ImportResolver, Package,
    PackageTypes, TypeChecker,
};
use crate::syntax::SourceFile;

/// Which files and packages of a directory [`Loader::open`] keeps.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct OpenOptions {
    /// Keep `*_test.go` files.
    pub include_test_files: bool,
    /// Keep the external `_test` package, if test files are kept.
    pub include_test_package: bool,
    /// Skip type checking; type queries on the packages then fail.
    pub files_only: bool,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include_test_files(mut self, yes: bool) -> Self {
        self.include_test_files = yes;
        self
    }

    pub fn include_test_package(mut self, yes: bool) -> Self {
        self.include_test_package = yes;
        self
    }

    pub fn files_only(mut self, yes: bool) -> Self {
        self.files_only = yes;
        self
    }
}

/// Entry point: opens Go packages by import path or directory.
pub struct Loader {
    context: BuildContext,
    checker: Arc<dyn TypeChecker>,
    external: Option<Arc<dyn ExternalResolver>>,
}

impl Loader {
    /// A loader using [`DeclChecker`] and no external resolver.
    pub fn new(context: BuildContext) -> Self {
        Self {
            context,
            checker: Arc::new(DeclChecker),
            external: None,
        }
    }

    pub fn with_checker(mut self, checker: Arc<dyn TypeChecker>) -> Self {
        self.checker = checker;
        self
    }

    /// Fallback for paths found under no root.
    pub fn with_external_resolver(mut self, resolver: Arc<dyn ExternalResolver>) -> Self {
        self.external = Some(resolver);
        self
    }

    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    fn working_dir(&self) -> Result<PathBuf> {
        match &self.context.working_dir {
            Some(dir) => Ok(dir.clone()),
            None => env::current_dir().map_err(|err| Error::filesystem(".", err)),
        }
    }

    pub fn resolve(&self, input: &str) -> Result<CanonicalPackageRef> {
        PathResolver::new(&self.context.roots, self.working_dir()?).resolve(input)
    }

    /// Resolves `input` and opens the packages of its directory.
    ///
    /// When `input` resolves under no root and an external resolver is set,
    /// the resolver's package is returned as the only package, untouched.
    pub fn open(&self, input: &str, options: OpenOptions) -> Result<Directory> {
        let session = ImportSession::new(self);
        let directory = self.open_in(&session, input, options)?;
        session.finish()?;
        Ok(directory)
    }

    pub fn open_resolved(
        &self,
        resolved: &CanonicalPackageRef,
        options: OpenOptions,
    ) -> Result<Directory> {
        let session = ImportSession::new(self);
        let directory = self.open_resolved_in(&session, resolved, options)?;
        session.finish()?;
        Ok(directory)
    }

    fn open_in(
        &self,
        session: &ImportSession<'_>,
        input: &str,
        options: OpenOptions,
    ) -> Result<Directory> {
        let resolved = match self.resolve(input) {
            Ok(resolved) => resolved,
            Err(err) if err.is_not_found() => {
                let Some(external) = &self.external else {
                    return Err(err);
                };
                debug!(input, "not under any root, using external resolver");
                let package = external.import(input).map_err(|source| Error::External {
                    path: input.to_string(),
                    source,
                })?;
                return Ok(Directory::new(Arc::clone(package.file_set()), vec![package]));
            }
            Err(err) => return Err(err),
        };
        self.open_resolved_in(session, &resolved, options)
    }

    fn open_resolved_in(
        &self,
        session: &ImportSession<'_>,
        resolved: &CanonicalPackageRef,
        options: OpenOptions,
    ) -> Result<Directory> {
        let file_set = Arc::new(FileSet::new());
        let files = scan_dir(&file_set, &resolved.dir, false)?;

        let mut groups: IndexMap<SmolStr, Vec<SourceFile>> = IndexMap::new();
        for file in files {
            if !file.passes(&self.context.tags) {
                trace!(file = %file.path().display(), "excluded by build constraints");
                continue;
            }
            if file.is_test() && !options.include_test_files {
                continue;
            }
            groups
                .entry(SmolStr::from(file.package_name()))
                .or_default()
                .push(file);
        }

        let packages: Vec<Package> = groups
            .into_iter()
            .filter(|(name, _)| !name.ends_with("_test") || options.include_test_package)
            .map(|(name, files)| {
                Package::new(
                    name,
                    resolved.package_path.clone(),
                    resolved.dir.clone(),
                    resolved.root.clone(),
                    Arc::clone(&file_set),
                    files,
                )
            })
            .collect();

        if !options.files_only {
            let key = clean(&resolved.dir);
            let registered = session.enter(&key);
            let result = self.check_directory(session, &key, &packages);
            if registered {
                session.leave(&key);
            }
            result?;
        }

        debug!(
            dir = %resolved.dir.display(),
            packages = ?packages.iter().map(Package::name).collect::<Vec<_>>(),
            "opened directory"
        );
        Ok(Directory::new(file_set, packages))
    }

    /// Checks the primary package before any `_test` package, publishing its
    /// types first: an external test package may import its package under
    /// test.
    fn check_directory(
        &self,
        session: &ImportSession<'_>,
        key: &Path,
        packages: &[Package],
    ) -> Result<()> {
        let (tests, primary): (Vec<&Package>, Vec<&Package>) =
            packages.iter().partition(|package| package.is_test_package());
        for package in primary {
            self.check(session, package)?;
            session.publish(key, Arc::clone(&package.type_info()?.package));
        }
        for package in tests {
            self.check(session, package)?;
        }
        Ok(())
    }

    fn check(&self, session: &ImportSession<'_>, package: &Package) -> Result<()> {
        let request = CheckRequest {
            dir: package.dir(),
            package_path: package.path(),
            package_name: package.name(),
            file_set: package.file_set(),
            files: package.files(),
            importer: session,
        };
        let info = self.checker.check(request).map_err(|source| Error::TypeCheck {
            dir: package.dir().to_path_buf(),
            package: package.name().to_string(),
            source,
        })?;
        package.attach_type_info(Arc::new(info));
        Ok(())
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("context", &self.context)
            .field("external", &self.external.is_some())
            .finish()
    }
}

impl Package {
    /// Opens every package this package imports, in parallel.
    ///
    /// Imports are opened without test files. Failures do not stop the other
    /// imports; they are all reported together in [`Error::Imports`].
    pub fn imports(&self, loader: &Loader, files_only: bool) -> Result<Vec<Package>> {
        let options = OpenOptions::new().files_only(files_only);
        let paths: Vec<&str> = self
            .import_paths()
            .into_iter()
            .filter(|path| *path != "C")
            .collect();

        let results: Vec<(&str, Result<Directory>)> = paths
            .par_iter()
            .map(|path| (*path, loader.open(path, options)))
            .collect();

        let mut packages = Vec::new();
        let mut failures = Vec::new();
        for (path, result) in results {
            match result {
                Ok(directory) => packages.extend(
                    directory
                        .into_packages()
                        .into_iter()
                        .filter(|package| !package.is_test_package()),
                ),
                Err(error) => failures.push(ImportFailure {
                    path: path.to_string(),
                    error,
                }),
            }
        }

        if failures.is_empty() {
            Ok(packages)
        } else {
            Err(Error::Imports {
                package: self.path().to_string(),
                failures,
            })
        }
    }
}

/// Import cache for the type checks of one `open` call, keyed by package
/// directory.
struct ImportSession<'l> {
    loader: &'l Loader,
    cache: Mutex<FxHashMap<PathBuf, Arc<PackageTypes>>>,
    in_progress: Mutex<FxHashSet<PathBuf>>,
    cycle: Mutex<Option<String>>,
}

impl<'l> ImportSession<'l> {
    fn new(loader: &'l Loader) -> Self {
        Self {
            loader,
            cache: Mutex::new(FxHashMap::default()),
            in_progress: Mutex::new(FxHashSet::default()),
            cycle: Mutex::new(None),
        }
    }

    /// Marks `dir` as being checked; `false` if it already was.
    fn enter(&self, dir: &Path) -> bool {
        self.in_progress.lock().insert(dir.to_path_buf())
    }

    fn leave(&self, dir: &Path) {
        self.in_progress.lock().remove(dir);
    }

    /// Makes the checked primary package of `dir` available to importers.
    fn publish(&self, dir: &Path, types: Arc<PackageTypes>) {
        self.cache.lock().entry(dir.to_path_buf()).or_insert(types);
    }

    /// Reports an import cycle met during the session, even if the checker
    /// tolerated the failed import.
    fn finish(self) -> Result<()> {
        match self.cycle.into_inner() {
            Some(path) => Err(Error::ImportCycle { path }),
            None => Ok(()),
        }
    }

    fn load(&self, path: &str, resolved: &CanonicalPackageRef) -> Result<Arc<PackageTypes>> {
        let directory = self
            .loader
            .open_resolved_in(self, resolved, OpenOptions::new())?;
        let package = directory
            .into_packages()
            .into_iter()
            .find(|package| !package.is_test_package())
            .ok_or_else(|| Error::NotFound {
                input: path.to_string(),
                roots: self.loader.context.roots.to_vec(),
            })?;
        let info = package.type_info()?;
        Ok(Arc::clone(&info.package))
    }
}

impl ImportResolver for ImportSession<'_> {
    fn import(&self, path: &str) -> Result<Arc<PackageTypes>> {
        let resolved = self.loader.resolve(path)?;
        let key = clean(&resolved.dir);
        if let Some(types) = self.cache.lock().get(&key) {
            return Ok(Arc::clone(types));
        }
        if self.in_progress.lock().contains(&key) {
            debug!(import = path, "import cycle");
            self.cycle.lock().get_or_insert_with(|| path.to_string());
            return Err(Error::ImportCycle {
                path: path.to_string(),
            });
        }

        let types = self.load(path, &resolved)?;
        self.publish(&key, Arc::clone(&types));
        Ok(types)
    }
}
