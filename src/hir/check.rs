//! Type resolution.
//!
//! Full Go type checking is out of reach of this crate, so it is a seam: the
//! [`TypeChecker`] trait takes one package's file group and produces a
//! [`TypeInfo`], the map from every type expression to its resolved [`Type`].
//! Packages the group imports are provided on demand by an [`ImportResolver`],
//! which the loader implements on top of the same path resolution it uses for
//! `open`.
//!
//! [`DeclChecker`] is the checker used by default. It resolves the type
//! expressions of type declarations, which is everything the record model
//! needs, and nothing inside function bodies.

use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use thiserror::Error;
use tracing::debug;

use super::source::FileSet;
use super::types::{BasicKind, StructField, Type, TypeName};
use crate::base::{FileId, LineCol, TextRange};
use crate::error::Result;
use crate::syntax::SourceFile;
use crate::syntax::ast::{StructType, TypeExpr, TypeExprKind, TypeSpec};

/// Underlying types of the universe's named types.
static UNIVERSE: LazyLock<FxHashMap<&'static str, Type>> = LazyLock::new(|| {
    FxHashMap::from_iter([
        ("error", Type::Interface("interface{ Error() string }".into())),
        ("comparable", Type::Interface("comparable".into())),
    ])
});

/// A type checker failure, positioned when the checker knows where.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{}{message}", location(file.as_deref(), *line_col))]
pub struct TypeError {
    pub message: String,
    pub file: Option<PathBuf>,
    pub line_col: Option<LineCol>,
}

impl TypeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            file: None,
            line_col: None,
        }
    }
}

fn location(file: Option<&Path>, line_col: Option<LineCol>) -> String {
    match (file, line_col) {
        (Some(file), Some(lc)) => format!("{}:{lc}: ", file.display()),
        (Some(file), None) => format!("{}: ", file.display()),
        _ => String::new(),
    }
}

/// Identity of a type expression: its file and byte range.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExprId {
    pub file: FileId,
    pub range: TextRange,
}

impl ExprId {
    pub fn of(file: FileId, expr: &TypeExpr) -> Self {
        Self {
            file,
            range: expr.range,
        }
    }
}

/// The package-level type declarations of one checked package.
#[derive(Clone, Debug, Default)]
pub struct PackageTypes {
    pub path: SmolStr,
    pub name: SmolStr,
    /// Declared type names: a `Named` type for definitions, the target for aliases.
    pub scope: IndexMap<SmolStr, Type>,
    /// Underlying type of each defined type.
    pub underlying: FxHashMap<TypeName, Type>,
    /// Packages that were loaded while checking this one, by import path.
    pub imports: FxHashMap<SmolStr, Arc<PackageTypes>>,
}

impl PackageTypes {
    pub fn new(path: impl Into<SmolStr>, name: impl Into<SmolStr>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Type> {
        self.scope.get(name)
    }

    /// Finds the package with `path` among this package and everything it
    /// imported, transitively.
    pub fn find_package(&self, path: &str) -> Option<&PackageTypes> {
        let mut seen = FxHashSet::default();
        let mut stack = vec![self];
        while let Some(pkg) = stack.pop() {
            if pkg.path == path {
                return Some(pkg);
            }
            if seen.insert(pkg.path.as_str()) {
                stack.extend(pkg.imports.values().map(Arc::as_ref));
            }
        }
        None
    }

    /// One step of underlying-type lookup for a named type.
    pub fn declared_underlying(&self, name: &TypeName) -> Option<&Type> {
        if name.path.is_empty() {
            return UNIVERSE.get(name.name.as_str());
        }
        self.find_package(&name.path)?.underlying.get(name)
    }

    /// The underlying type of `ty`: named types are followed until a type
    /// literal is reached. `None` if a name on the way is unknown.
    pub fn underlying<'t>(&'t self, ty: &'t Type) -> Option<&'t Type> {
        let mut seen: Vec<&TypeName> = Vec::new();
        let mut current = ty;
        while let Type::Named { name, .. } = current {
            if seen.contains(&name) {
                return None;
            }
            seen.push(name);
            current = self.declared_underlying(name)?;
        }
        Some(current)
    }
}

/// Result of checking one package's file group.
#[derive(Clone, Debug)]
pub struct TypeInfo {
    pub package: Arc<PackageTypes>,
    pub types: FxHashMap<ExprId, Type>,
}

impl TypeInfo {
    /// Resolved type of `expr`, which must come from the file with id `file`.
    pub fn type_of(&self, file: FileId, expr: &TypeExpr) -> Option<&Type> {
        self.types.get(&ExprId::of(file, expr))
    }

    pub fn underlying<'t>(&'t self, ty: &'t Type) -> Option<&'t Type> {
        self.package.underlying(ty)
    }
}

/// Provides the declarations of imported packages to a checker.
pub trait ImportResolver: Sync {
    fn import(&self, path: &str) -> Result<Arc<PackageTypes>>;
}

/// Everything a checker gets to see of one package.
#[derive(Clone, Copy)]
pub struct CheckRequest<'a> {
    pub dir: &'a Path,
    pub package_path: &'a str,
    pub package_name: &'a str,
    pub file_set: &'a FileSet,
    /// Exactly the files of the group, all declaring `package_name`.
    pub files: &'a [SourceFile],
    pub importer: &'a dyn ImportResolver,
}

pub trait TypeChecker: Send + Sync {
    fn check(&self, request: CheckRequest<'_>) -> Result<TypeInfo, TypeError>;
}

/// Resolves the type expressions of a package's type declarations.
///
/// Names are looked up in the enclosing declaration's type parameters, then
/// the package's own types, then dot-imported packages, then the universe.
/// Imports are loaded lazily, the first time a qualified name needs them. An
/// import that cannot be loaded is not an error: its types keep their names
/// and have no known layout.
#[derive(Copy, Clone, Debug, Default)]
pub struct DeclChecker;

impl TypeChecker for DeclChecker {
    fn check(&self, request: CheckRequest<'_>) -> Result<TypeInfo, TypeError> {
        let mut checker = Checker::new(&request);
        checker.collect_decls()?;

        let mut package = PackageTypes::new(request.package_path, request.package_name);
        let decls: Vec<(SmolStr, Decl<'_>)> = checker
            .decls
            .iter()
            .map(|(name, decl)| (name.clone(), *decl))
            .collect();
        for (name, decl) in &decls {
            if decl.spec.is_alias {
                let ty = checker.resolve_alias(name, *decl)?;
                package.scope.insert(name.clone(), ty);
            } else {
                let scope = Scope::of(*decl);
                let underlying = checker.resolve(scope, &decl.spec.ty)?;
                package
                    .scope
                    .insert(name.clone(), Type::named(request.package_path, name.clone()));
                package
                    .underlying
                    .insert(TypeName::new(request.package_path, name.clone()), underlying);
            }
        }

        package.imports = std::mem::take(&mut checker.imports)
            .into_iter()
            .filter_map(|(path, pkg)| pkg.map(|pkg| (path, pkg)))
            .collect();

        for (name, decl) in &decls {
            if decl.spec.is_alias {
                continue;
            }
            let ty = Type::named(request.package_path, name.clone());
            if package.underlying(&ty).is_none() && is_local_cycle(&package, &ty) {
                return Err(checker.error(
                    decl.file,
                    decl.spec.name_range,
                    format!("invalid recursive type {name}"),
                ));
            }
        }

        debug!(
            package = request.package_path,
            types = package.scope.len(),
            exprs = checker.types.len(),
            "resolved type declarations"
        );
        Ok(TypeInfo {
            package: Arc::new(package),
            types: checker.types,
        })
    }
}

/// True when following named types from `ty` inside `package` comes back to
/// a name already visited.
fn is_local_cycle(package: &PackageTypes, ty: &Type) -> bool {
    let mut seen = Vec::new();
    let mut current = ty;
    while let Type::Named { name, .. } = current {
        if name.path != package.path {
            return false;
        }
        if seen.contains(&name) {
            return true;
        }
        seen.push(name);
        match package.underlying.get(name) {
            Some(next) => current = next,
            None => return false,
        }
    }
    false
}

#[derive(Copy, Clone)]
struct Decl<'a> {
    file: &'a SourceFile,
    spec: &'a TypeSpec,
}

#[derive(Copy, Clone)]
struct Scope<'a> {
    file: &'a SourceFile,
    type_params: &'a [SmolStr],
}

impl<'a> Scope<'a> {
    fn of(decl: Decl<'a>) -> Self {
        Self {
            file: decl.file,
            type_params: &decl.spec.type_params,
        }
    }
}

struct Checker<'a> {
    package_path: &'a str,
    file_set: &'a FileSet,
    files: &'a [SourceFile],
    importer: &'a dyn ImportResolver,
    decls: IndexMap<SmolStr, Decl<'a>>,
    /// Loaded imports by path; `None` for imports that failed to load.
    imports: FxHashMap<SmolStr, Option<Arc<PackageTypes>>>,
    aliases: FxHashMap<SmolStr, Type>,
    resolving: FxHashSet<SmolStr>,
    types: FxHashMap<ExprId, Type>,
}

impl<'a> Checker<'a> {
    fn new(request: &CheckRequest<'a>) -> Self {
        Self {
            package_path: request.package_path,
            file_set: request.file_set,
            files: request.files,
            importer: request.importer,
            decls: IndexMap::new(),
            imports: FxHashMap::default(),
            aliases: FxHashMap::default(),
            resolving: FxHashSet::default(),
            types: FxHashMap::default(),
        }
    }

    fn error(&self, file: &SourceFile, range: TextRange, message: impl Into<String>) -> TypeError {
        TypeError {
            message: message.into(),
            file: Some(file.path().to_path_buf()),
            line_col: self.file_set.line_col(file.id(), range.start()),
        }
    }

    fn collect_decls(&mut self) -> Result<(), TypeError> {
        for file in self.files {
            for spec in file.type_decls().iter().flat_map(|decl| &decl.specs) {
                if self.decls.contains_key(&spec.name) {
                    return Err(self.error(
                        file,
                        spec.name_range,
                        format!("{} redeclared in this block", spec.name),
                    ));
                }
                self.decls.insert(spec.name.clone(), Decl { file, spec });
            }
        }
        Ok(())
    }

    fn resolve(&mut self, scope: Scope<'a>, expr: &'a TypeExpr) -> Result<Type, TypeError> {
        let ty = match &expr.kind {
            TypeExprKind::Name(name) => self.resolve_name(scope, name, expr)?,
            TypeExprKind::Qualified { package, name } => {
                self.resolve_qualified(scope, package, name, expr)?
            }
            TypeExprKind::Generic { base, args } => {
                let base_ty = self.resolve(scope, base)?;
                let args = args
                    .iter()
                    .map(|arg| self.resolve(scope, arg))
                    .collect::<Result<Vec<_>, _>>()?;
                match base_ty {
                    Type::Named { name, .. } => Type::Named { name, args },
                    other => {
                        return Err(self.error(
                            scope.file,
                            expr.range,
                            format!("{other} is not a generic type"),
                        ));
                    }
                }
            }
            TypeExprKind::Pointer(inner) => Type::Pointer(Box::new(self.resolve(scope, inner)?)),
            TypeExprKind::Slice(inner) => Type::Slice(Box::new(self.resolve(scope, inner)?)),
            TypeExprKind::Array { len, elem } => Type::Array {
                len: len.as_deref().and_then(parse_array_len),
                elem: Box::new(self.resolve(scope, elem)?),
            },
            TypeExprKind::Map { key, value } => Type::Map {
                key: Box::new(self.resolve(scope, key)?),
                value: Box::new(self.resolve(scope, value)?),
            },
            TypeExprKind::Chan { dir, elem } => Type::Chan {
                dir: *dir,
                elem: Box::new(self.resolve(scope, elem)?),
            },
            TypeExprKind::Struct(st) => Type::Struct(self.resolve_struct(scope, st)?),
            TypeExprKind::Interface(text) => Type::Interface(text.clone()),
            TypeExprKind::Func(text) => Type::Func(text.clone()),
            TypeExprKind::Paren(inner) => self.resolve(scope, inner)?,
            TypeExprKind::Unsupported(text) => {
                return Err(self.error(
                    scope.file,
                    expr.range,
                    format!("unsupported type expression '{text}'"),
                ));
            }
        };
        self.types.insert(ExprId::of(scope.file.id(), expr), ty.clone());
        Ok(ty)
    }

    fn resolve_struct(
        &mut self,
        scope: Scope<'a>,
        st: &'a StructType,
    ) -> Result<Vec<StructField>, TypeError> {
        let mut fields = Vec::new();
        for decl in &st.fields {
            let ty = self.resolve(scope, &decl.ty)?;
            if decl.is_embedded() {
                let name = match ty.leaf() {
                    Type::Named { name, .. } => name.name.clone(),
                    leaf => SmolStr::from(leaf.to_string()),
                };
                fields.push(StructField {
                    name,
                    ty,
                    embedded: true,
                });
            } else {
                fields.extend(decl.names.iter().map(|name| StructField {
                    name: name.clone(),
                    ty: ty.clone(),
                    embedded: false,
                }));
            }
        }
        Ok(fields)
    }

    fn resolve_name(
        &mut self,
        scope: Scope<'a>,
        name: &SmolStr,
        expr: &TypeExpr,
    ) -> Result<Type, TypeError> {
        if scope.type_params.contains(name) {
            return Ok(Type::TypeParam(name.clone()));
        }
        if let Some(decl) = self.decls.get(name).copied() {
            if decl.spec.is_alias {
                return self.resolve_alias(name, decl);
            }
            return Ok(Type::named(self.package_path, name.clone()));
        }
        let dot_imports: Vec<&str> = scope
            .file
            .imports()
            .iter()
            .filter(|import| import.name.as_deref() == Some("."))
            .map(|import| import.path.as_str())
            .collect();
        for path in dot_imports {
            if let Some(ty) = self.load(path).as_ref().and_then(|pkg| pkg.lookup(name)) {
                return Ok(ty.clone());
            }
        }
        universe(name).ok_or_else(|| self.error(scope.file, expr.range, format!("undefined: {name}")))
    }

    fn resolve_alias(&mut self, name: &SmolStr, decl: Decl<'a>) -> Result<Type, TypeError> {
        if let Some(ty) = self.aliases.get(name) {
            return Ok(ty.clone());
        }
        if !self.resolving.insert(name.clone()) {
            return Err(self.error(
                decl.file,
                decl.spec.name_range,
                format!("invalid recursive type alias {name}"),
            ));
        }
        let resolved = self.resolve(Scope::of(decl), &decl.spec.ty);
        self.resolving.remove(name);
        let ty = resolved?;
        self.aliases.insert(name.clone(), ty.clone());
        Ok(ty)
    }

    fn resolve_qualified(
        &mut self,
        scope: Scope<'a>,
        qualifier: &str,
        name: &str,
        expr: &TypeExpr,
    ) -> Result<Type, TypeError> {
        let path = self
            .import_path_for(scope.file, qualifier)
            .ok_or_else(|| self.error(scope.file, expr.range, format!("undefined: {qualifier}")))?;
        if path == "unsafe" {
            return match name {
                "Pointer" => Ok(Type::Basic(BasicKind::UnsafePointer)),
                _ => Err(self.error(scope.file, expr.range, format!("undefined: unsafe.{name}"))),
            };
        }
        match self.load(&path) {
            Some(pkg) => pkg.lookup(name).cloned().ok_or_else(|| {
                self.error(scope.file, expr.range, format!("undefined: {qualifier}.{name}"))
            }),
            None => Ok(Type::named(path, name)),
        }
    }

    /// Import path that `qualifier` refers to in `file`.
    ///
    /// Explicit import names win. Unnamed imports are matched by their
    /// declared package name, falling back to the name derived from the path
    /// for imports that cannot be loaded.
    fn import_path_for(&mut self, file: &'a SourceFile, qualifier: &str) -> Option<SmolStr> {
        let imports = file.imports();
        if let Some(import) = imports
            .iter()
            .find(|import| import.name.as_deref() == Some(qualifier))
        {
            return Some(import.path.clone());
        }

        let unnamed: Vec<&SmolStr> = imports
            .iter()
            .filter(|import| import.name.is_none())
            .map(|import| &import.path)
            .collect();
        let (likely, rest): (Vec<&SmolStr>, Vec<&SmolStr>) = unnamed
            .into_iter()
            .partition(|path| default_package_name(path) == qualifier);

        for path in likely {
            match self.load(path) {
                Some(pkg) if pkg.name != qualifier => {}
                _ => return Some(path.clone()),
            }
        }
        for path in rest {
            if self.load(path).is_some_and(|pkg| pkg.name == qualifier) {
                return Some(path.clone());
            }
        }
        None
    }

    fn load(&mut self, path: &str) -> Option<Arc<PackageTypes>> {
        if path == "unsafe" || path == "C" {
            return None;
        }
        if let Some(cached) = self.imports.get(path) {
            return cached.clone();
        }
        let loaded = match self.importer.import(path) {
            Ok(pkg) => Some(pkg),
            Err(err) => {
                debug!(import = path, error = %err, "import has no type information");
                None
            }
        };
        self.imports.insert(path.into(), loaded.clone());
        loaded
    }
}

fn universe(name: &str) -> Option<Type> {
    match name {
        "error" | "comparable" => Some(Type::named("", name)),
        "any" => Some(Type::Interface("any".into())),
        _ => BasicKind::from_name(name).map(Type::Basic),
    }
}

/// Package name conventionally implied by an import path: its last segment,
/// skipping a major-version suffix such as `/v2`.
pub fn default_package_name(path: &str) -> &str {
    let mut segments = path.rsplit('/');
    let last = segments.next().unwrap_or(path);
    let is_version = last.len() > 1
        && last.starts_with('v')
        && last[1..].bytes().all(|b| b.is_ascii_digit());
    match segments.next() {
        Some(prev) if is_version => prev,
        _ => last,
    }
}

fn parse_array_len(text: &str) -> Option<u64> {
    let digits = text.replace('_', "");
    let (radix, body) = match digits.get(..2) {
        Some("0x" | "0X") => (16, &digits[2..]),
        Some("0o" | "0O") => (8, &digits[2..]),
        Some("0b" | "0B") => (2, &digits[2..]),
        _ if digits.len() > 1 && digits.starts_with('0') => (8, &digits[1..]),
        _ => (10, digits.as_str()),
    };
    u64::from_str_radix(body, radix).ok()
}
