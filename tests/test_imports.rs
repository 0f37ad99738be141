//! Cross-package type resolution and `Package::imports`.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use gosrc::hir::{ExternalResolver, ItemTypeName, Type};
use gosrc::{BoxError, BuildContext, Error, Loader, OpenOptions, Package};
use tempfile::TempDir;

// ============================================================================
// HELPERS
// ============================================================================

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

/// Two roots: `app` holds the importing packages, `lib` holds `lib/geo`.
struct Workspace {
    app: TempDir,
    lib: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let app = tempfile::tempdir().unwrap();
        let lib = tempfile::tempdir().unwrap();
        write(
            lib.path(),
            "lib/geo/point.go",
            "package geo\n\ntype Point struct {\n\tX, Y float64\n}\n\ntype Pt = Point\n\ntype Path []Point\n",
        );
        Self { app, lib }
    }

    fn loader(&self) -> Loader {
        let context = BuildContext::new()
            .with_root(self.app.path())
            .with_root(self.lib.path())
            .with_working_dir(self.app.path());
        Loader::new(context)
    }

    fn open(&self, input: &str) -> Package {
        self.loader()
            .open(input, OpenOptions::default())
            .unwrap()
            .into_packages()
            .remove(0)
    }
}

// ============================================================================
// TYPE RESOLUTION ACROSS ROOTS
// ============================================================================

#[test]
fn test_imported_struct_layout() {
    let ws = Workspace::new();
    write(
        ws.app.path(),
        "shapes/shapes.go",
        "package shapes\n\nimport \"lib/geo\"\n\ntype Shape struct {\n\tCenter geo.Point\n\tCorners []*geo.Pt\n\tTrail geo.Path\n}\n",
    );
    let package = ws.open("shapes");
    let shape = package.record_by_name("Shape").unwrap();

    let center = shape.field_by_name("Center").unwrap().unwrap();
    assert_eq!(center.ty(), &Type::named("lib/geo", "Point"));
    assert!(matches!(center.underlying(), Type::Struct(fields) if fields.len() == 2));
    assert_eq!(center.std_size(8, 8), Some(16));
    assert_eq!(
        center.item_type_name(),
        ItemTypeName {
            name: "Point".to_string(),
            path: "lib/geo".to_string(),
        }
    );

    // aliases resolve to what they stand for
    let corners = shape.field_by_name("Corners").unwrap().unwrap();
    assert_eq!(corners.ty().to_string(), "[]*lib/geo.Point");
    assert!(corners.is_slice());

    let trail = shape.field_by_name("Trail").unwrap().unwrap();
    assert!(trail.is_slice());
    assert_eq!(trail.item_type_name().name, "Path");
}

#[test]
fn test_named_and_dot_imports() {
    let ws = Workspace::new();
    write(
        ws.app.path(),
        "named/a.go",
        "package named\n\nimport g \"lib/geo\"\n\ntype A struct{ P g.Point }\n",
    );
    write(
        ws.app.path(),
        "dotted/a.go",
        "package dotted\n\nimport . \"lib/geo\"\n\ntype A struct{ P Point }\n",
    );

    for input in ["named", "dotted"] {
        let package = ws.open(input);
        let field = package
            .record_by_name("A")
            .unwrap()
            .field_by_name("P")
            .unwrap()
            .unwrap();
        assert_eq!(field.ty(), &Type::named("lib/geo", "Point"), "{input}");
    }
}

#[test]
fn test_undefined_qualified_name_is_type_error() {
    let ws = Workspace::new();
    write(
        ws.app.path(),
        "bad/a.go",
        "package bad\n\nimport \"lib/geo\"\n\ntype A struct{ P geo.Nope }\n",
    );

    let err = ws.loader().open("bad", OpenOptions::default()).unwrap_err();
    match err {
        Error::TypeCheck { source, .. } => assert_eq!(source.message, "undefined: geo.Nope"),
        other => panic!("expected TypeCheck, got {other:?}"),
    }
}

#[test]
fn test_unloadable_import_keeps_type_name() {
    let ws = Workspace::new();
    write(
        ws.app.path(),
        "clock/a.go",
        "package clock\n\nimport \"time\"\n\ntype Tick struct{ At time.Time }\n",
    );
    let package = ws.open("clock");
    let at = package
        .record_by_name("Tick")
        .unwrap()
        .field_by_name("At")
        .unwrap()
        .unwrap();

    assert_eq!(at.ty(), &Type::named("time", "Time"));
    assert_eq!(at.std_size(8, 8), None);
}

// ============================================================================
// Package::imports
// ============================================================================

#[test]
fn test_package_imports_opens_each_import() {
    let ws = Workspace::new();
    write(
        ws.app.path(),
        "uses/a.go",
        "package uses\n\nimport (\n\t\"lib/geo\"\n\t\"C\"\n)\n\ntype A struct{ P geo.Point }\n",
    );
    write(
        ws.app.path(),
        "uses/b.go",
        "package uses\n\nimport \"lib/geo\"\n\ntype B struct{ P geo.Point }\n",
    );
    let loader = ws.loader();
    let package = ws.open("uses");

    assert_eq!(package.import_paths(), ["lib/geo", "C"]);
    let imports = package.imports(&loader, false).unwrap();
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0].path(), "lib/geo");
    assert_eq!(imports[0].lookup_root(), ws.lib.path());
    assert!(imports[0].has_type_info());

    let imports = package.imports(&loader, true).unwrap();
    assert!(!imports[0].has_type_info());
}

#[test]
fn test_package_imports_reports_all_failures() {
    let ws = Workspace::new();
    write(
        ws.app.path(),
        "uses/a.go",
        "package uses\n\nimport (\n\t\"fmt\"\n\t\"lib/geo\"\n\t\"net/http\"\n)\n\ntype A struct{}\n",
    );
    let loader = ws.loader();
    let package = ws.open("uses");

    match package.imports(&loader, true).unwrap_err() {
        Error::Imports { package, failures } => {
            assert_eq!(package, "uses");
            let paths: Vec<_> = failures.iter().map(|f| f.path.as_str()).collect();
            assert_eq!(paths, ["fmt", "net/http"]);
            assert!(failures.iter().all(|f| f.error.is_not_found()));
        }
        other => panic!("expected Imports, got {other:?}"),
    }
}

struct Stdlib;

impl ExternalResolver for Stdlib {
    fn import(&self, path: &str) -> Result<Package, BoxError> {
        Ok(Package::synthetic(gosrc::hir::default_package_name(path), path))
    }
}

#[test]
fn test_package_imports_use_external_resolver() {
    let ws = Workspace::new();
    write(
        ws.app.path(),
        "uses/a.go",
        "package uses\n\nimport (\n\t\"fmt\"\n\t\"lib/geo\"\n)\n\ntype A struct{}\n",
    );
    let loader = ws.loader().with_external_resolver(Arc::new(Stdlib));
    let package = ws.open("uses");

    let imports = package.imports(&loader, true).unwrap();
    let names: Vec<_> = imports.iter().map(|p| (p.name(), p.path())).collect();
    assert_eq!(names, [("fmt", "fmt"), ("geo", "lib/geo")]);
}

// ============================================================================
// CYCLES
// ============================================================================

#[test]
fn test_import_cycle_is_reported() {
    let ws = Workspace::new();
    write(
        ws.app.path(),
        "cyc/a/a.go",
        "package a\n\nimport \"cyc/b\"\n\ntype A struct{ B *b.B }\n",
    );
    write(
        ws.app.path(),
        "cyc/b/b.go",
        "package b\n\nimport \"cyc/a\"\n\ntype B struct{ A *a.A }\n",
    );

    let err = ws.loader().open("cyc/a", OpenOptions::default()).unwrap_err();
    match err {
        Error::ImportCycle { path } => assert_eq!(path, "cyc/a"),
        other => panic!("expected ImportCycle, got {other:?}"),
    }

    // without type checking nothing is imported
    let dir = ws
        .loader()
        .open("cyc/a", OpenOptions::new().files_only(true))
        .unwrap();
    assert_eq!(dir.packages()[0].import_paths(), ["cyc/b"]);
}

#[test]
fn test_import_cycle_through_absolute_open() {
    let ws = Workspace::new();
    write(
        ws.app.path(),
        "cyc/a/a.go",
        "package a\n\nimport \"cyc/b\"\n\ntype A struct{ B *b.B }\n",
    );
    write(
        ws.app.path(),
        "cyc/b/b.go",
        "package b\n\nimport \"cyc/a\"\n\ntype B struct{ A *a.A }\n",
    );

    // the opened directory is the one `cyc/b` imports back
    let input = ws.app.path().join("cyc/a");
    let err = ws
        .loader()
        .open(input.to_str().unwrap(), OpenOptions::default())
        .unwrap_err();
    match err {
        Error::ImportCycle { path } => assert_eq!(path, "cyc/a"),
        other => panic!("expected ImportCycle, got {other:?}"),
    }
}
