//! Records, fields and methods of an opened package.

use std::fs;
use std::path::Path;

use gosrc::hir::{ItemTypeName, Type};
use gosrc::{BuildContext, Directory, Error, Loader, OpenOptions, Package, Shape};
use rstest::{fixture, rstest};
use tempfile::TempDir;

const MODELS: &str = r#"package shop

import "time"

//go:generate stringer -type=Kind

type Kind int

// Order is placed by a customer.
//go:model
type Order struct {
	ID, Ref  int64 `json:"id" db:"order_id,pk"`
	Customer *Customer
	Items    []Item
	Lookup   map[string]*Item
	Created  time.Time
	Kind     Kind
	*Audit
	note string
}

type Customer struct {
	Name string
}

type Item struct {
	SKU   string
	Count int32
}

type Audit struct{ By string }

type Ptr = *Customer

type Numbers []int

type Indirect struct {
	Owner Ptr
	Nums  Numbers
}
"#;

const METHODS: &str = r#"package shop

func (o *Order) Total() int64 { return 0 }

func (o Order) String() string { return "" }

func (Customer) Greet() {}

func (c *Customer) Greet() {}

func Free() {}
"#;

/// An opened `shop` package; the directory must outlive it.
struct Shop {
    _tmp: TempDir,
    dir: Directory,
}

impl Shop {
    fn package(&self) -> &Package {
        &self.dir.packages()[0]
    }
}

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

#[fixture]
fn shop() -> Shop {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "shop/models.go", MODELS);
    write(tmp.path(), "shop/methods.go", METHODS);

    let context = BuildContext::new()
        .with_root(tmp.path())
        .with_working_dir(tmp.path());
    let dir = Loader::new(context)
        .open("shop", OpenOptions::default())
        .unwrap();
    Shop { _tmp: tmp, dir }
}

// ============================================================================
// RECORDS
// ============================================================================

#[rstest]
fn test_records_in_source_order(shop: Shop) {
    let names: Vec<_> = shop.package().records().map(|r| r.name()).collect();
    // files are scanned by name: methods.go declares no structs
    assert_eq!(names, ["Order", "Customer", "Item", "Audit", "Indirect"]);
}

#[rstest]
fn test_record_lookup_by_id(shop: Shop) {
    let package = shop.package();
    let item = package.record_by_name("Item").unwrap();
    let again = package.record(item.id()).unwrap();
    assert_eq!(again.name(), "Item");
    assert_eq!(item.to_string(), "shop.Item");
    assert!(package.record_by_name("Kind").is_none());
}

#[rstest]
fn test_records_with_marker(shop: Shop) {
    let marked: Vec<_> = shop
        .package()
        .records_with_marker("model")
        .map(|r| r.name())
        .collect();
    assert_eq!(marked, ["Order"]);

    let order = shop.package().record_by_name("Order").unwrap();
    assert_eq!(order.doc().len(), 2);
    assert!(!order.has_marker("generate"));
}

#[rstest]
fn test_record_position(shop: Shop) {
    let order = shop.package().record_by_name("Order").unwrap();
    let position = order.position().unwrap();
    assert_eq!(position.file, order.file().id());
    assert!(order.file().path().ends_with("models.go"));
    // 0-indexed: `type Order struct` is the eleventh line
    assert_eq!(position.line_col.line, 10);
    assert_eq!(position.line_col.col, 5);
}

#[rstest]
fn test_files_by_go_generate_tag(shop: Shop) {
    let files = shop.package().files_by_go_generate_tag("stringer");
    assert_eq!(files.len(), 1);
    assert!(files[0].path().ends_with("models.go"));
    assert!(shop.package().files_by_go_generate_tag("mockgen").is_empty());
}

// ============================================================================
// FIELDS
// ============================================================================

#[rstest]
fn test_fields_expand_names_in_order(shop: Shop) {
    let order = shop.package().record_by_name("Order").unwrap();
    let fields: Vec<_> = order
        .fields()
        .unwrap()
        .iter()
        .map(|f| (f.index(), f.name()))
        .collect();
    assert_eq!(
        fields,
        [
            (0, "ID"),
            (1, "Ref"),
            (2, "Customer"),
            (3, "Items"),
            (4, "Lookup"),
            (5, "Created"),
            (6, "Kind"),
            (7, "Audit"),
            (8, "note"),
        ]
    );
}

#[rstest]
fn test_field_tags(shop: Shop) {
    let order = shop.package().record_by_name("Order").unwrap();
    let id = order.field_by_name("ID").unwrap().unwrap();
    let reference = order.field_by_name("Ref").unwrap().unwrap();

    assert_eq!(id.raw_tag(), Some(r#"json:"id" db:"order_id,pk""#));
    assert_eq!(id.tag("json").as_deref(), Some("id"));
    assert_eq!(reference.tag("db").as_deref(), Some("order_id,pk"));
    assert_eq!(id.tag("xml"), None);

    let customer = order.field_by_name("Customer").unwrap().unwrap();
    assert_eq!(customer.raw_tag(), None);
    assert_eq!(customer.tag("json"), None);
}

#[rstest]
#[case::pointer("Customer", true, false, "Customer", "shop")]
#[case::slice("Items", false, true, "Item", "shop")]
#[case::map_of_pointers("Lookup", false, false, "Item", "shop")]
#[case::imported("Created", false, false, "Time", "time")]
#[case::named_basic("Kind", false, false, "Kind", "shop")]
#[case::embedded_pointer("Audit", true, false, "Audit", "shop")]
#[case::basic("note", false, false, "string", "")]
fn test_field_classification(
    shop: Shop,
    #[case] field: &str,
    #[case] is_pointer: bool,
    #[case] is_slice: bool,
    #[case] item_name: &str,
    #[case] item_path: &str,
) {
    let order = shop.package().record_by_name("Order").unwrap();
    let field = order.field_by_name(field).unwrap().unwrap();

    assert_eq!(field.is_pointer(), is_pointer);
    assert_eq!(field.is_slice(), is_slice);
    assert_eq!(
        field.item_type_name(),
        ItemTypeName {
            name: item_name.to_string(),
            path: item_path.to_string(),
        }
    );
}

#[rstest]
fn test_field_types_and_shapes(shop: Shop) {
    let order = shop.package().record_by_name("Order").unwrap();

    let customer = order.field_by_name("Customer").unwrap().unwrap();
    assert_eq!(customer.ty().to_string(), "*shop.Customer");
    assert_eq!(customer.elem(), Some(&Type::named("shop", "Customer")));

    let lookup = order.field_by_name("Lookup").unwrap().unwrap();
    match lookup.shape() {
        Shape::Container(value) => assert_eq!(value.to_string(), "*shop.Item"),
        other => panic!("expected container, got {other:?}"),
    }

    let created = order.field_by_name("Created").unwrap().unwrap();
    // `time` is under no root: the name survives, the layout does not
    assert_eq!(created.ty(), &Type::named("time", "Time"));
    assert_eq!(created.underlying(), created.ty());
    assert_eq!(created.std_size(8, 8), None);

    let audit = order.field_by_name("Audit").unwrap().unwrap();
    assert!(audit.is_embedded());
    assert_eq!(audit.shape(), Shape::Pointer(&Type::named("shop", "Audit")));
}

#[rstest]
fn test_fields_through_named_types(shop: Shop) {
    let indirect = shop.package().record_by_name("Indirect").unwrap();

    let owner = indirect.field_by_name("Owner").unwrap().unwrap();
    assert!(owner.is_pointer());
    assert_eq!(owner.item_type_name().name, "Customer");

    let nums = indirect.field_by_name("Nums").unwrap().unwrap();
    assert_eq!(nums.ty(), &Type::named("shop", "Numbers"));
    assert!(nums.is_slice());
}

#[rstest]
#[case::string("SKU", 8, 16)]
#[case::int32("Count", 8, 4)]
#[case::string_32bit("SKU", 4, 8)]
fn test_field_std_size(shop: Shop, #[case] field: &str, #[case] word: i64, #[case] size: i64) {
    let item = shop.package().record_by_name("Item").unwrap();
    let field = item.field_by_name(field).unwrap().unwrap();
    assert_eq!(field.std_size(word, word), Some(size));
}

#[rstest]
fn test_std_size_of_composite_fields(shop: Shop) {
    let order = shop.package().record_by_name("Order").unwrap();
    let size = |name: &str| order.field_by_name(name).unwrap().unwrap().std_size(8, 8);

    assert_eq!(size("Items"), Some(24));
    assert_eq!(size("Lookup"), Some(8));
    assert_eq!(size("Kind"), Some(8));
}

#[rstest]
fn test_missing_field(shop: Shop) {
    let order = shop.package().record_by_name("Order").unwrap();
    assert!(order.field_by_name("Missing").unwrap().is_none());
}

// ============================================================================
// METHODS
// ============================================================================

#[rstest]
fn test_methods_of_record(shop: Shop) {
    let order = shop.package().record_by_name("Order").unwrap();
    let names: Vec<_> = order.methods().iter().map(|m| m.name()).collect();
    assert_eq!(names, ["Total", "String"]);

    let total = order.method_by_name("Total").unwrap().unwrap();
    assert!(total.has_pointer_receiver());
    assert_eq!(total.receiver_name(), Some("o"));
    assert_eq!(total.receiver_type_name(), Some("Order"));
    assert!(total.file().path().ends_with("methods.go"));

    let string = order.method_by_name("String").unwrap().unwrap();
    assert!(!string.has_pointer_receiver());

    assert!(order.method_by_name("Missing").unwrap().is_none());
}

#[rstest]
fn test_ambiguous_method(shop: Shop) {
    let customer = shop.package().record_by_name("Customer").unwrap();
    match customer.method_by_name("Greet") {
        Err(Error::AmbiguousMethod { record, method, count }) => {
            assert_eq!(record, "Customer");
            assert_eq!(method, "Greet");
            assert_eq!(count, 2);
        }
        other => panic!("expected AmbiguousMethod, got {other:?}"),
    }
}

#[rstest]
fn test_functions_are_not_methods(shop: Shop) {
    let package = shop.package();
    assert_eq!(package.methods().count(), 4);
    assert!(package.methods().all(|m| m.name() != "Free"));
    assert!(package.record_by_name("Item").unwrap().methods().is_empty());
}

#[test]
fn test_methods_need_no_type_info() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "shop/models.go", MODELS);
    write(tmp.path(), "shop/methods.go", METHODS);

    let context = BuildContext::new()
        .with_root(tmp.path())
        .with_working_dir(tmp.path());
    let dir = Loader::new(context)
        .open("shop", OpenOptions::new().files_only(true))
        .unwrap();

    let order = dir.packages()[0].record_by_name("Order").unwrap();
    assert_eq!(order.methods().len(), 2);
    assert!(matches!(order.fields(), Err(Error::MissingTypeInfo { .. })));
}

#[test]
fn test_std_size_without_layout_is_none() {
    let tmp = tempfile::tempdir().unwrap();
    write(
        tmp.path(),
        "huge/a.go",
        "package huge\n\ntype T struct{ A [2305843009213693952]int64 }\n",
    );

    let context = BuildContext::new()
        .with_root(tmp.path())
        .with_working_dir(tmp.path());
    let dir = Loader::new(context)
        .open("huge", OpenOptions::default())
        .unwrap();

    let record = dir.packages()[0].record_by_name("T").unwrap();
    let fields = record.fields().unwrap();
    let field = &fields[0];
    assert_eq!(field.std_size(8, 8), None);
    assert_eq!(field.std_size(8, 0), None);
    assert_eq!(field.std_size(0, 8), None);
}
