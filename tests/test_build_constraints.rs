//! Build-constraint evaluation for `// +build` and `//go:build` lines.

use gosrc::syntax::{BuildConstraints, BuildTags};
use proptest::prelude::*;
use rstest::rstest;

fn constraints(lines: &[&str]) -> BuildConstraints {
    BuildConstraints::from_comments(lines.iter().copied()).unwrap()
}

fn tags(list: &[&str]) -> BuildTags {
    list.iter().copied().collect()
}

// ============================================================================
// +build LINES
// ============================================================================

#[rstest]
#[case::both_and_terms(&["linux", "amd64"], true)]
#[case::alternative(&["darwin"], true)]
#[case::partial_and(&["linux"], false)]
#[case::unrelated(&["windows", "amd64"], false)]
#[case::empty(&[], false)]
fn test_plus_build_or_of_ands(#[case] active: &[&str], #[case] expected: bool) {
    let constraints = constraints(&["// +build linux,amd64 darwin"]);
    assert_eq!(constraints.passes(&tags(active)), expected);
}

#[rstest]
#[case::negation_alone(&[], true)]
#[case::negated_tag_set(&["cgo"], false)]
fn test_negation(#[case] active: &[&str], #[case] expected: bool) {
    assert_eq!(constraints(&["// +build !cgo"]).passes(&tags(active)), expected);
}

#[test]
fn test_every_line_must_hold() {
    let constraints = constraints(&["// +build linux darwin", "// +build amd64"]);

    assert!(constraints.passes(&tags(&["linux", "amd64"])));
    assert!(!constraints.passes(&tags(&["linux"])));
    assert!(!constraints.passes(&tags(&["amd64"])));
}

#[test]
fn test_invalid_terms_never_match() {
    assert!(!constraints(&["// +build !!linux"]).passes(&tags(&["linux"])));
    assert!(!constraints(&["// +build !!linux"]).passes(&tags(&[])));
    assert!(!constraints(&["// +build li$nux"]).passes(&tags(&["li$nux"])));
}

#[test]
fn test_empty_plus_build_line_fails() {
    assert!(!constraints(&["// +build"]).passes(&tags(&["linux"])));
}

#[test]
fn test_no_constraints_is_unconditional() {
    let constraints = constraints(&["// Package demo does things.", "/* block */"]);
    assert!(constraints.is_unconditional());
    assert!(constraints.passes(&tags(&[])));
}

#[test]
fn test_lookalike_comments_are_ignored() {
    let constraints = constraints(&["// +builder linux", "//go:buildx linux", "// go:build linux"]);
    assert!(constraints.is_unconditional());
}

// ============================================================================
// //go:build EXPRESSIONS
// ============================================================================

#[rstest]
#[case("linux && (amd64 || arm64)", &["linux", "arm64"], true)]
#[case("linux && (amd64 || arm64)", &["linux", "386"], false)]
#[case("!windows", &["linux"], true)]
#[case("!windows", &["windows"], false)]
#[case("a || b && c", &["a"], true)]
#[case("a || b && c", &["b"], false)]
#[case("!(a || b)", &[], true)]
fn test_go_build_expressions(#[case] expr: &str, #[case] active: &[&str], #[case] expected: bool) {
    let line = format!("//go:build {expr}");
    assert_eq!(constraints(&[line.as_str()]).passes(&tags(active)), expected);
}

#[test]
fn test_go_build_and_plus_build_both_apply() {
    let constraints = constraints(&["//go:build linux", "// +build amd64"]);
    assert!(constraints.passes(&tags(&["linux", "amd64"])));
    assert!(!constraints.passes(&tags(&["linux"])));
}

#[rstest]
#[case("linux &&")]
#[case("(linux")]
#[case("linux amd64")]
#[case("&& linux")]
#[case("")]
fn test_malformed_go_build_is_error(#[case] expr: &str) {
    let line = format!("//go:build {expr}");
    assert!(BuildConstraints::from_comments([line.as_str()]).is_err());
}

#[test]
fn test_two_go_build_lines_are_error() {
    assert!(BuildConstraints::from_comments(["//go:build linux", "//go:build darwin"]).is_err());
}

// ============================================================================
// PROPERTIES
// ============================================================================

fn tag_name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["linux", "darwin", "amd64", "arm64", "cgo", "gc", "integration"])
        .prop_map(String::from)
}

proptest! {
    /// Adding tags never turns a passing AND-only positive constraint into a
    /// failing one.
    #[test]
    fn prop_positive_and_constraints_are_monotonic(
        required in prop::collection::vec(tag_name(), 1..4),
        base in prop::collection::vec(tag_name(), 0..5),
        extra in prop::collection::vec(tag_name(), 0..5),
    ) {
        let line = format!("// +build {}", required.join(","));
        let constraints = constraints(&[line.as_str()]);

        let small: BuildTags = base.iter().map(String::as_str).collect();
        let large: BuildTags = base.iter().chain(&extra).map(String::as_str).collect();

        if constraints.passes(&small) {
            prop_assert!(constraints.passes(&large));
        }
    }

    /// A `//go:build` conjunction agrees with the equivalent `+build` line.
    #[test]
    fn prop_go_build_matches_plus_build(
        required in prop::collection::vec(tag_name(), 1..4),
        active in prop::collection::vec(tag_name(), 0..6),
    ) {
        let go_build = format!("//go:build {}", required.join(" && "));
        let plus_build = format!("// +build {}", required.join(","));
        let active: BuildTags = active.iter().map(String::as_str).collect();

        prop_assert_eq!(
            constraints(&[go_build.as_str()]).passes(&active),
            constraints(&[plus_build.as_str()]).passes(&active)
        );
    }
}
