//! Integration tests for suppression matching
//!
//! The scope matrix: class, field, method, parameter, and package
//! suppressions against defects with and without the annotations each
//! scope needs.

use classlint::defect::{
    ClassAnnotation, Defect, FieldAnnotation, LocalVariableAnnotation, MethodAnnotation,
};
use classlint::filter::PatternExpr;
use classlint::suppress::{
    Suppression, SuppressionMatcher, USELESS_SUPPRESSION_ON_CLASS,
    USELESS_SUPPRESSION_ON_FIELD, USELESS_SUPPRESSION_ON_METHOD,
    USELESS_SUPPRESSION_ON_METHOD_PARAMETER, USELESS_SUPPRESSION_ON_PACKAGE,
};

const PACKAGE_NAME: &str = "com.example";
const CLASS_NAME: &str = "com.example.Test";

fn pattern(p: &str) -> PatternExpr {
    PatternExpr::parse(p).unwrap()
}

fn class_annotation() -> ClassAnnotation {
    ClassAnnotation::new(CLASS_NAME)
}

fn test_method() -> MethodAnnotation {
    MethodAnnotation::new(CLASS_NAME, "test", "()Z", false)
}

fn test_field() -> FieldAnnotation {
    FieldAnnotation::new(CLASS_NAME, "test", "Z", false)
}

fn unused_field_defect() -> Defect {
    Defect::new("UUF_UNUSED_FIELD", 10).with_class(class_annotation())
}

#[test]
fn test_matches_class_level_suppression() {
    let mut matcher = SuppressionMatcher::new();
    matcher.add(Suppression::on_class(
        pattern("UUF_UNUSED_FIELD"),
        class_annotation(),
    ));

    assert!(matcher.match_and_mark(&unused_field_defect()));
}

#[test]
fn test_matches_package_level_suppression() {
    let mut matcher = SuppressionMatcher::new();
    matcher.add(Suppression::on_package(
        pattern("UUF_UNUSED_FIELD"),
        PACKAGE_NAME,
    ));

    assert!(matcher.match_and_mark(&unused_field_defect()));
}

#[test]
fn test_package_prefix_also_covers_sibling_package() {
    // Plain prefix semantics, kept for compatibility: "com.acme" covers
    // "com.acme2.Foo" as well.
    let mut matcher = SuppressionMatcher::new();
    matcher.add(Suppression::on_package(
        pattern("UUF_UNUSED_FIELD"),
        "com.acme",
    ));

    let sibling =
        Defect::new("UUF_UNUSED_FIELD", 10).with_class(ClassAnnotation::new("com.acme2.Foo"));
    assert!(matcher.match_and_mark(&sibling));
}

#[test]
fn test_matches_method_level_suppression() {
    let mut matcher = SuppressionMatcher::new();
    matcher.add(Suppression::on_method(
        pattern("UUF_UNUSED_FIELD"),
        class_annotation(),
        test_method(),
    ));

    let defect = unused_field_defect().with_method(test_method());
    assert!(matcher.match_and_mark(&defect));
}

#[test]
fn test_method_suppression_needs_primary_method() {
    // No primary method on the defect: explicit non-match, not a crash.
    let mut matcher = SuppressionMatcher::new();
    matcher.add(Suppression::on_method(
        pattern("UUF_UNUSED_FIELD"),
        class_annotation(),
        test_method(),
    ));

    assert!(!matcher.match_and_mark(&unused_field_defect()));
}

#[test]
fn test_matches_field_level_suppression() {
    let mut matcher = SuppressionMatcher::new();
    matcher.add(Suppression::on_field(
        pattern("UUF_UNUSED_FIELD"),
        class_annotation(),
        test_field(),
    ));

    let defect = unused_field_defect().with_field(test_field());
    assert!(matcher.match_and_mark(&defect));
}

#[test]
fn test_matches_parameter_level_suppression() {
    let mut matcher = SuppressionMatcher::new();
    matcher.add(Suppression::on_parameter(
        pattern("UUF_UNUSED_FIELD"),
        class_annotation(),
        test_method(),
        2,
    ));

    let defect = unused_field_defect()
        .with_method(test_method())
        .with_local_variable(LocalVariableAnnotation::new("?", 2));
    assert!(matcher.match_and_mark(&defect));
}

#[test]
fn test_different_pattern_does_not_match() {
    let mut matcher = SuppressionMatcher::new();
    matcher.add(Suppression::on_class(
        pattern("UUF_UNUSED_FIELD"),
        class_annotation(),
    ));

    let other = Defect::new("UWF_NULL_FIELD", 10).with_class(class_annotation());
    assert!(!matcher.match_and_mark(&other));
}

#[test]
fn test_missing_primary_class_does_not_break() {
    let mut matcher = SuppressionMatcher::new();
    matcher.add(Suppression::on_class(
        pattern("UUF_UNUSED_FIELD"),
        class_annotation(),
    ));

    assert!(!matcher.match_and_mark(&Defect::new("UUF_UNUSED_FIELD", 10)));
}

#[test]
fn test_nested_class_is_covered_by_outer_suppression() {
    let mut matcher = SuppressionMatcher::new();
    matcher.add(Suppression::on_class(
        pattern("UUF_UNUSED_FIELD"),
        class_annotation(),
    ));

    let nested = Defect::new("UUF_UNUSED_FIELD", 10)
        .with_class(ClassAnnotation::new(format!("{CLASS_NAME}$Inner")));
    assert!(matcher.match_and_mark(&nested));

    let lookalike = Defect::new("UUF_UNUSED_FIELD", 10)
        .with_class(ClassAnnotation::new(format!("{CLASS_NAME}Extra")));
    assert!(!matcher.match_and_mark(&lookalike));
}

#[test]
fn test_field_suppressor_matched_before_class_suppressor() {
    let mut matcher = SuppressionMatcher::new();
    matcher.add(Suppression::on_class(
        pattern("UUF_UNUSED_FIELD"),
        class_annotation(),
    ));
    matcher.add(Suppression::on_field(
        pattern("UUF_UNUSED_FIELD"),
        class_annotation(),
        test_field(),
    ));

    let defect = unused_field_defect().with_field(test_field());
    assert!(matcher.match_and_mark(&defect));

    // The field suppression consumed the match; the class one is useless.
    let useless = matcher.validate_usage();
    assert_eq!(useless.len(), 1);
    assert_eq!(useless[0].pattern, USELESS_SUPPRESSION_ON_CLASS);
}

#[test]
fn test_unused_suppression_reported_per_scope_kind() {
    let mut matcher = SuppressionMatcher::new();
    matcher.add(Suppression::on_class(pattern("A"), class_annotation()));
    matcher.add(Suppression::on_field(
        pattern("B"),
        class_annotation(),
        test_field(),
    ));
    matcher.add(Suppression::on_method(
        pattern("C"),
        class_annotation(),
        test_method(),
    ));
    matcher.add(Suppression::on_parameter(
        pattern("D"),
        class_annotation(),
        test_method(),
        0,
    ));
    matcher.add(Suppression::on_package(pattern("E"), PACKAGE_NAME));

    let mut patterns: Vec<_> = matcher
        .validate_usage()
        .into_iter()
        .map(|d| d.pattern)
        .collect();
    patterns.sort();

    let mut expected = vec![
        USELESS_SUPPRESSION_ON_CLASS.to_string(),
        USELESS_SUPPRESSION_ON_FIELD.to_string(),
        USELESS_SUPPRESSION_ON_METHOD.to_string(),
        USELESS_SUPPRESSION_ON_METHOD_PARAMETER.to_string(),
        USELESS_SUPPRESSION_ON_PACKAGE.to_string(),
    ];
    expected.sort();
    assert_eq!(patterns, expected);
}

#[test]
fn test_validation_twice_emits_nothing_new() {
    let mut matcher = SuppressionMatcher::new();
    matcher.add(Suppression::on_class(
        pattern("UUF_UNUSED_FIELD"),
        class_annotation(),
    ));

    // First validation reports the unused suppression, the second reports
    // nothing: at most one synthetic defect per unused suppression per run.
    assert_eq!(matcher.validate_usage().len(), 1);
    assert!(matcher.validate_usage().is_empty());
}

#[test]
fn test_match_twice_marks_used_once() {
    let mut matcher = SuppressionMatcher::new();
    matcher.add(Suppression::on_class(
        pattern("UUF_UNUSED_FIELD"),
        class_annotation(),
    ));

    assert!(matcher.match_and_mark(&unused_field_defect()));
    assert!(matcher.match_and_mark(&unused_field_defect()));
    assert!(matcher.validate_usage().is_empty());
}

#[test]
fn test_useless_suppression_messages_name_the_element() {
    let class_message = Suppression::on_class(pattern("XYZ"), ClassAnnotation::new("java.lang.String"))
        .useless_suppression_defect()
        .message;
    assert!(class_message.contains("XYZ"));
    assert!(class_message.contains("java.lang.String"));

    let package_message = Suppression::on_package(pattern(""), "java.lang")
        .useless_suppression_defect()
        .message;
    assert!(package_message.contains("java.lang"));
    // No pattern expression to name for a match-all suppression.
    assert!(!package_message.contains("  "));
}
