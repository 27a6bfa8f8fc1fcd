//! Tests for theme cascading and named definitions.
//!
//! Tests cover:
//! 1. Merge precedence between levels
//! 2. Inheritance cycles of several lengths
//! 3. Definitions shadowed level by level
//! 4. Standard palette colors and tints
//! 5. Compile options that disable the standard fallbacks
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

mod common;

use common::*;
use pretty_assertions::assert_eq;
use serde_json::{json, Map, Value};
use test_case::test_case;

use xlbook::{compile_str, CompileOptions, SheetStyle};

fn data_style(book: &Value) -> SheetStyle {
    let output = compile_clean(book);
    find_column(&output, "P", "G", "a")
        .data_style
        .clone()
        .unwrap_or_default()
}

fn color(style: &SheetStyle, pick: fn(&SheetStyle) -> Option<&xlbook::Color>) -> String {
    pick(style).map(|c| c.as_str().to_string()).unwrap_or_default()
}

// ============================================================================
// Merge Precedence
// ============================================================================

#[test]
fn test_child_adds_fields_without_erasing_parent() {
    let mut value = book(vec![page("P", vec![group("G", vec![text("a")])])]);
    value["theme"] = json!({ "data": { "fore": "#111111" } });
    value["pages"][0]["theme"] = json!({ "data": { "back": "#222222" } });

    let style = data_style(&value);
    assert_eq!(color(&style, |s| s.fore.as_ref()), "#111111");
    assert_eq!(color(&style, |s| s.back.as_ref()), "#222222");
}

#[test]
fn test_closest_level_wins() {
    let mut value = book(vec![page("P", vec![group("G", vec![text("a")])])]);
    value["theme"] = json!({ "data": { "fore": "#111111", "bold": true } });
    value["pages"][0]["theme"] = json!({ "data": { "fore": "#222222" } });
    value["pages"][0]["groups"][0]["theme"] = json!({ "data": { "fore": "#333333" } });
    value["pages"][0]["groups"][0]["columns"][0]["theme"] =
        json!({ "data": { "bold": false } });

    let style = data_style(&value);
    assert_eq!(color(&style, |s| s.fore.as_ref()), "#333333");
    assert_eq!(style.bold, Some(false));
}

#[test]
fn test_inherits_fold_before_own_fields() {
    let mut value = book(vec![page("P", vec![group("G", vec![text("a")])])]);
    value["definitions"] = json!({
        "themes": {
            "base": { "data": { "fore": "#010101", "back": "#020202" } },
            "accent": { "data": { "back": "#030303" } }
        }
    });
    value["theme"] = json!({
        "inherits": ["@base", "@accent"],
        "data": { "italic": true }
    });

    let style = data_style(&value);
    assert_eq!(color(&style, |s| s.fore.as_ref()), "#010101");
    assert_eq!(color(&style, |s| s.back.as_ref()), "#030303");
    assert_eq!(style.italic, Some(true));
}

// ============================================================================
// Cycles
// ============================================================================

#[test_case(1 ; "self inheritance")]
#[test_case(2 ; "pair")]
#[test_case(3 ; "triangle")]
#[test_case(5 ; "five")]
fn test_inheritance_cycle_is_reported(length: usize) {
    let themes: Map<String, Value> = (0..length)
        .map(|i| {
            (
                format!("t{i}"),
                json!({ "inherits": [format!("@t{}", (i + 1) % length)] }),
            )
        })
        .collect();
    let mut value = book(vec![page("P", vec![group("G", vec![text("a")])])]);
    value["definitions"] = json!({ "themes": themes });
    value["theme"] = json!("@t0");

    let issues = compile_issues(&value);
    assert!(issues
        .iter()
        .any(|issue| issue.message.contains("circular theme inheritance")));
}

#[test]
fn test_alias_cycle_is_reported() {
    let mut value = book(vec![page("P", vec![group("G", vec![text("a")])])]);
    value["definitions"] = json!({ "colors": { "a": "@b", "b": "@a" } });
    value["theme"] = json!({ "tab": "@a" });

    let issues = compile_issues(&value);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].message, "circular color reference: @a -> @b -> @a");
    assert_eq!(issue_paths(&issues), vec!["theme.tab"]);
}

// ============================================================================
// Definitions
// ============================================================================

#[test]
fn test_column_definitions_shadow_outer_levels() {
    let mut value = book(vec![page(
        "P",
        vec![group("G", vec![text("a"), text("b")])],
    )]);
    value["definitions"] = json!({ "colors": { "ink": "#101010" } });
    value["pages"][0]["groups"][0]["theme"] = json!({ "data": { "fore": "@ink" } });
    value["pages"][0]["groups"][0]["columns"][1]["definitions"] =
        json!({ "colors": { "ink": "#202020" } });
    value["pages"][0]["groups"][0]["columns"][1]["theme"] =
        json!({ "data": { "fore": "@ink" } });

    let output = compile_clean(&value);
    let fore = |column: &str| {
        find_column(&output, "P", "G", column)
            .data_style
            .as_ref()
            .and_then(|style| style.fore.as_ref())
            .map(|c| c.as_str().to_string())
    };
    assert_eq!(fore("a").as_deref(), Some("#101010"));
    assert_eq!(fore("b").as_deref(), Some("#202020"));
}

#[test]
fn test_page_definitions_stay_on_their_page() {
    let mut value = book(vec![
        page("P", vec![group("G", vec![text("a")])]),
        page("Q", vec![group("G", vec![text("a")])]),
    ]);
    value["pages"][0]["definitions"] = json!({ "styles": { "loud": { "bold": true } } });
    value["theme"] = json!({ "header": "@loud" });

    let issues = compile_issues(&value);
    assert_eq!(issues[0].message, "unknown style '@loud'");
    assert_eq!(issue_paths(&issues), vec!["theme.header"]);
}

#[test]
fn test_named_style_through_alias() {
    let mut value = book(vec![page("P", vec![group("G", vec![text("a")])])]);
    value["definitions"] = json!({
        "colors": { "brand": "#123456", "primary": "@brand" },
        "styles": { "banner": { "back": "@primary", "bold": true }, "title": "@banner" }
    });
    value["theme"] = json!({ "group": "@title" });

    let output = compile_clean(&value);
    let style = find_page(&output, "P").groups[0].title_style.clone().unwrap();
    assert_eq!(style.bold, Some(true));
    assert_eq!(color(&style, |s| s.back.as_ref()), "#123456");
}

// ============================================================================
// Standard Palette
// ============================================================================

#[test_case("@accent1", "#4472C4" ; "theme slot")]
#[test_case("@text1+100", "#FFFFFF" ; "full tint")]
#[test_case("@background1-100", "#000000" ; "full shade")]
fn test_standard_palette(reference: &str, expected: &str) {
    let mut value = book(vec![page("P", vec![group("G", vec![text("a")])])]);
    value["theme"] = json!({ "tab": reference });
    let output = compile_clean(&value);
    assert_eq!(
        find_page(&output, "P").tab_color.as_ref().unwrap().as_str(),
        expected
    );
}

#[test]
fn test_definitions_shadow_standard_palette() {
    let mut value = book(vec![page("P", vec![group("G", vec![text("a")])])]);
    value["definitions"] = json!({ "colors": { "accent1": "#ABCDEF" } });
    value["theme"] = json!({ "tab": "@accent1" });
    let output = compile_clean(&value);
    assert_eq!(
        find_page(&output, "P").tab_color.as_ref().unwrap().as_str(),
        "#ABCDEF"
    );
}

#[test]
fn test_standard_fallbacks_can_be_disabled() {
    let mut value = book(vec![page(
        "P",
        vec![group(
            "G",
            vec![json!({ "name": "n", "type": { "type": "numeric", "format": "@percent" } })],
        )],
    )]);
    value["theme"] = json!({ "tab": "@accent1" });

    let options = CompileOptions {
        standard_palette: false,
        standard_formats: false,
        ..CompileOptions::default()
    };
    let compilation = compile_str(&value.to_string(), &options).unwrap();
    let messages: Vec<&str> = compilation
        .issues
        .iter()
        .map(|issue| issue.message.as_str())
        .collect();
    assert_eq!(
        messages,
        vec![
            "unknown color '@accent1'",
            "unknown numeric format '@percent'"
        ]
    );
}
