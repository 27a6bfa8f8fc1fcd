//! Tests for column behavior: validation, conditional formats and formats.
//!
//! Tests cover:
//! 1. Text, numeric and temporal rules as validations
//! 2. Conditional styles resolved through named definitions
//! 3. Enum and lookup lists
//! 4. Display format patterns, inline and standard
//! 5. Broken parts reported without losing the rest
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

mod common;

use common::*;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use test_case::test_case;

use xlbook::{Behavior, CFRuleType, ValidationOperator, ValidationType};

fn typed(data_type: Value) -> Value {
    json!({ "name": "a", "type": data_type })
}

fn behavior_of(column: Value) -> Behavior {
    let output = compile_clean(&book(vec![page("P", vec![group("G", vec![column])])]));
    find_column(&output, "P", "G", "a")
        .behavior
        .clone()
        .unwrap_or_else(|| panic!("column has no behavior"))
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_text_begins_with() {
    let behavior = behavior_of(typed(json!({
        "type": "text",
        "rule": { "type": "begins", "value": "INV-" }
    })));
    let validation = behavior.validation.unwrap();
    assert_eq!(validation.validation_type, ValidationType::Text);
    assert_eq!(validation.operator, Some(ValidationOperator::BeginsWith));
    assert_eq!(validation.formula1.as_deref(), Some("\"INV-\""));
}

#[test_case(json!({ "type": ">=", "value": 0 }), ValidationOperator::GreaterThanOrEqual, "0", None ; "comparison")]
#[test_case(json!({ "type": "between", "low": 1, "high": 10 }), ValidationOperator::Between, "1", Some("10") ; "range")]
#[test_case(json!({ "type": "outside", "low": 10, "high": 1 }), ValidationOperator::NotBetween, "1", Some("10") ; "reversed range")]
#[test_case(json!({ "type": "<>", "value": 2.5 }), ValidationOperator::NotEqual, "2.5", None ; "decimal value")]
fn test_numeric_rules(
    rule: Value,
    operator: ValidationOperator,
    formula1: &str,
    formula2: Option<&str>,
) {
    let behavior = behavior_of(typed(json!({ "type": "numeric", "rule": rule })));
    let validation = behavior.validation.unwrap();
    assert_eq!(validation.validation_type, ValidationType::Decimal);
    assert_eq!(validation.operator, Some(operator));
    assert_eq!(validation.formula1.as_deref(), Some(formula1));
    assert_eq!(validation.formula2.as_deref(), formula2);
}

#[test]
fn test_custom_numeric_rule() {
    let behavior = behavior_of(typed(json!({
        "type": "numeric",
        "rule": {
            "type": "custom",
            "expression": { "type": "compound", "with": ">", "items": [
                { "type": "selector", "from": "self" },
                0
            ]}
        }
    })));
    let validation = behavior.validation.unwrap();
    assert_eq!(validation.validation_type, ValidationType::Custom);
    assert_eq!(validation.operator, None);
    assert_eq!(validation.formula1.as_deref(), Some("A2>0"));
}

#[test]
fn test_temporal_range_is_ordered_by_instant() {
    let behavior = behavior_of(typed(json!({
        "type": "temporal",
        "rule": { "type": "between", "low": "2024-12-31", "high": "2024-01-01T08:00" }
    })));
    let validation = behavior.validation.unwrap();
    assert_eq!(validation.validation_type, ValidationType::Date);
    assert_eq!(validation.operator, Some(ValidationOperator::Between));
    assert_eq!(
        validation.formula1.as_deref(),
        Some("DATE(2024,1,1)+TIME(8,0,0)")
    );
    assert_eq!(validation.formula2.as_deref(), Some("DATE(2024,12,31)"));
}

#[test]
fn test_bad_temporal_value_is_issue() {
    let value = book(vec![page(
        "P",
        vec![group(
            "G",
            vec![typed(json!({
                "type": "temporal",
                "rule": { "type": "<", "value": "next tuesday" }
            }))],
        )],
    )]);
    let issues = compile_issues(&value);
    assert_eq!(
        issues[0].message,
        "invalid temporal value 'next tuesday', expected a date, time or date-time"
    );
    assert_eq!(
        issue_paths(&issues),
        vec!["pages[0].groups[0].columns[0].type.rule.value"]
    );
}

// ============================================================================
// Conditional Styles
// ============================================================================

#[test]
fn test_conditional_style_through_definitions() {
    let mut value = book(vec![page(
        "P",
        vec![group(
            "G",
            vec![typed(json!({
                "type": "numeric",
                "styles": [
                    { "rule": { "type": ">", "value": 90 }, "apply": "@hot" },
                    { "rule": { "type": "between", "low": 0, "high": 10 }, "apply": { "italic": true } }
                ]
            }))],
        )],
    )]);
    value["definitions"] = json!({
        "colors": { "alarm": "#C00000" },
        "styles": { "hot": { "fore": "@alarm", "bold": true } }
    });

    let output = compile_clean(&value);
    let behavior = find_column(&output, "P", "G", "a").behavior.clone().unwrap();
    assert_eq!(behavior.validation, None);
    assert_eq!(behavior.conditionals.len(), 2);

    let hot = &behavior.conditionals[0];
    assert_eq!(hot.rule_type, CFRuleType::CellIs);
    assert_eq!(hot.operator, Some(ValidationOperator::GreaterThan));
    assert_eq!(hot.formula1.as_deref(), Some("90"));
    assert_eq!(hot.style.fore.as_ref().unwrap().as_str(), "#C00000");
    assert_eq!(hot.style.bold, Some(true));

    let low = &behavior.conditionals[1];
    assert_eq!(low.operator, Some(ValidationOperator::Between));
    assert_eq!(low.formula2.as_deref(), Some("10"));
    assert_eq!(low.style.italic, Some(true));
}

#[test]
fn test_text_styles_keep_order() {
    let behavior = behavior_of(typed(json!({
        "type": "text",
        "styles": [
            { "rule": { "type": "contains", "value": "urgent" }, "apply": { "bold": true } },
            { "rule": { "type": "ends", "value": "!" }, "apply": { "italic": true } },
            { "rule": { "type": "is", "value": "done" }, "apply": { "fore": "@gray" } }
        ]
    })));
    let kinds: Vec<CFRuleType> = behavior
        .conditionals
        .iter()
        .map(|format| format.rule_type)
        .collect();
    assert_eq!(
        kinds,
        vec![
            CFRuleType::ContainsText,
            CFRuleType::EndsWith,
            CFRuleType::CellIs
        ]
    );
    assert_eq!(
        behavior.conditionals[2].style.fore.as_ref().unwrap().as_str(),
        "#808080"
    );
}

// ============================================================================
// Lists
// ============================================================================

#[test]
fn test_enum_list_and_styles() {
    let behavior = behavior_of(typed(json!({
        "type": "enum",
        "values": ["Open", { "name": "Closed", "style": { "fore": "@red" } }, { "name": "Held" }]
    })));
    let validation = behavior.validation.unwrap();
    assert_eq!(validation.validation_type, ValidationType::List);
    assert!(validation.show_dropdown);
    assert_eq!(
        validation.list_values,
        Some(vec![
            "Open".to_string(),
            "Closed".to_string(),
            "Held".to_string()
        ])
    );
    assert_eq!(behavior.conditionals.len(), 1);
    assert_eq!(behavior.conditionals[0].formula1.as_deref(), Some("\"Closed\""));
}

#[test]
fn test_lookup_matches_whole_column_selector() {
    let value = book(vec![page(
        "P",
        vec![group(
            "G",
            vec![
                text("X"),
                json!({ "name": "pick", "type": { "type": "lookup", "values": { "column": "X" } } }),
                computed("echo", select("X", "all")),
            ],
        )],
    )]);
    let output = compile_clean(&value);
    let validation = find_column(&output, "P", "G", "pick")
        .behavior
        .as_ref()
        .and_then(|behavior| behavior.validation.clone())
        .unwrap();
    assert_eq!(validation.validation_type, ValidationType::List);
    assert_eq!(validation.formula1.as_deref(), Some("$A$2:$A"));

    let echo = value_of(&output, "P", "G", "echo");
    assert_eq!(echo.strip_prefix('='), validation.formula1.as_deref());
}

#[test]
fn test_lookup_on_grouped_page() {
    let value = book(vec![page(
        "P",
        vec![
            group("Keys", vec![text("id"), text("X")]),
            group(
                "Refs",
                vec![json!({ "name": "pick", "type": {
                    "type": "lookup",
                    "values": { "group": "Keys", "column": "X" }
                }})],
            ),
        ],
    )]);
    let output = compile_clean(&value);
    let validation = find_column(&output, "P", "Refs", "pick")
        .behavior
        .as_ref()
        .and_then(|behavior| behavior.validation.clone())
        .unwrap();
    assert_eq!(validation.formula1.as_deref(), Some("$B$3:$B"));
}

// ============================================================================
// Formats
// ============================================================================

#[test_case(json!({ "type": "number", "decimal": 2 }), "0.00" ; "two decimals")]
#[test_case(json!({ "type": "number", "commas": true }), "#,##0" ; "thousands")]
#[test_case(json!({ "type": "percent", "decimal": 1 }), "0.0%" ; "percent")]
#[test_case(json!("@currency"), "\"$\"#,##0.00" ; "standard currency")]
fn test_numeric_formats(format: Value, expected: &str) {
    let behavior = behavior_of(typed(json!({ "type": "numeric", "format": format })));
    assert_eq!(behavior.format.as_deref(), Some(expected));
}

#[test_case(json!("@date"), "yyyy-mm-dd" ; "standard date")]
#[test_case(json!("@iso"), "yyyy-mm-dd\\Thh:mm:ss" ; "standard iso")]
fn test_temporal_formats(format: Value, expected: &str) {
    let behavior = behavior_of(typed(json!({ "type": "temporal", "format": format })));
    assert_eq!(behavior.format.as_deref(), Some(expected));
}

#[test]
fn test_named_format_shadows_standard() {
    let mut value = book(vec![page(
        "P",
        vec![group(
            "G",
            vec![typed(json!({ "type": "numeric", "format": "@decimal" }))],
        )],
    )]);
    value["pages"][0]["definitions"] =
        json!({ "numerics": { "decimal": { "type": "number", "decimal": 4 } } });
    let output = compile_clean(&value);
    let behavior = find_column(&output, "P", "G", "a").behavior.clone().unwrap();
    assert_eq!(behavior.format.as_deref(), Some("0.0000"));
}

// ============================================================================
// Best Effort
// ============================================================================

#[test]
fn test_broken_style_keeps_rule_and_format() {
    let value = book(vec![page(
        "P",
        vec![group(
            "G",
            vec![typed(json!({
                "type": "numeric",
                "rule": { "type": ">", "value": 0 },
                "styles": [{ "rule": { "type": "<", "value": 0 }, "apply": "@missing" }],
                "format": "@thousands"
            }))],
        )],
    )]);
    let compilation = compile_value(&value);
    assert_eq!(
        issue_paths(&compilation.issues),
        vec!["pages[0].groups[0].columns[0].type.styles[0].apply"]
    );

    let behavior = find_column(&compilation.book, "P", "G", "a")
        .behavior
        .clone()
        .unwrap();
    assert!(behavior.validation.is_some());
    assert_eq!(behavior.conditionals.len(), 1);
    assert_eq!(behavior.format.as_deref(), Some("#,##0"));
}
