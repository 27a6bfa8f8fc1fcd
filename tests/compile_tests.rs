//! End-to-end compilation tests.
//!
//! Tests cover:
//! 1. The two-group scenario (column positions, header offset, formats)
//! 2. Header offsets for single-group and multi-group pages
//! 3. Column index allocation across group boundaries
//! 4. Selector rendering (same page, other page, relative rows, ranges)
//! 5. Duplicate names and best-effort output
//! 6. Output shape and the JSON generator
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

mod common;

use common::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;

use xlbook::column_index::ColumnIndexMap;
use xlbook::{validate, Generator, IssueKind, JsonGenerator};

// ============================================================================
// Scenario
// ============================================================================

fn two_group_book() -> serde_json::Value {
    json!({
        "name": "Book",
        "theme": { "data": { "back": "#FFFFFF" } },
        "pages": [{
            "name": "P",
            "rows": 10,
            "groups": [
                { "name": "G1", "columns": [{ "name": "X", "type": { "type": "text" } }] },
                { "name": "G2", "columns": [{
                    "name": "Y",
                    "type": { "type": "numeric", "format": { "type": "number", "decimal": 2 } }
                }] }
            ]
        }]
    })
}

#[test]
fn test_two_group_scenario_index() {
    let book = validate(two_group_book()).unwrap();
    let index = ColumnIndexMap::build(&book);
    assert!(index.is_clean());

    let x = index.value.get("P", "G1", "X").unwrap();
    let y = index.value.get("P", "G2", "Y").unwrap();
    assert_eq!((x.index, x.grouped, x.header_offset()), (0, true, 2));
    assert_eq!((y.index, y.grouped, y.header_offset()), (1, true, 2));
}

#[test]
fn test_two_group_scenario_output() {
    let output = compile_clean(&two_group_book());
    let page = find_page(&output, "P");
    assert_eq!(page.rows, 10);
    assert_eq!(page.groups.len(), 2);

    let x = find_column(&output, "P", "G1", "X");
    assert_eq!(x.data_style.as_ref().unwrap().back.as_ref().unwrap().as_str(), "#FFFFFF");
    assert_eq!(x.behavior, None);

    let y = find_column(&output, "P", "G2", "Y");
    assert_eq!(y.data_style.as_ref().unwrap().back.as_ref().unwrap().as_str(), "#FFFFFF");
    assert_eq!(y.behavior.as_ref().unwrap().format.as_deref(), Some("0.00"));
}

// ============================================================================
// Header Offset
// ============================================================================

#[test]
fn test_single_group_first_data_row() {
    let value = book(vec![page(
        "P",
        vec![group("G", vec![text("a"), computed("b", select("a", "$0"))])],
    )]);
    let output = compile_clean(&value);
    assert_eq!(value_of(&output, "P", "G", "b"), "=$A$2");
}

#[test]
fn test_multi_group_first_data_row() {
    let value = book(vec![page(
        "P",
        vec![
            group("G", vec![text("a")]),
            group(
                "H",
                vec![computed(
                    "b",
                    json!({ "type": "selector", "from": {
                        "column": { "group": "G", "column": "a" },
                        "rows": "$0"
                    }}),
                )],
            ),
        ],
    )]);
    let output = compile_clean(&value);
    assert_eq!(value_of(&output, "P", "H", "b"), "=$A$3");
}

#[test]
fn test_group_defaults_to_evaluating_group() {
    let value = book(vec![page(
        "P",
        vec![
            group("G", vec![text("a")]),
            group("H", vec![computed("b", select("a", "$0"))]),
        ],
    )]);
    let issues = compile_issues(&value);
    assert_eq!(issues[0].message, "unknown column 'a' in group 'H' of page 'P'");
}

// ============================================================================
// Column Index Allocation
// ============================================================================

#[test]
fn test_indices_ignore_group_boundaries() {
    let value = book(vec![page(
        "P",
        vec![
            group("A", vec![text("a0"), text("a1")]),
            group("B", vec![text("b0"), text("b1"), text("b2")]),
            group("C", vec![text("c0")]),
        ],
    )]);
    let book = validate(value).unwrap();
    let index = ColumnIndexMap::build(&book).value;

    let positions: Vec<u32> = [
        ("A", "a0"),
        ("A", "a1"),
        ("B", "b0"),
        ("B", "b1"),
        ("B", "b2"),
        ("C", "c0"),
    ]
    .iter()
    .map(|(group, column)| index.get("P", group, column).unwrap().index)
    .collect();
    assert_eq!(positions, vec![0, 1, 2, 3, 4, 5]);
}

// ============================================================================
// Selector Rendering
// ============================================================================

#[test_case("self", "=$A2" ; "same row")]
#[test_case("$4", "=$A$6" ; "absolute row")]
#[test_case("+1", "=$A3" ; "next row")]
#[test_case("all", "=$A$2:$A" ; "whole column")]
fn test_row_selectors(rows: &str, expected: &str) {
    let value = book(vec![page(
        "P",
        vec![group("G", vec![text("a"), computed("b", select("a", rows))])],
    )]);
    let output = compile_clean(&value);
    assert_eq!(value_of(&output, "P", "G", "b"), expected);
}

#[test]
fn test_reversed_range_matches_forward_range() {
    let range = |from: &str, to: &str| {
        let value = book(vec![page(
            "P",
            vec![group(
                "G",
                vec![
                    text("a"),
                    computed(
                        "b",
                        json!({ "type": "selector", "from": {
                            "column": { "column": "a" },
                            "rows": { "from": from, "to": to }
                        }}),
                    ),
                ],
            )],
        )]);
        value_of(&compile_clean(&value), "P", "G", "b").to_string()
    };
    assert_eq!(range("$0", "$9"), "=$A$2:$A$11");
    assert_eq!(range("$9", "$0"), range("$0", "$9"));
    assert_eq!(range("+2", "-1"), range("-1", "+2"));
}

#[test]
fn test_other_page_is_quoted() {
    let value = book(vec![
        page("Inputs", vec![group("G", vec![text("rate")])]),
        page(
            "Bob's",
            vec![group(
                "G",
                vec![computed(
                    "total",
                    json!({ "type": "selector", "from": {
                        "column": { "page": "Inputs", "column": "rate" },
                        "rows": "$0"
                    }}),
                )],
            )],
        ),
        page(
            "Summary",
            vec![group(
                "G",
                vec![computed(
                    "echo",
                    json!({ "type": "selector", "from": {
                        "column": { "page": "Bob's", "column": "total" },
                        "rows": "all"
                    }}),
                )],
            )],
        ),
    ]);
    let output = compile_clean(&value);
    assert_eq!(value_of(&output, "Bob's", "G", "total"), "='Inputs'!$A$2");
    assert_eq!(value_of(&output, "Summary", "G", "echo"), "='Bob''s'!$A$2:$A");
}

#[test]
fn test_row_before_sheet_start_is_issue() {
    let value = book(vec![page(
        "P",
        vec![group("G", vec![text("a"), computed("b", select("a", "-3"))])],
    )]);
    let compilation = compile_value(&value);
    assert_eq!(compilation.issues.len(), 1);
    assert_eq!(compilation.issues[0].kind, IssueKind::Processing);
    assert_eq!(
        issue_paths(&compilation.issues),
        vec!["pages[0].groups[0].columns[1].value.from"]
    );
    // The column is still emitted, without its value
    let column = find_column(&compilation.book, "P", "G", "b");
    assert_eq!(column.value_expression, None);
}

#[test]
fn test_bad_row_syntax_is_issue() {
    let value = book(vec![page(
        "P",
        vec![group("G", vec![text("a"), computed("b", select("a", "row 3"))])],
    )]);
    let issues = compile_issues(&value);
    assert_eq!(
        issues[0].message,
        "invalid row selector 'row 3', expected '$n', '+n' or '-n'"
    );
    assert_eq!(
        issue_paths(&issues),
        vec!["pages[0].groups[0].columns[1].value.from.rows"]
    );
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn test_compound_and_function() {
    let value = book(vec![page(
        "P",
        vec![group(
            "G",
            vec![
                text("price"),
                text("qty"),
                computed(
                    "total",
                    json!({
                        "type": "function",
                        "name": "ROUND",
                        "items": [
                            { "type": "compound", "with": "*", "items": [
                                select("price", "self"),
                                select("qty", "self")
                            ]},
                            2
                        ]
                    }),
                ),
            ],
        )],
    )]);
    let output = compile_clean(&value);
    assert_eq!(value_of(&output, "P", "G", "total"), "=ROUND($A2*$B2,2)");
}

#[test]
fn test_template_binds_only_known_names() {
    let value = book(vec![page(
        "P",
        vec![group(
            "G",
            vec![
                text("a"),
                computed(
                    "b",
                    json!({
                        "type": "template",
                        "text": "IF({x}>0,\"{y}\",0)",
                        "vars": { "x": { "column": { "column": "a" }, "rows": "self" } }
                    }),
                ),
            ],
        )],
    )]);
    let output = compile_clean(&value);
    assert_eq!(value_of(&output, "P", "G", "b"), "=IF($A2>0,\"{y}\",0)");
}

#[test]
fn test_text_value_escapes_control_characters() {
    let value = book(vec![page(
        "P",
        vec![group("G", vec![computed("note", json!("a\tb"))])],
    )]);
    let output = compile_clean(&value);
    assert_eq!(value_of(&output, "P", "G", "note"), "=\"a\"&CHAR(9)&\"b\"");
}

// ============================================================================
// Duplicates and Best Effort
// ============================================================================

#[test]
fn test_duplicate_column_reported_once() {
    let value = book(vec![page(
        "P",
        vec![group("G", vec![text("a"), text("a")])],
    )]);
    let compilation = compile_value(&value);
    assert_eq!(compilation.issues.len(), 1);
    assert_eq!(
        issue_paths(&compilation.issues),
        vec!["pages[0].groups[0].columns[1].name"]
    );
    assert_eq!(compilation.book.pages[0].groups[0].columns.len(), 1);
}

#[test]
fn test_duplicate_page_skipped() {
    let value = book(vec![
        page("P", vec![group("G", vec![text("a")])]),
        page("P", vec![group("H", vec![text("b")])]),
    ]);
    let compilation = compile_value(&value);
    assert!(compilation
        .issues
        .iter()
        .any(|issue| issue.message == "duplicate page name 'P'"));
    assert_eq!(compilation.book.pages.len(), 1);
    assert_eq!(compilation.book.pages[0].groups[0].title, "G");
}

#[test]
fn test_column_after_duplicate_is_addressed_where_emitted() {
    let value = book(vec![page(
        "P",
        vec![group(
            "G",
            vec![text("x"), text("y"), text("x"), computed("z", select("z", "$0"))],
        )],
    )]);
    let compilation = compile_value(&value);
    let titles: Vec<&str> = compilation.book.pages[0].groups[0]
        .columns
        .iter()
        .map(|column| column.title.as_str())
        .collect();
    assert_eq!(titles, vec!["x", "y", "z"]);
    assert_eq!(value_of(&compilation.book, "P", "G", "z"), "=$C$2");
}

#[test]
fn test_duplicate_page_keeps_first_layout() {
    let value = book(vec![
        page("P", vec![group("G", vec![computed("a", select("a", "$0"))])]),
        page(
            "P",
            vec![
                group("H", vec![text("b")]),
                group("G", vec![computed("a", select("a", "$0"))]),
            ],
        ),
    ]);
    let compilation = compile_value(&value);
    assert!(compilation
        .issues
        .iter()
        .any(|issue| issue.message == "duplicate page name 'P'"));
    assert_eq!(compilation.book.pages.len(), 1);
    assert_eq!(compilation.book.pages[0].groups.len(), 1);
    assert_eq!(value_of(&compilation.book, "P", "G", "a"), "=$A$2");
}

#[test]
fn test_duplicate_group_does_not_make_page_grouped() {
    let value = book(vec![page(
        "P",
        vec![
            group("G", vec![computed("a", select("a", "$0"))]),
            group("G", vec![text("b")]),
        ],
    )]);
    let compilation = compile_value(&value);
    assert_eq!(compilation.book.pages[0].groups.len(), 1);
    assert_eq!(value_of(&compilation.book, "P", "G", "a"), "=$A$2");
}

#[test]
fn test_all_issues_are_collected() {
    let value = book(vec![page(
        "P",
        vec![group(
            "G",
            vec![
                computed("a", select("missing", "self")),
                computed("b", select("a", "nope")),
                json!({ "name": "c", "type": "@nothing" }),
            ],
        )],
    )]);
    let compilation = compile_value(&value);
    assert_eq!(
        issue_paths(&compilation.issues),
        vec![
            "pages[0].groups[0].columns[0].value.from.column",
            "pages[0].groups[0].columns[1].value.from.rows",
            "pages[0].groups[0].columns[2].type",
        ]
    );
    let failure = compilation.into_result().unwrap_err();
    assert_eq!(failure.issues.len(), 3);
    assert_eq!(failure.partial.pages[0].groups[0].columns.len(), 3);
}

// ============================================================================
// Output
// ============================================================================

#[test]
fn test_output_json_shape() {
    let value = json!({
        "name": "Book",
        "pages": [{
            "name": "P",
            "rows": 5,
            "theme": { "tab": "#00f", "header": { "bold": true } },
            "groups": [{ "name": "G", "columns": [{
                "name": "status",
                "type": { "type": "enum", "values": ["Open", "Closed"] }
            }]}]
        }]
    });
    let output = compile_clean(&value);

    let mut generator = JsonGenerator::new(Vec::new()).compact();
    generator.generate(&output).unwrap();
    let written: serde_json::Value =
        serde_json::from_slice(&generator.into_inner()).unwrap();

    assert_eq!(
        written,
        json!({
            "title": "Book",
            "pages": [{
                "title": "P",
                "tabColor": "#0000FF",
                "rows": 5,
                "groups": [{
                    "title": "G",
                    "columns": [{
                        "title": "status",
                        "titleStyle": { "bold": true },
                        "behavior": {
                            "validation": {
                                "type": "list",
                                "allowBlank": true,
                                "showDropdown": true,
                                "listValues": ["Open", "Closed"]
                            }
                        }
                    }]
                }]
            }]
        })
    );
}
