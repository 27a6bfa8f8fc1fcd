//! Common test utilities and assertion helpers.
//!
//! Books are written as JSON values and run through the same front-end the
//! CLI uses, so these tests cover parsing, validation and compilation.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

use serde_json::{json, Value};
use xlbook::{compile_str, Compilation, CompileOptions, Issue, OutputBook, OutputColumn, OutputPage};

// ============================================================================
// Book Builders
// ============================================================================

/// A text column.
#[must_use]
pub fn text(name: &str) -> Value {
    json!({ "name": name, "type": { "type": "text" } })
}

/// A text column with a computed value.
#[must_use]
pub fn computed(name: &str, value: Value) -> Value {
    json!({ "name": name, "type": { "type": "text" }, "value": value })
}

/// A selector expression pointing at `column` on the enclosing page.
#[must_use]
pub fn select(column: &str, rows: &str) -> Value {
    json!({ "type": "selector", "from": { "column": { "column": column }, "rows": rows } })
}

/// A group with the given columns.
#[must_use]
pub fn group(name: &str, columns: Vec<Value>) -> Value {
    json!({ "name": name, "columns": columns })
}

/// A page with 10 rows and the given groups.
#[must_use]
pub fn page(name: &str, groups: Vec<Value>) -> Value {
    json!({ "name": name, "rows": 10, "groups": groups })
}

/// A book with the given pages.
#[must_use]
pub fn book(pages: Vec<Value>) -> Value {
    json!({ "name": "Book", "pages": pages })
}

// ============================================================================
// Compilation Helpers
// ============================================================================

/// Run a book through parse, validate and compile.
///
/// Panics on syntax or schema issues.
#[must_use]
pub fn compile_value(book: &Value) -> Compilation {
    compile_str(&book.to_string(), &CompileOptions::default())
        .unwrap_or_else(|issues| panic!("book failed validation: {issues:#?}"))
}

/// Compile a book that must come out clean.
#[must_use]
pub fn compile_clean(book: &Value) -> OutputBook {
    compile_value(book)
        .into_result()
        .unwrap_or_else(|failure| panic!("unexpected issues: {:#?}", failure.issues))
}

/// Compile a book that must report issues.
#[must_use]
pub fn compile_issues(book: &Value) -> Vec<Issue> {
    let compilation = compile_value(book);
    assert!(
        !compilation.issues.is_empty(),
        "expected issues, book compiled cleanly"
    );
    compilation.issues
}

// ============================================================================
// Lookup Helpers
// ============================================================================

/// Find a page by title.
pub fn find_page<'a>(book: &'a OutputBook, title: &str) -> &'a OutputPage {
    book.pages
        .iter()
        .find(|page| page.title == title)
        .unwrap_or_else(|| panic!("no page '{title}'"))
}

/// Find a column by page, group and column title.
pub fn find_column<'a>(
    book: &'a OutputBook,
    page: &str,
    group: &str,
    column: &str,
) -> &'a OutputColumn {
    find_page(book, page)
        .groups
        .iter()
        .find(|g| g.title == group)
        .and_then(|g| g.columns.iter().find(|c| c.title == column))
        .unwrap_or_else(|| panic!("no column '{page}'/'{group}'/'{column}'"))
}

/// The column's value formula.
pub fn value_of<'a>(book: &'a OutputBook, page: &str, group: &str, column: &str) -> &'a str {
    find_column(book, page, group, column)
        .value_expression
        .as_deref()
        .unwrap_or_else(|| panic!("column '{column}' has no value"))
}

/// Paths of all issues, rendered.
pub fn issue_paths(issues: &[Issue]) -> Vec<String> {
    issues
        .iter()
        .filter_map(|issue| issue.path().map(ToString::to_string))
        .collect()
}
