//! JSON front-end
//!
//! `parse` turns source text into a JSON tree, `validate` turns the tree into
//! a typed [`Book`], and `compile_str` chains both with the compiler.
//! Syntax errors carry a source location; schema errors carry a tree path.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::compile::{compile, Compilation, CompileOptions};
use crate::issue::{Issue, Location, Path};
use crate::types::{Book, DataType, Definitions, Expression, Ref, Theme};

/// Parse source text into a JSON tree.
pub fn parse(text: &str) -> Result<Value, Vec<Issue>> {
    serde_json::from_str(text).map_err(|err| {
        let index = byte_index(text, err.line(), err.column());
        let length = usize::from(index < text.len());
        let location = Location {
            index,
            line: err.line(),
            column: err.column(),
        };
        vec![Issue::parsing(strip_position(&err), location, length)]
    })
}

/// Check a JSON tree against the book grammar and its structural rules.
pub fn validate(value: Value) -> Result<Book, Vec<Issue>> {
    let book = match Book::deserialize(&value) {
        Ok(book) => book,
        Err(err) => {
            let mut validator = Validator::default();
            validator.book(&value);
            if validator.issues.is_empty() {
                validator
                    .issues
                    .push(Issue::validating(strip_position(&err), &Path::root()));
            }
            return Err(validator.issues);
        }
    };

    let issues = structural_issues(&book);
    if issues.is_empty() {
        Ok(book)
    } else {
        Err(issues)
    }
}

/// Parse, validate and compile a book.
///
/// Syntax and schema problems stop before compilation and come back as the
/// error; compilation problems are carried by the returned [`Compilation`].
pub fn compile_str(text: &str, options: &CompileOptions) -> Result<Compilation, Vec<Issue>> {
    let value = parse(text)?;
    let book = validate(value)?;
    Ok(compile(&book, options))
}

/// Byte offset of a 1-based line and column.
fn byte_index(text: &str, line: usize, column: usize) -> usize {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(text.len())
}

fn strip_position(err: &serde_json::Error) -> String {
    let message = err.to_string();
    match message.rsplit_once(" at line ") {
        Some((message, _)) => message.to_string(),
        None => message,
    }
}

fn structural_issues(book: &Book) -> Vec<Issue> {
    let mut issues = Vec::new();
    let pages = Path::root().key("pages");
    if book.pages.is_empty() {
        issues.push(Issue::validating("book has no pages", &pages));
    }
    for (i, page) in book.pages.iter().enumerate() {
        let page_path = pages.index(i);
        if page.groups.is_empty() {
            issues.push(Issue::validating(
                format!("page '{}' has no groups", page.name),
                &page_path.key("groups"),
            ));
        }
        for (j, group) in page.groups.iter().enumerate() {
            if group.columns.is_empty() {
                issues.push(Issue::validating(
                    format!("group '{}' has no columns", group.name),
                    &page_path.key("groups").index(j).key("columns"),
                ));
            }
        }
    }
    issues
}

/// Walks the raw tree level by level to pin schema errors to a path.
#[derive(Default)]
struct Validator {
    issues: Vec<Issue>,
}

impl Validator {
    fn object<'v>(
        &mut self,
        value: &'v Value,
        what: &str,
        path: &Path,
    ) -> Option<&'v Map<String, Value>> {
        let object = value.as_object();
        if object.is_none() {
            self.issues
                .push(Issue::validating(format!("{what} must be an object"), path));
        }
        object
    }

    fn array<'v>(
        &mut self,
        object: &'v Map<String, Value>,
        key: &str,
        path: &Path,
    ) -> &'v [Value] {
        match object.get(key) {
            Some(Value::Array(items)) => items,
            Some(_) => {
                self.issues.push(Issue::validating(
                    format!("'{key}' must be an array"),
                    &path.key(key),
                ));
                &[]
            }
            None => {
                self.issues
                    .push(Issue::validating(format!("missing field '{key}'"), path));
                &[]
            }
        }
    }

    fn field<T: DeserializeOwned>(
        &mut self,
        object: &Map<String, Value>,
        key: &str,
        required: bool,
        path: &Path,
    ) {
        match object.get(key) {
            Some(value) => {
                if let Err(err) = T::deserialize(value) {
                    self.issues
                        .push(Issue::validating(strip_position(&err), &path.key(key)));
                }
            }
            None if required => {
                self.issues
                    .push(Issue::validating(format!("missing field '{key}'"), path));
            }
            None => {}
        }
    }

    /// Fields shared by every level: `name`, `theme` and `definitions`.
    fn level(&mut self, object: &Map<String, Value>, path: &Path) {
        self.field::<String>(object, "name", true, path);
        self.field::<Ref<Theme>>(object, "theme", false, path);
        self.field::<Definitions>(object, "definitions", false, path);
    }

    fn book(&mut self, value: &Value) {
        let root = Path::root();
        let Some(book) = self.object(value, "book", &root) else {
            return;
        };
        self.level(book, &root);
        let pages = root.key("pages");
        for (i, page) in self.array(book, "pages", &root).iter().enumerate() {
            self.page(page, &pages.index(i));
        }
    }

    fn page(&mut self, value: &Value, path: &Path) {
        let Some(page) = self.object(value, "page", path) else {
            return;
        };
        self.level(page, path);
        self.field::<u32>(page, "rows", true, path);
        let groups = path.key("groups");
        for (i, group) in self.array(page, "groups", path).iter().enumerate() {
            self.group(group, &groups.index(i));
        }
    }

    fn group(&mut self, value: &Value, path: &Path) {
        let Some(group) = self.object(value, "group", path) else {
            return;
        };
        self.level(group, path);
        let columns = path.key("columns");
        for (i, column) in self.array(group, "columns", path).iter().enumerate() {
            self.column(column, &columns.index(i));
        }
    }

    fn column(&mut self, value: &Value, path: &Path) {
        let Some(column) = self.object(value, "column", path) else {
            return;
        };
        self.level(column, path);
        self.field::<Ref<DataType>>(column, "type", true, path);
        self.field::<Expression>(column, "value", false, path);
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::issue::{IssueKind, Origin};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_case::test_case;

    fn minimal() -> Value {
        json!({
            "name": "Book",
            "pages": [{
                "name": "Sheet",
                "rows": 10,
                "groups": [{
                    "name": "G",
                    "columns": [{ "name": "a", "type": { "type": "text" } }]
                }]
            }]
        })
    }

    // ========================================================================
    // parse
    // ========================================================================

    #[test]
    fn test_parse_reports_location() {
        let issues = parse("{\n  \"name\": ,\n}").unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::Parsing);
        let Origin::Source { location, length } = issues[0].origin else {
            panic!("expected a source location");
        };
        assert_eq!(location.line, 2);
        assert!((2..14).contains(&location.index));
        assert_eq!(length, 1);
        assert!(!issues[0].message.contains("at line"));
    }

    #[test]
    fn test_parse_at_end_of_input_has_no_length() {
        let issues = parse("").unwrap_err();
        let Origin::Source { location, length } = issues[0].origin else {
            panic!("expected a source location");
        };
        assert_eq!(location.index, 0);
        assert_eq!(length, 0);
    }

    #[test_case("a\nbc", 2, 2, 3 ; "second line")]
    #[test_case("abc", 1, 1, 0 ; "first char")]
    #[test_case("abc", 1, 9, 3 ; "clamped")]
    fn test_byte_index(text: &str, line: usize, column: usize, expected: usize) {
        assert_eq!(byte_index(text, line, column), expected);
    }

    // ========================================================================
    // validate
    // ========================================================================

    #[test]
    fn test_validate_minimal_book() {
        let book = validate(minimal()).unwrap();
        assert_eq!(book.name, "Book");
        assert_eq!(book.pages[0].groups[0].columns[0].name, "a");
    }

    #[test]
    fn test_validate_pins_schema_error_to_path() {
        let mut value = minimal();
        value["pages"][0]["groups"][0]["columns"][0]["type"] = json!({ "type": "bogus" });
        let issues = validate(value).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::Validating);
        assert_eq!(
            issues[0].path().unwrap().to_string(),
            "pages[0].groups[0].columns[0].type"
        );
    }

    #[test]
    fn test_validate_missing_rows() {
        let mut value = minimal();
        value["pages"][0].as_object_mut().unwrap().remove("rows");
        let issues = validate(value).unwrap_err();
        assert_eq!(issues[0].message, "missing field 'rows'");
        assert_eq!(issues[0].path().unwrap().to_string(), "pages[0]");
    }

    #[test]
    fn test_validate_empty_levels() {
        let mut value = minimal();
        value["pages"][0]["groups"][0]["columns"] = json!([]);
        let issues = validate(value).unwrap_err();
        assert_eq!(issues[0].message, "group 'G' has no columns");
        assert_eq!(
            issues[0].path().unwrap().to_string(),
            "pages[0].groups[0].columns"
        );

        let issues = validate(json!({ "name": "B", "pages": [] })).unwrap_err();
        assert_eq!(issues[0].message, "book has no pages");
    }

    #[test]
    fn test_validate_non_object() {
        let issues = validate(json!([1, 2])).unwrap_err();
        assert_eq!(issues[0].message, "book must be an object");
    }

    // ========================================================================
    // compile_str
    // ========================================================================

    #[test]
    fn test_compile_str_runs_all_phases() {
        let compilation =
            compile_str(&minimal().to_string(), &CompileOptions::default()).unwrap();
        assert!(compilation.is_success());
        assert_eq!(compilation.book.pages[0].title, "Sheet");
    }

    #[test]
    fn test_compile_str_stops_on_syntax_error() {
        let issues = compile_str("{", &CompileOptions::default()).unwrap_err();
        assert_eq!(issues[0].kind, IssueKind::Parsing);
    }
}
