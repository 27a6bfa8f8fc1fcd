//! xlbook - declarative spreadsheet book compiler
//!
//! Compiles a book description (pages of grouped columns with themes, typed
//! data rules and formula expressions) into a fully resolved sheet model:
//! - Named definitions shadowed level by level (book, page, group, column)
//! - Theme inheritance with cycle detection
//! - Column selectors resolved to absolute or relative cell addresses
//! - Validation rules, conditional formats and display format patterns
//! - Every problem collected as an issue, never a panic
//!
//! # Usage (Rust)
//!
//! ```no_run
//! use xlbook::{compile_str, CompileOptions};
//!
//! let source = std::fs::read_to_string("book.json")?;
//! match compile_str(&source, &CompileOptions::default()) {
//!     Ok(compilation) => println!("{} issue(s)", compilation.issues.len()),
//!     Err(issues) => eprintln!("{} syntax or schema issue(s)", issues.len()),
//! }
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { compile } from 'xlbook';
//! await init();
//! const book = compile(source);
//! ```

// Front-end and driver
pub mod compile;
pub mod error;
pub mod generate;
pub mod issue;
pub mod parser;
pub mod types;

// Resolution
pub mod behavior;
pub mod column_index;
pub mod registry;
pub mod selector;
pub mod theme;

// Rendering to formula and format text
pub mod cell_ref;
pub mod color;
pub mod conditional;
pub mod data_validation;
pub mod formula;
pub mod numfmt;

use wasm_bindgen::prelude::*;

pub use compile::{compile, Compilation, CompileMetrics, CompileOptions, Failure};
pub use error::XlbookError;
pub use generate::{Generator, JsonGenerator};
pub use issue::{Issue, IssueKind, Path, Resolved};
pub use parser::{compile_str, parse, validate};
pub use types::*;

fn issues_to_js(issues: &[Issue]) -> JsValue {
    serde_json::to_string(issues)
        .map_or_else(|e| JsValue::from_str(&e.to_string()), |s| JsValue::from_str(&s))
}

fn compile_source(source: &str) -> std::result::Result<OutputBook, JsValue> {
    console_error_panic_hook::set_once();
    let compilation =
        compile_str(source, &CompileOptions::default()).map_err(|issues| issues_to_js(&issues))?;
    compilation
        .into_result()
        .map_err(|failure| issues_to_js(&failure.issues))
}

/// Compile a JSON book and return the resolved book as a JSON string
///
/// # Errors
/// Returns the issue list, serialized as a JSON string, if the book has any
/// syntax, schema or compilation issue.
#[wasm_bindgen]
pub fn compile_json(source: &str) -> std::result::Result<String, JsValue> {
    let book = compile_source(source)?;
    serde_json::to_string(&book)
        .map_err(|e| JsValue::from_str(&format!("JSON serialization error: {e}")))
}

/// Compile a JSON book and return the resolved book as a `JsValue`
///
/// This is more efficient than `compile_json` when the result will be
/// used directly in JavaScript.
///
/// # Errors
/// Returns the issue list, serialized as a JSON string, if the book has any
/// syntax, schema or compilation issue.
#[wasm_bindgen(js_name = compile)]
pub fn compile_to_js(source: &str) -> std::result::Result<JsValue, JsValue> {
    let book = compile_source(source)?;
    serde_wasm_bindgen::to_value(&book)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
}

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
