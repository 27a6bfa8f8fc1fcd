//! Structured error types for xlbook.
//!
//! Domain problems found while compiling a book are [`Issue`](crate::issue::Issue)
//! values and never surface here. This type covers the plumbing around the
//! compiler: reading sources, writing output, and reporting a failed run.

/// All infrastructure errors that can occur around a compilation.
#[derive(Debug, thiserror::Error)]
pub enum XlbookError {
    /// JSON (de)serialization error from serde_json.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The book compiled with issues.
    #[error("compilation failed with {0} issue(s)")]
    Compilation(usize),

    /// The renderer rejected the output book.
    #[error("generation failed: {0}")]
    Generate(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, XlbookError>;

#[cfg(target_arch = "wasm32")]
impl From<XlbookError> for wasm_bindgen::JsValue {
    fn from(e: XlbookError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}
