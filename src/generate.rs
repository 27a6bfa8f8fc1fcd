//! Renderer boundary
//!
//! A [`Generator`] consumes a fully resolved [`OutputBook`]. The compiler
//! calls it once, after the whole book is resolved.

use std::io::Write;

use crate::error::Result;
use crate::issue::{Issue, Path};
use crate::types::OutputBook;

/// Something that turns a resolved book into a concrete artifact.
pub trait Generator {
    fn generate(&mut self, book: &OutputBook) -> std::result::Result<(), Vec<Issue>>;
}

/// Writes the resolved book as JSON.
pub struct JsonGenerator<W: Write> {
    writer: W,
    pretty: bool,
}

impl<W: Write> JsonGenerator<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pretty: true,
        }
    }

    /// Single-line output.
    #[must_use]
    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> JsonGenerator<W> {
    fn write(&mut self, book: &OutputBook) -> Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, book)?;
        } else {
            serde_json::to_writer(&mut self.writer, book)?;
        }
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> Generator for JsonGenerator<W> {
    fn generate(&mut self, book: &OutputBook) -> std::result::Result<(), Vec<Issue>> {
        self.write(book)
            .map_err(|err| vec![Issue::generating(err.to_string(), &Path::root())])
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
    use crate::issue::IssueKind;
    use crate::types::OutputPage;
    use pretty_assertions::assert_eq;

    fn book() -> OutputBook {
        OutputBook {
            title: "Book".to_string(),
            pages: vec![OutputPage {
                title: "Sheet".to_string(),
                rows: 2,
                ..OutputPage::default()
            }],
        }
    }

    #[test]
    fn test_compact_json() {
        let mut generator = JsonGenerator::new(Vec::new()).compact();
        generator.generate(&book()).unwrap();
        let text = String::from_utf8(generator.into_inner()).unwrap();
        assert_eq!(
            text,
            "{\"title\":\"Book\",\"pages\":[{\"title\":\"Sheet\",\"rows\":2,\"groups\":[]}]}\n"
        );
    }

    #[test]
    fn test_pretty_json_round_trips() {
        let mut generator = JsonGenerator::new(Vec::new());
        generator.generate(&book()).unwrap();
        let text = String::from_utf8(generator.into_inner()).unwrap();
        assert!(text.contains("\n  \"pages\""));
        let parsed: OutputBook = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, book());
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_is_generating_issue() {
        let issues = JsonGenerator::new(Broken).generate(&book()).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::Generating);
        assert!(issues[0].message.contains("disk full"));
    }
}
