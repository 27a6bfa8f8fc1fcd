//! Issues reported by every compilation phase.
//!
//! Nothing in the compiler throws for a problem in the input. Each phase
//! records an [`Issue`] tagged with where it happened and keeps going with a
//! best-effort value, so a single run reports every problem at once.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which phase produced an issue.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Parsing,
    Validating,
    Processing,
    Generating,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Parsing => "parsing",
            Self::Validating => "validating",
            Self::Processing => "processing",
            Self::Generating => "generating",
        };
        f.write_str(label)
    }
}

/// One step in a path through the input tree.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

/// Location of a node in the input tree, e.g. `pages[0].groups[1].columns[2].type`.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Path(Vec<PathSegment>);

impl Path {
    /// The empty path (the book itself).
    pub fn root() -> Self {
        Self::default()
    }

    /// A new path one key deeper.
    #[must_use]
    pub fn key(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.to_string()));
        Self(segments)
    }

    /// A new path one index deeper.
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<PathSegment>> for Path {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Index(index) => write!(f, "[{index}]")?,
                PathSegment::Key(key) if i == 0 => f.write_str(key)?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
            }
        }
        Ok(())
    }
}

/// Position of a syntax error in the source text.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Byte offset from the start of the source.
    pub index: usize,
    /// 1-based line.
    pub line: usize,
    /// 1-based column.
    pub column: usize,
}

/// Where an issue points: into the typed tree, or into the raw source.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Origin {
    Path { path: Path },
    Source { location: Location, length: usize },
}

/// A problem found in the input.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub message: String,
    #[serde(flatten)]
    pub origin: Origin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Issue {
    fn at_path(kind: IssueKind, message: impl Into<String>, path: &Path) -> Self {
        Self {
            kind,
            message: message.into(),
            origin: Origin::Path { path: path.clone() },
            data: None,
        }
    }

    pub fn parsing(message: impl Into<String>, location: Location, length: usize) -> Self {
        Self {
            kind: IssueKind::Parsing,
            message: message.into(),
            origin: Origin::Source { location, length },
            data: None,
        }
    }

    pub fn validating(message: impl Into<String>, path: &Path) -> Self {
        Self::at_path(IssueKind::Validating, message, path)
    }

    pub fn processing(message: impl Into<String>, path: &Path) -> Self {
        Self::at_path(IssueKind::Processing, message, path)
    }

    pub fn generating(message: impl Into<String>, path: &Path) -> Self {
        Self::at_path(IssueKind::Generating, message, path)
    }

    /// Attach structured context (e.g. the alias chain of a cycle).
    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// The tree path, when the issue has one.
    pub fn path(&self) -> Option<&Path> {
        match &self.origin {
            Origin::Path { path } => Some(path),
            Origin::Source { .. } => None,
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin {
            Origin::Path { path } => write!(f, "{} error at {path}: {}", self.kind, self.message),
            Origin::Source { location, .. } => write!(
                f,
                "{} error at {}:{}: {}",
                self.kind, location.line, location.column, self.message
            ),
        }
    }
}

/// A best-effort value plus whatever went wrong producing it.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct Resolved<T> {
    pub value: T,
    pub issues: Vec<Issue>,
}

impl<T> Resolved<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            issues: Vec::new(),
        }
    }

    pub fn with_issues(value: T, issues: Vec<Issue>) -> Self {
        Self { value, issues }
    }

    /// Move the issues into `sink` and hand back the value.
    pub fn into_value(self, sink: &mut Vec<Issue>) -> T {
        sink.extend(self.issues);
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolved<U> {
        Resolved {
            value: f(self.value),
            issues: self.issues,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_path_display() {
        let path = Path::root()
            .key("pages")
            .index(0)
            .key("groups")
            .index(2)
            .key("type");
        assert_eq!(path.to_string(), "pages[0].groups[2].type");
        assert_eq!(Path::root().to_string(), "<root>");
    }

    #[test]
    fn test_issue_serializes_path_as_mixed_list() {
        let issue = Issue::processing("bad", &Path::root().key("pages").index(1));
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["type"], "processing");
        assert_eq!(json["path"], serde_json::json!(["pages", 1]));
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_parsing_issue_serializes_location() {
        let location = Location {
            index: 10,
            line: 2,
            column: 3,
        };
        let issue = Issue::parsing("unexpected token", location, 1);
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["location"]["line"], 2);
        assert_eq!(json["length"], 1);
        assert!(issue.path().is_none());
    }

    #[test]
    fn test_resolved_into_value_moves_issues() {
        let resolved = Resolved::with_issues(3, vec![Issue::processing("x", &Path::root())]);
        let mut sink = Vec::new();
        assert_eq!(resolved.into_value(&mut sink), 3);
        assert_eq!(sink.len(), 1);
    }
}
