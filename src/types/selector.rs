use serde::{Deserialize, Serialize};

/// The literal `"self"`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum SelfToken {
    #[serde(rename = "self")]
    Current,
}

/// Symbolic pointer to a column and a row or row range.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Selector {
    /// The evaluating cell itself.
    Current(SelfToken),
    Target(TargetSelector),
}

impl Selector {
    /// Selector for every data row of the given column.
    pub fn whole_column(column: ColumnSelector) -> Self {
        Self::Target(TargetSelector {
            column: ColumnTarget::Column(column),
            rows: RowTarget::Keyword(RowKeyword::All),
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TargetSelector {
    pub column: ColumnTarget,
    pub rows: RowTarget,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum ColumnTarget {
    Current(SelfToken),
    Column(ColumnSelector),
}

/// Column by name; page and group default to the enclosing ones.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ColumnSelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub column: String,
}

impl ColumnSelector {
    pub fn named(column: impl Into<String>) -> Self {
        Self {
            page: None,
            group: None,
            column: column.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RowKeyword {
    #[serde(rename = "self")]
    Current,
    All,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum RowTarget {
    Keyword(RowKeyword),
    Rows(RowSelector),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum RowSelector {
    Unit(UnitSelector),
    Range { from: UnitSelector, to: UnitSelector },
}

/// Raw row unit: `$n` (absolute, 0-based), `+n` or `-n` (relative).
///
/// Kept as text so malformed units surface while compiling, next to the
/// selector that uses them.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct UnitSelector(pub String);

impl UnitSelector {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
