use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Color, DataType, Expression, NumericFormat, Ref, Style, TemporalFormat, Theme};

/// The whole declarative document.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Book {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Ref<Theme>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definitions: Option<Definitions>,
    pub pages: Vec<Page>,
}

/// One sheet of the book.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Page {
    pub name: String,
    /// Number of data rows.
    pub rows: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Ref<Theme>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definitions: Option<Definitions>,
    pub groups: Vec<Group>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Group {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Ref<Theme>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definitions: Option<Definitions>,
    pub columns: Vec<Column>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Ref<Theme>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definitions: Option<Definitions>,
    #[serde(rename = "type")]
    pub data_type: Ref<DataType>,
    /// Literal or computed value filled down the column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Expression>,
}

/// Named definitions, overlaid level by level (book, page, group, column).
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Definitions {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub colors: BTreeMap<String, Ref<Color>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub styles: BTreeMap<String, Ref<Style>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub themes: BTreeMap<String, Ref<Theme>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub numerics: BTreeMap<String, Ref<NumericFormat>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub temporals: BTreeMap<String, Ref<TemporalFormat>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub types: BTreeMap<String, Ref<DataType>>,
}
