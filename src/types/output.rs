use serde::{Deserialize, Serialize};

use super::{BorderStyle, Color};

/// Fully resolved book handed to a renderer.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutputBook {
    pub title: String,
    pub pages: Vec<OutputPage>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutputPage {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_color: Option<Color>,
    pub rows: u32,
    pub groups: Vec<OutputGroup>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutputGroup {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_style: Option<SheetStyle>,
    pub columns: Vec<OutputColumn>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutputColumn {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_style: Option<SheetStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_style: Option<SheetStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub behavior: Option<Behavior>,
    /// Formula (with leading `=`) filled down from the first data row.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_expression: Option<String>,
}

/// Resolved style with every reference replaced by its value.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SheetStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fore: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beneath: Option<SheetBorder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub between: Option<SheetBorder>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SheetBorder {
    #[serde(rename = "type")]
    pub style: BorderStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

/// Resolved theme; each bucket is merged field by field.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SheetTheme {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab: Option<Color>,
    pub group: SheetStyle,
    pub header: SheetStyle,
    pub data: SheetStyle,
}

/// A column's resolved runtime contract.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Behavior {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<DataValidation>,
    /// Conditional formats in evaluation order.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub conditionals: Vec<ConditionalFormat>,
    /// Display format pattern.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// Type of data validation
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ValidationType {
    Text,
    List,
    Decimal,
    Date,
    Custom,
}

/// Operator for validation and cell-value comparisons
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ValidationOperator {
    Between,
    NotBetween,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Contains,
    BeginsWith,
    EndsWith,
}

/// Data validation rule for a column's data cells.
///
/// Formulas carry no leading `=`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DataValidation {
    #[serde(rename = "type")]
    pub validation_type: ValidationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<ValidationOperator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula2: Option<String>,
    pub allow_blank: bool,
    pub show_dropdown: bool, // For list type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_values: Option<Vec<String>>, // For list type with explicit values
}

impl DataValidation {
    pub fn new(validation_type: ValidationType) -> Self {
        Self {
            validation_type,
            operator: None,
            formula1: None,
            formula2: None,
            allow_blank: true,
            show_dropdown: matches!(validation_type, ValidationType::List),
            list_values: None,
        }
    }
}

/// Conditional formatting rule kinds.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CFRuleType {
    #[serde(rename = "cellIs")]
    CellIs,
    #[serde(rename = "expression")]
    Expression,
    #[serde(rename = "containsText")]
    ContainsText,
    #[serde(rename = "beginsWith")]
    BeginsWith,
    #[serde(rename = "endsWith")]
    EndsWith,
}

/// A conditional format: the rule and the style cells get when it holds.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalFormat {
    #[serde(rename = "type")]
    pub rule_type: CFRuleType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<ValidationOperator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula2: Option<String>,
    pub style: SheetStyle,
}
