use serde::{Deserialize, Serialize};

use super::{ColumnSelector, Expression, Ref, Style};

/// Declared data type of a column.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DataType {
    Text(TextType),
    Enum(EnumType),
    Lookup(LookupType),
    Numeric(NumericType),
    Temporal(TemporalType),
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct TextType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<TextRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub styles: Vec<ConditionalStyle<TextRule>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EnumType {
    pub values: Vec<EnumItem>,
}

/// An enum member: a bare name, or a name with the style its cells get.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum EnumItem {
    Name(String),
    Styled {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        style: Option<Ref<Style>>,
    },
}

impl EnumItem {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Styled { name, .. } => name,
        }
    }

    pub fn style(&self) -> Option<&Ref<Style>> {
        match self {
            Self::Name(_) => None,
            Self::Styled { style, .. } => style.as_ref(),
        }
    }
}

/// Values must come from another column.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LookupType {
    pub values: ColumnSelector,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub styles: Vec<ConditionalStyle<TextRule>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct NumericType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<NumericRule<f64>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub styles: Vec<ConditionalStyle<NumericRule<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<Ref<NumericFormat>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct TemporalType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<NumericRule<TemporalValue>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub styles: Vec<ConditionalStyle<NumericRule<TemporalValue>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<Ref<TemporalFormat>>,
}

/// A rule paired with the style applied to cells that satisfy it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ConditionalStyle<R> {
    pub rule: R,
    pub apply: Ref<Style>,
}

/// Rules over text cells.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TextRule {
    Is { value: String },
    Contains { value: String },
    Begins { value: String },
    Ends { value: String },
    Custom { expression: Expression },
}

/// Rules over numeric or temporal cells.
///
/// The variant is chosen by field shape: `low`/`high` is a range, `value` is
/// a comparison, `expression` is custom.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum NumericRule<T> {
    Range {
        #[serde(rename = "type")]
        operator: RangeOperator,
        low: T,
        high: T,
    },
    Comparison {
        #[serde(rename = "type")]
        operator: ComparisonOperator,
        value: T,
    },
    Custom {
        #[serde(rename = "type")]
        kind: CustomTag,
        expression: Expression,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    #[serde(rename = "=", alias = "eq")]
    Equal,
    #[serde(rename = "<>", alias = "neq")]
    NotEqual,
    #[serde(rename = "<", alias = "lt")]
    Less,
    #[serde(rename = "<=", alias = "lte")]
    LessOrEqual,
    #[serde(rename = ">", alias = "gt")]
    Greater,
    #[serde(rename = ">=", alias = "gte")]
    GreaterOrEqual,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RangeOperator {
    Between,
    Outside,
}

/// The literal `"custom"` rule tag.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CustomTag {
    Custom,
}

/// ISO-like date, time or date-time literal, e.g. `2024-01-31`, `10:30` or
/// `2024-01-31T10:30:00`. Parsed while compiling.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct TemporalValue(pub String);

/// Numeric display format.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct NumericFormat {
    #[serde(rename = "type", default)]
    pub kind: NumericFormatKind,
    /// Integer digits; defaults to a single fixed digit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integer: Option<DigitSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimal: Option<DigitSpec>,
    /// Insert a thousands separator into the integer part.
    #[serde(default)]
    pub commas: bool,
    /// Currency symbol, `$` when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default)]
    pub position: SymbolPosition,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NumericFormatKind {
    #[default]
    Number,
    Percent,
    Currency,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SymbolPosition {
    #[default]
    Prefix,
    Suffix,
}

/// Digit placeholders: a bare count of fixed digits, or explicit counts.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(untagged)]
pub enum DigitSpec {
    Fixed(u32),
    Counts(DigitCounts),
}

impl DigitSpec {
    pub fn counts(self) -> DigitCounts {
        match self {
            Self::Fixed(fixed) => DigitCounts {
                fixed,
                ..DigitCounts::default()
            },
            Self::Counts(counts) => counts,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct DigitCounts {
    /// Always shows a digit, padding with zero.
    #[serde(default)]
    pub fixed: u32,
    /// Shows a digit if present, nothing otherwise.
    #[serde(default)]
    pub flex: u32,
    /// Shows a digit if present, a space otherwise.
    #[serde(default)]
    pub align: u32,
}

/// Temporal display format: literal separators and `(unit, length)` pairs.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct TemporalFormat(pub Vec<TemporalPart>);

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum TemporalPart {
    Literal(String),
    Unit {
        unit: TemporalUnit,
        #[serde(default)]
        length: UnitLength,
    },
}

impl TemporalPart {
    pub fn unit(unit: TemporalUnit, length: UnitLength) -> Self {
        Self::Unit { unit, length }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TemporalUnit {
    Year,
    Month,
    #[serde(alias = "monthName")]
    MonthName,
    Weekday,
    Day,
    Hour,
    Minute,
    Second,
    Meridiem,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnitLength {
    #[default]
    Short,
    Long,
}
