//! Data validation rules for a column's data cells.
//!
//! Each builder turns one declared rule into the spreadsheet model: a
//! validation type, an optional operator and up to two formulas (written
//! without a leading `=`). Explicit lists carry their values instead.

use std::cmp::Ordering;

use crate::formula::{number_literal, text_literal, to_formula, FormulaContext, TemporalLiteral};
use crate::issue::{Issue, Path};
use crate::selector::resolve_selector;
use crate::types::{
    ColumnSelector, ComparisonOperator, DataValidation, EnumItem, NumericRule, RangeOperator,
    Selector, TemporalValue, TextRule, ValidationOperator, ValidationType,
};

/// A value numeric and temporal rules compare against.
pub trait RuleValue {
    /// Formula text for the value.
    fn render(&self, path: &Path) -> Result<String, Issue>;

    /// Ordering used to normalize `low`/`high`.
    fn compare(&self, other: &Self) -> Ordering;
}

impl RuleValue for f64 {
    fn render(&self, path: &Path) -> Result<String, Issue> {
        number_literal(*self, path)
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.total_cmp(other)
    }
}

impl RuleValue for TemporalValue {
    fn render(&self, path: &Path) -> Result<String, Issue> {
        TemporalLiteral::parse(&self.0)
            .map(TemporalLiteral::to_formula)
            .ok_or_else(|| {
                Issue::processing(
                    format!(
                        "invalid temporal value '{}', expected a date, time or date-time",
                        self.0
                    ),
                    path,
                )
            })
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (TemporalLiteral::parse(&self.0), TemporalLiteral::parse(&other.0)) {
            (Some(a), Some(b)) => a.instant().cmp(&b.instant()),
            // Unparseable values are reported when rendered
            _ => Ordering::Equal,
        }
    }
}

pub fn comparison_operator(operator: ComparisonOperator) -> ValidationOperator {
    match operator {
        ComparisonOperator::Equal => ValidationOperator::Equal,
        ComparisonOperator::NotEqual => ValidationOperator::NotEqual,
        ComparisonOperator::Less => ValidationOperator::LessThan,
        ComparisonOperator::LessOrEqual => ValidationOperator::LessThanOrEqual,
        ComparisonOperator::Greater => ValidationOperator::GreaterThan,
        ComparisonOperator::GreaterOrEqual => ValidationOperator::GreaterThanOrEqual,
    }
}

pub fn range_operator(operator: RangeOperator) -> ValidationOperator {
    match operator {
        RangeOperator::Between => ValidationOperator::Between,
        RangeOperator::Outside => ValidationOperator::NotBetween,
    }
}

/// Order `low`/`high` so the smaller value comes first.
pub fn normalize_bounds<'a, T: RuleValue>(low: &'a T, high: &'a T) -> (&'a T, &'a T) {
    if high.compare(low) == Ordering::Less {
        (high, low)
    } else {
        (low, high)
    }
}

/// Operator and formulas of a numeric or temporal rule, shared by
/// validation and conditional formatting. `None` operator means custom.
pub struct RuleFormulas {
    pub operator: Option<ValidationOperator>,
    pub formula1: String,
    pub formula2: Option<String>,
}

pub fn numeric_rule_formulas<T: RuleValue>(
    rule: &NumericRule<T>,
    ctx: &FormulaContext<'_>,
    path: &Path,
) -> Result<RuleFormulas, Issue> {
    match rule {
        NumericRule::Comparison { operator, value } => Ok(RuleFormulas {
            operator: Some(comparison_operator(*operator)),
            formula1: value.render(&path.key("value"))?,
            formula2: None,
        }),
        NumericRule::Range {
            operator,
            low,
            high,
        } => {
            let (low, high) = normalize_bounds(low, high);
            Ok(RuleFormulas {
                operator: Some(range_operator(*operator)),
                formula1: low.render(&path.key("low"))?,
                formula2: Some(high.render(&path.key("high"))?),
            })
        }
        NumericRule::Custom { expression, .. } => Ok(RuleFormulas {
            operator: None,
            formula1: to_formula(expression, ctx, &path.key("expression"))?,
            formula2: None,
        }),
    }
}

/// Validation for a numeric (`decimal`) or temporal (`date`) column.
pub fn numeric_validation<T: RuleValue>(
    rule: &NumericRule<T>,
    validation_type: ValidationType,
    ctx: &FormulaContext<'_>,
    path: &Path,
) -> Result<DataValidation, Issue> {
    let formulas = numeric_rule_formulas(rule, ctx, path)?;
    let mut validation = match formulas.operator {
        Some(_) => DataValidation::new(validation_type),
        None => DataValidation::new(ValidationType::Custom),
    };
    validation.operator = formulas.operator;
    validation.formula1 = Some(formulas.formula1);
    validation.formula2 = formulas.formula2;
    Ok(validation)
}

/// Validation for a text column.
pub fn text_validation(
    rule: &TextRule,
    ctx: &FormulaContext<'_>,
    path: &Path,
) -> Result<DataValidation, Issue> {
    let (operator, value) = match rule {
        TextRule::Is { value } => (ValidationOperator::Equal, value),
        TextRule::Contains { value } => (ValidationOperator::Contains, value),
        TextRule::Begins { value } => (ValidationOperator::BeginsWith, value),
        TextRule::Ends { value } => (ValidationOperator::EndsWith, value),
        TextRule::Custom { expression } => {
            let mut validation = DataValidation::new(ValidationType::Custom);
            validation.formula1 = Some(to_formula(expression, ctx, &path.key("expression"))?);
            return Ok(validation);
        }
    };
    let mut validation = DataValidation::new(ValidationType::Text);
    validation.operator = Some(operator);
    validation.formula1 = Some(text_literal(value));
    Ok(validation)
}

/// Validation restricting cells to the enum's item names.
pub fn enum_validation(items: &[EnumItem]) -> DataValidation {
    let mut validation = DataValidation::new(ValidationType::List);
    validation.list_values = Some(items.iter().map(|item| item.name().to_string()).collect());
    validation
}

/// Validation restricting cells to values present in another column.
pub fn lookup_validation(
    values: &ColumnSelector,
    ctx: &FormulaContext<'_>,
    path: &Path,
) -> Result<DataValidation, Issue> {
    let selector = Selector::whole_column(values.clone());
    let address = resolve_selector(&selector, &ctx.selectors, path)?;
    let range = address
        .render(ctx.col, ctx.row)
        .map_err(|err| Issue::processing(err.to_string(), path))?;

    let mut validation = DataValidation::new(ValidationType::List);
    validation.formula1 = Some(range);
    Ok(validation)
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
    use crate::column_index::ColumnIndexMap;
    use crate::selector::SelectorContext;
    use crate::types::{
        Book, Column, CustomTag, DataType, Expression, Group, Operator, Page, Ref, SelfToken,
        TextType,
    };
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn columns() -> ColumnIndexMap {
        let column = |name: &str| Column {
            name: name.to_string(),
            theme: None,
            definitions: None,
            data_type: Ref::Value(DataType::Text(TextType::default())),
            value: None,
        };
        let group = |name: &str, columns: Vec<Column>| Group {
            name: name.to_string(),
            theme: None,
            definitions: None,
            columns,
        };
        let book = Book {
            name: "B".to_string(),
            theme: None,
            definitions: None,
            pages: vec![Page {
                name: "P".to_string(),
                rows: 5,
                theme: None,
                definitions: None,
                groups: vec![
                    group("A", vec![column("x")]),
                    group("B", vec![column("y"), column("z")]),
                ],
            }],
        };
        ColumnIndexMap::build(&book).value
    }

    fn with_ctx<R>(column: &str, f: impl FnOnce(&FormulaContext<'_>) -> R) -> R {
        let columns = columns();
        let index = columns.get("P", "B", column).unwrap().index;
        let ctx = FormulaContext {
            selectors: SelectorContext::new(&columns, "P", "B", column),
            col: index,
            row: 2,
        };
        f(&ctx)
    }

    #[test_case(TextRule::Contains { value: "ab".into() }, ValidationOperator::Contains)]
    #[test_case(TextRule::Begins { value: "ab".into() }, ValidationOperator::BeginsWith)]
    #[test_case(TextRule::Ends { value: "ab".into() }, ValidationOperator::EndsWith)]
    #[test_case(TextRule::Is { value: "ab".into() }, ValidationOperator::Equal)]
    fn test_text_match_rules(rule: TextRule, operator: ValidationOperator) {
        let validation = with_ctx("y", |ctx| text_validation(&rule, ctx, &Path::root())).unwrap();
        assert_eq!(validation.validation_type, ValidationType::Text);
        assert_eq!(validation.operator, Some(operator));
        assert_eq!(validation.formula1.as_deref(), Some("\"ab\""));
    }

    #[test]
    fn test_text_custom_rule() {
        let rule = TextRule::Custom {
            expression: Expression::Compound {
                operator: Operator::NotEqual,
                items: vec![
                    Expression::Selector(Selector::Current(SelfToken::Current)),
                    Expression::Text(String::new()),
                ],
            },
        };
        let validation = with_ctx("y", |ctx| text_validation(&rule, ctx, &Path::root())).unwrap();
        assert_eq!(validation.validation_type, ValidationType::Custom);
        assert_eq!(validation.operator, None);
        assert_eq!(validation.formula1.as_deref(), Some("B3<>\"\""));
    }

    #[test]
    fn test_enum_validation() {
        let items = vec![
            EnumItem::Name("Low".to_string()),
            EnumItem::Styled {
                name: "High".to_string(),
                style: None,
            },
        ];
        let validation = enum_validation(&items);
        assert_eq!(validation.validation_type, ValidationType::List);
        assert!(validation.show_dropdown);
        assert_eq!(
            validation.list_values,
            Some(vec!["Low".to_string(), "High".to_string()])
        );
    }

    #[test]
    fn test_lookup_validation_covers_whole_column() {
        let values = ColumnSelector {
            page: None,
            group: Some("A".to_string()),
            column: "x".to_string(),
        };
        let validation =
            with_ctx("z", |ctx| lookup_validation(&values, ctx, &Path::root())).unwrap();
        assert_eq!(validation.formula1.as_deref(), Some("$A$3:$A"));
    }

    #[test]
    fn test_lookup_validation_missing_column() {
        let values = ColumnSelector::named("nope");
        let issue = with_ctx("z", |ctx| lookup_validation(&values, ctx, &Path::root())).unwrap_err();
        assert!(issue.message.contains("unknown column 'nope'"));
    }

    #[test]
    fn test_numeric_comparison() {
        let rule = NumericRule::Comparison {
            operator: ComparisonOperator::GreaterOrEqual,
            value: 10.0,
        };
        let validation = with_ctx("y", |ctx| {
            numeric_validation(&rule, ValidationType::Decimal, ctx, &Path::root())
        })
        .unwrap();
        assert_eq!(validation.validation_type, ValidationType::Decimal);
        assert_eq!(validation.operator, Some(ValidationOperator::GreaterThanOrEqual));
        assert_eq!(validation.formula1.as_deref(), Some("10"));
        assert_eq!(validation.formula2, None);
    }

    #[test]
    fn test_numeric_range_is_normalized() {
        let forward = NumericRule::Range {
            operator: RangeOperator::Outside,
            low: 1.5,
            high: 9.0,
        };
        let backward = NumericRule::Range {
            operator: RangeOperator::Outside,
            low: 9.0,
            high: 1.5,
        };
        let render = |rule: &NumericRule<f64>| {
            with_ctx("y", |ctx| {
                numeric_validation(rule, ValidationType::Decimal, ctx, &Path::root())
            })
            .unwrap()
        };
        let validation = render(&forward);
        assert_eq!(validation, render(&backward));
        assert_eq!(validation.operator, Some(ValidationOperator::NotBetween));
        assert_eq!(validation.formula1.as_deref(), Some("1.5"));
        assert_eq!(validation.formula2.as_deref(), Some("9"));
    }

    #[test]
    fn test_temporal_range() {
        let rule = NumericRule::Range {
            operator: RangeOperator::Between,
            low: TemporalValue("2024-12-31".to_string()),
            high: TemporalValue("2024-01-01".to_string()),
        };
        let validation = with_ctx("y", |ctx| {
            numeric_validation(&rule, ValidationType::Date, ctx, &Path::root())
        })
        .unwrap();
        assert_eq!(validation.validation_type, ValidationType::Date);
        assert_eq!(validation.formula1.as_deref(), Some("DATE(2024,1,1)"));
        assert_eq!(validation.formula2.as_deref(), Some("DATE(2024,12,31)"));
    }

    #[test]
    fn test_bad_temporal_value() {
        let rule = NumericRule::Comparison {
            operator: ComparisonOperator::Less,
            value: TemporalValue("soon".to_string()),
        };
        let issue = with_ctx("y", |ctx| {
            numeric_validation(&rule, ValidationType::Date, ctx, &Path::root().key("rule"))
        })
        .unwrap_err();
        assert_eq!(issue.path().unwrap().to_string(), "rule.value");
    }

    #[test]
    fn test_numeric_custom_is_custom_validation() {
        let rule: NumericRule<f64> = NumericRule::Custom {
            kind: CustomTag::Custom,
            expression: Expression::Function {
                name: "ISNUMBER".to_string(),
                items: vec![Expression::Selector(Selector::Current(SelfToken::Current))],
            },
        };
        let validation = with_ctx("y", |ctx| {
            numeric_validation(&rule, ValidationType::Decimal, ctx, &Path::root())
        })
        .unwrap();
        assert_eq!(validation.validation_type, ValidationType::Custom);
        assert_eq!(validation.formula1.as_deref(), Some("ISNUMBER(B3)"));
    }
}
