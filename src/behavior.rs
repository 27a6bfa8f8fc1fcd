//! Column behavior: validation, conditional formats and display format.
//!
//! Every part resolves independently. A column with a broken format but a
//! sound rule still gets its validation, and the issues for the format ride
//! along with the partial behavior.

use crate::conditional::{
    enum_conditionals, numeric_conditional, resolve_conditionals, text_conditional,
};
use crate::data_validation::{
    enum_validation, lookup_validation, numeric_validation, text_validation, RuleValue,
};
use crate::formula::FormulaContext;
use crate::issue::{Issue, Path, Resolved};
use crate::numfmt::{numeric_pattern, temporal_pattern};
use crate::registry::Scope;
use crate::types::{
    Behavior, ConditionalFormat, ConditionalStyle, DataType, DataValidation, NumericRule, Ref,
    TextRule, ValidationType,
};

/// Everything a column's behavior resolves against.
#[derive(Clone, Copy)]
pub struct BehaviorContext<'a> {
    /// The column's first data cell.
    pub formula: FormulaContext<'a>,
    /// Definitions visible at the column.
    pub scope: &'a Scope,
}

/// Resolve a column's declared type (inline or `@name`) into its behavior.
///
/// `path` points at the column's `type` field.
pub fn resolve_behavior(
    data_type: &Ref<DataType>,
    ctx: &BehaviorContext<'_>,
    path: &Path,
) -> Resolved<Option<Behavior>> {
    let data_type = match ctx.scope.types.resolve_ref(data_type, path) {
        Ok(data_type) => data_type,
        Err(issue) => return Resolved::with_issues(None, vec![issue]),
    };
    resolve_data_type(&data_type, ctx, path).map(Some)
}

fn resolve_data_type(
    data_type: &DataType,
    ctx: &BehaviorContext<'_>,
    path: &Path,
) -> Resolved<Behavior> {
    let mut issues = Vec::new();
    let mut behavior = Behavior::default();
    let styles_path = path.key("styles");

    match data_type {
        DataType::Text(text) => {
            behavior.validation = text.rule.as_ref().and_then(|rule| {
                collect(
                    text_validation(rule, &ctx.formula, &path.key("rule")),
                    &mut issues,
                )
            });
            behavior.conditionals =
                text_styles(&text.styles, ctx, &styles_path).into_value(&mut issues);
        }
        DataType::Enum(items) => {
            behavior.validation = Some(enum_validation(&items.values));
            behavior.conditionals = enum_conditionals(&items.values, ctx.scope, &path.key("values"))
                .into_value(&mut issues);
        }
        DataType::Lookup(lookup) => {
            behavior.validation = collect(
                lookup_validation(&lookup.values, &ctx.formula, &path.key("values")),
                &mut issues,
            );
            behavior.conditionals =
                text_styles(&lookup.styles, ctx, &styles_path).into_value(&mut issues);
        }
        DataType::Numeric(numeric) => {
            behavior.validation = numeric_rule(
                numeric.rule.as_ref(),
                ValidationType::Decimal,
                ctx,
                path,
                &mut issues,
            );
            behavior.conditionals =
                numeric_styles(&numeric.styles, ctx, &styles_path).into_value(&mut issues);
            behavior.format = numeric.format.as_ref().and_then(|format| {
                let format_path = path.key("format");
                collect(ctx.scope.numerics.resolve_ref(format, &format_path), &mut issues)
                    .map(|format| numeric_pattern(&format))
            });
        }
        DataType::Temporal(temporal) => {
            behavior.validation = numeric_rule(
                temporal.rule.as_ref(),
                ValidationType::Date,
                ctx,
                path,
                &mut issues,
            );
            behavior.conditionals =
                numeric_styles(&temporal.styles, ctx, &styles_path).into_value(&mut issues);
            behavior.format = temporal.format.as_ref().and_then(|format| {
                let format_path = path.key("format");
                collect(ctx.scope.temporals.resolve_ref(format, &format_path), &mut issues)
                    .map(|format| temporal_pattern(&format))
            });
        }
    }

    Resolved::with_issues(behavior, issues)
}

impl Behavior {
    /// No validation, no conditional formats and no display format.
    pub fn is_empty(&self) -> bool {
        self.validation.is_none() && self.conditionals.is_empty() && self.format.is_none()
    }
}

fn collect<T>(result: Result<T, Issue>, issues: &mut Vec<Issue>) -> Option<T> {
    result.map_err(|issue| issues.push(issue)).ok()
}

fn numeric_rule<T: RuleValue>(
    rule: Option<&NumericRule<T>>,
    validation_type: ValidationType,
    ctx: &BehaviorContext<'_>,
    path: &Path,
    issues: &mut Vec<Issue>,
) -> Option<DataValidation> {
    let rule = rule?;
    collect(
        numeric_validation(rule, validation_type, &ctx.formula, &path.key("rule")),
        issues,
    )
}

fn text_styles(
    styles: &[ConditionalStyle<TextRule>],
    ctx: &BehaviorContext<'_>,
    path: &Path,
) -> Resolved<Vec<ConditionalFormat>> {
    resolve_conditionals(styles, ctx.scope, path, |rule, style, rule_path| {
        text_conditional(rule, style, &ctx.formula, rule_path)
    })
}

fn numeric_styles<T: RuleValue>(
    styles: &[ConditionalStyle<NumericRule<T>>],
    ctx: &BehaviorContext<'_>,
    path: &Path,
) -> Resolved<Vec<ConditionalFormat>> {
    resolve_conditionals(styles, ctx.scope, path, |rule, style, rule_path| {
        numeric_conditional(rule, style, &ctx.formula, rule_path)
    })
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
    use crate::compile::CompileOptions;
    use crate::selector::SelectorContext;
    use crate::types::{
        CFRuleType, ComparisonOperator, Definitions, DigitSpec, NumericFormat, NumericType,
        Style, TemporalType, TextType,
    };
    use pretty_assertions::assert_eq;

    fn resolve(
        data_type: Ref<DataType>,
        definitions: Option<&Definitions>,
    ) -> Resolved<Option<Behavior>> {
        let columns = ColumnIndexMap::default();
        let scope = Scope::root(definitions, &CompileOptions::default());
        let ctx = BehaviorContext {
            formula: FormulaContext {
                selectors: SelectorContext::new(&columns, "P", "G", "c"),
                col: 0,
                row: 1,
            },
            scope: &scope,
        };
        resolve_behavior(&data_type, &ctx, &Path::root().key("type"))
    }

    #[test]
    fn test_plain_text_has_empty_behavior() {
        let resolved = resolve(Ref::Value(DataType::Text(TextType::default())), None);
        assert!(resolved.is_clean());
        assert_eq!(resolved.value, Some(Behavior::default()));
    }

    #[test]
    fn test_numeric_inline_format() {
        let numeric = NumericType {
            format: Some(Ref::Value(NumericFormat {
                decimal: Some(DigitSpec::Fixed(2)),
                ..NumericFormat::default()
            })),
            ..NumericType::default()
        };
        let resolved = resolve(Ref::Value(DataType::Numeric(numeric)), None);
        assert!(resolved.is_clean());
        assert_eq!(resolved.value.unwrap().format.as_deref(), Some("0.00"));
    }

    #[test]
    fn test_temporal_standard_format() {
        let temporal = TemporalType {
            format: Some(Ref::reference("date")),
            ..TemporalType::default()
        };
        let resolved = resolve(Ref::Value(DataType::Temporal(temporal)), None);
        assert_eq!(resolved.value.unwrap().format.as_deref(), Some("yyyy-mm-dd"));
    }

    #[test]
    fn test_bad_format_keeps_rule_and_styles() {
        let numeric = NumericType {
            rule: Some(NumericRule::Comparison {
                operator: ComparisonOperator::Greater,
                value: 0.0,
            }),
            styles: vec![ConditionalStyle {
                rule: NumericRule::Comparison {
                    operator: ComparisonOperator::Greater,
                    value: 100.0,
                },
                apply: Ref::Value(Style {
                    bold: Some(true),
                    ..Style::default()
                }),
            }],
            format: Some(Ref::reference("nonexistent")),
        };
        let resolved = resolve(Ref::Value(DataType::Numeric(numeric)), None);
        assert_eq!(resolved.issues.len(), 1);
        assert_eq!(resolved.issues[0].path().unwrap().to_string(), "type.format");

        let behavior = resolved.value.unwrap();
        assert_eq!(behavior.format, None);
        let validation = behavior.validation.unwrap();
        assert_eq!(validation.validation_type, ValidationType::Decimal);
        assert_eq!(validation.formula1.as_deref(), Some("0"));
        assert_eq!(behavior.conditionals.len(), 1);
        assert_eq!(behavior.conditionals[0].rule_type, CFRuleType::CellIs);
        assert_eq!(behavior.conditionals[0].formula1.as_deref(), Some("100"));
    }

    #[test]
    fn test_type_reference() {
        let definitions = Definitions {
            types: [(
                "money".to_string(),
                Ref::Value(DataType::Numeric(NumericType {
                    format: Some(Ref::reference("currency")),
                    ..NumericType::default()
                })),
            )]
            .into_iter()
            .collect(),
            ..Definitions::default()
        };
        let resolved = resolve(Ref::reference("money"), Some(&definitions));
        assert!(resolved.is_clean());
        assert_eq!(
            resolved.value.unwrap().format.as_deref(),
            Some("\"$\"#,##0.00")
        );
    }

    #[test]
    fn test_unknown_type_reference() {
        let resolved = resolve(Ref::reference("ghost"), None);
        assert_eq!(resolved.value, None);
        assert_eq!(resolved.issues[0].message, "unknown type '@ghost'");
    }
}
