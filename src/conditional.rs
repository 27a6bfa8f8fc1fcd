//! Conditional formats for a column's data cells.
//!
//! A declared conditional style pairs a rule with a style. The rule becomes
//! a conditional-format rule and the style is resolved through the theme
//! path, so a style that fails to resolve still yields the rule with
//! whatever parts of the style did resolve.

use crate::data_validation::{numeric_rule_formulas, RuleValue};
use crate::formula::{text_literal, to_formula, FormulaContext};
use crate::issue::{Issue, Path, Resolved};
use crate::registry::Scope;
use crate::theme::resolve_style;
use crate::types::{
    CFRuleType, ConditionalFormat, ConditionalStyle, EnumItem, NumericRule, SheetStyle, TextRule,
    ValidationOperator,
};

fn rule_format(
    rule_type: CFRuleType,
    operator: Option<ValidationOperator>,
    formula1: String,
    formula2: Option<String>,
    style: SheetStyle,
) -> ConditionalFormat {
    ConditionalFormat {
        rule_type,
        operator,
        formula1: Some(formula1),
        formula2,
        style,
    }
}

/// Conditional format for a text rule.
pub fn text_conditional(
    rule: &TextRule,
    style: SheetStyle,
    ctx: &FormulaContext<'_>,
    path: &Path,
) -> Result<ConditionalFormat, Issue> {
    Ok(match rule {
        TextRule::Is { value } => rule_format(
            CFRuleType::CellIs,
            Some(ValidationOperator::Equal),
            text_literal(value),
            None,
            style,
        ),
        TextRule::Contains { value } => {
            rule_format(CFRuleType::ContainsText, None, text_literal(value), None, style)
        }
        TextRule::Begins { value } => {
            rule_format(CFRuleType::BeginsWith, None, text_literal(value), None, style)
        }
        TextRule::Ends { value } => {
            rule_format(CFRuleType::EndsWith, None, text_literal(value), None, style)
        }
        TextRule::Custom { expression } => rule_format(
            CFRuleType::Expression,
            None,
            to_formula(expression, ctx, &path.key("expression"))?,
            None,
            style,
        ),
    })
}

/// Conditional format for a numeric or temporal rule.
pub fn numeric_conditional<T: RuleValue>(
    rule: &NumericRule<T>,
    style: SheetStyle,
    ctx: &FormulaContext<'_>,
    path: &Path,
) -> Result<ConditionalFormat, Issue> {
    let formulas = numeric_rule_formulas(rule, ctx, path)?;
    let rule_type = match formulas.operator {
        Some(_) => CFRuleType::CellIs,
        None => CFRuleType::Expression,
    };
    Ok(rule_format(
        rule_type,
        formulas.operator,
        formulas.formula1,
        formulas.formula2,
        style,
    ))
}

/// Resolve a list of conditional styles in order, skipping rules that fail.
pub fn resolve_conditionals<R>(
    styles: &[ConditionalStyle<R>],
    scope: &Scope,
    path: &Path,
    build: impl Fn(&R, SheetStyle, &Path) -> Result<ConditionalFormat, Issue>,
) -> Resolved<Vec<ConditionalFormat>> {
    let mut issues = Vec::new();
    let mut formats = Vec::with_capacity(styles.len());

    for (i, conditional) in styles.iter().enumerate() {
        let item_path = path.index(i);
        let style = resolve_style(&conditional.apply, scope, &item_path.key("apply"))
            .into_value(&mut issues);
        match build(&conditional.rule, style, &item_path.key("rule")) {
            Ok(format) => formats.push(format),
            Err(issue) => issues.push(issue),
        }
    }

    Resolved::with_issues(formats, issues)
}

/// One equality rule per enum item that carries a style.
pub fn enum_conditionals(
    items: &[EnumItem],
    scope: &Scope,
    path: &Path,
) -> Resolved<Vec<ConditionalFormat>> {
    let mut issues = Vec::new();
    let formats = items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let style = item.style()?;
            let style =
                resolve_style(style, scope, &path.index(i).key("style")).into_value(&mut issues);
            Some(rule_format(
                CFRuleType::CellIs,
                Some(ValidationOperator::Equal),
                text_literal(item.name()),
                None,
                style,
            ))
        })
        .collect();
    Resolved::with_issues(formats, issues)
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
    use crate::types::{Color, ComparisonOperator, Ref, Style};
    use pretty_assertions::assert_eq;

    fn scope() -> Scope {
        Scope::root(None, &CompileOptions::default())
    }

    fn bold() -> Ref<Style> {
        Ref::Value(Style {
            bold: Some(true),
            ..Style::default()
        })
    }

    fn with_ctx<R>(f: impl FnOnce(&FormulaContext<'_>) -> R) -> R {
        let columns = ColumnIndexMap::default();
        let ctx = FormulaContext {
            selectors: SelectorContext::new(&columns, "P", "G", "c"),
            col: 0,
            row: 1,
        };
        f(&ctx)
    }

    #[test]
    fn test_text_contains() {
        let rule = TextRule::Contains {
            value: "urgent".to_string(),
        };
        let format = with_ctx(|ctx| text_conditional(&rule, SheetStyle::default(), ctx, &Path::root()))
            .unwrap();
        assert_eq!(format.rule_type, CFRuleType::ContainsText);
        assert_eq!(format.operator, None);
        assert_eq!(format.formula1.as_deref(), Some("\"urgent\""));
    }

    #[test]
    fn test_numeric_comparison_is_cell_is() {
        let rule = NumericRule::Comparison {
            operator: ComparisonOperator::Less,
            value: 0.0,
        };
        let format = with_ctx(|ctx| {
            numeric_conditional(&rule, SheetStyle::default(), ctx, &Path::root())
        })
        .unwrap();
        assert_eq!(format.rule_type, CFRuleType::CellIs);
        assert_eq!(format.operator, Some(ValidationOperator::LessThan));
        assert_eq!(format.formula1.as_deref(), Some("0"));
    }

    #[test]
    fn test_enum_conditionals_only_styled_items() {
        let items = vec![
            EnumItem::Name("Open".to_string()),
            EnumItem::Styled {
                name: "Closed".to_string(),
                style: Some(bold()),
            },
            EnumItem::Styled {
                name: "Lost".to_string(),
                style: Some(Ref::Value(Style {
                    fore: Some(Ref::reference("red")),
                    ..Style::default()
                })),
            },
        ];
        let resolved = enum_conditionals(&items, &scope(), &Path::root());
        assert!(resolved.is_clean());
        assert_eq!(resolved.value.len(), 2);
        assert_eq!(resolved.value[0].formula1.as_deref(), Some("\"Closed\""));
        assert_eq!(resolved.value[0].style.bold, Some(true));
        assert_eq!(
            resolved.value[1].style.fore,
            Some("#FF0000".parse::<Color>().unwrap())
        );
    }

    #[test]
    fn test_bad_style_keeps_rule() {
        let styles = vec![ConditionalStyle {
            rule: TextRule::Is {
                value: "x".to_string(),
            },
            apply: Ref::reference("missing"),
        }];
        let resolved = with_ctx(|ctx| {
            resolve_conditionals(&styles, &scope(), &Path::root().key("styles"), |rule, style, path| {
                text_conditional(rule, style, ctx, path)
            })
        });
        assert_eq!(resolved.issues.len(), 1);
        assert_eq!(
            resolved.issues[0].path().unwrap().to_string(),
            "styles[0].apply"
        );
        assert_eq!(resolved.value.len(), 1);
        assert_eq!(resolved.value[0].style, SheetStyle::default());
    }
}
