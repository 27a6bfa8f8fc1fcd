//! Expression to formula text.
//!
//! Formulas come out without a leading `=`; callers add one where the
//! target expects it (cell values) and leave it off where it doesn't
//! (validation and conditional-format rules).

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::issue::{Issue, Path};
use crate::selector::{resolve_selector, SelectorContext};
use crate::types::{Expression, Selector};

/// Evaluation point of a formula: the selector context plus the zero-based
/// cell the formula is written for.
#[derive(Debug, Clone, Copy)]
pub struct FormulaContext<'a> {
    pub selectors: SelectorContext<'a>,
    pub col: u32,
    pub row: u32,
}

/// Render an expression to formula text.
pub fn to_formula(
    expr: &Expression,
    ctx: &FormulaContext<'_>,
    path: &Path,
) -> Result<String, Issue> {
    match expr {
        Expression::Text(text) => Ok(text_literal(text)),
        Expression::Number(value) => number_literal(*value, path),
        Expression::Boolean(value) => Ok(bool_literal(*value).to_string()),
        Expression::Compound { operator, items } => {
            if items.is_empty() {
                return Err(Issue::processing(
                    format!("'{}' expression needs at least one item", operator.token()),
                    path,
                ));
            }
            let items_path = path.key("items");
            let rendered = items
                .iter()
                .enumerate()
                .map(|(i, item)| to_operand(item, ctx, &items_path.index(i)))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rendered.join(operator.token()))
        }
        Expression::Negated(item) => {
            let inner = to_formula(item, ctx, &path.key("item"))?;
            Ok(format!("-({inner})"))
        }
        Expression::Function { name, items } => {
            let items_path = path.key("items");
            let args = items
                .iter()
                .enumerate()
                .map(|(i, item)| to_formula(item, ctx, &items_path.index(i)))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(format!("{name}({})", args.join(",")))
        }
        Expression::Selector(selector) => render_selector(selector, ctx, &path.key("from")),
        Expression::Template { text, vars } => {
            let mut out = String::with_capacity(text.len());
            let mut rest = text.as_str();
            while let Some(open) = rest.find('{') {
                let (before, tail) = rest.split_at(open);
                out.push_str(before);
                let bound = tail.find('}').and_then(|close| {
                    let name = tail.get(1..close)?;
                    vars.get(name).map(|selector| (name, selector, close))
                });
                match bound {
                    Some((name, selector, close)) => {
                        let vars_path = path.key("vars").key(name);
                        out.push_str(&render_selector(selector, ctx, &vars_path)?);
                        rest = tail.get(close + 1..).unwrap_or_default();
                    }
                    None => {
                        // Unbound braces are literal text
                        out.push('{');
                        rest = tail.get(1..).unwrap_or_default();
                    }
                }
            }
            out.push_str(rest);
            Ok(out)
        }
    }
}

/// Operands of a compound are parenthesized when they could bind looser
/// than the surrounding operator.
fn to_operand(expr: &Expression, ctx: &FormulaContext<'_>, path: &Path) -> Result<String, Issue> {
    let rendered = to_formula(expr, ctx, path)?;
    let needs_parens = match expr {
        Expression::Compound { items, .. } => items.len() > 1,
        Expression::Text(text) => text_segments(text).len() > 1,
        Expression::Template { .. } => true,
        _ => false,
    };
    Ok(if needs_parens {
        format!("({rendered})")
    } else {
        rendered
    })
}

fn render_selector(
    selector: &Selector,
    ctx: &FormulaContext<'_>,
    path: &Path,
) -> Result<String, Issue> {
    let address = resolve_selector(selector, &ctx.selectors, path)?;
    address
        .render(ctx.col, ctx.row)
        .map_err(|err| Issue::processing(err.to_string(), path))
}

#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Plain(&'a str),
    Code(u32),
}

fn text_segments(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if matches!(c, '\t' | '\n' | '\r' | '"') {
            if let Some(plain) = text.get(start..i).filter(|s| !s.is_empty()) {
                segments.push(Segment::Plain(plain));
            }
            segments.push(Segment::Code(u32::from(c)));
            start = i + c.len_utf8();
        }
    }
    if let Some(plain) = text.get(start..).filter(|s| !s.is_empty()) {
        segments.push(Segment::Plain(plain));
    }
    segments
}

/// Render a string literal. Tabs, line breaks and double quotes become
/// `CHAR(n)` calls joined with `&`.
pub fn text_literal(text: &str) -> String {
    let segments = text_segments(text);
    if segments.is_empty() {
        return "\"\"".to_string();
    }
    segments
        .iter()
        .map(|segment| match segment {
            Segment::Plain(plain) => format!("\"{plain}\""),
            Segment::Code(code) => format!("CHAR({code})"),
        })
        .collect::<Vec<_>>()
        .join("&")
}

pub fn number_literal(value: f64, path: &Path) -> Result<String, Issue> {
    if value.is_finite() {
        Ok(value.to_string())
    } else {
        Err(Issue::processing(
            format!("number {value} has no formula form"),
            path,
        ))
    }
}

pub fn bool_literal(value: bool) -> &'static str {
    if value {
        "TRUE"
    } else {
        "FALSE"
    }
}

/// An ISO-like date, time or date-time literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalLiteral {
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
}

impl TemporalLiteral {
    /// Parse `2024-01-31`, `10:30`, `10:30:15` or `2024-01-31T10:30:00`.
    /// Seconds are optional; a space may separate date and time.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Some((day, clock)) = text.split_once(['T', ' ']) {
            let joined = format!("{day}T{clock}");
            return NaiveDateTime::parse_from_str(&joined, "%Y-%m-%dT%H:%M:%S")
                .or_else(|_| NaiveDateTime::parse_from_str(&joined, "%Y-%m-%dT%H:%M"))
                .ok()
                .map(Self::DateTime);
        }
        if let Ok(day) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return Some(Self::Date(day));
        }
        NaiveTime::parse_from_str(text, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
            .ok()
            .map(Self::Time)
    }

    /// Point in time used for ordering. A bare time sorts before every
    /// date, the way time serials (< 1) sort before date serials.
    pub fn instant(self) -> NaiveDateTime {
        match self {
            Self::Date(day) => day.and_time(NaiveTime::MIN),
            Self::Time(clock) => NaiveDate::MIN.and_time(clock),
            Self::DateTime(stamp) => stamp,
        }
    }

    /// `DATE(..)`, `TIME(..)` or `DATE(..)+TIME(..)`.
    pub fn to_formula(self) -> String {
        let date = |d: NaiveDate| format!("DATE({},{},{})", d.year(), d.month(), d.day());
        let time = |t: NaiveTime| format!("TIME({},{},{})", t.hour(), t.minute(), t.second());
        match self {
            Self::Date(day) => date(day),
            Self::Time(clock) => time(clock),
            Self::DateTime(stamp) => format!("{}+{}", date(stamp.date()), time(stamp.time())),
        }
    }
}

pub fn temporal_literal(text: &str) -> Option<String> {
    TemporalLiteral::parse(text).map(TemporalLiteral::to_formula)
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
    use crate::types::{
        Book, Column, ColumnSelector, ColumnTarget, DataType, Group, Operator, Page, Ref,
        RowSelector, RowTarget, SelfToken, TargetSelector, TextType, UnitSelector,
    };
    use std::collections::BTreeMap;
    use test_case::test_case;

    fn columns() -> ColumnIndexMap {
        let column = |name: &str| Column {
            name: name.to_string(),
            theme: None,
            definitions: None,
            data_type: Ref::Value(DataType::Text(TextType::default())),
            value: None,
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
                groups: vec![Group {
                    name: "G".to_string(),
                    theme: None,
                    definitions: None,
                    columns: vec![column("price"), column("qty"), column("total")],
                }],
            }],
        };
        ColumnIndexMap::build(&book).value
    }

    fn render(expr: &Expression) -> Result<String, Issue> {
        let columns = columns();
        let ctx = FormulaContext {
            selectors: SelectorContext::new(&columns, "P", "G", "total"),
            col: 2,
            row: 1,
        };
        to_formula(expr, &ctx, &Path::root())
    }

    fn same_row(column: &str) -> Selector {
        Selector::Target(TargetSelector {
            column: ColumnTarget::Column(ColumnSelector::named(column)),
            rows: RowTarget::Rows(RowSelector::Unit(UnitSelector::new("+0"))),
        })
    }

    // ========================================================================
    // Literals
    // ========================================================================

    #[test_case("abc", "\"abc\""; "plain")]
    #[test_case("", "\"\""; "empty")]
    #[test_case("a\tb", "\"a\"&CHAR(9)&\"b\""; "tab")]
    #[test_case("line\n", "\"line\"&CHAR(10)"; "trailing newline")]
    #[test_case("say \"hi\"", "\"say \"&CHAR(34)&\"hi\"&CHAR(34)"; "quotes")]
    #[test_case("\r\n", "CHAR(13)&CHAR(10)"; "only specials")]
    fn test_text_literal(input: &str, expected: &str) {
        assert_eq!(text_literal(input), expected);
    }

    #[test]
    fn test_text_literal_segments_reassemble() {
        let text = "a\tb";
        let rebuilt: String = text_segments(text)
            .iter()
            .map(|segment| match segment {
                Segment::Plain(plain) => (*plain).to_string(),
                Segment::Code(code) => char::from_u32(*code).unwrap().to_string(),
            })
            .collect();
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_number_and_bool_literals() {
        assert_eq!(render(&Expression::Number(2.0)).unwrap(), "2");
        assert_eq!(render(&Expression::Number(-0.25)).unwrap(), "-0.25");
        assert_eq!(render(&Expression::Boolean(true)).unwrap(), "TRUE");
        assert!(render(&Expression::Number(f64::NAN)).is_err());
    }

    #[test_case("2024-01-31", Some("DATE(2024,1,31)"))]
    #[test_case("10:30", Some("TIME(10,30,0)"))]
    #[test_case("10:30:15", Some("TIME(10,30,15)"))]
    #[test_case("2024-01-31T10:30:00", Some("DATE(2024,1,31)+TIME(10,30,0)"))]
    #[test_case("2024-01-31 08:05", Some("DATE(2024,1,31)+TIME(8,5,0)"))]
    #[test_case("2024-02-30", None; "impossible date")]
    #[test_case("yesterday", None)]
    fn test_temporal_literal(input: &str, expected: Option<&str>) {
        assert_eq!(temporal_literal(input).as_deref(), expected);
    }

    #[test]
    fn test_temporal_ordering() {
        let instant = |text| TemporalLiteral::parse(text).unwrap().instant();
        assert!(instant("2024-01-31") < instant("2024-01-31T00:00:01"));
        assert!(instant("23:59") < instant("1900-01-01"));
        assert!(instant("2023-12-31 23:00") < instant("2024-01-01"));
    }

    // ========================================================================
    // Composite expressions
    // ========================================================================

    #[test]
    fn test_compound_with_selectors() {
        let expr = Expression::Compound {
            operator: Operator::Multiply,
            items: vec![
                Expression::Selector(same_row("price")),
                Expression::Selector(same_row("qty")),
            ],
        };
        assert_eq!(render(&expr).unwrap(), "$A2*$B2");
    }

    #[test]
    fn test_nested_compound_is_parenthesized() {
        let expr = Expression::Compound {
            operator: Operator::Multiply,
            items: vec![
                Expression::Compound {
                    operator: Operator::Add,
                    items: vec![Expression::Number(1.0), Expression::Number(2.0)],
                },
                Expression::Number(3.0),
            ],
        };
        assert_eq!(render(&expr).unwrap(), "(1+2)*3");
    }

    #[test]
    fn test_escaped_text_operand_is_parenthesized() {
        let expr = Expression::Compound {
            operator: Operator::Equal,
            items: vec![
                Expression::Selector(Selector::Current(SelfToken::Current)),
                Expression::Text("a\tb".to_string()),
            ],
        };
        assert_eq!(render(&expr).unwrap(), "C2=(\"a\"&CHAR(9)&\"b\")");
    }

    #[test]
    fn test_negated_and_function() {
        let expr = Expression::Function {
            name: "ROUND".to_string(),
            items: vec![
                Expression::Negated(Box::new(Expression::Selector(same_row("price")))),
                Expression::Number(2.0),
            ],
        };
        assert_eq!(render(&expr).unwrap(), "ROUND(-($A2),2)");
    }

    #[test]
    fn test_function_without_args() {
        let expr = Expression::Function {
            name: "TODAY".to_string(),
            items: vec![],
        };
        assert_eq!(render(&expr).unwrap(), "TODAY()");
    }

    #[test]
    fn test_empty_compound_fails() {
        let expr = Expression::Compound {
            operator: Operator::Add,
            items: vec![],
        };
        assert!(render(&expr).is_err());
    }

    #[test]
    fn test_template_substitutes_bound_names_only() {
        let mut vars = BTreeMap::new();
        vars.insert("p".to_string(), same_row("price"));
        let expr = Expression::Template {
            text: "IF({p}>0,{p},{other})".to_string(),
            vars,
        };
        assert_eq!(render(&expr).unwrap(), "IF($A2>0,$A2,{other})");
    }

    #[test]
    fn test_negative_relative_row_is_an_error() {
        let selector = Selector::Target(TargetSelector {
            column: ColumnTarget::Current(SelfToken::Current),
            rows: RowTarget::Rows(RowSelector::Unit(UnitSelector::new("-5"))),
        });
        let issue = render(&Expression::Selector(selector)).unwrap_err();
        assert!(issue.message.contains("before the first row"));
        assert_eq!(issue.path().unwrap().to_string(), "from");
    }

    #[test]
    fn test_unknown_column_is_an_error() {
        let issue = render(&Expression::Selector(same_row("missing"))).unwrap_err();
        assert!(issue.message.contains("unknown column 'missing'"));
    }
}
