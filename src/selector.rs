//! Selector resolution: symbolic column/row pointers to [`Address`]es.
//!
//! Absolute rows (`$n`) count data rows from zero and are shifted past the
//! target page's header rows. Relative rows (`+n`, `-n`) are offsets from
//! the evaluating cell and are left alone.

use crate::cell_ref::{Address, Position, RangeEnd, Unit};
use crate::column_index::{header_offset, ColumnIndex, ColumnIndexMap};
use crate::issue::{Issue, Path};
use crate::types::{
    ColumnSelector, ColumnTarget, RowKeyword, RowSelector, RowTarget, Selector, UnitSelector,
};

/// Where a selector is being evaluated.
#[derive(Debug, Clone, Copy)]
pub struct SelectorContext<'a> {
    pub columns: &'a ColumnIndexMap,
    pub page: &'a str,
    pub group: &'a str,
    pub column: &'a str,
}

impl<'a> SelectorContext<'a> {
    pub fn new(
        columns: &'a ColumnIndexMap,
        page: &'a str,
        group: &'a str,
        column: &'a str,
    ) -> Self {
        Self {
            columns,
            page,
            group,
            column,
        }
    }

    /// The evaluating column's own entry.
    fn current(&self, path: &Path) -> Result<&'a ColumnIndex, Issue> {
        self.columns
            .get(self.page, self.group, self.column)
            .ok_or_else(|| {
                Issue::processing(
                    format!(
                        "column '{}' is not indexed in group '{}' of page '{}'",
                        self.column, self.group, self.page
                    ),
                    path,
                )
            })
    }

    /// Look up a named column, defaulting page and group to the context.
    pub fn lookup(&self, selector: &ColumnSelector, path: &Path) -> Result<&'a ColumnIndex, Issue> {
        let page = selector.page.as_deref().unwrap_or(self.page);
        let group = selector.group.as_deref().unwrap_or(self.group);
        self.columns
            .get(page, group, &selector.column)
            .ok_or_else(|| {
                Issue::processing(
                    format!(
                        "unknown column '{}' in group '{group}' of page '{page}'",
                        selector.column
                    ),
                    path,
                )
            })
    }
}

/// Parse `$n`, `+n` or `-n`.
pub fn parse_unit(unit: &UnitSelector, path: &Path) -> Result<Unit, Issue> {
    let text = unit.as_str().trim();
    let invalid = || {
        Issue::processing(
            format!("invalid row selector '{text}', expected '$n', '+n' or '-n'"),
            path,
        )
    };

    let digits = |rest: &str| -> Option<u32> {
        if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        rest.parse().ok()
    };

    if let Some(rest) = text.strip_prefix('$') {
        return digits(rest).map(Unit::Absolute).ok_or_else(invalid);
    }
    if let Some(rest) = text.strip_prefix('+') {
        return digits(rest)
            .map(|n| Unit::Relative(i64::from(n)))
            .ok_or_else(invalid);
    }
    if let Some(rest) = text.strip_prefix('-') {
        return digits(rest)
            .map(|n| Unit::Relative(-i64::from(n)))
            .ok_or_else(invalid);
    }
    Err(invalid())
}

/// Order two units so the smaller value comes first, whatever their prefix.
pub fn normalize_range(a: Unit, b: Unit) -> (Unit, Unit) {
    if b.sort_key() < a.sort_key() {
        (b, a)
    } else {
        (a, b)
    }
}

/// Resolve a selector to an address in the evaluating context.
pub fn resolve_selector(
    selector: &Selector,
    ctx: &SelectorContext<'_>,
    path: &Path,
) -> Result<Address, Issue> {
    let target = match selector {
        Selector::Current(_) => return Ok(Address::cell(Position::current())),
        Selector::Target(target) => target,
    };

    let (col, target_page, grouped) = match &target.column {
        ColumnTarget::Current(_) => {
            let current = ctx.current(path)?;
            (Unit::Relative(0), current.page.as_str(), current.grouped)
        }
        ColumnTarget::Column(column) => {
            let found = ctx.lookup(column, &path.key("column"))?;
            (
                Unit::Absolute(found.index),
                found.page.as_str(),
                found.grouped,
            )
        }
    };
    let offset = header_offset(grouped);
    let rows_path = path.key("rows");

    let (from_row, to) = match &target.rows {
        RowTarget::Keyword(RowKeyword::Current) => (Unit::Relative(0), None),
        RowTarget::Keyword(RowKeyword::All) => {
            (Unit::Absolute(0).shift_absolute(offset), Some(RangeEnd::Open { col }))
        }
        RowTarget::Rows(RowSelector::Unit(unit)) => {
            (parse_unit(unit, &rows_path)?.shift_absolute(offset), None)
        }
        RowTarget::Rows(RowSelector::Range { from, to }) => {
            let from = parse_unit(from, &rows_path.key("from"))?;
            let to = parse_unit(to, &rows_path.key("to"))?;
            let (low, high) = normalize_range(from, to);
            (
                low.shift_absolute(offset),
                Some(RangeEnd::Cell(Position {
                    col,
                    row: high.shift_absolute(offset),
                })),
            )
        }
    };

    Ok(Address {
        page: (target_page != ctx.page).then(|| target_page.to_string()),
        from: Position { col, row: from_row },
        to,
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
    use crate::types::{Book, Column, DataType, Group, Page, Ref, SelfToken, TargetSelector, TextType};
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn group(name: &str, columns: &[&str]) -> Group {
        Group {
            name: name.to_string(),
            theme: None,
            definitions: None,
            columns: columns
                .iter()
                .map(|c| Column {
                    name: (*c).to_string(),
                    theme: None,
                    definitions: None,
                    data_type: Ref::Value(DataType::Text(TextType::default())),
                    value: None,
                })
                .collect(),
        }
    }

    /// "Grid" has two groups (offset 2); "Flat" has one (offset 1).
    fn columns() -> ColumnIndexMap {
        let page = |name: &str, groups| Page {
            name: name.to_string(),
            rows: 10,
            theme: None,
            definitions: None,
            groups,
        };
        let book = Book {
            name: "B".to_string(),
            theme: None,
            definitions: None,
            pages: vec![
                page("Grid", vec![group("G1", &["a", "b"]), group("G2", &["c"])]),
                page("Flat", vec![group("Only", &["x", "y"])]),
            ],
        };
        ColumnIndexMap::build(&book).value
    }

    fn target(column: ColumnTarget, rows: RowTarget) -> Selector {
        Selector::Target(TargetSelector { column, rows })
    }

    fn named(column: &str) -> ColumnTarget {
        ColumnTarget::Column(ColumnSelector::named(column))
    }

    fn unit(text: &str) -> RowTarget {
        RowTarget::Rows(RowSelector::Unit(UnitSelector::new(text)))
    }

    fn range(from: &str, to: &str) -> RowTarget {
        RowTarget::Rows(RowSelector::Range {
            from: UnitSelector::new(from),
            to: UnitSelector::new(to),
        })
    }

    #[test_case("$0", Unit::Absolute(0))]
    #[test_case("$12", Unit::Absolute(12))]
    #[test_case("+3", Unit::Relative(3))]
    #[test_case("-2", Unit::Relative(-2))]
    #[test_case("+0", Unit::Relative(0))]
    fn test_parse_unit(text: &str, expected: Unit) {
        assert_eq!(parse_unit(&UnitSelector::new(text), &Path::root()).unwrap(), expected);
    }

    #[test_case(""; "empty")]
    #[test_case("3"; "no prefix")]
    #[test_case("$"; "no digits")]
    #[test_case("$-1"; "signed absolute")]
    #[test_case("+x"; "not a number")]
    fn test_parse_unit_rejects(text: &str) {
        let issue = parse_unit(&UnitSelector::new(text), &Path::root()).unwrap_err();
        assert!(issue.message.contains("invalid row selector"));
    }

    #[test]
    fn test_self_selector() {
        let columns = columns();
        let ctx = SelectorContext::new(&columns, "Grid", "G1", "a");
        let address = resolve_selector(&Selector::Current(SelfToken::Current), &ctx, &Path::root()).unwrap();
        assert_eq!(address, Address::cell(Position::current()));
    }

    #[test]
    fn test_header_offset_single_group() {
        let columns = columns();
        let ctx = SelectorContext::new(&columns, "Flat", "Only", "x");
        let address = resolve_selector(&target(named("y"), unit("$0")), &ctx, &Path::root()).unwrap();
        assert_eq!(address.from.row, Unit::Absolute(1));
        assert_eq!(address.from.col, Unit::Absolute(1));
        assert_eq!(address.page, None);
    }

    #[test]
    fn test_header_offset_grouped() {
        let columns = columns();
        let ctx = SelectorContext::new(&columns, "Grid", "G1", "a");
        let address = resolve_selector(&target(named("b"), unit("$0")), &ctx, &Path::root()).unwrap();
        assert_eq!(address.from.row, Unit::Absolute(2));
    }

    #[test]
    fn test_relative_rows_are_not_shifted() {
        let columns = columns();
        let ctx = SelectorContext::new(&columns, "Grid", "G1", "a");
        let address = resolve_selector(&target(named("b"), unit("-1")), &ctx, &Path::root()).unwrap();
        assert_eq!(address.from.row, Unit::Relative(-1));
    }

    #[test]
    fn test_other_group_needs_qualifier() {
        let columns = columns();
        let ctx = SelectorContext::new(&columns, "Grid", "G1", "a");
        let missing = resolve_selector(&target(named("c"), unit("+0")), &ctx, &Path::root());
        assert!(missing.unwrap_err().message.contains("unknown column 'c'"));

        let qualified = ColumnTarget::Column(ColumnSelector {
            page: None,
            group: Some("G2".to_string()),
            column: "c".to_string(),
        });
        let address = resolve_selector(&target(qualified, unit("+0")), &ctx, &Path::root()).unwrap();
        assert_eq!(address.from.col, Unit::Absolute(2));
    }

    #[test]
    fn test_cross_page_sets_qualifier_and_uses_target_offset() {
        let columns = columns();
        let ctx = SelectorContext::new(&columns, "Grid", "G1", "a");
        let other = ColumnTarget::Column(ColumnSelector {
            page: Some("Flat".to_string()),
            group: Some("Only".to_string()),
            column: "y".to_string(),
        });
        let address = resolve_selector(&target(other, unit("$4")), &ctx, &Path::root()).unwrap();
        assert_eq!(address.page.as_deref(), Some("Flat"));
        assert_eq!(address.from.row, Unit::Absolute(5));
        assert_eq!(address.render(0, 2).unwrap(), "'Flat'!$B$6");
    }

    #[test]
    fn test_all_rows_is_open_range() {
        let columns = columns();
        let ctx = SelectorContext::new(&columns, "Grid", "G2", "c");
        let address = resolve_selector(
            &target(named("c"), RowTarget::Keyword(RowKeyword::All)),
            &ctx,
            &Path::root(),
        )
        .unwrap();
        assert_eq!(address.render(2, 2).unwrap(), "$C$3:$C");
    }

    #[test]
    fn test_self_column_self_row() {
        let columns = columns();
        let ctx = SelectorContext::new(&columns, "Flat", "Only", "y");
        let address = resolve_selector(
            &target(ColumnTarget::Current(SelfToken::Current), RowTarget::Keyword(RowKeyword::Current)),
            &ctx,
            &Path::root(),
        )
        .unwrap();
        assert_eq!(address.render(1, 1).unwrap(), "B2");
    }

    #[test_case("$1", "$5")]
    #[test_case("+1", "$3")]
    #[test_case("-4", "+2")]
    #[test_case("$2", "+2")]
    #[test_case("$0", "$0")]
    fn test_range_normalization_is_symmetric(a: &str, b: &str) {
        let columns = columns();
        let ctx = SelectorContext::new(&columns, "Grid", "G1", "a");
        let forward = resolve_selector(&target(named("b"), range(a, b)), &ctx, &Path::root()).unwrap();
        let backward = resolve_selector(&target(named("b"), range(b, a)), &ctx, &Path::root()).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_range_orders_by_value_not_prefix() {
        let columns = columns();
        let ctx = SelectorContext::new(&columns, "Flat", "Only", "x");
        let address = resolve_selector(&target(named("x"), range("$3", "+1")), &ctx, &Path::root()).unwrap();
        assert_eq!(address.from.row, Unit::Relative(1));
        assert_eq!(
            address.to,
            Some(RangeEnd::Cell(Position {
                col: Unit::Absolute(0),
                row: Unit::Absolute(4),
            }))
        );
    }

    #[test]
    fn test_bad_unit_reports_path() {
        let columns = columns();
        let ctx = SelectorContext::new(&columns, "Flat", "Only", "x");
        let issue = resolve_selector(&target(named("x"), range("$1", "oops")), &ctx, &Path::root().key("value"))
            .unwrap_err();
        assert_eq!(issue.path().unwrap().to_string(), "value.rows.to");
    }
}
