//! Resolved cell addresses and their A1-style text form.
//!
//! An [`Address`] mixes absolute components (fixed rows and columns, written
//! with a `$` marker) and relative components (offsets from the cell the
//! formula is evaluated at). Rendering needs that evaluation point.

/// One address component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// Zero-based position.
    Absolute(u32),
    /// Signed offset from the evaluation point.
    Relative(i64),
}

impl Unit {
    /// Ordering key: numeric value first, then relative before absolute.
    pub fn sort_key(self) -> (i64, u8) {
        match self {
            Self::Relative(offset) => (offset, 0),
            Self::Absolute(position) => (i64::from(position), 1),
        }
    }

    /// Shift an absolute component; relative offsets already account for
    /// the evaluation point.
    #[must_use]
    pub fn shift_absolute(self, by: u32) -> Self {
        match self {
            Self::Absolute(position) => Self::Absolute(position.saturating_add(by)),
            Self::Relative(_) => self,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub col: Unit,
    pub row: Unit,
}

impl Position {
    pub fn current() -> Self {
        Self {
            col: Unit::Relative(0),
            row: Unit::Relative(0),
        }
    }
}

/// The far end of a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeEnd {
    Cell(Position),
    /// Runs to the end of the column (`$B$3:$B`).
    Open { col: Unit },
}

/// A resolved address, ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    /// Set only when the target lives on another page.
    pub page: Option<String>,
    pub from: Position,
    pub to: Option<RangeEnd>,
}

impl Address {
    pub fn cell(position: Position) -> Self {
        Self {
            page: None,
            from: position,
            to: None,
        }
    }

    /// Render relative to the cell at zero-based `(col, row)`.
    pub fn render(&self, col: u32, row: u32) -> Result<String, AddressError> {
        let mut out = String::new();
        if let Some(page) = &self.page {
            out.push_str(&quote_page(page));
            out.push('!');
        }
        write_column(&mut out, self.from.col, col)?;
        write_row(&mut out, self.from.row, row)?;

        match self.to {
            Some(RangeEnd::Cell(to)) => {
                out.push(':');
                write_column(&mut out, to.col, col)?;
                write_row(&mut out, to.row, row)?;
            }
            Some(RangeEnd::Open { col: to_col }) => {
                out.push(':');
                write_column(&mut out, to_col, col)?;
            }
            None => {}
        }
        Ok(out)
    }
}

/// A relative component that lands before the first row or column.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("relative column offset {offset} from column {origin} is before the first column")]
    NegativeColumn { origin: u32, offset: i64 },
    #[error("relative row offset {offset} from row {origin} is before the first row")]
    NegativeRow { origin: u32, offset: i64 },
}

fn apply_offset(origin: u32, offset: i64) -> Option<u32> {
    u32::try_from(i64::from(origin) + offset).ok()
}

fn write_column(out: &mut String, unit: Unit, origin: u32) -> Result<(), AddressError> {
    match unit {
        Unit::Absolute(col) => {
            out.push('$');
            out.push_str(&column_letters(col));
        }
        Unit::Relative(offset) => {
            let col = apply_offset(origin, offset)
                .ok_or(AddressError::NegativeColumn { origin, offset })?;
            out.push_str(&column_letters(col));
        }
    }
    Ok(())
}

fn write_row(out: &mut String, unit: Unit, origin: u32) -> Result<(), AddressError> {
    let row = match unit {
        Unit::Absolute(row) => {
            out.push('$');
            row
        }
        Unit::Relative(offset) => {
            apply_offset(origin, offset).ok_or(AddressError::NegativeRow { origin, offset })?
        }
    };
    // A1 rows are 1-based
    out.push_str(&(u64::from(row) + 1).to_string());
    Ok(())
}

/// Convert a zero-based column index to letters: 0 -> A, 25 -> Z, 26 -> AA.
pub fn column_letters(col: u32) -> String {
    let mut letters = Vec::new();
    let mut n = u64::from(col) + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + u8::try_from(rem).unwrap_or(0)));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Quote a page name for use as a sheet qualifier, doubling embedded quotes.
pub fn quote_page(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
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
    use test_case::test_case;

    #[test_case(0, "A")]
    #[test_case(1, "B")]
    #[test_case(25, "Z")]
    #[test_case(26, "AA")]
    #[test_case(27, "AB")]
    #[test_case(51, "AZ")]
    #[test_case(52, "BA")]
    #[test_case(701, "ZZ")]
    #[test_case(702, "AAA")]
    #[test_case(16383, "XFD")]
    fn test_column_letters(col: u32, expected: &str) {
        assert_eq!(column_letters(col), expected);
    }

    #[test]
    fn test_quote_page() {
        assert_eq!(quote_page("Sheet1"), "'Sheet1'");
        assert_eq!(quote_page("Bob's Page"), "'Bob''s Page'");
    }

    #[test]
    fn test_render_absolute_cell() {
        let address = Address::cell(Position {
            col: Unit::Absolute(1),
            row: Unit::Absolute(2),
        });
        assert_eq!(address.render(5, 5).unwrap(), "$B$3");
    }

    #[test]
    fn test_render_relative_cell() {
        let address = Address::cell(Position {
            col: Unit::Relative(-1),
            row: Unit::Relative(1),
        });
        assert_eq!(address.render(2, 1).unwrap(), "B3");
        assert_eq!(Address::cell(Position::current()).render(0, 0).unwrap(), "A1");
    }

    #[test]
    fn test_render_open_range_with_page() {
        let address = Address {
            page: Some("My Page".to_string()),
            from: Position {
                col: Unit::Absolute(1),
                row: Unit::Absolute(2),
            },
            to: Some(RangeEnd::Open {
                col: Unit::Absolute(1),
            }),
        };
        assert_eq!(address.render(0, 0).unwrap(), "'My Page'!$B$3:$B");
    }

    #[test]
    fn test_render_closed_range_mixed() {
        let address = Address {
            page: None,
            from: Position {
                col: Unit::Absolute(0),
                row: Unit::Relative(-1),
            },
            to: Some(RangeEnd::Cell(Position {
                col: Unit::Absolute(0),
                row: Unit::Absolute(9),
            })),
        };
        assert_eq!(address.render(3, 4).unwrap(), "$A4:$A$10");
    }

    #[test]
    fn test_negative_offsets_fail() {
        let up = Address::cell(Position {
            col: Unit::Relative(0),
            row: Unit::Relative(-3),
        });
        assert_eq!(
            up.render(0, 2).unwrap_err(),
            AddressError::NegativeRow {
                origin: 2,
                offset: -3
            }
        );

        let left = Address::cell(Position {
            col: Unit::Relative(-1),
            row: Unit::Relative(0),
        });
        assert!(matches!(
            left.render(0, 2),
            Err(AddressError::NegativeColumn { .. })
        ));
    }

    #[test]
    fn test_unit_sort_key_ignores_prefix() {
        assert!(Unit::Relative(1).sort_key() < Unit::Absolute(3).sort_key());
        assert!(Unit::Absolute(2).sort_key() < Unit::Relative(5).sort_key());
        assert!(Unit::Relative(2).sort_key() < Unit::Absolute(2).sort_key());
    }
}
