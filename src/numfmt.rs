//! Number format pattern generation
//!
//! Builds spreadsheet format codes from declarative formats:
//!
//! - Numeric: integer and decimal parts made of three placeholder kinds.
//!   `0` always shows a digit, `#` shows a digit only when present, `?` shows
//!   a digit or a space. Optional thousands separator, percent marker and
//!   currency symbol.
//! - Temporal: literal separators and `(unit, length)` pairs mapped through a
//!   fixed token table (`yyyy`, `mmm`, `dddd`, `AM/PM`, ...).
//!
//! Also holds the standard format library used as the fallback resolver for
//! `@name` format references.

use crate::types::{
    DigitCounts, NumericFormat, NumericFormatKind, SymbolPosition, TemporalFormat, TemporalPart,
    TemporalUnit, UnitLength,
};

/// Default currency symbol.
pub const DEFAULT_SYMBOL: &str = "$";

fn push_repeat(out: &mut String, placeholder: char, count: u32) {
    for _ in 0..count {
        out.push(placeholder);
    }
}

/// Integer placeholders: flexible, then aligned, then fixed, so the fixed
/// digits sit next to the decimal point.
fn integer_part(counts: DigitCounts, commas: bool) -> String {
    let mut digits = String::new();
    push_repeat(&mut digits, '#', counts.flex);
    push_repeat(&mut digits, '?', counts.align);
    push_repeat(&mut digits, '0', counts.fixed);

    if !commas {
        return digits;
    }

    // A separator needs at least one placeholder on each side of it
    let mut padded = String::new();
    push_repeat(
        &mut padded,
        '#',
        4u32.saturating_sub(u32::try_from(digits.chars().count()).unwrap_or(u32::MAX)),
    );
    padded.push_str(&digits);

    let chars: Vec<char> = padded.chars().collect();
    let mut grouped = String::with_capacity(chars.len() + chars.len() / 3);
    for (i, c) in chars.iter().enumerate() {
        let from_right = chars.len() - i;
        if i > 0 && from_right % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }
    grouped
}

/// Decimal placeholders: fixed, then aligned, then flexible.
fn decimal_part(counts: DigitCounts) -> String {
    let mut digits = String::new();
    push_repeat(&mut digits, '0', counts.fixed);
    push_repeat(&mut digits, '?', counts.align);
    push_repeat(&mut digits, '#', counts.flex);
    if digits.is_empty() {
        digits
    } else {
        format!(".{digits}")
    }
}

/// Quote a literal for a format code. A quoted section cannot hold `"`,
/// so each one is written between sections as `\"`.
fn quoted(text: &str) -> String {
    if text.is_empty() {
        return "\"\"".to_string();
    }
    let mut code = String::new();
    for (i, part) in text.split('"').enumerate() {
        if i > 0 {
            code.push_str("\\\"");
        }
        if !part.is_empty() {
            code.push('"');
            code.push_str(part);
            code.push('"');
        }
    }
    code
}

/// Compile a numeric format to a format code, e.g. `#,##0.00`.
pub fn numeric_pattern(format: &NumericFormat) -> String {
    let integer = format.integer.map_or(
        DigitCounts {
            fixed: 1,
            ..DigitCounts::default()
        },
        |spec| spec.counts(),
    );
    let decimal = format.decimal.map(|spec| spec.counts()).unwrap_or_default();

    let mut pattern = integer_part(integer, format.commas);
    pattern.push_str(&decimal_part(decimal));

    match format.kind {
        NumericFormatKind::Number => pattern,
        NumericFormatKind::Percent => {
            pattern.push('%');
            pattern
        }
        NumericFormatKind::Currency => {
            let symbol = quoted(format.symbol.as_deref().unwrap_or(DEFAULT_SYMBOL));
            match format.position {
                SymbolPosition::Prefix => format!("{symbol}{pattern}"),
                SymbolPosition::Suffix => format!("{pattern}{symbol}"),
            }
        }
    }
}

/// Format token for one temporal unit.
pub const fn temporal_token(unit: TemporalUnit, length: UnitLength) -> &'static str {
    match (unit, length) {
        (TemporalUnit::Year, UnitLength::Short) => "yy",
        (TemporalUnit::Year, UnitLength::Long) => "yyyy",
        (TemporalUnit::Month, UnitLength::Short) => "m",
        (TemporalUnit::Month, UnitLength::Long) => "mm",
        (TemporalUnit::MonthName, UnitLength::Short) => "mmm",
        (TemporalUnit::MonthName, UnitLength::Long) => "mmmm",
        (TemporalUnit::Weekday, UnitLength::Short) => "ddd",
        (TemporalUnit::Weekday, UnitLength::Long) => "dddd",
        (TemporalUnit::Day, UnitLength::Short) => "d",
        (TemporalUnit::Day, UnitLength::Long) => "dd",
        (TemporalUnit::Hour, UnitLength::Short) => "h",
        (TemporalUnit::Hour, UnitLength::Long) => "hh",
        (TemporalUnit::Minute, UnitLength::Short) => "m",
        (TemporalUnit::Minute, UnitLength::Long) => "mm",
        (TemporalUnit::Second, UnitLength::Short) => "s",
        (TemporalUnit::Second, UnitLength::Long) => "ss",
        (TemporalUnit::Meridiem, UnitLength::Short) => "A/P",
        (TemporalUnit::Meridiem, UnitLength::Long) => "AM/PM",
    }
}

/// Separators that format codes display as-is.
fn is_plain_separator(c: char) -> bool {
    matches!(c, ' ' | '-' | '/' | ':' | '.' | ',' | '(' | ')')
}

/// Compile a temporal format to a format code, e.g. `yyyy-mm-dd`.
pub fn temporal_pattern(format: &TemporalFormat) -> String {
    let mut pattern = String::new();
    for part in &format.0 {
        match part {
            TemporalPart::Unit { unit, length } => pattern.push_str(temporal_token(*unit, *length)),
            TemporalPart::Literal(text) => {
                for c in text.chars() {
                    // Anything else could read as a format code
                    if !is_plain_separator(c) {
                        pattern.push('\\');
                    }
                    pattern.push(c);
                }
            }
        }
    }
    pattern
}

/// Standard numeric formats: `integer`, `decimal`, `thousands`, `percent`,
/// `currency`.
pub fn standard_numeric_format(name: &str) -> Option<NumericFormat> {
    let two_places = Some(crate::types::DigitSpec::Fixed(2));
    let format = match name {
        "integer" => NumericFormat::default(),
        "decimal" => NumericFormat {
            decimal: two_places,
            ..NumericFormat::default()
        },
        "thousands" => NumericFormat {
            commas: true,
            ..NumericFormat::default()
        },
        "percent" => NumericFormat {
            kind: NumericFormatKind::Percent,
            ..NumericFormat::default()
        },
        "currency" => NumericFormat {
            kind: NumericFormatKind::Currency,
            decimal: two_places,
            commas: true,
            ..NumericFormat::default()
        },
        _ => return None,
    };
    Some(format)
}

/// Standard temporal formats: `date`, `time`, `datetime`, `iso`.
pub fn standard_temporal_format(name: &str) -> Option<TemporalFormat> {
    use TemporalUnit::{Day, Hour, Minute, Month, Second, Year};
    let long = |unit| TemporalPart::unit(unit, UnitLength::Long);
    let lit = |text: &str| TemporalPart::Literal(text.to_string());

    let date = vec![long(Year), lit("-"), long(Month), lit("-"), long(Day)];
    let parts = match name {
        "date" => date,
        "time" => vec![long(Hour), lit(":"), long(Minute), lit(":"), long(Second)],
        "datetime" => {
            let mut parts = date;
            parts.extend([lit(" "), long(Hour), lit(":"), long(Minute)]);
            parts
        }
        "iso" => {
            let mut parts = date;
            parts.extend([
                lit("T"),
                long(Hour),
                lit(":"),
                long(Minute),
                lit(":"),
                long(Second),
            ]);
            parts
        }
        _ => return None,
    };
    Some(TemporalFormat(parts))
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
    use crate::types::DigitSpec;
    use test_case::test_case;

    fn counts(fixed: u32, flex: u32, align: u32) -> Option<DigitSpec> {
        Some(DigitSpec::Counts(DigitCounts { fixed, flex, align }))
    }

    // ========================================================================
    // Numeric
    // ========================================================================

    #[test]
    fn test_default_is_single_fixed_digit() {
        assert_eq!(numeric_pattern(&NumericFormat::default()), "0");
    }

    #[test]
    fn test_two_decimals() {
        let format = NumericFormat {
            decimal: Some(DigitSpec::Fixed(2)),
            ..NumericFormat::default()
        };
        assert_eq!(numeric_pattern(&format), "0.00");
    }

    #[test_case(counts(1, 0, 0), counts(2, 1, 0), "0.00#")]
    #[test_case(counts(2, 3, 1), None, "###?00")]
    #[test_case(counts(0, 1, 0), counts(0, 0, 2), "#.??")]
    #[test_case(counts(0, 0, 0), counts(2, 0, 0), ".00")]
    fn test_placeholder_order(
        integer: Option<DigitSpec>,
        decimal: Option<DigitSpec>,
        expected: &str,
    ) {
        let format = NumericFormat {
            integer,
            decimal,
            ..NumericFormat::default()
        };
        assert_eq!(numeric_pattern(&format), expected);
    }

    #[test_case(Some(DigitSpec::Fixed(1)), "#,##0")]
    #[test_case(Some(DigitSpec::Fixed(4)), "0,000")]
    #[test_case(Some(DigitSpec::Fixed(7)), "0,000,000")]
    #[test_case(counts(2, 0, 0), "#,#00")]
    fn test_thousands_separator(integer: Option<DigitSpec>, expected: &str) {
        let format = NumericFormat {
            integer,
            commas: true,
            ..NumericFormat::default()
        };
        assert_eq!(numeric_pattern(&format), expected);
    }

    #[test]
    fn test_percent() {
        let format = NumericFormat {
            kind: NumericFormatKind::Percent,
            decimal: Some(DigitSpec::Fixed(1)),
            ..NumericFormat::default()
        };
        assert_eq!(numeric_pattern(&format), "0.0%");
    }

    #[test]
    fn test_currency_prefix_and_suffix() {
        let prefix = NumericFormat {
            kind: NumericFormatKind::Currency,
            decimal: Some(DigitSpec::Fixed(2)),
            commas: true,
            ..NumericFormat::default()
        };
        assert_eq!(numeric_pattern(&prefix), "\"$\"#,##0.00");

        let suffix = NumericFormat {
            symbol: Some("€".to_string()),
            position: SymbolPosition::Suffix,
            ..prefix
        };
        assert_eq!(numeric_pattern(&suffix), "#,##0.00\"€\"");
    }

    #[test_case("US\"$", "\"US\"\\\"\"$\"#,##0" ; "inner quote")]
    #[test_case("\"", "\\\"#,##0" ; "only a quote")]
    #[test_case("''\"", "\"''\"\\\"#,##0" ; "trailing quote")]
    fn test_currency_symbol_keeps_quotes(symbol: &str, expected: &str) {
        let format = NumericFormat {
            kind: NumericFormatKind::Currency,
            commas: true,
            symbol: Some(symbol.to_string()),
            ..NumericFormat::default()
        };
        assert_eq!(numeric_pattern(&format), expected);
    }

    // ========================================================================
    // Temporal
    // ========================================================================

    #[test_case(TemporalUnit::Year, UnitLength::Long, "yyyy")]
    #[test_case(TemporalUnit::MonthName, UnitLength::Short, "mmm")]
    #[test_case(TemporalUnit::Weekday, UnitLength::Long, "dddd")]
    #[test_case(TemporalUnit::Meridiem, UnitLength::Long, "AM/PM")]
    #[test_case(TemporalUnit::Meridiem, UnitLength::Short, "A/P")]
    fn test_temporal_token(unit: TemporalUnit, length: UnitLength, expected: &str) {
        assert_eq!(temporal_token(unit, length), expected);
    }

    #[test]
    fn test_temporal_pattern_concatenates() {
        let format = TemporalFormat(vec![
            TemporalPart::unit(TemporalUnit::Weekday, UnitLength::Short),
            TemporalPart::Literal(", ".to_string()),
            TemporalPart::unit(TemporalUnit::MonthName, UnitLength::Long),
            TemporalPart::Literal(" ".to_string()),
            TemporalPart::unit(TemporalUnit::Day, UnitLength::Short),
        ]);
        assert_eq!(temporal_pattern(&format), "ddd, mmmm d");
    }

    #[test]
    fn test_temporal_literal_letters_are_escaped() {
        let format = TemporalFormat(vec![
            TemporalPart::unit(TemporalUnit::Hour, UnitLength::Short),
            TemporalPart::Literal("h".to_string()),
        ]);
        assert_eq!(temporal_pattern(&format), "h\\h");
    }

    // ========================================================================
    // Standard library
    // ========================================================================

    #[test_case("integer", "0")]
    #[test_case("decimal", "0.00")]
    #[test_case("thousands", "#,##0")]
    #[test_case("percent", "0%")]
    #[test_case("currency", "\"$\"#,##0.00")]
    fn test_standard_numeric(name: &str, expected: &str) {
        assert_eq!(numeric_pattern(&standard_numeric_format(name).unwrap()), expected);
    }

    #[test_case("date", "yyyy-mm-dd")]
    #[test_case("time", "hh:mm:ss")]
    #[test_case("datetime", "yyyy-mm-dd hh:mm")]
    #[test_case("iso", "yyyy-mm-dd\\Thh:mm:ss")]
    fn test_standard_temporal(name: &str, expected: &str) {
        assert_eq!(temporal_pattern(&standard_temporal_format(name).unwrap()), expected);
    }

    #[test]
    fn test_unknown_standard_names() {
        assert!(standard_numeric_format("scientific").is_none());
        assert!(standard_temporal_format("epoch").is_none());
    }
}
