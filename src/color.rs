//! Color utilities
//!
//! Normalizes hex colors and provides the standard palette used as the
//! fallback resolver for `@name` color references. Palette names accept a
//! tint suffix: `accent1+40` lightens by 40%, `accent1-25` darkens by 25%.

use crate::types::Color;

/// Office theme slots, in ECMA-376 order.
pub const THEME_COLORS: [(&str, &str); 12] = [
    ("background1", "#FFFFFF"),
    ("text1", "#000000"),
    ("background2", "#E7E6E6"),
    ("text2", "#44546A"),
    ("accent1", "#4472C4"),
    ("accent2", "#ED7D31"),
    ("accent3", "#A5A5A5"),
    ("accent4", "#FFC000"),
    ("accent5", "#5B9BD5"),
    ("accent6", "#70AD47"),
    ("hyperlink", "#0563C1"),
    ("followed", "#954F72"),
];

/// Basic named colors (drawn from the legacy indexed palette).
pub const NAMED_COLORS: [(&str, &str); 17] = [
    ("black", "#000000"),
    ("white", "#FFFFFF"),
    ("red", "#FF0000"),
    ("lime", "#00FF00"),
    ("blue", "#0000FF"),
    ("yellow", "#FFFF00"),
    ("magenta", "#FF00FF"),
    ("cyan", "#00FFFF"),
    ("maroon", "#800000"),
    ("green", "#008000"),
    ("navy", "#000080"),
    ("olive", "#808000"),
    ("purple", "#800080"),
    ("teal", "#008080"),
    ("silver", "#C0C0C0"),
    ("gray", "#808080"),
    ("orange", "#FF9900"),
];

/// Normalize `#RGB`, `#RRGGBB` or `#AARRGGBB` to upper-case `#RRGGBB`.
pub fn normalize_hex(text: &str) -> Option<String> {
    let hex = text.trim().strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let rgb = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect::<String>(),
        6 => hex.to_string(),
        // ARGB: drop the alpha channel
        8 => hex.get(2..)?.to_string(),
        _ => return None,
    };

    Some(format!("#{}", rgb.to_ascii_uppercase()))
}

/// Look up a standard palette color, applying an optional tint suffix.
pub fn standard_palette(name: &str) -> Option<Color> {
    let (base, tint) = split_tint(name)?;
    let hex = THEME_COLORS
        .iter()
        .chain(NAMED_COLORS.iter())
        .find(|(key, _)| key.eq_ignore_ascii_case(base))
        .map(|(_, hex)| *hex)?;

    match tint {
        Some(tint) => apply_tint(hex, tint).parse().ok(),
        None => hex.parse().ok(),
    }
}

/// Split `accent1+40` into (`accent1`, Some(0.40)).
fn split_tint(name: &str) -> Option<(&str, Option<f64>)> {
    let Some(pos) = name.rfind(['+', '-']) else {
        return Some((name, None));
    };

    let base = name.get(..pos)?;
    let sign = name.get(pos..=pos)?;
    let digits = name.get(pos + 1..)?;
    if base.is_empty() || digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let percent: u32 = digits.parse().ok()?;
    if percent > 100 {
        return None;
    }
    let amount = f64::from(percent) / 100.0;
    Some((base, Some(if sign == "-" { -amount } else { amount })))
}

/// Lighten (`tint > 0`) or darken (`tint < 0`) a `#RRGGBB` color.
///
/// Works on HSL lightness: a tint moves lightness toward 1 by that fraction
/// of the remaining distance, a shade scales it toward 0.
pub fn apply_tint(hex_color: &str, tint: f64) -> String {
    let rgb = u32::from_str_radix(hex_color.trim_start_matches('#'), 16).unwrap_or(0);
    let [_, r, g, b] = rgb.to_be_bytes();

    let mut hsl = Hsl::from_rgb(r, g, b);
    hsl.lightness = if tint < 0.0 {
        hsl.lightness * (1.0 + tint)
    } else {
        (1.0 - hsl.lightness).mul_add(tint, hsl.lightness)
    }
    .clamp(0.0, 1.0);

    let [r, g, b] = hsl.to_rgb();
    format!("#{r:02X}{g:02X}{b:02X}")
}

/// Hue, saturation and lightness, each in `0.0..=1.0`.
#[derive(Debug, Clone, Copy)]
struct Hsl {
    hue: f64,
    saturation: f64,
    lightness: f64,
}

impl Hsl {
    fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        let [r, g, b] = [r, g, b].map(|c| f64::from(c) / 255.0);
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let chroma = max - min;
        let lightness = (max + min) / 2.0;

        if chroma < f64::EPSILON {
            return Self {
                hue: 0.0,
                saturation: 0.0,
                lightness,
            };
        }

        let sector = if (max - r).abs() < f64::EPSILON {
            ((g - b) / chroma).rem_euclid(6.0)
        } else if (max - g).abs() < f64::EPSILON {
            (b - r) / chroma + 2.0
        } else {
            (r - g) / chroma + 4.0
        };

        Self {
            hue: sector / 6.0,
            saturation: chroma / (1.0 - 2.0f64.mul_add(lightness, -1.0).abs()),
            lightness,
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn to_rgb(self) -> [u8; 3] {
        let chroma =
            (1.0 - 2.0f64.mul_add(self.lightness, -1.0).abs()) * self.saturation;
        let sector = self.hue.rem_euclid(1.0) * 6.0;
        let second = chroma * (1.0 - (sector.rem_euclid(2.0) - 1.0).abs());

        let (r, g, b) = if sector < 1.0 {
            (chroma, second, 0.0)
        } else if sector < 2.0 {
            (second, chroma, 0.0)
        } else if sector < 3.0 {
            (0.0, chroma, second)
        } else if sector < 4.0 {
            (0.0, second, chroma)
        } else if sector < 5.0 {
            (second, 0.0, chroma)
        } else {
            (chroma, 0.0, second)
        };

        let base = self.lightness - chroma / 2.0;
        [r, g, b].map(|c| ((c + base) * 255.0).round().clamp(0.0, 255.0) as u8)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("#ff0000", Some("#FF0000"); "six digits")]
    #[test_case("#f00", Some("#FF0000"); "short form")]
    #[test_case("#80FF0000", Some("#FF0000"); "argb drops alpha")]
    #[test_case("  #00ff00 ", Some("#00FF00"); "trims whitespace")]
    #[test_case("ff0000", None; "missing hash")]
    #[test_case("#GG0000", None; "not hex")]
    #[test_case("#12345", None; "wrong length")]
    fn test_normalize_hex(input: &str, expected: Option<&str>) {
        assert_eq!(normalize_hex(input).as_deref(), expected);
    }

    #[test]
    fn test_standard_palette_theme_slots() {
        assert_eq!(standard_palette("accent1").unwrap().as_str(), "#4472C4");
        assert_eq!(standard_palette("Text1").unwrap().as_str(), "#000000");
        assert_eq!(standard_palette("navy").unwrap().as_str(), "#000080");
    }

    #[test]
    fn test_standard_palette_unknown() {
        assert!(standard_palette("chartreuse").is_none());
        assert!(standard_palette("accent1+x").is_none());
        assert!(standard_palette("accent1+150").is_none());
        assert!(standard_palette("+40").is_none());
    }

    #[test]
    fn test_standard_palette_tint_suffix() {
        // 40% lighter white stays white, 50% darker white is mid gray
        assert_eq!(standard_palette("white+40").unwrap().as_str(), "#FFFFFF");
        assert_eq!(standard_palette("white-50").unwrap().as_str(), "#808080");
        assert_eq!(standard_palette("black+100").unwrap().as_str(), "#FFFFFF");
    }

    #[test]
    fn test_apply_tint_lighten_and_darken() {
        // Pure red lightened by 50% is #FF8080
        assert_eq!(apply_tint("#FF0000", 0.5), "#FF8080");
        // Pure red darkened by 50% is #800000
        assert_eq!(apply_tint("#FF0000", -0.5), "#800000");
    }
}
