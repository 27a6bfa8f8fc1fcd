use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::Ref;

/// An RGB color, always normalized to upper-case `#RRGGBB`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Color(String);

impl Color {
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self(format!("#{r:02X}{g:02X}{b:02X}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::color::normalize_hex(s)
            .map(Self)
            .ok_or_else(|| format!("invalid color '{s}', expected #RGB or #RRGGBB"))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Declared cell style. Any field left unset is inherited.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Style {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fore: Option<Ref<Color>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back: Option<Ref<Color>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    /// Border under a header row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beneath: Option<Border>,
    /// Border between adjacent header cells.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub between: Option<Border>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Border {
    #[serde(rename = "type")]
    pub style: BorderStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Ref<Color>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BorderStyle {
    #[default]
    None,
    Dotted,
    Dashed,
    Solid,
    Medium,
    Thick,
    Double,
}

/// Declared theme: a bundle of tab, group-header, column-header and data styles.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Theme {
    /// Themes folded in before this theme's own fields, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inherits: Vec<Ref<Theme>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab: Option<Ref<Color>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<Ref<Style>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Ref<Style>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Ref<Style>>,
}
