//! Theme cascade.
//!
//! A node's effective theme is folded from, in order: its ancestors' themes,
//! the themes its own theme `inherits`, and finally its own explicit fields.
//! Each of the four buckets (tab, group, header, data) merges per field, and
//! a field set later always wins over one set earlier. Unset fields never
//! erase anything.
//!
//! Cycle detection works on theme identity: registry resolution hands out
//! the same `Rc<Theme>` for the same name, so a theme that reaches itself
//! through `inherits` is found in the chain with [`Rc::ptr_eq`].

use std::rc::Rc;

use crate::issue::{Issue, Path, Resolved};
use crate::registry::Scope;
use crate::types::{Border, Color, Ref, SheetBorder, SheetStyle, SheetTheme, Style, Theme};

impl SheetStyle {
    /// Overlay `other` onto `self`; fields `other` defines win.
    pub fn merge(&mut self, other: &Self) {
        if other.fore.is_some() {
            self.fore.clone_from(&other.fore);
        }
        if other.back.is_some() {
            self.back.clone_from(&other.back);
        }
        if other.bold.is_some() {
            self.bold = other.bold;
        }
        if other.italic.is_some() {
            self.italic = other.italic;
        }
        if other.beneath.is_some() {
            self.beneath.clone_from(&other.beneath);
        }
        if other.between.is_some() {
            self.between.clone_from(&other.between);
        }
    }

    #[must_use]
    pub fn merged(mut self, other: &Self) -> Self {
        self.merge(other);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl SheetTheme {
    /// Overlay `other` onto `self`, bucket by bucket and field by field.
    pub fn merge(&mut self, other: &Self) {
        if other.tab.is_some() {
            self.tab.clone_from(&other.tab);
        }
        self.group.merge(&other.group);
        self.header.merge(&other.header);
        self.data.merge(&other.data);
    }

    #[must_use]
    pub fn merged(mut self, other: &Self) -> Self {
        self.merge(other);
        self
    }
}

/// Resolve a theme against its ancestors.
///
/// `parents` are the ancestor themes (book, page, group) folded first.
/// `chain` holds the themes currently being expanded through `inherits`;
/// callers start with an empty chain.
pub fn resolve_theme(
    theme: &Ref<Theme>,
    parents: &[&Ref<Theme>],
    scope: &Scope,
    chain: &[Rc<Theme>],
    path: &Path,
) -> Resolved<SheetTheme> {
    let mut issues = Vec::new();

    let resolved = match scope.themes.resolve_ref(theme, path) {
        Ok(resolved) => resolved,
        Err(issue) => return Resolved::with_issues(SheetTheme::default(), vec![issue]),
    };

    if chain.iter().any(|seen| Rc::ptr_eq(seen, &resolved)) {
        let name = theme
            .as_reference()
            .map_or_else(|| "inline theme".to_string(), |r| format!("theme '{r}'"));
        let issue = Issue::processing(
            format!("circular theme inheritance: {name} inherits from itself"),
            path,
        )
        .with_data(serde_json::json!({ "depth": chain.len() }));
        return Resolved::with_issues(SheetTheme::default(), vec![issue]);
    }

    let mut sheet = SheetTheme::default();

    for parent in parents {
        let parent = resolve_theme(parent, &[], scope, &[], path).into_value(&mut issues);
        sheet.merge(&parent);
    }

    let mut inner_chain = chain.to_vec();
    inner_chain.push(Rc::clone(&resolved));
    let inherits_path = path.key("inherits");
    for (i, inherited) in resolved.inherits.iter().enumerate() {
        let inherited =
            resolve_theme(inherited, &[], scope, &inner_chain, &inherits_path.index(i))
                .into_value(&mut issues);
        sheet.merge(&inherited);
    }

    let own = resolve_own_fields(&resolved, scope, path).into_value(&mut issues);
    sheet.merge(&own);

    Resolved::with_issues(sheet, issues)
}

/// The theme's explicit `tab`/`group`/`header`/`data` fields only.
fn resolve_own_fields(theme: &Theme, scope: &Scope, path: &Path) -> Resolved<SheetTheme> {
    let mut issues = Vec::new();
    let mut sheet = SheetTheme::default();

    if let Some(tab) = &theme.tab {
        sheet.tab = resolve_color(tab, scope, &path.key("tab")).into_value(&mut issues);
    }
    let buckets = [
        (&theme.group, &mut sheet.group, "group"),
        (&theme.header, &mut sheet.header, "header"),
        (&theme.data, &mut sheet.data, "data"),
    ];
    for (style, bucket, key) in buckets {
        if let Some(style) = style {
            *bucket = resolve_style(style, scope, &path.key(key)).into_value(&mut issues);
        }
    }

    Resolved::with_issues(sheet, issues)
}

/// Resolve a style reference and every color inside it.
pub fn resolve_style(style: &Ref<Style>, scope: &Scope, path: &Path) -> Resolved<SheetStyle> {
    let style = match scope.styles.resolve_ref(style, path) {
        Ok(style) => style,
        Err(issue) => return Resolved::with_issues(SheetStyle::default(), vec![issue]),
    };

    let mut issues = Vec::new();
    let mut color = |value: &Option<Ref<Color>>, key: &str| {
        value.as_ref().and_then(|value| {
            resolve_color(value, scope, &path.key(key)).into_value(&mut issues)
        })
    };
    let fore = color(&style.fore, "fore");
    let back = color(&style.back, "back");

    let beneath = style
        .beneath
        .as_ref()
        .map(|border| resolve_border(border, scope, &path.key("beneath")).into_value(&mut issues));
    let between = style
        .between
        .as_ref()
        .map(|border| resolve_border(border, scope, &path.key("between")).into_value(&mut issues));

    Resolved::with_issues(
        SheetStyle {
            fore,
            back,
            bold: style.bold,
            italic: style.italic,
            beneath,
            between,
        },
        issues,
    )
}

fn resolve_border(border: &Border, scope: &Scope, path: &Path) -> Resolved<SheetBorder> {
    let mut issues = Vec::new();
    let color = border
        .color
        .as_ref()
        .and_then(|color| resolve_color(color, scope, &path.key("color")).into_value(&mut issues));
    Resolved::with_issues(
        SheetBorder {
            style: border.style,
            color,
        },
        issues,
    )
}

/// An unresolvable color becomes `None` plus an issue.
pub fn resolve_color(color: &Ref<Color>, scope: &Scope, path: &Path) -> Resolved<Option<Color>> {
    match scope.colors.resolve_ref(color, path) {
        Ok(color) => Resolved::new(Some(Color::clone(&color))),
        Err(issue) => Resolved::with_issues(None, vec![issue]),
    }
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
    use crate::compile::CompileOptions;
    use crate::types::{BorderStyle, Definitions};
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn color(hex: &str) -> Color {
        hex.parse().unwrap()
    }

    fn data_theme(style: Style) -> Theme {
        Theme {
            data: Some(Ref::Value(style)),
            ..Theme::default()
        }
    }

    fn scope_with_themes(themes: Vec<(&str, Theme)>) -> Scope {
        let definitions = Definitions {
            themes: themes
                .into_iter()
                .map(|(name, theme)| (name.to_string(), Ref::Value(theme)))
                .collect(),
            ..Definitions::default()
        };
        Scope::root(Some(&definitions), &CompileOptions::default())
    }

    // ========================================================================
    // Merge
    // ========================================================================

    #[test]
    fn test_merge_keeps_both_sides() {
        let parent = SheetStyle {
            fore: Some(color("#111111")),
            ..SheetStyle::default()
        };
        let child = SheetStyle {
            back: Some(color("#222222")),
            ..SheetStyle::default()
        };
        let merged = parent.merged(&child);
        assert_eq!(
            merged,
            SheetStyle {
                fore: Some(color("#111111")),
                back: Some(color("#222222")),
                ..SheetStyle::default()
            }
        );
    }

    #[test]
    fn test_merge_later_field_wins() {
        let parent = SheetStyle {
            bold: Some(true),
            fore: Some(color("#111111")),
            ..SheetStyle::default()
        };
        let child = SheetStyle {
            bold: Some(false),
            ..SheetStyle::default()
        };
        let merged = parent.merged(&child);
        assert_eq!(merged.bold, Some(false));
        assert_eq!(merged.fore, Some(color("#111111")));
    }

    // ========================================================================
    // Cascade
    // ========================================================================

    #[test]
    fn test_parent_theme_folds_under_child() {
        let scope = scope_with_themes(vec![]);
        let parent = Ref::Value(data_theme(Style {
            fore: Some(Ref::Value(color("#111111"))),
            ..Style::default()
        }));
        let child = Ref::Value(data_theme(Style {
            back: Some(Ref::Value(color("#222222"))),
            ..Style::default()
        }));

        let resolved = resolve_theme(&child, &[&parent], &scope, &[], &Path::root());
        assert!(resolved.is_clean());
        assert_eq!(resolved.value.data.fore, Some(color("#111111")));
        assert_eq!(resolved.value.data.back, Some(color("#222222")));
    }

    #[test]
    fn test_own_fields_win_over_inherits() {
        let scope = scope_with_themes(vec![(
            "base",
            Theme {
                tab: Some(Ref::Value(color("#000001"))),
                ..data_theme(Style {
                    bold: Some(true),
                    italic: Some(true),
                    ..Style::default()
                })
            },
        )]);
        let theme = Ref::Value(Theme {
            inherits: vec![Ref::reference("base")],
            tab: Some(Ref::Value(color("#000002"))),
            data: Some(Ref::Value(Style {
                italic: Some(false),
                ..Style::default()
            })),
            ..Theme::default()
        });

        let resolved = resolve_theme(&theme, &[], &scope, &[], &Path::root());
        assert!(resolved.is_clean());
        assert_eq!(resolved.value.tab, Some(color("#000002")));
        assert_eq!(resolved.value.data.bold, Some(true));
        assert_eq!(resolved.value.data.italic, Some(false));
    }

    #[test]
    fn test_inherits_fold_in_order() {
        let scope = scope_with_themes(vec![
            (
                "first",
                data_theme(Style {
                    fore: Some(Ref::Value(color("#AAAAAA"))),
                    ..Style::default()
                }),
            ),
            (
                "second",
                data_theme(Style {
                    fore: Some(Ref::Value(color("#BBBBBB"))),
                    ..Style::default()
                }),
            ),
        ]);
        let theme = Ref::Value(Theme {
            inherits: vec![Ref::reference("first"), Ref::reference("second")],
            ..Theme::default()
        });
        let resolved = resolve_theme(&theme, &[], &scope, &[], &Path::root());
        assert_eq!(resolved.value.data.fore, Some(color("#BBBBBB")));
    }

    #[test_case(1; "self inheritance")]
    #[test_case(2; "two themes")]
    #[test_case(3; "three themes")]
    #[test_case(4; "four themes")]
    #[test_case(5; "five themes")]
    #[test_case(8; "eight themes")]
    fn test_inheritance_cycle_is_reported(length: usize) {
        let themes = (0..length)
            .map(|i| {
                let next = format!("t{}", (i + 1) % length);
                (
                    format!("t{i}"),
                    Theme {
                        inherits: vec![Ref::reference(next)],
                        ..Theme::default()
                    },
                )
            })
            .collect::<Vec<_>>();
        let scope = scope_with_themes(
            themes
                .iter()
                .map(|(name, theme)| (name.as_str(), theme.clone()))
                .collect(),
        );

        let resolved = resolve_theme(&Ref::reference("t0"), &[], &scope, &[], &Path::root());
        assert_eq!(resolved.issues.len(), 1);
        assert!(resolved.issues[0].message.contains("circular theme inheritance"));
        assert_eq!(resolved.value, SheetTheme::default());
    }

    #[test]
    fn test_diamond_inheritance_is_not_a_cycle() {
        let scope = scope_with_themes(vec![
            ("root", data_theme(Style { bold: Some(true), ..Style::default() })),
            ("left", Theme { inherits: vec![Ref::reference("root")], ..Theme::default() }),
            ("right", Theme { inherits: vec![Ref::reference("root")], ..Theme::default() }),
        ]);
        let theme = Ref::Value(Theme {
            inherits: vec![Ref::reference("left"), Ref::reference("right")],
            ..Theme::default()
        });
        let resolved = resolve_theme(&theme, &[], &scope, &[], &Path::root());
        assert!(resolved.is_clean());
        assert_eq!(resolved.value.data.bold, Some(true));
    }

    #[test]
    fn test_bad_color_does_not_block_cascade() {
        let scope = scope_with_themes(vec![]);
        let theme = Ref::Value(Theme {
            tab: Some(Ref::reference("nowhere")),
            header: Some(Ref::Value(Style {
                bold: Some(true),
                back: Some(Ref::reference("accent2")),
                beneath: Some(Border {
                    style: BorderStyle::Thick,
                    color: Some(Ref::reference("missing")),
                }),
                ..Style::default()
            })),
            ..Theme::default()
        });

        let resolved = resolve_theme(&theme, &[], &scope, &[], &Path::root().key("theme"));
        assert_eq!(resolved.issues.len(), 2);
        assert_eq!(resolved.issues[0].path().unwrap().to_string(), "theme.tab");
        assert_eq!(
            resolved.issues[1].path().unwrap().to_string(),
            "theme.header.beneath.color"
        );
        assert_eq!(resolved.value.tab, None);
        assert_eq!(resolved.value.header.bold, Some(true));
        assert_eq!(resolved.value.header.back, Some(color("#ED7D31")));
        assert_eq!(
            resolved.value.header.beneath,
            Some(SheetBorder {
                style: BorderStyle::Thick,
                color: None
            })
        );
    }

    #[test]
    fn test_missing_theme_reference() {
        let scope = scope_with_themes(vec![]);
        let resolved = resolve_theme(&Ref::reference("ghost"), &[], &scope, &[], &Path::root());
        assert_eq!(resolved.issues.len(), 1);
        assert_eq!(resolved.issues[0].message, "unknown theme '@ghost'");
    }
}
