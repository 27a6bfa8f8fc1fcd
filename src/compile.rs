//! Compilation driver
//!
//! Walks book, pages, groups and columns once. The column index is built
//! first, then each level overlays its definitions on its parent's scope and
//! folds its theme onto its parent's effective theme. Problems are collected
//! as issues; the output book is always produced, best effort.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::behavior::{resolve_behavior, BehaviorContext};
use crate::column_index::ColumnIndexMap;
use crate::formula::{to_formula, FormulaContext};
use crate::issue::{Issue, Path};
use crate::registry::Scope;
use crate::selector::SelectorContext;
use crate::theme::resolve_theme;
use crate::types::{
    Book, Column, Group, OutputBook, OutputColumn, OutputGroup, OutputPage, Page, Ref, SheetStyle,
    SheetTheme, Theme,
};

#[cfg(target_arch = "wasm32")]
fn now_ms() -> f64 {
    js_sys::Date::now()
}

#[cfg(not(target_arch = "wasm32"))]
fn now_ms() -> f64 {
    use std::time::Instant;
    thread_local! {
        static START: Instant = Instant::now();
    }
    START.with(|s| s.elapsed().as_secs_f64() * 1000.0)
}

/// Knobs for one compilation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct CompileOptions {
    /// Resolve unknown `@color` names against the standard palette.
    pub standard_palette: bool,
    /// Resolve unknown `@format` names against the standard format library.
    pub standard_formats: bool,
    /// Collect [`CompileMetrics`].
    pub metrics: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            standard_palette: true,
            standard_formats: true,
            metrics: false,
        }
    }
}

/// Counts and timings for one compilation.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileMetrics {
    pub compile_ms: f64,
    pub index_ms: f64,
    pub pages: u64,
    pub groups: u64,
    pub columns: u64,
    pub formulas: u64,
    pub issues: u64,
}

/// Result of a compilation: the (possibly partial) book and every issue.
#[derive(Debug, Clone)]
#[must_use]
pub struct Compilation {
    pub book: OutputBook,
    pub issues: Vec<Issue>,
    pub metrics: Option<CompileMetrics>,
}

impl Compilation {
    pub fn is_success(&self) -> bool {
        self.issues.is_empty()
    }

    /// Succeeds only when no issue was reported.
    pub fn into_result(self) -> Result<OutputBook, Failure> {
        if self.issues.is_empty() {
            Ok(self.book)
        } else {
            Err(Failure {
                issues: self.issues,
                partial: self.book,
            })
        }
    }
}

/// A failed compilation, with the best-effort output kept for diagnostics.
#[derive(Debug, Clone, thiserror::Error)]
#[error("compilation failed with {} issue(s)", issues.len())]
pub struct Failure {
    pub issues: Vec<Issue>,
    pub partial: OutputBook,
}

/// Per-run state shared by every level of the walk.
struct Compiler<'a> {
    columns: &'a ColumnIndexMap,
    issues: Vec<Issue>,
    metrics: CompileMetrics,
}

/// Compile a validated book.
pub fn compile(book: &Book, options: &CompileOptions) -> Compilation {
    let start = now_ms();
    let mut issues = Vec::new();

    let index_start = now_ms();
    // Duplicates are reported against every column in the book, while
    // addresses follow the columns the output keeps
    issues.extend(ColumnIndexMap::build(book).issues);
    let columns = ColumnIndexMap::first_seen(book);
    let index_ms = now_ms() - index_start;

    let mut compiler = Compiler {
        columns: &columns,
        issues,
        metrics: CompileMetrics::default(),
    };

    let root = Path::root();
    let scope = Scope::root(book.definitions.as_ref(), options);
    let theme = compiler.level_theme(&SheetTheme::default(), book.theme.as_ref(), &scope, &root);

    let mut seen = HashSet::new();
    let mut pages = Vec::with_capacity(book.pages.len());
    for (i, page) in book.pages.iter().enumerate() {
        let path = root.key("pages").index(i);
        if !seen.insert(page.name.as_str()) {
            compiler.issues.push(Issue::processing(
                format!("duplicate page name '{}'", page.name),
                &path.key("name"),
            ));
            continue;
        }
        pages.push(compiler.page(page, &scope, &theme, &path));
    }

    let Compiler {
        issues,
        mut metrics,
        ..
    } = compiler;

    if issues.is_empty() {
        log::debug!("compiled '{}' ({} pages)", book.name, pages.len());
    } else {
        log::warn!(
            "compiled '{}' with {} issue(s)",
            book.name,
            issues.len()
        );
    }

    let metrics = options.metrics.then(|| {
        metrics.index_ms = index_ms;
        metrics.issues = issues.len() as u64;
        metrics.compile_ms = now_ms() - start;
        metrics
    });

    Compilation {
        book: OutputBook {
            title: book.name.clone(),
            pages,
        },
        issues,
        metrics,
    }
}

impl Compiler<'_> {
    /// Fold a level's own theme, if any, onto its parent's effective theme.
    /// Same result as resolving the theme against every ancestor theme,
    /// since the parent's effective theme is already that ancestor fold.
    fn level_theme(
        &mut self,
        parent: &SheetTheme,
        theme: Option<&Ref<Theme>>,
        scope: &Scope,
        path: &Path,
    ) -> SheetTheme {
        match theme {
            Some(theme) => {
                let own = resolve_theme(theme, &[], scope, &[], &path.key("theme"))
                    .into_value(&mut self.issues);
                parent.clone().merged(&own)
            }
            None => parent.clone(),
        }
    }

    fn page(&mut self, page: &Page, parent: &Scope, theme: &SheetTheme, path: &Path) -> OutputPage {
        self.metrics.pages += 1;
        let scope = parent.overlay(page.definitions.as_ref());
        let theme = self.level_theme(theme, page.theme.as_ref(), &scope, path);

        let mut seen = HashSet::new();
        let mut groups = Vec::with_capacity(page.groups.len());
        for (i, group) in page.groups.iter().enumerate() {
            let group_path = path.key("groups").index(i);
            if !seen.insert(group.name.as_str()) {
                self.issues.push(Issue::processing(
                    format!(
                        "duplicate group name '{}' in page '{}'",
                        group.name, page.name
                    ),
                    &group_path.key("name"),
                ));
                continue;
            }
            groups.push(self.group(page, group, &scope, &theme, &group_path));
        }

        log::debug!(
            "compiled page '{}' ({} groups, {} rows)",
            page.name,
            groups.len(),
            page.rows
        );

        OutputPage {
            title: page.name.clone(),
            tab_color: theme.tab,
            rows: page.rows,
            groups,
        }
    }

    fn group(
        &mut self,
        page: &Page,
        group: &Group,
        parent: &Scope,
        theme: &SheetTheme,
        path: &Path,
    ) -> OutputGroup {
        self.metrics.groups += 1;
        let scope = parent.overlay(group.definitions.as_ref());
        let theme = self.level_theme(theme, group.theme.as_ref(), &scope, path);

        // Duplicate column names are reported by the column index build
        let mut seen = HashSet::new();
        let columns = group
            .columns
            .iter()
            .enumerate()
            .filter(|&(_, column)| seen.insert(column.name.as_str()))
            .filter_map(|(i, column)| {
                let column_path = path.key("columns").index(i);
                self.column(page, group, column, &scope, &theme, &column_path)
            })
            .collect();

        OutputGroup {
            title: group.name.clone(),
            title_style: non_empty(theme.group),
            columns,
        }
    }

    fn column(
        &mut self,
        page: &Page,
        group: &Group,
        column: &Column,
        parent: &Scope,
        theme: &SheetTheme,
        path: &Path,
    ) -> Option<OutputColumn> {
        self.metrics.columns += 1;
        let scope = parent.overlay(column.definitions.as_ref());
        let theme = self.level_theme(theme, column.theme.as_ref(), &scope, path);

        let columns = self.columns;
        let Some(position) = columns.get(&page.name, &group.name, &column.name) else {
            self.issues.push(Issue::processing(
                format!("column '{}' is missing from the column index", column.name),
                path,
            ));
            return None;
        };

        // Rules and values are written for the first data cell
        let formula = FormulaContext {
            selectors: SelectorContext::new(columns, &page.name, &group.name, &column.name),
            col: position.index,
            row: position.header_offset(),
        };

        let ctx = BehaviorContext {
            formula,
            scope: &scope,
        };
        let behavior = resolve_behavior(&column.data_type, &ctx, &path.key("type"))
            .into_value(&mut self.issues)
            .filter(|behavior| !behavior.is_empty());

        let value_expression = column.value.as_ref().and_then(|value| {
            match to_formula(value, &formula, &path.key("value")) {
                Ok(text) => {
                    self.metrics.formulas += 1;
                    Some(format!("={text}"))
                }
                Err(issue) => {
                    self.issues.push(issue);
                    None
                }
            }
        });

        Some(OutputColumn {
            title: column.name.clone(),
            title_style: non_empty(theme.header),
            data_style: non_empty(theme.data),
            behavior,
            value_expression,
        })
    }
}

fn non_empty(style: SheetStyle) -> Option<SheetStyle> {
    (!style.is_empty()).then_some(style)
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
    use crate::types::{DataType, Definitions, Expression, Style, TextType};
    use pretty_assertions::assert_eq;

    fn text_column(name: &str) -> Column {
        Column {
            name: name.to_string(),
            theme: None,
            definitions: None,
            data_type: Ref::Value(DataType::Text(TextType::default())),
            value: None,
        }
    }

    fn single_page(groups: Vec<Group>) -> Book {
        Book {
            name: "Book".to_string(),
            theme: None,
            definitions: None,
            pages: vec![Page {
                name: "Sheet".to_string(),
                rows: 3,
                theme: None,
                definitions: None,
                groups,
            }],
        }
    }

    fn group(name: &str, columns: Vec<Column>) -> Group {
        Group {
            name: name.to_string(),
            theme: None,
            definitions: None,
            columns,
        }
    }

    #[test]
    fn test_clean_book_succeeds() {
        let book = single_page(vec![group("G", vec![text_column("a")])]);
        let compilation = compile(&book, &CompileOptions::default());
        assert!(compilation.is_success());
        assert!(compilation.metrics.is_none());

        let output = compilation.into_result().unwrap();
        assert_eq!(output.title, "Book");
        assert_eq!(output.pages[0].rows, 3);
        assert_eq!(output.pages[0].groups[0].columns[0].title, "a");
        assert_eq!(output.pages[0].groups[0].columns[0].behavior, None);
    }

    #[test]
    fn test_duplicate_group_is_skipped() {
        let book = single_page(vec![
            group("G", vec![text_column("a")]),
            group("G", vec![text_column("b")]),
        ]);
        let compilation = compile(&book, &CompileOptions::default());
        assert_eq!(compilation.issues.len(), 1);
        assert!(compilation.issues[0].message.contains("duplicate group name 'G'"));
        assert_eq!(compilation.book.pages[0].groups.len(), 1);
        assert_eq!(compilation.book.pages[0].groups[0].columns[0].title, "a");
    }

    #[test]
    fn test_value_expression_has_leading_equals() {
        let mut column = text_column("greeting");
        column.value = Some(Expression::Text("hi".to_string()));
        let book = single_page(vec![group("G", vec![column])]);
        let output = compile(&book, &CompileOptions::default()).into_result().unwrap();
        assert_eq!(
            output.pages[0].groups[0].columns[0].value_expression.as_deref(),
            Some("=\"hi\"")
        );
    }

    #[test]
    fn test_page_definitions_shadow_book() {
        let mut book = single_page(vec![group("G", vec![text_column("a")])]);
        let colors = |hex: &str| Definitions {
            colors: [("brand".to_string(), Ref::Value(hex.parse().unwrap()))]
                .into_iter()
                .collect(),
            ..Definitions::default()
        };
        book.definitions = Some(colors("#111111"));
        book.pages[0].definitions = Some(colors("#222222"));
        book.theme = Some(Ref::Value(Theme {
            data: Some(Ref::Value(Style {
                fore: Some(Ref::reference("brand")),
                ..Style::default()
            })),
            ..Theme::default()
        }));
        book.pages[0].theme = Some(Ref::Value(Theme {
            tab: Some(Ref::reference("brand")),
            ..Theme::default()
        }));

        let output = compile(&book, &CompileOptions::default()).into_result().unwrap();
        let page = &output.pages[0];
        assert_eq!(page.tab_color.as_ref().unwrap().as_str(), "#222222");
        // The book theme resolves against the book's own definitions
        let data = page.groups[0].columns[0].data_style.as_ref().unwrap();
        assert_eq!(data.fore.as_ref().unwrap().as_str(), "#111111");
    }

    #[test]
    fn test_metrics_are_collected_on_request() {
        let book = single_page(vec![
            group("A", vec![text_column("a"), text_column("b")]),
            group("B", vec![text_column("c")]),
        ]);
        let options = CompileOptions {
            metrics: true,
            ..CompileOptions::default()
        };
        let metrics = compile(&book, &options).metrics.unwrap();
        assert_eq!(metrics.pages, 1);
        assert_eq!(metrics.groups, 2);
        assert_eq!(metrics.columns, 3);
        assert_eq!(metrics.issues, 0);
    }
}
