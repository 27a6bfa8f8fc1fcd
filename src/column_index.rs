//! Flat column positions for every `(page, group, column)` in a book.
//!
//! Built once before any selector or behavior is resolved: selectors name
//! columns symbolically, addresses need the column's position within its
//! page and whether the page spends an extra row on group titles.

use std::collections::{HashMap, HashSet};

use crate::issue::{Issue, Path, Resolved};
use crate::types::Book;

/// Where a column landed on its page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnIndex {
    pub page: String,
    /// The page has more than one group, so it carries a group-title row.
    pub grouped: bool,
    /// Zero-based position across all of the page's groups.
    pub index: u32,
}

impl ColumnIndex {
    /// Rows above the first data row: the column-title row, plus the
    /// group-title row on grouped pages.
    pub fn header_offset(&self) -> u32 {
        header_offset(self.grouped)
    }
}

pub fn header_offset(grouped: bool) -> u32 {
    if grouped {
        2
    } else {
        1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ColumnKey {
    page: String,
    group: String,
    column: String,
}

/// `(page, group, column) -> ColumnIndex` for a whole book.
#[derive(Debug, Clone, Default)]
pub struct ColumnIndexMap {
    columns: HashMap<ColumnKey, ColumnIndex>,
}

impl ColumnIndexMap {
    /// Single pass over the book. Duplicate keys are reported and the later
    /// column's index is kept.
    pub fn build(book: &Book) -> Resolved<Self> {
        let mut map = Self::default();
        let mut issues = Vec::new();

        for (page_idx, page) in book.pages.iter().enumerate() {
            let grouped = page.groups.len() > 1;
            let mut index: u32 = 0;

            for (group_idx, group) in page.groups.iter().enumerate() {
                for (column_idx, column) in group.columns.iter().enumerate() {
                    let key = ColumnKey {
                        page: page.name.clone(),
                        group: group.name.clone(),
                        column: column.name.clone(),
                    };
                    let entry = ColumnIndex {
                        page: page.name.clone(),
                        grouped,
                        index,
                    };
                    if map.columns.insert(key, entry).is_some() {
                        let path = Path::root()
                            .key("pages")
                            .index(page_idx)
                            .key("groups")
                            .index(group_idx)
                            .key("columns")
                            .index(column_idx)
                            .key("name");
                        issues.push(Issue::processing(
                            format!(
                                "duplicate column '{}' in group '{}' of page '{}'",
                                column.name, group.name, page.name
                            ),
                            &path,
                        ));
                    }
                    index += 1;
                }
            }
        }

        log::debug!("indexed {} columns", map.columns.len());
        Resolved::with_issues(map, issues)
    }

    /// Positions of the columns the compiled output keeps. Only the first
    /// page, group or column with a given name is placed, so later columns
    /// close up behind a dropped duplicate and a page's `grouped` flag
    /// counts only its kept groups. Duplicates are reported by [`Self::build`].
    pub fn first_seen(book: &Book) -> Self {
        let mut map = Self::default();
        let mut pages = HashSet::new();

        for page in book.pages.iter().filter(|page| pages.insert(page.name.as_str())) {
            let mut group_names = HashSet::new();
            let groups: Vec<_> = page
                .groups
                .iter()
                .filter(|group| group_names.insert(group.name.as_str()))
                .collect();
            let grouped = groups.len() > 1;
            let mut index: u32 = 0;

            for group in groups {
                let mut column_names = HashSet::new();
                for column in group
                    .columns
                    .iter()
                    .filter(|column| column_names.insert(column.name.as_str()))
                {
                    let key = ColumnKey {
                        page: page.name.clone(),
                        group: group.name.clone(),
                        column: column.name.clone(),
                    };
                    map.columns.insert(
                        key,
                        ColumnIndex {
                            page: page.name.clone(),
                            grouped,
                            index,
                        },
                    );
                    index += 1;
                }
            }
        }

        map
    }

    pub fn get(&self, page: &str, group: &str, column: &str) -> Option<&ColumnIndex> {
        self.columns.get(&ColumnKey {
            page: page.to_string(),
            group: group.to_string(),
            column: column.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
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
    use crate::types::{Column, DataType, Group, Page, Ref, TextType};

    fn column(name: &str) -> Column {
        Column {
            name: name.to_string(),
            theme: None,
            definitions: None,
            data_type: Ref::Value(DataType::Text(TextType::default())),
            value: None,
        }
    }

    fn group(name: &str, columns: &[&str]) -> Group {
        Group {
            name: name.to_string(),
            theme: None,
            definitions: None,
            columns: columns.iter().map(|c| column(c)).collect(),
        }
    }

    fn page(name: &str, groups: Vec<Group>) -> Page {
        Page {
            name: name.to_string(),
            rows: 10,
            theme: None,
            definitions: None,
            groups,
        }
    }

    fn book(pages: Vec<Page>) -> Book {
        Book {
            name: "Book".to_string(),
            theme: None,
            definitions: None,
            pages,
        }
    }

    #[test]
    fn test_indices_span_groups() {
        let book = book(vec![page(
            "P",
            vec![
                group("A", &["a1", "a2"]),
                group("B", &["b1", "b2", "b3"]),
                group("C", &["c1"]),
            ],
        )]);
        let resolved = ColumnIndexMap::build(&book);
        assert!(resolved.is_clean());
        let map = resolved.value;

        let indices: Vec<u32> = [
            ("A", "a1"),
            ("A", "a2"),
            ("B", "b1"),
            ("B", "b2"),
            ("B", "b3"),
            ("C", "c1"),
        ]
        .iter()
        .map(|(g, c)| map.get("P", g, c).unwrap().index)
        .collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
        assert!(map.get("P", "A", "a1").unwrap().grouped);
    }

    #[test]
    fn test_index_resets_per_page() {
        let book = book(vec![
            page("One", vec![group("G", &["x", "y"])]),
            page("Two", vec![group("G", &["z"])]),
        ]);
        let map = ColumnIndexMap::build(&book).value;
        assert_eq!(map.get("Two", "G", "z").unwrap().index, 0);
        assert_eq!(map.get("One", "G", "y").unwrap().index, 1);
        assert!(!map.get("Two", "G", "z").unwrap().grouped);
    }

    #[test]
    fn test_header_offset() {
        assert_eq!(header_offset(false), 1);
        assert_eq!(header_offset(true), 2);
    }

    #[test]
    fn test_duplicate_column_keeps_last_index() {
        let book = book(vec![page("P", vec![group("G", &["x", "y", "x"])])]);
        let resolved = ColumnIndexMap::build(&book);
        assert_eq!(resolved.issues.len(), 1);
        assert!(resolved.issues[0].message.contains("duplicate column 'x'"));
        assert_eq!(
            resolved.issues[0].path().unwrap().to_string(),
            "pages[0].groups[0].columns[2].name"
        );
        assert_eq!(resolved.value.get("P", "G", "x").unwrap().index, 2);
    }

    #[test]
    fn test_first_seen_closes_up_behind_duplicate_column() {
        let book = book(vec![page("P", vec![group("G", &["x", "y", "x", "z"])])]);
        let map = ColumnIndexMap::first_seen(&book);
        assert_eq!(map.len(), 3);
        assert_eq!(map.get("P", "G", "x").unwrap().index, 0);
        assert_eq!(map.get("P", "G", "z").unwrap().index, 2);
    }

    #[test]
    fn test_first_seen_keeps_first_page_layout() {
        let book = book(vec![
            page("P", vec![group("G", &["a"])]),
            page("P", vec![group("H", &["b"]), group("G", &["a"])]),
        ]);
        let map = ColumnIndexMap::first_seen(&book);
        let a = map.get("P", "G", "a").unwrap();
        assert_eq!(a.index, 0);
        assert!(!a.grouped);
        assert!(map.get("P", "H", "b").is_none());
    }

    #[test]
    fn test_first_seen_ignores_dropped_groups_for_grouping() {
        let book = book(vec![page("P", vec![group("G", &["a"]), group("G", &["b"])])]);
        let map = ColumnIndexMap::first_seen(&book);
        assert!(!map.get("P", "G", "a").unwrap().grouped);
        assert!(map.get("P", "G", "b").is_none());
    }

    #[test]
    fn test_missing_column() {
        let book = book(vec![page("P", vec![group("G", &["x"])])]);
        let map = ColumnIndexMap::build(&book).value;
        assert!(map.get("P", "G", "nope").is_none());
        assert!(map.get("Q", "G", "x").is_none());
        assert_eq!(map.len(), 1);
    }
}
