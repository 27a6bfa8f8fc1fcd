//! Named definition registries.
//!
//! Every `@name` in a book resolves through a [`Registry`]: a map of names to
//! values or aliases, overlaid level by level (a page's definitions shadow the
//! book's and fall through to them on a miss), with fallback resolvers such
//! as the standard palette tried last. Alias chains are walked with a visited
//! list so a chain that loops back on itself is reported instead of followed.
//!
//! Resolved values are shared as `Rc<T>` and memoized, so resolving the same
//! name twice yields the same allocation. Theme cycle detection relies on
//! that identity.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use crate::compile::CompileOptions;
use crate::issue::{Issue, Path};
use crate::numfmt::{standard_numeric_format, standard_temporal_format};
use crate::types::{
    Color, DataType, Definitions, NumericFormat, Ref, Style, TemporalFormat, Theme,
};

/// A resolver consulted when no definition in any scope matches.
pub type Fallback<T> = fn(&str) -> Option<T>;

enum Entry<T> {
    Alias(String),
    Value(Rc<T>),
}

enum Lookup<'a, T> {
    Alias(&'a str),
    Value(Rc<T>),
}

/// Cache counters for one registry scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Resolutions answered from the memo without walking a chain.
    pub hits: u64,
    /// Resolutions that walked an alias chain.
    pub walks: u64,
}

/// Named definitions of one kind (colors, styles, ...).
pub struct Registry<T> {
    kind: &'static str,
    entries: HashMap<String, Entry<T>>,
    parent: Option<Rc<Registry<T>>>,
    fallbacks: Vec<Fallback<T>>,
    cache: RefCell<HashMap<String, Rc<T>>>,
    hits: Cell<u64>,
    walks: Cell<u64>,
}

impl<T> Registry<T> {
    /// Root scope with fallback resolvers tried in order on a true miss.
    pub fn root(
        kind: &'static str,
        definitions: Option<&BTreeMap<String, Ref<T>>>,
        fallbacks: Vec<Fallback<T>>,
    ) -> Self
    where
        T: Clone,
    {
        Self {
            kind,
            entries: collect_entries(definitions),
            parent: None,
            fallbacks,
            cache: RefCell::new(HashMap::new()),
            hits: Cell::new(0),
            walks: Cell::new(0),
        }
    }

    /// Child scope whose definitions shadow `parent`'s.
    ///
    /// Returns the parent itself when there is nothing to overlay, so
    /// memoized values stay shared.
    pub fn overlay(
        parent: &Rc<Self>,
        definitions: Option<&BTreeMap<String, Ref<T>>>,
    ) -> Rc<Self>
    where
        T: Clone,
    {
        if definitions.map_or(true, BTreeMap::is_empty) {
            return Rc::clone(parent);
        }
        Rc::new(Self {
            kind: parent.kind,
            entries: collect_entries(definitions),
            parent: Some(Rc::clone(parent)),
            fallbacks: Vec::new(),
            cache: RefCell::new(HashMap::new()),
            hits: Cell::new(0),
            walks: Cell::new(0),
        })
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Resolve `name` to a concrete value, following aliases.
    pub fn resolve(&self, name: &str, path: &Path) -> Result<Rc<T>, Issue> {
        if let Some(hit) = self.cache.borrow().get(name) {
            self.hits.set(self.hits.get() + 1);
            log::trace!("{} '@{name}' served from cache", self.kind);
            return Ok(Rc::clone(hit));
        }
        self.walks.set(self.walks.get() + 1);

        let mut chain: Vec<String> = Vec::new();
        let mut current = name.to_string();
        let value = loop {
            if chain.contains(&current) {
                chain.push(current);
                return Err(Issue::processing(
                    format!(
                        "circular {} reference: {}",
                        self.kind,
                        format_chain(&chain)
                    ),
                    path,
                )
                .with_data(serde_json::json!({ "chain": chain })));
            }
            chain.push(current.clone());

            match self.lookup(&current) {
                Some(Lookup::Value(value)) => break value,
                Some(Lookup::Alias(next)) => current = next.to_string(),
                None => {
                    let message = if chain.len() > 1 {
                        format!(
                            "unknown {} '@{current}' (via {})",
                            self.kind,
                            format_chain(&chain)
                        )
                    } else {
                        format!("unknown {} '@{current}'", self.kind)
                    };
                    return Err(Issue::processing(message, path));
                }
            }
        };

        self.cache
            .borrow_mut()
            .insert(name.to_string(), Rc::clone(&value));
        Ok(value)
    }

    /// Resolve an inline value or a reference.
    pub fn resolve_ref(&self, value: &Ref<T>, path: &Path) -> Result<Rc<T>, Issue>
    where
        T: Clone,
    {
        match value {
            Ref::Reference(reference) => self.resolve(reference.name(), path),
            Ref::Value(inline) => Ok(Rc::new(inline.clone())),
        }
    }

    pub fn is_cached(&self, name: &str) -> bool {
        self.cache.borrow().contains_key(name)
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            hits: self.hits.get(),
            walks: self.walks.get(),
        }
    }

    fn lookup(&self, name: &str) -> Option<Lookup<'_, T>> {
        if let Some(entry) = self.entries.get(name) {
            return Some(match entry {
                Entry::Alias(next) => Lookup::Alias(next),
                Entry::Value(value) => Lookup::Value(Rc::clone(value)),
            });
        }
        match &self.parent {
            Some(parent) => parent.lookup(name),
            None => self.fallback(name).map(Lookup::Value),
        }
    }

    fn fallback(&self, name: &str) -> Option<Rc<T>> {
        if let Some(hit) = self.cache.borrow().get(name) {
            return Some(Rc::clone(hit));
        }
        let value = self.fallbacks.iter().find_map(|resolve| resolve(name))?;
        log::trace!("{} '@{name}' resolved by fallback", self.kind);
        let value = Rc::new(value);
        self.cache
            .borrow_mut()
            .insert(name.to_string(), Rc::clone(&value));
        Some(value)
    }
}

fn collect_entries<T: Clone>(
    definitions: Option<&BTreeMap<String, Ref<T>>>,
) -> HashMap<String, Entry<T>> {
    definitions
        .into_iter()
        .flatten()
        .map(|(name, value)| {
            let entry = match value {
                Ref::Reference(reference) => Entry::Alias(reference.name().to_string()),
                Ref::Value(value) => Entry::Value(Rc::new(value.clone())),
            };
            (name.clone(), entry)
        })
        .collect()
}

fn format_chain(chain: &[String]) -> String {
    chain
        .iter()
        .map(|name| format!("@{name}"))
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// The six registries visible at one level of the book.
#[derive(Clone)]
pub struct Scope {
    pub colors: Rc<Registry<Color>>,
    pub styles: Rc<Registry<Style>>,
    pub themes: Rc<Registry<Theme>>,
    pub numerics: Rc<Registry<NumericFormat>>,
    pub temporals: Rc<Registry<TemporalFormat>>,
    pub types: Rc<Registry<DataType>>,
}

impl Scope {
    /// Book-level scope with the configured fallback resolvers installed.
    pub fn root(definitions: Option<&Definitions>, options: &CompileOptions) -> Self {
        let color_fallbacks: Vec<Fallback<Color>> = if options.standard_palette {
            vec![crate::color::standard_palette]
        } else {
            Vec::new()
        };
        let (numeric_fallbacks, temporal_fallbacks): (
            Vec<Fallback<NumericFormat>>,
            Vec<Fallback<TemporalFormat>>,
        ) = if options.standard_formats {
            (
                vec![standard_numeric_format],
                vec![standard_temporal_format],
            )
        } else {
            (Vec::new(), Vec::new())
        };

        Self {
            colors: Rc::new(Registry::root(
                "color",
                definitions.map(|d| &d.colors),
                color_fallbacks,
            )),
            styles: Rc::new(Registry::root(
                "style",
                definitions.map(|d| &d.styles),
                Vec::new(),
            )),
            themes: Rc::new(Registry::root(
                "theme",
                definitions.map(|d| &d.themes),
                Vec::new(),
            )),
            numerics: Rc::new(Registry::root(
                "numeric format",
                definitions.map(|d| &d.numerics),
                numeric_fallbacks,
            )),
            temporals: Rc::new(Registry::root(
                "temporal format",
                definitions.map(|d| &d.temporals),
                temporal_fallbacks,
            )),
            types: Rc::new(Registry::root(
                "type",
                definitions.map(|d| &d.types),
                Vec::new(),
            )),
        }
    }

    /// Scope one level down, shadowing this one with `definitions`.
    #[must_use]
    pub fn overlay(&self, definitions: Option<&Definitions>) -> Self {
        let Some(definitions) = definitions else {
            return self.clone();
        };
        Self {
            colors: Registry::overlay(&self.colors, Some(&definitions.colors)),
            styles: Registry::overlay(&self.styles, Some(&definitions.styles)),
            themes: Registry::overlay(&self.themes, Some(&definitions.themes)),
            numerics: Registry::overlay(&self.numerics, Some(&definitions.numerics)),
            temporals: Registry::overlay(&self.temporals, Some(&definitions.temporals)),
            types: Registry::overlay(&self.types, Some(&definitions.types)),
        }
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

    fn color(hex: &str) -> Ref<Color> {
        Ref::Value(hex.parse().unwrap())
    }

    fn colors(entries: &[(&str, Ref<Color>)]) -> BTreeMap<String, Ref<Color>> {
        entries
            .iter()
            .map(|(name, value)| ((*name).to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_resolve_concrete_value() {
        let defs = colors(&[("brand", color("#123456"))]);
        let registry = Registry::root("color", Some(&defs), Vec::new());
        let value = registry.resolve("brand", &Path::root()).unwrap();
        assert_eq!(value.as_str(), "#123456");
    }

    #[test]
    fn test_resolve_alias_chain() {
        let defs = colors(&[
            ("primary", Ref::reference("brand")),
            ("brand", Ref::reference("base")),
            ("base", color("#ABCDEF")),
        ]);
        let registry = Registry::root("color", Some(&defs), Vec::new());
        let value = registry.resolve("primary", &Path::root()).unwrap();
        assert_eq!(value.as_str(), "#ABCDEF");
    }

    #[test]
    fn test_second_resolution_is_cache_hit() {
        let defs = colors(&[("a", Ref::reference("b")), ("b", color("#010203"))]);
        let registry = Registry::root("color", Some(&defs), Vec::new());

        let first = registry.resolve("a", &Path::root()).unwrap();
        assert!(registry.is_cached("a"));
        let second = registry.resolve("a", &Path::root()).unwrap();

        assert_eq!(first, second);
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(registry.stats(), RegistryStats { hits: 1, walks: 1 });
    }

    #[test]
    fn test_circular_alias_reports_chain() {
        let defs = colors(&[
            ("a", Ref::reference("b")),
            ("b", Ref::reference("c")),
            ("c", Ref::reference("a")),
        ]);
        let registry = Registry::root("color", Some(&defs), Vec::new());
        let issue = registry.resolve("a", &Path::root()).unwrap_err();
        assert!(issue.message.contains("circular color reference"));
        assert!(issue.message.contains("@a -> @b -> @c -> @a"));
        assert_eq!(
            issue.data.unwrap()["chain"],
            serde_json::json!(["a", "b", "c", "a"])
        );
    }

    #[test]
    fn test_self_alias_is_circular() {
        let defs = colors(&[("loop", Ref::reference("loop"))]);
        let registry = Registry::root("color", Some(&defs), Vec::new());
        let issue = registry.resolve("loop", &Path::root()).unwrap_err();
        assert!(issue.message.contains("@loop -> @loop"));
    }

    #[test]
    fn test_missing_reference() {
        let registry: Registry<Color> = Registry::root("color", None, Vec::new());
        let issue = registry
            .resolve("nope", &Path::root().key("theme"))
            .unwrap_err();
        assert_eq!(issue.message, "unknown color '@nope'");
        assert_eq!(issue.path().unwrap().to_string(), "theme");
    }

    #[test]
    fn test_missing_alias_target_mentions_chain() {
        let defs = colors(&[("a", Ref::reference("gone"))]);
        let registry = Registry::root("color", Some(&defs), Vec::new());
        let issue = registry.resolve("a", &Path::root()).unwrap_err();
        assert_eq!(issue.message, "unknown color '@gone' (via @a -> @gone)");
    }

    #[test]
    fn test_fallback_is_memoized() {
        let registry: Registry<Color> =
            Registry::root("color", None, vec![crate::color::standard_palette]);
        let first = registry.resolve("accent1", &Path::root()).unwrap();
        let second = registry.resolve("accent1", &Path::root()).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(first.as_str(), "#4472C4");
    }

    #[test]
    fn test_local_definitions_shadow_fallback() {
        let defs = colors(&[("accent1", color("#000001"))]);
        let registry = Registry::root("color", Some(&defs), vec![crate::color::standard_palette]);
        let value = registry.resolve("accent1", &Path::root()).unwrap();
        assert_eq!(value.as_str(), "#000001");
    }

    #[test]
    fn test_overlay_shadows_and_falls_through() {
        let parent_defs = colors(&[("a", color("#111111")), ("b", color("#222222"))]);
        let child_defs = colors(&[("a", color("#333333")), ("c", Ref::reference("b"))]);
        let parent = Rc::new(Registry::root("color", Some(&parent_defs), Vec::new()));
        let child = Registry::overlay(&parent, Some(&child_defs));

        assert_eq!(child.resolve("a", &Path::root()).unwrap().as_str(), "#333333");
        assert_eq!(child.resolve("b", &Path::root()).unwrap().as_str(), "#222222");
        assert_eq!(child.resolve("c", &Path::root()).unwrap().as_str(), "#222222");
        assert_eq!(parent.resolve("a", &Path::root()).unwrap().as_str(), "#111111");
        assert!(parent.resolve("c", &Path::root()).is_err());
    }

    #[test]
    fn test_empty_overlay_reuses_parent() {
        let parent: Rc<Registry<Color>> = Rc::new(Registry::root("color", None, Vec::new()));
        let child = Registry::overlay(&parent, Some(&BTreeMap::new()));
        assert!(Rc::ptr_eq(&parent, &child));
    }

    #[test]
    fn test_resolve_ref_inline_skips_registry() {
        let registry: Registry<Color> = Registry::root("color", None, Vec::new());
        let value = registry.resolve_ref(&color("#FFF"), &Path::root()).unwrap();
        assert_eq!(value.as_str(), "#FFFFFF");
        assert_eq!(registry.stats(), RegistryStats::default());
    }

    #[test]
    fn test_scope_respects_options() {
        let options = CompileOptions {
            standard_palette: false,
            ..CompileOptions::default()
        };
        let scope = Scope::root(None, &options);
        assert!(scope.colors.resolve("accent1", &Path::root()).is_err());
        assert!(scope.numerics.resolve("percent", &Path::root()).is_ok());
    }
}
