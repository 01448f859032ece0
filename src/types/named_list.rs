use std::collections::{HashMap, HashSet};

/// Read-only lookup of externally managed value lists, consumed by
/// membership predicates.
///
/// The engine never caches or refreshes lists itself; whoever owns the
/// backing data decides when it changes.
pub trait NamedListSource {
    /// Resolve a list by name. `None` means the list is unknown, which
    /// membership predicates treat as a non-match.
    fn resolve(&self, name: &str) -> Option<&HashSet<String>>;
}

/// A [`NamedListSource`] with no lists. Used when a document references no
/// named lists, or in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyLists;

impl NamedListSource for EmptyLists {
    fn resolve(&self, _name: &str) -> Option<&HashSet<String>> {
        None
    }
}

/// An in-memory [`NamedListSource`] built up front.
#[derive(Debug, Clone, Default)]
pub struct StaticLists {
    lists: HashMap<String, HashSet<String>>,
}

impl StaticLists {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a list under the given name, consuming and returning `self`.
    #[must_use]
    pub fn with_list<I, S>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lists.insert(
            name.to_owned(),
            values.into_iter().map(Into::into).collect(),
        );
        self
    }
}

impl NamedListSource for StaticLists {
    fn resolve(&self, name: &str) -> Option<&HashSet<String>> {
        self.lists.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_lists_resolve_nothing() {
        assert_eq!(EmptyLists.resolve("whitelist"), None);
    }

    #[test]
    fn static_lists_resolve() {
        let lists = StaticLists::new().with_list("whitelist", ["a", "b"]);
        let set = lists.resolve("whitelist").unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("a"));
        assert_eq!(lists.resolve("other"), None);
    }

    #[test]
    fn with_list_replaces_existing() {
        let lists = StaticLists::new()
            .with_list("l", ["old"])
            .with_list("l", ["new"]);
        assert!(lists.resolve("l").unwrap().contains("new"));
        assert!(!lists.resolve("l").unwrap().contains("old"));
    }
}
