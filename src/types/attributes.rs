use std::collections::HashMap;

/// Request attribute map handed to every evaluation call.
///
/// Attributes are plain string name/value pairs (device id, account id, MAC,
/// protocol, geography, ...). Absent keys mean "no value" and never fail an
/// evaluation; predicates over a missing attribute simply do not match.
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    data: HashMap<String, String>,
}

impl Attributes {
    /// Create an empty attribute map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute, consuming and returning `self` for chaining.
    #[must_use]
    pub fn set(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert(name, value.into());
        self
    }

    /// Insert an attribute (mutable reference version).
    pub fn insert(&mut self, name: &str, value: String) {
        self.data.insert(name.to_owned(), value);
    }

    /// Look up an attribute value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.data.get(name).map(String::as_str)
    }

    /// Look up an attribute, treating whitespace-only values as absent.
    #[must_use]
    pub fn non_blank(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| !v.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let attrs = Attributes::new().set("accountId", "acct-1");
        assert_eq!(attrs.get("accountId"), Some("acct-1"));
        assert_eq!(attrs.get("mac"), None);
    }

    #[test]
    fn insert_mutable_ref() {
        let mut attrs = Attributes::new();
        attrs.insert("mac", "aa:bb:cc:dd:ee:ff".to_owned());
        assert_eq!(attrs.get("mac"), Some("aa:bb:cc:dd:ee:ff"));
    }

    #[test]
    fn overwrite_value() {
        let attrs = Attributes::new().set("a", "1").set("a", "2");
        assert_eq!(attrs.get("a"), Some("2"));
    }

    #[test]
    fn non_blank_filters_whitespace() {
        let attrs = Attributes::new().set("empty", "   ").set("id", "x");
        assert_eq!(attrs.non_blank("empty"), None);
        assert_eq!(attrs.non_blank("missing"), None);
        assert_eq!(attrs.non_blank("id"), Some("x"));
    }
}
