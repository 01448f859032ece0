use std::collections::BTreeMap;
use std::fmt;

/// A single element of a hierarchical policy document: a kind, a set of named
/// string attributes, and ordered children.
///
/// `Node` trees are the engine's input boundary. They are produced by the text
/// grammar ([`parse`](crate::parse())) or built programmatically by a
/// collaborator, then turned into an evaluable [`Document`](crate::Document)
/// by [`compile`](crate::compile()).
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    kind: String,
    attrs: BTreeMap<String, String>,
    children: Vec<Node>,
}

impl Node {
    /// Create an empty node of the given kind.
    #[must_use]
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_owned(),
            attrs: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Set an attribute. Later values overwrite earlier ones.
    #[must_use]
    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs.insert(name.to_owned(), value.into());
        self
    }

    /// Append a child node.
    #[must_use]
    pub fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Look up an attribute by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Iterate over children of a given kind, preserving document order.
    pub fn children_of(&self, kind: &str) -> impl Iterator<Item = &Node> {
        let kind = kind.to_owned();
        self.children.iter().filter(move |c| c.kind == kind)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        for (name, value) in &self.attrs {
            write!(f, " {name}={value:?}")?;
        }
        if !self.children.is_empty() {
            write!(f, " {{ {} children }}", self.children.len())?;
        }
        Ok(())
    }
}
