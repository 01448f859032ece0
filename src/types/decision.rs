use std::fmt;

use super::consequence::{Consequence, UrlParams};

/// Result of evaluating a select-server document against one request.
///
/// `NoMatch` is observably distinct from a matched consequence: it means the
/// document had neither a firing rule nor a distribution, and the caller
/// decides what a client with no destination gets.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum Decision<'doc> {
    /// A conditional rule fired. `rule_id` is absent for synthetic rules.
    Matched {
        rule_id: Option<&'doc str>,
        consequence: &'doc Consequence,
    },
    /// No rule fired; the distribution selected a group.
    Distributed { consequence: &'doc Consequence },
    /// No rule fired and the document has no distribution.
    NoMatch,
}

impl<'doc> Decision<'doc> {
    /// The selected consequence, if any.
    #[must_use]
    pub fn consequence(&self) -> Option<&'doc Consequence> {
        match *self {
            Decision::Matched { consequence, .. } | Decision::Distributed { consequence } => {
                Some(consequence)
            }
            Decision::NoMatch => None,
        }
    }

    #[must_use]
    pub fn is_no_match(&self) -> bool {
        matches!(self, Decision::NoMatch)
    }
}

impl fmt::Display for Decision<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Matched {
                rule_id,
                consequence,
            } => write!(
                f,
                "rule '{}' matched: {consequence}",
                rule_id.unwrap_or("<anonymous>")
            ),
            Decision::Distributed { consequence } => {
                write!(f, "distribution used, no rule matched: {consequence}")
            }
            Decision::NoMatch => write!(f, "no match"),
        }
    }
}

/// Result of evaluating a URL-rules document: the merged parameters plus the
/// identifiers of the rules that contributed, in contribution order.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct UrlDecision {
    params: UrlParams,
    applied_rules: Vec<String>,
}

impl UrlDecision {
    pub(crate) fn new(params: UrlParams, applied_rules: Vec<String>) -> Self {
        Self {
            params,
            applied_rules,
        }
    }

    #[must_use]
    pub fn params(&self) -> &UrlParams {
        &self.params
    }

    /// Identifiers of contributing rules, highest priority first. Rules
    /// without an identifier contribute silently.
    #[must_use]
    pub fn applied_rules(&self) -> &[String] {
        &self.applied_rules
    }
}

impl fmt::Display for UrlDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "url params via [{}]", self.applied_rules.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::consequence::Server;

    #[test]
    fn decision_accessors() {
        let consequence = Consequence::Server(Server::new("s", "http://s"));
        let matched = Decision::Matched {
            rule_id: Some("r1"),
            consequence: &consequence,
        };
        assert_eq!(matched.consequence(), Some(&consequence));
        assert!(!matched.is_no_match());

        assert_eq!(Decision::NoMatch.consequence(), None);
        assert!(Decision::NoMatch.is_no_match());
    }

    #[test]
    fn decision_display() {
        let consequence = Consequence::Server(Server::new("s", "http://s"));
        let matched = Decision::Matched {
            rule_id: Some("r1"),
            consequence: &consequence,
        };
        assert_eq!(matched.to_string(), "rule 'r1' matched: server s");

        let distributed = Decision::Distributed {
            consequence: &consequence,
        };
        assert!(distributed.to_string().starts_with("distribution used"));
    }

    #[test]
    fn url_decision_accessors() {
        let decision = UrlDecision::new(
            UrlParams {
                protocol: Some("xres".to_owned()),
                ..UrlParams::default()
            },
            vec!["a".to_owned(), "b".to_owned()],
        );
        assert_eq!(decision.params().protocol.as_deref(), Some("xres"));
        assert_eq!(decision.applied_rules(), &["a", "b"]);
        assert_eq!(decision.to_string(), "url params via [a, b]");
    }
}
