use std::fmt;

use super::attributes::Attributes;
use super::consequence::{Consequence, UrlParams};
use super::decision::{Decision, UrlDecision};
use super::distribution::DistributionPolicy;
use super::named_list::{EmptyLists, NamedListSource};
use super::rule::ConditionalRule;

/// A compiled select-server policy: conditional rules in resolved priority
/// order plus an optional percentage distribution fallback.
///
/// Immutable once built and safe for unlimited concurrent evaluation;
/// designed to live behind `Arc` and be replaced wholesale when the policy
/// changes upstream.
#[derive(Debug)]
pub struct RuleDocument {
    rules: Vec<ConditionalRule>,
    distribution: Option<DistributionPolicy>,
}

impl RuleDocument {
    /// Build a document from rules in authored order. Rules are sorted once,
    /// stably, by composite priority: ties keep authored order, and the
    /// resulting order is exactly the per-request evaluation order.
    #[must_use]
    pub fn new(mut rules: Vec<ConditionalRule>, distribution: Option<DistributionPolicy>) -> Self {
        rules.sort_by_key(ConditionalRule::priority);
        Self {
            rules,
            distribution,
        }
    }

    /// Rules in resolved evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[ConditionalRule] {
        &self.rules
    }

    #[must_use]
    pub fn distribution(&self) -> Option<&DistributionPolicy> {
        self.distribution.as_ref()
    }

    /// Evaluate a request. Documents whose membership predicates reference
    /// named lists should use [`decide_with_lists`](Self::decide_with_lists).
    pub fn decide(&self, attrs: &Attributes) -> Decision<'_> {
        self.decide_with_lists(attrs, &EmptyLists)
    }

    /// Evaluate a request with access to externally supplied named lists.
    pub fn decide_with_lists(
        &self,
        attrs: &Attributes,
        lists: &dyn NamedListSource,
    ) -> Decision<'_> {
        crate::evaluate::decide(self, attrs, lists)
    }

    /// The distribution's default consequence, bypassing all conditional
    /// rules. For callers needing a guaranteed fallback without a full
    /// evaluation.
    #[must_use]
    pub fn default_consequence(&self) -> Option<&Consequence> {
        self.distribution
            .as_ref()
            .map(|policy| policy.default_group().consequence())
    }
}

impl fmt::Display for RuleDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RuleDocument({} rules, {})",
            self.rules.len(),
            if self.distribution.is_some() {
                "distribution"
            } else {
                "no distribution"
            }
        )
    }
}

/// A compiled URL-parameter policy: rules in resolved priority order plus the
/// mandatory default section that fills whatever matched rules leave empty.
#[derive(Debug)]
pub struct UrlRuleDocument {
    rules: Vec<ConditionalRule>,
    default_params: UrlParams,
}

impl UrlRuleDocument {
    /// Build a document from rules in authored order; same stable priority
    /// sort as [`RuleDocument::new`].
    #[must_use]
    pub fn new(mut rules: Vec<ConditionalRule>, default_params: UrlParams) -> Self {
        rules.sort_by_key(ConditionalRule::priority);
        Self {
            rules,
            default_params,
        }
    }

    #[must_use]
    pub fn rules(&self) -> &[ConditionalRule] {
        &self.rules
    }

    #[must_use]
    pub fn default_params(&self) -> &UrlParams {
        &self.default_params
    }

    /// Merge every matched rule's fields (first writer wins per field) and
    /// fill the remainder from the default section.
    pub fn resolve(&self, attrs: &Attributes) -> UrlDecision {
        self.resolve_with_lists(attrs, &EmptyLists)
    }

    pub fn resolve_with_lists(
        &self,
        attrs: &Attributes,
        lists: &dyn NamedListSource,
    ) -> UrlDecision {
        crate::evaluate::resolve_url(self, attrs, lists)
    }
}

impl fmt::Display for UrlRuleDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UrlRuleDocument({} rules)", self.rules.len())
    }
}

/// A compiled policy document of either grammar family.
#[derive(Debug)]
pub enum Document {
    SelectServer(RuleDocument),
    UrlRules(UrlRuleDocument),
}

impl Document {
    /// Parse and compile a policy document from its text form.
    ///
    /// # Errors
    ///
    /// Returns [`SteerError`](crate::SteerError) on syntax or document
    /// structure failure.
    pub fn from_text(input: &str) -> Result<Self, crate::SteerError> {
        let root = crate::parse::parse(input)?;
        Ok(crate::compile::compile(&root)?)
    }

    /// Read a policy document from a file and compile it.
    ///
    /// # Errors
    ///
    /// Returns [`SteerError`](crate::SteerError) on I/O, syntax, or document
    /// structure failure.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::SteerError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_text(&input)
    }

    #[must_use]
    pub fn as_select_server(&self) -> Option<&RuleDocument> {
        match self {
            Document::SelectServer(doc) => Some(doc),
            Document::UrlRules(_) => None,
        }
    }

    #[must_use]
    pub fn as_url_rules(&self) -> Option<&UrlRuleDocument> {
        match self {
            Document::UrlRules(doc) => Some(doc),
            Document::SelectServer(_) => None,
        }
    }

    /// Consume the document, panicking if it is not a select-server policy.
    /// For callers that control the document source.
    #[must_use]
    pub fn into_select_server(self) -> RuleDocument {
        match self {
            Document::SelectServer(doc) => doc,
            Document::UrlRules(_) => panic!("expected a selectServer document"),
        }
    }

    /// Consume the document, panicking if it is not a URL-rules policy.
    #[must_use]
    pub fn into_url_rules(self) -> UrlRuleDocument {
        match self {
            Document::UrlRules(doc) => doc,
            Document::SelectServer(_) => panic!("expected a urlRules document"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::consequence::Server;
    use crate::types::rule::RuleBranch;
    use crate::BoolExpr;

    fn rule(id: &str, condition: BoolExpr, path: &str) -> ConditionalRule {
        ConditionalRule::new(
            Some(id.to_owned()),
            condition,
            RuleBranch::terminal(Consequence::Server(
                Server::new(path, "http://host").with_path(path),
            )),
            None,
        )
    }

    #[test]
    fn rules_sort_by_priority_at_build() {
        let matches_rule = rule(
            "pattern",
            BoolExpr::Matches {
                param: "model".to_owned(),
                pattern: crate::Pattern::compile("x.*").unwrap(),
                negate: false,
            },
            "P_PATTERN",
        );
        let equals_rule = rule("exact", BoolExpr::equals("model", "x1"), "P_EXACT");

        let doc = RuleDocument::new(vec![matches_rule, equals_rule], None);
        let ids: Vec<_> = doc.rules().iter().filter_map(ConditionalRule::id).collect();
        assert_eq!(ids, vec!["exact", "pattern"]);
    }

    #[test]
    fn equal_priorities_keep_authored_order() {
        let first = rule("first", BoolExpr::equals("a", "1"), "P1");
        let second = rule("second", BoolExpr::equals("b", "2"), "P2");

        let doc = RuleDocument::new(vec![first, second], None);
        let ids: Vec<_> = doc.rules().iter().filter_map(ConditionalRule::id).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    #[test]
    fn default_consequence_without_distribution() {
        let doc = RuleDocument::new(vec![], None);
        assert!(doc.default_consequence().is_none());
    }

    #[test]
    fn display_summarizes() {
        let doc = RuleDocument::new(vec![rule("r", BoolExpr::equals("a", "1"), "P")], None);
        assert_eq!(doc.to_string(), "RuleDocument(1 rules, no distribution)");
    }
}
