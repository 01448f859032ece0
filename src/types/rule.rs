use super::consequence::Consequence;
use super::expr::BoolExpr;

/// What a [`ConditionalRule`] branch leads to: a terminal consequence, or a
/// nested rule whose own condition continues the evaluation (rule chaining).
#[derive(Debug, Clone, PartialEq)]
pub enum RuleBranch {
    Terminal(Consequence),
    Chained(Box<ConditionalRule>),
}

impl RuleBranch {
    #[must_use]
    pub fn terminal(consequence: Consequence) -> Self {
        RuleBranch::Terminal(consequence)
    }

    #[must_use]
    pub fn chained(rule: ConditionalRule) -> Self {
        RuleBranch::Chained(Box::new(rule))
    }
}

/// A condition-to-consequence mapping (`if`).
///
/// The composite priority is derived once at construction from the condition's
/// expression weight plus, when the primary branch chains into a nested rule,
/// that rule's own priority. Rules with lower priority evaluate first; equal
/// priorities keep document order.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalRule {
    id: Option<String>,
    condition: BoolExpr,
    primary: RuleBranch,
    alternative: Option<RuleBranch>,
    priority: u32,
}

impl ConditionalRule {
    #[must_use]
    pub fn new(
        id: Option<String>,
        condition: BoolExpr,
        primary: RuleBranch,
        alternative: Option<RuleBranch>,
    ) -> Self {
        let priority = crate::priority::rule_priority(&condition, &primary);
        Self {
            id,
            condition,
            primary,
            alternative,
            priority,
        }
    }

    /// Stable identifier, absent for synthetic rules.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    #[must_use]
    pub fn condition(&self) -> &BoolExpr {
        &self.condition
    }

    #[must_use]
    pub fn primary(&self) -> &RuleBranch {
        &self.primary
    }

    #[must_use]
    pub fn alternative(&self) -> Option<&RuleBranch> {
        self.alternative.as_ref()
    }

    /// Derived composite priority; lower evaluates first.
    #[must_use]
    pub fn priority(&self) -> u32 {
        self.priority
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::consequence::Server;
    use crate::BoolExpr;

    fn terminal(path: &str) -> RuleBranch {
        RuleBranch::terminal(Consequence::Server(
            Server::new("s", "http://s").with_path(path),
        ))
    }

    #[test]
    fn priority_derived_from_condition() {
        let rule = ConditionalRule::new(
            Some("r1".to_owned()),
            BoolExpr::equals("a", "x"),
            terminal("P1"),
            None,
        );
        assert_eq!(rule.priority(), 10);
        assert_eq!(rule.id(), Some("r1"));
    }

    #[test]
    fn chained_rule_adds_nested_priority() {
        let inner = ConditionalRule::new(None, BoolExpr::equals("b", "y"), terminal("P2"), None);
        let outer = ConditionalRule::new(
            Some("outer".to_owned()),
            BoolExpr::equals("a", "x"),
            RuleBranch::chained(inner),
            None,
        );
        // 10 for the outer condition + 10 for the nested rule.
        assert_eq!(outer.priority(), 20);
    }

    #[test]
    fn alternative_branch_does_not_affect_priority() {
        let with_alt = ConditionalRule::new(
            None,
            BoolExpr::equals("a", "x"),
            terminal("P1"),
            Some(terminal("P2")),
        );
        let without = ConditionalRule::new(None, BoolExpr::equals("a", "x"), terminal("P1"), None);
        assert_eq!(with_alt.priority(), without.priority());
    }
}
