//! Priority resolution: fixed per-kind predicate weights and the derived
//! composite priority of a rule.
//!
//! Lower weight means more specific, evaluated earlier. The weights leave
//! wide gaps between kinds so that any number of cheap predicates composed
//! together still outranks a single expensive one of the next class up.

use crate::types::{BoolExpr, RuleBranch};

pub(crate) const WEIGHT_COMPARISON: u32 = 10;
pub(crate) const WEIGHT_IP_RANGE: u32 = 1_000;
pub(crate) const WEIGHT_CONTAINS: u32 = 5_000;
pub(crate) const WEIGHT_MATCHES: u32 = 25_000;
pub(crate) const WEIGHT_NON_DETERMINISTIC: u32 = 50_000;

/// Weight of an expression tree. Composites weigh the saturating sum of
/// their two children, so deep trees cannot wrap around to a high priority.
pub(crate) fn expression_weight(expr: &BoolExpr) -> u32 {
    match expr {
        BoolExpr::Compare { .. } | BoolExpr::IsEmpty { .. } => WEIGHT_COMPARISON,
        BoolExpr::InIpRange { .. } => WEIGHT_IP_RANGE,
        BoolExpr::Contains { .. } => WEIGHT_CONTAINS,
        BoolExpr::Matches { .. } => WEIGHT_MATCHES,
        BoolExpr::Random { .. } | BoolExpr::Percent { .. } => WEIGHT_NON_DETERMINISTIC,
        BoolExpr::And(a, b) | BoolExpr::Or(a, b) | BoolExpr::Xor(a, b) => {
            expression_weight(a).saturating_add(expression_weight(b))
        }
    }
}

/// Composite priority of a rule: its condition's weight, plus the nested
/// rule's priority when the primary branch chains. Chaining stops at the
/// first terminal branch.
pub(crate) fn rule_priority(condition: &BoolExpr, primary: &RuleBranch) -> u32 {
    let weight = expression_weight(condition);
    match primary {
        RuleBranch::Chained(inner) => weight.saturating_add(inner.priority()),
        RuleBranch::Terminal(_) => weight,
    }
}
