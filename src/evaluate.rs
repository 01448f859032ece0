use std::cmp::Ordering;
use std::net::Ipv6Addr;

use rand::Rng;
use tracing::debug;

use crate::types::{
    calculation_key, sticky_percentage, Attributes, BoolExpr, CompareOp, Consequence,
    ConditionalRule, Decision, IpRange, NamedListSource, RuleBranch, RuleDocument, SetOperand,
    UrlDecision, UrlParams, UrlRuleDocument, ValueKind,
};

pub(crate) fn decide<'doc>(
    doc: &'doc RuleDocument,
    attrs: &Attributes,
    lists: &dyn NamedListSource,
) -> Decision<'doc> {
    for rule in doc.rules() {
        if let Some(decision) = apply_rule(rule, attrs, lists) {
            return decision;
        }
    }

    if let Some(policy) = doc.distribution() {
        let group = policy.select(attrs);
        debug!(
            bound = group.upper_bound(),
            "distribution used, no rule matched"
        );
        return Decision::Distributed {
            consequence: group.consequence(),
        };
    }

    debug!("no rule matched and no distribution configured");
    Decision::NoMatch
}

/// Run one rule of the state machine. `None` means this rule did not produce
/// a consequence and evaluation moves on to the next rule.
fn apply_rule<'doc>(
    rule: &'doc ConditionalRule,
    attrs: &Attributes,
    lists: &dyn NamedListSource,
) -> Option<Decision<'doc>> {
    let branch = if eval_expr(rule.condition(), attrs, lists) {
        rule.primary()
    } else {
        rule.alternative()?
    };
    let consequence = resolve_branch(branch, attrs, lists)?;
    debug!(
        rule = rule.id().unwrap_or("<anonymous>"),
        %consequence,
        "rule matched"
    );
    Some(Decision::Matched {
        rule_id: rule.id(),
        consequence,
    })
}

/// Follow a branch to its terminal consequence. A chained rule whose
/// condition fails and has no alternative yields `None`, sending the outer
/// state machine to the next rule.
fn resolve_branch<'doc>(
    branch: &'doc RuleBranch,
    attrs: &Attributes,
    lists: &dyn NamedListSource,
) -> Option<&'doc Consequence> {
    match branch {
        RuleBranch::Terminal(consequence) => Some(consequence),
        RuleBranch::Chained(inner) => {
            let next = if eval_expr(inner.condition(), attrs, lists) {
                Some(inner.primary())
            } else {
                inner.alternative()
            };
            resolve_branch(next?, attrs, lists)
        }
    }
}

pub(crate) fn resolve_url(
    doc: &UrlRuleDocument,
    attrs: &Attributes,
    lists: &dyn NamedListSource,
) -> UrlDecision {
    let mut merged = UrlParams::default();
    let mut applied = Vec::new();

    for rule in doc.rules() {
        if merged.is_complete() {
            break;
        }
        let branch = if eval_expr(rule.condition(), attrs, lists) {
            rule.primary()
        } else {
            match rule.alternative() {
                Some(alt) => alt,
                None => continue,
            }
        };
        let Some(consequence) = resolve_branch(branch, attrs, lists) else {
            continue;
        };
        let Consequence::UrlParams(params) = consequence else {
            continue;
        };
        if merged.merge_missing_from(params) {
            debug!(
                rule = rule.id().unwrap_or("<anonymous>"),
                "url rule contributed"
            );
            if let Some(id) = rule.id() {
                applied.push(id.to_owned());
            }
        }
    }

    merged.merge_missing_from(doc.default_params());
    UrlDecision::new(merged, applied)
}

// -- Predicate semantics ----------------------------------------------------

/// Evaluate an expression against the request attributes. Never fails: any
/// predicate that cannot be evaluated (missing attribute, malformed value)
/// is false before negation.
fn eval_expr(expr: &BoolExpr, attrs: &Attributes, lists: &dyn NamedListSource) -> bool {
    match expr {
        BoolExpr::Compare {
            param,
            op,
            value,
            kind,
            negate,
        } => {
            let matched = attrs
                .get(param)
                .is_some_and(|actual| compare_values(actual, *op, value, *kind));
            matched != *negate
        }
        BoolExpr::Matches {
            param,
            pattern,
            negate,
        } => {
            let matched = attrs.get(param).is_some_and(|actual| pattern.is_match(actual));
            matched != *negate
        }
        BoolExpr::Contains {
            param,
            operand,
            negate,
        } => {
            let matched = attrs
                .get(param)
                .is_some_and(|actual| set_contains(operand, actual, lists));
            matched != *negate
        }
        BoolExpr::IsEmpty { param, negate } => {
            let empty = attrs.non_blank(param).is_none();
            empty != *negate
        }
        BoolExpr::InIpRange {
            param,
            ranges,
            negate,
        } => {
            let matched = attrs.get(param).is_some_and(|actual| {
                IpRange::parse(actual)
                    .map(|target| ranges.iter().any(|range| range.contains(&target)))
                    .unwrap_or(false)
            });
            matched != *negate
        }
        BoolExpr::Random { threshold } => rand::rng().random_range(0.0..100.0) < *threshold,
        BoolExpr::Percent { threshold } => match calculation_key(attrs) {
            Some(key) => sticky_percentage(key) < *threshold,
            None => rand::rng().random_range(0.0..100.0) < *threshold,
        },
        BoolExpr::And(a, b) => eval_expr(a, attrs, lists) && eval_expr(b, attrs, lists),
        BoolExpr::Or(a, b) => eval_expr(a, attrs, lists) || eval_expr(b, attrs, lists),
        BoolExpr::Xor(a, b) => eval_expr(a, attrs, lists) != eval_expr(b, attrs, lists),
    }
}

fn compare_values(actual: &str, op: CompareOp, expected: &str, kind: ValueKind) -> bool {
    let ordering = match kind {
        ValueKind::None => Some(actual.cmp(expected)),
        ValueKind::Numeric => {
            match (actual.trim().parse::<f64>(), expected.trim().parse::<f64>()) {
                (Ok(a), Ok(b)) => a.partial_cmp(&b),
                _ => None,
            }
        }
        ValueKind::Version => compare_versions(actual, expected),
        ValueKind::Ipv6 => {
            match (
                actual.trim().parse::<Ipv6Addr>(),
                expected.trim().parse::<Ipv6Addr>(),
            ) {
                (Ok(a), Ok(b)) => Some(u128::from(a).cmp(&u128::from(b))),
                _ => None,
            }
        }
    };
    ordering.is_some_and(|ord| apply_op(op, ord))
}

fn apply_op(op: CompareOp, ord: Ordering) -> bool {
    match op {
        CompareOp::Eq => ord == Ordering::Equal,
        CompareOp::Neq => ord != Ordering::Equal,
        CompareOp::Gt => ord == Ordering::Greater,
        CompareOp::Gte => ord != Ordering::Less,
        CompareOp::Lt => ord == Ordering::Less,
        CompareOp::Lte => ord != Ordering::Greater,
    }
}

/// Compare dot-separated version strings segment by segment; the shorter
/// sequence is zero-padded. Any non-integer segment fails the comparison.
fn compare_versions(a: &str, b: &str) -> Option<Ordering> {
    let left = parse_segments(a)?;
    let right = parse_segments(b)?;
    let len = left.len().max(right.len());
    for i in 0..len {
        let l = left.get(i).copied().unwrap_or(0);
        let r = right.get(i).copied().unwrap_or(0);
        match l.cmp(&r) {
            Ordering::Equal => continue,
            other => return Some(other),
        }
    }
    Some(Ordering::Equal)
}

fn parse_segments(version: &str) -> Option<Vec<u64>> {
    version
        .trim()
        .split('.')
        .map(|segment| segment.parse::<u64>().ok())
        .collect()
}

fn set_contains(operand: &SetOperand, actual: &str, lists: &dyn NamedListSource) -> bool {
    let needle = actual.trim();
    match operand {
        SetOperand::Literal(values) => values
            .iter()
            .any(|value| value.trim().eq_ignore_ascii_case(needle)),
        SetOperand::NamedList(name) => lists.resolve(name).is_some_and(|set| {
            set.iter().any(|value| value.trim().eq_ignore_ascii_case(needle))
        }),
    }
}
