//! Deterministic rule-evaluation engine for traffic-redirection policies.
//!
//! A policy document is parsed and compiled once into an immutable
//! [`Document`]; each inbound request's [`Attributes`] are then evaluated
//! against it concurrently and without locks.

mod compile;
mod error;
mod evaluate;
mod parse;
mod priority;
mod types;

pub use compile::compile;
pub use error::SteerError;
pub use parse::{parse, ParseError};
pub use types::{
    calculation_key, sticky_percentage, Attributes, BoolExpr, CompareOp, Consequence,
    ConditionalRule, Decision, DistributionGroup, DistributionPolicy, Document, DocumentError,
    EmptyLists, IpFamily, IpRange, IpRangeError, NamedListSource, Node, Pattern, RuleBranch,
    RuleDocument, Server, ServerGroup, SetOperand, StaticLists, UrlDecision, UrlParams,
    UrlRuleDocument, ValueKind, ACCOUNT_ID_ATTR, MAC_ATTR,
};
