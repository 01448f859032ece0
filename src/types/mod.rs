mod attributes;
mod consequence;
mod decision;
mod distribution;
mod document;
mod error;
mod expr;
mod ip;
mod named_list;
mod node;
mod rule;

pub use attributes::Attributes;
pub use consequence::{Consequence, Server, ServerGroup, UrlParams};
pub use decision::{Decision, UrlDecision};
pub use distribution::{
    calculation_key, sticky_percentage, DistributionGroup, DistributionPolicy, ACCOUNT_ID_ATTR,
    MAC_ATTR,
};
pub use document::{Document, RuleDocument, UrlRuleDocument};
pub use error::DocumentError;
pub use expr::{BoolExpr, CompareOp, Pattern, SetOperand, ValueKind};
pub use ip::{IpFamily, IpRange, IpRangeError};
pub use named_list::{EmptyLists, NamedListSource, StaticLists};
pub use node::Node;
pub use rule::{ConditionalRule, RuleBranch};
