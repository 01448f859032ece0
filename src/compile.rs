use tracing::warn;

use crate::types::{
    BoolExpr, CompareOp, Consequence, ConditionalRule, DistributionPolicy, Document,
    DocumentError, IpRange, Node, Pattern, RuleBranch, RuleDocument, Server, ServerGroup,
    SetOperand, UrlParams, UrlRuleDocument, ValueKind,
};

/// Which consequence kinds a document family accepts. Passed explicitly down
/// the build so the two grammars coexist without shared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grammar {
    SelectServer,
    UrlRules,
}

impl Grammar {
    fn allows(self, kind: &str) -> bool {
        match self {
            Grammar::SelectServer => matches!(kind, "server" | "serverGroup"),
            Grammar::UrlRules => kind == "urlParams",
        }
    }
}

/// Build an evaluable [`Document`] from a parsed node tree.
///
/// The root kind selects the grammar. A top-level `if` that fails to build
/// is logged and skipped; every other problem is fatal to the document.
///
/// # Errors
///
/// Returns [`DocumentError`] describing the offending node.
pub fn compile(root: &Node) -> Result<Document, DocumentError> {
    match root.kind() {
        "selectServer" => Ok(Document::SelectServer(compile_select_server(root)?)),
        "urlRules" => Ok(Document::UrlRules(compile_url_rules(root)?)),
        other => Err(DocumentError::UnknownRoot {
            kind: other.to_owned(),
        }),
    }
}

fn compile_select_server(root: &Node) -> Result<RuleDocument, DocumentError> {
    let mut rules = Vec::new();
    let mut distribution = None;

    for child in root.children() {
        match child.kind() {
            "if" => match compile_rule(child, Grammar::SelectServer) {
                Ok(rule) => rules.push(rule),
                Err(error) => {
                    warn!(%error, rule = child.get("id").unwrap_or("<anonymous>"), "skipping malformed rule");
                }
            },
            "distribution" => {
                if distribution.is_some() {
                    return Err(DocumentError::DuplicateDistribution);
                }
                distribution = Some(compile_distribution(child)?);
            }
            other => {
                return Err(DocumentError::UnknownKind {
                    kind: other.to_owned(),
                })
            }
        }
    }

    Ok(RuleDocument::new(rules, distribution))
}

fn compile_url_rules(root: &Node) -> Result<UrlRuleDocument, DocumentError> {
    let mut rules = Vec::new();
    let mut default_params = None;

    for child in root.children() {
        match child.kind() {
            "if" => match compile_rule(child, Grammar::UrlRules) {
                Ok(rule) => rules.push(rule),
                Err(error) => {
                    warn!(%error, rule = child.get("id").unwrap_or("<anonymous>"), "skipping malformed rule");
                }
            },
            "default" => {
                if default_params.is_some() {
                    return Err(DocumentError::ChildCount {
                        node: "urlRules".to_owned(),
                        expected: "exactly one default section",
                        found: 2,
                    });
                }
                let inner = single_child(child, "exactly 1 url params section")?;
                if inner.kind() != "urlParams" {
                    return Err(DocumentError::UnknownKind {
                        kind: inner.kind().to_owned(),
                    });
                }
                default_params = Some(compile_url_params(inner)?);
            }
            other => {
                return Err(DocumentError::UnknownKind {
                    kind: other.to_owned(),
                })
            }
        }
    }

    let default_params = default_params.ok_or(DocumentError::MissingDefault)?;
    Ok(UrlRuleDocument::new(rules, default_params))
}

// -- Rules ------------------------------------------------------------------

fn compile_rule(node: &Node, grammar: Grammar) -> Result<ConditionalRule, DocumentError> {
    let children = node.children();
    if !(2..=3).contains(&children.len()) {
        return Err(DocumentError::ChildCount {
            node: "if".to_owned(),
            expected: "a condition plus one or two branches",
            found: children.len(),
        });
    }

    let condition = compile_expr(&children[0])?;
    let primary = compile_branch(&children[1], grammar)?;
    let alternative = children
        .get(2)
        .map(|alt| compile_branch(alt, grammar))
        .transpose()?;

    Ok(ConditionalRule::new(
        node.get("id").map(ToOwned::to_owned),
        condition,
        primary,
        alternative,
    ))
}

fn compile_branch(node: &Node, grammar: Grammar) -> Result<RuleBranch, DocumentError> {
    if node.kind() == "if" {
        return Ok(RuleBranch::chained(compile_rule(node, grammar)?));
    }
    Ok(RuleBranch::terminal(compile_consequence(node, grammar)?))
}

fn compile_consequence(node: &Node, grammar: Grammar) -> Result<Consequence, DocumentError> {
    if !grammar.allows(node.kind()) {
        return Err(DocumentError::UnknownKind {
            kind: node.kind().to_owned(),
        });
    }
    match node.kind() {
        "server" => Ok(Consequence::Server(compile_server(node)?)),
        "serverGroup" => Ok(Consequence::ServerGroup(compile_server_group(node)?)),
        "urlParams" => Ok(Consequence::UrlParams(compile_url_params(node)?)),
        other => Err(DocumentError::UnknownKind {
            kind: other.to_owned(),
        }),
    }
}

fn compile_server(node: &Node) -> Result<Server, DocumentError> {
    let mut server = Server::new(require_attr(node, "name")?, require_attr(node, "url")?);
    server.secure_url = node.get("secureUrl").map(ToOwned::to_owned);
    server.path = node.get("path").map(ToOwned::to_owned);
    server.description = node.get("description").map(ToOwned::to_owned);
    server.non_whitelisted_only = bool_attr(node, "nonWhitelistedOnly")?;

    for child in node.children() {
        if child.kind() != "query" {
            return Err(DocumentError::UnknownKind {
                kind: child.kind().to_owned(),
            });
        }
        server.query.insert(
            require_attr(child, "name")?.to_owned(),
            require_attr(child, "value")?.to_owned(),
        );
    }

    Ok(server)
}

fn compile_server_group(node: &Node) -> Result<ServerGroup, DocumentError> {
    let mut group = ServerGroup {
        enable_private_servers: bool_attr(node, "enablePrivateServers")?,
        ..ServerGroup::default()
    };

    if let Some(raw) = node.get("countDownTime") {
        group.count_down_time = raw.parse().map_err(|_| DocumentError::InvalidValue {
            node: "serverGroup".to_owned(),
            value: raw.to_owned(),
            reason: "expected an integer number of seconds",
        })?;
    }

    for child in node.children() {
        if child.kind() != "server" {
            return Err(DocumentError::UnknownKind {
                kind: child.kind().to_owned(),
            });
        }
        group.servers.push(compile_server(child)?);
    }

    Ok(group)
}

fn compile_url_params(node: &Node) -> Result<UrlParams, DocumentError> {
    if !node.children().is_empty() {
        return Err(DocumentError::ChildCount {
            node: "urlParams".to_owned(),
            expected: "no children",
            found: node.children().len(),
        });
    }

    let port = node
        .get("port")
        .map(|raw| {
            raw.parse::<u16>().map_err(|_| DocumentError::InvalidValue {
                node: "urlParams".to_owned(),
                value: raw.to_owned(),
                reason: "expected a port number",
            })
        })
        .transpose()?;

    Ok(UrlParams {
        protocol: node.get("protocol").map(ToOwned::to_owned),
        urn: node.get("urn").map(ToOwned::to_owned),
        port,
        ip_protocol_version: node.get("ipProtocolVersion").map(ToOwned::to_owned),
    })
}

// -- Distribution -----------------------------------------------------------

fn compile_distribution(node: &Node) -> Result<DistributionPolicy, DocumentError> {
    let mut shares = Vec::new();
    let mut default = None;

    for child in node.children() {
        match child.kind() {
            "percent" => {
                let raw = require_attr(child, "value")?;
                let share: f64 = raw.parse().map_err(|_| DocumentError::InvalidValue {
                    node: "percent".to_owned(),
                    value: raw.to_owned(),
                    reason: "expected a percentage",
                })?;
                let consequence = compile_consequence(
                    single_child(child, "exactly 1 consequence")?,
                    Grammar::SelectServer,
                )?;
                shares.push((share, consequence));
            }
            "default" => {
                if default.is_some() {
                    return Err(DocumentError::ChildCount {
                        node: "distribution".to_owned(),
                        expected: "exactly one default group",
                        found: 2,
                    });
                }
                default = Some(compile_consequence(
                    single_child(child, "exactly 1 consequence")?,
                    Grammar::SelectServer,
                )?);
            }
            other => {
                return Err(DocumentError::UnknownKind {
                    kind: other.to_owned(),
                })
            }
        }
    }

    let default = default.ok_or(DocumentError::MissingDefault)?;
    DistributionPolicy::new(shares, default)
}

// -- Expressions ------------------------------------------------------------

fn compile_expr(node: &Node) -> Result<BoolExpr, DocumentError> {
    match node.kind() {
        "equals" => compile_comparison(node, CompareOp::Eq),
        "notEquals" => compile_comparison(node, CompareOp::Neq),
        "greaterThan" => compile_comparison(node, CompareOp::Gt),
        "greaterOrEqual" => compile_comparison(node, CompareOp::Gte),
        "lessThan" => compile_comparison(node, CompareOp::Lt),
        "lessOrEqual" => compile_comparison(node, CompareOp::Lte),
        "matches" => {
            let raw = single_value(node)?;
            let pattern =
                Pattern::compile(&raw).map_err(|source| DocumentError::InvalidPattern {
                    node: "matches".to_owned(),
                    source,
                })?;
            Ok(BoolExpr::Matches {
                param: require_attr(node, "param")?.to_owned(),
                pattern,
                negate: bool_attr(node, "negation")?,
            })
        }
        "contains" => {
            let param = require_attr(node, "param")?.to_owned();
            let negate = bool_attr(node, "negation")?;
            let operand = if let Some(list) = node.get("namedList") {
                if !node.children().is_empty() {
                    return Err(DocumentError::ChildCount {
                        node: "contains".to_owned(),
                        expected: "no values alongside a namedList attribute",
                        found: node.children().len(),
                    });
                }
                SetOperand::NamedList(list.to_owned())
            } else {
                let values = value_children(node)?;
                if values.is_empty() {
                    return Err(DocumentError::ChildCount {
                        node: "contains".to_owned(),
                        expected: "a namedList attribute or at least 1 value",
                        found: 0,
                    });
                }
                SetOperand::Literal(values)
            };
            Ok(BoolExpr::Contains {
                param,
                operand,
                negate,
            })
        }
        "isEmpty" => {
            if !node.children().is_empty() {
                return Err(DocumentError::ChildCount {
                    node: "isEmpty".to_owned(),
                    expected: "no children",
                    found: node.children().len(),
                });
            }
            Ok(BoolExpr::IsEmpty {
                param: require_attr(node, "param")?.to_owned(),
                negate: bool_attr(node, "negation")?,
            })
        }
        "inIpRange" => {
            let values = value_children(node)?;
            if values.is_empty() {
                return Err(DocumentError::ChildCount {
                    node: "inIpRange".to_owned(),
                    expected: "at least 1 value",
                    found: 0,
                });
            }
            let ranges = values
                .iter()
                .map(|value| {
                    IpRange::parse(value).map_err(|source| DocumentError::InvalidIpRange {
                        node: "inIpRange".to_owned(),
                        source,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(BoolExpr::InIpRange {
                param: require_attr(node, "param")?.to_owned(),
                ranges,
                negate: bool_attr(node, "negation")?,
            })
        }
        "random" => Ok(BoolExpr::Random {
            threshold: percentage_attr(node)?,
        }),
        "percent" => Ok(BoolExpr::Percent {
            threshold: percentage_attr(node)?,
        }),
        "and" | "or" | "xor" => {
            let children = node.children();
            if children.len() != 2 {
                return Err(DocumentError::ChildCount {
                    node: node.kind().to_owned(),
                    expected: "exactly 2 operands",
                    found: children.len(),
                });
            }
            let left = Box::new(compile_expr(&children[0])?);
            let right = Box::new(compile_expr(&children[1])?);
            Ok(match node.kind() {
                "and" => BoolExpr::And(left, right),
                "or" => BoolExpr::Or(left, right),
                _ => BoolExpr::Xor(left, right),
            })
        }
        other => Err(DocumentError::UnknownKind {
            kind: other.to_owned(),
        }),
    }
}

fn compile_comparison(node: &Node, op: CompareOp) -> Result<BoolExpr, DocumentError> {
    let kind = match node.get("type") {
        None => ValueKind::None,
        Some(tag) => ValueKind::parse(tag).ok_or_else(|| DocumentError::InvalidValue {
            node: node.kind().to_owned(),
            value: tag.to_owned(),
            reason: "expected NONE, NUMERIC, VERSION or IPV6",
        })?,
    };

    let mut value = single_value(node)?;
    if kind == ValueKind::Numeric {
        // Best effort: "00100" becomes "100". Values that do not look like
        // integers stay as written and fail closed at evaluation time.
        if let Some(canonical) = canonicalize_integer(&value) {
            value = canonical;
        }
    }

    Ok(BoolExpr::Compare {
        param: require_attr(node, "param")?.to_owned(),
        op,
        value,
        kind,
        negate: bool_attr(node, "negation")?,
    })
}

/// Canonicalize an integer-looking string by dropping leading zeros
/// (`"00100"` → `"100"`). Returns `None` when the input is not a plain
/// optionally-signed integer, leaving the decision to the caller.
pub(crate) fn canonicalize_integer(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", trimmed),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let stripped = digits.trim_start_matches('0');
    let canonical = if stripped.is_empty() { "0" } else { stripped };
    if canonical == "0" {
        return Some("0".to_owned());
    }
    Some(format!("{sign}{canonical}"))
}

// -- Shared node helpers ----------------------------------------------------

fn require_attr<'n>(node: &'n Node, attr: &'static str) -> Result<&'n str, DocumentError> {
    node.get(attr).ok_or_else(|| DocumentError::MissingAttribute {
        node: node.kind().to_owned(),
        attr,
    })
}

fn bool_attr(node: &Node, attr: &'static str) -> Result<bool, DocumentError> {
    match node.get(attr) {
        None | Some("false") => Ok(false),
        Some("true") => Ok(true),
        Some(other) => Err(DocumentError::InvalidValue {
            node: node.kind().to_owned(),
            value: other.to_owned(),
            reason: "expected 'true' or 'false'",
        }),
    }
}

fn percentage_attr(node: &Node) -> Result<f64, DocumentError> {
    let raw = require_attr(node, "value")?;
    let threshold: f64 = raw.parse().map_err(|_| DocumentError::InvalidValue {
        node: node.kind().to_owned(),
        value: raw.to_owned(),
        reason: "expected a percentage",
    })?;
    if !threshold.is_finite() || !(0.0..=100.0).contains(&threshold) {
        return Err(DocumentError::InvalidValue {
            node: node.kind().to_owned(),
            value: raw.to_owned(),
            reason: "percentage out of range",
        });
    }
    Ok(threshold)
}

/// Collect the `value` children of a leaf predicate. Any other child kind is
/// a structural error.
fn value_children(node: &Node) -> Result<Vec<String>, DocumentError> {
    node.children()
        .iter()
        .map(|child| {
            if child.kind() != "value" {
                return Err(DocumentError::UnknownKind {
                    kind: child.kind().to_owned(),
                });
            }
            require_attr(child, "value").map(ToOwned::to_owned)
        })
        .collect()
}

fn single_value(node: &Node) -> Result<String, DocumentError> {
    let mut values = value_children(node)?;
    if values.len() != 1 {
        return Err(DocumentError::ChildCount {
            node: node.kind().to_owned(),
            expected: "exactly 1 value",
            found: values.len(),
        });
    }
    Ok(values.remove(0))
}

fn single_child<'n>(node: &'n Node, expected: &'static str) -> Result<&'n Node, DocumentError> {
    if node.children().len() != 1 {
        return Err(DocumentError::ChildCount {
            node: node.kind().to_owned(),
            expected,
            found: node.children().len(),
        });
    }
    Ok(&node.children()[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(text: &str) -> Node {
        Node::new("value").attr("value", text)
    }

    fn server_node(name: &str) -> Node {
        Node::new("server").attr("name", name).attr("url", "http://host")
    }

    fn rule_node(id: &str) -> Node {
        Node::new("if")
            .attr("id", id)
            .child(Node::new("equals").attr("param", "a").child(value("x")))
            .child(server_node("s1"))
    }

    #[test]
    fn compile_select_server_document() {
        let root = Node::new("selectServer").child(rule_node("r1"));
        let doc = compile(&root).unwrap();
        let doc = doc.as_select_server().unwrap();
        assert_eq!(doc.rules().len(), 1);
        assert_eq!(doc.rules()[0].id(), Some("r1"));
    }

    #[test]
    fn unknown_root_is_fatal() {
        let root = Node::new("policies");
        assert!(matches!(
            compile(&root),
            Err(DocumentError::UnknownRoot { kind }) if kind == "policies"
        ));
    }

    #[test]
    fn malformed_rule_is_skipped() {
        let broken = Node::new("if").attr("id", "broken"); // no children at all
        let root = Node::new("selectServer")
            .child(broken)
            .child(rule_node("ok"));

        let doc = compile(&root).unwrap();
        let doc = doc.as_select_server().unwrap();
        assert_eq!(doc.rules().len(), 1);
        assert_eq!(doc.rules()[0].id(), Some("ok"));
    }

    #[test]
    fn unknown_top_level_kind_is_fatal() {
        let root = Node::new("selectServer").child(Node::new("mystery"));
        assert!(matches!(
            compile(&root),
            Err(DocumentError::UnknownKind { kind }) if kind == "mystery"
        ));
    }

    #[test]
    fn malformed_distribution_is_fatal() {
        let distribution = Node::new("distribution").child(
            Node::new("percent") // missing value attribute
                .child(server_node("a")),
        );
        let root = Node::new("selectServer").child(distribution);
        assert!(matches!(
            compile(&root),
            Err(DocumentError::MissingAttribute { attr: "value", .. })
        ));
    }

    #[test]
    fn distribution_requires_default() {
        let distribution = Node::new("distribution").child(
            Node::new("percent")
                .attr("value", "25")
                .child(server_node("a")),
        );
        let root = Node::new("selectServer").child(distribution);
        assert!(matches!(compile(&root), Err(DocumentError::MissingDefault)));
    }

    #[test]
    fn composite_needs_two_operands() {
        let expr = Node::new("and").child(Node::new("equals").attr("param", "a").child(value("x")));
        assert!(matches!(
            compile_expr(&expr),
            Err(DocumentError::ChildCount { found: 1, .. })
        ));
    }

    #[test]
    fn comparison_needs_exactly_one_value() {
        let expr = Node::new("equals")
            .attr("param", "a")
            .child(value("x"))
            .child(value("y"));
        assert!(matches!(
            compile_expr(&expr),
            Err(DocumentError::ChildCount { found: 2, .. })
        ));
    }

    #[test]
    fn unknown_value_type_is_rejected() {
        let expr = Node::new("equals")
            .attr("param", "a")
            .attr("type", "FLOAT")
            .child(value("1"));
        assert!(matches!(
            compile_expr(&expr),
            Err(DocumentError::InvalidValue { .. })
        ));
    }

    #[test]
    fn numeric_values_are_canonicalized() {
        let expr = Node::new("equals")
            .attr("param", "a")
            .attr("type", "NUMERIC")
            .child(value("00100"));
        match compile_expr(&expr).unwrap() {
            BoolExpr::Compare { value, .. } => assert_eq!(value, "100"),
            other => panic!("expected Compare, got {other:?}"),
        }
    }

    #[test]
    fn non_integer_numeric_values_stay_as_written() {
        let expr = Node::new("equals")
            .attr("param", "a")
            .attr("type", "NUMERIC")
            .child(value("not-a-number"));
        match compile_expr(&expr).unwrap() {
            BoolExpr::Compare { value, .. } => assert_eq!(value, "not-a-number"),
            other => panic!("expected Compare, got {other:?}"),
        }
    }

    #[test]
    fn bad_ip_literal_fails_the_rule() {
        let expr = Node::new("inIpRange")
            .attr("param", "clientIp")
            .child(value("not-an-ip"));
        assert!(matches!(
            compile_expr(&expr),
            Err(DocumentError::InvalidIpRange { .. })
        ));
    }

    #[test]
    fn contains_requires_an_operand() {
        let expr = Node::new("contains").attr("param", "mac");
        assert!(matches!(
            compile_expr(&expr),
            Err(DocumentError::ChildCount { found: 0, .. })
        ));
    }

    #[test]
    fn contains_accepts_named_list() {
        let expr = Node::new("contains")
            .attr("param", "mac")
            .attr("namedList", "whitelist");
        match compile_expr(&expr).unwrap() {
            BoolExpr::Contains {
                operand: SetOperand::NamedList(name),
                ..
            } => assert_eq!(name, "whitelist"),
            other => panic!("expected named list operand, got {other:?}"),
        }
    }

    #[test]
    fn random_threshold_is_validated() {
        let out_of_range = Node::new("random").attr("value", "150");
        assert!(matches!(
            compile_expr(&out_of_range),
            Err(DocumentError::InvalidValue { .. })
        ));

        let ok = Node::new("random").attr("value", "25.5");
        assert!(matches!(
            compile_expr(&ok).unwrap(),
            BoolExpr::Random { threshold } if (threshold - 25.5).abs() < f64::EPSILON
        ));
    }

    #[test]
    fn url_rules_need_a_default_section() {
        let root = Node::new("urlRules");
        assert!(matches!(compile(&root), Err(DocumentError::MissingDefault)));
    }

    #[test]
    fn url_rules_reject_server_consequences() {
        // Server consequences belong to the selectServer grammar; inside
        // urlRules the rule is malformed and gets skipped.
        let rule = Node::new("if")
            .attr("id", "r1")
            .child(Node::new("equals").attr("param", "a").child(value("x")))
            .child(server_node("s1"));
        let root = Node::new("urlRules").child(rule).child(
            Node::new("default").child(Node::new("urlParams").attr("protocol", "xre")),
        );

        let doc = compile(&root).unwrap();
        assert!(doc.as_url_rules().unwrap().rules().is_empty());
    }

    #[test]
    fn canonicalize_integer_cases() {
        assert_eq!(canonicalize_integer("00100").as_deref(), Some("100"));
        assert_eq!(canonicalize_integer("0").as_deref(), Some("0"));
        assert_eq!(canonicalize_integer("000").as_deref(), Some("0"));
        assert_eq!(canonicalize_integer("-007").as_deref(), Some("-7"));
        assert_eq!(canonicalize_integer(" 42 ").as_deref(), Some("42"));
        assert_eq!(canonicalize_integer("-0").as_deref(), Some("0"));
        assert_eq!(canonicalize_integer("1.5"), None);
        assert_eq!(canonicalize_integer("abc"), None);
        assert_eq!(canonicalize_integer(""), None);
        assert_eq!(canonicalize_integer("-"), None);
    }
}
