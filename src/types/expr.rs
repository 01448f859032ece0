use std::fmt;

use regex::Regex;

use super::ip::IpRange;

/// Comparison operators for the comparison predicate family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "=="),
            CompareOp::Neq => write!(f, "!="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Gte => write!(f, ">="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Lte => write!(f, "<="),
        }
    }
}

/// Declared value type of a comparison, overriding the default lexicographic
/// ordering of attribute strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueKind {
    /// Plain lexicographic string comparison.
    #[default]
    None,
    /// Both operands parse as 64-bit floats; parse failure fails the predicate.
    Numeric,
    /// Dot-separated integer segments compared pairwise, zero-padded.
    Version,
    /// Operands parse as IPv6 addresses and compare by 128-bit value.
    Ipv6,
}

impl ValueKind {
    /// Parse the document-level type tag (`NONE`, `NUMERIC`, `VERSION`,
    /// `IPV6`). Unknown tags are a document error, not a default.
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "NONE" => Some(ValueKind::None),
            "NUMERIC" => Some(ValueKind::Numeric),
            "VERSION" => Some(ValueKind::Version),
            "IPV6" => Some(ValueKind::Ipv6),
            _ => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::None => Ok(()),
            ValueKind::Numeric => write!(f, "numeric"),
            ValueKind::Version => write!(f, "version"),
            ValueKind::Ipv6 => write!(f, "ipv6"),
        }
    }
}

/// A whole-string match pattern, compiled once at document build time.
///
/// Equality is structural on the pattern source so expression trees stay
/// comparable for tests and change detection.
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    regex: Regex,
}

impl Pattern {
    /// Compile a pattern. The pattern must match the entire attribute value,
    /// so it is anchored on both ends.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`regex::Error`] for invalid syntax.
    pub fn compile(raw: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{raw})$"))?;
        Ok(Self {
            raw: raw.to_owned(),
            regex,
        })
    }

    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

/// Right-hand operand of a membership predicate: literal values carried by
/// the document, or the name of an externally supplied list.
#[derive(Debug, Clone, PartialEq)]
pub enum SetOperand {
    Literal(Vec<String>),
    NamedList(String),
}

/// The policy expression tree.
///
/// Leaves test a single named attribute; `And`/`Or`/`Xor` compose exactly two
/// subtrees. Leaf `negate` flags invert the leaf's final boolean, including
/// when the attribute is missing. There is no unknown variant: unrecognized
/// element kinds are rejected when a document is built.
#[derive(Debug, Clone, PartialEq)]
pub enum BoolExpr {
    Compare {
        param: String,
        op: CompareOp,
        value: String,
        kind: ValueKind,
        negate: bool,
    },
    Matches {
        param: String,
        pattern: Pattern,
        negate: bool,
    },
    Contains {
        param: String,
        operand: SetOperand,
        negate: bool,
    },
    IsEmpty {
        param: String,
        negate: bool,
    },
    InIpRange {
        param: String,
        ranges: Vec<IpRange>,
        negate: bool,
    },
    Random {
        threshold: f64,
    },
    Percent {
        threshold: f64,
    },
    And(Box<BoolExpr>, Box<BoolExpr>),
    Or(Box<BoolExpr>, Box<BoolExpr>),
    Xor(Box<BoolExpr>, Box<BoolExpr>),
}

impl BoolExpr {
    #[must_use]
    pub fn compare(param: &str, op: CompareOp, value: impl Into<String>) -> Self {
        BoolExpr::Compare {
            param: param.to_owned(),
            op,
            value: value.into(),
            kind: ValueKind::None,
            negate: false,
        }
    }

    #[must_use]
    pub fn equals(param: &str, value: impl Into<String>) -> Self {
        Self::compare(param, CompareOp::Eq, value)
    }

    #[must_use]
    pub fn is_empty(param: &str) -> Self {
        BoolExpr::IsEmpty {
            param: param.to_owned(),
            negate: false,
        }
    }

    /// Override the declared value type of a comparison leaf. No-op on other
    /// variants.
    #[must_use]
    pub fn with_kind(mut self, new_kind: ValueKind) -> Self {
        if let BoolExpr::Compare { kind, .. } = &mut self {
            *kind = new_kind;
        }
        self
    }

    /// Flip the negation flag of a leaf predicate. No-op on composites and
    /// the non-deterministic leaves, which carry no flag.
    #[must_use]
    pub fn negated(mut self) -> Self {
        match &mut self {
            BoolExpr::Compare { negate, .. }
            | BoolExpr::Matches { negate, .. }
            | BoolExpr::Contains { negate, .. }
            | BoolExpr::IsEmpty { negate, .. }
            | BoolExpr::InIpRange { negate, .. } => *negate = !*negate,
            _ => {}
        }
        self
    }

    #[must_use]
    pub fn and(self, other: BoolExpr) -> Self {
        BoolExpr::And(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn or(self, other: BoolExpr) -> Self {
        BoolExpr::Or(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn xor(self, other: BoolExpr) -> Self {
        BoolExpr::Xor(Box::new(self), Box::new(other))
    }

    /// The priority weight of this expression (lower = more specific).
    #[must_use]
    pub fn weight(&self) -> u32 {
        crate::priority::expression_weight(self)
    }
}

impl fmt::Display for BoolExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn neg(negate: bool) -> &'static str {
            if negate {
                "!"
            } else {
                ""
            }
        }

        match self {
            BoolExpr::Compare {
                param,
                op,
                value,
                kind,
                negate,
            } => {
                write!(f, "{}({param} {op} {value}", neg(*negate))?;
                if *kind != ValueKind::None {
                    write!(f, " as {kind}")?;
                }
                write!(f, ")")
            }
            BoolExpr::Matches {
                param,
                pattern,
                negate,
            } => write!(f, "{}({param} ~ /{}/)", neg(*negate), pattern.raw()),
            BoolExpr::Contains {
                param,
                operand,
                negate,
            } => match operand {
                SetOperand::Literal(values) => {
                    write!(f, "{}({param} in [{}])", neg(*negate), values.join(", "))
                }
                SetOperand::NamedList(name) => {
                    write!(f, "{}({param} in @{name})", neg(*negate))
                }
            },
            BoolExpr::IsEmpty { param, negate } => {
                write!(f, "{}({param} is empty)", neg(*negate))
            }
            BoolExpr::InIpRange {
                param,
                ranges,
                negate,
            } => {
                let rendered: Vec<String> = ranges.iter().map(ToString::to_string).collect();
                write!(f, "{}({param} in {})", neg(*negate), rendered.join(", "))
            }
            BoolExpr::Random { threshold } => write!(f, "(random < {threshold})"),
            BoolExpr::Percent { threshold } => write!(f, "(percent < {threshold})"),
            BoolExpr::And(a, b) => write!(f, "({a} AND {b})"),
            BoolExpr::Or(a, b) => write!(f, "({a} OR {b})"),
            BoolExpr::Xor(a, b) => write!(f, "({a} XOR {b})"),
        }
    }
}
