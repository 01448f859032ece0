use thiserror::Error;

use super::ip::IpRangeError;

/// Structural or semantic problems found while building a document.
///
/// Any of these is fatal to the document being built (a failed *top-level*
/// rule is the exception: it is logged and skipped before the error
/// propagates this far). The caller decides whether to keep serving the
/// previous document or fail startup.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document root must be 'selectServer' or 'urlRules', found '{kind}'")]
    UnknownRoot { kind: String },

    #[error("unknown element kind '{kind}'")]
    UnknownKind { kind: String },

    #[error("element '{node}' expects {expected}, found {found}")]
    ChildCount {
        node: String,
        expected: &'static str,
        found: usize,
    },

    #[error("element '{node}' is missing required attribute '{attr}'")]
    MissingAttribute { node: String, attr: &'static str },

    #[error("invalid value '{value}' in element '{node}': {reason}")]
    InvalidValue {
        node: String,
        value: String,
        reason: &'static str,
    },

    #[error("invalid ip range in element '{node}': {source}")]
    InvalidIpRange {
        node: String,
        source: IpRangeError,
    },

    #[error("invalid pattern in element '{node}': {source}")]
    InvalidPattern {
        node: String,
        source: regex::Error,
    },

    #[error("distribution share {share} must be a percentage above zero")]
    DistributionShare { share: f64 },

    #[error("cumulative distribution bound {bound} must stay below 100")]
    DistributionBound { bound: f64 },

    #[error("distribution is missing its default group")]
    MissingDefault,

    #[error("document defines more than one distribution")]
    DuplicateDistribution,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_count_message() {
        let err = DocumentError::ChildCount {
            node: "and".to_owned(),
            expected: "exactly 2 operands",
            found: 1,
        };
        assert_eq!(err.to_string(), "element 'and' expects exactly 2 operands, found 1");
    }

    #[test]
    fn missing_attribute_message() {
        let err = DocumentError::MissingAttribute {
            node: "equals".to_owned(),
            attr: "param",
        };
        assert_eq!(
            err.to_string(),
            "element 'equals' is missing required attribute 'param'"
        );
    }

    #[test]
    fn unknown_root_message() {
        let err = DocumentError::UnknownRoot {
            kind: "policies".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "document root must be 'selectServer' or 'urlRules', found 'policies'"
        );
    }

    #[test]
    fn distribution_bound_message() {
        let err = DocumentError::DistributionBound { bound: 100.0 };
        assert_eq!(
            err.to_string(),
            "cumulative distribution bound 100 must stay below 100"
        );
    }
}
