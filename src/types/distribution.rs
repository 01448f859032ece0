use super::attributes::Attributes;
use super::consequence::Consequence;
use super::error::DocumentError;

/// Attribute holding the account identifier, the preferred stickiness key.
pub const ACCOUNT_ID_ATTR: &str = "accountId";

/// Attribute holding the client MAC, the fallback stickiness key.
pub const MAC_ATTR: &str = "mac";

// Fixed key for the allocator hash. Changing it reshuffles every client's
// bucket, so it is part of the engine's compatibility surface.
const STICKY_HASH_KEY: &[u8; 32] = b"steer.distribution.hash.key.v01\0";

/// One traffic bucket: every calculation key hashing at or below
/// `upper_bound` percent (and above the previous group's bound) lands here.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionGroup {
    upper_bound: f64,
    consequence: Consequence,
}

impl DistributionGroup {
    /// Cumulative upper-bound percentage; 100 for the default group.
    #[must_use]
    pub fn upper_bound(&self) -> f64 {
        self.upper_bound
    }

    #[must_use]
    pub fn consequence(&self) -> &Consequence {
        &self.consequence
    }
}

/// Percentage-based fallback used when no conditional rule fires.
///
/// Selection is a consistent-hash partition, not a random draw: the same
/// calculation key always lands in the same group while group boundaries are
/// unchanged, and the hash is stable across restarts.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionPolicy {
    groups: Vec<DistributionGroup>,
    default: DistributionGroup,
}

impl DistributionPolicy {
    /// Build a policy from per-group percentage shares plus the default
    /// consequence that receives the remaining traffic.
    ///
    /// # Errors
    ///
    /// [`DocumentError::DistributionShare`] for a share that is not a
    /// positive finite percentage; [`DocumentError::DistributionBound`] when
    /// the cumulative bound reaches 100 before the default group (the
    /// default must keep a non-empty share).
    pub fn new(
        shares: Vec<(f64, Consequence)>,
        default: Consequence,
    ) -> Result<Self, DocumentError> {
        let mut groups = Vec::with_capacity(shares.len());
        let mut cumulative = 0.0_f64;

        for (share, consequence) in shares {
            if !share.is_finite() || share <= 0.0 {
                return Err(DocumentError::DistributionShare { share });
            }
            cumulative += share;
            if cumulative >= 100.0 {
                return Err(DocumentError::DistributionBound { bound: cumulative });
            }
            groups.push(DistributionGroup {
                upper_bound: cumulative,
                consequence,
            });
        }

        Ok(Self {
            groups,
            default: DistributionGroup {
                upper_bound: 100.0,
                consequence: default,
            },
        })
    }

    /// Explicit groups in ascending cumulative-bound order.
    #[must_use]
    pub fn groups(&self) -> &[DistributionGroup] {
        &self.groups
    }

    /// The mandatory default group carrying the remaining share.
    #[must_use]
    pub fn default_group(&self) -> &DistributionGroup {
        &self.default
    }

    /// Select the group for a request. Requests without a calculation key go
    /// to the default group.
    #[must_use]
    pub fn select(&self, attrs: &Attributes) -> &DistributionGroup {
        let Some(key) = calculation_key(attrs) else {
            return &self.default;
        };
        let percentage = sticky_percentage(key);
        self.groups
            .iter()
            .find(|group| group.upper_bound >= percentage)
            .unwrap_or(&self.default)
    }
}

/// The stickiness key for a request: the account id when present and
/// non-blank, else the MAC, else nothing.
#[must_use]
pub fn calculation_key(attrs: &Attributes) -> Option<&str> {
    attrs
        .non_blank(ACCOUNT_ID_ATTR)
        .or_else(|| attrs.non_blank(MAC_ATTR))
}

/// Map a calculation key to a stable percentage in `[0, 100)`.
///
/// Uses a keyed 64-bit hash scaled against the full 64-bit range, so the
/// mapping is uniform, restart-stable, and unaffected by changes to other
/// keys.
#[must_use]
pub fn sticky_percentage(key: &str) -> f64 {
    let digest = blake3::keyed_hash(STICKY_HASH_KEY, key.as_bytes());
    let mut word = [0u8; 8];
    word.copy_from_slice(&digest.as_bytes()[..8]);
    let hash = u64::from_le_bytes(word);
    (hash as f64 / (u64::MAX as f64 + 1.0)) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::consequence::Server;

    fn server(path: &str) -> Consequence {
        Consequence::Server(Server::new(path, "http://host").with_path(path))
    }

    #[test]
    fn shares_accumulate_into_bounds() {
        let policy = DistributionPolicy::new(
            vec![(25.0, server("A")), (50.0, server("B"))],
            server("DEFAULT"),
        )
        .unwrap();

        let bounds: Vec<f64> = policy.groups().iter().map(DistributionGroup::upper_bound).collect();
        assert_eq!(bounds, vec![25.0, 75.0]);
        assert_eq!(policy.default_group().upper_bound(), 100.0);
    }

    #[test]
    fn shares_summing_to_hundred_fail() {
        let result = DistributionPolicy::new(
            vec![(60.0, server("A")), (40.0, server("B"))],
            server("DEFAULT"),
        );
        assert!(matches!(
            result,
            Err(DocumentError::DistributionBound { bound }) if bound == 100.0
        ));
    }

    #[test]
    fn near_hundred_leaves_default_share() {
        let policy =
            DistributionPolicy::new(vec![(99.9, server("A"))], server("DEFAULT")).unwrap();
        assert_eq!(policy.groups().len(), 1);
        assert!(policy.default_group().upper_bound() > policy.groups()[0].upper_bound());
    }

    #[test]
    fn non_positive_share_fails() {
        for share in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let result = DistributionPolicy::new(vec![(share, server("A"))], server("DEFAULT"));
            assert!(
                matches!(result, Err(DocumentError::DistributionShare { .. })),
                "share {share} should be rejected"
            );
        }
    }

    #[test]
    fn calculation_key_prefers_account_id() {
        let attrs = Attributes::new()
            .set(ACCOUNT_ID_ATTR, "acct-1")
            .set(MAC_ATTR, "aa:bb");
        assert_eq!(calculation_key(&attrs), Some("acct-1"));

        let mac_only = Attributes::new()
            .set(ACCOUNT_ID_ATTR, "  ")
            .set(MAC_ATTR, "aa:bb");
        assert_eq!(calculation_key(&mac_only), Some("aa:bb"));

        assert_eq!(calculation_key(&Attributes::new()), None);
    }

    #[test]
    fn sticky_percentage_is_stable_and_bounded() {
        let first = sticky_percentage("acct-42");
        for _ in 0..10 {
            let again = sticky_percentage("acct-42");
            assert_eq!(first, again);
        }
        for key in ["a", "b", "acct-42", "ff:ee:dd:cc:bb:aa", ""] {
            let pct = sticky_percentage(key);
            assert!((0.0..100.0).contains(&pct), "{key}: {pct}");
        }
    }

    #[test]
    fn selection_is_idempotent() {
        let policy = DistributionPolicy::new(
            vec![(25.0, server("A")), (50.0, server("B"))],
            server("DEFAULT"),
        )
        .unwrap();

        let attrs = Attributes::new().set(ACCOUNT_ID_ATTR, "acct-7");
        let first = policy.select(&attrs).consequence().clone();
        for _ in 0..20 {
            assert_eq!(policy.select(&attrs).consequence(), &first);
        }
    }

    #[test]
    fn keyless_requests_use_default() {
        let policy =
            DistributionPolicy::new(vec![(99.0, server("A"))], server("DEFAULT")).unwrap();
        let group = policy.select(&Attributes::new());
        assert_eq!(group.consequence(), &server("DEFAULT"));
    }
}
