use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use thiserror::Error;

/// Address family of a parsed [`IpRange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpFamily {
    V4,
    V6,
}

impl IpFamily {
    fn bits(self) -> u32 {
        match self {
            IpFamily::V4 => 32,
            IpFamily::V6 => 128,
        }
    }
}

impl fmt::Display for IpFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpFamily::V4 => write!(f, "ipv4"),
            IpFamily::V6 => write!(f, "ipv6"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IpRangeError {
    #[error("unparsable ip literal '{literal}'")]
    BadLiteral { literal: String },

    #[error("prefix length {prefix} out of range for {family} address")]
    BadPrefix { prefix: u32, family: IpFamily },
}

/// A single address or CIDR block normalized to an inclusive `[low, high]`
/// integer interval.
///
/// Bounds are `u128`: unsigned 128-bit arithmetic covers the full IPv6 space
/// exactly, so range comparison needs no widening and cannot wrap. IPv4
/// addresses occupy the low 32 bits of the same space but only compare
/// against other IPv4 ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpRange {
    family: IpFamily,
    low: u128,
    high: u128,
}

impl IpRange {
    /// Parse a bare address (`10.0.0.5`, `2001:db8::1`) or CIDR notation
    /// (`10.0.0.0/24`, `2001:db8::/32`).
    ///
    /// A bare address yields `low == high`. For a CIDR block the low bound is
    /// the address masked to its `prefix` leading bits and the high bound has
    /// all host bits set.
    ///
    /// # Errors
    ///
    /// [`IpRangeError::BadLiteral`] for unparsable addresses or prefixes,
    /// [`IpRangeError::BadPrefix`] when the prefix exceeds the family width.
    pub fn parse(text: &str) -> Result<Self, IpRangeError> {
        let bad_literal = || IpRangeError::BadLiteral {
            literal: text.to_owned(),
        };

        let (addr_part, prefix_part) = match text.split_once('/') {
            Some((addr, prefix)) => (addr, Some(prefix)),
            None => (text, None),
        };

        let addr: IpAddr = addr_part.trim().parse().map_err(|_| bad_literal())?;
        let (family, value) = match addr {
            IpAddr::V4(v4) => (IpFamily::V4, u128::from(u32::from(v4))),
            IpAddr::V6(v6) => (IpFamily::V6, u128::from(v6)),
        };

        let Some(prefix_part) = prefix_part else {
            return Ok(Self {
                family,
                low: value,
                high: value,
            });
        };

        let prefix: u32 = prefix_part.trim().parse().map_err(|_| bad_literal())?;
        let bits = family.bits();
        if prefix > bits {
            return Err(IpRangeError::BadPrefix { prefix, family });
        }

        let host_bits = bits - prefix;
        let host_mask: u128 = if host_bits == 128 {
            u128::MAX
        } else {
            (1u128 << host_bits) - 1
        };

        Ok(Self {
            family,
            low: value & !host_mask,
            high: value | host_mask,
        })
    }

    #[must_use]
    pub fn family(&self) -> IpFamily {
        self.family
    }

    #[must_use]
    pub fn low(&self) -> u128 {
        self.low
    }

    #[must_use]
    pub fn high(&self) -> u128 {
        self.high
    }

    /// True when `other` is fully nested within this range. Ranges of
    /// different families never contain one another.
    #[must_use]
    pub fn contains(&self, other: &IpRange) -> bool {
        self.family == other.family && self.low <= other.low && other.high <= self.high
    }
}

// Render bounds back as addresses so diagnostics stay readable.
impl fmt::Display for IpRange {
    #[allow(clippy::cast_possible_truncation)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.family {
            IpFamily::V4 => {
                let low = Ipv4Addr::from(self.low as u32);
                let high = Ipv4Addr::from(self.high as u32);
                if self.low == self.high {
                    write!(f, "{low}")
                } else {
                    write!(f, "{low}-{high}")
                }
            }
            IpFamily::V6 => {
                let low = Ipv6Addr::from(self.low);
                let high = Ipv6Addr::from(self.high);
                if self.low == self.high {
                    write!(f, "{low}")
                } else {
                    write!(f, "{low}-{high}")
                }
            }
        }
    }
}
