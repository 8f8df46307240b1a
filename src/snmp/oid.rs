//! SNMP object identifiers.

use std::fmt;
use std::str::FromStr;

/// An SNMP object identifier such as `1.3.6.1.2.1.1.4.0`.
///
/// Parsing accepts both the plain dotted form and the leading-dot form
/// (`.1.3.6.1.2.1.1.4.0`) that net-snmp tools print.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(Vec<u32>);

/// Error returned when an OID string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid object identifier '{input}': {reason}")]
pub struct ParseOidError {
    input: String,
    reason: &'static str,
}

impl ObjectId {
    /// Builds an OID from its arcs. BER requires at least two arcs with the
    /// first in `0..=2`; callers constructing OIDs by hand must respect that.
    pub fn from_arcs(arcs: impl Into<Vec<u32>>) -> Self {
        Self(arcs.into())
    }

    pub fn arcs(&self) -> &[u32] {
        &self.0
    }

    /// Wire form used by the SNMP session.
    pub fn to_oid(&self) -> Result<snmp2::Oid<'static>, String> {
        let arcs: Vec<u64> = self.0.iter().map(|a| u64::from(*a)).collect();
        snmp2::Oid::from(&arcs).map_err(|e| format!("cannot encode OID {self}: {e:?}"))
    }

    /// `None` when an arc does not fit in 32 bits.
    pub fn from_oid(oid: &snmp2::Oid<'_>) -> Option<Self> {
        oid.iter()?
            .map(|arc| u32::try_from(arc).ok())
            .collect::<Option<Vec<_>>>()
            .map(Self)
    }
}

impl FromStr for ObjectId {
    type Err = ParseOidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason| ParseOidError {
            input: s.to_string(),
            reason,
        };

        let trimmed = s.trim().strip_prefix('.').unwrap_or(s.trim());
        if trimmed.is_empty() {
            return Err(err("empty"));
        }

        let arcs = trimmed
            .split('.')
            .map(|part| part.parse::<u32>().map_err(|_| err("arcs must be unsigned integers")))
            .collect::<Result<Vec<_>, _>>()?;

        if arcs.len() < 2 {
            return Err(err("at least two arcs are required"));
        }
        if arcs[0] > 2 {
            return Err(err("first arc must be 0, 1 or 2"));
        }
        if arcs[0] < 2 && arcs[1] >= 40 {
            return Err(err("second arc must be below 40 when the first arc is 0 or 1"));
        }
        // The first two arcs share one 32-bit sub-identifier on the wire.
        if arcs[0] == 2 && arcs[1] > u32::MAX - 80 {
            return Err(err("second arc is too large to encode"));
        }

        Ok(Self(arcs))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for arc in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{arc}")?;
            first = false;
        }
        Ok(())
    }
}
