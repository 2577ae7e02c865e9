//! Common types used throughout amman-config
//!
//! This module defines the commitment levels a validator RPC client may request.

use crate::error::AmmanError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Confirmation commitment level for RPC calls made during setup and teardown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Commitment {
    /// Latest block processed by the node, may be skipped
    Processed,
    /// Block voted on by a supermajority of the cluster
    Confirmed,
    /// Block rooted by a supermajority of the cluster
    Finalized,
    /// Legacy alias of `processed`
    Recent,
    /// Legacy alias of `confirmed`
    Single,
    /// Legacy alias of `confirmed`
    #[default]
    SingleGossip,
    /// Legacy alias of `finalized`
    Root,
    /// Legacy alias of `finalized`
    Max,
}

impl Commitment {
    pub const ALL: [Commitment; 8] = [
        Commitment::Processed,
        Commitment::Confirmed,
        Commitment::Finalized,
        Commitment::Recent,
        Commitment::Single,
        Commitment::SingleGossip,
        Commitment::Root,
        Commitment::Max,
    ];

    /// Get the level name as it appears in RPC requests
    pub fn as_str(&self) -> &'static str {
        match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
            Commitment::Recent => "recent",
            Commitment::Single => "single",
            Commitment::SingleGossip => "singleGossip",
            Commitment::Root => "root",
            Commitment::Max => "max",
        }
    }

    /// Whether this level was superseded by processed/confirmed/finalized
    pub fn is_deprecated(&self) -> bool {
        !matches!(
            self,
            Commitment::Processed | Commitment::Confirmed | Commitment::Finalized
        )
    }

    /// Map legacy levels onto the level they are equivalent to
    pub fn canonical(&self) -> Commitment {
        match self {
            Commitment::Processed | Commitment::Recent => Commitment::Processed,
            Commitment::Confirmed | Commitment::Single | Commitment::SingleGossip => {
                Commitment::Confirmed
            }
            Commitment::Finalized | Commitment::Root | Commitment::Max => Commitment::Finalized,
        }
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Commitment {
    type Err = AmmanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Commitment::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| AmmanError::Configuration(format!("Unknown commitment level: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_single_gossip() {
        assert_eq!(Commitment::default(), Commitment::SingleGossip);
        assert_eq!(Commitment::default().to_string(), "singleGossip");
    }

    #[test]
    fn test_parse_every_level() {
        for level in Commitment::ALL {
            assert_eq!(level.as_str().parse::<Commitment>().unwrap(), level);
        }
    }

    #[test]
    fn test_parse_unknown_level() {
        let err = "gossip".parse::<Commitment>().unwrap_err();
        assert!(err.to_string().contains("Unknown commitment level"));
    }

    #[test]
    fn test_serde_names_match_display() {
        for level in Commitment::ALL {
            let json = serde_json::to_string(&level).unwrap();
            assert_eq!(json, format!("\"{}\"", level));
        }
    }

    #[test]
    fn test_canonical_levels() {
        assert_eq!(Commitment::Recent.canonical(), Commitment::Processed);
        assert_eq!(Commitment::SingleGossip.canonical(), Commitment::Confirmed);
        assert_eq!(Commitment::Max.canonical(), Commitment::Finalized);
        assert!(Commitment::SingleGossip.is_deprecated());
        assert!(!Commitment::Confirmed.is_deprecated());
    }
}
