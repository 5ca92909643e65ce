use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::as_graph::ASN;

/// Business relationship of a neighbor, seen from the AS holding the adjacency.
///
/// The same enum doubles as the relationship-state of an announcement: an AS
/// that learned a route from one of its customers holds it as `Customers`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Relationships {
    Providers = 1,
    Peers = 2,
    Customers = 3,
    Origin = 4,
}

impl Relationships {
    /// Role of the local AS as seen from the neighbor on the other end.
    pub fn invert(&self) -> Self {
        match self {
            Relationships::Providers => Relationships::Customers,
            Relationships::Customers => Relationships::Providers,
            Relationships::Peers => Relationships::Peers,
            Relationships::Origin => Relationships::Origin,
        }
    }

    /// Gao-Rexford preference, higher is better. Originated routes rank with
    /// customer routes.
    pub fn gao_rexford_preference(&self) -> u8 {
        match self {
            Relationships::Customers | Relationships::Origin => 3,
            Relationships::Peers => 2,
            Relationships::Providers => 1,
        }
    }

    /// Preference class used to group the traversal into phases.
    pub fn phase(&self) -> Self {
        match self {
            Relationships::Origin => Relationships::Customers,
            other => *other,
        }
    }
}

impl fmt::Display for Relationships {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Relationships::Providers => "PROVIDERS",
            Relationships::Peers => "PEERS",
            Relationships::Customers => "CUSTOMERS",
            Relationships::Origin => "ORIGIN",
        };
        write!(f, "{}", s)
    }
}

/// A relationship record that could not be turned into graph adjacency.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum MalformedRecordError {
    #[error("unknown relationship code {code} for AS{as_a}-AS{as_b}")]
    UnknownRelationshipCode { as_a: ASN, as_b: ASN, code: i32 },

    #[error("AS{asn} has a relationship with itself")]
    SelfReferential { asn: ASN },

    #[error("AS{as_a}-AS{as_b} uses the reserved ASN 0")]
    ReservedASN { as_a: ASN, as_b: ASN },

    #[error("AS{as_a}-AS{as_b} already recorded with AS{as_b} as one of its {existing}")]
    ConflictingRelationship {
        as_a: ASN,
        as_b: ASN,
        existing: Relationships,
    },

    #[error("line {line}: {reason}")]
    Unparseable { line: usize, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("AS{0} is not in the AS graph")]
pub struct UnknownASError(pub ASN);

/// Reasons an announcement cannot be extended to a neighbor.
///
/// These only ever prune candidates inside the propagation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExtendError {
    #[error("AS{0} already appears in the AS path")]
    CycleDetected(ASN),

    #[error("routes held as {learned} may not be exported to {export}")]
    PolicyViolation {
        learned: Relationships,
        export: Relationships,
    },

    #[error("AS{0} is poisoned")]
    PoisonViolation(ASN),
}

/// A seed the propagation engine refuses to start from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeedError {
    #[error(transparent)]
    UnknownAS(#[from] UnknownASError),

    #[error("seed at AS{asn} must be its own origination, got path {as_path:?} held as {recv_relationship}")]
    NotAnOrigination {
        asn: ASN,
        as_path: Vec<ASN>,
        recv_relationship: Relationships,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("customer-provider cycle through AS{0}")]
pub struct CycleError(pub ASN);

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    UnknownAS(#[from] UnknownASError),

    #[error("query has no origin ASes")]
    NoOrigins,

    #[error(transparent)]
    InvalidSeed(#[from] SeedError),

    #[error("AS{origin} cannot announce to AS{neighbor}: they are not adjacent")]
    NotANeighbor { origin: ASN, neighbor: ASN },

    #[error("AS{origin} poisons AS{neighbor} on its own announcement to it")]
    PoisonedNeighbor { origin: ASN, neighbor: ASN },

    #[error("invalid query options: {0}")]
    InvalidOptions(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read relationship dataset: {0}")]
    Io(#[from] io::Error),
}
