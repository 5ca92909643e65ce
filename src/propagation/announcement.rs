use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use crate::as_graph::ASN;
use crate::propagation::policy::should_propagate;
use crate::shared::{ExtendError, Relationships};

/// A route as held by one AS.
///
/// `as_path` runs origin first, holder last. `recv_relationship` records how
/// the holder learned the route. The poison set is shared by every
/// announcement derived from the same seed and is not serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Announcement {
    pub as_path: Vec<ASN>,
    pub recv_relationship: Relationships,
    #[serde(skip)]
    pub poisoned: Arc<BTreeSet<ASN>>,
}

impl Announcement {
    /// Route originated by `origin`: path `[origin]`, state `Origin`.
    pub fn originate(origin: ASN) -> Self {
        Announcement {
            as_path: vec![origin],
            recv_relationship: Relationships::Origin,
            poisoned: Arc::new(BTreeSet::new()),
        }
    }

    /// Copy with `asns` added to the poison set. Path and state are untouched.
    pub fn with_poisoned<I>(&self, asns: I) -> Self
    where
        I: IntoIterator<Item = ASN>,
    {
        let mut poisoned = (*self.poisoned).clone();
        poisoned.extend(asns);
        Announcement {
            as_path: self.as_path.clone(),
            recv_relationship: self.recv_relationship,
            poisoned: Arc::new(poisoned),
        }
    }

    /// Replace the poison set with an already shared one.
    pub fn with_poison_set(mut self, poisoned: Arc<BTreeSet<ASN>>) -> Self {
        self.poisoned = poisoned;
        self
    }

    pub fn origin(&self) -> ASN {
        self.as_path[0]
    }

    pub fn holder(&self) -> ASN {
        self.as_path[self.as_path.len() - 1]
    }

    pub fn path_len(&self) -> usize {
        self.as_path.len()
    }

    pub fn contains(&self, asn: ASN) -> bool {
        self.as_path.contains(&asn)
    }

    pub fn is_poisoned(&self, asn: ASN) -> bool {
        self.poisoned.contains(&asn)
    }

    /// Export this route from its holder to `next_hop`, where `send_relationship`
    /// is the role `next_hop` plays for the holder. The new route is held as
    /// the inverse role.
    pub fn extend(&self, next_hop: ASN, send_relationship: Relationships) -> Result<Self, ExtendError> {
        if self.contains(next_hop) {
            return Err(ExtendError::CycleDetected(next_hop));
        }
        if !should_propagate(self.recv_relationship, send_relationship) {
            return Err(ExtendError::PolicyViolation {
                learned: self.recv_relationship,
                export: send_relationship,
            });
        }
        if self.is_poisoned(next_hop) {
            return Err(ExtendError::PoisonViolation(next_hop));
        }

        let mut as_path = Vec::with_capacity(self.as_path.len() + 1);
        as_path.extend_from_slice(&self.as_path);
        as_path.push(next_hop);
        Ok(Announcement {
            as_path,
            recv_relationship: send_relationship.invert(),
            poisoned: Arc::clone(&self.poisoned),
        })
    }
}
