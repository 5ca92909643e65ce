use std::collections::BTreeSet;

use crate::as_graph::{AS, ASN};
use crate::propagation::announcement::Announcement;
use crate::propagation::policy::PolicyExtension;
use crate::shared::Relationships;

/// Peerlock Lite: a route learned from a customer must not traverse any of
/// the protected (typically Tier-1) ASes; such a route is a leak.
#[derive(Debug, Clone)]
pub struct PeerlockLite {
    pub protected_asns: BTreeSet<ASN>,
}

impl PeerlockLite {
    pub fn new<I>(protected_asns: I) -> Self
    where
        I: IntoIterator<Item = ASN>,
    {
        PeerlockLite {
            protected_asns: protected_asns.into_iter().collect(),
        }
    }
}

impl PolicyExtension for PeerlockLite {
    fn validate_announcement(&self, ann: &Announcement, as_obj: &AS) -> bool {
        if ann.recv_relationship != Relationships::Customers {
            return true;
        }
        !ann.as_path
            .iter()
            .any(|asn| *asn != as_obj.asn && self.protected_asns.contains(asn))
    }

    fn name(&self) -> &str {
        "PeerlockLite"
    }
}
