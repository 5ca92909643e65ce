use std::collections::BTreeMap;

use serde::Serialize;

use crate::as_graph::ASN;
use crate::propagation::announcement::Announcement;
use crate::shared::Relationships;

/// Best route selected by every AS reached in one traversal.
///
/// Keyed by ASN in ascending order, so iteration and serialization are
/// deterministic. A missing entry means the AS has no policy-compliant route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BestRouteTable {
    routes: BTreeMap<ASN, Announcement>,
}

impl BestRouteTable {
    pub fn new() -> Self {
        BestRouteTable {
            routes: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, asn: ASN, ann: Announcement) {
        debug_assert!(
            !self.routes.contains_key(&asn),
            "AS{} settled twice",
            asn
        );
        self.routes.insert(asn, ann);
    }

    pub fn get(&self, asn: ASN) -> Option<&Announcement> {
        self.routes.get(&asn)
    }

    /// AS path from the origin to `asn`, if `asn` was reached.
    pub fn path(&self, asn: ASN) -> Option<&[ASN]> {
        self.routes.get(&asn).map(|ann| ann.as_path.as_slice())
    }

    pub fn contains(&self, asn: ASN) -> bool {
        self.routes.contains_key(&asn)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ASN, &Announcement)> {
        self.routes.iter()
    }

    pub fn reachable_asns(&self) -> impl Iterator<Item = ASN> + '_ {
        self.routes.keys().copied()
    }

    pub fn paths(&self) -> BTreeMap<ASN, Vec<ASN>> {
        self.routes
            .iter()
            .map(|(asn, ann)| (*asn, ann.as_path.clone()))
            .collect()
    }

    /// `(observer, origin)` for every reached AS; with several origins this
    /// shows which origin each observer routes towards.
    pub fn observer_pairs(&self) -> Vec<(ASN, ASN)> {
        self.routes
            .iter()
            .map(|(asn, ann)| (*asn, ann.origin()))
            .collect()
    }

    pub fn count_by_relationship(&self) -> BTreeMap<Relationships, usize> {
        let mut counts = BTreeMap::new();
        for ann in self.routes.values() {
            *counts.entry(ann.recv_relationship).or_insert(0) += 1;
        }
        counts
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "reached": self.routes.len(),
            "routes": self.routes,
        })
    }
}
