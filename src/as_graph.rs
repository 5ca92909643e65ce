use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::shared::{CycleError, MalformedRecordError, Relationships, UnknownASError};

pub type ASN = u32;

/// One line of a relationship dataset: an AS pair plus a CAIDA-style code.
///
/// `-1`: `as_a` is a provider of `as_b`; `0`: peers; `1`: `as_a` is a
/// customer of `as_b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationshipRecord {
    pub as_a: ASN,
    pub as_b: ASN,
    pub code: i32,
}

impl RelationshipRecord {
    pub const PROVIDER_TO_CUSTOMER: i32 = -1;
    pub const PEER_TO_PEER: i32 = 0;
    pub const CUSTOMER_TO_PROVIDER: i32 = 1;

    pub fn new(as_a: ASN, as_b: ASN, code: i32) -> Self {
        RelationshipRecord { as_a, as_b, code }
    }

    pub fn provider_customer(provider: ASN, customer: ASN) -> Self {
        Self::new(provider, customer, Self::PROVIDER_TO_CUSTOMER)
    }

    pub fn peers(as_a: ASN, as_b: ASN) -> Self {
        Self::new(as_a, as_b, Self::PEER_TO_PEER)
    }

    /// Role `as_b` plays for `as_a`.
    pub fn role_of_b(&self) -> Result<Relationships, MalformedRecordError> {
        if self.as_a == 0 || self.as_b == 0 {
            return Err(MalformedRecordError::ReservedASN {
                as_a: self.as_a,
                as_b: self.as_b,
            });
        }
        if self.as_a == self.as_b {
            return Err(MalformedRecordError::SelfReferential { asn: self.as_a });
        }
        match self.code {
            Self::PROVIDER_TO_CUSTOMER => Ok(Relationships::Customers),
            Self::PEER_TO_PEER => Ok(Relationships::Peers),
            Self::CUSTOMER_TO_PROVIDER => Ok(Relationships::Providers),
            code => Err(MalformedRecordError::UnknownRelationshipCode {
                as_a: self.as_a,
                as_b: self.as_b,
                code,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AS {
    pub asn: ASN,
    pub peers: Vec<ASN>,
    pub providers: Vec<ASN>,
    pub customers: Vec<ASN>,
}

impl AS {
    pub fn new(asn: ASN) -> Self {
        AS {
            asn,
            peers: Vec::new(),
            providers: Vec::new(),
            customers: Vec::new(),
        }
    }

    pub fn get_neighbors(&self, rel: Relationships) -> &[ASN] {
        match rel {
            Relationships::Providers => &self.providers,
            Relationships::Peers => &self.peers,
            Relationships::Customers => &self.customers,
            Relationships::Origin => &[],
        }
    }

    fn get_neighbors_mut(&mut self, rel: Relationships) -> Option<&mut Vec<ASN>> {
        match rel {
            Relationships::Providers => Some(&mut self.providers),
            Relationships::Peers => Some(&mut self.peers),
            Relationships::Customers => Some(&mut self.customers),
            Relationships::Origin => None,
        }
    }

    /// Role `neighbor` plays for this AS, if they are adjacent.
    pub fn relationship_with(&self, neighbor: ASN) -> Option<Relationships> {
        [
            Relationships::Customers,
            Relationships::Peers,
            Relationships::Providers,
        ]
        .into_iter()
        .find(|&rel| self.get_neighbors(rel).binary_search(&neighbor).is_ok())
    }

    pub fn neighbor_asns(&self) -> impl Iterator<Item = ASN> + '_ {
        self.customers
            .iter()
            .chain(self.peers.iter())
            .chain(self.providers.iter())
            .copied()
    }

    pub fn degree(&self) -> usize {
        self.customers.len() + self.peers.len() + self.providers.len()
    }

    pub fn is_stub(&self) -> bool {
        self.customers.is_empty()
    }

    pub fn is_multihomed(&self) -> bool {
        self.customers.is_empty() && (self.providers.len() + self.peers.len()) > 1
    }

    pub fn is_transit(&self) -> bool {
        !self.customers.is_empty()
    }
}

/// Outcome of loading relationship records into an [`ASGraph`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub records_read: usize,
    pub relationships: usize,
    pub duplicates: usize,
    pub malformed: Vec<MalformedRecordError>,
}

impl BuildReport {
    pub fn malformed_count(&self) -> usize {
        self.malformed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.malformed.is_empty()
    }
}

/// Immutable AS-level topology. Each AS lives at a dense index so per-query
/// state can be kept in plain vectors.
#[derive(Clone, Default)]
pub struct ASGraph {
    nodes: Vec<AS>,
    as_index: HashMap<ASN, usize>,
}

impl fmt::Debug for ASGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ASGraph")
            .field("ases", &self.nodes.len())
            .finish()
    }
}

impl ASGraph {
    pub fn new() -> Self {
        ASGraph {
            nodes: Vec::new(),
            as_index: HashMap::new(),
        }
    }

    /// Build the graph from relationship records. Malformed records are
    /// skipped and reported; they never abort the build.
    pub fn build<I>(records: I) -> (ASGraph, BuildReport)
    where
        I: IntoIterator<Item = RelationshipRecord>,
    {
        let mut as_graph = ASGraph::new();
        let mut report = BuildReport::default();
        let mut seen: HashMap<(ASN, ASN), Relationships> = HashMap::new();

        for record in records {
            report.records_read += 1;
            match as_graph.add_record(&record, &mut seen) {
                Ok(true) => report.relationships += 1,
                Ok(false) => report.duplicates += 1,
                Err(error) => {
                    warn!(%error, "skipping malformed relationship record");
                    report.malformed.push(error);
                }
            }
        }

        for as_obj in as_graph.nodes.iter_mut() {
            as_obj.peers.sort_unstable();
            as_obj.providers.sort_unstable();
            as_obj.customers.sort_unstable();
        }

        debug!(
            ases = as_graph.len(),
            relationships = report.relationships,
            duplicates = report.duplicates,
            malformed = report.malformed.len(),
            "built AS graph"
        );
        (as_graph, report)
    }

    /// Returns `Ok(false)` for an exact duplicate of an earlier record.
    fn add_record(
        &mut self,
        record: &RelationshipRecord,
        seen: &mut HashMap<(ASN, ASN), Relationships>,
    ) -> Result<bool, MalformedRecordError> {
        let role = record.role_of_b()?;

        // Key on the ordered pair, storing the role of the larger ASN.
        let (key, normalized) = if record.as_a < record.as_b {
            ((record.as_a, record.as_b), role)
        } else {
            ((record.as_b, record.as_a), role.invert())
        };
        if let Some(&existing) = seen.get(&key) {
            if existing == normalized {
                return Ok(false);
            }
            return Err(MalformedRecordError::ConflictingRelationship {
                as_a: key.0,
                as_b: key.1,
                existing,
            });
        }
        seen.insert(key, normalized);

        let a = self.index_or_insert(record.as_a);
        let b = self.index_or_insert(record.as_b);
        if let Some(neighbors) = self.nodes[a].get_neighbors_mut(role) {
            neighbors.push(record.as_b);
        }
        if let Some(neighbors) = self.nodes[b].get_neighbors_mut(role.invert()) {
            neighbors.push(record.as_a);
        }
        Ok(true)
    }

    /// Add an AS with no neighbors. Returns `false` if it was already there.
    pub fn add_as(&mut self, asn: ASN) -> bool {
        if self.contains(asn) {
            return false;
        }
        self.index_or_insert(asn);
        true
    }

    fn index_or_insert(&mut self, asn: ASN) -> usize {
        if let Some(&index) = self.as_index.get(&asn) {
            return index;
        }
        let index = self.nodes.len();
        self.nodes.push(AS::new(asn));
        self.as_index.insert(asn, index);
        index
    }

    pub fn get(&self, asn: &ASN) -> Option<&AS> {
        self.as_index.get(asn).map(|&index| &self.nodes[index])
    }

    pub fn index_of(&self, asn: ASN) -> Option<usize> {
        self.as_index.get(&asn).copied()
    }

    /// Panics if `index` did not come from this graph.
    pub fn by_index(&self, index: usize) -> &AS {
        &self.nodes[index]
    }

    pub fn contains(&self, asn: ASN) -> bool {
        self.as_index.contains_key(&asn)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AS> {
        self.nodes.iter()
    }

    /// All ASNs in ascending order.
    pub fn asns(&self) -> Vec<ASN> {
        let mut asns: Vec<ASN> = self.as_index.keys().copied().collect();
        asns.sort_unstable();
        asns
    }

    pub fn neighbors(&self, asn: ASN, rel: Relationships) -> Result<&[ASN], UnknownASError> {
        self.get(&asn)
            .map(|as_obj| as_obj.get_neighbors(rel))
            .ok_or(UnknownASError(asn))
    }

    /// Role `to` plays for `from`.
    pub fn relationship(&self, from: ASN, to: ASN) -> Option<Relationships> {
        self.get(&from)?.relationship_with(to)
    }

    /// Look for a loop in the customer-to-provider hierarchy.
    pub fn check_for_cycles(&self) -> Result<(), CycleError> {
        const UNVISITED: u8 = 0;
        const VISITING: u8 = 1;
        const DONE: u8 = 2;

        let mut state = vec![UNVISITED; self.nodes.len()];
        for start in 0..self.nodes.len() {
            if state[start] != UNVISITED {
                continue;
            }
            state[start] = VISITING;
            let mut stack: Vec<(usize, usize)> = vec![(start, 0)];

            while let Some(top) = stack.last_mut() {
                let (index, cursor) = *top;
                let providers = &self.nodes[index].providers;
                if cursor < providers.len() {
                    top.1 += 1;
                    let provider = providers[cursor];
                    let Some(next) = self.index_of(provider) else {
                        continue;
                    };
                    match state[next] {
                        VISITING => return Err(CycleError(provider)),
                        UNVISITED => {
                            state[next] = VISITING;
                            stack.push((next, 0));
                        }
                        _ => {}
                    }
                } else {
                    state[index] = DONE;
                    stack.pop();
                }
            }
        }
        Ok(())
    }
}
