use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::as_graph::{ASGraph, BuildReport, RelationshipRecord, ASN};
use crate::as_graph_generators::ASGraphGenerator;
use crate::shared::DatasetError;

/// Seeded random hierarchical topology.
///
/// ASNs run from 1 to `num_ases`. The first `tier_1_count` ASes form a full
/// peering clique; every later AS buys transit from up to `max_providers`
/// lower-numbered ASes, so the provider hierarchy is always acyclic. With
/// probability `peer_probability` an AS also peers with one random non-Tier-1
/// AS below it. The same seed always gives the same graph, and it always
/// holds exactly `num_ases` ASes, so `num_ases == 1` is a lone AS with no
/// relationships.
#[derive(Debug, Clone)]
pub struct SyntheticGraphGenerator {
    pub num_ases: u32,
    pub tier_1_count: u32,
    pub max_providers: u32,
    pub peer_probability: f64,
    pub seed: u64,
}

impl SyntheticGraphGenerator {
    pub fn new(num_ases: u32, seed: u64) -> Self {
        SyntheticGraphGenerator {
            num_ases,
            tier_1_count: 3,
            max_providers: 2,
            peer_probability: 0.3,
            seed,
        }
    }

    pub fn with_tier_1_count(mut self, tier_1_count: u32) -> Self {
        self.tier_1_count = tier_1_count;
        self
    }

    pub fn with_max_providers(mut self, max_providers: u32) -> Self {
        self.max_providers = max_providers;
        self
    }

    pub fn with_peer_probability(mut self, peer_probability: f64) -> Self {
        self.peer_probability = peer_probability;
        self
    }

    pub fn records(&self) -> Vec<RelationshipRecord> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut records = Vec::new();
        if self.num_ases == 0 {
            return records;
        }

        let tier_1_count = self.tier_1_count.clamp(1, self.num_ases);
        let max_providers = self.max_providers.max(1);
        let peer_probability = self.peer_probability.clamp(0.0, 1.0);
        let mut linked: HashSet<(ASN, ASN)> = HashSet::new();

        for as_a in 1..=tier_1_count {
            for as_b in (as_a + 1)..=tier_1_count {
                linked.insert((as_a, as_b));
                records.push(RelationshipRecord::peers(as_a, as_b));
            }
        }

        for asn in (tier_1_count + 1)..=self.num_ases {
            for _ in 0..rng.gen_range(1..=max_providers) {
                let provider = rng.gen_range(1..asn);
                if linked.insert((provider, asn)) {
                    records.push(RelationshipRecord::provider_customer(provider, asn));
                }
            }
            if asn > tier_1_count + 1 && rng.gen_bool(peer_probability) {
                let peer = rng.gen_range((tier_1_count + 1)..asn);
                if linked.insert((peer, asn)) {
                    records.push(RelationshipRecord::peers(peer, asn));
                }
            }
        }
        records
    }
}

impl ASGraphGenerator for SyntheticGraphGenerator {
    fn generate(&self) -> Result<(ASGraph, BuildReport), DatasetError> {
        let (mut as_graph, report) = ASGraph::build(self.records());
        for asn in 1..=self.num_ases {
            as_graph.add_as(asn);
        }
        debug!(
            seed = self.seed,
            ases = as_graph.len(),
            relationships = report.relationships,
            "generated synthetic AS graph"
        );
        Ok((as_graph, report))
    }
}
