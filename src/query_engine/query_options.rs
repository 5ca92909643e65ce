use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::as_graph::ASN;
use crate::propagation::PolicyExtension;
use crate::shared::QueryError;

/// Per-query knobs. Everything except `import_filters` round-trips through
/// JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    /// ASes that may never appear on any path.
    pub poisoned_asns: BTreeSet<ASN>,

    /// Extra origins seeded next to the query destinations.
    pub origin_asns: BTreeSet<ASN>,

    /// Origins that announce to a subset of their neighbors, keyed by origin
    /// and then by neighbor. Each neighbor maps to ASes poisoned on the
    /// route sent to that neighbor only. Entries for ASes that are not
    /// seeded in a query have no effect on it.
    pub neighbor_announcements: BTreeMap<ASN, BTreeMap<ASN, BTreeSet<ASN>>>,

    /// Stop the traversal once this AS has settled.
    pub stop_at_target_asn: Option<ASN>,

    /// Worker threads for `QueryEngine::compute_many`.
    pub parallelism: usize,

    pub show_progress: bool,

    #[serde(skip)]
    pub import_filters: BTreeMap<ASN, Arc<dyn PolicyExtension>>,
}

impl QueryOptions {
    pub fn new() -> Self {
        QueryOptions {
            poisoned_asns: BTreeSet::new(),
            origin_asns: BTreeSet::new(),
            neighbor_announcements: BTreeMap::new(),
            stop_at_target_asn: None,
            parallelism: num_cpus::get().max(1),
            show_progress: false,
            import_filters: BTreeMap::new(),
        }
    }

    pub fn with_poisoned<I>(mut self, asns: I) -> Self
    where
        I: IntoIterator<Item = ASN>,
    {
        self.poisoned_asns.extend(asns);
        self
    }

    pub fn with_origins<I>(mut self, asns: I) -> Self
    where
        I: IntoIterator<Item = ASN>,
    {
        self.origin_asns.extend(asns);
        self
    }

    /// `origin` announces only to `neighbors` (plus any neighbors named in
    /// earlier calls).
    pub fn with_announce_to<I>(mut self, origin: ASN, neighbors: I) -> Self
    where
        I: IntoIterator<Item = ASN>,
    {
        let targets = self.neighbor_announcements.entry(origin).or_default();
        for neighbor in neighbors {
            targets.entry(neighbor).or_default();
        }
        self
    }

    /// `origin` announces to `neighbor` with `asns` poisoned on that route.
    pub fn with_branch_poison<I>(mut self, origin: ASN, neighbor: ASN, asns: I) -> Self
    where
        I: IntoIterator<Item = ASN>,
    {
        self.neighbor_announcements
            .entry(origin)
            .or_default()
            .entry(neighbor)
            .or_default()
            .extend(asns);
        self
    }

    pub fn with_stop_at(mut self, asn: ASN) -> Self {
        self.stop_at_target_asn = Some(asn);
        self
    }

    pub fn with_import_filter(mut self, asn: ASN, filter: Arc<dyn PolicyExtension>) -> Self {
        self.import_filters.insert(asn, filter);
        self
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, QueryError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "poisoned_asns": self.poisoned_asns,
            "origin_asns": self.origin_asns,
            "neighbor_announcements": self.neighbor_announcements,
            "stop_at_target_asn": self.stop_at_target_asn,
            "parallelism": self.parallelism,
            "show_progress": self.show_progress,
            "import_filters": self
                .import_filters
                .iter()
                .map(|(asn, filter)| (asn.to_string(), filter.name().to_string()))
                .collect::<BTreeMap<String, String>>(),
        })
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        QueryOptions::new()
    }
}
