use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::as_graph::{ASGraph, ASN};
use crate::propagation::announcement::Announcement;
use crate::propagation::best_route_table::BestRouteTable;
use crate::propagation::ordering::Candidate;
use crate::propagation::policy::{export_relationships, PolicyExtension};
use crate::shared::{ExtendError, Relationships, SeedError, UnknownASError};

/// Hooks into a traversal. Every method defaults to a no-op.
pub trait PropagationObserver {
    /// The traversal starts settling routes of a new preference class
    /// (`Customers`, `Peers`, `Providers`, in that order).
    fn on_phase(&mut self, _phase: Relationships) {}

    /// `exporter` offers its settled route to `importer`, which plays
    /// `send_relationship` for the exporter.
    fn on_visit_edge(&mut self, _exporter: ASN, _importer: ASN, _send_relationship: Relationships) {}

    /// `origin` announces its route to `neighbor` directly. `ann` is the
    /// route as the neighbor will receive it.
    fn on_neighbor_announce(
        &mut self,
        _origin: ASN,
        _neighbor: ASN,
        _send_relationship: Relationships,
        _ann: &Announcement,
    ) {
    }

    fn on_settle(&mut self, _asn: ASN, _ann: &Announcement) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PropagationObserver for NoopObserver {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PropagationStats {
    pub candidates_pushed: usize,
    pub settled: usize,
    pub stale: usize,
    pub filtered: usize,
    pub pruned_cycle: usize,
    pub pruned_policy: usize,
    pub pruned_poison: usize,
}

/// Single-pass, best-first route propagation over an immutable [`ASGraph`].
///
/// Candidates are popped in best-route order, so the first route an AS
/// accepts is final: every route that could still arrive later is built on a
/// route that ranks no better than the one being settled.
pub struct PropagationEngine<'a> {
    pub as_graph: &'a ASGraph,
    import_filters: BTreeMap<ASN, Arc<dyn PolicyExtension>>,
    neighbor_announcements: BTreeMap<ASN, BTreeMap<ASN, BTreeSet<ASN>>>,
    stop_at_target_asn: Option<ASN>,
    queue: BinaryHeap<Candidate>,
    settled: Vec<Option<Announcement>>,
    stats: PropagationStats,
}

impl<'a> PropagationEngine<'a> {
    pub fn new(as_graph: &'a ASGraph) -> Self {
        PropagationEngine {
            as_graph,
            import_filters: BTreeMap::new(),
            neighbor_announcements: BTreeMap::new(),
            stop_at_target_asn: None,
            queue: BinaryHeap::new(),
            settled: Vec::new(),
            stats: PropagationStats::default(),
        }
    }

    pub fn with_import_filter(mut self, asn: ASN, filter: Arc<dyn PolicyExtension>) -> Self {
        self.import_filters.insert(asn, filter);
        self
    }

    pub fn with_import_filters(mut self, filters: BTreeMap<ASN, Arc<dyn PolicyExtension>>) -> Self {
        self.import_filters.extend(filters);
        self
    }

    /// Restrict which neighbors an origin announces to. Each listed origin
    /// only exports its originated route to the neighbors in its map, with
    /// the ASes in that neighbor's set poisoned on that branch only. Origins
    /// without an entry announce to every neighbor.
    pub fn with_neighbor_announcements(
        mut self,
        announcements: BTreeMap<ASN, BTreeMap<ASN, BTreeSet<ASN>>>,
    ) -> Self {
        self.neighbor_announcements.extend(announcements);
        self
    }

    /// Stop as soon as `asn` settles. Routes already in the table stay final.
    pub fn with_stop_at(mut self, asn: Option<ASN>) -> Self {
        self.stop_at_target_asn = asn;
        self
    }

    pub fn stats(&self) -> &PropagationStats {
        &self.stats
    }

    /// Reset per-run state and queue the seed announcements. Each seed must be
    /// the origination of the AS it is seeded at: path `[asn]`, held as
    /// `Origin`. Seeds at a poisoned AS are dropped.
    pub fn setup(&mut self, initial_announcements: Vec<(ASN, Announcement)>) -> Result<(), SeedError> {
        self.queue.clear();
        self.settled.clear();
        self.settled.resize(self.as_graph.len(), None);
        self.stats = PropagationStats::default();

        let mut seeds = Vec::with_capacity(initial_announcements.len());
        for (asn, ann) in initial_announcements {
            let importer_index = self.as_graph.index_of(asn).ok_or(UnknownASError(asn))?;
            if ann.as_path != [asn] || ann.recv_relationship != Relationships::Origin {
                return Err(SeedError::NotAnOrigination {
                    asn,
                    as_path: ann.as_path,
                    recv_relationship: ann.recv_relationship,
                });
            }
            if ann.is_poisoned(asn) {
                warn!(asn, "origin AS is poisoned, not seeding it");
                continue;
            }
            seeds.push(Candidate {
                ann,
                importer_index,
            });
        }

        // Nothing is queued unless every seed is valid.
        self.stats.candidates_pushed = seeds.len();
        self.queue.extend(seeds);
        Ok(())
    }

    pub fn run(&mut self) -> BestRouteTable {
        self.run_with_observer(&mut NoopObserver)
    }

    pub fn run_with_observer(&mut self, observer: &mut dyn PropagationObserver) -> BestRouteTable {
        let as_graph = self.as_graph;
        let mut phase: Option<Relationships> = None;

        while let Some(Candidate { ann, importer_index }) = self.queue.pop() {
            if self.settled[importer_index].is_some() {
                self.stats.stale += 1;
                continue;
            }

            let as_obj = as_graph.by_index(importer_index);
            if let Some(filter) = self.import_filters.get(&as_obj.asn) {
                if !filter.validate_announcement(&ann, as_obj) {
                    trace!(asn = as_obj.asn, filter = filter.name(), path = ?ann.as_path, "import filter rejected route");
                    self.stats.filtered += 1;
                    continue;
                }
            }

            let current_phase = ann.recv_relationship.phase();
            if phase != Some(current_phase) {
                debug!(phase = %current_phase, "entering relationship phase");
                observer.on_phase(current_phase);
                phase = Some(current_phase);
            }

            #[cfg(debug_assertions)]
            self.check_invariants(&ann);

            observer.on_settle(as_obj.asn, &ann);
            self.stats.settled += 1;

            let originated = ann.recv_relationship == Relationships::Origin;
            let targets = if originated {
                self.neighbor_announcements.get(&as_obj.asn)
            } else {
                None
            };

            for send_relationship in export_relationships(ann.recv_relationship) {
                for &neighbor in as_obj.get_neighbors(send_relationship) {
                    let Some(neighbor_index) = as_graph.index_of(neighbor) else {
                        continue;
                    };
                    if self.settled[neighbor_index].is_some() {
                        continue;
                    }
                    let exported = match targets.map(|targets| targets.get(&neighbor)) {
                        None => Cow::Borrowed(&ann),
                        Some(None) => continue,
                        Some(Some(poisoned)) if poisoned.is_empty() => Cow::Borrowed(&ann),
                        Some(Some(poisoned)) => Cow::Owned(
                            ann.with_poisoned(poisoned.iter().copied().filter(|&asn| asn != as_obj.asn)),
                        ),
                    };
                    observer.on_visit_edge(as_obj.asn, neighbor, send_relationship);
                    match exported.extend(neighbor, send_relationship) {
                        Ok(next) => {
                            if originated {
                                observer.on_neighbor_announce(as_obj.asn, neighbor, send_relationship, &next);
                            }
                            self.queue.push(Candidate {
                                ann: next,
                                importer_index: neighbor_index,
                            });
                            self.stats.candidates_pushed += 1;
                        }
                        Err(reason) => {
                            trace!(exporter = as_obj.asn, importer = neighbor, %reason, "pruned candidate");
                            match reason {
                                ExtendError::CycleDetected(_) => self.stats.pruned_cycle += 1,
                                ExtendError::PolicyViolation { .. } => self.stats.pruned_policy += 1,
                                ExtendError::PoisonViolation(_) => self.stats.pruned_poison += 1,
                            }
                        }
                    }
                }
            }

            let reached_target = self.stop_at_target_asn == Some(as_obj.asn);
            self.settled[importer_index] = Some(ann);
            if reached_target {
                debug!(asn = as_obj.asn, pending = self.queue.len(), "target settled, stopping early");
                self.queue.clear();
                break;
            }
        }

        debug!(stats = ?self.stats, "propagation finished");

        let mut table = BestRouteTable::new();
        for (index, slot) in self.settled.iter_mut().enumerate() {
            if let Some(ann) = slot.take() {
                table.insert(as_graph.by_index(index).asn, ann);
            }
        }
        table
    }

    /// Debug-build checks on a route about to be settled.
    #[cfg(debug_assertions)]
    fn check_invariants(&self, ann: &Announcement) {
        use crate::route_validator::RouteValidator;

        if let Err(violation) = RouteValidator::new(self.as_graph).validate(ann) {
            panic!("settling invalid route {:?}: {}", ann.as_path, violation);
        }
        for &asn in &ann.as_path[..ann.as_path.len() - 1] {
            let settled_upstream = self
                .as_graph
                .index_of(asn)
                .and_then(|index| self.settled[index].as_ref());
            assert!(
                settled_upstream.is_some(),
                "AS{} exported a route before settling",
                asn
            );
        }
    }
}
