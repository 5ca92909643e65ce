use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::as_graph::{ASGraph, ASN};
use crate::propagation::{
    Announcement, BestRouteTable, NoopObserver, PropagationEngine, PropagationObserver, PropagationStats,
};
use crate::query_engine::query_options::QueryOptions;
use crate::shared::{QueryError, UnknownASError};

/// Answers routing queries against one immutable AS graph.
///
/// Each query runs its own traversal; nothing is cached between queries, so
/// a `QueryEngine` can be shared freely across threads.
#[derive(Debug, Clone, Copy)]
pub struct QueryEngine<'a> {
    pub as_graph: &'a ASGraph,
}

impl<'a> QueryEngine<'a> {
    pub fn new(as_graph: &'a ASGraph) -> Self {
        QueryEngine { as_graph }
    }

    /// Best route of every AS towards `destinations` plus `options.origin_asns`.
    pub fn compute_paths(&self, destinations: &[ASN], options: &QueryOptions) -> Result<BestRouteTable, QueryError> {
        self.compute_with_observer(destinations, options, &mut NoopObserver)
            .map(|(table, _)| table)
    }

    /// Like [`compute_paths`](Self::compute_paths), also reporting traversal
    /// events to `observer` and returning the run statistics.
    pub fn compute_with_observer(
        &self,
        destinations: &[ASN],
        options: &QueryOptions,
        observer: &mut dyn PropagationObserver,
    ) -> Result<(BestRouteTable, PropagationStats), QueryError> {
        let origins = self.collect_origins(destinations, options)?;
        self.check_neighbor_announcements(options)?;
        let start = Instant::now();

        let poisoned = Arc::new(options.poisoned_asns.clone());
        let seeds = origins
            .iter()
            .map(|&asn| (asn, Announcement::originate(asn).with_poison_set(Arc::clone(&poisoned))))
            .collect();

        let mut engine = PropagationEngine::new(self.as_graph)
            .with_import_filters(options.import_filters.clone())
            .with_neighbor_announcements(options.neighbor_announcements.clone())
            .with_stop_at(options.stop_at_target_asn);
        engine.setup(seeds)?;
        let table = engine.run_with_observer(observer);

        info!(
            origins = ?origins,
            poisoned = options.poisoned_asns.len(),
            reached = table.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "computed best routes"
        );
        Ok((table, engine.stats().clone()))
    }

    /// AS path `observer` uses towards `destination`, origin first. `None`
    /// when no policy-compliant route exists. Stops as soon as `observer`
    /// settles.
    pub fn path_between(
        &self,
        observer: ASN,
        destination: ASN,
        options: &QueryOptions,
    ) -> Result<Option<Vec<ASN>>, QueryError> {
        if !self.as_graph.contains(observer) {
            return Err(UnknownASError(observer).into());
        }
        let options = options.clone().with_stop_at(observer);
        let table = self.compute_paths(&[destination], &options)?;
        Ok(table.path(observer).map(|path| path.to_vec()))
    }

    /// One independent traversal per destination, spread over
    /// `options.parallelism` worker threads. Every traversal also seeds
    /// `options.origin_asns`.
    pub fn compute_many(
        &self,
        destinations: &[ASN],
        options: &QueryOptions,
    ) -> Result<BTreeMap<ASN, BestRouteTable>, QueryError> {
        let destinations: Vec<ASN> = destinations.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        for &asn in &destinations {
            if !self.as_graph.contains(asn) {
                return Err(UnknownASError(asn).into());
            }
        }
        if destinations.is_empty() {
            return Ok(BTreeMap::new());
        }
        self.check_neighbor_announcements(options)?;

        let workers = options.parallelism.max(1).min(destinations.len());
        let chunk_size = destinations.len().div_ceil(workers);
        debug!(queries = destinations.len(), workers, "starting batch query");

        let pb = if options.show_progress {
            ProgressBar::new(destinations.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40} {pos}/{len} destinations")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
        );

        let start = Instant::now();
        let results: Vec<Result<(ASN, BestRouteTable), QueryError>> = thread::scope(|scope| {
            let handles: Vec<_> = destinations
                .chunks(chunk_size)
                .map(|chunk| {
                    let pb = pb.clone();
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|&destination| -> Result<(ASN, BestRouteTable), QueryError> {
                                let table = self.compute_paths(&[destination], options)?;
                                pb.inc(1);
                                Ok((destination, table))
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|handle| match handle.join() {
                    Ok(results) => results,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        });
        pb.finish();

        let tables = results.into_iter().collect::<Result<BTreeMap<_, _>, _>>()?;
        info!(
            queries = tables.len(),
            workers,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "finished batch query"
        );
        Ok(tables)
    }

    fn collect_origins(&self, destinations: &[ASN], options: &QueryOptions) -> Result<BTreeSet<ASN>, QueryError> {
        let origins: BTreeSet<ASN> = destinations
            .iter()
            .chain(options.origin_asns.iter())
            .copied()
            .collect();
        if origins.is_empty() {
            return Err(QueryError::NoOrigins);
        }
        if let Some(&unknown) = origins.iter().find(|asn| !self.as_graph.contains(**asn)) {
            return Err(UnknownASError(unknown).into());
        }
        Ok(origins)
    }

    /// Every announcing origin must be in the graph, every neighbor it names
    /// must be adjacent to it, and no neighbor may be poisoned on the route
    /// sent to it.
    fn check_neighbor_announcements(&self, options: &QueryOptions) -> Result<(), QueryError> {
        for (&origin, targets) in &options.neighbor_announcements {
            let as_obj = self.as_graph.get(&origin).ok_or(UnknownASError(origin))?;
            for (&neighbor, poisoned) in targets {
                if as_obj.relationship_with(neighbor).is_none() {
                    return Err(QueryError::NotANeighbor { origin, neighbor });
                }
                if poisoned.contains(&neighbor) {
                    return Err(QueryError::PoisonedNeighbor { origin, neighbor });
                }
            }
        }
        Ok(())
    }
}
