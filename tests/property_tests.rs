use std::collections::{BTreeSet, VecDeque};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use bgpinfer::as_graph::{ASGraph, ASN};
use bgpinfer::as_graph_generators::{ASGraphGenerator, SyntheticGraphGenerator};
use bgpinfer::propagation::{is_better, BestRouteTable};
use bgpinfer::query_engine::{QueryEngine, QueryOptions};
use bgpinfer::route_validator::RouteValidator;
use bgpinfer::shared::Relationships;

const SEEDS: u64 = 8;
const DESTINATIONS_PER_GRAPH: usize = 6;

fn synthetic_graphs() -> impl Iterator<Item = (u64, ASGraph)> {
    (0..SEEDS).map(|seed| {
        let (as_graph, report) = SyntheticGraphGenerator::new(150, seed)
            .with_tier_1_count(3)
            .with_max_providers(3)
            .with_peer_probability(0.4)
            .generate()
            .unwrap();
        assert!(report.is_clean());
        (seed, as_graph)
    })
}

fn pick_destinations(as_graph: &ASGraph, seed: u64) -> Vec<ASN> {
    let mut rng = StdRng::seed_from_u64(seed ^ 0x5eed);
    let asns = as_graph.asns();
    asns.choose_multiple(&mut rng, DESTINATIONS_PER_GRAPH).copied().collect()
}

fn sequential() -> QueryOptions {
    QueryOptions::new().with_parallelism(1)
}

/// ASes with at least one valley-free path from `origin` that avoids
/// `poisoned`, found by a plain search over (AS, may-still-climb) states.
fn valley_free_reachable(as_graph: &ASGraph, origin: ASN, poisoned: &BTreeSet<ASN>) -> BTreeSet<ASN> {
    let mut reached = BTreeSet::new();
    if poisoned.contains(&origin) {
        return reached;
    }
    let mut seen: BTreeSet<(ASN, bool)> = BTreeSet::from([(origin, true)]);
    let mut queue = VecDeque::from([(origin, true)]);

    while let Some((asn, climbing)) = queue.pop_front() {
        reached.insert(asn);
        let as_obj = as_graph.get(&asn).unwrap();
        let mut next: Vec<(ASN, bool)> = as_obj.customers.iter().map(|&c| (c, false)).collect();
        if climbing {
            next.extend(as_obj.peers.iter().map(|&p| (p, false)));
            next.extend(as_obj.providers.iter().map(|&p| (p, true)));
        }
        for state in next {
            if !poisoned.contains(&state.0) && seen.insert(state) {
                queue.push_back(state);
            }
        }
    }
    reached
}

fn assert_stable(as_graph: &ASGraph, table: &BestRouteTable) {
    for as_obj in as_graph.iter() {
        let current = table.get(as_obj.asn);
        for rel in [Relationships::Customers, Relationships::Peers, Relationships::Providers] {
            for &neighbor in as_obj.get_neighbors(rel) {
                let Some(offered) = table.get(neighbor) else {
                    continue;
                };
                // `as_obj` plays `rel.invert()` for the neighbor.
                let Ok(candidate) = offered.extend(as_obj.asn, rel.invert()) else {
                    continue;
                };
                match current {
                    Some(current) => assert!(
                        !is_better(&candidate, current),
                        "AS{} keeps {:?} although AS{} offers {:?}",
                        as_obj.asn,
                        current.as_path,
                        neighbor,
                        candidate.as_path
                    ),
                    None => panic!("AS{} unreached although AS{} offers {:?}", as_obj.asn, neighbor, candidate.as_path),
                }
            }
        }
    }
}

#[test]
fn test_routes_are_cycle_free_and_valley_free() {
    for (seed, as_graph) in synthetic_graphs() {
        let validator = RouteValidator::new(&as_graph);
        let query_engine = QueryEngine::new(&as_graph);
        for destination in pick_destinations(&as_graph, seed) {
            let table = query_engine.compute_paths(&[destination], &sequential()).unwrap();
            for (asn, ann) in table.iter() {
                assert_eq!(ann.origin(), destination);
                assert_eq!(ann.holder(), *asn);
                RouteValidator::is_cycle_free(&ann.as_path).unwrap();
                validator.is_valley_free(&ann.as_path).unwrap();
                validator.validate(ann).unwrap();
            }
        }
    }
}

#[test]
fn test_no_neighbor_offers_a_better_route() {
    for (seed, as_graph) in synthetic_graphs() {
        let query_engine = QueryEngine::new(&as_graph);
        for destination in pick_destinations(&as_graph, seed) {
            let table = query_engine.compute_paths(&[destination], &sequential()).unwrap();
            assert_stable(&as_graph, &table);
        }
    }
}

#[test]
fn test_reached_set_matches_valley_free_reachability() {
    for (seed, as_graph) in synthetic_graphs() {
        let query_engine = QueryEngine::new(&as_graph);
        for destination in pick_destinations(&as_graph, seed) {
            let table = query_engine.compute_paths(&[destination], &sequential()).unwrap();
            let reached: BTreeSet<ASN> = table.reachable_asns().collect();
            assert_eq!(
                reached,
                valley_free_reachable(&as_graph, destination, &BTreeSet::new()),
                "seed {} destination AS{}",
                seed,
                destination
            );
        }
    }
}

#[test]
fn test_poison_enforcement() {
    for (seed, as_graph) in synthetic_graphs() {
        let query_engine = QueryEngine::new(&as_graph);
        let destinations = pick_destinations(&as_graph, seed);
        let poisoned: BTreeSet<ASN> = pick_destinations(&as_graph, seed + 1000).into_iter().take(3).collect();
        let options = sequential().with_poisoned(poisoned.iter().copied());

        for destination in destinations {
            let table = query_engine.compute_paths(&[destination], &options).unwrap();
            for (asn, ann) in table.iter() {
                assert!(
                    !ann.as_path.iter().any(|hop| poisoned.contains(hop)),
                    "AS{} routes through a poisoned AS: {:?}",
                    asn,
                    ann.as_path
                );
            }
            let reached: BTreeSet<ASN> = table.reachable_asns().collect();
            assert_eq!(reached, valley_free_reachable(&as_graph, destination, &poisoned));
            assert_stable(&as_graph, &table);
        }
    }
}

#[test]
fn test_queries_are_deterministic() {
    for (seed, as_graph) in synthetic_graphs().take(3) {
        let query_engine = QueryEngine::new(&as_graph);
        let destinations = pick_destinations(&as_graph, seed);

        let batch = query_engine
            .compute_many(&destinations, &QueryOptions::new().with_parallelism(4))
            .unwrap();
        for destination in destinations {
            let first = query_engine.compute_paths(&[destination], &sequential()).unwrap();
            let second = query_engine.compute_paths(&[destination], &sequential()).unwrap();
            assert_eq!(first, second);
            assert_eq!(first.to_json(), second.to_json());
            assert_eq!(batch[&destination], first);
        }
    }
}

#[test]
fn test_early_stop_agrees_with_full_run() {
    for (seed, as_graph) in synthetic_graphs().take(3) {
        let query_engine = QueryEngine::new(&as_graph);
        let destinations = pick_destinations(&as_graph, seed);
        let observers = pick_destinations(&as_graph, seed + 1);

        for (&destination, &observer) in destinations.iter().zip(observers.iter()) {
            let full = query_engine.compute_paths(&[destination], &sequential()).unwrap();
            let path = query_engine.path_between(observer, destination, &sequential()).unwrap();
            assert_eq!(path.as_deref(), full.path(observer));
        }
    }
}
