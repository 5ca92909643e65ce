use std::collections::HashSet;

use thiserror::Error;

use crate::as_graph::{ASGraph, ASN};
use crate::propagation::Announcement;
use crate::shared::Relationships;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteViolation {
    #[error("announcement has an empty AS path")]
    EmptyPath,

    #[error("AS{0} appears more than once in the AS path")]
    RepeatedAS(ASN),

    #[error("AS{from} and AS{to} are not adjacent")]
    MissingEdge { from: ASN, to: ASN },

    #[error("AS{at} received the route as {received} after an earlier peer or provider hop")]
    Valley { at: ASN, received: Relationships },

    #[error("relationship-state {recorded} does not match the last hop ({expected})")]
    StateMismatch {
        recorded: Relationships,
        expected: Relationships,
    },

    #[error("poisoned AS{0} appears in the AS path")]
    Poisoned(ASN),
}

/// Checks routes against the graph they were computed on.
pub struct RouteValidator<'a> {
    as_graph: &'a ASGraph,
}

impl<'a> RouteValidator<'a> {
    pub fn new(as_graph: &'a ASGraph) -> Self {
        RouteValidator { as_graph }
    }

    /// How each AS after the origin learned the route, in path order.
    pub fn received_relationships(&self, as_path: &[ASN]) -> Result<Vec<Relationships>, RouteViolation> {
        as_path
            .windows(2)
            .map(|hop| {
                self.as_graph
                    .relationship(hop[1], hop[0])
                    .ok_or(RouteViolation::MissingEdge {
                        from: hop[0],
                        to: hop[1],
                    })
            })
            .collect()
    }

    pub fn is_cycle_free(as_path: &[ASN]) -> Result<(), RouteViolation> {
        let mut seen = HashSet::with_capacity(as_path.len());
        for &asn in as_path {
            if !seen.insert(asn) {
                return Err(RouteViolation::RepeatedAS(asn));
            }
        }
        Ok(())
    }

    /// Zero or more customer-learned hops, at most one peer hop, then only
    /// provider-learned hops.
    pub fn is_valley_free(&self, as_path: &[ASN]) -> Result<(), RouteViolation> {
        let received = self.received_relationships(as_path)?;
        let mut descending = false;
        for (&relationship, &asn) in received.iter().zip(as_path.iter().skip(1)) {
            match relationship {
                Relationships::Customers if !descending => {}
                Relationships::Providers => descending = true,
                Relationships::Peers if !descending => descending = true,
                received => return Err(RouteViolation::Valley { at: asn, received }),
            }
        }
        Ok(())
    }

    pub fn validate(&self, ann: &Announcement) -> Result<(), RouteViolation> {
        if ann.as_path.is_empty() {
            return Err(RouteViolation::EmptyPath);
        }
        Self::is_cycle_free(&ann.as_path)?;
        if let Some(&asn) = ann.as_path.iter().find(|asn| ann.poisoned.contains(*asn)) {
            return Err(RouteViolation::Poisoned(asn));
        }
        self.is_valley_free(&ann.as_path)?;

        let expected = match ann.as_path.len() {
            1 => Relationships::Origin,
            len => self
                .as_graph
                .relationship(ann.as_path[len - 1], ann.as_path[len - 2])
                .ok_or(RouteViolation::MissingEdge {
                    from: ann.as_path[len - 2],
                    to: ann.as_path[len - 1],
                })?,
        };
        if ann.recv_relationship != expected {
            return Err(RouteViolation::StateMismatch {
                recorded: ann.recv_relationship,
                expected,
            });
        }
        Ok(())
    }
}
