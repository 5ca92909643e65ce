pub mod policy_extensions;

use std::fmt::Debug;

use crate::as_graph::AS;
use crate::propagation::announcement::Announcement;
use crate::shared::Relationships;

pub use policy_extensions::{OriginFilter, PeerlockLite};

/// Gao-Rexford export rule: may a route held as `recv_relationship` be sent
/// to a neighbor playing `send_relationship`?
pub fn should_propagate(recv_relationship: Relationships, send_relationship: Relationships) -> bool {
    match (recv_relationship, send_relationship) {
        (_, Relationships::Origin) => false,
        (Relationships::Origin, _) => true,
        (Relationships::Customers, _) => true,
        (Relationships::Peers, Relationships::Customers) => true,
        (Relationships::Providers, Relationships::Customers) => true,
        _ => false,
    }
}

/// Neighbor roles a holder may export to, most preferred first.
pub fn export_relationships(recv_relationship: Relationships) -> impl Iterator<Item = Relationships> {
    [
        Relationships::Customers,
        Relationships::Peers,
        Relationships::Providers,
    ]
    .into_iter()
    .filter(move |&send| should_propagate(recv_relationship, send))
}

/// Per-AS import policy applied on top of Gao-Rexford.
///
/// Rejecting a candidate only stops that route from being imported; the AS
/// can still settle on a less preferred one later in the traversal.
pub trait PolicyExtension: Debug + Send + Sync {
    /// Whether `as_obj` imports `ann`. `ann.as_path` already ends in `as_obj.asn`.
    fn validate_announcement(&self, ann: &Announcement, as_obj: &AS) -> bool;

    fn name(&self) -> &str;
}
