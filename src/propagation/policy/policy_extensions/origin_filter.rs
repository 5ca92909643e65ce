use std::collections::BTreeSet;

use crate::as_graph::{AS, ASN};
use crate::propagation::announcement::Announcement;
use crate::propagation::policy::PolicyExtension;

/// Import only routes originated by one of `allowed_origins`, the origin
/// check used by peer-lock deployments.
#[derive(Debug, Clone)]
pub struct OriginFilter {
    pub allowed_origins: BTreeSet<ASN>,
}

impl OriginFilter {
    pub fn new<I>(allowed_origins: I) -> Self
    where
        I: IntoIterator<Item = ASN>,
    {
        OriginFilter {
            allowed_origins: allowed_origins.into_iter().collect(),
        }
    }
}

impl PolicyExtension for OriginFilter {
    fn validate_announcement(&self, ann: &Announcement, _as_obj: &AS) -> bool {
        self.allowed_origins.contains(&ann.origin())
    }

    fn name(&self) -> &str {
        "OriginFilter"
    }
}
