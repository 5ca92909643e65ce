use std::cmp::Ordering;

use crate::propagation::announcement::Announcement;

/// Best-route ordering between two routes reachable at the same AS.
/// `Ordering::Less` means `ann1` is preferred.
///
/// 1. Gao-Rexford preference of the relationship-state (origin and customer
///    routes first, then peer, then provider).
/// 2. Shorter AS path.
/// 3. Lexicographically smaller AS path, origin first.
pub fn compare_announcements(ann1: &Announcement, ann2: &Announcement) -> Ordering {
    let pref1 = ann1.recv_relationship.gao_rexford_preference();
    let pref2 = ann2.recv_relationship.gao_rexford_preference();

    pref2
        .cmp(&pref1)
        .then_with(|| ann1.as_path.len().cmp(&ann2.as_path.len()))
        .then_with(|| ann1.as_path.cmp(&ann2.as_path))
}

pub fn is_better(ann1: &Announcement, ann2: &Announcement) -> bool {
    compare_announcements(ann1, ann2) == Ordering::Less
}

/// Pending (importer, route) pair in the propagation queue.
///
/// Ordered so that `BinaryHeap` pops the most preferred route first.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub ann: Announcement,
    pub importer_index: usize,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_announcements(&other.ann, &self.ann)
            .then_with(|| other.importer_index.cmp(&self.importer_index))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}
