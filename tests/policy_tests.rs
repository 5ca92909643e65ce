use std::cmp::Ordering;

use bgpinfer::as_graph::AS;
use bgpinfer::propagation::{
    compare_announcements, export_relationships, should_propagate, Announcement, OriginFilter, PeerlockLite,
    PolicyExtension,
};
use bgpinfer::shared::{ExtendError, Relationships};

fn create_test_announcement(as_path: Vec<u32>, recv_relationship: Relationships) -> Announcement {
    let mut ann = Announcement::originate(as_path[0]);
    ann.as_path = as_path;
    ann.recv_relationship = recv_relationship;
    ann
}

#[test]
fn test_export_table() {
    use Relationships::*;

    let expected = [
        (Origin, [true, true, true]),
        (Customers, [true, true, true]),
        (Peers, [true, false, false]),
        (Providers, [true, false, false]),
    ];
    for (learned, allowed) in expected {
        for (send, allowed) in [Customers, Peers, Providers].into_iter().zip(allowed) {
            assert_eq!(
                should_propagate(learned, send),
                allowed,
                "learned via {} exporting to {}",
                learned,
                send
            );
        }
        assert!(!should_propagate(learned, Origin));
    }
}

#[test]
fn test_export_relationships_order() {
    let all: Vec<Relationships> = export_relationships(Relationships::Origin).collect();
    assert_eq!(
        all,
        vec![Relationships::Customers, Relationships::Peers, Relationships::Providers]
    );
    let down: Vec<Relationships> = export_relationships(Relationships::Peers).collect();
    assert_eq!(down, vec![Relationships::Customers]);
}

#[test]
fn test_extend_sets_state_from_edge() {
    let ann = Announcement::originate(2);

    // 1 is the provider of 2, so 1 learns the route from a customer.
    let at_1 = ann.extend(1, Relationships::Providers).unwrap();
    assert_eq!(at_1.as_path, vec![2, 1]);
    assert_eq!(at_1.recv_relationship, Relationships::Customers);
    assert_eq!(at_1.origin(), 2);
    assert_eq!(at_1.holder(), 1);

    let at_3 = at_1.extend(3, Relationships::Peers).unwrap();
    assert_eq!(at_3.as_path, vec![2, 1, 3]);
    assert_eq!(at_3.recv_relationship, Relationships::Peers);

    let at_5 = at_3.extend(5, Relationships::Customers).unwrap();
    assert_eq!(at_5.recv_relationship, Relationships::Providers);
    assert_eq!(at_5.path_len(), 4);

    // The seed announcement is left as it was.
    assert_eq!(ann.as_path, vec![2]);
}

#[test]
fn test_extend_rejections() {
    let at_3 = create_test_announcement(vec![2, 1, 3], Relationships::Peers);

    assert_eq!(
        at_3.extend(1, Relationships::Customers),
        Err(ExtendError::CycleDetected(1))
    );
    assert_eq!(
        at_3.extend(4, Relationships::Peers),
        Err(ExtendError::PolicyViolation {
            learned: Relationships::Peers,
            export: Relationships::Peers,
        })
    );

    let poisoned = at_3.with_poisoned([4]);
    assert_eq!(
        poisoned.extend(4, Relationships::Customers),
        Err(ExtendError::PoisonViolation(4))
    );
    assert!(poisoned.extend(5, Relationships::Customers).is_ok());
}

#[test]
fn test_with_poisoned_keeps_path_and_state() {
    let ann = create_test_announcement(vec![2, 1], Relationships::Customers);
    let poisoned = ann.with_poisoned([7, 8]).with_poisoned([9]);

    assert_eq!(poisoned.as_path, ann.as_path);
    assert_eq!(poisoned.recv_relationship, ann.recv_relationship);
    assert!(poisoned.is_poisoned(7) && poisoned.is_poisoned(8) && poisoned.is_poisoned(9));
    assert!(!ann.is_poisoned(7));

    // Derived routes keep the poison set.
    let next = poisoned.extend(3, Relationships::Customers).unwrap();
    assert!(next.is_poisoned(9));
}

#[test]
fn test_best_route_ordering() {
    let customer_long = create_test_announcement(vec![9, 8, 7, 6], Relationships::Customers);
    let peer_short = create_test_announcement(vec![9, 6], Relationships::Peers);
    let provider_short = create_test_announcement(vec![5, 6], Relationships::Providers);

    // Preference beats length.
    assert_eq!(compare_announcements(&customer_long, &peer_short), Ordering::Less);
    assert_eq!(compare_announcements(&peer_short, &provider_short), Ordering::Less);

    // Shorter wins within a preference class.
    let customer_short = create_test_announcement(vec![9, 6], Relationships::Customers);
    assert_eq!(compare_announcements(&customer_short, &customer_long), Ordering::Less);

    // Lexicographic path, origin first, breaks the remaining ties.
    let a = create_test_announcement(vec![3, 4, 6], Relationships::Providers);
    let b = create_test_announcement(vec![3, 5, 6], Relationships::Providers);
    assert_eq!(compare_announcements(&a, &b), Ordering::Less);
    assert_eq!(compare_announcements(&b, &a), Ordering::Greater);
    assert_eq!(compare_announcements(&a, &a.clone()), Ordering::Equal);
}

#[test]
fn test_origin_filter() {
    let as_obj = AS::new(2);
    let filter = OriginFilter::new([1]);

    let from_1 = create_test_announcement(vec![1, 2], Relationships::Peers);
    let from_7 = create_test_announcement(vec![7, 2], Relationships::Customers);
    assert!(filter.validate_announcement(&from_1, &as_obj));
    assert!(!filter.validate_announcement(&from_7, &as_obj));
    assert_eq!(filter.name(), "OriginFilter");
}

#[test]
fn test_peerlock_lite() {
    let as_obj = AS::new(50);
    let policy = PeerlockLite::new([10, 20]);

    // A customer route through a protected AS is a leak.
    let leak = create_test_announcement(vec![30, 10, 40, 50], Relationships::Customers);
    assert!(!policy.validate_announcement(&leak, &as_obj));

    let clean = create_test_announcement(vec![30, 40, 50], Relationships::Customers);
    assert!(policy.validate_announcement(&clean, &as_obj));

    // Only customer-learned routes are checked.
    let from_peer = create_test_announcement(vec![30, 10, 50], Relationships::Peers);
    assert!(policy.validate_announcement(&from_peer, &as_obj));

    // The protected AS itself may import such routes.
    let protected = AS::new(10);
    let at_protected = create_test_announcement(vec![30, 10], Relationships::Customers);
    assert!(policy.validate_announcement(&at_protected, &protected));
}
