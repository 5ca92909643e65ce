pub mod announcement;
pub mod best_route_table;
pub mod engine;
pub mod ordering;
pub mod policy;

pub use announcement::Announcement;
pub use best_route_table::BestRouteTable;
pub use engine::{NoopObserver, PropagationEngine, PropagationObserver, PropagationStats};
pub use ordering::{compare_announcements, is_better};
pub use policy::{export_relationships, should_propagate, OriginFilter, PeerlockLite, PolicyExtension};
