pub mod shared;
pub mod as_graph;
pub mod as_graph_generators;
pub mod propagation;
pub mod route_validator;
pub mod query_engine;

// Re-export commonly used types at the crate root
pub use as_graph::{ASGraph, BuildReport, RelationshipRecord, AS, ASN};
pub use as_graph_generators::{ASGraphGenerator, CAIDAASGraphGenerator, SyntheticGraphGenerator};
pub use propagation::{
    compare_announcements, Announcement, BestRouteTable, OriginFilter, PeerlockLite, PolicyExtension,
    PropagationEngine, PropagationObserver, PropagationStats,
};
pub use query_engine::{QueryEngine, QueryOptions};
pub use route_validator::{RouteValidator, RouteViolation};
pub use shared::{
    CycleError, DatasetError, ExtendError, MalformedRecordError, QueryError, Relationships, SeedError,
    UnknownASError,
};
