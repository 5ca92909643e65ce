pub mod query_engine;
pub mod query_options;

pub use query_engine::QueryEngine;
pub use query_options::QueryOptions;
