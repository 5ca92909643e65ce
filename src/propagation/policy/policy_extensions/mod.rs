pub mod origin_filter;
pub mod peerlock_lite;

pub use origin_filter::OriginFilter;
pub use peerlock_lite::PeerlockLite;
