pub mod graph;
pub mod shared;
pub mod sovereignty;
pub mod traversal;

pub use graph::LineageStore;
pub use shared::{LineageEvent, SharedLineageStore};
pub use traversal::GraphTraversal;
