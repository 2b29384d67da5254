pub mod config;
pub mod error;
pub mod lineage;
pub mod reports;
pub mod seed;
pub mod types;

pub use error::{ChainError, LineageError};
pub use lineage::{LineageEvent, LineageStore, SharedLineageStore};
