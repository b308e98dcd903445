//! Document store implementations for Veridian.
//!
//! Both backends implement the blocking `veridian_core::DocumentStore` trait.

pub mod file_backend;
pub mod in_memory;

pub use file_backend::FileStore;
pub use in_memory::InMemoryStore;

use std::sync::Arc;

use veridian_config::StoreConfig;
use veridian_core::store::DocumentStore;

/// Build the configured backend.
pub fn build_from_config(config: &StoreConfig) -> Arc<dyn DocumentStore> {
    match config.backend.as_str() {
        "memory" => Arc::new(InMemoryStore::new()),
        _ => Arc::new(FileStore::new(config.resolved_path())),
    }
}
