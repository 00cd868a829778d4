//! In-memory port adapters for tests, demos and single-process deployments.

mod cache;
mod sieve;
mod stores;

use std::sync::Arc;

pub use cache::InMemoryCache;
pub use stores::{InMemoryMemberStore, InMemoryShareStore, InMemoryWorkspaceStore};

use crate::service::SharingPorts;

impl SharingPorts {
    /// Ports backed by fresh in-memory adapters.
    pub fn in_memory() -> Self {
        Self {
            workspaces: Arc::new(InMemoryWorkspaceStore::new()),
            members: Arc::new(InMemoryMemberStore::new()),
            shares: Arc::new(InMemoryShareStore::new()),
            cache: Arc::new(InMemoryCache::default()),
        }
    }
}
