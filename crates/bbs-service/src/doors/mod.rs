//! Door registry and built-in doors

mod hilo;
mod oracle;

pub use hilo::HiLoDoor;
pub use oracle::OracleDoor;

use bbs_core::{Door, DoorId};
use dashmap::DashMap;
use std::sync::Arc;

/// Id-keyed lookup table of registered doors
///
/// Registration happens once at startup; lookups are concurrent and return
/// shared handles. Unknown ids are `None`, never a panic.
pub struct DoorRegistry {
    doors: DashMap<DoorId, Arc<dyn Door>>,
}

impl DoorRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            doors: DashMap::new(),
        }
    }

    /// Create a registry pre-loaded with the built-in doors
    #[must_use]
    pub fn with_builtin_doors() -> Self {
        let registry = Self::new();
        registry.register(Arc::new(OracleDoor::new()));
        registry.register(Arc::new(HiLoDoor::new()));
        registry
    }

    /// Register a door under its own id, replacing any previous entry
    pub fn register(&self, door: Arc<dyn Door>) {
        let id = door.id();
        tracing::info!(door_id = %id, name = door.name(), "Door registered");
        self.doors.insert(id, door);
    }

    /// Look up a door by id
    pub fn get(&self, door_id: &DoorId) -> Option<Arc<dyn Door>> {
        self.doors.get(door_id).map(|d| Arc::clone(&d))
    }

    /// Ids of every registered door, sorted for stable listings
    pub fn ids(&self) -> Vec<DoorId> {
        let mut ids: Vec<DoorId> = self.doors.iter().map(|d| d.key().clone()).collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids
    }

    /// Number of registered doors
    pub fn len(&self) -> usize {
        self.doors.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.doors.is_empty()
    }
}

impl Default for DoorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DoorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DoorRegistry")
            .field("doors", &self.ids())
            .finish()
    }
}
