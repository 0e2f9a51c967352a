//! Object identity and modification stamps used for cache invalidation.
//!
//! Every tracked object (mesh, scalar field, transfer function) carries an
//! [`ObjectId`] assigned at construction and a [`ModifiedTime`] that is bumped
//! from a process-wide monotonic counter whenever the object is mutated.
//! Caches compare `(id, mtime)` pairs to decide whether to rebuild.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);
static GLOBAL_CLOCK: AtomicU64 = AtomicU64::new(1);

/// Identity of a tracked object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Allocates a fresh identity.
    #[must_use]
    pub fn new() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

/// A modification stamp. Later stamps always compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModifiedTime(u64);

impl ModifiedTime {
    /// Takes the next tick of the global clock.
    #[must_use]
    pub fn now() -> Self {
        Self(GLOBAL_CLOCK.fetch_add(1, Ordering::Relaxed))
    }

    /// Advances this stamp to a fresh tick.
    pub fn touch(&mut self) {
        *self = Self::now();
    }

    /// Returns the raw tick value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl Default for ModifiedTime {
    fn default() -> Self {
        Self::now()
    }
}

/// The `(identity, stamp)` pair a cache remembers for one tracked input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Stamp {
    pub id: ObjectId,
    pub mtime: ModifiedTime,
}

/// Implemented by every object whose changes invalidate render caches.
pub trait Tracked {
    /// Identity assigned at construction.
    fn object_id(&self) -> ObjectId;

    /// Stamp of the last mutation.
    fn mtime(&self) -> ModifiedTime;

    /// Both values, for storing in a cache key.
    fn stamp(&self) -> Stamp {
        Stamp {
            id: self.object_id(),
            mtime: self.mtime(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_ids_are_unique() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_touch_advances_stamp() {
        let mut t = ModifiedTime::now();
        let before = t;
        t.touch();
        assert!(t > before);
    }
}
