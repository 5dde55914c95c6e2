use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Serializes the creation of artifacts inside each room.
///
/// Orders are computed from the stored room, so two creations reading the
/// same snapshot would hand out the same order. Holding the room guard from
/// the read to the last write prevents it. Rooms do not wait on each other.
///
/// A room mutex is only kept while someone holds or waits for it.
#[derive(Default)]
pub struct RoomSequencer {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Exclusive access to a room until dropped
pub struct RoomGuard<'a> {
    guard: Option<OwnedMutexGuard<()>>,
    room_id: String,
    locks: &'a DashMap<String, Arc<Mutex<()>>>,
}

impl RoomSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, room_id: &str) -> RoomGuard<'_> {
        // The map entry is released before waiting on the room mutex
        let lock = self
            .locks
            .entry(room_id.to_string())
            .or_default()
            .value()
            .clone();

        RoomGuard {
            guard: Some(lock.lock_owned().await),
            room_id: room_id.to_string(),
            locks: &self.locks,
        }
    }

    pub fn tracked_rooms(&self) -> usize {
        self.locks.len()
    }
}

impl Drop for RoomGuard<'_> {
    fn drop(&mut self) {
        // Unlock first, then forget the mutex if the map holds the only reference:
        // a waiter has cloned it under the same shard lock `remove_if` takes
        drop(self.guard.take());
        self.locks
            .remove_if(&self.room_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}
