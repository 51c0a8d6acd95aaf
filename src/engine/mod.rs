mod conflict;
mod error;
mod mutations;
mod queries;

pub use conflict::{find_conflict, has_conflict, parse_date, validate_candidate};
pub use error::BookingError;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{broadcast, OwnedRwLockWriteGuard, RwLock};
use tracing::{info, warn};
use ulid::Ulid;

use crate::config::Config;
use crate::limits::*;
use crate::model::*;
use crate::notify::NotifyHub;

pub type SharedRoomState = Arc<RwLock<RoomState>>;

/// In-memory booking ledger.
///
/// Every write to a room goes through that room's write lock, so the
/// conflict check and the insert it guards cannot interleave with another
/// writer on the same room.
pub struct Ledger {
    pub(super) rooms: DashMap<String, SharedRoomState>,
    /// Reverse lookup: booking id → room id
    pub(super) booking_to_room: DashMap<Ulid, String>,
    pub notify: Arc<NotifyHub>,
    pub(super) config: Config,
}

/// Apply an event to a room (no locking — caller holds the lock).
fn apply_to_room(rs: &mut RoomState, event: &Event, index: &DashMap<Ulid, String>) {
    match event {
        Event::BookingCreated(booking) => {
            index.insert(booking.id, booking.room_id.clone());
            rs.insert_booking(booking.clone());
        }
        Event::BookingUpdated { booking, .. } => {
            rs.remove_booking(booking.id);
            if rs.room_id == booking.room_id {
                index.insert(booking.id, booking.room_id.clone());
                rs.insert_booking(booking.clone());
            }
        }
        Event::BookingDeleted { id, .. } => {
            rs.remove_booking(*id);
            index.remove(id);
        }
    }
}

impl Ledger {
    pub fn new(config: Config) -> Self {
        Self {
            rooms: DashMap::new(),
            booking_to_room: DashMap::new(),
            notify: Arc::new(NotifyHub::new()),
            config,
        }
    }

    /// Load a snapshot read from the hosted store.
    ///
    /// Room ids are trimmed. Otherwise records are accepted as stored,
    /// including overlaps written before conflicts were checked; those are
    /// logged, not dropped.
    pub fn from_bookings(config: Config, bookings: Vec<Booking>) -> Result<Self, BookingError> {
        let ledger = Self::new(config);
        for mut booking in bookings {
            booking.room_id = booking.room_id.trim().to_string();
            if booking.room_id.is_empty() {
                warn!("snapshot booking {} has no room, skipped", booking.id);
                continue;
            }
            if ledger.booking_to_room.contains_key(&booking.id) {
                warn!("snapshot booking {} appears twice, keeping the first", booking.id);
                continue;
            }
            let rs = ledger.room_or_create(&booking.room_id)?;
            // Sole owner during load, so the lock is uncontended.
            let Ok(mut guard) = rs.try_write() else {
                return Err(BookingError::Snapshot("room locked during load".into()));
            };
            if guard.bookings.len() >= MAX_BOOKINGS_PER_ROOM {
                return Err(BookingError::LimitExceeded("too many bookings in room"));
            }
            match booking.stay() {
                None => warn!(
                    "snapshot booking {} in room {} has an empty stay {}..{}",
                    booking.id, booking.room_id, booking.check_in, booking.check_out
                ),
                Some(stay) => {
                    if let Some(other) = guard.overlapping(&stay).next() {
                        warn!(
                            "snapshot booking {} overlaps {} in room {}",
                            booking.id, other.id, booking.room_id
                        );
                    }
                }
            }
            apply_to_room(&mut guard, &Event::BookingCreated(booking), &ledger.booking_to_room);
        }
        metrics::gauge!(crate::observability::BOOKINGS_ACTIVE).set(ledger.booking_count() as f64);
        info!(
            "ledger loaded: {} bookings across {} rooms",
            ledger.booking_count(),
            ledger.rooms.len()
        );
        Ok(ledger)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn booking_count(&self) -> usize {
        self.booking_to_room.len()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.notify.subscribe()
    }

    pub fn subscribe_room(&self, room_id: &str) -> broadcast::Receiver<Event> {
        self.notify.subscribe_room(room_id)
    }

    pub fn get_room(&self, room_id: &str) -> Option<SharedRoomState> {
        self.rooms.get(room_id).map(|e| e.value().clone())
    }

    pub fn get_room_for_booking(&self, id: &Ulid) -> Option<String> {
        self.booking_to_room.get(id).map(|e| e.value().clone())
    }

    pub(super) fn room_or_create(&self, room_id: &str) -> Result<SharedRoomState, BookingError> {
        if let Some(rs) = self.get_room(room_id) {
            return Ok(rs);
        }
        if self.rooms.len() >= MAX_ROOMS {
            return Err(BookingError::LimitExceeded("too many rooms"));
        }
        Ok(self
            .rooms
            .entry(room_id.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(RoomState::new(room_id))))
            .value()
            .clone())
    }

    /// Apply + notify in one call.
    pub(super) fn apply_and_notify(&self, rs: &mut RoomState, event: &Event) {
        apply_to_room(rs, event, &self.booking_to_room);
        self.notify.send(event);
    }

    /// Lookup booking → room, acquire the room's write lock.
    ///
    /// The booking may move between the lookup and the lock; the index is
    /// re-checked under the lock and the lookup retried.
    pub(super) async fn resolve_booking_write(
        &self,
        id: &Ulid,
    ) -> Result<(String, OwnedRwLockWriteGuard<RoomState>), BookingError> {
        loop {
            let room_id = self
                .get_room_for_booking(id)
                .ok_or(BookingError::NotFound(*id))?;
            let rs = self
                .get_room(&room_id)
                .ok_or(BookingError::NotFound(*id))?;
            let guard = rs.write_owned().await;
            if guard.bookings.iter().any(|b| b.id == *id) {
                return Ok((room_id, guard));
            }
            if self.get_room_for_booking(id).as_deref() == Some(room_id.as_str()) {
                return Err(BookingError::NotFound(*id));
            }
        }
    }
}
