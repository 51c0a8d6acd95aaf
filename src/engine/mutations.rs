use tracing::{debug, info, warn};
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;
use crate::observability::{status_label, BOOKINGS_ACTIVE, MUTATIONS_TOTAL};

use super::conflict::{find_conflict, validate_draft};
use super::{apply_to_room, BookingError, Ledger};

impl Ledger {
    /// Check the draft against its room and store it under a fresh id.
    pub async fn create_booking(&self, draft: BookingDraft) -> Result<Booking, BookingError> {
        let result = self.create_booking_locked(draft).await;
        metrics::counter!(MUTATIONS_TOTAL, "op" => "create", "status" => status_label(&result))
            .increment(1);
        result
    }

    async fn create_booking_locked(&self, draft: BookingDraft) -> Result<Booking, BookingError> {
        let stay = validate_draft(&draft)?;
        let room_id = draft.room_id.trim().to_string();
        if !self.config.knows_room(&room_id) {
            return Err(BookingError::UnknownRoom(room_id));
        }

        let rs = self.room_or_create(&room_id)?;
        let mut guard = rs.write().await;
        if guard.bookings.len() >= MAX_BOOKINGS_PER_ROOM {
            return Err(BookingError::LimitExceeded("too many bookings in room"));
        }

        if let Some(existing) = find_conflict(&draft.candidate(), guard.overlapping(&stay), None)? {
            debug!(
                "room {room_id} {}..{} conflicts with booking {}",
                stay.check_in, stay.check_out, existing.id
            );
            return Err(BookingError::Conflict(existing.id));
        }

        let booking = draft.into_booking(Ulid::new());
        self.apply_and_notify(&mut guard, &Event::BookingCreated(booking.clone()));
        metrics::gauge!(BOOKINGS_ACTIVE).set(self.booking_count() as f64);
        info!(
            "booked room {} {}..{} as {}",
            booking.room_id, booking.check_in, booking.check_out, booking.id
        );
        Ok(booking)
    }

    /// Edit a booking in place. The booking never conflicts with itself, and
    /// may move to another room.
    pub async fn update_booking(&self, id: Ulid, draft: BookingDraft) -> Result<Booking, BookingError> {
        let result = self.update_booking_locked(id, draft).await;
        metrics::counter!(MUTATIONS_TOTAL, "op" => "update", "status" => status_label(&result))
            .increment(1);
        result
    }

    async fn update_booking_locked(&self, id: Ulid, draft: BookingDraft) -> Result<Booking, BookingError> {
        let stay = validate_draft(&draft)?;
        let new_room = draft.room_id.trim().to_string();
        if !self.config.knows_room(&new_room) {
            return Err(BookingError::UnknownRoom(new_room));
        }

        loop {
            let old_room = self
                .get_room_for_booking(&id)
                .ok_or(BookingError::NotFound(id))?;
            let old_rs = self.get_room(&old_room).ok_or(BookingError::NotFound(id))?;
            let new_rs = self.room_or_create(&new_room)?;

            // Acquire write locks in sorted order to prevent deadlocks.
            let (mut old_guard, mut new_guard) = if old_room == new_room {
                (old_rs.write_owned().await, None)
            } else if old_room < new_room {
                let old = old_rs.write_owned().await;
                let new = new_rs.write_owned().await;
                (old, Some(new))
            } else {
                let new = new_rs.write_owned().await;
                let old = old_rs.write_owned().await;
                (old, Some(new))
            };

            if !old_guard.bookings.iter().any(|b| b.id == id) {
                // Moved by a concurrent edit between lookup and lock.
                if self.get_room_for_booking(&id).as_deref() == Some(old_room.as_str()) {
                    return Err(BookingError::NotFound(id));
                }
                continue;
            }

            let target: &RoomState = new_guard.as_deref().unwrap_or(&*old_guard);
            if target.bookings.len() >= MAX_BOOKINGS_PER_ROOM {
                return Err(BookingError::LimitExceeded("too many bookings in room"));
            }
            if let Some(existing) = find_conflict(&draft.candidate(), target.overlapping(&stay), Some(id))? {
                return Err(BookingError::Conflict(existing.id));
            }

            let booking = draft.into_booking(id);
            let event = Event::BookingUpdated {
                previous_room: old_room.clone(),
                booking: booking.clone(),
            };
            if let Some(guard) = new_guard.as_mut() {
                apply_to_room(guard, &event, &self.booking_to_room);
            }
            apply_to_room(&mut old_guard, &event, &self.booking_to_room);
            self.notify.send(&event);
            info!(
                "updated booking {id}: room {old_room} -> {} {}..{}",
                booking.room_id, booking.check_in, booking.check_out
            );
            return Ok(booking);
        }
    }

    /// Remove a booking. Only the configured administrator may delete.
    pub async fn delete_booking(&self, actor: &str, id: Ulid) -> Result<Booking, BookingError> {
        let result = self.delete_booking_locked(actor, id).await;
        metrics::counter!(MUTATIONS_TOTAL, "op" => "delete", "status" => status_label(&result))
            .increment(1);
        result
    }

    async fn delete_booking_locked(&self, actor: &str, id: Ulid) -> Result<Booking, BookingError> {
        if !self.config.is_admin(actor) {
            warn!("delete of booking {id} refused for {actor:?}");
            return Err(BookingError::Forbidden);
        }
        let (room_id, mut guard) = self.resolve_booking_write(&id).await?;
        let removed = guard
            .bookings
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or(BookingError::NotFound(id))?;

        self.apply_and_notify(&mut guard, &Event::BookingDeleted { id, room_id: room_id.clone() });
        metrics::gauge!(BOOKINGS_ACTIVE).set(self.booking_count() as f64);
        info!("deleted booking {id} from room {room_id}");
        Ok(removed)
    }
}
