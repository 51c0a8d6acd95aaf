use ulid::Ulid;

use crate::model::*;
use crate::observability::{verdict_label, CHECKS_TOTAL, CHECK_DURATION_SECONDS};

use super::conflict::{find_conflict, validate_candidate};
use super::{BookingError, Ledger, SharedRoomState};

impl Ledger {
    pub async fn get_booking(&self, id: Ulid) -> Option<Booking> {
        let room_id = self.get_room_for_booking(&id)?;
        let rs = self.get_room(&room_id)?;
        let guard = rs.read().await;
        guard.bookings.iter().find(|b| b.id == id).cloned()
    }

    /// A room's bookings in check-in order.
    pub async fn room_bookings(&self, room_id: &str) -> Vec<Booking> {
        let Some(rs) = self.get_room(room_id) else {
            return Vec::new();
        };
        let guard = rs.read().await;
        guard.bookings.clone()
    }

    /// Bookings matching `filter`, ordered by check-in then id.
    pub async fn list_bookings(&self, filter: &BookingFilter) -> Vec<Booking> {
        let mut out = Vec::new();
        for rs in self.room_handles() {
            let guard = rs.read().await;
            out.extend(guard.bookings.iter().filter(|b| filter.matches(b)).cloned());
        }
        out.sort_by(|a, b| a.check_in.cmp(&b.check_in).then(a.id.cmp(&b.id)));
        out
    }

    /// Availability check against the room's current bookings, for a form to
    /// call before submitting. Returns the conflicting booking, if any.
    pub async fn find_conflict(
        &self,
        candidate: &Candidate,
        exclude: Option<Ulid>,
    ) -> Result<Option<Booking>, BookingError> {
        let start = std::time::Instant::now();
        let result = self.find_conflict_read(candidate, exclude).await;
        metrics::histogram!(CHECK_DURATION_SECONDS).record(start.elapsed().as_secs_f64());
        metrics::counter!(CHECKS_TOTAL, "verdict" => verdict_label(&result)).increment(1);
        result
    }

    pub async fn has_conflict(&self, candidate: &Candidate, exclude: Option<Ulid>) -> Result<bool, BookingError> {
        self.find_conflict(candidate, exclude).await.map(|b| b.is_some())
    }

    async fn find_conflict_read(
        &self,
        candidate: &Candidate,
        exclude: Option<Ulid>,
    ) -> Result<Option<Booking>, BookingError> {
        let stay = validate_candidate(candidate)?;
        let room_id = candidate.room_id.trim();
        if !self.config.knows_room(room_id) {
            return Err(BookingError::UnknownRoom(room_id.to_string()));
        }
        let Some(rs) = self.get_room(room_id) else {
            return Ok(None);
        };
        let guard = rs.read().await;
        let hit = find_conflict(candidate, guard.overlapping(&stay), exclude)?.cloned();
        Ok(hit)
    }

    /// Per-room revenue, rooms in name order.
    pub async fn summary(&self) -> LedgerSummary {
        let mut summary = LedgerSummary::default();
        for rs in self.room_handles() {
            let guard = rs.read().await;
            if guard.bookings.is_empty() {
                continue;
            }
            let room = summarize_room(&guard);
            summary.total_amount += room.amount;
            summary.total_advance += room.advance;
            summary.total_balance_due += room.balance_due;
            summary.rooms.push(room);
        }
        summary.rooms.sort_by(|a, b| a.room_id.cmp(&b.room_id));
        summary
    }

    /// Clone the room handles out so no map shard is held across an await.
    fn room_handles(&self) -> Vec<SharedRoomState> {
        self.rooms.iter().map(|e| e.value().clone()).collect()
    }
}

fn summarize_room(rs: &RoomState) -> RoomSummary {
    let mut room = RoomSummary {
        room_id: rs.room_id.clone(),
        bookings: rs.bookings.len(),
        nights: 0,
        amount: 0.0,
        advance: 0.0,
        balance_due: 0.0,
    };
    for b in &rs.bookings {
        room.nights += b.stay().map_or(0, |s| s.nights());
        room.amount += b.amount;
        room.advance += b.advance;
        room.balance_due += b.balance_due();
    }
    room
}
