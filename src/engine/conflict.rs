use chrono::{Datelike, NaiveDate};
use ulid::Ulid;

use crate::model::*;

use super::BookingError;

/// Parse a form date. Only the fixed-width `YYYY-MM-DD` shape is accepted.
pub fn parse_date(raw: &str) -> Result<NaiveDate, BookingError> {
    let raw = raw.trim();
    if raw.len() != 10 {
        return Err(BookingError::InvalidDate(raw.to_string()));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| BookingError::InvalidDate(raw.to_string()))
}

impl Candidate {
    /// Build a candidate from raw form fields.
    pub fn parse(room_id: &str, check_in: &str, check_out: &str) -> Result<Self, BookingError> {
        let room_id = room_id.trim();
        if room_id.is_empty() {
            return Err(BookingError::InvalidResource);
        }
        Ok(Self::new(room_id, parse_date(check_in)?, parse_date(check_out)?))
    }
}

/// Checks the two caller preconditions: a room, and a non-empty stay.
pub fn validate_candidate(candidate: &Candidate) -> Result<Stay, BookingError> {
    if candidate.room_id.trim().is_empty() {
        return Err(BookingError::InvalidResource);
    }
    Stay::try_new(candidate.check_in, candidate.check_out).ok_or(BookingError::InvalidRange {
        check_in: candidate.check_in,
        check_out: candidate.check_out,
    })
}

/// First booking in `existing` that shares the candidate's room and intersects its stay.
///
/// A booking whose id equals `exclude` is skipped, so an edited booking never
/// collides with its own stored version. Stored records with an empty or
/// inverted range occupy no nights and never conflict.
pub fn find_conflict<'a, I>(
    candidate: &Candidate,
    existing: I,
    exclude: Option<Ulid>,
) -> Result<Option<&'a Booking>, BookingError>
where
    I: IntoIterator<Item = &'a Booking>,
{
    let stay = validate_candidate(candidate)?;
    let room_id = candidate.room_id.trim();
    Ok(existing.into_iter().find(|b| {
        Some(b.id) != exclude
            && b.room_id.trim() == room_id
            && b.stay().is_some_and(|other| stay.overlaps(&other))
    }))
}

/// Whether the candidate would double-book its room.
pub fn has_conflict<'a, I>(
    candidate: &Candidate,
    existing: I,
    exclude: Option<Ulid>,
) -> Result<bool, BookingError>
where
    I: IntoIterator<Item = &'a Booking>,
{
    find_conflict(candidate, existing, exclude).map(|b| b.is_some())
}

/// Ledger-side limits on top of `validate_candidate`.
pub(crate) fn validate_stay(stay: &Stay) -> Result<(), BookingError> {
    use crate::limits::*;
    let years = MIN_VALID_YEAR..=MAX_VALID_YEAR;
    if !years.contains(&stay.check_in.year()) || !years.contains(&stay.check_out.year()) {
        return Err(BookingError::LimitExceeded("date out of range"));
    }
    if stay.nights() > MAX_STAY_NIGHTS {
        return Err(BookingError::LimitExceeded("stay too long"));
    }
    Ok(())
}

pub(crate) fn validate_draft(draft: &BookingDraft) -> Result<Stay, BookingError> {
    use crate::limits::*;
    let stay = validate_candidate(&draft.candidate())?;
    validate_stay(&stay)?;
    if draft.room_id.trim().len() > MAX_ROOM_ID_LEN {
        return Err(BookingError::LimitExceeded("room id too long"));
    }
    if draft.guest_name.len() > MAX_GUEST_NAME_LEN {
        return Err(BookingError::LimitExceeded("guest name too long"));
    }
    if draft.guests == 0 || draft.guests > MAX_GUESTS_PER_BOOKING {
        return Err(BookingError::LimitExceeded("guest count out of range"));
    }
    Ok(stay)
}
