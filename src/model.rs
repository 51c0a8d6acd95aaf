use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use ulid::Ulid;

/// Half-open stay `[check_in, check_out)`. The check-out day is free for the next guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stay {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl Stay {
    /// Returns `None` for zero- or negative-length stays.
    pub fn try_new(check_in: NaiveDate, check_out: NaiveDate) -> Option<Self> {
        (check_in < check_out).then_some(Self { check_in, check_out })
    }

    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    pub fn overlaps(&self, other: &Stay) -> bool {
        self.check_in < other.check_out && self.check_out > other.check_in
    }
}

fn default_guests() -> u32 {
    1
}

/// A stored booking. Field names follow the hosted store's camelCase records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(deserialize_with = "deserialize_booking_id")]
    pub id: Ulid,
    #[serde(deserialize_with = "deserialize_room_id")]
    pub room_id: String,
    #[serde(deserialize_with = "deserialize_date")]
    pub check_in: NaiveDate,
    #[serde(deserialize_with = "deserialize_date")]
    pub check_out: NaiveDate,
    #[serde(default)]
    pub guest_name: String,
    #[serde(default = "default_guests")]
    pub guests: u32,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub advance: f64,
}

impl Booking {
    /// The occupied nights, or `None` if the record carries an empty or inverted range.
    pub fn stay(&self) -> Option<Stay> {
        Stay::try_new(self.check_in, self.check_out)
    }

    pub fn balance_due(&self) -> f64 {
        self.amount - self.advance
    }
}

/// Older records use the creation timestamp in milliseconds as their id.
fn deserialize_booking_id<'de, D>(deserializer: D) -> Result<Ulid, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(n) => Ok(Ulid::from(n as u128)),
        RawId::Text(s) => parse_booking_id(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid booking id {s:?}"))),
    }
}

fn deserialize_room_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw.trim().to_string())
}

/// Stored dates go through the same strict `YYYY-MM-DD` parse as form input.
fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    crate::engine::parse_date(&raw).map_err(serde::de::Error::custom)
}

/// Parse a booking id given as a ULID or a legacy numeric timestamp.
pub fn parse_booking_id(raw: &str) -> Option<Ulid> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<u64>() {
        return Some(Ulid::from(n as u128));
    }
    Ulid::from_string(raw).ok()
}

/// The triple the overlap checker decides on. Not validated on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub room_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl Candidate {
    pub fn new(room_id: impl Into<String>, check_in: NaiveDate, check_out: NaiveDate) -> Self {
        Self {
            room_id: room_id.into(),
            check_in,
            check_out,
        }
    }
}

/// Booking form contents submitted for creation or edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDraft {
    pub room_id: String,
    #[serde(deserialize_with = "deserialize_date")]
    pub check_in: NaiveDate,
    #[serde(deserialize_with = "deserialize_date")]
    pub check_out: NaiveDate,
    #[serde(default)]
    pub guest_name: String,
    #[serde(default = "default_guests")]
    pub guests: u32,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub advance: f64,
}

impl BookingDraft {
    pub fn candidate(&self) -> Candidate {
        Candidate::new(self.room_id.trim(), self.check_in, self.check_out)
    }

    pub(crate) fn into_booking(self, id: Ulid) -> Booking {
        Booking {
            id,
            room_id: self.room_id.trim().to_string(),
            check_in: self.check_in,
            check_out: self.check_out,
            guest_name: self.guest_name.trim().to_string(),
            guests: self.guests,
            amount: self.amount,
            advance: self.advance,
        }
    }
}

/// Bookings list filter: exact room plus case-insensitive guest-name substring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingFilter {
    pub room_id: Option<String>,
    pub guest: Option<String>,
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking) -> bool {
        if let Some(room) = self.room_id.as_deref().map(str::trim)
            && !room.is_empty()
            && booking.room_id.trim() != room
        {
            return false;
        }
        if let Some(guest) = self.guest.as_deref()
            && !guest.is_empty()
        {
            return booking
                .guest_name
                .to_lowercase()
                .contains(&guest.to_lowercase());
        }
        true
    }
}

/// All bookings for one room, sorted by `check_in`.
#[derive(Debug, Clone)]
pub struct RoomState {
    pub room_id: String,
    pub bookings: Vec<Booking>,
}

impl RoomState {
    pub fn new(room_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            bookings: Vec::new(),
        }
    }

    pub fn insert_booking(&mut self, booking: Booking) {
        let pos = self
            .bookings
            .partition_point(|b| b.check_in <= booking.check_in);
        self.bookings.insert(pos, booking);
    }

    pub fn remove_booking(&mut self, id: Ulid) -> Option<Booking> {
        let pos = self.bookings.iter().position(|b| b.id == id)?;
        Some(self.bookings.remove(pos))
    }

    /// Bookings whose nights intersect `query`.
    /// Binary search skips everything checking in on or after `query.check_out`.
    pub fn overlapping(&self, query: &Stay) -> impl Iterator<Item = &Booking> {
        let right_bound = self
            .bookings
            .partition_point(|b| b.check_in < query.check_out);
        self.bookings[..right_bound]
            .iter()
            .filter(move |b| b.check_out > query.check_in)
    }
}

/// Change feed record, published after every successful ledger mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    BookingCreated(Booking),
    BookingUpdated { previous_room: String, booking: Booking },
    BookingDeleted { id: Ulid, room_id: String },
}

impl Event {
    pub fn room_id(&self) -> &str {
        match self {
            Event::BookingCreated(b) | Event::BookingUpdated { booking: b, .. } => &b.room_id,
            Event::BookingDeleted { room_id, .. } => room_id,
        }
    }
}

// ── Query result types ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomSummary {
    pub room_id: String,
    pub bookings: usize,
    pub nights: i64,
    pub amount: f64,
    pub advance: f64,
    pub balance_due: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LedgerSummary {
    pub rooms: Vec<RoomSummary>,
    pub total_amount: f64,
    pub total_advance: f64,
    pub total_balance_due: f64,
}
