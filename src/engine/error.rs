use chrono::NaiveDate;
use ulid::Ulid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// Empty or missing room id on the candidate.
    InvalidResource,
    /// `check_in >= check_out` on the candidate.
    InvalidRange {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },
    InvalidDate(String),
    /// The candidate intersects this existing booking.
    Conflict(Ulid),
    NotFound(Ulid),
    UnknownRoom(String),
    Forbidden,
    LimitExceeded(&'static str),
    Snapshot(String),
}

impl BookingError {
    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            BookingError::InvalidResource => "invalid_resource",
            BookingError::InvalidRange { .. } => "invalid_range",
            BookingError::InvalidDate(_) => "invalid_date",
            BookingError::Conflict(_) => "conflict",
            BookingError::NotFound(_) => "not_found",
            BookingError::UnknownRoom(_) => "unknown_room",
            BookingError::Forbidden => "forbidden",
            BookingError::LimitExceeded(_) => "limit_exceeded",
            BookingError::Snapshot(_) => "snapshot",
        }
    }
}

impl std::fmt::Display for BookingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingError::InvalidResource => write!(f, "room is required"),
            BookingError::InvalidRange {
                check_in,
                check_out,
            } => write!(
                f,
                "check-out {check_out} must be after check-in {check_in}"
            ),
            BookingError::InvalidDate(raw) => {
                write!(f, "invalid date {raw:?}: expected YYYY-MM-DD")
            }
            BookingError::Conflict(id) => {
                write!(f, "room already booked during selected dates (booking {id})")
            }
            BookingError::NotFound(id) => write!(f, "booking not found: {id}"),
            BookingError::UnknownRoom(room) => write!(f, "unknown room: {room}"),
            BookingError::Forbidden => write!(f, "only the administrator may delete bookings"),
            BookingError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            BookingError::Snapshot(e) => write!(f, "snapshot error: {e}"),
        }
    }
}

impl std::error::Error for BookingError {}
