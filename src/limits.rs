pub const MAX_ROOM_ID_LEN: usize = 64;
pub const MAX_GUEST_NAME_LEN: usize = 256;
pub const MAX_GUESTS_PER_BOOKING: u32 = 64;
pub const MAX_BOOKINGS_PER_ROOM: usize = 100_000;
pub const MAX_ROOMS: usize = 10_000;

/// Longest stay accepted, in nights.
pub const MAX_STAY_NIGHTS: i64 = 366;

/// Dates outside [MIN_VALID_YEAR, MAX_VALID_YEAR] are treated as typos.
pub const MIN_VALID_YEAR: i32 = 2000;
pub const MAX_VALID_YEAR: i32 = 2200;
