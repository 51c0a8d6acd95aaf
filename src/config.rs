pub const DEFAULT_ROOMS: &[&str] = &["101", "102", "103", "104", "105", "conference"];

/// Runtime configuration, read from `INNKEEP_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Identity allowed to delete bookings. `None` means nobody may.
    pub admin_id: Option<String>,
    /// Bookable rooms and facilities. Empty accepts any room id.
    pub rooms: Vec<String>,
    pub metrics_port: Option<u16>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            admin_id: None,
            rooms: DEFAULT_ROOMS.iter().map(|r| r.to_string()).collect(),
            metrics_port: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let rooms = get("INNKEEP_ROOMS")
            .map(|v| parse_rooms(&v))
            .unwrap_or(defaults.rooms);

        Self {
            admin_id: get("INNKEEP_ADMIN_ID").map(|v| v.trim().to_string()),
            rooms,
            metrics_port: get("INNKEEP_METRICS_PORT").and_then(|s| s.trim().parse().ok()),
        }
    }

    pub fn is_admin(&self, actor: &str) -> bool {
        self.admin_id.as_deref().is_some_and(|admin| admin == actor)
    }

    pub fn knows_room(&self, room_id: &str) -> bool {
        self.rooms.is_empty() || self.rooms.iter().any(|r| r == room_id)
    }
}

/// Comma-separated list; `*` alone means "any room".
fn parse_rooms(raw: &str) -> Vec<String> {
    if raw.trim() == "*" {
        return Vec::new();
    }
    raw.split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let c = config(&[]);
        assert_eq!(c, Config::default());
        assert!(c.knows_room("conference"));
        assert!(!c.knows_room("999"));
        assert!(!c.is_admin(""));
    }

    #[test]
    fn reads_admin_and_rooms() {
        let c = config(&[
            ("INNKEEP_ADMIN_ID", " uid-1 "),
            ("INNKEEP_ROOMS", "201, 202,,hall"),
            ("INNKEEP_METRICS_PORT", "9100"),
        ]);
        assert!(c.is_admin("uid-1"));
        assert!(!c.is_admin("uid-2"));
        assert_eq!(c.rooms, vec!["201", "202", "hall"]);
        assert_eq!(c.metrics_port, Some(9100));
    }

    #[test]
    fn wildcard_rooms_accepts_anything() {
        let c = config(&[("INNKEEP_ROOMS", "*")]);
        assert!(c.rooms.is_empty());
        assert!(c.knows_room("penthouse"));
    }

    #[test]
    fn bad_port_is_ignored() {
        let c = config(&[("INNKEEP_METRICS_PORT", "not-a-port")]);
        assert_eq!(c.metrics_port, None);
    }
}
