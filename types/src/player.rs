use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Run of zeros marking an identifier the game server has not resolved yet.
pub const PLACEHOLDER_RUN: &str = "00000000";

pub fn is_placeholder_id(id: &str) -> bool {
    id.contains(PLACEHOLDER_RUN)
}

/// A player as persisted in the registry, keyed by `player_uid`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerRecord {
    pub player_uid: String,
    pub steam_id: String,
    pub nickname: String,
    pub ip: String,
    pub ping: f64,
    pub location_x: f64,
    pub location_y: f64,
    pub level: i32,
    pub exp: i64,
    pub hp: i64,
    pub max_hp: i64,
    pub shield_hp: i64,
    pub shield_max_hp: i64,
    pub full_stomach: f64,
    pub last_online: DateTime<Utc>,
    pub save_last_online: String,
    pub pals: Vec<serde_json::Value>,
    pub items: Option<serde_json::Value>,
}

/// Live view of a connected player, as reported by the server probe.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnlinePlayer {
    pub player_uid: String,
    pub steam_id: String,
    pub nickname: String,
    pub ip: String,
    pub ping: f64,
    pub location_x: f64,
    pub location_y: f64,
    pub level: i32,
}

/// Listing projection of [`PlayerRecord`] without the save payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TersePlayer {
    pub player_uid: String,
    pub steam_id: String,
    pub nickname: String,
    pub ip: String,
    pub ping: f64,
    pub location_x: f64,
    pub location_y: f64,
    pub level: i32,
    pub exp: i64,
    pub hp: i64,
    pub max_hp: i64,
    pub shield_hp: i64,
    pub shield_max_hp: i64,
    pub full_stomach: f64,
    pub last_online: DateTime<Utc>,
}

impl From<&PlayerRecord> for TersePlayer {
    fn from(value: &PlayerRecord) -> Self {
        Self {
            player_uid: value.player_uid.clone(),
            steam_id: value.steam_id.clone(),
            nickname: value.nickname.clone(),
            ip: value.ip.clone(),
            ping: value.ping,
            location_x: value.location_x,
            location_y: value.location_y,
            level: value.level,
            exp: value.exp,
            hp: value.hp,
            max_hp: value.max_hp,
            shield_hp: value.shield_hp,
            shield_max_hp: value.shield_max_hp,
            full_stomach: value.full_stomach,
            last_online: value.last_online,
        }
    }
}

impl From<&OnlinePlayer> for PlayerRecord {
    /// First sighting through the online probe only knows who the player is.
    fn from(value: &OnlinePlayer) -> Self {
        Self {
            player_uid: value.player_uid.clone(),
            steam_id: value.steam_id.clone(),
            nickname: value.nickname.clone(),
            ..Default::default()
        }
    }
}

impl PlayerRecord {
    pub fn new(player_uid: &str, steam_id: &str, nickname: &str) -> Self {
        Self {
            player_uid: player_uid.to_string(),
            steam_id: steam_id.to_string(),
            nickname: nickname.to_string(),
            ..Default::default()
        }
    }

    /// Reasons this record can't be written: it needs a key, and JSON has
    /// no representation for NaN or infinite floats.
    pub fn check_storable(&self) -> Result<(), String> {
        if self.player_uid.is_empty() {
            return Err("player uid must not be empty".to_string());
        }
        let floats = [
            ("ping", self.ping),
            ("location_x", self.location_x),
            ("location_y", self.location_y),
            ("full_stomach", self.full_stomach),
        ];
        match floats.iter().find(|(_, value)| !value.is_finite()) {
            Some((field, value)) => Err(format!(
                "{field} of player {} is not finite: {value}",
                self.player_uid
            )),
            None => Ok(()),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        is_placeholder_id(&self.player_uid)
    }

    /// Roster scans don't see session state, so the stored session fields
    /// survive, as does a known steam id when the scan has none.
    pub fn carry_forward(&mut self, previous: &PlayerRecord) {
        if self.steam_id.is_empty() {
            self.steam_id = previous.steam_id.clone();
        }
        self.ip = previous.ip.clone();
        self.ping = previous.ping;
        self.location_x = previous.location_x;
        self.location_y = previous.location_y;
    }

    /// Copies `save_last_online` into `last_online`. An empty value is a
    /// no-op; a malformed one is returned as an error and leaves the record
    /// untouched.
    pub fn resolve_save_last_online(&mut self) -> Result<bool, chrono::ParseError> {
        if self.save_last_online.is_empty() {
            return Ok(false);
        }
        let parsed = DateTime::parse_from_rfc3339(&self.save_last_online)?;
        self.last_online = parsed.with_timezone(&Utc);
        Ok(true)
    }

    /// Folds a live observation into the stored record. The stored steam id
    /// is only replaced while it is still unresolved.
    pub fn apply_online(&mut self, snapshot: &OnlinePlayer, now: DateTime<Utc>) {
        if self.steam_id.is_empty() || is_placeholder_id(&self.steam_id) {
            self.steam_id = snapshot.steam_id.clone();
        }
        self.ip = snapshot.ip.clone();
        self.ping = snapshot.ping;
        self.location_x = snapshot.location_x;
        self.location_y = snapshot.location_y;
        self.level = snapshot.level;
        self.last_online = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn online(uid: &str, steam_id: &str) -> OnlinePlayer {
        OnlinePlayer {
            player_uid: uid.to_string(),
            steam_id: steam_id.to_string(),
            nickname: "Lamball".to_string(),
            ip: "10.0.0.7".to_string(),
            ping: 42.5,
            location_x: 100.0,
            location_y: -250.0,
            level: 12,
        }
    }

    #[test]
    fn test_placeholder_detection() {
        assert!(is_placeholder_id("76500000000001"));
        assert!(is_placeholder_id("00000000"));
        assert!(!is_placeholder_id("76561100000002"));
        assert!(!is_placeholder_id(""));
    }

    #[test]
    fn test_carry_forward_keeps_session_fields() {
        let mut previous = PlayerRecord::new("A1", "76561198000000001", "Old");
        previous.ip = "1.1.1.1".to_string();
        previous.ping = 30.0;
        previous.location_x = 5.0;
        previous.location_y = 6.0;

        let mut incoming = PlayerRecord::new("A1", "", "New");
        incoming.ip = "2.2.2.2".to_string();
        incoming.level = 20;
        incoming.carry_forward(&previous);

        assert_eq!(incoming.ip, "1.1.1.1");
        assert_eq!(incoming.ping, 30.0);
        assert_eq!(incoming.location_x, 5.0);
        assert_eq!(incoming.location_y, 6.0);
        assert_eq!(incoming.steam_id, "76561198000000001");
        assert_eq!(incoming.nickname, "New");
        assert_eq!(incoming.level, 20);
    }

    #[test]
    fn test_carry_forward_prefers_incoming_steam_id() {
        let previous = PlayerRecord::new("A1", "111", "Old");
        let mut incoming = PlayerRecord::new("A1", "222", "New");
        incoming.carry_forward(&previous);
        assert_eq!(incoming.steam_id, "222");
    }

    #[test]
    fn test_resolve_save_last_online() {
        let mut record = PlayerRecord::new("A1", "", "Anubis");
        record.save_last_online = "2024-02-01T10:30:00+08:00".to_string();
        assert!(record.resolve_save_last_online().unwrap());
        assert_eq!(
            record.last_online,
            Utc.with_ymd_and_hms(2024, 2, 1, 2, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_resolve_save_last_online_ignores_empty_and_rejects_garbage() {
        let mut record = PlayerRecord::new("A1", "", "Anubis");
        assert!(!record.resolve_save_last_online().unwrap());
        assert_eq!(record.last_online, DateTime::<Utc>::default());

        record.save_last_online = "yesterday".to_string();
        assert!(record.resolve_save_last_online().is_err());
        assert_eq!(record.last_online, DateTime::<Utc>::default());
    }

    #[test]
    fn test_apply_online_upgrades_placeholder_steam_id() {
        let mut record = PlayerRecord::new("A1", "76500000000001", "Anubis");
        let now = Utc::now();
        record.apply_online(&online("A1", "76561100000002"), now);

        assert_eq!(record.steam_id, "76561100000002");
        assert_eq!(record.ip, "10.0.0.7");
        assert_eq!(record.level, 12);
        assert_eq!(record.last_online, now);
        assert_eq!(record.nickname, "Anubis");
    }

    #[test]
    fn test_apply_online_keeps_resolved_steam_id() {
        let mut record = PlayerRecord::new("A1", "76561100000002", "Anubis");
        record.apply_online(&online("A1", "76561100000009"), Utc::now());
        assert_eq!(record.steam_id, "76561100000002");
    }

    #[test]
    fn test_check_storable() {
        let mut record = PlayerRecord::new("A1", "", "Anubis");
        assert!(record.check_storable().is_ok());

        record.location_y = f64::INFINITY;
        let err = record.check_storable().unwrap_err();
        assert!(err.contains("location_y"));

        record.location_y = 0.0;
        record.ping = f64::NAN;
        assert!(record.check_storable().unwrap_err().contains("ping"));

        assert!(PlayerRecord::new("", "765611", "Anubis")
            .check_storable()
            .is_err());
    }

    #[test]
    fn test_record_from_online_is_minimal() {
        let record = PlayerRecord::from(&online("A1", "765611"));
        assert_eq!(record.player_uid, "A1");
        assert_eq!(record.steam_id, "765611");
        assert_eq!(record.nickname, "Lamball");
        assert!(record.ip.is_empty());
        assert_eq!(record.level, 0);
    }

    #[test]
    fn test_terse_player_drops_save_payload() {
        let mut record = PlayerRecord::new("A1", "765611", "Anubis");
        record.pals = vec![serde_json::json!({"type": "Lamball"})];
        record.items = Some(serde_json::json!({"common": []}));
        record.save_last_online = "2024-02-01T10:30:00Z".to_string();

        let json = serde_json::to_value(TersePlayer::from(&record)).unwrap();
        assert!(json.get("pals").is_none());
        assert!(json.get("items").is_none());
        assert!(json.get("save_last_online").is_none());
        assert_eq!(json["nickname"], "Anubis");
    }

    #[test]
    fn test_terse_player_deserializes_from_full_record() {
        let mut record = PlayerRecord::new("A1", "765611", "Anubis");
        record.pals = vec![serde_json::json!({"type": "Foxparks"})];
        let stored = serde_json::to_string(&record).unwrap();

        let terse: TersePlayer = serde_json::from_str(&stored).unwrap();
        assert_eq!(terse, TersePlayer::from(&record));
    }
}
