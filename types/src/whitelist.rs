use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::player::OnlinePlayer;

/// A player allowed onto the server. Any field may be blank; whichever
/// identifiers are present are used to recognise the player.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhitelistEntry {
    pub name: String,
    pub steam_id: String,
    pub player_uid: String,
}

impl Display for WhitelistEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "name={:?} steam_id={:?} player_uid={:?}",
            self.name, self.steam_id, self.player_uid
        )
    }
}

impl WhitelistEntry {
    pub fn new(name: &str, steam_id: &str, player_uid: &str) -> Self {
        Self {
            name: name.to_string(),
            steam_id: steam_id.to_string(),
            player_uid: player_uid.to_string(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.name.is_empty() && self.steam_id.is_empty() && self.player_uid.is_empty()
    }

    /// True when any identifier set on `self` equals the same identifier on
    /// `stored`, checked uid, then name, then steam id.
    ///
    /// This is an OR across fields: two different players who share a display
    /// name are treated as one.
    pub fn same_player(&self, stored: &WhitelistEntry) -> bool {
        [
            (&self.player_uid, &stored.player_uid),
            (&self.name, &stored.name),
            (&self.steam_id, &stored.steam_id),
        ]
        .into_iter()
        .any(|(wanted, have)| !wanted.is_empty() && wanted == have)
    }

    /// Key used when a new entry is added one at a time.
    pub fn composite_key(&self) -> String {
        format!("{}|{}|{}", self.name, self.steam_id, self.player_uid)
    }

    /// Key used by bulk replacement. Entries carrying only a name have none
    /// and are dropped by that path, unlike [`WhitelistEntry::composite_key`].
    pub fn bulk_key(&self) -> Option<&str> {
        [&self.player_uid, &self.steam_id]
            .into_iter()
            .find(|id| !id.is_empty())
            .map(String::as_str)
    }

    pub fn admits(&self, player: &OnlinePlayer) -> bool {
        (!player.player_uid.is_empty() && player.player_uid == self.player_uid)
            || (!player.steam_id.is_empty() && player.steam_id == self.steam_id)
    }
}

/// Online players that no whitelist entry admits.
pub fn unlisted_players<'a>(
    online: &'a [OnlinePlayer],
    whitelist: &[WhitelistEntry],
) -> Vec<&'a OnlinePlayer> {
    online
        .iter()
        .filter(|player| !whitelist.iter().any(|entry| entry.admits(player)))
        .collect()
}
