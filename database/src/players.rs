use std::collections::{HashMap, HashSet};

use chrono::Utc;
use types::{is_placeholder_id, OnlinePlayer, PlayerRecord, TersePlayer};

use crate::store::{Store, PLAYERS_BUCKET};
use crate::DatabaseError;

pub struct PlayerRepository {
    store: Store,
}

impl PlayerRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Synchronizes the registry with a complete roster: the stored key set
    /// ends up equal to the roster's uids. Session fields (ip, ping, location)
    /// are kept from the stored record because a roster scan cannot see them.
    ///
    /// A record with an empty uid or a non-finite float fails the whole call
    /// with [`DatabaseError::InvalidRecord`] and nothing is written.
    pub async fn replace_roster(&self, players: &[PlayerRecord]) -> Result<(), DatabaseError> {
        let mut txn = self.store.update().await?;

        let mut existing = HashMap::new();
        for (key, value) in txn.entries(PLAYERS_BUCKET).await? {
            let record: PlayerRecord = serde_json::from_str(&value)?;
            existing.insert(key, record);
        }

        let incoming: HashSet<&str> = players.iter().map(|p| p.player_uid.as_str()).collect();

        for player in players {
            let mut record = player.clone();
            if let Some(previous) = existing.get(&record.player_uid) {
                record.carry_forward(previous);
                tracing::debug!("Merged roster entry for {}", record.player_uid);
            }
            if let Err(e) = record.resolve_save_last_online() {
                tracing::debug!(
                    "Ignoring save_last_online {:?} for {}: {}",
                    record.save_last_online,
                    record.player_uid,
                    DatabaseError::from(e)
                );
            }
            record.check_storable().map_err(DatabaseError::InvalidRecord)?;
            txn.put_json(PLAYERS_BUCKET, &record.player_uid, &record)
                .await?;
        }

        let mut removed = 0;
        for key in existing.keys() {
            if !incoming.contains(key.as_str()) {
                txn.delete(PLAYERS_BUCKET, key).await?;
                removed += 1;
            }
        }

        txn.commit().await?;
        tracing::info!(
            "Roster synchronized: {} players written, {} removed",
            players.len(),
            removed
        );
        Ok(())
    }

    /// Records what the live probe saw. Players are created on first sight and
    /// nothing is ever deleted here. Invalid snapshots are rejected the same
    /// way as in [`PlayerRepository::replace_roster`].
    pub async fn apply_online(&self, snapshots: &[OnlinePlayer]) -> Result<(), DatabaseError> {
        let mut txn = self.store.update().await?;
        let now = Utc::now();

        for snapshot in snapshots {
            if snapshot.player_uid.is_empty() {
                return Err(DatabaseError::InvalidRecord(
                    "player uid must not be empty".to_string(),
                ));
            }
            let mut record = match txn
                .get_json::<PlayerRecord>(PLAYERS_BUCKET, &snapshot.player_uid)
                .await?
            {
                Some(record) => record,
                None => {
                    tracing::debug!("First sighting of {} online", snapshot.player_uid);
                    PlayerRecord::from(snapshot)
                }
            };
            record.apply_online(snapshot, now);
            record.check_storable().map_err(DatabaseError::InvalidRecord)?;
            txn.put_json(PLAYERS_BUCKET, &snapshot.player_uid, &record)
                .await?;
        }

        txn.commit().await
    }

    /// Every player except unresolved placeholder entries, in key order.
    pub async fn list_players(&self) -> Result<Vec<TersePlayer>, DatabaseError> {
        let mut txn = self.store.view().await?;
        let mut players = Vec::new();
        for (key, value) in txn.entries(PLAYERS_BUCKET).await? {
            if is_placeholder_id(&key) {
                continue;
            }
            players.push(serde_json::from_str(&value)?);
        }
        Ok(players)
    }

    pub async fn get_player(&self, player_uid: &str) -> Result<PlayerRecord, DatabaseError> {
        let mut txn = self.store.view().await?;
        txn.get_json(PLAYERS_BUCKET, player_uid)
            .await?
            .ok_or_else(|| DatabaseError::PlayerNotFound(player_uid.to_string()))
    }
}
