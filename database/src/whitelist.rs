use types::WhitelistEntry;

use crate::store::{Store, Txn, WHITELIST_BUCKET};
use crate::DatabaseError;

/// Admission list. Entries are matched by [`WhitelistEntry::same_player`],
/// so a player can be found (or removed) knowing only one identifier. Two
/// players sharing a name are indistinguishable to this store.
pub struct WhitelistRepository {
    store: Store,
}

/// Key of the first stored entry `probe` identifies.
async fn find_key(
    txn: &mut Txn,
    probe: &WhitelistEntry,
) -> Result<Option<(String, WhitelistEntry)>, DatabaseError> {
    for (key, value) in txn.entries(WHITELIST_BUCKET).await? {
        let stored: WhitelistEntry = serde_json::from_str(&value)?;
        if probe.same_player(&stored) {
            return Ok(Some((key, stored)));
        }
    }
    Ok(None)
}

impl WhitelistRepository {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Updates the entry `entry` identifies in place, or stores it under its
    /// `name|steam_id|player_uid` key. A name alone is enough here.
    pub async fn add_or_update(&self, entry: &WhitelistEntry) -> Result<(), DatabaseError> {
        if entry.is_blank() {
            tracing::warn!("Rejected whitelist entry without any identifier");
            return Err(DatabaseError::InvalidEntry(
                "whitelist entry needs a name, steam id or player uid".to_string(),
            ));
        }

        let mut txn = self.store.update().await?;
        txn.create_bucket_if_missing(WHITELIST_BUCKET).await?;

        let key = match find_key(&mut txn, entry).await? {
            Some((key, stored)) => {
                tracing::debug!("Updating whitelist entry {} (was {})", key, stored);
                key
            }
            None => entry.composite_key(),
        };
        txn.put_json(WHITELIST_BUCKET, &key, entry).await?;

        txn.commit().await
    }

    pub async fn remove(&self, entry: &WhitelistEntry) -> Result<(), DatabaseError> {
        let mut txn = self.store.update().await?;
        if !txn.bucket_exists(WHITELIST_BUCKET).await? {
            return Err(DatabaseError::BucketMissing(WHITELIST_BUCKET.to_string()));
        }

        let (key, _) = find_key(&mut txn, entry)
            .await?
            .ok_or_else(|| DatabaseError::WhitelistEntryNotFound(entry.to_string()))?;
        txn.delete(WHITELIST_BUCKET, &key).await?;

        txn.commit().await
    }

    /// Every entry in key order; empty before the first write.
    pub async fn list(&self) -> Result<Vec<WhitelistEntry>, DatabaseError> {
        let mut txn = self.store.view().await?;
        let mut entries = Vec::new();
        for (_, value) in txn.entries(WHITELIST_BUCKET).await? {
            entries.push(serde_json::from_str(&value)?);
        }
        Ok(entries)
    }

    pub async fn find(&self, probe: &WhitelistEntry) -> Result<Option<WhitelistEntry>, DatabaseError> {
        let mut txn = self.store.view().await?;
        Ok(find_key(&mut txn, probe).await?.map(|(_, stored)| stored))
    }

    /// Replaces the whole whitelist. Entries are keyed by player uid, else
    /// steam id; entries with neither are skipped.
    pub async fn replace_all(&self, entries: &[WhitelistEntry]) -> Result<(), DatabaseError> {
        let mut txn = self.store.update().await?;
        txn.create_bucket_if_missing(WHITELIST_BUCKET).await?;
        txn.clear_bucket(WHITELIST_BUCKET).await?;

        let mut skipped = 0;
        for entry in entries {
            match entry.bulk_key() {
                Some(key) => txn.put_json(WHITELIST_BUCKET, key, entry).await?,
                None => skipped += 1,
            }
        }

        txn.commit().await?;
        tracing::info!(
            "Whitelist replaced with {} entries ({} without uid or steam id skipped)",
            entries.len() - skipped,
            skipped
        );
        Ok(())
    }
}
