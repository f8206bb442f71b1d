//! Cached response entries: CRUD, FIFO eviction, and partition sweeps.
//!
//! Insertion order is the only age signal (no access tracking). Overwriting
//! an entry re-inserts it, so a refreshed response counts as the newest in
//! its partition.

use super::connection::CacheDb;
use super::hash::entry_key;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// One cached upstream response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub key: String,
    pub partition: String,
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers_json: Option<String>,
    pub body: Vec<u8>,
    pub inserted_at: String,
}

impl Entry {
    /// Build an entry ready for insertion, stamping the key and timestamp.
    pub fn new(
        partition: &str, url: &str, status: u16, content_type: Option<String>, headers_json: Option<String>,
        body: Vec<u8>,
    ) -> Self {
        Self {
            key: entry_key(partition, url),
            partition: partition.to_string(),
            url: url.to_string(),
            status,
            content_type,
            headers_json,
            body,
            inserted_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl CacheDb {
    /// Insert or replace a cached entry.
    ///
    /// A replaced entry takes a fresh position at the back of the FIFO
    /// order, matching put-overwrites-and-refreshes semantics.
    pub async fn put_entry(&self, entry: &Entry) -> Result<(), Error> {
        let entry = entry.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR REPLACE INTO entries (
                        key, partition, url, status, content_type, headers_json, body, inserted_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        &entry.key,
                        &entry.partition,
                        &entry.url,
                        entry.status as i64,
                        &entry.content_type,
                        &entry.headers_json,
                        &entry.body,
                        &entry.inserted_at,
                    ],
                )
                .map_err(Error::from)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get a cached entry by partition and URL.
    ///
    /// Returns None if the URL has no entry in that partition.
    pub async fn get_entry(&self, partition: &str, url: &str) -> Result<Option<Entry>, Error> {
        let key = entry_key(partition, url);
        self.conn
            .call(move |conn| -> Result<Option<Entry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key, partition, url, status, content_type, headers_json, body, inserted_at
                     FROM entries WHERE key = ?1",
                )?;

                let result = stmt.query_row(params![key], |row| {
                    Ok(Entry {
                        key: row.get(0)?,
                        partition: row.get(1)?,
                        url: row.get(2)?,
                        status: row.get::<_, i64>(3)? as u16,
                        content_type: row.get(4)?,
                        headers_json: row.get(5)?,
                        body: row.get(6)?,
                        inserted_at: row.get(7)?,
                    })
                });

                match result {
                    Ok(e) => Ok(Some(e)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Count entries in a partition.
    pub async fn count_entries(&self, partition: &str) -> Result<u64, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM entries WHERE partition = ?1",
                    params![partition],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// List the URLs in a partition, oldest insertion first.
    pub async fn urls_in_partition(&self, partition: &str) -> Result<Vec<String>, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT url FROM entries WHERE partition = ?1 ORDER BY inserted_at ASC, rowid ASC",
                )?;
                let urls = stmt
                    .query_map(params![partition], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete the n oldest-inserted entries of a partition.
    ///
    /// Returns the number of deleted entries.
    pub async fn evict_oldest(&self, partition: &str, n: u64) -> Result<u64, Error> {
        if n == 0 {
            return Ok(0);
        }
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let deleted = conn.execute(
                    "DELETE FROM entries WHERE key IN (
                        SELECT key FROM entries WHERE partition = ?1
                        ORDER BY inserted_at ASC, rowid ASC LIMIT ?2
                    )",
                    params![partition, n as i64],
                )?;
                Ok(deleted as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Evict until one more insert fits under `cap`.
    ///
    /// If the partition already holds `cap` or more entries, the oldest
    /// `len - cap + 1` are deleted so the partition stays at `cap` after
    /// the pending insert. Returns the number of deleted entries.
    pub async fn make_room(&self, partition: &str, cap: u64) -> Result<u64, Error> {
        let len = self.count_entries(partition).await?;
        if len < cap {
            return Ok(0);
        }
        self.evict_oldest(partition, len - cap + 1).await
    }

    /// Trim a partition down to at most `max` entries, oldest first.
    ///
    /// Returns the number of deleted entries.
    pub async fn trim_to(&self, partition: &str, max: u64) -> Result<u64, Error> {
        let len = self.count_entries(partition).await?;
        if len <= max {
            return Ok(0);
        }
        self.evict_oldest(partition, len - max).await
    }

    /// List all partition names that currently hold entries.
    pub async fn list_partitions(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT DISTINCT partition FROM entries ORDER BY partition")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every entry of one partition.
    ///
    /// Returns the number of deleted entries.
    pub async fn delete_partition(&self, partition: &str) -> Result<u64, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let deleted = conn.execute("DELETE FROM entries WHERE partition = ?1", params![partition])?;
                Ok(deleted as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every entry whose partition name lacks the version token.
    ///
    /// Run at activation so a version bump retires all old partitions in
    /// one sweep. Returns the number of deleted entries.
    pub async fn purge_stale_partitions(&self, version: &str) -> Result<u64, Error> {
        let version = version.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let deleted = conn.execute(
                    "DELETE FROM entries WHERE instr(partition, ?1) = 0",
                    params![version],
                )?;
                Ok(deleted as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete everything in every partition.
    ///
    /// Returns the number of deleted entries.
    pub async fn clear_all(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let deleted = conn.execute("DELETE FROM entries", [])?;
                Ok(deleted as u64)
            })
            .await
            .map_err(Error::from)
    }
}
