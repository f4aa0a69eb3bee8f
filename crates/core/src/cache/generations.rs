//! Named store management: open, enumerate, delete, and the persisted
//! pointer to the generation currently serving requests.

use super::connection::CacheDb;
use super::store::CacheStore;
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

impl CacheDb {
    /// Handle to the store named `name` without creating it.
    ///
    /// Reads through a handle to a missing store miss; writes fail.
    pub fn store(&self, name: &str) -> CacheStore {
        CacheStore::new(self.clone(), name)
    }

    /// Open the store named `name`, creating it if needed.
    pub async fn open_store(&self, name: &str) -> Result<CacheStore, Error> {
        if name.is_empty() {
            return Err(Error::InvalidInput("store name cannot be empty".into()));
        }

        let owned = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO cache_stores (name, created_at) VALUES (?1, ?2)",
                    params![owned, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(CacheStore::new(self.clone(), name))
    }

    /// Check whether a store with this name exists.
    pub async fn has_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM cache_stores WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// List all store names, oldest first.
    pub async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM cache_stores ORDER BY created_at, name")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a store and every entry in it.
    ///
    /// Returns whether a store by that name existed.
    pub async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM cache_entries WHERE store = ?1", params![name])?;
                let count = tx.execute("DELETE FROM cache_stores WHERE name = ?1", params![name])?;
                tx.commit()?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Generation recorded as current by the last successful activation.
    pub async fn current_generation(&self) -> Result<Option<String>, Error> {
        self.conn
            .call(|conn| -> Result<Option<String>, Error> {
                let result =
                    conn.query_row("SELECT current_generation FROM worker_state WHERE id = 1", [], |row| row.get(0));
                match result {
                    Ok(name) => Ok(Some(name)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Record `name` as the current generation.
    pub async fn set_current_generation(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO worker_state (id, current_generation, activated_at) VALUES (1, ?1, ?2)
                     ON CONFLICT(id) DO UPDATE SET
                        current_generation = excluded.current_generation,
                        activated_at = excluded.activated_at",
                    params![name, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RequestKey, ResponseSnapshot};
    use url::Url;

    #[tokio::test]
    async fn test_open_store_is_idempotent() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_store("v1").await.unwrap();
        db.open_store("v1").await.unwrap();
        assert_eq!(db.store_names().await.unwrap(), vec!["v1".to_string()]);
    }

    #[tokio::test]
    async fn test_open_store_empty_name() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(matches!(db.open_store("").await, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_delete_store_removes_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let v5 = db.open_store("v5").await.unwrap();
        let key = RequestKey::get(Url::parse("https://app.test/a.json").unwrap());
        v5.put(&key, &ResponseSnapshot::new(200, vec![], "a")).await.unwrap();

        assert!(db.delete_store("v5").await.unwrap());
        assert!(!db.has_store("v5").await.unwrap());
        assert!(!db.delete_store("v5").await.unwrap());

        // The handle outlived its store; reads miss and writes are refused.
        assert!(v5.get(&key).await.unwrap().is_none());
        assert!(v5.put(&key, &ResponseSnapshot::new(200, vec![], "a")).await.is_err());
    }

    #[tokio::test]
    async fn test_current_generation_roundtrip() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert_eq!(db.current_generation().await.unwrap(), None);

        db.set_current_generation("v5").await.unwrap();
        db.set_current_generation("v6").await.unwrap();
        assert_eq!(db.current_generation().await.unwrap(), Some("v6".to_string()));
    }
}
