//! Entry operations within one named cache store.
//!
//! A `CacheStore` is a lightweight handle (database clone plus store name).
//! Handles are obtained per request from the lifecycle controller and are
//! not meant to outlive an activation.

use super::connection::CacheDb;
use super::key::RequestKey;
use crate::{Error, ResponseSnapshot};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;
use url::Url;

/// Handle to a single generation's entries.
#[derive(Clone, Debug)]
pub struct CacheStore {
    db: CacheDb,
    name: String,
}

/// A row ready to be written, with everything serialized up front.
struct EntryRow {
    key_hash: String,
    method: String,
    url: String,
    status: i64,
    headers_json: String,
    body: Vec<u8>,
}

impl EntryRow {
    fn encode(key: &RequestKey, snapshot: &ResponseSnapshot) -> Result<Self, Error> {
        if !key.is_get() {
            return Err(Error::InvalidInput(format!("only GET requests are cacheable: {key}")));
        }
        if !snapshot.is_success() {
            return Err(Error::InvalidInput(format!("refusing to cache status {} for {key}", snapshot.status)));
        }

        let headers_json = serde_json::to_string(&snapshot.headers)
            .map_err(|e| Error::InvalidInput(format!("failed to encode headers: {e}")))?;

        Ok(Self {
            key_hash: key.hash(),
            method: key.method().to_string(),
            url: key.url().to_string(),
            status: i64::from(snapshot.status),
            headers_json,
            body: snapshot.body.to_vec(),
        })
    }

    fn insert(&self, conn: &rusqlite::Connection, store: &str, stored_at: &str) -> Result<(), Error> {
        conn.execute(
            "INSERT INTO cache_entries (
                store, key_hash, method, url, status_code, headers_json, body, stored_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(store, key_hash) DO UPDATE SET
                status_code = excluded.status_code,
                headers_json = excluded.headers_json,
                body = excluded.body,
                stored_at = excluded.stored_at",
            params![
                store,
                &self.key_hash,
                &self.method,
                &self.url,
                self.status,
                &self.headers_json,
                &self.body,
                stored_at,
            ],
        )?;
        Ok(())
    }
}

fn decode_snapshot(status: i64, headers_json: &str, body: Vec<u8>) -> Result<ResponseSnapshot, Error> {
    let status = u16::try_from(status).map_err(|_| Error::CorruptEntry(format!("status {status} out of range")))?;
    let headers: Vec<(String, String)> =
        serde_json::from_str(headers_json).map_err(|e| Error::CorruptEntry(format!("headers: {e}")))?;
    Ok(ResponseSnapshot::new(status, headers, body))
}

impl CacheStore {
    pub(crate) fn new(db: CacheDb, name: impl Into<String>) -> Self {
        Self { db, name: name.into() }
    }

    /// Generation name this handle reads and writes.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a stored response.
    ///
    /// Returns None on a miss; a miss is not an error.
    pub async fn get(&self, key: &RequestKey) -> Result<Option<ResponseSnapshot>, Error> {
        let store = self.name.clone();
        let key_hash = key.hash();
        self.db
            .conn
            .call(move |conn| -> Result<Option<ResponseSnapshot>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT status_code, headers_json, body FROM cache_entries
                     WHERE store = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![store, key_hash], |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, Vec<u8>>(2)?))
                });

                match result {
                    Ok((status, headers_json, body)) => decode_snapshot(status, &headers_json, body).map(Some),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Store a response, replacing any previous entry for the same identity.
    ///
    /// Only GET identities with 2xx responses are accepted. Writing into a
    /// store that has been deleted fails instead of resurrecting it.
    pub async fn put(&self, key: &RequestKey, snapshot: &ResponseSnapshot) -> Result<(), Error> {
        let row = EntryRow::encode(key, snapshot)?;
        let store = self.name.clone();
        let stored_at = chrono::Utc::now().to_rfc3339();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> { row.insert(conn, &store, &stored_at) })
            .await
            .map_err(Error::from)
    }

    /// Store several responses in one transaction: either all land or none do.
    pub async fn put_all(&self, entries: &[(RequestKey, ResponseSnapshot)]) -> Result<(), Error> {
        let rows = entries
            .iter()
            .map(|(key, snapshot)| EntryRow::encode(key, snapshot))
            .collect::<Result<Vec<_>, _>>()?;
        let store = self.name.clone();
        let stored_at = chrono::Utc::now().to_rfc3339();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                for row in &rows {
                    row.insert(&tx, &store, &stored_at)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Remove a single entry. Returns whether anything was deleted.
    pub async fn delete(&self, key: &RequestKey) -> Result<bool, Error> {
        let store = self.name.clone();
        let key_hash = key.hash();
        self.db
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute(
                    "DELETE FROM cache_entries WHERE store = ?1 AND key_hash = ?2",
                    params![store, key_hash],
                )?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Enumerate the identities held by this store, ordered by URL.
    pub async fn keys(&self) -> Result<Vec<RequestKey>, Error> {
        let store = self.name.clone();
        let raw = self
            .db
            .conn
            .call(move |conn| -> Result<Vec<(String, String)>, Error> {
                let mut stmt = conn.prepare("SELECT method, url FROM cache_entries WHERE store = ?1 ORDER BY url")?;
                let rows = stmt
                    .query_map(params![store], |row| Ok((row.get(0)?, row.get(1)?)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        raw.into_iter()
            .map(|(method, url)| {
                let url = Url::parse(&url).map_err(|e| Error::CorruptEntry(format!("{url}: {e}")))?;
                Ok(RequestKey::new(&method, url))
            })
            .collect()
    }

    /// Number of entries in this store.
    pub async fn len(&self) -> Result<usize, Error> {
        let store = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<usize, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM cache_entries WHERE store = ?1", params![store], |row| {
                        row.get(0)
                    })?;
                Ok(count as usize)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.len().await? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(path: &str) -> RequestKey {
        RequestKey::get(Url::parse("https://app.test").unwrap().join(path).unwrap())
    }

    fn json(body: &'static str) -> ResponseSnapshot {
        ResponseSnapshot::new(200, vec![("content-type".into(), "application/json".into())], body)
    }

    async fn store(name: &str) -> CacheStore {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_store(name).await.unwrap()
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let store = store("v1").await;
        store.put(&key("/a.json"), &json(r#"{"x":1}"#)).await.unwrap();

        let hit = store.get(&key("/a.json")).await.unwrap().unwrap();
        assert_eq!(hit.status, 200);
        assert_eq!(hit.text(), Some(r#"{"x":1}"#));
        assert_eq!(hit.content_type(), Some("application/json"));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = store("v1").await;
        assert!(store.get(&key("/missing.json")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = store("v1").await;
        store.put(&key("/a.json"), &json("old")).await.unwrap();
        store.put(&key("/a.json"), &json("new")).await.unwrap();

        let hit = store.get(&key("/a.json")).await.unwrap().unwrap();
        assert_eq!(hit.text(), Some("new"));
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_put_rejects_non_success() {
        let store = store("v1").await;
        let result = store.put(&key("/a.json"), &ResponseSnapshot::new(404, vec![], "nope")).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_put_rejects_non_get() {
        let store = store("v1").await;
        let post = RequestKey::new("POST", Url::parse("https://app.test/a.json").unwrap());
        let result = store.put(&post, &json("{}")).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_put_all_is_atomic() {
        let store = store("v1").await;
        let entries = vec![
            (key("/a.json"), json("a")),
            (key("/b.json"), ResponseSnapshot::new(500, vec![], "broken")),
        ];
        assert!(store.put_all(&entries).await.is_err());
        assert!(store.is_empty().await.unwrap());

        let entries = vec![(key("/a.json"), json("a")), (key("/b.json"), json("b"))];
        store.put_all(&entries).await.unwrap();
        assert_eq!(store.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_stores_are_isolated() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let v1 = db.open_store("v1").await.unwrap();
        let v2 = db.open_store("v2").await.unwrap();

        v1.put(&key("/a.json"), &json("one")).await.unwrap();
        assert!(v2.get(&key("/a.json")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_keys_and_delete() {
        let store = store("v1").await;
        store.put(&key("/b.json"), &json("b")).await.unwrap();
        store.put(&key("/a.json"), &json("a")).await.unwrap();

        let keys = store.keys().await.unwrap();
        let urls: Vec<&str> = keys.iter().map(|k| k.url().path()).collect();
        assert_eq!(urls, vec!["/a.json", "/b.json"]);

        assert!(store.delete(&key("/a.json")).await.unwrap());
        assert!(!store.delete(&key("/a.json")).await.unwrap());
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_binary_body_roundtrip() {
        let store = store("v1").await;
        let bytes: Vec<u8> = vec![0xff, 0xd8, 0xff, 0xe0, 0x00];
        let snapshot = ResponseSnapshot::new(200, vec![("content-type".into(), "image/jpeg".into())], bytes.clone());
        store.put(&key("/img/a.jpg"), &snapshot).await.unwrap();

        let hit = store.get(&key("/img/a.jpg")).await.unwrap().unwrap();
        assert_eq!(hit.body.as_ref(), bytes.as_slice());
        assert_eq!(hit, snapshot);
    }
}
