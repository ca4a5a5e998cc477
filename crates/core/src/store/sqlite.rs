//! SQLite-backed record store.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use super::{record_key, Favorite, PlayRecord, StoreError, VideoStore};

/// SQLite-backed store for play records, favorites, and search history.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open the database file, creating it and the schema if needed.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Database(e.to_string()))?;
        }
        let conn = Connection::open(path).map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS play_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                source TEXT NOT NULL,
                source_id TEXT NOT NULL,
                source_name TEXT NOT NULL,
                cover TEXT NOT NULL,
                year TEXT NOT NULL,
                index_number INTEGER NOT NULL,
                total_episodes INTEGER NOT NULL,
                play_time INTEGER NOT NULL,
                total_time INTEGER NOT NULL,
                save_time INTEGER NOT NULL,
                search_title TEXT NOT NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_play_records_source_source_id_unique
            ON play_records (source, source_id);

            CREATE TABLE IF NOT EXISTS favorites (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source TEXT NOT NULL,
                source_id TEXT NOT NULL,
                source_name TEXT NOT NULL,
                total_episodes INTEGER NOT NULL,
                title TEXT NOT NULL,
                year TEXT NOT NULL,
                cover TEXT NOT NULL,
                save_time INTEGER NOT NULL,
                search_title TEXT NOT NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_favorites_source_source_id_unique
            ON favorites (source, source_id);

            -- Single JSON-encoded row (id = 1) holding the keyword list.
            CREATE TABLE IF NOT EXISTS search_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                record TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn read_history(conn: &Connection) -> Result<Vec<String>, StoreError> {
        let record: Option<String> = conn
            .query_row("SELECT record FROM search_history WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;

        match record {
            Some(json) if !json.is_empty() => Ok(serde_json::from_str(&json)?),
            _ => Ok(Vec::new()),
        }
    }

    fn write_history(conn: &Connection, keywords: &[String]) -> Result<(), StoreError> {
        let json = serde_json::to_string(keywords)?;
        let updated = conn.execute(
            "UPDATE search_history SET record = ?1 WHERE id = 1",
            params![json],
        )?;
        if updated == 0 {
            conn.execute(
                "INSERT INTO search_history (id, record) VALUES (1, ?1)",
                params![json],
            )?;
        }
        Ok(())
    }
}

impl VideoStore for SqliteStore {
    fn all_play_records(&self) -> Result<HashMap<String, PlayRecord>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT title, source, source_id, source_name, cover, year,
                index_number, total_episodes, play_time, total_time, save_time, search_title
             FROM play_records",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(PlayRecord {
                title: row.get(0)?,
                source: row.get(1)?,
                source_id: row.get(2)?,
                source_name: row.get(3)?,
                cover: row.get(4)?,
                year: row.get(5)?,
                index_number: row.get(6)?,
                total_episodes: row.get(7)?,
                play_time: row.get(8)?,
                total_time: row.get(9)?,
                save_time: row.get(10)?,
                search_title: row.get(11)?,
            })
        })?;

        let mut records = HashMap::new();
        for row in rows {
            let record = row?;
            records.insert(record_key(&record.source, &record.source_id), record);
        }
        Ok(records)
    }

    fn upsert_play_record(&self, record: &PlayRecord) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO play_records (title, source, source_id, source_name, cover, year,
                index_number, total_episodes, play_time, total_time, save_time, search_title)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT(source, source_id) DO UPDATE SET
                title = excluded.title,
                source_name = excluded.source_name,
                cover = excluded.cover,
                year = excluded.year,
                index_number = excluded.index_number,
                total_episodes = excluded.total_episodes,
                play_time = excluded.play_time,
                total_time = excluded.total_time,
                save_time = excluded.save_time,
                search_title = excluded.search_title",
            params![
                record.title,
                record.source,
                record.source_id,
                record.source_name,
                record.cover,
                record.year,
                record.index_number,
                record.total_episodes,
                record.play_time,
                record.total_time,
                record.save_time,
                record.search_title,
            ],
        )?;
        Ok(())
    }

    fn update_play_record(&self, record: &PlayRecord) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE play_records SET title = ?1, cover = ?2, year = ?3, total_episodes = ?4
             WHERE source = ?5 AND source_id = ?6",
            params![
                record.title,
                record.cover,
                record.year,
                record.total_episodes,
                record.source,
                record.source_id,
            ],
        )?;
        Ok(())
    }

    fn delete_play_record(&self, source: &str, source_id: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM play_records WHERE source = ?1 AND source_id = ?2",
            params![source, source_id],
        )?;
        Ok(())
    }

    fn delete_all_play_records(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM play_records", [])?;
        Ok(())
    }

    fn all_favorites(&self) -> Result<HashMap<String, Favorite>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT source, source_id, source_name, total_episodes, title, year,
                cover, save_time, search_title
             FROM favorites",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(Favorite {
                source: row.get(0)?,
                source_id: row.get(1)?,
                source_name: row.get(2)?,
                total_episodes: row.get(3)?,
                title: row.get(4)?,
                year: row.get(5)?,
                cover: row.get(6)?,
                save_time: row.get(7)?,
                search_title: row.get(8)?,
                origin: None,
            })
        })?;

        let mut favorites = HashMap::new();
        for row in rows {
            let favorite = row?;
            favorites.insert(record_key(&favorite.source, &favorite.source_id), favorite);
        }
        Ok(favorites)
    }

    fn upsert_favorite(&self, favorite: &Favorite) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO favorites (source, source_id, source_name, total_episodes,
                title, year, cover, save_time, search_title)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(source, source_id) DO UPDATE SET
                source_name = excluded.source_name,
                total_episodes = excluded.total_episodes,
                title = excluded.title,
                year = excluded.year,
                cover = excluded.cover,
                save_time = excluded.save_time,
                search_title = excluded.search_title",
            params![
                favorite.source,
                favorite.source_id,
                favorite.source_name,
                favorite.total_episodes,
                favorite.title,
                favorite.year,
                favorite.cover,
                favorite.save_time,
                favorite.search_title,
            ],
        )?;
        Ok(())
    }

    fn update_favorite(&self, favorite: &Favorite) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE favorites SET total_episodes = ?1, title = ?2, year = ?3, cover = ?4
             WHERE source = ?5 AND source_id = ?6",
            params![
                favorite.total_episodes,
                favorite.title,
                favorite.year,
                favorite.cover,
                favorite.source,
                favorite.source_id,
            ],
        )?;
        Ok(())
    }

    fn delete_favorite(&self, source: &str, source_id: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM favorites WHERE source = ?1 AND source_id = ?2",
            params![source, source_id],
        )?;
        Ok(())
    }

    fn search_history(&self) -> Result<Vec<String>, StoreError> {
        let conn = self.conn.lock().unwrap();
        Self::read_history(&conn)
    }

    fn push_search_history(&self, keyword: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let mut keywords = Self::read_history(&tx)?;
        keywords.retain(|k| k != keyword);
        keywords.insert(0, keyword.to_string());
        Self::write_history(&tx, &keywords)?;

        tx.commit()?;
        Ok(keywords)
    }

    fn delete_search_history_keyword(&self, keyword: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let mut keywords = Self::read_history(&tx)?;
        keywords.retain(|k| k != keyword);
        Self::write_history(&tx, &keywords)?;

        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play_record(source: &str, source_id: &str) -> PlayRecord {
        PlayRecord {
            title: "Some Show".to_string(),
            source: source.to_string(),
            source_id: source_id.to_string(),
            source_name: "Alpha".to_string(),
            cover: "http://a/p.jpg".to_string(),
            year: "2021".to_string(),
            index_number: 1,
            total_episodes: 12,
            play_time: 60,
            total_time: 2400,
            save_time: 1700000000,
            search_title: "Some Show".to_string(),
        }
    }

    fn favorite(source: &str, source_id: &str) -> Favorite {
        Favorite {
            source: source.to_string(),
            source_id: source_id.to_string(),
            source_name: "Alpha".to_string(),
            total_episodes: 12,
            title: "Some Show".to_string(),
            year: "2021".to_string(),
            cover: "http://a/p.jpg".to_string(),
            save_time: 1700000000,
            search_title: "Some Show".to_string(),
            origin: None,
        }
    }

    #[test]
    fn test_upsert_play_record_insert_then_replace() {
        let store = SqliteStore::in_memory().unwrap();
        store.upsert_play_record(&play_record("a", "1")).unwrap();

        let mut updated = play_record("a", "1");
        updated.index_number = 5;
        updated.play_time = 900;
        store.upsert_play_record(&updated).unwrap();

        let records = store.all_play_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records["a+1"].index_number, 5);
        assert_eq!(records["a+1"].play_time, 900);
    }

    #[test]
    fn test_update_play_record_patches_metadata_only() {
        let store = SqliteStore::in_memory().unwrap();
        store.upsert_play_record(&play_record("a", "1")).unwrap();

        let mut patched = play_record("a", "1");
        patched.total_episodes = 24;
        patched.title = "Some Show S2".to_string();
        patched.play_time = 9999; // not part of the patch
        store.update_play_record(&patched).unwrap();

        let record = &store.all_play_records().unwrap()["a+1"];
        assert_eq!(record.total_episodes, 24);
        assert_eq!(record.title, "Some Show S2");
        assert_eq!(record.play_time, 60);
    }

    #[test]
    fn test_delete_play_record() {
        let store = SqliteStore::in_memory().unwrap();
        store.upsert_play_record(&play_record("a", "1")).unwrap();
        store.upsert_play_record(&play_record("b", "2")).unwrap();

        store.delete_play_record("a", "1").unwrap();

        let records = store.all_play_records().unwrap();
        assert_eq!(records.len(), 1);
        assert!(records.contains_key("b+2"));
    }

    #[test]
    fn test_delete_all_play_records() {
        let store = SqliteStore::in_memory().unwrap();
        store.upsert_play_record(&play_record("a", "1")).unwrap();
        store.upsert_play_record(&play_record("b", "2")).unwrap();

        store.delete_all_play_records().unwrap();
        assert!(store.all_play_records().unwrap().is_empty());
    }

    #[test]
    fn test_favorites_roundtrip() {
        let store = SqliteStore::in_memory().unwrap();
        store.upsert_favorite(&favorite("a", "1")).unwrap();

        let mut updated = favorite("a", "1");
        updated.total_episodes = 24;
        store.upsert_favorite(&updated).unwrap();

        let favorites = store.all_favorites().unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites["a+1"].total_episodes, 24);

        store.delete_favorite("a", "1").unwrap();
        assert!(store.all_favorites().unwrap().is_empty());
    }

    #[test]
    fn test_search_history_empty_by_default() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.search_history().unwrap().is_empty());
    }

    #[test]
    fn test_push_search_history_dedupes_and_prepends() {
        let store = SqliteStore::in_memory().unwrap();
        store.push_search_history("alpha").unwrap();
        store.push_search_history("beta").unwrap();
        let history = store.push_search_history("alpha").unwrap();

        assert_eq!(history, vec!["alpha", "beta"]);
        assert_eq!(store.search_history().unwrap(), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_delete_search_history_keyword() {
        let store = SqliteStore::in_memory().unwrap();
        store.push_search_history("alpha").unwrap();
        store.push_search_history("beta").unwrap();

        store.delete_search_history_keyword("alpha").unwrap();
        assert_eq!(store.search_history().unwrap(), vec!["beta"]);

        // Deleting an absent keyword is a no-op.
        store.delete_search_history_keyword("missing").unwrap();
        assert_eq!(store.search_history().unwrap(), vec!["beta"]);
    }
}
