//! SQLite-backed collection store.
//!
//! One write connection plus a small round-robin pool of read
//! connections, all in WAL mode. Every method locks one connection,
//! runs one statement and releases the lock by scope exit, so failures
//! never leak a held connection.

use anyhow::{Context, Result};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;

use super::models::*;
use super::schema::COLLECTION_VERSIONED_SCHEMAS;
use super::search::{build_card_filters, SEARCH_RESULT_LIMIT};
use super::trait_def::CollectionStore;
use crate::sqlite_persistence::BASE_DB_VERSION;

const READ_POOL_SIZE: usize = 4;

/// Columns selected for every card row, with the read-time defaults for
/// owned and card_type applied in SQL.
const CARD_COLUMNS: &str = "c.id, c.name, c.photo_url, c.card_number, c.collection_total, \
     c.language, c.card_order, c.grading_note, c.condition, \
     COALESCE(c.owned, 0), COALESCE(c.card_type, 'Normal')";

pub struct SqliteCollectionStore {
    write_conn: Arc<Mutex<Connection>>,
    read_pool: Vec<Arc<Mutex<Connection>>>,
    read_index: AtomicUsize,
}

fn migrate_if_needed(conn: &mut Connection) -> Result<()> {
    let latest_version = COLLECTION_VERSIONED_SCHEMAS.len() - 1;
    let latest_schema = &COLLECTION_VERSIONED_SCHEMAS[latest_version];

    let table_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if table_count == 0 {
        info!("Creating collection db schema at version {}", latest_version);
        latest_schema.create(conn)?;
        return Ok(());
    }

    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    let mut current_version = (db_version - BASE_DB_VERSION as i64).max(0) as usize;

    if current_version >= latest_version {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for schema in COLLECTION_VERSIONED_SCHEMAS.iter().skip(current_version + 1) {
        if let Some(migration_fn) = schema.migration {
            info!(
                "Migrating collection db from version {} to {}",
                current_version, schema.version
            );
            migration_fn(&tx)?;
            current_version = schema.version;
        }
    }
    tx.pragma_update(None, "user_version", BASE_DB_VERSION + current_version)?;
    tx.commit()?;
    Ok(())
}

impl SqliteCollectionStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path_ref = db_path.as_ref();

        let mut write_conn = Connection::open_with_flags(
            db_path_ref,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI
                | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .context("Failed to open collection database")?;

        migrate_if_needed(&mut write_conn)?;
        write_conn.pragma_update(None, "journal_mode", "WAL")?;
        write_conn.pragma_update(None, "foreign_keys", "ON")?;

        let list_count: i64 = write_conn
            .query_row("SELECT COUNT(*) FROM lists", [], |r| r.get(0))
            .unwrap_or(0);
        let card_count: i64 = write_conn
            .query_row("SELECT COUNT(*) FROM cards", [], |r| r.get(0))
            .unwrap_or(0);
        info!("Opened collection: {} lists, {} cards", list_count, card_count);

        let mut read_pool = Vec::with_capacity(READ_POOL_SIZE);
        for _ in 0..READ_POOL_SIZE {
            let read_conn = Connection::open_with_flags(
                db_path_ref,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                    | rusqlite::OpenFlags::SQLITE_OPEN_URI
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            read_conn.pragma_update(None, "journal_mode", "WAL")?;
            read_pool.push(Arc::new(Mutex::new(read_conn)));
        }

        Ok(SqliteCollectionStore {
            write_conn: Arc::new(Mutex::new(write_conn)),
            read_pool,
            read_index: AtomicUsize::new(0),
        })
    }

    /// In-memory store for tests. A single connection serves both reads
    /// and writes, since separate in-memory connections would each see
    /// their own database.
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migrate_if_needed(&mut conn)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let shared = Arc::new(Mutex::new(conn));
        Ok(SqliteCollectionStore {
            write_conn: shared.clone(),
            read_pool: vec![shared],
            read_index: AtomicUsize::new(0),
        })
    }

    fn get_read_conn(&self) -> Arc<Mutex<Connection>> {
        let index = self.read_index.fetch_add(1, Ordering::SeqCst) % self.read_pool.len();
        self.read_pool[index].clone()
    }

    fn parse_card_row(row: &rusqlite::Row) -> rusqlite::Result<Card> {
        Ok(Card {
            id: row.get(0)?,
            name: row.get(1)?,
            photo_url: row.get(2)?,
            card_number: row.get(3)?,
            collection_total: row.get(4)?,
            language: row.get(5)?,
            card_order: row.get(6)?,
            grading_note: row.get(7)?,
            condition: row.get(8)?,
            owned: row.get::<_, i64>(9)? != 0,
            card_type: row.get(10)?,
        })
    }

    fn parse_card_with_list_row(row: &rusqlite::Row) -> rusqlite::Result<CardWithList> {
        Ok(CardWithList {
            card: Self::parse_card_row(row)?,
            list_id: row.get(11)?,
            list_name: row.get(12)?,
        })
    }
}

impl CollectionStore for SqliteCollectionStore {
    fn get_lists_with_counts(&self) -> Result<Vec<ListWithCount>> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(
            "SELECT l.id, l.name, COUNT(c.id) FROM lists l \
             LEFT JOIN cards c ON c.list_id = l.id \
             GROUP BY l.id, l.name ORDER BY l.name ASC",
        )?;
        let lists = stmt
            .query_map([], |row| {
                Ok(ListWithCount {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    card_count: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(lists)
    }

    fn create_list(&self, name: &str) -> Result<i64> {
        let conn = self.write_conn.lock().unwrap();
        conn.execute("INSERT INTO lists (name) VALUES (?1)", params![name])?;
        Ok(conn.last_insert_rowid())
    }

    fn rename_list(&self, id: i64, name: &str) -> Result<()> {
        let conn = self.write_conn.lock().unwrap();
        conn.execute(
            "UPDATE lists SET name = ?1 WHERE id = ?2",
            params![name, id],
        )?;
        Ok(())
    }

    fn get_list(&self, id: i64) -> Result<Option<List>> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        let list = conn
            .query_row(
                "SELECT id, name FROM lists WHERE id = ?1",
                params![id],
                |row| {
                    Ok(List {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(list)
    }

    fn get_list_cards(&self, list_id: i64) -> Result<Vec<Card>> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {} FROM cards c WHERE c.list_id = ?1 ORDER BY c.card_order ASC",
            CARD_COLUMNS
        ))?;
        let cards = stmt
            .query_map(params![list_id], Self::parse_card_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(cards)
    }

    fn get_card(&self, id: i64) -> Result<Option<CardWithList>> {
        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        let card = conn
            .query_row(
                &format!(
                    "SELECT {}, l.id, l.name FROM cards c \
                     JOIN lists l ON l.id = c.list_id WHERE c.id = ?1",
                    CARD_COLUMNS
                ),
                params![id],
                Self::parse_card_with_list_row,
            )
            .optional()?;
        Ok(card)
    }

    fn create_card(&self, list_id: i64, draft: &CardDraft) -> Result<i64> {
        let conn = self.write_conn.lock().unwrap();
        conn.execute(
            "INSERT INTO cards (list_id, name, photo_url, card_number, collection_total, \
             language, card_order, condition, grading_note, owned, card_type) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, \
             (SELECT COALESCE(MAX(card_order), 0) + 1 FROM cards WHERE list_id = ?1), \
             ?7, ?8, ?9, ?10)",
            params![
                list_id,
                draft.name,
                draft.photo_url,
                draft.card_number,
                draft.collection_total,
                draft.language,
                draft.condition,
                draft.grading_note,
                draft.owned,
                draft.card_type,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn update_card(&self, id: i64, update: &CardUpdate) -> Result<()> {
        let conn = self.write_conn.lock().unwrap();
        // Two statements, chosen by presence of a new photo; the variant
        // without photo_url preserves the stored value.
        match &update.photo_url {
            Some(photo_url) => {
                conn.execute(
                    "UPDATE cards SET name = ?1, card_number = ?2, collection_total = ?3, \
                     language = ?4, condition = ?5, grading_note = ?6, owned = ?7, \
                     card_type = ?8, photo_url = ?9 WHERE id = ?10",
                    params![
                        update.name,
                        update.card_number,
                        update.collection_total,
                        update.language,
                        update.condition,
                        update.grading_note,
                        update.owned,
                        update.card_type,
                        photo_url,
                        id,
                    ],
                )?;
            }
            None => {
                conn.execute(
                    "UPDATE cards SET name = ?1, card_number = ?2, collection_total = ?3, \
                     language = ?4, condition = ?5, grading_note = ?6, owned = ?7, \
                     card_type = ?8 WHERE id = ?9",
                    params![
                        update.name,
                        update.card_number,
                        update.collection_total,
                        update.language,
                        update.condition,
                        update.grading_note,
                        update.owned,
                        update.card_type,
                        id,
                    ],
                )?;
            }
        }
        Ok(())
    }

    fn toggle_owned(&self, id: i64) -> Result<()> {
        let conn = self.write_conn.lock().unwrap();
        conn.execute(
            "UPDATE cards SET owned = NOT COALESCE(owned, 0) WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }

    fn delete_card(&self, id: i64) -> Result<Option<i64>> {
        let conn = self.write_conn.lock().unwrap();
        let list_id = conn
            .query_row(
                "DELETE FROM cards WHERE id = ?1 RETURNING list_id",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(list_id)
    }

    fn search_cards(&self, filters: &SearchFilters) -> Result<Vec<CardWithList>> {
        let builder = build_card_filters(filters);
        let sql = format!(
            "SELECT {}, l.id, l.name FROM cards c \
             JOIN lists l ON l.id = c.list_id{} \
             ORDER BY l.name ASC, c.card_order ASC, c.name ASC LIMIT {}",
            CARD_COLUMNS,
            builder.where_clause(),
            SEARCH_RESULT_LIMIT
        );

        let conn = self.get_read_conn();
        let conn = conn.lock().unwrap();
        let mut stmt = conn.prepare_cached(&sql)?;
        let results = stmt
            .query_map(
                params_from_iter(builder.params().iter()),
                Self::parse_card_with_list_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(results)
    }
}
