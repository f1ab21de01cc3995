use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::StoreError;
use crate::smoothie::{NewSmoothie, OrderBy, Smoothie, SmoothieId};
use crate::store::SmoothieStore;

const COLUMNS: &str = "id, title, method, rating, created_at";

/// Embedded SQLite stand-in for the hosted data service.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    table: String,
}

#[derive(thiserror::Error, Debug)]
pub enum SeedError {
    #[error("could not read seed file: {0}")]
    Io(#[from] std::io::Error),
    #[error("seed file is not a JSON array of smoothies: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SqliteStore {
    pub fn open(path: &str, table: &str) -> Result<Self, StoreError> {
        if path == ":memory:" {
            return Self::open_in_memory(table);
        }
        Self::with_connection(Connection::open(path)?, table)
    }

    pub fn open_in_memory(table: &str) -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?, table)
    }

    fn with_connection(conn: Connection, table: &str) -> Result<Self, StoreError> {
        let table = format!("\"{}\"", table.replace('"', "\"\""));
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    title TEXT NOT NULL,
                    method TEXT NOT NULL,
                    rating INTEGER NOT NULL,
                    created_at TEXT NOT NULL
                )",
                table
            ),
            (),
        )?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
            table,
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts every recipe of a JSON array of `{title, method, rating}`.
    pub fn seed_from_file(&self, path: &Path) -> Result<usize, SeedError> {
        let json_str = fs::read_to_string(path)?;
        let smoothies: Vec<NewSmoothie> = serde_json::from_str(&json_str)?;
        let conn = self.conn();
        for smoothie in &smoothies {
            log::debug!("Adding {:?} to db", smoothie);
            insert_row(&conn, &self.table, smoothie)?;
        }
        log::info!("Seeded {} smoothies from {:?}", smoothies.len(), path);
        Ok(smoothies.len())
    }
}

pub fn row_to_smoothie(row: &Row) -> Result<Smoothie, rusqlite::Error> {
    Ok(Smoothie {
        id: row.get(0)?,
        title: row.get(1)?,
        method: row.get(2)?,
        rating: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn insert_row(
    conn: &Connection,
    table: &str,
    smoothie: &NewSmoothie,
) -> Result<Smoothie, StoreError> {
    let sql = format!(
        "INSERT INTO {} (title, method, rating, created_at) VALUES (?1, ?2, ?3, ?4) RETURNING {}",
        table, COLUMNS
    );
    let row = conn.query_row(
        &sql,
        params![smoothie.title, smoothie.method, smoothie.rating, Utc::now()],
        row_to_smoothie,
    )?;
    Ok(row)
}

#[async_trait]
impl SmoothieStore for SqliteStore {
    async fn list(&self, order: OrderBy) -> Result<Vec<Smoothie>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} ORDER BY {} DESC, id DESC",
            COLUMNS,
            self.table,
            order.column()
        ))?;
        let rows = stmt
            .query_map((), row_to_smoothie)?
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!("Listed {} smoothies ordered by {}", rows.len(), order);
        Ok(rows)
    }

    async fn fetch(&self, id: SmoothieId) -> Result<Smoothie, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} WHERE id = ?1",
            COLUMNS, self.table
        ))?;
        let row = stmt.query_row((id,), row_to_smoothie).optional()?;
        row.ok_or(StoreError::NotFound(id))
    }

    async fn insert(&self, smoothie: &NewSmoothie) -> Result<Smoothie, StoreError> {
        let row = insert_row(&self.conn(), &self.table, smoothie)?;
        log::debug!("Inserted smoothie {}", row.id);
        Ok(row)
    }

    async fn update(
        &self,
        id: SmoothieId,
        smoothie: &NewSmoothie,
    ) -> Result<Vec<Smoothie>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "UPDATE {} SET title = ?1, method = ?2, rating = ?3 WHERE id = ?4 RETURNING {}",
            self.table, COLUMNS
        ))?;
        let rows = stmt
            .query_map(
                params![smoothie.title, smoothie.method, smoothie.rating, id],
                row_to_smoothie,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!("Updated {} rows for smoothie {}", rows.len(), id);
        Ok(rows)
    }

    async fn delete(&self, id: SmoothieId) -> Result<Vec<Smoothie>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "DELETE FROM {} WHERE id = ?1 RETURNING {}",
            self.table, COLUMNS
        ))?;
        let rows = stmt
            .query_map((id,), row_to_smoothie)?
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!("Deleted {} rows for smoothie {}", rows.len(), id);
        Ok(rows)
    }
}
