//! SQLite-backed document store for application records.
//!
//! Each application is one JSON document in the `applications` table, keyed by
//! its `ApplicationID` and `ConsumerID`. Field-level queries (dates, ward
//! grouping, the nested `Response` array) go through SQLite's JSON functions,
//! so callers address fields by document path rather than by column.
//!
//! All access goes through one connection behind a mutex. Every repository
//! method takes the lock once, which makes each call, including the
//! read-modify-write of the `Response` array, atomic for its caller.

mod applications;

pub use applications::{GroupField, DUPLICATE_CONSUMER};

use crate::error::{ApiError, AppResult};
use rusqlite::Connection;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SCHEMA_SQL: &str = include_str!("schema.sql");

#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> AppResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> AppResult<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ApiError::Internal("database mutex poisoned".to_string()))
    }
}
