//! SH-014: Game library — SQLite record of installed games.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use thiserror::Error;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS games (
    slug         TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    runner       TEXT NOT NULL,
    directory    TEXT NOT NULL,
    installed_at TEXT NOT NULL
)";

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("cannot create {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("library database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// One installed game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryEntry {
    pub slug: String,
    pub name: String,
    pub runner: String,
    pub directory: PathBuf,
    pub installed_at: String,
}

pub struct GameLibrary {
    conn: Connection,
}

impl GameLibrary {
    pub fn open(path: &Path) -> Result<Self, LibraryError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LibraryError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, LibraryError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, LibraryError> {
        conn.execute(SCHEMA, [])?;
        Ok(Self { conn })
    }

    /// Insert or replace the record for `entry.slug`.
    pub fn record(&self, entry: &LibraryEntry) -> Result<(), LibraryError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO games (slug, name, runner, directory, installed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.slug,
                entry.name,
                entry.runner,
                entry.directory.to_string_lossy().to_string(),
                entry.installed_at
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, slug: &str) -> Result<Option<LibraryEntry>, LibraryError> {
        let entry = self
            .conn
            .query_row(
                "SELECT slug, name, runner, directory, installed_at FROM games WHERE slug = ?1",
                params![slug],
                row_to_entry,
            )
            .optional()?;
        Ok(entry)
    }

    /// All games, by slug.
    pub fn list(&self) -> Result<Vec<LibraryEntry>, LibraryError> {
        let mut stmt = self.conn.prepare(
            "SELECT slug, name, runner, directory, installed_at FROM games ORDER BY slug",
        )?;
        let rows = stmt.query_map([], row_to_entry)?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<LibraryEntry> {
    let directory: String = row.get(3)?;
    Ok(LibraryEntry {
        slug: row.get(0)?,
        name: row.get(1)?,
        runner: row.get(2)?,
        directory: PathBuf::from(directory),
        installed_at: row.get(4)?,
    })
}
