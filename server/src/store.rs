//! Keyed item storage backing the `/todos` resource.
//!
//! # Design
//! Items are served from a `Vec` behind a `tokio::sync::RwLock`, so listing
//! returns them in insertion order. A file-backed store writes every
//! mutation through to SQLite as a single statement before touching the
//! `Vec`; if the statement fails, the in-memory collection is left as it
//! was. Each call is atomic on its own and there are no transactions
//! spanning calls.
//!
//! The backing is chosen by a connection string: `memory://` keeps items in
//! process only, `sqlite://<path>`, `file://<path>` or a bare path open a
//! SQLite database that is loaded once on connect.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A single to-do item as persisted and returned over the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub text: String,
    pub category: String,
    pub completed: bool,
}

/// A partial update. `None` fields are left as they are.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemPatch {
    pub text: Option<String>,
    pub category: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// A required field was missing or empty.
    #[error("{0}")]
    Validation(String),

    #[error("todo not found: {0}")]
    NotFound(String),

    /// The backing database could not be opened, read or written.
    #[error("storage failure: {0}")]
    Storage(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Backing {
    Memory,
    Sqlite(PathBuf),
}

const SCHEMA: &str = "
    PRAGMA journal_mode = WAL;

    CREATE TABLE IF NOT EXISTS todos (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        text TEXT NOT NULL,
        category TEXT NOT NULL,
        completed INTEGER NOT NULL DEFAULT 0
    );
";

#[derive(Debug)]
pub struct Store {
    items: RwLock<Vec<Item>>,
    db: Option<Mutex<Connection>>,
    location: String,
}

impl Store {
    /// An empty store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            db: None,
            location: "memory".to_string(),
        }
    }

    /// Open the store named by `url`.
    ///
    /// A database file that does not exist yet is created empty. A file
    /// that is not a SQLite database fails with `StoreError::Storage`.
    pub fn connect(url: &str) -> Result<Self, StoreError> {
        match parse_url(url)? {
            Backing::Memory => Ok(Self::in_memory()),
            Backing::Sqlite(path) => {
                let conn = open_database(&path)?;
                let items = load(&conn)?;
                tracing::debug!(path = %path.display(), count = items.len(), "store opened");
                Ok(Self {
                    items: RwLock::new(items),
                    db: Some(Mutex::new(conn)),
                    location: path.display().to_string(),
                })
            }
        }
    }

    /// Human-readable description of where items are kept.
    pub fn location(&self) -> &str {
        &self.location
    }

    pub async fn insert(
        &self,
        text: String,
        category: String,
        completed: bool,
    ) -> Result<Item, StoreError> {
        require("text", &text)?;
        require("category", &category)?;

        let item = Item {
            id: Uuid::new_v4(),
            text,
            category,
            completed,
        };
        let mut items = self.items.write().await;
        self.write_through(|conn| {
            conn.execute(
                "INSERT INTO todos (id, text, category, completed) VALUES (?1, ?2, ?3, ?4)",
                params![item.id.to_string(), item.text, item.category, item.completed],
            )
        })?;
        items.push(item.clone());
        tracing::debug!(id = %item.id, "item inserted");
        Ok(item)
    }

    pub async fn get_all(&self) -> Vec<Item> {
        self.items.read().await.clone()
    }

    pub async fn get(&self, id: Uuid) -> Result<Item, StoreError> {
        self.items
            .read()
            .await
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    pub async fn update(&self, id: Uuid, patch: ItemPatch) -> Result<Item, StoreError> {
        if let Some(text) = &patch.text {
            require("text", text)?;
        }
        if let Some(category) = &patch.category {
            require("category", category)?;
        }

        let mut items = self.items.write().await;
        let index = position(&items, id)?;
        let mut updated = items[index].clone();
        if let Some(text) = patch.text {
            updated.text = text;
        }
        if let Some(category) = patch.category {
            updated.category = category;
        }
        if let Some(completed) = patch.completed {
            updated.completed = completed;
        }
        self.write_through(|conn| {
            conn.execute(
                "UPDATE todos SET text = ?2, category = ?3, completed = ?4 WHERE id = ?1",
                params![
                    updated.id.to_string(),
                    updated.text,
                    updated.category,
                    updated.completed
                ],
            )
        })?;
        items[index] = updated.clone();
        tracing::debug!(id = %id, completed = updated.completed, "item updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut items = self.items.write().await;
        let index = position(&items, id)?;
        self.write_through(|conn| {
            conn.execute("DELETE FROM todos WHERE id = ?1", params![id.to_string()])
        })?;
        items.remove(index);
        tracing::debug!(id = %id, "item deleted");
        Ok(())
    }

    /// Run one statement against the database, if there is one.
    fn write_through(
        &self,
        statement: impl FnOnce(&Connection) -> rusqlite::Result<usize>,
    ) -> Result<(), StoreError> {
        let Some(db) = &self.db else {
            return Ok(());
        };
        let conn = db
            .lock()
            .map_err(|e| StoreError::Storage(format!("connection poisoned: {e}")))?;
        statement(&conn).map(|_| ()).map_err(sql_error)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::in_memory()
    }
}

fn require(field: &str, value: &str) -> Result<(), StoreError> {
    if value.trim().is_empty() {
        return Err(StoreError::Validation(format!("{field} is required")));
    }
    Ok(())
}

fn position(items: &[Item], id: Uuid) -> Result<usize, StoreError> {
    items
        .iter()
        .position(|item| item.id == id)
        .ok_or_else(|| StoreError::NotFound(id.to_string()))
}

fn sql_error(e: rusqlite::Error) -> StoreError {
    StoreError::Storage(e.to_string())
}

fn parse_url(url: &str) -> Result<Backing, StoreError> {
    let url = url.trim();
    if url.is_empty() || url == "memory://" || url == "memory" {
        return Ok(Backing::Memory);
    }
    for scheme in ["sqlite://", "file://"] {
        if let Some(path) = url.strip_prefix(scheme) {
            if path.is_empty() {
                return Err(StoreError::Storage(format!("missing path in {url:?}")));
            }
            return Ok(Backing::Sqlite(PathBuf::from(path)));
        }
    }
    if url.contains("://") {
        return Err(StoreError::Storage(format!("unsupported store url {url:?}")));
    }
    Ok(Backing::Sqlite(PathBuf::from(url)))
}

fn open_database(path: &Path) -> Result<Connection, StoreError> {
    let conn = Connection::open(path)
        .map_err(|e| StoreError::Storage(format!("open {}: {e}", path.display())))?;
    conn.execute_batch(SCHEMA)
        .map_err(|e| StoreError::Storage(format!("{}: {e}", path.display())))?;
    Ok(conn)
}

fn load(conn: &Connection) -> Result<Vec<Item>, StoreError> {
    let mut stmt = conn
        .prepare("SELECT id, text, category, completed FROM todos ORDER BY seq")
        .map_err(sql_error)?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, bool>(3)?,
            ))
        })
        .map_err(sql_error)?;

    let mut items = Vec::new();
    for row in rows {
        let (id, text, category, completed) = row.map_err(sql_error)?;
        let id = Uuid::parse_str(&id)
            .map_err(|e| StoreError::Storage(format!("bad id {id:?}: {e}")))?;
        items.push(Item {
            id,
            text,
            category,
            completed,
        });
    }
    Ok(items)
}
