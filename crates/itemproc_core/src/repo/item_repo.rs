//! Item repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD plus the batch-facing `list_processable_ids`/`save_item` APIs.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `Item::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Listing order is creation order.

use crate::db::DbError;
use crate::model::item::{Item, ItemId, ItemStatus, ItemValidationError};
use log::warn;
use parking_lot::Mutex;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const ITEM_SELECT_SQL: &str = "SELECT
    id,
    name,
    description,
    status,
    email
FROM items";

const EMAIL_UNIQUE_MARKER: &str = "items.email";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for item persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ItemValidationError),
    Db(DbError),
    NotFound(ItemId),
    /// Another item already owns this email.
    EmailConflict(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "item not found: {id}"),
            Self::EmailConflict(email) => write!(f, "email is already in use: {email}"),
            Self::InvalidData(message) => write!(f, "invalid persisted item data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::EmailConflict(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ItemValidationError> for RepoError {
    fn from(value: ItemValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Data access contract for items.
///
/// Implementations must be shareable across worker tasks; the batch pipeline
/// holds one instance behind an `Arc` and calls it from many threads.
pub trait ItemRepository: Send + Sync {
    /// Lists every stored item in creation order.
    fn list_items(&self) -> RepoResult<Vec<Item>>;
    /// Lists identifiers eligible for batch processing, in creation order.
    fn list_processable_ids(&self) -> RepoResult<Vec<ItemId>>;
    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>>;
    fn create_item(&self, item: &Item) -> RepoResult<ItemId>;
    /// Replaces all mutable fields of an existing item.
    fn update_item(&self, item: &Item) -> RepoResult<()>;
    /// Inserts or updates, then returns the stored state.
    fn save_item(&self, item: &Item) -> RepoResult<Item>;
    fn delete_item(&self, id: ItemId) -> RepoResult<()>;
}

/// SQLite-backed item repository.
///
/// Owns its connection behind a mutex so it can be shared by concurrent workers.
pub struct SqliteItemRepository {
    conn: Mutex<Connection>,
}

impl SqliteItemRepository {
    /// Wraps a connection that already has migrations applied.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Releases the underlying connection.
    pub fn into_inner(self) -> Connection {
        self.conn.into_inner()
    }
}

impl ItemRepository for SqliteItemRepository {
    fn list_items(&self) -> RepoResult<Vec<Item>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("{ITEM_SELECT_SQL} ORDER BY seq ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();

        while let Some(row) = rows.next()? {
            items.push(parse_item_row(row)?);
        }

        Ok(items)
    }

    fn list_processable_ids(&self) -> RepoResult<Vec<ItemId>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT id FROM items ORDER BY seq ASC;")?;
        let mut rows = stmt.query([])?;
        let mut ids = Vec::new();

        while let Some(row) = rows.next()? {
            let id_text: String = row.get(0)?;
            ids.push(parse_item_id(&id_text)?);
        }

        Ok(ids)
    }

    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>> {
        let conn = self.conn.lock();
        get_item_with(&conn, id)
    }

    fn create_item(&self, item: &Item) -> RepoResult<ItemId> {
        item.validate()?;

        let conn = self.conn.lock();
        insert_item_with(&conn, item)?;
        Ok(item.id)
    }

    fn update_item(&self, item: &Item) -> RepoResult<()> {
        item.validate()?;

        let conn = self.conn.lock();
        if update_item_with(&conn, item)? == 0 {
            return Err(RepoError::NotFound(item.id));
        }

        Ok(())
    }

    fn save_item(&self, item: &Item) -> RepoResult<Item> {
        item.validate()?;

        let conn = self.conn.lock();
        if update_item_with(&conn, item)? == 0 {
            insert_item_with(&conn, item)?;
        }

        get_item_with(&conn, item.id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("saved item {} missing on read-back", item.id))
        })
    }

    fn delete_item(&self, id: ItemId) -> RepoResult<()> {
        let conn = self.conn.lock();
        let changed = conn.execute("DELETE FROM items WHERE id = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

fn get_item_with(conn: &Connection, id: ItemId) -> RepoResult<Option<Item>> {
    let mut stmt = conn.prepare(&format!("{ITEM_SELECT_SQL} WHERE id = ?1;"))?;
    let item = stmt
        .query_row([id.to_string()], |row| Ok(parse_item_row(row)))
        .optional()?;

    item.transpose()
}

fn insert_item_with(conn: &Connection, item: &Item) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO items (
            id,
            name,
            description,
            status,
            email
        ) VALUES (?1, ?2, ?3, ?4, ?5);",
        params![
            item.id.to_string(),
            item.name.as_str(),
            item.description.as_str(),
            item.status.as_str(),
            item.email.as_str(),
        ],
    )
    .map_err(|err| map_write_error(err, item))?;

    Ok(())
}

fn update_item_with(conn: &Connection, item: &Item) -> RepoResult<usize> {
    let changed = conn
        .execute(
            "UPDATE items
             SET
                name = ?1,
                description = ?2,
                status = ?3,
                email = ?4,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?5;",
            params![
                item.name.as_str(),
                item.description.as_str(),
                item.status.as_str(),
                item.email.as_str(),
                item.id.to_string(),
            ],
        )
        .map_err(|err| map_write_error(err, item))?;

    Ok(changed)
}

fn map_write_error(err: rusqlite::Error, item: &Item) -> RepoError {
    if is_email_unique_violation(&err) {
        warn!(
            "event=item_write module=repo status=error error_code=email_conflict item_id={}",
            item.id
        );
        return RepoError::EmailConflict(item.email.clone());
    }

    err.into()
}

fn is_email_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, Some(message)) => {
            failure.code == ErrorCode::ConstraintViolation
                && message.contains(EMAIL_UNIQUE_MARKER)
        }
        _ => false,
    }
}

fn parse_item_row(row: &Row<'_>) -> RepoResult<Item> {
    let id_text: String = row.get("id")?;
    let id = parse_item_id(&id_text)?;

    let status_text: String = row.get("status")?;
    let status = status_text.parse::<ItemStatus>().map_err(|_| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in items.status"))
    })?;

    let item = Item {
        id,
        name: row.get("name")?,
        description: row.get("description")?,
        status,
        email: row.get("email")?,
    };
    item.validate()?;
    Ok(item)
}

fn parse_item_id(value: &str) -> RepoResult<ItemId> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in items.id")))
}
