use rusqlite::{Connection, params};

use crate::error::Result;
use crate::store::entity::{Contact, Entity};

/// Storage operations the migration needs, one set per entity kind.
///
/// Implementations are expected to run every call inside the caller's unit of
/// work; the port never commits on its own.
pub trait ContactPort {
    fn contact_exists(&self, contact_id: i64) -> Result<bool>;

    /// Persist `entity` and return it carrying the destination id it was
    /// stored under.
    fn save<E: Entity>(&self, entity: E) -> Result<E>;

    /// Remove every `E` row owned by the contact. Zero rows is not an error.
    fn delete_all_by_contact<E: Entity>(&self, contact_id: i64) -> Result<usize>;

    fn delete_contact(&self, contact_id: i64) -> Result<usize>;
}

/// `ContactPort` over a SQLite connection, normally an open transaction.
pub struct SqlitePort<'a> {
    conn: &'a Connection,
}

impl<'a> SqlitePort<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl ContactPort for SqlitePort<'_> {
    fn contact_exists(&self, contact_id: i64) -> Result<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM contact WHERE contact_id = ?1)",
            params![contact_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn save<E: Entity>(&self, entity: E) -> Result<E> {
        let id = entity.insert(self.conn)?;
        Ok(entity.with_id(id))
    }

    fn delete_all_by_contact<E: Entity>(&self, contact_id: i64) -> Result<usize> {
        Ok(self.conn.execute(E::DELETE_BY_CONTACT, params![contact_id])?)
    }

    fn delete_contact(&self, contact_id: i64) -> Result<usize> {
        self.delete_all_by_contact::<Contact>(contact_id)
    }
}
