use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, Transaction, TransactionBehavior, params};
use serde::Serialize;

use crate::error::Result;
use crate::store::entity::{
    Contact, ContactAddress, ContactAddressPhone, ContactEmail, ContactIdentity, ContactPhone,
    ContactRestriction, Employment, Entity, PrisonerContact, PrisonerContactRestriction,
};
use crate::store::port::{ContactPort, SqlitePort};

/// Tables whose primary key is generated locally. Their sequences are seeded
/// so the first generated id equals the id threshold.
const GENERATED_ID_TABLES: &[&str] = &[
    "contact_phone",
    "contact_address",
    "contact_address_phone",
    "contact_email",
    "contact_identity",
    "contact_restriction",
    "employment",
    "prisoner_contact",
    "prisoner_contact_restriction",
];

pub struct Db {
    conn: Connection,
    id_threshold: i64,
}

/// Everything persisted for one contact, as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactAggregate {
    pub contact: Contact,
    pub phones: Vec<ContactPhone>,
    pub addresses: Vec<ContactAddress>,
    pub address_phones: Vec<ContactAddressPhone>,
    pub emails: Vec<ContactEmail>,
    pub identities: Vec<ContactIdentity>,
    pub restrictions: Vec<ContactRestriction>,
    pub employments: Vec<Employment>,
    pub relationships: Vec<PrisonerContact>,
    pub relationship_restrictions: Vec<PrisonerContactRestriction>,
}

impl Db {
    pub fn open(path: &Path, id_threshold: i64) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;\
             PRAGMA foreign_keys=ON;\
             PRAGMA busy_timeout=5000;",
        )?;
        let db = Self { conn, id_threshold };
        db.create_tables()?;
        Ok(db)
    }

    pub fn open_memory(id_threshold: i64) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let db = Self { conn, id_threshold };
        db.create_tables()?;
        Ok(db)
    }

    fn create_tables(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS contact (
                contact_id INTEGER PRIMARY KEY,
                title TEXT,
                last_name TEXT NOT NULL,
                first_name TEXT NOT NULL,
                middle_name TEXT,
                date_of_birth TEXT,
                gender TEXT,
                domestic_status TEXT,
                language TEXT,
                interpreter_required INTEGER NOT NULL DEFAULT 0,
                staff INTEGER NOT NULL DEFAULT 0,
                remitter INTEGER NOT NULL DEFAULT 0,
                deceased INTEGER NOT NULL DEFAULT 0,
                deceased_date TEXT,
                created_by TEXT,
                created_time TEXT,
                updated_by TEXT,
                updated_time TEXT
            );
            CREATE TABLE IF NOT EXISTS contact_phone (
                contact_phone_id INTEGER PRIMARY KEY AUTOINCREMENT,
                contact_id INTEGER NOT NULL REFERENCES contact(contact_id),
                phone_type TEXT NOT NULL,
                phone_number TEXT NOT NULL,
                ext_number TEXT,
                created_by TEXT,
                created_time TEXT,
                updated_by TEXT,
                updated_time TEXT
            );
            CREATE TABLE IF NOT EXISTS contact_address (
                contact_address_id INTEGER PRIMARY KEY AUTOINCREMENT,
                contact_id INTEGER NOT NULL REFERENCES contact(contact_id),
                address_type TEXT,
                primary_address INTEGER NOT NULL DEFAULT 0,
                flat TEXT,
                property TEXT,
                street TEXT,
                area TEXT,
                city TEXT,
                county TEXT,
                country TEXT,
                postcode TEXT,
                verified INTEGER NOT NULL DEFAULT 0,
                mail_flag INTEGER NOT NULL DEFAULT 0,
                no_fixed_address INTEGER NOT NULL DEFAULT 0,
                start_date TEXT,
                end_date TEXT,
                comments TEXT,
                created_by TEXT,
                created_time TEXT,
                updated_by TEXT,
                updated_time TEXT
            );
            CREATE TABLE IF NOT EXISTS contact_address_phone (
                contact_address_phone_id INTEGER PRIMARY KEY AUTOINCREMENT,
                contact_id INTEGER NOT NULL REFERENCES contact(contact_id),
                contact_address_id INTEGER NOT NULL REFERENCES contact_address(contact_address_id),
                contact_phone_id INTEGER NOT NULL REFERENCES contact_phone(contact_phone_id),
                created_by TEXT,
                created_time TEXT,
                updated_by TEXT,
                updated_time TEXT
            );
            CREATE TABLE IF NOT EXISTS contact_email (
                contact_email_id INTEGER PRIMARY KEY AUTOINCREMENT,
                contact_id INTEGER NOT NULL REFERENCES contact(contact_id),
                email_address TEXT NOT NULL,
                created_by TEXT,
                created_time TEXT,
                updated_by TEXT,
                updated_time TEXT
            );
            CREATE TABLE IF NOT EXISTS contact_identity (
                contact_identity_id INTEGER PRIMARY KEY AUTOINCREMENT,
                contact_id INTEGER NOT NULL REFERENCES contact(contact_id),
                identity_type TEXT NOT NULL,
                identity TEXT NOT NULL,
                issuing_authority TEXT,
                created_by TEXT,
                created_time TEXT,
                updated_by TEXT,
                updated_time TEXT
            );
            CREATE TABLE IF NOT EXISTS contact_restriction (
                contact_restriction_id INTEGER PRIMARY KEY AUTOINCREMENT,
                contact_id INTEGER NOT NULL REFERENCES contact(contact_id),
                restriction_type TEXT NOT NULL,
                start_date TEXT,
                expiry_date TEXT,
                comments TEXT,
                staff_username TEXT,
                created_by TEXT,
                created_time TEXT,
                updated_by TEXT,
                updated_time TEXT
            );
            CREATE TABLE IF NOT EXISTS employment (
                employment_id INTEGER PRIMARY KEY AUTOINCREMENT,
                contact_id INTEGER NOT NULL REFERENCES contact(contact_id),
                organisation_id INTEGER NOT NULL,
                active INTEGER NOT NULL DEFAULT 0,
                created_by TEXT,
                created_time TEXT,
                updated_by TEXT,
                updated_time TEXT
            );
            CREATE TABLE IF NOT EXISTS prisoner_contact (
                prisoner_contact_id INTEGER PRIMARY KEY AUTOINCREMENT,
                contact_id INTEGER NOT NULL REFERENCES contact(contact_id),
                prisoner_number TEXT NOT NULL,
                contact_type TEXT NOT NULL,
                relationship_type TEXT NOT NULL,
                current_term INTEGER NOT NULL DEFAULT 0,
                active INTEGER NOT NULL DEFAULT 0,
                expiry_date TEXT,
                approved_visitor INTEGER NOT NULL DEFAULT 0,
                next_of_kin INTEGER NOT NULL DEFAULT 0,
                emergency_contact INTEGER NOT NULL DEFAULT 0,
                comments TEXT,
                created_by TEXT,
                created_time TEXT,
                updated_by TEXT,
                updated_time TEXT
            );
            CREATE TABLE IF NOT EXISTS prisoner_contact_restriction (
                prisoner_contact_restriction_id INTEGER PRIMARY KEY AUTOINCREMENT,
                prisoner_contact_id INTEGER NOT NULL REFERENCES prisoner_contact(prisoner_contact_id),
                restriction_type TEXT NOT NULL,
                start_date TEXT,
                expiry_date TEXT,
                comments TEXT,
                staff_username TEXT,
                created_by TEXT,
                created_time TEXT,
                updated_by TEXT,
                updated_time TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_contact_phone_contact ON contact_phone(contact_id);
            CREATE INDEX IF NOT EXISTS idx_contact_address_contact ON contact_address(contact_id);
            CREATE INDEX IF NOT EXISTS idx_contact_address_phone_contact ON contact_address_phone(contact_id);
            CREATE INDEX IF NOT EXISTS idx_contact_email_contact ON contact_email(contact_id);
            CREATE INDEX IF NOT EXISTS idx_contact_identity_contact ON contact_identity(contact_id);
            CREATE INDEX IF NOT EXISTS idx_contact_restriction_contact ON contact_restriction(contact_id);
            CREATE INDEX IF NOT EXISTS idx_employment_contact ON employment(contact_id);
            CREATE INDEX IF NOT EXISTS idx_prisoner_contact_contact ON prisoner_contact(contact_id);
            CREATE INDEX IF NOT EXISTS idx_pc_restriction_parent
                ON prisoner_contact_restriction(prisoner_contact_id);",
        )?;
        self.seed_sequences()?;
        Ok(())
    }

    // sqlite_sequence only exists once an AUTOINCREMENT table has been created.
    fn seed_sequences(&self) -> Result<()> {
        let floor = self.id_threshold - 1;
        for table in GENERATED_ID_TABLES {
            self.conn.execute(
                "INSERT INTO sqlite_sequence (name, seq)
                 SELECT ?1, ?2 WHERE NOT EXISTS (SELECT 1 FROM sqlite_sequence WHERE name = ?1)",
                params![table, floor],
            )?;
            self.conn.execute(
                "UPDATE sqlite_sequence SET seq = ?2 WHERE name = ?1 AND seq < ?2",
                params![table, floor],
            )?;
        }
        Ok(())
    }

    pub fn id_threshold(&self) -> i64 {
        self.id_threshold
    }

    pub fn set_busy_timeout(&self, timeout: Duration) -> Result<()> {
        self.conn.busy_timeout(timeout)?;
        Ok(())
    }

    /// Begin a write transaction that takes the database write lock up front,
    /// so the existence check and the rewrite it guards cannot interleave with
    /// another writer.
    pub fn immediate_transaction(&mut self) -> Result<Transaction<'_>> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }

    pub fn contact_exists(&self, contact_id: i64) -> Result<bool> {
        SqlitePort::new(&self.conn).contact_exists(contact_id)
    }

    /// Every row of kind `E` owned by the contact, in insertion order.
    pub fn load<E: Entity>(&self, contact_id: i64) -> Result<Vec<E>> {
        let mut stmt = self.conn.prepare(E::SELECT_BY_CONTACT)?;
        let rows = stmt
            .query_map(params![contact_id], E::from_row)?
            .collect::<std::result::Result<Vec<E>, _>>()?;
        Ok(rows)
    }

    pub fn load_aggregate(&self, contact_id: i64) -> Result<Option<ContactAggregate>> {
        let Some(contact) = self.load::<Contact>(contact_id)?.into_iter().next() else {
            return Ok(None);
        };
        Ok(Some(ContactAggregate {
            contact,
            phones: self.load(contact_id)?,
            addresses: self.load(contact_id)?,
            address_phones: self.load(contact_id)?,
            emails: self.load(contact_id)?,
            identities: self.load(contact_id)?,
            restrictions: self.load(contact_id)?,
            employments: self.load(contact_id)?,
            relationships: self.load(contact_id)?,
            relationship_restrictions: self.load(contact_id)?,
        }))
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}
