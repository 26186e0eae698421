use chrono::NaiveDate;
use rusqlite::{Connection, Row, params};
use serde::Serialize;

use crate::model::{ElementType, SourceAudit};

/// A destination row kind that the persistence port can save, read back and
/// clear by owning contact.
pub trait Entity: Sized {
    const KIND: ElementType;
    /// Selects every row owned by the contact bound to `?1`, oldest id first.
    const SELECT_BY_CONTACT: &'static str;
    /// Deletes every row owned by the contact bound to `?1`.
    const DELETE_BY_CONTACT: &'static str;

    /// Insert the row and return the destination id it was stored under.
    fn insert(&self, conn: &Connection) -> rusqlite::Result<i64>;
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
    fn with_id(self, id: i64) -> Self;
}

fn audit_from_row(row: &Row<'_>, start: usize) -> rusqlite::Result<SourceAudit> {
    Ok(SourceAudit {
        create_username: row.get(start)?,
        create_date_time: row.get(start + 1)?,
        modify_username: row.get(start + 2)?,
        modify_date_time: row.get(start + 3)?,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub contact_id: i64,
    pub title: Option<String>,
    pub last_name: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub domestic_status: Option<String>,
    pub language: Option<String>,
    pub interpreter_required: bool,
    pub staff: bool,
    pub remitter: bool,
    pub deceased: bool,
    pub deceased_date: Option<NaiveDate>,
    #[serde(flatten)]
    pub audit: SourceAudit,
}

impl Entity for Contact {
    const KIND: ElementType = ElementType::Contact;
    const SELECT_BY_CONTACT: &'static str = "SELECT contact_id, title, last_name, first_name, middle_name, date_of_birth,
                gender, domestic_status, language, interpreter_required, staff, remitter,
                deceased, deceased_date, created_by, created_time, updated_by, updated_time
         FROM contact WHERE contact_id = ?1";
    const DELETE_BY_CONTACT: &'static str = "DELETE FROM contact WHERE contact_id = ?1";

    // The contact keeps its source id as primary key.
    fn insert(&self, conn: &Connection) -> rusqlite::Result<i64> {
        conn.execute(
            "INSERT INTO contact (contact_id, title, last_name, first_name, middle_name, date_of_birth,
                gender, domestic_status, language, interpreter_required, staff, remitter,
                deceased, deceased_date, created_by, created_time, updated_by, updated_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
            params![
                self.contact_id, self.title, self.last_name, self.first_name, self.middle_name,
                self.date_of_birth, self.gender, self.domestic_status, self.language,
                self.interpreter_required, self.staff, self.remitter,
                self.deceased, self.deceased_date,
                self.audit.create_username, self.audit.create_date_time,
                self.audit.modify_username, self.audit.modify_date_time,
            ],
        )?;
        Ok(self.contact_id)
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            contact_id: row.get(0)?,
            title: row.get(1)?,
            last_name: row.get(2)?,
            first_name: row.get(3)?,
            middle_name: row.get(4)?,
            date_of_birth: row.get(5)?,
            gender: row.get(6)?,
            domestic_status: row.get(7)?,
            language: row.get(8)?,
            interpreter_required: row.get(9)?,
            staff: row.get(10)?,
            remitter: row.get(11)?,
            deceased: row.get(12)?,
            deceased_date: row.get(13)?,
            audit: audit_from_row(row, 14)?,
        })
    }

    fn with_id(self, id: i64) -> Self {
        Self {
            contact_id: id,
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPhone {
    pub contact_phone_id: i64,
    pub contact_id: i64,
    pub phone_type: String,
    pub phone_number: String,
    pub ext_number: Option<String>,
    #[serde(flatten)]
    pub audit: SourceAudit,
}

impl Entity for ContactPhone {
    const KIND: ElementType = ElementType::Phone;
    const SELECT_BY_CONTACT: &'static str = "SELECT contact_phone_id, contact_id, phone_type, phone_number, ext_number,
                created_by, created_time, updated_by, updated_time
         FROM contact_phone WHERE contact_id = ?1 ORDER BY contact_phone_id";
    const DELETE_BY_CONTACT: &'static str = "DELETE FROM contact_phone WHERE contact_id = ?1";

    fn insert(&self, conn: &Connection) -> rusqlite::Result<i64> {
        conn.execute(
            "INSERT INTO contact_phone (contact_id, phone_type, phone_number, ext_number,
                created_by, created_time, updated_by, updated_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                self.contact_id, self.phone_type, self.phone_number, self.ext_number,
                self.audit.create_username, self.audit.create_date_time,
                self.audit.modify_username, self.audit.modify_date_time,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            contact_phone_id: row.get(0)?,
            contact_id: row.get(1)?,
            phone_type: row.get(2)?,
            phone_number: row.get(3)?,
            ext_number: row.get(4)?,
            audit: audit_from_row(row, 5)?,
        })
    }

    fn with_id(self, id: i64) -> Self {
        Self {
            contact_phone_id: id,
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactAddress {
    pub contact_address_id: i64,
    pub contact_id: i64,
    pub address_type: Option<String>,
    pub primary_address: bool,
    pub flat: Option<String>,
    pub property: Option<String>,
    pub street: Option<String>,
    pub area: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub country: Option<String>,
    pub postcode: Option<String>,
    pub verified: bool,
    pub mail_flag: bool,
    pub no_fixed_address: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub comments: Option<String>,
    #[serde(flatten)]
    pub audit: SourceAudit,
}

impl Entity for ContactAddress {
    const KIND: ElementType = ElementType::Address;
    const SELECT_BY_CONTACT: &'static str = "SELECT contact_address_id, contact_id, address_type, primary_address, flat, property,
                street, area, city, county, country, postcode, verified, mail_flag,
                no_fixed_address, start_date, end_date, comments,
                created_by, created_time, updated_by, updated_time
         FROM contact_address WHERE contact_id = ?1 ORDER BY contact_address_id";
    const DELETE_BY_CONTACT: &'static str = "DELETE FROM contact_address WHERE contact_id = ?1";

    fn insert(&self, conn: &Connection) -> rusqlite::Result<i64> {
        conn.execute(
            "INSERT INTO contact_address (contact_id, address_type, primary_address, flat, property,
                street, area, city, county, country, postcode, verified, mail_flag,
                no_fixed_address, start_date, end_date, comments,
                created_by, created_time, updated_by, updated_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                ?18, ?19, ?20, ?21)",
            params![
                self.contact_id, self.address_type, self.primary_address, self.flat, self.property,
                self.street, self.area, self.city, self.county, self.country, self.postcode,
                self.verified, self.mail_flag, self.no_fixed_address,
                self.start_date, self.end_date, self.comments,
                self.audit.create_username, self.audit.create_date_time,
                self.audit.modify_username, self.audit.modify_date_time,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            contact_address_id: row.get(0)?,
            contact_id: row.get(1)?,
            address_type: row.get(2)?,
            primary_address: row.get(3)?,
            flat: row.get(4)?,
            property: row.get(5)?,
            street: row.get(6)?,
            area: row.get(7)?,
            city: row.get(8)?,
            county: row.get(9)?,
            country: row.get(10)?,
            postcode: row.get(11)?,
            verified: row.get(12)?,
            mail_flag: row.get(13)?,
            no_fixed_address: row.get(14)?,
            start_date: row.get(15)?,
            end_date: row.get(16)?,
            comments: row.get(17)?,
            audit: audit_from_row(row, 18)?,
        })
    }

    fn with_id(self, id: i64) -> Self {
        Self {
            contact_address_id: id,
            ..self
        }
    }
}

/// Links an address to one of the contact's phone rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactAddressPhone {
    pub contact_address_phone_id: i64,
    pub contact_id: i64,
    pub contact_address_id: i64,
    pub contact_phone_id: i64,
    #[serde(flatten)]
    pub audit: SourceAudit,
}

impl Entity for ContactAddressPhone {
    const KIND: ElementType = ElementType::AddressPhone;
    const SELECT_BY_CONTACT: &'static str = "SELECT contact_address_phone_id, contact_id, contact_address_id, contact_phone_id,
                created_by, created_time, updated_by, updated_time
         FROM contact_address_phone WHERE contact_id = ?1 ORDER BY contact_address_phone_id";
    const DELETE_BY_CONTACT: &'static str = "DELETE FROM contact_address_phone WHERE contact_id = ?1";

    fn insert(&self, conn: &Connection) -> rusqlite::Result<i64> {
        conn.execute(
            "INSERT INTO contact_address_phone (contact_id, contact_address_id, contact_phone_id,
                created_by, created_time, updated_by, updated_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                self.contact_id, self.contact_address_id, self.contact_phone_id,
                self.audit.create_username, self.audit.create_date_time,
                self.audit.modify_username, self.audit.modify_date_time,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            contact_address_phone_id: row.get(0)?,
            contact_id: row.get(1)?,
            contact_address_id: row.get(2)?,
            contact_phone_id: row.get(3)?,
            audit: audit_from_row(row, 4)?,
        })
    }

    fn with_id(self, id: i64) -> Self {
        Self {
            contact_address_phone_id: id,
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactEmail {
    pub contact_email_id: i64,
    pub contact_id: i64,
    pub email_address: String,
    #[serde(flatten)]
    pub audit: SourceAudit,
}

impl Entity for ContactEmail {
    const KIND: ElementType = ElementType::Email;
    const SELECT_BY_CONTACT: &'static str = "SELECT contact_email_id, contact_id, email_address,
                created_by, created_time, updated_by, updated_time
         FROM contact_email WHERE contact_id = ?1 ORDER BY contact_email_id";
    const DELETE_BY_CONTACT: &'static str = "DELETE FROM contact_email WHERE contact_id = ?1";

    fn insert(&self, conn: &Connection) -> rusqlite::Result<i64> {
        conn.execute(
            "INSERT INTO contact_email (contact_id, email_address,
                created_by, created_time, updated_by, updated_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                self.contact_id, self.email_address,
                self.audit.create_username, self.audit.create_date_time,
                self.audit.modify_username, self.audit.modify_date_time,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            contact_email_id: row.get(0)?,
            contact_id: row.get(1)?,
            email_address: row.get(2)?,
            audit: audit_from_row(row, 3)?,
        })
    }

    fn with_id(self, id: i64) -> Self {
        Self {
            contact_email_id: id,
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactIdentity {
    pub contact_identity_id: i64,
    pub contact_id: i64,
    pub identity_type: String,
    pub identity: String,
    pub issuing_authority: Option<String>,
    #[serde(flatten)]
    pub audit: SourceAudit,
}

impl Entity for ContactIdentity {
    const KIND: ElementType = ElementType::Identity;
    const SELECT_BY_CONTACT: &'static str = "SELECT contact_identity_id, contact_id, identity_type, identity, issuing_authority,
                created_by, created_time, updated_by, updated_time
         FROM contact_identity WHERE contact_id = ?1 ORDER BY contact_identity_id";
    const DELETE_BY_CONTACT: &'static str = "DELETE FROM contact_identity WHERE contact_id = ?1";

    fn insert(&self, conn: &Connection) -> rusqlite::Result<i64> {
        conn.execute(
            "INSERT INTO contact_identity (contact_id, identity_type, identity, issuing_authority,
                created_by, created_time, updated_by, updated_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                self.contact_id, self.identity_type, self.identity, self.issuing_authority,
                self.audit.create_username, self.audit.create_date_time,
                self.audit.modify_username, self.audit.modify_date_time,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            contact_identity_id: row.get(0)?,
            contact_id: row.get(1)?,
            identity_type: row.get(2)?,
            identity: row.get(3)?,
            issuing_authority: row.get(4)?,
            audit: audit_from_row(row, 5)?,
        })
    }

    fn with_id(self, id: i64) -> Self {
        Self {
            contact_identity_id: id,
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRestriction {
    pub contact_restriction_id: i64,
    pub contact_id: i64,
    pub restriction_type: String,
    pub start_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub comments: Option<String>,
    pub staff_username: Option<String>,
    #[serde(flatten)]
    pub audit: SourceAudit,
}

impl Entity for ContactRestriction {
    const KIND: ElementType = ElementType::Restriction;
    const SELECT_BY_CONTACT: &'static str = "SELECT contact_restriction_id, contact_id, restriction_type, start_date, expiry_date,
                comments, staff_username, created_by, created_time, updated_by, updated_time
         FROM contact_restriction WHERE contact_id = ?1 ORDER BY contact_restriction_id";
    const DELETE_BY_CONTACT: &'static str = "DELETE FROM contact_restriction WHERE contact_id = ?1";

    fn insert(&self, conn: &Connection) -> rusqlite::Result<i64> {
        conn.execute(
            "INSERT INTO contact_restriction (contact_id, restriction_type, start_date, expiry_date,
                comments, staff_username, created_by, created_time, updated_by, updated_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                self.contact_id, self.restriction_type, self.start_date, self.expiry_date,
                self.comments, self.staff_username,
                self.audit.create_username, self.audit.create_date_time,
                self.audit.modify_username, self.audit.modify_date_time,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            contact_restriction_id: row.get(0)?,
            contact_id: row.get(1)?,
            restriction_type: row.get(2)?,
            start_date: row.get(3)?,
            expiry_date: row.get(4)?,
            comments: row.get(5)?,
            staff_username: row.get(6)?,
            audit: audit_from_row(row, 7)?,
        })
    }

    fn with_id(self, id: i64) -> Self {
        Self {
            contact_restriction_id: id,
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Employment {
    pub employment_id: i64,
    pub contact_id: i64,
    pub organisation_id: i64,
    pub active: bool,
    #[serde(flatten)]
    pub audit: SourceAudit,
}

impl Entity for Employment {
    const KIND: ElementType = ElementType::Employment;
    const SELECT_BY_CONTACT: &'static str = "SELECT employment_id, contact_id, organisation_id, active,
                created_by, created_time, updated_by, updated_time
         FROM employment WHERE contact_id = ?1 ORDER BY employment_id";
    const DELETE_BY_CONTACT: &'static str = "DELETE FROM employment WHERE contact_id = ?1";

    fn insert(&self, conn: &Connection) -> rusqlite::Result<i64> {
        conn.execute(
            "INSERT INTO employment (contact_id, organisation_id, active,
                created_by, created_time, updated_by, updated_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                self.contact_id, self.organisation_id, self.active,
                self.audit.create_username, self.audit.create_date_time,
                self.audit.modify_username, self.audit.modify_date_time,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            employment_id: row.get(0)?,
            contact_id: row.get(1)?,
            organisation_id: row.get(2)?,
            active: row.get(3)?,
            audit: audit_from_row(row, 4)?,
        })
    }

    fn with_id(self, id: i64) -> Self {
        Self {
            employment_id: id,
            ..self
        }
    }
}

/// A relationship between the contact and a prisoner.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrisonerContact {
    pub prisoner_contact_id: i64,
    pub contact_id: i64,
    pub prisoner_number: String,
    pub contact_type: String,
    pub relationship_type: String,
    pub current_term: bool,
    pub active: bool,
    pub expiry_date: Option<NaiveDate>,
    pub approved_visitor: bool,
    pub next_of_kin: bool,
    pub emergency_contact: bool,
    pub comments: Option<String>,
    #[serde(flatten)]
    pub audit: SourceAudit,
}

impl Entity for PrisonerContact {
    const KIND: ElementType = ElementType::PrisonerContact;
    const SELECT_BY_CONTACT: &'static str = "SELECT prisoner_contact_id, contact_id, prisoner_number, contact_type, relationship_type,
                current_term, active, expiry_date, approved_visitor, next_of_kin, emergency_contact,
                comments, created_by, created_time, updated_by, updated_time
         FROM prisoner_contact WHERE contact_id = ?1 ORDER BY prisoner_contact_id";
    const DELETE_BY_CONTACT: &'static str = "DELETE FROM prisoner_contact WHERE contact_id = ?1";

    fn insert(&self, conn: &Connection) -> rusqlite::Result<i64> {
        conn.execute(
            "INSERT INTO prisoner_contact (contact_id, prisoner_number, contact_type, relationship_type,
                current_term, active, expiry_date, approved_visitor, next_of_kin, emergency_contact,
                comments, created_by, created_time, updated_by, updated_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                self.contact_id, self.prisoner_number, self.contact_type, self.relationship_type,
                self.current_term, self.active, self.expiry_date,
                self.approved_visitor, self.next_of_kin, self.emergency_contact, self.comments,
                self.audit.create_username, self.audit.create_date_time,
                self.audit.modify_username, self.audit.modify_date_time,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            prisoner_contact_id: row.get(0)?,
            contact_id: row.get(1)?,
            prisoner_number: row.get(2)?,
            contact_type: row.get(3)?,
            relationship_type: row.get(4)?,
            current_term: row.get(5)?,
            active: row.get(6)?,
            expiry_date: row.get(7)?,
            approved_visitor: row.get(8)?,
            next_of_kin: row.get(9)?,
            emergency_contact: row.get(10)?,
            comments: row.get(11)?,
            audit: audit_from_row(row, 12)?,
        })
    }

    fn with_id(self, id: i64) -> Self {
        Self {
            prisoner_contact_id: id,
            ..self
        }
    }
}

/// A restriction scoped to one relationship rather than to the contact.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrisonerContactRestriction {
    pub prisoner_contact_restriction_id: i64,
    pub prisoner_contact_id: i64,
    pub restriction_type: String,
    pub start_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub comments: Option<String>,
    pub staff_username: Option<String>,
    #[serde(flatten)]
    pub audit: SourceAudit,
}

impl Entity for PrisonerContactRestriction {
    const KIND: ElementType = ElementType::PrisonerContactRestriction;
    const SELECT_BY_CONTACT: &'static str = "SELECT r.prisoner_contact_restriction_id, r.prisoner_contact_id, r.restriction_type,
                r.start_date, r.expiry_date, r.comments, r.staff_username,
                r.created_by, r.created_time, r.updated_by, r.updated_time
         FROM prisoner_contact_restriction r
         JOIN prisoner_contact pc ON pc.prisoner_contact_id = r.prisoner_contact_id
         WHERE pc.contact_id = ?1
         ORDER BY r.prisoner_contact_restriction_id";
    const DELETE_BY_CONTACT: &'static str = "DELETE FROM prisoner_contact_restriction WHERE prisoner_contact_id IN (
            SELECT prisoner_contact_id FROM prisoner_contact WHERE contact_id = ?1
         )";

    fn insert(&self, conn: &Connection) -> rusqlite::Result<i64> {
        conn.execute(
            "INSERT INTO prisoner_contact_restriction (prisoner_contact_id, restriction_type,
                start_date, expiry_date, comments, staff_username,
                created_by, created_time, updated_by, updated_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                self.prisoner_contact_id, self.restriction_type,
                self.start_date, self.expiry_date, self.comments, self.staff_username,
                self.audit.create_username, self.audit.create_date_time,
                self.audit.modify_username, self.audit.modify_date_time,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            prisoner_contact_restriction_id: row.get(0)?,
            prisoner_contact_id: row.get(1)?,
            restriction_type: row.get(2)?,
            start_date: row.get(3)?,
            expiry_date: row.get(4)?,
            comments: row.get(5)?,
            staff_username: row.get(6)?,
            audit: audit_from_row(row, 7)?,
        })
    }

    fn with_id(self, id: i64) -> Self {
        Self {
            prisoner_contact_restriction_id: id,
            ..self
        }
    }
}
