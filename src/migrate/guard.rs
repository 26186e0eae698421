use tracing::debug;

use crate::error::Result;
use crate::model::ElementType;
use crate::store::entity::{
    ContactAddress, ContactAddressPhone, ContactEmail, ContactIdentity, ContactPhone,
    ContactRestriction, Employment, Entity, PrisonerContact, PrisonerContactRestriction,
};
use crate::store::port::ContactPort;

fn clear<E: Entity, P: ContactPort>(port: &P, contact_id: i64) -> Result<usize> {
    let removed = port
        .delete_all_by_contact::<E>(contact_id)
        .map_err(|e| e.during(contact_id, E::KIND))?;
    if removed > 0 {
        debug!(contact_id, kind = %E::KIND, removed, "cleared previous rows");
    }
    Ok(removed)
}

/// Delete a previously migrated aggregate for `contact_id`, children before
/// parents. Returns whether there was one.
pub fn remove_existing<P: ContactPort>(port: &P, contact_id: i64) -> Result<bool> {
    let exists = port
        .contact_exists(contact_id)
        .map_err(|e| e.during(contact_id, ElementType::Contact))?;
    if !exists {
        return Ok(false);
    }

    clear::<PrisonerContactRestriction, _>(port, contact_id)?;
    clear::<PrisonerContact, _>(port, contact_id)?;
    clear::<ContactAddressPhone, _>(port, contact_id)?;
    clear::<ContactPhone, _>(port, contact_id)?;
    clear::<ContactAddress, _>(port, contact_id)?;
    clear::<ContactEmail, _>(port, contact_id)?;
    clear::<ContactIdentity, _>(port, contact_id)?;
    clear::<ContactRestriction, _>(port, contact_id)?;
    clear::<Employment, _>(port, contact_id)?;
    port.delete_contact(contact_id)
        .map_err(|e| e.during(contact_id, ElementType::Contact))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrate::extract;
    use crate::model::MigrateContactRequest;
    use crate::store::db::Db;
    use crate::store::port::SqlitePort;

    fn migrate(port: &SqlitePort<'_>, request: &MigrateContactRequest) {
        let contact = extract::contact(port, request).unwrap();
        extract::children(port, contact, request).unwrap();
    }

    fn full_request() -> MigrateContactRequest {
        serde_json::from_str(
            r#"{
                "personId": 4, "lastName": "Brown", "firstName": "Sam",
                "phoneNumbers": [{"phoneId": 1, "number": "1", "type": "HOME"}],
                "addresses": [{"addressId": 2,
                    "phoneNumbers": [{"phoneId": 3, "number": "3", "type": "HOME"}]}],
                "emailAddresses": [{"emailAddressId": 4, "email": "s@example.com"}],
                "identifiers": [{"sequence": 1, "type": "DL", "identifier": "X1"}],
                "restrictions": [{"id": 5, "type": "BAN"}],
                "employments": [{"sequence": 1, "corporateId": 77, "active": true}],
                "contacts": [{"id": 6, "contactType": "S", "relationshipType": "SIS",
                    "prisonerNumber": "A0001AA", "restrictions": [{"id": 7, "type": "CCTV"}]}]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn absent_contact_is_left_alone() {
        let db = Db::open_memory(1_000).unwrap();
        let port = SqlitePort::new(db.conn());
        assert!(!remove_existing(&port, 4).unwrap());
    }

    #[test]
    fn removes_every_kind_then_the_contact() {
        let db = Db::open_memory(1_000).unwrap();
        let port = SqlitePort::new(db.conn());
        migrate(&port, &full_request());

        assert!(remove_existing(&port, 4).unwrap());
        assert!(db.load_aggregate(4).unwrap().is_none());
        assert!(db.load::<ContactPhone>(4).unwrap().is_empty());
        assert!(db.load::<ContactAddressPhone>(4).unwrap().is_empty());
        assert!(db.load::<PrisonerContactRestriction>(4).unwrap().is_empty());
        assert!(db.load::<Employment>(4).unwrap().is_empty());
    }

    #[test]
    fn leaves_other_contacts_untouched() {
        let db = Db::open_memory(1_000).unwrap();
        let port = SqlitePort::new(db.conn());
        let mut other = full_request();
        other.person_id = 5;
        migrate(&port, &full_request());
        migrate(&port, &other);

        remove_existing(&port, 4).unwrap();
        let remaining = db.load_aggregate(5).unwrap().unwrap();
        assert_eq!(remaining.relationship_restrictions.len(), 1);
        assert_eq!(remaining.phones.len(), 2);
    }
}
