use std::cell::Cell;
use std::collections::HashSet;
use std::io;

use serde_json::{Value, json};
use tempfile::tempdir;

use contact_migrate::error::{MigrateError, Result};
use contact_migrate::migrate::{self, Migrated, Migrator};
use contact_migrate::model::{ElementType, MigrateContactRequest};
use contact_migrate::store::db::Db;
use contact_migrate::store::entity::Entity;
use contact_migrate::store::port::{ContactPort, SqlitePort};

const THRESHOLD: i64 = 20_000_000;

fn record(value: Value) -> MigrateContactRequest {
    serde_json::from_value(value).unwrap()
}

fn migrator() -> Migrator {
    Migrator::new(Db::open_memory(THRESHOLD).unwrap())
}

/// Delegates to SQLite but refuses the `fail_on`-th save (1-based).
struct FaultyPort<'a> {
    inner: SqlitePort<'a>,
    fail_on: Option<usize>,
    saves: Cell<usize>,
}

impl ContactPort for FaultyPort<'_> {
    fn contact_exists(&self, contact_id: i64) -> Result<bool> {
        self.inner.contact_exists(contact_id)
    }

    fn save<E: Entity>(&self, entity: E) -> Result<E> {
        let n = self.saves.get() + 1;
        self.saves.set(n);
        if self.fail_on == Some(n) {
            return Err(MigrateError::Io(io::Error::other("write refused")));
        }
        self.inner.save(entity)
    }

    fn delete_all_by_contact<E: Entity>(&self, contact_id: i64) -> Result<usize> {
        self.inner.delete_all_by_contact::<E>(contact_id)
    }

    fn delete_contact(&self, contact_id: i64) -> Result<usize> {
        self.inner.delete_contact(contact_id)
    }
}

/// One unit of work over a `FaultyPort`; the transaction commits only if
/// every stage succeeds.
fn migrate_failing_at(
    db: &mut Db,
    request: &MigrateContactRequest,
    fail_on: Option<usize>,
) -> Result<Migrated> {
    let tx = db.immediate_transaction()?;
    let port = FaultyPort {
        inner: SqlitePort::new(&tx),
        fail_on,
        saves: Cell::new(0),
    };
    let migrated = migrate::run(&port, request)?;
    tx.commit()?;
    Ok(migrated)
}

/// A person with one of everything, plus a second phone and relationship.
fn full_record(person_id: i64) -> MigrateContactRequest {
    record(json!({
        "personId": person_id,
        "title": "MR",
        "lastName": "Okafor",
        "firstName": "Chidi",
        "dateOfBirth": "1981-03-14",
        "gender": "M",
        "staff": false,
        "createUsername": "MIGRATE",
        "createDateTime": "2019-05-01T10:15:00",
        "phoneNumbers": [
            {"phoneId": 11, "number": "0114 496 0000", "type": "HOME"},
            {"phoneId": 12, "number": "07700 900000", "type": "MOB", "extension": "9"}
        ],
        "addresses": [{
            "addressId": 21, "addressType": "HOME", "primaryAddress": true,
            "premise": "4", "street": "Mill Lane", "city": "Sheffield", "postcode": "S1 1AA",
            "phoneNumbers": [{"phoneId": 22, "number": "0114 496 0001", "type": "HOME"}]
        }],
        "emailAddresses": [{"emailAddressId": 31, "email": "chidi@example.com"}],
        "identifiers": [{"sequence": 1, "type": "PASS", "identifier": "P123", "issuedAuthority": "UKPS"}],
        "restrictions": [{"id": 41, "type": "BAN", "effectiveDate": "2020-01-01"}],
        "employments": [{"sequence": 1, "corporateId": 9001, "active": true}],
        "contacts": [
            {"id": 51, "contactType": "S", "relationshipType": "BRO", "prisonerNumber": "A1234BC",
             "currentTerm": true, "active": true, "nextOfKin": true,
             "restrictions": [{"id": 61, "type": "CCTV"}, {"id": 62, "type": "PREINF"}]},
            {"id": 52, "contactType": "O", "relationshipType": "DR", "prisonerNumber": "B2345CD"}
        ]
    }))
}

#[test]
fn migrating_a_person_twice_leaves_one_aggregate() {
    let mut migrator = migrator();
    let first = migrator.migrate(&full_record(7)).unwrap();
    let second = migrator.migrate(&full_record(7)).unwrap();

    let aggregate = migrator.db().load_aggregate(7).unwrap().unwrap();
    // two direct phones plus the address phone
    assert_eq!(aggregate.phones.len(), 3);
    assert_eq!(aggregate.addresses.len(), 1);
    assert_eq!(aggregate.address_phones.len(), 1);
    assert_eq!(aggregate.emails.len(), 1);
    assert_eq!(aggregate.identities.len(), 1);
    assert_eq!(aggregate.restrictions.len(), 1);
    assert_eq!(aggregate.employments.len(), 1);
    assert_eq!(aggregate.relationships.len(), 2);
    assert_eq!(aggregate.relationship_restrictions.len(), 2);

    assert_eq!(first.entries().len(), second.entries().len());
    let source_ids = |r: &contact_migrate::migrate::MigrateContactResponse| {
        r.entries().iter().map(|e| e.source_id).collect::<Vec<_>>()
    };
    assert_eq!(source_ids(&first), source_ids(&second));

    assert_eq!(first.contact.destination_id, second.contact.destination_id);
    // each kind has its own sequence, so ids are only unique per kind
    let generated = |r: &contact_migrate::migrate::MigrateContactResponse| {
        r.entries()
            .iter()
            .skip(1)
            .map(|e| (e.element_type, e.destination_id))
            .collect::<HashSet<_>>()
    };
    let (before, after) = (generated(&first), generated(&second));
    assert_eq!(after.len(), second.entries().len() - 1);
    assert!(before.is_disjoint(&after), "reused ids: {:?}", before.intersection(&after));

    let live: HashSet<i64> = aggregate.phones.iter().map(|p| p.contact_phone_id).collect();
    assert!(second
        .phone_numbers
        .iter()
        .all(|p| live.contains(&p.destination_id)));
}

#[test]
fn generated_ids_never_fall_in_the_source_range() {
    let mut migrator = migrator();
    let report = migrator.migrate(&full_record(19_999_999)).unwrap();

    assert_eq!(report.contact.destination_id, 19_999_999);
    for entry in report.entries().iter().skip(1) {
        assert!(
            entry.destination_id >= THRESHOLD,
            "{} {} got destination {}",
            entry.element_type,
            entry.source_id,
            entry.destination_id
        );
    }
    assert_eq!(report.phone_numbers[0].destination_id, THRESHOLD);
}

#[test]
fn contact_keeps_its_source_id() {
    let mut migrator = migrator();
    let report = migrator.migrate(&full_record(123_456)).unwrap();
    assert_eq!(report.contact.element_type, ElementType::Contact);
    assert_eq!(report.contact.source_id, 123_456);
    assert_eq!(report.contact.destination_id, 123_456);
    assert_eq!(report.last_name, "Okafor");
    assert_eq!(
        report.date_of_birth.map(|d| d.to_string()).as_deref(),
        Some("1981-03-14")
    );
}

#[test]
fn every_report_entry_resolves_to_a_persisted_row() {
    let mut migrator = migrator();
    let report = migrator.migrate(&full_record(8)).unwrap();
    let aggregate = migrator.db().load_aggregate(8).unwrap().unwrap();

    let phone_ids: HashSet<i64> = aggregate.phones.iter().map(|p| p.contact_phone_id).collect();
    let link_ids: HashSet<i64> = aggregate
        .address_phones
        .iter()
        .map(|l| l.contact_address_phone_id)
        .collect();
    let rel_ids: HashSet<i64> = aggregate
        .relationships
        .iter()
        .map(|r| r.prisoner_contact_id)
        .collect();

    assert!(report.phone_numbers.iter().all(|p| phone_ids.contains(&p.destination_id)));
    assert_eq!(
        report.addresses[0].address.destination_id,
        aggregate.addresses[0].contact_address_id
    );
    assert!(report.addresses[0]
        .phones
        .iter()
        .all(|p| link_ids.contains(&p.destination_id)));
    assert_eq!(report.emails[0].destination_id, aggregate.emails[0].contact_email_id);
    assert_eq!(
        report.identities[0].destination_id,
        aggregate.identities[0].contact_identity_id
    );
    assert_eq!(
        report.restrictions[0].destination_id,
        aggregate.restrictions[0].contact_restriction_id
    );
    assert_eq!(
        report.employments[0].destination_id,
        aggregate.employments[0].employment_id
    );
    assert!(report
        .relationships
        .iter()
        .all(|r| rel_ids.contains(&r.relationship.destination_id)));

    // restrictions are parented on the relationship they were nested under
    let first_rel = report.relationships[0].relationship.destination_id;
    for restriction in &aggregate.relationship_restrictions {
        assert_eq!(restriction.prisoner_contact_id, first_rel);
    }
}

#[test]
fn persisted_rows_carry_source_values() {
    let mut migrator = migrator();
    migrator.migrate(&full_record(9)).unwrap();
    let aggregate = migrator.db().load_aggregate(9).unwrap().unwrap();

    let contact = &aggregate.contact;
    assert_eq!(contact.title.as_deref(), Some("MR"));
    assert_eq!(contact.audit.create_username.as_deref(), Some("MIGRATE"));
    assert!(contact.audit.create_date_time.is_some());

    let address = &aggregate.addresses[0];
    assert_eq!(address.property.as_deref(), Some("4"));
    assert!(address.primary_address);

    assert_eq!(aggregate.phones[1].ext_number.as_deref(), Some("9"));
    assert_eq!(aggregate.employments[0].organisation_id, 9001);
    assert!(aggregate.relationships[0].next_of_kin);
    assert_eq!(aggregate.identities[0].issuing_authority.as_deref(), Some("UKPS"));
}

#[test]
fn failing_nested_insert_leaves_nothing_behind() {
    let mut db = Db::open_memory(THRESHOLD).unwrap();
    // the 14th save is the second restriction of the first relationship
    let err = migrate_failing_at(&mut db, &full_record(10), Some(14)).unwrap_err();
    match &err {
        MigrateError::Failed {
            contact_id, kind, ..
        } => {
            assert_eq!(*contact_id, 10);
            assert_eq!(*kind, ElementType::PrisonerContactRestriction);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.code(), "migration_failed");
    assert!(db.load_aggregate(10).unwrap().is_none());
}

#[test]
fn failed_remigration_keeps_the_previous_aggregate() {
    let mut db = Db::open_memory(THRESHOLD).unwrap();
    let before = migrate_failing_at(&mut db, &full_record(11), None).unwrap();
    let stored = db.load_aggregate(11).unwrap().unwrap();

    // the guard has already deleted the old rows when the second phone fails
    let err = migrate_failing_at(&mut db, &full_record(11), Some(3)).unwrap_err();
    assert!(matches!(
        err,
        MigrateError::Failed {
            kind: ElementType::Phone,
            ..
        }
    ));

    let after = db.load_aggregate(11).unwrap().unwrap();
    assert_eq!(after, stored);
    assert_eq!(
        after.phones[0].contact_phone_id,
        before.response.phone_numbers[0].destination_id
    );
}

#[test]
fn other_people_still_migrate_after_a_failure() {
    let mut db = Db::open_memory(THRESHOLD).unwrap();
    assert!(migrate_failing_at(&mut db, &full_record(12), Some(9)).is_err());

    let migrated = migrate_failing_at(&mut db, &full_record(13), None).unwrap();
    assert!(db.load_aggregate(12).unwrap().is_none());
    assert!(db.load_aggregate(13).unwrap().is_some());
    assert!(migrated.response.phone_numbers[0].destination_id >= THRESHOLD);
}

#[test]
fn empty_source_values_migrate_unchanged() {
    let mut migrator = migrator();
    let mut record = full_record(20);
    record.phone_numbers[0].number = String::new();
    record.restrictions[0].restriction_type = String::new();
    record.contacts[0].restrictions[0].restriction_type = String::new();

    migrator.migrate(&record).unwrap();
    let aggregate = migrator.db().load_aggregate(20).unwrap().unwrap();
    assert_eq!(aggregate.phones[0].phone_number, "");
    assert_eq!(aggregate.restrictions[0].restriction_type, "");
    assert_eq!(aggregate.relationship_restrictions[0].restriction_type, "");
}

#[test]
fn report_follows_source_order_not_id_order() {
    let mut migrator = migrator();
    let report = migrator
        .migrate(&record(json!({
            "personId": 14, "lastName": "Ng", "firstName": "Mei",
            "phoneNumbers": [
                {"phoneId": 5, "number": "5", "type": "HOME"},
                {"phoneId": 9, "number": "9", "type": "HOME"},
                {"phoneId": 2, "number": "2", "type": "HOME"}
            ]
        })))
        .unwrap();

    let sources: Vec<i64> = report.phone_numbers.iter().map(|p| p.source_id).collect();
    assert_eq!(sources, vec![5, 9, 2]);
    let destinations: Vec<i64> = report
        .phone_numbers
        .iter()
        .map(|p| p.destination_id)
        .collect();
    assert!(destinations.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn relationship_with_two_restrictions() {
    let mut migrator = migrator();
    let report = migrator
        .migrate(&record(json!({
            "personId": 1, "lastName": "Smith", "firstName": "Jo",
            "phoneNumbers": [{"phoneId": 10, "number": "0114", "type": "HOME"}],
            "contacts": [{
                "id": 100, "contactType": "S", "relationshipType": "BRO",
                "prisonerNumber": "A1234BC",
                "restrictions": [{"id": 200, "type": "BAN"}, {"id": 201, "type": "CCTV"}]
            }]
        })))
        .unwrap();

    let triples: Vec<(ElementType, i64)> = report
        .entries()
        .iter()
        .map(|e| (e.element_type, e.source_id))
        .collect();
    assert_eq!(
        triples,
        vec![
            (ElementType::Contact, 1),
            (ElementType::Phone, 10),
            (ElementType::PrisonerContact, 100),
            (ElementType::PrisonerContactRestriction, 200),
            (ElementType::PrisonerContactRestriction, 201),
        ]
    );
    assert_eq!(report.contact.destination_id, 1);
    assert!(report.addresses.is_empty());
    assert!(report.emails.is_empty());
    assert!(report.identities.is_empty());
    assert!(report.restrictions.is_empty());
    assert!(report.employments.is_empty());

    let aggregate = migrator.db().load_aggregate(1).unwrap().unwrap();
    let rel_id = aggregate.relationships[0].prisoner_contact_id;
    assert_eq!(report.relationships[0].relationship.destination_id, rel_id);
    assert!(aggregate
        .relationship_restrictions
        .iter()
        .all(|r| r.prisoner_contact_id == rel_id));
}

#[test]
fn minimal_record_migrates_with_empty_collections() {
    let mut migrator = migrator();
    let report = migrator
        .migrate(&record(json!({"personId": 15, "lastName": "Ives", "firstName": "Ann"})))
        .unwrap();
    assert_eq!(report.entries().len(), 1);
    assert!(migrator.db().contact_exists(15).unwrap());
}

#[test]
fn out_of_range_source_id_is_rejected_before_any_write() {
    let mut migrator = migrator();
    let mut bad = full_record(16);
    bad.contacts[1].id = THRESHOLD + 5;
    let err = migrator.migrate(&bad).unwrap_err();
    assert!(matches!(
        err,
        MigrateError::SourceIdOutOfRange {
            kind: ElementType::PrisonerContact,
            ..
        }
    ));
    assert!(!migrator.db().contact_exists(16).unwrap());
}

#[test]
fn remove_deletes_the_whole_aggregate() {
    let mut migrator = migrator();
    migrator.migrate(&full_record(17)).unwrap();
    migrator.migrate(&full_record(18)).unwrap();

    migrator.remove(17).unwrap();
    assert!(migrator.db().load_aggregate(17).unwrap().is_none());
    assert!(matches!(
        migrator.remove(17).unwrap_err(),
        MigrateError::ContactNotFound(17)
    ));
    assert!(migrator.db().load_aggregate(18).unwrap().is_some());
}

#[test]
fn file_database_keeps_sequences_across_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("contacts.db");

    let first = {
        let mut migrator = Migrator::new(Db::open(&path, THRESHOLD).unwrap())
            .with_lock_dir(dir.path().join("locks"));
        migrator.migrate(&full_record(19)).unwrap()
    };
    let mut migrator =
        Migrator::new(Db::open(&path, THRESHOLD).unwrap()).with_lock_dir(dir.path().join("locks"));
    let second = migrator.migrate(&full_record(19)).unwrap();

    assert!(second.phone_numbers[0].destination_id > first.phone_numbers[1].destination_id);
    assert_eq!(
        migrator.db().load_aggregate(19).unwrap().unwrap().phones.len(),
        3
    );
}
