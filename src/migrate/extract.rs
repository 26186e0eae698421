use crate::error::Result;
use crate::model::{
    MigrateAddress, MigrateContactRequest, MigrateEmailAddress, MigrateEmployment,
    MigrateIdentifier, MigratePhoneNumber, MigrateRelationship, MigrateRelationshipRestriction,
    MigrateRestriction,
};
use crate::store::entity::{
    Contact, ContactAddress, ContactAddressPhone, ContactEmail, ContactIdentity, ContactPhone,
    ContactRestriction, Employment, Entity, PrisonerContact, PrisonerContactRestriction,
};
use crate::store::port::ContactPort;

/// A persisted entity paired with the source id it was migrated from.
#[derive(Debug, Clone, PartialEq)]
pub struct Correlated<E> {
    pub source_id: i64,
    pub entity: E,
}

/// The children persisted beneath one parent, in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Nested<C> {
    pub parent_source_id: i64,
    pub children: Vec<Correlated<C>>,
}

/// An address-specific phone: the phone row plus the row linking it to its address.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressPhone {
    pub phone: ContactPhone,
    pub link: ContactAddressPhone,
}

/// Everything one migration persisted, stage by stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub contact: Correlated<Contact>,
    pub phones: Vec<Correlated<ContactPhone>>,
    pub addresses: Vec<Correlated<ContactAddress>>,
    pub address_phones: Vec<Nested<AddressPhone>>,
    pub emails: Vec<Correlated<ContactEmail>>,
    pub identities: Vec<Correlated<ContactIdentity>>,
    pub restrictions: Vec<Correlated<ContactRestriction>>,
    pub employments: Vec<Correlated<Employment>>,
    pub relationships: Vec<Correlated<PrisonerContact>>,
    pub relationship_restrictions: Vec<Nested<PrisonerContactRestriction>>,
}

trait SourceItem {
    fn source_id(&self) -> i64;
}

macro_rules! source_item {
    ($($ty:ty => $field:ident),* $(,)?) => {
        $(impl SourceItem for $ty {
            fn source_id(&self) -> i64 {
                self.$field
            }
        })*
    };
}

source_item! {
    MigratePhoneNumber => phone_id,
    MigrateAddress => address_id,
    MigrateEmailAddress => email_address_id,
    MigrateIdentifier => sequence,
    MigrateRestriction => id,
    MigrateEmployment => sequence,
    MigrateRelationship => id,
    MigrateRelationshipRestriction => id,
}

/// Map, persist and correlate every item of one source collection, keeping
/// source order.
fn extract_all<P, T, E, F>(port: &P, contact_id: i64, items: &[T], map: F) -> Result<Vec<Correlated<E>>>
where
    P: ContactPort,
    T: SourceItem,
    E: Entity,
    F: Fn(&T) -> E,
{
    items
        .iter()
        .map(|item| {
            let entity = port
                .save(map(item))
                .map_err(|e| e.during(contact_id, E::KIND))?;
            Ok(Correlated {
                source_id: item.source_id(),
                entity,
            })
        })
        .collect()
}

/// The top-level record. Its destination id is the source person id.
pub fn contact<P: ContactPort>(port: &P, request: &MigrateContactRequest) -> Result<Correlated<Contact>> {
    let entity = Contact {
        contact_id: request.person_id,
        title: request.title.clone(),
        last_name: request.last_name.clone(),
        first_name: request.first_name.clone(),
        middle_name: request.middle_name.clone(),
        date_of_birth: request.date_of_birth,
        gender: request.gender.clone(),
        domestic_status: request.domestic_status.clone(),
        language: request.language.clone(),
        interpreter_required: request.interpreter_required,
        staff: request.staff,
        remitter: request.remitter,
        deceased: request.deceased_flag,
        deceased_date: request.deceased_date,
        audit: request.audit.clone(),
    };
    let entity = port
        .save(entity)
        .map_err(|e| e.during(request.person_id, Contact::KIND))?;
    Ok(Correlated {
        source_id: request.person_id,
        entity,
    })
}

fn phone_row(contact_id: i64, phone: &MigratePhoneNumber) -> ContactPhone {
    ContactPhone {
        contact_phone_id: 0,
        contact_id,
        phone_type: phone.phone_type.clone(),
        phone_number: phone.number.clone(),
        ext_number: phone.extension.clone(),
        audit: phone.audit.clone(),
    }
}

pub fn phones<P: ContactPort>(
    port: &P,
    contact: &Contact,
    items: &[MigratePhoneNumber],
) -> Result<Vec<Correlated<ContactPhone>>> {
    let contact_id = contact.contact_id;
    extract_all(port, contact_id, items, |p| phone_row(contact_id, p))
}

pub fn addresses<P: ContactPort>(
    port: &P,
    contact: &Contact,
    items: &[MigrateAddress],
) -> Result<Vec<Correlated<ContactAddress>>> {
    let contact_id = contact.contact_id;
    extract_all(port, contact_id, items, |a| ContactAddress {
        contact_address_id: 0,
        contact_id,
        address_type: a.address_type.clone(),
        primary_address: a.primary_address,
        flat: a.flat.clone(),
        property: a.premise.clone(),
        street: a.street.clone(),
        area: a.locality.clone(),
        city: a.city.clone(),
        county: a.county.clone(),
        country: a.country.clone(),
        postcode: a.postcode.clone(),
        verified: a.verified,
        mail_flag: a.mail_address,
        no_fixed_address: a.no_fixed_address,
        start_date: a.start_date,
        end_date: a.end_date,
        comments: a.comment.clone(),
        audit: a.audit.clone(),
    })
}

/// Second address stage: needs each address's new destination id.
pub fn address_phones<P: ContactPort>(
    port: &P,
    addresses: &[Correlated<ContactAddress>],
    items: &[MigrateAddress],
) -> Result<Vec<Nested<AddressPhone>>> {
    addresses
        .iter()
        .zip(items)
        .map(|(address, source)| {
            let contact_id = address.entity.contact_id;
            let children = source
                .phone_numbers
                .iter()
                .map(|p| {
                    let phone = port
                        .save(phone_row(contact_id, p))
                        .map_err(|e| e.during(contact_id, ContactAddressPhone::KIND))?;
                    let link = port
                        .save(ContactAddressPhone {
                            contact_address_phone_id: 0,
                            contact_id,
                            contact_address_id: address.entity.contact_address_id,
                            contact_phone_id: phone.contact_phone_id,
                            audit: p.audit.clone(),
                        })
                        .map_err(|e| e.during(contact_id, ContactAddressPhone::KIND))?;
                    Ok(Correlated {
                        source_id: p.phone_id,
                        entity: AddressPhone { phone, link },
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Nested {
                parent_source_id: address.source_id,
                children,
            })
        })
        .collect()
}

pub fn emails<P: ContactPort>(
    port: &P,
    contact: &Contact,
    items: &[MigrateEmailAddress],
) -> Result<Vec<Correlated<ContactEmail>>> {
    let contact_id = contact.contact_id;
    extract_all(port, contact_id, items, |e| ContactEmail {
        contact_email_id: 0,
        contact_id,
        email_address: e.email.clone(),
        audit: e.audit.clone(),
    })
}

pub fn identities<P: ContactPort>(
    port: &P,
    contact: &Contact,
    items: &[MigrateIdentifier],
) -> Result<Vec<Correlated<ContactIdentity>>> {
    let contact_id = contact.contact_id;
    extract_all(port, contact_id, items, |i| ContactIdentity {
        contact_identity_id: 0,
        contact_id,
        identity_type: i.identity_type.clone(),
        identity: i.identifier.clone(),
        issuing_authority: i.issued_authority.clone(),
        audit: i.audit.clone(),
    })
}

pub fn restrictions<P: ContactPort>(
    port: &P,
    contact: &Contact,
    items: &[MigrateRestriction],
) -> Result<Vec<Correlated<ContactRestriction>>> {
    let contact_id = contact.contact_id;
    extract_all(port, contact_id, items, |r| ContactRestriction {
        contact_restriction_id: 0,
        contact_id,
        restriction_type: r.restriction_type.clone(),
        start_date: r.effective_date,
        expiry_date: r.expiry_date,
        comments: r.comment.clone(),
        staff_username: r.staff_username.clone(),
        audit: r.audit.clone(),
    })
}

pub fn employments<P: ContactPort>(
    port: &P,
    contact: &Contact,
    items: &[MigrateEmployment],
) -> Result<Vec<Correlated<Employment>>> {
    let contact_id = contact.contact_id;
    extract_all(port, contact_id, items, |e| Employment {
        employment_id: 0,
        contact_id,
        organisation_id: e.corporate_id,
        active: e.active,
        audit: e.audit.clone(),
    })
}

pub fn relationships<P: ContactPort>(
    port: &P,
    contact: &Contact,
    items: &[MigrateRelationship],
) -> Result<Vec<Correlated<PrisonerContact>>> {
    let contact_id = contact.contact_id;
    extract_all(port, contact_id, items, |r| PrisonerContact {
        prisoner_contact_id: 0,
        contact_id,
        prisoner_number: r.prisoner_number.clone(),
        contact_type: r.contact_type.clone(),
        relationship_type: r.relationship_type.clone(),
        current_term: r.current_term,
        active: r.active,
        expiry_date: r.expiry_date,
        approved_visitor: r.approved_visitor,
        next_of_kin: r.next_of_kin,
        emergency_contact: r.emergency_contact,
        comments: r.comment.clone(),
        audit: r.audit.clone(),
    })
}

/// Second relationship stage: each restriction is parented on the
/// relationship's new destination id, never its source id.
pub fn relationship_restrictions<P: ContactPort>(
    port: &P,
    relationships: &[Correlated<PrisonerContact>],
    items: &[MigrateRelationship],
) -> Result<Vec<Nested<PrisonerContactRestriction>>> {
    relationships
        .iter()
        .zip(items)
        .map(|(relationship, source)| {
            let parent_id = relationship.entity.prisoner_contact_id;
            let children = extract_all(
                port,
                relationship.entity.contact_id,
                &source.restrictions,
                |r| PrisonerContactRestriction {
                    prisoner_contact_restriction_id: 0,
                    prisoner_contact_id: parent_id,
                    restriction_type: r.restriction_type.clone(),
                    start_date: r.start_date,
                    expiry_date: r.expiry_date,
                    comments: r.comment.clone(),
                    staff_username: r.staff_username.clone(),
                    audit: r.audit.clone(),
                },
            )?;
            Ok(Nested {
                parent_source_id: relationship.source_id,
                children,
            })
        })
        .collect()
}

/// Every child stage, in dependency order, beneath an already saved contact.
pub fn children<P: ContactPort>(
    port: &P,
    contact: Correlated<Contact>,
    request: &MigrateContactRequest,
) -> Result<Extracted> {
    let parent = &contact.entity;

    let phones = phones(port, parent, &request.phone_numbers)?;
    let addresses = addresses(port, parent, &request.addresses)?;
    let address_phones = address_phones(port, &addresses, &request.addresses)?;
    let emails = emails(port, parent, &request.email_addresses)?;
    let identities = identities(port, parent, &request.identifiers)?;
    let restrictions = restrictions(port, parent, &request.restrictions)?;
    let employments = employments(port, parent, &request.employments)?;
    let relationships = relationships(port, parent, &request.contacts)?;
    let relationship_restrictions =
        relationship_restrictions(port, &relationships, &request.contacts)?;

    Ok(Extracted {
        contact,
        phones,
        addresses,
        address_phones,
        emails,
        identities,
        restrictions,
        employments,
        relationships,
        relationship_restrictions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MigrateError;
    use crate::model::{ElementType, SourceAudit};
    use crate::store::db::Db;
    use crate::store::port::SqlitePort;

    fn all<P: ContactPort>(port: &P, request: &MigrateContactRequest) -> Result<Extracted> {
        children(port, contact(port, request)?, request)
    }

    fn request() -> MigrateContactRequest {
        serde_json::from_str(
            r#"{
                "personId": 1, "lastName": "Smith", "firstName": "Jo",
                "createUsername": "SRC_USER", "createDateTime": "2019-05-01T09:00:00",
                "phoneNumbers": [
                    {"phoneId": 5, "number": "111", "type": "HOME"},
                    {"phoneId": 9, "number": "222", "type": "MOB"},
                    {"phoneId": 2, "number": "333", "type": "BUS"}
                ],
                "addresses": [{
                    "addressId": 30, "premise": "12", "street": "High St",
                    "phoneNumbers": [{"phoneId": 31, "number": "444", "type": "HOME"}]
                }],
                "contacts": [
                    {"id": 100, "contactType": "S", "relationshipType": "BRO",
                     "prisonerNumber": "A1234BC",
                     "restrictions": [{"id": 200, "type": "BAN"}, {"id": 201, "type": "CCTV"}]},
                    {"id": 101, "contactType": "O", "relationshipType": "DR",
                     "prisonerNumber": "B9999ZZ"}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn contact_uses_source_id_and_source_audit() {
        let db = Db::open_memory(1_000).unwrap();
        let port = SqlitePort::new(db.conn());
        let saved = contact(&port, &request()).unwrap();
        assert_eq!(saved.source_id, 1);
        assert_eq!(saved.entity.contact_id, 1);
        assert_eq!(saved.entity.audit.create_username.as_deref(), Some("SRC_USER"));
    }

    #[test]
    fn extractors_preserve_source_order() {
        let db = Db::open_memory(1_000).unwrap();
        let port = SqlitePort::new(db.conn());
        let request = request();
        let extracted = all(&port, &request).unwrap();

        let order: Vec<i64> = extracted.phones.iter().map(|c| c.source_id).collect();
        assert_eq!(order, vec![5, 9, 2]);
        assert!(extracted.phones.iter().all(|c| c.entity.contact_id == 1));
        assert!(extracted.phones.iter().all(|c| c.entity.contact_phone_id >= 1_000));
    }

    #[test]
    fn relationship_restrictions_point_at_new_relationship_ids() {
        let db = Db::open_memory(1_000).unwrap();
        let port = SqlitePort::new(db.conn());
        let request = request();
        let extracted = all(&port, &request).unwrap();

        assert_eq!(extracted.relationship_restrictions.len(), 2);
        let first = &extracted.relationship_restrictions[0];
        assert_eq!(first.parent_source_id, 100);
        let parent_id = extracted.relationships[0].entity.prisoner_contact_id;
        assert_ne!(parent_id, 100);
        let ids: Vec<i64> = first.children.iter().map(|c| c.source_id).collect();
        assert_eq!(ids, vec![200, 201]);
        assert!(
            first
                .children
                .iter()
                .all(|c| c.entity.prisoner_contact_id == parent_id)
        );
        assert!(extracted.relationship_restrictions[1].children.is_empty());
    }

    #[test]
    fn address_phones_are_linked_to_their_address() {
        let db = Db::open_memory(1_000).unwrap();
        let port = SqlitePort::new(db.conn());
        let extracted = all(&port, &request()).unwrap();

        let nested = &extracted.address_phones[0];
        assert_eq!(nested.parent_source_id, 30);
        let child = &nested.children[0];
        assert_eq!(child.source_id, 31);
        assert_eq!(
            child.entity.link.contact_address_id,
            extracted.addresses[0].entity.contact_address_id
        );
        assert_eq!(child.entity.link.contact_phone_id, child.entity.phone.contact_phone_id);
    }

    #[test]
    fn failed_save_names_contact_and_kind() {
        let db = Db::open_memory(1_000).unwrap();
        let port = SqlitePort::new(db.conn());
        // never saved, so the restriction's foreign key has nothing to point at
        let mut parent = contact(&port, &request()).unwrap().entity;
        parent.contact_id = 99;
        let orphan = MigrateRestriction {
            id: 7,
            restriction_type: "BAN".into(),
            comment: None,
            effective_date: None,
            expiry_date: None,
            staff_username: None,
            audit: SourceAudit::default(),
        };
        let err = restrictions(&port, &parent, &[orphan]).unwrap_err();
        match err {
            MigrateError::Failed {
                contact_id, kind, ..
            } => {
                assert_eq!(contact_id, 99);
                assert_eq!(kind, ElementType::Restriction);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
