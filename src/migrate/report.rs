use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::migrate::extract::{Correlated, Extracted, Nested};
use crate::model::ElementType;

/// One source id correlated to the destination id it now lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdPair {
    pub element_type: ElementType,
    pub source_id: i64,
    pub destination_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressAndPhones {
    pub address: IdPair,
    pub phones: Vec<IdPair>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipAndRestrictions {
    pub relationship: IdPair,
    pub restrictions: Vec<IdPair>,
}

/// Correlation report for one migrated contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrateContactResponse {
    pub contact: IdPair,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    pub phone_numbers: Vec<IdPair>,
    pub addresses: Vec<AddressAndPhones>,
    pub emails: Vec<IdPair>,
    pub identities: Vec<IdPair>,
    pub restrictions: Vec<IdPair>,
    pub employments: Vec<IdPair>,
    pub relationships: Vec<RelationshipAndRestrictions>,
}

impl MigrateContactResponse {
    /// The whole report as one ordered list of triples, nested entries
    /// following their parent.
    pub fn entries(&self) -> Vec<IdPair> {
        let mut entries = vec![self.contact];
        entries.extend(&self.phone_numbers);
        for address in &self.addresses {
            entries.push(address.address);
            entries.extend(&address.phones);
        }
        entries.extend(&self.emails);
        entries.extend(&self.identities);
        entries.extend(&self.restrictions);
        entries.extend(&self.employments);
        for relationship in &self.relationships {
            entries.push(relationship.relationship);
            entries.extend(&relationship.restrictions);
        }
        entries
    }
}

fn pairs<E>(kind: ElementType, items: &[Correlated<E>], id: impl Fn(&E) -> i64) -> Vec<IdPair> {
    items
        .iter()
        .map(|c| IdPair {
            element_type: kind,
            source_id: c.source_id,
            destination_id: id(&c.entity),
        })
        .collect()
}

fn nested<P, C>(
    parents: Vec<IdPair>,
    children: &[Nested<C>],
    kind: ElementType,
    id: impl Fn(&C) -> i64,
    mut build: impl FnMut(IdPair, Vec<IdPair>) -> P,
) -> Vec<P> {
    parents
        .into_iter()
        .zip(children)
        .map(|(parent, nested)| {
            debug_assert_eq!(parent.source_id, nested.parent_source_id);
            build(parent, pairs(kind, &nested.children, &id))
        })
        .collect()
}

/// Fold the per-stage output of one migration into its correlation report.
pub fn assemble(extracted: &Extracted) -> MigrateContactResponse {
    let contact = &extracted.contact;

    let addresses = nested(
        pairs(ElementType::Address, &extracted.addresses, |a| a.contact_address_id),
        &extracted.address_phones,
        ElementType::AddressPhone,
        |p| p.link.contact_address_phone_id,
        |address, phones| AddressAndPhones { address, phones },
    );
    let relationships = nested(
        pairs(ElementType::PrisonerContact, &extracted.relationships, |r| {
            r.prisoner_contact_id
        }),
        &extracted.relationship_restrictions,
        ElementType::PrisonerContactRestriction,
        |r| r.prisoner_contact_restriction_id,
        |relationship, restrictions| RelationshipAndRestrictions {
            relationship,
            restrictions,
        },
    );

    MigrateContactResponse {
        contact: IdPair {
            element_type: ElementType::Contact,
            source_id: contact.source_id,
            destination_id: contact.entity.contact_id,
        },
        last_name: contact.entity.last_name.clone(),
        date_of_birth: contact.entity.date_of_birth,
        phone_numbers: pairs(ElementType::Phone, &extracted.phones, |p| p.contact_phone_id),
        addresses,
        emails: pairs(ElementType::Email, &extracted.emails, |e| e.contact_email_id),
        identities: pairs(ElementType::Identity, &extracted.identities, |i| {
            i.contact_identity_id
        }),
        restrictions: pairs(ElementType::Restriction, &extracted.restrictions, |r| {
            r.contact_restriction_id
        }),
        employments: pairs(ElementType::Employment, &extracted.employments, |e| {
            e.employment_id
        }),
        relationships,
    }
}
