use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Kind tag carried by every correlation entry and every persistence failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ElementType {
    Contact,
    Phone,
    Address,
    AddressPhone,
    Email,
    Identity,
    Restriction,
    Employment,
    PrisonerContact,
    PrisonerContactRestriction,
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Contact => write!(f, "CONTACT"),
            Self::Phone => write!(f, "PHONE"),
            Self::Address => write!(f, "ADDRESS"),
            Self::AddressPhone => write!(f, "ADDRESS_PHONE"),
            Self::Email => write!(f, "EMAIL"),
            Self::Identity => write!(f, "IDENTITY"),
            Self::Restriction => write!(f, "RESTRICTION"),
            Self::Employment => write!(f, "EMPLOYMENT"),
            Self::PrisonerContact => write!(f, "PRISONER_CONTACT"),
            Self::PrisonerContactRestriction => write!(f, "PRISONER_CONTACT_RESTRICTION"),
        }
    }
}

/// Audit columns as recorded by the source system. Persisted verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceAudit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_date_time: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modify_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modify_date_time: Option<NaiveDateTime>,
}

/// One complete contact aggregate as exported by the system of record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrateContactRequest {
    pub person_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub last_name: String,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domestic_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub interpreter_required: bool,
    #[serde(default)]
    pub staff: bool,
    #[serde(default)]
    pub remitter: bool,
    #[serde(default)]
    pub deceased_flag: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deceased_date: Option<NaiveDate>,
    #[serde(flatten)]
    pub audit: SourceAudit,
    #[serde(default)]
    pub phone_numbers: Vec<MigratePhoneNumber>,
    #[serde(default)]
    pub addresses: Vec<MigrateAddress>,
    #[serde(default)]
    pub email_addresses: Vec<MigrateEmailAddress>,
    #[serde(default)]
    pub identifiers: Vec<MigrateIdentifier>,
    #[serde(default)]
    pub restrictions: Vec<MigrateRestriction>,
    #[serde(default)]
    pub employments: Vec<MigrateEmployment>,
    /// Relationships to prisoners, each with its own restrictions.
    #[serde(default)]
    pub contacts: Vec<MigrateRelationship>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigratePhoneNumber {
    pub phone_id: i64,
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    #[serde(rename = "type")]
    pub phone_type: String,
    #[serde(flatten)]
    pub audit: SourceAudit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrateAddress {
    pub address_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_type: Option<String>,
    #[serde(default)]
    pub primary_address: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub premise: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub mail_address: bool,
    #[serde(default)]
    pub no_fixed_address: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub phone_numbers: Vec<MigratePhoneNumber>,
    #[serde(flatten)]
    pub audit: SourceAudit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrateEmailAddress {
    pub email_address_id: i64,
    pub email: String,
    #[serde(flatten)]
    pub audit: SourceAudit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrateIdentifier {
    pub sequence: i64,
    #[serde(rename = "type")]
    pub identity_type: String,
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_authority: Option<String>,
    #[serde(flatten)]
    pub audit: SourceAudit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrateRestriction {
    pub id: i64,
    #[serde(rename = "type")]
    pub restriction_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_username: Option<String>,
    #[serde(flatten)]
    pub audit: SourceAudit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrateEmployment {
    pub sequence: i64,
    pub corporate_id: i64,
    #[serde(default)]
    pub active: bool,
    #[serde(flatten)]
    pub audit: SourceAudit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrateRelationship {
    pub id: i64,
    pub contact_type: String,
    pub relationship_type: String,
    pub prisoner_number: String,
    #[serde(default)]
    pub current_term: bool,
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub approved_visitor: bool,
    #[serde(default)]
    pub next_of_kin: bool,
    #[serde(default)]
    pub emergency_contact: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub restrictions: Vec<MigrateRelationshipRestriction>,
    #[serde(flatten)]
    pub audit: SourceAudit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrateRelationshipRestriction {
    pub id: i64,
    #[serde(rename = "type")]
    pub restriction_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_username: Option<String>,
    #[serde(flatten)]
    pub audit: SourceAudit,
}

impl MigrateContactRequest {
    /// Every source id in the record, tagged with its kind, in traversal order.
    pub fn source_ids(&self) -> Vec<(ElementType, i64)> {
        let mut ids = vec![(ElementType::Contact, self.person_id)];
        ids.extend(self.phone_numbers.iter().map(|p| (ElementType::Phone, p.phone_id)));
        for address in &self.addresses {
            ids.push((ElementType::Address, address.address_id));
            ids.extend(
                address
                    .phone_numbers
                    .iter()
                    .map(|p| (ElementType::AddressPhone, p.phone_id)),
            );
        }
        ids.extend(
            self.email_addresses
                .iter()
                .map(|e| (ElementType::Email, e.email_address_id)),
        );
        ids.extend(self.identifiers.iter().map(|i| (ElementType::Identity, i.sequence)));
        ids.extend(self.restrictions.iter().map(|r| (ElementType::Restriction, r.id)));
        ids.extend(self.employments.iter().map(|e| (ElementType::Employment, e.sequence)));
        for relationship in &self.contacts {
            ids.push((ElementType::PrisonerContact, relationship.id));
            ids.extend(
                relationship
                    .restrictions
                    .iter()
                    .map(|r| (ElementType::PrisonerContactRestriction, r.id)),
            );
        }
        ids
    }
}
