//! Contact entity and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::validation::{validate_contact_id, validate_email, validate_name, ContactValidationError};
use crate::domain::versioning::{VersionToken, Versioned};

/// Contact identifier - alphanumeric, hyphens and underscores, max 64 characters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContactId(String);

impl ContactId {
    /// Create a new ContactId after validation
    pub fn new(id: impl Into<String>) -> Result<Self, ContactValidationError> {
        let id = id.into();
        validate_contact_id(&id)?;
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ContactId {
    type Error = ContactValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ContactId> for String {
    fn from(id: ContactId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ContactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Contact entity
///
/// `row_version` is owned by the persistent store: it is replaced on every
/// successful create or update and is empty until the contact is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    id: ContactId,
    first_name: String,
    last_name: String,
    #[serde(default)]
    is_family_member: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mobile_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date_of_birth: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    anniversary_date: Option<NaiveDate>,
    #[serde(default)]
    row_version: VersionToken,
}

impl Contact {
    /// Create a new, not yet persisted contact
    pub fn new(
        id: ContactId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Result<Self, ContactValidationError> {
        let first_name = first_name.into();
        let last_name = last_name.into();
        validate_name("First name", &first_name)?;
        validate_name("Last name", &last_name)?;

        Ok(Self {
            id,
            first_name,
            last_name,
            is_family_member: false,
            company: None,
            job_title: None,
            email: None,
            mobile_phone: None,
            date_of_birth: None,
            anniversary_date: None,
            row_version: VersionToken::default(),
        })
    }

    // Builder methods

    pub fn with_family_member(mut self, is_family_member: bool) -> Self {
        self.is_family_member = is_family_member;
        self
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    pub fn with_job_title(mut self, job_title: impl Into<String>) -> Self {
        self.job_title = Some(job_title.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Result<Self, ContactValidationError> {
        self.set_email(Some(email.into()))?;
        Ok(self)
    }

    pub fn with_mobile_phone(mut self, mobile_phone: impl Into<String>) -> Self {
        self.mobile_phone = Some(mobile_phone.into());
        self
    }

    pub fn with_date_of_birth(mut self, date: NaiveDate) -> Self {
        self.date_of_birth = Some(date);
        self
    }

    pub fn with_anniversary_date(mut self, date: NaiveDate) -> Self {
        self.anniversary_date = Some(date);
        self
    }

    /// Stamps the store-issued version token
    pub fn with_row_version(mut self, row_version: VersionToken) -> Self {
        self.row_version = row_version;
        self
    }

    // Getters

    pub fn id(&self) -> &ContactId {
        &self.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn is_family_member(&self) -> bool {
        self.is_family_member
    }

    pub fn company(&self) -> Option<&str> {
        self.company.as_deref()
    }

    pub fn job_title(&self) -> Option<&str> {
        self.job_title.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn mobile_phone(&self) -> Option<&str> {
        self.mobile_phone.as_deref()
    }

    pub fn date_of_birth(&self) -> Option<NaiveDate> {
        self.date_of_birth
    }

    pub fn anniversary_date(&self) -> Option<NaiveDate> {
        self.anniversary_date
    }

    pub fn row_version(&self) -> &VersionToken {
        &self.row_version
    }

    // Setters

    pub fn set_first_name(&mut self, first_name: impl Into<String>) -> Result<(), ContactValidationError> {
        let first_name = first_name.into();
        validate_name("First name", &first_name)?;
        self.first_name = first_name;
        Ok(())
    }

    pub fn set_last_name(&mut self, last_name: impl Into<String>) -> Result<(), ContactValidationError> {
        let last_name = last_name.into();
        validate_name("Last name", &last_name)?;
        self.last_name = last_name;
        Ok(())
    }

    pub fn set_family_member(&mut self, is_family_member: bool) {
        self.is_family_member = is_family_member;
    }

    pub fn set_company(&mut self, company: Option<String>) {
        self.company = company;
    }

    pub fn set_job_title(&mut self, job_title: Option<String>) {
        self.job_title = job_title;
    }

    pub fn set_email(&mut self, email: Option<String>) -> Result<(), ContactValidationError> {
        if let Some(ref email) = email {
            validate_email(email)?;
        }
        self.email = email;
        Ok(())
    }

    pub fn set_mobile_phone(&mut self, mobile_phone: Option<String>) {
        self.mobile_phone = mobile_phone;
    }

    pub fn set_date_of_birth(&mut self, date: Option<NaiveDate>) {
        self.date_of_birth = date;
    }

    pub fn set_anniversary_date(&mut self, date: Option<NaiveDate>) {
        self.anniversary_date = date;
    }
}

impl Versioned for Contact {
    fn version_token(&self) -> Option<&VersionToken> {
        Some(&self.row_version)
    }

    fn snapshot_id(&self) -> Option<&str> {
        Some(self.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> Contact {
        Contact::new(ContactId::new("c1").unwrap(), "Ada", "Lovelace").unwrap()
    }

    #[test]
    fn test_contact_id_valid() {
        let id = ContactId::new("c1").unwrap();
        assert_eq!(id.as_str(), "c1");
        assert_eq!(id.to_string(), "c1");
    }

    #[test]
    fn test_contact_id_invalid() {
        assert!(ContactId::new("").is_err());
        assert!(ContactId::new("has space").is_err());
    }

    #[test]
    fn test_new_contact_has_empty_version() {
        let contact = contact();
        assert!(contact.row_version().is_empty());
        assert!(contact.encoded_version_token().is_none());
    }

    #[test]
    fn test_new_contact_rejects_empty_name() {
        let result = Contact::new(ContactId::new("c1").unwrap(), "", "Lovelace");
        assert!(result.is_err());
    }

    #[test]
    fn test_versioned_contact_encodes_token() {
        let contact = contact().with_row_version(VersionToken::new(vec![0x01, 0x02]));
        assert_eq!(contact.encoded_version_token().unwrap().as_str(), "AQI=");
    }

    #[test]
    fn test_builder_fields() {
        let dob = NaiveDate::from_ymd_opt(1815, 12, 10).unwrap();
        let contact = contact()
            .with_family_member(true)
            .with_company("Analytical Engines Ltd")
            .with_job_title("Programmer")
            .with_email("ada@example.com")
            .unwrap()
            .with_mobile_phone("+44 20 0000 0000")
            .with_date_of_birth(dob);

        assert!(contact.is_family_member());
        assert_eq!(contact.company(), Some("Analytical Engines Ltd"));
        assert_eq!(contact.job_title(), Some("Programmer"));
        assert_eq!(contact.email(), Some("ada@example.com"));
        assert_eq!(contact.mobile_phone(), Some("+44 20 0000 0000"));
        assert_eq!(contact.date_of_birth(), Some(dob));
        assert_eq!(contact.anniversary_date(), None);
    }

    #[test]
    fn test_set_email_validates() {
        let mut contact = contact();
        assert!(contact.set_email(Some("not-an-email".to_string())).is_err());
        assert_eq!(contact.email(), None);

        contact.set_email(None).unwrap();
        assert_eq!(contact.email(), None);
    }

    #[test]
    fn test_json_shape() {
        let contact = contact()
            .with_mobile_phone("555-0100")
            .with_row_version(VersionToken::new(vec![0x01, 0x02]));

        let json = serde_json::to_value(&contact).unwrap();

        assert_eq!(json["id"], "c1");
        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["mobilePhone"], "555-0100");
        assert_eq!(json["rowVersion"], "AQI=");
        assert!(json.get("company").is_none());
    }

    #[test]
    fn test_snapshot_round_trip_preserves_all_fields() {
        let contact = contact()
            .with_company("ACME")
            .with_anniversary_date(NaiveDate::from_ymd_opt(2001, 5, 4).unwrap())
            .with_row_version(VersionToken::from_sequence(7));

        let json = serde_json::to_string(&contact).unwrap();
        let restored: Contact = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, contact);
    }

    #[test]
    fn test_deserialize_rejects_invalid_id() {
        let result: Result<Contact, _> =
            serde_json::from_str(r#"{"id":"bad id","firstName":"A","lastName":"B"}"#);
        assert!(result.is_err());
    }
}
