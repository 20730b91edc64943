//! Header normalisation: maps arbitrary spreadsheet column names onto the
//! fixed [`NewContact`] field set.

use std::collections::HashMap;

use cadence_core::{contact::NewContact, stage::WeekDay};

/// Accepted spellings per field, in priority order. Matching ignores case,
/// whitespace and punctuation, so "Entity Name", "ENTITY NAME" and
/// "entity_name" are all `entityname`.
const ENTITY_NAME: &[&str] = &["entityname", "company", "companyname", "organization"];
const PRIMARY_CONTACT: &[&str] = &["primarycontact", "name", "contactname", "fullname"];
const EMAIL_ADDRESS: &[&str] = &["emailaddress", "email", "emailaddr"];
const PHONE_NUMBER: &[&str] = &["phonenumber", "phone", "telephone"];
const COMPANY_LINKEDIN: &[&str] = &["companylinkedin"];
const CONTACT_LINKEDIN: &[&str] = &["contactlinkedin", "linkedin"];
const CONTACT_FACEBOOK: &[&str] = &["contactfacebook", "facebook"];
const NOTES: &[&str] = &["notes", "note", "comments"];

/// Canonical form of a header: lowercase alphanumerics only.
pub fn header_key(header: &str) -> String {
  header
    .chars()
    .filter(|c| c.is_alphanumeric())
    .flat_map(char::to_lowercase)
    .collect()
}

/// A CSV row keyed by canonical header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
  /// Line the record started on, for error reporting.
  pub line:   usize,
  pub values: HashMap<String, String>,
}

impl Row {
  /// Pair `headers` with `fields` positionally. Missing trailing fields are
  /// empty; surplus fields are ignored.
  pub fn new(line: usize, headers: &[String], fields: Vec<String>) -> Self {
    let mut fields = fields.into_iter();
    let values = headers
      .iter()
      .map(|h| (header_key(h), fields.next().unwrap_or_default()))
      .collect();
    Self { line, values }
  }

  /// The first non-empty value among `synonyms`, or an empty string.
  fn pick(&self, synonyms: &[&str]) -> String {
    synonyms
      .iter()
      .filter_map(|key| self.values.get(*key))
      .map(|v| v.trim())
      .find(|v| !v.is_empty())
      .unwrap_or_default()
      .to_owned()
  }

  /// Map onto contact-creation fields, assigning every row to `day`.
  ///
  /// Required fields may come back empty; the contact book rejects those
  /// rows and reports them.
  pub fn into_new_contact(self, day: WeekDay) -> NewContact {
    NewContact {
      entity_name: self.pick(ENTITY_NAME),
      primary_contact: self.pick(PRIMARY_CONTACT),
      email_address: self.pick(EMAIL_ADDRESS),
      phone_number: self.pick(PHONE_NUMBER),
      company_linkedin: self.pick(COMPANY_LINKEDIN),
      contact_linkedin: self.pick(CONTACT_LINKEDIN),
      contact_facebook: self.pick(CONTACT_FACEBOOK),
      notes: self.pick(NOTES),
      day,
    }
  }
}
