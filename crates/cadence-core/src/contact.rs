//! Contact types: the outreach targets that move through the cadence.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::stage::{Stage, WeekDay};

// ─── Insight payload ─────────────────────────────────────────────────────────

/// Company background gathered by an insight fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyInfo {
  pub founded:     String,
  pub milestones:  Vec<String>,
  pub awards:      Vec<String>,
  pub recent_news: Vec<String>,
  pub offerings:   Vec<String>,
  pub culture:     Vec<String>,
}

/// Personal background gathered by an insight fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalInfo {
  pub career:          Vec<String>,
  pub education:       Vec<String>,
  pub interests:       Vec<String>,
  pub publications:    Vec<String>,
  pub causes:          Vec<String>,
  pub recent_activity: Vec<String>,
  pub achievements:    Vec<String>,
}

/// Insight payload attached to a contact. The store keeps it verbatim; all
/// fields stay `None` until a fetch succeeds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialProfile {
  pub company_info:  Option<CompanyInfo>,
  pub personal_info: Option<PersonalInfo>,
  pub last_updated:  Option<DateTime<Utc>>,
}

// ─── Contact ─────────────────────────────────────────────────────────────────

/// One outreach target.
///
/// `stage`, `completed`, `last_activity` and `next_activity` are owned by the
/// sequence engine; everything else is user data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
  pub id:               Uuid,
  pub entity_name:      String,
  pub primary_contact:  String,
  pub email_address:    String,
  #[serde(default)]
  pub phone_number:     String,
  #[serde(default)]
  pub company_linkedin: String,
  #[serde(default)]
  pub contact_linkedin: String,
  #[serde(default)]
  pub contact_facebook: String,
  #[serde(default)]
  pub notes:            String,
  pub day:              WeekDay,
  pub stage:            Stage,
  pub completed:        bool,
  /// When the cadence started; the origin for stage offsets.
  pub created_at:       NaiveDateTime,
  pub last_activity:    Option<NaiveDateTime>,
  pub next_activity:    Option<NaiveDateTime>,
  #[serde(default)]
  pub social_profile:   SocialProfile,
}

impl Contact {
  /// Whether any social link is present to base an insight fetch on.
  pub fn has_social_links(&self) -> bool {
    [&self.company_linkedin, &self.contact_linkedin, &self.contact_facebook]
      .iter()
      .any(|url| !url.trim().is_empty())
  }
}

// ─── NewContact ──────────────────────────────────────────────────────────────

/// Input to [`crate::book::ContactBook::add`] and
/// [`crate::book::ContactBook::import_batch`]. Identity, stage and schedule
/// are always set by the book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContact {
  pub entity_name:      String,
  pub primary_contact:  String,
  pub email_address:    String,
  #[serde(default)]
  pub phone_number:     String,
  #[serde(default)]
  pub company_linkedin: String,
  #[serde(default)]
  pub contact_linkedin: String,
  #[serde(default)]
  pub contact_facebook: String,
  #[serde(default)]
  pub notes:            String,
  pub day:              WeekDay,
}

impl NewContact {
  /// Convenience constructor with only the required fields set.
  pub fn new(
    entity_name: impl Into<String>,
    primary_contact: impl Into<String>,
    email_address: impl Into<String>,
    day: WeekDay,
  ) -> Self {
    Self {
      entity_name: entity_name.into(),
      primary_contact: primary_contact.into(),
      email_address: email_address.into(),
      phone_number: String::new(),
      company_linkedin: String::new(),
      contact_linkedin: String::new(),
      contact_facebook: String::new(),
      notes: String::new(),
      day,
    }
  }

  /// Names of required fields that are empty or whitespace-only.
  pub fn missing_fields(&self) -> Vec<&'static str> {
    missing_required(&self.entity_name, &self.primary_contact, &self.email_address)
  }
}

pub(crate) fn missing_required(
  entity_name: &str,
  primary_contact: &str,
  email_address: &str,
) -> Vec<&'static str> {
  [
    ("entity_name", entity_name),
    ("primary_contact", primary_contact),
    ("email_address", email_address),
  ]
  .into_iter()
  .filter(|(_, value)| value.trim().is_empty())
  .map(|(name, _)| name)
  .collect()
}
