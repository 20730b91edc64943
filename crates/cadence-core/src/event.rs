//! Calendar events: the scheduled follow-up reminders.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{contact::Contact, stage::Stage};

/// A follow-up due on `date`.
///
/// `entity_name` and `stage` are snapshots taken when the event was created;
/// they are never updated from the contact afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
  pub id:          Uuid,
  /// Owning contact. Weak reference: the contact's deletion removes the event.
  pub contact_id:  Uuid,
  pub entity_name: String,
  pub stage:       Stage,
  pub date:        NaiveDateTime,
  /// Set once the follow-up is superseded by a later one.
  pub completed:   bool,
}

impl CalendarEvent {
  /// A fresh, incomplete follow-up for `contact` at `stage`.
  pub fn follow_up(contact: &Contact, stage: Stage, date: NaiveDateTime) -> Self {
    Self {
      id: Uuid::new_v4(),
      contact_id: contact.id,
      entity_name: contact.entity_name.clone(),
      stage,
      date,
      completed: false,
    }
  }

  pub fn is_pending(&self) -> bool { !self.completed }
}
