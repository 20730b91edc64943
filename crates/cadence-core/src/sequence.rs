//! The sequence engine: decides what "advance" does to a single contact.
//!
//! The engine is pure: it never touches a store. It returns a [`Transition`]
//! describing the updated contact and, for non-terminal advances, the follow-up
//! that replaces the contact's pending one. Applying both together is the
//! caller's job (see [`crate::book::ContactBook::advance_stage`]).

use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::{Error, Result, contact::Contact, date::add_days, event::CalendarEvent};

/// The effect of advancing one contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
  /// The contact moved to the next stage. Every pending event for the contact
  /// must be retired before `event` is inserted.
  Advanced {
    contact: Contact,
    event:   CalendarEvent,
  },
  /// The contact was at the terminal stage and is now complete. No event is
  /// created or retired.
  Finished { contact: Contact },
}

impl Transition {
  pub fn contact(&self) -> &Contact {
    match self {
      Self::Advanced { contact, .. } | Self::Finished { contact } => contact,
    }
  }

  /// The contact whose pending follow-ups must be retired, if any.
  pub fn retired_contact_id(&self) -> Option<Uuid> {
    match self {
      Self::Advanced { contact, .. } => Some(contact.id),
      Self::Finished { .. } => None,
    }
  }
}

/// Advance `contact` as of `today`.
///
/// The next due date is `today` plus the *difference* between the two stage
/// offsets, not the creation date plus the cumulative offset. Late advances
/// therefore push the remaining schedule back.
pub fn advance(contact: &Contact, today: NaiveDateTime) -> Result<Transition> {
  if contact.completed {
    return Err(Error::AlreadyCompleted(contact.id));
  }

  if contact.stage.is_terminal() {
    let mut finished = contact.clone();
    finished.completed = true;
    return Ok(Transition::Finished { contact: finished });
  }

  let next = contact.stage.next();
  let due = add_days(today, next.offset_days() - contact.stage.offset_days());

  let mut advanced = contact.clone();
  advanced.stage = next;
  advanced.completed = false;
  advanced.last_activity = Some(today);
  advanced.next_activity = Some(due);

  let event = CalendarEvent::follow_up(&advanced, next, due);
  Ok(Transition::Advanced { contact: advanced, event })
}
