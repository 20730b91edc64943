//! The follow-up calendar: events kept consistent with the contact lifecycle.

use std::collections::HashSet;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
  contact::Contact,
  date::{add_days, within_days},
  event::CalendarEvent,
};

/// Ordered collection of follow-up events, in insertion order.
///
/// Holds at most one pending event per contact as long as every insertion
/// goes through [`Calendar::on_contact_created`] or [`Calendar::reconcile`].
#[derive(Debug, Clone, Default)]
pub struct Calendar {
  events: Vec<CalendarEvent>,
}

impl Calendar {
  pub fn new() -> Self { Self::default() }

  /// Rebuild from a persisted snapshot.
  pub fn from_events(events: Vec<CalendarEvent>) -> Self { Self { events } }

  pub fn events(&self) -> &[CalendarEvent] { &self.events }

  pub fn len(&self) -> usize { self.events.len() }

  pub fn is_empty(&self) -> bool { self.events.is_empty() }

  // ── Lifecycle ─────────────────────────────────────────────────────────────

  /// Insert the initial follow-up for a newly created contact, due at the
  /// contact's current stage offset from its creation.
  pub fn on_contact_created(&mut self, contact: &Contact) -> &CalendarEvent {
    let due = add_days(contact.created_at, contact.stage.offset_days());
    let idx = self.events.len();
    self
      .events
      .push(CalendarEvent::follow_up(contact, contact.stage, due));
    &self.events[idx]
  }

  /// Retire every pending event for `contact_id`, then insert `new_event`.
  ///
  /// More than one pending event means an earlier inconsistency; all of them
  /// are retired. Returns the number retired.
  pub fn reconcile(&mut self, contact_id: Uuid, new_event: CalendarEvent) -> usize {
    let mut retired = 0;
    for event in self
      .events
      .iter_mut()
      .filter(|e| e.contact_id == contact_id && e.is_pending())
    {
      event.completed = true;
      retired += 1;
    }
    if retired > 1 {
      tracing::warn!(%contact_id, retired, "retired multiple pending follow-ups");
    }
    self.events.push(new_event);
    retired
  }

  /// Drop every event, pending or not, belonging to any of `ids`. Returns the
  /// number removed.
  pub fn on_contacts_deleted(&mut self, ids: &HashSet<Uuid>) -> usize {
    let before = self.events.len();
    self.events.retain(|e| !ids.contains(&e.contact_id));
    before - self.events.len()
  }

  // ── Queries ───────────────────────────────────────────────────────────────

  /// All events due on `day`, whatever their time of day or status.
  pub fn events_on_day(&self, day: NaiveDate) -> Vec<&CalendarEvent> {
    self.events.iter().filter(|e| e.date.date() == day).collect()
  }

  /// All events due on a day in `start..=end`.
  pub fn events_in_month(
    &self,
    start: NaiveDate,
    end: NaiveDate,
  ) -> Vec<&CalendarEvent> {
    self
      .events
      .iter()
      .filter(|e| within_days(e.date, start, end))
      .collect()
  }

  /// The contact's pending follow-up, if it has one.
  pub fn pending_for(&self, contact_id: Uuid) -> Option<&CalendarEvent> {
    self
      .events
      .iter()
      .find(|e| e.contact_id == contact_id && e.is_pending())
  }

  /// Pending follow-ups due on or before `day`, oldest first.
  pub fn due_by(&self, day: NaiveDate) -> Vec<&CalendarEvent> {
    let mut due: Vec<_> = self
      .events
      .iter()
      .filter(|e| e.is_pending() && e.date.date() <= day)
      .collect();
    due.sort_by_key(|e| e.date);
    due
  }
}
