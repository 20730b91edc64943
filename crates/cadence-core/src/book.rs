//! [`ContactBook`]: the contact store.
//!
//! The book owns every contact, the follow-up [`Calendar`], and the lead-goal
//! setting. Each mutating method applies its contact and calendar changes
//! together and then rewrites the affected snapshots before returning, so no
//! caller ever observes a contact without its matching follow-up. If a write
//! fails the mutation is rolled back, so retrying applies it exactly once.

use std::{
  collections::{BTreeMap, HashSet},
  fmt::Display,
  sync::Arc,
};

use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{
  Error, Result,
  calendar::Calendar,
  contact::{Contact, NewContact, SocialProfile, missing_required},
  date::{Clock, SystemClock},
  event::CalendarEvent,
  insights::SocialUrls,
  persist::{SnapshotKey, SnapshotStore},
  sequence::{self, Transition},
  stage::{Stage, WeekDay},
};

/// Lead goal used until the user sets one.
pub const DEFAULT_LEAD_GOAL: u32 = 10;

// ─── Import result ───────────────────────────────────────────────────────────

/// A row rejected by [`ContactBook::import_batch`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
  /// Zero-based index into the submitted batch.
  pub row:     usize,
  pub missing: Vec<&'static str>,
}

/// Outcome of a best-effort batch import.
#[derive(Debug, Clone, Serialize)]
pub struct ImportResult {
  pub succeeded: usize,
  pub failed:    usize,
  pub created:   Vec<Contact>,
  pub failures:  Vec<RowFailure>,
}

// ─── Book ────────────────────────────────────────────────────────────────────

/// In-memory state captured before a mutation.
struct Checkpoint {
  contacts:  Vec<Contact>,
  calendar:  Calendar,
  lead_goal: u32,
}

pub struct ContactBook<P> {
  snapshots: P,
  clock:     Arc<dyn Clock>,
  contacts:  Vec<Contact>,
  calendar:  Calendar,
  lead_goal: u32,
}

impl<P: SnapshotStore> ContactBook<P> {
  /// Load every snapshot from `snapshots`, using the local wall clock.
  pub fn open(snapshots: P) -> Result<Self> {
    Self::open_with_clock(snapshots, Arc::new(SystemClock))
  }

  /// Load every snapshot from `snapshots`. Missing snapshots start empty.
  pub fn open_with_clock(snapshots: P, clock: Arc<dyn Clock>) -> Result<Self> {
    let contacts: Vec<Contact> =
      load(&snapshots, SnapshotKey::Contacts)?.unwrap_or_default();
    let events: Vec<CalendarEvent> =
      load(&snapshots, SnapshotKey::CalendarEvents)?.unwrap_or_default();
    let lead_goal =
      load(&snapshots, SnapshotKey::LeadGoal)?.unwrap_or(DEFAULT_LEAD_GOAL);

    tracing::debug!(
      contacts = contacts.len(),
      events = events.len(),
      lead_goal,
      "opened contact book"
    );

    Ok(Self {
      snapshots,
      clock,
      contacts,
      calendar: Calendar::from_events(events),
      lead_goal,
    })
  }

  /// The current instant according to the book's clock.
  pub fn now(&self) -> NaiveDateTime { self.clock.now() }

  pub fn snapshots(&self) -> &P { &self.snapshots }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// All contacts in insertion order.
  pub fn contacts(&self) -> &[Contact] { &self.contacts }

  pub fn get(&self, id: Uuid) -> Option<&Contact> {
    self.contacts.iter().find(|c| c.id == id)
  }

  pub fn events(&self) -> &[CalendarEvent] { self.calendar.events() }

  /// Contacts in the `day` bucket currently at `stage`, in insertion order.
  pub fn filter(&self, day: WeekDay, stage: Stage) -> Vec<&Contact> {
    self
      .contacts
      .iter()
      .filter(|c| c.day == day && c.stage == stage)
      .collect()
  }

  /// Number of contacts at each stage. Every stage is present.
  pub fn stats(&self) -> BTreeMap<Stage, usize> {
    let mut counts: BTreeMap<Stage, usize> =
      Stage::all().map(|stage| (stage, 0)).collect();
    for contact in &self.contacts {
      *counts.entry(contact.stage).or_default() += 1;
    }
    counts
  }

  pub fn events_on_day(&self, day: NaiveDate) -> Vec<&CalendarEvent> {
    self.calendar.events_on_day(day)
  }

  pub fn events_in_month(
    &self,
    start: NaiveDate,
    end: NaiveDate,
  ) -> Vec<&CalendarEvent> {
    self.calendar.events_in_month(start, end)
  }

  pub fn due_by(&self, day: NaiveDate) -> Vec<&CalendarEvent> {
    self.calendar.due_by(day)
  }

  pub fn lead_goal(&self) -> u32 { self.lead_goal }

  // ── Mutations ─────────────────────────────────────────────────────────────

  /// Create a contact at the first stage with its initial follow-up due now.
  pub fn add(&mut self, input: NewContact) -> Result<Contact> {
    let now = self.clock.now();
    let saved = self.checkpoint();
    let contact = self.insert(input, now)?;
    self.commit(&[SnapshotKey::Contacts, SnapshotKey::CalendarEvents], saved)?;
    tracing::info!(contact_id = %contact.id, entity = %contact.entity_name, "added contact");
    Ok(contact)
  }

  /// Add each row independently. Invalid rows are skipped and reported; valid
  /// rows are kept even if others fail. A failed write rolls back the whole
  /// batch.
  pub fn import_batch(&mut self, rows: Vec<NewContact>) -> Result<ImportResult> {
    let now = self.clock.now();
    let saved = self.checkpoint();
    let mut created = Vec::new();
    let mut failures = Vec::new();

    for (row, input) in rows.into_iter().enumerate() {
      match self.insert(input, now) {
        Ok(contact) => created.push(contact),
        Err(Error::Validation { missing }) => {
          tracing::warn!(row, missing = ?missing, "skipping import row");
          failures.push(RowFailure { row, missing });
        }
        Err(e) => {
          self.restore(saved);
          return Err(e);
        }
      }
    }

    if !created.is_empty() {
      self.commit(&[SnapshotKey::Contacts, SnapshotKey::CalendarEvents], saved)?;
    }

    tracing::info!(
      succeeded = created.len(),
      failed = failures.len(),
      "imported contacts"
    );

    Ok(ImportResult {
      succeeded: created.len(),
      failed: failures.len(),
      created,
      failures,
    })
  }

  /// Advance a contact one stage as of `today`, reconciling its follow-up.
  ///
  /// Returns [`Error::AlreadyCompleted`] without changing anything if the
  /// contact already finished its sequence.
  pub fn advance_stage(&mut self, id: Uuid, today: NaiveDateTime) -> Result<Contact> {
    let idx = self.position(id)?;
    let transition = sequence::advance(&self.contacts[idx], today)?;
    let saved = self.checkpoint();

    let touched: &[SnapshotKey] = match transition {
      Transition::Advanced { contact, event } => {
        let retired = self.calendar.reconcile(contact.id, event);
        tracing::info!(
          contact_id = %id,
          stage = %contact.stage,
          retired,
          "advanced contact"
        );
        self.contacts[idx] = contact;
        &[SnapshotKey::Contacts, SnapshotKey::CalendarEvents]
      }
      Transition::Finished { contact } => {
        tracing::info!(contact_id = %id, "contact finished its sequence");
        self.contacts[idx] = contact;
        &[SnapshotKey::Contacts]
      }
    };

    self.commit(touched, saved)?;
    Ok(self.contacts[idx].clone())
  }

  /// Remove a contact and all of its events. Unknown ids are ignored.
  pub fn delete(&mut self, id: Uuid) -> Result<bool> {
    Ok(self.delete_many(&[id])? > 0)
  }

  /// Remove several contacts and all of their events. Returns how many
  /// contacts were removed; unknown ids are ignored.
  pub fn delete_many(&mut self, ids: &[Uuid]) -> Result<usize> {
    let ids: HashSet<Uuid> = ids.iter().copied().collect();
    let saved = self.checkpoint();
    let before = self.contacts.len();
    self.contacts.retain(|c| !ids.contains(&c.id));
    let removed = before - self.contacts.len();
    let events_removed = self.calendar.on_contacts_deleted(&ids);

    if removed == 0 && events_removed == 0 {
      return Ok(0);
    }

    self.commit(&[SnapshotKey::Contacts, SnapshotKey::CalendarEvents], saved)?;
    tracing::info!(removed, events_removed, "deleted contacts");
    Ok(removed)
  }

  /// Replace the stored record with the same id.
  ///
  /// Sequence state (`stage`, `completed`, `created_at`, `last_activity`,
  /// `next_activity`) only changes through [`Self::advance_stage`] and is kept
  /// from the stored record.
  pub fn update(&mut self, contact: Contact) -> Result<Contact> {
    let idx = self.position(contact.id)?;
    let missing = missing_required(
      &contact.entity_name,
      &contact.primary_contact,
      &contact.email_address,
    );
    if !missing.is_empty() {
      return Err(Error::Validation { missing });
    }

    let stored = &self.contacts[idx];
    let merged = Contact {
      stage: stored.stage,
      completed: stored.completed,
      created_at: stored.created_at,
      last_activity: stored.last_activity,
      next_activity: stored.next_activity,
      ..contact
    };

    let saved = self.checkpoint();
    self.contacts[idx] = merged;
    self.commit(&[SnapshotKey::Contacts], saved)?;
    tracing::debug!(contact_id = %self.contacts[idx].id, "updated contact");
    Ok(self.contacts[idx].clone())
  }

  pub fn set_lead_goal(&mut self, goal: u32) -> Result<()> {
    if goal == self.lead_goal {
      return Ok(());
    }
    let saved = self.checkpoint();
    self.lead_goal = goal;
    self.commit(&[SnapshotKey::LeadGoal], saved)
  }

  // ── Insights ──────────────────────────────────────────────────────────────

  /// The links to send to an insight source for contact `id`.
  pub fn insight_request(&self, id: Uuid) -> Result<SocialUrls> {
    let contact = self.get(id).ok_or(Error::ContactNotFound(id))?;
    SocialUrls::for_contact(contact).ok_or(Error::NoSocialProfiles(id))
  }

  /// Merge the outcome of an insight fetch into contact `id`.
  ///
  /// A failed fetch leaves the contact untouched and surfaces as
  /// [`Error::ExternalFetch`]. If the contact was deleted while the fetch was
  /// in flight the result is dropped with [`Error::ContactNotFound`].
  pub fn apply_insights<E: Display>(
    &mut self,
    id: Uuid,
    outcome: std::result::Result<SocialProfile, E>,
  ) -> Result<Contact> {
    let mut profile = outcome.map_err(|e| {
      tracing::warn!(contact_id = %id, error = %e, "insight fetch failed");
      Error::ExternalFetch(e.to_string())
    })?;
    let idx = self.position(id)?;

    if profile.last_updated.is_none() {
      profile.last_updated = Some(Utc::now());
    }
    let saved = self.checkpoint();
    self.contacts[idx].social_profile = profile;
    self.commit(&[SnapshotKey::Contacts], saved)?;
    tracing::info!(contact_id = %id, "stored insights");

    Ok(self.contacts[idx].clone())
  }

  // ── Internals ─────────────────────────────────────────────────────────────

  fn position(&self, id: Uuid) -> Result<usize> {
    self
      .contacts
      .iter()
      .position(|c| c.id == id)
      .ok_or(Error::ContactNotFound(id))
  }

  /// Validate, create, and schedule a contact without persisting.
  fn insert(&mut self, input: NewContact, now: NaiveDateTime) -> Result<Contact> {
    let missing = input.missing_fields();
    if !missing.is_empty() {
      return Err(Error::Validation { missing });
    }

    let contact = Contact {
      id:               Uuid::new_v4(),
      entity_name:      input.entity_name,
      primary_contact:  input.primary_contact,
      email_address:    input.email_address,
      phone_number:     input.phone_number,
      company_linkedin: input.company_linkedin,
      contact_linkedin: input.contact_linkedin,
      contact_facebook: input.contact_facebook,
      notes:            input.notes,
      day:              input.day,
      stage:            Stage::FIRST,
      completed:        false,
      created_at:       now,
      last_activity:    None,
      next_activity:    Some(now),
      social_profile:   SocialProfile::default(),
    };

    self.calendar.on_contact_created(&contact);
    self.contacts.push(contact.clone());
    Ok(contact)
  }

  fn checkpoint(&self) -> Checkpoint {
    Checkpoint {
      contacts:  self.contacts.clone(),
      calendar:  self.calendar.clone(),
      lead_goal: self.lead_goal,
    }
  }

  fn restore(&mut self, saved: Checkpoint) {
    self.contacts = saved.contacts;
    self.calendar = saved.calendar;
    self.lead_goal = saved.lead_goal;
  }

  /// Persist `keys`, or roll back to `saved` if any write fails.
  ///
  /// Keys written before the failure are rewritten from the restored state
  /// so the store matches memory again as far as the backend allows.
  fn commit(&mut self, keys: &[SnapshotKey], saved: Checkpoint) -> Result<()> {
    let Err(err) = self.persist(keys) else {
      return Ok(());
    };
    tracing::warn!(error = %err, "snapshot write failed; rolling back");
    self.restore(saved);
    if let Err(again) = self.persist(keys) {
      tracing::error!(error = %again, "could not rewrite snapshots after rollback");
    }
    Err(err)
  }

  /// Rewrite the snapshots behind `keys`.
  fn persist(&self, keys: &[SnapshotKey]) -> Result<()> {
    for &key in keys {
      let value = match key {
        SnapshotKey::Contacts => serde_json::to_string(&self.contacts)?,
        SnapshotKey::CalendarEvents => serde_json::to_string(self.calendar.events())?,
        SnapshotKey::LeadGoal => serde_json::to_string(&self.lead_goal)?,
      };
      self
        .snapshots
        .write(key, &value)
        .map_err(Error::persistence)?;
    }
    Ok(())
  }
}

fn load<P: SnapshotStore, T: DeserializeOwned>(
  snapshots: &P,
  key: SnapshotKey,
) -> Result<Option<T>> {
  snapshots
    .read(key)
    .map_err(Error::persistence)?
    .map(|raw| serde_json::from_str(&raw))
    .transpose()
    .map_err(Error::from)
}
