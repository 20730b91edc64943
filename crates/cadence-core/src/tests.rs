//! Tests for `ContactBook` against in-memory snapshots.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex},
};

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::{
  Error,
  book::{ContactBook, DEFAULT_LEAD_GOAL},
  contact::{CompanyInfo, NewContact, SocialProfile},
  date::{FixedClock, add_days},
  persist::{MemorySnapshots, SnapshotKey, SnapshotStore},
  stage::{Stage, WeekDay},
};

fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
  NaiveDate::from_ymd_opt(y, m, d)
    .unwrap()
    .and_hms_opt(9, 0, 0)
    .unwrap()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn t0() -> NaiveDateTime { at(2024, 4, 1) }

fn book() -> ContactBook<Arc<MemorySnapshots>> {
  book_on(Arc::new(MemorySnapshots::new()))
}

fn book_on(snapshots: Arc<MemorySnapshots>) -> ContactBook<Arc<MemorySnapshots>> {
  ContactBook::open_with_clock(snapshots, Arc::new(FixedClock(t0()))).expect("open book")
}

fn acme() -> NewContact {
  NewContact::new("Acme", "Wile E. Coyote", "wile@acme.test", WeekDay::Monday)
}

/// Every contact with a pending event has exactly one.
fn assert_single_pending<P: SnapshotStore>(b: &ContactBook<P>) {
  let mut pending: HashMap<Uuid, usize> = HashMap::new();
  for event in b.events().iter().filter(|e| e.is_pending()) {
    *pending.entry(event.contact_id).or_default() += 1;
  }
  for (contact_id, count) in pending {
    assert_eq!(count, 1, "contact {contact_id} has {count} pending events");
  }
}

fn assert_completed_implies_terminal(b: &ContactBook<Arc<MemorySnapshots>>) {
  for c in b.contacts() {
    if c.completed {
      assert_eq!(c.stage, Stage::BreakupEmail);
    }
  }
}

// ─── add ─────────────────────────────────────────────────────────────────────

#[test]
fn add_creates_contact_and_initial_event() {
  let mut b = book();
  let c = b.add(acme()).unwrap();

  assert_eq!(c.stage, Stage::FirstEmail);
  assert!(!c.completed);
  assert_eq!(c.created_at, t0());
  assert_eq!(c.next_activity, Some(t0()));
  assert!(c.last_activity.is_none());
  assert_eq!(c.social_profile, SocialProfile::default());

  assert_eq!(b.events().len(), 1);
  let event = &b.events()[0];
  assert_eq!(event.contact_id, c.id);
  assert_eq!(event.stage, Stage::FirstEmail);
  assert_eq!(event.date, t0());
  assert!(event.is_pending());
}

#[test]
fn add_rejects_missing_entity_name() {
  let mut b = book();
  let mut input = acme();
  input.entity_name = String::new();
  input.primary_contact = "X".into();
  input.email_address = "a@b.com".into();

  let err = b.add(input).unwrap_err();
  assert!(matches!(&err, Error::Validation { missing } if missing == &["entity_name"]));
  assert!(b.contacts().is_empty());
  assert!(b.events().is_empty());
  assert!(b.snapshots().get(SnapshotKey::Contacts).is_none());
}

#[test]
fn add_lists_every_missing_field() {
  let mut b = book();
  let input = NewContact::new("  ", "", "", WeekDay::Friday);
  let err = b.add(input).unwrap_err();
  assert!(matches!(
    &err,
    Error::Validation { missing }
      if missing == &["entity_name", "primary_contact", "email_address"]
  ));
}

// ─── advance_stage ───────────────────────────────────────────────────────────

#[test]
fn advancing_first_email_schedules_second_a_week_out() {
  let mut b = book();
  let c = b.add(acme()).unwrap();
  let first_event = b.events()[0].id;
  let today = at(2024, 4, 3);

  let advanced = b.advance_stage(c.id, today).unwrap();
  assert_eq!(advanced.stage, Stage::SecondEmail);
  assert_eq!(advanced.last_activity, Some(today));
  assert_eq!(advanced.next_activity, Some(add_days(today, 7)));

  let pending: Vec<_> = b.events().iter().filter(|e| e.is_pending()).collect();
  assert_eq!(pending.len(), 1);
  assert_eq!(pending[0].date, add_days(today, 7));
  assert_eq!(pending[0].stage, Stage::SecondEmail);

  let retired = b.events().iter().find(|e| e.id == first_event).unwrap();
  assert!(retired.completed);
  assert_single_pending(&b);
}

#[test]
fn advancing_breakup_email_completes_without_new_event() {
  let mut b = book();
  let c = b.add(acme()).unwrap();
  for i in 0..3 {
    b.advance_stage(c.id, add_days(t0(), i)).unwrap();
  }
  assert_eq!(b.get(c.id).unwrap().stage, Stage::BreakupEmail);
  let events_before = b.events().to_vec();

  let done = b.advance_stage(c.id, at(2024, 5, 1)).unwrap();
  assert!(done.completed);
  assert_eq!(done.stage, Stage::BreakupEmail);
  assert_eq!(b.events(), events_before.as_slice());
  assert_completed_implies_terminal(&b);
  assert_single_pending(&b);
}

#[test]
fn advancing_completed_contact_is_a_reported_no_op() {
  let mut b = book();
  let c = b.add(acme()).unwrap();
  for i in 0..4 {
    b.advance_stage(c.id, add_days(t0(), i)).unwrap();
  }
  let contacts_before = b.contacts().to_vec();
  let events_before = b.events().to_vec();
  let persisted_before = b.snapshots().get(SnapshotKey::Contacts);

  let err = b.advance_stage(c.id, at(2024, 6, 1)).unwrap_err();
  assert!(matches!(err, Error::AlreadyCompleted(id) if id == c.id));
  assert_eq!(b.contacts(), contacts_before.as_slice());
  assert_eq!(b.events(), events_before.as_slice());
  assert_eq!(b.snapshots().get(SnapshotKey::Contacts), persisted_before);
}

#[test]
fn advancing_unknown_contact_is_not_found() {
  let mut b = book();
  let id = Uuid::new_v4();
  let err = b.advance_stage(id, t0()).unwrap_err();
  assert!(matches!(err, Error::ContactNotFound(missing) if missing == id));
}

// ─── delete ──────────────────────────────────────────────────────────────────

#[test]
fn delete_removes_complete_and_pending_events() {
  let mut b = book();
  let gone = b.add(acme()).unwrap();
  let kept = b
    .add(NewContact::new("Globex", "Hank", "hank@globex.test", WeekDay::Monday))
    .unwrap();
  b.advance_stage(gone.id, at(2024, 4, 2)).unwrap();
  assert_eq!(b.events().iter().filter(|e| e.contact_id == gone.id).count(), 2);

  assert!(b.delete(gone.id).unwrap());

  assert!(b.get(gone.id).is_none());
  assert!(b.events().iter().all(|e| e.contact_id == kept.id));
  assert!(b.events_on_day(day(2024, 4, 9)).is_empty());
  assert!(b
    .events_in_month(day(2024, 4, 1), day(2024, 4, 30))
    .iter()
    .all(|e| e.contact_id != gone.id));
}

#[test]
fn delete_unknown_id_is_a_no_op() {
  let mut b = book();
  b.add(acme()).unwrap();
  assert!(!b.delete(Uuid::new_v4()).unwrap());
  assert_eq!(b.contacts().len(), 1);
  assert_eq!(b.events().len(), 1);
}

#[test]
fn delete_many_removes_only_listed_contacts() {
  let mut b = book();
  let a = b.add(acme()).unwrap();
  let c = b.add(acme()).unwrap();
  let kept = b.add(acme()).unwrap();

  let removed = b.delete_many(&[a.id, c.id, Uuid::new_v4()]).unwrap();
  assert_eq!(removed, 2);
  assert_eq!(b.contacts().len(), 1);
  assert_eq!(b.contacts()[0].id, kept.id);
  assert_eq!(b.events().len(), 1);
}

// ─── update ──────────────────────────────────────────────────────────────────

#[test]
fn update_replaces_user_fields_but_keeps_sequence_state() {
  let mut b = book();
  let c = b.add(acme()).unwrap();
  let advanced = b.advance_stage(c.id, at(2024, 4, 2)).unwrap();

  let mut edited = advanced.clone();
  edited.notes = "met at conference".into();
  edited.day = WeekDay::Thursday;
  edited.stage = Stage::FirstEmail;
  edited.completed = true;

  let stored = b.update(edited).unwrap();
  assert_eq!(stored.notes, "met at conference");
  assert_eq!(stored.day, WeekDay::Thursday);
  assert_eq!(stored.stage, Stage::SecondEmail);
  assert!(!stored.completed);
  assert_eq!(stored.next_activity, advanced.next_activity);
}

#[test]
fn update_unknown_contact_is_not_found() {
  let mut b = book();
  let c = b.add(acme()).unwrap();
  b.delete(c.id).unwrap();
  assert!(matches!(b.update(c).unwrap_err(), Error::ContactNotFound(_)));
}

#[test]
fn update_rejects_blank_required_field() {
  let mut b = book();
  let mut c = b.add(acme()).unwrap();
  c.email_address = " ".into();
  assert!(matches!(
    b.update(c).unwrap_err(),
    Error::Validation { missing } if missing == ["email_address"]
  ));
}

// ─── queries ─────────────────────────────────────────────────────────────────

#[test]
fn filter_matches_day_and_stage_in_insertion_order() {
  let mut b = book();
  let first = b.add(acme()).unwrap();
  let tuesday = b
    .add(NewContact::new("Initech", "Bill", "bill@initech.test", WeekDay::Tuesday))
    .unwrap();
  let second = b
    .add(NewContact::new("Globex", "Hank", "hank@globex.test", WeekDay::Monday))
    .unwrap();
  let advanced = b.add(acme()).unwrap();
  b.advance_stage(advanced.id, t0()).unwrap();

  let ids: Vec<_> = b
    .filter(WeekDay::Monday, Stage::FirstEmail)
    .iter()
    .map(|c| c.id)
    .collect();
  assert_eq!(ids, [first.id, second.id]);

  let tue: Vec<_> = b.filter(WeekDay::Tuesday, Stage::FirstEmail);
  assert_eq!(tue.len(), 1);
  assert_eq!(tue[0].id, tuesday.id);

  assert_eq!(b.filter(WeekDay::Monday, Stage::SecondEmail).len(), 1);
}

#[test]
fn stats_zero_fills_every_stage() {
  let mut b = book();
  for _ in 0..3 {
    b.add(acme()).unwrap();
  }
  let stats = b.stats();
  assert_eq!(stats.len(), 4);
  assert_eq!(stats[&Stage::FirstEmail], 3);
  assert_eq!(stats[&Stage::SecondEmail], 0);
  assert_eq!(stats[&Stage::PhoneLinkedInConnect], 0);
  assert_eq!(stats[&Stage::BreakupEmail], 0);
}

#[test]
fn stats_on_empty_book_has_all_keys() {
  let stats = book().stats();
  assert!(Stage::all().all(|s| stats.get(&s) == Some(&0)));
}

#[test]
fn due_by_lists_pending_follow_ups() {
  let mut b = book();
  let a = b.add(acme()).unwrap();
  b.add(acme()).unwrap();
  b.advance_stage(a.id, t0()).unwrap();

  assert_eq!(b.due_by(t0().date()).len(), 1);
  assert_eq!(b.due_by(add_days(t0(), 7).date()).len(), 2);
}

// ─── import_batch ────────────────────────────────────────────────────────────

#[test]
fn import_counts_failures_and_keeps_valid_rows() {
  let mut b = book();
  let mut missing_email = acme();
  missing_email.email_address = String::new();

  let result = b
    .import_batch(vec![acme(), missing_email, acme()])
    .unwrap();

  assert_eq!(result.succeeded, 2);
  assert_eq!(result.failed, 1);
  assert_eq!(result.created.len(), 2);
  assert_eq!(result.failures[0].row, 1);
  assert_eq!(result.failures[0].missing, ["email_address"]);

  assert_eq!(b.contacts().len(), 2);
  assert_eq!(b.events().len(), 2);
  assert_single_pending(&b);
}

#[test]
fn import_of_only_invalid_rows_creates_nothing() {
  let mut b = book();
  let result = b
    .import_batch(vec![NewContact::new("", "", "", WeekDay::Monday)])
    .unwrap();
  assert_eq!(result.succeeded, 0);
  assert_eq!(result.failed, 1);
  assert!(b.contacts().is_empty());
  assert!(b.snapshots().get(SnapshotKey::Contacts).is_none());
}

// ─── lead goal ───────────────────────────────────────────────────────────────

#[test]
fn lead_goal_defaults_and_persists() {
  let snapshots = Arc::new(MemorySnapshots::new());
  let mut b = book_on(snapshots.clone());
  assert_eq!(b.lead_goal(), DEFAULT_LEAD_GOAL);

  b.set_lead_goal(25).unwrap();
  assert_eq!(snapshots.get(SnapshotKey::LeadGoal).as_deref(), Some("25"));
  assert_eq!(book_on(snapshots).lead_goal(), 25);
}

// ─── insights ────────────────────────────────────────────────────────────────

fn profile() -> SocialProfile {
  SocialProfile {
    company_info: Some(CompanyInfo {
      founded: "1949".into(),
      ..Default::default()
    }),
    personal_info: None,
    last_updated: None,
  }
}

#[test]
fn insight_request_requires_a_social_link() {
  let mut b = book();
  let c = b.add(acme()).unwrap();
  assert!(matches!(
    b.insight_request(c.id).unwrap_err(),
    Error::NoSocialProfiles(_)
  ));

  let mut input = acme();
  input.company_linkedin = "https://linkedin.com/company/acme".into();
  input.contact_facebook = "https://facebook.com/wile".into();
  let linked = b.add(input).unwrap();

  let urls = b.insight_request(linked.id).unwrap();
  assert_eq!(urls.linkedin.as_deref(), Some("https://linkedin.com/company/acme"));
  assert_eq!(urls.facebook.as_deref(), Some("https://facebook.com/wile"));
}

#[test]
fn contact_linkedin_is_preferred_over_company_page() {
  let mut b = book();
  let mut input = acme();
  input.company_linkedin = "https://linkedin.com/company/acme".into();
  input.contact_linkedin = "https://linkedin.com/in/wile".into();
  let c = b.add(input).unwrap();

  let urls = b.insight_request(c.id).unwrap();
  assert_eq!(urls.linkedin.as_deref(), Some("https://linkedin.com/in/wile"));
  assert!(urls.facebook.is_none());
}

#[test]
fn apply_insights_stores_profile_and_stamps_time() {
  let mut b = book();
  let c = b.add(acme()).unwrap();

  let updated = b.apply_insights(c.id, Ok::<_, std::io::Error>(profile())).unwrap();
  let stored = &updated.social_profile;
  assert_eq!(stored.company_info.as_ref().unwrap().founded, "1949");
  assert!(stored.last_updated.is_some());
  assert_eq!(b.get(c.id).unwrap().social_profile, *stored);
}

#[test]
fn failed_fetch_leaves_profile_unchanged() {
  let mut b = book();
  let c = b.add(acme()).unwrap();

  let err = b
    .apply_insights(c.id, Err::<SocialProfile, _>("upstream timed out"))
    .unwrap_err();
  assert!(matches!(&err, Error::ExternalFetch(msg) if msg == "upstream timed out"));
  assert_eq!(b.get(c.id).unwrap().social_profile, SocialProfile::default());
}

#[test]
fn insights_for_deleted_contact_are_dropped() {
  let mut b = book();
  let c = b.add(acme()).unwrap();
  b.delete(c.id).unwrap();

  let err = b
    .apply_insights(c.id, Ok::<_, std::io::Error>(profile()))
    .unwrap_err();
  assert!(matches!(err, Error::ContactNotFound(_)));
  assert!(b.contacts().is_empty());
}

// ─── persistence ─────────────────────────────────────────────────────────────

#[test]
fn reopening_restores_contacts_events_and_goal() {
  let snapshots = Arc::new(MemorySnapshots::new());
  let (contact_id, events) = {
    let mut b = book_on(snapshots.clone());
    let c = b.add(acme()).unwrap();
    b.advance_stage(c.id, at(2024, 4, 2)).unwrap();
    b.set_lead_goal(3).unwrap();
    (c.id, b.events().to_vec())
  };

  let reopened = book_on(snapshots);
  assert_eq!(reopened.get(contact_id).unwrap().stage, Stage::SecondEmail);
  assert_eq!(reopened.events(), events.as_slice());
  assert_eq!(reopened.lead_goal(), 3);
}

#[test]
fn corrupt_snapshot_fails_to_open() {
  let snapshots = MemorySnapshots::new();
  snapshots.write(SnapshotKey::Contacts, "{not json").unwrap();
  let err = ContactBook::open(snapshots).err().unwrap();
  assert!(matches!(err, Error::Serialization(_)));
}

#[derive(Debug, thiserror::Error)]
#[error("disk full")]
struct DiskFull;

/// In-memory snapshots whose writes fail for the keys in `failing`.
#[derive(Default)]
struct FlakySnapshots {
  inner:   MemorySnapshots,
  failing: Mutex<Vec<SnapshotKey>>,
}

impl FlakySnapshots {
  fn fail(&self, keys: &[SnapshotKey]) { *self.failing.lock().unwrap() = keys.to_vec(); }

  fn heal(&self) { self.failing.lock().unwrap().clear(); }
}

impl SnapshotStore for FlakySnapshots {
  type Error = DiskFull;

  fn read(&self, key: SnapshotKey) -> Result<Option<String>, DiskFull> {
    Ok(self.inner.get(key))
  }

  fn write(&self, key: SnapshotKey, value: &str) -> Result<(), DiskFull> {
    if self.failing.lock().unwrap().contains(&key) {
      return Err(DiskFull);
    }
    let Ok(()) = self.inner.write(key, value);
    Ok(())
  }
}

fn flaky_book() -> (ContactBook<Arc<FlakySnapshots>>, Arc<FlakySnapshots>) {
  let snapshots = Arc::new(FlakySnapshots::default());
  let b = ContactBook::open_with_clock(snapshots.clone(), Arc::new(FixedClock(t0())))
    .expect("open book");
  (b, snapshots)
}

const ALL_KEYS: [SnapshotKey; 3] =
  [SnapshotKey::Contacts, SnapshotKey::CalendarEvents, SnapshotKey::LeadGoal];

#[test]
fn failed_add_leaves_nothing_behind_and_retry_adds_once() {
  let (mut b, snapshots) = flaky_book();
  snapshots.fail(&ALL_KEYS);

  let err = b.add(acme()).unwrap_err();
  assert!(matches!(err, Error::Persistence(_)));
  assert!(b.contacts().is_empty());
  assert!(b.events().is_empty());

  snapshots.heal();
  b.add(acme()).unwrap();
  assert_eq!(b.contacts().len(), 1);
  assert_eq!(b.events().len(), 1);
}

#[test]
fn failed_advance_rolls_back_and_retry_advances_one_stage() {
  let (mut b, snapshots) = flaky_book();
  let c = b.add(acme()).unwrap();
  let contacts = b.contacts().to_vec();
  let events = b.events().to_vec();

  snapshots.fail(&ALL_KEYS);
  let err = b.advance_stage(c.id, at(2024, 4, 2)).unwrap_err();
  assert!(matches!(err, Error::Persistence(_)));
  assert_eq!(b.contacts(), contacts.as_slice());
  assert_eq!(b.events(), events.as_slice());

  snapshots.heal();
  let advanced = b.advance_stage(c.id, at(2024, 4, 2)).unwrap();
  assert_eq!(advanced.stage, Stage::SecondEmail);
  assert_single_pending(&b);
}

#[test]
fn partial_write_failure_restores_the_written_snapshot() {
  let (mut b, snapshots) = flaky_book();
  let c = b.add(acme()).unwrap();

  // Contacts is written first and succeeds; the calendar write fails.
  snapshots.fail(&[SnapshotKey::CalendarEvents]);
  b.advance_stage(c.id, at(2024, 4, 2)).unwrap_err();
  assert_eq!(b.get(c.id).unwrap().stage, Stage::FirstEmail);

  snapshots.heal();
  let reopened = ContactBook::open(snapshots.clone()).unwrap();
  assert_eq!(reopened.get(c.id).unwrap().stage, Stage::FirstEmail);
  assert_eq!(reopened.events(), b.events());
}

#[test]
fn failed_delete_keeps_contact_and_events() {
  let (mut b, snapshots) = flaky_book();
  let c = b.add(acme()).unwrap();

  snapshots.fail(&ALL_KEYS);
  assert!(b.delete(c.id).is_err());
  assert!(b.get(c.id).is_some());
  assert_eq!(b.events().len(), 1);
}

#[test]
fn failed_lead_goal_write_keeps_previous_goal() {
  let (mut b, snapshots) = flaky_book();
  snapshots.fail(&[SnapshotKey::LeadGoal]);
  assert!(b.set_lead_goal(4).is_err());
  assert_eq!(b.lead_goal(), DEFAULT_LEAD_GOAL);
}
