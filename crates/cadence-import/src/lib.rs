//! CSV import for Cadence.
//!
//! Turns spreadsheet exports into [`NewContact`] values ready for
//! [`ContactBook::import_batch`](cadence_core::book::ContactBook::import_batch).
//! Pure synchronous; validation of required fields is left to the book so
//! that it can report per-row failures.
//!
//! # Quick start
//!
//! ```no_run
//! use cadence_core::stage::WeekDay;
//! use cadence_import::parse_contacts;
//!
//! let csv = "Entity Name,Primary Contact,Email\nAcme,Wile,wile@acme.test\n";
//! let rows = parse_contacts(csv, WeekDay::Monday).unwrap();
//! assert_eq!(rows[0].entity_name, "Acme");
//! ```

pub mod error;
mod normalize;
mod parse;

use cadence_core::{contact::NewContact, stage::WeekDay};
pub use error::{Error, Result};
pub use normalize::{Row, header_key};

// ─── Public API ──────────────────────────────────────────────────────────────

/// Split `input` into rows keyed by normalised header.
///
/// The first non-blank record is the header row.
pub fn parse_rows(input: &str) -> Result<Vec<Row>> {
  let mut records = parse::records(input)?.into_iter();
  let header = records.next().ok_or(Error::MissingHeader)?;

  let rows: Vec<Row> = records
    .map(|r| Row::new(r.line, &header.fields, r.fields))
    .collect();

  tracing::debug!(
    columns = header.fields.len(),
    rows = rows.len(),
    "parsed CSV"
  );
  Ok(rows)
}

/// Parse `input` and map every row onto a [`NewContact`] assigned to `day`.
///
/// Rows are returned in file order, including those missing required fields.
pub fn parse_contacts(input: &str, day: WeekDay) -> Result<Vec<NewContact>> {
  Ok(
    parse_rows(input)?
      .into_iter()
      .map(|row| row.into_new_contact(day))
      .collect(),
  )
}
