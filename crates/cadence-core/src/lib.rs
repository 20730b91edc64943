//! Core types and the follow-up scheduling model for Cadence.
//!
//! Pure synchronous; no HTTP or database dependencies. It owns
//! the contact sequence state machine, the follow-up calendar, and the
//! [`book::ContactBook`] that keeps the two consistent. Storage and insight
//! generation are reached through the traits in [`persist`] and [`insights`].

pub mod book;
pub mod calendar;
pub mod contact;
pub mod date;
pub mod error;
pub mod event;
pub mod insights;
pub mod persist;
pub mod sequence;
pub mod stage;

pub use error::{Error, Result};

#[cfg(test)]
mod tests;
