//! The insight-fetch boundary.
//!
//! Insight generation is an external, asynchronous collaborator. The core only
//! decides whether a contact may be sent (see [`SocialUrls::for_contact`]) and
//! merges the eventual result through
//! [`crate::book::ContactBook::apply_insights`].

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::contact::{Contact, SocialProfile};

/// The social links an insight fetch is based on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialUrls {
  pub linkedin: Option<String>,
  pub facebook: Option<String>,
}

impl SocialUrls {
  /// Links for `contact`, or `None` if it has none of company LinkedIn,
  /// contact LinkedIn or contact Facebook.
  ///
  /// The contact's own LinkedIn is preferred over the company page.
  pub fn for_contact(contact: &Contact) -> Option<Self> {
    if !contact.has_social_links() {
      return None;
    }
    let linkedin = non_empty(&contact.contact_linkedin)
      .or_else(|| non_empty(&contact.company_linkedin));
    Some(Self { linkedin, facebook: non_empty(&contact.contact_facebook) })
  }
}

fn non_empty(s: &str) -> Option<String> {
  let trimmed = s.trim();
  (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Abstraction over an insight provider.
///
/// Retry and backoff, if any, live entirely inside the implementation.
pub trait InsightSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn fetch_insights<'a>(
    &'a self,
    urls: &'a SocialUrls,
  ) -> impl Future<Output = Result<SocialProfile, Self::Error>> + Send + 'a;
}
