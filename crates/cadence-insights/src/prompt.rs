//! Request construction and completion parsing. No I/O.

use cadence_core::{
  contact::{CompanyInfo, PersonalInfo, SocialProfile},
  insights::SocialUrls,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{Error, Result};

const SYSTEM: &str = "You research sales prospects. Reply with a single JSON object \
with two keys. \"company_info\": {\"founded\": string, \"milestones\": [string], \
\"awards\": [string], \"recent_news\": [string], \"offerings\": [string], \
\"culture\": [string]}. \"personal_info\": {\"career\": [string], \
\"education\": [string], \"interests\": [string], \"publications\": [string], \
\"causes\": [string], \"recent_activity\": [string], \"achievements\": [string]}. \
Use empty strings or arrays for anything you cannot find.";

/// The user message describing which profiles to research.
pub fn user_message(urls: &SocialUrls) -> String {
  let mut msg = String::from("Summarise what is publicly known about this prospect.\n");
  if let Some(linkedin) = &urls.linkedin {
    msg.push_str(&format!("LinkedIn: {linkedin}\n"));
  }
  if let Some(facebook) = &urls.facebook {
    msg.push_str(&format!("Facebook: {facebook}\n"));
  }
  msg
}

/// Body for `POST {base_url}/chat/completions`.
pub fn request_body(model: &str, urls: &SocialUrls) -> Value {
  json!({
    "model": model,
    "temperature": 0.7,
    "response_format": { "type": "json_object" },
    "messages": [
      { "role": "system", "content": SYSTEM },
      { "role": "user", "content": user_message(urls) },
    ],
  })
}

/// The assistant text out of a chat-completions response body.
pub fn completion_content(response: &str) -> Result<String> {
  let data: Value = serde_json::from_str(response)
    .map_err(|e| Error::Completion(format!("response is not JSON: {e}")))?;
  data["choices"][0]["message"]["content"]
    .as_str()
    .map(str::to_owned)
    .ok_or_else(|| Error::Completion("no message content in response".into()))
}

#[derive(Deserialize)]
struct Insights {
  company_info:  Option<CompanyInfo>,
  personal_info: Option<PersonalInfo>,
}

/// Parse assistant text into a profile. Tolerates a markdown code fence
/// around the JSON. `last_updated` is left for the caller to stamp.
pub fn parse_profile(content: &str) -> Result<SocialProfile> {
  let json = strip_fence(content);
  let insights: Insights = serde_json::from_str(json)
    .map_err(|e| Error::Completion(format!("insights are not valid JSON: {e}")))?;

  if insights.company_info.is_none() && insights.personal_info.is_none() {
    return Err(Error::Completion("no company or personal insights".into()));
  }
  Ok(SocialProfile {
    company_info:  insights.company_info,
    personal_info: insights.personal_info,
    last_updated:  None,
  })
}

fn strip_fence(content: &str) -> &str {
  let trimmed = content.trim();
  let Some(rest) = trimmed.strip_prefix("```") else {
    return trimmed;
  };
  let rest = rest.strip_prefix("json").unwrap_or(rest);
  rest.strip_suffix("```").unwrap_or(rest).trim()
}
