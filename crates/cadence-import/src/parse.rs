//! RFC 4180-style CSV tokenizer.
//!
//! Handles quoted fields with embedded commas, doubled quotes and line
//! breaks, and both LF and CRLF record separators. Whitespace around unquoted
//! fields is trimmed, matching what spreadsheet exports produce.

use crate::{Error, Result};

/// One record: its fields and the (1-based) line it started on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
  pub line:   usize,
  pub fields: Vec<String>,
}

impl Record {
  fn is_blank(&self) -> bool { self.fields.iter().all(|f| f.is_empty()) }
}

/// Split `input` into records. Blank records are dropped.
pub fn records(input: &str) -> Result<Vec<Record>> {
  let input = input.strip_prefix('\u{feff}').unwrap_or(input);

  let mut out = Vec::new();
  let mut fields = Vec::new();
  let mut field = String::new();
  let mut quoted = false;
  let mut in_quotes = false;
  let mut line = 1;
  let mut record_line = 1;
  let mut quote_line = 1;

  let mut chars = input.chars().peekable();
  while let Some(c) = chars.next() {
    if in_quotes {
      match c {
        '"' if chars.peek() == Some(&'"') => {
          chars.next();
          field.push('"');
        }
        '"' => in_quotes = false,
        '\n' => {
          line += 1;
          field.push('\n');
        }
        '\r' if chars.peek() == Some(&'\n') => {}
        _ => field.push(c),
      }
      continue;
    }

    match c {
      '"' if field.trim().is_empty() && !quoted => {
        field.clear();
        quoted = true;
        in_quotes = true;
        quote_line = line;
      }
      ',' => fields.push(finish_field(&mut field, &mut quoted)),
      '\r' if chars.peek() == Some(&'\n') => {}
      ' ' | '\t' if quoted => {}
      '\n' => {
        fields.push(finish_field(&mut field, &mut quoted));
        push_record(&mut out, record_line, std::mem::take(&mut fields));
        line += 1;
        record_line = line;
      }
      _ => field.push(c),
    }
  }

  if in_quotes {
    return Err(Error::UnterminatedQuote { line: quote_line });
  }
  if !field.is_empty() || quoted || !fields.is_empty() {
    fields.push(finish_field(&mut field, &mut quoted));
    push_record(&mut out, record_line, fields);
  }

  Ok(out)
}

fn finish_field(field: &mut String, quoted: &mut bool) -> String {
  let value = if *quoted {
    std::mem::take(field)
  } else {
    let trimmed = field.trim().to_owned();
    field.clear();
    trimmed
  };
  *quoted = false;
  value
}

fn push_record(out: &mut Vec<Record>, line: usize, fields: Vec<String>) {
  let record = Record { line, fields };
  if !record.is_blank() {
    out.push(record);
  }
}
