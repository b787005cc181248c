use std::sync::LazyLock;

use regex::Regex;

use super::date::{parse_date, CalendarDate};
use super::markup::plain_text;
use crate::error::DateError;

static FULL_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\|\s*full name\s*=(.*?)\n\s*(?:\||\}\})").unwrap());
static BIRTH_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\|\s*birthDate\s*=(.*?)\n\s*(?:\||\}\})").unwrap());
static LABEL_LINES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)^.*\n").unwrap());
static PARENTHETICAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(.+").unwrap());

/// Facts pulled out of a character page's infobox.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    pub full_name: Option<String>,
    pub date_text: Option<String>,
    pub parsed_date: Option<CalendarDate>,
}

/// Read the name and birth date fields out of the raw page markup.
///
/// A missing field block is not an error. A birth date that is present but
/// not understood returns the date error.
pub fn extract(wikitext: &str) -> Result<ExtractedFields, DateError> {
    let mut fields = extract_text(wikitext);
    if let Some(text) = &fields.date_text {
        fields.parsed_date = Some(parse_date(text)?);
    }
    Ok(fields)
}

/// Like [`extract`] but leaves `parsed_date` empty.
pub fn extract_text(wikitext: &str) -> ExtractedFields {
    let full_name = field_block(&FULL_NAME_RE, wikitext).map(|raw| {
        let text = plain_text(raw);
        let text = LABEL_LINES_RE.replace(&text, "");
        PARENTHETICAL_RE.replace(&text, "").trim().to_string()
    });

    let date_text = field_block(&BIRTH_DATE_RE, wikitext).map(|raw| plain_text(raw).trim().to_string());

    ExtractedFields {
        full_name: full_name.filter(|s| !s.is_empty()),
        date_text: date_text.filter(|s| !s.is_empty()),
        parsed_date: None,
    }
}

fn field_block<'a>(re: &Regex, wikitext: &'a str) -> Option<&'a str> {
    re.captures(wikitext)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
