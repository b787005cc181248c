use std::fmt;

use thiserror::Error;

/// Which calendar field failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Year,
    Month,
    Day,
}

impl fmt::Display for DateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DateField::Year => "year",
            DateField::Month => "month",
            DateField::Day => "day",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    /// None of the known date shapes matched.
    #[error("failed to parse date: {text:?}")]
    Format { text: String },
    /// A shape matched but produced an out-of-range field.
    #[error("invalid {field}: {value}")]
    Range { field: DateField, value: i64 },
}

/// Failures talking to the wiki, for both category queries and rendering.
#[derive(Debug, Error)]
pub enum WikiError {
    /// Error object reported by the API itself, kept verbatim.
    #[error("{code}: {info}")]
    Api { code: String, info: String },
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A character whose birth date could not be normalized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{title}: bad birth date {date_text:?}: {source}")]
pub struct RecordError {
    pub title: String,
    pub date_text: String,
    #[source]
    pub source: DateError,
}
