use std::fmt::Write;

use rayon::prelude::*;
use tracing::warn;

use crate::aggregate::CharacterRecord;
use crate::error::RecordError;
use crate::parser::date::MISSING_SORT_KEY;
use crate::parser::fields::{self, ExtractedFields};

/// What to do with a character whose birth date cannot be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BadDatePolicy {
    /// Stop and return the first failure.
    Abort,
    /// Keep the row, sort it as undated and record a diagnostic.
    #[default]
    Flag,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub title: String,
    /// Full name if the infobox has one, otherwise the page title.
    pub label: String,
    pub stories: Vec<String>,
    pub sort_key: i64,
    /// Birth date as written on the page, or empty.
    pub date_text: String,
}

#[derive(Debug, Default)]
pub struct CharacterTable {
    /// Newest birth date first; undated rows last.
    pub rows: Vec<Row>,
    pub flagged: Vec<RecordError>,
}

/// Extract fields for every record and sort by birth date, descending.
pub fn build(records: Vec<CharacterRecord>, policy: BadDatePolicy) -> Result<CharacterTable, RecordError> {
    let extracted: Vec<(CharacterRecord, ExtractedFields, Option<RecordError>)> = records
        .into_par_iter()
        .map(|record| match fields::extract(&record.markup) {
            Ok(f) => (record, f, None),
            Err(source) => {
                let f = fields::extract_text(&record.markup);
                let err = RecordError {
                    title: record.title.clone(),
                    date_text: f.date_text.clone().unwrap_or_default(),
                    source,
                };
                (record, f, Some(err))
            }
        })
        .collect();

    let mut table = CharacterTable::default();
    for (record, f, err) in extracted {
        if let Some(err) = err {
            match policy {
                BadDatePolicy::Abort => return Err(err),
                BadDatePolicy::Flag => {
                    warn!("{}", err);
                    table.flagged.push(err);
                }
            }
        }
        table.rows.push(Row {
            label: f.full_name.unwrap_or_else(|| record.title.clone()),
            title: record.title,
            stories: record.source_categories,
            sort_key: f.parsed_date.map_or(MISSING_SORT_KEY, |d| d.sort_key()),
            date_text: f.date_text.unwrap_or_default(),
        });
    }

    table.rows.sort_by(|a, b| b.sort_key.cmp(&a.sort_key));
    Ok(table)
}

impl CharacterTable {
    /// Sortable wikitable markup for the wiki's parser.
    pub fn to_wikitext(&self) -> String {
        let mut out = String::from("{| class=\"wikitable sortable\"\n");
        out.push_str("! Character\n");
        out.push_str("! From comics\n");
        out.push_str("! Date of birth\n");
        for row in &self.rows {
            out.push_str("|-\n");
            let _ = writeln!(out, "| [[{}|{}]]", row.title, row.label);
            let _ = writeln!(out, "| {}", row.stories.join(", "));
            let _ = writeln!(
                out,
                "| data-sort-value={} | {{{{#formatdate: {} | dmy}}}}",
                row.sort_key, row.date_text
            );
        }
        out.push_str("|}");
        out
    }
}
