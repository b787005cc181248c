use std::collections::HashMap;

use crate::source::RawDocument;

/// One character, merged across every category it appeared in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterRecord {
    pub title: String,
    /// Categories in the order they were merged.
    pub source_categories: Vec<String>,
    /// Markup from the first category the title was found in.
    pub markup: String,
}

/// Title-keyed merge of category listings. Records keep first-insertion order.
#[derive(Debug, Default)]
pub struct CharacterAggregator {
    records: Vec<CharacterRecord>,
    index: HashMap<String, usize>,
}

impl CharacterAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one category's documents. Call once per category, in display order.
    pub fn merge(&mut self, category: &str, documents: Vec<RawDocument>) {
        for doc in documents {
            match self.index.get(&doc.title) {
                Some(&i) => {
                    let categories = &mut self.records[i].source_categories;
                    if !categories.iter().any(|c| c == category) {
                        categories.push(category.to_string());
                    }
                }
                None => {
                    self.index.insert(doc.title.clone(), self.records.len());
                    self.records.push(CharacterRecord {
                        title: doc.title,
                        source_categories: vec![category.to_string()],
                        markup: doc.markup,
                    });
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<CharacterRecord> {
        self.records
    }
}
