use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::error::WikiError;

/// Opaque continuation parameters. Merged into the next request verbatim.
pub type Continuation = BTreeMap<String, String>;

/// One page of a category listing, as returned by the wiki.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub title: String,
    pub markup: String,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryPage {
    pub documents: Vec<RawDocument>,
    /// `None` once the listing is exhausted.
    pub continuation: Option<Continuation>,
}

/// Anything that can list the member pages of a category.
pub trait ContentSource {
    /// Fetch one batch of members. `continuation` is empty on the first call.
    async fn category_page(
        &self,
        category: &str,
        continuation: &Continuation,
    ) -> Result<CategoryPage, WikiError>;
}

/// Fetch every member of `category`, following continuations until the
/// source stops returning one. A title seen twice keeps its last markup.
pub async fn category_members<S: ContentSource>(
    source: &S,
    category: &str,
) -> Result<Vec<RawDocument>, WikiError> {
    let mut members: Vec<RawDocument> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut continuation = Continuation::new();
    let mut batches = 0usize;

    loop {
        let page = source.category_page(category, &continuation).await?;
        batches += 1;
        debug!("{}: batch {} with {} pages", category, batches, page.documents.len());

        for doc in page.documents {
            match index.get(&doc.title) {
                Some(&i) => members[i].markup = doc.markup,
                None => {
                    index.insert(doc.title.clone(), members.len());
                    members.push(doc);
                }
            }
        }

        match page.continuation {
            Some(next) => continuation = next,
            None => break,
        }
    }

    Ok(members)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;

    use super::*;

    /// Serves canned pages keyed by category; each call pops the next batch
    /// and records the continuation it was given.
    #[derive(Default)]
    pub struct FakeSource {
        pub pages: RefCell<HashMap<String, Vec<CategoryPage>>>,
        pub calls: RefCell<Vec<(String, Continuation)>>,
        pub fail_on: Option<String>,
    }

    impl FakeSource {
        pub fn with(mut self, category: &str, pages: Vec<CategoryPage>) -> Self {
            self.pages.get_mut().insert(category.to_string(), pages);
            self
        }
    }

    pub fn doc(title: &str, markup: &str) -> RawDocument {
        RawDocument { title: title.into(), markup: markup.into() }
    }

    pub fn cont(key: &str, value: &str) -> Option<Continuation> {
        Some(Continuation::from([(key.to_string(), value.to_string())]))
    }

    impl ContentSource for FakeSource {
        async fn category_page(
            &self,
            category: &str,
            continuation: &Continuation,
        ) -> Result<CategoryPage, WikiError> {
            self.calls
                .borrow_mut()
                .push((category.to_string(), continuation.clone()));
            if self.fail_on.as_deref() == Some(category) {
                return Err(WikiError::Api {
                    code: "internal_api_error_DBQueryError".into(),
                    info: "Database query error.".into(),
                });
            }
            let mut pages = self.pages.borrow_mut();
            let queue = pages.entry(category.to_string()).or_default();
            if queue.is_empty() {
                Ok(CategoryPage::default())
            } else {
                Ok(queue.remove(0))
            }
        }
    }
}
