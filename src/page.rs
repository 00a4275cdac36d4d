//! A page of extracted records
//!
//! [`RecordPage`] wraps the records of one document with a sequential cursor
//! (`first`, `next`, `has_next`, `each`) and a lazily fetched link to the next
//! page. The next page is fetched at most once: the first call to
//! [`RecordPage::next_page`] claims the fetch, and callers arriving while it
//! is in flight wait for the same result.

use std::{fmt, rc::Rc, sync::Arc};

use tokio::sync::OnceCell;

use crate::{Document, DocumentFetcher, PageError, PageTraversal, Record, RecordExtractor};

/// Records of one page plus the means to reach the next one
pub struct RecordPage {
    records: Vec<Record>,
    cursor: usize,
    document: Rc<Document>,
    traversal: Option<PageTraversal>,
    extractor: Arc<RecordExtractor>,
    fetcher: Arc<dyn DocumentFetcher>,
    next: OnceCell<Option<Box<RecordPage>>>,
}

impl RecordPage {
    /// Extract the records of `document` into a new page
    ///
    /// Without a traversal the page is the only one: `page_number` is 1 and
    /// `next_page` yields nothing.
    pub fn new(
        document: Rc<Document>,
        extractor: Arc<RecordExtractor>,
        fetcher: Arc<dyn DocumentFetcher>,
        traversal: Option<PageTraversal>,
    ) -> Self {
        let records = extractor.extract(&*document);
        Self {
            records,
            cursor: 0,
            document,
            traversal,
            extractor,
            fetcher,
            next: OnceCell::new(),
        }
    }

    /// All records, in extraction order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Record at position `n`
    pub fn get(&self, n: usize) -> Option<&Record> {
        self.records.get(n)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Cursor-independent iterator over the records
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Current cursor position
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the cursor back to the start
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Reset the cursor and return the first record, advancing past it
    pub fn first(&mut self) -> Option<&Record> {
        self.reset();
        self.next()
    }

    /// Return the record under the cursor and advance the cursor
    ///
    /// The cursor advances even past the end, so `has_next` eventually
    /// turns false.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<&Record> {
        let index = self.step();
        self.records.get(index)
    }

    /// Whether the cursor has not yet moved beyond the end
    ///
    /// The bound is inclusive: this is still true with the cursor exactly at
    /// `len()`, where `next` returns `None`. [`each`](Self::each) relies on it
    /// because `first` has already advanced the cursor by one.
    pub fn has_next(&self) -> bool {
        self.cursor <= self.records.len()
    }

    /// Call `callback` on every record in order, using the cursor
    pub fn each<F>(&mut self, mut callback: F)
    where
        F: FnMut(&Record),
    {
        self.reset();
        let mut current = self.step();
        while self.has_next() {
            if let Some(record) = self.records.get(current) {
                callback(record);
            }
            current = self.step();
        }
    }

    fn step(&mut self) -> usize {
        let index = self.cursor;
        self.cursor += 1;
        index
    }

    /// Page number, 1 when the page is not paginated
    pub fn page_number(&self) -> usize {
        self.traversal
            .as_ref()
            .map_or(1, PageTraversal::page_number)
    }

    /// Pagination of this page, if configured
    pub fn traversal(&self) -> Option<&PageTraversal> {
        self.traversal.as_ref()
    }

    /// The document the records were extracted from
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// URL of the page's document
    pub fn url(&self) -> &str {
        self.document.url()
    }

    /// The following page, fetched on first request and cached afterwards
    ///
    /// Returns `Ok(None)` when the page is not paginated or links to no next
    /// page. A failed fetch is not cached; calling again retries it.
    pub async fn next_page(&self) -> Result<Option<&RecordPage>, PageError> {
        let Some(traversal) = &self.traversal else {
            return Ok(None);
        };

        let next = self
            .next
            .get_or_try_init(|| async {
                traversal
                    .fetch_next(&self.extractor, &self.fetcher, &self.document)
                    .await
                    .map(|page| page.map(Box::new))
            })
            .await?;

        Ok(next.as_deref())
    }

    /// Consume this page and return the following one
    ///
    /// Reuses the page fetched by an earlier [`next_page`](Self::next_page)
    /// call when there is one.
    pub async fn into_next_page(self) -> Result<Option<RecordPage>, PageError> {
        let Some(traversal) = self.traversal else {
            return Ok(None);
        };

        match self.next.into_inner() {
            Some(next) => Ok(next.map(|page| *page)),
            None => {
                traversal
                    .fetch_next(&self.extractor, &self.fetcher, &self.document)
                    .await
            }
        }
    }
}

impl<'a> IntoIterator for &'a RecordPage {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl fmt::Debug for RecordPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordPage")
            .field("url", &self.document.url())
            .field("page_number", &self.page_number())
            .field("records", &self.records)
            .field("cursor", &self.cursor)
            .field("next_loaded", &self.next.initialized())
            .finish()
    }
}
