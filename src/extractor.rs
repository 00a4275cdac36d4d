//! Record extraction from one document
//!
//! Every attribute query runs against the whole document. The matches of
//! the first declared attribute decide how many records come out; the other
//! attributes are lined up by position, so the i-th match of each query lands
//! in the i-th record.

use tracing::{debug, error, warn};

use crate::{AttributeQueryMap, ExtractionError, QueryDocument, Record, Value};

/// Outcome of an extraction: the records plus everything that went wrong
#[derive(Debug, Default)]
pub struct Extraction {
    records: Vec<Record>,
    errors: Vec<ExtractionError>,
}

impl Extraction {
    /// Extracted records in first-attribute match order
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Query failures and missing fields encountered on the way
    pub fn errors(&self) -> &[ExtractionError] {
        &self.errors
    }

    /// Take the records, dropping the diagnostics
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

/// Evaluates an [`AttributeQueryMap`] against documents
#[derive(Debug, Clone)]
pub struct RecordExtractor {
    attributes: AttributeQueryMap,
}

impl RecordExtractor {
    /// Create an extractor for the given attribute queries
    pub fn new(attributes: AttributeQueryMap) -> Self {
        Self { attributes }
    }

    /// The attribute queries in use
    pub fn attributes(&self) -> &AttributeQueryMap {
        &self.attributes
    }

    /// Replace the attribute queries
    pub fn set_attributes(&mut self, attributes: AttributeQueryMap) -> &mut Self {
        self.attributes = attributes;
        self
    }

    /// Extract records from a document
    ///
    /// Failures are logged and skipped; see [`extract_detailed`](Self::extract_detailed)
    /// to inspect them.
    pub fn extract<D: QueryDocument + ?Sized>(&self, document: &D) -> Vec<Record> {
        self.extract_detailed(document).into_records()
    }

    /// Extract records from a document, keeping the diagnostics
    ///
    /// A query that fails to evaluate only loses its own attribute, unless it
    /// is the first attribute's query: then no record is produced at all.
    pub fn extract_detailed<D: QueryDocument + ?Sized>(&self, document: &D) -> Extraction {
        let mut extraction = Extraction::default();

        let snapshots: Vec<(&str, &str, Option<Vec<Value>>)> = self
            .attributes
            .iter()
            .map(|(attribute, query)| match document.evaluate(query) {
                Ok(values) => (attribute, query, Some(values)),
                Err(err) => {
                    error!(attribute, query, error = %err, "attribute query failed");
                    extraction.errors.push(ExtractionError::InvalidQuery {
                        attribute: attribute.to_string(),
                        query: query.to_string(),
                        error: err,
                    });
                    (attribute, query, None)
                }
            })
            .collect();

        let Some(count) = snapshots
            .first()
            .and_then(|(_, _, values)| values.as_ref())
            .map(Vec::len)
        else {
            return extraction;
        };

        for index in 0..count {
            let mut record = Record::new();
            for (attribute, query, values) in &snapshots {
                match values.as_ref().and_then(|values| values.get(index)) {
                    Some(value) => record.push(attribute, value.clone()),
                    None => {
                        warn!(
                            attribute,
                            query,
                            index,
                            "no match for field at this position"
                        );
                        extraction.errors.push(ExtractionError::MissingField {
                            field: attribute.to_string(),
                            query: query.to_string(),
                            index,
                        });
                    }
                }
            }
            extraction.records.push(record);
        }

        debug!(
            records = extraction.records.len(),
            errors = extraction.errors.len(),
            "extraction finished"
        );
        extraction
    }
}
