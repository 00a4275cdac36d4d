//! Attribute query maps and the records extracted with them

use std::fmt;

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};

use crate::{ExtractionError, FromHtml, Value};

/// Ordered mapping from attribute name to query
///
/// Declaration order matters: the first attribute decides how many records a
/// document yields. Deserializing from a JSON object keeps the key order of
/// the source document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeQueryMap {
    entries: Vec<(String, String)>,
}

impl AttributeQueryMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attribute, or replace the query of an existing one in place
    pub fn insert(&mut self, attribute: impl Into<String>, query: impl Into<String>) {
        let attribute = attribute.into();
        let query = query.into();
        match self.entries.iter_mut().find(|(name, _)| *name == attribute) {
            Some((_, existing)) => *existing = query,
            None => self.entries.push((attribute, query)),
        }
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, attribute: impl Into<String>, query: impl Into<String>) -> Self {
        self.insert(attribute, query);
        self
    }

    /// Query configured for an attribute
    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == attribute)
            .map(|(_, query)| query.as_str())
    }

    /// The first declared attribute and its query
    pub fn first(&self) -> Option<(&str, &str)> {
        self.entries
            .first()
            .map(|(name, query)| (name.as_str(), query.as_str()))
    }

    /// Attributes and queries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, query)| (name.as_str(), query.as_str()))
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no attribute is configured
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for AttributeQueryMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (attribute, query) in iter {
            map.insert(attribute, query);
        }
        map
    }
}

impl Serialize for AttributeQueryMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (attribute, query) in &self.entries {
            map.serialize_entry(attribute, query)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AttributeQueryMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = AttributeQueryMap;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of attribute names to queries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = AttributeQueryMap::new();
                while let Some((attribute, query)) = access.next_entry::<String, String>()? {
                    map.insert(attribute, query);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

/// One extracted record: attribute name to value, in declaration order
///
/// Fields whose query had no match at this record's position are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, attribute: &str, value: Value) {
        self.fields.push((attribute.to_string(), value));
    }

    /// Value of a field
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == attribute)
            .map(|(_, value)| value)
    }

    /// Text of a field, if it is present and textual
    pub fn text(&self, attribute: &str) -> Option<&str> {
        self.get(attribute).and_then(Value::as_text)
    }

    /// Convert a field into a typed value
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let price: f64 = record.get_as("price")?;
    /// let rating: Option<u32> = record.get_as("rating")?;
    /// ```
    pub fn get_as<T: FromHtml>(&self, attribute: &str) -> Result<T, ExtractionError> {
        let value = self
            .get(attribute)
            .ok_or_else(|| ExtractionError::MissingField {
                field: attribute.to_string(),
                query: String::new(),
                index: 0,
            })?;

        T::from_value(value).map_err(|error| ExtractionError::ParseError {
            field: attribute.to_string(),
            text: match value {
                Value::Text(text) => text.clone(),
                Value::Node(node) => node.text().to_string(),
            },
            error,
        })
    }

    /// Whether the field is present
    pub fn contains(&self, attribute: &str) -> bool {
        self.get(attribute).is_some()
    }

    /// Field names and values in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Number of present fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields at all
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (attribute, value) in &self.fields {
            map.serialize_entry(attribute, value)?;
        }
        map.end()
    }
}
