//! Document-query abstraction and its `scraper` implementation
//!
//! The engine never talks to an HTML parser directly. It asks a
//! [`QueryDocument`] for the ordered elements matching a query, for the
//! nearest ancestor of a given kind, and for an element's descendants. Any
//! query dialect can sit behind this trait; the bundled [`Document`] uses CSS
//! selectors through `scraper`.
//!
//! # Query syntax
//!
//! A query is a CSS selector, optionally followed by whitespace and `@name`:
//!
//! ```text
//! ol#results li h2 span.title          -> text of each matching element
//! ol#results li a.item-link @href      -> value of each element's href
//! ```
//!
//! Elements without the named attribute do not match an `@name` query.

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

use crate::QueryError;

/// An extracted value: text when some was available, otherwise the node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Text content of an element, or the value of an attribute
    Text(String),
    /// The element itself, when it carried no text
    Node(NodeHandle),
}

impl Value {
    /// The text of this value, if it is textual
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            Value::Node(_) => None,
        }
    }

    /// The node of this value, if it is a node
    pub fn as_node(&self) -> Option<&NodeHandle> {
        match self {
            Value::Text(_) => None,
            Value::Node(node) => Some(node),
        }
    }
}

/// Owned snapshot of one element
///
/// The position is the element's index in document order and only has meaning
/// for the document the handle came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeHandle {
    #[serde(skip)]
    position: usize,
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
}

impl NodeHandle {
    /// Create a handle from its parts
    ///
    /// Used by [`QueryDocument`] implementations; the name is lower-cased.
    pub fn new(
        position: usize,
        name: impl Into<String>,
        attributes: Vec<(String, String)>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            position,
            name: name.into().to_ascii_lowercase(),
            attributes,
            text: text.into(),
        }
    }

    /// Index of the element in document order
    pub fn position(&self) -> usize {
        self.position
    }

    /// Lower-case tag name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value of an attribute, if present
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Whether the attribute is present, whatever its value
    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// All attributes in source order
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Concatenated text content of the element and its descendants
    pub fn text(&self) -> &str {
        &self.text
    }

    pub(crate) fn set_attr(&mut self, name: &str, value: &str) {
        match self
            .attributes
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.attributes.push((name.to_string(), value.to_string())),
        }
    }
}

/// A parsed query: a selector plus an optional attribute to read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    selector: String,
    attribute: Option<String>,
}

impl Query {
    /// Split a query string into its selector and attribute parts
    pub fn parse(query: &str) -> Result<Self, QueryError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(QueryError::Empty);
        }

        let (selector, attribute) = match query.rsplit_once('@') {
            Some((head, tail)) if is_attribute_suffix(head, tail) => {
                let name = tail.trim();
                if name.is_empty() {
                    return Err(QueryError::MissingAttributeName {
                        query: query.to_string(),
                    });
                }
                // Parsed HTML attribute names are lower-case
                (head.trim(), Some(name.to_ascii_lowercase()))
            }
            _ => (query, None),
        };

        if selector.is_empty() {
            return Err(QueryError::Empty);
        }

        Ok(Self {
            selector: selector.to_string(),
            attribute,
        })
    }

    /// The selector part
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// The attribute to read, if any
    pub fn attribute(&self) -> Option<&str> {
        self.attribute.as_deref()
    }

    /// The value a matched element yields for this query
    ///
    /// Non-empty text (trimmed content, or the attribute value) wins; an
    /// element with nothing to say yields itself.
    pub fn value_of(&self, node: &NodeHandle) -> Value {
        let text = match &self.attribute {
            Some(name) => node.attr(name).unwrap_or_default(),
            None => node.text().trim(),
        };

        if text.is_empty() {
            Value::Node(node.clone())
        } else {
            Value::Text(text.to_string())
        }
    }
}

// `@` inside an attribute selector such as a[href*='@'] is not a suffix
fn is_attribute_suffix(head: &str, tail: &str) -> bool {
    !tail.contains(']') && (head.is_empty() || head.ends_with(char::is_whitespace))
}

/// Capability a document must offer to the extraction engine
pub trait QueryDocument {
    /// Elements matching the query, in document order
    ///
    /// For `@name` queries only elements carrying the attribute match.
    fn select(&self, query: &Query) -> Result<Vec<NodeHandle>, QueryError>;

    /// Nearest ancestor of `node` whose tag name is `kind`
    fn closest(&self, node: &NodeHandle, kind: &str) -> Option<NodeHandle>;

    /// Descendant elements of `node`, in document order
    fn descendants(&self, node: &NodeHandle) -> Vec<NodeHandle>;

    /// Evaluate a query string into an ordered set of values
    fn evaluate(&self, query: &str) -> Result<Vec<Value>, QueryError> {
        let query = Query::parse(query)?;
        Ok(self
            .select(&query)?
            .iter()
            .map(|node| query.value_of(node))
            .collect())
    }
}

/// A parsed HTML document together with the URL it was loaded from
#[derive(Debug, Clone)]
pub struct Document {
    url: String,
    html: Html,
}

impl Document {
    /// Parse an HTML document
    pub fn parse(url: impl Into<String>, body: &str) -> Self {
        Self {
            url: url.into(),
            html: Html::parse_document(body),
        }
    }

    /// The URL the document was loaded from
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The underlying `scraper` document
    pub fn html(&self) -> &Html {
        &self.html
    }

    fn elements(&self) -> impl Iterator<Item = ElementRef<'_>> {
        self.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
    }

    fn element_at(&self, position: usize) -> Option<ElementRef<'_>> {
        self.elements().nth(position)
    }

    fn snapshot(position: usize, element: ElementRef<'_>) -> NodeHandle {
        let value = element.value();
        NodeHandle::new(
            position,
            value.name(),
            value
                .attrs()
                .map(|(key, val)| (key.to_string(), val.to_string()))
                .collect(),
            element.text().collect::<String>(),
        )
    }
}

impl QueryDocument for Document {
    fn select(&self, query: &Query) -> Result<Vec<NodeHandle>, QueryError> {
        let selector =
            Selector::parse(query.selector()).map_err(|error| QueryError::InvalidSelector {
                selector: query.selector().to_string(),
                error: error.to_string(),
            })?;

        Ok(self
            .elements()
            .enumerate()
            .filter(|(_, element)| selector.matches(element))
            .filter(|(_, element)| match query.attribute() {
                Some(name) => element.value().attr(name).is_some(),
                None => true,
            })
            .map(|(position, element)| Self::snapshot(position, element))
            .collect())
    }

    fn closest(&self, node: &NodeHandle, kind: &str) -> Option<NodeHandle> {
        let element = self.element_at(node.position())?;
        let ancestor = element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|ancestor| ancestor.value().name().eq_ignore_ascii_case(kind))?;

        self.elements()
            .take(node.position())
            .position(|candidate| candidate.id() == ancestor.id())
            .map(|position| Self::snapshot(position, ancestor))
    }

    fn descendants(&self, node: &NodeHandle) -> Vec<NodeHandle> {
        let Some(element) = self.element_at(node.position()) else {
            return Vec::new();
        };

        // Descendants occupy the positions right after their ancestor
        element
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .enumerate()
            .map(|(offset, child)| Self::snapshot(node.position() + 1 + offset, child))
            .collect()
    }
}
