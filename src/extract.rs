//! Conversion of extracted values into Rust types
//!
//! Records hold untyped [`Value`]s. The [`FromHtml`] trait turns them into
//! typed fields through [`Record::get_as`](crate::Record::get_as).

use crate::{NodeHandle, ParseError, Value};

/// Trait for types that can be parsed from extracted HTML values
///
/// # Implementing FromHtml
///
/// ```ignore
/// use listmapper::{FromHtml, ParseError};
///
/// struct Price(u64);
///
/// impl FromHtml for Price {
///     fn from_text(text: &str) -> Result<Self, ParseError> {
///         let digits: String = text.chars().filter(char::is_ascii_digit).collect();
///         u64::from_text(&digits).map(Price)
///     }
/// }
/// ```
pub trait FromHtml: Sized {
    /// Parse a value from text content or an attribute value
    fn from_text(text: &str) -> Result<Self, ParseError>;

    /// Parse a value from an element that carried no text
    ///
    /// By default the element's (empty) text content is parsed.
    fn from_node(node: &NodeHandle) -> Result<Self, ParseError> {
        Self::from_text(node.text())
    }

    /// Parse an extracted value
    fn from_value(value: &Value) -> Result<Self, ParseError> {
        match value {
            Value::Text(text) => Self::from_text(text),
            Value::Node(node) => Self::from_node(node),
        }
    }
}

impl FromHtml for String {
    fn from_text(text: &str) -> Result<Self, ParseError> {
        Ok(text.trim().to_string())
    }
}

impl FromHtml for NodeHandle {
    fn from_text(text: &str) -> Result<Self, ParseError> {
        Err(ParseError::Custom {
            message: format!("expected an element, found text '{text}'"),
        })
    }

    fn from_node(node: &NodeHandle) -> Result<Self, ParseError> {
        Ok(node.clone())
    }
}

macro_rules! impl_from_html_int {
    ($($ty:ty),*) => {$(
        impl FromHtml for $ty {
            fn from_text(text: &str) -> Result<Self, ParseError> {
                text.trim()
                    .parse()
                    .map_err(|error| ParseError::InvalidNumber {
                        text: text.to_string(),
                        error,
                    })
            }
        }
    )*};
}

macro_rules! impl_from_html_float {
    ($($ty:ty),*) => {$(
        impl FromHtml for $ty {
            fn from_text(text: &str) -> Result<Self, ParseError> {
                text.trim()
                    .parse()
                    .map_err(|error| ParseError::InvalidFloat {
                        text: text.to_string(),
                        error,
                    })
            }
        }
    )*};
}

impl_from_html_int!(i32, u32, i64, u64, usize);
impl_from_html_float!(f32, f64);

impl FromHtml for bool {
    fn from_text(text: &str) -> Result<Self, ParseError> {
        let trimmed = text.trim().to_lowercase();
        match trimmed.as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" | "" => Ok(false),
            _ => Err(ParseError::InvalidBool {
                text: text.to_string(),
            }),
        }
    }
}

// Empty or unparsable text becomes None instead of an error
impl<T: FromHtml> FromHtml for Option<T> {
    fn from_text(text: &str) -> Result<Self, ParseError> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(T::from_text(text).ok())
    }

    fn from_node(node: &NodeHandle) -> Result<Self, ParseError> {
        if node.text().trim().is_empty() {
            return Ok(None);
        }
        Ok(T::from_node(node).ok())
    }
}

// Comma-separated lists
impl<T: FromHtml> FromHtml for Vec<T> {
    fn from_text(text: &str) -> Result<Self, ParseError> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        text.split(',')
            .map(|s| T::from_text(s.trim()))
            .collect::<Result<Vec<_>, _>>()
    }
}
