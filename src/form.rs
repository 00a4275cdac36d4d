//! Search forms and their submission encoding
//!
//! A [`SearchForm`] is an owned snapshot of a `<form>` element and the
//! controls inside it, detached from the document so values can be set
//! before the form is serialized.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::{Method, NodeHandle, QueryDocument};

/// Characters `encodeURIComponent` leaves untouched besides alphanumerics
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a value the way `encodeURIComponent` does
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// One `<option>` of a select control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub selected: bool,
}

/// A submittable control inside a form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormControl {
    /// `<input>` of any type; `kind` is the lower-cased type, `text` by default
    Input {
        position: usize,
        name: String,
        kind: String,
        value: String,
        checked: bool,
    },
    /// `<textarea>`
    TextArea {
        position: usize,
        name: String,
        value: String,
    },
    /// `<select>`, single or multiple
    Select {
        position: usize,
        name: String,
        multiple: bool,
        options: Vec<SelectOption>,
    },
}

impl FormControl {
    /// Document position of the control element
    pub fn position(&self) -> usize {
        match self {
            FormControl::Input { position, .. }
            | FormControl::TextArea { position, .. }
            | FormControl::Select { position, .. } => *position,
        }
    }

    /// The control's `name`
    pub fn name(&self) -> &str {
        match self {
            FormControl::Input { name, .. }
            | FormControl::TextArea { name, .. }
            | FormControl::Select { name, .. } => name,
        }
    }

    /// Build a control from a descendant of a form, if it is one
    fn from_node<D: QueryDocument + ?Sized>(document: &D, node: &NodeHandle) -> Option<Self> {
        let position = node.position();
        let name = node.attr("name").unwrap_or_default().to_string();

        match node.name() {
            "input" => {
                let kind = node
                    .attr("type")
                    .map(|kind| kind.trim().to_ascii_lowercase())
                    .filter(|kind| !kind.is_empty())
                    .unwrap_or_else(|| "text".to_string());
                // Image buttons are not part of a form's element list
                if kind == "image" {
                    return None;
                }
                let default_value = match kind.as_str() {
                    "checkbox" | "radio" => "on",
                    _ => "",
                };
                Some(FormControl::Input {
                    position,
                    name,
                    value: node.attr("value").unwrap_or(default_value).to_string(),
                    checked: node.has_attr("checked"),
                    kind,
                })
            }
            "textarea" => Some(FormControl::TextArea {
                position,
                name,
                value: node.text().to_string(),
            }),
            "select" => Some(FormControl::Select {
                position,
                name,
                multiple: node.has_attr("multiple"),
                options: document
                    .descendants(node)
                    .iter()
                    .filter(|child| child.name() == "option")
                    .map(|option| SelectOption {
                        value: match option.attr("value") {
                            Some(value) => value.to_string(),
                            None => option
                            .text()
                            .split_whitespace()
                            .collect::<Vec<_>>()
                            .join(" "),
                        },
                        selected: option.has_attr("selected"),
                    })
                    .collect(),
            }),
            _ => None,
        }
    }

    /// Entries this control contributes, in submission order
    fn entries(&self, out: &mut Vec<String>) {
        let name = self.name();
        match self {
            FormControl::Input {
                kind,
                value,
                checked,
                ..
            } => match kind.as_str() {
                "checkbox" | "radio" => {
                    if *checked {
                        out.push(format!("{name}={}", encode_component(value)));
                    }
                }
                "file" => {}
                _ => out.push(format!("{name}={}", encode_component(value))),
            },
            FormControl::TextArea { value, .. } => {
                out.push(format!("{name}={}", encode_component(value)));
            }
            FormControl::Select {
                multiple: false,
                options,
                ..
            } => {
                // The last selected option wins; with none selected the first is shown
                let value = options
                    .iter()
                    .rev()
                    .find(|option| option.selected)
                    .or_else(|| options.first())
                    .map(|option| option.value.as_str())
                    .unwrap_or_default();
                out.push(format!("{name}={}", encode_component(value)));
            }
            FormControl::Select {
                multiple: true,
                options,
                ..
            } => {
                for option in options.iter().rev().filter(|option| option.selected) {
                    out.push(format!("{name}={}", encode_component(&option.value)));
                }
            }
        }
    }
}

/// Owned snapshot of a `<form>` and its controls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchForm {
    node: NodeHandle,
    controls: Vec<FormControl>,
}

impl SearchForm {
    /// Snapshot the form at `node`
    ///
    /// Returns `None` when `node` is not a `<form>` element.
    pub fn from_node<D: QueryDocument + ?Sized>(document: &D, node: &NodeHandle) -> Option<Self> {
        if node.name() != "form" {
            return None;
        }

        let controls = document
            .descendants(node)
            .iter()
            .filter_map(|child| FormControl::from_node(document, child))
            .collect();

        Some(Self {
            node: node.clone(),
            controls,
        })
    }

    /// The form element
    pub fn node(&self) -> &NodeHandle {
        &self.node
    }

    /// Controls in declaration order
    pub fn controls(&self) -> &[FormControl] {
        &self.controls
    }

    /// Submission method from the `method` attribute
    pub fn method(&self) -> Method {
        Method::from_form_attr(self.node.attr("method"))
    }

    /// The `action` attribute, empty when absent
    pub fn action(&self) -> &str {
        self.node.attr("action").unwrap_or_default()
    }

    pub fn set_method(&mut self, method: Method) {
        self.node.set_attr("method", method.as_str());
    }

    pub fn set_action(&mut self, action: &str) {
        self.node.set_attr("action", action);
    }

    /// Set the value of the input or textarea at `position`
    ///
    /// Returns false when no such control is part of the form.
    pub fn set_value(&mut self, position: usize, new_value: &str) -> bool {
        for control in &mut self.controls {
            match control {
                FormControl::Input {
                    position: at,
                    value,
                    ..
                }
                | FormControl::TextArea {
                    position: at,
                    value,
                    ..
                } if *at == position => {
                    *value = new_value.to_string();
                    return true;
                }
                _ => {}
            }
        }
        false
    }

    /// Current value of the input or textarea at `position`
    pub fn value(&self, position: usize) -> Option<&str> {
        self.controls.iter().find_map(|control| match control {
            FormControl::Input {
                position: at,
                value,
                ..
            }
            | FormControl::TextArea {
                position: at,
                value,
                ..
            } if *at == position => Some(value.as_str()),
            _ => None,
        })
    }

    /// Encode the form for submission
    ///
    /// Controls are visited last to first and unnamed controls are skipped.
    /// Checkboxes and radios count only when checked, file inputs never,
    /// every other input and textarea always. A single select contributes its
    /// selected option, a multiple select each selected option, last first.
    /// Values are percent-encoded like `encodeURIComponent`; names are not.
    pub fn serialize(&self) -> String {
        let mut entries = Vec::new();
        for control in self.controls.iter().rev() {
            if control.name().is_empty() {
                continue;
            }
            control.entries(&mut entries);
        }
        entries.join("&")
    }
}

/// Serialize the form at `node`
///
/// Returns `None` when there is no node or the node is not a `<form>`.
pub fn serialize<D: QueryDocument + ?Sized>(
    document: &D,
    node: Option<&NodeHandle>,
) -> Option<String> {
    node.and_then(|node| SearchForm::from_node(document, node))
        .map(|form| form.serialize())
}
