//! Virtual trees and the selector builder.

use crate::html;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A virtual node: the immutable description of desired output.
///
/// Trees have no identity beyond structural equality.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VNode {
    /// An element with attributes and children
    Element(VElement),
    /// A text node
    Text(String),
}

/// A virtual element.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VElement {
    /// Element name, e.g. `"li"`
    pub tag: String,
    /// Attributes, kept sorted so serialization is deterministic
    pub attrs: BTreeMap<String, String>,
    /// Child nodes in document order
    pub children: Vec<VNode>,
}

/// Start building an element from a CSS-like selector.
///
/// `"ul#todo-list.main"` gives `<ul id="todo-list" class="main">`. An empty tag
/// name defaults to `div`.
///
/// # Examples
///
/// ```
/// use fabulous_vdom::h;
///
/// let node = h("li.completed")
///     .attr("data-id", "7")
///     .child(h("label").text("Buy milk"))
///     .into_node();
///
/// assert_eq!(
///     node.to_html(),
///     r#"<li class="completed" data-id="7"><label>Buy milk</label></li>"#
/// );
/// ```
#[must_use]
pub fn h(selector: &str) -> VElement {
    let split = selector.find(['#', '.']).unwrap_or(selector.len());
    let (tag, mut rest) = selector.split_at(split);
    let mut element = VElement::new(if tag.is_empty() { "div" } else { tag });

    while let Some(marker) = rest.chars().next() {
        let body = &rest[1..];
        let end = body.find(['#', '.']).unwrap_or(body.len());
        let name = &body[..end];
        if !name.is_empty() {
            element = match marker {
                '#' => element.attr("id", name),
                _ => element.class(name),
            };
        }
        rest = &body[end..];
    }

    element
}

impl VElement {
    /// Create an element with no attributes or children.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Set an attribute.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Add a class, keeping any already present.
    #[must_use]
    pub fn class(mut self, class: &str) -> Self {
        if class.is_empty() {
            return self;
        }
        self.attrs
            .entry("class".to_string())
            .and_modify(|existing| {
                if !existing.split(' ').any(|c| c == class) {
                    existing.push(' ');
                    existing.push_str(class);
                }
            })
            .or_insert_with(|| class.to_string());
        self
    }

    /// Set or clear a boolean attribute such as `checked`.
    #[must_use]
    pub fn prop_bool(mut self, name: impl Into<String>, on: bool) -> Self {
        let name = name.into();
        if on {
            self.attrs.insert(name, String::new());
        } else {
            self.attrs.remove(&name);
        }
        self
    }

    /// Append a child.
    #[must_use]
    pub fn child(mut self, child: impl Into<VNode>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append several children.
    #[must_use]
    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<VNode>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Append a text child.
    #[must_use]
    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(VNode::Text(text.into()))
    }

    /// Finish building.
    #[must_use]
    pub fn into_node(self) -> VNode {
        VNode::Element(self)
    }
}

impl VNode {
    /// A text node.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// The element, if this is one.
    #[must_use]
    pub const fn as_element(&self) -> Option<&VElement> {
        match self {
            Self::Element(element) => Some(element),
            Self::Text(_) => None,
        }
    }

    /// Serialize to HTML.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Self::Text(text) => html::text(out, text),
            Self::Element(element) => {
                html::open_tag(out, &element.tag, &element.attrs);
                for child in &element.children {
                    child.write_html(out);
                }
                html::close_tag(out, &element.tag);
            }
        }
    }

    /// Total number of nodes in this tree.
    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            Self::Text(_) => 1,
            Self::Element(element) => 1 + element.children.iter().map(Self::size).sum::<usize>(),
        }
    }
}

impl From<VElement> for VNode {
    fn from(element: VElement) -> Self {
        Self::Element(element)
    }
}

impl From<String> for VNode {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for VNode {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}
