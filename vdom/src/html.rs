//! HTML serialization shared by virtual and live trees.

use std::collections::BTreeMap;

/// Attributes written bare when set to the empty string
const BOOLEAN_ATTRIBUTES: &[&str] = &[
    "autofocus", "checked", "disabled", "hidden", "multiple", "readonly", "required", "selected",
];

pub(crate) fn open_tag(out: &mut String, tag: &str, attrs: &BTreeMap<String, String>) {
    out.push('<');
    out.push_str(tag);
    for (name, value) in attrs {
        out.push(' ');
        out.push_str(name);
        if value.is_empty() && BOOLEAN_ATTRIBUTES.contains(&name.as_str()) {
            continue;
        }
        out.push_str("=\"");
        out.push_str(&escape(value));
        out.push('"');
    }
    out.push('>');
}

/// Elements serialized without a closing tag
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "link", "meta"];

pub(crate) fn close_tag(out: &mut String, tag: &str) {
    if VOID_ELEMENTS.contains(&tag) {
        return;
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

pub(crate) fn text(out: &mut String, text: &str) {
    out.push_str(&escape(text));
}

fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
