// SPDX-License-Identifier: MPL-2.0
//! Markup serialization.

use super::{Document, NodeId, NodeKind};

/// Elements written without a closing tag.
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "link", "meta"];

impl Document {
    /// Serializes a node and its subtree. The document node serializes with a
    /// leading doctype.
    #[must_use]
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    /// Serializes the children of a node.
    #[must_use]
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            self.write_node(*child, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            Some(NodeKind::Document) => {
                out.push_str("<!DOCTYPE html>");
                for child in self.children(id) {
                    self.write_node(*child, out);
                }
            }
            Some(NodeKind::Element(element)) => {
                out.push('<');
                out.push_str(element.tag());
                for (name, value) in element.attributes() {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_into(value, true, out);
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&element.tag()) {
                    return;
                }
                for child in self.children(id) {
                    self.write_node(*child, out);
                }
                out.push_str("</");
                out.push_str(element.tag());
                out.push('>');
            }
            Some(NodeKind::Text(text)) => escape_into(text, false, out),
            None => {}
        }
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_attributes_and_text() {
        let mut doc = Document::new();
        let button = doc.create_element("button");
        doc.set_attribute(button, "title", "Say \"hi\"");
        doc.set_text_content(button, "<Save> & exit");

        assert_eq!(
            doc.outer_html(button),
            "<button title=\"Say &quot;hi&quot;\">&lt;Save&gt; &amp; exit</button>"
        );
    }

    #[test]
    fn void_elements_have_no_closing_tag() {
        let mut doc = Document::new();
        let label = doc.create_element("label");
        let input = doc.create_element("input");
        doc.set_attribute(input, "placeholder", "Filter");
        doc.append_child(label, input).unwrap();

        assert_eq!(doc.inner_html(label), "<input placeholder=\"Filter\">");
    }

    #[test]
    fn document_serializes_with_doctype() {
        let doc = Document::new();
        assert_eq!(
            doc.outer_html(doc.root()),
            "<!DOCTYPE html><html><head><title></title></head><body></body></html>"
        );
    }
}
