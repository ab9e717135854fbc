//! innerHTML / outerHTML serialization
//!
//! Output is canonical: attributes in source order, void elements without
//! end tags, text escaped. Serializing a freshly parsed fragment therefore
//! gives the same string every time, which keeps repeated patches idempotent.

use glance_dom::{DomTree, ElementData, NodeData, NodeId};

fn is_void(tag: &str) -> bool {
    matches!(
        tag,
        "area" | "base" | "br" | "col" | "embed" | "hr" | "img" | "input" | "link" | "meta" | "param"
            | "source" | "track" | "wbr"
    )
}

/// Contents are written back verbatim
fn is_raw_text(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

/// HTML serializer
#[derive(Debug, Default)]
pub struct HtmlSerializer;

impl HtmlSerializer {
    pub fn new() -> Self {
        Self
    }

    /// Markup of the children of `node_id`
    pub fn serialize_inner(&self, tree: &DomTree, node_id: NodeId) -> String {
        let mut writer = Writer::new(tree);
        writer.children(node_id);
        writer.out
    }

    /// Markup of `node_id` itself and its subtree
    pub fn serialize_outer(&self, tree: &DomTree, node_id: NodeId) -> String {
        let mut writer = Writer::new(tree);
        writer.node(node_id);
        writer.out
    }
}

struct Writer<'a> {
    tree: &'a DomTree,
    out: String,
}

impl<'a> Writer<'a> {
    fn new(tree: &'a DomTree) -> Self {
        Self { tree, out: String::new() }
    }

    fn node(&mut self, id: NodeId) {
        let tree = self.tree;
        let Some(node) = tree.get(id) else {
            return;
        };
        match &node.data {
            NodeData::Document => self.children(id),
            NodeData::Element(elem) => self.element(id, elem),
            NodeData::Text(text) => push_escaped(&mut self.out, text, false),
            NodeData::Comment(text) => {
                self.out.push_str("<!--");
                self.out.push_str(text);
                self.out.push_str("-->");
            }
        }
    }

    fn children(&mut self, parent: NodeId) {
        let tree = self.tree;
        for (child, _) in tree.children(parent) {
            self.node(child);
        }
    }

    fn element(&mut self, id: NodeId, elem: &ElementData) {
        let tag = elem.tag.as_str();
        self.out.push('<');
        self.out.push_str(tag);
        for attr in elem.attrs().iter() {
            self.out.push(' ');
            self.out.push_str(&attr.name);
            if attr.value.is_empty() {
                continue;
            }
            self.out.push_str("=\"");
            push_escaped(&mut self.out, &attr.value, true);
            self.out.push('"');
        }
        self.out.push('>');

        if is_void(tag) {
            return;
        }
        if is_raw_text(tag) {
            let raw: String = self.tree.children(id).filter_map(|(_, n)| n.as_text()).collect();
            self.out.push_str(&raw);
        } else {
            self.children(id);
        }
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push('>');
    }
}

/// Escape `&`, nbsp and either `"` (attributes) or `<`/`>` (text)
fn push_escaped(out: &mut String, text: &str, in_attribute: bool) {
    for c in text.chars() {
        let entity = match c {
            '&' => "&amp;",
            '\u{a0}' => "&nbsp;",
            '"' if in_attribute => "&quot;",
            '<' if !in_attribute => "&lt;",
            '>' if !in_attribute => "&gt;",
            _ => {
                out.push(c);
                continue;
            }
        };
        out.push_str(entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escaped(text: &str, in_attribute: bool) -> String {
        let mut out = String::new();
        push_escaped(&mut out, text, in_attribute);
        out
    }

    #[test]
    fn test_text_escaping() {
        assert_eq!(escaped("a < b && \"c\"", false), "a &lt; b &amp;&amp; \"c\"");
        assert_eq!(escaped("x\u{a0}y", false), "x&nbsp;y");
    }

    #[test]
    fn test_attribute_escaping() {
        assert_eq!(escaped("say \"hi\" <now>", true), "say &quot;hi&quot; <now>");
    }

    #[test]
    fn test_void_elements_and_empty_attributes() {
        let mut tree = DomTree::new();
        let label = tree.create_element("label");
        let checkbox = tree.create_element("input");
        tree.append_child(label, checkbox).unwrap();
        tree.set_attribute(checkbox, "type", "checkbox").unwrap();
        tree.set_attribute(checkbox, "checked", "").unwrap();

        let html = HtmlSerializer::new().serialize_outer(&tree, label);
        assert_eq!(html, "<label><input type=\"checkbox\" checked></label>");
    }

    #[test]
    fn test_style_content_is_raw() {
        let mut tree = DomTree::new();
        let style = tree.create_element("style");
        let css = tree.create_text("a > b { color: red }");
        tree.append_child(style, css).unwrap();

        assert_eq!(HtmlSerializer::new().serialize_inner(&tree, style), "a > b { color: red }");
    }

    #[test]
    fn test_comments_pass_through() {
        let mut tree = DomTree::new();
        let div = tree.create_element("div");
        let note = tree.create_comment(" build 42 ");
        tree.append_child(div, note).unwrap();
        assert_eq!(HtmlSerializer::new().serialize_outer(&tree, div), "<div><!-- build 42 --></div>");
    }
}
