//! HTML5 Parser implementation
//!
//! Uses html5ever's RcDom and converts the result into our arena DOM.
//! Fragments are parsed with the receiving element as context, the same
//! way `innerHTML` assignment works.

use glance_dom::{Document, DomTree, NodeId};
use html5ever::tendril::TendrilSink;
use html5ever::{LocalName, ParseOpts, QualName, ns, parse_document, parse_fragment};
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

use crate::ParseError;

/// HTML5 parser
pub struct HtmlParser;

impl HtmlParser {
    /// Create a new HTML parser
    pub fn new() -> Self {
        Self
    }

    /// Parse a whole page into a Document
    pub fn parse_document(&self, html: &str, url: &str) -> Document {
        tracing::debug!("Parsing HTML document: {}", url);

        let dom = Self::parse_rc(html);
        let mut document = Document::new(url);

        if let Some(html_elem) = find_child_element(&dom.document, "html") {
            let targets = [
                ("head", document.head()),
                ("body", document.body()),
                ("html", document.document_element()),
            ];
            for (tag, target) in targets {
                let source = if tag == "html" {
                    Some(html_elem.clone())
                } else {
                    find_child_element(&html_elem, tag)
                };
                let Some(source) = source else {
                    continue;
                };
                copy_attributes(&source, document.tree_mut(), target);
                if tag != "html" {
                    for child in source.children.borrow().iter() {
                        // Conversion only fails on stale ids, and `target` is fresh
                        let _ = self.convert_node(child, document.tree_mut(), target);
                    }
                }
            }
        }

        tracing::debug!("Parsed {} nodes", document.tree().len());
        document
    }

    /// Parse a fragment as the content of a `context` element and append
    /// the resulting nodes under `parent`
    ///
    /// The context decides the insertion mode: `<td>` cells survive inside a
    /// `tr` context, and leading `<style>` or `<script>` stay in place instead
    /// of being hoisted into a document head.
    pub fn parse_fragment_into(
        &self,
        tree: &mut DomTree,
        parent: NodeId,
        context: &str,
        html: &str,
    ) -> Result<Vec<NodeId>, ParseError> {
        let context_name = QualName::new(None, ns!(html), LocalName::from(context));
        let dom = parse_fragment(RcDom::default(), ParseOpts::default(), context_name, Vec::new(), true).one(html);

        // The fragment's nodes hang off a synthetic <html> root
        let Some(root) = dom.document.children.borrow().first().cloned() else {
            return Ok(Vec::new());
        };

        let mut created = Vec::new();
        for child in root.children.borrow().iter() {
            if let Some(id) = self.convert_node(child, tree, parent)? {
                created.push(id);
            }
        }
        Ok(created)
    }

    /// Parse `html` and swap it in as the only content of `node`
    pub fn replace_children(&self, doc: &mut Document, node: NodeId, html: &str) -> Result<(), ParseError> {
        let tree = doc.tree_mut();
        let Some(context) = tree.element(node).map(|e| e.tag.clone()) else {
            return Err(ParseError::NotAnElement(node));
        };

        // Build detached first so a failure leaves the old content intact
        let staging = tree.create_element("template");
        let created = match self.parse_fragment_into(tree, staging, &context, html) {
            Ok(created) => created,
            Err(err) => {
                let _ = tree.remove(staging);
                return Err(err);
            }
        };

        tree.remove_children(node)?;
        for child in created {
            tree.append_child(node, child)?;
        }
        tree.remove(staging)?;
        Ok(())
    }

    fn parse_rc(html: &str) -> RcDom {
        parse_document(RcDom::default(), ParseOpts::default()).one(html)
    }

    /// Convert an RcDom node (and its subtree) and append it to `parent`
    fn convert_node(&self, handle: &Handle, tree: &mut DomTree, parent: NodeId) -> Result<Option<NodeId>, ParseError> {
        let id = match &handle.data {
            RcNodeData::Document => {
                for child in handle.children.borrow().iter() {
                    self.convert_node(child, tree, parent)?;
                }
                return Ok(None);
            }
            RcNodeData::Text { contents } => {
                let text = contents.borrow();
                tree.create_text(&text)
            }
            RcNodeData::Comment { contents } => tree.create_comment(contents),
            RcNodeData::Element { name, .. } => {
                let id = tree.create_element(&name.local);
                copy_attributes(handle, tree, id);
                for child in handle.children.borrow().iter() {
                    self.convert_node(child, tree, id)?;
                }
                id
            }
            // Doctypes and processing instructions carry nothing a refresh needs
            RcNodeData::Doctype { .. } | RcNodeData::ProcessingInstruction { .. } => return Ok(None),
        };
        tree.append_child(parent, id)?;
        Ok(Some(id))
    }
}

impl Default for HtmlParser {
    fn default() -> Self {
        Self::new()
    }
}

fn find_child_element(handle: &Handle, tag: &str) -> Option<Handle> {
    handle
        .children
        .borrow()
        .iter()
        .find(|child| matches!(&child.data, RcNodeData::Element { name, .. } if &*name.local == tag))
        .cloned()
}

fn copy_attributes(handle: &Handle, tree: &mut DomTree, target: NodeId) {
    if let RcNodeData::Element { attrs, .. } = &handle.data {
        for attr in attrs.borrow().iter() {
            // `target` is always a freshly created element here
            let _ = tree.set_attribute(target, &attr.name.local, &attr.value);
        }
    }
}
