//! Glance HTML
//!
//! HTML5 parsing (built on html5ever) into `glance-dom` trees, and the
//! matching serializer. Together they give the DOM its `innerHTML`.

mod parser;
mod serializer;

pub use parser::HtmlParser;
pub use serializer::HtmlSerializer;

use glance_dom::{Document, DomError, NodeId};

/// Parse a full HTML page into a Document
pub fn parse(html: &str, url: &str) -> Document {
    HtmlParser::new().parse_document(html, url)
}

/// Serialize the children of a node
pub fn get_inner_html(doc: &Document, node: NodeId) -> String {
    HtmlSerializer::new().serialize_inner(doc.tree(), node)
}

/// Serialize a node including itself
pub fn get_outer_html(doc: &Document, node: NodeId) -> String {
    HtmlSerializer::new().serialize_outer(doc.tree(), node)
}

/// Replace the children of `node` with the parsed fragment
///
/// The old children are freed, so any `NodeId` pointing into them goes stale.
pub fn set_inner_html(doc: &mut Document, node: NodeId, html: &str) -> Result<(), ParseError> {
    HtmlParser::new().replace_children(doc, node, html)
}

/// Parse error
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Fragment target is not an element: {0:?}")]
    NotAnElement(NodeId),

    #[error("DOM error while building fragment: {0}")]
    Dom(#[from] DomError),
}
