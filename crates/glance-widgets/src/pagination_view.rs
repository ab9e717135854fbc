//! Pagination view
//!
//! Turns a `Pagination` into a summary line and a window of page links,
//! and renders both into a container element.

use glance_dom::{Document, NodeId};
use glance_refresh::Pagination;

use crate::WidgetError;

/// One slot of the page strip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLink {
    Page { number: u64, current: bool },
    Gap,
}

/// Pagination renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationView {
    /// Pages shown on each side of the current one
    window: u64,
}

impl Default for PaginationView {
    fn default() -> Self {
        Self { window: 2 }
    }
}

impl PaginationView {
    pub fn new(window: u64) -> Self {
        Self { window }
    }

    /// "Showing 11-20 of 35"
    pub fn summary(&self, pagination: &Pagination) -> String {
        match pagination.visible_range() {
            Some((first, last)) => format!("Showing {first}-{last} of {}", pagination.count),
            None => "No items".to_string(),
        }
    }

    /// First page, last page and a window around the current page, with
    /// gaps where pages are skipped
    pub fn links(&self, pagination: &Pagination) -> Vec<PageLink> {
        let current = pagination.current_page();
        let total = pagination.total_pages();
        let low = current.saturating_sub(self.window).max(1);
        let high = current.saturating_add(self.window).min(total);

        let page = |number: u64| PageLink::Page {
            number,
            current: number == current,
        };

        let mut links = Vec::new();
        if low > 1 {
            links.push(page(1));
        }
        if low > 2 {
            links.push(PageLink::Gap);
        }
        links.extend((low..=high).map(page));
        if high.saturating_add(1) < total {
            links.push(PageLink::Gap);
        }
        if high < total {
            links.push(page(total));
        }
        links
    }

    /// Replace the container's children with the summary and page links
    pub fn render(&self, doc: &mut Document, container: NodeId, pagination: &Pagination) -> Result<(), WidgetError> {
        let links = self.links(pagination);
        let summary = self.summary(pagination);
        let tree = doc.tree_mut();
        if tree.element(container).is_none() {
            return Err(WidgetError::MissingElement(format!("{container:?}")));
        }
        tree.remove_children(container)?;

        let span = tree.create_element("span");
        tree.set_attribute(span, "class", "summary")?;
        let text = tree.create_text(&summary);
        tree.append_child(span, text)?;
        tree.append_child(container, span)?;

        for link in links {
            let node = match link {
                PageLink::Page { number, current } => {
                    let a = tree.create_element("a");
                    let class = if current { "page current" } else { "page" };
                    tree.set_attribute(a, "class", class)?;
                    tree.set_attribute(a, "data-page", &number.to_string())?;
                    let label = tree.create_text(&number.to_string());
                    tree.append_child(a, label)?;
                    a
                }
                PageLink::Gap => {
                    let gap = tree.create_element("span");
                    tree.set_attribute(gap, "class", "gap")?;
                    let dots = tree.create_text("\u{2026}");
                    tree.append_child(gap, dots)?;
                    gap
                }
            };
            tree.append_child(container, node)?;
        }
        Ok(())
    }
}
