//! DOM Tree (arena-based allocation)
//!
//! Slots are recycled through a free list. Every recycle bumps the slot's
//! generation, so a `NodeId` issued before a subtree was removed no longer
//! resolves afterwards.

use std::collections::HashMap;

use crate::{DomError, DomResult, ElementData, Generation, Node, NodeData, NodeId};

#[derive(Debug)]
struct Slot {
    generation: Generation,
    node: Option<Node>,
}

/// Arena-based DOM tree
#[derive(Debug)]
pub struct DomTree {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    /// id attribute -> element, validated on lookup
    /// Every element carrying each `id` value, attached or not
    ids: HashMap<String, Vec<NodeId>>,
    live: usize,
}

impl DomTree {
    /// Create a tree holding only the document node
    pub fn new() -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            ids: HashMap::new(),
            live: 0,
        };
        tree.alloc(Node::document());
        tree
    }

    /// Document node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.live += 1;
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId { index, generation: slot.generation };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: Generation::INITIAL,
            node: Some(node),
        });
        NodeId { index, generation: Generation::INITIAL }
    }

    fn free(&mut self, id: NodeId) -> Option<Node> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let node = slot.node.take()?;
        slot.generation = slot.generation.next();
        self.free_list.push(id.index);
        self.live -= 1;
        Some(node)
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    /// Check whether an id still resolves
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Element data of a node
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id)?.as_element()
    }

    /// Mutable element data of a node
    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id)?.as_element_mut()
    }

    /// Number of live nodes (including the document node)
    pub fn len(&self) -> usize {
        self.live
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(Node::element(ElementData::new(tag)))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.alloc(Node::text(content))
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, content: &str) -> NodeId {
        self.alloc(Node::comment(content))
    }

    /// Get an attribute of an element
    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.get_attr(name)
    }

    /// Set an attribute, maintaining the id index
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<()> {
        let node = self.get_mut(id).ok_or(DomError::NotFound)?;
        let elem = node.as_element_mut().ok_or(DomError::InvalidNodeType)?;
        let previous = elem.set_attr(name, value);

        if name == "id" {
            if let Some(old) = previous {
                self.unindex(&old, id);
            }
            if !value.is_empty() {
                let holders = self.ids.entry(value.to_string()).or_default();
                if !holders.contains(&id) {
                    holders.push(id);
                }
            }
        }
        Ok(())
    }

    /// Remove an attribute
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> DomResult<Option<String>> {
        let node = self.get_mut(id).ok_or(DomError::NotFound)?;
        let elem = node.as_element_mut().ok_or(DomError::InvalidNodeType)?;
        let previous = elem.remove_attr(name);

        if name == "id" {
            if let Some(old) = &previous {
                self.unindex(old, id);
            }
        }
        Ok(previous)
    }

    fn unindex(&mut self, key: &str, id: NodeId) {
        if let Some(holders) = self.ids.get_mut(key) {
            holders.retain(|&h| h != id);
            if holders.is_empty() {
                self.ids.remove(key);
            }
        }
    }

    /// Append a child node (detaching it from any previous parent)
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference` (or at the end when `None`)
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> DomResult<()> {
        let parent_node = self.get(parent).ok_or(DomError::NotFound)?;
        if matches!(parent_node.data, NodeData::Text(_) | NodeData::Comment(_)) {
            return Err(DomError::InvalidNodeType);
        }
        if !self.contains(child) {
            return Err(DomError::NotFound);
        }
        if child == parent || self.is_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest);
        }
        if let Some(reference) = reference {
            let ref_parent = self.get(reference).ok_or(DomError::NotFound)?.parent;
            if ref_parent != parent {
                return Err(DomError::NotAChild);
            }
            if reference == child {
                return Ok(());
            }
        }

        self.unlink(child);

        match reference {
            None => {
                let last = self.get(parent).map(|n| n.last_child).unwrap_or(NodeId::NONE);
                self.with_node(child, |n| {
                    n.parent = parent;
                    n.prev_sibling = last;
                    n.next_sibling = NodeId::NONE;
                });
                if last.is_valid() {
                    self.with_node(last, |n| n.next_sibling = child);
                } else {
                    self.with_node(parent, |n| n.first_child = child);
                }
                self.with_node(parent, |n| n.last_child = child);
            }
            Some(reference) => {
                let prev = self.get(reference).map(|n| n.prev_sibling).unwrap_or(NodeId::NONE);
                self.with_node(child, |n| {
                    n.parent = parent;
                    n.prev_sibling = prev;
                    n.next_sibling = reference;
                });
                self.with_node(reference, |n| n.prev_sibling = child);
                if prev.is_valid() {
                    self.with_node(prev, |n| n.next_sibling = child);
                } else {
                    self.with_node(parent, |n| n.first_child = child);
                }
            }
        }
        Ok(())
    }

    /// Detach a node from its parent, keeping the subtree alive
    pub fn detach(&mut self, id: NodeId) -> DomResult<()> {
        if !self.contains(id) {
            return Err(DomError::NotFound);
        }
        self.unlink(id);
        Ok(())
    }

    /// Detach a node and free it together with its whole subtree
    pub fn remove(&mut self, id: NodeId) -> DomResult<()> {
        if id == NodeId::ROOT {
            return Err(DomError::HierarchyRequest);
        }
        if !self.contains(id) {
            return Err(DomError::NotFound);
        }
        self.unlink(id);

        let mut doomed: Vec<NodeId> = self.descendants(id).map(|(d, _)| d).collect();
        doomed.push(id);
        tracing::trace!("Freeing {} nodes under {:?}", doomed.len(), id);
        for node_id in doomed {
            if let Some(node) = self.free(node_id) {
                if let Some(key) = node.as_element().and_then(|e| e.id()) {
                    self.unindex(key, node_id);
                }
            }
        }
        Ok(())
    }

    /// Free every child of `parent`; returns how many were removed
    pub fn remove_children(&mut self, parent: NodeId) -> DomResult<usize> {
        if !self.contains(parent) {
            return Err(DomError::NotFound);
        }
        let children: Vec<NodeId> = self.children(parent).map(|(c, _)| c).collect();
        for &child in &children {
            self.remove(child)?;
        }
        Ok(children.len())
    }

    fn unlink(&mut self, id: NodeId) {
        let Some(node) = self.get(id) else {
            return;
        };
        let (parent, prev, next) = (node.parent, node.prev_sibling, node.next_sibling);

        if prev.is_valid() {
            self.with_node(prev, |n| n.next_sibling = next);
        } else if parent.is_valid() {
            self.with_node(parent, |n| n.first_child = next);
        }
        if next.is_valid() {
            self.with_node(next, |n| n.prev_sibling = prev);
        } else if parent.is_valid() {
            self.with_node(parent, |n| n.last_child = prev);
        }
        self.with_node(id, |n| {
            n.parent = NodeId::NONE;
            n.prev_sibling = NodeId::NONE;
            n.next_sibling = NodeId::NONE;
        });
    }

    fn with_node(&mut self, id: NodeId, f: impl FnOnce(&mut Node)) {
        if let Some(node) = self.get_mut(id) {
            f(node);
        }
    }

    /// True if `ancestor` is a proper ancestor of `node`
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.get(node).map(|n| n.parent).unwrap_or(NodeId::NONE);
        while current.is_valid() {
            if current == ancestor {
                return true;
            }
            current = self.get(current).map(|n| n.parent).unwrap_or(NodeId::NONE);
        }
        false
    }

    /// True if the node hangs off the document node
    pub fn is_connected(&self, id: NodeId) -> bool {
        id == NodeId::ROOT || (self.contains(id) && self.is_ancestor(NodeId::ROOT, id))
    }

    /// Iterate over direct children
    pub fn children(&self, id: NodeId) -> Children<'_> {
        let next = self.get(id).map(|n| n.first_child).unwrap_or(NodeId::NONE);
        Children { tree: self, next }
    }

    /// Direct element children, in order
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .filter(|(_, node)| node.is_element())
            .map(|(child, _)| child)
    }

    /// Pre-order iteration over all descendants (excluding `id` itself)
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let next = self.get(id).map(|n| n.first_child).unwrap_or(NodeId::NONE);
        Descendants { tree: self, root: id, next }
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.get(id).and_then(|n| n.as_text()) {
            return text.to_string();
        }
        let mut out = String::new();
        for (_, node) in self.descendants(id) {
            if let Some(text) = node.as_text() {
                out.push_str(text);
            }
        }
        out
    }

    /// Connected element carrying the given `id` attribute
    ///
    /// Answered from the index; only a duplicated id attached more than
    /// once needs a walk to find the first one in document order.
    pub fn find_by_id(&self, key: &str) -> Option<NodeId> {
        let holders = self.ids.get(key)?;
        let mut connected = holders.iter().copied().filter(|&h| self.is_connected(h));
        let first = connected.next()?;
        if connected.next().is_none() {
            return Some(first);
        }
        self.descendants(NodeId::ROOT)
            .find(|(_, node)| node.as_element().and_then(|e| e.id()) == Some(key))
            .map(|(found, _)| found)
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over direct children
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl<'a> Iterator for Children<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next;
        let node = self.tree.get(current)?;
        self.next = node.next_sibling;
        Some((current, node))
    }
}

/// Pre-order iterator over a subtree
pub struct Descendants<'a> {
    tree: &'a DomTree,
    root: NodeId,
    next: NodeId,
}

impl<'a> Descendants<'a> {
    fn following(&self, current: NodeId, node: &Node) -> NodeId {
        if node.first_child.is_valid() {
            return node.first_child;
        }
        let mut cursor = current;
        while cursor != self.root {
            let Some(n) = self.tree.get(cursor) else {
                return NodeId::NONE;
            };
            if n.next_sibling.is_valid() {
                return n.next_sibling;
            }
            cursor = n.parent;
            if !cursor.is_valid() {
                return NodeId::NONE;
            }
        }
        NodeId::NONE
    }
}

impl<'a> Iterator for Descendants<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next;
        let node = self.tree.get(current)?;
        self.next = self.following(current, node);
        Some((current, node))
    }
}
