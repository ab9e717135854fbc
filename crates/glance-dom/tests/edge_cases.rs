//! Edge case tests for glance-dom
//!
//! Tree surgery, the id index and form state on an arena document.

use glance_dom::*;

fn doc_with_list() -> (Document, NodeId) {
    let mut doc = Document::default();
    let body = doc.body();
    let list = doc.append_element(body, "ul", Some("jobs")).unwrap();
    for id in ["a", "b", "c"] {
        doc.append_element(list, "li", Some(id)).unwrap();
    }
    (doc, list)
}

fn child_ids(doc: &Document, parent: NodeId) -> Vec<String> {
    doc.tree()
        .element_children(parent)
        .filter_map(|c| doc.tree().element(c).and_then(|e| e.id()).map(str::to_string))
        .collect()
}

// ============================================================================
// TREE SURGERY
// ============================================================================

#[test]
fn test_insert_before_reorders() {
    let (mut doc, list) = doc_with_list();
    let c = doc.get_element_by_id("c").unwrap();
    let a = doc.get_element_by_id("a").unwrap();
    doc.tree_mut().insert_before(list, c, Some(a)).unwrap();
    assert_eq!(child_ids(&doc, list), vec!["c", "a", "b"]);
}

#[test]
fn test_insert_into_own_subtree_rejected() {
    let (mut doc, list) = doc_with_list();
    let a = doc.get_element_by_id("a").unwrap();
    assert_eq!(doc.tree_mut().append_child(a, list), Err(DomError::HierarchyRequest));
}

#[test]
fn test_reference_must_be_child() {
    let (mut doc, list) = doc_with_list();
    let body = doc.body();
    let a = doc.get_element_by_id("a").unwrap();
    let stray = doc.tree_mut().create_element("li");
    assert_eq!(
        doc.tree_mut().insert_before(body, stray, Some(a)),
        Err(DomError::NotAChild)
    );
    assert_eq!(child_ids(&doc, list).len(), 3);
}

#[test]
fn test_removed_ids_stop_resolving() {
    let (mut doc, list) = doc_with_list();
    let b = doc.get_element_by_id("b").unwrap();
    let live = doc.tree().len();

    doc.tree_mut().remove(list).unwrap();
    assert!(doc.get_element_by_id("b").is_none());
    assert!(!doc.tree().contains(b));
    assert_eq!(doc.tree().len(), live - 4);

    // Recycled slots get a new generation
    let fresh = doc.tree_mut().create_element("p");
    assert_ne!(fresh, b);
    assert!(!doc.tree().contains(b));
}

#[test]
fn test_detached_element_not_found_by_id() {
    let (mut doc, _) = doc_with_list();
    let a = doc.get_element_by_id("a").unwrap();
    doc.tree_mut().detach(a).unwrap();
    assert!(doc.get_element_by_id("a").is_none());
    assert!(doc.tree().contains(a));
}

#[test]
fn test_id_change_updates_index() {
    let (mut doc, _) = doc_with_list();
    let a = doc.get_element_by_id("a").unwrap();
    doc.tree_mut().set_attribute(a, "id", "renamed").unwrap();
    assert!(doc.get_element_by_id("a").is_none());
    assert_eq!(doc.get_element_by_id("renamed"), Some(a));
}

// ============================================================================
// QUERIES AND FORMS
// ============================================================================

#[test]
fn test_closest_form_scopes_radio_groups() {
    let mut doc = Document::default();
    let body = doc.body();
    let mut radios = Vec::new();
    for form_id in ["f1", "f2"] {
        let form = doc.append_element(body, "form", Some(form_id)).unwrap();
        let radio = doc.append_element(form, "input", None).unwrap();
        doc.tree_mut().set_attribute(radio, "type", "radio").unwrap();
        doc.tree_mut().set_attribute(radio, "name", "scope").unwrap();
        radios.push(radio);
    }

    doc.tree_mut().set_checked(radios[0], true).unwrap();
    doc.tree_mut().set_checked(radios[1], true).unwrap();
    assert!(doc.tree().is_checked(radios[0]));
    assert!(doc.tree().is_checked(radios[1]));
}

#[test]
fn test_query_selectors() {
    let (mut doc, list) = doc_with_list();
    let b = doc.get_element_by_id("b").unwrap();
    doc.tree_mut().set_attribute(b, "class", "failed flaky").unwrap();
    doc.tree_mut().set_attribute(b, "data-stage", "test").unwrap();

    let tree = doc.tree();
    assert_eq!(tree.query_all(list, &Selector::tag("li")).len(), 3);
    assert_eq!(tree.query_first(list, &Selector::class("flaky")), Some(b));
    assert_eq!(tree.query_first(doc.body(), &Selector::HasAttr("data-stage".into())), Some(b));
    assert_eq!(tree.closest(b, &Selector::id("jobs")), Some(list));
}

#[test]
fn test_value_on_non_control_rejected() {
    let (mut doc, list) = doc_with_list();
    assert_eq!(
        doc.tree_mut().set_control_value(list, "x"),
        Err(DomError::InvalidNodeType)
    );
}
