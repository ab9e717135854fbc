//! Integration tests for glance-refresh
//!
//! Whole refresh cycles against parsed pages and a scripted transport.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use glance_dom::{Document, Selector};
use glance_html::{get_inner_html, parse};
use glance_net::{Method, MockTransport, Response};
use glance_refresh::{
    CycleOutcome, PaginationFields, ParamBuilder, PatchApplier, Pagination, RefreshMode, RefreshPayload,
    RefreshTarget, Refresher, RefresherConfig, RefresherRegistry,
};
use smol::{LocalExecutor, Timer};

const PAGE: &str = r#"
<!DOCTYPE html>
<html>
<head><title>Pipelines</title></head>
<body>
  <ul id="tabs"><li id="all" class="current">All</li><li id="mine">Mine</li></ul>
  <div id="pipelines">
    <div id="pipeline_1"><input type="checkbox" id="pin_1"> build</div>
    <div id="pipeline_2"><input type="checkbox" id="pin_2"> deploy</div>
  </div>
  <input type="hidden" id="start" value="10">
  <input type="hidden" id="per_page" value="10">
  <input type="hidden" id="count" value="35">
</body>
</html>
"#;

fn page() -> RefCell<Document> {
    RefCell::new(parse(PAGE, "http://ci.local/go/pipelines"))
}

fn inner(doc: &RefCell<Document>, id: &str) -> Option<String> {
    let doc = doc.borrow();
    doc.get_element_by_id(id).map(|node| get_inner_html(&doc, node))
}

// ============================================================================
// PATCH APPLICATION
// ============================================================================

#[test]
fn test_sync_tracked_set_equals_payload_keys() {
    let doc = page();
    let mut applier = PatchApplier::with_tracked(["pipeline_1", "pipeline_2"]);

    let payloads = [
        r#"{"pipeline_1": {"html": "a"}, "pipeline_3": {"html": "c", "parentId": "pipelines"}}"#,
        r#"{"pipeline_3": {"html": "c2"}, "pipeline_4": {"html": "d", "parentId": "pipelines", "index": 0}}"#,
        r#"{}"#,
    ];
    for json in payloads {
        let payload = RefreshPayload::from_json(json).unwrap();
        applier.apply(&mut doc.borrow_mut(), &payload, RefreshMode::Sync);

        let mut expected: Vec<&str> = payload.ids().collect();
        expected.sort();
        assert_eq!(applier.tracked().collect::<Vec<_>>(), expected);
        for id in payload.ids() {
            assert!(doc.borrow().get_element_by_id(id).is_some());
        }
    }
    assert!(inner(&doc, "pipelines").unwrap().trim().is_empty());
}

#[test]
fn test_apply_is_idempotent() {
    let doc = page();
    let payload = RefreshPayload::new()
        .with(RefreshTarget::new("pipeline_1", "<b>passed</b>"))
        .with(RefreshTarget::new("pipeline_5", "<i>queued</i>").with_parent("pipelines").with_index(1));

    let mut applier = PatchApplier::new();
    applier.apply(&mut doc.borrow_mut(), &payload, RefreshMode::Merge);
    let once = inner(&doc, "pipelines").unwrap();
    let nodes = doc.borrow().tree().len();

    applier.apply(&mut doc.borrow_mut(), &payload, RefreshMode::Merge);
    assert_eq!(inner(&doc, "pipelines").unwrap(), once);
    assert_eq!(doc.borrow().tree().len(), nodes);
}

#[test]
fn test_insertion_order_follows_payload() {
    let doc = page();
    let payload = RefreshPayload::from_json(
        r#"{"p_a": {"html": "a", "parentId": "pipelines", "index": 0},
            "p_b": {"html": "b", "parentId": "pipelines", "index": 0}}"#,
    )
    .unwrap();
    PatchApplier::new().apply(&mut doc.borrow_mut(), &payload, RefreshMode::Merge);

    let d = doc.borrow();
    let pipelines = d.get_element_by_id("pipelines").unwrap();
    let ids: Vec<_> = d
        .tree()
        .element_children(pipelines)
        .filter_map(|c| d.tree().element(c).and_then(|e| e.id()).map(str::to_string))
        .collect();
    assert_eq!(ids, vec!["p_b", "p_a", "pipeline_1", "pipeline_2"]);
}

#[test]
fn test_table_rows_patch_as_rows() {
    let mut doc = Document::default();
    let body = doc.body();
    glance_html::set_inner_html(
        &mut doc,
        body,
        r#"<table><tbody id="rows"><tr id="row_1"><td>running</td></tr></tbody></table>"#,
    )
    .unwrap();

    let payload = RefreshPayload::from_json(
        r#"{"row_1": {"html": "<td>passed</td><td>42</td>"},
            "row_2": {"html": "<td>new</td>", "parentId": "rows", "type": "tr"}}"#,
    )
    .unwrap();
    let report = PatchApplier::new().apply(&mut doc, &payload, RefreshMode::Merge);
    assert_eq!(report.inserted, vec!["row_2"]);

    let rows = doc.get_element_by_id("rows").unwrap();
    assert_eq!(
        get_inner_html(&doc, rows),
        r#"<tr id="row_1"><td>passed</td><td>42</td></tr><tr id="row_2"><td>new</td></tr>"#
    );
}

// ============================================================================
// STATE PRESERVATION
// ============================================================================

#[test]
fn test_checkbox_survives_refresh() {
    let doc = page();
    {
        let mut d = doc.borrow_mut();
        let pin = d.get_element_by_id("pin_1").unwrap();
        d.tree_mut().set_checked(pin, true).unwrap();
    }

    let mock = MockTransport::new();
    mock.push_response(
        200,
        r#"{"pipeline_1": {"html": "<input type=\"checkbox\" id=\"pin_1\"> build #2"}}"#,
    );
    let refresher = Refresher::new(RefresherConfig::new("/refresh"), mock);
    refresher.start();
    let outcome = smol::block_on(refresher.refresh_now(&doc));
    assert!(outcome.is_applied());

    let d = doc.borrow();
    assert!(d.tree().is_checked(d.get_element_by_id("pin_1").unwrap()));
    assert!(!d.tree().is_checked(d.get_element_by_id("pin_2").unwrap()));
    assert!(d.tree().text_content(d.get_element_by_id("pipeline_1").unwrap()).contains("#2"));
}

#[test]
fn test_sticky_class_survives_refresh() {
    let doc = page();
    {
        let mut d = doc.borrow_mut();
        let pipeline = d.get_element_by_id("pipeline_2").unwrap();
        glance_html::set_inner_html(&mut d, pipeline, r#"<div id="stages_2" class="stages">x</div>"#).unwrap();
        let stages = d.get_element_by_id("stages_2").unwrap();
        d.tree_mut()
            .element_mut(stages)
            .unwrap()
            .update_classes(|c| c.add("expanded"));
    }

    let mock = MockTransport::new();
    mock.push_response(200, r#"{"pipeline_2": {"html": "<div id=\"stages_2\" class=\"stages\">y</div>"}}"#);
    let refresher = Refresher::new(RefresherConfig::new("/refresh").sticky_class("expanded"), mock);
    refresher.start();
    smol::block_on(refresher.refresh_now(&doc));

    let d = doc.borrow();
    let stages = d.tree().element(d.get_element_by_id("stages_2").unwrap()).unwrap();
    assert!(stages.has_class("expanded"));
    assert_eq!(d.tree().text_content(d.get_element_by_id("stages_2").unwrap()), "y");
}

// ============================================================================
// PARAMETERS AND PAGINATION
// ============================================================================

#[test]
fn test_pagination_boundaries() {
    assert_eq!(Pagination::new(0, 10, 0).total_pages(), 1);
    assert_eq!(Pagination::new(0, 10, 10).total_pages(), 1);
    assert_eq!(Pagination::new(0, 10, 11).total_pages(), 2);
}

#[test]
fn test_request_carries_page_and_tab() {
    let doc = page();
    let mock = MockTransport::new();
    mock.push_response(200, "{}");
    let params = ParamBuilder::new()
        .pagination(PaginationFields::new("start", "per_page", "count"))
        .current_tab("tab", "tabs", "current");
    let refresher = Refresher::new(RefresherConfig::new("/refresh").params(params), mock);
    refresher.start();
    smol::block_on(refresher.refresh_now(&doc));

    let request = &refresher.transport().requests()[0];
    let pairs = request.query_pairs();
    let get = |key: &str| pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str());
    assert_eq!(get("start"), Some("10"));
    assert_eq!(get("perPage"), Some("10"));
    assert_eq!(get("page"), Some("2"));
    assert_eq!(get("tab"), Some("all"));
}

#[test]
fn test_post_request_reads_params_at_send_time() {
    let doc = page();
    let mock = MockTransport::new();
    mock.set_fallback(200, "{}");
    let params = ParamBuilder::new().current_tab("tab", "tabs", "current");
    let refresher = Refresher::new(
        RefresherConfig::new("/refresh").method(Method::Post).params(params),
        mock,
    );
    refresher.start();
    smol::block_on(refresher.refresh_now(&doc));

    {
        let mut d = doc.borrow_mut();
        let tabs = d.tree().query_all(d.get_element_by_id("tabs").unwrap(), &Selector::tag("li"));
        for tab in tabs {
            let is_mine = d.tree().element(tab).and_then(|e| e.id()) == Some("mine");
            d.tree_mut()
                .element_mut(tab)
                .unwrap()
                .update_classes(|c| c.toggle("current", Some(is_mine)));
        }
    }
    smol::block_on(refresher.refresh_now(&doc));

    let requests = refresher.transport().requests();
    assert_eq!(requests[0].body.as_deref(), Some(&b"tab=all"[..]));
    assert_eq!(requests[1].body.as_deref(), Some(&b"tab=mine"[..]));
}

// ============================================================================
// SCHEDULING AND CANCELLATION
// ============================================================================

#[test]
fn test_cancelled_cycle_mutates_nothing() {
    let doc = page();
    let before = inner(&doc, "pipelines").unwrap();
    let nodes = doc.borrow().tree().len();

    let mock = MockTransport::new();
    let release = mock.push_held();
    let failures = Rc::new(Cell::new(0));
    let counter = failures.clone();
    let config = RefresherConfig::new("/refresh")
        .mode(RefreshMode::Sync)
        .track("pipeline_1")
        .track("pipeline_2")
        .on_failure(move |_| counter.set(counter.get() + 1));
    let refresher = Refresher::new(config, mock);
    refresher.start();

    let ex = LocalExecutor::new();
    let outcome = smol::block_on(ex.run(async {
        let cycle = ex.spawn(refresher.refresh_now(&doc));
        Timer::after(Duration::from_millis(10)).await;
        assert!(refresher.is_in_flight());

        refresher.stop();
        release
            .send(Ok(Response::new(200, r#"{"pipeline_9": {"html": "late"}}"#)))
            .await
            .unwrap();
        cycle.await
    }));

    assert_eq!(outcome, CycleOutcome::Cancelled);
    assert_eq!(inner(&doc, "pipelines").unwrap(), before);
    assert_eq!(doc.borrow().tree().len(), nodes);
    assert_eq!(failures.get(), 0);
}

#[test]
fn test_stale_response_never_overwrites_newer_content() {
    let doc = page();
    let mock = MockTransport::new();
    let first = mock.push_held();
    mock.push_response(200, r#"{"pipeline_1": {"html": "second"}}"#);
    let completed = Rc::new(Cell::new(0));
    let counter = completed.clone();
    let config = RefresherConfig::new("/refresh").on_complete(move |_| counter.set(counter.get() + 1));
    let refresher = Refresher::new(config, mock);
    refresher.start();

    let ex = LocalExecutor::new();
    let (stale, fresh) = smol::block_on(ex.run(async {
        let cycle = ex.spawn(refresher.refresh_now(&doc));
        Timer::after(Duration::from_millis(10)).await;
        assert!(refresher.is_in_flight());

        let fresh = refresher.restart(&doc).await;
        first
            .send(Ok(Response::new(200, r#"{"pipeline_1": {"html": "first"}}"#)))
            .await
            .unwrap();
        (cycle.await, fresh)
    }));

    assert!(fresh.is_applied());
    assert_eq!(stale, CycleOutcome::Cancelled);
    assert_eq!(inner(&doc, "pipeline_1").as_deref(), Some("second"));
    assert_eq!(completed.get(), 1);
    assert_eq!(refresher.transport().request_count(), 2);
}

#[test]
fn test_failures_do_not_stop_the_loop() {
    let doc = page();
    let mock = MockTransport::new();
    mock.push_response(500, "");
    mock.push_response(503, "");
    mock.set_fallback(200, r#"{"pipeline_1": {"html": "recovered"}}"#);
    let refresher = Refresher::new(RefresherConfig::new("/refresh").interval_ms(5), mock);
    refresher.start();

    let ex = LocalExecutor::new();
    smol::block_on(ex.run(async {
        let looping = ex.spawn(refresher.run(&doc));
        while refresher.cycles() < 3 {
            Timer::after(Duration::from_millis(2)).await;
        }
        refresher.close();
        looping.await;
    }));

    assert_eq!(inner(&doc, "pipeline_1").as_deref(), Some("recovered"));
}

#[test]
fn test_end_to_end_restart_with_zero_interval() {
    let mut doc = Document::default();
    let body = doc.body();
    doc.append_element(body, "div", Some("panelA")).unwrap();
    let doc = RefCell::new(doc);

    let mock = MockTransport::new();
    mock.push_response(200, r#"{"panelA": {"html": "<b>x</b>"}}"#);
    let completed = Rc::new(Cell::new(0));
    let counter = completed.clone();
    let config = RefresherConfig::new("/refresh")
        .interval_ms(0)
        .on_complete(move |_| counter.set(counter.get() + 1));

    let mut registry = RefresherRegistry::new();
    let refresher = registry.register("panel", Refresher::new(config, mock));

    let outcome = smol::block_on(refresher.restart(&doc));
    assert!(outcome.is_applied());
    assert_eq!(inner(&doc, "panelA").as_deref(), Some("<b>x</b>"));
    assert_eq!(completed.get(), 1);
    assert_eq!(refresher.transport().requests()[0].url, "/refresh");

    registry.clear();
    assert!(refresher.is_closed());
}
