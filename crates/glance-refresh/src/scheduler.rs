//! Refresh scheduler
//!
//! A `Refresher` owns one refresh endpoint: it builds the request from the
//! document, sends it through a `Transport`, and patches the answer back in
//! with state preserved around each replaced container.
//!
//! Everything runs on one thread. The document is shared as
//! `RefCell<Document>` and no borrow is held across an await. Each call to
//! `stop` bumps an epoch; a response that comes back under an older epoch is
//! dropped without touching the document or calling any callback.

use std::cell::{Cell, RefCell};
use std::time::Duration;

use glance_dom::{Document, Generation, NodeId};
use glance_net::{Method, NetError, Request, Response, Transport};
use smol::channel::{self, Receiver, Sender};
use smol::future;
use smol::stream::StreamExt;
use smol::Timer;

use crate::guard::{Snapshot, StateGuard};
use crate::params::ParamBuilder;
use crate::patch::{PatchApplier, PatchReport};
use crate::payload::{RefreshMode, RefreshPayload};
use crate::RefreshError;

/// Runs after a target's fragment was applied
pub type TargetCallback = Box<dyn Fn(&mut Document, NodeId)>;
/// Runs when a cycle fails
pub type FailureCallback = Box<dyn Fn(&RefreshError)>;
/// Runs once per cycle that was not cancelled
pub type CompletionCallback = Box<dyn Fn(&CycleOutcome)>;

/// Refresher configuration
pub struct RefresherConfig {
    pub url: String,
    pub method: Method,
    /// Zero disables periodic refreshes
    pub interval: Duration,
    pub mode: RefreshMode,
    pub params: ParamBuilder,
    pub sticky_classes: Vec<String>,
    /// Containers managed from the start
    pub tracked: Vec<String>,
    after: Vec<(String, TargetCallback)>,
    on_failure: Option<FailureCallback>,
    on_complete: Option<CompletionCallback>,
}

impl RefresherConfig {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            method: Method::Get,
            interval: Duration::ZERO,
            mode: RefreshMode::default(),
            params: ParamBuilder::new(),
            sticky_classes: Vec::new(),
            tracked: Vec::new(),
            after: Vec::new(),
            on_failure: None,
            on_complete: None,
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval_ms(self, ms: u64) -> Self {
        self.interval(Duration::from_millis(ms))
    }

    pub fn mode(mut self, mode: RefreshMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn params(mut self, params: ParamBuilder) -> Self {
        self.params = params;
        self
    }

    pub fn sticky_class(mut self, class: &str) -> Self {
        self.sticky_classes.push(class.to_string());
        self
    }

    pub fn track(mut self, id: &str) -> Self {
        self.tracked.push(id.to_string());
        self
    }

    /// Callback for one target, run after its fragment is in place
    pub fn after<F>(mut self, target_id: &str, f: F) -> Self
    where
        F: Fn(&mut Document, NodeId) + 'static,
    {
        self.after.push((target_id.to_string(), Box::new(f)));
        self
    }

    pub fn on_failure<F>(mut self, f: F) -> Self
    where
        F: Fn(&RefreshError) + 'static,
    {
        self.on_failure = Some(Box::new(f));
        self
    }

    pub fn on_complete<F>(mut self, f: F) -> Self
    where
        F: Fn(&CycleOutcome) + 'static,
    {
        self.on_complete = Some(Box::new(f));
        self
    }
}

impl std::fmt::Debug for RefresherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefresherConfig")
            .field("url", &self.url)
            .field("method", &self.method)
            .field("interval", &self.interval)
            .field("mode", &self.mode)
            .field("params", &self.params)
            .field("sticky_classes", &self.sticky_classes)
            .field("tracked", &self.tracked)
            .field("after", &self.after.iter().map(|(id, _)| id).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Result of one refresh cycle
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Payload applied
    Applied(PatchReport),
    /// Request or decoding failed; the document is untouched
    Failed(RefreshError),
    /// Not started: stopped, or a request is already outstanding
    Skipped,
    /// Response arrived after `stop`; discarded
    Cancelled,
}

impl CycleOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn report(&self) -> Option<&PatchReport> {
        match self {
            Self::Applied(report) => Some(report),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&RefreshError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

enum Wake {
    Tick,
    Signal,
}

/// Periodic refresher for one endpoint
pub struct Refresher<T> {
    config: RefresherConfig,
    transport: T,
    applier: RefCell<PatchApplier>,
    guard: StateGuard,
    running: Cell<bool>,
    closed: Cell<bool>,
    epoch: Cell<Generation>,
    in_flight: Cell<Option<Generation>>,
    cycles: Cell<u64>,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
}

impl<T: Transport> Refresher<T> {
    pub fn new(config: RefresherConfig, transport: T) -> Self {
        let (wake_tx, wake_rx) = channel::bounded(1);
        Self {
            applier: RefCell::new(PatchApplier::with_tracked(config.tracked.iter().cloned())),
            guard: StateGuard::with_sticky_classes(config.sticky_classes.iter().cloned()),
            config,
            transport,
            running: Cell::new(false),
            closed: Cell::new(false),
            epoch: Cell::new(Generation::INITIAL),
            in_flight: Cell::new(None),
            cycles: Cell::new(0),
            wake_tx,
            wake_rx,
        }
    }

    pub fn config(&self) -> &RefresherConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    /// Current epoch (bumped by every `stop`)
    pub fn epoch(&self) -> Generation {
        self.epoch.get()
    }

    /// Whether a request of the current epoch is outstanding
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.get() == Some(self.epoch.get())
    }

    /// Completed cycles (applied or failed)
    pub fn cycles(&self) -> u64 {
        self.cycles.get()
    }

    /// Containers currently managed
    pub fn tracked(&self) -> Vec<String> {
        self.applier.borrow().tracked().map(str::to_string).collect()
    }

    /// Begin refreshing
    pub fn start(&self) {
        if self.closed.get() {
            tracing::warn!("refresher for {} is closed; ignoring start", self.config.url);
            return;
        }
        if !self.running.replace(true) {
            tracing::info!("refresher for {} started ({:?})", self.config.url, self.config.interval);
        }
        self.signal();
    }

    /// Stop refreshing and discard any outstanding response
    pub fn stop(&self) {
        if self.running.replace(false) {
            tracing::info!("refresher for {} stopped", self.config.url);
        }
        self.epoch.set(self.epoch.get().next());
        self.in_flight.set(None);
        self.signal();
    }

    /// Stop, start again and refresh immediately
    pub async fn restart(&self, doc: &RefCell<Document>) -> CycleOutcome {
        self.stop();
        self.start();
        self.refresh_now(doc).await
    }

    /// Stop for good; `run` returns
    pub fn close(&self) {
        self.stop();
        self.closed.set(true);
        self.signal();
    }

    fn signal(&self) {
        // A pending wake-up already covers this one
        let _ = self.wake_tx.try_send(());
    }

    /// Periodic loop
    ///
    /// Ticks every `interval` while running, idles while stopped and
    /// returns once closed. A tick never overlaps a cycle: the interval is
    /// re-armed after each one, so slow responses delay rather than queue
    /// ticks.
    pub async fn run(&self, doc: &RefCell<Document>) {
        let period = self.config.interval;
        let mut timer = if period.is_zero() {
            Timer::never()
        } else {
            Timer::interval(period)
        };

        while !self.closed.get() {
            let wake = if self.running.get() && !period.is_zero() {
                future::or(
                    async {
                        timer.next().await;
                        Wake::Tick
                    },
                    self.wait_signal(),
                )
                .await
            } else {
                self.wait_signal().await
            };

            match wake {
                Wake::Tick => {
                    self.refresh_now(doc).await;
                    timer.set_interval(period);
                }
                Wake::Signal if !period.is_zero() => timer.set_interval(period),
                Wake::Signal => {}
            }
        }
        tracing::debug!("refresher loop for {} finished", self.config.url);
    }

    async fn wait_signal(&self) -> Wake {
        let _ = self.wake_rx.recv().await;
        Wake::Signal
    }

    /// Run one cycle now
    pub async fn refresh_now(&self, doc: &RefCell<Document>) -> CycleOutcome {
        let Some(ticket) = self.begin_cycle() else {
            return CycleOutcome::Skipped;
        };

        let request = self.build_request(&doc.borrow());
        tracing::info!("refresh {} {}", request.method, request.url);
        let result = self.transport.send(request).await;

        if !self.finish_cycle(ticket) {
            tracing::debug!("discarding response for {} from {}", self.config.url, ticket);
            return CycleOutcome::Cancelled;
        }

        let outcome = match decode(result) {
            Ok(payload) => CycleOutcome::Applied(self.apply(&mut doc.borrow_mut(), &payload)),
            Err(err) => {
                tracing::warn!("refresh of {} failed: {}", self.config.url, err);
                if let Some(on_failure) = &self.config.on_failure {
                    on_failure(&err);
                }
                CycleOutcome::Failed(err)
            }
        };

        self.cycles.set(self.cycles.get() + 1);
        if let Some(on_complete) = &self.config.on_complete {
            on_complete(&outcome);
        }
        outcome
    }

    fn begin_cycle(&self) -> Option<Generation> {
        if !self.running.get() {
            tracing::debug!("refresher for {} is stopped; skipping cycle", self.config.url);
            return None;
        }
        let epoch = self.epoch.get();
        if self.in_flight.get() == Some(epoch) {
            tracing::debug!("request for {} still outstanding; skipping cycle", self.config.url);
            return None;
        }
        self.in_flight.set(Some(epoch));
        Some(epoch)
    }

    fn finish_cycle(&self, ticket: Generation) -> bool {
        if self.epoch.get() != ticket {
            return false;
        }
        self.in_flight.set(None);
        true
    }

    fn build_request(&self, doc: &Document) -> Request {
        let pairs = self.config.params.build(doc).to_pairs();
        let encoded = pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()));
        let request = match self.config.method {
            Method::Get => Request::get(&self.config.url).with_query(encoded),
            Method::Post => Request::post(&self.config.url).with_form(encoded),
        };
        request.with_header("Accept", "application/json")
    }

    /// Patch the document, preserving state inside replaced containers
    fn apply(&self, doc: &mut Document, payload: &RefreshPayload) -> PatchReport {
        let snapshots: Vec<(&str, Snapshot)> = payload
            .ids()
            .filter_map(|id| {
                let node = doc.get_element_by_id(id)?;
                Some((id, self.guard.snapshot(doc.tree(), node)))
            })
            .collect();

        let report = self.applier.borrow_mut().apply(doc, payload, self.config.mode);

        for (id, snapshot) in &snapshots {
            if let Some(node) = doc.get_element_by_id(id) {
                self.guard.restore(snapshot, doc.tree_mut(), node);
            }
        }

        for id in payload.ids() {
            if !report.applied().any(|applied| applied == id) {
                continue;
            }
            for (target, callback) in &self.config.after {
                if target != id {
                    continue;
                }
                if let Some(node) = doc.get_element_by_id(id) {
                    callback(&mut *doc, node);
                }
            }
        }
        report
    }
}

fn decode(result: Result<Response, NetError>) -> Result<RefreshPayload, RefreshError> {
    let response = result?;
    if !response.is_success() {
        return Err(RefreshError::Server {
            status: response.status,
        });
    }
    RefreshPayload::from_slice(&response.body).map_err(|e| RefreshError::Decode(e.to_string()))
}
