//! Dashboard
//!
//! Owns the live page and the refreshers that keep it current. Refreshers
//! share one transport and are closed when the dashboard goes away.

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use glance_dom::Document;
use glance_net::{Request, Transport};
use glance_refresh::{CycleOutcome, Refresher, RefresherConfig, RefresherRegistry};
use smol::LocalExecutor;

use crate::config::Config;
use crate::GlanceError;

/// A page plus its refreshers
pub struct Dashboard<T: Transport> {
    document: RefCell<Document>,
    transport: Rc<T>,
    registry: RefresherRegistry<Rc<T>>,
}

impl<T: Transport> Dashboard<T> {
    pub fn new(document: Document, transport: T) -> Self {
        Self {
            document: RefCell::new(document),
            transport: Rc::new(transport),
            registry: RefresherRegistry::new(),
        }
    }

    /// Parse a page and wrap it
    pub fn from_html(html: &str, url: &str, transport: T) -> Self {
        Self::new(glance_html::parse(html, url), transport)
    }

    /// Register every region of a configuration
    pub fn from_config(config: &Config, document: Document, transport: T) -> Result<Self, GlanceError> {
        config.validate()?;
        let mut dashboard = Self::new(document, transport);
        for region in &config.regions {
            dashboard.add_region(&region.name, config.refresher_config(region));
        }
        tracing::info!("dashboard {} with {} regions", dashboard.url(), config.regions.len());
        Ok(dashboard)
    }

    /// Fetch the page through the transport, then register the regions
    pub async fn open(config: &Config, page_url: &str, transport: T) -> Result<Self, GlanceError> {
        let response = transport.send(Request::get(page_url)).await?;
        if !response.is_success() {
            return Err(GlanceError::Page {
                url: page_url.to_string(),
                status: response.status,
            });
        }
        let html = response.text()?;
        Self::from_config(config, glance_html::parse(&html, page_url), transport)
    }

    /// Add a refresher; a region of the same name is replaced
    pub fn add_region(&mut self, name: &str, config: RefresherConfig) -> Rc<Refresher<Rc<T>>> {
        let refresher = Refresher::new(config, Rc::clone(&self.transport));
        self.registry.register(name, refresher)
    }

    pub fn remove_region(&mut self, name: &str) -> bool {
        self.registry.unregister(name)
    }

    pub fn region(&self, name: &str) -> Option<Rc<Refresher<Rc<T>>>> {
        self.registry.get(name)
    }

    pub fn document(&self) -> &RefCell<Document> {
        &self.document
    }

    pub fn url(&self) -> String {
        self.document.borrow().url().to_string()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn registry(&self) -> &RefresherRegistry<Rc<T>> {
        &self.registry
    }

    pub fn start(&self) {
        self.registry.start_all();
    }

    pub fn stop(&self) {
        self.registry.stop_all();
    }

    /// Restart every region with an immediate refresh
    pub async fn restart(&self) -> Vec<(String, CycleOutcome)> {
        self.registry.restart_all(&self.document).await
    }

    /// Refresh one region now
    pub async fn refresh(&self, name: &str) -> Option<CycleOutcome> {
        let refresher = self.registry.get(name)?;
        Some(refresher.refresh_now(&self.document).await)
    }

    /// Drive every region's periodic loop until `until` completes
    ///
    /// The loops are dropped afterwards; the refreshers keep their state and
    /// can be driven again.
    pub fn run_until<F: Future>(&self, until: F) -> F::Output {
        let ex = LocalExecutor::new();
        let loops = self.registry.spawn_all(&ex, &self.document);
        let output = smol::block_on(ex.run(until));
        drop(loops);
        output
    }

    /// Close every region
    pub fn close(&mut self) {
        self.registry.clear();
    }
}

impl<T: Transport> Drop for Dashboard<T> {
    fn drop(&mut self) {
        self.registry.clear();
    }
}
