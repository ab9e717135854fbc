//! Refresher registry
//!
//! Owned by whatever owns the page. Refreshers are registered under a name
//! and driven as a group; clearing the registry closes every refresher so
//! their loops end with the page.

use std::cell::RefCell;
use std::rc::Rc;

use glance_dom::Document;
use glance_net::Transport;
use smol::{LocalExecutor, Task};

use crate::scheduler::{CycleOutcome, Refresher};

/// Named set of refreshers
pub struct RefresherRegistry<T> {
    entries: Vec<(String, Rc<Refresher<T>>)>,
}

impl<T: Transport> RefresherRegistry<T> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Add a refresher; one already registered under `name` is closed and
    /// replaced
    pub fn register(&mut self, name: &str, refresher: Refresher<T>) -> Rc<Refresher<T>> {
        let refresher = Rc::new(refresher);
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => {
                tracing::debug!("replacing refresher {}", name);
                slot.1.close();
                slot.1 = Rc::clone(&refresher);
            }
            None => self.entries.push((name.to_string(), Rc::clone(&refresher))),
        }
        refresher
    }

    pub fn get(&self, name: &str) -> Option<Rc<Refresher<T>>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, r)| Rc::clone(r))
    }

    /// Close and drop one refresher
    pub fn unregister(&mut self, name: &str) -> bool {
        let Some(pos) = self.entries.iter().position(|(n, _)| n == name) else {
            return false;
        };
        let (_, refresher) = self.entries.remove(pos);
        refresher.close();
        true
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rc<Refresher<T>>)> {
        self.entries.iter().map(|(n, r)| (n.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn start_all(&self) {
        for (_, refresher) in &self.entries {
            refresher.start();
        }
    }

    pub fn stop_all(&self) {
        for (_, refresher) in &self.entries {
            refresher.stop();
        }
    }

    /// Restart every refresher, one after another
    pub async fn restart_all(&self, doc: &RefCell<Document>) -> Vec<(String, CycleOutcome)> {
        // Stop everything first so no old response lands mid-restart
        self.stop_all();
        let mut outcomes = Vec::with_capacity(self.entries.len());
        for (name, refresher) in &self.entries {
            outcomes.push((name.clone(), refresher.restart(doc).await));
        }
        outcomes
    }

    /// Close every refresher and forget them
    pub fn clear(&mut self) {
        for (name, refresher) in self.entries.drain(..) {
            tracing::debug!("closing refresher {}", name);
            refresher.close();
        }
    }

    /// Spawn each refresher's periodic loop on a local executor
    pub fn spawn_all<'a>(&self, ex: &LocalExecutor<'a>, doc: &'a RefCell<Document>) -> Vec<Task<()>>
    where
        T: 'a,
    {
        self.entries
            .iter()
            .map(|(_, refresher)| {
                let refresher = Rc::clone(refresher);
                ex.spawn(async move { refresher.run(doc).await })
            })
            .collect()
    }
}

impl<T: Transport> Default for RefresherRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::RefresherConfig;
    use glance_net::MockTransport;

    fn refresher(url: &str) -> Refresher<MockTransport> {
        let mock = MockTransport::new();
        mock.set_fallback(200, "{}");
        Refresher::new(RefresherConfig::new(url), mock)
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = RefresherRegistry::new();
        registry.register("pipelines", refresher("/pipelines"));
        registry.register("agents", refresher("/agents"));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["pipelines", "agents"]);
        assert_eq!(registry.get("agents").unwrap().config().url, "/agents");
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_register_replaces_and_closes() {
        let mut registry = RefresherRegistry::new();
        let old = registry.register("pipelines", refresher("/old"));
        registry.register("pipelines", refresher("/new"));

        assert_eq!(registry.len(), 1);
        assert!(old.is_closed());
        assert_eq!(registry.get("pipelines").unwrap().config().url, "/new");
    }

    #[test]
    fn test_start_stop_all() {
        let mut registry = RefresherRegistry::new();
        let a = registry.register("a", refresher("/a"));
        let b = registry.register("b", refresher("/b"));

        registry.start_all();
        assert!(a.is_running() && b.is_running());
        registry.stop_all();
        assert!(!a.is_running() && !b.is_running());
    }

    #[test]
    fn test_restart_all() {
        let doc = RefCell::new(Document::default());
        let mut registry = RefresherRegistry::new();
        registry.register("a", refresher("/a"));
        registry.register("b", refresher("/b"));

        let outcomes = smol::block_on(registry.restart_all(&doc));
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|(_, o)| o.is_applied()));
    }

    #[test]
    fn test_clear_closes_everything() {
        let mut registry = RefresherRegistry::new();
        let a = registry.register("a", refresher("/a"));
        registry.start_all();

        registry.clear();
        assert!(registry.is_empty());
        assert!(a.is_closed());
        assert!(!a.is_running());
        assert!(!registry.unregister("a"));
    }

    #[test]
    fn test_spawned_loops_end_on_clear() {
        let doc = RefCell::new(Document::default());
        let ex = LocalExecutor::new();
        let mut registry = RefresherRegistry::new();
        registry.register("a", refresher("/a"));
        registry.start_all();

        let tasks = registry.spawn_all(&ex, &doc);
        registry.clear();
        smol::block_on(ex.run(async {
            for task in tasks {
                task.await;
            }
        }));
    }
}
