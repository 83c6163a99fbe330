// src/search/mod.rs

//! Parallel fan-out search across backend adapters
//!
//! A query is dispatched to every available adapter on a bounded worker
//! pool. Each task is timed from the moment it starts running, and results
//! that arrive after their task's deadline are discarded. The collector
//! itself gives up after `timeout × ceil(n / concurrency)` plus a short
//! grace period, abandoning whatever is still running.
//!
//! Results are merged in dispatch order, not completion order, so the same
//! backend outputs always produce the same merged list.

pub mod rank;

pub use rank::rank;

use crate::backends::{Backend, BackendAdapter, PackageRecord};
use rayon::ThreadPoolBuilder;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Default number of adapters searched at once
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Default per-adapter timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

/// Slack the collector allows on top of the computed deadline
const COLLECT_GRACE: Duration = Duration::from_millis(250);

/// What one search task reports back
struct Outcome {
    idx: usize,
    backend: Backend,
    records: Vec<PackageRecord>,
    elapsed: Duration,
}

/// Run an adapter's search, treating a panic as an empty result
fn guarded_search(adapter: &dyn BackendAdapter, term: &str) -> Vec<PackageRecord> {
    match panic::catch_unwind(AssertUnwindSafe(|| adapter.search(term))) {
        Ok(records) => records,
        Err(_) => {
            warn!("{} search panicked, ignoring its results", adapter.backend());
            Vec::new()
        }
    }
}

/// Fans a query out to many backends and merges what comes back
pub struct SearchCoordinator {
    adapters: Vec<Arc<dyn BackendAdapter>>,
    concurrency: usize,
    timeout: Duration,
    installed: HashSet<String>,
}

impl SearchCoordinator {
    pub fn new(adapters: Vec<Arc<dyn BackendAdapter>>) -> Self {
        Self {
            adapters,
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
            installed: HashSet::new(),
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Mark records whose name is in the host's installed set
    pub fn with_installed<I, S>(mut self, installed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.installed = installed
            .into_iter()
            .map(|name| name.as_ref().to_lowercase())
            .collect();
        self
    }

    /// Backends this coordinator would query right now
    pub fn available_backends(&self) -> Vec<Backend> {
        self.adapters
            .iter()
            .filter(|a| a.is_available())
            .map(|a| a.backend())
            .collect()
    }

    /// Search every available backend for `term`
    ///
    /// Never fails. Slow, failing or panicking backends contribute nothing.
    /// Duplicates across backends are preserved.
    pub fn search_all(&self, term: &str) -> Vec<PackageRecord> {
        let available: Vec<Arc<dyn BackendAdapter>> = self
            .adapters
            .iter()
            .filter(|a| a.is_available())
            .cloned()
            .collect();

        if available.is_empty() {
            debug!("No backends available for '{}'", term);
            return Vec::new();
        }

        info!(
            "Searching {} backends for '{}' ({} at a time, {:.1}s each)",
            available.len(),
            term,
            self.concurrency,
            self.timeout.as_secs_f64()
        );

        let slots = match self.fan_out(&available, term) {
            Some(slots) => slots,
            None => available
                .iter()
                .map(|adapter| Some(guarded_search(adapter.as_ref(), term)))
                .collect(),
        };

        let mut records = Vec::new();
        for (adapter, slot) in available.iter().zip(slots) {
            match slot {
                Some(found) => records.extend(found),
                None => debug!("{} contributed nothing for '{}'", adapter.backend(), term),
            }
        }

        self.mark_installed(&mut records);
        records
    }

    /// Run `search_all` once per term and concatenate in term order
    pub fn search_terms<I, S>(&self, terms: I) -> Vec<PackageRecord>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        terms
            .into_iter()
            .flat_map(|term| self.search_all(term.as_ref()))
            .collect()
    }

    /// Dispatch one task per adapter and collect per-adapter results
    ///
    /// Returns None when the worker pool cannot be built, so the caller can
    /// fall back to searching inline.
    fn fan_out(
        &self,
        available: &[Arc<dyn BackendAdapter>],
        term: &str,
    ) -> Option<Vec<Option<Vec<PackageRecord>>>> {
        // A fresh pool per call: abandoned tasks keep their threads busy,
        // and must not starve later searches
        let pool = match ThreadPoolBuilder::new()
            .num_threads(self.concurrency)
            .thread_name(|i| format!("pkgscout-search-{}", i))
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                warn!("Failed to build search pool, searching sequentially: {}", e);
                return None;
            }
        };

        let (tx, rx) = mpsc::channel::<Outcome>();
        for (idx, adapter) in available.iter().enumerate() {
            let tx = tx.clone();
            let adapter = Arc::clone(adapter);
            let term = term.to_string();
            pool.spawn(move || {
                let started = Instant::now();
                let records = guarded_search(adapter.as_ref(), &term);
                // The collector may already be gone; nothing to do then
                let _ = tx.send(Outcome {
                    idx,
                    backend: adapter.backend(),
                    records,
                    elapsed: started.elapsed(),
                });
            });
        }
        drop(tx);

        let waves = available.len().div_ceil(self.concurrency) as u32;
        let deadline = Instant::now() + self.timeout.saturating_mul(waves) + COLLECT_GRACE;

        let mut slots: Vec<Option<Vec<PackageRecord>>> = vec![None; available.len()];
        let mut received = 0;
        while received < available.len() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok(outcome) => {
                    received += 1;
                    if outcome.elapsed > self.timeout {
                        warn!(
                            "{} took {:.1}s, over its {:.1}s budget; dropping its results",
                            outcome.backend,
                            outcome.elapsed.as_secs_f64(),
                            self.timeout.as_secs_f64()
                        );
                        continue;
                    }
                    debug!(
                        "{} returned {} records in {:.2}s",
                        outcome.backend,
                        outcome.records.len(),
                        outcome.elapsed.as_secs_f64()
                    );
                    slots[outcome.idx] = Some(outcome.records);
                }
                Err(RecvTimeoutError::Timeout) => {
                    warn!(
                        "Search deadline reached with {} of {} backends still running",
                        available.len() - received,
                        available.len()
                    );
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        Some(slots)
    }

    fn mark_installed(&self, records: &mut [PackageRecord]) {
        if self.installed.is_empty() {
            return;
        }
        for record in records {
            if self.installed.contains(&record.name.to_lowercase()) {
                record.installed = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    struct StaticAdapter {
        backend: Backend,
        names: Vec<&'static str>,
        delay: Duration,
        available: bool,
        panics: bool,
    }

    impl StaticAdapter {
        fn new(backend: Backend, names: &[&'static str]) -> Self {
            Self {
                backend,
                names: names.to_vec(),
                delay: Duration::ZERO,
                available: true,
                panics: false,
            }
        }

        fn delayed(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    impl BackendAdapter for StaticAdapter {
        fn backend(&self) -> Backend {
            self.backend
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn search(&self, term: &str) -> Vec<PackageRecord> {
            if self.panics {
                panic!("adapter blew up");
            }
            thread::sleep(self.delay);
            self.names
                .iter()
                .map(|name| PackageRecord::new(*name, term, self.backend, "test", ""))
                .collect()
        }
    }

    fn coordinator(adapters: Vec<StaticAdapter>) -> SearchCoordinator {
        SearchCoordinator::new(
            adapters
                .into_iter()
                .map(|a| Arc::new(a) as Arc<dyn BackendAdapter>)
                .collect(),
        )
    }

    #[test]
    fn test_hung_backend_is_dropped() {
        let search = coordinator(vec![
            StaticAdapter::new(Backend::Pacman, &["x-pacman"]),
            StaticAdapter::new(Backend::Flatpak, &["x-flatpak"]).delayed(Duration::from_secs(3)),
            StaticAdapter::new(Backend::Snap, &["x-snap"]),
            StaticAdapter::new(Backend::Cargo, &["x-cargo"]),
            StaticAdapter::new(Backend::Npm, &["x-npm"]),
        ])
        .with_timeout(Duration::from_millis(200));

        let started = Instant::now();
        let records = search.search_all("x");
        assert!(started.elapsed() < Duration::from_millis(1500));

        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["x-pacman", "x-snap", "x-cargo", "x-npm"]);
    }

    #[test]
    fn test_merge_follows_dispatch_order() {
        let search = coordinator(vec![
            StaticAdapter::new(Backend::Apt, &["slow-1", "slow-2"]).delayed(Duration::from_millis(80)),
            StaticAdapter::new(Backend::Cargo, &["fast"]),
        ]);

        let records = search.search_all("q");
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["slow-1", "slow-2", "fast"]);
    }

    #[test]
    fn test_panicking_backend_contributes_nothing() {
        let mut broken = StaticAdapter::new(Backend::Snap, &["never"]);
        broken.panics = true;
        let search = coordinator(vec![broken, StaticAdapter::new(Backend::Npm, &["ok"])]);

        let records = search.search_all("q");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "ok");
    }

    #[test]
    fn test_unavailable_backends_are_skipped() {
        let mut missing = StaticAdapter::new(Backend::Dnf, &["from-dnf"]);
        missing.available = false;
        let search = coordinator(vec![missing, StaticAdapter::new(Backend::Pacman, &["from-pacman"])]);

        assert_eq!(search.available_backends(), vec![Backend::Pacman]);
        let records = search.search_all("q");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].backend, Backend::Pacman);
    }

    #[test]
    fn test_no_backends_is_empty() {
        assert!(coordinator(Vec::new()).search_all("q").is_empty());
    }

    #[test]
    fn test_small_pool_runs_every_wave() {
        let adapters = [Backend::Pacman, Backend::Apt, Backend::Dnf, Backend::Cargo]
            .into_iter()
            .map(|b| StaticAdapter::new(b, &["pkg"]).delayed(Duration::from_millis(20)))
            .collect();
        let search = coordinator(adapters)
            .with_concurrency(1)
            .with_timeout(Duration::from_millis(500));

        let backends: Vec<Backend> = search.search_all("q").iter().map(|r| r.backend).collect();
        assert_eq!(
            backends,
            vec![Backend::Pacman, Backend::Apt, Backend::Dnf, Backend::Cargo]
        );
    }

    #[test]
    fn test_with_installed_marks_case_insensitively() {
        let search = coordinator(vec![StaticAdapter::new(Backend::Flatpak, &["Firefox", "chromium"])])
            .with_installed(["firefox"]);

        let records = search.search_all("browser");
        assert!(records[0].installed);
        assert!(!records[1].installed);
    }

    #[test]
    fn test_search_terms_concatenates_in_order() {
        let search = coordinator(vec![StaticAdapter::new(Backend::Apt, &["hit"])]);
        let records = search.search_terms(["libssl-dev", "openssl"]);
        let versions: Vec<&str> = records.iter().map(|r| r.version.as_str()).collect();
        assert_eq!(versions, vec!["libssl-dev", "openssl"]);
    }
}
