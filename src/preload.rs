//! Concurrent one-shot preload of every category.
//!
//! One worker thread runs per category and reports back over a channel; the
//! caller blocks until every worker has answered or the shared deadline
//! passes. Workers still running at the deadline are abandoned and their
//! categories recorded as timed out. Nothing is retried.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, RecvTimeoutError};

use crate::data::TrendingService;
use crate::error::{FetchError, FetchErrorKind};
use crate::store::{CategoryStore, StoreBuilder};
use crate::trending::Item;

#[derive(Debug, Clone)]
pub struct Options {
    pub fetch_timeout: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(20),
        }
    }
}

#[derive(Debug)]
pub struct Report {
    pub store: CategoryStore,
    /// Failures in declared category order.
    pub failures: Vec<FetchError>,
}

impl Report {
    pub fn failed_categories(&self) -> Vec<&str> {
        self.failures
            .iter()
            .map(|err| err.category.as_str())
            .collect()
    }
}

struct Outcome {
    category: String,
    result: Result<Vec<Item>, FetchError>,
}

pub fn preload(
    service: Arc<dyn TrendingService>,
    categories: &[String],
    options: &Options,
) -> Report {
    let started = Instant::now();
    let mut seen = HashSet::new();
    let order: Vec<String> = categories
        .iter()
        .filter(|category| seen.insert(category.as_str()))
        .cloned()
        .collect();

    tracing::info!(categories = order.len(), "preloading trending listings");

    let (tx, rx) = unbounded::<Outcome>();
    for category in &order {
        let tx = tx.clone();
        let service = Arc::clone(&service);
        let category = category.clone();
        let spawned = thread::Builder::new()
            .name(format!("fetch-{category}"))
            .spawn(move || {
                let result = service.fetch_items(&category);
                let _ = tx.send(Outcome { category, result });
            });
        if let Err(err) = spawned {
            tracing::warn!(error = %err, "could not spawn fetch worker");
        }
    }
    drop(tx);

    let mut builder = StoreBuilder::new(order.clone());
    let mut pending: HashSet<String> = order.iter().cloned().collect();
    let mut failures = Vec::new();
    let deadline = started + options.fetch_timeout;

    while !pending.is_empty() {
        match rx.recv_deadline(deadline) {
            Ok(Outcome { category, result }) => {
                if !pending.remove(&category) {
                    continue;
                }
                match result {
                    Ok(items) => {
                        tracing::debug!(category = %category, items = items.len(), "fetched");
                        builder.insert(&category, items);
                    }
                    Err(err) => failures.push(err),
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                for category in pending.drain() {
                    failures.push(FetchError::new(
                        category,
                        FetchErrorKind::Timeout(options.fetch_timeout),
                    ));
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                for category in pending.drain() {
                    failures.push(FetchError::new(category, FetchErrorKind::Worker));
                }
            }
        }
    }

    failures.sort_by_key(|err| {
        order
            .iter()
            .position(|category| *category == err.category)
            .unwrap_or(usize::MAX)
    });
    for err in &failures {
        tracing::warn!(category = %err.category, error = %err.kind, "fetch failed");
    }

    tracing::info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        failures = failures.len(),
        "preload finished"
    );

    Report {
        store: builder.finish(),
        failures,
    }
}
