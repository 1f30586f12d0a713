//! Concurrent per-hash latency records with an append-only durable log.
//!
//! Records are created when a hash is first seen, filled in by the pipeline stages, and
//! dropped as soon as a stage fails for them, so that after a scan has drained only complete
//! records remain.

mod log;
mod metrics;

pub use log::LogError;

use std::path::{Path, PathBuf};

use dashmap::{DashMap, DashSet};
use finality_scraper_types::{LatencyField, LatencyRecord, TransactionHash, UnixMillis};
use metrics::LATENCY_STORE_METRICS;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Hash not found: {0}")]
    UnknownHash(TransactionHash),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregateError {
    #[error("No latency records to aggregate")]
    Empty,
    #[error("Latency record for {0} is incomplete")]
    Incomplete(TransactionHash),
}

/// Mean and maximum finality latency over all records.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyStats {
    pub count: usize,
    pub mean_ms: f64,
    pub max_ms: f64,
}

#[derive(Debug)]
pub struct LatencyStore {
    path: PathBuf,
    records: DashMap<TransactionHash, LatencyRecord>,
    /// Hashes present on any row of the durable log, including orphan rows.
    persisted: DashSet<TransactionHash>,
}

impl LatencyStore {
    /// Opens the store backed by the log at `path`, rehydrating every complete record and
    /// marking every logged hash as persisted.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LogError> {
        let path = path.as_ref().to_path_buf();
        let contents = log::read(&path)?;
        let store = Self {
            records: contents.records.into_iter().collect(),
            persisted: contents.hashes.into_iter().collect(),
            path,
        };
        tracing::info!(
            path = %store.path.display(),
            records = store.records.len(),
            logged_hashes = store.persisted.len(),
            "latency store opened"
        );
        LATENCY_STORE_METRICS.records.set(store.records.len());
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Starts tracking `hash`. Returns `false` without touching the existing record if the
    /// hash is already tracked or already in the log.
    pub fn begin(&self, hash: TransactionHash) -> bool {
        if self.persisted.contains(&hash) {
            return false;
        }
        let inserted = match self.records.entry(hash) {
            dashmap::Entry::Occupied(_) => false,
            dashmap::Entry::Vacant(entry) => {
                entry.insert(LatencyRecord::default());
                true
            }
        };
        if inserted {
            LATENCY_STORE_METRICS.records.set(self.records.len());
        }
        inserted
    }

    pub fn contains(&self, hash: &TransactionHash) -> bool {
        self.records.contains_key(hash)
    }

    pub fn get(&self, hash: &TransactionHash) -> Option<LatencyRecord> {
        self.records.get(hash).map(|record| *record)
    }

    /// Fails if `hash` is not tracked, e.g. because another stage already dropped it.
    pub fn set_field(
        &self,
        hash: &TransactionHash,
        field: LatencyField,
        value: UnixMillis,
    ) -> Result<(), StoreError> {
        let mut record = self
            .records
            .get_mut(hash)
            .ok_or_else(|| StoreError::UnknownHash(hash.clone()))?;
        record.set(field, value);
        Ok(())
    }

    pub fn remove(&self, hash: &TransactionHash) {
        if self.records.remove(hash).is_some() {
            LATENCY_STORE_METRICS.removed.inc();
            LATENCY_STORE_METRICS.records.set(self.records.len());
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Current records ordered by hash. Not atomic with respect to concurrent writers.
    pub fn snapshot(&self) -> Vec<(TransactionHash, LatencyRecord)> {
        let mut snapshot: Vec<_> = self
            .records
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        snapshot.sort_by(|(a, _), (b, _)| a.cmp(b));
        snapshot
    }

    /// Mean and maximum latency over all records.
    ///
    /// Every record must be complete: incomplete hashes are expected to have been removed by
    /// the stage that failed for them, so an incomplete record fails the whole aggregate.
    pub fn aggregate(&self) -> Result<LatencyStats, AggregateError> {
        let mut sum = 0f64;
        let mut max = 0i64;
        let mut count = 0usize;
        for entry in self.records.iter() {
            let latency = entry
                .value()
                .latency_ms()
                .ok_or_else(|| AggregateError::Incomplete(entry.key().clone()))?;
            sum += latency as f64;
            max = max.max(latency);
            count += 1;
        }
        if count == 0 {
            return Err(AggregateError::Empty);
        }
        Ok(LatencyStats {
            count,
            mean_ms: sum / count as f64,
            max_ms: max as f64,
        })
    }

    /// Appends every complete record that is not yet in the log and returns how many were
    /// written. Incomplete records are skipped.
    pub fn flush(&self) -> std::io::Result<usize> {
        let mut pending = Vec::new();
        for (hash, record) in self.snapshot() {
            if self.persisted.contains(&hash) {
                continue;
            }
            match (record.start, record.root_end) {
                (Some(start), Some(root_end)) => pending.push((hash, start, root_end)),
                _ => tracing::warn!(%hash, ?record, "not persisting incomplete latency record"),
            }
        }

        if pending.is_empty() {
            return Ok(0);
        }
        log::append(
            &self.path,
            pending
                .iter()
                .map(|(hash, start, root_end)| (hash, *start, *root_end)),
        )?;
        for (hash, _, _) in &pending {
            self.persisted.insert(hash.clone());
        }
        LATENCY_STORE_METRICS.flushed.inc_by(pending.len() as u64);
        tracing::info!(
            path = %self.path.display(),
            appended = pending.len(),
            "latency store flushed"
        );
        Ok(pending.len())
    }
}
