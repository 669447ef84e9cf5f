//! Bounded in-memory coherence ledger.
//!
//! Every published tick and every harness run leaves one entry: the
//! stability/exploration split at that moment, a human-readable ratio
//! string, which subsystem wrote it, and an optional free-form context
//! plus JSON details. The ledger keeps a bounded window, evicting the
//! oldest entry past the cap.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::attractor::attractor_ratio;
use crate::config::LedgerConfig;
use crate::error::{FieldError, FieldResult};

/// Which subsystem wrote a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerSource {
    /// The per-tick engine pipeline.
    Engine,
    /// The perturbation harness.
    Harness,
    /// An external caller.
    Api,
    /// Lifecycle events (construction, restart).
    System,
}

impl std::fmt::Display for LedgerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerSource::Engine => write!(f, "engine"),
            LedgerSource::Harness => write!(f, "harness"),
            LedgerSource::Api => write!(f, "api"),
            LedgerSource::System => write!(f, "system"),
        }
    }
}

/// One ledger row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Coherence at the time of the entry.
    pub stability: f32,
    /// Complement of `stability`.
    pub exploration: f32,
    /// Ratio string like "3.00:1".
    pub ratio: String,
    pub source: LedgerSource,
    /// Short free-form label, e.g. the operation that wrote the entry.
    pub context: Option<String>,
    /// Structured payload, e.g. perturbation parameters.
    pub details: Option<Value>,
}

/// Bounded log of coherence entries, oldest evicted first.
#[derive(Debug, Clone)]
pub struct CoherenceLedger {
    cap: usize,
    entries: Vec<LedgerEntry>,
}

impl CoherenceLedger {
    pub fn new(config: &LedgerConfig) -> FieldResult<Self> {
        config.validate().map_err(FieldError::ConfigError)?;
        Ok(Self {
            cap: config.cap,
            entries: Vec::new(),
        })
    }

    /// Append a prebuilt entry, evicting the oldest past the cap.
    pub fn record(&mut self, entry: LedgerEntry) {
        if self.entries.len() >= self.cap {
            self.entries.remove(0);
        }
        self.entries.push(entry);
    }

    /// Build and append an entry for a coherence value.
    pub fn record_coherence(
        &mut self,
        coherence: f32,
        source: LedgerSource,
        context: Option<String>,
        details: Option<Value>,
    ) {
        let stability = if coherence.is_finite() {
            coherence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let entry = LedgerEntry {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            stability,
            exploration: 1.0 - stability,
            ratio: format!("{:.2}:1", attractor_ratio(stability)),
            source,
            context,
            details,
        };
        self.record(entry);
    }

    /// Up to `limit` entries, newest first.
    pub fn recent(&self, limit: usize) -> Vec<&LedgerEntry> {
        self.entries.iter().rev().take(limit).collect()
    }

    /// Up to `limit` entries from one source, newest first.
    pub fn by_source(&self, source: LedgerSource, limit: usize) -> Vec<&LedgerEntry> {
        self.entries
            .iter()
            .rev()
            .filter(|e| e.source == source)
            .take(limit)
            .collect()
    }

    /// The newest entry.
    pub fn latest(&self) -> Option<&LedgerEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
