//! Stick-table snapshots and the parsers that build them

mod dump;
mod error;
mod list;
mod tokenize;

pub use dump::parse_table_dump;
pub use error::ParseIssue;
pub use list::{parse_table_list, TABLE_MARKER};
pub use tokenize::{tokenize_entry, KeyValueParser};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Whether a snapshot carries usable data
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SnapshotStatus {
    /// Header matched the requested table
    Ok,
    /// Header named a different table; the snapshot is empty
    SanityMismatch { found: String },
}

/// One table's statistics from a single dump
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSnapshot {
    /// Table name as requested
    pub name: String,

    /// Declared current size (`used` in the header)
    pub entry_count: u64,

    /// `conn_rate` of every entry, in dump order
    pub conn_rate_samples: Vec<f64>,

    /// Window of `conn_rate`, taken from the first entry that reports one
    pub conn_rate_interval: String,

    /// `http_req_rate` of every entry, in dump order
    pub http_request_rate_samples: Vec<f64>,

    /// Window of `http_req_rate`, taken from the first entry that reports one
    pub http_request_rate_interval: String,

    pub status: SnapshotStatus,

    /// Every degradation applied while parsing
    pub issues: Vec<ParseIssue>,
}

impl TableSnapshot {
    /// An empty snapshot for a table whose dump could not be trusted
    pub fn mismatch(requested: impl Into<String>, found: impl Into<String>) -> Self {
        let requested = requested.into();
        let found = found.into();

        Self {
            issues: vec![ParseIssue::SanityMismatch {
                requested: requested.clone(),
                found: found.clone(),
            }],
            name: requested,
            entry_count: 0,
            conn_rate_samples: Vec::new(),
            conn_rate_interval: String::new(),
            http_request_rate_samples: Vec::new(),
            http_request_rate_interval: String::new(),
            status: SnapshotStatus::SanityMismatch { found },
        }
    }

    pub fn is_mismatch(&self) -> bool {
        matches!(self.status, SnapshotStatus::SanityMismatch { .. })
    }
}

/// Every table known at poll time, in listing order, from one cycle.
///
/// A generation is only ever built from a cycle in which every exchange with
/// the stats socket succeeded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Generation {
    pub tables: Vec<TableSnapshot>,
    pub collected_at: DateTime<Utc>,
}

impl Generation {
    /// Create a new generation stamped with the current time
    pub fn new(tables: Vec<TableSnapshot>) -> Self {
        Self {
            tables,
            collected_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Look up a table by name
    pub fn table(&self, name: &str) -> Option<&TableSnapshot> {
        self.tables.iter().find(|t| t.name == name)
    }
}
