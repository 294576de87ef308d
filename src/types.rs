//! Core types and events for archived-or-not

use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::path::PathBuf;

/// One candidate file produced by enumeration.
///
/// Created during the traversal pass and discarded once its outcome has been
/// recorded in the [`ResultMap`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileDescriptor {
    /// Absolute path of the file on disk
    pub path: PathBuf,
    /// Path relative to the scan root
    pub relative: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileDescriptor {
    /// The absolute path in the display convention used throughout the
    /// system: forward slashes folded to backslashes. Result-map keys and
    /// source-path exclusion both use this form.
    pub fn normalized_path(&self) -> String {
        self.path.display().to_string().replace('/', "\\")
    }

    /// The root-relative path in display convention (backslash separated).
    pub fn display_relative(&self) -> String {
        self.relative.display().to_string().replace('/', "\\")
    }

    /// Base name of the file, used as the multipart part filename.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Terminal classification of processing one file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The archive holds this file at these locations (rewritten to the
    /// network-share display convention, ordered as the server returned them)
    Found(Vec<String>),
    /// The archive does not hold this file
    NotFound,
    /// The file was never uploaded (oversize policy)
    Skipped {
        /// Human-readable skip reason including measured size and limit
        reason: String,
        /// Measured file size in bytes
        size: u64,
    },
    /// The check failed for this file only; the batch continued
    Failed(String),
}

impl CheckOutcome {
    /// Stable tag for this outcome, independent of its payload.
    ///
    /// Two runs over an unmodified tree against a stable archive yield
    /// identical tags per file even when location lists differ in detail.
    pub fn tag(&self) -> &'static str {
        match self {
            CheckOutcome::Found(_) => "found",
            CheckOutcome::NotFound => "not_found",
            CheckOutcome::Skipped { .. } => "skipped",
            CheckOutcome::Failed(_) => "failed",
        }
    }

    /// Single-string form used in exports for every non-`Found` outcome.
    pub fn description(&self) -> String {
        match self {
            CheckOutcome::Found(locations) => locations.join(", "),
            CheckOutcome::NotFound => "None".to_string(),
            CheckOutcome::Skipped { reason, .. } => reason.clone(),
            CheckOutcome::Failed(reason) => format!("Error: {}", reason),
        }
    }

    /// True when nothing was found for this file (a 404, or a success
    /// response whose location list came back empty after filtering).
    pub fn is_missing(&self) -> bool {
        match self {
            CheckOutcome::NotFound => true,
            CheckOutcome::Found(locations) => locations.is_empty(),
            _ => false,
        }
    }

    fn from_description(s: &str) -> Self {
        if s == "None" {
            CheckOutcome::NotFound
        } else if let Some(reason) = s.strip_prefix("Error: ") {
            CheckOutcome::Failed(reason.to_string())
        } else if s.starts_with("Skipped") {
            // The measured byte size is not recoverable from the report form.
            CheckOutcome::Skipped {
                reason: s.to_string(),
                size: 0,
            }
        } else {
            CheckOutcome::Failed(s.to_string())
        }
    }
}

// Exports serialize `Found` as a bare array of strings and everything else
// as its descriptive string, so the JSON file reads as a plain report.
impl Serialize for CheckOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CheckOutcome::Found(locations) => locations.serialize(serializer),
            other => serializer.serialize_str(&other.description()),
        }
    }
}

impl<'de> Deserialize<'de> for CheckOutcome {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OutcomeVisitor;

        impl<'de> Visitor<'de> for OutcomeVisitor {
            type Value = CheckOutcome;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("an array of location strings or a status string")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(CheckOutcome::from_description(v))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut locations = Vec::new();
                while let Some(location) = seq.next_element::<String>()? {
                    locations.push(location);
                }
                Ok(CheckOutcome::Found(locations))
            }
        }

        deserializer.deserialize_any(OutcomeVisitor)
    }
}

/// Insertion-ordered map from normalized source path to [`CheckOutcome`].
///
/// Keys are unique (one entry per file) and appear in directory-traversal
/// order. The map grows monotonically during a run and is never mutated
/// after the run completes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultMap {
    entries: Vec<(String, CheckOutcome)>,
    index: HashMap<String, usize>,
}

impl ResultMap {
    /// Create an empty result map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an outcome for a source path. A repeated key replaces the
    /// earlier outcome in place, keeping its original position.
    pub fn insert(&mut self, source: String, outcome: CheckOutcome) {
        if let Some(&position) = self.index.get(&source) {
            self.entries[position].1 = outcome;
        } else {
            self.index.insert(source.clone(), self.entries.len());
            self.entries.push((source, outcome));
        }
    }

    /// Look up the outcome recorded for a source path.
    pub fn get(&self, source: &str) -> Option<&CheckOutcome> {
        self.index.get(source).map(|&i| &self.entries[i].1)
    }

    /// Whether an outcome has been recorded for this source path.
    pub fn contains_key(&self, source: &str) -> bool {
        self.index.contains_key(source)
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entries have been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion (traversal) order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CheckOutcome)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Serialize for ResultMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (source, outcome) in &self.entries {
            map.serialize_entry(source, outcome)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ResultMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ResultMapVisitor;

        impl<'de> Visitor<'de> for ResultMapVisitor {
            type Value = ResultMap;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a map of source path to outcome")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut results = ResultMap::new();
                while let Some((source, outcome)) =
                    access.next_entry::<String, CheckOutcome>()?
                {
                    results.insert(source, outcome);
                }
                Ok(results)
            }
        }

        deserializer.deserialize_map(ResultMapVisitor)
    }
}

/// Event emitted during a batch run
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Progress update, integer percent 0-100, non-decreasing within a run
    Progress {
        /// Percent complete
        percent: u8,
    },

    /// Free-text status for human display, possibly multi-line
    Status {
        /// Status text
        message: String,
    },

    /// A non-fatal per-file or export failure
    Error {
        /// Error text
        message: String,
    },
}

/// Batch run state machine position
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// No run started
    Idle,
    /// Pre-count pass in progress
    Counting,
    /// Per-file processing in progress
    Running,
    /// Traversal finished normally; results exported
    Completed,
    /// Cancellation honored at a file boundary; results not exported
    Canceled,
    /// An error outside the per-file boundary aborted the run
    FatalError,
}

/// Final report of one batch run: terminal state, everything recorded, and
/// the export files written (empty unless the run completed with an export
/// mode selected).
#[derive(Debug)]
pub struct RunReport {
    /// Terminal state of the run
    pub state: RunState,
    /// Per-file outcomes in traversal order
    pub results: ResultMap,
    /// Paths of export files written
    pub exports: Vec<PathBuf>,
}

/// Processed/total accounting for one run.
///
/// The total comes from the dedicated pre-count pass; both passes apply the
/// identical ignore policy, so the counter lands exactly on the total for an
/// uncanceled run.
#[derive(Clone, Copy, Debug)]
pub struct ProgressState {
    processed: u64,
    total: u64,
}

impl ProgressState {
    /// Start tracking a run of `total` files.
    pub fn new(total: u64) -> Self {
        Self {
            processed: 0,
            total,
        }
    }

    /// Record one processed file and return the new percent value.
    pub fn advance(&mut self) -> u8 {
        self.processed += 1;
        self.percent()
    }

    /// Current percent, floored at 1 once any file has been processed so a
    /// progress bar shows movement even on large batches.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let percent = self.processed * 100 / self.total;
        if self.processed > 0 && percent == 0 {
            1
        } else {
            percent.min(100) as u8
        }
    }

    /// Files processed so far.
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Total files the run will process.
    pub fn total(&self) -> u64 {
        self.total
    }
}
