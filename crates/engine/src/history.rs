//! Events and the chronological history of a propagation run.
//!
//! The history interleaves events and collected errors in the exact order
//! they happened. It is cleared at the start of every run and never
//! persisted.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::EngineError;

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    LaunchedBuild,
    PerformedBuild,
    LaunchedUpdate,
    PerformedUpdate,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Something the engine did to a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub kind: EventKind,
    /// Identifier of the resource being built or updated.
    pub target: String,
    /// Description returned by the callback, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Event {
    pub fn new(kind: EventKind, target: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            detail: None,
        }
    }

    /// Append `detail` to the message. Empty details are dropped.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        if !detail.is_empty() {
            self.detail = Some(detail);
        }
        self
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (action, outcome) = match self.kind {
            EventKind::LaunchedBuild => ("build", "launched"),
            EventKind::PerformedBuild => ("build", "performed"),
            EventKind::LaunchedUpdate => ("update", "launched"),
            EventKind::PerformedUpdate => ("update", "performed"),
        };
        write!(f, "{action} of '{}' {outcome}", self.target)?;
        if let Some(detail) = &self.detail {
            write!(f, " -> {detail}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// Either half of the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Record {
    Event(Event),
    Error(EngineError),
}

impl Record {
    pub fn as_error(&self) -> Option<&EngineError> {
        match self {
            Self::Error(error) => Some(error),
            Self::Event(_) => None,
        }
    }

    /// Kind name, e.g. `LaunchedUpdate` or `NotPerformedBuild`.
    pub fn name(&self) -> String {
        match self {
            Self::Event(event) => event.kind.to_string(),
            Self::Error(error) => error.kind().to_string(),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Event(event) => fmt::Display::fmt(event, f),
            Self::Error(error) => fmt::Display::fmt(error, f),
        }
    }
}

/// A timestamped history record.
#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    pub recorded_at: DateTime<Utc>,
    pub record: Record,
}

/// Append-only log of a single run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct History {
    entries: Vec<Entry>,
    #[serde(skip)]
    error_count: usize,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_event(&mut self, event: Event) {
        self.push(Record::Event(event));
    }

    pub fn push_error(&mut self, error: EngineError) {
        self.error_count += 1;
        self.push(Record::Error(error));
    }

    fn push(&mut self, record: Record) {
        self.entries.push(Entry {
            recorded_at: Utc::now(),
            record,
        });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.error_count = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.entries.iter().map(|entry| &entry.record)
    }

    /// Records appended after the first `start` ones.
    pub fn records_from(&self, start: usize) -> impl Iterator<Item = &Record> {
        self.entries
            .get(start..)
            .unwrap_or_default()
            .iter()
            .map(|entry| &entry.record)
    }

    /// Events only, in order.
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.records().filter_map(|record| match record {
            Record::Event(event) => Some(event),
            Record::Error(_) => None,
        })
    }

    /// Errors only, in order.
    pub fn errors(&self) -> impl Iterator<Item = &EngineError> {
        self.records().filter_map(Record::as_error)
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }
}
