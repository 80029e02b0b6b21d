//! Diagnostics collected while aligning, merging and analysing.
//!
//! The algorithms only see the append-only [`ReportSink`]; the concrete
//! [`Report`] keeps counts per reason tag, conflict records and an event log
//! and renders them as a text table or JSON.

pub mod json;
pub mod text;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Append-only destination for outcome counts, conflicts and events
pub trait ReportSink {
    /// Count one occurrence of a reason tag
    fn count(&mut self, tag: &str) {
        self.count_n(tag, 1);
    }

    fn count_n(&mut self, tag: &str, n: usize);

    fn conflict(&mut self, record: ConflictRecord);

    fn event(&mut self, kind: EventKind, message: String);
}

/// Sink that drops everything, for callers that only want the result
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn count_n(&mut self, _tag: &str, _n: usize) {}
    fn conflict(&mut self, _record: ConflictRecord) {}
    fn event(&mut self, _kind: EventKind, _message: String) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Input problem that was counted and skipped
    DataQuality,
    /// Image outside a node's scope
    Ejection,
    /// Source grouping contradicting the union
    Conflict,
    /// Homonym group left unresolved
    Ambiguity,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// A source grouping that could not be placed in the union.
///
/// Names are display labels so the record outlives the taxonomies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    /// Idspace of the source taxonomy
    pub source: String,
    /// The rejected source node
    pub node: String,
    /// Union node the source node would have been attached under
    pub target: String,
    /// Child of the target only partly inside the source node
    pub conflicting_child: String,
    /// Source member falling inside the conflicting child
    pub inside: Option<String>,
    /// Union member of the conflicting child lying outside the source node
    pub outside: Option<String>,
    /// Sibling groups at the point where `inside` and `outside` part ways
    pub divergence: Option<(String, String)>,
}

/// In-memory report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
    pub title: String,
    pub counts: IndexMap<String, usize>,
    pub conflicts: Vec<ConflictRecord>,
    pub events: Vec<Event>,
}

impl Report {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Count recorded for `tag`, zero if never seen
    pub fn get(&self, tag: &str) -> usize {
        self.counts.get(tag).copied().unwrap_or(0)
    }

    pub fn events_of(&self, kind: EventKind) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(move |e| e.kind == kind)
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: Report) {
        for (tag, n) in other.counts {
            *self.counts.entry(tag).or_insert(0) += n;
        }
        self.conflicts.extend(other.conflicts);
        self.events.extend(other.events);
    }
}

impl ReportSink for Report {
    fn count_n(&mut self, tag: &str, n: usize) {
        match self.counts.get_mut(tag) {
            Some(count) => *count += n,
            None => {
                self.counts.insert(tag.to_string(), n);
            }
        }
    }

    fn conflict(&mut self, record: ConflictRecord) {
        self.conflicts.push(record);
    }

    fn event(&mut self, kind: EventKind, message: String) {
        self.events.push(Event {
            kind,
            message,
            at: Utc::now(),
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    #[value(alias = "table")]
    Text,
    Json,
}

impl Report {
    pub fn render(&self, format: Format) -> anyhow::Result<String> {
        match format {
            Format::Text => text::generate_text_report(self),
            Format::Json => json::generate_json_report(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_keep_first_seen_order() {
        let mut report = Report::new("merge");
        report.count("new");
        report.count("aligned");
        report.count_n("new", 2);

        assert_eq!(report.get("new"), 3);
        assert_eq!(report.get("aligned"), 1);
        assert_eq!(report.get("missing"), 0);
        let tags: Vec<_> = report.counts.keys().cloned().collect();
        assert_eq!(tags, vec!["new", "aligned"]);
    }

    #[test]
    fn test_merge_reports() {
        let mut a = Report::new("a");
        a.count("x");
        a.event(EventKind::Info, "hello".to_string());
        let mut b = Report::new("b");
        b.count_n("x", 4);
        b.event(EventKind::Ejection, "out".to_string());

        a.merge(b);
        assert_eq!(a.get("x"), 5);
        assert_eq!(a.events.len(), 2);
        assert_eq!(a.events_of(EventKind::Ejection).count(), 1);
    }
}
