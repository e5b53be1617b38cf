use oxigraph::model::Term;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, SystemTime};

/// Timing record for one constraint execution.
#[derive(Debug, Clone)]
pub struct StatisticsEntry {
    pub label: String,
    /// The executed query text, followed by a dump of the bindings for templates.
    pub query: String,
    pub duration: Duration,
    pub started: SystemTime,
    /// The focus node if there was one, else the constraint or template.
    pub context: Term,
}

/// Collector for execution statistics. Callers test [`is_recording`] before
/// building entries.
///
/// [`is_recording`]: StatisticsSink::is_recording
pub trait StatisticsSink: Send + Sync {
    fn is_recording(&self) -> bool;
    fn add(&self, entries: Vec<StatisticsEntry>);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStatistics;

impl StatisticsSink for NullStatistics {
    fn is_recording(&self) -> bool {
        false
    }

    fn add(&self, _entries: Vec<StatisticsEntry>) {}
}

/// Keeps entries in memory while recording is switched on.
#[derive(Debug, Default)]
pub struct StatisticsCollector {
    recording: AtomicBool,
    entries: Mutex<Vec<StatisticsEntry>>,
}

impl StatisticsCollector {
    pub fn new(recording: bool) -> Self {
        StatisticsCollector {
            recording: AtomicBool::new(recording),
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn set_recording(&self, recording: bool) {
        self.recording.store(recording, Ordering::Relaxed);
    }

    pub fn entries(&self) -> Vec<StatisticsEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Total time spent across all recorded executions.
    pub fn total_duration(&self) -> Duration {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|entry| entry.duration)
            .sum()
    }
}

impl StatisticsSink for StatisticsCollector {
    fn is_recording(&self) -> bool {
        self.recording.load(Ordering::Relaxed)
    }

    fn add(&self, entries: Vec<StatisticsEntry>) {
        if !self.is_recording() {
            return;
        }
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(entries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxigraph::model::NamedNode;

    fn entry(millis: u64) -> StatisticsEntry {
        StatisticsEntry {
            label: "test".to_string(),
            query: "SELECT * WHERE {}".to_string(),
            duration: Duration::from_millis(millis),
            started: SystemTime::now(),
            context: NamedNode::new_unchecked("http://example.com/ns#c").into(),
        }
    }

    #[test]
    fn collector_ignores_entries_when_not_recording() {
        let collector = StatisticsCollector::new(false);
        collector.add(vec![entry(5)]);
        assert!(collector.entries().is_empty());

        collector.set_recording(true);
        collector.add(vec![entry(5), entry(7)]);
        assert_eq!(collector.entries().len(), 2);
        assert_eq!(collector.total_duration(), Duration::from_millis(12));
    }
}
