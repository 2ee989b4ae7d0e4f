use std::collections::VecDeque;
use wheel_shared::document::{HistoryEntry, HISTORY_CAPACITY};

/// Recent spin results, newest first. Independent of the option list.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore from a persisted list (already newest first).
    pub fn from_entries(entries: Vec<HistoryEntry>) -> Self {
        let mut entries: VecDeque<HistoryEntry> = entries.into();
        entries.truncate(HISTORY_CAPACITY);
        Self { entries }
    }

    /// Record a winner stamped with the local wall-clock time.
    pub fn record(&mut self, item: &str) {
        let time = chrono::Local::now().format("%H:%M:%S").to_string();
        self.push(HistoryEntry {
            item: item.to_string(),
            time,
        });
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(HISTORY_CAPACITY);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    pub fn to_vec(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(item: &str) -> HistoryEntry {
        HistoryEntry {
            item: item.to_string(),
            time: "00:00:00".to_string(),
        }
    }

    #[test]
    fn newest_first() {
        let mut history = History::new();
        history.push(entry("A"));
        history.push(entry("B"));
        assert_eq!(history.latest().unwrap().item, "B");
        assert_eq!(history.to_vec()[1].item, "A");
    }

    #[test]
    fn capped_at_ten_dropping_oldest() {
        let mut history = History::new();
        for i in 0..15 {
            history.push(entry(&i.to_string()));
        }
        assert_eq!(history.len(), HISTORY_CAPACITY);
        let items: Vec<String> = history.to_vec().into_iter().map(|e| e.item).collect();
        assert_eq!(items.first().unwrap(), "14");
        assert_eq!(items.last().unwrap(), "5");
    }

    #[test]
    fn record_stamps_time() {
        let mut history = History::new();
        history.record("Pizza");
        let latest = history.latest().unwrap();
        assert_eq!(latest.item, "Pizza");
        assert_eq!(latest.time.len(), 8);
        assert_eq!(latest.time.matches(':').count(), 2);
    }

    #[test]
    fn from_entries_truncates() {
        let entries: Vec<HistoryEntry> = (0..12).map(|i| entry(&i.to_string())).collect();
        let history = History::from_entries(entries);
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.latest().unwrap().item, "0");
    }
}
