use std::collections::VecDeque;

use crate::clock::format_time_of_day;

pub const LOG_CAPACITY: usize = 50;

/// Operator-visible event log, newest entry first.
#[derive(Clone, Debug)]
pub struct EventLog {
    entries: VecDeque<String>,
    capacity: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self::with_capacity(LOG_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn append(&mut self, at: f64, message: &str) {
        self.entries
            .push_front(format!("[{}] {}", format_time_of_day(at), message));
        self.entries.truncate(self.capacity);
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn latest(&self) -> Option<&str> {
        self.entries.front().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_entry_is_first() {
        let mut log = EventLog::new();
        log.append(0.0, "first");
        log.append(1.0, "second");
        assert_eq!(log.render(), "[00:00:01] second\n[00:00:00] first");
        assert_eq!(log.latest(), Some("[00:00:01] second"));
    }

    #[test]
    fn overflow_evicts_oldest() {
        let mut log = EventLog::new();
        for idx in 0..60 {
            log.append(idx as f64, &format!("event {}", idx));
        }
        assert_eq!(log.len(), LOG_CAPACITY);
        let entries: Vec<&str> = log.entries().collect();
        assert!(entries[0].ends_with("event 59"));
        assert!(entries[LOG_CAPACITY - 1].ends_with("event 10"));
    }

    #[test]
    fn empty_log_renders_empty_text() {
        let log = EventLog::new();
        assert!(log.is_empty());
        assert_eq!(log.render(), "");
    }
}
