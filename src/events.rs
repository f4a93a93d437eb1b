use std::collections::VecDeque;

use crate::commands::{Command, CommandOutcome};
use crate::models::RawSnapshot;
use crate::transport::FeedEvent;

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Snapshot(RawSnapshot),
    Log(String),
    Command(Command),
    Redraw,
    DismissNotification,
}

impl From<FeedEvent> for Event {
    fn from(event: FeedEvent) -> Self {
        match event {
            FeedEvent::Snapshot(snapshot) => Event::Snapshot(snapshot),
            FeedEvent::Log(message) => Event::Log(message),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Dispatched {
    Rendered,
    Logged,
    Dismissed,
    Command(CommandOutcome),
}

/// Strict FIFO of pending events: no reordering, no coalescing. A stale
/// snapshot queued after a newer one still wins.
#[derive(Debug, Default)]
pub struct Dispatcher {
    queue: VecDeque<ScheduledEvent>,
    next_seq: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScheduledEvent {
    pub seq: u64,
    pub event: Event,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push_back(ScheduledEvent { seq, event });
        seq
    }

    pub fn pop(&mut self) -> Option<ScheduledEvent> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_come_out_in_push_order() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.push(Event::Log("a".to_string()));
        dispatcher.push(Event::Redraw);
        dispatcher.push(Event::Log("b".to_string()));

        let order: Vec<u64> = std::iter::from_fn(|| dispatcher.pop())
            .map(|scheduled| scheduled.seq)
            .collect();
        assert_eq!(order, vec![0, 1, 2]);
        assert!(dispatcher.is_empty());
    }

    #[test]
    fn feed_events_convert() {
        assert_eq!(
            Event::from(FeedEvent::Log("scaled".to_string())),
            Event::Log("scaled".to_string())
        );
    }
}
