use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::RawSnapshot;
use crate::transport::{Feed, FeedEvent};

/// One line of a recorded session, named after the push-channel events.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReplayRecord {
    MetricsUpdate {
        #[serde(default)]
        data: RawSnapshot,
    },
    SystemLog {
        log: String,
    },
}

impl From<ReplayRecord> for FeedEvent {
    fn from(record: ReplayRecord) -> Self {
        match record {
            ReplayRecord::MetricsUpdate { data } => FeedEvent::Snapshot(data),
            ReplayRecord::SystemLog { log } => FeedEvent::Log(log),
        }
    }
}

/// Replays a JSON-lines recording in file order.
pub struct ReplayFeed {
    lines: Box<dyn BufRead>,
    line_no: usize,
}

impl ReplayFeed {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|err| {
            Error::ConfigIo(format!(
                "failed to read recording '{}': {}",
                path.display(),
                err
            ))
        })?;
        Ok(Self::from_reader(BufReader::new(file)))
    }

    pub fn from_reader(reader: impl BufRead + 'static) -> Self {
        Self {
            lines: Box::new(reader),
            line_no: 0,
        }
    }
}

impl Feed for ReplayFeed {
    fn next_event(&mut self) -> Result<Option<FeedEvent>> {
        loop {
            let mut line = String::new();
            let read = self
                .lines
                .read_line(&mut line)
                .map_err(|err| Error::Transport(err.to_string()))?;
            if read == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let record: ReplayRecord =
                serde_json::from_str(trimmed).map_err(|err| Error::RecordParse {
                    line: self.line_no,
                    message: err.to_string(),
                })?;
            return Ok(Some(record.into()));
        }
    }
}
