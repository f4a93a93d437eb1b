mod http;
mod replay;

use crate::error::{Error, Result};
use crate::models::{ActionReply, CloudletSpec, CreateReply, RawSnapshot, VmSpec};

pub use http::{HttpApi, PollingFeed};
pub use replay::{ReplayFeed, ReplayRecord};

/// Request/response operations offered by the cluster server.
///
/// `Err` means no usable response came back; a response carrying an
/// `error` or `not_found` status is an `Ok` reply.
pub trait ClusterApi {
    fn fetch_snapshot(&mut self) -> Result<RawSnapshot>;
    fn create_vm(&mut self, spec: &VmSpec) -> Result<CreateReply>;
    fn delete_vm(&mut self, id: &str) -> Result<ActionReply>;
    fn create_cloudlet(&mut self, spec: &CloudletSpec) -> Result<CreateReply>;
    fn delete_cloudlet(&mut self, id: &str) -> Result<ActionReply>;
    fn complete_cloudlet(&mut self, id: &str) -> Result<ActionReply>;
    fn get_algorithm(&mut self) -> Result<String>;
    fn set_algorithm(&mut self, name: &str) -> Result<ActionReply>;
}

#[derive(Clone, Debug, PartialEq)]
pub enum FeedEvent {
    Snapshot(RawSnapshot),
    Log(String),
}

/// Ordered stream of pushed updates. `Ok(None)` ends the stream; an `Err`
/// covers one failed delivery and the feed may be polled again.
pub trait Feed {
    fn next_event(&mut self) -> Result<Option<FeedEvent>>;
}

/// Stand-in used when no endpoint is configured, e.g. while replaying a
/// recording. Every request fails as a transport error.
#[derive(Clone, Copy, Debug, Default)]
pub struct Offline;

impl Offline {
    fn unavailable<T>() -> Result<T> {
        Err(Error::Transport("no cluster endpoint configured".to_string()))
    }
}

impl ClusterApi for Offline {
    fn fetch_snapshot(&mut self) -> Result<RawSnapshot> {
        Self::unavailable()
    }

    fn create_vm(&mut self, _spec: &VmSpec) -> Result<CreateReply> {
        Self::unavailable()
    }

    fn delete_vm(&mut self, _id: &str) -> Result<ActionReply> {
        Self::unavailable()
    }

    fn create_cloudlet(&mut self, _spec: &CloudletSpec) -> Result<CreateReply> {
        Self::unavailable()
    }

    fn delete_cloudlet(&mut self, _id: &str) -> Result<ActionReply> {
        Self::unavailable()
    }

    fn complete_cloudlet(&mut self, _id: &str) -> Result<ActionReply> {
        Self::unavailable()
    }

    fn get_algorithm(&mut self) -> Result<String> {
        Self::unavailable()
    }

    fn set_algorithm(&mut self, _name: &str) -> Result<ActionReply> {
        Self::unavailable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_api_fails_every_request() {
        let mut api = Offline;
        let err = api.fetch_snapshot().unwrap_err();
        assert_eq!(err.to_string(), "request failed: no cluster endpoint configured");
        assert!(api.delete_vm("vm-1").is_err());
        assert!(api.get_algorithm().is_err());
    }
}
