use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::error::{Error, Result};
use crate::models::{ActionReply, AlgorithmReply, CloudletSpec, CreateReply, RawSnapshot, VmSpec};
use crate::transport::{ClusterApi, Feed, FeedEvent};

pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::MissingEndpoint);
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.client.get(self.url(path)).send()?;
        decode(response)
    }

    fn post<T: DeserializeOwned>(&self, path: &str, body: &serde_json::Value) -> Result<T> {
        let response = self.client.post(self.url(path)).json(body).send()?;
        decode(response)
    }

    fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.client.delete(self.url(path)).send()?;
        decode(response)
    }
}

// Replies carry their own status field, so a 404 or 400 body is still a
// reply. Only an undecodable body is a transport failure.
fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.text()?;
    serde_json::from_str(&body).map_err(|err| {
        Error::Transport(format!(
            "unexpected response (HTTP {}): {}",
            status.as_u16(),
            err
        ))
    })
}

fn path_segment(id: &str) -> String {
    id.chars()
        .map(|ch| match ch {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' | '.' | '~' => ch.to_string(),
            _ => {
                let mut buf = [0u8; 4];
                ch.encode_utf8(&mut buf)
                    .bytes()
                    .map(|byte| format!("%{:02X}", byte))
                    .collect()
            }
        })
        .collect()
}

impl ClusterApi for HttpApi {
    fn fetch_snapshot(&mut self) -> Result<RawSnapshot> {
        self.get("/api/metrics")
    }

    fn create_vm(&mut self, spec: &VmSpec) -> Result<CreateReply> {
        self.post("/api/vms", &spec.to_wire()?)
    }

    fn delete_vm(&mut self, id: &str) -> Result<ActionReply> {
        self.delete(&format!("/api/vms/{}", path_segment(id)))
    }

    fn create_cloudlet(&mut self, spec: &CloudletSpec) -> Result<CreateReply> {
        self.post("/api/cloudlets", &spec.to_wire()?)
    }

    fn delete_cloudlet(&mut self, id: &str) -> Result<ActionReply> {
        self.delete(&format!("/api/cloudlets/{}", path_segment(id)))
    }

    fn complete_cloudlet(&mut self, id: &str) -> Result<ActionReply> {
        self.post("/api/cloudlets/complete", &json!({ "cloudlet_id": id }))
    }

    fn get_algorithm(&mut self) -> Result<String> {
        let reply: AlgorithmReply = self.get("/api/algorithm")?;
        Ok(reply.current_algorithm)
    }

    fn set_algorithm(&mut self, name: &str) -> Result<ActionReply> {
        self.post("/api/algorithm", &json!({ "algorithm": name }))
    }
}

/// Stands in for the push channel by pulling `/api/metrics` on an interval.
pub struct PollingFeed {
    api: HttpApi,
    interval: Duration,
    polled: u64,
}

impl PollingFeed {
    pub fn new(api: HttpApi, interval: Duration) -> Self {
        Self {
            api,
            interval,
            polled: 0,
        }
    }
}

impl Feed for PollingFeed {
    fn next_event(&mut self) -> Result<Option<FeedEvent>> {
        if self.polled > 0 {
            std::thread::sleep(self.interval);
        }
        self.polled += 1;
        let snapshot = self.api.fetch_snapshot()?;
        tracing::debug!(poll = self.polled, url = self.api.base_url(), "snapshot pulled");
        Ok(Some(FeedEvent::Snapshot(snapshot)))
    }
}
