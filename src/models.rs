use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

// Wire shapes as pushed by the cluster server. Every field is optional and a
// field of the wrong type reads as absent, so one bad value never costs the
// rest of the snapshot. The normalizer in `snapshot` turns these into total
// values.

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct RawSnapshot {
    #[serde(default, deserialize_with = "lenient")]
    pub utilization: Option<RawUtilization>,
    #[serde(default, deserialize_with = "lenient")]
    pub memory: Option<RawMemory>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub vms: Option<Vec<RawVm>>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub cloudlets: Option<Vec<RawCloudlet>>,
    #[serde(default, deserialize_with = "lenient")]
    pub scaling_status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub scaling: Option<RawScaling>,
    #[serde(default, deserialize_with = "lenient")]
    pub auto_scaling: Option<bool>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct RawUtilization {
    #[serde(default, deserialize_with = "lenient")]
    pub cpu: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub ram: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub storage: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub average: Option<f64>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct RawMemory {
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_pages: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub free_pages: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub fragmentation: Option<f64>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct RawScaling {
    #[serde(default, deserialize_with = "lenient")]
    pub adaptive_cooldown: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub next_possible_scale: Option<f64>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct RawVm {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub cpu_capacity: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub ram_capacity: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub storage_capacity: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub bandwidth_capacity: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub gpu_capacity: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub cpu_used: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub ram_used: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub storage_used: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub bandwidth_used: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub gpu_used: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct RawCloudlet {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub cpu: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub ram: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub storage: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub bandwidth: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub gpu: Option<f64>,
    #[serde(default, deserialize_with = "lenient_integer")]
    pub sla_priority: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub deadline: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub execution_time: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub start_time: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub completion_time: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub vm_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub time_critical: Option<bool>,
}


fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(value) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(err) => {
            tracing::debug!(error = %err, "ignoring mistyped snapshot field");
            Ok(None)
        }
    }
}

// Keeps every well-formed element; an element that is not an object is
// skipped on its own.
fn lenient_list<'de, D, T>(deserializer: D) -> std::result::Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => return Ok(None),
        other => {
            tracing::debug!(value = %other, "ignoring non-list snapshot field");
            return Ok(None);
        }
    };
    let parsed = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                tracing::debug!(error = %err, "skipping malformed snapshot entry");
                None
            }
        })
        .collect();
    Ok(Some(parsed))
}

/// Whole numbers, also when sent as floats (`1000.0`).
fn lenient_integer<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let number = match Value::deserialize(deserializer)? {
        Value::Number(number) => number,
        _ => return Ok(None),
    };
    if let Some(value) = number.as_i64() {
        return Ok(Some(value));
    }
    if number.is_u64() {
        return Ok(Some(i64::MAX));
    }
    Ok(number
        .as_f64()
        .filter(|value| value.is_finite() && value.fract() == 0.0)
        .map(|value| value as i64))
}

/// Non-negative whole numbers; anything else reads as absent.
fn lenient_count<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let number = match Value::deserialize(deserializer)? {
        Value::Number(number) => number,
        _ => return Ok(None),
    };
    if let Some(value) = number.as_u64() {
        return Ok(Some(value));
    }
    Ok(number
        .as_f64()
        .filter(|value| value.is_finite() && *value >= 0.0 && value.fract() == 0.0)
        .map(|value| value as u64))
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CreateReply {
    Success {
        #[serde(alias = "vm_id", alias = "cloudlet_id")]
        id: String,
    },
    Error {
        #[serde(default)]
        error: String,
    },
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionReply {
    Success,
    NotFound,
    Error {
        #[serde(default, alias = "message")]
        error: String,
    },
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct AlgorithmReply {
    pub current_algorithm: String,
}

/// Unit a RAM or storage quantity was entered in. The server always receives
/// gigabytes.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SizeUnit {
    Mb,
    #[default]
    Gb,
}

impl SizeUnit {
    pub fn label(self) -> &'static str {
        match self {
            SizeUnit::Mb => "MB",
            SizeUnit::Gb => "GB",
        }
    }

    pub fn to_gb(self, quantity: u64) -> f64 {
        match self {
            SizeUnit::Mb => quantity as f64 / 1024.0,
            SizeUnit::Gb => quantity as f64,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct VmSpec {
    pub cpu: u32,
    pub ram: u64,
    pub storage: u64,
    #[serde(default = "default_vm_bandwidth")]
    pub bandwidth: u64,
    #[serde(default)]
    pub gpu: u32,
    #[serde(skip)]
    pub ram_unit: SizeUnit,
    #[serde(skip)]
    pub storage_unit: SizeUnit,
}

impl VmSpec {
    pub fn preset(name: &str) -> Result<Self> {
        let (cpu, ram, storage, bandwidth, gpu) = match name {
            "small" => (2, 4, 40, 500, 0),
            "medium" => (4, 8, 100, 1000, 1),
            "large" => (8, 16, 200, 2000, 2),
            _ => {
                return Err(Error::UnknownPreset {
                    kind: "vm",
                    name: name.to_string(),
                })
            }
        };
        Ok(Self {
            cpu,
            ram,
            storage,
            bandwidth,
            gpu,
            ram_unit: SizeUnit::Gb,
            storage_unit: SizeUnit::Gb,
        })
    }

    pub fn validate(&self) -> Result<()> {
        positive("cpu", self.cpu as f64)?;
        positive("ram", self.ram as f64)?;
        positive("storage", self.storage as f64)?;
        positive("bandwidth", self.bandwidth as f64)
    }

    /// Request body with RAM and storage converted to gigabytes.
    pub fn to_wire(&self) -> Result<Value> {
        wire_body(self, self.ram_unit.to_gb(self.ram), self.storage_unit.to_gb(self.storage))
    }
}

impl Default for VmSpec {
    fn default() -> Self {
        Self {
            cpu: 2,
            ram: 4,
            storage: 40,
            bandwidth: default_vm_bandwidth(),
            gpu: 0,
            ram_unit: SizeUnit::Gb,
            storage_unit: SizeUnit::Gb,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct CloudletSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub cpu: u32,
    pub ram: u64,
    pub storage: u64,
    #[serde(default = "default_cloudlet_bandwidth")]
    pub bandwidth: u64,
    #[serde(default)]
    pub gpu: u32,
    #[serde(skip)]
    pub ram_unit: SizeUnit,
    #[serde(skip)]
    pub storage_unit: SizeUnit,
    #[serde(default = "default_sla_priority")]
    pub sla_priority: u32,
    #[serde(default = "default_deadline")]
    pub deadline: f64,
    #[serde(default = "default_execution_time")]
    pub execution_time: f64,
}

impl CloudletSpec {
    pub fn preset(name: &str) -> Result<Self> {
        let (cpu, ram, storage, bandwidth, gpu, sla_priority, deadline) = match name {
            "light" => (1, 2, 5, 100, 0, 2, 60.0),
            "moderate" => (2, 4, 10, 200, 0, 2, 90.0),
            "heavy" => (4, 8, 20, 500, 1, 3, 120.0),
            _ => {
                return Err(Error::UnknownPreset {
                    kind: "cloudlet",
                    name: name.to_string(),
                })
            }
        };
        Ok(Self {
            name: None,
            cpu,
            ram,
            storage,
            bandwidth,
            gpu,
            ram_unit: SizeUnit::Gb,
            storage_unit: SizeUnit::Gb,
            sla_priority,
            deadline,
            execution_time: default_execution_time(),
        })
    }

    /// Checks run before anything is sent upstream.
    pub fn validate(&self) -> Result<()> {
        positive("cpu", self.cpu as f64)?;
        positive("ram", self.ram as f64)?;
        positive("storage", self.storage as f64)?;
        positive("deadline", self.deadline)?;
        positive("execution_time", self.execution_time)?;
        if self.execution_time > self.deadline {
            return Err(Error::ExecutionExceedsDeadline {
                execution_time: self.execution_time,
                deadline: self.deadline,
            });
        }
        Ok(())
    }

    pub fn to_wire(&self) -> Result<Value> {
        wire_body(self, self.ram_unit.to_gb(self.ram), self.storage_unit.to_gb(self.storage))
    }
}

fn wire_body<T: Serialize>(spec: &T, ram_gb: f64, storage_gb: f64) -> Result<Value> {
    let mut body = serde_json::to_value(spec)?;
    if let Value::Object(fields) = &mut body {
        fields.insert("ram".to_string(), Value::from(ram_gb));
        fields.insert("storage".to_string(), Value::from(storage_gb));
    }
    Ok(body)
}

impl Default for CloudletSpec {
    fn default() -> Self {
        Self {
            name: None,
            cpu: 1,
            ram: 2,
            storage: 5,
            bandwidth: default_cloudlet_bandwidth(),
            gpu: 0,
            ram_unit: SizeUnit::Gb,
            storage_unit: SizeUnit::Gb,
            sla_priority: default_sla_priority(),
            deadline: default_deadline(),
            execution_time: default_execution_time(),
        }
    }
}

fn positive(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::NonPositiveResource { field, value })
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Human,
    Summary,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            OutputFormat::Human => "human",
            OutputFormat::Summary => "summary",
            OutputFormat::Json => "json",
        };
        write!(f, "{}", label)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DashConfig {
    pub endpoint: Option<String>,
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
    pub format: OutputFormat,
    pub assume_yes: bool,
    pub log_filter: Option<String>,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            poll_interval_ms: 2000,
            request_timeout_ms: 5000,
            format: OutputFormat::Human,
            assume_yes: false,
            log_filter: None,
        }
    }
}

pub const DEFAULT_SLA_PRIORITY: u32 = 2;
pub const DEFAULT_DEADLINE_SECS: f64 = 60.0;
pub const DEFAULT_EXECUTION_SECS: f64 = 30.0;

fn default_vm_bandwidth() -> u64 {
    1000
}

fn default_cloudlet_bandwidth() -> u64 {
    100
}

fn default_sla_priority() -> u32 {
    DEFAULT_SLA_PRIORITY
}

fn default_deadline() -> f64 {
    DEFAULT_DEADLINE_SECS
}

fn default_execution_time() -> f64 {
    DEFAULT_EXECUTION_SECS
}
