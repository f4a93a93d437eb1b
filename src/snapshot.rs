//! Snapshot normalization.
//!
//! Upstream snapshots arrive partially populated, especially before the first
//! real update. `normalize` is the single place where absence is resolved, so
//! everything downstream works on total values.

use serde::Serialize;

use crate::models::{
    RawCloudlet, RawMemory, RawScaling, RawSnapshot, RawUtilization, RawVm,
    DEFAULT_DEADLINE_SECS, DEFAULT_EXECUTION_SECS, DEFAULT_SLA_PRIORITY,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Resource {
    Cpu,
    Ram,
    Storage,
    Bandwidth,
    Gpu,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Cpu,
        Resource::Ram,
        Resource::Storage,
        Resource::Bandwidth,
        Resource::Gpu,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Resource::Cpu => "CPU",
            Resource::Ram => "RAM",
            Resource::Storage => "Storage",
            Resource::Bandwidth => "Bandwidth",
            Resource::Gpu => "GPU",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Resources {
    pub cpu: f64,
    pub ram: f64,
    pub storage: f64,
    pub bandwidth: f64,
    pub gpu: f64,
}

impl Resources {
    pub fn get(&self, resource: Resource) -> f64 {
        match resource {
            Resource::Cpu => self.cpu,
            Resource::Ram => self.ram,
            Resource::Storage => self.storage,
            Resource::Bandwidth => self.bandwidth,
            Resource::Gpu => self.gpu,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CloudletStatus {
    Waiting,
    Pending,
    Active,
    Completed,
    Failed,
}

impl CloudletStatus {
    pub const ALL: [CloudletStatus; 5] = [
        CloudletStatus::Waiting,
        CloudletStatus::Pending,
        CloudletStatus::Active,
        CloudletStatus::Completed,
        CloudletStatus::Failed,
    ];

    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "WAITING" => Some(CloudletStatus::Waiting),
            "PENDING" => Some(CloudletStatus::Pending),
            "ACTIVE" => Some(CloudletStatus::Active),
            "COMPLETED" => Some(CloudletStatus::Completed),
            "FAILED" => Some(CloudletStatus::Failed),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CloudletStatus::Waiting => "WAITING",
            CloudletStatus::Pending => "PENDING",
            CloudletStatus::Active => "ACTIVE",
            CloudletStatus::Completed => "COMPLETED",
            CloudletStatus::Failed => "FAILED",
        }
    }

    pub fn index(self) -> usize {
        match self {
            CloudletStatus::Waiting => 0,
            CloudletStatus::Pending => 1,
            CloudletStatus::Active => 2,
            CloudletStatus::Completed => 3,
            CloudletStatus::Failed => 4,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CloudletStatus::Completed | CloudletStatus::Failed)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ScalingStatus {
    Disabled,
    Active(String),
}

impl ScalingStatus {
    pub fn label(&self) -> &str {
        match self {
            ScalingStatus::Disabled => "Disabled",
            ScalingStatus::Active(label) => label,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Utilization {
    pub cpu: f64,
    pub ram: f64,
    pub storage: f64,
    pub average: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct MemorySummary {
    pub total_pages: u64,
    pub free_pages: u64,
    pub fragmentation: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ScalingInfo {
    pub adaptive_cooldown: f64,
    pub next_possible_scale: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VmView {
    pub id: String,
    pub capacity: Resources,
    pub used: Resources,
    pub status: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CloudletView {
    pub id: String,
    pub name: String,
    pub status: CloudletStatus,
    pub demand: Resources,
    pub sla_priority: u32,
    pub deadline: f64,
    pub execution_time: f64,
    pub start_time: Option<f64>,
    pub completion_time: Option<f64>,
    pub vm_id: Option<String>,
    pub time_critical: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    pub utilization: Utilization,
    pub memory: MemorySummary,
    pub vms: Vec<VmView>,
    pub cloudlets: Vec<CloudletView>,
    pub scaling_status: ScalingStatus,
    pub scaling: Option<ScalingInfo>,
    pub auto_scaling: bool,
}

impl Default for Snapshot {
    fn default() -> Self {
        normalize(RawSnapshot::default())
    }
}

pub fn normalize(raw: RawSnapshot) -> Snapshot {
    Snapshot {
        utilization: normalize_utilization(raw.utilization),
        memory: normalize_memory(raw.memory),
        vms: raw
            .vms
            .unwrap_or_default()
            .into_iter()
            .map(normalize_vm)
            .collect(),
        cloudlets: raw
            .cloudlets
            .unwrap_or_default()
            .into_iter()
            .map(normalize_cloudlet)
            .collect(),
        scaling_status: normalize_scaling_status(raw.scaling_status),
        scaling: raw.scaling.map(normalize_scaling),
        auto_scaling: raw.auto_scaling.unwrap_or(false),
    }
}

fn finite_or(value: Option<f64>, default: f64) -> f64 {
    match value {
        Some(value) if value.is_finite() => value,
        _ => default,
    }
}

fn normalize_utilization(raw: Option<RawUtilization>) -> Utilization {
    let raw = raw.unwrap_or_default();
    Utilization {
        cpu: finite_or(raw.cpu, 0.0),
        ram: finite_or(raw.ram, 0.0),
        storage: finite_or(raw.storage, 0.0),
        average: finite_or(raw.average, 0.0),
    }
}

fn normalize_memory(raw: Option<RawMemory>) -> MemorySummary {
    let raw = raw.unwrap_or_default();
    let total_pages = raw.total_pages.unwrap_or(0);
    MemorySummary {
        total_pages,
        free_pages: raw.free_pages.unwrap_or(0).min(total_pages),
        fragmentation: finite_or(raw.fragmentation, 0.0),
    }
}

fn normalize_scaling_status(raw: Option<String>) -> ScalingStatus {
    match raw.as_deref().map(str::trim) {
        Some(label) if !label.is_empty() && !label.eq_ignore_ascii_case("disabled") => {
            ScalingStatus::Active(label.to_string())
        }
        _ => ScalingStatus::Disabled,
    }
}

fn normalize_scaling(raw: RawScaling) -> ScalingInfo {
    ScalingInfo {
        adaptive_cooldown: finite_or(raw.adaptive_cooldown, 0.0),
        next_possible_scale: finite_or(raw.next_possible_scale, 0.0),
    }
}

fn normalize_vm(raw: RawVm) -> VmView {
    VmView {
        id: raw.id.unwrap_or_default(),
        capacity: Resources {
            cpu: finite_or(raw.cpu_capacity, 0.0),
            ram: finite_or(raw.ram_capacity, 0.0),
            storage: finite_or(raw.storage_capacity, 0.0),
            bandwidth: finite_or(raw.bandwidth_capacity, 0.0),
            gpu: finite_or(raw.gpu_capacity, 0.0),
        },
        used: Resources {
            cpu: finite_or(raw.cpu_used, 0.0),
            ram: finite_or(raw.ram_used, 0.0),
            storage: finite_or(raw.storage_used, 0.0),
            bandwidth: finite_or(raw.bandwidth_used, 0.0),
            gpu: finite_or(raw.gpu_used, 0.0),
        },
        status: raw.status.unwrap_or_default(),
    }
}

fn normalize_cloudlet(raw: RawCloudlet) -> CloudletView {
    let id = raw.id.unwrap_or_default();
    let name = match raw.name {
        Some(name) if !name.trim().is_empty() => name,
        _ => format!("Cloudlet-{}", short_id(&id)),
    };
    let status = match raw.status.as_deref().map(CloudletStatus::parse) {
        Some(Some(status)) => status,
        Some(None) => {
            tracing::debug!(
                cloudlet = %id,
                status = ?raw.status,
                "unknown cloudlet status, treating as waiting"
            );
            CloudletStatus::Waiting
        }
        None => CloudletStatus::Waiting,
    };
    let execution_time = match raw.execution_time {
        Some(value) if value.is_finite() && value > 0.0 => value,
        _ => DEFAULT_EXECUTION_SECS,
    };
    let sla_priority = match raw.sla_priority {
        Some(value) if value > 0 => u32::try_from(value).unwrap_or(u32::MAX),
        _ => DEFAULT_SLA_PRIORITY,
    };

    CloudletView {
        id,
        name,
        status,
        demand: Resources {
            cpu: finite_or(raw.cpu, 0.0),
            ram: finite_or(raw.ram, 0.0),
            storage: finite_or(raw.storage, 0.0),
            bandwidth: finite_or(raw.bandwidth, 0.0),
            gpu: finite_or(raw.gpu, 0.0),
        },
        sla_priority,
        deadline: finite_or(raw.deadline, DEFAULT_DEADLINE_SECS),
        execution_time,
        start_time: raw.start_time.filter(|value| value.is_finite()),
        completion_time: raw.completion_time.filter(|value| value.is_finite()),
        vm_id: raw.vm_id.filter(|value| !value.is_empty()),
        time_critical: raw.time_critical.unwrap_or(false),
    }
}

/// First eight characters of an id, on a char boundary.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// Last four characters of an id, used for chart labels.
pub fn id_tail(id: &str) -> &str {
    let count = id.chars().count();
    if count <= 4 {
        return id;
    }
    match id.char_indices().nth(count - 4) {
        Some((idx, _)) => &id[idx..],
        None => id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snapshot_normalizes_to_defaults() {
        let snapshot = normalize(RawSnapshot::default());
        assert_eq!(snapshot.utilization.average, 0.0);
        assert!(snapshot.vms.is_empty());
        assert!(snapshot.cloudlets.is_empty());
        assert_eq!(snapshot.memory, MemorySummary::default());
        assert_eq!(snapshot.scaling_status, ScalingStatus::Disabled);
        assert!(snapshot.scaling.is_none());
        assert!(!snapshot.auto_scaling);
    }

    #[test]
    fn partial_utilization_fills_missing_fields() {
        let raw = RawSnapshot {
            utilization: Some(RawUtilization {
                cpu: Some(42.0),
                ..RawUtilization::default()
            }),
            ..RawSnapshot::default()
        };
        let snapshot = normalize(raw);
        assert_eq!(snapshot.utilization.cpu, 42.0);
        assert_eq!(snapshot.utilization.average, 0.0);
    }

    #[test]
    fn free_pages_clamped_to_total() {
        let raw = RawSnapshot {
            memory: Some(RawMemory {
                total_pages: Some(10),
                free_pages: Some(25),
                fragmentation: None,
            }),
            ..RawSnapshot::default()
        };
        let memory = normalize(raw).memory;
        assert_eq!(memory.total_pages, 10);
        assert_eq!(memory.free_pages, 10);
        assert_eq!(memory.fragmentation, 0.0);
    }

    #[test]
    fn cloudlet_defaults_are_applied() {
        let raw = RawSnapshot {
            cloudlets: Some(vec![RawCloudlet {
                id: Some("0123456789abcdef".to_string()),
                status: Some("running-somewhere".to_string()),
                execution_time: Some(0.0),
                ..RawCloudlet::default()
            }]),
            ..RawSnapshot::default()
        };
        let cloudlet = &normalize(raw).cloudlets[0];
        assert_eq!(cloudlet.name, "Cloudlet-01234567");
        assert_eq!(cloudlet.status, CloudletStatus::Waiting);
        assert_eq!(cloudlet.sla_priority, 2);
        assert_eq!(cloudlet.execution_time, 30.0);
        assert_eq!(cloudlet.deadline, 60.0);
        assert!(!cloudlet.time_critical);
    }

    #[test]
    fn out_of_range_priority_falls_back_to_default() {
        let raw: RawSnapshot = serde_json::from_str(
            r#"{"cloudlets": [{"id": "a", "sla_priority": -1}, {"id": "b", "sla_priority": 7.0}]}"#,
        )
        .unwrap();
        let snapshot = normalize(raw);
        assert_eq!(snapshot.cloudlets[0].sla_priority, 2);
        assert_eq!(snapshot.cloudlets[1].sla_priority, 7);
    }

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!(CloudletStatus::parse("active"), Some(CloudletStatus::Active));
        assert_eq!(CloudletStatus::parse(" Completed "), Some(CloudletStatus::Completed));
        assert_eq!(CloudletStatus::parse("done"), None);
    }

    #[test]
    fn scaling_status_distinguishes_disabled() {
        let active = RawSnapshot {
            scaling_status: Some("Scaling Up".to_string()),
            ..RawSnapshot::default()
        };
        assert_eq!(
            normalize(active).scaling_status,
            ScalingStatus::Active("Scaling Up".to_string())
        );
        let disabled = RawSnapshot {
            scaling_status: Some("Disabled".to_string()),
            ..RawSnapshot::default()
        };
        assert_eq!(normalize(disabled).scaling_status, ScalingStatus::Disabled);
    }

    #[test]
    fn id_helpers_respect_length() {
        assert_eq!(short_id("abc"), "abc");
        assert_eq!(short_id("0123456789"), "01234567");
        assert_eq!(id_tail("0123456789"), "6789");
        assert_eq!(id_tail("ab"), "ab");
    }
}
