//! Derived view computation.
//!
//! Everything here is recomputed from a normalized snapshot and the local
//! clock on every redraw; nothing is persisted between updates.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::memory::{bin_pages, MemoryMap};
use crate::snapshot::{
    id_tail, CloudletStatus, CloudletView, MemorySummary, Resource, ScalingInfo, ScalingStatus,
    Snapshot, Utilization, VmView,
};

pub const BAND_AMBER_AT: f64 = 50.0;
pub const BAND_RED_AT: f64 = 80.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Green,
    Amber,
    Red,
    Gray,
}

impl Color {
    pub fn label(self) -> &'static str {
        match self {
            Color::Green => "green",
            Color::Amber => "amber",
            Color::Red => "red",
            Color::Gray => "gray",
        }
    }
}

/// `used / capacity` as a percentage in `[0, 100]`; zero when undefined.
pub fn utilization_pct(used: f64, capacity: f64) -> f64 {
    if !used.is_finite() || !capacity.is_finite() || capacity <= 0.0 {
        return 0.0;
    }
    let pct = used / capacity * 100.0;
    if pct.is_finite() {
        pct.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

pub fn average_band(average: f64) -> Color {
    if !average.is_finite() || average < BAND_AMBER_AT {
        Color::Green
    } else if average < BAND_RED_AT {
        Color::Amber
    } else {
        Color::Red
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Progress {
    pub percent: f64,
    pub time_remaining_secs: Option<f64>,
    pub color: Color,
}

impl Progress {
    pub fn complete() -> Self {
        Self {
            percent: 100.0,
            time_remaining_secs: None,
            color: Color::Green,
        }
    }

    pub fn idle() -> Self {
        Self {
            percent: 0.0,
            time_remaining_secs: None,
            color: Color::Gray,
        }
    }
}

pub fn progress(cloudlet: &CloudletView, now: f64) -> Progress {
    match cloudlet.status {
        CloudletStatus::Completed | CloudletStatus::Failed => Progress::complete(),
        CloudletStatus::Waiting | CloudletStatus::Pending => Progress::idle(),
        CloudletStatus::Active => active_progress(
            cloudlet.start_time,
            cloudlet.execution_time,
            cloudlet.sla_priority,
            now,
        ),
    }
}

fn active_progress(
    start_time: Option<f64>,
    execution_time: f64,
    priority: u32,
    now: f64,
) -> Progress {
    let elapsed = match start_time {
        Some(start) if now.is_finite() => (now - start).max(0.0),
        _ => 0.0,
    };
    let percent = (elapsed / execution_time * 100.0).min(100.0);
    let time_remaining = (execution_time - elapsed).max(0.0);
    let time_pct = (execution_time - elapsed) / execution_time * 100.0;

    Progress {
        percent,
        time_remaining_secs: Some(time_remaining),
        color: severity(time_pct, priority),
    }
}

/// Progress bar color from the share of expected run time left and the SLA
/// priority.
pub fn severity(time_pct: f64, priority: u32) -> Color {
    if time_pct < 20.0 {
        if priority >= 3 {
            Color::Red
        } else {
            Color::Amber
        }
    } else if time_pct < 50.0 {
        if priority >= 2 {
            Color::Amber
        } else {
            Color::Green
        }
    } else {
        Color::Green
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatusCounts {
    counts: [u64; 5],
}

impl StatusCounts {
    pub fn from_cloudlets(cloudlets: &[CloudletView]) -> Self {
        let mut counts = [0u64; 5];
        for cloudlet in cloudlets {
            counts[cloudlet.status.index()] += 1;
        }
        Self { counts }
    }

    pub fn get(&self, status: CloudletStatus) -> u64 {
        self.counts[status.index()]
    }

    /// Always all five statuses, in `CloudletStatus::ALL` order.
    pub fn iter(&self) -> impl Iterator<Item = (CloudletStatus, u64)> + '_ {
        CloudletStatus::ALL
            .iter()
            .map(move |status| (*status, self.counts[status.index()]))
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

impl Serialize for StatusCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counts.len()))?;
        for (status, count) in self.iter() {
            map.serialize_entry(status.label(), &count)?;
        }
        map.end()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SlaCompliance {
    pub met: u64,
    pub missed: u64,
}

impl SlaCompliance {
    pub fn from_cloudlets(cloudlets: &[CloudletView]) -> Self {
        let mut compliance = SlaCompliance::default();
        for cloudlet in cloudlets {
            if cloudlet.status != CloudletStatus::Completed {
                continue;
            }
            match cloudlet.completion_time {
                Some(done) if done <= cloudlet.deadline => compliance.met += 1,
                _ => compliance.missed += 1,
            }
        }
        compliance
    }

    pub fn met_ratio(&self) -> Option<f64> {
        let total = self.met + self.missed;
        if total == 0 {
            None
        } else {
            Some(self.met as f64 / total as f64 * 100.0)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VmUtilization {
    pub id: String,
    pub label: String,
    /// Indexed by `Resource::ALL`.
    pub percent: [f64; 5],
}

impl VmUtilization {
    pub fn from_vm(vm: &VmView) -> Self {
        let mut percent = [0.0; 5];
        for (idx, resource) in Resource::ALL.iter().enumerate() {
            percent[idx] = utilization_pct(vm.used.get(*resource), vm.capacity.get(*resource));
        }
        Self {
            id: vm.id.clone(),
            label: format!("VM-{}", id_tail(&vm.id)),
            percent,
        }
    }

    pub fn get(&self, resource: Resource) -> f64 {
        let idx = Resource::ALL
            .iter()
            .position(|candidate| *candidate == resource)
            .unwrap_or(0);
        self.percent[idx]
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CloudletProgress {
    pub id: String,
    pub status: CloudletStatus,
    pub progress: Progress,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DerivedView {
    pub computed_at: f64,
    pub utilization: Utilization,
    pub average_band: Color,
    pub memory: MemorySummary,
    pub memory_map: MemoryMap,
    pub vms: Vec<VmUtilization>,
    pub cloudlets: Vec<CloudletProgress>,
    pub status_counts: StatusCounts,
    pub sla: SlaCompliance,
    pub scaling_status: ScalingStatus,
    pub scaling: Option<ScalingInfo>,
    pub auto_scaling: bool,
}

pub fn derive(snapshot: &Snapshot, now: f64) -> DerivedView {
    DerivedView {
        computed_at: now,
        utilization: snapshot.utilization,
        average_band: average_band(snapshot.utilization.average),
        memory: snapshot.memory,
        memory_map: bin_pages(snapshot.memory.total_pages, snapshot.memory.free_pages),
        vms: snapshot.vms.iter().map(VmUtilization::from_vm).collect(),
        cloudlets: snapshot
            .cloudlets
            .iter()
            .map(|cloudlet| CloudletProgress {
                id: cloudlet.id.clone(),
                status: cloudlet.status,
                progress: progress(cloudlet, now),
            })
            .collect(),
        status_counts: StatusCounts::from_cloudlets(&snapshot.cloudlets),
        sla: SlaCompliance::from_cloudlets(&snapshot.cloudlets),
        scaling_status: snapshot.scaling_status.clone(),
        scaling: snapshot.scaling,
        auto_scaling: snapshot.auto_scaling,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawCloudlet, RawSnapshot, RawVm};
    use crate::snapshot::{normalize, Resources};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn cloudlet(status: CloudletStatus) -> CloudletView {
        CloudletView {
            id: "c-1".to_string(),
            name: "job".to_string(),
            status,
            demand: Resources::default(),
            sla_priority: 2,
            deadline: 60.0,
            execution_time: 30.0,
            start_time: None,
            completion_time: None,
            vm_id: None,
            time_critical: false,
        }
    }

    fn approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 0.05,
            "expected {} to be close to {}",
            actual,
            expected
        );
    }

    #[test]
    fn utilization_handles_zero_capacity() {
        assert_eq!(utilization_pct(5.0, 0.0), 0.0);
        assert_eq!(utilization_pct(0.0, 0.0), 0.0);
        assert_eq!(utilization_pct(f64::NAN, 4.0), 0.0);
        assert_eq!(utilization_pct(2.0, 4.0), 50.0);
        assert_eq!(utilization_pct(8.0, 4.0), 100.0);
        assert_eq!(utilization_pct(-1.0, 4.0), 0.0);
    }

    #[test]
    fn average_band_thresholds() {
        assert_eq!(average_band(49.9), Color::Green);
        assert_eq!(average_band(50.0), Color::Amber);
        assert_eq!(average_band(79.9), Color::Amber);
        assert_eq!(average_band(80.0), Color::Red);
    }

    #[test]
    fn active_cloudlet_near_deadline_is_red_for_high_priority() {
        let mut active = cloudlet(CloudletStatus::Active);
        active.start_time = Some(975.0);
        active.sla_priority = 3;
        let progress = progress(&active, 1000.0);
        approx(progress.percent, 83.3);
        approx(progress.time_remaining_secs.unwrap(), 5.0);
        assert_eq!(progress.color, Color::Red);
    }

    #[test]
    fn severity_table() {
        assert_eq!(severity(10.0, 3), Color::Red);
        assert_eq!(severity(10.0, 2), Color::Amber);
        assert_eq!(severity(10.0, 1), Color::Amber);
        assert_eq!(severity(30.0, 2), Color::Amber);
        assert_eq!(severity(30.0, 1), Color::Green);
        assert_eq!(severity(50.0, 3), Color::Green);
    }

    #[test]
    fn overrun_caps_progress_and_remaining() {
        let mut active = cloudlet(CloudletStatus::Active);
        active.start_time = Some(0.0);
        let progress = progress(&active, 500.0);
        assert_eq!(progress.percent, 100.0);
        assert_eq!(progress.time_remaining_secs, Some(0.0));
        assert_eq!(progress.color, Color::Amber);
    }

    #[test]
    fn start_time_in_future_counts_as_not_started() {
        let mut active = cloudlet(CloudletStatus::Active);
        active.start_time = Some(2000.0);
        let progress = progress(&active, 1000.0);
        assert_eq!(progress.percent, 0.0);
        assert_eq!(progress.time_remaining_secs, Some(30.0));
        assert_eq!(progress.color, Color::Green);
    }

    #[test]
    fn terminal_and_queued_bars() {
        assert_eq!(progress(&cloudlet(CloudletStatus::Failed), 0.0), Progress::complete());
        assert_eq!(
            progress(&cloudlet(CloudletStatus::Completed), 0.0),
            Progress::complete()
        );
        assert_eq!(progress(&cloudlet(CloudletStatus::Pending), 0.0), Progress::idle());
        assert_eq!(progress(&cloudlet(CloudletStatus::Waiting), 0.0), Progress::idle());
    }

    #[test]
    fn progress_is_monotonic_in_clock() {
        let mut active = cloudlet(CloudletStatus::Active);
        active.start_time = Some(100.0);
        let mut last = -1.0;
        for step in 0..100 {
            let current = progress(&active, 90.0 + step as f64).percent;
            assert!(current >= last);
            last = current;
        }
    }

    #[test]
    fn sla_counts_only_completed() {
        let mut met = cloudlet(CloudletStatus::Completed);
        met.completion_time = Some(20.0);
        let mut missed = cloudlet(CloudletStatus::Completed);
        missed.completion_time = Some(90.0);
        let unknown = cloudlet(CloudletStatus::Completed);
        let mut failed = cloudlet(CloudletStatus::Failed);
        failed.completion_time = Some(1.0);
        let sla = SlaCompliance::from_cloudlets(&[met, missed, unknown, failed]);
        assert_eq!(sla, SlaCompliance { met: 1, missed: 2 });
    }

    #[test]
    fn status_counts_report_all_five() {
        let counts = StatusCounts::from_cloudlets(&[
            cloudlet(CloudletStatus::Active),
            cloudlet(CloudletStatus::Active),
            cloudlet(CloudletStatus::Failed),
        ]);
        let pairs: Vec<(CloudletStatus, u64)> = counts.iter().collect();
        assert_eq!(
            pairs,
            vec![
                (CloudletStatus::Waiting, 0),
                (CloudletStatus::Pending, 0),
                (CloudletStatus::Active, 2),
                (CloudletStatus::Completed, 0),
                (CloudletStatus::Failed, 1),
            ]
        );
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn vm_labels_use_id_tail() {
        let vm = VmUtilization::from_vm(&VmView {
            id: "abcdef-1234".to_string(),
            capacity: Resources {
                cpu: 4.0,
                ..Resources::default()
            },
            used: Resources {
                cpu: 1.0,
                gpu: 3.0,
                ..Resources::default()
            },
            status: "RUNNING".to_string(),
        });
        assert_eq!(vm.label, "VM-1234");
        assert_eq!(vm.get(Resource::Cpu), 25.0);
        assert_eq!(vm.get(Resource::Gpu), 0.0);
    }

    fn random_option(rng: &mut StdRng) -> Option<f64> {
        match rng.gen_range(0..4) {
            0 => None,
            1 => Some(0.0),
            _ => Some(rng.gen_range(-10.0..500.0)),
        }
    }

    #[test]
    fn random_snapshots_keep_view_invariants() {
        let mut rng = StdRng::seed_from_u64(42);
        let statuses = ["WAITING", "PENDING", "ACTIVE", "COMPLETED", "FAILED", "bogus"];
        for _ in 0..300 {
            let vms = (0..rng.gen_range(0..6))
                .map(|idx| RawVm {
                    id: Some(format!("vm-{}", idx)),
                    cpu_capacity: random_option(&mut rng),
                    cpu_used: random_option(&mut rng),
                    ram_capacity: random_option(&mut rng),
                    ram_used: random_option(&mut rng),
                    gpu_capacity: random_option(&mut rng),
                    gpu_used: random_option(&mut rng),
                    ..RawVm::default()
                })
                .collect();
            let cloudlets = (0..rng.gen_range(0..12))
                .map(|idx| RawCloudlet {
                    id: Some(format!("cl-{}", idx)),
                    status: Some(statuses[rng.gen_range(0..statuses.len())].to_string()),
                    deadline: random_option(&mut rng),
                    execution_time: random_option(&mut rng),
                    start_time: random_option(&mut rng),
                    completion_time: random_option(&mut rng),
                    ..RawCloudlet::default()
                })
                .collect();
            let snapshot = normalize(RawSnapshot {
                vms: Some(vms),
                cloudlets: Some(cloudlets),
                ..RawSnapshot::default()
            });
            let view = derive(&snapshot, rng.gen_range(0.0..1000.0));

            for vm in &view.vms {
                for pct in vm.percent {
                    assert!((0.0..=100.0).contains(&pct));
                }
            }
            for cloudlet in &view.cloudlets {
                let pct = cloudlet.progress.percent;
                assert!((0.0..=100.0).contains(&pct));
            }
            assert_eq!(
                view.sla.met + view.sla.missed,
                view.status_counts.get(CloudletStatus::Completed)
            );
            assert_eq!(view.status_counts.total(), snapshot.cloudlets.len() as u64);
        }
    }
}
