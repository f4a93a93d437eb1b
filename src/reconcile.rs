//! Reconciles a derived view into a render target.
//!
//! Charts are created once and mutated in place afterwards; tables, panels
//! and ambient elements are replaced on every update.

use std::collections::BTreeMap;

use crate::metrics::DerivedView;
use crate::render::{
    ActionKind, Ambient, AmbientKind, ChartName, Dataset, Entity, MemoryPanel, RenderTarget, Row,
    RowAction, SeriesData, Table, TableKind, UtilizationPanel, WidgetHandle,
};
use crate::snapshot::{short_id, CloudletStatus, Resource, ScalingStatus, Snapshot};

#[derive(Debug, Default)]
pub struct ViewReconciler {
    registry: BTreeMap<ChartName, WidgetHandle>,
}

impl ViewReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self, name: ChartName) -> Option<WidgetHandle> {
        self.registry.get(&name).copied()
    }

    pub fn apply(
        &mut self,
        snapshot: &Snapshot,
        view: &DerivedView,
        target: &mut dyn RenderTarget,
    ) {
        self.upsert(ChartName::ResourceUtilization, resource_series(view), target);
        self.upsert(ChartName::StatusDistribution, status_series(view), target);
        self.upsert(ChartName::SlaCompliance, sla_series(view), target);

        target.replace_utilization_panel(UtilizationPanel {
            utilization: view.utilization,
            band: view.average_band,
        });
        target.replace_memory_panel(MemoryPanel {
            summary: view.memory,
            map: view.memory_map.clone(),
        });
        target.replace_table(vm_table(snapshot));
        target.replace_table(cloudlet_table(snapshot, view));

        target.remove_ambient(AmbientKind::AutoScalingBanner);
        target.insert_ambient(Ambient::AutoScalingBanner {
            enabled: view.auto_scaling,
        });
        target.remove_ambient(AmbientKind::ScalingStatus);
        target.insert_ambient(Ambient::ScalingStatus {
            label: view.scaling_status.label().to_string(),
            active: view.scaling_status != ScalingStatus::Disabled,
        });
        target.remove_ambient(AmbientKind::CooldownReadout);
        if let Some(scaling) = view.scaling {
            target.insert_ambient(Ambient::CooldownReadout {
                adaptive_cooldown: scaling.adaptive_cooldown,
                next_possible_scale: scaling.next_possible_scale,
            });
        }
    }

    fn upsert(&mut self, name: ChartName, data: SeriesData, target: &mut dyn RenderTarget) {
        match self.registry.get(&name) {
            Some(handle) => target.update_series(*handle, &data),
            None => {
                let handle = target.create_series(name, &data);
                tracing::debug!(chart = name.key(), handle = handle.0, "chart created");
                self.registry.insert(name, handle);
            }
        }
    }
}

fn resource_series(view: &DerivedView) -> SeriesData {
    SeriesData {
        labels: view.vms.iter().map(|vm| vm.label.clone()).collect(),
        datasets: Resource::ALL
            .iter()
            .map(|resource| Dataset {
                label: format!("{} %", resource.label()),
                values: view.vms.iter().map(|vm| vm.get(*resource)).collect(),
            })
            .collect(),
    }
}

fn status_series(view: &DerivedView) -> SeriesData {
    let (labels, values): (Vec<String>, Vec<f64>) = view
        .status_counts
        .iter()
        .map(|(status, count)| (status.label().to_string(), count as f64))
        .unzip();
    SeriesData {
        labels,
        datasets: vec![Dataset {
            label: "Cloudlets".to_string(),
            values,
        }],
    }
}

fn sla_series(view: &DerivedView) -> SeriesData {
    SeriesData {
        labels: vec!["SLA Met".to_string(), "SLA Missed".to_string()],
        datasets: vec![Dataset {
            label: "Completed cloudlets".to_string(),
            values: vec![view.sla.met as f64, view.sla.missed as f64],
        }],
    }
}

fn action(kind: ActionKind, entity: Entity, id: &str) -> RowAction {
    RowAction {
        kind,
        entity,
        id: id.to_string(),
    }
}

fn vm_table(snapshot: &Snapshot) -> Table {
    let rows = snapshot
        .vms
        .iter()
        .map(|vm| {
            let capacity = vm.capacity;
            let actions = if vm.id.is_empty() {
                Vec::new()
            } else {
                vec![action(ActionKind::Delete, Entity::Vm, &vm.id)]
            };
            Row {
                key: vm.id.clone(),
                cells: vec![
                    short_id(&vm.id).to_string(),
                    capacity.cpu.to_string(),
                    capacity.ram.to_string(),
                    capacity.storage.to_string(),
                    format!("{} Mbps", capacity.bandwidth),
                    capacity.gpu.to_string(),
                    vm.status.to_lowercase(),
                ],
                progress: None,
                highlight: false,
                actions,
            }
        })
        .collect();

    Table {
        kind: TableKind::Vms,
        headers: vec!["ID", "CPU", "RAM", "Storage", "Bandwidth", "GPU", "Status"],
        rows,
    }
}

fn cloudlet_table(snapshot: &Snapshot, view: &DerivedView) -> Table {
    let rows = snapshot
        .cloudlets
        .iter()
        .zip(view.cloudlets.iter())
        .map(|(cloudlet, derived)| {
            let mut actions = Vec::new();
            if !cloudlet.id.is_empty() {
                if cloudlet.status == CloudletStatus::Active {
                    actions.push(action(ActionKind::Complete, Entity::Cloudlet, &cloudlet.id));
                }
                actions.push(action(ActionKind::Delete, Entity::Cloudlet, &cloudlet.id));
            }
            let demand = cloudlet.demand;
            Row {
                key: cloudlet.id.clone(),
                cells: vec![
                    format!("{} ({})", cloudlet.name, short_id(&cloudlet.id)),
                    demand.cpu.to_string(),
                    demand.ram.to_string(),
                    demand.storage.to_string(),
                    format!("{} Mbps", demand.bandwidth),
                    demand.gpu.to_string(),
                    cloudlet.status.label().to_string(),
                ],
                progress: Some(derived.progress),
                highlight: cloudlet.time_critical && cloudlet.status != CloudletStatus::Completed,
                actions,
            }
        })
        .collect();

    Table {
        kind: TableKind::Cloudlets,
        headers: vec![
            "Name", "CPU", "RAM", "Storage", "Bandwidth", "GPU", "Status", "Progress",
        ],
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::derive;
    use crate::models::{RawCloudlet, RawSnapshot, RawVm};
    use crate::render::{MemoryPanel, Notification, TextTarget};
    use crate::snapshot::normalize;

    #[derive(Default)]
    struct RecordingTarget {
        created: Vec<ChartName>,
        updated: Vec<WidgetHandle>,
        tables: Vec<Table>,
        ambient: Vec<Ambient>,
        removed: Vec<AmbientKind>,
    }

    impl RenderTarget for RecordingTarget {
        fn create_series(&mut self, name: ChartName, _data: &SeriesData) -> WidgetHandle {
            self.created.push(name);
            WidgetHandle(self.created.len() as u64)
        }

        fn update_series(&mut self, handle: WidgetHandle, _data: &SeriesData) {
            self.updated.push(handle);
        }

        fn replace_table(&mut self, table: Table) {
            self.tables.push(table);
        }

        fn replace_memory_panel(&mut self, _panel: MemoryPanel) {}

        fn replace_utilization_panel(&mut self, _panel: UtilizationPanel) {}

        fn remove_ambient(&mut self, kind: AmbientKind) {
            self.removed.push(kind);
            self.ambient.retain(|element| element.kind() != kind);
        }

        fn insert_ambient(&mut self, element: Ambient) {
            self.ambient.push(element);
        }

        fn show_notification(&mut self, _notification: &Notification) {}

        fn dismiss_notification(&mut self) {}
    }

    fn snapshot() -> Snapshot {
        normalize(RawSnapshot {
            vms: Some(vec![RawVm {
                id: Some("vm-0000-abcd".to_string()),
                cpu_capacity: Some(4.0),
                cpu_used: Some(2.0),
                status: Some("RUNNING".to_string()),
                ..RawVm::default()
            }]),
            cloudlets: Some(vec![
                RawCloudlet {
                    id: Some("cl-active".to_string()),
                    status: Some("ACTIVE".to_string()),
                    start_time: Some(90.0),
                    time_critical: Some(true),
                    ..RawCloudlet::default()
                },
                RawCloudlet {
                    id: Some("cl-done".to_string()),
                    status: Some("COMPLETED".to_string()),
                    completion_time: Some(10.0),
                    time_critical: Some(true),
                    ..RawCloudlet::default()
                },
            ]),
            auto_scaling: Some(true),
            ..RawSnapshot::default()
        })
    }

    #[test]
    fn charts_are_constructed_once() {
        let snapshot = snapshot();
        let mut reconciler = ViewReconciler::new();
        let mut target = RecordingTarget::default();

        reconciler.apply(&snapshot, &derive(&snapshot, 100.0), &mut target);
        let first = reconciler.handle(ChartName::ResourceUtilization);
        reconciler.apply(&snapshot, &derive(&snapshot, 101.0), &mut target);
        reconciler.apply(&snapshot, &derive(&snapshot, 102.0), &mut target);

        assert_eq!(target.created, ChartName::ALL.to_vec());
        assert_eq!(target.updated.len(), 6);
        assert_eq!(reconciler.handle(ChartName::ResourceUtilization), first);
        assert!(target.updated.contains(&first.unwrap()));
    }

    #[test]
    fn rows_bind_actions_to_their_own_ids() {
        let snapshot = snapshot();
        let mut reconciler = ViewReconciler::new();
        let mut target = RecordingTarget::default();
        reconciler.apply(&snapshot, &derive(&snapshot, 100.0), &mut target);

        let vms = target.tables.iter().find(|t| t.kind == TableKind::Vms).unwrap();
        let vm_row = vms.row("vm-0000-abcd").unwrap();
        assert_eq!(vm_row.cells[0], "vm-0000-");
        assert_eq!(vm_row.cells[4], "0 Mbps");
        assert_eq!(vm_row.cells[6], "running");
        assert_eq!(vm_row.actions, vec![action(ActionKind::Delete, Entity::Vm, "vm-0000-abcd")]);

        let cloudlets = target
            .tables
            .iter()
            .find(|t| t.kind == TableKind::Cloudlets)
            .unwrap();
        let active = cloudlets.row("cl-active").unwrap();
        assert_eq!(
            active.actions,
            vec![
                action(ActionKind::Complete, Entity::Cloudlet, "cl-active"),
                action(ActionKind::Delete, Entity::Cloudlet, "cl-active"),
            ]
        );
        assert!(active.highlight);

        let done = cloudlets.row("cl-done").unwrap();
        assert_eq!(
            done.actions,
            vec![action(ActionKind::Delete, Entity::Cloudlet, "cl-done")]
        );
        assert!(!done.highlight);
        assert_eq!(done.progress.unwrap().percent, 100.0);
    }

    #[test]
    fn ambient_elements_are_reinserted_not_duplicated() {
        let snapshot = snapshot();
        let mut reconciler = ViewReconciler::new();
        let mut target = RecordingTarget::default();
        for now in [100.0, 101.0] {
            reconciler.apply(&snapshot, &derive(&snapshot, now), &mut target);
        }
        assert_eq!(target.ambient.len(), 2);
        assert_eq!(target.removed.len(), 6);
        assert!(target
            .ambient
            .contains(&Ambient::AutoScalingBanner { enabled: true }));
    }

    #[test]
    fn rows_without_ids_have_no_actions() {
        let snapshot = normalize(RawSnapshot {
            vms: Some(vec![RawVm::default()]),
            ..RawSnapshot::default()
        });
        let mut target = RecordingTarget::default();
        ViewReconciler::new().apply(&snapshot, &derive(&snapshot, 0.0), &mut target);
        let vms = target.tables.iter().find(|t| t.kind == TableKind::Vms).unwrap();
        assert!(vms.rows[0].actions.is_empty());
    }

    #[test]
    fn text_target_keeps_same_chart_instance() {
        let snapshot = snapshot();
        let mut reconciler = ViewReconciler::new();
        let mut target = TextTarget::new();
        reconciler.apply(&snapshot, &derive(&snapshot, 100.0), &mut target);
        reconciler.apply(&snapshot, &derive(&snapshot, 105.0), &mut target);

        assert_eq!(target.constructed(), 3);
        let handle = reconciler.handle(ChartName::ResourceUtilization).unwrap();
        let widget = target.chart(handle).unwrap();
        assert_eq!(widget.redraws, 1);
        assert_eq!(widget.data.labels, vec!["VM-abcd".to_string()]);
        assert_eq!(widget.data.datasets[0].values, vec![50.0]);
    }
}
