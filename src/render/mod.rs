mod text;

use serde::Serialize;

use crate::clock::format_time_of_day;
use crate::memory::MemoryMap;
use crate::metrics::{Color, Progress};
use crate::snapshot::{MemorySummary, Utilization};

pub use text::TextTarget;

/// Logical chart names owned by the reconciler's widget registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartName {
    ResourceUtilization,
    StatusDistribution,
    SlaCompliance,
}

impl ChartName {
    pub const ALL: [ChartName; 3] = [
        ChartName::ResourceUtilization,
        ChartName::StatusDistribution,
        ChartName::SlaCompliance,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ChartName::ResourceUtilization => "resource-utilization",
            ChartName::StatusDistribution => "status-distribution",
            ChartName::SlaCompliance => "sla-compliance",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ChartName::ResourceUtilization => "Resource utilization",
            ChartName::StatusDistribution => "Cloudlet status",
            ChartName::SlaCompliance => "SLA compliance",
        }
    }

    pub fn kind(self) -> ChartKind {
        match self {
            ChartName::ResourceUtilization => ChartKind::Bar,
            ChartName::StatusDistribution => ChartKind::Doughnut,
            ChartName::SlaCompliance => ChartKind::Pie,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Doughnut,
    Pie,
}

impl ChartKind {
    pub fn label(self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Doughnut => "doughnut",
            ChartKind::Pie => "pie",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Dataset {
    pub label: String,
    pub values: Vec<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SeriesData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

/// Opaque identity of a live chart instance, minted by the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct WidgetHandle(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    Vms,
    Cloudlets,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Entity {
    Vm,
    Cloudlet,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Complete,
    Delete,
}

/// A row affordance with the row's identifier captured at render time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RowAction {
    pub kind: ActionKind,
    pub entity: Entity,
    pub id: String,
}

impl RowAction {
    pub fn label(&self) -> &'static str {
        match self.kind {
            ActionKind::Complete => "Complete",
            ActionKind::Delete => "Delete",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Row {
    pub key: String,
    pub cells: Vec<String>,
    pub progress: Option<Progress>,
    pub highlight: bool,
    pub actions: Vec<RowAction>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Table {
    pub kind: TableKind,
    pub headers: Vec<&'static str>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn row(&self, key: &str) -> Option<&Row> {
        self.rows.iter().find(|row| row.key == key)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MemoryPanel {
    pub summary: MemorySummary,
    pub map: MemoryMap,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct UtilizationPanel {
    pub utilization: Utilization,
    pub band: Color,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum AmbientKind {
    AutoScalingBanner,
    ScalingStatus,
    CooldownReadout,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Ambient {
    AutoScalingBanner {
        enabled: bool,
    },
    ScalingStatus {
        label: String,
        active: bool,
    },
    CooldownReadout {
        adaptive_cooldown: f64,
        next_possible_scale: f64,
    },
}

impl Ambient {
    pub fn kind(&self) -> AmbientKind {
        match self {
            Ambient::AutoScalingBanner { .. } => AmbientKind::AutoScalingBanner,
            Ambient::ScalingStatus { .. } => AmbientKind::ScalingStatus,
            Ambient::CooldownReadout { .. } => AmbientKind::CooldownReadout,
        }
    }

    pub fn text(&self) -> String {
        match self {
            Ambient::AutoScalingBanner { enabled } => format!(
                "Auto-Scaling: {}",
                if *enabled { "Enabled" } else { "Disabled" }
            ),
            Ambient::ScalingStatus { label, .. } => format!("Scaling: {}", label),
            Ambient::CooldownReadout {
                adaptive_cooldown,
                next_possible_scale,
            } => format!(
                "Scaling Cooldown: {:.1}s | Next Allowed Scale Time: {}",
                adaptive_cooldown,
                format_time_of_day(*next_possible_scale)
            ),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
}

/// Transient, dismissible message shown after a user command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

/// Capabilities the engine needs from a rendering toolkit.
///
/// Charts are long-lived: `create_series` is called once per chart name and
/// every later update goes through `update_series` on the returned handle.
/// Tables, panels and ambient elements are replaced wholesale.
pub trait RenderTarget {
    fn create_series(&mut self, name: ChartName, data: &SeriesData) -> WidgetHandle;
    fn update_series(&mut self, handle: WidgetHandle, data: &SeriesData);
    fn replace_table(&mut self, table: Table);
    fn replace_memory_panel(&mut self, panel: MemoryPanel);
    fn replace_utilization_panel(&mut self, panel: UtilizationPanel);
    fn remove_ambient(&mut self, kind: AmbientKind);
    fn insert_ambient(&mut self, element: Ambient);
    fn show_notification(&mut self, notification: &Notification);
    fn dismiss_notification(&mut self);
}
