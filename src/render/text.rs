use std::collections::BTreeMap;
use std::fmt::Write;

use crate::memory::BlockState;
use crate::metrics::Progress;
use crate::render::{
    Ambient, AmbientKind, ChartName, MemoryPanel, Notification, NotificationLevel, RenderTarget,
    SeriesData, Table, TableKind, UtilizationPanel, WidgetHandle,
};

const BAR_WIDTH: usize = 20;

#[derive(Clone, Debug)]
pub struct ChartWidget {
    pub name: ChartName,
    pub data: SeriesData,
    pub redraws: u64,
}

/// Plain-text render target that keeps widget state between updates and
/// draws a complete frame on demand.
#[derive(Debug, Default)]
pub struct TextTarget {
    next_handle: u64,
    constructed: u64,
    charts: BTreeMap<WidgetHandle, ChartWidget>,
    tables: BTreeMap<TableKind, Table>,
    memory: Option<MemoryPanel>,
    utilization: Option<UtilizationPanel>,
    ambient: Vec<Ambient>,
    notification: Option<Notification>,
}

impl TextTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of chart instances ever constructed.
    pub fn constructed(&self) -> u64 {
        self.constructed
    }

    pub fn chart(&self, handle: WidgetHandle) -> Option<&ChartWidget> {
        self.charts.get(&handle)
    }

    pub fn table(&self, kind: TableKind) -> Option<&Table> {
        self.tables.get(&kind)
    }

    pub fn ambient(&self) -> &[Ambient] {
        &self.ambient
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn frame(&self) -> String {
        let mut out = String::new();

        for element in &self.ambient {
            let _ = writeln!(out, "{}", element.text());
        }

        if let Some(panel) = &self.utilization {
            let util = panel.utilization;
            let _ = writeln!(
                out,
                "Utilization: CPU {:.1}% | RAM {:.1}% | Storage {:.1}% | Average {:.1}% [{}]",
                util.cpu,
                util.ram,
                util.storage,
                util.average,
                panel.band.label()
            );
        }

        if let Some(panel) = &self.memory {
            let summary = panel.summary;
            let _ = writeln!(
                out,
                "Memory: {} pages, {} free, fragmentation {:.1}%",
                summary.total_pages, summary.free_pages, summary.fragmentation
            );
            if !panel.map.blocks.is_empty() {
                let map: String = panel
                    .map
                    .blocks
                    .iter()
                    .map(|block| block_glyph(block.state))
                    .collect();
                let _ = writeln!(out, "  {}", map);
                let _ = writeln!(out, "  (. free  # used  ~ fragmented)");
            }
        }

        for widget in self.charts.values() {
            write_chart(&mut out, widget);
        }

        for table in self.tables.values() {
            write_table(&mut out, table);
        }

        if let Some(notification) = &self.notification {
            let tag = match notification.level {
                NotificationLevel::Success => "ok",
                NotificationLevel::Error => "error",
            };
            let _ = writeln!(out, "[{}] {}", tag, notification.message);
        }

        out
    }
}

impl RenderTarget for TextTarget {
    fn create_series(&mut self, name: ChartName, data: &SeriesData) -> WidgetHandle {
        let handle = WidgetHandle(self.next_handle);
        self.next_handle += 1;
        self.constructed += 1;
        self.charts.insert(
            handle,
            ChartWidget {
                name,
                data: data.clone(),
                redraws: 0,
            },
        );
        handle
    }

    fn update_series(&mut self, handle: WidgetHandle, data: &SeriesData) {
        match self.charts.get_mut(&handle) {
            Some(widget) => {
                widget.data.labels.clone_from(&data.labels);
                widget.data.datasets.clone_from(&data.datasets);
                widget.redraws += 1;
            }
            None => tracing::warn!(handle = handle.0, "update for unknown chart handle"),
        }
    }

    fn replace_table(&mut self, table: Table) {
        self.tables.insert(table.kind, table);
    }

    fn replace_memory_panel(&mut self, panel: MemoryPanel) {
        self.memory = Some(panel);
    }

    fn replace_utilization_panel(&mut self, panel: UtilizationPanel) {
        self.utilization = Some(panel);
    }

    fn remove_ambient(&mut self, kind: AmbientKind) {
        self.ambient.retain(|element| element.kind() != kind);
    }

    fn insert_ambient(&mut self, element: Ambient) {
        self.ambient.push(element);
    }

    fn show_notification(&mut self, notification: &Notification) {
        self.notification = Some(notification.clone());
    }

    fn dismiss_notification(&mut self) {
        self.notification = None;
    }
}

fn block_glyph(state: BlockState) -> char {
    match state {
        BlockState::Free => '.',
        BlockState::Used => '#',
        BlockState::Fragmented => '~',
    }
}

fn write_chart(out: &mut String, widget: &ChartWidget) {
    let _ = writeln!(
        out,
        "{} ({})",
        widget.name.title(),
        widget.name.kind().label()
    );
    match widget.name {
        ChartName::ResourceUtilization => {
            for (idx, label) in widget.data.labels.iter().enumerate() {
                let values: Vec<String> = widget
                    .data
                    .datasets
                    .iter()
                    .map(|dataset| {
                        let value = dataset.values.get(idx).copied().unwrap_or(0.0);
                        format!("{} {:.1}", dataset.label, value)
                    })
                    .collect();
                let _ = writeln!(out, "  {}: {}", label, values.join(" | "));
            }
        }
        ChartName::StatusDistribution | ChartName::SlaCompliance => {
            let values = widget
                .data
                .datasets
                .first()
                .map(|dataset| dataset.values.as_slice())
                .unwrap_or(&[]);
            let parts: Vec<String> = widget
                .data
                .labels
                .iter()
                .enumerate()
                .map(|(idx, label)| {
                    format!("{} {}", label, values.get(idx).copied().unwrap_or(0.0))
                })
                .collect();
            let _ = writeln!(out, "  {}", parts.join(" | "));
        }
    }
}

fn write_table(out: &mut String, table: &Table) {
    let title = match table.kind {
        TableKind::Vms => "VMs",
        TableKind::Cloudlets => "Cloudlets",
    };
    let _ = writeln!(out, "{} ({})", title, table.rows.len());
    if table.rows.is_empty() {
        return;
    }
    let _ = writeln!(out, "  {}", table.headers.join(" | "));
    for row in &table.rows {
        let mut line = row.cells.join(" | ");
        if let Some(progress) = &row.progress {
            line.push_str(" | ");
            line.push_str(&progress_bar(progress));
        }
        if !row.actions.is_empty() {
            let actions: Vec<&str> = row.actions.iter().map(|action| action.label()).collect();
            line.push_str(&format!(" | [{}]", actions.join("] [")));
        }
        let marker = if row.highlight { "!" } else { " " };
        let _ = writeln!(out, " {}{}", marker, line);
    }
}

fn progress_bar(progress: &Progress) -> String {
    let filled = ((progress.percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    let mut bar = String::with_capacity(BAR_WIDTH + 24);
    bar.push('[');
    bar.push_str(&"=".repeat(filled));
    bar.push_str(&" ".repeat(BAR_WIDTH - filled));
    bar.push(']');
    let _ = write!(bar, " {:.1}% {}", progress.percent, progress.color.label());
    if let Some(remaining) = progress.time_remaining_secs {
        let _ = write!(bar, " ({:.0}s left)", remaining);
    }
    bar
}
