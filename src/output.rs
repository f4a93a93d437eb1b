use std::fmt::Write;

use serde_json::json;

use crate::clock::format_time_of_day;
use crate::commands::CommandOutcome;
use crate::error::Result;
use crate::render::TextTarget;
use crate::snapshot::CloudletStatus;
use crate::Engine;

pub trait Formatter {
    /// One rendered frame after a snapshot or redraw. Empty when nothing has
    /// been rendered yet.
    fn frame(&self, engine: &Engine<TextTarget>) -> Result<String>;
    fn outcome(&self, outcome: &CommandOutcome, engine: &Engine<TextTarget>) -> Result<String>;
}

pub struct HumanFormatter;
pub struct SummaryFormatter;
pub struct JsonFormatter;

impl Formatter for HumanFormatter {
    fn frame(&self, engine: &Engine<TextTarget>) -> Result<String> {
        let mut out = engine.target().frame();
        write_log(&mut out, engine);
        Ok(out)
    }

    fn outcome(&self, outcome: &CommandOutcome, engine: &Engine<TextTarget>) -> Result<String> {
        let mut out = String::new();
        match outcome {
            CommandOutcome::Accepted(_) | CommandOutcome::Rejected(_) => {
                out.push_str(&engine.target().frame());
            }
            CommandOutcome::Cancelled => out.push_str("Cancelled\n"),
            CommandOutcome::Algorithm(name) => {
                let _ = writeln!(out, "Current algorithm: {}", name);
            }
        }
        write_log(&mut out, engine);
        Ok(out)
    }
}

fn write_log(out: &mut String, engine: &Engine<TextTarget>) {
    if engine.log().is_empty() {
        return;
    }
    out.push_str("Event log:\n");
    for entry in engine.log().entries() {
        let _ = writeln!(out, "{}", entry);
    }
}

impl Formatter for SummaryFormatter {
    fn frame(&self, engine: &Engine<TextTarget>) -> Result<String> {
        let view = match engine.view() {
            Some(view) => view,
            None => return Ok(String::new()),
        };
        Ok(format!(
            "[{}] vms={} cloudlets={} active={} avg={:.1}% ({}) sla met={} missed={} scaling={}\n",
            format_time_of_day(view.computed_at),
            view.vms.len(),
            view.cloudlets.len(),
            view.status_counts.get(CloudletStatus::Active),
            view.utilization.average,
            view.average_band.label(),
            view.sla.met,
            view.sla.missed,
            view.scaling_status.label(),
        ))
    }

    fn outcome(&self, outcome: &CommandOutcome, _engine: &Engine<TextTarget>) -> Result<String> {
        Ok(match outcome {
            CommandOutcome::Accepted(notification) => format!("ok: {}\n", notification.message),
            CommandOutcome::Rejected(notification) => format!("error: {}\n", notification.message),
            CommandOutcome::Cancelled => "cancelled\n".to_string(),
            CommandOutcome::Algorithm(name) => format!("{}\n", name),
        })
    }
}

impl Formatter for JsonFormatter {
    fn frame(&self, engine: &Engine<TextTarget>) -> Result<String> {
        match engine.view() {
            Some(view) => Ok(format!("{}\n", serde_json::to_string(view)?)),
            None => Ok(String::new()),
        }
    }

    fn outcome(&self, outcome: &CommandOutcome, engine: &Engine<TextTarget>) -> Result<String> {
        let log: Vec<&str> = engine.log().entries().collect();
        let value = match outcome {
            CommandOutcome::Accepted(notification) => {
                json!({ "outcome": "accepted", "message": notification.message, "log": log })
            }
            CommandOutcome::Rejected(notification) => {
                json!({ "outcome": "rejected", "message": notification.message, "log": log })
            }
            CommandOutcome::Cancelled => json!({ "outcome": "cancelled", "log": log }),
            CommandOutcome::Algorithm(name) => {
                json!({ "outcome": "algorithm", "current_algorithm": name, "log": log })
            }
        };
        Ok(format!("{}\n", serde_json::to_string(&value)?))
    }
}
