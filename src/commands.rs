//! User-initiated commands against the cluster API.
//!
//! Every command ends in exactly one of: a local rejection (nothing sent), a
//! declined confirmation (nothing sent, nothing logged), a remote reply
//! (notification + event log entry) or a transport failure (diagnostic +
//! event log entry). None of them touch the current view.

use std::io::{self, BufRead, Write};

use crate::error::{Error, Result};
use crate::models::{ActionReply, CloudletSpec, CreateReply, VmSpec};
use crate::render::{ActionKind, Entity, Notification, RenderTarget, RowAction};
use crate::transport::ClusterApi;
use crate::Engine;

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    CreateVm(VmSpec),
    SubmitCloudlet(CloudletSpec),
    DeleteVm(String),
    DeleteCloudlet(String),
    CompleteCloudlet(String),
    GetAlgorithm,
    SetAlgorithm(String),
}

impl Command {
    fn subject(&self) -> &'static str {
        match self {
            Command::CreateVm(_) | Command::DeleteVm(_) => "VM",
            Command::SubmitCloudlet(_)
            | Command::DeleteCloudlet(_)
            | Command::CompleteCloudlet(_) => "cloudlet",
            Command::GetAlgorithm | Command::SetAlgorithm(_) => "algorithm",
        }
    }

    pub fn confirmation_prompt(&self) -> Option<&'static str> {
        match self {
            Command::DeleteVm(_) => Some(
                "Are you sure you want to delete this VM? All running cloudlets on this VM will be deallocated and reallocated if possible.",
            ),
            Command::DeleteCloudlet(_) => Some("Are you sure you want to delete this cloudlet?"),
            Command::CompleteCloudlet(_) => Some("Mark this cloudlet as completed?"),
            _ => None,
        }
    }
}

impl From<&RowAction> for Command {
    fn from(action: &RowAction) -> Self {
        match (action.kind, action.entity) {
            (ActionKind::Delete, Entity::Vm) => Command::DeleteVm(action.id.clone()),
            (ActionKind::Delete, Entity::Cloudlet) => Command::DeleteCloudlet(action.id.clone()),
            (ActionKind::Complete, _) => Command::CompleteCloudlet(action.id.clone()),
        }
    }
}

/// Synchronous gate in front of destructive commands.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, _prompt: &str) -> bool {
        true
    }
}

/// Asks on stderr and reads the answer from stdin; anything but `y`/`yes`
/// declines.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        let mut stderr = io::stderr();
        let _ = write!(stderr, "{} [y/N]: ", prompt);
        let _ = stderr.flush();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CommandOutcome {
    /// The server accepted the request.
    Accepted(Notification),
    /// The server answered with `error` or `not_found`.
    Rejected(Notification),
    Cancelled,
    Algorithm(String),
}

impl CommandOutcome {
    pub fn notification(&self) -> Option<&Notification> {
        match self {
            CommandOutcome::Accepted(notification) | CommandOutcome::Rejected(notification) => {
                Some(notification)
            }
            _ => None,
        }
    }
}

pub fn execute<R: RenderTarget>(
    engine: &mut Engine<R>,
    api: &mut dyn ClusterApi,
    confirm: &mut dyn Confirm,
    command: Command,
) -> Result<CommandOutcome> {
    if let Err(err) = precheck(&command) {
        engine.record(&format!("Rejected {}: {}", command.subject(), err));
        engine.notify(Notification::error(err.to_string()));
        return Err(err);
    }

    if let Some(prompt) = command.confirmation_prompt() {
        if !confirm.confirm(prompt) {
            tracing::debug!(?command, "command declined at confirmation");
            return Ok(CommandOutcome::Cancelled);
        }
    }

    match send(engine, api, command) {
        Ok(outcome) => {
            if let Some(notification) = outcome.notification() {
                engine.notify(notification.clone());
            }
            Ok(outcome)
        }
        Err(err) => {
            tracing::warn!(error = %err, "cluster request failed");
            engine.record(&format!("Request failed: {}", err));
            engine.notify(Notification::error(format!("Request failed: {}", err)));
            Err(err)
        }
    }
}

fn precheck(command: &Command) -> Result<()> {
    match command {
        Command::CreateVm(spec) => spec.validate(),
        Command::SubmitCloudlet(spec) => spec.validate(),
        Command::DeleteVm(id) if id.trim().is_empty() => Err(Error::EmptyId("vm")),
        Command::DeleteCloudlet(id) | Command::CompleteCloudlet(id) if id.trim().is_empty() => {
            Err(Error::EmptyId("cloudlet"))
        }
        Command::SetAlgorithm(name) if name.trim().is_empty() => Err(Error::EmptyAlgorithm),
        _ => Ok(()),
    }
}

fn send<R: RenderTarget>(
    engine: &mut Engine<R>,
    api: &mut dyn ClusterApi,
    command: Command,
) -> Result<CommandOutcome> {
    let outcome = match command {
        Command::CreateVm(spec) => match api.create_vm(&spec)? {
            CreateReply::Success { id } => {
                engine.record(&format!(
                    "VM created: {} [{} CPU, {} {} RAM, {} {} Storage, {} Mbps Bandwidth, {} GPU]",
                    id,
                    spec.cpu,
                    spec.ram,
                    spec.ram_unit.label(),
                    spec.storage,
                    spec.storage_unit.label(),
                    spec.bandwidth,
                    spec.gpu
                ));
                CommandOutcome::Accepted(Notification::success("VM created successfully!"))
            }
            CreateReply::Error { error } => {
                engine.record(&format!("Error creating VM: {}", error));
                CommandOutcome::Rejected(Notification::error(format!(
                    "Error creating VM: {}",
                    error
                )))
            }
        },
        Command::SubmitCloudlet(spec) => match api.create_cloudlet(&spec)? {
            CreateReply::Success { id } => {
                engine.record(&format!(
                    "Cloudlet submitted: {} [{} CPU, {} {} RAM, {} {} Storage, {} Mbps Bandwidth, {} GPU, SLA {}, Deadline {}s]",
                    id,
                    spec.cpu,
                    spec.ram,
                    spec.ram_unit.label(),
                    spec.storage,
                    spec.storage_unit.label(),
                    spec.bandwidth,
                    spec.gpu,
                    spec.sla_priority,
                    spec.deadline
                ));
                CommandOutcome::Accepted(Notification::success(
                    "Cloudlet submitted successfully!",
                ))
            }
            CreateReply::Error { error } => {
                engine.record(&format!("Error submitting cloudlet: {}", error));
                CommandOutcome::Rejected(Notification::error(format!(
                    "Error submitting cloudlet: {}",
                    error
                )))
            }
        },
        Command::DeleteVm(id) => match api.delete_vm(&id)? {
            ActionReply::Success => {
                engine.record(&format!("VM deleted: {}", id));
                CommandOutcome::Accepted(Notification::success("VM deleted successfully!"))
            }
            // The server answers not_found both for unknown VMs and for VMs
            // that still host cloudlets.
            ActionReply::NotFound => {
                engine.record(&format!("VM not found: {}", id));
                CommandOutcome::Rejected(Notification::error(
                    "Cannot delete VM: cloudlets are running on it or it no longer exists",
                ))
            }
            ActionReply::Error { error } => {
                engine.record(&format!("Error deleting VM: {}", error));
                CommandOutcome::Rejected(Notification::error(
                    "Cannot delete VM: cloudlets are running on it",
                ))
            }
        },
        Command::DeleteCloudlet(id) => match api.delete_cloudlet(&id)? {
            ActionReply::Success => {
                engine.record(&format!("Cloudlet deleted: {}", id));
                CommandOutcome::Accepted(Notification::success("Cloudlet deleted successfully!"))
            }
            ActionReply::NotFound => {
                engine.record(&format!("Cloudlet not found: {}", id));
                CommandOutcome::Rejected(Notification::error("Cloudlet not found!"))
            }
            ActionReply::Error { error } => {
                engine.record(&format!("Error deleting cloudlet: {}", error));
                CommandOutcome::Rejected(Notification::error("Error deleting cloudlet!"))
            }
        },
        Command::CompleteCloudlet(id) => match api.complete_cloudlet(&id)? {
            ActionReply::Success => {
                engine.record(&format!("Cloudlet completed: {}", id));
                CommandOutcome::Accepted(Notification::success("Cloudlet marked as completed!"))
            }
            ActionReply::NotFound => {
                engine.record(&format!("Cloudlet not found: {}", id));
                CommandOutcome::Rejected(Notification::error("Cloudlet not found!"))
            }
            ActionReply::Error { error } => {
                engine.record(&format!("Error completing cloudlet: {}", error));
                CommandOutcome::Rejected(Notification::error("Error completing cloudlet!"))
            }
        },
        Command::GetAlgorithm => CommandOutcome::Algorithm(api.get_algorithm()?),
        Command::SetAlgorithm(name) => match api.set_algorithm(&name)? {
            ActionReply::Success => {
                engine.record(&format!("Load balancing algorithm set to {}", name));
                CommandOutcome::Accepted(Notification::success(format!(
                    "Algorithm set to {}",
                    name
                )))
            }
            ActionReply::NotFound => {
                engine.record(&format!("Error setting algorithm: unknown algorithm {}", name));
                CommandOutcome::Rejected(Notification::error(format!(
                    "Unknown algorithm {}",
                    name
                )))
            }
            ActionReply::Error { error } => {
                engine.record(&format!("Error setting algorithm: {}", error));
                CommandOutcome::Rejected(Notification::error(format!(
                    "Error setting algorithm: {}",
                    error
                )))
            }
        },
    };
    Ok(outcome)
}
