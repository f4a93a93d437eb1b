use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::commands::Command;
use crate::config::Overrides;
use crate::error::{Error, Result};
use crate::models::{CloudletSpec, OutputFormat, SizeUnit, VmSpec};

#[derive(Parser, Debug)]
#[command(name = "cluster-dash", about = "Terminal dashboard for a simulated cloud cluster")]
pub struct Cli {
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[arg(long, value_enum, global = true)]
    pub format: Option<FormatArg>,
    #[arg(
        long,
        global = true,
        help = "Pin the local clock to this unix time (seconds) for reproducible output"
    )]
    pub now: Option<f64>,
    #[arg(long, global = true, help = "Base URL of the cluster API")]
    pub url: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render every snapshot of a JSON-lines recording
    Replay {
        #[arg(long)]
        file: PathBuf,
    },
    /// Poll the cluster and render each update
    Watch {
        #[arg(long)]
        interval_ms: Option<u64>,
        #[arg(long)]
        max_updates: Option<u64>,
    },
    /// Pull one snapshot and render it
    Snapshot,
    #[command(subcommand)]
    Vm(VmCommand),
    #[command(subcommand)]
    Cloudlet(CloudletCommand),
    #[command(subcommand)]
    Algorithm(AlgorithmCommand),
    ShowConfig,
}

#[derive(Subcommand, Debug)]
pub enum VmCommand {
    Create(VmArgs),
    Delete {
        id: String,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum CloudletCommand {
    Submit(CloudletArgs),
    Delete {
        id: String,
        #[arg(long)]
        yes: bool,
    },
    Complete {
        id: String,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum AlgorithmCommand {
    Get,
    Set { name: String },
}

#[derive(Args, Debug, Default)]
pub struct VmArgs {
    #[arg(long, help = "small, medium or large")]
    pub preset: Option<String>,
    #[arg(long)]
    pub cpu: Option<u32>,
    #[arg(long)]
    pub ram: Option<u64>,
    #[arg(long, value_enum, default_value = "gb")]
    pub ram_unit: UnitArg,
    #[arg(long)]
    pub storage: Option<u64>,
    #[arg(long, value_enum, default_value = "gb")]
    pub storage_unit: UnitArg,
    #[arg(long)]
    pub bandwidth: Option<u64>,
    #[arg(long)]
    pub gpu: Option<u32>,
}

#[derive(Args, Debug, Default)]
pub struct CloudletArgs {
    #[arg(long, help = "light, moderate or heavy")]
    pub preset: Option<String>,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub cpu: Option<u32>,
    #[arg(long)]
    pub ram: Option<u64>,
    #[arg(long, value_enum, default_value = "gb")]
    pub ram_unit: UnitArg,
    #[arg(long)]
    pub storage: Option<u64>,
    #[arg(long, value_enum, default_value = "gb")]
    pub storage_unit: UnitArg,
    #[arg(long)]
    pub bandwidth: Option<u64>,
    #[arg(long)]
    pub gpu: Option<u32>,
    #[arg(long)]
    pub sla_priority: Option<u32>,
    #[arg(long)]
    pub deadline: Option<f64>,
    #[arg(long)]
    pub execution_time: Option<f64>,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum UnitArg {
    Mb,
    #[default]
    Gb,
}

impl From<UnitArg> for SizeUnit {
    fn from(value: UnitArg) -> Self {
        match value {
            UnitArg::Mb => SizeUnit::Mb,
            UnitArg::Gb => SizeUnit::Gb,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum FormatArg {
    Human,
    Summary,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Human => OutputFormat::Human,
            FormatArg::Summary => OutputFormat::Summary,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

pub fn parse_args() -> Result<Cli> {
    Cli::try_parse().map_err(|e| Error::Cli(e.to_string()))
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        let poll_interval_ms = match &self.command {
            Commands::Watch { interval_ms, .. } => *interval_ms,
            _ => None,
        };
        Overrides {
            endpoint: self.url.clone(),
            poll_interval_ms,
            format: self.format.map(OutputFormat::from),
            assume_yes: self.command.assume_yes(),
        }
    }
}

impl Commands {
    fn assume_yes(&self) -> bool {
        match self {
            Commands::Vm(VmCommand::Delete { yes, .. })
            | Commands::Cloudlet(CloudletCommand::Delete { yes, .. })
            | Commands::Cloudlet(CloudletCommand::Complete { yes, .. }) => *yes,
            _ => false,
        }
    }

    /// The cluster command this invocation stands for, if any.
    pub fn to_command(&self) -> Result<Option<Command>> {
        let command = match self {
            Commands::Vm(VmCommand::Create(args)) => Command::CreateVm(args.to_spec()?),
            Commands::Vm(VmCommand::Delete { id, .. }) => Command::DeleteVm(id.clone()),
            Commands::Cloudlet(CloudletCommand::Submit(args)) => {
                Command::SubmitCloudlet(args.to_spec()?)
            }
            Commands::Cloudlet(CloudletCommand::Delete { id, .. }) => {
                Command::DeleteCloudlet(id.clone())
            }
            Commands::Cloudlet(CloudletCommand::Complete { id, .. }) => {
                Command::CompleteCloudlet(id.clone())
            }
            Commands::Algorithm(AlgorithmCommand::Get) => Command::GetAlgorithm,
            Commands::Algorithm(AlgorithmCommand::Set { name }) => {
                Command::SetAlgorithm(name.clone())
            }
            _ => return Ok(None),
        };
        Ok(Some(command))
    }
}

impl VmArgs {
    pub fn to_spec(&self) -> Result<VmSpec> {
        let mut spec = match &self.preset {
            Some(name) => VmSpec::preset(name)?,
            None => VmSpec::default(),
        };
        if let Some(cpu) = self.cpu {
            spec.cpu = cpu;
        }
        if let Some(ram) = self.ram {
            spec.ram = ram;
        }
        if let Some(storage) = self.storage {
            spec.storage = storage;
        }
        spec.ram_unit = self.ram_unit.into();
        spec.storage_unit = self.storage_unit.into();
        if let Some(bandwidth) = self.bandwidth {
            spec.bandwidth = bandwidth;
        }
        if let Some(gpu) = self.gpu {
            spec.gpu = gpu;
        }
        Ok(spec)
    }
}

impl CloudletArgs {
    pub fn to_spec(&self) -> Result<CloudletSpec> {
        let mut spec = match &self.preset {
            Some(name) => CloudletSpec::preset(name)?,
            None => CloudletSpec::default(),
        };
        if let Some(name) = &self.name {
            spec.name = Some(name.clone());
        }
        if let Some(cpu) = self.cpu {
            spec.cpu = cpu;
        }
        if let Some(ram) = self.ram {
            spec.ram = ram;
        }
        if let Some(storage) = self.storage {
            spec.storage = storage;
        }
        spec.ram_unit = self.ram_unit.into();
        spec.storage_unit = self.storage_unit.into();
        if let Some(bandwidth) = self.bandwidth {
            spec.bandwidth = bandwidth;
        }
        if let Some(gpu) = self.gpu {
            spec.gpu = gpu;
        }
        if let Some(priority) = self.sla_priority {
            spec.sla_priority = priority;
        }
        if let Some(deadline) = self.deadline {
            spec.deadline = deadline;
        }
        if let Some(execution_time) = self.execution_time {
            spec.execution_time = execution_time;
        }
        Ok(spec)
    }
}
