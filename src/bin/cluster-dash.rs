use cluster_dash::cli::{self, Commands};
use cluster_dash::clock::{Clock, ManualClock, SystemClock};
use cluster_dash::commands::{self, AssumeYes, CommandOutcome, Confirm, StdinConfirm};
use cluster_dash::config;
use cluster_dash::error::{Error, Result};
use cluster_dash::events::Dispatched;
use cluster_dash::models::{DashConfig, OutputFormat};
use cluster_dash::output::{Formatter, HumanFormatter, JsonFormatter, SummaryFormatter};
use cluster_dash::render::TextTarget;
use cluster_dash::transport::{ClusterApi, Feed, HttpApi, Offline, PollingFeed, ReplayFeed};
use cluster_dash::Engine;

const DEFAULT_LOG_DIRECTIVE: &str = "cluster_dash=warn";

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = cli::parse_args()?;
    let config = config::build_config(args.config.as_deref(), args.overrides())?;
    init_tracing(&config)?;

    let formatter = formatter_for(config.format);
    let clock: Box<dyn Clock> = match args.now {
        Some(now) => Box::new(ManualClock::new(now)),
        None => Box::new(SystemClock),
    };
    let mut engine = Engine::new(TextTarget::new(), clock);

    match &args.command {
        Commands::ShowConfig => {
            print!("{}", config.describe());
            Ok(())
        }
        Commands::Replay { file } => {
            let mut feed = ReplayFeed::open(file)?;
            stream(&mut engine, &mut feed, None, formatter.as_ref())
        }
        Commands::Watch { max_updates, .. } => {
            let api = connect(&config)?;
            let mut feed = PollingFeed::new(api, config.poll_interval());
            stream(&mut engine, &mut feed, *max_updates, formatter.as_ref())
        }
        Commands::Snapshot => {
            let mut api = connect(&config)?;
            let raw = api.fetch_snapshot()?;
            engine.ingest(raw);
            print!("{}", formatter.frame(&engine)?);
            Ok(())
        }
        command => {
            let command = command
                .to_command()?
                .ok_or_else(|| Error::Cli("nothing to do".to_string()))?;
            let mut api: Box<dyn ClusterApi> = match &config.endpoint {
                Some(_) => Box::new(connect(&config)?),
                None => Box::new(Offline),
            };
            let mut confirm: Box<dyn Confirm> = if config.assume_yes {
                Box::new(AssumeYes)
            } else {
                Box::new(StdinConfirm)
            };
            let outcome = commands::execute(&mut engine, api.as_mut(), confirm.as_mut(), command)?;
            print!("{}", formatter.outcome(&outcome, &engine)?);
            match outcome {
                CommandOutcome::Rejected(notification) => {
                    Err(Error::Rejected(notification.message))
                }
                _ => Ok(()),
            }
        }
    }
}

fn stream(
    engine: &mut Engine<TextTarget>,
    feed: &mut dyn Feed,
    max_updates: Option<u64>,
    formatter: &dyn Formatter,
) -> Result<()> {
    let mut rendered = 0u64;
    while max_updates.map_or(true, |max| rendered < max) {
        match engine.pump(feed) {
            Some(Ok(Dispatched::Rendered)) => {
                rendered += 1;
                print!("{}", formatter.frame(engine)?);
            }
            Some(Ok(_)) => {}
            // Already reported; the last frame stays current.
            Some(Err(_)) => {}
            None => break,
        }
    }
    tracing::info!(rendered, "feed finished");
    Ok(())
}

fn connect(config: &DashConfig) -> Result<HttpApi> {
    let endpoint = config.endpoint.as_deref().ok_or(Error::MissingEndpoint)?;
    HttpApi::new(endpoint, config.request_timeout())
}

fn init_tracing(config: &DashConfig) -> Result<()> {
    let filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let directive = config.log_filter.as_deref().unwrap_or(DEFAULT_LOG_DIRECTIVE);
            tracing_subscriber::EnvFilter::try_new(directive)
                .map_err(|e| Error::ConfigParse(format!("invalid log directive: {}", e)))?
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn formatter_for(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Human => Box::new(HumanFormatter),
        OutputFormat::Summary => Box::new(SummaryFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}
