use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("execution time {execution_time}s exceeds deadline {deadline}s")]
    ExecutionExceedsDeadline { execution_time: f64, deadline: f64 },
    #[error("{field} must be > 0 (got {value})")]
    NonPositiveResource { field: &'static str, value: f64 },
    #[error("{0} id must not be empty")]
    EmptyId(&'static str),
    #[error("algorithm name must not be empty")]
    EmptyAlgorithm,
    #[error("unknown {kind} preset '{name}'")]
    UnknownPreset { kind: &'static str, name: String },
    #[error("no endpoint configured; pass --url or set endpoint in the config file")]
    MissingEndpoint,
    #[error("request failed: {0}")]
    Transport(String),
    #[error("invalid record on line {line}: {message}")]
    RecordParse { line: usize, message: String },
    #[error("{0}")]
    ConfigIo(String),
    #[error("{0}")]
    ConfigParse(String),
    #[error("unsupported config format '{0}'")]
    UnsupportedConfigFormat(String),
    #[error("{0}")]
    Cli(String),
    #[error("{0}")]
    Rejected(String),
    #[error("failed to encode output: {0}")]
    Encode(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Encode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
