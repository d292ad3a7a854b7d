use cf_core::Nsti;
use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] cf_model::ValidationError),

    #[error("Driver failed for model '{model}' at {nsti}: {details}")]
    DriverFailed {
        model: String,
        nsti: Nsti,
        details: String,
    },

    #[error("No executable path configured for {tool}")]
    MissingToolPath { tool: &'static str },

    #[error("Tool kind '{tool}' not supported for {what}")]
    UnsupportedTool { tool: String, what: &'static str },

    #[error("Input artifact of model '{model}' is missing field '{field}'")]
    MissingRunField { model: String, field: &'static str },

    #[error("Failed to copy {from} to {to}: {source}")]
    CopyFailed {
        from: String,
        to: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Convergence evaluation failed for model '{model}' signal '{signal}': {what}")]
    Convergence {
        model: String,
        signal: String,
        what: String,
    },

    #[error("Signal extraction error: {0}")]
    Signals(#[from] cf_signals::SignalsError),

    #[error("Numeric error: {0}")]
    Core(#[from] cf_core::CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Working area already locked: {path}")]
    WorkAreaLocked { path: String },

    #[error("Window {window} exceeded the iteration limit of {limit}")]
    MaxIterationsExceeded { window: u32, limit: usize },

    #[error("Run cancelled")]
    Cancelled,
}
