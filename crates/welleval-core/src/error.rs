//! Error types for a single candidate evaluation.

use std::path::PathBuf;
use thiserror::Error;

pub type EvalResult<T> = Result<T, EvalError>;

#[derive(Debug, Error)]
pub enum EvalError {
    /// A required environment variable is not set.
    #[error("required environment variable {name} is not set")]
    MissingEnvironment { name: &'static str },

    /// The settings store could not be opened or parsed.
    #[error("settings store unreadable at {path}: {detail}")]
    SettingsStore { path: PathBuf, detail: String },

    /// The decision-variable file is missing or malformed.
    #[error("invalid decision file {path}: {detail}")]
    InvalidDecisionFile { path: PathBuf, detail: String },

    /// No deck file matched the root glob in the working directory.
    #[error("no input deck matching '{pattern}' found in {dir}")]
    MissingInputDeck { pattern: String, dir: PathBuf },

    /// A deck file exists but is not well-formed XML.
    #[error("malformed input deck {path}: {detail}")]
    DeckParse { path: PathBuf, detail: String },

    /// No deck contains the target well control with a resolvable rate table.
    /// Non-fatal: the evaluation yields no objectives and writes no output.
    #[error("no WellControls '{target}' with a matching TableFunction found in any input deck")]
    WellControlNotFound { target: &'static str },

    /// The simulator could not be spawned, exited non-zero, or timed out.
    #[error("simulation failed: {detail}")]
    SimulationFailed { detail: String },

    /// The simulator output never produced a required metric.
    #[error("simulator output has no usable '{metric}' line")]
    MissingExpectedMetric { metric: &'static str },

    /// The simulator output file could not be read.
    #[error("cannot read simulator output {path}: {source}")]
    OutputUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Any other filesystem failure, tagged with the path involved.
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl EvalError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn deck_parse(path: impl Into<PathBuf>, detail: impl ToString) -> Self {
        Self::DeckParse {
            path: path.into(),
            detail: detail.to_string(),
        }
    }
}
