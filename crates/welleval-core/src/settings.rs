//! Optimization-wide settings, reloaded fresh for every evaluation.
//!
//! The outer optimizer publishes a dataspace file at
//! `{UNIFIED_OPTIMIZATION_PATH}/{UNIFIED_OPTIMIZATION_TIMENOW}_dataspace.h5`
//! exposing scalar counts under the `optimization` group. The scalars are
//! consumed from the JSON rendition of that file; the logical key layout
//! (`optimization/number of objectives` etc.) is unchanged.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{EvalError, EvalResult};

pub const ENV_OPTIMIZATION_PATH: &str = "UNIFIED_OPTIMIZATION_PATH";
pub const ENV_OPTIMIZATION_TIMENOW: &str = "UNIFIED_OPTIMIZATION_TIMENOW";

#[derive(Debug, Clone, Deserialize)]
struct Dataspace {
    optimization: Settings,
}

/// Scalar counts governing one evaluation.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(rename = "number of objectives")]
    pub objectives: i64,
    #[serde(rename = "number of constraints")]
    pub constraints: i64,
    #[serde(rename = "number of real variables")]
    pub real_variables: i64,
}

impl Settings {
    /// Resolve the dataspace path from the environment and load it.
    pub fn from_env() -> EvalResult<Self> {
        Self::load(&dataspace_path()?)
    }

    /// Load settings from an explicit dataspace file.
    pub fn load(path: &Path) -> EvalResult<Self> {
        let raw = fs::read_to_string(path).map_err(|e| EvalError::SettingsStore {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        let dataspace: Dataspace =
            serde_json::from_str(&raw).map_err(|e| EvalError::SettingsStore {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;
        debug!(
            objectives = dataspace.optimization.objectives,
            constraints = dataspace.optimization.constraints,
            real_variables = dataspace.optimization.real_variables,
            "settings loaded"
        );
        Ok(dataspace.optimization)
    }
}

fn dataspace_path() -> EvalResult<PathBuf> {
    let base = require_env(ENV_OPTIMIZATION_PATH)?;
    let timenow = require_env(ENV_OPTIMIZATION_TIMENOW)?;
    Ok(PathBuf::from(base).join(format!("{timenow}_dataspace.h5")))
}

pub(crate) fn require_env(name: &'static str) -> EvalResult<String> {
    match std::env::var(name) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => Err(EvalError::MissingEnvironment { name }),
    }
}
