//! One candidate evaluation, end to end.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, warn};

use crate::decision::DecisionVector;
use crate::error::{EvalError, EvalResult};
use crate::settings::Settings;
use crate::table::ControlTable;
use crate::{deck, extract, rewrite, runner};

/// Free-text case label published by the outer optimizer, diagnostics only.
pub const PROBLEM_NAME_FILE: &str = "problem_name.out";

/// Outcome of one evaluation. `NoOp` means nothing was requested or the
/// deck hierarchy has no optimizable well control; the caller writes no
/// output file for it. Failures travel as `Err`.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Objectives(Vec<f64>),
    NoOp,
}

/// Orchestrates locate → rewrite → run → extract for one working directory.
#[derive(Debug, Clone)]
pub struct Evaluator {
    workdir: PathBuf,
    timeout: Option<Duration>,
}

impl Evaluator {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            timeout: None,
        }
    }

    /// Deadline for the simulator subprocess; unbounded by default.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Evaluate the candidate in `decision_path`, with settings reloaded
    /// fresh from the environment-configured store.
    pub fn evaluate(&self, decision_path: &Path) -> EvalResult<Evaluation> {
        let settings = Settings::from_env()?;
        self.evaluate_with(&settings, decision_path)
    }

    fn evaluate_with(&self, settings: &Settings, decision_path: &Path) -> EvalResult<Evaluation> {
        self.log_problem_name();

        if settings.objectives <= 0 {
            info!(
                objectives = settings.objectives,
                "no objectives requested, skipping simulation"
            );
            return Ok(Evaluation::NoOp);
        }

        let x = DecisionVector::read(decision_path)?;
        if settings.real_variables > 0 && x.len() != settings.real_variables as usize {
            return Err(EvalError::InvalidDecisionFile {
                path: decision_path.to_path_buf(),
                detail: format!(
                    "expected {} variables per the settings store, found {}",
                    settings.real_variables,
                    x.len()
                ),
            });
        }

        let decks = deck::locate(&self.workdir)?;
        let table = ControlTable::from_decision(&x);

        match rewrite::rewrite(&decks, &table) {
            Ok(idx) => {
                info!(deck_index = idx, "well control rewritten");
            }
            Err(err @ EvalError::WellControlNotFound { .. }) => {
                warn!(%err, "evaluation yields no objectives");
                return Ok(Evaluation::NoOp);
            }
            Err(err) => return Err(err),
        }

        let run = runner::run(&self.workdir, decks.root(), self.timeout)?;
        let extraction = extract::extract(&run.output_path)?;

        let combined = extraction.combined();
        let expected = (settings.objectives + settings.constraints).max(0) as usize;
        if combined.len() != expected {
            warn!(
                produced = combined.len(),
                expected, "objective vector length differs from the settings store"
            );
        }

        Ok(Evaluation::Objectives(combined))
    }

    fn log_problem_name(&self) {
        match std::fs::read_to_string(self.workdir.join(PROBLEM_NAME_FILE)) {
            Ok(name) => info!(problem = name.trim(), "evaluating candidate"),
            Err(err) => warn!(%err, "no problem name available"),
        }
    }
}
