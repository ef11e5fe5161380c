//! Per-category exit codes. Part of the contract with the outer optimizer:
//! "no output file" alone already means the evaluation failed, the code
//! says why.

use welleval_core::EvalError;

pub const SUCCESS: i32 = 0;
/// Environment or settings-store problem.
pub const CONFIG_ERROR: i32 = 2;
/// Decision file or input-deck problem.
pub const INPUT_ERROR: i32 = 3;
/// Simulator spawn failure, non-zero exit, or timeout.
pub const SIMULATION_ERROR: i32 = 4;
/// Simulator ran but its output could not be reduced to objectives.
pub const EXTRACTION_ERROR: i32 = 5;

pub fn for_error(err: &EvalError) -> i32 {
    match err {
        EvalError::MissingEnvironment { .. } | EvalError::SettingsStore { .. } => CONFIG_ERROR,
        EvalError::InvalidDecisionFile { .. }
        | EvalError::MissingInputDeck { .. }
        | EvalError::DeckParse { .. }
        | EvalError::WellControlNotFound { .. }
        | EvalError::Io { .. } => INPUT_ERROR,
        EvalError::SimulationFailed { .. } => SIMULATION_ERROR,
        EvalError::MissingExpectedMetric { .. } | EvalError::OutputUnreadable { .. } => {
            EXTRACTION_ERROR
        }
    }
}
