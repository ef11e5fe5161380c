//! Objective extraction from the simulator's textual output.
//!
//! Two line families matter:
//! - `BHP` lines: the first numeric token, max-reduced over the whole file.
//! - `Dissolved component mass` lines: first + third numeric token, with
//!   the last such line winning (final-state metric, not accumulated).

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::error::{EvalError, EvalResult};

/// Target total dissolved mass the second objective is measured against.
pub const MASS_TARGET: f64 = 60e9;

const BHP_MARKER: &str = "BHP";
const MASS_MARKER: &str = "Dissolved component mass";

/// Numeric tokens as emitted by the simulator's formatters: optional sign,
/// digits, optional fraction, optional exponent, with spaces tolerated
/// around sign and exponent markers.
static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-+]? *[0-9]+\.?[0-9]*(?:[Ee] *[-+]? *[0-9]+)?").unwrap());

/// Objective/constraint values pulled from one simulator run.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub objectives: Vec<f64>,
    pub constraints: Vec<f64>,
}

impl Extraction {
    pub fn combined(&self) -> Vec<f64> {
        let mut out = self.objectives.clone();
        out.extend_from_slice(&self.constraints);
        out
    }
}

/// Stream the output file and reduce it to the objective vector.
///
/// A file with zero `BHP` lines yields `bhp_max = 0` (valid sentinel). A
/// file that never produces a usable mass sample is `MissingExpectedMetric`;
/// mass lines with fewer than three numeric tokens do not update the sample.
pub fn extract(output_path: &Path) -> EvalResult<Extraction> {
    let file = File::open(output_path).map_err(|e| EvalError::OutputUnreadable {
        path: output_path.to_path_buf(),
        source: e,
    })?;

    let mut bhp_max = 0.0_f64;
    let mut mass_sample: Option<f64> = None;

    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| EvalError::OutputUnreadable {
            path: output_path.to_path_buf(),
            source: e,
        })?;

        if line.contains(BHP_MARKER) {
            if let Some(first) = numeric_tokens(&line).first() {
                bhp_max = bhp_max.max(*first);
            }
        }
        if line.contains(MASS_MARKER) {
            let tokens = numeric_tokens(&line);
            if tokens.len() >= 3 {
                mass_sample = Some(tokens[0] + tokens[2]);
            } else {
                debug!(line = %line, "mass line with fewer than three numeric tokens skipped");
            }
        }
    }

    let mass_sample = mass_sample.ok_or(EvalError::MissingExpectedMetric {
        metric: MASS_MARKER,
    })?;

    let extraction = Extraction {
        objectives: vec![bhp_max, (MASS_TARGET - mass_sample).abs()],
        constraints: Vec::new(),
    };
    info!(
        bhp_max,
        mass_sample,
        mass_deviation = extraction.objectives[1],
        "objectives extracted"
    );
    Ok(extraction)
}

fn numeric_tokens(line: &str) -> Vec<f64> {
    NUMBER
        .find_iter(line)
        .filter_map(|m| m.as_str().replace(' ', "").parse::<f64>().ok())
        .collect()
}
