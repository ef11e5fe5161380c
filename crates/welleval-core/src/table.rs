//! Rate-table construction from the decision vector.

use crate::decision::DecisionVector;

/// Fixed Julian-year approximation used by the deck time axis.
pub const SECONDS_PER_YEAR: f64 = 365.0 * 24.0 * 3600.0;

/// Sentinel time bound; must dominate any realistic simulated horizon.
pub const TIME_SENTINEL: f64 = 1e11;

/// Piecewise-linear rate schedule injected into the target `TableFunction`.
///
/// Encodes a step-like schedule: rate 0 before simulation start, the
/// early-phase rate from time 0 until the switch time, the late-phase rate
/// thereafter, held flat to the sentinel bound.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlTable {
    pub coordinates: [f64; 4],
    pub values: [f64; 4],
}

impl ControlTable {
    pub fn from_decision(x: &DecisionVector) -> Self {
        let switch_time = x.switch_time_fraction() * SECONDS_PER_YEAR;
        Self {
            coordinates: [-TIME_SENTINEL, 0.0, switch_time, TIME_SENTINEL],
            values: [0.0, x.early_rate(), x.late_rate(), x.late_rate()],
        }
    }

    /// Brace-delimited list for the `coordinates` attribute.
    pub fn coordinates_attr(&self) -> String {
        brace_list(&self.coordinates)
    }

    /// Brace-delimited list for the `values` attribute.
    pub fn values_attr(&self) -> String {
        brace_list(&self.values)
    }
}

fn brace_list(xs: &[f64]) -> String {
    let body = xs
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{ {body} }}")
}
