//! Objective-function evaluator for simulation-driven well-control
//! optimization.
//!
//! One evaluation maps a decision vector onto a rate schedule inside an XML
//! input-deck hierarchy, runs the external simulator against the root deck,
//! and reduces its textual output to an objective vector. The outer
//! optimizer that proposes candidates lives elsewhere.

pub mod deck;
pub mod decision;
pub mod error;
pub mod evaluate;
pub mod extract;
pub mod rewrite;
pub mod runner;
pub mod settings;
pub mod table;

pub use decision::DecisionVector;
pub use error::{EvalError, EvalResult};
pub use evaluate::{Evaluation, Evaluator};
pub use settings::Settings;
pub use table::ControlTable;
