//! Decision-vector input and objective-vector output, one real per line.

use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::error::{EvalError, EvalResult};

/// Candidate decision variables, immutable once read.
///
/// Index 0 is the switch-time fraction of a year, index 1 the early-phase
/// rate, index 2 the late-phase rate.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionVector(Vec<f64>);

impl DecisionVector {
    /// Minimum length the rate-table mapping needs.
    pub const MIN_LEN: usize = 3;

    /// Read a decision vector from a plain-text file, one number per line.
    /// Blank lines are ignored; anything unparsable is `InvalidDecisionFile`.
    pub fn read(path: &Path) -> EvalResult<Self> {
        let raw = fs::read_to_string(path).map_err(|e| EvalError::InvalidDecisionFile {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

        let mut vars = Vec::new();
        for (idx, line) in raw.lines().enumerate() {
            let token = line.trim();
            if token.is_empty() {
                continue;
            }
            let value: f64 = token.parse().map_err(|_| EvalError::InvalidDecisionFile {
                path: path.to_path_buf(),
                detail: format!("line {}: '{token}' is not a real number", idx + 1),
            })?;
            vars.push(value);
        }

        if vars.len() < Self::MIN_LEN {
            return Err(EvalError::InvalidDecisionFile {
                path: path.to_path_buf(),
                detail: format!(
                    "expected at least {} variables, found {}",
                    Self::MIN_LEN,
                    vars.len()
                ),
            });
        }

        debug!(len = vars.len(), path = %path.display(), "decision vector read");
        Ok(Self(vars))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn switch_time_fraction(&self) -> f64 {
        self.0[0]
    }

    pub fn early_rate(&self) -> f64 {
        self.0[1]
    }

    pub fn late_rate(&self) -> f64 {
        self.0[2]
    }
}

/// Write the objective/constraint vector, one number per line, atomically:
/// the target either holds the complete vector or is left untouched.
pub fn write_vector(path: &Path, values: &[f64]) -> EvalResult<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp =
        tempfile::NamedTempFile::new_in(dir).map_err(|e| EvalError::io(path, e))?;
    for v in values {
        writeln!(tmp, "{v}").map_err(|e| EvalError::io(path, e))?;
    }
    tmp.persist(path)
        .map_err(|e| EvalError::io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn decision_file(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn reads_one_real_per_line() {
        let f = decision_file("1.0\n100.0\n50.0\n");
        let x = DecisionVector::read(f.path()).unwrap();
        assert_eq!(x.len(), 3);
        assert_eq!(x.switch_time_fraction(), 1.0);
        assert_eq!(x.early_rate(), 100.0);
        assert_eq!(x.late_rate(), 50.0);
    }

    #[test]
    fn tolerates_blank_lines_and_scientific_notation() {
        let f = decision_file("0.5\n\n1.5e2\n-5e1\n\n");
        let x = DecisionVector::read(f.path()).unwrap();
        assert_eq!(x.len(), 3);
        assert_eq!(x.late_rate(), -50.0);
    }

    #[test]
    fn rejects_garbage_content() {
        let f = decision_file("1.0\nabc\n2.0\n");
        assert!(matches!(
            DecisionVector::read(f.path()),
            Err(EvalError::InvalidDecisionFile { .. })
        ));
    }

    #[test]
    fn rejects_short_vectors() {
        let f = decision_file("1.0\n2.0\n");
        assert!(matches!(
            DecisionVector::read(f.path()),
            Err(EvalError::InvalidDecisionFile { .. })
        ));
    }

    #[test]
    fn writes_vector_one_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("fun.out");
        write_vector(&out, &[1.5, 57000000000.0]).unwrap();
        let body = std::fs::read_to_string(&out).unwrap();
        assert_eq!(body, "1.5\n57000000000\n");
    }
}
