//! External simulator invocation.
//!
//! The simulator is the dominant cost of an evaluation and the only place
//! wall-clock-significant waiting occurs. The child is polled with a hard
//! timeout and killed on expiry; it is always reaped, and the capture file
//! handle is closed on every exit path.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tracing::info;

use crate::error::{EvalError, EvalResult};
use crate::settings::require_env;

/// Environment variable holding the simulator executable path.
pub const ENV_SIMULATOR: &str = "UNIFIED_OPTIMIZATION_GEOS";

/// Fixed capture file for combined stdout/stderr, in the working directory.
pub const OUTPUT_FILE_NAME: &str = "output_geos.out";

/// Fixed parallel-decomposition flags handed to the simulator.
const DECOMPOSITION_FLAGS: [&str; 6] = ["-x", "8", "-y", "8", "-z", "1"];

/// Completed simulator run. `Ok` from [`run`] always means exit status 0
/// within the deadline; the struct carries the raw facts for logging.
#[derive(Debug)]
pub struct SimulationRun {
    pub exit_code: Option<i32>,
    pub output_path: PathBuf,
    pub elapsed: Duration,
}

/// Run the simulator from the environment-configured binary against the
/// root deck. Non-zero exit and timeout are both `SimulationFailed`.
pub fn run(workdir: &Path, root_deck: &Path, timeout: Option<Duration>) -> EvalResult<SimulationRun> {
    let bin = PathBuf::from(require_env(ENV_SIMULATOR)?);
    run_with(&bin, workdir, root_deck, timeout)
}

fn run_with(
    bin: &Path,
    workdir: &Path,
    root_deck: &Path,
    timeout: Option<Duration>,
) -> EvalResult<SimulationRun> {
    let output_path = workdir.join(OUTPUT_FILE_NAME);
    let stdout = fs::File::create(&output_path).map_err(|e| EvalError::io(&output_path, e))?;
    let stderr = stdout
        .try_clone()
        .map_err(|e| EvalError::io(&output_path, e))?;

    let started = Instant::now();
    let mut child = Command::new(bin)
        .arg("-i")
        .arg(root_deck)
        .args(DECOMPOSITION_FLAGS)
        .current_dir(workdir)
        .stdin(Stdio::null())
        .stdout(stdout)
        .stderr(stderr)
        .spawn()
        .map_err(|e| EvalError::SimulationFailed {
            detail: format!("cannot spawn simulator '{}': {e}", bin.display()),
        })?;

    let status = match wait_timeout(&mut child, timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait(); // reap
            return Err(EvalError::SimulationFailed {
                detail: format!(
                    "simulator exceeded the {:?} deadline and was killed",
                    timeout.unwrap_or_default()
                ),
            });
        }
        Err(e) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(EvalError::SimulationFailed {
                detail: format!("waiting for simulator: {e}"),
            });
        }
    };

    let elapsed = started.elapsed();
    if !status.success() {
        return Err(EvalError::SimulationFailed {
            detail: match status.code() {
                Some(code) => format!("simulator exited with status {code}"),
                None => "simulator was terminated by a signal".to_string(),
            },
        });
    }

    info!(elapsed_secs = elapsed.as_secs_f64(), "simulation finished");
    Ok(SimulationRun {
        exit_code: status.code(),
        output_path,
        elapsed,
    })
}

/// Poll-based wait; `Ok(None)` means the deadline passed with the child
/// still running.
fn wait_timeout(
    child: &mut std::process::Child,
    timeout: Option<Duration>,
) -> std::io::Result<Option<std::process::ExitStatus>> {
    let Some(timeout) = timeout else {
        return child.wait().map(Some);
    };

    let start = Instant::now();
    let poll_interval = Duration::from_millis(50);
    loop {
        match child.try_wait()? {
            Some(status) => return Ok(Some(status)),
            None => {
                if start.elapsed() >= timeout {
                    return Ok(None);
                }
                std::thread::sleep(poll_interval);
            }
        }
    }
}
