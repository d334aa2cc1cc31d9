//! Hazard predictor backed by an external program.
//!
//! The program receives one [`DisasterFeatures`] JSON document on stdin and
//! prints a risk label (`low`, `medium` or `high`) on stdout.

use shelter_core::{DisasterFeatures, HazardPredictor, PredictionError, RiskLevel};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

#[derive(Debug, Clone)]
pub struct ProcessPredictor {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessPredictor {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn describe(&self) -> String {
        let mut text = self.program.display().to_string();
        for arg in &self.args {
            text.push(' ');
            text.push_str(arg);
        }
        text
    }
}

impl HazardPredictor for ProcessPredictor {
    fn predict(&self, features: &DisasterFeatures) -> Result<RiskLevel, PredictionError> {
        let input = serde_json::to_vec(features)
            .map_err(|e| PredictionError(format!("failed to encode features: {e}")))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| PredictionError(format!("failed to run `{}`: {e}", self.describe())))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&input).map_err(|e| {
                PredictionError(format!("failed to write to `{}`: {e}", self.describe()))
            })?;
        }

        let output = child.wait_with_output().map_err(|e| {
            PredictionError(format!("failed to wait for `{}`: {e}", self.describe()))
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PredictionError(format!(
                "`{}` exited with {}: {}",
                self.describe(),
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout
            .trim()
            .parse()
            .map_err(|e| PredictionError(format!("`{}` printed {e}", self.describe())))
    }
}
