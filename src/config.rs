use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Result, SnorkelError};

/// Hyper-parameters of the noise-aware logistic model.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LogRegParams {
    /// Maximum number of gradient steps.
    pub n_iter: usize,
    /// Relative gradient norm below which training stops.
    pub tol: f64,
    /// Step size.
    pub rate: f64,
    /// Elastic-net mixing: 1.0 is pure L1, 0.0 pure L2.
    pub alpha: f64,
    /// Elastic-net penalty strength.
    pub mu: f64,
    /// Weight of the previous gradient in the momentum update.
    pub momentum: f64,
    /// Estimate expected labels from Bernoulli draws instead of exact marginals.
    pub sample: bool,
    /// Rows drawn per step when `sample` is set.
    pub n_samples: usize,
    /// Seed for row and label draws.
    pub seed: u64,
    /// Bound on the empirical log-odds targets.
    pub clip: f64,
}

impl Default for LogRegParams {
    fn default() -> Self {
        Self {
            n_iter: 500,
            tol: 1e-6,
            rate: 0.01,
            alpha: 0.0,
            mu: 1e-6,
            momentum: 0.05,
            sample: false,
            n_samples: 100,
            seed: 42,
            clip: 10.0,
        }
    }
}

impl LogRegParams {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(SnorkelError::Config(format!(
                "alpha must be in [0, 1], got {}",
                self.alpha
            )));
        }
        if !(0.0..=1.0).contains(&self.momentum) {
            return Err(SnorkelError::Config(format!(
                "momentum must be in [0, 1], got {}",
                self.momentum
            )));
        }
        if self.rate <= 0.0 || self.mu < 0.0 || self.clip <= 0.0 {
            return Err(SnorkelError::Config(
                "rate and clip must be positive and mu non-negative".to_string(),
            ));
        }
        if self.sample && self.n_samples == 0 {
            return Err(SnorkelError::Config(
                "n_samples must be positive when sampling".to_string(),
            ));
        }
        Ok(())
    }
}

/// Initial weights and model hyper-parameters for one `train` call.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TrainParams {
    /// Initial weight of every LF column.
    pub lf_w0: f64,
    /// Initial weight of every feature column.
    pub feat_w0: f64,
    pub model: LogRegParams,
}

impl TrainParams {
    /// Defaults for the joint strategy: LFs start out trusted, features neutral.
    pub fn joint() -> Self {
        Self {
            lf_w0: 5.0,
            feat_w0: 0.0,
            model: LogRegParams::default(),
        }
    }

    /// Defaults for the pipelined strategy.
    pub fn pipelined() -> Self {
        Self {
            lf_w0: 1.0,
            feat_w0: 0.0,
            model: LogRegParams::default(),
        }
    }

    pub fn with_model(mut self, model: LogRegParams) -> Self {
        self.model = model;
        self
    }

    /// Parse parameters from JSON; missing fields take the joint defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let params: TrainParams =
            serde_json::from_str(json).map_err(|e| SnorkelError::Config(e.to_string()))?;
        params.model.validate()?;
        Ok(params)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }
}

impl Default for TrainParams {
    fn default() -> Self {
        Self::joint()
    }
}
