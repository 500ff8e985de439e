use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statrs::function::logistic::logistic;

use crate::config::LogRegParams;
use crate::error::{Result, SnorkelError};
use crate::math::SparseMatrix;
use crate::models::model_trait::NoiseAwareModel;

/// Map log-odds to a probability.
pub fn odds_to_prob(log_odds: f64) -> f64 {
    logistic(log_odds)
}

/// Map a probability to log-odds. 0 and 1 map to -inf and +inf.
pub fn log_odds(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

/// Noise-aware logistic regression with an elastic-net penalty.
///
/// Each step estimates, for every column, how often a non-zero entry agrees
/// with the expected labels, turns that agreement rate into empirical
/// log-odds, and pulls the column weight towards it. Expected labels are the
/// supplied training marginals, or else the model's own marginals (exactly or
/// from Bernoulli draws over sampled rows).
#[derive(Debug, Clone, Default)]
pub struct LogReg {
    w: Option<Array1<f64>>,
}

impl LogReg {
    pub fn new() -> Self {
        Self::default()
    }

    /// A model with fixed weights, e.g. restored from an earlier run.
    pub fn with_weights(w: Array1<f64>) -> Self {
        Self { w: Some(w) }
    }
}

/// Exact expected positive (`t`) and negative (`f`) counts per row.
fn exact_data(x: &SparseMatrix<f64>, w: &Array1<f64>) -> Result<(Array1<f64>, Array1<f64>)> {
    let t = x.dot(w)?.mapv(odds_to_prob);
    let f = t.mapv(|p| 1.0 - p);
    Ok((t, f))
}

/// Draw `n_samples` rows with replacement and a label for each draw from the
/// current marginals; `t`/`f` count the positive/negative draws per row.
fn sample_data(
    x: &SparseMatrix<f64>,
    w: &Array1<f64>,
    n_samples: usize,
    rng: &mut StdRng,
) -> Result<(Array1<f64>, Array1<f64>)> {
    let n = x.nrows();
    let mut t = Array1::zeros(n);
    let mut f = Array1::zeros(n);
    if n == 0 {
        return Ok((t, f));
    }
    let p = x.dot(w)?.mapv(odds_to_prob);
    for _ in 0..n_samples {
        let i = rng.gen_range(0..n);
        if rng.gen::<f64>() < p[i] {
            t[i] += 1.0;
        } else {
            f[i] += 1.0;
        }
    }
    Ok((t, f))
}

/// Per-column agreement rate with the expected labels and the total weight of
/// rows the column votes on.
fn agreement_stats(
    x: &SparseMatrix<f64>,
    x_abs: &SparseMatrix<f64>,
    t: &Array1<f64>,
    f: &Array1<f64>,
) -> Result<(Array1<f64>, Array1<f64>)> {
    let n_pred = x_abs.t_dot(&(t + f))?;
    let margin = x.t_dot(t)? - x.t_dot(f)?;
    let m = margin / n_pred.mapv(|v| v + 1e-8);
    let p_correct = m.mapv(|v| (v + 1.0) / 2.0);
    Ok((p_correct, n_pred))
}

fn norm(v: &Array1<f64>) -> f64 {
    v.dot(v).sqrt()
}

impl NoiseAwareModel for LogReg {
    fn train(
        &mut self,
        x: &SparseMatrix<f64>,
        w0: &Array1<f64>,
        training_marginals: Option<&Array1<f64>>,
        params: &LogRegParams,
    ) -> Result<()> {
        params.validate()?;
        let (n, r) = x.shape();
        if w0.len() != r {
            return Err(SnorkelError::WeightLength {
                expected: r,
                found: w0.len(),
            });
        }
        if let Some(marginals) = training_marginals {
            if marginals.len() != n {
                return Err(SnorkelError::RowCountMismatch {
                    expected: n,
                    found: marginals.len(),
                });
            }
        }

        let x_abs = x.abs();
        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut w = w0.clone();
        let mut g: Array1<f64> = Array1::zeros(r);
        let shrink = params.alpha * params.mu;
        let ridge = 1.0 + (1.0 - params.alpha) * params.mu;

        let mut steps = 0;
        for step in 0..params.n_iter {
            steps = step + 1;
            let (t, f) = match training_marginals {
                Some(marginals) => (marginals.clone(), marginals.mapv(|p| 1.0 - p)),
                None if params.sample => sample_data(x, &w, params.n_samples, &mut rng)?,
                None => exact_data(x, &w)?,
            };

            let (p_correct, n_pred) = agreement_stats(x, &x_abs, &t, &f)?;
            let target = p_correct.mapv(|p| log_odds(p).clamp(-params.clip, params.clip));

            let total = n_pred.sum();
            let g0 = if total > 0.0 {
                &n_pred * &(&w - &target) / total
            } else {
                Array1::zeros(r)
            };
            g = g0 * (1.0 - params.momentum) + &g * params.momentum;

            let (gn, wn) = (norm(&g), norm(&w));
            if gn <= params.tol * wn.max(1.0) {
                log::trace!("Converged after {} steps (|g| = {:.3e})", steps, gn);
                break;
            }

            w.scaled_add(-params.rate, &g);
            w.mapv_inplace(|wi| wi.signum() * (wi.abs() - shrink).max(0.0) / ridge);
        }

        log::debug!(
            "Trained {} on {} rows x {} columns in {} steps",
            self.name(),
            n,
            r,
            steps
        );
        self.w = Some(w);
        Ok(())
    }

    fn marginals(&self, x: &SparseMatrix<f64>) -> Result<Array1<f64>> {
        let w = self.w.as_ref().ok_or(SnorkelError::NotTrained)?;
        Ok(x.dot(w)?.mapv(odds_to_prob))
    }

    fn weights(&self) -> Option<&Array1<f64>> {
        self.w.as_ref()
    }

    fn name(&self) -> &str {
        "LogReg"
    }
}
