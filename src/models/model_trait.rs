use ndarray::Array1;

use crate::config::LogRegParams;
use crate::error::Result;
use crate::math::SparseMatrix;

/// Contract for models trained on noisy, LF-derived supervision.
///
/// Used both as the generative model over the label matrix and as the
/// discriminative end model.
pub trait NoiseAwareModel {
    /// Fit the model on `x` starting from `w0`.
    ///
    /// When `training_marginals` is given, each row is treated as positive with
    /// that probability; otherwise the model estimates the labels itself from
    /// the agreement between columns.
    fn train(
        &mut self,
        x: &SparseMatrix<f64>,
        w0: &Array1<f64>,
        training_marginals: Option<&Array1<f64>>,
        params: &LogRegParams,
    ) -> Result<()>;

    /// Probability of the positive class for every row of `x`.
    fn marginals(&self, x: &SparseMatrix<f64>) -> Result<Array1<f64>>;

    /// Hard predictions in {-1, 0, 1}; 0 when a marginal is exactly 0.5.
    fn predict(&self, x: &SparseMatrix<f64>) -> Result<Array1<f64>> {
        Ok(self.marginals(x)?.mapv(|p| {
            if p > 0.5 {
                1.0
            } else if p < 0.5 {
                -1.0
            } else {
                0.0
            }
        }))
    }

    /// Learned weight vector, `None` before training.
    fn weights(&self) -> Option<&Array1<f64>>;

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "model"
    }
}
