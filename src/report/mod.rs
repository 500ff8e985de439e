//! Calibration reporting for trained learners.
//!
//! Rendering goes through [`CalibrationPlotter`] so learners only hand over
//! marginals and gold labels; [`HtmlCalibrationPlotter`] writes plotly HTML
//! files.
pub mod plots;

use std::fs;
use std::path::PathBuf;

use ndarray::Array1;

use crate::error::Result;

/// Consumer of train/test marginal distributions and gold labels.
pub trait CalibrationPlotter {
    fn plot(
        &self,
        train_marginals: &Array1<f64>,
        test_marginals: &Array1<f64>,
        gold: &[i8],
    ) -> Result<()>;
}

/// Writes `marginals.html` and `calibration.html` into `output_dir`.
#[derive(Debug, Clone)]
pub struct HtmlCalibrationPlotter {
    pub output_dir: PathBuf,
    pub n_bins: usize,
}

impl HtmlCalibrationPlotter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            n_bins: 10,
        }
    }
}

impl CalibrationPlotter for HtmlCalibrationPlotter {
    fn plot(
        &self,
        train_marginals: &Array1<f64>,
        test_marginals: &Array1<f64>,
        gold: &[i8],
    ) -> Result<()> {
        fs::create_dir_all(&self.output_dir)?;

        let histogram =
            plots::plot_marginal_histogram(train_marginals, test_marginals, "Marginal distributions");
        let calibration =
            plots::plot_calibration(test_marginals, gold, self.n_bins, "Test set calibration")?;

        let histogram_path = self.output_dir.join("marginals.html");
        let calibration_path = self.output_dir.join("calibration.html");
        fs::write(&histogram_path, histogram.to_html())?;
        fs::write(&calibration_path, calibration.to_html())?;
        log::info!(
            "Wrote calibration plots to {} and {}",
            histogram_path.display(),
            calibration_path.display()
        );
        Ok(())
    }
}
