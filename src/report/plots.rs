use itertools_num::linspace;
use ndarray::Array1;
use plotly::common::{DashType, Line, Mode};
use plotly::layout::{Axis, BarMode, Layout};
use plotly::{Histogram, Plot, Scatter};

use crate::error::{Result, SnorkelError};

/// One bin of a calibration curve.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationBin {
    pub lower: f64,
    pub upper: f64,
    /// Mean predicted marginal of the rows in the bin.
    pub mean_marginal: f64,
    /// Fraction of rows in the bin whose gold label is positive.
    pub positive_rate: f64,
    pub count: usize,
}

/// Bucket `marginals` into `n_bins` equal-width bins over [0, 1] and compare
/// each bin's mean marginal with the observed positive rate. Empty bins are
/// omitted.
pub fn calibration_curve(
    marginals: &Array1<f64>,
    gold: &[i8],
    n_bins: usize,
) -> Result<Vec<CalibrationBin>> {
    if marginals.len() != gold.len() {
        return Err(SnorkelError::GoldLabelLength {
            candidates: marginals.len(),
            gold: gold.len(),
        });
    }
    let n_bins = n_bins.max(1);
    let edges: Vec<f64> = linspace(0.0, 1.0, n_bins + 1).collect();

    let mut sums = vec![0.0; n_bins];
    let mut positives = vec![0usize; n_bins];
    let mut counts = vec![0usize; n_bins];
    for (&p, &g) in marginals.iter().zip(gold) {
        let bin = ((p.clamp(0.0, 1.0) * n_bins as f64) as usize).min(n_bins - 1);
        sums[bin] += p;
        counts[bin] += 1;
        if g == 1 {
            positives[bin] += 1;
        }
    }

    Ok((0..n_bins)
        .filter(|&b| counts[b] > 0)
        .map(|b| CalibrationBin {
            lower: edges[b],
            upper: edges[b + 1],
            mean_marginal: sums[b] / counts[b] as f64,
            positive_rate: positives[b] as f64 / counts[b] as f64,
            count: counts[b],
        })
        .collect())
}

/// Overlaid histograms of the train and test marginal distributions.
pub fn plot_marginal_histogram(
    train_marginals: &Array1<f64>,
    test_marginals: &Array1<f64>,
    title: &str,
) -> Plot {
    let trace_train = Histogram::new(train_marginals.to_vec())
        .name("Train")
        .opacity(0.6);
    let trace_test = Histogram::new(test_marginals.to_vec())
        .name("Test")
        .opacity(0.6);

    let layout = Layout::new()
        .title(title)
        .bar_mode(BarMode::Overlay)
        .x_axis(Axis::new().title("Marginal probability"))
        .y_axis(Axis::new().title("Count"));

    let mut plot = Plot::new();
    plot.add_trace(trace_train);
    plot.add_trace(trace_test);
    plot.set_layout(layout);
    plot
}

/// Reliability diagram of test marginals against gold labels.
pub fn plot_calibration(
    test_marginals: &Array1<f64>,
    gold: &[i8],
    n_bins: usize,
    title: &str,
) -> Result<Plot> {
    let bins = calibration_curve(test_marginals, gold, n_bins)?;

    let curve = Scatter::new(
        bins.iter().map(|b| b.mean_marginal).collect::<Vec<f64>>(),
        bins.iter().map(|b| b.positive_rate).collect::<Vec<f64>>(),
    )
    .mode(Mode::LinesMarkers)
    .name("Test set");

    let reference_line = Scatter::new(vec![0.0, 1.0], vec![0.0, 1.0])
        .mode(Mode::Lines)
        .name("Perfect calibration")
        .line(Line::new().color("red").dash(DashType::Dash));

    let mut plot = Plot::new();
    plot.add_trace(curve);
    plot.add_trace(reference_line);
    plot.set_layout(
        Layout::new()
            .title(title)
            .x_axis(Axis::new().title("Mean marginal probability"))
            .y_axis(Axis::new().title("Fraction positive (gold)")),
    );
    Ok(plot)
}
