//! Scoring of hard predictions against gold labels.
use std::fmt;

use ndarray::Array1;
use serde::Serialize;

use crate::error::{Result, SnorkelError};

/// Confusion counts and summary statistics of a test run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scores {
    pub tp: usize,
    pub fp: usize,
    pub tn: usize,
    pub fn_: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub accuracy: f64,
}

fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// Score predictions in {-1, 0, 1} against gold labels in {-1, 1}.
///
/// A prediction of 0 counts towards neither class, so it only lowers accuracy.
pub fn test_scores(predictions: &Array1<f64>, gold: &[i8]) -> Result<Scores> {
    if predictions.len() != gold.len() {
        return Err(SnorkelError::GoldLabelLength {
            candidates: predictions.len(),
            gold: gold.len(),
        });
    }
    if let Some(&bad) = gold.iter().find(|&&g| g != 1 && g != -1) {
        return Err(SnorkelError::InvalidGoldLabel(bad));
    }

    let (mut tp, mut fp, mut tn, mut fn_) = (0, 0, 0, 0);
    for (&pred, &g) in predictions.iter().zip(gold) {
        match (pred, g) {
            (p, 1) if p == 1.0 => tp += 1,
            (p, -1) if p == 1.0 => fp += 1,
            (p, -1) if p == -1.0 => tn += 1,
            (p, 1) if p == -1.0 => fn_ += 1,
            _ => {}
        }
    }

    let precision = ratio(tp as f64, (tp + fp) as f64);
    let recall = ratio(tp as f64, (tp + fn_) as f64);
    Ok(Scores {
        tp,
        fp,
        tn,
        fn_,
        precision,
        recall,
        f1: ratio(2.0 * precision * recall, precision + recall),
        accuracy: ratio((tp + tn) as f64, gold.len() as f64),
    })
}

impl Scores {
    pub fn log_summary(&self) {
        log::info!("----- Test Set Scores -----");
        for line in self.to_string().lines() {
            log::info!("{}", line);
        }
        log::info!("---------------------------");
    }
}

impl fmt::Display for Scores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pos. class accuracy: {:.3}", ratio(self.tp as f64, (self.tp + self.fn_) as f64))?;
        writeln!(f, "Neg. class accuracy: {:.3}", ratio(self.tn as f64, (self.tn + self.fp) as f64))?;
        writeln!(f, "Precision            {:.3}", self.precision)?;
        writeln!(f, "Recall               {:.3}", self.recall)?;
        writeln!(f, "F1                   {:.3}", self.f1)?;
        writeln!(f, "Accuracy             {:.3}", self.accuracy)?;
        write!(
            f,
            "TP: {} | FP: {} | TN: {} | FN: {}",
            self.tp, self.fp, self.tn, self.fn_
        )
    }
}
