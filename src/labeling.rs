//! Labeling functions and the engine that applies them to candidates.
//!
//! A labeling function (LF) votes on a single candidate: positive, negative or
//! abstain. Applying every LF to every candidate yields the label matrix `L`
//! with one row per candidate and one column per LF.
use std::fmt;

use crate::error::{Result, SnorkelError};
use crate::math::SparseMatrix;

/// A single LF vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Negative = -1,
    Abstain = 0,
    Positive = 1,
}

impl Label {
    pub fn value(self) -> i8 {
        self as i8
    }
}

impl TryFrom<i8> for Label {
    type Error = SnorkelError;

    fn try_from(value: i8) -> Result<Self> {
        Label::try_from(i64::from(value))
    }
}

impl TryFrom<i64> for Label {
    type Error = SnorkelError;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            -1 => Ok(Label::Negative),
            0 => Ok(Label::Abstain),
            1 => Ok(Label::Positive),
            other => Err(SnorkelError::InvalidLabel(other)),
        }
    }
}

impl From<bool> for Label {
    fn from(value: bool) -> Self {
        if value {
            Label::Positive
        } else {
            Label::Negative
        }
    }
}

type LfFn<C> = Box<dyn Fn(&C) -> anyhow::Result<Label>>;

/// A named heuristic mapping a candidate to a [`Label`].
pub struct LabelingFunction<C> {
    name: String,
    func: LfFn<C>,
}

impl<C> LabelingFunction<C> {
    /// Wrap an LF that cannot fail.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&C) -> Label + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(move |c| Ok(func(c))),
        }
    }

    /// Wrap an LF that may fail, e.g. because it parses candidate text.
    pub fn fallible<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&C) -> anyhow::Result<Label> + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn apply(&self, candidate: &C) -> anyhow::Result<Label> {
        (self.func)(candidate)
    }
}

impl<C> fmt::Debug for LabelingFunction<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabelingFunction")
            .field("name", &self.name)
            .finish()
    }
}

/// Apply every LF to every candidate.
///
/// Returns a row-major matrix of shape `(candidates.len(), lfs.len())` with
/// entries in {-1, 0, 1}. Abstains are not stored. The first failing LF aborts
/// the whole application.
pub fn apply_lfs<C>(lfs: &[LabelingFunction<C>], candidates: &[C]) -> Result<SparseMatrix<i8>> {
    let mut triplets = Vec::new();
    for (i, candidate) in candidates.iter().enumerate() {
        for (j, lf) in lfs.iter().enumerate() {
            let label = lf
                .apply(candidate)
                .map_err(|source| SnorkelError::LabelingFunction {
                    lf: lf.name().to_string(),
                    candidate: i,
                    source,
                })?;
            if label != Label::Abstain {
                triplets.push((i, j, label.value()));
            }
        }
    }

    let l = SparseMatrix::from_triplets((candidates.len(), lfs.len()), triplets)?;
    log::debug!(
        "Label matrix: {} candidates x {} LFs, {} non-abstain votes",
        l.nrows(),
        l.ncols(),
        l.nnz()
    );
    Ok(l)
}

/// Per-LF diagnostics over a label matrix.
///
/// * coverage: fraction of candidates the LF labels
/// * overlap: fraction of candidates the LF labels that another LF also labels
/// * conflict: fraction of candidates the LF labels that another LF labels differently
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct LabelMatrixSummary {
    pub coverage: Vec<f64>,
    pub overlap: Vec<f64>,
    pub conflict: Vec<f64>,
}

impl LabelMatrixSummary {
    pub fn from_matrix(l: &SparseMatrix<i8>) -> Self {
        let (n, m) = l.shape();
        let csr = l.to_csr();

        let mut rows: Vec<Vec<(usize, i8)>> = vec![Vec::new(); n];
        for (r, c, v) in csr.iter() {
            rows[r].push((c, v));
        }

        let mut covered = vec![0usize; m];
        let mut overlapped = vec![0usize; m];
        let mut conflicted = vec![0usize; m];
        for votes in &rows {
            for &(j, v) in votes {
                covered[j] += 1;
                if votes.len() > 1 {
                    overlapped[j] += 1;
                }
                if votes.iter().any(|&(k, w)| k != j && w != v) {
                    conflicted[j] += 1;
                }
            }
        }

        let frac = |counts: Vec<usize>| -> Vec<f64> {
            counts
                .into_iter()
                .map(|c| if n == 0 { 0.0 } else { c as f64 / n as f64 })
                .collect()
        };

        LabelMatrixSummary {
            coverage: frac(covered),
            overlap: frac(overlapped),
            conflict: frac(conflicted),
        }
    }

    pub fn log_summary(&self, names: &[&str]) {
        log::debug!("----- LF Summary -----");
        for (j, name) in names.iter().enumerate() {
            if self.coverage[j] == 0.0 {
                log::warn!("LF '{}' did not label any candidate", name);
            }
            log::debug!(
                "{}: coverage {:.3}, overlap {:.3}, conflict {:.3}",
                name,
                self.coverage[j],
                self.overlap[j],
                self.conflict[j]
            );
        }
    }
}
