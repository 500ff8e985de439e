//! Test doubles shared by the integration tests.
#![allow(dead_code)]

use std::cell::Cell;

use ndarray::Array1;
use snorkel_learn::config::LogRegParams;
use snorkel_learn::labeling::{Label, LabelingFunction};
use snorkel_learn::math::SparseMatrix;
use snorkel_learn::models::{odds_to_prob, NoiseAwareModel};
use snorkel_learn::training_set::{TrainingData, TrainingSet, Transformed};
use snorkel_learn::Result;

/// Keeps its initial weights; marginals are the sigmoid of the weighted vote,
/// so predictions are the sign of the weighted vote.
#[derive(Debug, Default, Clone)]
pub struct VoteModel {
    pub w: Option<Array1<f64>>,
    pub trained_with_marginals: Option<Array1<f64>>,
    pub train_calls: usize,
}

impl NoiseAwareModel for VoteModel {
    fn train(
        &mut self,
        _x: &SparseMatrix<f64>,
        w0: &Array1<f64>,
        training_marginals: Option<&Array1<f64>>,
        _params: &LogRegParams,
    ) -> Result<()> {
        self.w = Some(w0.clone());
        self.trained_with_marginals = training_marginals.cloned();
        self.train_calls += 1;
        Ok(())
    }

    fn marginals(&self, x: &SparseMatrix<f64>) -> Result<Array1<f64>> {
        let w = self
            .w
            .as_ref()
            .ok_or(snorkel_learn::SnorkelError::NotTrained)?;
        Ok(x.dot(w)?.mapv(odds_to_prob))
    }

    fn weights(&self) -> Option<&Array1<f64>> {
        self.w.as_ref()
    }
}

/// A [`VoteModel`] whose `fail_on`-th `train` call fails after overwriting
/// its weights, like a model that diverges halfway through.
#[derive(Debug, Default, Clone)]
pub struct FlakyModel {
    pub inner: VoteModel,
    pub fail_on: usize,
}

impl FlakyModel {
    pub fn failing_on(fail_on: usize) -> Self {
        Self {
            inner: VoteModel::default(),
            fail_on,
        }
    }
}

impl NoiseAwareModel for FlakyModel {
    fn train(
        &mut self,
        x: &SparseMatrix<f64>,
        w0: &Array1<f64>,
        training_marginals: Option<&Array1<f64>>,
        params: &LogRegParams,
    ) -> Result<()> {
        self.inner.train(x, w0, training_marginals, params)?;
        if self.inner.train_calls == self.fail_on {
            return Err(snorkel_learn::SnorkelError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "training diverged",
            )));
        }
        Ok(())
    }

    fn marginals(&self, x: &SparseMatrix<f64>) -> Result<Array1<f64>> {
        self.inner.marginals(x)
    }

    fn weights(&self) -> Option<&Array1<f64>> {
        self.inner.weights()
    }
}

/// Delegates to a real training set and counts `transform` calls.
pub struct CountingTrainingData<C> {
    pub inner: TrainingSet<C>,
    pub transform_calls: Cell<usize>,
}

impl<C> CountingTrainingData<C> {
    pub fn new(inner: TrainingSet<C>) -> Self {
        Self {
            inner,
            transform_calls: Cell::new(0),
        }
    }
}

impl<C> TrainingData<C> for CountingTrainingData<C> {
    fn label_matrix(&self) -> &SparseMatrix<i8> {
        self.inner.label_matrix()
    }

    fn feature_matrix(&self) -> &SparseMatrix<f64> {
        self.inner.feature_matrix()
    }

    fn transform(&self, candidates: &[C]) -> Result<Transformed> {
        self.transform_calls.set(self.transform_calls.get() + 1);
        self.inner.transform(candidates)
    }
}

/// Candidates are (id, lf1 vote, lf2 vote) triples so LF outputs are easy to
/// dictate from the test.
pub type Votes = (u32, i8, i8);

pub fn vote_lfs() -> Vec<LabelingFunction<Votes>> {
    vec![
        LabelingFunction::fallible("lf1", |c: &Votes| Ok(Label::try_from(c.1)?)),
        LabelingFunction::fallible("lf2", |c: &Votes| Ok(Label::try_from(c.2)?)),
    ]
}

/// 3 candidates with LF1 = [+1, -1, 0] and LF2 = [+1, 0, +1].
pub fn toy_candidates() -> Vec<Votes> {
    vec![(0, 1, 1), (1, -1, 0), (2, 0, 1)]
}
