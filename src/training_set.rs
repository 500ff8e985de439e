//! The noisy training set: candidates, labeling functions and an optional
//! featurizer, together with the label and feature matrices computed for the
//! training candidates.
use crate::error::{Result, SnorkelError};
use crate::features::{featurize, fit_featurize, Featurizer};
use crate::labeling::{apply_lfs, LabelMatrixSummary, LabelingFunction};
use crate::math::SparseMatrix;

/// Label and feature matrices for a sequence of candidates.
pub type Transformed = (SparseMatrix<i8>, SparseMatrix<f64>);

/// What a learner needs from a training set: the fitted training matrices and
/// a way to transform held-out candidates with the fitted schema.
pub trait TrainingData<C> {
    /// Label matrix of the training candidates, `(n_train, num_lfs)`.
    fn label_matrix(&self) -> &SparseMatrix<i8>;

    /// Feature matrix of the training candidates, `(n_train, num_features)`.
    fn feature_matrix(&self) -> &SparseMatrix<f64>;

    /// Apply the LFs and the fitted featurizer to new candidates.
    fn transform(&self, candidates: &[C]) -> Result<Transformed>;
}

/// Training candidates with their LF votes and features.
///
/// Construction is eager: the LFs are applied and the featurizer is fitted on
/// the training candidates immediately.
pub struct TrainingSet<C> {
    candidates: Vec<C>,
    lfs: Vec<LabelingFunction<C>>,
    featurizer: Option<Box<dyn Featurizer<C>>>,
    l: SparseMatrix<i8>,
    f: SparseMatrix<f64>,
}

impl<C> TrainingSet<C> {
    pub fn new(
        candidates: Vec<C>,
        lfs: Vec<LabelingFunction<C>>,
        featurizer: Option<Box<dyn Featurizer<C>>>,
    ) -> Result<Self> {
        let mut training_set = TrainingSet {
            candidates: Vec::new(),
            lfs,
            featurizer,
            l: SparseMatrix::zeros(0, 0),
            f: SparseMatrix::zeros(0, 0),
        };
        let (l, f) = training_set.fit_transform(&candidates)?;
        training_set.candidates = candidates;
        training_set.l = l;
        training_set.f = f;
        training_set.log_summary();
        Ok(training_set)
    }

    /// Apply the LFs and fit the featurizer on `candidates`, learning the
    /// feature schema later transforms must match.
    fn fit_transform(&mut self, candidates: &[C]) -> Result<Transformed> {
        log::info!("Applying LFs...");
        let l = apply_lfs(&self.lfs, candidates)?;
        if self.featurizer.is_some() {
            log::info!("Featurizing...");
        }
        let f = fit_featurize(self.featurizer.as_deref_mut(), candidates)?;
        Ok((l, f))
    }

    pub fn candidates(&self) -> &[C] {
        &self.candidates
    }

    pub fn lfs(&self) -> &[LabelingFunction<C>] {
        &self.lfs
    }

    pub fn lf_names(&self) -> Vec<&str> {
        self.lfs.iter().map(|lf| lf.name()).collect()
    }

    pub fn num_lfs(&self) -> usize {
        self.lfs.len()
    }

    pub fn num_features(&self) -> usize {
        self.f.ncols()
    }

    pub fn has_featurizer(&self) -> bool {
        self.featurizer.is_some()
    }

    pub fn summary(&self) -> LabelMatrixSummary {
        LabelMatrixSummary::from_matrix(&self.l)
    }

    fn log_summary(&self) {
        log::info!(
            "Training set: {} candidates, {} LFs, {} features",
            self.candidates.len(),
            self.num_lfs(),
            self.num_features()
        );
        self.summary().log_summary(&self.lf_names());
    }
}

impl<C> TrainingData<C> for TrainingSet<C> {
    fn label_matrix(&self) -> &SparseMatrix<i8> {
        &self.l
    }

    fn feature_matrix(&self) -> &SparseMatrix<f64> {
        &self.f
    }

    fn transform(&self, candidates: &[C]) -> Result<Transformed> {
        log::info!("Applying LFs...");
        let l = apply_lfs(&self.lfs, candidates)?;
        if self.featurizer.is_some() {
            log::info!("Featurizing...");
        }
        let f = featurize(self.featurizer.as_deref(), candidates)?;
        if f.ncols() != self.f.ncols() {
            return Err(SnorkelError::FeatureSchemaMismatch {
                expected: self.f.ncols(),
                found: f.ncols(),
            });
        }
        Ok((l, f))
    }
}
