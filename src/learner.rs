//! Learners: combine LF votes and features into a model input, train a
//! noise-aware model on it, and evaluate against gold labels.
//!
//! Two combination strategies are provided:
//!
//! * [`Joint`] trains a single model over `[L | F]` and splits its weight
//!   vector back into LF weights and feature weights.
//! * [`Pipelined`] first trains a generative model over `L` alone, then trains
//!   the end model over `F` alone using the generative marginals as soft labels.
use std::marker::PhantomData;
use std::rc::Rc;

use ndarray::{s, Array1};

use crate::config::TrainParams;
use crate::error::{Result, SnorkelError};
use crate::math::{Layout, SparseMatrix};
use crate::models::{odds_to_prob, LogReg, NoiseAwareModel};
use crate::report::CalibrationPlotter;
use crate::scoring::{test_scores, Scores};
use crate::training_set::TrainingData;

/// How LF votes and features are combined and trained on.
pub trait CombinationStrategy {
    /// Build the end model's input matrix from a label matrix and a feature
    /// matrix of the same candidates.
    fn build_input(&self, l: &SparseMatrix<i8>, f: &SparseMatrix<f64>)
        -> Result<SparseMatrix<f64>>;

    /// Column count of the model input for `m` LFs and `f` features.
    fn input_width(&self, m: usize, f: usize) -> usize;

    /// Train `model` (and any strategy-owned model) from the training
    /// matrices. Returns the model input built for the training candidates.
    fn train<M: NoiseAwareModel>(
        &mut self,
        model: &mut M,
        l: &SparseMatrix<i8>,
        f: &SparseMatrix<f64>,
        params: &TrainParams,
    ) -> Result<SparseMatrix<f64>>;

    /// Learned per-LF weights (log-odds of LF accuracy).
    fn lf_weights<M: NoiseAwareModel>(&self, model: &M, m: usize) -> Result<Array1<f64>>;

    /// Learned per-feature weights.
    fn feat_weights<M: NoiseAwareModel>(&self, model: &M, m: usize) -> Result<Array1<f64>>;

    fn default_params(&self) -> TrainParams;

    fn name(&self) -> &str;
}

/// A single model over the concatenation of LF votes and features.
#[derive(Debug, Clone, Copy, Default)]
pub struct Joint;

impl Joint {
    fn trained_weights<M: NoiseAwareModel>(model: &M, m: usize) -> Result<&Array1<f64>> {
        let w = model.weights().ok_or(SnorkelError::NotTrained)?;
        if w.len() < m {
            return Err(SnorkelError::WeightLength {
                expected: m,
                found: w.len(),
            });
        }
        Ok(w)
    }
}

impl CombinationStrategy for Joint {
    fn build_input(
        &self,
        l: &SparseMatrix<i8>,
        f: &SparseMatrix<f64>,
    ) -> Result<SparseMatrix<f64>> {
        Ok(SparseMatrix::hstack(&[&l.to_f64(), f], Layout::Csc)?)
    }

    fn input_width(&self, m: usize, f: usize) -> usize {
        m + f
    }

    fn train<M: NoiseAwareModel>(
        &mut self,
        model: &mut M,
        l: &SparseMatrix<i8>,
        f: &SparseMatrix<f64>,
        params: &TrainParams,
    ) -> Result<SparseMatrix<f64>> {
        // LF columns first, feature columns after.
        let w0: Array1<f64> = std::iter::repeat(params.lf_w0)
            .take(l.ncols())
            .chain(std::iter::repeat(params.feat_w0).take(f.ncols()))
            .collect();

        let x_train = self.build_input(l, f)?;
        model.train(&x_train, &w0, None, &params.model)?;
        Ok(x_train)
    }

    fn lf_weights<M: NoiseAwareModel>(&self, model: &M, m: usize) -> Result<Array1<f64>> {
        Ok(Self::trained_weights(model, m)?.slice(s![..m]).to_owned())
    }

    fn feat_weights<M: NoiseAwareModel>(&self, model: &M, m: usize) -> Result<Array1<f64>> {
        Ok(Self::trained_weights(model, m)?.slice(s![m..]).to_owned())
    }

    fn default_params(&self) -> TrainParams {
        TrainParams::joint()
    }

    fn name(&self) -> &str {
        "joint"
    }
}

/// Generative model over LF votes, then an end model over features trained on
/// the generative marginals.
#[derive(Debug, Clone, Default)]
pub struct Pipelined<G = LogReg> {
    training_model: G,
    training_marginals: Option<Array1<f64>>,
}

impl<G: NoiseAwareModel> Pipelined<G> {
    pub fn new(training_model: G) -> Self {
        Self {
            training_model,
            training_marginals: None,
        }
    }

    /// The generative model fitted on the label matrix.
    pub fn training_model(&self) -> &G {
        &self.training_model
    }

    /// Soft labels the end model was trained on, `None` before training.
    pub fn training_marginals(&self) -> Option<&Array1<f64>> {
        self.training_marginals.as_ref()
    }
}

impl<G: NoiseAwareModel + Clone> CombinationStrategy for Pipelined<G> {
    /// Features only; the label matrix is ignored.
    fn build_input(
        &self,
        _l: &SparseMatrix<i8>,
        f: &SparseMatrix<f64>,
    ) -> Result<SparseMatrix<f64>> {
        Ok(f.to_csc())
    }

    fn input_width(&self, _m: usize, f: usize) -> usize {
        f
    }

    fn train<M: NoiseAwareModel>(
        &mut self,
        model: &mut M,
        l: &SparseMatrix<i8>,
        f: &SparseMatrix<f64>,
        params: &TrainParams,
    ) -> Result<SparseMatrix<f64>> {
        // Learn LF accuracies first, on a copy that replaces the current
        // generative model only once the end model has trained too.
        let l_train = l.to_f64().to_csc();
        let w0_lf = Array1::from_elem(l.ncols(), params.lf_w0);
        let mut training_model = self.training_model.clone();
        training_model.train(&l_train, &w0_lf, None, &params.model)?;
        let training_marginals = training_model.marginals(&l_train)?;
        log::debug!(
            "Generative model marginals: mean {:.3} over {} candidates",
            training_marginals.mean().unwrap_or(0.0),
            training_marginals.len()
        );

        // Then the end model over features, with the marginals as soft labels.
        let x_train = self.build_input(l, f)?;
        let w0_feat = Array1::from_elem(f.ncols(), params.feat_w0);
        model.train(&x_train, &w0_feat, Some(&training_marginals), &params.model)?;

        self.training_model = training_model;
        self.training_marginals = Some(training_marginals);
        Ok(x_train)
    }

    fn lf_weights<M: NoiseAwareModel>(&self, _model: &M, _m: usize) -> Result<Array1<f64>> {
        self.training_model
            .weights()
            .cloned()
            .ok_or(SnorkelError::NotTrained)
    }

    fn feat_weights<M: NoiseAwareModel>(&self, model: &M, _m: usize) -> Result<Array1<f64>> {
        model.weights().cloned().ok_or(SnorkelError::NotTrained)
    }

    fn default_params(&self) -> TrainParams {
        TrainParams::pipelined()
    }

    fn name(&self) -> &str {
        "pipelined"
    }
}

/// The most recently transformed test set.
///
/// Returned by [`Learner::test`] and passed back into the next call; the
/// model input is reused as long as both the candidates and the gold labels
/// are unchanged.
#[derive(Debug, Clone)]
pub struct TestCache<C> {
    candidates: Vec<C>,
    gold_labels: Vec<i8>,
    x_test: SparseMatrix<f64>,
}

impl<C: PartialEq> TestCache<C> {
    /// Whether this cache can serve `candidates`/`gold`.
    ///
    /// Gold labels of a different length than the cached ones for the same
    /// candidates are an error rather than a silent miss.
    pub fn is_fresh(&self, candidates: &[C], gold: &[i8]) -> Result<bool> {
        if self.candidates.as_slice() != candidates {
            return Ok(false);
        }
        if self.gold_labels.len() != gold.len() {
            return Err(SnorkelError::CachedGoldLength {
                cached: self.gold_labels.len(),
                found: gold.len(),
            });
        }
        Ok(self.gold_labels.as_slice() == gold)
    }

    pub fn candidates(&self) -> &[C] {
        &self.candidates
    }

    pub fn gold_labels(&self) -> &[i8] {
        &self.gold_labels
    }

    pub fn x_test(&self) -> &SparseMatrix<f64> {
        &self.x_test
    }
}

/// Result of one [`Learner::test`] call.
#[derive(Debug, Clone)]
pub struct TestOutcome<C> {
    pub scores: Scores,
    pub cache: TestCache<C>,
    /// False when the cached model input was reused.
    pub recomputed: bool,
}

/// Trains a noise-aware model on a shared training set using strategy `B`.
pub struct Learner<C, S, M, B = Joint> {
    training_set: Rc<S>,
    model: M,
    strategy: B,
    n_train: usize,
    m: usize,
    f: usize,
    x_train: Option<SparseMatrix<f64>>,
    plotter: Option<Box<dyn CalibrationPlotter>>,
    _candidates: PhantomData<fn(&C)>,
}

pub type JointLearner<C, S, M> = Learner<C, S, M, Joint>;
pub type PipelinedLearner<C, S, M, G = LogReg> = Learner<C, S, M, Pipelined<G>>;

impl<C, S, M> Learner<C, S, M, Joint>
where
    S: TrainingData<C>,
    M: NoiseAwareModel,
{
    pub fn joint(training_set: Rc<S>, model: M) -> Self {
        Learner::new(training_set, model, Joint)
    }
}

impl<C, S, M> Learner<C, S, M, Pipelined<LogReg>>
where
    S: TrainingData<C>,
    M: NoiseAwareModel,
{
    /// Pipelined learner whose generative stage is a fresh [`LogReg`].
    pub fn pipelined(training_set: Rc<S>, model: M) -> Self {
        Learner::new(training_set, model, Pipelined::new(LogReg::new()))
    }
}

impl<C, S, M, B> Learner<C, S, M, B>
where
    S: TrainingData<C>,
    M: NoiseAwareModel,
    B: CombinationStrategy,
{
    pub fn new(training_set: Rc<S>, model: M, strategy: B) -> Self {
        let (n_train, m) = training_set.label_matrix().shape();
        let f = training_set.feature_matrix().ncols();
        Learner {
            training_set,
            model,
            strategy,
            n_train,
            m,
            f,
            x_train: None,
            plotter: None,
            _candidates: PhantomData,
        }
    }

    /// Attach a plotter used by [`Learner::test`] when plots are requested.
    pub fn with_plotter(mut self, plotter: Box<dyn CalibrationPlotter>) -> Self {
        self.plotter = Some(plotter);
        self
    }

    /// `(n_train, num_lfs, num_features)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.n_train, self.m, self.f)
    }

    pub fn training_set(&self) -> &Rc<S> {
        &self.training_set
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn strategy(&self) -> &B {
        &self.strategy
    }

    pub fn x_train(&self) -> Option<&SparseMatrix<f64>> {
        self.x_train.as_ref()
    }

    pub fn is_trained(&self) -> bool {
        self.x_train.is_some()
    }

    /// Train from scratch, discarding any earlier training state. After a
    /// failed call the learner reports `NotTrained` until training succeeds.
    pub fn train(&mut self, params: &TrainParams) -> Result<()> {
        log::info!(
            "Training {} learner on {} candidates ({} LFs, {} features)",
            self.strategy.name(),
            self.n_train,
            self.m,
            self.f
        );
        self.x_train = None;
        let x_train = self.strategy.train(
            &mut self.model,
            self.training_set.label_matrix(),
            self.training_set.feature_matrix(),
            params,
        )?;
        self.x_train = Some(x_train);
        Ok(())
    }

    /// Train with the strategy's default initial weights.
    pub fn train_default(&mut self) -> Result<()> {
        let params = self.strategy.default_params();
        self.train(&params)
    }

    /// Marginal probabilities of the training candidates under the end model.
    pub fn train_marginals(&self) -> Result<Array1<f64>> {
        let x_train = self.x_train.as_ref().ok_or(SnorkelError::NotTrained)?;
        self.model.marginals(x_train)
    }

    /// Evaluate on `candidates` against `gold` labels in {-1, 1}.
    ///
    /// Pass the cache returned by the previous call to skip transforming the
    /// same test set again. When `show_plots` is set and a plotter is
    /// attached, calibration plots of train vs test marginals are rendered.
    pub fn test(
        &self,
        candidates: &[C],
        gold: &[i8],
        cache: Option<TestCache<C>>,
        show_plots: bool,
    ) -> Result<TestOutcome<C>>
    where
        C: Clone + PartialEq,
    {
        let x_train = self.x_train.as_ref().ok_or(SnorkelError::NotTrained)?;

        // A cache built by a learner with a different input layout is a miss.
        let fresh = match &cache {
            Some(cache) => {
                cache.is_fresh(candidates, gold)?
                    && cache.x_test.ncols() == self.strategy.input_width(self.m, self.f)
            }
            None => false,
        };
        if gold.len() != candidates.len() {
            return Err(SnorkelError::GoldLabelLength {
                candidates: candidates.len(),
                gold: gold.len(),
            });
        }

        let (cache, recomputed) = match cache {
            Some(cache) if fresh => {
                log::debug!("Reusing cached test matrix for {} candidates", candidates.len());
                (cache, false)
            }
            _ => {
                let (l_test, f_test) = self.training_set.transform(candidates)?;
                let x_test = self.strategy.build_input(&l_test, &f_test)?;
                let cache = TestCache {
                    candidates: candidates.to_vec(),
                    gold_labels: gold.to_vec(),
                    x_test,
                };
                (cache, true)
            }
        };

        let predictions = self.model.predict(&cache.x_test)?;
        let scores = test_scores(&predictions, gold)?;
        scores.log_summary();

        if show_plots {
            match &self.plotter {
                Some(plotter) => plotter.plot(
                    &self.model.marginals(x_train)?,
                    &self.model.marginals(&cache.x_test)?,
                    gold,
                )?,
                None => log::warn!("Plots requested but no calibration plotter is attached"),
            }
        }

        Ok(TestOutcome {
            scores,
            cache,
            recomputed,
        })
    }

    fn ensure_trained(&self) -> Result<()> {
        match self.x_train {
            Some(_) => Ok(()),
            None => Err(SnorkelError::NotTrained),
        }
    }

    /// Per-LF weights. Fails with `NotTrained` until a `train` call succeeds.
    pub fn lf_weights(&self) -> Result<Array1<f64>> {
        self.ensure_trained()?;
        self.strategy.lf_weights(&self.model, self.m)
    }

    /// Per-LF accuracy estimates in [0, 1].
    pub fn lf_accs(&self) -> Result<Array1<f64>> {
        Ok(self.lf_weights()?.mapv(odds_to_prob))
    }

    /// Per-feature weights.
    pub fn feat_weights(&self) -> Result<Array1<f64>> {
        self.ensure_trained()?;
        self.strategy.feat_weights(&self.model, self.m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_joint_input_concatenates_columns() {
        let l = SparseMatrix::from_triplets((2, 2), vec![(0, 0, 1i8), (1, 1, -1)]).unwrap();
        let f = SparseMatrix::from_triplets((2, 1), vec![(1, 0, 0.5)]).unwrap();
        let x = Joint.build_input(&l, &f).unwrap();
        assert_eq!(x.layout(), Layout::Csc);
        assert_eq!(x.to_dense(), array![[1.0, 0.0, 0.0], [0.0, -1.0, 0.5]]);
    }

    #[test]
    fn test_joint_input_row_mismatch() {
        let l = SparseMatrix::<i8>::zeros(2, 2);
        let f = SparseMatrix::<f64>::zeros(3, 1);
        assert!(matches!(
            Joint.build_input(&l, &f),
            Err(SnorkelError::Shape(_))
        ));
    }

    #[test]
    fn test_pipelined_input_ignores_labels() {
        let f = SparseMatrix::from_triplets((2, 2), vec![(0, 1, 2.0)]).unwrap();
        let strategy = Pipelined::new(LogReg::new());
        let a = strategy
            .build_input(&SparseMatrix::zeros(2, 3), &f)
            .unwrap();
        let b = strategy
            .build_input(
                &SparseMatrix::from_triplets((2, 1), vec![(0, 0, 1i8)]).unwrap(),
                &f,
            )
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(a, f.to_csc());
    }

    #[test]
    fn test_cache_freshness() {
        let cache = TestCache {
            candidates: vec![1, 2],
            gold_labels: vec![1, -1],
            x_test: SparseMatrix::zeros(2, 0),
        };
        assert!(cache.is_fresh(&[1, 2], &[1, -1]).unwrap());
        assert!(!cache.is_fresh(&[1, 2], &[1, 1]).unwrap());
        assert!(!cache.is_fresh(&[2, 1], &[1, -1]).unwrap());
        assert!(!cache.is_fresh(&[1, 2, 3], &[1, -1, 1]).unwrap());
        assert!(matches!(
            cache.is_fresh(&[1, 2], &[1]),
            Err(SnorkelError::CachedGoldLength { cached: 2, found: 1 })
        ));
    }
}
