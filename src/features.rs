//! Featurization adapter.
//!
//! Featurizers follow fit/transform semantics: `fit_transform` learns the
//! feature schema from the training candidates, `transform` reuses it for new
//! candidates. How unseen features are handled is up to the featurizer.
use std::collections::{BTreeSet, HashMap};

use crate::error::{Result, SnorkelError};
use crate::math::SparseMatrix;

/// External featurizer producing one sparse row per candidate.
pub trait Featurizer<C> {
    /// Learn the feature schema from `candidates` and featurize them.
    fn fit_transform(&mut self, candidates: &[C]) -> anyhow::Result<SparseMatrix<f64>>;

    /// Featurize `candidates` with the schema learned by `fit_transform`.
    fn transform(&self, candidates: &[C]) -> anyhow::Result<SparseMatrix<f64>>;

    /// Number of learned features, `None` before fitting.
    fn num_features(&self) -> Option<usize>;
}

/// Featurize new candidates with an already fitted featurizer, or produce a
/// zero-column matrix when there is no featurizer.
pub fn featurize<C>(
    featurizer: Option<&(dyn Featurizer<C> + '_)>,
    candidates: &[C],
) -> Result<SparseMatrix<f64>> {
    match featurizer {
        None => Ok(SparseMatrix::zeros(candidates.len(), 0)),
        Some(featurizer) => check_rows(featurizer.transform(candidates), candidates.len()),
    }
}

/// Fit `featurizer` on `candidates` and return their features.
pub fn fit_featurize<C>(
    featurizer: Option<&mut (dyn Featurizer<C> + '_)>,
    candidates: &[C],
) -> Result<SparseMatrix<f64>> {
    match featurizer {
        None => Ok(SparseMatrix::zeros(candidates.len(), 0)),
        Some(featurizer) => check_rows(featurizer.fit_transform(candidates), candidates.len()),
    }
}

fn check_rows(
    f: anyhow::Result<SparseMatrix<f64>>,
    expected: usize,
) -> Result<SparseMatrix<f64>> {
    let f = f.map_err(SnorkelError::Featurizer)?;
    if f.nrows() != expected {
        return Err(SnorkelError::RowCountMismatch {
            expected,
            found: f.nrows(),
        });
    }
    Ok(f)
}

type TokenFn<C> = Box<dyn Fn(&C) -> Vec<String>>;

/// Binary bag-of-tokens featurizer.
///
/// Tokens are extracted with a user closure. `fit_transform` builds a sorted
/// vocabulary; `transform` silently drops tokens outside it.
pub struct VocabularyFeaturizer<C> {
    tokenize: TokenFn<C>,
    vocabulary: Option<HashMap<String, usize>>,
}

impl<C> VocabularyFeaturizer<C> {
    pub fn new<F>(tokenize: F) -> Self
    where
        F: Fn(&C) -> Vec<String> + 'static,
    {
        Self {
            tokenize: Box::new(tokenize),
            vocabulary: None,
        }
    }

    /// Feature names ordered by column index.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<(usize, String)> = self
            .vocabulary
            .iter()
            .flatten()
            .map(|(token, &idx)| (idx, token.clone()))
            .collect();
        names.sort();
        names.into_iter().map(|(_, token)| token).collect()
    }

    fn encode(
        &self,
        vocabulary: &HashMap<String, usize>,
        candidates: &[C],
    ) -> anyhow::Result<SparseMatrix<f64>> {
        let mut triplets = Vec::new();
        for (i, candidate) in candidates.iter().enumerate() {
            for token in (self.tokenize)(candidate) {
                if let Some(&j) = vocabulary.get(&token) {
                    triplets.push((i, j, 1.0));
                }
            }
        }
        Ok(SparseMatrix::from_triplets(
            (candidates.len(), vocabulary.len()),
            triplets,
        )?)
    }
}

impl<C> Featurizer<C> for VocabularyFeaturizer<C> {
    fn fit_transform(&mut self, candidates: &[C]) -> anyhow::Result<SparseMatrix<f64>> {
        let tokens: BTreeSet<String> = candidates
            .iter()
            .flat_map(|c| (self.tokenize)(c))
            .collect();
        let vocabulary: HashMap<String, usize> = tokens
            .into_iter()
            .enumerate()
            .map(|(idx, token)| (token, idx))
            .collect();
        log::debug!("Learned vocabulary of {} features", vocabulary.len());

        let f = self.encode(&vocabulary, candidates)?;
        self.vocabulary = Some(vocabulary);
        Ok(f)
    }

    fn transform(&self, candidates: &[C]) -> anyhow::Result<SparseMatrix<f64>> {
        let vocabulary = self
            .vocabulary
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("transform called before fit_transform"))?;
        self.encode(vocabulary, candidates)
    }

    fn num_features(&self) -> Option<usize> {
        self.vocabulary.as_ref().map(|v| v.len())
    }
}
