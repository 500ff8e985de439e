use std::error::Error;
use std::fmt;

use crate::math::ShapeError;

pub type Result<T> = std::result::Result<T, SnorkelError>;

/// Errors raised while building matrices, training or evaluating a learner.
#[derive(Debug)]
pub enum SnorkelError {
    /// Row/column disagreement between matrices or vectors.
    Shape(ShapeError),
    /// A labeling function failed on a candidate; the whole transform is aborted.
    LabelingFunction {
        lf: String,
        candidate: usize,
        source: anyhow::Error,
    },
    /// A value outside {-1, 0, 1} was offered as a label.
    InvalidLabel(i64),
    /// The external featurizer reported a failure.
    Featurizer(anyhow::Error),
    /// Feature column count differs from the schema learned at fit time.
    FeatureSchemaMismatch { expected: usize, found: usize },
    /// A produced matrix does not have one row per candidate.
    RowCountMismatch { expected: usize, found: usize },
    /// Weights or marginals were requested before `train` was called.
    NotTrained,
    /// Gold labels and test candidates differ in length.
    GoldLabelLength { candidates: usize, gold: usize },
    /// Cached gold labels for the same candidates differ in length.
    CachedGoldLength { cached: usize, found: usize },
    /// Gold labels must be -1 or 1.
    InvalidGoldLabel(i8),
    /// The model's weight vector does not match the input matrix.
    WeightLength { expected: usize, found: usize },
    Config(String),
    Io(std::io::Error),
}

impl fmt::Display for SnorkelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SnorkelError::Shape(err) => write!(f, "shape mismatch: {}", err),
            SnorkelError::LabelingFunction { lf, candidate, source } => write!(
                f,
                "labeling function '{}' failed on candidate {}: {}",
                lf, candidate, source
            ),
            SnorkelError::InvalidLabel(value) => {
                write!(f, "invalid label {}, expected one of -1, 0, 1", value)
            }
            SnorkelError::Featurizer(source) => write!(f, "featurizer failed: {}", source),
            SnorkelError::FeatureSchemaMismatch { expected, found } => write!(
                f,
                "featurizer produced {} columns but {} were fitted",
                found, expected
            ),
            SnorkelError::RowCountMismatch { expected, found } => write!(
                f,
                "expected {} rows (one per candidate), found {}",
                expected, found
            ),
            SnorkelError::NotTrained => write!(f, "model has not been trained"),
            SnorkelError::GoldLabelLength { candidates, gold } => write!(
                f,
                "{} gold labels supplied for {} test candidates",
                gold, candidates
            ),
            SnorkelError::CachedGoldLength { cached, found } => write!(
                f,
                "gold labels of length {} cannot be compared to cached labels of length {}",
                found, cached
            ),
            SnorkelError::InvalidGoldLabel(value) => {
                write!(f, "gold label {} is not in {{-1, 1}}", value)
            }
            SnorkelError::WeightLength { expected, found } => write!(
                f,
                "weight vector has length {} but {} were expected",
                found, expected
            ),
            SnorkelError::Config(msg) => write!(f, "invalid configuration: {}", msg),
            SnorkelError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl Error for SnorkelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SnorkelError::Shape(err) => Some(err),
            SnorkelError::LabelingFunction { source, .. } => Some(source.as_ref()),
            SnorkelError::Featurizer(source) => Some(source.as_ref()),
            SnorkelError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ShapeError> for SnorkelError {
    fn from(err: ShapeError) -> Self {
        SnorkelError::Shape(err)
    }
}

impl From<std::io::Error> for SnorkelError {
    fn from(err: std::io::Error) -> Self {
        SnorkelError::Io(err)
    }
}
