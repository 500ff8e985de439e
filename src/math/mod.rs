//! Sparse matrix type shared by the LF engine, featurizers and models.
//!
//! Dense vectors (weights, marginals) use `ndarray::Array1<f64>`; the label,
//! feature and model input matrices are [`SparseMatrix`] values because
//! abstains and absent features dominate in practice.
pub mod sparse;

pub use sparse::{Layout, ShapeError, SparseMatrix};
