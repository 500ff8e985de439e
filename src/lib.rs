//! snorkel-learn: weak-supervision training from noisy labeling functions.
//!
//! Candidates are labeled by a set of labeling functions (LFs) instead of
//! ground truth. The LF outputs form a sparse label matrix `L`, an optional
//! featurizer produces a sparse feature matrix `F`, and a [`learner::Learner`]
//! combines both into the input of a noise-aware model using one of two
//! strategies:
//!
//! - [`learner::Joint`]: a single model over `[L | F]`, whose weights are then
//!   split back into LF weights and feature weights.
//! - [`learner::Pipelined`]: a generative model over `L` alone whose marginals
//!   become soft labels for a discriminative model over `F`.
//!
//! The model, scorer and plotting backends sit behind small traits so they can
//! be swapped for test doubles.
pub mod config;
pub mod error;
pub mod features;
pub mod labeling;
pub mod learner;
pub mod math;
pub mod models;
pub mod report;
pub mod scoring;
pub mod training_set;

pub use error::{Result, SnorkelError};
