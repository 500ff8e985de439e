//! Integration tests for the pipelined learner: generative stage over LF
//! votes, end model over features.

mod common;

use std::rc::Rc;

use common::{toy_candidates, vote_lfs, CountingTrainingData, FlakyModel, VoteModel, Votes};
use ndarray::{array, Array1};
use snorkel_learn::config::TrainParams;
use snorkel_learn::features::VocabularyFeaturizer;
use snorkel_learn::labeling::{Label, LabelingFunction};
use snorkel_learn::learner::{CombinationStrategy, Learner, Pipelined};
use snorkel_learn::math::Layout;
use snorkel_learn::models::{LogReg, NoiseAwareModel};
use snorkel_learn::training_set::{TrainingData, TrainingSet};
use snorkel_learn::SnorkelError;

fn keyword_lf(name: &str, keyword: &'static str, label: Label) -> LabelingFunction<String> {
    LabelingFunction::new(name, move |c: &String| {
        if c.split_whitespace().any(|t| t == keyword) {
            label
        } else {
            Label::Abstain
        }
    })
}

fn words(c: &String) -> Vec<String> {
    c.split_whitespace().map(str::to_string).collect()
}

fn reviews() -> Vec<String> {
    [
        "good movie great",
        "good fun",
        "bad movie awful",
        "bad boring",
        "great plot",
        "awful plot",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn review_training_set() -> TrainingSet<String> {
    let lfs = vec![
        keyword_lf("good", "good", Label::Positive),
        keyword_lf("bad", "bad", Label::Negative),
        keyword_lf("great", "great", Label::Positive),
    ];
    TrainingSet::new(
        reviews(),
        lfs,
        Some(Box::new(VocabularyFeaturizer::new(words))),
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// Training
// ---------------------------------------------------------------------------

#[test]
fn end_model_trains_on_generative_marginals() {
    let ts = TrainingSet::new(toy_candidates(), vote_lfs(), None).unwrap();
    let mut learner: Learner<Votes, _, _, _> =
        Learner::pipelined(Rc::new(ts), VoteModel::default());
    learner.train_default().unwrap();

    let strategy = learner.strategy();
    let marginals = strategy.training_marginals().unwrap();
    assert_eq!(marginals.len(), 3);
    assert!(marginals.iter().all(|&p| p > 0.0 && p < 1.0));
    // Candidate 0 has two positive votes, candidate 1 a single negative one.
    assert!(marginals[0] > 0.5);
    assert!(marginals[1] < 0.5);

    let model = learner.model();
    assert_eq!(model.train_calls, 1);
    assert_eq!(model.trained_with_marginals.as_ref(), Some(marginals));
}

#[test]
fn model_input_is_features_only() {
    let ts = Rc::new(review_training_set());
    let mut learner: Learner<String, _, _, _> =
        Learner::pipelined(ts.clone(), VoteModel::default());
    learner.train_default().unwrap();

    let (n, m, f) = learner.shape();
    assert_eq!((n, m, f), (6, 3, 8));
    let x_train = learner.x_train().unwrap();
    assert_eq!(x_train.layout(), Layout::Csc);
    assert_eq!(x_train, &ts.feature_matrix().to_csc());
}

#[test]
fn weights_come_from_both_stages() {
    let mut learner: Learner<String, _, _, _> =
        Learner::pipelined(Rc::new(review_training_set()), VoteModel::default());
    let params = TrainParams {
        feat_w0: 0.25,
        ..TrainParams::pipelined()
    };
    learner.train(&params).unwrap();

    let lf_weights = learner.lf_weights().unwrap();
    assert_eq!(lf_weights.len(), 3);
    assert_eq!(
        Some(&lf_weights),
        learner.strategy().training_model().weights()
    );
    assert_eq!(learner.feat_weights().unwrap(), Array1::from_elem(8, 0.25));
    assert!(learner
        .lf_accs()
        .unwrap()
        .iter()
        .all(|&acc| (0.0..=1.0).contains(&acc)));
}

#[test]
fn custom_generative_model() {
    let ts = TrainingSet::new(toy_candidates(), vote_lfs(), None).unwrap();
    let mut learner: Learner<Votes, _, _, _> = Learner::new(
        Rc::new(ts),
        VoteModel::default(),
        Pipelined::new(VoteModel::default()),
    );
    learner.train(&TrainParams::pipelined()).unwrap();
    assert_eq!(learner.lf_weights().unwrap(), array![1.0, 1.0]);
    assert_eq!(learner.strategy().training_model().train_calls, 1);
    assert!(learner
        .strategy()
        .training_model()
        .trained_with_marginals
        .is_none());
}

#[test]
fn failed_end_model_keeps_previous_generative_model() {
    let ts = TrainingSet::new(toy_candidates(), vote_lfs(), None).unwrap();
    let mut learner: Learner<Votes, _, _, _> = Learner::new(
        Rc::new(ts),
        FlakyModel::failing_on(2),
        Pipelined::new(VoteModel::default()),
    );
    learner.train(&TrainParams::pipelined()).unwrap();
    let marginals = learner.strategy().training_marginals().unwrap().clone();

    let diverging = TrainParams {
        lf_w0: 9.0,
        ..TrainParams::pipelined()
    };
    assert!(learner.train(&diverging).is_err());
    assert!(!learner.is_trained());
    assert!(matches!(learner.lf_weights(), Err(SnorkelError::NotTrained)));
    assert!(matches!(learner.feat_weights(), Err(SnorkelError::NotTrained)));
    assert!(matches!(learner.lf_accs(), Err(SnorkelError::NotTrained)));

    // The generative stage of the failed run was discarded.
    let training_model = learner.strategy().training_model();
    assert_eq!(training_model.weights(), Some(&array![1.0, 1.0]));
    assert_eq!(training_model.train_calls, 1);
    assert_eq!(learner.strategy().training_marginals(), Some(&marginals));

    learner
        .train(&TrainParams {
            lf_w0: 2.0,
            ..TrainParams::pipelined()
        })
        .unwrap();
    assert_eq!(learner.lf_weights().unwrap(), array![2.0, 2.0]);
    assert_eq!(learner.strategy().training_model().train_calls, 2);
}

#[test]
fn weights_before_training() {
    let learner: Learner<String, _, _, _> =
        Learner::pipelined(Rc::new(review_training_set()), VoteModel::default());
    assert!(matches!(learner.lf_weights(), Err(SnorkelError::NotTrained)));
    assert!(matches!(
        learner.feat_weights(),
        Err(SnorkelError::NotTrained)
    ));
    assert!(learner.strategy().training_marginals().is_none());
}

#[test]
fn noisy_lf_gets_lower_accuracy() {
    // LF 0 and LF 1 agree everywhere they both vote; LF 2 contradicts them
    // on half of its votes.
    let candidates: Vec<Vec<i8>> = vec![
        vec![1, 1, 1],
        vec![1, 1, -1],
        vec![1, 0, 1],
        vec![-1, -1, 1],
        vec![-1, -1, -1],
        vec![-1, 0, -1],
        vec![1, 1, -1],
        vec![-1, -1, 1],
        vec![0, 1, 1],
        vec![0, -1, -1],
    ];
    let lfs = (0..3)
        .map(|k| {
            LabelingFunction::fallible(format!("lf{}", k), move |c: &Vec<i8>| {
                Ok(Label::try_from(c[k])?)
            })
        })
        .collect();
    let ts = TrainingSet::new(candidates, lfs, None).unwrap();
    let mut learner: Learner<Vec<i8>, _, _, _> = Learner::pipelined(Rc::new(ts), LogReg::new());
    learner.train_default().unwrap();

    let accs = learner.lf_accs().unwrap();
    assert!((accs[0] - accs[1]).abs() < 1e-9, "accs = {:?}", accs);
    assert!(accs[0] > accs[2], "accs = {:?}", accs);
    assert!(accs[2] > 0.5, "accs = {:?}", accs);
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

#[test]
fn features_generalize_to_unlabeled_candidates() {
    let mut learner: Learner<String, _, _, _> =
        Learner::pipelined(Rc::new(review_training_set()), LogReg::new());
    learner.train_default().unwrap();

    // No LF fires on either test candidate.
    let test = vec!["fun plot".to_string(), "awful boring".to_string()];
    let outcome = learner.test(&test, &[1, -1], None, false).unwrap();
    assert_eq!(outcome.scores.accuracy, 1.0);
    assert_eq!(outcome.cache.x_test().shape(), (2, 8));

    let feat_weights = learner.feat_weights().unwrap();
    let names = ["awful", "bad", "boring", "fun", "good", "great", "movie", "plot"];
    let weight = |token: &str| feat_weights[names.iter().position(|&n| n == token).unwrap()];
    assert!(weight("great") > 0.0);
    assert!(weight("awful") < 0.0);
}

#[test]
fn test_cache_is_shared_with_joint() {
    let ts = TrainingSet::new(toy_candidates(), vote_lfs(), None).unwrap();
    let data = Rc::new(CountingTrainingData::new(ts));
    let mut learner: Learner<Votes, _, _, _> =
        Learner::pipelined(data.clone(), VoteModel::default());
    learner.train_default().unwrap();

    let gold = [1, -1, 1];
    let first = learner.test(&toy_candidates(), &gold, None, false).unwrap();
    assert!(first.recomputed);
    // Features only: no feature columns without a featurizer.
    assert_eq!(first.cache.x_test().shape(), (3, 0));

    let second = learner
        .test(&toy_candidates(), &gold, Some(first.cache), false)
        .unwrap();
    assert!(!second.recomputed);
    assert_eq!(data.transform_calls.get(), 1);
}

#[test]
fn cache_from_joint_learner_is_recomputed() {
    let ts = TrainingSet::new(toy_candidates(), vote_lfs(), None).unwrap();
    let data = Rc::new(CountingTrainingData::new(ts));
    let gold = [1, -1, 1];

    let mut joint: Learner<Votes, _, _, _> = Learner::joint(data.clone(), VoteModel::default());
    joint.train_default().unwrap();
    let joint_outcome = joint.test(&toy_candidates(), &gold, None, false).unwrap();
    assert_eq!(joint_outcome.cache.x_test().shape(), (3, 2));

    let mut pipelined: Learner<Votes, _, _, _> =
        Learner::pipelined(data.clone(), VoteModel::default());
    pipelined.train_default().unwrap();
    let outcome = pipelined
        .test(&toy_candidates(), &gold, Some(joint_outcome.cache), false)
        .unwrap();
    assert!(outcome.recomputed);
    assert_eq!(outcome.cache.x_test().shape(), (3, 0));
    assert_eq!(data.transform_calls.get(), 2);
}

#[test]
fn strategy_builds_same_input_for_any_label_matrix() {
    let ts = review_training_set();
    let strategy = Pipelined::new(LogReg::new());
    let (l_test, f_test) = ts.transform(&["good plot".to_string()]).unwrap();
    let with_votes = strategy.build_input(&l_test, &f_test).unwrap();
    let (l_other, _) = ts.transform(&["bad".to_string()]).unwrap();
    let other_votes = strategy.build_input(&l_other, &f_test).unwrap();
    assert_ne!(l_test, l_other);
    assert_eq!(with_votes, other_votes);
}
