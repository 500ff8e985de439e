//! Weak supervision on a handful of synthetic movie reviews.
//!
//! Usage: `toy_pipeline [PLOT_DIR] [PARAMS_JSON]`
//!
//! Set `SNORKEL_LOG=debug` for per-step details.
use std::rc::Rc;

use anyhow::{Context, Result};
use log::LevelFilter;

use snorkel_learn::config::TrainParams;
use snorkel_learn::features::VocabularyFeaturizer;
use snorkel_learn::labeling::{Label, LabelingFunction};
use snorkel_learn::learner::Learner;
use snorkel_learn::models::LogReg;
use snorkel_learn::report::HtmlCalibrationPlotter;
use snorkel_learn::training_set::TrainingSet;

const TRAIN: &[&str] = &[
    "a good movie with a great cast",
    "good fun for the whole family",
    "great acting and a clever plot",
    "bad script and awful pacing",
    "bad acting boring plot",
    "an awful waste of time",
    "not good at all just boring",
    "clever and moving with great music",
    "boring music and bad jokes",
    "fun clever and moving",
];

const TEST: &[(&str, i8)] = &[
    ("great fun and clever", 1),
    ("moving music", 1),
    ("awful and boring", -1),
    ("bad pacing awful jokes", -1),
];

fn tokens(text: &String) -> Vec<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

fn keyword(name: &str, words: &'static [&'static str], label: Label) -> LabelingFunction<String> {
    LabelingFunction::new(name, move |text: &String| {
        if tokens(text).iter().any(|t| words.contains(&t.as_str())) {
            label
        } else {
            Label::Abstain
        }
    })
}

fn labeling_functions() -> Vec<LabelingFunction<String>> {
    vec![
        keyword("lf_praise", &["good", "great"], Label::Positive),
        keyword("lf_complaint", &["bad", "awful"], Label::Negative),
        keyword("lf_boring", &["boring"], Label::Negative),
        // Fires on "not good" too.
        keyword("lf_good_only", &["good"], Label::Positive),
    ]
}

fn training_set() -> Result<TrainingSet<String>> {
    let candidates = TRAIN.iter().map(|s| s.to_string()).collect();
    let ts = TrainingSet::new(
        candidates,
        labeling_functions(),
        Some(Box::new(VocabularyFeaturizer::new(tokens))),
    )
    .context("Failed to build the training set")?;
    Ok(ts)
}

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("SNORKEL_LOG", "error,snorkel_learn=info,toy_pipeline=info"))
        .init();

    let mut args = std::env::args().skip(1);
    let plot_dir = args.next();
    let params_path = args.next();

    let ts = Rc::new(training_set()?);
    let test_candidates: Vec<String> = TEST.iter().map(|(s, _)| s.to_string()).collect();
    let gold: Vec<i8> = TEST.iter().map(|&(_, g)| g).collect();

    // Joint: one model over LF votes and features.
    let mut joint: Learner<String, _, _, _> = Learner::joint(ts.clone(), LogReg::new());
    match &params_path {
        Some(path) => {
            let params = TrainParams::from_json_file(path)
                .with_context(|| format!("Failed to load training parameters from {}", path))?;
            joint.train(&params)?;
        }
        None => joint.train_default()?,
    }
    if let Some(dir) = &plot_dir {
        joint = joint.with_plotter(Box::new(HtmlCalibrationPlotter::new(format!("{}/joint", dir))));
    }

    let outcome = joint.test(&test_candidates, &gold, None, plot_dir.is_some())?;
    log::info!("Joint accuracy: {:.3}", outcome.scores.accuracy);
    for (name, acc) in ts.lf_names().iter().zip(joint.lf_accs()?.iter()) {
        log::info!("  {:<14} estimated accuracy {:.3}", name, acc);
    }

    // Re-testing on the same set reuses the cached model input.
    let again = joint.test(&test_candidates, &gold, Some(outcome.cache), false)?;
    log::debug!("Cached test matrix reused: {}", !again.recomputed);

    // Pipelined: LF accuracies first, then a feature model on the soft labels.
    let mut pipelined: Learner<String, _, _, _> = Learner::pipelined(ts.clone(), LogReg::new());
    pipelined.train_default()?;
    if let Some(dir) = &plot_dir {
        pipelined = pipelined
            .with_plotter(Box::new(HtmlCalibrationPlotter::new(format!("{}/pipelined", dir))));
    }
    let outcome = pipelined.test(&test_candidates, &gold, None, plot_dir.is_some())?;
    log::info!("Pipelined accuracy: {:.3}", outcome.scores.accuracy);
    println!("{}", serde_json::to_string_pretty(&outcome.scores)?);

    Ok(())
}
