pub mod logreg;
pub mod model_trait;

pub use logreg::{log_odds, odds_to_prob, LogReg};
pub use model_trait::NoiseAwareModel;
