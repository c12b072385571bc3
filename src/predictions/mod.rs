pub mod fallback;
pub mod models;
pub mod scoring;
pub mod stats;

pub use fallback::fallback_batch;
pub use models::{MatchContext, MatchForecast, PredictionBatch, TeamSeasonStats, Winner};
pub use scoring::predict_match;
