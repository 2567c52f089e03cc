//! Use cases (application services)
//!
//! Use cases orchestrate domain logic through the port traits:
//!
//! - [`ScoreSegmentUseCase`] - Turn stored match segments into metrics and power levels
//! - [`PlayerSummaryUseCase`] - Aggregate a player's stored power levels

pub mod player_summary;
pub mod score_segment;

pub use player_summary::{PlayerSummary, PlayerSummaryUseCase};
pub use score_segment::{
    puuid_from_segment_key, ScoreSegmentUseCase, ScoredMatch, SegmentScoreReport, SkippedDocument,
};
