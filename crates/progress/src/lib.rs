//! Progress Tracking (Layer 2)
//!
//! Weight propagation down the work tree, budget/progress/quality rollup back
//! up to the root, and lifecycle transitions guarded by open prerequisites.

#![warn(missing_docs)]

pub mod weight;
pub mod rollup;
pub mod lifecycle;

pub use weight::WeightEngine;
pub use rollup::{
    RollupEngine, RollupReport, InitiativeRollup, CompletionStats, ActualDates,
    budgeted_effort, computed_progress, actual_effort, quality_score, completion_stats, actual_dates,
};
pub use lifecycle::{
    confirm, reject, cancel, set_to_draft, hold, start_timer, stop_timer, pause_timer, resume_timer,
};
