//! Rating aggregation engine: pure functions from a vote set to display
//! statistics. Callers copy votes out of the store and compute outside any lock.

pub mod display;
pub mod elo;
pub mod migration;
pub mod ranking;
pub mod stats;
pub mod types;

pub use elo::{overall_rating, win_probability};
pub use migration::rescale_legacy_quality;
pub use stats::aggregate;
pub use types::{ChannelStats, ProblemStats, Vote};
