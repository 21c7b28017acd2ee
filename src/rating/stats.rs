use crate::rating::elo::overall_rating;
use crate::rating::types::{ChannelStats, ProblemStats, Vote};

/// Aggregate the current votes of a problem.
///
/// Returns `None` for an empty vote set; callers render a "no data" state
/// instead of zeroed statistics. The overall channel is computed per vote and
/// then averaged, not derived from the thinking/implementing means.
pub fn aggregate(votes: &[Vote]) -> Option<ProblemStats> {
    if votes.is_empty() {
        return None;
    }

    let thinking: Vec<f64> = votes.iter().map(|v| v.thinking).collect();
    let implementing: Vec<f64> = votes.iter().map(|v| v.implementing).collect();
    let quality: Vec<f64> = votes.iter().map(|v| v.quality).collect();
    let overall: Vec<f64> = votes
        .iter()
        .map(|v| overall_rating(v.thinking, v.implementing))
        .collect();

    Some(ProblemStats {
        count: votes.len(),
        thinking: channel(&thinking),
        implementing: channel(&implementing),
        quality: channel(&quality),
        overall: channel(&overall),
    })
}

/// Mean and population standard deviation (divide by N). `values` is non-empty.
fn channel(values: &[f64]) -> ChannelStats {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    ChannelStats {
        mean,
        std: variance.sqrt(),
    }
}
