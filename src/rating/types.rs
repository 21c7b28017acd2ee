use serde::{Deserialize, Serialize};

/// One user's rating of one problem. Field names match the persisted file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub voter: String,
    pub thinking: f64,
    pub implementing: f64,
    pub quality: f64,
}

/// Mean and population standard deviation of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub mean: f64,
    pub std: f64,
}

/// Derived statistics of a problem's current votes. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemStats {
    pub count: usize,
    pub thinking: ChannelStats,
    pub implementing: ChannelStats,
    pub quality: ChannelStats,
    pub overall: ChannelStats,
}
