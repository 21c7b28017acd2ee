//! Presentation hints attached to API payloads. The front end decides how to
//! render them.

use serde::Serialize;

use crate::constants::DIFFICULTY_LEVELS;

/// Codeforces-style color for a rating value.
pub fn rating_color(rating: f64) -> String {
    let fixed = match rating {
        r if r < 1200.0 => "#808080",
        r if r < 1400.0 => "#008000",
        r if r < 1600.0 => "#03a89e",
        r if r < 1900.0 => "#0000ff",
        r if r < 2100.0 => "#aa00aa",
        r if r < 2400.0 => "#ff8c00",
        r if r < 2600.0 => "#ff0000",
        r if r < 3700.0 => {
            // 2600..3700 由红色渐变到黑色
            let ratio = (rating - 2600.0) / 1100.0;
            let red = (255.0 * (1.0 - ratio)) as u8;
            return format!("#{red:02x}0000");
        }
        _ => "#000000",
    };
    fixed.to_string()
}

/// Color of a known difficulty level.
pub fn difficulty_color(label: &str) -> Option<&'static str> {
    DIFFICULTY_LEVELS
        .iter()
        .find(|(name, _)| *name == label)
        .map(|(_, color)| *color)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityBadge {
    None,
    Poor,
    Awful,
}

pub fn quality_badge(score: f64) -> QualityBadge {
    if score <= -4.0 {
        QualityBadge::Awful
    } else if score <= -2.0 {
        QualityBadge::Poor
    } else {
        QualityBadge::None
    }
}
