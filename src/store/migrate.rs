//! Ratings file format detection and the one-time legacy upgrade.
//!
//! The legacy file is a bare `{title: [vote, ...]}` mapping. The current file
//! wraps votes, comments and problem metadata in one object. Detection is by
//! shape only, so an upgraded file is never rescaled a second time.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;

use crate::rating::migration::{is_legacy_quality, rescale_legacy_quality};
use crate::rating::Vote;
use crate::store::files;
use crate::store::operations::ratings::RatingsFile;
use crate::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingsShape {
    Legacy,
    Versioned,
}

#[derive(Debug)]
pub struct LoadedRatings {
    pub ratings: RatingsFile,
    /// The file is missing or legacy-shaped and has to be written back.
    pub needs_write: bool,
}

/// 非空且所有值都是数组的对象视为旧格式
pub fn detect_shape(value: &Value) -> Result<RatingsShape, StoreError> {
    let Some(object) = value.as_object() else {
        return Err(StoreError::Migration {
            file: files::RATINGS_FILE.to_string(),
            message: "top-level value is not an object".to_string(),
        });
    };

    if !object.is_empty() && object.values().all(Value::is_array) {
        Ok(RatingsShape::Legacy)
    } else {
        Ok(RatingsShape::Versioned)
    }
}

pub fn upgrade_legacy(legacy: BTreeMap<String, Vec<Vote>>) -> RatingsFile {
    let mut upgraded = 0usize;
    let votes = legacy
        .into_iter()
        .map(|(title, list)| {
            let list = list
                .into_iter()
                .map(|mut vote| {
                    if is_legacy_quality(vote.quality) {
                        vote.quality = rescale_legacy_quality(vote.quality);
                        upgraded += 1;
                    }
                    vote
                })
                .collect();
            (title, list)
        })
        .collect();

    tracing::info!(rescaled_votes = upgraded, "Legacy ratings file upgraded");

    RatingsFile {
        votes,
        ..RatingsFile::default()
    }
}

/// Parse a ratings file body of either shape. The flag reports whether the
/// input was legacy-shaped.
pub fn parse_ratings(text: &str) -> Result<(RatingsFile, bool), StoreError> {
    let value: Value = serde_json::from_str(text)?;
    match detect_shape(&value)? {
        RatingsShape::Legacy => {
            let legacy: BTreeMap<String, Vec<Vote>> = serde_json::from_value(value)?;
            Ok((upgrade_legacy(legacy), true))
        }
        RatingsShape::Versioned => Ok((serde_json::from_value(value)?, false)),
    }
}

pub fn load_ratings(path: &Path) -> Result<LoadedRatings, StoreError> {
    let Some(text) = files::read_optional(path)? else {
        tracing::info!(path = %path.display(), "Ratings file missing, starting empty");
        return Ok(LoadedRatings {
            ratings: RatingsFile::default(),
            needs_write: true,
        });
    };

    let (ratings, legacy) = parse_ratings(&text)?;
    Ok(LoadedRatings {
        ratings,
        needs_write: legacy,
    })
}
