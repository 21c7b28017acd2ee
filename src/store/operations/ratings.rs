use std::collections::BTreeMap;
use std::sync::atomic::Ordering;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::rating::Vote;
use crate::store::operations::comments::Comment;
use crate::store::operations::metas::ProblemMeta;
use crate::store::{files, guard, read, Store, StoreError};

/// Current-format ratings file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingsFile {
    #[serde(default)]
    pub votes: BTreeMap<String, Vec<Vote>>,
    #[serde(default)]
    pub comments: BTreeMap<String, Vec<Comment>>,
    #[serde(default)]
    pub problem_metas: BTreeMap<String, ProblemMeta>,
}

impl Store {
    pub fn ratings_snapshot(&self) -> RatingsFile {
        RatingsFile {
            votes: read(&self.votes).clone(),
            comments: read(&self.comments).clone(),
            problem_metas: read(&self.problem_metas).clone(),
        }
    }

    pub fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    pub fn last_saved_at(&self) -> DateTime<Utc> {
        *guard(&self.last_saved_at)
    }

    /// Write the ratings file. The dirty flag is cleared before the snapshot
    /// is taken; a mutation racing the save sets it again and lands in the
    /// next cycle.
    pub fn save_ratings(&self) -> Result<(), StoreError> {
        let _save = guard(&self.save_lock);
        self.dirty.store(false, Ordering::Release);

        let result = Self::serialize_pretty(&self.ratings_snapshot())
            .and_then(|bytes| files::write_atomic(&self.paths.ratings, &bytes));

        match result {
            Ok(()) => {
                *guard(&self.last_saved_at) = Utc::now();
                Ok(())
            }
            Err(e) => {
                self.mark_dirty();
                Err(e)
            }
        }
    }

    /// Save when dirty and the last save is at least `min_age` old.
    pub fn flush_if_due(&self, min_age: Duration) -> Result<bool, StoreError> {
        if !self.is_dirty() || Utc::now() - self.last_saved_at() < min_age {
            return Ok(false);
        }
        self.save_ratings()?;
        Ok(true)
    }

    fn serialize_pretty(ratings: &RatingsFile) -> Result<Vec<u8>, StoreError> {
        Ok(serde_json::to_vec_pretty(ratings)?)
    }
}
