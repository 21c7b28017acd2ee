use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_DIFFICULTY;
use crate::store::{read, write, Store};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemMeta {
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
    #[serde(default)]
    pub tags: String,
}

fn default_difficulty() -> String {
    DEFAULT_DIFFICULTY.to_string()
}

impl Default for ProblemMeta {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            tags: String::new(),
        }
    }
}

impl Store {
    /// Stored metadata, or the unrated default.
    pub fn get_meta(&self, title: &str) -> ProblemMeta {
        read(&self.problem_metas)
            .get(title)
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_meta(&self, title: &str, meta: ProblemMeta) {
        write(&self.problem_metas).insert(title.to_string(), meta);
        self.mark_dirty();
    }
}
