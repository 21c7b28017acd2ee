pub mod files;
pub mod keys;
pub mod migrate;
pub mod operations;
pub mod trees;

use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::Db;
use thiserror::Error;

use crate::rating::Vote;
use crate::store::files::DataPaths;
use crate::store::operations::comments::Comment;
use crate::store::operations::metas::ProblemMeta;
use crate::store::operations::problems::Problem;
use crate::store::operations::users::User;

/// In-memory repository over the flat data files plus the sled session store.
///
/// Each collection has its own lock. Mutations hold only the lock of the
/// collection they touch; the ratings save cycle reads the three rating
/// collections one after another under `save_lock`.
#[derive(Debug)]
pub struct Store {
    db: Db,
    pub sessions: sled::Tree,
    paths: DataPaths,
    users: RwLock<BTreeMap<String, User>>,
    admins: RwLock<Vec<String>>,
    problems: RwLock<Vec<Problem>>,
    votes: RwLock<BTreeMap<String, Vec<Vote>>>,
    comments: RwLock<BTreeMap<String, Vec<Comment>>>,
    problem_metas: RwLock<BTreeMap<String, ProblemMeta>>,
    dirty: AtomicBool,
    last_saved_at: Mutex<DateTime<Utc>>,
    save_lock: Mutex<()>,
    users_save_lock: Mutex<()>,
    action_log_lock: Mutex<()>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("not found: entity={entity}, key={key}")]
    NotFound { entity: String, key: String },
    #[error("conflict: entity={entity}, key={key}")]
    Conflict { entity: String, key: String },
    #[error("validation error: {0}")]
    Validation(String),
    #[error("migration error in {file}: {message}")]
    Migration { file: String, message: String },
}

impl StoreError {
    pub(crate) fn not_found(entity: &str, key: &str) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            key: key.to_string(),
        }
    }
}

impl Store {
    /// Open the session database and load every data file, creating first-run
    /// defaults for missing ones. Unreadable or corrupt files are errors.
    pub fn open(
        paths: DataPaths,
        sled_path: &str,
        bootstrap_admin: &str,
    ) -> Result<Self, StoreError> {
        files::ensure_dir(&paths.dir)?;

        let db = sled::open(sled_path)?;
        let sessions = db.open_tree(trees::SESSIONS)?;

        let admins = operations::admins::load_admin_list(&paths.admins, bootstrap_admin)?;
        let mut users = operations::users::load_users(&paths.users)?;
        for name in &admins {
            if let Some(user) = users.get_mut(name) {
                user.is_admin = true;
            }
        }
        let problems = operations::problems::load_problems(&paths.problems)?;
        let loaded = migrate::load_ratings(&paths.ratings)?;

        tracing::info!(
            users = users.len(),
            admins = admins.len(),
            problems = problems.len(),
            rated_problems = loaded.ratings.votes.len(),
            "Data files loaded"
        );

        let store = Self {
            db,
            sessions,
            paths,
            users: RwLock::new(users),
            admins: RwLock::new(admins),
            problems: RwLock::new(problems),
            votes: RwLock::new(loaded.ratings.votes),
            comments: RwLock::new(loaded.ratings.comments),
            problem_metas: RwLock::new(loaded.ratings.problem_metas),
            dirty: AtomicBool::new(false),
            last_saved_at: Mutex::new(Utc::now()),
            save_lock: Mutex::new(()),
            users_save_lock: Mutex::new(()),
            action_log_lock: Mutex::new(()),
        };

        if loaded.needs_write {
            store.save_ratings()?;
        }

        Ok(store)
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    /// Flush the session database.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    pub(crate) fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
        Ok(serde_json::to_vec(value)?)
    }

    pub(crate) fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Seconds since the Unix epoch, the timestamp format of the data files.
pub fn unix_timestamp() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

// 锁中毒只说明另一个持锁线程 panic 过；集合本身仍是完整的值，继续使用
pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn guard<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    lock.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
pub(crate) mod test_support {
    use tempfile::TempDir;

    use super::*;

    pub fn open_in(dir: &TempDir) -> Store {
        let paths = DataPaths::new(dir.path().join("data"));
        let sled_path = dir.path().join("sessions.sled");
        Store::open(paths, sled_path.to_str().unwrap(), "admin").unwrap()
    }

    pub fn vote(voter: &str, thinking: f64, implementing: f64, quality: f64) -> Vote {
        Vote {
            voter: voter.to_string(),
            thinking,
            implementing,
            quality,
        }
    }
}
