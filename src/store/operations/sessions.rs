use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::transaction::TransactionError;

use crate::rating::ranking::SortPreference;
use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token_hash: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub sort: SortPreference,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

fn map_tx_error(e: TransactionError<()>) -> StoreError {
    match e {
        TransactionError::Abort(()) => {
            StoreError::Sled(sled::Error::Unsupported("transaction aborted".into()))
        }
        TransactionError::Storage(se) => StoreError::Sled(se),
    }
}

/// Token hashes indexed under a user prefix.
fn hashes_under(tree: &sled::Tree, prefix: &str) -> Result<Vec<String>, StoreError> {
    let mut hashes = Vec::new();
    for item in tree.scan_prefix(prefix.as_bytes()) {
        let (k, _) = item?;
        let Some(hash) = k.get(prefix.len()..) else {
            continue;
        };
        match std::str::from_utf8(hash) {
            Ok(hash) => hashes.push(hash.to_string()),
            Err(e) => tracing::warn!(error = %e, "Skipping session index key with invalid UTF-8"),
        }
    }
    Ok(hashes)
}

impl Store {
    pub fn create_session(&self, session: &Session) -> Result<(), StoreError> {
        let key = keys::session_key(&session.token_hash).into_bytes();
        let index_key =
            keys::session_user_index_key(&session.username, &session.token_hash).into_bytes();
        let session_bytes = Self::serialize(session)?;

        self.sessions
            .transaction(move |tx| {
                tx.insert(key.as_slice(), session_bytes.as_slice())?;
                tx.insert(index_key.as_slice(), &[] as &[u8])?;
                Ok(())
            })
            .map_err(map_tx_error)
    }

    /// 获取会话；已过期的会话视为不存在，由后台任务负责清理
    pub fn get_session(&self, token_hash: &str) -> Result<Option<Session>, StoreError> {
        let key = keys::session_key(token_hash);
        let Some(raw) = self.sessions.get(key.as_bytes())? else {
            return Ok(None);
        };

        let session = Self::deserialize::<Session>(&raw)?;
        if session.is_expired() {
            return Ok(None);
        }
        Ok(Some(session))
    }

    pub fn update_session_sort(
        &self,
        token_hash: &str,
        sort: SortPreference,
    ) -> Result<(), StoreError> {
        let key = keys::session_key(token_hash);
        let Some(raw) = self.sessions.get(key.as_bytes())? else {
            return Err(StoreError::not_found("session", token_hash));
        };
        let mut session = Self::deserialize::<Session>(&raw)?;
        session.sort = sort;
        self.sessions
            .insert(key.as_bytes(), Self::serialize(&session)?)?;
        Ok(())
    }

    pub fn delete_session(&self, token_hash: &str) -> Result<(), StoreError> {
        let key = keys::session_key(token_hash).into_bytes();
        let index_key = self
            .sessions
            .get(&key)?
            .and_then(|raw| Self::deserialize::<Session>(&raw).ok())
            .map(|session| keys::session_user_index_key(&session.username, token_hash).into_bytes());

        self.sessions
            .transaction(move |tx| {
                if let Some(ref idx) = index_key {
                    tx.remove(idx.as_slice())?;
                }
                tx.remove(key.as_slice())?;
                Ok(())
            })
            .map_err(map_tx_error)
    }

    pub fn delete_user_sessions(&self, username: &str) -> Result<u32, StoreError> {
        let prefix = keys::session_user_index_prefix(username);
        let hashes = hashes_under(&self.sessions, &prefix)?;
        let count = hashes.len() as u32;
        for hash in hashes {
            self.delete_session(&hash)?;
        }
        Ok(count)
    }

    pub fn count_user_sessions(&self, username: &str) -> Result<usize, StoreError> {
        let prefix = keys::session_user_index_prefix(username);
        Ok(hashes_under(&self.sessions, &prefix)?.len())
    }

    /// 会话数超过上限时，按创建时间从旧到新删除多余会话
    pub fn cleanup_oldest_user_sessions(
        &self,
        username: &str,
        max_sessions: usize,
    ) -> Result<(), StoreError> {
        let prefix = keys::session_user_index_prefix(username);
        let mut sessions = Vec::new();
        for hash in hashes_under(&self.sessions, &prefix)? {
            if let Some(raw) = self.sessions.get(keys::session_key(&hash).as_bytes())? {
                if let Ok(session) = Self::deserialize::<Session>(&raw) {
                    sessions.push((hash, session.created_at));
                }
            }
        }

        if sessions.len() <= max_sessions {
            return Ok(());
        }

        sessions.sort_by_key(|(_, created_at)| *created_at);
        let excess = sessions.len() - max_sessions;
        for (hash, _) in sessions.into_iter().take(excess) {
            self.delete_session(&hash)?;
        }
        Ok(())
    }

    /// 清理过期会话，每批最多 1000 条。返回删除数量。
    pub fn cleanup_expired_sessions(&self) -> Result<u32, StoreError> {
        const MAX_BATCH_SIZE: usize = 1000;

        let mut expired = Vec::new();
        for item in self.sessions.iter() {
            let (k, v) = item?;
            if keys::is_session_index_key(&k) {
                continue;
            }
            let session: Session = Self::deserialize(&v)?;
            if session.is_expired() {
                expired.push(session.token_hash);
                if expired.len() >= MAX_BATCH_SIZE {
                    break;
                }
            }
        }

        let count = expired.len() as u32;
        for token_hash in expired {
            self.delete_session(&token_hash)?;
        }
        Ok(count)
    }
}
