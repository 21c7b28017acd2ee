use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{files, guard, Store, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Register,
    LoginSuccess,
    LoginFailed,
    LoginBanned,
    Logout,
    Vote,
    DeleteVote,
    Comment,
    DeleteComment,
    EditMeta,
    AdminCommand,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Register => "register",
            Action::LoginSuccess => "login_success",
            Action::LoginFailed => "login_failed",
            Action::LoginBanned => "login_banned",
            Action::Logout => "logout",
            Action::Vote => "vote",
            Action::DeleteVote => "delete_vote",
            Action::Comment => "comment",
            Action::DeleteComment => "delete_comment",
            Action::EditMeta => "edit_meta",
            Action::AdminCommand => "admin_command",
        };
        f.write_str(name)
    }
}

/// One line of the action log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEntry {
    pub timestamp: DateTime<Utc>,
    pub actor: String,
    pub action: Action,
    pub details: String,
}

impl Store {
    /// Append an entry to the action log. A failed write is logged and
    /// otherwise ignored; it never fails the operation being recorded.
    pub fn log_action(&self, actor: &str, action: Action, details: impl Into<String>) {
        let entry = ActionEntry {
            timestamp: Utc::now(),
            actor: actor.to_string(),
            action,
            details: details.into(),
        };

        tracing::info!(actor = %entry.actor, action = %entry.action, details = %entry.details, "action");

        let result = serde_json::to_string(&entry)
            .map_err(StoreError::from)
            .and_then(|line| {
                let _append = guard(&self.action_log_lock);
                files::append_line(&self.paths.action_log, &line)
            });
        if let Err(e) = result {
            tracing::warn!(error = %e, action = %action, "Failed to append action log");
        }
    }

    /// Newest entries among the last `limit` log lines, newest first. Only the
    /// tail of the file is read; unparseable lines are skipped.
    pub fn recent_actions(&self, limit: usize) -> Result<Vec<ActionEntry>, StoreError> {
        let lines = {
            let _read = guard(&self.action_log_lock);
            files::read_tail_lines(&self.paths.action_log, limit)?
        };
        let Some(lines) = lines else {
            return Ok(Vec::new());
        };

        Ok(lines
            .iter()
            .rev()
            .filter_map(|line| serde_json::from_str::<ActionEntry>(line).ok())
            .collect())
    }
}
