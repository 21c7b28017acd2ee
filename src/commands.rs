//! Operator command line: `<verb> <user> [argument]`.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::store::operations::users::User;
use crate::store::{Store, StoreError};
use crate::validation::validate_password;

pub const USAGE: &str = "\
grant-admin <user>
revoke-admin <user>
ban <user>
unban <user>
grant-tag <user> <tag>
revoke-tag <user> <tag>
delete <user>
reset-password <user> <password>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    GrantAdmin(String),
    RevokeAdmin(String),
    Ban(String),
    Unban(String),
    GrantTag { user: String, tag: String },
    RevokeTag { user: String, tag: String },
    Delete(String),
    ResetPassword { user: String, password: String },
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{message}")]
    Parse { message: String, usage: String },
    #[error("deleting {0} requires confirmation")]
    ConfirmationRequired(String),
    #[error("unknown user: {0}")]
    UnknownUser(String),
    #[error("command cannot target the issuing admin")]
    SelfTarget,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CommandError {
    fn parse(message: impl Into<String>) -> Self {
        CommandError::Parse {
            message: message.into(),
            usage: USAGE.to_string(),
        }
    }
}

impl AdminCommand {
    pub fn target(&self) -> &str {
        match self {
            AdminCommand::GrantAdmin(user)
            | AdminCommand::RevokeAdmin(user)
            | AdminCommand::Ban(user)
            | AdminCommand::Unban(user)
            | AdminCommand::Delete(user)
            | AdminCommand::GrantTag { user, .. }
            | AdminCommand::RevokeTag { user, .. }
            | AdminCommand::ResetPassword { user, .. } => user,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            AdminCommand::GrantAdmin(_) => "grant-admin",
            AdminCommand::RevokeAdmin(_) => "revoke-admin",
            AdminCommand::Ban(_) => "ban",
            AdminCommand::Unban(_) => "unban",
            AdminCommand::GrantTag { .. } => "grant-tag",
            AdminCommand::RevokeTag { .. } => "revoke-tag",
            AdminCommand::Delete(_) => "delete",
            AdminCommand::ResetPassword { .. } => "reset-password",
        }
    }
}

// 日志里不能出现明文密码
impl fmt::Display for AdminCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminCommand::GrantTag { user, tag } | AdminCommand::RevokeTag { user, tag } => {
                write!(f, "{} {user} {tag}", self.verb())
            }
            AdminCommand::ResetPassword { user, .. } => write!(f, "{} {user} ***", self.verb()),
            other => write!(f, "{} {}", other.verb(), other.target()),
        }
    }
}

/// Split off the first whitespace-delimited word; the remainder keeps its
/// leading separator.
fn next_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(end) => (&s[..end], &s[end..]),
        None => (s, ""),
    }
}

impl FromStr for AdminCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (verb, rest) = next_word(line);
        if verb.is_empty() {
            return Err(CommandError::parse("命令为空"));
        }
        let (user, rest) = next_word(rest);
        if user.is_empty() {
            return Err(CommandError::parse(format!("{verb}: 缺少用户名")));
        }
        let user = user.to_string();

        let single = |cmd: AdminCommand| {
            if rest.trim().is_empty() {
                Ok(cmd)
            } else {
                Err(CommandError::parse(format!("{verb}: 参数过多")))
            }
        };
        // 参数原样保留（密码和标签里的连续空格有意义），只去掉用户名后的一个分隔符
        let argument = |what: &str| {
            let arg = rest
                .strip_prefix(|c: char| c.is_whitespace())
                .unwrap_or(rest)
                .trim_end_matches(['\r', '\n']);
            if arg.trim().is_empty() {
                Err(CommandError::parse(format!("{verb}: 缺少{what}")))
            } else {
                Ok(arg.to_string())
            }
        };

        match verb {
            "grant-admin" => single(AdminCommand::GrantAdmin(user)),
            "revoke-admin" => single(AdminCommand::RevokeAdmin(user)),
            "ban" => single(AdminCommand::Ban(user)),
            "unban" => single(AdminCommand::Unban(user)),
            "delete" => single(AdminCommand::Delete(user)),
            "grant-tag" => Ok(AdminCommand::GrantTag {
                tag: argument("标签")?,
                user,
            }),
            "revoke-tag" => Ok(AdminCommand::RevokeTag {
                tag: argument("标签")?,
                user,
            }),
            "reset-password" => Ok(AdminCommand::ResetPassword {
                password: argument("新密码")?,
                user,
            }),
            other => Err(CommandError::parse(format!("未知命令: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutcome {
    pub changed: bool,
    pub message: String,
}

impl CommandOutcome {
    fn changed(message: String) -> Self {
        Self {
            changed: true,
            message,
        }
    }

    fn unchanged(message: String) -> Self {
        Self {
            changed: false,
            message,
        }
    }
}

/// Update a user flag, reporting whether it actually changed.
fn set_flag(
    store: &Store,
    target: &str,
    pick: fn(&mut User) -> &mut bool,
    value: bool,
) -> Result<bool, CommandError> {
    let user = store
        .get_user(target)
        .ok_or_else(|| CommandError::UnknownUser(target.to_string()))?;
    let mut probe = user;
    if *pick(&mut probe) == value {
        return Ok(false);
    }
    store.update_user(target, |u| *pick(u) = value)?;
    Ok(true)
}

fn outcome(changed: bool, done: String, already: String) -> CommandOutcome {
    if changed {
        CommandOutcome::changed(done)
    } else {
        CommandOutcome::unchanged(already)
    }
}

/// Run a parsed command for `actor`. Re-issuing a command is a no-op reported
/// as unchanged; `delete` needs `confirmed`.
pub fn execute(
    store: &Store,
    actor: &str,
    command: &AdminCommand,
    confirmed: bool,
) -> Result<CommandOutcome, CommandError> {
    let target = command.target();
    let self_targeting = matches!(
        command,
        AdminCommand::RevokeAdmin(_) | AdminCommand::Ban(_) | AdminCommand::Delete(_)
    );
    if self_targeting && target == actor {
        return Err(CommandError::SelfTarget);
    }

    match command {
        AdminCommand::GrantAdmin(user) => {
            let changed = set_flag(store, user, |u| &mut u.is_admin, true)?;
            let listed = store.set_listed_admin(user, true)?;
            Ok(outcome(
                changed || listed,
                format!("{user} 已成为管理员"),
                format!("{user} 已经是管理员"),
            ))
        }
        AdminCommand::RevokeAdmin(user) => {
            // admin.txt 里可能有尚未注册的名字，撤销时同样要从列表移除
            let registered = store.get_user(user).is_some();
            let changed = registered && set_flag(store, user, |u| &mut u.is_admin, false)?;
            let listed = store.set_listed_admin(user, false)?;
            if !registered && !listed {
                return Err(CommandError::UnknownUser(user.clone()));
            }
            Ok(outcome(
                changed || listed,
                format!("已撤销 {user} 的管理员权限"),
                format!("{user} 不是管理员"),
            ))
        }
        AdminCommand::Ban(user) => {
            let changed = set_flag(store, user, |u| &mut u.banned, true)?;
            let revoked = store.delete_user_sessions(user)?;
            if changed {
                tracing::info!(user = %user, revoked_sessions = revoked, "User banned");
            }
            Ok(outcome(
                changed,
                format!("已封禁 {user}"),
                format!("{user} 已处于封禁状态"),
            ))
        }
        AdminCommand::Unban(user) => {
            let changed = set_flag(store, user, |u| &mut u.banned, false)?;
            Ok(outcome(
                changed,
                format!("已解封 {user}"),
                format!("{user} 未被封禁"),
            ))
        }
        AdminCommand::GrantTag { user, tag } => {
            let current = store
                .get_user(user)
                .ok_or_else(|| CommandError::UnknownUser(user.clone()))?;
            let changed = !current.tag_permissions.contains(tag);
            if changed {
                store.update_user(user, |u| u.tag_permissions.push(tag.clone()))?;
            }
            Ok(outcome(
                changed,
                format!("已授予 {user} 标签权限: {tag}"),
                format!("{user} 已拥有标签权限: {tag}"),
            ))
        }
        AdminCommand::RevokeTag { user, tag } => {
            let current = store
                .get_user(user)
                .ok_or_else(|| CommandError::UnknownUser(user.clone()))?;
            let changed = current.tag_permissions.contains(tag);
            if changed {
                store.update_user(user, |u| u.tag_permissions.retain(|t| t != tag))?;
            }
            Ok(outcome(
                changed,
                format!("已撤销 {user} 的标签权限: {tag}"),
                format!("{user} 没有标签权限: {tag}"),
            ))
        }
        AdminCommand::ResetPassword { user, password } => {
            validate_password(password)
                .map_err(|msg| CommandError::InvalidArgument(msg.to_string()))?;
            if store.get_user(user).is_none() {
                return Err(CommandError::UnknownUser(user.clone()));
            }
            let digest = crate::auth::hash_password(password)
                .map_err(|e| CommandError::InvalidArgument(e.message))?;
            store.update_user(user, |u| u.password = digest)?;
            store.delete_user_sessions(user)?;
            Ok(CommandOutcome::changed(format!("已重置 {user} 的密码")))
        }
        AdminCommand::Delete(user) => delete_user(store, user, confirmed),
    }
}

fn delete_user(store: &Store, user: &str, confirmed: bool) -> Result<CommandOutcome, CommandError> {
    if store.get_user(user).is_none() {
        return Err(CommandError::UnknownUser(user.to_string()));
    }
    if !confirmed {
        return Err(CommandError::ConfirmationRequired(user.to_string()));
    }

    let votes = store.remove_votes_by(user);
    let comments = store.remove_comments_by(user);
    let sessions = store.delete_user_sessions(user)?;
    store.set_listed_admin(user, false)?;
    store.remove_user(user)?;
    store.save_ratings()?;

    tracing::info!(user, votes, comments, sessions, "User deleted");
    Ok(CommandOutcome::changed(format!(
        "已删除用户 {user}，同时删除 {votes} 条评分和 {comments} 条评论"
    )))
}
