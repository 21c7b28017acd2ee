pub mod action_log;
pub mod admins;
pub mod comments;
pub mod metas;
pub mod problems;
pub mod ratings;
pub mod sessions;
pub mod users;
pub mod votes;
