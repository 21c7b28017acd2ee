use std::path::Path;

use crate::store::{files, read, write, Store, StoreError};

/// One username per line; blank lines are ignored.
pub fn parse_admin_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn render_admin_list(admins: &[String]) -> String {
    admins.iter().map(|name| format!("{name}\n")).collect()
}

pub(crate) fn load_admin_list(path: &Path, bootstrap: &str) -> Result<Vec<String>, StoreError> {
    if let Some(text) = files::read_optional(path)? {
        return Ok(parse_admin_list(&text));
    }

    let admins = vec![bootstrap.to_string()];
    files::write_atomic(path, render_admin_list(&admins).as_bytes())?;
    tracing::info!(admin = bootstrap, "Admin list created with bootstrap admin");
    Ok(admins)
}

impl Store {
    pub fn is_listed_admin(&self, username: &str) -> bool {
        read(&self.admins).iter().any(|name| name == username)
    }

    /// Add or remove `username` from the admin list file. Returns whether the
    /// list changed.
    pub fn set_listed_admin(&self, username: &str, listed: bool) -> Result<bool, StoreError> {
        let rendered = {
            let mut admins = write(&self.admins);
            let present = admins.iter().any(|name| name == username);
            match (present, listed) {
                (false, true) => admins.push(username.to_string()),
                (true, false) => admins.retain(|name| name != username),
                _ => return Ok(false),
            }
            render_admin_list(&admins)
        };
        files::write_atomic(&self.paths.admins, rendered.as_bytes())?;
        Ok(true)
    }
}
