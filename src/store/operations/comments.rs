use serde::{Deserialize, Serialize};

use crate::store::{read, write, Store};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub user: String,
    pub text: String,
    /// Unix seconds; together with user and text identifies the comment.
    pub time: f64,
}

impl Store {
    pub fn get_comments(&self, title: &str) -> Vec<Comment> {
        read(&self.comments).get(title).cloned().unwrap_or_default()
    }

    pub fn add_comment(&self, title: &str, comment: Comment) {
        write(&self.comments)
            .entry(title.to_string())
            .or_default()
            .push(comment);
        self.mark_dirty();
    }

    /// Remove comments equal to `target` on all three fields. Returns whether
    /// anything was removed.
    pub fn remove_comment(&self, title: &str, target: &Comment) -> bool {
        let removed = {
            let mut comments = write(&self.comments);
            let Some(list) = comments.get_mut(title) else {
                return false;
            };
            let before = list.len();
            list.retain(|c| c != target);
            let removed = list.len() != before;
            if list.is_empty() {
                comments.remove(title);
            }
            removed
        };
        if removed {
            self.mark_dirty();
        }
        removed
    }

    pub fn remove_comments_by(&self, user: &str) -> usize {
        let removed = {
            let mut comments = write(&self.comments);
            let mut removed = 0;
            comments.retain(|_, list| {
                let before = list.len();
                list.retain(|c| c.user != user);
                removed += before - list.len();
                !list.is_empty()
            });
            removed
        };
        if removed > 0 {
            self.mark_dirty();
        }
        removed
    }
}
