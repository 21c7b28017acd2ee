use std::collections::BTreeMap;

use crate::rating::Vote;
use crate::store::{read, write, Store};

impl Store {
    /// Copy of the problem's votes; callers aggregate outside the lock.
    pub fn get_votes(&self, title: &str) -> Vec<Vote> {
        read(&self.votes).get(title).cloned().unwrap_or_default()
    }

    pub fn votes_snapshot(&self) -> BTreeMap<String, Vec<Vote>> {
        read(&self.votes).clone()
    }

    /// Replace the whole vote list of a problem. An empty list drops the entry.
    pub fn replace_votes(&self, title: &str, list: Vec<Vote>) {
        let mut votes = write(&self.votes);
        if list.is_empty() {
            votes.remove(title);
        } else {
            votes.insert(title.to_string(), list);
        }
        drop(votes);
        self.mark_dirty();
    }

    /// Insert or replace the voter's vote under one write lock. Returns the
    /// vote it replaced.
    pub fn upsert_vote(&self, title: &str, vote: Vote) -> Option<Vote> {
        let previous = {
            let mut votes = write(&self.votes);
            let list = votes.entry(title.to_string()).or_default();
            match list.iter_mut().find(|v| v.voter == vote.voter) {
                Some(existing) => Some(std::mem::replace(existing, vote)),
                None => {
                    list.push(vote);
                    None
                }
            }
        };
        self.mark_dirty();
        previous
    }

    pub fn remove_vote(&self, title: &str, voter: &str) -> Option<Vote> {
        let removed = {
            let mut votes = write(&self.votes);
            let list = votes.get_mut(title)?;
            let index = list.iter().position(|v| v.voter == voter)?;
            let removed = list.remove(index);
            if list.is_empty() {
                votes.remove(title);
            }
            removed
        };
        self.mark_dirty();
        Some(removed)
    }

    /// Drop every vote cast by `voter`. Returns how many were removed.
    pub fn remove_votes_by(&self, voter: &str) -> usize {
        let removed = {
            let mut votes = write(&self.votes);
            let mut removed = 0;
            votes.retain(|_, list| {
                let before = list.len();
                list.retain(|v| v.voter != voter);
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

#[cfg(test)]
mod tests {
    use crate::store::test_support::{open_in, vote};

    #[test]
    fn same_voter_replaces_previous_vote() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_in(&dir);

        assert!(store
            .upsert_vote("P", vote("alice", 1500.0, 1600.0, 0.0))
            .is_none());
        let previous = store
            .upsert_vote("P", vote("alice", 2000.0, 2100.0, 1.0))
            .unwrap();
        assert_eq!(previous.thinking, 1500.0);

        let votes = store.get_votes("P");
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].thinking, 2000.0);
    }

    #[test]
    fn removing_last_vote_drops_problem_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_in(&dir);
        store.upsert_vote("P", vote("alice", 1500.0, 1600.0, 0.0));

        assert!(store.remove_vote("P", "bob").is_none());
        assert!(store.remove_vote("P", "alice").is_some());
        assert!(!store.votes_snapshot().contains_key("P"));
    }

    #[test]
    fn remove_votes_by_voter_spans_problems() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_in(&dir);
        store.upsert_vote("P", vote("alice", 1500.0, 1600.0, 0.0));
        store.upsert_vote("Q", vote("alice", 1500.0, 1600.0, 0.0));
        store.upsert_vote("Q", vote("bob", 1500.0, 1600.0, 0.0));

        assert_eq!(store.remove_votes_by("alice"), 2);
        let snapshot = store.votes_snapshot();
        assert!(!snapshot.contains_key("P"));
        assert_eq!(snapshot["Q"].len(), 1);
    }

    #[test]
    fn replace_with_empty_list_removes_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_in(&dir);
        store.replace_votes("P", vec![vote("a", 900.0, 900.0, 0.0)]);
        assert_eq!(store.get_votes("P").len(), 1);
        store.replace_votes("P", Vec::new());
        assert!(store.get_votes("P").is_empty());
    }
}
