use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::store::{files, read, Store, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub title: String,
    pub link: String,
}

/// Problems file: non-blank lines in (title, link) pairs. A trailing title
/// without a link gets an empty one.
pub fn parse_problem_list(text: &str) -> Vec<Problem> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    lines
        .chunks(2)
        .map(|pair| Problem {
            title: pair[0].to_string(),
            link: pair.get(1).map(|l| l.to_string()).unwrap_or_default(),
        })
        .collect()
}

pub fn render_problem_list(problems: &[Problem]) -> String {
    problems
        .iter()
        .map(|p| format!("{}\n{}\n", p.title, p.link))
        .collect()
}

pub fn sample_problems() -> Vec<Problem> {
    ["A", "B", "C", "D", "E"]
        .iter()
        .map(|suffix| Problem {
            title: format!("题目{suffix}"),
            link: format!("https://example.com/problem{suffix}"),
        })
        .collect()
}

pub(crate) fn load_problems(path: &Path) -> Result<Vec<Problem>, StoreError> {
    if let Some(text) = files::read_optional(path)? {
        return Ok(parse_problem_list(&text));
    }

    let problems = sample_problems();
    files::write_atomic(path, render_problem_list(&problems).as_bytes())?;
    tracing::info!(path = %path.display(), "Sample problem list created");
    Ok(problems)
}

impl Store {
    pub fn list_problems(&self) -> Vec<Problem> {
        read(&self.problems).clone()
    }

    pub fn find_problem(&self, title: &str) -> Option<Problem> {
        read(&self.problems).iter().find(|p| p.title == title).cloned()
    }
}
