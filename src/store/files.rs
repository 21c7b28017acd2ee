use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::store::StoreError;

pub const USER_FILE: &str = "user.json";
pub const ADMIN_FILE: &str = "admin.txt";
pub const PROBLEM_FILE: &str = "problem.txt";
pub const RATINGS_FILE: &str = "votes.json";
pub const ACTION_LOG_FILE: &str = "actions.log";

/// Locations of the flat data files inside the data directory.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub dir: PathBuf,
    pub users: PathBuf,
    pub admins: PathBuf,
    pub problems: PathBuf,
    pub ratings: PathBuf,
    pub action_log: PathBuf,
}

impl DataPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            users: dir.join(USER_FILE),
            admins: dir.join(ADMIN_FILE),
            problems: dir.join(PROBLEM_FILE),
            ratings: dir.join(RATINGS_FILE),
            action_log: dir.join(ACTION_LOG_FILE),
            dir,
        }
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

pub fn ensure_dir(dir: &Path) -> Result<(), StoreError> {
    fs::create_dir_all(dir).map_err(|e| io_error(dir, e))
}

/// Read a text file; a missing file is `Ok(None)` (first run).
pub fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_error(path, e)),
    }
}

/// Replace `path` with `bytes` through a sibling temp file and a rename, so a
/// crash mid-write never leaves a truncated data file behind.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!("{file_name}.tmp"));

    let mut file = fs::File::create(&tmp).map_err(|e| io_error(&tmp, e))?;
    file.write_all(bytes).map_err(|e| io_error(&tmp, e))?;
    file.sync_all().map_err(|e| io_error(&tmp, e))?;
    drop(file);

    fs::rename(&tmp, path).map_err(|e| io_error(path, e))
}

pub fn append_line(path: &Path, line: &str) -> Result<(), StoreError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| io_error(path, e))?;
    writeln!(file, "{line}").map_err(|e| io_error(path, e))
}

/// The last `max_lines` lines of a file, oldest first. The file is read
/// backwards block by block until enough line breaks are buffered.
pub fn read_tail_lines(path: &Path, max_lines: usize) -> Result<Option<Vec<String>>, StoreError> {
    const BLOCK: u64 = 8 * 1024;

    let mut file = match fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_error(path, e)),
    };
    let mut pos = file.metadata().map_err(|e| io_error(path, e))?.len();

    let mut buf: Vec<u8> = Vec::new();
    let mut breaks = 0usize;
    // 多读一个换行，保证最前面那行是完整的
    while pos > 0 && breaks <= max_lines {
        let step = BLOCK.min(pos);
        pos -= step;
        let mut chunk = vec![0u8; step as usize];
        file.seek(SeekFrom::Start(pos))
            .map_err(|e| io_error(path, e))?;
        file.read_exact(&mut chunk).map_err(|e| io_error(path, e))?;
        breaks += chunk.iter().filter(|&&b| b == b'\n').count();
        chunk.extend_from_slice(&buf);
        buf = chunk;
    }

    let text = String::from_utf8_lossy(&buf);
    let lines: Vec<&str> = text.lines().collect();
    let skip = lines.len().saturating_sub(max_lines);
    Ok(Some(lines[skip..].iter().map(|line| line.to_string()).collect()))
}
