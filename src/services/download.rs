use crate::models::StoryId;
use regex::Regex;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tempfile::NamedTempFile;
use thiserror::Error;

const MAX_COPIES: u32 = 999;

static FILENAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)filename\s*=\s*("([^"]*)"|[^;]*)"#).unwrap());

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("cannot prepare download directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write download: {0}")]
    Write(#[from] std::io::Error),

    #[error("cannot persist download to {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Pulls the `filename=` parameter out of a Content-Disposition value.
///
/// Quotes are stripped and only the final path component survives, so a
/// hostile header cannot steer the save outside the download directory.
pub fn filename_from_disposition(header: &str) -> Option<String> {
    let captures = FILENAME_RE.captures(header)?;
    let raw = captures
        .get(2)
        .or_else(|| captures.get(1))
        .map(|m| m.as_str())?;

    let name = raw
        .trim()
        .trim_matches('"')
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim();

    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}

pub fn default_filename(id: StoryId) -> String {
    format!("story-{}.txt", id)
}

pub fn resolve_filename(header: Option<&str>, id: StoryId) -> String {
    header
        .and_then(filename_from_disposition)
        .unwrap_or_else(|| default_filename(id))
}

/// Writes `body` to `dir/filename`, or `name (n).ext` when that is taken.
///
/// The bytes land in a staging file first; it is removed on drop unless it
/// was persisted, so a failed write never leaves a partial file behind.
pub fn save_payload(dir: &Path, filename: &str, body: &[u8]) -> Result<PathBuf, SaveError> {
    std::fs::create_dir_all(dir).map_err(|source| SaveError::Directory {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut staged = NamedTempFile::new_in(dir).map_err(|source| SaveError::Directory {
        path: dir.to_path_buf(),
        source,
    })?;
    staged.write_all(body)?;
    staged.flush()?;

    let mut copy = 0;
    loop {
        let target = dir.join(numbered(filename, copy));
        match staged.persist_noclobber(&target) {
            Ok(_) => return Ok(target),
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists && copy < MAX_COPIES => {
                staged = e.file;
                copy += 1;
            }
            Err(e) => {
                return Err(SaveError::Persist {
                    path: target,
                    source: e.error,
                });
            }
        }
    }
}

fn numbered(filename: &str, copy: u32) -> String {
    if copy == 0 {
        return filename.to_string();
    }
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{} ({}).{}", stem, copy, ext),
        _ => format!("{} ({})", filename, copy),
    }
}
