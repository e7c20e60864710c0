//! Database URL handling for the binary.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

pub const DEFAULT_DB_URL: &str = "sqlite://quiz.sqlite3";

/// Turn `sqlite://relative`, `sqlite:relative` or a bare path into an
/// absolute `sqlite://` URL, keeping any query string.
///
/// Memory URLs pass through.
#[must_use]
pub fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if is_memory_url(trimmed) {
        return trimmed.to_owned();
    }

    let rest = trimmed
        .strip_prefix("sqlite://")
        .or_else(|| trimmed.strip_prefix("sqlite:"))
        .unwrap_or(trimmed);
    let (path_str, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };
    if path_str.is_empty() {
        return trimmed.to_owned();
    }

    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    match query {
        Some(query) => format!("sqlite://{}?{query}", absolute.display()),
        None => format!("sqlite://{}", absolute.display()),
    }
}

/// Create the database file and its parent directories if missing.
///
/// # Errors
///
/// Fails for URLs without a file path or if the file cannot be created.
pub fn prepare_sqlite_file(db_url: &str) -> Result<()> {
    if is_memory_url(db_url) {
        return Ok(());
    }

    let Some(path) = db_url.strip_prefix("sqlite://") else {
        bail!("invalid database url: {db_url}");
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        bail!("invalid database url: {db_url}");
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("creating {}", path.display()))?;
    }
    Ok(())
}

fn is_memory_url(url: &str) -> bool {
    url == "sqlite::memory:" || url.contains("mode=memory")
}
