use anyhow::Result;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};

pub fn is_memory_url(database_url: &str) -> bool {
    database_url.starts_with("sqlite::memory:") || database_url.contains("mode=memory")
}

/// Opens a pool for `database_url`. An in-memory database only lives as long
/// as its connection, so those pools hold exactly one connection forever.
pub async fn connect_pool(database_url: &str) -> Result<Pool<Sqlite>> {
    let options = if is_memory_url(database_url) {
        SqlitePoolOptions::new().max_connections(1).min_connections(1).idle_timeout(None).max_lifetime(None)
    } else {
        prepare_sqlite_file(database_url)?;
        SqlitePoolOptions::new().max_connections(5)
    };
    Ok(options.connect(database_url).await?)
}

/// Creates the database file (and its parent directory) for file-backed URLs.
pub fn prepare_sqlite_file(database_url: &str) -> Result<()> {
    if is_memory_url(database_url) { return Ok(()); }
    if let Some(path) = database_url.strip_prefix("sqlite://") {
        let path = path.split('?').next().unwrap_or(path);
        // On Windows, absolute paths may look like /C:/path; strip the leading slash
        let path = if cfg!(windows) && path.len() >= 3 && path.as_bytes()[0] == b'/' && path.as_bytes()[2] == b':' {
            &path[1..]
        } else {
            path
        };
        use std::{fs, path::Path, fs::OpenOptions};
        let p = Path::new(path);
        if let Some(parent) = p.parent() { if !parent.as_os_str().is_empty() { fs::create_dir_all(parent)?; } }
        if !p.exists() {
            let _ = OpenOptions::new().create(true).append(true).open(p)?;
        }
    }
    Ok(())
}
