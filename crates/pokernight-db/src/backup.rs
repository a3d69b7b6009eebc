//! # Database Backups
//!
//! Point-in-time copies of the live database using SQLite's `VACUUM INTO`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /api/admin/backup                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  create_backup(pool, dir)                                               │
//! │       │   VACUUM INTO 'dir/pokernight_20240105_213000.db'               │
//! │       ▼                                                                 │
//! │  BackupInfo { file_name, path, size_bytes, created_at }                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `VACUUM INTO` works on a live WAL database without blocking readers and
//! produces a compact, self-contained file.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{DbError, DbResult};

const BACKUP_PREFIX: &str = "pokernight_";
const BACKUP_EXTENSION: &str = "db";

/// A backup file on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupInfo {
    pub file_name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

/// Writes a timestamped copy of the database into `dir`.
pub async fn create_backup(pool: &SqlitePool, dir: &Path) -> DbResult<BackupInfo> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| DbError::Backup(format!("cannot create {}: {}", dir.display(), e)))?;

    let created_at = Utc::now();
    let mut file_name = format!(
        "{}{}.{}",
        BACKUP_PREFIX,
        created_at.format("%Y%m%d_%H%M%S"),
        BACKUP_EXTENSION
    );
    let mut path = dir.join(&file_name);

    // Two backups within the same second get a suffix instead of failing.
    let mut suffix = 1;
    while tokio::fs::try_exists(&path).await.unwrap_or(false) {
        file_name = format!(
            "{}{}_{}.{}",
            BACKUP_PREFIX,
            created_at.format("%Y%m%d_%H%M%S"),
            suffix,
            BACKUP_EXTENSION
        );
        path = dir.join(&file_name);
        suffix += 1;
    }

    let target = path
        .to_str()
        .ok_or_else(|| DbError::Backup(format!("non UTF-8 path {}", path.display())))?;

    sqlx::query("VACUUM INTO ?1")
        .bind(target)
        .execute(pool)
        .await?;

    let size_bytes = tokio::fs::metadata(&path)
        .await
        .map(|m| m.len())
        .map_err(|e| DbError::Backup(e.to_string()))?;

    info!(file = %file_name, size_bytes, "Database backup written");

    Ok(BackupInfo {
        file_name,
        path,
        size_bytes,
        created_at,
    })
}

/// Lists backups in `dir`, newest first. A missing directory is empty.
pub async fn list_backups(dir: &Path) -> DbResult<Vec<BackupInfo>> {
    let mut reader = match tokio::fs::read_dir(dir).await {
        Ok(reader) => reader,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(DbError::Backup(e.to_string())),
    };

    let mut backups = Vec::new();
    while let Some(item) = reader
        .next_entry()
        .await
        .map_err(|e| DbError::Backup(e.to_string()))?
    {
        let file_name = item.file_name().to_string_lossy().into_owned();
        if !is_backup_file(&file_name) {
            continue;
        }

        let metadata = match item.metadata().await {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(file = %file_name, error = %e, "Skipping unreadable backup");
                continue;
            }
        };

        let created_at = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        backups.push(BackupInfo {
            path: item.path(),
            file_name,
            size_bytes: metadata.len(),
            created_at,
        });
    }

    backups.sort_by(|a, b| b.file_name.cmp(&a.file_name));
    Ok(backups)
}

fn is_backup_file(name: &str) -> bool {
    name.starts_with(BACKUP_PREFIX) && name.ends_with(&format!(".{}", BACKUP_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("pokernight-backup-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_backup_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.players().find_or_create("Alice").await.unwrap();

        let dir = scratch_dir();
        let first = create_backup(db.pool(), &dir).await.unwrap();
        let second = create_backup(db.pool(), &dir).await.unwrap();

        assert!(first.size_bytes > 0);
        assert_ne!(first.file_name, second.file_name);

        let listed = list_backups(&dir).await.unwrap();
        assert_eq!(listed.len(), 2);

        // The copy is a usable database with the same rows.
        let restored = Database::new(DbConfig::new(first.path.clone()).run_migrations(false))
            .await
            .unwrap();
        assert_eq!(restored.players().count().await.unwrap(), 1);
        restored.close().await;

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_list_missing_dir_is_empty() {
        let listed = list_backups(&scratch_dir()).await.unwrap();
        assert!(listed.is_empty());
    }

    #[test]
    fn test_is_backup_file() {
        assert!(is_backup_file("pokernight_20240105_213000.db"));
        assert!(!is_backup_file("pokernight_20240105_213000.db-wal"));
        assert!(!is_backup_file("notes.txt"));
    }
}
