//! Per-job-key idempotency lock: exclusive-create lock file with TTL-based
//! staleness reclaim.
//!
//! Grounded on `codex-rs/core::rollout`'s session-file locking
//! discipline (an on-disk marker the process owns exclusively for the
//! duration of a run), here generalized to cover retries that must match a
//! prior attempt's `runId` and content hash rather than always refusing.

use std::fs::OpenOptions;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use std::time::SystemTime;

use serde::Deserialize;
use serde::Serialize;

use crate::error::PosterErr;
use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LockContents {
    run_id: String,
    content_hash: String,
    acquired_at_epoch_secs: u64,
}

/// Held for the duration of a run; dropping it does not remove the lock
/// file — callers must call [`IdempotencyLock::release`] explicitly so a
/// crash leaves the lock in place for the next run's staleness check.
pub struct IdempotencyLock {
    path: PathBuf,
}

impl IdempotencyLock {
    pub fn release(self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

fn lock_path(lock_dir: &Path, job_key: &str) -> PathBuf {
    lock_dir.join(format!("{job_key}.lock"))
}

fn now_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Acquires the lock for `job_key`. A fresh acquisition succeeds. A lock
/// already held by a matching `(run_id, content_hash)` pair succeeds
/// (retry of the same logical job). A lock held by a mismatched pair fails
/// with [`PosterErr::RunIdMismatchRetryBlocked`] unless it is older than
/// `ttl`, in which case it is reclaimed. Any other present lock fails with
/// [`PosterErr::DupRunDetected`].
pub fn acquire(
    lock_dir: &Path,
    job_key: &str,
    run_id: &str,
    content_hash: &str,
    ttl: Duration,
) -> Result<IdempotencyLock> {
    std::fs::create_dir_all(lock_dir)?;
    let path = lock_path(lock_dir, job_key);

    let contents = LockContents {
        run_id: run_id.to_string(),
        content_hash: content_hash.to_string(),
        acquired_at_epoch_secs: now_epoch_secs(),
    };
    let serialized = serde_json::to_vec(&contents)?;

    match OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(mut file) => {
            file.write_all(&serialized)?;
            Ok(IdempotencyLock { path })
        }
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
            handle_existing_lock(&path, &contents, ttl, &serialized)
        }
        Err(err) => Err(err.into()),
    }
}

fn handle_existing_lock(
    path: &Path,
    requested: &LockContents,
    ttl: Duration,
    serialized_requested: &[u8],
) -> Result<IdempotencyLock> {
    let mut raw = String::new();
    std::fs::File::open(path)?.read_to_string(&mut raw)?;
    let existing: Option<LockContents> = serde_json::from_str(&raw).ok();

    match existing {
        Some(existing) if existing.run_id == requested.run_id && existing.content_hash == requested.content_hash => {
            Ok(IdempotencyLock { path: path.to_path_buf() })
        }
        Some(existing) => {
            let age = now_epoch_secs().saturating_sub(existing.acquired_at_epoch_secs);
            if age > ttl.as_secs() {
                std::fs::write(path, serialized_requested)?;
                Ok(IdempotencyLock { path: path.to_path_buf() })
            } else if existing.run_id == requested.run_id {
                Err(PosterErr::RunIdMismatchRetryBlocked)
            } else {
                Err(PosterErr::DupRunDetected)
            }
        }
        None => Err(PosterErr::DupRunDetected),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn fresh_acquisition_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let lock = acquire(dir.path(), "job-1", "run-1", "hash-1", Duration::from_secs(1800)).unwrap();
        lock.release().unwrap();
    }

    #[test]
    fn matching_retry_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let first = acquire(dir.path(), "job-1", "run-1", "hash-1", Duration::from_secs(1800)).unwrap();
        let second = acquire(dir.path(), "job-1", "run-1", "hash-1", Duration::from_secs(1800)).unwrap();
        second.release().unwrap();
        let _ = first;
    }

    #[test]
    fn mismatched_retry_is_blocked() {
        let dir = tempfile::tempdir().unwrap();
        let _first = acquire(dir.path(), "job-1", "run-1", "hash-1", Duration::from_secs(1800)).unwrap();
        let second = acquire(dir.path(), "job-1", "run-2", "hash-2", Duration::from_secs(1800));
        assert!(matches!(second, Err(PosterErr::DupRunDetected)));
    }

    #[test]
    fn stale_lock_is_reclaimed() {
        let dir = tempfile::tempdir().unwrap();
        let _first = acquire(dir.path(), "job-1", "run-1", "hash-1", Duration::from_secs(0)).unwrap();
        std::thread::sleep(Duration::from_millis(10));
        let second = acquire(dir.path(), "job-1", "run-2", "hash-2", Duration::from_secs(0));
        assert!(second.is_ok());
    }
}
