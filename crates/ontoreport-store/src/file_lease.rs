//! Lock-file lease shared by every process on one host
//!
//! The lease is a file created with `create_new`, so exactly one process can
//! hold it. The file carries the owner token; a file older than the TTL is
//! left by a crashed holder and gets removed by the next waiter.

use crate::lease::LeaseBackend;
use ontoreport_core::ReportError;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

pub struct FileLease {
    dir: PathBuf,
}

impl FileLease {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Lock files kept in the directory of the report at `report_path`.
    pub fn beside(report_path: &Path) -> Self {
        let dir = report_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Self::new(dir)
    }

    pub fn lock_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!(".{}.lock", key))
    }

    /// Token written by the current holder of `key`.
    pub fn holder(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.lock_path(key))
            .ok()
            .map(|token| token.trim().to_string())
    }

    fn clear_if_expired(&self, path: &Path, ttl: Duration) -> Result<(), ReportError> {
        let modified = match fs::metadata(path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(unavailable(e)),
        };
        // A clock that went backwards reads as a fresh lock.
        let age = modified.elapsed().unwrap_or_default();
        if age < ttl {
            return Ok(());
        }

        warn!(path = %path.display(), age_ms = age.as_millis() as u64, "removing expired lease file");
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(unavailable(e)),
        }
    }
}

impl LeaseBackend for FileLease {
    fn try_acquire(&self, key: &str, token: &str, ttl: Duration) -> Result<bool, ReportError> {
        fs::create_dir_all(&self.dir).map_err(unavailable)?;
        let path = self.lock_path(key);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(token.as_bytes())
                    .and_then(|_| file.sync_all())
                    .map_err(unavailable)?;
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                self.clear_if_expired(&path, ttl)?;
                Ok(false)
            }
            Err(e) => Err(unavailable(e)),
        }
    }

    fn release(&self, key: &str, token: &str) -> Result<(), ReportError> {
        let path = self.lock_path(key);
        let holder = match fs::read_to_string(&path) {
            Ok(holder) => holder,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(unavailable(e)),
        };
        if holder.trim() != token {
            return Ok(());
        }
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(unavailable(e)),
        }
    }
}

fn unavailable(err: std::io::Error) -> ReportError {
    ReportError::LockUnavailable(err.to_string())
}
