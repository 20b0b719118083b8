//! # Durable Snapshot & Audit Log
//!
//! The [`PersistenceStore`] owns two plain-text files:
//!
//! * the **snapshot**, one identity per line, replaced wholesale on every write;
//! * the **audit log**, append-only, one `"<timestamp> - <message>"` line per event.
//!
//! Persistence is best effort. Failures are reported through `tracing` and
//! never surface as a failed registration.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, warn};

use raffle_common::config::Config;
use raffle_common::identity::Identity;

use crate::registry::UserRegistry;

const AUDIT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

trait IoContext<T> {
    fn context(self, action: &'static str, path: &Path) -> Result<T, StoreError>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn context(self, action: &'static str, path: &Path) -> Result<T, StoreError> {
        self.map_err(|source| StoreError::Io {
            action,
            path: path.to_path_buf(),
            source,
        })
    }
}

pub struct PersistenceStore {
    snapshot_path: PathBuf,
    audit_path: PathBuf,
    snapshot_interval: Duration,
    /// Only locked while the registry lock is held.
    last_snapshot: Mutex<Instant>,
    audit_lock: Mutex<()>,
    tmp_counter: AtomicU64,
}

impl PersistenceStore {
    pub fn new(
        snapshot_path: impl Into<PathBuf>,
        audit_path: impl Into<PathBuf>,
        snapshot_interval: Duration,
    ) -> Self {
        Self {
            snapshot_path: snapshot_path.into(),
            audit_path: audit_path.into(),
            snapshot_interval,
            last_snapshot: Mutex::new(Instant::now()),
            audit_lock: Mutex::new(()),
            tmp_counter: AtomicU64::new(1),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(&cfg.snapshot_file, &cfg.audit_file, cfg.snapshot_interval)
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn audit_path(&self) -> &Path {
        &self.audit_path
    }

    /// Loads the identities of a previous run.
    ///
    /// Blank, malformed and repeated lines are skipped. A missing or
    /// unreadable file yields an empty registry.
    pub fn recover(&self) -> Vec<Identity> {
        let bytes = match fs::read(&self.snapshot_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(
                    "Could not read snapshot {}: {e}. Starting empty.",
                    self.snapshot_path.display()
                );
                return Vec::new();
            }
        };

        let contents = String::from_utf8_lossy(&bytes);
        let mut seen: HashSet<Identity> = HashSet::new();
        let mut recovered: Vec<Identity> = Vec::new();

        for (idx, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match Identity::parse(line) {
                Ok(identity) => {
                    if seen.insert(identity.clone()) {
                        recovered.push(identity);
                    }
                }
                Err(e) => debug!("Skipping snapshot line {}: {e}", idx + 1),
            }
        }

        recovered
    }

    /// Atomically replaces the snapshot with `identities`.
    ///
    /// Writes to a unique temp file next to the target, syncs it, then
    /// renames it over the target. Returns the number of lines written.
    pub fn snapshot<'a, I>(&self, identities: I) -> Result<usize, StoreError>
    where
        I: IntoIterator<Item = &'a Identity>,
    {
        let target = &self.snapshot_path;
        ensure_parent(target)?;

        let temp = self.unique_tmp_path();
        let written = match write_lines(&temp, identities) {
            Ok(written) => written,
            Err(e) => {
                let _ = fs::remove_file(&temp);
                return Err(e);
            }
        };

        if let Err(source) = fs::rename(&temp, target) {
            let _ = fs::remove_file(&temp);
            return Err(StoreError::Io {
                action: "replace",
                path: target.clone(),
                source,
            });
        }

        debug!(path = %target.display(), lines = written, "Snapshot saved");
        Ok(written)
    }

    /// Removes the snapshot. `Ok(false)` when there was nothing to remove.
    pub fn discard(&self) -> Result<bool, StoreError> {
        match fs::remove_file(&self.snapshot_path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).context("remove", &self.snapshot_path),
        }
    }

    /// Appends one timestamped line to the audit log. Never fails the caller.
    pub fn append(&self, message: &str) {
        let line = format!(
            "{} - {message}\n",
            chrono::Local::now().format(AUDIT_TIME_FORMAT)
        );

        let _guard = self.audit_lock.lock();
        if let Err(e) = append_line(&self.audit_path, &line) {
            warn!("Audit log write failed: {e}");
        }
    }

    /// Snapshots the registry if the cadence interval has elapsed.
    ///
    /// Returns `true` when a snapshot was attempted and succeeded.
    pub fn snapshot_if_due(&self, registry: &UserRegistry, now: Instant) -> bool {
        registry.with_identities(|identities| {
            let mut last = self.last_snapshot.lock();
            if now.saturating_duration_since(*last) < self.snapshot_interval {
                return false;
            }
            *last = now;
            self.report(self.snapshot(identities))
        })
    }

    /// Forces a snapshot under the registry lock and restarts the cadence.
    pub fn checkpoint(&self, registry: &UserRegistry) -> bool {
        registry.with_identities(|identities| {
            *self.last_snapshot.lock() = Instant::now();
            self.report(self.snapshot(identities))
        })
    }

    fn report(&self, result: Result<usize, StoreError>) -> bool {
        match result {
            Ok(_) => true,
            Err(e) => {
                warn!("Snapshot failed: {e}");
                false
            }
        }
    }

    fn unique_tmp_path(&self) -> PathBuf {
        let counter = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        let file_name = self
            .snapshot_path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("snapshot");
        self.snapshot_path
            .with_file_name(format!("{file_name}.tmp.{counter}"))
    }
}

fn ensure_parent(path: &Path) -> Result<(), StoreError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).context("create directory", parent)
        }
        _ => Ok(()),
    }
}

fn write_lines<'a, I>(path: &Path, identities: I) -> Result<usize, StoreError>
where
    I: IntoIterator<Item = &'a Identity>,
{
    let file = File::create(path).context("create", path)?;
    let mut writer = BufWriter::new(file);
    let mut written = 0;

    for identity in identities {
        writeln!(writer, "{identity}").context("write", path)?;
        written += 1;
    }

    let file = writer
        .into_inner()
        .map_err(|e| e.into_error())
        .context("flush", path)?;
    file.sync_all().context("sync", path)?;
    Ok(written)
}

fn append_line(path: &Path, line: &str) -> Result<(), StoreError> {
    ensure_parent(path)?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .context("open", path)?;
    file.write_all(line.as_bytes()).context("append to", path)
}
