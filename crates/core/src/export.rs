use crate::collection::Entry;
use crate::sanitize::sanitize_filename;
use crate::schedule::Scheduler;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_EXPORT_INTERVAL_MS: u64 = 300;

#[derive(Debug)]
pub struct DownloadBlob {
    name: String,
    bytes: Arc<[u8]>,
}

impl DownloadBlob {
    pub fn new(name: impl Into<String>, bytes: Arc<[u8]>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("保存先ファイル名が不正です: {0}")]
    InvalidName(String),
    #[error("ファイルを書き込めませんでした: {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub trait SaveSink: Send + Sync {
    fn save(&self, blob: &DownloadBlob) -> Result<(), SaveError>;
}

// Overwrites existing files.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn target_path(&self, name: &str) -> Result<PathBuf, SaveError> {
        if name.trim().is_empty() {
            return Err(SaveError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(sanitize_filename(name)))
    }
}

impl SaveSink for DirectorySink {
    fn save(&self, blob: &DownloadBlob) -> Result<(), SaveError> {
        let path = self.target_path(blob.name())?;
        fs::create_dir_all(&self.root).map_err(|source| SaveError::Io {
            path: self.root.clone(),
            source,
        })?;
        fs::write(&path, blob.bytes()).map_err(|source| SaveError::Io {
            path: path.clone(),
            source,
        })?;
        log::info!("saved: {}", path.display());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledExport {
    pub index: usize,
    pub delay: Duration,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportSchedule {
    pub scheduled: Vec<ScheduledExport>,
    pub skipped: Vec<usize>,
}

impl ExportSchedule {
    pub fn is_empty(&self) -> bool {
        self.scheduled.is_empty()
    }
}

/// Staggers one save per entry. Delays are `index * interval`, where `index` counts every
/// entry of the collection, skipped ones included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSequencer {
    interval: Duration,
}

impl Default for ExportSequencer {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_EXPORT_INTERVAL_MS))
    }
}

impl ExportSequencer {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn delay_for(&self, index: usize) -> Duration {
        self.interval
            .saturating_mul(u32::try_from(index).unwrap_or(u32::MAX))
    }

    // Tasks own their bytes and name; clearing the collection does not cancel them.
    pub fn export_all(
        &self,
        entries: &[Entry],
        scheduler: &dyn Scheduler,
        sink: Arc<dyn SaveSink>,
    ) -> ExportSchedule {
        let mut schedule = ExportSchedule::default();

        for (index, entry) in entries.iter().enumerate() {
            let name = entry.computed_name();
            if name.trim().is_empty() {
                schedule.skipped.push(index);
                continue;
            }

            let delay = self.delay_for(index);
            let name = name.to_string();
            let bytes = Arc::clone(&entry.original_file().bytes);
            let sink = Arc::clone(&sink);
            let task_name = name.clone();
            scheduler.schedule(
                delay,
                Box::new(move || {
                    let blob = DownloadBlob::new(task_name, bytes);
                    if let Err(err) = sink.save(&blob) {
                        log::warn!("export failed for {}: {err}", blob.name());
                    }
                }),
            );
            schedule.scheduled.push(ScheduledExport { index, delay, name });
        }

        if schedule.is_empty() {
            log::info!("nothing to export");
        } else {
            log::info!(
                "{} export(s) scheduled, {} skipped",
                schedule.scheduled.len(),
                schedule.skipped.len()
            );
        }
        schedule
    }
}
