use crate::config::OutputConfig;
use crate::error::{Result, StorageError};
use crate::table::Table;
use crate::utils::{ensure_directory, path_timestamp};
use crate::{log_debug, log_info};
use chrono::{DateTime, Local};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const AGGREGATE_FILE: &str = "all_enrollments.csv";
pub const FAILED_SOURCES_FILE: &str = "failed_sources.json";

/// The destination directory of one run and the checkpoints written into it.
#[derive(Debug)]
pub struct RunOutput {
    destination: PathBuf,
    latest: PathBuf,
    checkpoints: Vec<PathBuf>,
}

impl RunOutput {
    /// Creates `<directory>/<prefix>-<timestamp>`. An existing directory of
    /// that name is never reused.
    pub fn create(config: &OutputConfig, started_at: &DateTime<Local>) -> Result<Self> {
        ensure_directory(&config.directory)?;
        let destination = config
            .directory
            .join(format!("{}-{}", config.prefix, path_timestamp(started_at)));

        fs::create_dir(&destination).map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => StorageError::DestinationExists(destination.clone()).into(),
            _ => crate::error::AppError::from(e),
        })?;
        log_info!("[output] Writing results to {}", destination.display());

        Ok(Self {
            destination,
            latest: config.directory.join(&config.latest),
            checkpoints: Vec::new(),
        })
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Persists one finished batch as `<label>.csv`. A label can only be
    /// checkpointed once per run.
    pub fn checkpoint(&mut self, batch: &Table, label: &str) -> Result<PathBuf> {
        let path = self.destination.join(format!("{}.csv", label));
        if self.checkpoints.contains(&path) {
            return Err(StorageError::DuplicateCheckpoint(path).into());
        }
        batch.write_csv(&path)?;
        log_debug!("[output] Checkpointed {} rows to {}", batch.len(), path.display());
        self.checkpoints.push(path.clone());
        Ok(path)
    }

    /// Writes the aggregate, reads it back and compares row counts. Only
    /// after that succeeds are the checkpoints removed and `latest` pointed at
    /// this run.
    pub fn finalize(self, aggregate: &Table) -> Result<PathBuf> {
        let path = self.destination.join(AGGREGATE_FILE);
        aggregate.write_csv(&path)?;
        self.commit(path, aggregate.len())
    }

    /// Checks that `path` holds `expected_rows` rows, then drops the
    /// checkpoints and moves `latest`. On a mismatch nothing is touched.
    fn commit(self, path: PathBuf, expected_rows: usize) -> Result<PathBuf> {
        let from_disk = Table::read_csv(&path)?;
        if from_disk.len() != expected_rows {
            return Err(StorageError::RowCountMismatch {
                expected: expected_rows,
                found: from_disk.len(),
            }
            .into());
        }

        for checkpoint in &self.checkpoints {
            fs::remove_file(checkpoint)?;
        }

        point_latest(&self.latest, &self.destination)?;
        log_info!(
            "[output] Wrote {} rows to {}",
            expected_rows,
            path.display()
        );
        Ok(path)
    }
}

/// Points `latest` at `destination`, replacing whatever it pointed at before.
///
/// The new pointer is created beside the old one and renamed over it, so
/// readers see either the old or the new target.
pub fn point_latest(latest: &Path, destination: &Path) -> Result<()> {
    let file_name = latest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "latest".to_string());
    let staging = latest.with_file_name(format!(".{}.tmp", file_name));
    if fs::symlink_metadata(&staging).is_ok() {
        fs::remove_file(&staging)?;
    }

    write_pointer(&staging, &pointer_target(latest, destination))?;
    fs::rename(&staging, latest)?;
    Ok(())
}

/// Relative when both live in the same directory, so the pointer survives
/// moving the whole results tree.
fn pointer_target(latest: &Path, destination: &Path) -> PathBuf {
    match (latest.parent(), destination.parent(), destination.file_name()) {
        (Some(a), Some(b), Some(name)) if a == b => PathBuf::from(name),
        _ => destination.to_path_buf(),
    }
}

#[cfg(unix)]
fn write_pointer(at: &Path, target: &Path) -> Result<()> {
    std::os::unix::fs::symlink(target, at)?;
    Ok(())
}

#[cfg(not(unix))]
fn write_pointer(at: &Path, target: &Path) -> Result<()> {
    fs::write(at, target.to_string_lossy().as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn output_config(dir: &Path) -> OutputConfig {
        OutputConfig {
            directory: dir.to_path_buf(),
            ..OutputConfig::default()
        }
    }

    fn started() -> DateTime<Local> {
        Local.with_ymd_and_hms(2015, 9, 1, 8, 30, 0).unwrap()
    }

    fn batch(ids: &[&str]) -> Table {
        let mut t = Table::new(vec!["ID #".into()]);
        for id in ids {
            t.push_row(vec![id.to_string()]).unwrap();
        }
        t
    }

    #[test]
    fn destination_collision_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = output_config(dir.path());
        RunOutput::create(&config, &started()).unwrap();

        let err = RunOutput::create(&config, &started()).unwrap_err();
        assert!(matches!(
            err,
            crate::error::AppError::Storage(StorageError::DestinationExists(_))
        ));
    }

    #[test]
    fn finalize_removes_checkpoints_and_keeps_aggregate() {
        let dir = tempfile::tempdir().unwrap();
        let mut output = RunOutput::create(&output_config(dir.path()), &started()).unwrap();
        let destination = output.destination().to_path_buf();

        let first = batch(&["000001", "000002"]);
        let second = batch(&["000003"]);
        let p1 = output.checkpoint(&first, "ART-20155").unwrap();
        let p2 = output.checkpoint(&second, "PHYS-20155").unwrap();
        assert!(p1.exists() && p2.exists());

        let mut aggregate = first.clone();
        aggregate.vstack(&second);
        let path = output.finalize(&aggregate).unwrap();

        assert_eq!(Table::read_csv(&path).unwrap().len(), 3);
        assert!(!p1.exists());
        assert!(!p2.exists());
        assert_eq!(path, destination.join(AGGREGATE_FILE));
    }

    #[test]
    fn short_read_back_keeps_checkpoints_and_latest() {
        let dir = tempfile::tempdir().unwrap();
        let mut output = RunOutput::create(&output_config(dir.path()), &started()).unwrap();
        let p1 = output.checkpoint(&batch(&["000001", "000002"]), "ART-20155").unwrap();
        let p2 = output.checkpoint(&batch(&["000003"]), "PHYS-20155").unwrap();

        // Only two of the three rows made it to disk.
        let written = output.destination().join(AGGREGATE_FILE);
        batch(&["000001", "000002"]).write_csv(&written).unwrap();

        let err = output.commit(written, 3).unwrap_err();
        assert!(matches!(
            err,
            crate::error::AppError::Storage(StorageError::RowCountMismatch {
                expected: 3,
                found: 2
            })
        ));
        assert!(p1.exists());
        assert!(p2.exists());
        assert!(fs::symlink_metadata(dir.path().join("latest")).is_err());
    }

    #[test]
    fn repeated_label_is_rejected_without_overwriting() {
        let dir = tempfile::tempdir().unwrap();
        let mut output = RunOutput::create(&output_config(dir.path()), &started()).unwrap();
        let path = output.checkpoint(&batch(&["000123"]), "000123-20155").unwrap();

        let err = output
            .checkpoint(&batch(&["000123", "000999"]), "000123-20155")
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::AppError::Storage(StorageError::DuplicateCheckpoint(_))
        ));
        assert_eq!(Table::read_csv(&path).unwrap().len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn latest_pointer_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let latest = dir.path().join("latest");
        let old = dir.path().join("results-old");
        let new = dir.path().join("results-new");
        fs::create_dir(&old).unwrap();
        fs::create_dir(&new).unwrap();

        point_latest(&latest, &old).unwrap();
        assert_eq!(fs::read_link(&latest).unwrap(), PathBuf::from("results-old"));

        point_latest(&latest, &new).unwrap();
        assert_eq!(fs::read_link(&latest).unwrap(), PathBuf::from("results-new"));
        assert_eq!(fs::canonicalize(&latest).unwrap(), fs::canonicalize(&new).unwrap());
    }
}
