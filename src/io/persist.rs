use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use tracing::{info, instrument};

use crate::error::Result;

/// Suffix appended to the timestamp of every generated file name.
pub const FILENAME_SUFFIX: &str = " data.csv";

/// Accepts the final tabular text and offers it to the user under `filename`.
pub trait Persist {
    fn persist(&mut self, text: &str, filename: &str) -> Result<()>;
}

impl<F> Persist for F
where
    F: FnMut(&str, &str) -> Result<()>,
{
    fn persist(&mut self, text: &str, filename: &str) -> Result<()> {
        self(text, filename)
    }
}

/// Writes output files into a fixed directory.
#[derive(Debug, Clone)]
pub struct DirectoryPersist {
    dir: PathBuf,
    written: Option<PathBuf>,
}

impl DirectoryPersist {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: None,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the most recently written file.
    pub fn written(&self) -> Option<&Path> {
        self.written.as_deref()
    }
}

impl Persist for DirectoryPersist {
    #[instrument(level = "info", skip(self, text), fields(dir = %self.dir.display()))]
    fn persist(&mut self, text: &str, filename: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(filename);
        fs::write(&path, text)?;
        info!(path = %path.display(), bytes = text.len(), "output written");
        self.written = Some(path);
        Ok(())
    }
}

/// Builds the download name `MM-DD-YYYY@HH:MM data.csv` for `timestamp`.
pub fn format_filename(timestamp: NaiveDateTime) -> String {
    format!("{}{FILENAME_SUFFIX}", timestamp.format("%m-%d-%Y@%H:%M"))
}

/// Current local wall-clock time, the timestamp used for generated names.
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn timestamp(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(hour, minute, 42))
            .expect("valid timestamp")
    }

    #[test]
    fn filename_is_zero_padded() {
        assert_eq!(format_filename(timestamp(2024, 3, 7, 9, 5)), "03-07-2024@09:05 data.csv");
        assert_eq!(format_filename(timestamp(2023, 12, 31, 23, 59)), "12-31-2023@23:59 data.csv");
    }

    #[test]
    fn closures_act_as_persistence() {
        let mut captured = Vec::new();
        let mut sink = |text: &str, filename: &str| -> Result<()> {
            captured.push((text.to_string(), filename.to_string()));
            Ok(())
        };
        sink.persist("item,quantity\n", "out.csv").expect("persisted");
        assert_eq!(captured, vec![("item,quantity\n".to_string(), "out.csv".to_string())]);
    }

    #[test]
    fn directory_persist_writes_file() {
        let temp_dir = tempdir().expect("temporary directory");
        let mut sink = DirectoryPersist::new(temp_dir.path().join("nested"));
        sink.persist("item,quantity\nx,1.000\n", "result.csv").expect("persisted");

        let written = sink.written().expect("path recorded").to_path_buf();
        assert_eq!(written, temp_dir.path().join("nested").join("result.csv"));
        assert_eq!(fs::read_to_string(written).expect("read back"), "item,quantity\nx,1.000\n");
    }
}
