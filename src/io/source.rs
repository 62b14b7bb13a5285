use std::fs;
use std::path::PathBuf;

use tracing::{debug, instrument};

use crate::error::{MergeError, Result};
use crate::model::SourceKind;

/// Yields the raw tabular text of a user-selected export.
pub trait SourceProvider {
    /// Returns the text for `source`, or [`MergeError::NoSourceSelected`] when
    /// nothing was chosen for it.
    fn read_text(&self, source: SourceKind) -> Result<String>;
}

/// Exports selected as files on disk.
#[derive(Debug, Clone, Default)]
pub struct FileSources {
    pub cn: Option<PathBuf>,
    pub us: Option<PathBuf>,
}

impl FileSources {
    pub fn new(cn: Option<PathBuf>, us: Option<PathBuf>) -> Self {
        Self { cn, us }
    }

    fn path(&self, source: SourceKind) -> Option<&PathBuf> {
        match source {
            SourceKind::Cn => self.cn.as_ref(),
            SourceKind::Us => self.us.as_ref(),
        }
    }
}

impl SourceProvider for FileSources {
    #[instrument(level = "debug", skip(self))]
    fn read_text(&self, source: SourceKind) -> Result<String> {
        let path = self
            .path(source)
            .ok_or(MergeError::NoSourceSelected(source))?;
        let text = fs::read_to_string(path)?;
        debug!(path = %path.display(), bytes = text.len(), "source read");
        Ok(text)
    }
}

/// Exports already held in memory.
#[derive(Debug, Clone, Default)]
pub struct TextSources {
    pub cn: Option<String>,
    pub us: Option<String>,
}

impl TextSources {
    pub fn new(cn: impl Into<String>, us: impl Into<String>) -> Self {
        Self {
            cn: Some(cn.into()),
            us: Some(us.into()),
        }
    }
}

impl SourceProvider for TextSources {
    fn read_text(&self, source: SourceKind) -> Result<String> {
        let text = match source {
            SourceKind::Cn => self.cn.as_ref(),
            SourceKind::Us => self.us.as_ref(),
        };
        text.cloned().ok_or(MergeError::NoSourceSelected(source))
    }
}
