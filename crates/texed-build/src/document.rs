//! In-memory document and the persistence step
//!
//! A [`Document`] is a text buffer plus an optional backing path. Once a path
//! is set it is reused for every save and build until it is replaced by an
//! open or save-as.
//!
//! Saving is a plain overwrite, not an atomic replace: a crash in the middle
//! of [`Document::save`] can leave a truncated file behind.

use crate::error::{BuildError, BuildResult};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use texed_config::DocumentSettings;
use thiserror::Error;
use tracing::debug;

/// Line edit outside the document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line} is out of range (document has {count} lines)")]
pub struct LineError {
    pub line: usize,
    pub count: usize,
}

/// Text buffer with its backing file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    text: String,
    path: Option<PathBuf>,
    modified: bool,
}

impl Document {
    /// Create an empty, untitled document
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an untitled document with initial text
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            path: None,
            modified: true,
        }
    }

    /// Read a document from disk
    pub fn open(path: impl AsRef<Path>) -> BuildResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
        Ok(Self {
            text,
            path: Some(path.to_path_buf()),
            modified: false,
        })
    }

    /// Read a document given on the command line
    ///
    /// Only existing files with the default extension are accepted.
    pub fn open_checked(path: impl AsRef<Path>, settings: &DocumentSettings) -> BuildResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(BuildError::InvalidDocument {
                path: path.to_path_buf(),
                reason: "file does not exist".to_string(),
            });
        }
        if !has_extension(path, &settings.default_extension) {
            return Err(BuildError::InvalidDocument {
                path: path.to_path_buf(),
                reason: format!("only .{} files can be opened", settings.default_extension),
            });
        }
        Self::open(path)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.modified = true;
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Point the document at a new file (save-as without writing)
    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = Some(path.into());
    }

    pub fn is_untitled(&self) -> bool {
        self.path.is_none()
    }

    /// Whether the buffer changed since it was last opened or saved
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// File name for prompts and messages
    pub fn display_name(&self) -> String {
        self.path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "untitled".to_string())
    }

    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }

    /// Append a line at the end of the buffer
    pub fn append_line(&mut self, line: &str) {
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.text.push('\n');
        }
        self.text.push_str(line);
        self.text.push('\n');
        self.modified = true;
    }

    /// Insert a line before 1-based line `at`; `at == line_count() + 1` appends
    pub fn insert_line(&mut self, at: usize, line: &str) -> Result<(), LineError> {
        let mut lines = self.owned_lines();
        if at == 0 || at > lines.len() + 1 {
            return Err(LineError {
                line: at,
                count: lines.len(),
            });
        }
        lines.insert(at - 1, line.to_string());
        self.store_lines(lines);
        Ok(())
    }

    /// Replace 1-based line `at`
    pub fn replace_line(&mut self, at: usize, line: &str) -> Result<(), LineError> {
        let mut lines = self.owned_lines();
        let slot = at
            .checked_sub(1)
            .and_then(|i| lines.get_mut(i))
            .ok_or(LineError {
                line: at,
                count: self.line_count(),
            })?;
        *slot = line.to_string();
        self.store_lines(lines);
        Ok(())
    }

    /// Remove 1-based line `at`, returning its text
    pub fn delete_line(&mut self, at: usize) -> Result<String, LineError> {
        let mut lines = self.owned_lines();
        if at == 0 || at > lines.len() {
            return Err(LineError {
                line: at,
                count: lines.len(),
            });
        }
        let removed = lines.remove(at - 1);
        self.store_lines(lines);
        Ok(removed)
    }

    fn owned_lines(&self) -> Vec<String> {
        self.text.lines().map(str::to_string).collect()
    }

    fn store_lines(&mut self, lines: Vec<String>) {
        self.text = lines.join("\n");
        if !self.text.is_empty() {
            self.text.push('\n');
        }
        self.modified = true;
    }

    /// Persist the buffer to its path
    ///
    /// The path gains the default extension first if it lacks an accepted one;
    /// the adjusted path becomes the document's path and is returned.
    pub fn save(&mut self, settings: &DocumentSettings) -> BuildResult<PathBuf> {
        let path = self.path.as_deref().ok_or(BuildError::Unsaved)?;
        let path = ensure_extension(path, settings);

        debug!(path = %path.display(), bytes = self.text.len(), "writing document");
        fs::write(&path, self.text.as_bytes()).map_err(|e| BuildError::io(&path, e))?;

        self.path = Some(path.clone());
        self.modified = false;
        Ok(path)
    }

    /// Persist the buffer under a new path
    pub fn save_as(
        &mut self,
        path: impl Into<PathBuf>,
        settings: &DocumentSettings,
    ) -> BuildResult<PathBuf> {
        self.set_path(path);
        self.save(settings)
    }
}

/// Append the default extension unless `path` already ends in an accepted one
///
/// Idempotent: a path returned by this function is returned unchanged.
pub fn ensure_extension(path: &Path, settings: &DocumentSettings) -> PathBuf {
    let accepted = settings
        .accepted_extensions
        .iter()
        .any(|ext| has_extension(path, ext));
    if accepted {
        return path.to_path_buf();
    }

    let mut raw: OsString = path.as_os_str().to_os_string();
    raw.push(".");
    raw.push(&settings.default_extension);
    PathBuf::from(raw)
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().ends_with(&format!(".{}", ext)))
        .unwrap_or(false)
}
