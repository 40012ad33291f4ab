//! Error reporting from compiler logs
//!
//! Only two kinds of log lines survive: error lines (anything containing the
//! `! ` marker) and location lines (starting with `l.`). Everything else in the
//! log is dropped.

use crate::classify::ERROR_MARKER;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Token TeX uses to introduce the offending source line
pub const LOCATION_TOKEN: &str = "l.";

/// Separator emitted before every error message
pub const SEPARATOR: &str = "-----------------------";

/// Line break used in rich-text output
pub const RICH_BREAK: &str = "<br>";

const HEADER: &str = "The document was not created.";

static LOCATION_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^l\.(\d+)").expect("valid location regex"));

/// One matched log line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Fragment {
    /// Error line with the marker removed
    Error { message: String },
    /// Location line; `text` is everything after the `l.` token
    Location { text: String, line: Option<u32> },
}

impl Fragment {
    /// Render with `line_break` between the separator and the message
    pub fn render(&self, line_break: &str) -> String {
        match self {
            Self::Error { message } => format!("{}{}{}", SEPARATOR, line_break, message),
            Self::Location { text, .. } => format!("Line: {}", text),
        }
    }
}

/// Error message with the source line it refers to, if the log named one
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEntry {
    pub message: String,
    pub location: Option<String>,
    pub line: Option<u32>,
}

/// Diagnostics extracted from one compiler log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    fragments: Vec<Fragment>,
    log_path: Option<PathBuf>,
    log_missing: bool,
}

impl Diagnostics {
    /// Scan log text line by line, keeping log order
    pub fn from_log(text: &str) -> Self {
        let fragments = text.lines().filter_map(parse_line).collect();
        Self {
            fragments,
            log_path: None,
            log_missing: false,
        }
    }

    /// Read and scan a log file
    ///
    /// A missing or unreadable log yields empty diagnostics flagged with
    /// [`Diagnostics::log_missing`] so callers can fall back to a generic
    /// failure message.
    pub fn read_log(path: &Path) -> Self {
        match fs::read(path) {
            Ok(bytes) => {
                let mut diagnostics = Self::from_log(&decode_log(bytes));
                diagnostics.log_path = Some(path.to_path_buf());
                diagnostics
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "compiler log unavailable");
                Self {
                    fragments: Vec::new(),
                    log_path: Some(path.to_path_buf()),
                    log_missing: true,
                }
            }
        }
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    pub fn log_missing(&self) -> bool {
        self.log_missing
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Number of error lines found
    pub fn error_count(&self) -> usize {
        self.fragments
            .iter()
            .filter(|f| matches!(f, Fragment::Error { .. }))
            .count()
    }

    /// Group fragments into entries: each location attaches to the error before it
    pub fn entries(&self) -> Vec<ErrorEntry> {
        let mut entries: Vec<ErrorEntry> = Vec::new();
        for fragment in &self.fragments {
            match fragment {
                Fragment::Error { message } => entries.push(ErrorEntry {
                    message: message.clone(),
                    location: None,
                    line: None,
                }),
                Fragment::Location { text, line } => match entries.last_mut() {
                    Some(entry) if entry.location.is_none() => {
                        entry.location = Some(text.clone());
                        entry.line = *line;
                    }
                    _ => entries.push(ErrorEntry {
                        message: String::new(),
                        location: Some(text.clone()),
                        line: *line,
                    }),
                },
            }
        }
        entries
    }

    /// Rendered fragments using `<br>` line breaks
    pub fn rich_fragments(&self) -> Vec<String> {
        self.fragments.iter().map(|f| f.render(RICH_BREAK)).collect()
    }

    /// Message for rich-text displays
    pub fn to_rich_text(&self) -> String {
        self.render(RICH_BREAK)
    }

    /// Message for terminals
    pub fn to_plain_text(&self) -> String {
        self.render("\n")
    }

    fn render(&self, line_break: &str) -> String {
        let mut text = String::from(HEADER);
        if self.log_missing {
            text.push_str(line_break);
            text.push_str("The compiler log could not be read");
            if let Some(path) = &self.log_path {
                text.push_str(&format!(" ({})", path.display()));
            }
            text.push('.');
            return text;
        }
        for fragment in &self.fragments {
            text.push_str(line_break);
            text.push_str(&fragment.render(line_break));
        }
        text
    }
}

fn parse_line(line: &str) -> Option<Fragment> {
    if line.contains(ERROR_MARKER) {
        return Some(Fragment::Error {
            message: line.replace(ERROR_MARKER, ""),
        });
    }

    let rest = line.strip_prefix(LOCATION_TOKEN)?;
    let number = LOCATION_NUMBER
        .captures(line)
        .and_then(|caps| caps[1].parse().ok());
    Some(Fragment::Location {
        text: rest.to_string(),
        line: number,
    })
}

/// Decode log bytes as UTF-8, falling back to Latin-1
///
/// TeX writes logs in whatever encoding the input used; the fallback maps
/// every byte to a char so a read never fails on encoding.
pub fn decode_log(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => err.into_bytes().iter().map(|&b| b as char).collect(),
    }
}
