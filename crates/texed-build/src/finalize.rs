//! Artifact relocation and intermediate cleanup

use crate::error::{BuildError, BuildResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File stem of `source` as a string
pub(crate) fn stem_of(source: &Path) -> String {
    source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Move `<work_dir>/<stem>.pdf` next to `source`
///
/// Returns the final artifact path. Nothing is moved when the working
/// directory already is the source directory.
pub fn relocate_artifact(source: &Path, work_dir: &Path) -> BuildResult<PathBuf> {
    let file_name = format!("{}.pdf", stem_of(source));
    let produced = work_dir.join(&file_name);
    let destination = source.with_file_name(&file_name);

    if !produced.is_file() {
        return Err(BuildError::artifact_missing(produced));
    }

    if same_location(&produced, &destination) {
        debug!(artifact = %destination.display(), "artifact already in place");
        return Ok(destination);
    }

    debug!(
        from = %produced.display(),
        to = %destination.display(),
        "moving artifact"
    );
    fs::rename(&produced, &destination).map_err(|e| BuildError::io(&destination, e))?;
    Ok(destination)
}

fn same_location(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Remove build byproducts named after `source` from `work_dir`
///
/// If `<work_dir>/<stem>.<source_extension>` exists the build ran in place
/// and nothing is removed. Otherwise every regular file called `<stem>` or
/// `<stem>.<anything>` is deleted, except `source` itself and the relocated
/// `artifact`. Individual removal failures are logged and skipped.
pub fn cleanup_intermediates(
    source: &Path,
    work_dir: &Path,
    source_extension: &str,
    artifact: Option<&Path>,
) -> BuildResult<Vec<PathBuf>> {
    let stem = stem_of(source);
    if stem.is_empty() {
        return Ok(Vec::new());
    }

    let colocated = work_dir.join(format!("{}.{}", stem, source_extension));
    if colocated.exists() {
        debug!(source = %colocated.display(), "source in working directory, keeping intermediates");
        return Ok(Vec::new());
    }

    let prefix = format!("{}.", stem);
    let entries = fs::read_dir(work_dir).map_err(|e| BuildError::io(work_dir, e))?;
    let mut removed = Vec::new();

    for entry in entries {
        let entry = entry.map_err(|e| BuildError::io(work_dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name != stem && !name.starts_with(&prefix) {
            continue;
        }

        let path = entry.path();
        if !path.is_file() || same_location(&path, source) {
            continue;
        }
        if artifact.is_some_and(|artifact| same_location(&path, artifact)) {
            continue;
        }

        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "removed intermediate");
                removed.push(path);
            }
            Err(error) => warn!(path = %path.display(), %error, "could not remove intermediate"),
        }
    }

    removed.sort();
    Ok(removed)
}
