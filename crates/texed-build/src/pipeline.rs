//! The build-and-report pipeline
//!
//! One build runs save → probe → invoke → classify and then either reports
//! diagnostics or finalizes the artifact. Steps never reorder or overlap.

use crate::classify::{classifier_for, OutcomeClassifier};
use crate::compiler::{Compiler, ProcessCompiler};
use crate::diagnostics::Diagnostics;
use crate::document::Document;
use crate::error::{BuildError, BuildResult};
use crate::finalize::{cleanup_intermediates, relocate_artifact, stem_of};
use crate::probe::{PathProbe, ToolProbe};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use texed_config::{DocumentSettings, Settings};
use tracing::{debug, info, warn};

/// Compiler passes on the success path
pub const SUCCESS_PASSES: u32 = 2;

/// Result of a successful build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildSuccess {
    /// Compiled source, absolute
    pub source: PathBuf,
    /// Final PDF location, beside the source
    pub artifact: PathBuf,
    /// Number of compiler runs performed
    pub passes: u32,
    /// Intermediates deleted from the working directory
    pub removed: Vec<PathBuf>,
    #[serde(skip)]
    pub elapsed: Duration,
}

/// Runs builds with an injected compiler, probe and classifier
pub struct BuildPipeline<C = ProcessCompiler, P = PathProbe, K = Box<dyn OutcomeClassifier>> {
    compiler: C,
    probe: P,
    classifier: K,
    document: DocumentSettings,
    work_dir: PathBuf,
}

impl BuildPipeline {
    /// Pipeline using the configured compiler and classifier
    pub fn from_settings(settings: &Settings, work_dir: impl Into<PathBuf>) -> Self {
        Self::new(
            ProcessCompiler::from_settings(&settings.build),
            PathProbe,
            classifier_for(settings.build.classifier),
            settings.document.clone(),
            work_dir,
        )
    }
}

impl<C, P, K> BuildPipeline<C, P, K>
where
    C: Compiler,
    P: ToolProbe,
    K: OutcomeClassifier,
{
    pub fn new(
        compiler: C,
        probe: P,
        classifier: K,
        document: DocumentSettings,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            compiler,
            probe,
            classifier,
            document,
            work_dir: work_dir.into(),
        }
    }

    /// Directory the compiler runs in and writes its outputs to
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn document_settings(&self) -> &DocumentSettings {
        &self.document
    }

    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    /// Save `document` and build it
    pub async fn build(&self, document: &mut Document) -> BuildResult<BuildSuccess> {
        let path = document.save(&self.document)?;
        self.compile_saved(&path).await
    }

    /// Build a source file that is already on disk
    pub async fn compile_saved(&self, source: &Path) -> BuildResult<BuildSuccess> {
        let start = Instant::now();
        let source = absolute(source)?;
        let program = self.compiler.program();

        if !self.probe.is_available(program) {
            return Err(BuildError::tool_not_found(program));
        }

        info!(source = %source.display(), work_dir = %self.work_dir.display(), "building");
        let output = self.compiler.compile(&source, &self.work_dir).await?;

        if !self.classifier.classify(&output).is_success() {
            let log = self.work_dir.join(format!("{}.log", stem_of(&source)));
            let diagnostics = Diagnostics::read_log(&log);
            info!(errors = diagnostics.error_count(), "build failed");
            self.cleanup(&source, None);
            return Err(BuildError::CompilationFailed(diagnostics));
        }

        debug!("first pass clean, running second pass");
        self.compiler.compile(&source, &self.work_dir).await?;

        let artifact = relocate_artifact(&source, &self.work_dir)?;
        let removed = self.cleanup(&source, Some(artifact.as_path()));

        let elapsed = start.elapsed();
        info!(
            artifact = %artifact.display(),
            elapsed_ms = elapsed.as_millis() as u64,
            "build finished"
        );

        Ok(BuildSuccess {
            source,
            artifact,
            passes: SUCCESS_PASSES,
            removed,
            elapsed,
        })
    }

    fn cleanup(&self, source: &Path, artifact: Option<&Path>) -> Vec<PathBuf> {
        match cleanup_intermediates(
            source,
            &self.work_dir,
            &self.document.default_extension,
            artifact,
        ) {
            Ok(removed) => removed,
            Err(error) => {
                warn!(%error, "cleanup failed");
                Vec::new()
            }
        }
    }
}

pub(crate) fn absolute(path: &Path) -> BuildResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| BuildError::io(path, e))?;
    Ok(cwd.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::MarkerClassifier;
    use crate::compiler::CompileOutput;
    use async_trait::async_trait;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct Missing;

    impl ToolProbe for Missing {
        fn is_available(&self, _tool: &str) -> bool {
            false
        }
    }

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Compiler for Counting {
        fn program(&self) -> &str {
            "pdflatex"
        }

        async fn compile(&self, _source: &Path, _work_dir: &Path) -> BuildResult<CompileOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(CompileOutput {
                text: String::new(),
                exit_code: Some(0),
            })
        }
    }

    #[tokio::test]
    async fn test_missing_compiler_spawns_nothing() {
        let dir = TempDir::new().unwrap();
        let pipeline = BuildPipeline::new(
            Counting::default(),
            Missing,
            MarkerClassifier,
            DocumentSettings::default(),
            dir.path(),
        );
        let source = dir.path().join("report.tex");
        fs::write(&source, "\\documentclass{article}").unwrap();

        let err = pipeline.compile_saved(&source).await.unwrap_err();

        assert!(matches!(err, BuildError::ToolNotFound { ref tool } if tool == "pdflatex"));
        assert_eq!(pipeline.compiler().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_untitled_document_is_not_built() {
        let dir = TempDir::new().unwrap();
        let pipeline = BuildPipeline::new(
            Counting::default(),
            PathProbe,
            MarkerClassifier,
            DocumentSettings::default(),
            dir.path(),
        );
        let mut document = Document::with_text("hello");

        let err = pipeline.build(&mut document).await.unwrap_err();

        assert!(matches!(err, BuildError::Unsaved));
        assert_eq!(pipeline.compiler().calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_absolute_keeps_absolute_paths() {
        let dir = TempDir::new().unwrap();
        assert_eq!(absolute(dir.path()).unwrap(), dir.path());
        assert!(absolute(Path::new("report.tex")).unwrap().is_absolute());
    }
}
