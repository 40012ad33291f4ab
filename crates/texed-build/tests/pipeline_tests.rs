//! End-to-end pipeline tests against a scripted stand-in for pdflatex
//!
//! The script behaves like the real compiler where it matters: it runs in the
//! working directory, writes `<stem>.log`, `<stem>.aux` and `<stem>.pdf`
//! there, and prints TeX-style error lines. Every invocation is counted.

#![cfg(unix)]

use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use texed_build::diagnostics::SEPARATOR;
use texed_build::{
    BuildError, BuildPipeline, Document, Fragment, MarkerClassifier, PathProbe, ProcessCompiler,
};
use texed_config::DocumentSettings;

const FAKE_PDFLATEX: &str = r#"
for last; do :; done
name=$(basename "$last")
stem=${name%.*}
echo run >> "@COUNTER@"

if grep -q SLEEP "$last"; then
  sleep 5
fi

if grep -q NOLOG "$last"; then
  echo "! Emergency stop."
  exit 1
fi

if grep -q FAIL "$last"; then
  printf '! Undefined control sequence.\nl.3 \\foo\n' > "$stem.log"
  echo "! Undefined control sequence."
  echo "No pages of output."
  exit 1
fi

echo "This is a log" > "$stem.log"
echo "aux" > "$stem.aux"
echo "%PDF-1.4" > "$stem.pdf"
echo "Output written on $stem.pdf (1 page, 8 bytes)."
"#;

struct Fixture {
    _scripts: TempDir,
    script: PathBuf,
    counter: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let scripts = TempDir::new().unwrap();
        let counter = scripts.path().join("runs");
        let script = scripts.path().join("fake-pdflatex.sh");
        fs::write(
            &script,
            FAKE_PDFLATEX.replace("@COUNTER@", &counter.to_string_lossy()),
        )
        .unwrap();
        Self {
            _scripts: scripts,
            script,
            counter,
        }
    }

    fn compiler(&self, timeout: Duration) -> ProcessCompiler {
        ProcessCompiler::new(
            "sh",
            vec![
                self.script.to_string_lossy().into_owned(),
                "-synctex=1".to_string(),
                "-interaction=nonstopmode".to_string(),
            ],
            timeout,
        )
    }

    fn pipeline(&self, work_dir: &Path) -> BuildPipeline<ProcessCompiler, PathProbe, MarkerClassifier> {
        BuildPipeline::new(
            self.compiler(Duration::from_secs(10)),
            PathProbe,
            MarkerClassifier,
            DocumentSettings::default(),
            work_dir,
        )
    }

    fn runs(&self) -> usize {
        fs::read_to_string(&self.counter)
            .map(|text| text.lines().count())
            .unwrap_or(0)
    }
}

fn document(dir: &Path, name: &str, text: &str) -> Document {
    let mut doc = Document::with_text(text);
    doc.set_path(dir.join(name));
    doc
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_report_builds_beside_source() {
    let fixture = Fixture::new();
    let docs = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let mut doc = document(
        docs.path(),
        "report",
        "\\documentclass{article}\n\\begin{document}\nHi\n\\end{document}\n",
    );

    let success = fixture.pipeline(work.path()).build(&mut doc).await.unwrap();

    assert_eq!(doc.path(), Some(docs.path().join("report.tex").as_path()));
    assert!(docs.path().join("report.tex").is_file());
    assert_eq!(fixture.runs(), 2);
    assert_eq!(success.passes, 2);
    assert_eq!(success.artifact, docs.path().join("report.pdf"));
    assert!(success.artifact.is_file());
    assert_eq!(entries(docs.path()), vec!["report.pdf", "report.tex"]);
    assert!(entries(work.path()).is_empty());
    assert_eq!(success.removed.len(), 2);
}

#[tokio::test]
async fn test_saving_twice_keeps_single_extension() {
    let fixture = Fixture::new();
    let docs = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let pipeline = fixture.pipeline(work.path());
    let mut doc = document(docs.path(), "report", "\\documentclass{article}\n");

    pipeline.build(&mut doc).await.unwrap();
    pipeline.build(&mut doc).await.unwrap();

    assert_eq!(doc.path(), Some(docs.path().join("report.tex").as_path()));
    assert_eq!(fixture.runs(), 4);
}

#[tokio::test]
async fn test_undefined_control_sequence_is_reported() {
    let fixture = Fixture::new();
    let docs = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let mut doc = document(docs.path(), "broken.tex", "FAIL \\foo\n");

    let err = fixture.pipeline(work.path()).build(&mut doc).await.unwrap_err();

    assert_eq!(fixture.runs(), 1);
    let diagnostics = err.diagnostics().expect("compilation failure");
    assert_eq!(
        diagnostics.fragments()[0],
        Fragment::Error {
            message: "Undefined control sequence.".to_string()
        }
    );
    assert!(diagnostics.rich_fragments()[0]
        .starts_with(&format!("{}<br>Undefined control sequence.", SEPARATOR)));
    assert_eq!(diagnostics.rich_fragments()[1], "Line: 3 \\foo");
    assert!(err.user_message().contains("Undefined control sequence."));

    // log was read, then cleaned from the working directory
    assert!(entries(work.path()).is_empty());
    assert!(!docs.path().join("broken.pdf").exists());
}

#[tokio::test]
async fn test_missing_log_gives_generic_failure() {
    let fixture = Fixture::new();
    let docs = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let mut doc = document(docs.path(), "nolog.tex", "NOLOG\n");

    let err = fixture.pipeline(work.path()).build(&mut doc).await.unwrap_err();

    let diagnostics = err.diagnostics().expect("compilation failure");
    assert!(diagnostics.log_missing());
    assert!(diagnostics.is_empty());
    assert_eq!(err.kind(), "compilation-failed");
}

#[tokio::test]
async fn test_colocated_build_keeps_intermediates() {
    let fixture = Fixture::new();
    let dir = TempDir::new().unwrap();
    let mut doc = document(dir.path(), "notes.tex", "\\documentclass{article}\n");

    let success = fixture.pipeline(dir.path()).build(&mut doc).await.unwrap();

    assert!(success.removed.is_empty());
    assert_eq!(
        entries(dir.path()),
        vec!["notes.aux", "notes.log", "notes.pdf", "notes.tex"]
    );
}

#[tokio::test]
async fn test_colocated_style_build_keeps_source_and_pdf() {
    let fixture = Fixture::new();
    let dir = TempDir::new().unwrap();
    let mut doc = document(dir.path(), "macros.sty", "\\ProvidesPackage{macros}\n");

    let success = fixture.pipeline(dir.path()).build(&mut doc).await.unwrap();

    assert_eq!(success.artifact, dir.path().join("macros.pdf"));
    assert!(success.artifact.is_file());
    assert_eq!(
        success.removed,
        vec![dir.path().join("macros.aux"), dir.path().join("macros.log")]
    );
    assert_eq!(entries(dir.path()), vec!["macros.pdf", "macros.sty"]);
}

#[tokio::test]
async fn test_colocated_failure_keeps_log() {
    let fixture = Fixture::new();
    let dir = TempDir::new().unwrap();
    let mut doc = document(dir.path(), "notes.tex", "FAIL\n");

    fixture.pipeline(dir.path()).build(&mut doc).await.unwrap_err();

    assert_eq!(entries(dir.path()), vec!["notes.log", "notes.tex"]);
}

#[tokio::test]
async fn test_timeout_stops_the_build() {
    let fixture = Fixture::new();
    let docs = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let pipeline = BuildPipeline::new(
        fixture.compiler(Duration::from_millis(300)),
        PathProbe,
        MarkerClassifier,
        DocumentSettings::default(),
        work.path(),
    );
    let mut doc = document(docs.path(), "slow.tex", "SLEEP\n");

    let err = pipeline.build(&mut doc).await.unwrap_err();

    assert!(matches!(err, BuildError::Timeout { .. }));
    assert!(err.user_message().starts_with("Time limit exceeded"));
    assert!(!docs.path().join("slow.pdf").exists());
}

#[tokio::test]
async fn test_missing_compiler_is_advisory() {
    let docs = TempDir::new().unwrap();
    let pipeline = BuildPipeline::new(
        ProcessCompiler::new("texed-no-such-pdflatex", Vec::new(), Duration::from_secs(1)),
        PathProbe,
        MarkerClassifier,
        DocumentSettings::default(),
        docs.path(),
    );
    let mut doc = document(docs.path(), "report", "text");

    let err = pipeline.build(&mut doc).await.unwrap_err();

    assert_eq!(
        err.user_message(),
        "'texed-no-such-pdflatex' was not found on this system. Please install it and try again."
    );
    // saving happens before probing
    assert!(docs.path().join("report.tex").is_file());
}
