//! texed build-and-report pipeline
//!
//! Provides everything between an edited buffer and a finished PDF:
//! - Document persistence with extension inference
//! - Tool probing and bounded compiler invocation
//! - Outcome classification and log diagnostics
//! - Artifact relocation and intermediate cleanup
//! - Background builds for interactive callers
//! - PDF viewing and compression, new-document templates

pub mod classify;
pub mod compiler;
pub mod compress;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod finalize;
pub mod pipeline;
pub mod probe;
pub mod process;
pub mod service;
pub mod template;
pub mod viewer;

// Re-export main types
pub use classify::{classifier_for, ExitCodeClassifier, MarkerClassifier, Outcome, OutcomeClassifier};
pub use compiler::{CompileOutput, Compiler, ProcessCompiler};
pub use compress::compress_pdf;
pub use diagnostics::{decode_log, Diagnostics, ErrorEntry, Fragment};
pub use document::{ensure_extension, Document, LineError};
pub use error::{BuildError, BuildResult};
pub use finalize::{cleanup_intermediates, relocate_artifact};
pub use pipeline::{BuildPipeline, BuildSuccess};
pub use probe::{PathProbe, ToolProbe};
pub use service::{BuildHandle, BuildService};
pub use template::{DocumentClass, Template};
pub use viewer::{open_pdf, pdf_path};

/// Crate version, reported by `texed --version`
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
