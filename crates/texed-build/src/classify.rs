//! Outcome classification
//!
//! pdflatex in nonstopmode does not signal failure reliably, so the default
//! classifier scans the captured text instead of the exit status. The scan is
//! a heuristic: a document that merely prints "! " at the start of a line
//! will be reported as failed.

use crate::compiler::CompileOutput;
use texed_config::ClassifierKind;

/// Prefix of a TeX error line
pub const ERROR_MARKER: &str = "! ";

/// Printed by pdflatex when nothing was typeset
pub const NO_PAGES_MARKER: &str = "No pages";

/// Verdict on one compiler run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Decides success or failure from a compiler run
pub trait OutcomeClassifier: Send + Sync {
    fn classify(&self, output: &CompileOutput) -> Outcome;
}

/// Looks for TeX failure markers in the output text
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkerClassifier;

impl OutcomeClassifier for MarkerClassifier {
    fn classify(&self, output: &CompileOutput) -> Outcome {
        let failed = output.text.contains(NO_PAGES_MARKER)
            || output
                .text
                .lines()
                .any(|line| line.starts_with(ERROR_MARKER));
        if failed {
            Outcome::Failure
        } else {
            Outcome::Success
        }
    }
}

/// Trusts the exit status; a signal-terminated run counts as failure
#[derive(Debug, Clone, Copy, Default)]
pub struct ExitCodeClassifier;

impl OutcomeClassifier for ExitCodeClassifier {
    fn classify(&self, output: &CompileOutput) -> Outcome {
        match output.exit_code {
            Some(0) => Outcome::Success,
            _ => Outcome::Failure,
        }
    }
}

/// Configured classifier
pub fn classifier_for(kind: ClassifierKind) -> Box<dyn OutcomeClassifier> {
    match kind {
        ClassifierKind::Markers => Box::new(MarkerClassifier),
        ClassifierKind::ExitCode => Box::new(ExitCodeClassifier),
    }
}

impl<C: OutcomeClassifier + ?Sized> OutcomeClassifier for Box<C> {
    fn classify(&self, output: &CompileOutput) -> Outcome {
        (**self).classify(output)
    }
}
