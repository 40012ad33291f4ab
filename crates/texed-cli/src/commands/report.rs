//! Terminal rendering of build outcomes

use colored::Colorize;
use serde_json::json;
use texed_build::{BuildError, BuildSuccess, Fragment};

/// Print a command failure to stderr
///
/// Build errors anywhere in the chain get their full user message; context
/// added above them is printed first.
pub fn print_error(err: &anyhow::Error) {
    let Some(build) = err.downcast_ref::<BuildError>() else {
        eprintln!("{} {:#}", "error:".red().bold(), err);
        return;
    };

    for cause in err
        .chain()
        .take_while(|cause| cause.downcast_ref::<BuildError>().is_none())
    {
        eprintln!("{} {}", "error:".red().bold(), cause);
    }
    print_build_error(build);
}

pub fn print_build_error(err: &BuildError) {
    let Some(diagnostics) = err.diagnostics() else {
        eprintln!("{} {}", "error:".red().bold(), err.user_message());
        return;
    };

    eprintln!("{} The document was not created.", "error:".red().bold());
    if diagnostics.log_missing() {
        let log = diagnostics
            .log_path()
            .map(|p| format!(" ({})", p.display()))
            .unwrap_or_default();
        eprintln!("The compiler log could not be read{}.", log);
        return;
    }
    for fragment in diagnostics.fragments() {
        match fragment {
            Fragment::Error { message } => {
                eprintln!("{}", texed_build::diagnostics::SEPARATOR.dimmed());
                eprintln!("{}", message.red());
            }
            Fragment::Location { .. } => eprintln!("{}", fragment.render("\n").yellow()),
        }
    }
}

pub fn print_success(success: &BuildSuccess) {
    println!(
        "{} {} ({} passes, {:.1}s)",
        "Built".green().bold(),
        success.artifact.display(),
        success.passes,
        success.elapsed.as_secs_f64()
    );
    if !success.removed.is_empty() {
        println!(
            "{}",
            format!("removed {} intermediate file(s)", success.removed.len()).dimmed()
        );
    }
}

/// Machine-readable build outcome
pub fn to_json(result: &Result<BuildSuccess, BuildError>) -> serde_json::Value {
    match result {
        Ok(success) => json!({
            "status": "success",
            "source": success.source,
            "artifact": success.artifact,
            "passes": success.passes,
            "removed": success.removed,
            "elapsed_ms": success.elapsed.as_millis() as u64,
        }),
        Err(err) => json!({
            "status": "failed",
            "kind": err.kind(),
            "message": err.user_message(),
            "errors": err.diagnostics().map(|d| d.entries()).unwrap_or_default(),
        }),
    }
}
