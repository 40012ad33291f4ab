use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use texed_build::{DocumentClass, Template};
use texed_config::ConfigLoader;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

/// texed, a line-oriented LaTeX editor with an integrated build.
///
/// Edit a document in an interactive session, or build, view and compress
/// it directly from the shell. Builds run pdflatex twice, place the PDF next
/// to the source and report LaTeX errors with their line numbers.
///
/// EXAMPLES:
///     texed                           Start an empty session
///     texed --open report.tex         Start a session on report.tex
///     texed build report.tex          Build report.pdf
///     texed build report --json       Build and print a JSON report
///     texed new thesis --class book   Create thesis.tex from a template
///
/// ENVIRONMENT VARIABLES:
///     TEXED_COMPILER    Compiler executable (default: pdflatex)
///     TEXED_TIMEOUT     Compiler timeout in seconds (default: 10)
///     TEXED_VIEWER      PDF viewer (default: xdg-open)
///     TEXED_COMPRESSOR  Ghostscript executable (default: gs)
///     TEXED_JSON        Set to '1' for JSON build reports by default
///     TEXED_NO_HISTORY  Set to '1' to disable session history
///     TEXED_LOG         Log filter, e.g. 'debug' or 'texed_build=trace'
///     NO_COLOR          Set to disable colored output
#[derive(Parser)]
#[command(name = "texed")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Open a .tex document in the session at startup
    #[arg(long, short = 'o', value_name = "PATH")]
    open: Option<PathBuf>,

    /// Use this project config file instead of searching for texed.toml
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory the compiler runs in (default: current directory)
    #[arg(long, global = true, value_name = "DIR")]
    work_dir: Option<PathBuf>,

    /// Compiler timeout in seconds
    #[arg(long, global = true, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Verbose logging
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Errors only
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive editing session (default)
    ///
    /// SESSION COMMANDS:
    ///     <text>      Append a line
    ///     :p          Print with line numbers
    ///     :i/:c/:d N  Insert, change or delete line N
    ///     :w [PATH]   Save
    ///     :b          Build in the background
    ///     :v, :z      View or compress the PDF
    ///     :h, :q      Help, quit
    #[command(visible_alias = "e")]
    Edit {
        /// Document to open
        file: Option<PathBuf>,
        /// Disable history persistence
        #[arg(long, env = "TEXED_NO_HISTORY")]
        no_history: bool,
    },

    /// Build a document to PDF
    ///
    /// EXAMPLES:
    ///     texed build report.tex
    ///     texed build report --view
    ///     texed build report.tex --json
    #[command(visible_alias = "b")]
    Build {
        /// Document to build (extension optional)
        file: PathBuf,
        /// Print a JSON report on stdout
        #[arg(long)]
        json: bool,
        /// Open the PDF after a successful build
        #[arg(long)]
        view: bool,
    },

    /// Open the built PDF in the configured viewer
    View {
        /// Document whose PDF to open
        file: PathBuf,
    },

    /// Compress the built PDF with Ghostscript
    Compress {
        /// Document whose PDF to compress
        file: PathBuf,
    },

    /// Create a new document from a template
    ///
    /// EXAMPLES:
    ///     texed new report --title "Q3" --author "J. Doe" --title-page
    ///     texed new notes --class book -p amsmath -p graphicx
    New {
        /// Path of the new document (.tex appended if missing)
        path: PathBuf,
        /// Document class
        #[arg(long, default_value = "article")]
        class: DocumentClass,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        author: String,
        /// Package to load (repeatable)
        #[arg(long = "package", short = 'p', value_name = "NAME")]
        packages: Vec<String>,
        /// Emit \maketitle
        #[arg(long)]
        title_page: bool,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the resolved configuration as TOML
    Config,

    /// Generate shell completions
    ///
    /// EXAMPLES:
    ///     texed completions bash > ~/.bash_completions/texed.bash
    ///     texed completions zsh > ~/.zfunc/_texed
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let env_config = config::Config::from_env();

    if env_config.no_color {
        colored::control::set_override(false);
    }
    init_logging(cli.verbose, cli.quiet);

    match run(cli, env_config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            commands::report::print_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn log_filter(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }
    if quiet {
        return EnvFilter::new("error");
    }
    EnvFilter::try_from_env("TEXED_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
}

fn init_logging(verbose: bool, quiet: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose, quiet))
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: Cli, env_config: config::Config) -> Result<()> {
    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    let mut loader = ConfigLoader::new();
    let loaded = match &cli.config {
        Some(path) => loader.load_from_file(path),
        None => loader.load_from_directory(&cwd),
    }
    .context("Failed to load configuration")?;

    let mut settings = loaded.settings;
    if let Some(timeout) = cli.timeout {
        settings.build.timeout_secs = timeout;
    }
    debug!(
        project = ?loaded.project_file,
        compiler = %settings.build.compiler,
        timeout_secs = settings.build.timeout_secs,
        "configuration resolved"
    );

    let ctx = commands::AppContext {
        settings,
        work_dir: cli.work_dir.unwrap_or(cwd),
        env: env_config,
        project_file: loaded.project_file,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;

    match cli.command {
        None => {
            let no_history = ctx.env.no_history;
            commands::edit::run(&ctx, &runtime, cli.open, no_history)
        }
        Some(Commands::Edit { file, no_history }) => {
            let no_history = no_history || ctx.env.no_history;
            commands::edit::run(&ctx, &runtime, file.or(cli.open), no_history)
        }
        Some(Commands::Build { file, json, view }) => {
            // Command-line flag overrides environment variable
            let args = commands::build::BuildArgs {
                file,
                json: json || ctx.env.default_json,
                view,
            };
            commands::build::run(&ctx, &runtime, args)
        }
        Some(Commands::View { file }) => commands::view::run(&ctx, &runtime, &file),
        Some(Commands::Compress { file }) => commands::compress::run(&ctx, &runtime, &file),
        Some(Commands::New {
            path,
            class,
            title,
            author,
            packages,
            title_page,
            force,
        }) => {
            let args = commands::new::NewArgs {
                path,
                template: Template {
                    class,
                    title,
                    author,
                    packages,
                    title_page,
                },
                force,
            };
            commands::new::run(&ctx, args)
        }
        Some(Commands::Config) => commands::config::run(&ctx),
        Some(Commands::Completions { .. }) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_to_session() {
        let cli = Cli::parse_from(["texed"]);
        assert!(cli.command.is_none());
        assert!(cli.open.is_none());
    }

    #[test]
    fn test_cli_open_flag() {
        let cli = Cli::parse_from(["texed", "--open", "report.tex"]);
        assert_eq!(cli.open, Some(PathBuf::from("report.tex")));

        let cli = Cli::parse_from(["texed", "-o", "notes.tex"]);
        assert_eq!(cli.open, Some(PathBuf::from("notes.tex")));
    }

    #[test]
    fn test_cli_build_flags() {
        let cli = Cli::parse_from(["texed", "build", "report", "--json", "--timeout", "30"]);
        assert_eq!(cli.timeout, Some(30));
        match cli.command {
            Some(Commands::Build { file, json, view }) => {
                assert_eq!(file, PathBuf::from("report"));
                assert!(json);
                assert!(!view);
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_cli_rejects_zero_timeout() {
        assert!(Cli::try_parse_from(["texed", "build", "report", "--timeout", "0"]).is_err());
    }

    #[test]
    fn test_cli_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["texed", "-v", "-q"]).is_err());
    }

    #[test]
    fn test_cli_new_template_options() {
        let cli = Cli::parse_from([
            "texed",
            "new",
            "thesis",
            "--class",
            "book",
            "-p",
            "amsmath",
            "-p",
            "graphicx",
            "--title-page",
        ]);
        match cli.command {
            Some(Commands::New {
                class,
                packages,
                title_page,
                ..
            }) => {
                assert_eq!(class, DocumentClass::Book);
                assert_eq!(packages, vec!["amsmath", "graphicx"]);
                assert!(title_page);
            }
            _ => panic!("Expected New command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_class() {
        assert!(Cli::try_parse_from(["texed", "new", "x", "--class", "letter"]).is_err());
    }

    #[test]
    fn test_alias_b_for_build() {
        let cli = Cli::parse_from(["texed", "b", "report.tex"]);
        assert!(matches!(cli.command, Some(Commands::Build { .. })));
    }

    #[test]
    fn test_completions_bash() {
        let cli = Cli::parse_from(["texed", "completions", "bash"]);
        match cli.command {
            Some(Commands::Completions { shell }) => assert_eq!(shell, Shell::Bash),
            _ => panic!("Expected Completions command"),
        }
    }

    #[test]
    fn test_cli_debug_assert() {
        Cli::command().debug_assert();
    }
}
