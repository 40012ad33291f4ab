//! Interactive editing session
//!
//! A line-oriented editor over one document. Plain input is appended to the
//! buffer; lines starting with `:` are commands. Builds, viewer launches and
//! compression run in the background and are reported before the next prompt.

use super::report::{print_build_error, print_success};
use super::AppContext;
use anyhow::Result;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use texed_build::{
    compress_pdf, ensure_extension, open_pdf, BuildError, BuildHandle, BuildPipeline,
    BuildResult, BuildService, BuildSuccess, Document, DocumentClass, PathProbe, Template,
};
use texed_config::Settings;
use tokio::runtime::{Handle, Runtime};
use tokio::task::JoinHandle;

/// One line of session input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Append(String),
    Print,
    Insert(usize, String),
    Change(usize, String),
    Delete(usize),
    Write(Option<PathBuf>),
    Open { path: PathBuf, force: bool },
    New,
    Build,
    View,
    Compress,
    Status,
    Help,
    Quit { force: bool },
}

/// Parse a session input line
///
/// `::text` appends `:text` literally.
pub fn parse_command(line: &str) -> Result<SessionCommand, String> {
    let Some(body) = line.strip_prefix(':') else {
        return Ok(SessionCommand::Append(line.to_string()));
    };
    if body.starts_with(':') {
        return Ok(SessionCommand::Append(body.to_string()));
    }

    let (name, rest) = body.split_once(' ').unwrap_or((body, ""));
    let command = match name {
        "p" | "print" => SessionCommand::Print,
        "i" | "insert" => {
            let (at, text) = line_argument(rest)?;
            SessionCommand::Insert(at, text)
        }
        "c" | "change" => {
            let (at, text) = line_argument(rest)?;
            SessionCommand::Change(at, text)
        }
        "d" | "delete" => SessionCommand::Delete(line_argument(rest)?.0),
        "w" | "write" => {
            let rest = rest.trim();
            SessionCommand::Write((!rest.is_empty()).then(|| PathBuf::from(rest)))
        }
        "e" | "edit" | "e!" => {
            let rest = rest.trim();
            if rest.is_empty() {
                return Err(format!("usage: :{} PATH", name));
            }
            SessionCommand::Open {
                path: PathBuf::from(rest),
                force: name == "e!",
            }
        }
        "new" => SessionCommand::New,
        "b" | "build" => SessionCommand::Build,
        "v" | "view" => SessionCommand::View,
        "z" | "compress" => SessionCommand::Compress,
        "s" | "status" => SessionCommand::Status,
        "h" | "help" => SessionCommand::Help,
        "q" | "quit" => SessionCommand::Quit { force: false },
        "q!" => SessionCommand::Quit { force: true },
        other => return Err(format!("unknown command ':{}' (:h for help)", other)),
    };
    Ok(command)
}

/// Split `N text` into a line number and the text after one space
fn line_argument(rest: &str) -> Result<(usize, String), String> {
    let rest = rest.trim_start();
    let (number, text) = rest.split_once(' ').unwrap_or((rest, ""));
    let at = number
        .parse::<usize>()
        .map_err(|_| format!("expected a line number, got '{}'", number))?;
    Ok((at, text.to_string()))
}

/// Whether the input loop should keep going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Viewer or compressor run started from the prompt
struct PdfTask {
    label: &'static str,
    task: JoinHandle<BuildResult<PathBuf>>,
}

/// Editing state: the document, its settings and pending work
pub struct Session {
    document: Document,
    settings: Settings,
    service: BuildService,
    runtime: Handle,
    pending: Vec<BuildHandle>,
    tasks: Vec<PdfTask>,
}

impl Session {
    pub fn new(document: Document, settings: Settings, work_dir: PathBuf, runtime: Handle) -> Self {
        let pipeline = BuildPipeline::from_settings(&settings, work_dir);
        Self {
            document,
            service: BuildService::new(pipeline, runtime.clone()),
            settings,
            runtime,
            pending: Vec::new(),
            tasks: Vec::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn pending_builds(&self) -> usize {
        self.pending.len()
    }

    /// Viewer and compressor runs not yet reported
    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    pub fn prompt(&self) -> String {
        let marker = if self.document.is_modified() { "*" } else { "" };
        format!("{}{}> ", self.document.display_name(), marker)
    }

    pub fn execute(&mut self, command: SessionCommand) -> Flow {
        match command {
            SessionCommand::Append(line) => self.document.append_line(&line),
            SessionCommand::Print => self.print(),
            SessionCommand::Insert(at, text) => {
                if let Err(err) = self.document.insert_line(at, &text) {
                    warn(&err.to_string());
                }
            }
            SessionCommand::Change(at, text) => {
                if let Err(err) = self.document.replace_line(at, &text) {
                    warn(&err.to_string());
                }
            }
            SessionCommand::Delete(at) => match self.document.delete_line(at) {
                Ok(removed) => println!("{} {}", "deleted:".dimmed(), removed),
                Err(err) => warn(&err.to_string()),
            },
            SessionCommand::Write(path) => {
                self.write(path);
            }
            SessionCommand::Open { path, force } => self.open(path, force),
            // Needs interactive prompts; the input loop calls `start_new`.
            SessionCommand::New => self.start_new(Template::default()),
            SessionCommand::Build => self.build(),
            SessionCommand::View => self.view(),
            SessionCommand::Compress => self.compress(),
            SessionCommand::Status => self.status(),
            SessionCommand::Help => print_help(),
            SessionCommand::Quit { force } => {
                if self.document.is_modified() && !force {
                    warn("unsaved changes (:w to save, :q! to discard)");
                    return Flow::Continue;
                }
                self.finish();
                return Flow::Quit;
            }
        }
        Flow::Continue
    }

    fn print(&self) {
        for (i, line) in self.document.lines().enumerate() {
            println!("{} {}", format!("{:>4}", i + 1).dimmed(), line);
        }
    }

    fn write(&mut self, path: Option<PathBuf>) -> Option<PathBuf> {
        let result = match path {
            Some(path) => self.document.save_as(path, &self.settings.document),
            None => self.document.save(&self.settings.document),
        };
        match result {
            Ok(path) => {
                println!("{} {}", "Saved".green().bold(), path.display());
                Some(path)
            }
            Err(BuildError::Unsaved) => {
                warn("no file name (use :w PATH)");
                None
            }
            Err(err) => {
                print_build_error(&err);
                None
            }
        }
    }

    fn open(&mut self, path: PathBuf, force: bool) {
        if self.document.is_modified() && !force {
            warn("unsaved changes (:w to save, :e! PATH to discard)");
            return;
        }
        match Document::open(&path) {
            Ok(document) => {
                println!(
                    "{} {} ({} lines)",
                    "Opened".green().bold(),
                    path.display(),
                    document.line_count()
                );
                self.document = document;
            }
            Err(err) => print_build_error(&err),
        }
    }

    /// Save the current document if it has a file, then switch to a new one
    pub fn start_new(&mut self, template: Template) {
        if !self.document.is_untitled() && self.write(None).is_none() {
            return;
        }
        self.document = Document::with_text(template.render());
        println!(
            "{} {} document (:w PATH to name it)",
            "New".green().bold(),
            template.class
        );
    }

    fn build(&mut self) {
        if let Some(path) = self.document.path() {
            let target = ensure_extension(path, &self.settings.document);
            if self.service.is_running(&target) {
                print_build_error(&BuildError::AlreadyRunning { path: target });
                return;
            }
        }

        let Some(path) = self.write(None) else {
            return;
        };
        match self.service.submit(&path) {
            Ok(handle) => {
                println!("{} {} in the background", "Building".cyan().bold(), path.display());
                self.pending.push(handle);
            }
            Err(err) => print_build_error(&err),
        }
    }

    fn view(&mut self) {
        let path = match self.document_path() {
            Ok(path) => path,
            Err(err) => return print_build_error(&err),
        };
        let settings = self.settings.viewer.clone();
        let task = self.runtime.spawn(async move {
            let probe = PathProbe;
            open_pdf(&path, &settings, &probe).await
        });
        self.tasks.push(PdfTask {
            label: "Opened",
            task,
        });
    }

    fn compress(&mut self) {
        let path = match self.document_path() {
            Ok(path) => path,
            Err(err) => return print_build_error(&err),
        };
        println!(
            "{} {} in the background",
            "Compressing".cyan().bold(),
            path.with_extension("pdf").display()
        );
        let settings = self.settings.compress.clone();
        let task = self.runtime.spawn(async move {
            let probe = PathProbe;
            compress_pdf(&path, &settings, &probe).await
        });
        self.tasks.push(PdfTask {
            label: "Compressed",
            task,
        });
    }

    fn report_task(&self, task: PdfTask) {
        match self.runtime.block_on(task.task) {
            Ok(Ok(pdf)) => println!("{} {}", task.label.green().bold(), pdf.display()),
            Ok(Err(err)) => print_build_error(&err),
            Err(err) => warn(&format!("background task failed: {}", err)),
        }
    }

    fn document_path(&self) -> BuildResult<PathBuf> {
        self.document
            .path()
            .map(|p| p.to_path_buf())
            .ok_or(BuildError::Unsaved)
    }

    fn status(&self) {
        let path = self
            .document
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(untitled)".to_string());
        println!("document: {}", path);
        println!("lines:    {}", self.document.line_count());
        println!(
            "modified: {}",
            if self.document.is_modified() { "yes" } else { "no" }
        );
        let running = self.service.running();
        if running.is_empty() {
            println!("builds:   none running");
        } else {
            for source in running {
                println!("builds:   {} (running)", source.display());
            }
        }
    }

    /// Report builds that finished since the last call
    pub fn poll_builds(&mut self) {
        let mut unfinished = Vec::with_capacity(self.pending.len());
        for mut handle in self.pending.drain(..) {
            match handle.try_result() {
                Some(result) => report(result),
                None => unfinished.push(handle),
            }
        }
        self.pending = unfinished;

        let (finished, running): (Vec<_>, Vec<_>) =
            self.tasks.drain(..).partition(|t| t.task.is_finished());
        self.tasks = running;
        for task in finished {
            self.report_task(task);
        }
    }

    /// Wait for every pending build and PDF task and report it
    pub fn finish(&mut self) {
        let waiting = self.pending.len() + self.tasks.len();
        if waiting > 0 {
            println!("{}", format!("waiting for {} task(s)...", waiting).dimmed());
        }
        for handle in self.pending.drain(..) {
            report(self.runtime.block_on(handle.wait()));
        }
        let tasks: Vec<PdfTask> = self.tasks.drain(..).collect();
        for task in tasks {
            self.report_task(task);
        }
    }
}

fn report(result: BuildResult<BuildSuccess>) {
    match result {
        Ok(success) => print_success(&success),
        Err(err) => print_build_error(&err),
    }
}

fn warn(message: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), message);
}

fn print_help() {
    println!("texed session commands:");
    println!("  <text>            Append a line (::text appends ':text')");
    println!("  :p                Print the document with line numbers");
    println!("  :i N text         Insert text before line N");
    println!("  :c N text         Replace line N");
    println!("  :d N              Delete line N");
    println!("  :w [PATH]         Save, or save under PATH");
    println!("  :e PATH           Open PATH (:e! discards unsaved changes)");
    println!("  :new              Save, then start a document from a template");
    println!("  :b                Build in the background");
    println!("  :v                Open the built PDF in the background");
    println!("  :z                Compress the built PDF in the background");
    println!("  :s                Show document and build status");
    println!("  :h                Show this help");
    println!("  :q                Quit after pending work (:q! discards changes)");
}

/// Ask for template choices; `None` when cancelled
fn prompt_template(rl: &mut DefaultEditor) -> Result<Option<Template>> {
    let mut ask = |prompt: &str| -> Result<Option<String>> {
        match rl.readline(prompt) {
            Ok(answer) => Ok(Some(answer.trim().to_string())),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(err.into()),
        }
    };

    let Some(class) = ask("class [article/report/book] (article): ")? else {
        return Ok(None);
    };
    let class = if class.is_empty() {
        DocumentClass::default()
    } else {
        match class.parse::<DocumentClass>() {
            Ok(class) => class,
            Err(message) => {
                warn(&message);
                return Ok(None);
            }
        }
    };
    let Some(title) = ask("title: ")? else {
        return Ok(None);
    };
    let Some(author) = ask("author: ")? else {
        return Ok(None);
    };
    let Some(packages) = ask("packages (space separated): ")? else {
        return Ok(None);
    };
    let Some(title_page) = ask("title page? [y/N]: ")? else {
        return Ok(None);
    };

    Ok(Some(Template {
        class,
        title,
        author,
        packages: packages.split_whitespace().map(str::to_string).collect(),
        title_page: matches!(title_page.to_lowercase().as_str(), "y" | "yes"),
    }))
}

/// Run the interactive session
///
/// `open` preloads a document; a path that does not exist or lacks the
/// default extension is reported and the session starts empty.
pub fn run(
    ctx: &AppContext,
    runtime: &Runtime,
    open: Option<PathBuf>,
    no_history: bool,
) -> Result<()> {
    let document = match open {
        Some(path) => match Document::open_checked(&path, &ctx.settings.document) {
            Ok(document) => document,
            Err(err) => {
                warn(&format!("{}; starting with an empty document", err));
                Document::new()
            }
        },
        None => Document::new(),
    };

    let mut rl = DefaultEditor::new()?;
    let history_path = ctx.env.get_history_path();
    if !no_history {
        if let Some(ref path) = history_path {
            let _ = rl.load_history(path); // Ignore errors if file doesn't exist
        }
    }

    let mut session = Session::new(
        document,
        ctx.settings.clone(),
        ctx.work_dir.clone(),
        runtime.handle().clone(),
    );

    println!("texed v{}", texed_build::VERSION);
    println!("Type text to append it, :h for help, :q to quit");
    println!();

    loop {
        session.poll_builds();

        match rl.readline(&session.prompt()) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = rl.add_history_entry(&line);
                }
                match parse_command(&line) {
                    Ok(SessionCommand::New) => {
                        if let Some(template) = prompt_template(&mut rl)? {
                            session.start_new(template);
                        }
                    }
                    Ok(command) => {
                        if session.execute(command) == Flow::Quit {
                            break;
                        }
                    }
                    Err(message) => warn(&message),
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C
                println!("^C");
                println!("Use :q to quit");
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D or end of piped input
                if session.document().is_modified() {
                    warn("quitting with unsaved changes");
                }
                session.finish();
                break;
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                session.finish();
                break;
            }
        }
    }

    // Save history to file (unless disabled)
    if !no_history {
        if let Some(path) = history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.save_history(&path); // Ignore errors
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn session(dir: &TempDir, runtime: &Runtime) -> Session {
        let mut settings = Settings::default();
        settings.build.compiler = "texed-no-such-pdflatex".to_string();
        Session::new(
            Document::new(),
            settings,
            dir.path().to_path_buf(),
            runtime.handle().clone(),
        )
    }

    #[test]
    fn test_parse_plain_lines_append() {
        assert_eq!(
            parse_command("\\section{Intro}"),
            Ok(SessionCommand::Append("\\section{Intro}".to_string()))
        );
        assert_eq!(parse_command(""), Ok(SessionCommand::Append(String::new())));
        assert_eq!(
            parse_command("::colon"),
            Ok(SessionCommand::Append(":colon".to_string()))
        );
    }

    #[test]
    fn test_parse_line_commands() {
        assert_eq!(
            parse_command(":i 3   indented"),
            Ok(SessionCommand::Insert(3, "  indented".to_string()))
        );
        assert_eq!(
            parse_command(":c 1 \\documentclass{book}"),
            Ok(SessionCommand::Change(1, "\\documentclass{book}".to_string()))
        );
        assert_eq!(parse_command(":d 7"), Ok(SessionCommand::Delete(7)));
        assert!(parse_command(":d seven").is_err());
    }

    #[test]
    fn test_parse_file_commands() {
        assert_eq!(parse_command(":w"), Ok(SessionCommand::Write(None)));
        assert_eq!(
            parse_command(":w out/report"),
            Ok(SessionCommand::Write(Some(PathBuf::from("out/report"))))
        );
        assert_eq!(
            parse_command(":e! notes.tex"),
            Ok(SessionCommand::Open {
                path: PathBuf::from("notes.tex"),
                force: true
            })
        );
        assert!(parse_command(":e").is_err());
        assert_eq!(parse_command(":q!"), Ok(SessionCommand::Quit { force: true }));
        assert!(parse_command(":frobnicate").is_err());
    }

    #[test]
    fn test_editing_commands_change_buffer() {
        let dir = TempDir::new().unwrap();
        let runtime = Runtime::new().unwrap();
        let mut session = session(&dir, &runtime);

        for line in ["\\documentclass{article}", "\\begin{document}", "\\end{document}"] {
            session.execute(SessionCommand::Append(line.to_string()));
        }
        session.execute(SessionCommand::Insert(3, "Hello".to_string()));
        session.execute(SessionCommand::Change(1, "\\documentclass{report}".to_string()));
        session.execute(SessionCommand::Delete(9));

        assert_eq!(
            session.document().text(),
            "\\documentclass{report}\n\\begin{document}\nHello\n\\end{document}\n"
        );
        assert_eq!(session.prompt(), "untitled*> ");
    }

    #[test]
    fn test_write_appends_extension_and_quit_guard() {
        let dir = TempDir::new().unwrap();
        let runtime = Runtime::new().unwrap();
        let mut session = session(&dir, &runtime);
        session.execute(SessionCommand::Append("text".to_string()));

        assert_eq!(
            session.execute(SessionCommand::Quit { force: false }),
            Flow::Continue
        );

        session.execute(SessionCommand::Write(Some(dir.path().join("draft"))));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("draft.tex")).unwrap(),
            "text\n"
        );
        assert_eq!(session.prompt(), "draft.tex> ");
        assert_eq!(
            session.execute(SessionCommand::Quit { force: false }),
            Flow::Quit
        );
    }

    #[test]
    fn test_build_untitled_is_not_submitted() {
        let dir = TempDir::new().unwrap();
        let runtime = Runtime::new().unwrap();
        let mut session = session(&dir, &runtime);
        session.execute(SessionCommand::Append("text".to_string()));

        session.execute(SessionCommand::Build);

        assert_eq!(session.pending_builds(), 0);
    }

    #[test]
    fn test_background_build_is_collected() {
        let dir = TempDir::new().unwrap();
        let runtime = Runtime::new().unwrap();
        let mut session = session(&dir, &runtime);
        session.execute(SessionCommand::Append("text".to_string()));
        session.execute(SessionCommand::Write(Some(dir.path().join("doc.tex"))));

        session.execute(SessionCommand::Build);
        assert_eq!(session.pending_builds(), 1);

        session.finish();
        assert_eq!(session.pending_builds(), 0);
    }

    #[test]
    fn test_new_saves_then_replaces_document() {
        let dir = TempDir::new().unwrap();
        let runtime = Runtime::new().unwrap();
        let mut session = session(&dir, &runtime);
        session.execute(SessionCommand::Write(Some(dir.path().join("old.tex"))));
        session.execute(SessionCommand::Append("kept".to_string()));

        session.start_new(Template {
            class: DocumentClass::Report,
            ..Template::default()
        });

        assert_eq!(
            std::fs::read_to_string(dir.path().join("old.tex")).unwrap(),
            "kept\n"
        );
        assert!(session.document().is_untitled());
        assert!(session
            .document()
            .text()
            .starts_with("\\documentclass{report}"));
    }

    #[test]
    fn test_compress_does_not_block_the_prompt() {
        let dir = TempDir::new().unwrap();
        let runtime = Runtime::new().unwrap();
        let mut session = session(&dir, &runtime);
        session.execute(SessionCommand::Append("text".to_string()));
        session.execute(SessionCommand::Write(Some(dir.path().join("doc.tex"))));

        session.execute(SessionCommand::Compress);
        session.execute(SessionCommand::View);
        assert_eq!(session.pending_tasks(), 2);

        session.finish();
        assert_eq!(session.pending_tasks(), 0);
    }

    #[test]
    fn test_view_untitled_starts_nothing() {
        let dir = TempDir::new().unwrap();
        let runtime = Runtime::new().unwrap();
        let mut session = session(&dir, &runtime);

        session.execute(SessionCommand::View);
        session.execute(SessionCommand::Compress);

        assert_eq!(session.pending_tasks(), 0);
    }
}
