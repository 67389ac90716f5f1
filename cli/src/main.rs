mod config;

use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use engine::{
    AlwaysConfirm, Block, Confirm, EnvContext, Executor, ExtractOptions, InterpreterMap, extract,
};
use mddoc::Document;

use crate::config::Config;

#[derive(Parser)]
#[command(
    name = "mdot",
    version,
    about = "Reconcile files and scripts declared as code blocks in Markdown documents"
)]
struct Cli {
    /// Disable colored diagnostic output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the actionable blocks in the given documents
    List(ListArgs),

    /// Execute every enabled block, in document order
    Apply(ApplyArgs),

    /// Lint blocks without touching the filesystem
    Check(CheckArgs),
}

#[derive(clap::Args)]
struct ListArgs {
    /// Markdown documents to scan
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Also show disabled blocks with their reason
    #[arg(long)]
    include_disabled: bool,
}

#[derive(clap::Args)]
struct ApplyArgs {
    /// Markdown documents to apply
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Execute blocks even if their enablement check failed
    #[arg(long)]
    include_disabled: bool,

    /// Answer yes to every run confirmation (non-interactive)
    #[arg(short, long)]
    yes: bool,

    /// TOML config extending the run-action interpreter map
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(clap::Args)]
struct CheckArgs {
    /// Markdown documents to lint
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// TOML config extending the run-action interpreter map
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::List(args) => do_list(args),
        Command::Apply(args) => do_apply(args),
        Command::Check(args) => do_check(args, cli.no_color),
    }
}

/// Read and parse every input document. Unreadable documents are the one
/// catastrophic failure class: exit nonzero before any block is acted on.
fn load_documents(paths: &[PathBuf]) -> (SimpleFiles<String, String>, Vec<(PathBuf, Document)>) {
    let mut files = SimpleFiles::new();
    let mut documents = Vec::new();
    for path in paths {
        let source = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: cannot read '{}': {}", path.display(), e);
                process::exit(1);
            }
        };
        let file_id = files.add(path.display().to_string(), source.clone());
        documents.push((path.clone(), mddoc::parse_document(&source, file_id)));
    }
    (files, documents)
}

fn interpreters_from(config_path: Option<&PathBuf>) -> InterpreterMap {
    let mut interpreters = InterpreterMap::default();
    if let Some(path) = config_path {
        match Config::load(path) {
            Ok(config) => interpreters.extend(config.interpreters),
            Err(e) => {
                eprintln!("error: {}", e);
                process::exit(1);
            }
        }
    }
    interpreters
}

fn do_list(args: ListArgs) {
    let (_files, documents) = load_documents(&args.files);
    let ctx = EnvContext::detect();
    let blocks = extract(
        &documents,
        ExtractOptions {
            include_disabled: args.include_disabled,
        },
        &ctx,
    );

    if blocks.is_empty() {
        println!("no actionable blocks");
        return;
    }
    for (i, block) in blocks.iter().enumerate() {
        match &block.disabled_reason {
            None => println!("{:3}  {}", i, block.label),
            Some(reason) => println!("{:3}  {} (disabled: {})", i, block.label, reason),
        }
    }
}

fn do_apply(args: ApplyArgs) {
    let (_files, documents) = load_documents(&args.files);
    let ctx = EnvContext::detect();
    let blocks = extract(
        &documents,
        ExtractOptions {
            include_disabled: args.include_disabled,
        },
        &ctx,
    );

    if blocks.is_empty() {
        println!("no actionable blocks");
        return;
    }

    let interpreters = interpreters_from(args.config.as_ref());
    let build_root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let run_id = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();

    let mut stdout = io::stdout();
    let mut yes = AlwaysConfirm(true);
    let mut ask = StdinConfirm;
    let confirm: &mut dyn Confirm = if args.yes { &mut yes } else { &mut ask };

    let mut executor = Executor::new(build_root, run_id, interpreters, confirm, &mut stdout);
    for (index, block) in blocks.iter().enumerate() {
        executor.execute(block, index);
    }
}

fn do_check(args: CheckArgs, no_color: bool) {
    let (files, documents) = load_documents(&args.files);
    let ctx = EnvContext::detect();
    let blocks = extract(
        &documents,
        ExtractOptions {
            include_disabled: true,
        },
        &ctx,
    );

    let interpreters = interpreters_from(args.config.as_ref());

    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let writer = StandardStream::stderr(color_choice);
    let term_config = term::Config::default();

    let mut warnings = 0usize;
    for block in &blocks {
        for diagnostic in lint_block(block, &interpreters) {
            if diagnostic.severity == Severity::Warning {
                warnings += 1;
            }
            let _ = term::emit_to_write_style(&mut writer.lock(), &term_config, &files, &diagnostic);
        }
    }
    eprintln!("{} block(s), {} warning(s)", blocks.len(), warnings);
}

/// Diagnostics for conditions that will surface as execution-time skips.
fn lint_block(block: &Block, interpreters: &InterpreterMap) -> Vec<Diagnostic<usize>> {
    use engine::Action;

    let mut diagnostics = Vec::new();
    let label = Label::primary(block.source_id, block.span.clone());

    match block.action() {
        Some(Action::Build | Action::Symlink) => {
            if block.options.target_path().is_none() {
                diagnostics.push(
                    Diagnostic::warning()
                        .with_message(format!(
                            "{}: no target path, block will be skipped",
                            block.label
                        ))
                        .with_labels(vec![label.clone()]),
                );
            }
        }
        Some(Action::Run) => {
            if interpreters.get(&block.language).is_none() {
                diagnostics.push(
                    Diagnostic::warning()
                        .with_message(format!(
                            "{}: no interpreter for language '{}'",
                            block.label, block.language
                        ))
                        .with_labels(vec![label.clone()]),
                );
            }
        }
        None => {
            diagnostics.push(
                Diagnostic::warning()
                    .with_message(format!(
                        "unknown action '{}'",
                        block.options.get("action").unwrap_or_default()
                    ))
                    .with_labels(vec![label.clone()]),
            );
        }
    }

    if let Some(reason) = &block.disabled_reason {
        diagnostics.push(
            Diagnostic::note()
                .with_message(format!("{}: disabled ({})", block.label, reason))
                .with_labels(vec![label]),
        );
    }
    diagnostics
}

/// Ask on stderr, read the answer from stdin. Anything but y/yes declines.
struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        eprint!("{} [y/N] ", prompt);
        io::stderr().flush()?;
        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;
        let answer = answer.trim().to_ascii_lowercase();
        Ok(answer == "y" || answer == "yes")
    }
}
