use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::extract::Block;
use crate::interpreters::InterpreterMap;
use crate::options::Action;
use crate::reconciler::{self, LinkOutcome};

/// Interactive yes/no primitive for the `run` action. Answering is a real
/// suspension point: nothing else happens until the operator decides.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> io::Result<bool>;
}

/// Answer every prompt the same way; for non-interactive use and tests.
pub struct AlwaysConfirm(pub bool);

impl Confirm for AlwaysConfirm {
    fn confirm(&mut self, _prompt: &str) -> io::Result<bool> {
        Ok(self.0)
    }
}

/// Applies blocks one at a time. Owns the build-output directory convention:
/// artifacts for one run live under `<root>/build/<run_id>/`.
///
/// No failure inside a block escalates; every block reaches a logged outcome
/// and the next block runs regardless.
pub struct Executor<'a> {
    build_dir: PathBuf,
    run_id: String,
    interpreters: InterpreterMap,
    confirm: &'a mut dyn Confirm,
    out: &'a mut dyn Write,
}

impl<'a> Executor<'a> {
    pub fn new(
        build_root: impl Into<PathBuf>,
        run_id: impl Into<String>,
        interpreters: InterpreterMap,
        confirm: &'a mut dyn Confirm,
        out: &'a mut dyn Write,
    ) -> Self {
        let run_id = run_id.into();
        Executor {
            build_dir: build_root.into().join("build").join(&run_id),
            run_id,
            interpreters,
            confirm,
            out,
        }
    }

    /// Act on one block. `index` is the block's position among the blocks
    /// being executed this run; it only disambiguates artifact names for
    /// blocks sharing a basename, it does not control ordering.
    pub fn execute(&mut self, block: &Block, index: usize) {
        match block.options.get("action") {
            None => {
                let _ = writeln!(self.out, "skip {}: no action", block.label);
            }
            Some(_) => match block.action() {
                Some(Action::Build) => self.build(block),
                Some(Action::Symlink) => self.symlink(block, index),
                Some(Action::Run) => self.run(block),
                None => {
                    let _ = writeln!(
                        self.out,
                        "skip {}: don't know how to handle action '{}'",
                        block.label,
                        block.options.get("action").unwrap_or_default()
                    );
                }
            },
        }
    }

    fn build(&mut self, block: &Block) {
        let Some(target) = resolve_target(block) else {
            let _ = writeln!(self.out, "skip {}: no target path", block.label);
            return;
        };
        if let Some(parent) = target.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                let _ = writeln!(
                    self.out,
                    "✗ {}: cannot create {}: {}",
                    block.label,
                    parent.display(),
                    e
                );
                return;
            }
        }
        match fs::write(&target, &block.content) {
            Ok(()) => {
                let _ = writeln!(self.out, "✓ built {}", target.display());
            }
            Err(e) => {
                let _ = writeln!(self.out, "✗ {}: cannot write {}: {}", block.label, target.display(), e);
            }
        }
    }

    fn symlink(&mut self, block: &Block, index: usize) {
        let Some(target) = resolve_target(block) else {
            let _ = writeln!(self.out, "skip {}: no target path", block.label);
            return;
        };
        let basename = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "target".to_string());
        let build_file = self
            .build_dir
            .join("links")
            .join(format!("{}-{}", index, basename));

        match reconciler::reconcile(&target, &build_file, &block.content, &self.run_id, self.out) {
            LinkOutcome::Linked => {
                let _ = writeln!(self.out, "✓ linked {}", target.display());
            }
            LinkOutcome::LinkedAfterBackup { backup } => {
                let _ = writeln!(
                    self.out,
                    "✓ linked {} (previous content at {})",
                    target.display(),
                    backup.display()
                );
            }
            LinkOutcome::Failed(reason) => {
                let _ = writeln!(self.out, "✗ {}: {}", block.label, reason);
            }
        }
    }

    fn run(&mut self, block: &Block) {
        let Some(interpreter) = self.interpreters.get(&block.language).map(str::to_string) else {
            let _ = writeln!(
                self.out,
                "skip {}: don't know how to run language '{}'",
                block.label, block.language
            );
            return;
        };

        // Show the operator exactly what would execute before asking.
        let _ = writeln!(self.out, "--- {} ---", block.label);
        let _ = writeln!(self.out, "{}", block.content);

        match self.confirm.confirm(&format!("run with {}?", interpreter)) {
            Ok(true) => {}
            Ok(false) => {
                let _ = writeln!(self.out, "skip {}: declined", block.label);
                return;
            }
            Err(e) => {
                let _ = writeln!(self.out, "skip {}: cannot confirm: {}", block.label, e);
                return;
            }
        }

        if let Err(e) = self.run_script(&interpreter, &block.content) {
            let _ = writeln!(self.out, "✗ {}: {}", block.label, e);
        }
    }

    fn run_script(&mut self, interpreter: &str, content: &str) -> io::Result<()> {
        let mut script = tempfile::Builder::new()
            .prefix("mdot-run-")
            .tempfile()?;
        script.write_all(content.as_bytes())?;
        script.flush()?;
        make_executable(script.path())?;

        // Inherited stdio; a failing exit code is reported, not fatal.
        let status = Command::new(interpreter).arg(script.path()).status()?;
        if status.success() {
            let _ = writeln!(self.out, "✓ ran ({})", interpreter);
        } else {
            let _ = writeln!(self.out, "✗ {} exited with {}", interpreter, status);
        }
        Ok(())
    }
}

/// A block's target resolves relative to the directory of the document that
/// declared it; absolute paths (including expanded `~`) stand as given.
fn resolve_target(block: &Block) -> Option<PathBuf> {
    let target = block.options.target_path()?;
    let dir = block.source_path.parent().unwrap_or_else(|| Path::new("."));
    Some(dir.join(target))
}

#[cfg(unix)]
fn make_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}
