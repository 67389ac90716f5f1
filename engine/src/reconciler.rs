use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Terminal state of one reconcile pass.
#[derive(Debug, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The target now links to the build artifact; no backup was needed.
    Linked,
    /// The target now links to the build artifact; divergent pre-existing
    /// content was preserved at `backup`.
    LinkedAfterBackup { backup: PathBuf },
    /// The target could not be linked; the reason names the failing path.
    /// Reporting it is the caller's job, so a failure is logged exactly once.
    Failed(String),
}

/// Make `target_file` a symbolic link to `build_file` containing `content`,
/// preserving any divergent pre-existing content at the target as a
/// `.bak-<run_id>` copy.
///
/// Every filesystem operation is individually caught; this function always
/// reaches a terminal state and never returns an error to the caller.
/// Intermediate mishaps are logged to `out`; the terminal failure reason
/// travels in the returned `LinkOutcome`. Re-running with unchanged content
/// creates no backups.
pub fn reconcile(
    target_file: &Path,
    build_file: &Path,
    content: &str,
    run_id: &str,
    out: &mut dyn Write,
) -> LinkOutcome {
    // Materialize the artifact.
    for dir in [build_file.parent(), target_file.parent()].into_iter().flatten() {
        if let Err(e) = fs::create_dir_all(dir) {
            return LinkOutcome::Failed(format!(
                "cannot create directory {}: {}",
                dir.display(),
                e
            ));
        }
    }

    if let Err(e) = fs::write(build_file, content) {
        // Build-artifact conflict: move the obstruction aside and retry.
        let aside = append_suffix(build_file, &format!(".bak-{}", run_id));
        let _ = writeln!(
            out,
            "build artifact {} not writable ({}), moving aside to {}",
            build_file.display(),
            e,
            aside.display()
        );
        if let Err(e) = fs::rename(build_file, &aside) {
            let _ = writeln!(out, "could not move {} aside: {}", build_file.display(), e);
        }
        if let Err(e) = fs::write(build_file, content) {
            return LinkOutcome::Failed(format!(
                "cannot write build artifact {}: {}",
                build_file.display(),
                e
            ));
        }
    }

    // Fast path: nothing at the target.
    if make_symlink(build_file, target_file).is_ok() {
        return LinkOutcome::Linked;
    }

    // Conflict resolution: something already lives at the target. Read what
    // it points at (or the file itself), preserve divergent content, then
    // replace it with the link.
    let old_path = match fs::read_link(target_file) {
        Ok(dest) => dest,
        Err(_) => target_file.to_path_buf(),
    };

    let old_content = match fs::read_to_string(&old_path) {
        Ok(s) => Some(s),
        Err(e) => {
            let _ = writeln!(
                out,
                "cannot read previous content of {}: {}",
                old_path.display(),
                e
            );
            None
        }
    };

    let mut backup = None;
    if let Some(old) = old_content {
        if old != content {
            let backup_path = append_suffix(target_file, &format!(".bak-{}", run_id));
            match fs::write(&backup_path, &old) {
                Ok(()) => {
                    let _ = writeln!(
                        out,
                        "preserved previous content of {} at {}",
                        target_file.display(),
                        backup_path.display()
                    );
                    backup = Some(backup_path);
                }
                Err(e) => {
                    let _ = writeln!(
                        out,
                        "could not back up {} (previously {}): {}",
                        target_file.display(),
                        old_path.display(),
                        e
                    );
                }
            }
        }
    }

    if let Err(e) = fs::remove_file(target_file) {
        let _ = writeln!(out, "could not remove {}: {}", target_file.display(), e);
    }

    match make_symlink(build_file, target_file) {
        Ok(()) => match backup {
            Some(backup) => LinkOutcome::LinkedAfterBackup { backup },
            None => LinkOutcome::Linked,
        },
        Err(e) => LinkOutcome::Failed(format!(
            "cannot link {} -> {}: {}",
            target_file.display(),
            build_file.display(),
            e
        )),
    }
}

/// `path` with `suffix` appended to its final component.
fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os: OsString = path.as_os_str().to_os_string();
    os.push(suffix);
    PathBuf::from(os)
}

#[cfg(unix)]
fn make_symlink(original: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(original, link)
}

#[cfg(windows)]
fn make_symlink(original: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(original, link)
}
