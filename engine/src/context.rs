use std::path::PathBuf;

/// The platform identities blocks can be conditioned on with `when=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Darwin,
    Win32,
    Linux,
    Other,
}

/// Ambient process state the option parser and enablement evaluator need,
/// passed in explicitly so both stay pure and testable.
#[derive(Debug, Clone)]
pub struct EnvContext {
    /// The user's home directory, for `~` / `$HOME` expansion.
    pub home: PathBuf,
    pub platform: Platform,
}

impl EnvContext {
    /// Snapshot the real process environment.
    pub fn detect() -> Self {
        let home = std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/"));
        let platform = if cfg!(target_os = "macos") {
            Platform::Darwin
        } else if cfg!(target_os = "windows") {
            Platform::Win32
        } else if cfg!(target_os = "linux") {
            Platform::Linux
        } else {
            Platform::Other
        };
        EnvContext { home, platform }
    }
}
