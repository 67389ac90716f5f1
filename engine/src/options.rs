use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::context::EnvContext;

/// The behavior requested for a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Write the block content to a file.
    Build,
    /// Write the content to a build artifact and link the target path to it.
    Symlink,
    /// Execute the content as a script after confirmation.
    Run,
}

impl Action {
    pub fn from_option(value: &str) -> Option<Action> {
        match value {
            "build" => Some(Action::Build),
            "symlink" => Some(Action::Symlink),
            "run" => Some(Action::Run),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Build => write!(f, "build"),
            Action::Symlink => write!(f, "symlink"),
            Action::Run => write!(f, "run"),
        }
    }
}

/// Parsed block options: every `key=value` pair from the meta string, plus
/// the positional target-path token. Unrecognized keys pass through untouched;
/// semantics attach only to the typed accessors below.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionMap {
    entries: BTreeMap<String, String>,
}

impl OptionMap {
    /// Parse a raw meta string.
    ///
    /// Tokens split on shell-like boundaries, so quoted values keep their
    /// spaces. A token with `=` becomes a key/value pair, split on the first
    /// `=`. A token without `=` is the positional target path, with a leading
    /// `~` or `$HOME` expanded against `ctx.home`. Multiple positional tokens
    /// are not reconciled: last one wins.
    pub fn parse(raw_meta: &str, ctx: &EnvContext) -> OptionMap {
        let mut entries = BTreeMap::new();
        for token in tokenize(raw_meta) {
            match token.split_once('=') {
                Some((key, value)) => {
                    entries.insert(key.to_string(), value.to_string());
                }
                None => {
                    entries.insert(
                        "targetPath".to_string(),
                        expand_home(&token, &ctx.home),
                    );
                }
            }
        }
        OptionMap { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The requested action, if present and recognized.
    pub fn action(&self) -> Option<Action> {
        self.get("action").and_then(Action::from_option)
    }

    /// True when an `action` key is present at all, recognized or not.
    pub fn has_action_key(&self) -> bool {
        self.entries.contains_key("action")
    }

    pub fn target_path(&self) -> Option<&Path> {
        self.get("targetPath").map(Path::new)
    }

    pub fn title(&self) -> Option<&str> {
        self.get("title")
    }

    pub fn when(&self) -> Option<&str> {
        self.get("when")
    }

    /// Truthiness of `disabled`: any non-empty value counts, matching the
    /// permissive handling this option has always had.
    pub fn disabled(&self) -> bool {
        self.get("disabled").is_some_and(|v| !v.is_empty())
    }
}

/// Expand a leading `~` or `$HOME` to the home directory. The prefix must be
/// followed by end-of-string or a path separator, so `~user/x` and
/// `$HOMEWORK` pass through untouched.
fn expand_home(token: &str, home: &Path) -> String {
    for prefix in ["~", "$HOME"] {
        if let Some(rest) = token.strip_prefix(prefix) {
            if rest.is_empty() {
                return home.display().to_string();
            }
            if rest.starts_with('/') || rest.starts_with('\\') {
                return format!("{}{}", home.display(), rest);
            }
        }
    }
    token.to_string()
}

/// Split a meta string on whitespace, honoring single and double quotes so a
/// quoted value survives as one token. Quote characters are stripped; an
/// unterminated quote runs to end-of-string.
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for c in input.chars() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                } else {
                    current.push(c);
                }
            }
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    in_token = true;
                }
                c if c.is_whitespace() => {
                    if in_token {
                        tokens.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                }
                c => {
                    current.push(c);
                    in_token = true;
                }
            },
        }
    }
    if in_token {
        tokens.push(current);
    }
    tokens
}
