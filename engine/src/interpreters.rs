use std::collections::BTreeMap;

/// Language tag → interpreter program for the `run` action.
///
/// Ships with a fixed default set; users can extend or override entries via
/// configuration. A language absent from the map makes its block a skip, not
/// an error.
#[derive(Debug, Clone)]
pub struct InterpreterMap {
    entries: BTreeMap<String, String>,
}

impl Default for InterpreterMap {
    fn default() -> Self {
        let mut entries = BTreeMap::new();
        for shell in ["sh", "bash", "zsh", "fish"] {
            entries.insert(shell.to_string(), shell.to_string());
        }
        entries.insert("js".to_string(), "node".to_string());
        entries.insert("javascript".to_string(), "node".to_string());
        entries.insert("python".to_string(), "python3".to_string());
        entries.insert("py".to_string(), "python3".to_string());
        InterpreterMap { entries }
    }
}

impl InterpreterMap {
    pub fn get(&self, language: &str) -> Option<&str> {
        self.entries.get(language).map(String::as_str)
    }

    /// Merge user-supplied mappings over the defaults.
    pub fn extend(&mut self, entries: impl IntoIterator<Item = (String, String)>) {
        self.entries.extend(entries);
    }
}
