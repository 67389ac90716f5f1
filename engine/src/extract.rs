use std::ops::Range;
use std::path::PathBuf;

use mddoc::Document;

use crate::context::EnvContext;
use crate::enablement;
use crate::options::{Action, OptionMap};

/// One actionable unit extracted from one code node in one source document.
///
/// Blocks are created fresh on every extraction pass and read-only after.
/// `disabled_reason` is computed once, at extraction time, from the options
/// and context only.
#[derive(Debug, Clone)]
pub struct Block {
    pub language: String,
    /// Literal code body, unmodified.
    pub content: String,
    /// The unparsed info string after the language tag.
    pub raw_meta: String,
    /// Path of the document this block came from.
    pub source_path: PathBuf,
    pub options: OptionMap,
    /// `None` when enabled, otherwise the reason the block is excluded.
    pub disabled_reason: Option<String>,
    /// Display string for listings and prompts.
    pub label: String,
    /// Byte span of the code fence in the source document.
    pub span: Range<usize>,
    /// Source file ID for codespan-reporting diagnostics.
    pub source_id: usize,
}

impl Block {
    pub fn action(&self) -> Option<Action> {
        self.options.action()
    }

    pub fn enabled(&self) -> bool {
        self.disabled_reason.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    /// Keep blocks whose enablement check failed.
    pub include_disabled: bool,
}

/// Walk the parsed documents, in the order given, and produce the ordered
/// block list.
///
/// Only code nodes are considered; order is preserved within and across
/// documents. Blocks without an `action` option are dropped; disabled blocks
/// are dropped unless `include_disabled` is set. Never touches the
/// filesystem, never fails: malformed meta just fails to populate recognized
/// keys and surfaces as an execution-time skip.
pub fn extract(
    documents: &[(PathBuf, Document)],
    extract_options: ExtractOptions,
    ctx: &EnvContext,
) -> Vec<Block> {
    let mut blocks = Vec::new();

    for (path, document) in documents {
        for code in document.code_nodes() {
            let options = OptionMap::parse(&code.meta, ctx);
            let disabled_reason = enablement::evaluate(&options, ctx);
            let label = derive_label(&code.language, &code.meta, &options);
            blocks.push(Block {
                language: code.language.clone(),
                content: code.content.clone(),
                raw_meta: code.meta.clone(),
                source_path: path.clone(),
                options,
                disabled_reason,
                label,
                span: code.span.clone(),
                source_id: document.source_id,
            });
        }
    }

    blocks.retain(|b| {
        b.options.has_action_key() && (extract_options.include_disabled || b.enabled())
    });
    blocks
}

/// `title` if given, else the raw meta string; then the action and language,
/// and the target path for actions that have one.
fn derive_label(language: &str, raw_meta: &str, options: &OptionMap) -> String {
    let name = match options.title() {
        Some(title) => title,
        None if raw_meta.trim().is_empty() => "(untitled)",
        None => raw_meta.trim(),
    };
    let action = options.get("action").unwrap_or("none");
    let mut label = format!("{} [{} {}]", name, action, language);
    if matches!(options.action(), Some(Action::Build | Action::Symlink)) {
        if let Some(target) = options.target_path() {
            label.push_str(&format!(" -> {}", target.display()));
        }
    }
    label
}
