use std::ops::Range;

/// A Document is the ordered sequence of top-level nodes of one Markdown file.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub nodes: Vec<Node>,
    /// Source file ID for codespan-reporting diagnostics.
    pub source_id: usize,
}

impl Document {
    pub fn empty(source_id: usize) -> Self {
        Document {
            nodes: Vec::new(),
            source_id,
        }
    }

    /// Iterate over the code nodes, in document order.
    pub fn code_nodes(&self) -> impl Iterator<Item = &CodeNode> {
        self.nodes.iter().filter_map(|n| match n {
            Node::Code(code) => Some(code),
            _ => None,
        })
    }
}

/// A single top-level node. Only the `Code` variant carries data the block
/// engine acts on; the others exist so callers can render document context.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Heading {
        level: u8,
        text: String,
        span: Range<usize>,
    },
    Code(CodeNode),
    /// Any other top-level construct (paragraph, list, table, rule, ...).
    Other,
}

/// A fenced (or indented) code section.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeNode {
    /// First word of the fence info string. Empty for indented blocks and
    /// bare fences.
    pub language: String,
    /// The rest of the info string, unparsed.
    pub meta: String,
    /// Literal body text, unmodified.
    pub content: String,
    /// Byte span in source for error reporting.
    pub span: Range<usize>,
}
