use std::ops::Range;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser as CmarkParser, Tag, TagEnd};

use crate::document::{CodeNode, Document, Node};

/// Parse Markdown source text into an ordered list of top-level nodes.
///
/// Never fails: Markdown has no syntax errors, only structure we don't care
/// about, which lands in `Node::Other`.
pub fn parse_document(source: &str, source_id: usize) -> Document {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES;
    let parser = CmarkParser::new_ext(source, options);
    let events: Vec<(Event<'_>, Range<usize>)> = parser.into_offset_iter().collect();

    let mut nodes = Vec::new();
    let mut i = 0;

    while i < events.len() {
        let (ref ev, ref range) = events[i];

        match ev {
            Event::Start(Tag::Heading { level, .. }) => {
                let level = heading_level_to_u8(level);
                let start = range.start;
                i += 1;
                let text = collect_text_until(&events, &mut i, |e| {
                    matches!(e, TagEnd::Heading(_))
                });
                let end = events
                    .get(i.saturating_sub(1))
                    .map(|(_, r)| r.end)
                    .unwrap_or(start);
                nodes.push(Node::Heading {
                    level,
                    text: normalize_whitespace(&text),
                    span: start..end,
                });
            }

            Event::Start(Tag::CodeBlock(kind)) => {
                let (language, meta) = match kind {
                    CodeBlockKind::Fenced(info) => split_info_string(info),
                    CodeBlockKind::Indented => (String::new(), String::new()),
                };
                let span = range.clone();
                i += 1;
                let content = collect_text_until(&events, &mut i, |e| {
                    matches!(e, TagEnd::CodeBlock)
                });
                nodes.push(Node::Code(CodeNode {
                    language,
                    meta,
                    content,
                    span,
                }));
            }

            // Any other top-level container: skip to its matching end so
            // nested code blocks are not promoted to top level.
            Event::Start(tag) => {
                let end = TagEnd::from(tag.clone());
                i += 1;
                skip_until(&events, &mut i, end);
                nodes.push(Node::Other);
            }

            Event::Rule => {
                nodes.push(Node::Other);
                i += 1;
            }

            _ => {
                i += 1;
            }
        }
    }

    Document { nodes, source_id }
}

/// The fence info string is "language" optionally followed by whitespace and
/// free-form meta text. Split on the first whitespace run.
fn split_info_string(info: &str) -> (String, String) {
    let info = info.trim();
    match info.split_once(char::is_whitespace) {
        Some((lang, rest)) => (lang.to_string(), rest.trim_start().to_string()),
        None => (info.to_string(), String::new()),
    }
}

fn heading_level_to_u8(level: &HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Concatenate text events until the given end tag, advancing the cursor
/// past it.
fn collect_text_until(
    events: &[(Event<'_>, Range<usize>)],
    i: &mut usize,
    is_end: impl Fn(&TagEnd) -> bool,
) -> String {
    let mut out = String::new();
    while *i < events.len() {
        match &events[*i].0 {
            Event::End(e) if is_end(e) => {
                *i += 1;
                break;
            }
            Event::Text(s) => out.push_str(s),
            Event::Code(s) => out.push_str(s),
            Event::SoftBreak | Event::HardBreak => out.push(' '),
            _ => {}
        }
        *i += 1;
    }
    out
}

/// Skip events until the matching end tag, tracking nesting of identical
/// container tags.
fn skip_until(events: &[(Event<'_>, Range<usize>)], i: &mut usize, end: TagEnd) {
    let mut depth = 1usize;
    while *i < events.len() {
        match &events[*i].0 {
            Event::Start(tag) if TagEnd::from(tag.clone()) == end => depth += 1,
            Event::End(e) if *e == end => {
                depth -= 1;
                if depth == 0 {
                    *i += 1;
                    return;
                }
            }
            _ => {}
        }
        *i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code_nodes(source: &str) -> Vec<CodeNode> {
        parse_document(source, 0).code_nodes().cloned().collect()
    }

    #[test]
    fn fenced_block_splits_language_and_meta() {
        let codes = code_nodes("```sh action=run title=\"setup\"\necho hi\n```\n");
        assert_eq!(codes.len(), 1);
        assert_eq!(codes[0].language, "sh");
        assert_eq!(codes[0].meta, "action=run title=\"setup\"");
        assert_eq!(codes[0].content, "echo hi\n");
    }

    #[test]
    fn bare_fence_has_empty_language_and_meta() {
        let codes = code_nodes("```\nplain\n```\n");
        assert_eq!(codes.len(), 1);
        assert_eq!(codes[0].language, "");
        assert_eq!(codes[0].meta, "");
    }

    #[test]
    fn nodes_preserve_document_order() {
        let doc = parse_document(
            "# Title\n\n```sh a\none\n```\n\ntext\n\n```sh b\ntwo\n```\n",
            0,
        );
        let codes: Vec<_> = doc.code_nodes().collect();
        assert_eq!(codes.len(), 2);
        assert_eq!(codes[0].meta, "a");
        assert_eq!(codes[1].meta, "b");
        assert!(matches!(doc.nodes[0], Node::Heading { level: 1, .. }));
    }

    #[test]
    fn code_inside_list_is_not_top_level() {
        let codes = code_nodes("- item\n\n  ```sh nested\n  x\n  ```\n");
        assert!(codes.is_empty());
    }

    #[test]
    fn content_is_literal() {
        let codes = code_nodes("```toml\n[a]\nb = \"*bold* not parsed\"\n```\n");
        assert_eq!(codes[0].content, "[a]\nb = \"*bold* not parsed\"\n");
    }

    #[test]
    fn spans_point_into_source() {
        let source = "para\n\n```sh x\nbody\n```\n";
        let codes = code_nodes(source);
        assert_eq!(codes.len(), 1);
        assert_eq!(&source[codes[0].span.start..codes[0].span.start + 3], "```");
    }
}
