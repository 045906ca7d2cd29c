//! Markdown rendering for recipe results
//!
//! The model answers in Markdown. [`render_markdown`] turns that text into a
//! small block/inline tree that a presentation layer can lay out, and
//! [`RenderedResult`] implements `Display` for plain terminal output.
//! Rendering never fails: anything the tree does not model is kept as
//! literal text.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};
use std::fmt;

/// Block-level display element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Heading (level 1-6, content)
    Heading { level: u8, content: Vec<Inline> },
    Paragraph(Vec<Inline>),
    /// List; `start` is set for ordered lists
    List {
        start: Option<u64>,
        items: Vec<Vec<Block>>,
    },
    Quote(Vec<Block>),
    Code {
        language: Option<String>,
        text: String,
    },
    Rule,
}

/// Inline display element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Emphasis(Vec<Inline>),
    Strong(Vec<Inline>),
    Strikethrough(Vec<Inline>),
    Code(String),
    Link { url: String, content: Vec<Inline> },
    Image { url: String, alt: String },
    LineBreak,
}

impl Inline {
    fn push_plain(&self, out: &mut String) {
        match self {
            Inline::Text(text) | Inline::Code(text) => out.push_str(text),
            Inline::Emphasis(children)
            | Inline::Strong(children)
            | Inline::Strikethrough(children)
            | Inline::Link {
                content: children, ..
            } => push_plain_all(children, out),
            Inline::Image { alt, .. } => out.push_str(alt),
            Inline::LineBreak => out.push('\n'),
        }
    }
}

fn push_plain_all(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        inline.push_plain(out);
    }
}

/// Text of a run of inlines with all formatting removed.
pub fn plain_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    push_plain_all(inlines, &mut out);
    out
}

/// Display tree derived from a result's text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedResult {
    pub blocks: Vec<Block>,
}

impl RenderedResult {
    /// Plain text of every heading, in document order.
    pub fn headings(&self) -> Vec<String> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                Block::Heading { content, .. } => Some(plain_text(content)),
                _ => None,
            })
            .collect()
    }
}

pub fn render_markdown(text: &str) -> RenderedResult {
    let parser = Parser::new_ext(text, Options::ENABLE_STRIKETHROUGH);
    let mut builder = TreeBuilder { events: parser };
    RenderedResult {
        blocks: builder.blocks(),
    }
}

struct TreeBuilder<I> {
    events: I,
}

impl<'a, I: Iterator<Item = Event<'a>>> TreeBuilder<I> {
    /// Collect blocks until the enclosing container ends (its `End` event is
    /// consumed) or input runs out.
    fn blocks(&mut self) -> Vec<Block> {
        let mut blocks = Vec::new();
        // Tight list items carry inline events without a paragraph.
        let mut loose: Vec<Inline> = Vec::new();

        while let Some(event) = self.events.next() {
            match event {
                Event::End(_) => break,
                Event::Start(tag) => match tag {
                    Tag::Paragraph => {
                        flush(&mut loose, &mut blocks);
                        let content = self.inlines();
                        blocks.push(Block::Paragraph(content));
                    }
                    Tag::Heading { level, .. } => {
                        flush(&mut loose, &mut blocks);
                        let content = self.inlines();
                        blocks.push(Block::Heading {
                            level: heading_depth(level),
                            content,
                        });
                    }
                    Tag::BlockQuote(_) => {
                        flush(&mut loose, &mut blocks);
                        let inner = self.blocks();
                        blocks.push(Block::Quote(inner));
                    }
                    Tag::CodeBlock(kind) => {
                        flush(&mut loose, &mut blocks);
                        let language = match kind {
                            CodeBlockKind::Fenced(lang) if !lang.trim().is_empty() => {
                                Some(lang.trim().to_string())
                            }
                            _ => None,
                        };
                        let text = self.literal();
                        blocks.push(Block::Code { language, text });
                    }
                    Tag::List(start) => {
                        flush(&mut loose, &mut blocks);
                        let items = self.items();
                        blocks.push(Block::List { start, items });
                    }
                    Tag::Item => {
                        flush(&mut loose, &mut blocks);
                        let inner = self.blocks();
                        blocks.extend(inner);
                    }
                    tag @ (Tag::Emphasis
                    | Tag::Strong
                    | Tag::Strikethrough
                    | Tag::Link { .. }
                    | Tag::Image { .. }) => {
                        let inline = self.inline_container(tag);
                        push_inline(&mut loose, inline);
                    }
                    _ => {
                        flush(&mut loose, &mut blocks);
                        let text = self.literal();
                        if !text.trim().is_empty() {
                            blocks.push(Block::Paragraph(vec![Inline::Text(text)]));
                        }
                    }
                },
                Event::Rule => {
                    flush(&mut loose, &mut blocks);
                    blocks.push(Block::Rule);
                }
                other => {
                    if let Some(inline) = leaf_inline(other) {
                        push_inline(&mut loose, inline);
                    }
                }
            }
        }

        flush(&mut loose, &mut blocks);
        blocks
    }

    fn items(&mut self) -> Vec<Vec<Block>> {
        let mut items = Vec::new();
        while let Some(event) = self.events.next() {
            match event {
                Event::Start(Tag::Item) => items.push(self.blocks()),
                Event::End(_) => break,
                _ => {}
            }
        }
        items
    }

    fn inlines(&mut self) -> Vec<Inline> {
        let mut inlines = Vec::new();
        while let Some(event) = self.events.next() {
            match event {
                Event::End(_) => break,
                Event::Start(tag) => {
                    let inline = self.inline_container(tag);
                    push_inline(&mut inlines, inline);
                }
                other => {
                    if let Some(inline) = leaf_inline(other) {
                        push_inline(&mut inlines, inline);
                    }
                }
            }
        }
        inlines
    }

    fn inline_container(&mut self, tag: Tag<'a>) -> Inline {
        match tag {
            Tag::Emphasis => Inline::Emphasis(self.inlines()),
            Tag::Strong => Inline::Strong(self.inlines()),
            Tag::Strikethrough => Inline::Strikethrough(self.inlines()),
            Tag::Link { dest_url, .. } => Inline::Link {
                url: dest_url.into_string(),
                content: self.inlines(),
            },
            Tag::Image { dest_url, .. } => Inline::Image {
                url: dest_url.into_string(),
                alt: self.literal(),
            },
            _ => Inline::Text(self.literal()),
        }
    }

    /// Flatten everything up to the matching `End` into literal text.
    fn literal(&mut self) -> String {
        let mut text = String::new();
        let mut depth = 0usize;
        while let Some(event) = self.events.next() {
            match event {
                Event::Start(_) => depth += 1,
                Event::End(_) => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                Event::Text(t) | Event::Code(t) | Event::Html(t) | Event::InlineHtml(t) => {
                    text.push_str(&t)
                }
                Event::SoftBreak | Event::HardBreak => text.push('\n'),
                _ => {}
            }
        }
        text
    }
}

/// Append an inline, merging adjacent text runs.
fn push_inline(inlines: &mut Vec<Inline>, inline: Inline) {
    if let (Some(Inline::Text(prev)), Inline::Text(next)) = (inlines.last_mut(), &inline) {
        prev.push_str(next);
        return;
    }
    inlines.push(inline);
}

fn flush(loose: &mut Vec<Inline>, blocks: &mut Vec<Block>) {
    if !loose.is_empty() {
        blocks.push(Block::Paragraph(std::mem::take(loose)));
    }
}

fn leaf_inline(event: Event<'_>) -> Option<Inline> {
    match event {
        Event::Text(text) => Some(Inline::Text(text.into_string())),
        Event::Code(code) => Some(Inline::Code(code.into_string())),
        Event::Html(html) | Event::InlineHtml(html) => Some(Inline::Text(html.into_string())),
        Event::SoftBreak => Some(Inline::Text(" ".to_string())),
        Event::HardBreak => Some(Inline::LineBreak),
        Event::FootnoteReference(label) => Some(Inline::Text(format!("[^{}]", label))),
        Event::TaskListMarker(done) => Some(Inline::Text(
            if done { "[x] " } else { "[ ] " }.to_string(),
        )),
        _ => None,
    }
}

fn heading_depth(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

// Terminal output

fn styled_inlines(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        match inline {
            Inline::Text(text) => out.push_str(text),
            Inline::Emphasis(children) => {
                out.push('_');
                out.push_str(&styled_inlines(children));
                out.push('_');
            }
            Inline::Strong(children) => {
                out.push_str("**");
                out.push_str(&styled_inlines(children));
                out.push_str("**");
            }
            Inline::Strikethrough(children) => {
                out.push_str("~~");
                out.push_str(&styled_inlines(children));
                out.push_str("~~");
            }
            Inline::Code(code) => {
                out.push('`');
                out.push_str(code);
                out.push('`');
            }
            Inline::Link { url, content } => {
                let label = styled_inlines(content);
                if label.is_empty() || label == *url {
                    out.push_str(url);
                } else {
                    out.push_str(&format!("{} ({})", label, url));
                }
            }
            Inline::Image { url, alt } => out.push_str(&format!("[image: {}] ({})", alt, url)),
            Inline::LineBreak => out.push('\n'),
        }
    }
    out
}

fn write_indented(out: &mut String, first: &str, rest: &str, text: &str) {
    for (idx, line) in text.lines().enumerate() {
        out.push_str(if idx == 0 { first } else { rest });
        out.push_str(line);
        out.push('\n');
    }
}

fn write_blocks(out: &mut String, blocks: &[Block], indent: &str) {
    for (idx, block) in blocks.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        write_block(out, block, indent);
    }
}

fn write_block(out: &mut String, block: &Block, indent: &str) {
    match block {
        Block::Heading { level, content } => {
            let title = plain_text(content);
            out.push_str(indent);
            out.push_str(&title);
            out.push('\n');
            let underline = match level {
                1 => Some('='),
                2 => Some('-'),
                _ => None,
            };
            if let Some(ch) = underline {
                out.push_str(indent);
                out.push_str(&ch.to_string().repeat(title.chars().count().max(3)));
                out.push('\n');
            }
        }
        Block::Paragraph(inlines) => {
            write_indented(out, indent, indent, &styled_inlines(inlines));
        }
        Block::List { start, items } => {
            for (idx, item) in items.iter().enumerate() {
                let marker = match start {
                    Some(first) => format!("{}. ", first + idx as u64),
                    None => "- ".to_string(),
                };
                let nested = format!("{}{}", indent, " ".repeat(marker.len()));
                let mut body = String::new();
                write_blocks(&mut body, item, "");
                let first = format!("{}{}", indent, marker);
                let mut lines = body.lines().filter(|line| !line.is_empty()).peekable();
                if lines.peek().is_none() {
                    out.push_str(first.trim_end());
                    out.push('\n');
                }
                for (line_idx, line) in lines.enumerate() {
                    out.push_str(if line_idx == 0 { &first } else { &nested });
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
        Block::Quote(inner) => {
            let mut body = String::new();
            write_blocks(&mut body, inner, "");
            let prefix = format!("{}> ", indent);
            for line in body.lines() {
                if line.is_empty() {
                    out.push_str(prefix.trim_end());
                } else {
                    out.push_str(&prefix);
                    out.push_str(line);
                }
                out.push('\n');
            }
        }
        Block::Code { text, .. } => {
            let code_indent = format!("{}    ", indent);
            write_indented(out, &code_indent, &code_indent, text);
        }
        Block::Rule => {
            out.push_str(indent);
            out.push_str("---\n");
        }
    }
}

impl fmt::Display for RenderedResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        write_blocks(&mut out, &self.blocks, "");
        f.write_str(&out)
    }
}
