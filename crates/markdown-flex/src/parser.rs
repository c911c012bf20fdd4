//! CommonMark parsing into [`DocumentNode`] trees.
//!
//! `pulldown-cmark` yields a flat event stream; [`TreeBuilder`] folds it into a
//! tree with an explicit frame stack. Nesting deeper than
//! [`MAX_NESTING_DEPTH`] is flattened into the deepest permitted ancestor so
//! later traversals work on a tree of bounded depth.

use crate::ast::{Alignment, DocumentNode, NodeKind};
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag};

/// Deepest node level kept in a parsed tree (the document root is level 1).
pub const MAX_NESTING_DEPTH: usize = 64;

/// Turns Markdown source into a document tree.
pub trait MarkdownParser: Send + Sync {
    fn parse(&self, markdown: &str) -> DocumentNode;
}

/// CommonMark parser with the GFM table extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommonMarkParser;

impl CommonMarkParser {
    pub fn new() -> Self {
        Self
    }
}

impl MarkdownParser for CommonMarkParser {
    fn parse(&self, markdown: &str) -> DocumentNode {
        let mut builder = TreeBuilder::new();
        for event in Parser::new_ext(markdown, Options::ENABLE_TABLES) {
            builder.push_event(event);
        }
        builder.finish()
    }
}

enum Frame {
    Node(DocumentNode),
    /// Paragraph opened around inline content of a tight list item.
    Implicit(DocumentNode),
    /// Dropped tag or nesting past the depth limit; children go to the parent.
    Transparent,
}

struct TreeBuilder {
    frames: Vec<Frame>,
    depth: usize,
    alignments: Vec<pulldown_cmark::Alignment>,
    cell_index: usize,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            frames: vec![Frame::Node(DocumentNode::document(Vec::new()))],
            depth: 1,
            alignments: Vec::new(),
            cell_index: 0,
        }
    }

    fn push_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(_) => self.end(),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline(DocumentNode::inline_code(code.to_string())),
            Event::SoftBreak => self.inline(DocumentNode::text(" ")),
            Event::HardBreak => self.inline(DocumentNode::text("\n")),
            Event::FootnoteReference(label) => {
                self.inline(DocumentNode::text(format!("[^{label}]")))
            }
            Event::TaskListMarker(checked) => {
                self.inline(DocumentNode::text(if checked { "[x] " } else { "[ ] " }))
            }
            Event::Rule => {
                self.close_implicit();
                self.attach(DocumentNode::leaf(NodeKind::ThematicBreak));
            }
            Event::Html(_) => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        let kind = match tag {
            Tag::Paragraph => Some(NodeKind::Paragraph),
            Tag::Heading(level, _, _) => Some(NodeKind::Heading { level: level as u8 }),
            Tag::BlockQuote => Some(NodeKind::BlockQuote),
            Tag::CodeBlock(CodeBlockKind::Indented) => Some(NodeKind::IndentedCode {
                literal: String::new(),
            }),
            Tag::CodeBlock(CodeBlockKind::Fenced(info)) => Some(NodeKind::FencedCode {
                info: Some(info.trim().to_string()).filter(|info| !info.is_empty()),
                literal: String::new(),
            }),
            Tag::List(start) => Some(NodeKind::List {
                ordered: start.is_some(),
                start: start.unwrap_or(1),
            }),
            Tag::Item => Some(NodeKind::ListItem),
            Tag::Table(alignments) => {
                self.alignments = alignments;
                Some(NodeKind::Table)
            }
            Tag::TableHead => {
                self.cell_index = 0;
                Some(NodeKind::TableRow { header: true })
            }
            Tag::TableRow => {
                self.cell_index = 0;
                Some(NodeKind::TableRow { header: false })
            }
            Tag::TableCell => {
                let alignment = self
                    .alignments
                    .get(self.cell_index)
                    .and_then(|alignment| match alignment {
                        pulldown_cmark::Alignment::None => None,
                        pulldown_cmark::Alignment::Left => Some(Alignment::Left),
                        pulldown_cmark::Alignment::Center => Some(Alignment::Center),
                        pulldown_cmark::Alignment::Right => Some(Alignment::Right),
                    });
                self.cell_index += 1;
                Some(NodeKind::TableCell { alignment })
            }
            Tag::Emphasis => Some(NodeKind::Emphasis),
            Tag::Strong => Some(NodeKind::Strong),
            Tag::Link(_, url, _) => Some(NodeKind::Link {
                url: url.to_string(),
            }),
            Tag::Image(_, url, title) => Some(NodeKind::Image {
                url: url.to_string(),
                title: Some(title.to_string()).filter(|title| !title.is_empty()),
            }),
            Tag::Strikethrough | Tag::FootnoteDefinition(_) => None,
        };

        match kind {
            Some(kind) if kind.is_inline() => {
                self.open_implicit_if_needed();
                self.open(kind);
            }
            Some(kind) => {
                self.close_implicit();
                self.open(kind);
            }
            None => self.frames.push(Frame::Transparent),
        }
    }

    fn open(&mut self, kind: NodeKind) {
        if self.depth >= MAX_NESTING_DEPTH {
            self.frames.push(Frame::Transparent);
            return;
        }
        self.depth += 1;
        self.frames.push(Frame::Node(DocumentNode::leaf(kind)));
    }

    fn end(&mut self) {
        self.close_implicit();
        self.close_top();
    }

    fn close_top(&mut self) {
        // The root frame is only closed by `finish`.
        if self.frames.len() <= 1 {
            return;
        }
        match self.frames.pop() {
            Some(Frame::Node(node)) | Some(Frame::Implicit(node)) => {
                self.depth -= 1;
                self.attach(node);
            }
            Some(Frame::Transparent) | None => {}
        }
    }

    fn close_implicit(&mut self) {
        if matches!(self.frames.last(), Some(Frame::Implicit(_))) {
            self.close_top();
        }
    }

    fn open_implicit_if_needed(&mut self) {
        let inside_item = matches!(
            self.frames.last(),
            Some(Frame::Node(DocumentNode {
                kind: NodeKind::ListItem,
                ..
            }))
        );
        if inside_item && self.depth < MAX_NESTING_DEPTH {
            self.depth += 1;
            self.frames
                .push(Frame::Implicit(DocumentNode::paragraph(Vec::new())));
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(node) = self.nearest_node() {
            if let NodeKind::FencedCode { literal, .. } | NodeKind::IndentedCode { literal } =
                &mut node.kind
            {
                literal.push_str(text);
                return;
            }
        }
        self.inline(DocumentNode::text(text));
    }

    fn inline(&mut self, node: DocumentNode) {
        self.open_implicit_if_needed();
        self.attach(node);
    }

    fn attach(&mut self, node: DocumentNode) {
        if let Some(parent) = self.nearest_node() {
            parent.children.push(node);
        }
    }

    fn nearest_node(&mut self) -> Option<&mut DocumentNode> {
        self.frames.iter_mut().rev().find_map(|frame| match frame {
            Frame::Node(node) | Frame::Implicit(node) => Some(node),
            Frame::Transparent => None,
        })
    }

    fn finish(mut self) -> DocumentNode {
        while self.frames.len() > 1 {
            self.close_top();
        }
        match self.frames.pop() {
            Some(Frame::Node(root)) => root,
            _ => DocumentNode::document(Vec::new()),
        }
    }
}
