//! Parsed Markdown document tree consumed by the converter.
//!
//! The tree is produced once by a [`crate::parser::MarkdownParser`] and is only
//! read afterwards. Literal text and per-kind attributes live inside the
//! [`NodeKind`] variants so every consumer matches exhaustively on kind.

use serde::{Deserialize, Serialize};

/// Column alignment declared by a table delimiter row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

/// The kind of a [`DocumentNode`] together with its kind-specific attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum NodeKind {
    Document,
    Heading { level: u8 },
    Paragraph,
    List { ordered: bool, start: u64 },
    ListItem,
    Image { url: String, title: Option<String> },
    BlockQuote,
    FencedCode { info: Option<String>, literal: String },
    IndentedCode { literal: String },
    ThematicBreak,
    InlineCode { literal: String },
    Link { url: String },
    Emphasis,
    Strong,
    Text { literal: String },
    Table,
    TableRow { header: bool },
    TableCell { alignment: Option<Alignment> },
}

impl NodeKind {
    /// Literal text carried by text and code leaves.
    pub fn literal(&self) -> Option<&str> {
        match self {
            NodeKind::Text { literal }
            | NodeKind::InlineCode { literal }
            | NodeKind::IndentedCode { literal }
            | NodeKind::FencedCode { literal, .. } => Some(literal),
            _ => None,
        }
    }

    /// Inline kinds live inside a paragraph, heading or table cell.
    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            NodeKind::Image { .. }
                | NodeKind::InlineCode { .. }
                | NodeKind::Link { .. }
                | NodeKind::Emphasis
                | NodeKind::Strong
                | NodeKind::Text { .. }
        )
    }

    /// Kinds that only ever render as part of their parent's component.
    pub fn is_parent_owned(&self) -> bool {
        matches!(
            self,
            NodeKind::Document
                | NodeKind::ListItem
                | NodeKind::TableRow { .. }
                | NodeKind::TableCell { .. }
                | NodeKind::Text { .. }
                | NodeKind::Emphasis
                | NodeKind::Strong
        )
    }
}

/// One node of the parsed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentNode {
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DocumentNode>,
}

impl DocumentNode {
    pub fn new(kind: NodeKind, children: Vec<DocumentNode>) -> Self {
        Self { kind, children }
    }

    pub fn leaf(kind: NodeKind) -> Self {
        Self::new(kind, Vec::new())
    }

    pub fn document(children: Vec<DocumentNode>) -> Self {
        Self::new(NodeKind::Document, children)
    }

    pub fn text(literal: impl Into<String>) -> Self {
        Self::leaf(NodeKind::Text {
            literal: literal.into(),
        })
    }

    pub fn inline_code(literal: impl Into<String>) -> Self {
        Self::leaf(NodeKind::InlineCode {
            literal: literal.into(),
        })
    }

    pub fn paragraph(children: Vec<DocumentNode>) -> Self {
        Self::new(NodeKind::Paragraph, children)
    }

    pub fn heading(level: u8, children: Vec<DocumentNode>) -> Self {
        Self::new(NodeKind::Heading { level }, children)
    }

    pub fn link(url: impl Into<String>, children: Vec<DocumentNode>) -> Self {
        Self::new(NodeKind::Link { url: url.into() }, children)
    }

    pub fn image(url: impl Into<String>, children: Vec<DocumentNode>) -> Self {
        Self::new(
            NodeKind::Image {
                url: url.into(),
                title: None,
            },
            children,
        )
    }

    pub fn literal(&self) -> Option<&str> {
        self.kind.literal()
    }

    /// Pre-order iterator over this node and all of its descendants.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }
}

/// Iterative pre-order traversal; depth never touches the call stack.
pub struct Descendants<'a> {
    stack: Vec<&'a DocumentNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a DocumentNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descendants_are_pre_order() {
        let doc = DocumentNode::document(vec![
            DocumentNode::heading(1, vec![DocumentNode::text("a")]),
            DocumentNode::paragraph(vec![
                DocumentNode::text("b"),
                DocumentNode::inline_code("c"),
            ]),
        ]);
        let literals: Vec<&str> = doc.descendants().filter_map(DocumentNode::literal).collect();
        assert_eq!(literals, vec!["a", "b", "c"]);
        assert_eq!(doc.descendants().count(), 6);
    }

    #[test]
    fn fenced_code_exposes_literal() {
        let node = DocumentNode::leaf(NodeKind::FencedCode {
            info: Some("rust".into()),
            literal: "fn main() {}\n".into(),
        });
        assert_eq!(node.literal(), Some("fn main() {}\n"));
        assert!(!node.kind.is_inline());
    }

    #[test]
    fn serializes_with_kind_tag() {
        let node = DocumentNode::heading(2, vec![DocumentNode::text("hi")]);
        let value = serde_json::to_value(&node).expect("serialize");
        assert_eq!(value["kind"], "heading");
        assert_eq!(value["level"], 2);
        assert_eq!(value["children"][0]["literal"], "hi");
    }
}
