//! Document node -> Flex component mapping.
//!
//! [`ComponentFactory::create`] maps one node to at most one component. Nodes
//! a component folds in (list items, table rows, inline runs) never become
//! components of their own; [`ComponentFactory::detached`] reports the
//! children a component did *not* fold so the walker can visit them.

use crate::ast::{Alignment, DocumentNode, NodeKind};
use crate::options::ConvertOptions;
use crate::parser::MAX_NESTING_DEPTH;
use crate::schema::{MAX_TEXT_LENGTH, is_valid_url};
use crate::size::truncate_chars;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

const MARKER_COLOR: &str = "#666666";
const LINK_COLOR: &str = "#1155CC";
const CODE_COLOR: &str = "#D73A49";
const CODE_TEXT_COLOR: &str = "#333333";
const CODE_LABEL_COLOR: &str = "#888888";
const CODE_BACKGROUND: &str = "#F6F8FA";
const RULE_COLOR: &str = "#E0E0E0";

/// One renderable Flex unit (text, image, box, separator, button, icon).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Component(Value);

impl Component {
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// The component `type`, e.g. `"text"` or `"box"`.
    pub fn kind(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }
}

impl From<Value> for Component {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<Component> for Value {
    fn from(component: Component) -> Self {
        component.0
    }
}

/// How images nested in inline content contribute to flattened text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageText {
    /// Images become components of their own and add no text.
    Skip,
    /// Images are replaced by their alt text.
    Alt,
}

/// A styled run inside a rich text component.
#[derive(Debug, Clone, Default, PartialEq)]
struct Span {
    text: String,
    weight: Option<&'static str>,
    style: Option<&'static str>,
    color: Option<&'static str>,
    size: Option<String>,
    action: Option<Value>,
}

impl Span {
    fn plain(text: String) -> Self {
        Self {
            text,
            ..Self::default()
        }
    }

    fn is_plain(&self) -> bool {
        self.weight.is_none()
            && self.style.is_none()
            && self.color.is_none()
            && self.size.is_none()
            && self.action.is_none()
    }

    fn to_value(&self) -> Value {
        let mut span = Map::new();
        span.insert("type".into(), Value::from("span"));
        span.insert("text".into(), Value::from(self.text.as_str()));
        if let Some(weight) = self.weight {
            span.insert("weight".into(), Value::from(weight));
        }
        if let Some(style) = self.style {
            span.insert("style".into(), Value::from(style));
        }
        if let Some(color) = self.color {
            span.insert("color".into(), Value::from(color));
        }
        if let Some(size) = &self.size {
            span.insert("size".into(), Value::from(size.as_str()));
        }
        if let Some(action) = &self.action {
            span.insert("action".into(), action.clone());
        }
        Value::Object(span)
    }
}

/// Accumulates plain characters and flushes them into a span whenever a
/// styled run is pushed, preserving order.
#[derive(Debug, Default)]
struct RichText {
    spans: Vec<Span>,
    pending: String,
}

impl RichText {
    fn push_plain(&mut self, text: &str) {
        self.pending.push_str(text);
    }

    fn push_span(&mut self, span: Span) {
        self.flush();
        if !span.text.is_empty() {
            self.spans.push(span);
        }
    }

    fn flush(&mut self) {
        if !self.pending.is_empty() {
            let text = std::mem::take(&mut self.pending);
            self.spans.push(Span::plain(text));
        }
    }

    fn finish(mut self) -> Vec<Span> {
        self.flush();
        for span in &mut self.spans {
            span.text = truncate_text(&span.text);
        }
        self.spans
    }
}

fn truncate_text(text: &str) -> String {
    let (text, truncated) = truncate_chars(text, MAX_TEXT_LENGTH);
    if truncated {
        debug!(limit = MAX_TEXT_LENGTH, "text value truncated");
    }
    text
}

fn has_visible_text(spans: &[Span]) -> bool {
    spans.iter().any(|span| !span.text.trim().is_empty())
}

/// Map every whitespace run to one space without trimming the ends.
fn squeeze_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

/// Flattened inline text of `node`'s children; inline code keeps backticks.
fn inline_text(node: &DocumentNode, images: ImageText) -> String {
    let mut out = String::new();
    let mut stack: Vec<&DocumentNode> = node.children.iter().rev().collect();
    while let Some(child) = stack.pop() {
        match &child.kind {
            NodeKind::Text { literal } => out.push_str(&squeeze_whitespace(literal)),
            NodeKind::InlineCode { literal } => {
                out.push('`');
                out.push_str(literal);
                out.push('`');
            }
            NodeKind::Image { .. } if images == ImageText::Skip => {}
            _ => stack.extend(child.children.iter().rev()),
        }
    }
    out.trim().to_string()
}

/// Image nodes inside the inline content of `node`.
fn images_within(node: &DocumentNode) -> Vec<&DocumentNode> {
    let mut images = Vec::new();
    let mut stack: Vec<&DocumentNode> = node.children.iter().rev().collect();
    while let Some(child) = stack.pop() {
        if matches!(child.kind, NodeKind::Image { .. }) {
            images.push(child);
        } else {
            stack.extend(child.children.iter().rev());
        }
    }
    images
}

fn uri_action(url: &str) -> Option<Value> {
    is_valid_url(url).then(|| json!({ "type": "uri", "uri": url }))
}

/// Text component carrying either `text` (a single unstyled span) or a rich
/// `contents` array, followed by `attributes`.
fn rich_text_component(spans: &[Span], attributes: Value) -> Component {
    let mut map = Map::new();
    map.insert("type".into(), Value::from("text"));
    match spans {
        [span] if span.is_plain() => {
            map.insert("text".into(), Value::from(span.text.as_str()));
        }
        [] => {
            map.insert("text".into(), Value::from(" "));
        }
        _ => {
            map.insert(
                "contents".into(),
                Value::Array(spans.iter().map(Span::to_value).collect()),
            );
        }
    }
    if let Value::Object(attributes) = attributes {
        map.extend(attributes);
    }
    Component(Value::Object(map))
}

/// Builds Flex components from document nodes.
pub struct ComponentFactory<'a> {
    theme: &'a Theme,
    options: &'a ConvertOptions,
}

impl<'a> ComponentFactory<'a> {
    pub fn new(theme: &'a Theme, options: &'a ConvertOptions) -> Self {
        Self { theme, options }
    }

    /// Map one node to its component, or `None` for kinds without a visual
    /// representation of their own.
    pub fn create(&self, node: &DocumentNode) -> Option<Component> {
        match &node.kind {
            NodeKind::Document
            | NodeKind::ListItem
            | NodeKind::Emphasis
            | NodeKind::Strong
            | NodeKind::Text { .. }
            | NodeKind::TableRow { .. }
            | NodeKind::TableCell { .. } => None,
            NodeKind::Heading { level } => self.heading(node, *level),
            NodeKind::Paragraph => self.paragraph(node),
            NodeKind::List { ordered, start } => Some(self.list(node, *ordered, *start)),
            NodeKind::Image { url, .. } => self.image(url),
            NodeKind::BlockQuote => self.block_quote(node),
            NodeKind::FencedCode { info, literal } => {
                Some(self.fenced_code(literal, info.as_deref()))
            }
            NodeKind::IndentedCode { literal } => Some(self.code_as_text(literal, None)),
            NodeKind::ThematicBreak => Some(self.thematic_break()),
            NodeKind::InlineCode { literal } => Some(self.inline_code(literal)),
            NodeKind::Link { url } => self.link(node, url),
            NodeKind::Table => Some(self.table(node)),
        }
    }

    /// Children of a component-producing `node` that its component does not
    /// fold in and that must be visited on their own.
    pub fn detached<'n>(&self, node: &'n DocumentNode) -> Vec<&'n DocumentNode> {
        match &node.kind {
            NodeKind::Heading { .. } | NodeKind::Paragraph | NodeKind::Link { .. } => {
                images_within(node)
            }
            NodeKind::List { .. } => {
                let mut detached = Vec::new();
                for item in &node.children {
                    let mut folded = false;
                    for child in &item.children {
                        if !folded && child.kind == NodeKind::Paragraph {
                            folded = true;
                            detached.extend(images_within(child));
                        } else {
                            detached.push(child);
                        }
                    }
                }
                detached
            }
            NodeKind::BlockQuote => {
                let mut detached = Vec::new();
                for child in &node.children {
                    if child.kind == NodeKind::Paragraph {
                        detached.extend(images_within(child));
                    } else {
                        detached.push(child);
                    }
                }
                detached
            }
            _ => Vec::new(),
        }
    }

    fn heading(&self, node: &DocumentNode, level: u8) -> Option<Component> {
        let text = inline_text(node, ImageText::Skip);
        if text.is_empty() {
            return None;
        }
        let mut component = json!({
            "type": "text",
            "text": truncate_text(&text),
            "size": self.theme.heading_size(level),
            "weight": self.theme.heading_weight,
            "wrap": true,
        });
        if level > 1 {
            component["margin"] = Value::from("lg");
        }
        Some(Component(component))
    }

    fn paragraph(&self, node: &DocumentNode) -> Option<Component> {
        let spans = self.rich_text([node]);
        if !has_visible_text(&spans) {
            return None;
        }
        Some(rich_text_component(
            &spans,
            json!({ "size": self.theme.text_size, "wrap": true }),
        ))
    }

    fn list(&self, node: &DocumentNode, ordered: bool, start: u64) -> Component {
        let mut counter = start;
        let mut rows = Vec::new();
        for item in &node.children {
            if item.kind != NodeKind::ListItem {
                continue;
            }
            let marker = if ordered {
                let marker = format!("{counter}.");
                counter += 1;
                marker
            } else {
                "•".to_string()
            };
            rows.push(self.list_item(item, &marker));
        }
        Component(json!({
            "type": "box",
            "layout": "vertical",
            "spacing": "sm",
            "contents": rows,
            "margin": "md",
        }))
    }

    fn list_item(&self, item: &DocumentNode, marker: &str) -> Value {
        let spans = item
            .children
            .iter()
            .find(|child| child.kind == NodeKind::Paragraph)
            .map(|paragraph| self.rich_text([paragraph]))
            .unwrap_or_default();
        let body = rich_text_component(
            &spans,
            json!({
                "size": self.theme.text_size,
                "wrap": true,
                "flex": 1,
                "margin": "sm",
            }),
        );
        json!({
            "type": "box",
            "layout": "baseline",
            "spacing": "sm",
            "contents": [
                {
                    "type": "text",
                    "text": marker,
                    "size": self.theme.text_size,
                    "color": MARKER_COLOR,
                    "flex": 0,
                    "margin": "none",
                },
                body.into_value(),
            ],
        })
    }

    fn image(&self, url: &str) -> Option<Component> {
        if !is_valid_url(url) {
            debug!(url, "skipping image without an absolute url");
            return None;
        }
        Some(Component(json!({
            "type": "image",
            "url": url,
            "aspectRatio": self.theme.image_ratio,
            "aspectMode": "cover",
            "size": "full",
        })))
    }

    fn block_quote(&self, node: &DocumentNode) -> Option<Component> {
        let spans = self.rich_text(
            node.children
                .iter()
                .filter(|child| child.kind == NodeKind::Paragraph),
        );
        if !has_visible_text(&spans) {
            return None;
        }
        let text = rich_text_component(
            &spans,
            json!({
                "size": self.theme.text_size,
                "wrap": true,
                "style": "italic",
            }),
        );
        Some(Component(json!({
            "type": "box",
            "layout": "vertical",
            "backgroundColor": self.theme.quote_background,
            "paddingAll": "md",
            "margin": "md",
            "cornerRadius": "4px",
            "borderWidth": "2px",
            "borderColor": RULE_COLOR,
            "contents": [text.into_value()],
        })))
    }

    fn fenced_code(&self, literal: &str, info: Option<&str>) -> Component {
        if self.options.code_img {
            warn!(
                max_lines = self.options.max_lines,
                "code image rendering is unavailable, rendering code as text"
            );
        }
        let language = info.and_then(|info| info.split_whitespace().next());
        self.code_as_text(literal, language)
    }

    fn code_as_text(&self, code: &str, language: Option<&str>) -> Component {
        let mut lines = Vec::new();
        if let Some(language) = language {
            lines.push(json!({
                "type": "text",
                "text": truncate_text(language),
                "size": "xs",
                "color": CODE_LABEL_COLOR,
                "weight": "bold",
                "margin": "none",
            }));
        }
        for line in code.trim_end().split('\n') {
            let line = line.trim_end_matches('\r');
            let text = if line.is_empty() {
                " ".to_string()
            } else {
                truncate_text(line)
            };
            lines.push(json!({
                "type": "text",
                "text": text,
                "size": self.theme.code_size,
                "wrap": false,
                "color": CODE_TEXT_COLOR,
                "fontFamily": "monospace",
            }));
        }
        Component(json!({
            "type": "box",
            "layout": "vertical",
            "spacing": "xs",
            "backgroundColor": CODE_BACKGROUND,
            "paddingAll": "md",
            "margin": "md",
            "cornerRadius": "4px",
            "contents": lines,
        }))
    }

    fn thematic_break(&self) -> Component {
        Component(json!({
            "type": "separator",
            "margin": "lg",
            "color": RULE_COLOR,
        }))
    }

    fn inline_code(&self, literal: &str) -> Component {
        Component(json!({
            "type": "text",
            "text": truncate_text(literal),
            "size": self.theme.code_size,
            "backgroundColor": CODE_BACKGROUND,
            "color": CODE_COLOR,
            "wrap": false,
        }))
    }

    fn link(&self, node: &DocumentNode, url: &str) -> Option<Component> {
        let text = inline_text(node, ImageText::Skip);
        if text.is_empty() {
            return None;
        }
        let mut component = json!({
            "type": "text",
            "text": truncate_text(&text),
            "size": self.theme.text_size,
            "color": LINK_COLOR,
        });
        if let Some(action) = uri_action(url) {
            component["action"] = action;
        }
        Some(Component(component))
    }

    fn table(&self, node: &DocumentNode) -> Component {
        let mut rows = Vec::new();
        let mut header_seen = false;
        for row in &node.children {
            let NodeKind::TableRow { header } = &row.kind else {
                continue;
            };
            let header = *header;
            let is_header = header && !header_seen;
            header_seen |= header;
            if let Some(row) = self.table_row(row, is_header) {
                rows.push(row);
            }
        }
        Component(json!({
            "type": "box",
            "layout": "vertical",
            "margin": "md",
            "spacing": "sm",
            "contents": rows,
        }))
    }

    fn table_row(&self, row: &DocumentNode, is_header: bool) -> Option<Value> {
        let cells: Vec<Value> = row
            .children
            .iter()
            .filter_map(|cell| match &cell.kind {
                NodeKind::TableCell { alignment } => {
                    Some(self.table_cell(cell, *alignment, is_header))
                }
                _ => None,
            })
            .collect();
        if cells.is_empty() {
            return None;
        }
        let mut row_box = json!({
            "type": "box",
            "layout": "horizontal",
            "spacing": "md",
            "contents": cells,
        });
        if !is_header {
            return Some(row_box);
        }
        row_box["paddingBottom"] = Value::from("sm");
        Some(json!({
            "type": "box",
            "layout": "vertical",
            "spacing": "xs",
            "contents": [
                row_box,
                { "type": "separator", "color": RULE_COLOR },
            ],
        }))
    }

    fn table_cell(
        &self,
        cell: &DocumentNode,
        alignment: Option<Alignment>,
        is_header: bool,
    ) -> Value {
        let mut text = inline_text(cell, ImageText::Alt);
        if text.trim().is_empty() {
            text = " ".to_string();
        }
        let mut component = json!({
            "type": "text",
            "text": truncate_text(&text),
            "size": if is_header { "sm" } else { "xs" },
            "wrap": true,
            "flex": 1,
        });
        if is_header {
            component["weight"] = Value::from("bold");
            component["color"] = Value::from(CODE_TEXT_COLOR);
        } else {
            component["color"] = Value::from(MARKER_COLOR);
        }
        if let Some(alignment) = alignment {
            component["align"] = Value::from(match alignment {
                Alignment::Left => "start",
                Alignment::Center => "center",
                Alignment::Right => "end",
            });
        }
        component
    }

    /// Rich text spans of `paragraphs`, separated by newlines.
    fn rich_text<'n>(&self, paragraphs: impl IntoIterator<Item = &'n DocumentNode>) -> Vec<Span> {
        let mut rich = RichText::default();
        for (index, paragraph) in paragraphs.into_iter().enumerate() {
            if index > 0 {
                rich.push_plain("\n");
            }
            self.decompose(&mut rich, paragraph, 1);
        }
        rich.finish()
    }

    fn decompose(&self, rich: &mut RichText, node: &DocumentNode, depth: usize) {
        for child in &node.children {
            match &child.kind {
                NodeKind::Text { literal } => rich.push_plain(literal),
                NodeKind::Strong | NodeKind::Emphasis => {
                    let mut nested = RichText::default();
                    if depth >= MAX_NESTING_DEPTH {
                        nested.push_plain(&inline_text(child, ImageText::Skip));
                    } else {
                        self.decompose(&mut nested, child, depth + 1);
                    }
                    nested.flush();
                    for mut span in nested.spans {
                        if child.kind == NodeKind::Strong {
                            span.weight = Some("bold");
                        } else {
                            span.style = Some("italic");
                        }
                        rich.push_span(span);
                    }
                }
                NodeKind::InlineCode { literal } => rich.push_span(Span {
                    text: literal.clone(),
                    color: Some(CODE_COLOR),
                    size: Some(self.theme.code_size.clone()),
                    ..Span::default()
                }),
                NodeKind::Link { url } => rich.push_span(Span {
                    text: inline_text(child, ImageText::Skip),
                    color: Some(LINK_COLOR),
                    action: uri_action(url),
                    ..Span::default()
                }),
                NodeKind::Image { .. } => {}
                _ => rich.push_plain(&inline_text(child, ImageText::Skip)),
            }
        }
    }
}
