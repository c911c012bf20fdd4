use crate::ast::DocumentNode;
use crate::carousel::{CarouselAssembler, FlexOutput};
use crate::component::ComponentFactory;
use crate::options::ConvertOptions;
use crate::parser::{CommonMarkParser, MarkdownParser};
use crate::size::SizeMeter;
use crate::theme::Theme;
use crate::walker::TreeWalker;
use tracing::debug;

/// Markdown in, Flex bubble or carousel out.
///
/// Every call builds fresh packing state, so one converter can be shared
/// across threads.
pub struct MarkdownFlexConverter {
    parser: Box<dyn MarkdownParser>,
    theme: Theme,
    options: ConvertOptions,
}

impl Default for MarkdownFlexConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownFlexConverter {
    pub fn new() -> Self {
        Self {
            parser: Box::new(CommonMarkParser::new()),
            theme: Theme::standard(),
            options: ConvertOptions::default(),
        }
    }

    pub fn with_parser(mut self, parser: impl MarkdownParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    pub fn convert(&self, markdown: &str) -> FlexOutput {
        let document = self.parser.parse(markdown);
        self.convert_document(&document)
    }

    pub fn convert_document(&self, document: &DocumentNode) -> FlexOutput {
        let meter = SizeMeter::new();
        let walker = TreeWalker::new(
            ComponentFactory::new(&self.theme, &self.options),
            CarouselAssembler::new(meter),
        );
        let output = walker.visit(document);
        debug!(
            bubbles = output.bubble_count(),
            bytes = meter.json_size(&output.json),
            alt_text_chars = output.alt_text.chars().count(),
            "conversion finished"
        );
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;

    struct FixedParser;

    impl MarkdownParser for FixedParser {
        fn parse(&self, _markdown: &str) -> DocumentNode {
            DocumentNode::document(vec![DocumentNode::heading(
                2,
                vec![DocumentNode::text("Fixed")],
            )])
        }
    }

    #[test]
    fn heading_becomes_single_bubble() {
        let output = MarkdownFlexConverter::new().convert("# Hello World");
        assert_eq!(output.json["type"], "bubble");
        assert_eq!(output.alt_text, "Hello World");
        let contents = &output.json["body"]["contents"];
        assert_eq!(contents[0]["text"], "Hello World");
    }

    #[test]
    fn custom_parser_is_used() {
        let output = MarkdownFlexConverter::new()
            .with_parser(FixedParser)
            .convert("ignored");
        assert_eq!(output.alt_text, "Fixed");
        assert_eq!(output.json["body"]["contents"][0]["margin"], "lg");
    }

    #[test]
    fn convert_document_accepts_prebuilt_tree() {
        let document = DocumentNode::document(vec![
            DocumentNode::paragraph(vec![DocumentNode::text("Body")]),
            DocumentNode::leaf(NodeKind::ThematicBreak),
        ]);
        let output = MarkdownFlexConverter::new().convert_document(&document);
        let contents = output.json["body"]["contents"].as_array().expect("contents");
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[1]["type"], "separator");
        assert_eq!(output.alt_text, "Body");
    }

    #[test]
    fn dark_theme_flows_into_components() {
        let output = MarkdownFlexConverter::new()
            .with_theme(Theme::dark())
            .convert("> dark quote");
        assert_eq!(
            output.json["body"]["contents"][0]["backgroundColor"],
            "#2D3748"
        );
    }

    #[test]
    fn converter_is_shareable_across_threads() {
        let converter = std::sync::Arc::new(MarkdownFlexConverter::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let converter = converter.clone();
                std::thread::spawn(move || converter.convert(&format!("# Title {i}")).alt_text)
            })
            .collect();
        let titles: Vec<String> = handles
            .into_iter()
            .map(|handle| handle.join().expect("thread"))
            .collect();
        assert_eq!(titles, vec!["Title 0", "Title 1", "Title 2", "Title 3"]);
    }
}
