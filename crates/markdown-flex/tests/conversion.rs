use markdown_flex::schema::{ALT_TEXT_LIMIT, BUBBLE_LIMIT, CAROUSEL_LIMIT, MAX_BUBBLES};
use markdown_flex::{ConvertOptions, FlexValidator, MarkdownFlexConverter, SizeMeter, Theme};
use serde_json::Value;

const LOREM: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod \
                     tempor incididunt ut labore et dolore magna aliqua. ";

fn convert(markdown: &str) -> markdown_flex::FlexOutput {
    MarkdownFlexConverter::new().convert(markdown)
}

fn bubbles(json: &Value) -> Vec<&Value> {
    match json["type"].as_str() {
        Some("bubble") => vec![json],
        Some("carousel") => json["contents"]
            .as_array()
            .expect("carousel contents")
            .iter()
            .collect(),
        _ => Vec::new(),
    }
}

#[test]
fn heading_converts_to_single_bubble() {
    let output = convert("# Hello World");
    assert_eq!(output.json["type"], "bubble");
    assert_eq!(output.json["body"]["layout"], "vertical");
    assert_eq!(output.alt_text, "Hello World");
}

#[test]
fn paragraph_alt_text() {
    let output = convert("This is a simple paragraph.");
    assert_eq!(output.json["type"], "bubble");
    assert_eq!(output.alt_text, "This is a simple paragraph.");
}

#[test]
fn list_items_keep_their_order_in_alt_text() {
    let output = convert("- Item 1\n- Item 2\n- Item 3");
    let first = output.alt_text.find("Item 1").expect("item 1");
    let second = output.alt_text.find("Item 2").expect("item 2");
    let third = output.alt_text.find("Item 3").expect("item 3");
    assert!(first < second && second < third);
}

#[test]
fn code_block_alt_text_keeps_source() {
    let output = convert("```php\necho 'Hello World';\n```");
    assert_eq!(output.json["type"], "bubble");
    assert!(output.alt_text.contains("echo 'Hello World';"));
}

#[test]
fn block_quote_alt_text() {
    let output = convert("> This is a quote");
    assert_eq!(output.alt_text, "This is a quote");
}

#[test]
fn dark_theme_conversion() {
    let output = MarkdownFlexConverter::new()
        .with_theme(Theme::dark())
        .convert("# Dark Theme Test");
    assert_eq!(output.json["type"], "bubble");
    assert_eq!(output.alt_text, "Dark Theme Test");
}

#[test]
fn long_content_becomes_bounded_carousel() {
    let mut markdown = String::new();
    for i in 0..20 {
        markdown.push_str(&format!("# Heading {i}\n\n{}\n\n", LOREM.repeat(50)));
    }
    let output = convert(&markdown);
    let meter = SizeMeter::new();

    assert_eq!(output.json["type"], "carousel");
    let bubbles = bubbles(&output.json);
    assert!(bubbles.len() <= MAX_BUBBLES);
    for bubble in bubbles {
        assert!(meter.json_size(bubble) <= BUBBLE_LIMIT);
    }
    assert!(meter.json_size(&output.json) <= CAROUSEL_LIMIT);
}

#[test]
fn alt_text_is_capped_with_ellipsis() {
    let markdown = format!("# Title\n\n{}", LOREM.repeat(30));
    let output = convert(&markdown);
    assert_eq!(output.alt_text.chars().count(), ALT_TEXT_LIMIT);
    assert!(output.alt_text.ends_with("..."));
}

#[test]
fn packing_preserves_component_order() {
    let markdown: String = (0..30)
        .map(|i| format!("Paragraph {i:02} {}\n\n", "word ".repeat(300)))
        .collect();
    let output = convert(&markdown);
    let texts: Vec<String> = bubbles(&output.json)
        .into_iter()
        .flat_map(|bubble| {
            bubble["body"]["contents"]
                .as_array()
                .expect("contents")
                .iter()
                .map(|c| c["text"].as_str().expect("text")[..12].to_string())
                .collect::<Vec<_>>()
        })
        .collect();
    assert!(texts.len() > 1);
    for (index, text) in texts.iter().enumerate() {
        assert_eq!(text, &format!("Paragraph {index:02}"));
    }
}

#[test]
fn empty_input_yields_empty_output() {
    let output = convert("");
    assert!(output.is_empty());
    assert_eq!(output.alt_text, "");
    assert!(output.into_message().is_none());
}

#[test]
fn code_image_option_still_renders_text() {
    let options = ConvertOptions::from_json_str(r#"{"code_img": true, "max_lines": 5}"#)
        .expect("options");
    let output = MarkdownFlexConverter::new()
        .with_options(options)
        .convert("```\nfn main() {}\n```");
    let code = &output.json["body"]["contents"][0];
    assert_eq!(code["type"], "box");
    assert_eq!(code["contents"][0]["text"], "fn main() {}");
}

#[test]
fn converted_documents_validate_cleanly() {
    let documents = [
        "# Hello World".to_string(),
        "- Item 1\n- Item 2\n  1. nested\n  2. more\n- \n".to_string(),
        "> quote with **bold** and [a link](https://example.com)\n>\n> second".to_string(),
        "Text with `code`, *emphasis*, [relative](docs/x.md) and \
         ![pic](https://example.com/p.png)"
            .to_string(),
        "| Name | Qty |\n|:-----|----:|\n| apple | 1 |\n| | 2 |".to_string(),
        "```rust\nfn main() {\n\n    println!(\"hi\");\n}\n```\n\n---\n\n    indented"
            .to_string(),
        format!("# Big\n\n{}", "x".repeat(5000)),
        (0..20)
            .map(|i| format!("## Section {i}\n\n{}\n\n", LOREM.repeat(50)))
            .collect(),
    ];
    let validator = FlexValidator::new();
    for markdown in &documents {
        let message = convert(markdown).into_message().expect("message");
        let report = validator.validate(&message);
        assert!(
            report.is_valid(),
            "{markdown:?} produced violations: {:?}",
            report.messages()
        );
    }
}
