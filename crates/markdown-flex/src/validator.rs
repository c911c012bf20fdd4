//! Structural validation of Flex Message documents.
//!
//! Every rule is checked independently and every failure is collected, so a
//! report lists all problems in a document rather than the first one.

use crate::errors::FlexError;
use crate::schema::{
    ALT_TEXT_LIMIT, BOX_LAYOUTS, BUBBLE_LIMIT, BUBBLE_SIZES, BUTTON_STYLES, CAROUSEL_LIMIT,
    MAX_BUBBLES, MAX_TEXT_LENGTH, SPACINGS, TEXT_SIZES, TEXT_WEIGHTS, is_valid_aspect_ratio,
    is_valid_color, is_valid_url,
};
use crate::size::SizeMeter;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One failed rule, located by a dotted path such as `bubble.body.contents[0]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn messages(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.message.as_str()).collect()
    }

    /// Whether any violation message contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.violations.iter().any(|v| v.message.contains(needle))
    }
}

/// Validates flex, bubble and carousel documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct FlexValidator {
    meter: SizeMeter,
}

impl FlexValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self, document: &Value) -> ValidationReport {
        let mut checker = Checker {
            meter: self.meter,
            violations: Vec::new(),
        };
        checker.root(document);
        ValidationReport {
            violations: checker.violations,
        }
    }

    pub fn is_valid(&self, document: &Value) -> bool {
        self.validate(document).is_valid()
    }

    /// Parse `json` and validate it. Malformed JSON is an input error, not a
    /// violation.
    pub fn validate_str(&self, json: &str) -> Result<ValidationReport, FlexError> {
        let document: Value = serde_json::from_str(json)?;
        Ok(self.validate(&document))
    }
}

/// A present, non-null field.
fn field<'v>(object: &'v Map<String, Value>, key: &str) -> Option<&'v Value> {
    object.get(key).filter(|value| !value.is_null())
}

fn one_of(values: &[&str]) -> String {
    values.join(", ")
}

struct Checker {
    meter: SizeMeter,
    violations: Vec<Violation>,
}

impl Checker {
    fn report(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation::new(path, message));
    }

    fn root(&mut self, document: &Value) {
        let Some(object) = document.as_object() else {
            self.report("", "Root message must have a type");
            return;
        };
        match field(object, "type") {
            None => self.report("type", "Root message must have a type"),
            Some(kind) => match kind.as_str() {
                Some("flex") => self.flex_message(object),
                Some("bubble") => self.bubble(object, "bubble"),
                Some("carousel") => self.carousel(object, "carousel"),
                _ => self.report(
                    "type",
                    r#"Root type must be "flex", "bubble", or "carousel""#,
                ),
            },
        }
    }

    fn flex_message(&mut self, message: &Map<String, Value>) {
        match field(message, "altText") {
            None => self.report("altText", "altText is required"),
            Some(Value::String(alt_text)) => {
                if self.meter.text_size(alt_text) > ALT_TEXT_LIMIT {
                    self.report(
                        "altText",
                        format!("altText must be {ALT_TEXT_LIMIT} characters or less"),
                    );
                }
                if alt_text.trim().is_empty() {
                    self.report("altText", "altText cannot be empty");
                }
            }
            Some(_) => self.report("altText", "altText must be a string"),
        }

        let Some(contents) = field(message, "contents") else {
            self.report("contents", "contents is required");
            return;
        };
        let Some(contents) = contents.as_object() else {
            self.report("contents", "contents must be an object");
            return;
        };
        match field(contents, "type").map(Value::as_str) {
            None => self.report("contents.type", "contents.type is required"),
            Some(Some("bubble")) => self.bubble(contents, "contents"),
            Some(Some("carousel")) => self.carousel(contents, "contents"),
            Some(_) => self.report(
                "contents.type",
                r#"contents.type must be "bubble" or "carousel""#,
            ),
        }
    }

    fn bubble(&mut self, bubble: &Map<String, Value>, path: &str) {
        let size = self.meter.json_size(bubble);
        if size > BUBBLE_LIMIT {
            self.report(
                path,
                format!("{path} size ({size} bytes) exceeds {BUBBLE_LIMIT} byte limit"),
            );
        }

        self.enumerated(bubble, "size", BUBBLE_SIZES, path);

        if field(bubble, "body").is_none() && field(bubble, "hero").is_none() {
            self.report(path, format!("{path}.body or {path}.hero is required"));
        }

        for section in ["body", "hero", "header"] {
            if let Some(container) = field(bubble, section) {
                self.container(container, &format!("{path}.{section}"));
            }
        }

        if let Some(footer) = field(bubble, "footer") {
            let separator_only = footer.get("separator") == Some(&Value::Bool(true));
            if !separator_only {
                self.container(footer, &format!("{path}.footer"));
            }
        }
    }

    fn carousel(&mut self, carousel: &Map<String, Value>, path: &str) {
        let Some(contents) = field(carousel, "contents") else {
            self.report(path, format!("{path}.contents is required"));
            return;
        };
        let Some(bubbles) = contents.as_array() else {
            self.report(path, format!("{path}.contents must be an array"));
            return;
        };

        if bubbles.len() > MAX_BUBBLES {
            self.report(
                path,
                format!(
                    "{path} contains {} bubbles, maximum is {MAX_BUBBLES}",
                    bubbles.len()
                ),
            );
        }
        if bubbles.is_empty() {
            self.report(path, format!("{path} must contain at least 1 bubble"));
        }

        let size = self.meter.json_size(carousel);
        if size > CAROUSEL_LIMIT {
            self.report(
                path,
                format!("{path} size ({size} bytes) exceeds {CAROUSEL_LIMIT} byte limit"),
            );
        }

        for (index, bubble) in bubbles.iter().enumerate() {
            let bubble_path = format!("{path}.contents[{index}]");
            let Some(bubble) = bubble.as_object() else {
                self.report(&bubble_path, format!("{bubble_path} must be an object"));
                continue;
            };
            if field(bubble, "type").and_then(Value::as_str) != Some("bubble") {
                self.report(
                    format!("{bubble_path}.type"),
                    format!(r#"{bubble_path}.type must be "bubble""#),
                );
                continue;
            }
            self.bubble(bubble, &bubble_path);
        }
    }

    fn container(&mut self, container: &Value, path: &str) {
        let Some(container) = container.as_object() else {
            self.report(path, format!("{path} must be an object"));
            return;
        };
        let Some(kind) = field(container, "type") else {
            self.report(format!("{path}.type"), format!("{path}.type is required"));
            return;
        };
        match kind.as_str() {
            Some("box") => self.box_component(container, path),
            Some("text") => self.text(container, path),
            Some("image") => self.image(container, path),
            Some("button") => self.button(container, path),
            Some("icon") => self.icon(container, path),
            Some("separator" | "spacer" | "filler") => {}
            _ => self.report(
                format!("{path}.type"),
                format!("{path}.type {kind} is not supported"),
            ),
        }
    }

    fn box_component(&mut self, component: &Map<String, Value>, path: &str) {
        match field(component, "layout") {
            None => self.report(
                format!("{path}.layout"),
                format!("{path}.layout is required"),
            ),
            Some(layout) if !layout.as_str().is_some_and(|l| BOX_LAYOUTS.contains(&l)) => self
                .report(
                    format!("{path}.layout"),
                    format!("{path}.layout must be one of: {}", one_of(BOX_LAYOUTS)),
                ),
            Some(_) => {}
        }

        match field(component, "contents") {
            None => self.report(
                format!("{path}.contents"),
                format!("{path}.contents is required"),
            ),
            Some(Value::Array(children)) => {
                for (index, child) in children.iter().enumerate() {
                    self.container(child, &format!("{path}.contents[{index}]"));
                }
            }
            Some(_) => self.report(
                format!("{path}.contents"),
                format!("{path}.contents must be an array"),
            ),
        }

        self.enumerated(component, "spacing", SPACINGS, path);
        self.enumerated(component, "margin", SPACINGS, path);
    }

    fn text(&mut self, text: &Map<String, Value>, path: &str) {
        let body = field(text, "text");
        let contents = field(text, "contents");
        if body.is_none() && contents.is_none() {
            self.report(path, format!("{path}.text or {path}.contents is required"));
        }

        match body {
            Some(Value::String(body)) => self.text_length(body, &format!("{path}.text")),
            Some(_) => self.report(
                format!("{path}.text"),
                format!("{path}.text must be a string"),
            ),
            None => {}
        }

        match contents {
            Some(Value::Array(spans)) => {
                for (index, span) in spans.iter().enumerate() {
                    self.span(span, &format!("{path}.contents[{index}]"));
                }
            }
            Some(_) => self.report(
                format!("{path}.contents"),
                format!("{path}.contents must be an array"),
            ),
            None => {}
        }

        self.enumerated(text, "size", TEXT_SIZES, path);
        if let Some(weight) = field(text, "weight") {
            if !weight.as_str().is_some_and(|w| TEXT_WEIGHTS.contains(&w)) {
                self.report(
                    format!("{path}.weight"),
                    format!(r#"{path}.weight must be "regular" or "bold""#),
                );
            }
        }
        self.color(text, "color", path);
        self.enumerated(text, "margin", SPACINGS, path);
        if let Some(action) = field(text, "action") {
            self.action(action, &format!("{path}.action"));
        }
    }

    fn span(&mut self, span: &Value, path: &str) {
        match span {
            Value::String(text) => self.text_length(text, path),
            Value::Object(span) => {
                if field(span, "type").and_then(Value::as_str) != Some("span") {
                    self.report(
                        format!("{path}.type"),
                        format!(r#"{path}.type must be "span""#),
                    );
                }
                match field(span, "text") {
                    None => self.report(
                        format!("{path}.text"),
                        format!("{path}.text is required"),
                    ),
                    Some(Value::String(text)) => {
                        self.text_length(text, &format!("{path}.text"))
                    }
                    Some(_) => self.report(
                        format!("{path}.text"),
                        format!("{path}.text must be a string"),
                    ),
                }
                self.color(span, "color", path);
                if let Some(action) = field(span, "action") {
                    self.action(action, &format!("{path}.action"));
                }
            }
            _ => self.report(path, format!("{path} must be a span object or string")),
        }
    }

    fn image(&mut self, image: &Map<String, Value>, path: &str) {
        self.url(image, "url", path);
        if let Some(ratio) = field(image, "aspectRatio") {
            if !ratio.as_str().is_some_and(is_valid_aspect_ratio) {
                self.report(
                    format!("{path}.aspectRatio"),
                    format!(r#"{path}.aspectRatio must be in format "width:height""#),
                );
            }
        }
        self.enumerated(image, "margin", SPACINGS, path);
    }

    fn icon(&mut self, icon: &Map<String, Value>, path: &str) {
        self.url(icon, "url", path);
        self.enumerated(icon, "size", TEXT_SIZES, path);
    }

    fn button(&mut self, button: &Map<String, Value>, path: &str) {
        match field(button, "action") {
            None => self.report(
                format!("{path}.action"),
                format!("{path}.action is required"),
            ),
            Some(action) => self.action(action, &format!("{path}.action")),
        }
        self.enumerated(button, "style", BUTTON_STYLES, path);
    }

    fn action(&mut self, action: &Value, path: &str) {
        let Some(action) = action.as_object() else {
            self.report(path, format!("{path} must be an object"));
            return;
        };
        let Some(kind) = field(action, "type") else {
            self.report(format!("{path}.type"), format!("{path}.type is required"));
            return;
        };
        match kind.as_str() {
            Some("uri") => self.url(action, "uri", path),
            Some("message") => self.required(action, "text", path),
            Some("postback") => self.required(action, "data", path),
            _ => self.report(
                format!("{path}.type"),
                format!("{path}.type {kind} is not supported"),
            ),
        }
    }

    fn required(&mut self, object: &Map<String, Value>, key: &str, path: &str) {
        if field(object, key).is_none() {
            self.report(
                format!("{path}.{key}"),
                format!("{path}.{key} is required"),
            );
        }
    }

    fn url(&mut self, object: &Map<String, Value>, key: &str, path: &str) {
        match field(object, key) {
            None => self.required(object, key, path),
            Some(url) if !url.as_str().is_some_and(is_valid_url) => self.report(
                format!("{path}.{key}"),
                format!("{path}.{key} must be a valid URL"),
            ),
            Some(_) => {}
        }
    }

    fn color(&mut self, object: &Map<String, Value>, key: &str, path: &str) {
        if let Some(color) = field(object, key) {
            if !color.as_str().is_some_and(is_valid_color) {
                self.report(
                    format!("{path}.{key}"),
                    format!("{path}.{key} must be a valid color code"),
                );
            }
        }
    }

    fn enumerated(
        &mut self,
        object: &Map<String, Value>,
        key: &str,
        allowed: &[&str],
        path: &str,
    ) {
        if let Some(value) = field(object, key) {
            if !value.as_str().is_some_and(|v| allowed.contains(&v)) {
                self.report(
                    format!("{path}.{key}"),
                    format!("{path}.{key} must be one of: {}", one_of(allowed)),
                );
            }
        }
    }

    fn text_length(&mut self, text: &str, path: &str) {
        let length = self.meter.text_size(text);
        if length > MAX_TEXT_LENGTH {
            self.report(
                path,
                format!("{path} length ({length}) exceeds {MAX_TEXT_LENGTH} characters"),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validate(document: Value) -> ValidationReport {
        FlexValidator::new().validate(&document)
    }

    fn valid_bubble() -> Value {
        json!({
            "type": "bubble",
            "body": {
                "type": "box",
                "layout": "vertical",
                "contents": [
                    { "type": "text", "text": "Hello", "size": "sm", "color": "#333333" },
                    { "type": "separator" },
                    {
                        "type": "button",
                        "style": "link",
                        "action": { "type": "uri", "label": "Open", "uri": "https://example.com" }
                    }
                ]
            }
        })
    }

    #[test]
    fn accepts_valid_flex_message() {
        let report = validate(json!({
            "type": "flex",
            "altText": "Hello",
            "contents": valid_bubble(),
        }));
        assert!(report.is_valid(), "{:?}", report.messages());
    }

    #[test]
    fn root_type_rules() {
        assert_eq!(
            validate(json!({})).messages(),
            vec!["Root message must have a type"]
        );
        assert_eq!(
            validate(json!({"type": "card"})).messages(),
            vec![r#"Root type must be "flex", "bubble", or "carousel""#]
        );
        assert!(!FlexValidator::new().is_valid(&json!([1, 2])));
    }

    #[test]
    fn rejects_diagonal_layout() {
        let report = validate(json!({
            "type": "bubble",
            "body": { "type": "box", "layout": "diagonal", "contents": [] }
        }));
        assert_eq!(report.len(), 1);
        assert!(report.mentions("layout must be one of: vertical, horizontal, baseline"));
        assert_eq!(report.violations[0].path, "bubble.body.layout");
    }

    #[test]
    fn flex_message_rules_are_all_reported() {
        let report = validate(json!({ "type": "flex", "altText": "   " }));
        assert_eq!(
            report.messages(),
            vec!["altText cannot be empty", "contents is required"]
        );

        let long = "a".repeat(ALT_TEXT_LIMIT + 1);
        let report = validate(json!({
            "type": "flex",
            "altText": long,
            "contents": { "type": "message" }
        }));
        assert!(report.mentions("altText must be 400 characters or less"));
        assert!(report.mentions(r#"contents.type must be "bubble" or "carousel""#));

        let report = validate(json!({ "type": "flex", "contents": {} }));
        assert!(report.mentions("altText is required"));
        assert!(report.mentions("contents.type is required"));
    }

    #[test]
    fn bubble_needs_body_or_hero() {
        let report = validate(json!({ "type": "bubble", "size": "huge" }));
        assert_eq!(
            report.messages(),
            vec![
                "bubble.size must be one of: nano, micro, kilo, mega, giga",
                "bubble.body or bubble.hero is required",
            ]
        );
    }

    #[test]
    fn separator_footer_is_exempt() {
        let mut bubble = valid_bubble();
        bubble["footer"] = json!({ "separator": true });
        assert!(validate(bubble.clone()).is_valid());
        bubble["footer"] = json!({ "separator": false });
        assert!(validate(bubble).mentions("bubble.footer.type is required"));
    }

    #[test]
    fn oversized_bubble_is_reported() {
        let text = "x".repeat(MAX_TEXT_LENGTH);
        let contents: Vec<Value> = (0..6)
            .map(|_| json!({ "type": "text", "text": text }))
            .collect();
        let report = validate(json!({
            "type": "bubble",
            "body": { "type": "box", "layout": "vertical", "contents": contents }
        }));
        assert_eq!(report.len(), 1);
        assert!(report.mentions("exceeds 10240 byte limit"));
    }

    #[test]
    fn carousel_rules() {
        let report = validate(json!({ "type": "carousel" }));
        assert_eq!(report.messages(), vec!["carousel.contents is required"]);

        let report = validate(json!({ "type": "carousel", "contents": {} }));
        assert_eq!(report.messages(), vec!["carousel.contents must be an array"]);

        let report = validate(json!({ "type": "carousel", "contents": [] }));
        assert_eq!(
            report.messages(),
            vec!["carousel must contain at least 1 bubble"]
        );

        let bubbles: Vec<Value> = (0..11).map(|_| valid_bubble()).collect();
        let report = validate(json!({ "type": "carousel", "contents": bubbles }));
        assert_eq!(
            report.messages(),
            vec!["carousel contains 11 bubbles, maximum is 10"]
        );

        let report = validate(json!({
            "type": "carousel",
            "contents": [valid_bubble(), "nope", { "type": "box" }]
        }));
        assert_eq!(
            report.messages(),
            vec![
                "carousel.contents[1] must be an object",
                r#"carousel.contents[2].type must be "bubble""#,
            ]
        );
    }

    #[test]
    fn nested_carousel_bubbles_use_indexed_paths() {
        let report = validate(json!({
            "type": "flex",
            "altText": "x",
            "contents": {
                "type": "carousel",
                "contents": [
                    { "type": "bubble", "body": { "type": "box", "layout": "vertical" } }
                ]
            }
        }));
        assert_eq!(
            report.messages(),
            vec!["contents.contents[0].body.contents is required"]
        );
    }

    #[test]
    fn container_type_rules() {
        let report = validate(json!({
            "type": "bubble",
            "body": {
                "type": "box",
                "layout": "vertical",
                "spacing": "huge",
                "contents": [{ "type": "video" }, { "text": "no type" }, 7]
            }
        }));
        assert_eq!(
            report.messages(),
            vec![
                r#"bubble.body.contents[0].type "video" is not supported"#,
                "bubble.body.contents[1].type is required",
                "bubble.body.contents[2] must be an object",
                "bubble.body.spacing must be one of: none, xs, sm, md, lg, xl, xxl",
            ]
        );
    }

    #[test]
    fn text_rules() {
        let long = "é".repeat(MAX_TEXT_LENGTH + 1);
        let report = validate(json!({
            "type": "bubble",
            "body": {
                "type": "box",
                "layout": "vertical",
                "contents": [
                    { "type": "text" },
                    { "type": "text", "text": long, "size": "huge", "weight": "light", "color": "teal" },
                    {
                        "type": "text",
                        "contents": [
                            { "type": "span", "text": "ok" },
                            { "type": "chunk", "text": "x" },
                            { "type": "span" },
                            "plain"
                        ],
                        "action": { "type": "uri", "uri": "not a url" }
                    }
                ]
            }
        }));
        let path = "bubble.body.contents";
        assert_eq!(
            report.messages(),
            vec![
                format!("{path}[0].text or {path}[0].contents is required"),
                format!("{path}[1].text length (2001) exceeds 2000 characters"),
                format!(
                    "{path}[1].size must be one of: xxs, xs, sm, md, lg, xl, xxl, 3xl, 4xl, 5xl"
                ),
                format!(r#"{path}[1].weight must be "regular" or "bold""#),
                format!("{path}[1].color must be a valid color code"),
                format!(r#"{path}[2].contents[1].type must be "span""#),
                format!("{path}[2].contents[2].text is required"),
                format!("{path}[2].action.uri must be a valid URL"),
            ]
        );
    }

    #[test]
    fn image_icon_button_and_action_rules() {
        let report = validate(json!({
            "type": "bubble",
            "hero": { "type": "image", "url": "relative.png", "aspectRatio": "wide" },
            "body": {
                "type": "box",
                "layout": "baseline",
                "contents": [
                    { "type": "icon", "size": "giant" },
                    { "type": "button", "style": "fancy" },
                    { "type": "button", "action": { "type": "message" } },
                    { "type": "button", "action": { "type": "postback" } },
                    { "type": "button", "action": { "type": "camera" } },
                    { "type": "button", "action": { "type": "uri", "uri": "https://example.com" } }
                ]
            }
        }));
        let path = "bubble.body.contents";
        assert_eq!(
            report.messages(),
            vec![
                format!("{path}[0].url is required"),
                format!(
                    "{path}[0].size must be one of: xxs, xs, sm, md, lg, xl, xxl, 3xl, 4xl, 5xl"
                ),
                format!("{path}[1].action is required"),
                format!("{path}[1].style must be one of: primary, secondary, link"),
                format!("{path}[2].action.text is required"),
                format!("{path}[3].action.data is required"),
                format!(r#"{path}[4].action.type "camera" is not supported"#),
                "bubble.hero.url must be a valid URL".to_string(),
                r#"bubble.hero.aspectRatio must be in format "width:height""#.to_string(),
            ]
        );
    }

    #[test]
    fn validate_str_separates_input_errors() {
        let validator = FlexValidator::new();
        assert!(matches!(
            validator.validate_str("{not json"),
            Err(FlexError::Json(_))
        ));
        let bubble = r#"{"type":"bubble","body":{"type":"box","layout":"vertical","contents":[]}}"#;
        let report = validator.validate_str(bubble).expect("parse");
        assert!(report.is_valid());
    }

    #[test]
    fn violations_display_their_message() {
        let violation = Violation::new("bubble.body", "bubble.body.type is required");
        assert_eq!(violation.to_string(), "bubble.body.type is required");
        let report = ValidationReport {
            violations: vec![violation],
        };
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["violations"][0]["path"], "bubble.body");
    }
}
