//! Bubble/carousel assembly and alt text derivation.

use crate::bubble::BubblePacker;
use crate::component::Component;
use crate::schema::{ALT_TEXT_LIMIT, CAROUSEL_LIMIT, MAX_BUBBLES};
use crate::size::{SizeMeter, collapse_whitespace, truncate_chars};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::warn;

/// Alt text used by [`FlexOutput::into_message`] when none was extracted.
pub const FALLBACK_ALT_TEXT: &str = "Flex Message";

/// Result of one conversion: the bubble or carousel plus its alt text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlexOutput {
    pub json: Value,
    pub alt_text: String,
}

impl FlexOutput {
    pub fn is_empty(&self) -> bool {
        self.json.as_object().is_some_and(Map::is_empty)
    }

    /// Number of bubbles in the output.
    pub fn bubble_count(&self) -> usize {
        match self.json.get("type").and_then(Value::as_str) {
            Some("bubble") => 1,
            Some("carousel") => self.json["contents"].as_array().map_or(0, Vec::len),
            _ => 0,
        }
    }

    /// Wrap the output as a complete `flex` message, or `None` when nothing
    /// was converted.
    pub fn into_message(self) -> Option<Value> {
        if self.is_empty() {
            return None;
        }
        let alt_text = if self.alt_text.is_empty() {
            FALLBACK_ALT_TEXT.to_string()
        } else {
            self.alt_text
        };
        Some(json!({
            "type": "flex",
            "altText": alt_text,
            "contents": self.json,
        }))
    }
}

/// Collects components and alt-text fragments for one conversion.
#[derive(Debug)]
pub struct CarouselAssembler {
    meter: SizeMeter,
    packer: BubblePacker,
    fragments: Vec<String>,
}

impl CarouselAssembler {
    pub fn new(meter: SizeMeter) -> Self {
        Self::with_packer(meter, BubblePacker::new(meter))
    }

    pub fn with_packer(meter: SizeMeter, packer: BubblePacker) -> Self {
        Self {
            meter,
            packer,
            fragments: Vec::new(),
        }
    }

    pub fn add_component(&mut self, component: Component) {
        self.packer.add(component);
    }

    pub fn add_plain_text(&mut self, fragment: impl Into<String>) {
        self.fragments.push(fragment.into());
    }

    pub fn build(self) -> FlexOutput {
        let alt_text = alt_text(&self.fragments);
        let mut bubbles = self.packer.into_bubbles();
        let json = match bubbles.len() {
            0 => Value::Object(Map::new()),
            1 => bubbles.remove(0),
            _ => {
                if bubbles.len() > MAX_BUBBLES {
                    warn!(
                        bubbles = bubbles.len(),
                        max = MAX_BUBBLES,
                        "too many bubbles; keeping the first ones"
                    );
                    bubbles.truncate(MAX_BUBBLES);
                }
                fit_carousel(&self.meter, bubbles)
            }
        };
        FlexOutput { json, alt_text }
    }
}

fn carousel(bubbles: Vec<Value>) -> Value {
    json!({ "type": "carousel", "contents": bubbles })
}

/// Drop trailing bubbles until the carousel fits, keeping at least one.
fn fit_carousel(meter: &SizeMeter, mut bubbles: Vec<Value>) -> Value {
    let empty_size = meter.json_size(&carousel(Vec::new()));
    let mut sizes: Vec<usize> = bubbles.iter().map(|b| meter.json_size(b)).collect();
    let measure = |sizes: &[usize]| {
        empty_size + sizes.iter().sum::<usize>() + sizes.len().saturating_sub(1)
    };
    let before = bubbles.len();
    while sizes.len() > 1 && measure(&sizes) > CAROUSEL_LIMIT {
        sizes.pop();
        bubbles.pop();
    }
    if bubbles.len() < before {
        warn!(
            dropped = before - bubbles.len(),
            kept = bubbles.len(),
            bytes = measure(&sizes),
            limit = CAROUSEL_LIMIT,
            "carousel over size limit; dropped trailing bubbles"
        );
    }
    carousel(bubbles)
}

/// Space-joined, whitespace-collapsed fragments capped at the alt text limit.
pub fn alt_text(fragments: &[String]) -> String {
    let joined = collapse_whitespace(&fragments.join(" "));
    truncate_chars(&joined, ALT_TEXT_LIMIT).0
}
