//! Greedy first-fit packing of components into bubbles.

use crate::component::Component;
use crate::schema::BUBBLE_LIMIT;
use crate::size::SizeMeter;
use serde_json::{Value, json};
use tracing::{debug, warn};

/// `{type: bubble, body: {type: box, layout: vertical, contents}}`.
pub fn bubble(contents: Vec<Value>) -> Value {
    json!({
        "type": "bubble",
        "body": {
            "type": "box",
            "layout": "vertical",
            "contents": contents,
        },
    })
}

/// Packs components into bubbles without reordering them.
///
/// Sizes are tracked incrementally: a bubble holding `n` components
/// serializes to the empty bubble plus every component plus `n - 1` commas.
#[derive(Debug)]
pub struct BubblePacker {
    meter: SizeMeter,
    limit: usize,
    empty_size: usize,
    current: Vec<Value>,
    current_size: usize,
    bubbles: Vec<Value>,
}

impl BubblePacker {
    pub fn new(meter: SizeMeter) -> Self {
        Self::with_limit(meter, BUBBLE_LIMIT)
    }

    pub fn with_limit(meter: SizeMeter, limit: usize) -> Self {
        Self {
            empty_size: meter.json_size(&bubble(Vec::new())),
            meter,
            limit,
            current: Vec::new(),
            current_size: 0,
            bubbles: Vec::new(),
        }
    }

    /// Append `component`, sealing the open bubble first when the component
    /// would push it over the limit.
    pub fn add(&mut self, component: Component) {
        let size = self.meter.json_size(&component);
        if !self.current.is_empty() && self.size_with(size) > self.limit {
            self.flush();
        }
        if self.current.is_empty() && self.size_with(size) > self.limit {
            warn!(
                component_bytes = size,
                limit = self.limit,
                "single component exceeds the bubble limit; keeping it in its own bubble"
            );
        }
        self.current.push(component.into_value());
        self.current_size += size;
    }

    /// Seal the open component list into a bubble.
    pub fn flush(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let contents = std::mem::take(&mut self.current);
        debug!(
            components = contents.len(),
            bytes = self.open_size(contents.len()),
            "bubble sealed"
        );
        self.current_size = 0;
        self.bubbles.push(bubble(contents));
    }

    /// Sealed bubbles, after flushing any open list.
    pub fn bubbles(&mut self) -> &[Value] {
        self.flush();
        &self.bubbles
    }

    pub fn into_bubbles(mut self) -> Vec<Value> {
        self.flush();
        self.bubbles
    }

    fn size_with(&self, component_size: usize) -> usize {
        self.open_size(self.current.len() + 1) + component_size
    }

    fn open_size(&self, count: usize) -> usize {
        self.empty_size + self.current_size + count.saturating_sub(1)
    }
}
