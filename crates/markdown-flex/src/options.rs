use crate::errors::FlexError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_LINES: usize = 18;

fn default_max_lines() -> usize {
    DEFAULT_MAX_LINES
}

/// Conversion options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConvertOptions {
    /// Render fenced code as an image. Not available yet; code always falls
    /// back to text rendering.
    #[serde(default)]
    pub code_img: bool,
    /// Line budget for the code image renderer.
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            code_img: false,
            max_lines: DEFAULT_MAX_LINES,
        }
    }
}

impl ConvertOptions {
    pub fn validate(&self) -> Result<(), FlexError> {
        if self.max_lines == 0 {
            return Err(FlexError::InvalidOptions(
                "max_lines must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse options from JSON and validate them.
    pub fn from_json_str(json: &str) -> Result<Self, FlexError> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }
}
