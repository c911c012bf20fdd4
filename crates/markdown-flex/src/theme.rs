use serde::{Deserialize, Serialize};
use std::env;

/// Named theme presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeName {
    #[default]
    Default,
    Dark,
}

impl ThemeName {
    /// Parse a theme name (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "default" | "light" => Some(Self::Default),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    /// Reads the theme from `MARKDOWN_FLEX_THEME`.
    pub fn from_env() -> Self {
        env::var("MARKDOWN_FLEX_THEME")
            .ok()
            .and_then(|value| Self::parse(&value))
            .unwrap_or_default()
    }

    pub fn theme(self) -> Theme {
        match self {
            ThemeName::Default => Theme::standard(),
            ThemeName::Dark => Theme::dark(),
        }
    }
}

/// Sizes and colors applied by the component factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub heading_sizes: [String; 6],
    pub heading_fallback_size: String,
    pub heading_weight: String,
    pub text_size: String,
    pub code_size: String,
    pub quote_background: String,
    pub image_ratio: String,
}

impl Theme {
    pub fn standard() -> Self {
        Self {
            heading_sizes: ["xxl", "xl", "lg", "md", "sm", "xs"].map(String::from),
            heading_fallback_size: "md".into(),
            heading_weight: "bold".into(),
            text_size: "sm".into(),
            code_size: "xs".into(),
            quote_background: "#F6F8FA".into(),
            image_ratio: "20:13".into(),
        }
    }

    pub fn dark() -> Self {
        Self {
            quote_background: "#2D3748".into(),
            ..Self::standard()
        }
    }

    /// Text size for a heading level; levels outside 1..=6 use the fallback.
    pub fn heading_size(&self, level: u8) -> &str {
        match level {
            1..=6 => &self.heading_sizes[usize::from(level) - 1],
            _ => &self.heading_fallback_size,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::standard()
    }
}
