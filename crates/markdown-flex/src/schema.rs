//! Fixed limits and value sets of the LINE Flex Message format.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Maximum serialized size of a single bubble, in bytes.
pub const BUBBLE_LIMIT: usize = 10_240;
/// Maximum serialized size of a carousel, in bytes.
pub const CAROUSEL_LIMIT: usize = 51_200;
/// Maximum number of bubbles in a carousel.
pub const MAX_BUBBLES: usize = 10;
/// Maximum alt text length, in code points.
pub const ALT_TEXT_LIMIT: usize = 400;
/// Maximum length of any single text value, in code points.
pub const MAX_TEXT_LENGTH: usize = 2_000;

pub const ELLIPSIS: &str = "...";

pub const BUBBLE_SIZES: &[&str] = &["nano", "micro", "kilo", "mega", "giga"];
pub const BOX_LAYOUTS: &[&str] = &["vertical", "horizontal", "baseline"];
pub const SPACINGS: &[&str] = &["none", "xs", "sm", "md", "lg", "xl", "xxl"];
pub const TEXT_SIZES: &[&str] = &[
    "xxs", "xs", "sm", "md", "lg", "xl", "xxl", "3xl", "4xl", "5xl",
];
pub const TEXT_WEIGHTS: &[&str] = &["regular", "bold"];
pub const BUTTON_STYLES: &[&str] = &["primary", "secondary", "link"];
pub const NAMED_COLORS: &[&str] = &[
    "white", "black", "red", "green", "blue", "yellow", "orange", "purple", "pink", "gray",
];

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#[0-9a-fA-F]{6}([0-9a-fA-F]{2})?$").expect("hex color pattern")
});

static ASPECT_RATIO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+:\d+$").expect("aspect ratio pattern"));

/// Absolute URL check shared by the factory and the validator.
pub fn is_valid_url(value: &str) -> bool {
    Url::parse(value).is_ok()
}

pub fn is_valid_color(value: &str) -> bool {
    HEX_COLOR.is_match(value) || NAMED_COLORS.contains(&value.to_ascii_lowercase().as_str())
}

pub fn is_valid_aspect_ratio(value: &str) -> bool {
    ASPECT_RATIO.is_match(value)
}
