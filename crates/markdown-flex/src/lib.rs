//! Markdown to LINE Flex Message conversion.
//!
//! Markdown is parsed into a [`DocumentNode`] tree, each block is mapped to a
//! Flex component, and components are packed greedily into bubbles under the
//! 10 KB bubble limit and into a carousel under the 50 KB / 10 bubble limits.
//! [`FlexValidator`] checks any Flex document, converted or not, against the
//! same limits and the component schema.
//!
//! ```
//! use markdown_flex::{FlexValidator, MarkdownFlexConverter};
//!
//! let output = MarkdownFlexConverter::new().convert("# Hello World");
//! assert_eq!(output.alt_text, "Hello World");
//!
//! let message = output.into_message().expect("non-empty");
//! assert!(FlexValidator::new().is_valid(&message));
//! ```

pub mod ast;
pub mod bubble;
pub mod carousel;
pub mod component;
pub mod converter;
pub mod errors;
pub mod options;
pub mod parser;
pub mod schema;
pub mod size;
pub mod theme;
pub mod validator;
pub mod walker;

pub use ast::{Alignment, DocumentNode, NodeKind};
pub use bubble::BubblePacker;
pub use carousel::{CarouselAssembler, FlexOutput};
pub use component::{Component, ComponentFactory};
pub use converter::MarkdownFlexConverter;
pub use errors::FlexError;
pub use options::ConvertOptions;
pub use parser::{CommonMarkParser, MarkdownParser};
pub use size::SizeMeter;
pub use theme::{Theme, ThemeName};
pub use validator::{FlexValidator, ValidationReport, Violation};
pub use walker::TreeWalker;
