//! HTML to flow-document markup conversion.
//!
//! The pipeline is lexer → parser → transformer. The parser recovers from
//! any malformed input; the only errors are engine invariant violations.
//!
//! ```
//! use markup::{ConverterConfig, convert_html_to_markup};
//!
//! let config = ConverterConfig::default().with_namespace(None);
//! let xml = convert_html_to_markup("<p>Hello <b>world</b></p>", &config).unwrap();
//! assert_eq!(
//!     xml,
//!     "<FlowDocument xml:space=\"preserve\"><Paragraph>Hello <Run FontWeight=\"bold\">world</Run></Paragraph></FlowDocument>"
//! );
//! ```
pub mod clipboard;
pub mod config;
pub mod debug;
pub mod entities;
pub mod error;
pub mod lexer;
pub mod markup;
pub mod parser;
pub mod perf_fixtures;
pub mod schema;
pub mod style;
pub mod transform;

mod table;
mod types;

pub use crate::config::{ConverterConfig, OutputMode, PRESENTATION_NAMESPACE};
pub use crate::error::{ClipboardHeaderError, ConvertError, EngineInvariantError, UNRECOGNIZED_HEADER};
pub use crate::lexer::{HtmlLexer, tokenize};
pub use crate::markup::{MarkupContent, MarkupNode, MarkupTag};
pub use crate::parser::{HtmlParser, ParseStats, parse_html};
pub use crate::transform::{
    HtmlToMarkupConverter, convert_html_to_markup, convert_html_to_tree, convert_node_to_markup,
};
pub use crate::types::{Attributes, Node, Token, TokenKind, get_attribute};
