//! A small, owned markup tree for HTML and SVG documents.
//!
//! Trees are built programmatically or parsed from text that is "mostly"
//! well-formed: the HTML GitHub renders for READMEs and the plain SVG
//! written by Inkscape both qualify.

mod node;
mod parse;

pub use node::{is_void, Attr, Element, Node};
pub use parse::{parse_element, parse_fragment, parse_wrapped, replace_all};
