//! Owned and borrowed URL strings for building links between pages.

mod url;
mod url_buf;
mod validate;

pub use url::Url;
pub use url_buf::UrlBuf;
pub use validate::{is_url_char, encode_segment};
