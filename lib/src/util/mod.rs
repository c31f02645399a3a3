mod macros;

pub use macros::*;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Encodes `data` as a `data:` URI with the given media type.
///
/// ```rust
/// use perch::util::data_uri;
///
/// assert_eq!(data_uri("text/plain", b"hi"), "data:text/plain;base64,aGk=");
/// ```
pub fn data_uri(mime: &str, data: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(data))
}

/// Returns `true` if `bytes` is empty or only whitespace.
pub fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(|b| b.is_ascii_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_output() {
        assert!(is_blank(b""));
        assert!(is_blank(b" \n\t"));
        assert!(!is_blank(b" M index.html\n"));
    }
}
