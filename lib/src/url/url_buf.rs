use std::fmt;
use std::ops::Deref;
use std::borrow::Borrow;

pub use super::{Url, encode_segment};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[repr(transparent)]
pub struct UrlBuf(String);

impl UrlBuf {
    pub fn new() -> UrlBuf {
        UrlBuf(String::new())
    }

    pub fn as_url(&self) -> &Url {
        Url::new(self.0.as_str())
    }

    /// ```rust
    /// use perch::url::UrlBuf;
    ///
    /// let mut url = UrlBuf::from("https://nerven.se");
    /// url.append("alpha/");
    /// assert_eq!(url.as_str(), "https://nerven.se/alpha/");
    ///
    /// url.append("/index.html");
    /// assert_eq!(url.as_str(), "https://nerven.se/alpha/index.html");
    ///
    /// url.append("https://github.com/Nerven");
    /// assert_eq!(url.as_str(), "https://github.com/Nerven");
    ///
    /// let mut url = UrlBuf::from("/");
    /// url.append("beta-tool");
    /// assert_eq!(url.as_str(), "/beta-tool");
    /// ```
    // FIXME: Deal with query and hash, in `self` and `url`.
    pub fn append<T: AsRef<Url>>(&mut self, url: T) -> &mut Self {
        let url = url.as_ref();
        if url.scheme().is_some() {
            *self = url.to_owned();
        } else {
            match (self.ends_with('/'), url.starts_with('/')) {
                (true, true) => self.0.push_str(&url[1..]),
                (true, false) | (false, true) => self.0.push_str(url),
                (false, false) => {
                    self.0.push('/');
                    self.0.push_str(url);
                }
            }
        }

        self
    }

    /// Appends `segment` as a single percent-encoded path segment.
    ///
    /// ```rust
    /// use perch::url::UrlBuf;
    ///
    /// let mut url = UrlBuf::from("/base");
    /// url.push_segment("My Tool").push_segment("x/y");
    /// assert_eq!(url.as_str(), "/base/My%20Tool/x%2Fy");
    /// ```
    pub fn push_segment(&mut self, segment: &str) -> &mut Self {
        let encoded = encode_segment(segment);
        if !self.ends_with('/') {
            self.0.push('/');
        }

        self.0.push_str(&encoded);
        self
    }

    /// Ensures the URL ends with a `/`.
    pub fn with_trailing_slash(&mut self) -> &mut Self {
        if !self.ends_with('/') {
            self.0.push('/');
        }

        self
    }
}

impl From<String> for UrlBuf {
    fn from(value: String) -> Self {
        Url::new(&value);
        UrlBuf(value)
    }
}

impl From<&str> for UrlBuf {
    fn from(value: &str) -> Self {
        Url::new(value).to_url_buf()
    }
}

impl From<&Url> for UrlBuf {
    fn from(value: &Url) -> Self {
        value.to_url_buf()
    }
}

impl Deref for UrlBuf {
    type Target = Url;

    fn deref(&self) -> &Self::Target {
        self.as_url()
    }
}

impl AsRef<Url> for UrlBuf {
    fn as_ref(&self) -> &Url {
        self.as_url()
    }
}

impl Borrow<Url> for UrlBuf {
    fn borrow(&self) -> &Url {
        self.as_url()
    }
}

impl AsRef<str> for UrlBuf {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for UrlBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<UrlBuf> for String {
    fn from(value: UrlBuf) -> Self {
        value.0
    }
}
