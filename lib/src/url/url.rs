use std::ops::Deref;
use std::borrow::Borrow;

pub use super::{UrlBuf, is_url_char};

#[derive(Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct Url(str);

impl Url {
    pub const fn new(from: &str) -> &Url {
        match Self::try_new(from) {
            Some(url) => url,
            None => panic!("invalid URL"),
        }
    }

    pub const fn try_new(from: &str) -> Option<&Url> {
        if !Self::is_valid_str(from) {
            return None;
        }

        Some(unsafe { &*(from as *const str as *const Url) })
    }

    pub const fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_url_buf(&self) -> UrlBuf {
        UrlBuf::from(self.0.to_owned())
    }

    /// ```rust
    /// use perch::url::Url;
    ///
    /// let url = Url::new("https://nerven.se");
    /// assert_eq!(url.scheme(), Some("https"));
    ///
    /// let url = Url::new("file:///srv/site");
    /// assert_eq!(url.scheme(), Some("file"));
    ///
    /// let url = Url::new("mailto:foo@bar.com");
    /// assert_eq!(url.scheme(), Some("mailto"));
    ///
    /// let url = Url::new("foo#bar:baz");
    /// assert_eq!(url.scheme(), None);
    ///
    /// let url = Url::new("/projects/alpha/");
    /// assert_eq!(url.scheme(), None);
    /// ```
    pub fn scheme(&self) -> Option<&str> {
        let bytes = self.as_bytes();
        match memchr::memchr3(b':', b'?', b'/', bytes) {
            Some(i) if bytes[i] == b':' => match memchr::memrchr(b'#', &bytes[..i]) {
                Some(_) => None,
                None => Some(&self[..i]),
            }
            _ => None,
        }
    }

    /// Whether this URL points into the local file system, in which case
    /// directory links must name their `index.html` explicitly.
    pub fn is_file(&self) -> bool {
        self.scheme().map_or(false, |s| s.eq_ignore_ascii_case("file"))
    }

    const fn is_valid_str(string: &str) -> bool {
        let mut i = 0;
        let bytes = string.as_bytes();
        while i < bytes.len() {
            if !is_url_char(&bytes[i]) {
                return false;
            }

            i += 1;
        }

        true
    }

    pub fn is_absolute(&self) -> bool {
        self.starts_with('/') || self.scheme().is_some()
    }
}

impl<'a> From<&'a str> for &'a Url {
    fn from(value: &'a str) -> Self {
        Url::new(value)
    }
}

impl Deref for Url {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl Borrow<str> for Url {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for Url {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<Url> for str {
    fn as_ref(&self) -> &Url {
        Url::new(self)
    }
}

impl AsRef<Url> for String {
    fn as_ref(&self) -> &Url {
        Url::new(self)
    }
}

impl AsRef<Url> for Url {
    fn as_ref(&self) -> &Url {
        self
    }
}

impl ToOwned for Url {
    type Owned = UrlBuf;

    fn to_owned(&self) -> Self::Owned {
        self.to_url_buf()
    }
}
