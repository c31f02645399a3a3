//! Serialized data formats and the stylesheet compiler.

use std::fs;
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Chainable, ErrorDetail, Result};

pub trait Format: Sized {
    /// The format's deserialization error type.
    type Error: ErrorDetail + 'static;

    /// The format's serialization error type.
    type SerError: ErrorDetail + 'static;

    /// The name used in error messages.
    const NAME: &'static str;

    fn from_str<T: DeserializeOwned>(string: &str) -> Result<T, Self::Error>;

    fn to_string<T: Serialize>(value: &T) -> Result<String, Self::SerError>;

    /// Reads and parses the whole file at `path`.
    fn read<T: DeserializeOwned>(path: &Path) -> Result<T> {
        let string = fs::read_to_string(path).chain_with(|| error! {
            "failed to open file for reading",
            "file path" => path.display(),
        })?;

        Self::from_str(&string).chain_with(|| error! {
            format!("{} deserialization failed", Self::NAME),
            "file path" => path.display(),
        })
    }

    /// Serializes `value` and overwrites the file at `path` with it.
    fn write<T: Serialize>(path: &Path, value: &T) -> Result<()> {
        let string = Self::to_string(value).chain_with(|| error! {
            format!("{} serialization failed", Self::NAME),
            "file path" => path.display(),
        })?;

        fs::write(path, string).chain_with(|| error! {
            "failed to open/create file for writing",
            "file path" => path.display(),
        })
    }
}

macro_rules! impl_format {
    ($name:ident ($display:literal) : $de:expr, $ser:expr, $E:ty, $S:ty) => (
        #[derive(Debug, Default, Clone, Copy)]
        pub struct $name;

        impl Format for $name {
            type Error = $E;
            type SerError = $S;

            const NAME: &'static str = $display;

            fn from_str<T: DeserializeOwned>(s: &str) -> Result<T, $E> {
                $de(s)
            }

            fn to_string<T: Serialize>(value: &T) -> Result<String, $S> {
                $ser(value)
            }
        }
    );
}

impl_format!(Toml ("TOML"): toml::from_str, toml::to_string, toml::de::Error, toml::ser::Error);
impl_format!(Json ("JSON"): serde_json::from_str, serde_json::to_string, serde_json::Error, serde_json::Error);

/// Compiles SCSS into CSS.
#[cfg(feature = "sass")]
#[derive(Debug)]
pub struct Grass {
    options: grass::Options<'static>,
}

#[cfg(feature = "sass")]
impl Default for Grass {
    fn default() -> Self {
        Grass { options: grass::Options::default().style(grass::OutputStyle::Compressed) }
    }
}

#[cfg(feature = "sass")]
impl Grass {
    pub fn compile(&self, scss: &str) -> Result<String> {
        grass::from_string(scss, &self.options)
            .map_err(|e| error!("failed to render sass as css", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Point { x: u32, label: Option<String> }

    #[test]
    fn json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("point.json");
        let point = Point { x: 7, label: None };

        Json::write(&path, &point).unwrap();
        assert_eq!(Json::read::<Point>(&path).unwrap(), point);
    }

    #[test]
    fn bad_json_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let error = Json::read::<Point>(&path).unwrap_err();
        assert_eq!(error.message(), "JSON deserialization failed");
        assert!(error.to_string().contains("broken.json"));
    }

    #[cfg(feature = "sass")]
    #[test]
    fn grass_compresses() {
        let css = Grass::default().compile("$c: #248400; a { b { color: $c; } }").unwrap();
        assert_eq!(css.trim(), "a b{color:#248400}");
    }
}
