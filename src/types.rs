use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const BUNDLE_SUFFIX: &str = "Bundle";

/// A bundle name that always ends in `Bundle`.
///
/// `Catalog` and `CatalogBundle` name the same bundle; the suffix is appended on
/// construction when it is missing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BundleName(String);

impl BundleName {
    pub fn new(raw: impl Into<String>) -> Self {
        let mut raw = raw.into();
        if !raw.ends_with(BUNDLE_SUFFIX) {
            raw.push_str(BUNDLE_SUFFIX);
        }
        Self(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BundleName {
    fn default() -> Self {
        Self::new("App")
    }
}

impl fmt::Display for BundleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for BundleName {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for BundleName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for BundleName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl Serialize for BundleName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for BundleName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::new(raw))
    }
}

/// Which answer to the "add route" prompt leads to the route being appended.
///
/// Schema creation always proceeds on yes. Earlier releases of the bundle command
/// appended the route on a *no* answer to the same default-yes question; that reading is
/// kept selectable as `AppendOnNo` for projects that scripted against it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutePromptPolarity {
    #[default]
    AppendOnYes,
    AppendOnNo,
}

impl RoutePromptPolarity {
    pub fn should_append(self, answer: bool) -> bool {
        match self {
            RoutePromptPolarity::AppendOnYes => answer,
            RoutePromptPolarity::AppendOnNo => !answer,
        }
    }
}
