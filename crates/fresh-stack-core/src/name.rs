//! App name validation.
//!
//! The app name doubles as the project directory name and, for Flutter,
//! the last segment of the Android application id, so it is restricted
//! to ASCII letters, digits, `-` and `_`.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

static APP_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("app name pattern is valid"));

/// Message shown to the user when a name is rejected.
pub const APP_NAME_HINT: &str = "Use letters, numbers, dash or underscore only.";

/// The app name did not match `[a-zA-Z0-9_-]+`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid app name '{input}': {APP_NAME_HINT}")]
pub struct InvalidAppName {
    /// The rejected input.
    pub input: String,
}

/// A validated app name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AppName(String);

impl AppName {
    /// Validate `input` as an app name.
    pub fn parse(input: &str) -> Result<Self, InvalidAppName> {
        if APP_NAME_PATTERN.is_match(input) {
            Ok(Self(input.to_string()))
        } else {
            Err(InvalidAppName {
                input: input.to_string(),
            })
        }
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AppName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
