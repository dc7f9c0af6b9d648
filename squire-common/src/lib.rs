//! Common types and utilities shared across Squire crates.
//!
//! This crate defines the shared error type, the browser tag used to pick a
//! driver backend, and centralised observability helpers. It is intentionally
//! lightweight and dependency-minimal so that all crates can depend on it
//! without introducing heavy transitive costs.
//!
//! # Overview
//!
//! - [`BrowserKind`]: Which browser a driver session controls
//! - [`SquireError`] and [`Result`]: Shared error handling
//! - [`observability`]: Centralised tracing/logging initialisation
//!
//! # Examples
//!
//! Parsing a browser tag:
//!
//! ```rust
//! use squire_common::BrowserKind;
//!
//! let kind: BrowserKind = "firefox".parse().unwrap();
//! assert_eq!(kind, BrowserKind::Firefox);
//! assert!("safari".parse::<BrowserKind>().is_err());
//! ```
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub mod observability;

/// Browser tags Squire can resolve to a driver backend.
pub const SUPPORTED_BROWSERS: &[&str] = &["chrome", "firefox"];

/// Which browser a driver session controls.
///
/// Chrome sessions go through chromedriver and support native headless mode;
/// Firefox sessions go through geckodriver and simulate headless operation
/// with an off-screen X display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    #[default]
    Chrome,
    Firefox,
}

impl BrowserKind {
    /// The lowercase tag used in configuration and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            BrowserKind::Chrome => "chrome",
            BrowserKind::Firefox => "firefox",
        }
    }
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BrowserKind {
    type Err = SquireError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "chrome" => Ok(BrowserKind::Chrome),
            "firefox" => Ok(BrowserKind::Firefox),
            other => Err(SquireError::Config(format!(
                "browser `{other}` is not supported; available browsers are {}",
                SUPPORTED_BROWSERS.join(", ")
            ))),
        }
    }
}

/// Error types used across the Squire system.
#[derive(thiserror::Error, Debug)]
pub enum SquireError {
    /// A wait deadline elapsed before its condition became true. `condition`
    /// names the predicate or locator that never held.
    #[error("timeout after {waited:?} waiting for {condition}")]
    WaitTimeout { condition: String, waited: Duration },

    /// Configuration was incomplete or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The WebDriver session or its transport reported an error.
    #[error("driver error: {0}")]
    Driver(#[from] anyhow::Error),
}

/// Convenient alias for results that use [`SquireError`].
pub type Result<T> = std::result::Result<T, SquireError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn browser_tags_round_trip() {
        for kind in [BrowserKind::Chrome, BrowserKind::Firefox] {
            let parsed: BrowserKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn parsing_ignores_case() {
        assert_eq!("Chrome".parse::<BrowserKind>().unwrap(), BrowserKind::Chrome);
        assert_eq!("FIREFOX".parse::<BrowserKind>().unwrap(), BrowserKind::Firefox);
    }

    #[test]
    fn unsupported_browser_names_the_alternatives() {
        let err = "safari".parse::<BrowserKind>().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("safari"));
        assert!(message.contains("chrome"));
        assert!(message.contains("firefox"));
        assert!(matches!(err, SquireError::Config(_)));
    }

    #[test]
    fn timeout_message_carries_condition_and_budget() {
        let err = SquireError::WaitTimeout {
            condition: "presence of element `#login`".to_string(),
            waited: Duration::from_secs(2),
        };
        let message = err.to_string();
        assert!(message.contains("#login"));
        assert!(message.contains("2s"));
    }
}
