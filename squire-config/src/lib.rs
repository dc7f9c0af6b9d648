//! Loader for Squire configuration with TOML + environment overlays.
//!
//! A `squire.toml` file supplies driver defaults (browser, WebDriver
//! endpoints, wait timing, session options); `SQUIRE_`-prefixed environment
//! variables override individual keys, and `${VAR}` placeholders inside
//! values are expanded before the typed config is materialised.
use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use serde_json::Value;

use squire_common::BrowserKind;

const MAX_ENV_EXPANSION_DEPTH: usize = 8;

/// Typed view of `squire.toml` plus environment overrides.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SquireConfig {
    /// Browser used when the caller doesn't name one.
    pub default_browser: BrowserKind,
    pub webdriver: WebdriverEndpoints,
    pub wait: WaitDefaults,
    pub session: SessionDefaults,
}

/// Where the chromedriver/geckodriver services listen.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebdriverEndpoints {
    pub chrome_url: String,
    pub firefox_url: String,
}

impl Default for WebdriverEndpoints {
    fn default() -> Self {
        Self {
            chrome_url: "http://localhost:9515".to_string(),
            firefox_url: "http://localhost:4444".to_string(),
        }
    }
}

/// Default wait budget and poll interval for element waits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WaitDefaults {
    pub timeout_secs: u64,
    pub poll_ms: u64,
}

impl Default for WaitDefaults {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            poll_ms: 100,
        }
    }
}

impl WaitDefaults {
    pub fn time_to_wait(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn time_step(&self) -> Duration {
        Duration::from_millis(self.poll_ms)
    }
}

/// Per-session browser options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionDefaults {
    /// Run without a visible window.
    pub headless: bool,
    /// Render images; turning this off speeds up scraping runs.
    pub load_images: bool,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            headless: false,
            load_images: true,
            window_width: 1024,
            window_height: 768,
        }
    }
}

fn expand_env_in_value(value: &mut Value) {
    match value {
        Value::String(s) if s.contains('$') => *s = expand_str(s),
        Value::Array(items) => items.iter_mut().for_each(expand_env_in_value),
        Value::Object(map) => map.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

// Depth-capped so `A=${B}`, `B=${A}` cycles terminate. Unknown variables are
// left in place rather than erroring.
fn expand_str(raw: &str) -> String {
    let mut current = raw.to_string();
    for _ in 0..MAX_ENV_EXPANSION_DEPTH {
        let expanded = match shellexpand::env(&current) {
            Ok(cow) => cow.into_owned(),
            Err(_) => current.clone(),
        };
        if expanded == current {
            break;
        }
        current = expanded;
    }
    current
}

/// Builder hiding the `config` crate wiring (TOML file + env overrides).
pub struct SquireConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for SquireConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SquireConfigLoader {
    /// Start with sensible defaults: `SQUIRE_`-prefixed environment overrides
    /// with `__` separating nested keys (`SQUIRE_SESSION__HEADLESS=true`).
    ///
    /// ```
    /// use squire_config::SquireConfigLoader;
    ///
    /// let config = SquireConfigLoader::new().load().expect("defaults load");
    /// assert_eq!(config.wait.timeout_secs, 10);
    /// assert!(config.session.load_images);
    /// ```
    pub fn new() -> Self {
        let builder = Config::builder().add_source(
            Environment::with_prefix("SQUIRE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );
        Self { builder }
    }

    /// Attach a config file that must exist.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self.builder.add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a config file that may be absent, so deployments can rely
    /// purely on environment variables.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline TOML snippet; used by tests and the CLI.
    ///
    /// ```
    /// use squire_common::BrowserKind;
    /// use squire_config::SquireConfigLoader;
    ///
    /// let config = SquireConfigLoader::new()
    ///     .with_toml_str(
    ///         r#"
    /// default_browser = "firefox"
    ///
    /// [session]
    /// headless = true
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.default_browser, BrowserKind::Firefox);
    /// assert!(config.session.headless);
    /// assert_eq!(config.session.window_width, 1024);
    /// ```
    pub fn with_toml_str(mut self, toml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(toml, FileFormat::Toml));
        self
    }

    /// Consume the builder and deserialize the merged sources, expanding
    /// `${VAR}` placeholders in string values along the way.
    pub fn load(self) -> Result<SquireConfig, ConfigError> {
        let merged = self.builder.build()?;

        let mut raw: Value = merged.try_deserialize()?;
        expand_env_in_value(&mut raw);

        serde_json::from_value(raw).map_err(|e| ConfigError::Message(e.to_string()))
    }
}
