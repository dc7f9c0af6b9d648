//! Driver lifecycle: session construction, bound helpers, shutdown.

use std::future::Future;
use std::path::PathBuf;

use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::json;
use tracing::{debug, info};
use webdriver::capabilities::Capabilities;

use squire_common::{BrowserKind, Result, SquireError};
use squire_config::SquireConfig;

use crate::squire_browser::display::{self, VirtualDisplay};
use crate::squire_browser::page;
use crate::squire_browser::wait::{self, WaitConfig};

/// Default chromedriver endpoint.
pub const CHROMEDRIVER_URL: &str = "http://localhost:9515";

/// Default geckodriver endpoint.
pub const GECKODRIVER_URL: &str = "http://localhost:4444";

/// Options applied when building a driver session.
#[derive(Debug, Clone)]
pub struct DriverOptions {
    /// WebDriver service endpoint; `None` picks the per-browser default.
    pub webdriver_url: Option<String>,
    /// Browser binary to launch; `None` lets the WebDriver service pick.
    pub browser_binary: Option<PathBuf>,
    /// Run without a visible window. Native for Chrome; simulated with an
    /// Xvfb display for Firefox.
    pub run_headless: bool,
    /// Render images. Turning this off speeds up scraping runs.
    pub load_images: bool,
    pub window_size: (u32, u32),
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            webdriver_url: None,
            browser_binary: None,
            run_headless: false,
            load_images: true,
            window_size: (1024, 768),
        }
    }
}

impl DriverOptions {
    /// Session options from loaded configuration, endpoint included.
    pub fn from_config(kind: BrowserKind, config: &SquireConfig) -> Self {
        let endpoint = match kind {
            BrowserKind::Chrome => &config.webdriver.chrome_url,
            BrowserKind::Firefox => &config.webdriver.firefox_url,
        };
        Self {
            webdriver_url: Some(endpoint.clone()),
            browser_binary: None,
            run_headless: config.session.headless,
            load_images: config.session.load_images,
            window_size: (config.session.window_width, config.session.window_height),
        }
    }
}

/// A WebDriver session plus every helper bound to it.
///
/// The driver exclusively owns its client; sessions are never shared between
/// wrappers. Dropping without [`shut_down`](Self::shut_down) leaks the
/// remote session (and any Xvfb display dies with its own `Drop`).
#[derive(Debug)]
pub struct SquireDriver {
    client: Client,
    display: Option<VirtualDisplay>,
    kind: BrowserKind,
    wait_config: WaitConfig,
}

impl SquireDriver {
    /// Build a session against the WebDriver service for `kind`.
    ///
    /// For Firefox with `run_headless`, the off-screen display is started
    /// before the session so the browser can bind to it, and stays attached
    /// to the driver for teardown.
    pub async fn launch(kind: BrowserKind, options: DriverOptions) -> Result<Self> {
        let mut display = None;
        let caps = match kind {
            BrowserKind::Chrome => chrome_capabilities(&options),
            BrowserKind::Firefox => {
                if options.run_headless {
                    let (width, height) = options.window_size;
                    display = Some(VirtualDisplay::start(width, height)?);
                }
                firefox_capabilities(&options, display.as_ref().map(VirtualDisplay::display_env))
            }
        };

        let endpoint = options
            .webdriver_url
            .clone()
            .unwrap_or_else(|| default_endpoint(kind).to_string());
        url::Url::parse(&endpoint).map_err(|e| {
            SquireError::Config(format!("invalid WebDriver endpoint `{endpoint}`: {e}"))
        })?;

        info!(
            target: "browser.driver",
            browser = %kind,
            %endpoint,
            headless = options.run_headless,
            "starting driver session"
        );

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&endpoint)
            .await
            .map_err(anyhow::Error::from)?;

        Ok(Self {
            client,
            display,
            kind,
            wait_config: WaitConfig::default(),
        })
    }

    /// [`launch`](Self::launch) from a string tag. Unknown tags fail with a
    /// configuration error listing the supported browsers.
    pub async fn launch_named(tag: &str, options: DriverOptions) -> Result<Self> {
        let kind: BrowserKind = tag.parse()?;
        Self::launch(kind, options).await
    }

    /// Replace the default wait timing used by the element-wait methods.
    pub fn with_wait_config(mut self, wait_config: WaitConfig) -> Self {
        self.wait_config = wait_config;
        self
    }

    pub fn kind(&self) -> BrowserKind {
        self.kind
    }

    pub fn wait_config(&self) -> WaitConfig {
        self.wait_config
    }

    /// The underlying client, for operations squire doesn't wrap.
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub async fn goto(&self, url: &str) -> Result<()> {
        self.client.goto(url).await.map_err(anyhow::Error::from)?;
        Ok(())
    }

    pub async fn title(&self) -> Result<String> {
        let title = self.client.title().await.map_err(anyhow::Error::from)?;
        Ok(title)
    }

    /// Scroll the current page to the bottom.
    pub async fn scroll(&self) -> Result<()> {
        page::scroll(&self.client).await
    }

    /// Scroll `element` to its own bottom.
    pub async fn scroll_element(&self, element: &Element) -> Result<()> {
        page::scroll_element(&self.client, element).await
    }

    /// Click the element matching `locator`.
    pub async fn click_on_element(&self, locator: Locator<'_>) -> Result<()> {
        page::click_on_element(&self.client, locator).await
    }

    /// Type `text` into the field matching `locator`.
    pub async fn populate_text_field(&self, locator: Locator<'_>, text: &str) -> Result<()> {
        page::populate_text_field(&self.client, locator, text).await
    }

    /// Whether `locator` matches within the default wait budget; timeouts
    /// become `false`.
    pub async fn element_is_present(&self, locator: Locator<'_>) -> bool {
        page::element_is_present(&self.client, locator, self.wait_config).await
    }

    /// Wait until `locator` matches an element, visible or not.
    pub async fn wait_for_element_present(&self, locator: Locator<'_>) -> Result<()> {
        page::wait_for_element_present(&self.client, locator, self.wait_config).await
    }

    /// Wait until `locator` matches a displayed, enabled element.
    pub async fn wait_for_element_clickable(&self, locator: Locator<'_>) -> Result<()> {
        page::wait_for_element_clickable(&self.client, locator, self.wait_config).await
    }

    /// Wait on an arbitrary predicate with the driver's wait timing.
    pub async fn wait_until<F, Fut>(&self, predicate: F, description: &str) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        wait::wait_until_true(predicate, self.wait_config, description).await
    }

    /// Close the session and release the attached display, if any.
    ///
    /// Display teardown is the one error deliberately swallowed here: a
    /// session without a display releases `None` (a no-op), and a display
    /// that fails to stop cannot un-close the already-closed session, so it
    /// is logged by the release path instead of reported.
    pub async fn shut_down(self) -> Result<()> {
        let Self {
            client,
            display,
            kind,
            ..
        } = self;

        debug!(target: "browser.driver", browser = %kind, "closing driver session");
        client.close().await.map_err(anyhow::Error::from)?;
        display::release_display(display);
        Ok(())
    }
}

fn default_endpoint(kind: BrowserKind) -> &'static str {
    match kind {
        BrowserKind::Chrome => CHROMEDRIVER_URL,
        BrowserKind::Firefox => GECKODRIVER_URL,
    }
}

fn chrome_capabilities(options: &DriverOptions) -> Capabilities {
    let (width, height) = options.window_size;
    let mut args = vec![format!("--window-size={width},{height}")];
    if options.run_headless {
        args.push("--headless".to_string());
        args.push("--disable-gpu".to_string());
    }

    let mut chrome_opts = serde_json::Map::new();
    chrome_opts.insert("args".to_string(), json!(args));
    if !options.load_images {
        chrome_opts.insert(
            "prefs".to_string(),
            json!({ "profile.managed_default_content_settings.images": 2 }),
        );
    }
    if let Some(binary) = &options.browser_binary {
        chrome_opts.insert("binary".to_string(), json!(binary));
    }

    let mut caps = Capabilities::new();
    caps.insert("goog:chromeOptions".to_string(), json!(chrome_opts));
    caps
}

fn firefox_capabilities(options: &DriverOptions, display_env: Option<String>) -> Capabilities {
    let (width, height) = options.window_size;
    let args = vec![format!("--width={width}"), format!("--height={height}")];

    let mut firefox_opts = serde_json::Map::new();
    firefox_opts.insert("args".to_string(), json!(args));
    if !options.load_images {
        // 2 = block all images; the preference form of the old image-blocking
        // add-ons.
        firefox_opts.insert("prefs".to_string(), json!({ "permissions.default.image": 2 }));
    }
    if let Some(display) = display_env {
        firefox_opts.insert("env".to_string(), json!({ "DISPLAY": display }));
    }
    if let Some(binary) = &options.browser_binary {
        firefox_opts.insert("binary".to_string(), json!(binary));
    }

    let mut caps = Capabilities::new();
    caps.insert("moz:firefoxOptions".to_string(), json!(firefox_opts));
    caps
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chrome_opts(caps: &Capabilities) -> &serde_json::Value {
        caps.get("goog:chromeOptions").expect("chrome options set")
    }

    fn firefox_opts(caps: &Capabilities) -> &serde_json::Value {
        caps.get("moz:firefoxOptions").expect("firefox options set")
    }

    #[test]
    fn chrome_headless_adds_the_headless_argument() {
        let options = DriverOptions {
            run_headless: true,
            ..DriverOptions::default()
        };
        let caps = chrome_capabilities(&options);
        let args = chrome_opts(&caps)["args"].as_array().unwrap();
        assert!(args.iter().any(|a| a == "--headless"));
    }

    #[test]
    fn chrome_windowed_stays_headful_and_sized() {
        let caps = chrome_capabilities(&DriverOptions::default());
        let args = chrome_opts(&caps)["args"].as_array().unwrap();
        assert!(!args.iter().any(|a| a == "--headless"));
        assert!(args.iter().any(|a| a == "--window-size=1024,768"));
    }

    #[test]
    fn chrome_image_blocking_goes_through_prefs() {
        let options = DriverOptions {
            load_images: false,
            ..DriverOptions::default()
        };
        let caps = chrome_capabilities(&options);
        assert_eq!(
            chrome_opts(&caps)["prefs"]["profile.managed_default_content_settings.images"],
            json!(2)
        );

        let caps = chrome_capabilities(&DriverOptions::default());
        assert!(chrome_opts(&caps).get("prefs").is_none());
    }

    #[test]
    fn chrome_binary_is_forwarded() {
        let options = DriverOptions {
            browser_binary: Some(PathBuf::from("/opt/chrome/chrome")),
            ..DriverOptions::default()
        };
        let caps = chrome_capabilities(&options);
        assert_eq!(chrome_opts(&caps)["binary"], json!("/opt/chrome/chrome"));
    }

    #[test]
    fn firefox_headless_exports_the_display() {
        let options = DriverOptions {
            run_headless: true,
            ..DriverOptions::default()
        };
        let caps = firefox_capabilities(&options, Some(":99".to_string()));
        assert_eq!(firefox_opts(&caps)["env"]["DISPLAY"], json!(":99"));
    }

    #[test]
    fn firefox_windowed_has_no_display_env() {
        let caps = firefox_capabilities(&DriverOptions::default(), None);
        assert!(firefox_opts(&caps).get("env").is_none());
    }

    #[test]
    fn firefox_image_blocking_goes_through_prefs() {
        let options = DriverOptions {
            load_images: false,
            ..DriverOptions::default()
        };
        let caps = firefox_capabilities(&options, None);
        assert_eq!(
            firefox_opts(&caps)["prefs"]["permissions.default.image"],
            json!(2)
        );
    }

    #[test]
    fn endpoints_default_per_browser() {
        assert_eq!(default_endpoint(BrowserKind::Chrome), CHROMEDRIVER_URL);
        assert_eq!(default_endpoint(BrowserKind::Firefox), GECKODRIVER_URL);
    }

    #[test]
    fn options_pick_the_endpoint_for_the_browser() {
        let config = SquireConfig::default();
        let chrome = DriverOptions::from_config(BrowserKind::Chrome, &config);
        assert_eq!(chrome.webdriver_url.as_deref(), Some("http://localhost:9515"));
        let firefox = DriverOptions::from_config(BrowserKind::Firefox, &config);
        assert_eq!(firefox.webdriver_url.as_deref(), Some("http://localhost:4444"));
    }
}
