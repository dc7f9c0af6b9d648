//! `squire` — drive a real browser at a page and report back.
//!
//! A thin CLI over the driver stack, mostly useful for checking that a
//! chromedriver/geckodriver setup works and as a template for writing bots:
//! hold a [`SquireDriver`] in your own type and delegate to it.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use fantoccini::Locator;
use tracing::info;

use squire_common::observability::{init_logging, LogConfig};
use squire_common::BrowserKind;
use squire_config::{SquireConfig, SquireConfigLoader};
use squire_drivers::squire_browser::driver::{DriverOptions, SquireDriver};
use squire_drivers::squire_browser::wait::WaitConfig;

#[derive(Debug, Parser)]
#[command(name = "squire", version, about = "Open a page, wait for it, report its title")]
struct Args {
    /// URL to open.
    url: String,

    /// CSS selector that must appear before the page counts as ready.
    #[arg(long)]
    selector: Option<String>,

    /// Browser to drive (chrome or firefox); defaults to the configured one.
    #[arg(long)]
    browser: Option<String>,

    /// Run without a visible window.
    #[arg(long)]
    headless: bool,

    /// Skip image loading.
    #[arg(long)]
    no_images: bool,

    /// Seconds to wait for the selector.
    #[arg(long)]
    timeout: Option<u64>,

    /// Path to squire.toml; defaults to ./squire.toml if present.
    #[arg(long)]
    config: Option<PathBuf>,
}

/// A minimal bot: holds the driver, delegates to it.
struct Probe {
    driver: SquireDriver,
}

impl Probe {
    async fn open(kind: BrowserKind, options: DriverOptions, waits: WaitConfig) -> Result<Self> {
        let driver = SquireDriver::launch(kind, options)
            .await?
            .with_wait_config(waits);
        Ok(Self { driver })
    }

    async fn visit(&self, url: &str, selector: Option<&str>) -> Result<String> {
        self.driver.goto(url).await?;
        if let Some(selector) = selector {
            self.driver
                .wait_for_element_present(Locator::Css(selector))
                .await?;
        }
        let title = self.driver.title().await?;
        Ok(title)
    }

    async fn finish(self) -> Result<()> {
        self.driver.shut_down().await?;
        Ok(())
    }
}

fn load_config(explicit: Option<&Path>) -> Result<SquireConfig> {
    let loader = SquireConfigLoader::new();
    let config = match explicit {
        Some(path) => loader.with_file(path).load()?,
        None => loader.with_optional_file("squire.toml").load()?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;
    init_logging(LogConfig {
        app_name: "squire",
        emit_stderr: true,
        ..LogConfig::default()
    })?;

    let kind = match &args.browser {
        Some(tag) => tag.parse()?,
        None => config.default_browser,
    };

    let mut options = DriverOptions::from_config(kind, &config);
    if args.headless {
        options.run_headless = true;
    }
    if args.no_images {
        options.load_images = false;
    }

    let mut waits = WaitConfig::from(&config.wait);
    if let Some(secs) = args.timeout {
        waits.time_to_wait = std::time::Duration::from_secs(secs);
    }

    info!(target: "squire", browser = %kind, url = %args.url, "probing");

    let probe = Probe::open(kind, options, waits).await?;
    let outcome = probe.visit(&args.url, args.selector.as_deref()).await;
    probe.finish().await?;

    let title = outcome?;
    println!("{title}");
    Ok(())
}
