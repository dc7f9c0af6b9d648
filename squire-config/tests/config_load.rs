use std::{fs, path::PathBuf};

use serial_test::serial;
use squire_common::BrowserKind;
use squire_config::SquireConfigLoader;
use tempfile::TempDir;

/// Helper to write a TOML file in a temp dir and return its path.
fn write_toml(tmp: &TempDir, name: &str, toml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, toml).expect("write toml");
    p
}

#[test]
#[serial]
fn loads_file_with_env_interpolation() {
    let tmp = TempDir::new().unwrap();

    let file_toml = r#"
default_browser = "firefox"

[webdriver]
firefox_url = "http://${SQUIRE_TEST_WD_HOST}:4444"

[wait]
timeout_secs = 3
poll_ms = 50

[session]
headless = true
load_images = false
"#;
    let path = write_toml(&tmp, "squire.toml", file_toml);

    temp_env::with_var("SQUIRE_TEST_WD_HOST", Some("wd.lan"), || {
        let config = SquireConfigLoader::new()
            .with_file(&path)
            .load()
            .expect("load squire config");

        assert_eq!(config.default_browser, BrowserKind::Firefox);
        assert_eq!(config.webdriver.firefox_url, "http://wd.lan:4444");
        assert_eq!(config.wait.timeout_secs, 3);
        assert_eq!(config.wait.poll_ms, 50);
        assert!(config.session.headless);
        assert!(!config.session.load_images);
        // Untouched sections keep their defaults.
        assert_eq!(config.webdriver.chrome_url, "http://localhost:9515");
    });
}

#[test]
#[serial]
fn environment_overrides_file_values() {
    let tmp = TempDir::new().unwrap();
    let path = write_toml(
        &tmp,
        "squire.toml",
        r#"
[session]
headless = false
window_width = 800
"#,
    );

    temp_env::with_vars(
        [
            ("SQUIRE_SESSION__HEADLESS", Some("true")),
            ("SQUIRE_WAIT__POLL_MS", Some("250")),
        ],
        || {
            let config = SquireConfigLoader::new()
                .with_file(&path)
                .load()
                .expect("load squire config");

            assert!(config.session.headless);
            assert_eq!(config.session.window_width, 800);
            assert_eq!(config.wait.poll_ms, 250);
        },
    );
}

#[test]
#[serial]
fn missing_optional_file_falls_back_to_defaults() {
    let config = SquireConfigLoader::new()
        .with_optional_file("/nonexistent/squire.toml")
        .load()
        .expect("defaults still load");

    assert_eq!(config.default_browser, BrowserKind::Chrome);
    assert_eq!(config.session.window_height, 768);
}

#[test]
#[serial]
fn missing_required_file_is_an_error() {
    let result = SquireConfigLoader::new()
        .with_file("/nonexistent/squire.toml")
        .load();
    assert!(result.is_err());
}
