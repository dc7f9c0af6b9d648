//! Module-level page helpers operating on a WebDriver client.
//!
//! These functions take the client explicitly so they compose with any
//! session; [`SquireDriver`](crate::squire_browser::driver::SquireDriver)
//! re-exposes them as methods bound to its own client.

use fantoccini::elements::Element;
use fantoccini::{Client, Locator};

use squire_common::Result;

use crate::squire_browser::wait::{wait_until_true, WaitConfig};

const SCROLL_PAGE_SCRIPT: &str = "document.body.scrollTop = document.body.scrollHeight;";
const SCROLL_ELEMENT_SCRIPT: &str = "arguments[0].scrollTop = arguments[0].scrollHeight;";

/// The raw selector value inside a locator, for diagnostics.
pub(crate) fn locator_value(locator: Locator<'_>) -> &str {
    match locator {
        Locator::Css(value)
        | Locator::Id(value)
        | Locator::LinkText(value)
        | Locator::XPath(value) => value,
    }
}

/// Wait until an element matching `locator` exists in the current document,
/// visible or not.
pub async fn wait_for_element_present(
    client: &Client,
    locator: Locator<'_>,
    config: WaitConfig,
) -> Result<()> {
    let condition = format!("presence of element `{}`", locator_value(locator));
    wait_until_true(
        || {
            let client = client.clone();
            async move { client.find(locator).await.is_ok() }
        },
        config,
        &condition,
    )
    .await
}

/// Wait until an element matching `locator` is present, displayed, and
/// enabled. Fails with a timeout message distinct from the presence wait.
pub async fn wait_for_element_clickable(
    client: &Client,
    locator: Locator<'_>,
    config: WaitConfig,
) -> Result<()> {
    let condition = format!("element `{}` to be clickable", locator_value(locator));
    wait_until_true(
        || {
            let client = client.clone();
            async move {
                match client.find(locator).await {
                    Ok(element) => element_is_clickable(&element).await,
                    Err(_) => false,
                }
            }
        },
        config,
        &condition,
    )
    .await
}

// A probe error counts as "not clickable yet"; the element may be mid-replacement.
async fn element_is_clickable(element: &Element) -> bool {
    let displayed = element.is_displayed().await.unwrap_or(false);
    let enabled = element.is_enabled().await.unwrap_or(false);
    displayed && enabled
}

/// Like [`wait_for_element_present`], but converts a timeout into `false`
/// for callers branching on availability rather than handling errors.
pub async fn element_is_present(
    client: &Client,
    locator: Locator<'_>,
    config: WaitConfig,
) -> bool {
    wait_for_element_present(client, locator, config)
        .await
        .is_ok()
}

/// Scroll the current page to the bottom of the document body.
pub async fn scroll(client: &Client) -> Result<()> {
    client
        .execute(SCROLL_PAGE_SCRIPT, vec![])
        .await
        .map_err(anyhow::Error::from)?;
    Ok(())
}

/// Scroll `element` to its own bottom — useful for infinite feeds inside a
/// fixed container.
pub async fn scroll_element(client: &Client, element: &Element) -> Result<()> {
    let handle = serde_json::to_value(element).map_err(anyhow::Error::from)?;
    client
        .execute(SCROLL_ELEMENT_SCRIPT, vec![handle])
        .await
        .map_err(anyhow::Error::from)?;
    Ok(())
}

/// Find the element matching `locator` and click it.
pub async fn click_on_element(client: &Client, locator: Locator<'_>) -> Result<()> {
    let element = client.find(locator).await.map_err(anyhow::Error::from)?;
    element.click().await.map_err(anyhow::Error::from)?;
    Ok(())
}

/// Find the text field matching `locator` and type `text` into it.
pub async fn populate_text_field(
    client: &Client,
    locator: Locator<'_>,
    text: &str,
) -> Result<()> {
    let element = client.find(locator).await.map_err(anyhow::Error::from)?;
    element.send_keys(text).await.map_err(anyhow::Error::from)?;
    Ok(())
}

/// Whether a previously found element no longer belongs to the current DOM.
///
/// Probes the element with a cheap command; a stale reference fails the
/// round-trip. Pairs well with [`wait_until_true`] when waiting for a page
/// to replace a widget.
pub async fn element_has_gone_stale(element: &Element) -> bool {
    element.attr("id").await.is_err()
}

/// Join bare class names into a CSS class selector: `["a", "b"]` → `".a .b"`.
pub fn join_css_classes(classes: &[&str]) -> String {
    classes
        .iter()
        .map(|class| format!(".{class}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn css_classes_join_with_leading_dots() {
        assert_eq!(
            join_css_classes(&["search_btn", "active"]),
            ".search_btn .active"
        );
        assert_eq!(join_css_classes(&["solo"]), ".solo");
        assert_eq!(join_css_classes(&[]), "");
    }

    #[test]
    fn locator_value_extracts_every_strategy() {
        assert_eq!(locator_value(Locator::Css(".btn")), ".btn");
        assert_eq!(locator_value(Locator::Id("submit")), "submit");
        assert_eq!(locator_value(Locator::LinkText("next page")), "next page");
        assert_eq!(locator_value(Locator::XPath("//div[1]")), "//div[1]");
    }
}
