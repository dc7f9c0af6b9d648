//! Driver layer for browser automation helpers.
//!
//! This crate exposes the driver lifecycle wrapper and the waiting/element
//! helpers used by bots and scrapers to poke at pages reliably.
//!
//! - [`squire_browser::driver::SquireDriver`]: WebDriver session wrapper
//! - [`squire_browser::page`]: module-level element helpers and waits
//! - [`squire_browser::wait`]: generic poll-until-true primitive
//! - [`squire_browser::display::VirtualDisplay`]: Xvfb-backed off-screen display
pub mod squire_browser;
