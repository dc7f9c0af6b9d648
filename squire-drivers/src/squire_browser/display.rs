//! Xvfb-backed off-screen display.
//!
//! Firefox sessions asked to run headless get one of these: the display
//! server must be running before the browser starts so the session can bind
//! to it, and it is torn down together with the session.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context};
use tracing::debug;

use squire_common::Result;

const DISPLAY_SEARCH_BASE: u32 = 99;
const DISPLAY_SEARCH_LIMIT: u32 = 199;
const STARTUP_WAIT: Duration = Duration::from_secs(5);
const STARTUP_POLL: Duration = Duration::from_millis(50);

/// A running Xvfb server owned by one driver session.
#[derive(Debug)]
pub struct VirtualDisplay {
    number: u32,
    child: Child,
}

impl VirtualDisplay {
    /// Spawn an Xvfb server on a free display and wait until it is ready.
    pub fn start(width: u32, height: u32) -> Result<Self> {
        let number = free_display_number()
            .ok_or_else(|| anyhow!("no free X display between :{DISPLAY_SEARCH_BASE} and :{DISPLAY_SEARCH_LIMIT}"))?;

        let child = Command::new("Xvfb")
            .arg(format!(":{number}"))
            .args(["-screen", "0"])
            .arg(format!("{width}x{height}x24"))
            .args(["-nolisten", "tcp"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .context("failed to spawn Xvfb (is it installed?)")?;

        let mut server = Self { number, child };
        server.await_ready()?;
        debug!(
            target: "browser.display",
            display = %server.display_env(),
            "virtual display started"
        );
        Ok(server)
    }

    /// The value to export as `DISPLAY` for processes using this server.
    pub fn display_env(&self) -> String {
        format!(":{}", self.number)
    }

    fn await_ready(&mut self) -> Result<()> {
        let deadline = Instant::now() + STARTUP_WAIT;
        while Instant::now() < deadline {
            if lock_file(self.number).exists() {
                return Ok(());
            }
            if let Some(status) = self
                .child
                .try_wait()
                .context("failed to poll the Xvfb process")?
            {
                return Err(anyhow!("Xvfb exited during startup with {status}").into());
            }
            std::thread::sleep(STARTUP_POLL);
        }
        Err(anyhow!("Xvfb on :{} did not come up within {STARTUP_WAIT:?}", self.number).into())
    }

    /// Stop the display server. Safe to call on a server that already exited.
    pub fn stop(&mut self) {
        match self.child.try_wait() {
            Ok(Some(_)) => {} // already gone
            _ => {
                if let Err(err) = self.child.kill() {
                    debug!(target: "browser.display", error = %err, "Xvfb kill failed");
                }
                let _ = self.child.wait();
            }
        }
        debug!(
            target: "browser.display",
            display = %self.display_env(),
            "virtual display stopped"
        );
    }
}

impl Drop for VirtualDisplay {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Release a display that may not exist. A session that never had one
/// (Chrome, or a windowed run) releases `None`, which is a successful no-op.
pub fn release_display(display: Option<VirtualDisplay>) {
    if let Some(mut display) = display {
        display.stop();
    }
}

fn lock_file(number: u32) -> PathBuf {
    PathBuf::from(format!("/tmp/.X{number}-lock"))
}

fn free_display_number() -> Option<u32> {
    (DISPLAY_SEARCH_BASE..=DISPLAY_SEARCH_LIMIT).find(|n| !lock_file(*n).exists())
}
