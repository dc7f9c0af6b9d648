//! Generic poll-until-true waiting.
//!
//! Everything that waits in Squire — element presence, clickability, caller
//! predicates — reduces to the same loop: evaluate a condition, sleep a fixed
//! step on failure, give up when the budget is spent. The loop checks the
//! deadline before each evaluation, so a zero budget performs zero
//! evaluations and times out immediately.

use std::future::Future;
use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::{debug, trace};

use squire_common::{Result, SquireError};

/// Default overall wait budget.
pub const DEFAULT_TIME_TO_WAIT: Duration = Duration::from_secs(10);

/// Default pause between unsuccessful evaluations.
pub const DEFAULT_TIME_STEP: Duration = Duration::from_millis(100);

/// Timing knobs for a single wait call. The step is fixed — no backoff.
#[derive(Debug, Clone, Copy)]
pub struct WaitConfig {
    /// Maximum time to keep polling.
    pub time_to_wait: Duration,
    /// Sleep between unsuccessful evaluations.
    pub time_step: Duration,
}

impl WaitConfig {
    pub fn new(time_to_wait: Duration, time_step: Duration) -> Self {
        Self {
            time_to_wait,
            time_step,
        }
    }

    /// Custom budget with the default step.
    pub fn with_time_to_wait(time_to_wait: Duration) -> Self {
        Self {
            time_to_wait,
            time_step: DEFAULT_TIME_STEP,
        }
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            time_to_wait: DEFAULT_TIME_TO_WAIT,
            time_step: DEFAULT_TIME_STEP,
        }
    }
}

impl From<&squire_config::WaitDefaults> for WaitConfig {
    fn from(defaults: &squire_config::WaitDefaults) -> Self {
        Self {
            time_to_wait: defaults.time_to_wait(),
            time_step: defaults.time_step(),
        }
    }
}

/// Repeatedly evaluate `predicate` until it returns `true` or the budget in
/// `config` is spent.
///
/// Success is reported as soon as it is observed — there is no trailing
/// sleep. On timeout the returned [`SquireError::WaitTimeout`] carries
/// `description` so the caller can tell which wait gave up.
///
/// ```no_run
/// # use squire_drivers::squire_browser::wait::{wait_until_true, WaitConfig};
/// # async fn demo() -> squire_common::Result<()> {
/// let mut polls = 0;
/// wait_until_true(
///     || {
///         polls += 1;
///         async move { polls >= 3 }
///     },
///     WaitConfig::default(),
///     "third poll reached",
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn wait_until_true<F, Fut>(
    mut predicate: F,
    config: WaitConfig,
    description: &str,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = Instant::now();
    let deadline = start + config.time_to_wait;

    while Instant::now() < deadline {
        if predicate().await {
            trace!(
                target: "browser.wait",
                condition = description,
                elapsed = ?start.elapsed(),
                "condition satisfied"
            );
            return Ok(());
        }
        sleep(config.time_step).await;
    }

    debug!(
        target: "browser.wait",
        condition = description,
        waited = ?config.time_to_wait,
        "condition never became true"
    );
    Err(SquireError::WaitTimeout {
        condition: description.to_string(),
        waited: config.time_to_wait,
    })
}

/// [`wait_until_true`] for predicates that can fail.
///
/// A predicate error is the caller's real problem and propagates unchanged on
/// the spot; it is never converted into a timeout.
pub async fn try_wait_until_true<F, Fut>(
    mut predicate: F,
    config: WaitConfig,
    description: &str,
) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let start = Instant::now();
    let deadline = start + config.time_to_wait;

    while Instant::now() < deadline {
        if predicate().await? {
            return Ok(());
        }
        sleep(config.time_step).await;
    }

    Err(SquireError::WaitTimeout {
        condition: description.to_string(),
        waited: config.time_to_wait,
    })
}
