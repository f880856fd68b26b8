// Bounded wait for asynchronous dashboard creation
//
// Polls with exponential backoff until the dashboard leaves the pending state
// or the wait budget runs out. Time is accounted as the sum of the sleeps, so
// slow describe calls do not eat into the budget.

use std::time::Duration;
use tracing::{debug, info};

use crate::dashboard::{DashboardApi, DashboardStatus};
use crate::error::ProvisionError;

const MIN_DELAY: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: u32,
    pub max_wait: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2,
            max_wait: Duration::from_secs(600),
        }
    }
}

impl PollConfig {
    fn next_delay(&self, current: Duration) -> Duration {
        current
            .saturating_mul(self.multiplier.max(1))
            .min(self.max_delay)
    }
}

/// Wait until `dashboard_id` finishes creating.
///
/// Returns the successful status, `TerminalState` for any other final
/// status, or `PollTimeout` once `max_wait` has been slept through.
pub async fn wait_for_dashboard<A: DashboardApi + ?Sized>(
    api: &A,
    account_id: &str,
    dashboard_id: &str,
    config: &PollConfig,
) -> Result<DashboardStatus, ProvisionError> {
    let mut delay = config.initial_delay.min(config.max_delay);
    let mut waited = Duration::ZERO;

    loop {
        if waited >= config.max_wait {
            return Err(ProvisionError::PollTimeout {
                dashboard_id: dashboard_id.to_string(),
                waited,
            });
        }

        let step = delay.max(MIN_DELAY).min(config.max_wait - waited);
        tokio::time::sleep(step).await;
        waited += step;

        let status = api
            .describe_dashboard_status(account_id, dashboard_id)
            .await?;

        if status.is_success() {
            info!(
                dashboard_id,
                waited_ms = waited.as_millis() as u64,
                "Dashboard successfully created"
            );
            return Ok(status);
        }
        if status.is_terminal() {
            return Err(ProvisionError::TerminalState {
                dashboard_id: dashboard_id.to_string(),
                status,
            });
        }

        debug!(
            dashboard_id,
            status = %status,
            "Dashboard still creating"
        );
        delay = config.next_delay(delay);
    }
}
