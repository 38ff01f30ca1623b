use std::{future::Future, str::FromStr, time::Duration};

use chrono::{DateTime, Utc};
use tokio::time::sleep;
use tracing::{error, info};

use crate::{config::ScheduleConfig, error::PipelineError};

/// Parsed cron expression, e.g. `@daily` or `0 30 6 * * *`.
#[derive(Debug, Clone)]
pub struct Schedule {
    expr: String,
    inner: cron::Schedule,
}

impl Schedule {
    pub fn parse(expr: &str) -> Result<Self, PipelineError> {
        let inner = cron::Schedule::from_str(expr).map_err(|e| PipelineError::Schedule {
            expr: expr.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { expr: expr.to_string(), inner })
    }

    pub fn from_config(cfg: &ScheduleConfig) -> Result<Self, PipelineError> {
        Self::parse(&cfg.cron)
    }

    pub fn expr(&self) -> &str {
        &self.expr
    }

    /// First tick strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.inner.after(&now).next()
    }
}

/// Drives a job on a schedule: one run per tick, never overlapping, no catch-up.
#[derive(Debug, Clone)]
pub struct Scheduler {
    schedule: Schedule,
}

impl Scheduler {
    pub fn new(schedule: Schedule) -> Self {
        Self { schedule }
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Run `job` at every tick until `shutdown` resolves, passing the tick as
    /// the run's logical date. A failed run is logged and the loop waits for
    /// the next tick.
    pub async fn run_forever<T, F, Fut, S>(&self, mut job: F, shutdown: S)
    where
        F: FnMut(DateTime<Utc>) -> Fut,
        Fut: Future<Output = Result<T, PipelineError>>,
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut last_tick: Option<DateTime<Utc>> = None;

        loop {
            let now = Utc::now();
            let from = last_tick.map_or(now, |tick| tick.max(now));
            let Some(next) = self.schedule.next_after(from) else {
                info!(schedule = self.schedule.expr(), "Schedule has no upcoming ticks");
                return;
            };

            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            info!(next_run = %next, "Waiting for next scheduled run");

            tokio::select! {
                _ = sleep(wait) => {}
                _ = &mut shutdown => {
                    info!("Scheduler stopped");
                    return;
                }
            }

            last_tick = Some(next);
            info!(logical_date = %next, "Starting scheduled run");
            if let Err(e) = job(next).await {
                error!(error = %e, "Scheduled run failed");
            }
        }
    }
}
