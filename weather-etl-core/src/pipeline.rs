//! The four-task weather pipeline: readiness → extract → transform → save.
//!
//! Every task runs under the same [`RetryPolicy`]. When a task is still
//! failing after its last retry, the run stops, the [`Notifier`] is told, and
//! the error is returned to whoever drove the run.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::{Instrument, info, info_span, warn};

use crate::{
    client::WeatherClient,
    config::{Config, ReadinessConfig},
    error::PipelineError,
    extract::extract,
    model::{RunContext, RunOutcome},
    notify::{FailureReport, Notifier, notifier_from_config},
    persist::save_to_json,
    retry::RetryPolicy,
    sensor::wait_until_ready,
    transform::transform_value,
};

pub const READY_TASK: &str = "weather_api_ready";
pub const EXTRACT_TASK: &str = "extract_weather_data";
pub const TRANSFORM_TASK: &str = "transform_load_weather_data";
pub const SAVE_TASK: &str = "save_to_json";

type TaskFailure = (&'static str, PipelineError);

#[derive(Debug)]
pub struct Pipeline {
    client: WeatherClient,
    readiness: ReadinessConfig,
    retry: RetryPolicy,
    output_path: PathBuf,
    fail_on_write_error: bool,
    notifier: Box<dyn Notifier>,
}

impl Pipeline {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            client: WeatherClient::new(config)?,
            readiness: config.readiness.clone(),
            retry: RetryPolicy::from(&config.retry),
            output_path: config.output_path()?,
            fail_on_write_error: config.output.fail_on_write_error,
            notifier: notifier_from_config(&config.notify),
        })
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn output_path(&self) -> &PathBuf {
        &self.output_path
    }

    /// Readiness check on its own, without retries.
    pub async fn check(&self) -> Result<(), PipelineError> {
        wait_until_ready(&self.client, &self.readiness).await
    }

    pub async fn run_once(&self) -> Result<RunOutcome, PipelineError> {
        self.run_at(Utc::now()).await
    }

    pub async fn run_at(&self, logical_date: DateTime<Utc>) -> Result<RunOutcome, PipelineError> {
        let ctx = RunContext::new(logical_date);
        let span = info_span!("weather_run", run_id = %ctx.run_id, logical_date = %ctx.logical_date);

        match self.execute(&ctx).instrument(span).await {
            Ok(outcome) => Ok(outcome),
            Err((task_id, err)) => {
                let failure = FailureReport {
                    run_id: ctx.run_id,
                    logical_date: ctx.logical_date,
                    task_id: task_id.to_string(),
                    error: err.to_string(),
                };
                if let Err(notify_err) = self.notifier.on_failure(&failure).await {
                    warn!(error = %notify_err, "Failure notification could not be delivered");
                }
                Err(err)
            }
        }
    }

    async fn execute(&self, ctx: &RunContext) -> Result<RunOutcome, TaskFailure> {
        let client = &self.client;
        let readiness = &self.readiness;

        self.retry
            .run(READY_TASK, move || wait_until_ready(client, readiness))
            .await
            .map_err(|e| (READY_TASK, e))?;

        let raw = self
            .retry
            .run(EXTRACT_TASK, move || extract(client))
            .await
            .map_err(|e| (EXTRACT_TASK, e))?;

        let report = self
            .retry
            .run(TRANSFORM_TASK, || std::future::ready(transform_value(raw.clone())))
            .await
            .map_err(|e| (TRANSFORM_TASK, e))?;
        info!(city = %report.city, temperature_c = report.temperature_c, "Transformed weather data");

        let path = &self.output_path;
        let to_save = &report;
        let saved = match self.retry.run(SAVE_TASK, move || save_to_json(to_save, path)).await {
            Ok(_) => true,
            Err(e) if !self.fail_on_write_error => {
                warn!(path = %path.display(), error = %e, "Report was not saved; continuing");
                false
            }
            Err(e) => return Err((SAVE_TASK, e)),
        };

        info!(path = %path.display(), saved, "Weather run finished");
        Ok(RunOutcome {
            run_id: ctx.run_id,
            logical_date: ctx.logical_date,
            report,
            path: path.clone(),
            saved,
        })
    }
}
