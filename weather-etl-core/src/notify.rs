use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use std::fmt::Debug;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    config::{EmailConfig, NotifyConfig},
    error::PipelineError,
};

/// Details of a run that failed after exhausting its retries.
#[derive(Debug, Clone)]
pub struct FailureReport {
    pub run_id: Uuid,
    pub logical_date: DateTime<Utc>,
    pub task_id: String,
    pub error: String,
}

impl FailureReport {
    pub fn subject(&self) -> String {
        format!("weather-etl: task {} failed", self.task_id)
    }

    pub fn body(&self) -> String {
        format!(
            "Run:          {}\nLogical date: {}\nTask:         {}\nError:        {}\n",
            self.run_id, self.logical_date, self.task_id, self.error
        )
    }
}

/// Hook invoked once per failed run, after retries are exhausted.
#[async_trait]
pub trait Notifier: Send + Sync + Debug {
    async fn on_failure(&self, report: &FailureReport) -> Result<(), PipelineError>;
}

/// Writes the failure to the log and nothing else.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn on_failure(&self, report: &FailureReport) -> Result<(), PipelineError> {
        error!(
            run_id = %report.run_id,
            task_id = %report.task_id,
            error = %report.error,
            "Weather pipeline run failed"
        );
        Ok(())
    }
}

/// Sends a plain-text email over SMTP.
#[derive(Debug, Clone)]
pub struct EmailNotifier {
    cfg: EmailConfig,
}

impl EmailNotifier {
    pub fn new(cfg: EmailConfig) -> Self {
        Self { cfg }
    }

    pub fn build_message(&self, report: &FailureReport) -> Result<Message, PipelineError> {
        let from: Mailbox = self
            .cfg
            .from
            .parse()
            .map_err(|e| PipelineError::Notify(format!("invalid sender '{}': {e}", self.cfg.from)))?;
        let to: Mailbox = self
            .cfg
            .to
            .parse()
            .map_err(|e| PipelineError::Notify(format!("invalid recipient '{}': {e}", self.cfg.to)))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(report.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(report.body())
            .map_err(|e| PipelineError::Notify(e.to_string()))
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, PipelineError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.cfg.smtp_host)
            .map_err(|e| PipelineError::Notify(e.to_string()))?
            .port(self.cfg.smtp_port);

        if let (Some(user), Some(pass)) = (&self.cfg.username, &self.cfg.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(builder.build())
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn on_failure(&self, report: &FailureReport) -> Result<(), PipelineError> {
        let message = self.build_message(report)?;
        let transport = self.transport()?;

        transport
            .send(message)
            .await
            .map_err(|e| PipelineError::Notify(e.to_string()))?;

        info!(to = %self.cfg.to, task_id = %report.task_id, "Failure email sent");
        Ok(())
    }
}

/// Email when `[notify.email]` is configured, log-only otherwise.
pub fn notifier_from_config(cfg: &NotifyConfig) -> Box<dyn Notifier> {
    match &cfg.email {
        Some(email) => Box::new(EmailNotifier::new(email.clone())),
        None => Box::new(LogNotifier),
    }
}
