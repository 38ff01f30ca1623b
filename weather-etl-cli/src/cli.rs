use std::path::PathBuf;

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use inquire::{Confirm, CustomType, Password, Text};
use tokio::signal;
use tracing::{error, info};
use weather_etl_core::{Config, EmailConfig, Pipeline, Schedule, Scheduler};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-etl", version, about = "Scheduled weather ETL pipeline")]
pub struct Cli {
    /// Use this config file instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set API key, coordinates, output path and failure email.
    Configure,

    /// Only wait for the weather endpoint to become ready.
    Check,

    /// Run the pipeline once, now.
    Run,

    /// Run the pipeline on its schedule until Ctrl+C.
    Daemon,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config_path = match self.config {
            Some(path) => path,
            None => Config::config_file_path()?,
        };
        let config = Config::load_from(&config_path)?;

        match self.command {
            Command::Configure => configure(config, &config_path)?,
            Command::Check => {
                let pipeline = Pipeline::new(&config)?;
                pipeline.check().await?;
                println!("Weather endpoint is ready.");
            }
            Command::Run => {
                let pipeline = Pipeline::new(&config)?;
                let outcome = pipeline.run_once().await?;
                if outcome.saved {
                    println!("Saved report for {} to {}", outcome.report.city, outcome.path.display());
                } else {
                    eprintln!(
                        "Report for {} was NOT saved to {}",
                        outcome.report.city,
                        outcome.path.display()
                    );
                }
            }
            Command::Daemon => {
                let pipeline = Pipeline::new(&config)?;
                let schedule = Schedule::from_config(&config.schedule)?;
                if let Some(next) = schedule.next_after(chrono::Utc::now()) {
                    println!(
                        "Scheduled '{}'; first run at {}",
                        schedule.expr(),
                        next.with_timezone(&Local)
                    );
                }
                let pipeline = &pipeline;
                Scheduler::new(schedule)
                    .run_forever(move |tick| pipeline.run_at(tick), shutdown_signal())
                    .await;
            }
        }

        Ok(())
    }
}

fn configure(mut config: Config, path: &std::path::Path) -> anyhow::Result<()> {
    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    config.api.api_key = Some(api_key.trim().to_string());

    config.api.lat = CustomType::<f64>::new("Latitude:")
        .with_default(config.api.lat)
        .prompt()?;
    config.api.lon = CustomType::<f64>::new("Longitude:")
        .with_default(config.api.lon)
        .prompt()?;

    let current_output = config.output_path()?;
    let output = Text::new("Output file:")
        .with_default(&current_output.display().to_string())
        .prompt()?;
    config.output.path = Some(PathBuf::from(output));

    if Confirm::new("Email on failure?").with_default(config.notify.email.is_some()).prompt()? {
        let to = Text::new("Send failure emails to:").prompt()?;
        let from = Text::new("Send from address:").prompt()?;
        let smtp_host = Text::new("SMTP host:").prompt()?;
        let smtp_port = CustomType::<u16>::new("SMTP port:").with_default(465).prompt()?;
        let username = Text::new("SMTP username (empty for none):").prompt()?;
        let password = if username.is_empty() {
            None
        } else {
            Some(Password::new("SMTP password:").without_confirmation().prompt()?)
        };

        config.notify.email = Some(EmailConfig {
            to,
            from,
            smtp_host,
            smtp_port,
            username: (!username.is_empty()).then_some(username),
            password,
        });
    } else {
        config.notify.email = None;
    }

    config.save_to(path)?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!(error = %e, "Failed to listen for Ctrl+C; stopping"),
    }
}
