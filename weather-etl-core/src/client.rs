use reqwest::{Client, Response};
use tracing::debug;

use crate::{config::Config, error::PipelineError};

/// HTTP handle for the one endpoint the pipeline talks to.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: Client,
    url: String,
    lat: String,
    lon: String,
    api_key: String,
}

impl WeatherClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let api_key = config.api_key()?.to_owned();
        let http = Client::builder().timeout(config.request_timeout()).build()?;

        Ok(Self {
            http,
            url: format!(
                "{}{}",
                config.api.base_url.trim_end_matches('/'),
                config.api.endpoint
            ),
            lat: config.api.lat.to_string(),
            lon: config.api.lon.to_string(),
            api_key,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issue one `GET <endpoint>?lat&lon&appid`.
    pub async fn get(&self) -> Result<Response, PipelineError> {
        debug!(url = %self.url, "GET weather endpoint");

        let res = self
            .http
            .get(&self.url)
            .query(&[
                ("lat", self.lat.as_str()),
                ("lon", self.lon.as_str()),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await?;

        Ok(res)
    }
}
