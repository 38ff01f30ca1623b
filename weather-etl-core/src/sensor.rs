//! Readiness gate: poke the endpoint until it answers 2xx or time runs out.

use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use crate::{client::WeatherClient, config::ReadinessConfig, error::PipelineError};

/// One probe. Transport errors and non-2xx answers both mean "not yet".
async fn poke(client: &WeatherClient) -> bool {
    match client.get().await {
        Ok(res) if res.status().is_success() => true,
        Ok(res) => {
            debug!(status = %res.status(), "Weather endpoint not ready");
            false
        }
        Err(e) => {
            debug!(error = %e, "Weather endpoint unreachable");
            false
        }
    }
}

pub async fn wait_until_ready(
    client: &WeatherClient,
    cfg: &ReadinessConfig,
) -> Result<(), PipelineError> {
    let started = Instant::now();
    let deadline = started + cfg.timeout();

    loop {
        if poke(client).await {
            info!(url = client.url(), elapsed = ?started.elapsed(), "Weather endpoint is ready");
            return Ok(());
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(PipelineError::NotReady { waited: started.elapsed() });
        }

        sleep(cfg.poke_interval().min(deadline - now)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use wiremock::{Mock, MockServer, ResponseTemplate, matchers::method};

    fn client_for(server: &MockServer) -> WeatherClient {
        let mut cfg = Config::default();
        cfg.api.api_key = Some("KEY".into());
        cfg.api.base_url = server.uri();
        WeatherClient::new(&cfg).unwrap()
    }

    fn fast() -> ReadinessConfig {
        ReadinessConfig { timeout_secs: 1, poke_interval_secs: 0 }
    }

    #[tokio::test]
    async fn ready_on_first_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        wait_until_ready(&client_for(&server), &fast()).await.unwrap();
    }

    #[tokio::test]
    async fn keeps_poking_until_endpoint_recovers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        wait_until_ready(&client_for(&server), &fast()).await.unwrap();
        assert!(server.received_requests().await.unwrap().len() >= 3);
    }

    #[tokio::test]
    async fn times_out_when_never_ready() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = wait_until_ready(&client_for(&server), &fast()).await.unwrap_err();
        assert!(matches!(err, PipelineError::NotReady { .. }));
    }

    #[tokio::test]
    async fn zero_timeout_still_probes_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let cfg = ReadinessConfig { timeout_secs: 0, poke_interval_secs: 5 };
        wait_until_ready(&client_for(&server), &cfg).await.unwrap();
    }
}
