use tracing::{debug, info};

use crate::{
    client::WeatherClient,
    error::{PipelineError, truncate_body},
};

/// Fetch the current reading and hand back the parsed JSON body untouched.
pub async fn extract(client: &WeatherClient) -> Result<serde_json::Value, PipelineError> {
    let res = client.get().await?;

    let status = res.status();
    let body = res.text().await?;
    debug!(%status, body = %truncate_body(&body), "Weather endpoint response");

    if !status.is_success() {
        return Err(PipelineError::Status { status, body: truncate_body(&body) });
    }

    let value: serde_json::Value = serde_json::from_str(&body).map_err(PipelineError::Parse)?;
    info!(bytes = body.len(), "Extracted weather data");

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use reqwest::StatusCode;
    use wiremock::{Mock, MockServer, ResponseTemplate, matchers::method};

    fn client_for(server: &MockServer) -> WeatherClient {
        let mut cfg = Config::default();
        cfg.api.api_key = Some("KEY".into());
        cfg.api.base_url = server.uri();
        WeatherClient::new(&cfg).unwrap()
    }

    #[tokio::test]
    async fn returns_parsed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"name": "Mumbai"})),
            )
            .mount(&server)
            .await;

        let value = extract(&client_for(&server)).await.unwrap();
        assert_eq!(value["name"], "Mumbai");
    }

    #[tokio::test]
    async fn non_json_body_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = extract(&client_for(&server)).await.unwrap_err();
        assert!(matches!(err, PipelineError::Parse(_)));
    }

    #[tokio::test]
    async fn error_status_carries_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(401).set_body_string(r#"{"cod":401,"message":"Invalid API key"}"#),
            )
            .mount(&server)
            .await;

        match extract(&client_for(&server)).await.unwrap_err() {
            PipelineError::Status { status, body } => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert!(body.contains("Invalid API key"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
