//! Tune-chart prediction proxy client
//!
//! Forwards the latest chart to the external prediction service and
//! returns its JSON verbatim. The endpoint is optional; when unset, the
//! predict feature is disabled.

use serde::Serialize;
use std::time::Duration;

use crate::models::TuneEntry;
use crate::services::ai::AiClientError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Serialize)]
struct PredictRequest<'a> {
    entries: Vec<PredictEntry<'a>>,
}

#[derive(Serialize)]
struct PredictEntry<'a> {
    position: i32,
    title: &'a str,
    artist: &'a str,
    previous_position: Option<i32>,
    weeks_on_chart: i32,
}

/// Client for the external chart-prediction service
pub struct PredictClient {
    http: reqwest::Client,
    endpoint: String,
}

impl PredictClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    /// Whether an endpoint is configured
    pub fn is_enabled(&self) -> bool {
        !self.endpoint.is_empty()
    }

    /// Send the chart and return the service's JSON response verbatim.
    pub async fn predict(&self, chart: &[TuneEntry]) -> Result<serde_json::Value, AiClientError> {
        let request = PredictRequest {
            entries: chart
                .iter()
                .map(|e| PredictEntry {
                    position: e.position,
                    title: &e.title,
                    artist: &e.artist,
                    previous_position: e.previous_position,
                    weeks_on_chart: e.weeks_on_chart,
                })
                .collect(),
        };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| AiClientError::ConnectionFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AiClientError::ConnectionFailed(format!(
                "status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AiClientError::BadResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_enabled() {
        assert!(!PredictClient::new("").is_enabled());
        assert!(PredictClient::new("http://ml.example.edu/predict").is_enabled());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_connection_failed() {
        let client = PredictClient::new("http://127.0.0.1:1/predict");
        let result = client.predict(&[]).await;
        assert!(matches!(result, Err(AiClientError::ConnectionFailed(_))));
    }
}
