use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::EstimationBackend;
use crate::{config::EstimatorConfig, error::EstimationError};

/// Gemini `generateContent` request body.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "systemInstruction")]
    system_instruction: Content<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

pub struct GeminiBackend {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl GeminiBackend {
    pub fn new(config: &EstimatorConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: config.generate_url(),
            api_key: config.api_key.clone(),
        })
    }

    fn build_request<'a>(description: &'a str, instruction: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: description }],
            }],
            system_instruction: Content {
                parts: vec![Part { text: instruction }],
            },
        }
    }

    fn extract_text(body: &str) -> Result<String, EstimationError> {
        let response: GenerateResponse = serde_json::from_str(body).map_err(|e| {
            EstimationError::Validation(format!("response body is not valid JSON: {e}"))
        })?;
        response
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .filter(|t| !t.trim().is_empty())
            .ok_or(EstimationError::MissingContent)
    }
}

#[async_trait]
impl EstimationBackend for GeminiBackend {
    async fn generate(
        &self,
        description: &str,
        instruction: &str,
    ) -> Result<String, EstimationError> {
        let mut request = self
            .client
            .post(&self.url)
            .json(&Self::build_request(description, instruction));
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key.as_str())]);
        }

        debug!(url = %self.url, "sending estimation request");
        let response = request
            .send()
            .await
            .map_err(|e| EstimationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            error!(%status, "estimation service error");
            return Err(EstimationError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| EstimationError::Transport(format!("failed to read response: {e}")))?;
        Self::extract_text(&body)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    };

    use axum::{
        extract::Query,
        http::{StatusCode, Uri},
        Json, Router,
    };
    use serde_json::{json, Value};

    use super::*;
    use crate::clock::testing::RecordingSleeper;
    use crate::estimator::{testing::EGGS_AND_OATS, NutritionEstimator, RetryPolicy};

    fn config_for(base_url: String) -> EstimatorConfig {
        EstimatorConfig {
            base_url,
            model: "test-model".into(),
            api_key: Some("k-123".into()),
            max_attempts: 3,
            backoff_ms: 1000,
            timeout_secs: 5,
        }
    }

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn request_body_has_description_and_instruction() {
        let body = serde_json::to_value(GeminiBackend::build_request("2 eggs", "be brief")).unwrap();
        assert_eq!(
            body,
            json!({
                "contents": [{"parts": [{"text": "2 eggs"}]}],
                "systemInstruction": {"parts": [{"text": "be brief"}]}
            })
        );
    }

    #[test]
    fn extract_text_reads_first_candidate_part() {
        let body = json!({
            "candidates": [{"content": {"parts": [{"text": "{\"totals\":{}}"}], "role": "model"}}]
        })
        .to_string();
        assert_eq!(GeminiBackend::extract_text(&body).unwrap(), "{\"totals\":{}}");
    }

    #[test]
    fn extract_text_reports_missing_content() {
        for body in [
            json!({}),
            json!({"candidates": []}),
            json!({"candidates": [{"finishReason": "SAFETY"}]}),
            json!({"candidates": [{"content": {"parts": []}}]}),
            json!({"candidates": [{"content": {"parts": [{"text": "  "}]}}]}),
        ] {
            let err = GeminiBackend::extract_text(&body.to_string()).unwrap_err();
            assert!(matches!(err, EstimationError::MissingContent), "{body}");
        }
        assert!(matches!(
            GeminiBackend::extract_text("<html>").unwrap_err(),
            EstimationError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn posts_to_model_endpoint_with_key() {
        let app = Router::new().fallback(
            |uri: Uri,
             Query(q): Query<std::collections::HashMap<String, String>>,
             Json(body): Json<Value>| async move {
                assert_eq!(uri.path(), "/models/test-model:generateContent");
                assert_eq!(q.get("key").map(String::as_str), Some("k-123"));
                assert_eq!(body["contents"][0]["parts"][0]["text"], "eggs and oats");
                Json(json!({
                    "candidates": [{"content": {"parts": [{"text": EGGS_AND_OATS}]}}]
                }))
            },
        );
        let backend = GeminiBackend::new(&config_for(spawn(app).await)).unwrap();
        let text = backend.generate("eggs and oats", "instr").await.unwrap();
        assert!(text.contains("\"totals\""));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let app =
            Router::new().fallback(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") });
        let backend = GeminiBackend::new(&config_for(spawn(app).await)).unwrap();
        let err = backend.generate("eggs", "instr").await.unwrap_err();
        assert!(matches!(err, EstimationError::Status(429)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        let backend = GeminiBackend::new(&config_for("http://127.0.0.1:1".into())).unwrap();
        let err = backend.generate("eggs", "instr").await.unwrap_err();
        assert!(matches!(err, EstimationError::Transport(_)));
    }

    #[tokio::test]
    async fn estimator_retries_against_flaky_service() {
        let hits = Arc::new(AtomicU32::new(0));
        let counter = hits.clone();
        let app = Router::new().fallback(move || {
            let counter = counter.clone();
            async move {
                match counter.fetch_add(1, Ordering::SeqCst) {
                    0 => (StatusCode::SERVICE_UNAVAILABLE, Json(json!({}))),
                    1 => (StatusCode::OK, Json(json!({"candidates": []}))),
                    _ => (
                        StatusCode::OK,
                        Json(json!({
                            "candidates": [{"content": {"parts": [{"text": EGGS_AND_OATS}]}}]
                        })),
                    ),
                }
            }
        });
        let backend = Arc::new(GeminiBackend::new(&config_for(spawn(app).await)).unwrap());
        let sleeper = Arc::new(RecordingSleeper::default());
        let estimator = NutritionEstimator::new(backend, sleeper.clone(), RetryPolicy::default());

        let estimate = estimator.estimate("3 eggs, 40g oats").await.unwrap();
        assert_eq!(estimate.totals.calories, 360);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert_eq!(
            sleeper.delays(),
            vec![Duration::from_millis(1000), Duration::from_millis(2000)]
        );
    }
}
