//! Async Triton HTTP client

use crate::protocol::{InferenceRequest, InferenceResponse};
use crate::ClientError;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tensor_prep::ImageTensor;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Sent with every request; hosts such as Wikimedia reject requests without one
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL, e.g. `http://localhost:8000`
    pub base_url: String,
    /// Model name used in `/v2/models/{model}/...`
    pub model: String,
    /// Name of the single input tensor
    pub input_name: String,
    /// Name of the requested output tensor
    pub output_name: String,
    /// Timeout for each readiness probe
    pub health_timeout: Duration,
    /// Timeout for the inference call
    pub infer_timeout: Duration,
    /// Timeout for the sample image download
    pub download_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            model: "resnet50".to_string(),
            input_name: "data".to_string(),
            output_name: "resnetv17_dense0_fwd".to_string(),
            health_timeout: Duration::from_secs(10),
            infer_timeout: Duration::from_secs(30),
            download_timeout: Duration::from_secs(30),
        }
    }
}

/// Client for a single model on a Triton server
pub struct TritonClient {
    config: ClientConfig,
    http: Client,
}

impl TritonClient {
    /// Create a new client
    pub fn new(mut config: ClientConfig) -> Result<Self, ClientError> {
        let trimmed = config.base_url.trim_end_matches('/').len();
        config.base_url.truncate(trimmed);

        let http = Client::builder().user_agent(USER_AGENT).build().map_err(|source| ClientError::Http {
            url: config.base_url.clone(),
            source,
        })?;

        info!("Creating Triton client for {} (model {})", config.base_url, config.model);
        Ok(Self { config, http })
    }

    fn server_ready_url(&self) -> String {
        format!("{}/v2/health/ready", self.config.base_url)
    }

    fn model_url(&self, action: &str) -> String {
        format!("{}/v2/models/{}/{}", self.config.base_url, self.config.model, action)
    }

    /// GET `url` and return the status code
    async fn probe(&self, url: &str) -> Result<StatusCode, ClientError> {
        let response = self
            .http
            .get(url)
            .timeout(self.config.health_timeout)
            .send()
            .await
            .map_err(|source| ClientError::Http {
                url: url.to_string(),
                source,
            })?;

        debug!(url, status = response.status().as_u16(), "Readiness probe");
        Ok(response.status())
    }

    /// Check server readiness, then model readiness. Only 200 counts as ready.
    pub async fn check_ready(&self) -> Result<(), ClientError> {
        let status = self.probe(&self.server_ready_url()).await?;
        if status != StatusCode::OK {
            return Err(ClientError::NotReady {
                target: "Triton Server".to_string(),
                status: status.as_u16(),
            });
        }

        let status = self.probe(&self.model_url("ready")).await?;
        if status != StatusCode::OK {
            return Err(ClientError::NotReady {
                target: format!("Model {}", self.config.model),
                status: status.as_u16(),
            });
        }

        info!("Server and model {} are ready", self.config.model);
        Ok(())
    }

    /// Boolean form of [`check_ready`](Self::check_ready); failures are logged
    pub async fn is_ready(&self) -> bool {
        match self.check_ready().await {
            Ok(()) => true,
            Err(e) => {
                warn!("Health check failed: {}", e);
                false
            }
        }
    }

    /// Download `url` into `dest`, overwriting any existing file
    pub async fn download(&self, url: &str, dest: &Path) -> Result<PathBuf, ClientError> {
        let http_err = |source: reqwest::Error| ClientError::Http {
            url: url.to_string(),
            source,
        };

        let response = self
            .http
            .get(url)
            .timeout(self.config.download_timeout)
            .send()
            .await
            .map_err(http_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::DownloadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(http_err)?;
        tokio::fs::write(dest, &bytes)
            .await
            .map_err(|source| ClientError::Io {
                path: dest.to_path_buf(),
                source,
            })?;

        info!(url, bytes = bytes.len(), dest = %dest.display(), "Sample image downloaded");
        Ok(dest.to_path_buf())
    }

    /// Submit `tensor` for inference and parse the response
    pub async fn infer(&self, tensor: &ImageTensor) -> Result<InferenceResponse, ClientError> {
        let url = self.model_url("infer");
        let request_id = Uuid::new_v4().to_string();
        let request = InferenceRequest::new(&self.config.input_name, tensor, &self.config.output_name)
            .with_id(request_id.clone());

        let start = Instant::now();
        let http_err = |source: reqwest::Error| ClientError::Http {
            url: url.clone(),
            source,
        };

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .json(&request)
            .timeout(self.config.infer_timeout)
            .send()
            .await
            .map_err(http_err)?;

        let status = response.status();
        let body = response.text().await.map_err(http_err)?;
        let latency_ms = start.elapsed().as_millis() as u64;

        if status != StatusCode::OK {
            warn!(request_id = %request_id, status = status.as_u16(), latency_ms, "Inference rejected");
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: InferenceResponse = serde_json::from_str(&body)?;
        info!(
            request_id = %request_id,
            echoed_id = ?parsed.id,
            outputs = parsed.outputs.len(),
            latency_ms,
            "Inference completed"
        );
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTriton;

    fn client_for(base_url: String) -> TritonClient {
        TritonClient::new(ClientConfig {
            base_url,
            health_timeout: Duration::from_secs(2),
            infer_timeout: Duration::from_secs(5),
            ..Default::default()
        })
        .unwrap()
    }

    fn test_tensor() -> ImageTensor {
        ImageTensor::from_flat(vec![0.25; 3 * 224 * 224]).unwrap()
    }

    #[tokio::test]
    async fn test_ready_when_both_probes_ok() {
        let server = MockTriton::with_scores(vec![0.1, 0.2]).spawn().await.unwrap();
        let client = client_for(server.base_url.clone());

        assert!(client.check_ready().await.is_ok());
        assert!(client.is_ready().await);
    }

    #[tokio::test]
    async fn test_not_ready_when_server_unhealthy() {
        let server = MockTriton {
            server_ready: 503,
            ..MockTriton::with_scores(vec![])
        }
        .spawn()
        .await
        .unwrap();
        let client = client_for(server.base_url.clone());

        let err = client.check_ready().await.unwrap_err();
        assert!(matches!(err, ClientError::NotReady { status: 503, .. }));
        assert!(!client.is_ready().await);
    }

    #[tokio::test]
    async fn test_not_ready_when_model_missing() {
        let server = MockTriton::with_scores(vec![]).spawn().await.unwrap();
        let client = TritonClient::new(ClientConfig {
            base_url: server.base_url.clone(),
            model: "densenet".to_string(),
            ..Default::default()
        })
        .unwrap();

        match client.check_ready().await {
            Err(ClientError::NotReady { target, status }) => {
                assert_eq!(target, "Model densenet");
                assert_eq!(status, 404);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        // Bind and drop to get a port nobody listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(format!("http://{}", addr));
        assert!(matches!(client.check_ready().await, Err(ClientError::Http { .. })));
        assert!(!client.is_ready().await);
    }

    #[tokio::test]
    async fn test_infer_sends_request_and_parses_scores() {
        let scores = vec![0.1, 0.9, 0.05, 0.2, 0.3, 0.0, 0.0, 0.0, 0.0, 0.0];
        let server = MockTriton::with_scores(scores.clone()).spawn().await.unwrap();
        let client = client_for(format!("{}/", server.base_url));

        let response = client.infer(&test_tensor()).await.unwrap();
        assert_eq!(response.first_scores().unwrap(), scores.as_slice());

        let received = server.last_request().await.unwrap();
        assert_eq!(received.inputs[0].name, "data");
        assert_eq!(received.inputs[0].shape, vec![1, 3, 224, 224]);
        assert_eq!(received.inputs[0].datatype, "FP32");
        assert_eq!(received.inputs[0].data.len(), 150_528);
        assert_eq!(received.outputs[0].name, "resnetv17_dense0_fwd");
        assert!(received.id.is_some());
        assert_eq!(response.id, received.id);
    }

    #[tokio::test]
    async fn test_infer_error_status_keeps_body() {
        let server = MockTriton {
            infer_status: 500,
            infer_body: "model crashed".to_string(),
            ..MockTriton::with_scores(vec![])
        }
        .spawn()
        .await
        .unwrap();
        let client = client_for(server.base_url.clone());

        match client.infer(&test_tensor()).await {
            Err(ClientError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "model crashed");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_infer_malformed_body() {
        let server = MockTriton {
            infer_body: "not json".to_string(),
            ..MockTriton::with_scores(vec![])
        }
        .spawn()
        .await
        .unwrap();
        let client = client_for(server.base_url.clone());

        assert!(matches!(client.infer(&test_tensor()).await, Err(ClientError::Decode(_))));
    }

    #[tokio::test]
    async fn test_sample_host_rejects_missing_user_agent() {
        let server = MockTriton::with_scores(vec![]).spawn().await.unwrap();

        let bare = reqwest::Client::new().get(server.sample_url()).send().await.unwrap();
        assert_eq!(bare.status(), StatusCode::FORBIDDEN);
        assert!(server.sample_user_agent().await.is_none());
    }

    #[tokio::test]
    async fn test_download_writes_file() {
        let server = MockTriton::with_scores(vec![]).spawn().await.unwrap();
        let client = client_for(server.base_url.clone());
        let dest = std::env::temp_dir().join(format!("triton-client-{}-sample.jpg", std::process::id()));

        let path = client.download(&server.sample_url(), &dest).await.unwrap();
        let written = std::fs::read(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(written, MockTriton::with_scores(vec![]).sample_bytes);
        assert_eq!(server.sample_user_agent().await.as_deref(), Some(USER_AGENT));

        let missing = format!("{}/samples/missing.jpg", server.base_url);
        assert!(matches!(
            client.download(&missing, &dest).await,
            Err(ClientError::DownloadStatus { status: 404, .. })
        ));
    }
}
