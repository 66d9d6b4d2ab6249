//! In-process mock Triton server for tests

use crate::protocol::InferenceRequest;
use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Canned behavior for the mock server
#[derive(Debug, Clone)]
pub struct MockTriton {
    /// Status for `GET /v2/health/ready`
    pub server_ready: u16,
    /// Status for `GET /v2/models/{model}/ready` when the model matches
    pub model_ready: u16,
    /// Model the server knows about; other names get 404
    pub model: String,
    /// Status for `POST /v2/models/{model}/infer`
    pub infer_status: u16,
    /// Raw inference response body
    pub infer_body: String,
    /// Served at `GET /samples/test_image.jpg`; requests without a
    /// `User-Agent` get 403, as public media hosts do
    pub sample_bytes: Vec<u8>,
}

impl MockTriton {
    /// Healthy server whose inference returns `scores` as its only output
    pub fn with_scores(scores: Vec<f64>) -> Self {
        let classes = scores.len();
        let body = json!({
            "model_name": "resnet50",
            "model_version": "1",
            "outputs": [{
                "name": "resnetv17_dense0_fwd",
                "datatype": "FP32",
                "shape": [1, classes],
                "data": scores,
            }]
        });

        Self {
            server_ready: 200,
            model_ready: 200,
            model: "resnet50".to_string(),
            infer_status: 200,
            infer_body: body.to_string(),
            sample_bytes: b"\xFF\xD8\xFF\xE0mock-jpeg".to_vec(),
        }
    }

    /// Bind to an ephemeral local port and serve in the background
    pub async fn spawn(self) -> std::io::Result<MockServer> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let base_url = format!("http://{}", listener.local_addr()?);

        let state = Arc::new(MockState {
            behavior: self,
            last_request: RwLock::new(None),
            sample_user_agent: RwLock::new(None),
        });

        let app = Router::new()
            .route("/v2/health/ready", get(server_ready))
            .route("/v2/models/:model/ready", get(model_ready))
            .route("/v2/models/:model/infer", post(infer))
            .route("/samples/test_image.jpg", get(sample))
            // Full-size FP32 requests exceed the 2MB default
            .layer(DefaultBodyLimit::max(64 * 1024 * 1024))
            .with_state(state.clone());

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(MockServer { base_url, state })
    }
}

struct MockState {
    behavior: MockTriton,
    last_request: RwLock<Option<InferenceRequest>>,
    sample_user_agent: RwLock<Option<String>>,
}

/// Handle to a running mock server
pub struct MockServer {
    /// `http://127.0.0.1:<port>`
    pub base_url: String,
    state: Arc<MockState>,
}

impl MockServer {
    /// URL of the canned sample image
    pub fn sample_url(&self) -> String {
        format!("{}/samples/test_image.jpg", self.base_url)
    }

    /// Most recent inference request body, if any
    pub async fn last_request(&self) -> Option<InferenceRequest> {
        self.state.last_request.read().await.clone()
    }

    /// `User-Agent` of the last accepted sample download
    pub async fn sample_user_agent(&self) -> Option<String> {
        self.state.sample_user_agent.read().await.clone()
    }
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

async fn server_ready(State(state): State<Arc<MockState>>) -> StatusCode {
    status(state.behavior.server_ready)
}

async fn model_ready(State(state): State<Arc<MockState>>, Path(model): Path<String>) -> StatusCode {
    if model != state.behavior.model {
        return StatusCode::NOT_FOUND;
    }
    status(state.behavior.model_ready)
}

async fn infer(
    State(state): State<Arc<MockState>>,
    Path(model): Path<String>,
    Json(request): Json<InferenceRequest>,
) -> impl IntoResponse {
    let id = request.id.clone();
    *state.last_request.write().await = Some(request);

    if model != state.behavior.model {
        return (StatusCode::NOT_FOUND, format!("unknown model '{}'", model));
    }

    let code = status(state.behavior.infer_status);
    let mut body = state.behavior.infer_body.clone();

    // Echo the request id like Triton does
    if code == StatusCode::OK {
        if let (Ok(Value::Object(mut map)), Some(id)) = (serde_json::from_str::<Value>(&body), id) {
            map.insert("id".to_string(), Value::String(id));
            body = Value::Object(map).to_string();
        }
    }

    (code, body)
}

async fn sample(State(state): State<Arc<MockState>>, headers: HeaderMap) -> impl IntoResponse {
    let agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let Some(agent) = agent else {
        return (StatusCode::FORBIDDEN, Vec::new()).into_response();
    };
    *state.sample_user_agent.write().await = Some(agent);

    (
        [(header::CONTENT_TYPE, "image/jpeg")],
        state.behavior.sample_bytes.clone(),
    )
        .into_response()
}
