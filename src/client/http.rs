use super::{ClassifierApi, RequestError};
use crate::model::{AnalysisResult, BlockReceipt, ClientConfig, Operation};
use crate::selection::Artifact;
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Multipart field the service reads the capture from.
const FILE_FIELD: &str = "file";

/// reqwest-backed client for the `/predict` and `/block` endpoints.
#[derive(Clone)]
pub struct RequestClient {
    http: reqwest::Client,
    predict_url: Url,
    block_url: Url,
}

/// Shape of the error bodies the service sends with non-2xx statuses.
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct BlockBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    filename: Option<String>,
}

/// Parse the base URL, making sure relative joins append to its path
/// instead of replacing the last segment.
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim()).with_context(|| format!("invalid base URL: {raw}"))?;
    if url.cannot_be_a_base() {
        anyhow::bail!("base URL cannot have paths appended: {raw}");
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn error_detail(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .map(|b| b.error)
        .filter(|e| !e.trim().is_empty())
}

impl RequestClient {
    pub fn new(cfg: &ClientConfig) -> Result<Self> {
        let base = parse_base_url(&cfg.base_url)?;
        let predict_url = base
            .join(Operation::Analyze.endpoint())
            .context("build predict URL")?;
        let block_url = base
            .join(Operation::Block.endpoint())
            .context("build block URL")?;

        let mut builder = reqwest::Client::builder().user_agent(cfg.user_agent.clone());
        if let Some(timeout) = cfg.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("build HTTP client")?;

        Ok(Self {
            http,
            predict_url,
            block_url,
        })
    }

    pub fn url_for(&self, op: Operation) -> &Url {
        match op {
            Operation::Analyze => &self.predict_url,
            Operation::Block => &self.block_url,
        }
    }

    /// Send the artifact as a single multipart upload and return the body of a 2xx response.
    async fn post_artifact(
        &self,
        op: Operation,
        artifact: &Artifact,
    ) -> Result<(StatusCode, Bytes), RequestError> {
        let url = self.url_for(op).clone();
        let part = Part::bytes(artifact.content().to_vec())
            .file_name(artifact.name().to_string())
            .mime_str(artifact.media_type())?;
        let form = Form::new().part(FILE_FIELD, part);

        debug!(%url, file = artifact.name(), bytes = artifact.len(), "submitting capture");
        let resp = self.http.post(url).multipart(form).send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;

        if !status.is_success() {
            let detail = error_detail(&body);
            warn!(%op, %status, detail = detail.as_deref().unwrap_or("-"), "request rejected");
            return Err(RequestError::Status { status, detail });
        }
        Ok((status, body))
    }
}

#[async_trait]
impl ClassifierApi for RequestClient {
    async fn submit_analysis(&self, artifact: &Artifact) -> Result<AnalysisResult, RequestError> {
        let (_, body) = self.post_artifact(Operation::Analyze, artifact).await?;
        let result: AnalysisResult = serde_json::from_slice(&body)
            .map_err(|e| RequestError::MalformedResponse(e.to_string()))?;
        info!(
            legitimate = result.legitimate,
            low_rated = result.low_rated,
            high_rated = result.high_rated,
            "analysis received"
        );
        Ok(result)
    }

    async fn submit_block(&self, artifact: &Artifact) -> Result<BlockReceipt, RequestError> {
        let (status, body) = self.post_artifact(Operation::Block, artifact).await?;
        // The body is informational only; an unreadable one is still a success.
        let parsed = serde_json::from_slice::<BlockBody>(&body).ok();
        let (message, filename) = parsed
            .map(|b| (b.message, b.filename))
            .unwrap_or_default();
        info!(%status, filename = filename.as_deref().unwrap_or("-"), "blocklist requested");
        Ok(BlockReceipt {
            status: status.as_u16(),
            message,
            filename,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Multipart;
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn config(base_url: &str) -> ClientConfig {
        ClientConfig {
            base_url: base_url.to_string(),
            timeout: Some(std::time::Duration::from_secs(5)),
            user_agent: "ddos-predictor-test".into(),
        }
    }

    async fn spawn_server(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    /// Read the `file` field and check it carries the expected name and media type.
    async fn read_upload(mut multipart: Multipart) -> Result<Bytes, String> {
        while let Ok(Some(field)) = multipart.next_field().await {
            if field.name() != Some("file") {
                continue;
            }
            if field.file_name() != Some("traffic.csv") {
                return Err(format!("unexpected file name {:?}", field.file_name()));
            }
            if field.content_type() != Some("text/csv") {
                return Err(format!("unexpected content type {:?}", field.content_type()));
            }
            return field.bytes().await.map_err(|e| e.to_string());
        }
        Err("No file provided".into())
    }

    fn artifact() -> Artifact {
        Artifact::new("traffic.csv", b"src_ip,pkts\n10.0.0.1,4\n".to_vec())
    }

    #[test]
    fn base_url_keeps_path_prefix() {
        let client = RequestClient::new(&config("http://example.test/api")).unwrap();
        assert_eq!(
            client.url_for(Operation::Analyze).as_str(),
            "http://example.test/api/predict"
        );
        assert_eq!(
            client.url_for(Operation::Block).as_str(),
            "http://example.test/api/block"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(RequestClient::new(&config("not a url")).is_err());
    }

    #[tokio::test]
    async fn analysis_parses_counts_from_single_upload() {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits2 = hits.clone();
        let app = Router::new().route(
            "/predict",
            post(move |multipart: Multipart| {
                let hits = hits2.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    match read_upload(multipart).await {
                        Ok(_) => (
                            AxumStatus::OK,
                            Json(json!({
                                "legitimate_count": 12,
                                "low_rated_count": 3,
                                "high_rated_count": 1
                            })),
                        ),
                        Err(e) => (AxumStatus::BAD_REQUEST, Json(json!({ "error": e }))),
                    }
                }
            }),
        );
        let base = spawn_server(app).await;
        let client = RequestClient::new(&config(&base)).unwrap();

        let result = client.submit_analysis(&artifact()).await.unwrap();
        assert_eq!(
            result,
            AnalysisResult {
                legitimate: 12,
                low_rated: 3,
                high_rated: 1
            }
        );
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn analysis_server_error_carries_detail() {
        let app = Router::new().route(
            "/predict",
            post(|| async {
                (
                    AxumStatus::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "No IP address column found" })),
                )
            }),
        );
        let base = spawn_server(app).await;
        let client = RequestClient::new(&config(&base)).unwrap();

        let err = client.submit_analysis(&artifact()).await.unwrap_err();
        match &err {
            RequestError::Status { status, detail } => {
                assert_eq!(*status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(detail.as_deref(), Some("No IP address column found"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.kind(), crate::client::FailureKind::Transport);
        assert!(err.to_string().contains("No IP address column found"));
    }

    #[tokio::test]
    async fn analysis_with_missing_counts_is_malformed() {
        let app = Router::new().route(
            "/predict",
            post(|| async { Json(json!({ "legitimate_count": 4 })) }),
        );
        let base = spawn_server(app).await;
        let client = RequestClient::new(&config(&base)).unwrap();

        let err = client.submit_analysis(&artifact()).await.unwrap_err();
        assert!(matches!(err, RequestError::MalformedResponse(_)));
        assert_eq!(err.kind(), crate::client::FailureKind::MalformedResponse);
    }

    #[tokio::test]
    async fn analysis_with_non_json_body_is_malformed() {
        let app = Router::new().route("/predict", post(|| async { "DDOS Analysis API is running" }));
        let base = spawn_server(app).await;
        let client = RequestClient::new(&config(&base)).unwrap();

        let err = client.submit_analysis(&artifact()).await.unwrap_err();
        assert!(matches!(err, RequestError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn block_succeeds_on_2xx_and_surfaces_filename() {
        let app = Router::new().route(
            "/block",
            post(|multipart: Multipart| async move {
                match read_upload(multipart).await {
                    Ok(_) => (
                        AxumStatus::OK,
                        Json(json!({
                            "success": true,
                            "message": "Blocked IPs list saved successfully to Reports folder",
                            "filename": "blocked_ips_20240101_120000.csv"
                        })),
                    ),
                    Err(e) => (AxumStatus::BAD_REQUEST, Json(json!({ "error": e }))),
                }
            }),
        );
        let base = spawn_server(app).await;
        let client = RequestClient::new(&config(&base)).unwrap();

        let receipt = client.submit_block(&artifact()).await.unwrap();
        assert_eq!(receipt.status, 200);
        assert_eq!(
            receipt.filename.as_deref(),
            Some("blocked_ips_20240101_120000.csv")
        );
    }

    #[tokio::test]
    async fn block_ignores_body_shape() {
        let app = Router::new().route(
            "/block",
            post(|| async { (AxumStatus::ACCEPTED, "queued") }),
        );
        let base = spawn_server(app).await;
        let client = RequestClient::new(&config(&base)).unwrap();

        let receipt = client.submit_block(&artifact()).await.unwrap();
        assert_eq!(receipt.status, 202);
        assert_eq!(receipt.filename, None);
        assert_eq!(receipt.message, None);
    }

    #[tokio::test]
    async fn block_non_2xx_is_failure() {
        let app = Router::new().route(
            "/block",
            post(|| async {
                (
                    AxumStatus::BAD_REQUEST,
                    Json::<Value>(json!({
                        "error": "No predictions available. Please analyze the file first."
                    })),
                )
            }),
        );
        let base = spawn_server(app).await;
        let client = RequestClient::new(&config(&base)).unwrap();

        let err = client.submit_block(&artifact()).await.unwrap_err();
        assert!(matches!(
            err,
            RequestError::Status { status, .. } if status == StatusCode::BAD_REQUEST
        ));
    }

    #[tokio::test]
    async fn unreachable_service_is_transport_failure() {
        // Bind then drop to get a port nobody listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = RequestClient::new(&config(&format!("http://{addr}"))).unwrap();
        let err = client.submit_analysis(&artifact()).await.unwrap_err();
        assert!(matches!(err, RequestError::Transport(_)));
    }
}
