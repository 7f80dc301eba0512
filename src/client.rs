use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::model::{PredictionResult, SelectedFile};

/// Anything able to turn an uploaded image into a prediction.
#[async_trait]
pub trait Predictor: Send + Sync {
    async fn predict(&self, file: &SelectedFile) -> Result<PredictionResult>;
}

/// Posts the image to the prediction backend as multipart field `file`.
///
/// No timeout is configured and failures are never retried.
#[derive(Clone)]
pub struct HttpPredictor {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpPredictor {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn form(file: &SelectedFile) -> Form {
        // `Bytes` clones share the buffer, so the upload is never copied
        let part = || {
            Part::stream_with_length(
                reqwest::Body::from(file.data.clone()),
                file.data.len() as u64,
            )
            .file_name(file.file_name.clone())
        };
        let part = match &file.content_type {
            // an unparsable browser-supplied type falls back to the default
            Some(content_type) => part().mime_str(content_type).unwrap_or_else(|_| part()),
            None => part(),
        };
        Form::new().part("file", part)
    }
}

#[async_trait]
impl Predictor for HttpPredictor {
    async fn predict(&self, file: &SelectedFile) -> Result<PredictionResult> {
        info!(
            file_name = %file.file_name,
            size = file.data.len(),
            endpoint = %self.endpoint,
            "sending image to prediction backend"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(Self::form(file))
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        debug!(%status, body = %String::from_utf8_lossy(&body[..body.len().min(500)]), "prediction response");

        if !status.is_success() {
            return Err(AppError::UpstreamStatus {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let result = PredictionResult::from_slice(&body)?;
        info!(timestamp = %result.timestamp, items = %result.items, "prediction received");
        Ok(result)
    }
}
