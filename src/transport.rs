// Transport layer: the one place that talks to the network. `ApiClient` is
// generic over `Transport` so tests can swap in an in-memory recorder.

use crate::error::TransportError;
use crate::payload::UploadForm;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart;
use reqwest::Client;
use std::time::Duration;
use tracing::trace;

/// A response as received from the backend, body fully read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text, lossily decoded. Used for error messages.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends one POST and returns whatever comes back. Implementations must not
/// retry and must not interpret the status code.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, url: &str, form: UploadForm) -> Result<ApiResponse, TransportError>;
}

/// `reqwest`-backed transport.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::with_source("failed to build HTTP client", e))?;
        Ok(Self { client })
    }

    fn to_multipart(form: UploadForm) -> Result<multipart::Form, TransportError> {
        let part = multipart::Part::bytes(form.bytes)
            .file_name(form.file_name)
            .mime_str(&form.mime)
            .map_err(|e| TransportError::with_source("invalid MIME type for upload", e))?;
        let mut out = multipart::Form::new().part(form.field_name, part);
        for (name, value) in form.fields {
            out = out.text(name, value);
        }
        Ok(out)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, url: &str, form: UploadForm) -> Result<ApiResponse, TransportError> {
        let body = Self::to_multipart(form)?;
        let res = self.client.post(url).multipart(body).send().await?;

        let status = res.status().as_u16();
        let content_type = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = res.bytes().await?.to_vec();
        trace!(url, status, bytes = body.len(), "response received");

        Ok(ApiResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range() {
        let mut res = ApiResponse {
            status: 200,
            content_type: None,
            body: Vec::new(),
        };
        assert!(res.is_success());
        res.status = 299;
        assert!(res.is_success());
        res.status = 304;
        assert!(!res.is_success());
        res.status = 199;
        assert!(!res.is_success());
    }

    #[test]
    fn bad_mime_is_rejected_before_sending() {
        let form = UploadForm::new("x.png", "not a mime", vec![0]);
        assert!(HttpTransport::to_multipart(form).is_err());
    }
}
