// API client module: maps each image operation to its configured endpoint
// and sends the caller's upload form there in a single POST.

use crate::config::{Config, StatusPolicy};
use crate::error::{ApiError, TransportError};
use crate::payload::UploadForm;
use crate::transport::{ApiResponse, HttpTransport, Transport};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

/// Backend capabilities the client knows how to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    RemoveBackground,
    /// `already_background_removed` selects between the two enhance
    /// endpoints (see `EnhanceRouting`).
    Enhance { already_background_removed: bool },
    AddColorBackground,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::RemoveBackground => f.write_str("remove background"),
            Operation::Enhance {
                already_background_removed: true,
            } => f.write_str("enhance"),
            Operation::Enhance {
                already_background_removed: false,
            } => f.write_str("enhance original"),
            Operation::AddColorBackground => f.write_str("add color background"),
        }
    }
}

/// Client for the image backend. Holds the configuration it was built with
/// and a transport; it keeps no other state, so clones are cheap and calls
/// are independent of each other.
#[derive(Clone)]
pub struct ApiClient<T = HttpTransport> {
    config: Arc<Config>,
    transport: T,
}

impl ApiClient<HttpTransport> {
    /// Create a client that talks HTTP, honoring `config.timeout_secs`.
    pub fn new(config: Config) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(config.timeout())?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn with_transport(config: Config, transport: T) -> Self {
        Self {
            config: Arc::new(config),
            transport,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn submit_remove_background(
        &self,
        payload: UploadForm,
    ) -> Result<ApiResponse, ApiError> {
        self.submit(Operation::RemoveBackground, payload).await
    }

    pub async fn submit_enhance(
        &self,
        payload: UploadForm,
        already_background_removed: bool,
    ) -> Result<ApiResponse, ApiError> {
        self.submit(
            Operation::Enhance {
                already_background_removed,
            },
            payload,
        )
        .await
    }

    /// Enhance an image whose background was already removed.
    pub async fn submit_enhance_default(
        &self,
        payload: UploadForm,
    ) -> Result<ApiResponse, ApiError> {
        self.submit_enhance(payload, true).await
    }

    pub async fn submit_add_color_background(
        &self,
        payload: UploadForm,
    ) -> Result<ApiResponse, ApiError> {
        self.submit(Operation::AddColorBackground, payload).await
    }

    /// POST `payload` to the endpoint for `op`. One attempt, no retry.
    pub async fn submit(&self, op: Operation, payload: UploadForm) -> Result<ApiResponse, ApiError> {
        let url = self.config.url_for(op);
        debug!(%op, %url, bytes = payload.bytes.len(), "sending request");

        let res = match self.transport.post(&url, payload).await {
            Ok(res) => res,
            Err(source) => {
                error!(%op, %url, error = %source, "API call failed");
                return Err(ApiError::Transport { url, source });
            }
        };

        if res.is_success() || self.config.status_policy == StatusPolicy::PassThrough {
            debug!(%op, status = res.status, "request completed");
            return Ok(res);
        }

        error!(%op, %url, status = res.status, "API call failed");
        Err(ApiError::Status {
            url,
            status: res.status,
            body: res.text(),
        })
    }
}
