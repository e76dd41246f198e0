// Library root
// ------------
// Client for the image-editing backend, plus the terminal front end that
// drives it. The binary (`main.rs`) wires them together.
//
// Module responsibilities:
// - `config`: the immutable client configuration (base URL, endpoint
//   paths, upload limits, feature flags, policy switches).
// - `api`: maps operations to endpoints and performs the POST.
// - `transport`: the HTTP seam behind `api`.
// - `payload`: multipart upload forms built by callers.
// - `ui`: interactive menu; consumes feature flags and upload limits.
// - `logging`: tracing subscriber setup for the binary.
pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod payload;
pub mod transport;
pub mod ui;

pub use api::{ApiClient, Operation};
pub use config::Config;
pub use error::{ApiError, ConfigError, PayloadError, TransportError};
pub use payload::UploadForm;
pub use transport::{ApiResponse, HttpTransport, Transport};
