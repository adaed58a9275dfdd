use thiserror::Error;

use crate::models::ErrorPayload;
use crate::transport::TransportError;

#[derive(Debug, Error)]
pub enum ApiError {
  /// Skipped locally while the global rate-limit cooldown is active.
  #[error("request suppressed by rate-limit cooldown")]
  Suppressed,

  /// Timeout or no response; the next scheduled cycle retries implicitly.
  #[error("transport failure: {0}")]
  Transport(#[from] TransportError),

  #[error("authentication rejected; the secret key is not set or incorrect")]
  AuthRejected,

  #[error("rate limited by the remote api")]
  RateLimited,

  #[error("server error (status {status})")]
  Server { status: u16, body: String },

  /// Structured business error; surfaced to the caller, not retried.
  #[error("api error {}: {}", .0.error_code, .0.error_message)]
  Api(ErrorPayload),

  /// Malformed body on a success status. The operation aborts for this
  /// cycle with no state mutated.
  #[error("failed to parse response body: {message}")]
  Parse { message: String, body: String },
}

pub type Result<T> = std::result::Result<T, ApiError>;
