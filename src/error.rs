use thiserror::Error;

use crate::transport::TransportError;

/// Normalized license-API failure.
///
/// Everything that prevents the client from obtaining usable license
/// information collapses here: transport faults, timeouts, unexpected HTTP
/// statuses, malformed bodies, and application-level errors the server
/// reports inside an otherwise successful response. Downstream logic treats
/// them all the same way ("no actionable license info"), so they share one
/// kind. Missing credentials are *not* an error; see
/// [`crate::client::LicenseClient::fetch_license_info`].
#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-success HTTP status from the license endpoint.
    #[error("license server returned status {0}")]
    Status(u16),

    /// Body was not valid JSON, not an object, or not the expected shape.
    #[error("malformed license response: {0}")]
    Malformed(String),

    /// The server reported an application-level error (e.g. an invalid key)
    /// despite a successful transport exchange.
    #[error("license server error: {0}")]
    Server(String),

    /// The transport call exceeded its configured timeout.
    #[error("license request timed out")]
    Timeout,

    /// Connection or protocol failure below the HTTP layer.
    #[error("license request failed: {0}")]
    Transport(String),
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout => ApiError::Timeout,
            TransportError::Other(msg) => ApiError::Transport(msg),
        }
    }
}

/// Construction-time misuse. Fatal at setup: the client refuses to exist
/// rather than fail on every later call.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Plugin installations must supply the path to the plugin's main file,
    /// or the local version comparison can never proceed.
    #[error("plugin installations require a plugin file path")]
    MissingPluginFile,
}
