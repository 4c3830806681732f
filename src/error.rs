use thiserror::Error;

/// Shown when the service rejects a join without saying why.
pub const FALLBACK_SERVICE_MESSAGE: &str = "Something went wrong";

/// Everything that can go wrong while joining or counting participants. The `Display` output is
/// what the user sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("Please enter your name")]
    Validation,

    #[error("{0}")]
    Service(String),

    #[error("Could not reach the Secret Santa service. Check your connection and try again.")]
    Network { detail: String },
}

impl JoinError {
    pub fn network(detail: impl Into<String>) -> Self {
        JoinError::Network {
            detail: detail.into(),
        }
    }

    /// Builds a service error from the optional `error` field of a response body.
    pub fn service(message: Option<String>) -> Self {
        match message {
            Some(m) if !m.trim().is_empty() => JoinError::Service(m),
            _ => JoinError::Service(FALLBACK_SERVICE_MESSAGE.to_string()),
        }
    }

    /// Extra context for the logs. Never shown to the user.
    pub fn detail(&self) -> &str {
        match self {
            JoinError::Network { detail } => detail,
            JoinError::Service(message) => message,
            JoinError::Validation => "empty name",
        }
    }
}

impl From<serde_json::Error> for JoinError {
    fn from(e: serde_json::Error) -> Self {
        JoinError::network(format!("invalid response body: {e}"))
    }
}

#[cfg(feature = "hydrate")]
impl From<gloo_net::Error> for JoinError {
    fn from(e: gloo_net::Error) -> Self {
        JoinError::network(e.to_string())
    }
}
