// ============================================================================
// ERRORES - Taxonomía de fallos de la capa de identidad
// ============================================================================
// Ningún fallo del flujo de identidad es fatal: estos tipos solo llegan a los
// flujos de usuario (login, registro, logout). La resolución de identidad los
// registra y degrada a "sin identidad".
// ============================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable")]
    Unavailable,
    #[error("storage access failed: {0}")]
    Access(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("parse error: {0}")]
    Decode(String),
    /// El backend respondió `success: false`
    #[error("{0}")]
    Rejected(String),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Http { status: 401, .. })
    }
}

impl From<gloo_net::Error> for ApiError {
    fn from(error: gloo_net::Error) -> Self {
        match error {
            gloo_net::Error::SerdeError(e) => ApiError::Decode(e.to_string()),
            other => ApiError::Network(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider network error: {0}")]
    Network(String),
    #[error("provider HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("provider response could not be parsed: {0}")]
    Decode(String),
    #[error("OAuth error: {0}")]
    OAuth(String),
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<gloo_net::Error> for ProviderError {
    fn from(error: gloo_net::Error) -> Self {
        match error {
            gloo_net::Error::SerdeError(e) => ProviderError::Decode(e.to_string()),
            other => ProviderError::Network(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthFlowError {
    #[error("{0}")]
    Validation(String),
    #[error("Verification code has expired. Please register again.")]
    RegistrationExpired,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
