// ============================================================================
// SESIÓN DE APLICACIÓN - Blob persistido en localStorage ("pos_auth_session")
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::role::{deserialize_lenient_role, AppRole};

/// Sesión emitida por el backend propio (login con password o bridge OAuth).
///
/// Los campos desconocidos se conservan en `extra` para que sobrevivan a una
/// reescritura.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAppSession {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_lenient_role"
    )]
    pub role: Option<AppRole>,
    #[serde(default)]
    pub cart_created: bool,
    /// Milisegundos desde epoch
    pub expires_at: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StoredAppSession {
    pub fn new(email: impl Into<String>, expires_at: i64) -> Self {
        Self {
            email: email.into(),
            access_token: None,
            refresh_token: None,
            full_name: None,
            avatar_url: None,
            role: None,
            cart_created: false,
            expires_at,
            extra: Map::new(),
        }
    }

    /// Inválida en el instante en que `now > expiresAt`
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms > self.expires_at
    }

    pub fn belongs_to(&self, email: &str) -> bool {
        self.email == email
    }
}

/// Token de registro pendiente de confirmar con OTP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRegistrationToken {
    pub email: String,
    pub registration_token: String,
    pub expires_at: i64,
}

impl StoredRegistrationToken {
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms > self.expires_at
    }
}
