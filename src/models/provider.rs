// ============================================================================
// SESIÓN DEL PROVEEDOR - Forma GoTrue (snake_case)
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub user_metadata: Map<String, Value>,
}

impl ProviderUser {
    fn metadata_str(&self, key: &str) -> Option<&str> {
        self.user_metadata
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn full_name(&self) -> Option<&str> {
        self.metadata_str("full_name")
    }

    pub fn avatar_url(&self) -> Option<&str> {
        self.metadata_str("avatar_url")
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Segundos desde epoch
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: ProviderUser,
}

impl ProviderSession {
    /// Completa `expires_at` a partir de `expires_in` si el servidor no lo envía
    pub fn normalized(mut self, now_secs: i64) -> Self {
        if self.expires_at.is_none() {
            self.expires_at = self.expires_in.map(|secs| now_secs + secs);
        }
        self
    }

    /// Sin `expires_at` se considera vigente
    pub fn is_expired_at(&self, now_secs: i64) -> bool {
        self.expires_at.is_some_and(|exp| now_secs >= exp)
    }
}

/// Notificaciones de cambio del proveedor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthChangeEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
}
