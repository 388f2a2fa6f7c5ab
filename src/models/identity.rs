use serde::{Deserialize, Serialize};

use crate::models::role::AppRole;

/// Fuente que autenticó al usuario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentitySource {
    External,
    Local,
}

/// Vista derivada (nunca persistida) del usuario actual
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub provider: IdentitySource,
    pub role: Option<AppRole>,
}

impl Identity {
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.email)
    }

    /// Inicial para el avatar por defecto del header
    pub fn avatar_initial(&self) -> char {
        self.display_name()
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('P')
    }

    pub fn is_manager(&self) -> bool {
        self.role.is_some_and(|role| role.is_manager())
    }
}
