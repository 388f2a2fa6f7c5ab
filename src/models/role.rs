use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Rol de la aplicación. Cualquier otro valor se considera no reconocido (`None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppRole {
    User,
    Manager,
}

impl AppRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppRole::User => "User",
            AppRole::Manager => "Manager",
        }
    }

    pub fn parse(value: &str) -> Option<AppRole> {
        match value {
            "Manager" => Some(AppRole::Manager),
            "User" => Some(AppRole::User),
            _ => None,
        }
    }

    /// Normaliza el valor de un claim de rol: string, o lista (se usa el primer elemento)
    pub fn from_claim_value(value: &Value) -> Option<AppRole> {
        match value {
            Value::String(s) => AppRole::parse(s),
            Value::Array(items) => items.first().and_then(AppRole::from_claim_value),
            _ => None,
        }
    }

    pub fn is_manager(&self) -> bool {
        matches!(self, AppRole::Manager)
    }
}

impl std::fmt::Display for AppRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Un rol desconocido en storage se lee como "sin rol" en vez de invalidar la sesión
pub(crate) fn deserialize_lenient_role<'de, D>(deserializer: D) -> Result<Option<AppRole>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(AppRole::from_claim_value))
}
