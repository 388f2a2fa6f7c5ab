use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Envoltorio estándar del backend: `{ success, message, data, timestamp }`
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct StandardResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BridgeLoginRequest {
    pub provider_id: String,
    pub email: String,
    pub created_at: Option<String>,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationData {
    pub email: String,
    #[serde(default)]
    pub message: String,
    pub registration_token: String,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRegistrationRequest {
    pub email: String,
    pub registration_token: String,
    pub otp_code: String,
}

/// Datos de login / bridge-login.
///
/// El backend envía los campos en camelCase o en snake_case; se aceptan los
/// dos y los accesores prefieren camelCase. Solo se serializa camelCase.
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug, Default)]
pub struct LoginResponseData {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, rename = "accessToken")]
    pub access_token: Option<String>,
    #[serde(default, rename = "access_token", skip_serializing)]
    pub access_token_snake: Option<String>,
    #[serde(default, rename = "refreshToken")]
    pub refresh_token: Option<String>,
    #[serde(default, rename = "refresh_token", skip_serializing)]
    pub refresh_token_snake: Option<String>,
    #[serde(default, rename = "avatarUrl")]
    pub avatar_url: Option<String>,
    #[serde(default, rename = "avatar_url", skip_serializing)]
    pub avatar_url_snake: Option<String>,
    #[serde(default, rename = "fullName")]
    pub full_name: Option<String>,
    #[serde(default, rename = "full_name", skip_serializing)]
    pub full_name_snake: Option<String>,
    #[serde(default)]
    pub role: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LoginResponseData {
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref().or(self.access_token_snake.as_deref())
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().or(self.refresh_token_snake.as_deref())
    }

    pub fn avatar_url(&self) -> Option<&str> {
        self.avatar_url.as_deref().or(self.avatar_url_snake.as_deref())
    }

    pub fn full_name(&self) -> Option<&str> {
        self.full_name.as_deref().or(self.full_name_snake.as_deref())
    }

    /// `role` tal cual lo manda el backend (solo cuenta si es exactamente "Manager")
    pub fn declared_role(&self) -> Option<&str> {
        self.role.as_ref().and_then(Value::as_str)
    }
}
