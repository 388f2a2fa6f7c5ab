// ============================================================================
// API CLIENT - SOLO COMUNICACIÓN HTTP (Stateless)
// ============================================================================
// NO tiene lógica de negocio, solo hace requests HTTP. Adjunta el bearer de
// la sesión de aplicación guardada cuando existe.
// ============================================================================

use async_trait::async_trait;
use gloo_net::http::{Request, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::config::CONFIG;
use crate::error::ApiError;
use crate::models::{
    BridgeLoginRequest, CartSummary, CompleteRegistrationRequest, LoginRequest, LoginResponseData,
    RegisterRequest, RegistrationData, StandardResponse,
};
use crate::services::session_store::AppSessionStore;
use crate::utils::{BRIDGE_LOGIN_PATH, CART_PATH, COMPLETE_REGISTRATION_PATH, CREATE_CART_PATH, LOGIN_PATH, REGISTER_PATH};

/// Endpoints del backend que consume la capa de identidad
#[async_trait(?Send)]
pub trait BackendApi {
    async fn login(&self, request: &LoginRequest) -> Result<StandardResponse<LoginResponseData>, ApiError>;

    /// Cambia un usuario autenticado por el proveedor por tokens propios
    async fn bridge_login(
        &self,
        request: &BridgeLoginRequest,
    ) -> Result<StandardResponse<LoginResponseData>, ApiError>;

    async fn register(&self, request: &RegisterRequest) -> Result<StandardResponse<RegistrationData>, ApiError>;

    async fn complete_registration(
        &self,
        request: &CompleteRegistrationRequest,
    ) -> Result<StandardResponse<Value>, ApiError>;

    async fn create_cart(&self, identifier: &str) -> Result<(), ApiError>;

    async fn fetch_cart(&self, member_id: &str) -> Result<CartSummary, ApiError>;
}

/// Cliente API - SOLO comunicación HTTP
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    sessions: Option<AppSessionStore>,
}

impl ApiClient {
    pub fn new() -> Self {
        Self::with_base_url(&CONFIG.api_base_url)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            sessions: None,
        }
    }

    /// Usa la sesión guardada para el header `Authorization`
    pub fn with_session_store(mut self, sessions: AppSessionStore) -> Self {
        self.sessions = Some(sessions);
        self
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let token = self
            .sessions
            .as_ref()
            .and_then(AppSessionStore::load)
            .and_then(|session| session.access_token);

        match token {
            Some(token) => builder.header("Authorization", &format!("Bearer {}", token)),
            None => builder,
        }
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let response = self
            .authorize(Request::post(&self.url(path)))
            .json(body)
            .map_err(|e| ApiError::Decode(format!("Serialization error: {}", e)))?
            .send()
            .await?;

        read_json(check_status(response).await?).await
    }

    async fn get_json<T>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let response = self
            .authorize(Request::get(&self.url(path)))
            .query(query.iter().copied())
            .send()
            .await?;

        read_json(check_status(response).await?).await
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    if response.ok() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let error = ApiError::Http {
        status,
        message: error_message(&body).unwrap_or_else(|| response.status_text()),
    };
    if error.is_unauthorized() {
        log::warn!("🔒 [API] 401: la sesión expiró, hay que volver a iniciar sesión");
    }
    Err(error)
}

/// `message` del cuerpo de error si es JSON, si no el texto tal cual
fn error_message(body: &str) -> Option<String> {
    if body.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<Value>(body) {
        Ok(json) => json.get("message").and_then(Value::as_str).map(str::to_string),
        Err(_) => Some(body.to_string()),
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}

#[async_trait(?Send)]
impl BackendApi for ApiClient {
    async fn login(&self, request: &LoginRequest) -> Result<StandardResponse<LoginResponseData>, ApiError> {
        log::info!("🔐 Login para: {}", request.email);
        self.post_json(LOGIN_PATH, request).await
    }

    async fn bridge_login(
        &self,
        request: &BridgeLoginRequest,
    ) -> Result<StandardResponse<LoginResponseData>, ApiError> {
        log::info!("🌉 Bridge login para: {}", request.email);
        self.post_json(BRIDGE_LOGIN_PATH, request).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<StandardResponse<RegistrationData>, ApiError> {
        log::info!("📝 Registro: {}", request.email);
        self.post_json(REGISTER_PATH, request).await
    }

    async fn complete_registration(
        &self,
        request: &CompleteRegistrationRequest,
    ) -> Result<StandardResponse<Value>, ApiError> {
        self.post_json(COMPLETE_REGISTRATION_PATH, request).await
    }

    async fn create_cart(&self, identifier: &str) -> Result<(), ApiError> {
        let path = format!("{}/{}", CREATE_CART_PATH, urlencoding::encode(identifier));
        log::info!("🛒 Creando carrito para: {}", identifier);

        let response = self.authorize(Request::post(&self.url(&path))).send().await?;
        check_status(response).await?;
        Ok(())
    }

    async fn fetch_cart(&self, member_id: &str) -> Result<CartSummary, ApiError> {
        self.get_json(CART_PATH, &[("memberId", member_id)]).await
    }
}
