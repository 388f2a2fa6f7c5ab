// ============================================================================
// AUTH SERVICE - Flujos de usuario: login, registro, OAuth y logout
// ============================================================================

use std::rc::Rc;

use serde_json::Value;

use crate::config::CONFIG;
use crate::error::{ApiError, AuthFlowError};
use crate::models::{
    AppRole, CompleteRegistrationRequest, LoginRequest, RegisterRequest, RegistrationData, StoredAppSession,
};
use crate::services::api_client::BackendApi;
use crate::services::cart_service::CartService;
use crate::services::provider_client::AuthProvider;
use crate::services::session_store::{build_app_session, AppSessionStore, RegistrationTokenStore};
use crate::utils::{now_millis, spawn_local, KeyValueStorage};

/// Resultado de un login con contraseña
#[derive(Debug, Clone, PartialEq)]
pub struct LoginOutcome {
    pub session: StoredAppSession,
    /// `Manager` va al back-office
    pub role: AppRole,
    pub message: Option<String>,
}

/// Destino del retorno OAuth: dominio configurado o `origin`, siempre con `/` final
pub fn oauth_redirect_target(domain_url: Option<&str>, origin: &str) -> String {
    let base = domain_url
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .unwrap_or(origin);
    format!("{}/", base.trim_end_matches('/'))
}

#[derive(Clone)]
pub struct AuthService {
    api: Rc<dyn BackendApi>,
    provider: Rc<dyn AuthProvider>,
    sessions: AppSessionStore,
    registrations: RegistrationTokenStore,
    cart: CartService,
    domain_url: Option<String>,
}

impl AuthService {
    pub fn new(api: Rc<dyn BackendApi>, provider: Rc<dyn AuthProvider>, storage: Rc<dyn KeyValueStorage>) -> Self {
        let sessions = AppSessionStore::new(storage.clone());
        Self {
            cart: CartService::new(api.clone(), sessions.clone()),
            api,
            provider,
            sessions,
            registrations: RegistrationTokenStore::new(storage),
            domain_url: CONFIG.domain_url.clone(),
        }
    }

    pub fn with_domain_url(mut self, domain_url: Option<String>) -> Self {
        self.domain_url = domain_url;
        self
    }

    pub fn sessions(&self) -> &AppSessionStore {
        &self.sessions
    }

    pub fn registrations(&self) -> &RegistrationTokenStore {
        &self.registrations
    }

    pub async fn login_with_password(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthFlowError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthFlowError::Validation("Email and password are required.".to_string()));
        }

        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self.api.login(&request).await?;
        if !response.success {
            let message = response.message.unwrap_or_else(|| "Login failed.".to_string());
            log::warn!("⚠️ Login rechazado para {}: {}", email, message);
            return Err(ApiError::Rejected(message).into());
        }

        let data = response.data.unwrap_or_default();
        let previous = self.sessions.load();
        let session = build_app_session(&data, email, None, previous.as_ref(), now_millis());

        if let Err(e) = self.registrations.clear() {
            log::warn!("⚠️ No se pudo limpiar el token de registro: {}", e);
        }
        self.sessions.store(&session)?;
        log::info!("✅ Login correcto: {}", session.email);

        let cart = self.cart.clone();
        spawn_local(async move {
            cart.ensure_cart().await;
        });

        Ok(LoginOutcome {
            role: session.role.unwrap_or(AppRole::User),
            session,
            message: response.message,
        })
    }

    /// Primer paso del registro: el backend envía un OTP por email
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<RegistrationData, AuthFlowError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthFlowError::Validation("Email and password are required.".to_string()));
        }
        if password != confirm_password {
            return Err(AuthFlowError::Validation(
                "Password and confirmation do not match.".to_string(),
            ));
        }

        let request = RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: confirm_password.to_string(),
        };
        let response = self.api.register(&request).await?;
        if !response.success {
            let message = response.message.unwrap_or_else(|| "Registration failed.".to_string());
            return Err(ApiError::Rejected(message).into());
        }

        let data = response
            .data
            .ok_or_else(|| ApiError::Decode("registration response without data".to_string()))?;
        let token_email = if data.email.is_empty() { email } else { data.email.as_str() };
        self.registrations.remember(token_email, &data.registration_token)?;
        log::info!("📧 Código de verificación enviado a {}", token_email);
        Ok(data)
    }

    /// Segundo paso: valida el OTP con el token de registro guardado
    pub async fn complete_registration(&self, otp_code: &str) -> Result<Option<Value>, AuthFlowError> {
        let Some(pending) = self.registrations.load() else {
            return Err(AuthFlowError::RegistrationExpired);
        };
        let otp_code = otp_code.trim();
        if otp_code.is_empty() {
            return Err(AuthFlowError::Validation("Verification code is required.".to_string()));
        }

        let request = CompleteRegistrationRequest {
            email: pending.email.clone(),
            registration_token: pending.registration_token.clone(),
            otp_code: otp_code.to_string(),
        };
        let response = self.api.complete_registration(&request).await?;
        if !response.success {
            let message = response.message.unwrap_or_else(|| "Verification failed.".to_string());
            return Err(ApiError::Rejected(message).into());
        }

        self.registrations.clear()?;
        log::info!("✅ Registro completado: {}", pending.email);
        Ok(response.data)
    }

    /// Limpia el estado local y redirige al proveedor OAuth
    pub async fn begin_oauth_login(&self, oauth_provider: &str, origin: &str) -> Result<(), AuthFlowError> {
        self.sessions.clear()?;
        self.registrations.clear()?;

        let redirect_to = oauth_redirect_target(self.domain_url.as_deref(), origin);
        log::info!("🔑 Login OAuth ({}) con retorno a {}", oauth_provider, redirect_to);
        self.provider.sign_in_with_oauth(oauth_provider, &redirect_to).await?;
        Ok(())
    }

    /// Borra el estado local antes de avisar al proveedor: sus listeners
    /// re-resuelven la identidad y ya no deben encontrar la sesión local
    pub async fn sign_out(&self) -> Result<(), AuthFlowError> {
        self.sessions.clear()?;
        self.registrations.clear()?;
        if let Err(e) = self.provider.sign_out().await {
            log::error!("❌ Error cerrando sesión en el proveedor: {}", e);
        }
        log::info!("👋 Sesión cerrada");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_prefers_configured_domain() {
        assert_eq!(
            oauth_redirect_target(Some("https://shop.example.com"), "http://localhost:8080"),
            "https://shop.example.com/"
        );
        assert_eq!(
            oauth_redirect_target(Some("https://shop.example.com/"), "http://localhost:8080"),
            "https://shop.example.com/"
        );
    }

    #[test]
    fn redirect_falls_back_to_origin() {
        assert_eq!(oauth_redirect_target(None, "http://localhost:8080"), "http://localhost:8080/");
        assert_eq!(oauth_redirect_target(Some("  "), "http://localhost:8080/"), "http://localhost:8080/");
    }
}
