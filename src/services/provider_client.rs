// ============================================================================
// PROVIDER CLIENT - Proveedor de identidad externo (GoTrue / Supabase Auth)
// ============================================================================
// El proveedor es dueño de su sesión: aquí solo se lee, se refresca, se
// cierra y se notifica a los listeners cuando cambia.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use async_trait::async_trait;
use gloo_net::http::{Request, RequestBuilder, Response};
use serde::Deserialize;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;
use web_sys::window;

use crate::config::CONFIG;
use crate::error::ProviderError;
use crate::models::{AuthChangeEvent, ProviderSession, ProviderUser};
use crate::utils::storage::{load_from_storage, save_to_storage};
use crate::utils::{now_seconds, KeyValueStorage, Subscription, PROVIDER_SESSION_STORAGE_KEY};

pub type AuthStateListener = Rc<dyn Fn(AuthChangeEvent, Option<ProviderSession>)>;

#[async_trait(?Send)]
pub trait AuthProvider {
    /// Sesión actual del proveedor (`None` si no hay usuario)
    async fn get_session(&self) -> Result<Option<ProviderSession>, ProviderError>;

    /// Notificaciones de cambio; se dejan de recibir al soltar la `Subscription`
    fn on_auth_state_change(&self, listener: AuthStateListener) -> Subscription;

    async fn sign_out(&self) -> Result<(), ProviderError>;

    /// Redirige al login OAuth del proveedor (`google`, ...)
    async fn sign_in_with_oauth(&self, provider: &str, redirect_to: &str) -> Result<(), ProviderError>;
}

// ----------------------------------------------------------------------------
// Registro de listeners
// ----------------------------------------------------------------------------

#[derive(Default)]
struct ListenerRegistry {
    listeners: RefCell<Vec<(u64, AuthStateListener)>>,
    next_id: Cell<u64>,
}

impl ListenerRegistry {
    fn add(&self, listener: AuthStateListener) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    fn remove(&self, id: u64) {
        self.listeners.borrow_mut().retain(|(listener_id, _)| *listener_id != id);
    }

    fn notify(&self, event: AuthChangeEvent, session: Option<&ProviderSession>) {
        let listeners: Vec<AuthStateListener> = self.listeners.borrow().iter().map(|(_, l)| l.clone()).collect();
        for listener in listeners {
            listener(event, session.cloned());
        }
    }
}

// ----------------------------------------------------------------------------
// Callback OAuth (#access_token=...&refresh_token=...)
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OAuthFragment {
    Tokens {
        access_token: String,
        refresh_token: Option<String>,
        expires_in: Option<i64>,
        expires_at: Option<i64>,
    },
    Error(String),
}

/// Interpreta el fragmento de la URL de retorno del proveedor
pub fn parse_oauth_fragment(fragment: &str) -> Option<OAuthFragment> {
    let fragment = fragment.trim_start_matches('#');
    if fragment.is_empty() {
        return None;
    }

    let mut access_token = None;
    let mut refresh_token = None;
    let mut expires_in = None;
    let mut expires_at = None;
    let mut error = None;
    let mut error_description = None;

    for pair in fragment.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let value = urlencoding::decode(&value.replace('+', " "))
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| value.to_string());
        match key {
            "access_token" => access_token = Some(value),
            "refresh_token" => refresh_token = Some(value),
            "expires_in" => expires_in = value.parse().ok(),
            "expires_at" => expires_at = value.parse().ok(),
            "error" => error = Some(value),
            "error_description" => error_description = Some(value),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Some(OAuthFragment::Error(error_description.unwrap_or(error)));
    }

    access_token
        .filter(|token| !token.is_empty())
        .map(|access_token| OAuthFragment::Tokens {
            access_token,
            refresh_token,
            expires_in,
            expires_at,
        })
}

#[derive(Debug, Deserialize)]
struct GoTrueError {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

// ----------------------------------------------------------------------------
// Cliente GoTrue
// ----------------------------------------------------------------------------

/// Cliente REST del proveedor. Persiste su sesión en `storage` y avisa a otras
/// pestañas a través de los eventos de ese mismo storage.
#[derive(Clone)]
pub struct GoTrueClient {
    base_url: String,
    anon_key: String,
    storage: Rc<dyn KeyValueStorage>,
    listeners: Rc<ListenerRegistry>,
}

impl GoTrueClient {
    pub fn new(base_url: &str, anon_key: &str, storage: Rc<dyn KeyValueStorage>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            storage,
            listeners: Rc::new(ListenerRegistry::default()),
        }
    }

    pub fn from_config(storage: Rc<dyn KeyValueStorage>) -> Self {
        Self::new(&CONFIG.auth_provider_url, &CONFIG.auth_provider_anon_key, storage)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.base_url, path)
    }

    fn with_keys(&self, builder: RequestBuilder, access_token: Option<&str>) -> RequestBuilder {
        let bearer = access_token.unwrap_or(&self.anon_key);
        builder
            .header("apikey", &self.anon_key)
            .header("Authorization", &format!("Bearer {}", bearer))
    }

    fn load_persisted(&self) -> Option<ProviderSession> {
        load_from_storage(self.storage.as_ref(), PROVIDER_SESSION_STORAGE_KEY)
    }

    fn persist(&self, session: &ProviderSession) -> Result<(), ProviderError> {
        save_to_storage(self.storage.as_ref(), PROVIDER_SESSION_STORAGE_KEY, session)?;
        Ok(())
    }

    fn forget(&self) {
        if let Err(e) = self.storage.remove_item(PROVIDER_SESSION_STORAGE_KEY) {
            log::error!("❌ [PROVIDER] No se pudo borrar la sesión: {}", e);
        }
    }

    async fn fetch_user(&self, access_token: &str) -> Result<ProviderUser, ProviderError> {
        let response = self
            .with_keys(Request::get(&self.url("/user")), Some(access_token))
            .send()
            .await?;
        let response = check_status(response).await?;
        response
            .json::<ProviderUser>()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<ProviderSession, ProviderError> {
        let response = self
            .with_keys(Request::post(&self.url("/token?grant_type=refresh_token")), None)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .map_err(|e| ProviderError::Decode(e.to_string()))?
            .send()
            .await?;
        let response = check_status(response).await?;
        let session = response
            .json::<ProviderSession>()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;
        Ok(session.normalized(now_seconds()))
    }

    /// Consume el fragmento de retorno OAuth si lo hay
    async fn take_oauth_callback(&self) -> Result<Option<ProviderSession>, ProviderError> {
        let Some(fragment) = current_fragment() else {
            return Ok(None);
        };
        let Some(parsed) = parse_oauth_fragment(&fragment) else {
            return Ok(None);
        };
        strip_fragment();

        match parsed {
            OAuthFragment::Error(description) => Err(ProviderError::OAuth(description)),
            OAuthFragment::Tokens {
                access_token,
                refresh_token,
                expires_in,
                expires_at,
            } => {
                let user = self.fetch_user(&access_token).await?;
                let session = ProviderSession {
                    access_token,
                    refresh_token,
                    expires_at,
                    expires_in,
                    user,
                }
                .normalized(now_seconds());
                self.persist(&session)?;
                log::info!("✅ [PROVIDER] Sesión OAuth iniciada: {:?}", session.user.email);
                self.listeners.notify(AuthChangeEvent::SignedIn, Some(&session));
                Ok(Some(session))
            }
        }
    }
}

#[async_trait(?Send)]
impl AuthProvider for GoTrueClient {
    async fn get_session(&self) -> Result<Option<ProviderSession>, ProviderError> {
        if let Some(session) = self.take_oauth_callback().await? {
            return Ok(Some(session));
        }

        let Some(session) = self.load_persisted() else {
            return Ok(None);
        };
        if !session.is_expired_at(now_seconds()) {
            return Ok(Some(session));
        }

        let Some(refresh_token) = session.refresh_token.clone() else {
            self.forget();
            return Ok(None);
        };

        match self.refresh(&refresh_token).await {
            Ok(refreshed) => {
                self.persist(&refreshed)?;
                log::info!("🔄 [PROVIDER] Token refrescado");
                self.listeners.notify(AuthChangeEvent::TokenRefreshed, Some(&refreshed));
                Ok(Some(refreshed))
            }
            Err(e) => {
                log::warn!("⚠️ [PROVIDER] No se pudo refrescar la sesión: {}", e);
                self.forget();
                self.listeners.notify(AuthChangeEvent::SignedOut, None);
                Ok(None)
            }
        }
    }

    fn on_auth_state_change(&self, listener: AuthStateListener) -> Subscription {
        let id = self.listeners.add(listener.clone());

        // Otra pestaña inició o cerró sesión
        let storage = self.storage.clone();
        let cross_tab = self.storage.subscribe(Rc::new(move |key: Option<&str>| {
            if key.is_some() && key != Some(PROVIDER_SESSION_STORAGE_KEY) {
                return;
            }
            match load_from_storage::<ProviderSession>(storage.as_ref(), PROVIDER_SESSION_STORAGE_KEY) {
                Some(session) => listener(AuthChangeEvent::SignedIn, Some(session)),
                None => listener(AuthChangeEvent::SignedOut, None),
            }
        }));

        let registry: Weak<ListenerRegistry> = Rc::downgrade(&self.listeners);
        Subscription::new(move || {
            drop(cross_tab);
            if let Some(registry) = registry.upgrade() {
                registry.remove(id);
            }
        })
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        if let Some(session) = self.load_persisted() {
            let result = self
                .with_keys(Request::post(&self.url("/logout")), Some(&session.access_token))
                .send()
                .await;
            match result {
                Ok(response) if !response.ok() => {
                    log::warn!("⚠️ [PROVIDER] Logout respondió {}", response.status());
                }
                Err(e) => log::warn!("⚠️ [PROVIDER] Logout falló: {}", e),
                Ok(_) => {}
            }
        }

        self.forget();
        log::info!("👋 [PROVIDER] Sesión cerrada");
        self.listeners.notify(AuthChangeEvent::SignedOut, None);
        Ok(())
    }

    async fn sign_in_with_oauth(&self, provider: &str, redirect_to: &str) -> Result<(), ProviderError> {
        let url = format!(
            "{}?provider={}&redirect_to={}",
            self.url("/authorize"),
            urlencoding::encode(provider),
            urlencoding::encode(redirect_to)
        );
        let win = window().ok_or_else(|| ProviderError::Unavailable("no window".to_string()))?;
        log::info!("🔑 [PROVIDER] Redirigiendo a OAuth ({})", provider);
        win.location()
            .assign(&url)
            .map_err(|e| ProviderError::Unavailable(format!("{:?}", e)))
    }
}

async fn check_status(response: Response) -> Result<Response, ProviderError> {
    if response.ok() {
        return Ok(response);
    }
    let status = response.status();
    let message = match response.json::<GoTrueError>().await {
        Ok(body) => body
            .msg
            .or(body.error_description)
            .or(body.message)
            .unwrap_or_else(|| response.status_text()),
        Err(_) => response.status_text(),
    };
    Err(ProviderError::Http { status, message })
}

#[cfg(target_arch = "wasm32")]
fn current_fragment() -> Option<String> {
    window()?.location().hash().ok().filter(|hash| hash.len() > 1)
}

/// Fuera del navegador no hay barra de direcciones
#[cfg(not(target_arch = "wasm32"))]
fn current_fragment() -> Option<String> {
    None
}

/// Quita los tokens de la barra de direcciones sin recargar
#[cfg(target_arch = "wasm32")]
fn strip_fragment() {
    let Some(win) = window() else {
        return;
    };
    let location = win.location();
    let clean = format!(
        "{}{}",
        location.pathname().unwrap_or_default(),
        location.search().unwrap_or_default()
    );
    if let Ok(history) = win.history() {
        if let Err(e) = history.replace_state_with_url(&JsValue::NULL, "", Some(&clean)) {
            log::warn!("⚠️ [PROVIDER] No se pudo limpiar el fragmento: {:?}", e);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn strip_fragment() {}
