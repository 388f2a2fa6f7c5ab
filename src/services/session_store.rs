// ============================================================================
// SESSION STORE - Sesión de aplicación y token de registro en storage
// ============================================================================
// Lectores: una entrada ilegible o expirada se BORRA, no solo se ignora.
// ============================================================================

use std::rc::Rc;

use serde::de::DeserializeOwned;

use crate::error::StorageError;
use crate::models::{LoginResponseData, ProviderUser, StoredAppSession, StoredRegistrationToken};
use crate::services::avatar::build_default_avatar;
use crate::services::roles::resolve_login_role;
use crate::utils::storage::save_to_storage;
use crate::utils::{
    now_millis, KeyValueStorage, Subscription, APP_SESSION_STORAGE_KEY, APP_SESSION_TTL_MS,
    REGISTRATION_TOKEN_STORAGE_KEY, REGISTRATION_TOKEN_TTL_MS,
};

/// Lee `key`, purga si no parsea o si `is_expired` lo descarta
fn load_expiring<T, F>(storage: &dyn KeyValueStorage, key: &str, is_expired: F) -> Option<T>
where
    T: DeserializeOwned,
    F: FnOnce(&T) -> bool,
{
    let raw = match storage.get_item(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            log::warn!("⚠️ [SESSION] No se pudo leer '{}': {}", key, e);
            return None;
        }
    };

    let value = match serde_json::from_str::<T>(&raw) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("⚠️ [SESSION] Entrada '{}' ilegible, se elimina: {}", key, e);
            purge(storage, key);
            return None;
        }
    };

    if is_expired(&value) {
        log::info!("⌛ [SESSION] Entrada '{}' expirada, se elimina", key);
        purge(storage, key);
        return None;
    }

    Some(value)
}

fn purge(storage: &dyn KeyValueStorage, key: &str) {
    if let Err(e) = storage.remove_item(key) {
        log::error!("❌ [SESSION] No se pudo eliminar '{}': {}", key, e);
    }
}

/// Sesión de aplicación persistida bajo `pos_auth_session`
#[derive(Clone)]
pub struct AppSessionStore {
    storage: Rc<dyn KeyValueStorage>,
}

impl AppSessionStore {
    pub fn new(storage: Rc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Sesión vigente o `None` (purga la entrada si está expirada o corrupta)
    pub fn load(&self) -> Option<StoredAppSession> {
        self.load_at(now_millis())
    }

    pub fn load_at(&self, now_ms: i64) -> Option<StoredAppSession> {
        load_expiring(self.storage.as_ref(), APP_SESSION_STORAGE_KEY, |session: &StoredAppSession| {
            session.is_expired_at(now_ms)
        })
    }

    pub fn store(&self, session: &StoredAppSession) -> Result<(), StorageError> {
        save_to_storage(self.storage.as_ref(), APP_SESSION_STORAGE_KEY, session)
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove_item(APP_SESSION_STORAGE_KEY)
    }

    /// Modifica la sesión vigente si existe. Devuelve la sesión escrita.
    pub fn update<F>(&self, updater: F) -> Result<Option<StoredAppSession>, StorageError>
    where
        F: FnOnce(&mut StoredAppSession),
    {
        let Some(mut session) = self.load() else {
            return Ok(None);
        };
        updater(&mut session);
        self.store(&session)?;
        Ok(Some(session))
    }

    /// Cambios cross-tab de la clave de sesión (o storage vaciado)
    pub fn subscribe(&self, on_change: Rc<dyn Fn()>) -> Subscription {
        self.storage.subscribe(Rc::new(move |key: Option<&str>| {
            if key.is_none() || key == Some(APP_SESSION_STORAGE_KEY) {
                on_change();
            }
        }))
    }
}

/// Token de registro pendiente (pantalla OTP)
#[derive(Clone)]
pub struct RegistrationTokenStore {
    storage: Rc<dyn KeyValueStorage>,
}

impl RegistrationTokenStore {
    pub fn new(storage: Rc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    pub fn remember(&self, email: &str, registration_token: &str) -> Result<StoredRegistrationToken, StorageError> {
        let token = StoredRegistrationToken {
            email: email.to_string(),
            registration_token: registration_token.to_string(),
            expires_at: now_millis() + REGISTRATION_TOKEN_TTL_MS,
        };
        save_to_storage(self.storage.as_ref(), REGISTRATION_TOKEN_STORAGE_KEY, &token)?;
        Ok(token)
    }

    pub fn load(&self) -> Option<StoredRegistrationToken> {
        self.load_at(now_millis())
    }

    pub fn load_at(&self, now_ms: i64) -> Option<StoredRegistrationToken> {
        load_expiring(
            self.storage.as_ref(),
            REGISTRATION_TOKEN_STORAGE_KEY,
            |token: &StoredRegistrationToken| token.is_expired_at(now_ms),
        )
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove_item(REGISTRATION_TOKEN_STORAGE_KEY)
    }
}

/// Construye la sesión de aplicación a partir de la respuesta de login/bridge.
///
/// - email: el de la respuesta, si no `fallback_email`
/// - avatar y nombre: respuesta, luego metadata del proveedor, luego avatar generado
/// - `cartCreated` se conserva solo si la sesión previa es del mismo email
/// - expira en 24 h desde `now_ms`
pub fn build_app_session(
    data: &LoginResponseData,
    fallback_email: &str,
    provider_user: Option<&ProviderUser>,
    previous: Option<&StoredAppSession>,
    now_ms: i64,
) -> StoredAppSession {
    let email = data
        .email()
        .filter(|s| !s.is_empty())
        .unwrap_or(fallback_email)
        .to_string();

    let avatar_url = data
        .avatar_url()
        .filter(|s| !s.is_empty())
        .or_else(|| provider_user.and_then(ProviderUser::avatar_url))
        .map(str::to_string)
        .unwrap_or_else(|| build_default_avatar(Some(&email)));

    let full_name = data
        .full_name()
        .or_else(|| provider_user.and_then(ProviderUser::full_name))
        .map(str::to_string);

    let cart_created = previous
        .filter(|p| p.belongs_to(&email))
        .map(|p| p.cart_created)
        .unwrap_or(false);

    let role = resolve_login_role(data.access_token(), data.refresh_token(), data.declared_role());

    StoredAppSession {
        email,
        access_token: data.access_token().map(str::to_string),
        refresh_token: data.refresh_token().map(str::to_string),
        full_name,
        avatar_url: Some(avatar_url),
        role: Some(role),
        cart_created,
        expires_at: now_ms + APP_SESSION_TTL_MS,
        extra: Default::default(),
    }
}
