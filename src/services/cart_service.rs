use std::rc::Rc;

use crate::error::ApiError;
use crate::models::{CartSummary, StoredAppSession};
use crate::services::api_client::BackendApi;
use crate::services::session_store::AppSessionStore;
use crate::services::unverified_claims::unverified_user_identifier_from_token;

/// Resultado de `ensure_cart` (solo informativo, nunca es un error)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartProvisioning {
    NoSession,
    AlreadyCreated,
    MissingIdentifier,
    Created,
    Failed,
}

/// Carrito del miembro asociado a la sesión de aplicación
#[derive(Clone)]
pub struct CartService {
    api: Rc<dyn BackendApi>,
    sessions: AppSessionStore,
}

impl CartService {
    pub fn new(api: Rc<dyn BackendApi>, sessions: AppSessionStore) -> Self {
        Self { api, sessions }
    }

    fn identifier_for(session: &StoredAppSession) -> Option<String> {
        session
            .access_token
            .as_deref()
            .and_then(unverified_user_identifier_from_token)
    }

    /// Identificador de miembro (claim del access token) de la sesión vigente
    pub fn current_cart_identifier(&self) -> Option<String> {
        self.sessions.load().as_ref().and_then(Self::identifier_for)
    }

    /// Crea el carrito del miembro una sola vez por sesión (`cartCreated`)
    pub async fn ensure_cart(&self) -> CartProvisioning {
        let Some(session) = self.sessions.load() else {
            return CartProvisioning::NoSession;
        };
        if session.cart_created {
            return CartProvisioning::AlreadyCreated;
        }
        let Some(identifier) = Self::identifier_for(&session) else {
            log::debug!("🛒 Sin identificador de miembro en el token, no se crea carrito");
            return CartProvisioning::MissingIdentifier;
        };

        if let Err(e) = self.api.create_cart(&identifier).await {
            log::warn!("⚠️ Failed to ensure cart for session: {}", e);
            return CartProvisioning::Failed;
        }

        // Releer: la sesión pudo cambiar durante la petición
        let marked = self.sessions.update(|current| {
            if current.belongs_to(&session.email) {
                current.cart_created = true;
            }
        });
        match marked {
            Ok(_) => {
                log::info!("✅ Carrito creado para {}", session.email);
                CartProvisioning::Created
            }
            Err(e) => {
                log::error!("❌ Carrito creado pero no se pudo marcar la sesión: {}", e);
                CartProvisioning::Failed
            }
        }
    }

    pub async fn fetch_cart(&self) -> Result<Option<CartSummary>, ApiError> {
        let Some(identifier) = self.current_cart_identifier() else {
            return Ok(None);
        };
        match self.api.fetch_cart(&identifier).await {
            Ok(cart) => Ok(Some(cart)),
            Err(e) => {
                log::warn!("⚠️ Failed to load cart for session: {}", e);
                Err(e)
            }
        }
    }
}
