// ============================================================================
// SESSION BRIDGE - Usuario del proveedor OAuth -> sesión de aplicación
// ============================================================================
// Un usuario autenticado por el proveedor sin sesión propia válida se cambia
// por tokens del backend (`bridge-login`) y se persiste como sesión local.
// Intentos concurrentes para el mismo usuario se descartan mientras uno está
// en vuelo, sea cual sea la instancia de `SessionBridge` que los lance (el
// registro es uno por hilo); el ticket se libera al salir (éxito, fallo, skip
// o drop).
// Cada bridge completado avisa a todos los suscriptores, no solo a quien lo
// lanzó.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::models::{BridgeLoginRequest, ProviderSession, StoredAppSession};
use crate::services::api_client::BackendApi;
use crate::services::cart_service::CartService;
use crate::services::session_store::{build_app_session, AppSessionStore};
use crate::state::ReactiveState;
use crate::utils::{now_millis, spawn_local, Subscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Ya existe una sesión local vigente del mismo email
    AlreadyBridged,
    /// El usuario del proveedor no tiene email
    MissingEmail,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BridgeOutcome {
    Bridged(StoredAppSession),
    Skipped(SkipReason),
    /// Otra sincronización para el mismo usuario sigue en curso
    AlreadyInFlight,
    Failed(String),
}

#[derive(Debug, Clone, Copy)]
struct InFlightTicket {
    id: u64,
    started_at: i64,
}

#[derive(Default)]
struct InFlight {
    tickets: RefCell<HashMap<String, InFlightTicket>>,
    next_ticket: Cell<u64>,
}

type InFlightRegistry = Rc<InFlight>;

thread_local! {
    static IN_FLIGHT: InFlightRegistry = Rc::default();
}

/// Libera el ticket del usuario al hacer drop
struct InFlightGuard {
    registry: InFlightRegistry,
    user_id: String,
    ticket_id: u64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut registry = self.registry.tickets.borrow_mut();
        if registry.get(&self.user_id).is_some_and(|t| t.id == self.ticket_id) {
            registry.remove(&self.user_id);
        }
    }
}

pub struct SessionBridge {
    api: Rc<dyn BackendApi>,
    sessions: AppSessionStore,
    cart: CartService,
    in_flight: InFlightRegistry,
    completed: ReactiveState<u64>,
}

impl SessionBridge {
    pub fn new(api: Rc<dyn BackendApi>, sessions: AppSessionStore) -> Self {
        let cart = CartService::new(api.clone(), sessions.clone());
        Self {
            api,
            sessions,
            cart,
            in_flight: IN_FLIGHT.with(Rc::clone),
            completed: ReactiveState::new(0),
        }
    }

    /// `callback` corre tras cada sesión de aplicación persistida por un bridge
    pub fn on_bridged<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + 'static,
    {
        self.completed.subscribe(callback)
    }

    pub fn is_in_flight(&self, provider_user_id: &str) -> bool {
        self.in_flight.tickets.borrow().contains_key(provider_user_id)
    }

    /// Momento (ms) en que empezó la sincronización en curso del usuario
    pub fn in_flight_since(&self, provider_user_id: &str) -> Option<i64> {
        self.in_flight.tickets.borrow().get(provider_user_id).map(|t| t.started_at)
    }

    fn acquire(&self, provider_user_id: &str) -> Option<InFlightGuard> {
        let mut registry = self.in_flight.tickets.borrow_mut();
        if registry.contains_key(provider_user_id) {
            return None;
        }

        let id = self.in_flight.next_ticket.get();
        self.in_flight.next_ticket.set(id + 1);
        registry.insert(
            provider_user_id.to_string(),
            InFlightTicket {
                id,
                started_at: now_millis(),
            },
        );

        Some(InFlightGuard {
            registry: self.in_flight.clone(),
            user_id: provider_user_id.to_string(),
            ticket_id: id,
        })
    }

    /// ¿Hace falta bridge? No si hay sesión local vigente del mismo email
    pub fn needs_bridge(&self, provider_session: &ProviderSession) -> bool {
        match (provider_session.user.email(), self.sessions.load()) {
            (Some(email), Some(local)) => !local.belongs_to(email),
            _ => true,
        }
    }

    /// Sincroniza la sesión del proveedor con una sesión de aplicación.
    ///
    /// Nunca falla: los errores se registran y se devuelven como `Failed`.
    pub async fn sync(&self, provider_session: &ProviderSession) -> BridgeOutcome {
        let user = &provider_session.user;

        let Some(_guard) = self.acquire(&user.id) else {
            log::debug!("⏳ [BRIDGE] Ya hay un bridge en curso para {}", user.id);
            return BridgeOutcome::AlreadyInFlight;
        };

        let Some(email) = user.email() else {
            log::warn!("⚠️ [BRIDGE] Usuario {} sin email, no se puede hacer bridge", user.id);
            return BridgeOutcome::Skipped(SkipReason::MissingEmail);
        };

        if !self.needs_bridge(provider_session) {
            log::debug!("✅ [BRIDGE] Sesión local vigente para {}, nada que hacer", email);
            return BridgeOutcome::Skipped(SkipReason::AlreadyBridged);
        }

        let request = BridgeLoginRequest {
            provider_id: user.id.clone(),
            email: email.to_string(),
            created_at: user.created_at.clone(),
        };

        let response = match self.api.bridge_login(&request).await {
            Ok(response) => response,
            Err(e) => {
                log::error!("❌ [BRIDGE] Error en bridge-login para {}: {}", email, e);
                return BridgeOutcome::Failed(e.to_string());
            }
        };

        if !response.success {
            let message = response
                .message
                .unwrap_or_else(|| "bridge login rejected".to_string());
            log::error!("❌ [BRIDGE] Bridge rechazado para {}: {}", email, message);
            return BridgeOutcome::Failed(message);
        }

        let data = response.data.unwrap_or_default();
        let previous = self.sessions.load();
        let session = build_app_session(&data, email, Some(user), previous.as_ref(), now_millis());

        if let Err(e) = self.sessions.store(&session) {
            log::error!("❌ [BRIDGE] No se pudo guardar la sesión: {}", e);
            return BridgeOutcome::Failed(e.to_string());
        }

        log::info!("✅ [BRIDGE] Sesión de aplicación creada para {}", session.email);
        self.completed.update(|count| *count += 1);

        let cart = self.cart.clone();
        spawn_local(async move {
            let status = cart.ensure_cart().await;
            log::debug!("🛒 [BRIDGE] Provisión de carrito: {:?}", status);
        });

        BridgeOutcome::Bridged(session)
    }
}
