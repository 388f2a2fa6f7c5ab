// ============================================================================
// IDENTITY VIEWMODEL - ¿Quién es el usuario actual?
// ============================================================================
// Reconcilia la sesión del proveedor OAuth con la sesión de aplicación local y
// publica una única `Option<Identity>` reactiva. El proveedor siempre gana; la
// sesión local es el fallback.
//
// Ciclo de vida: `mount()` registra listeners y lanza la primera resolución;
// `dispose()` los suelta y marca la instancia como muerta. Todo resultado
// asíncrono que llegue después se descarta.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::models::{AuthChangeEvent, Identity, IdentitySource, ProviderSession, StoredAppSession};
use crate::services::{
    extract_role_from_session, AppSessionStore, AuthProvider, BackendApi, SessionBridge,
};
use crate::state::ReactiveState;
use crate::utils::{now_millis, spawn_local, KeyValueStorage, Subscription};
use crate::viewmodels::IdentityContext;

/// Identidad derivada de ambas sesiones (función pura).
///
/// - sesión del proveedor → identidad `External`; el rol sale de la sesión
///   local solo si es del mismo email
/// - si no, sesión local vigente → identidad `Local`
/// - si no, `None`
pub fn resolve(
    provider: Option<&ProviderSession>,
    local: Option<&StoredAppSession>,
    now_ms: i64,
) -> Option<Identity> {
    let local = local.filter(|session| !session.is_expired_at(now_ms));

    if let Some(session) = provider {
        let user = &session.user;
        let email = user.email().unwrap_or_default().to_string();
        let role = local
            .filter(|l| !email.is_empty() && l.belongs_to(&email))
            .and_then(|l| extract_role_from_session(Some(l)));

        return Some(Identity {
            full_name: user.full_name().map(str::to_string),
            avatar_url: user.avatar_url().map(str::to_string),
            provider: IdentitySource::External,
            role,
            email,
        });
    }

    local.map(|session| Identity {
        email: session.email.clone(),
        full_name: session.full_name.clone(),
        avatar_url: session.avatar_url.clone(),
        provider: IdentitySource::Local,
        role: extract_role_from_session(Some(session)),
    })
}

struct Inner {
    provider: Rc<dyn AuthProvider>,
    sessions: AppSessionStore,
    bridge: Rc<SessionBridge>,
    identity: ReactiveState<Option<Identity>>,
    last_provider_session: RefCell<Option<ProviderSession>>,
    alive: Cell<bool>,
    mounted: Cell<bool>,
    subscriptions: RefCell<Vec<Subscription>>,
}

impl Inner {
    fn publish(&self, identity: Option<Identity>) {
        if !self.alive.get() {
            return;
        }
        if self.identity.set(identity.clone()) {
            match &identity {
                Some(identity) => log::debug!("👤 [IDENTITY] {} ({:?})", identity.email, identity.provider),
                None => log::debug!("👤 [IDENTITY] Sin identidad"),
            }
        }
    }

    /// Pasos 2-3: publica a partir de la sesión del proveedor y dispara el bridge
    fn apply_provider_session(self: &Rc<Self>, session: Option<ProviderSession>) {
        if !self.alive.get() {
            return;
        }
        *self.last_provider_session.borrow_mut() = session.clone();

        let local = self.sessions.load();
        self.publish(resolve(session.as_ref(), local.as_ref(), now_millis()));

        if let Some(session) = session {
            self.spawn_bridge(session);
        }
    }

    /// Cambio cross-tab: solo se relee el storage local
    fn rederive_from_storage(&self) {
        if !self.alive.get() {
            return;
        }
        let provider = self.last_provider_session.borrow().clone();
        let local = self.sessions.load();
        self.publish(resolve(provider.as_ref(), local.as_ref(), now_millis()));
    }

    /// El resultado llega a todos los viewmodels vía `on_bridged`
    fn spawn_bridge(&self, session: ProviderSession) {
        let bridge = self.bridge.clone();
        spawn_local(async move {
            let outcome = bridge.sync(&session).await;
            log::debug!("🌉 [IDENTITY] Bridge: {:?}", outcome);
        });
    }
}

/// ViewModel de identidad - estado reactivo + listeners
#[derive(Clone)]
pub struct IdentityViewModel {
    inner: Rc<Inner>,
}

impl IdentityViewModel {
    /// Viewmodel sobre el contexto compartido de la pestaña
    pub fn new() -> Self {
        IdentityContext::browser().viewmodel()
    }

    /// Colaboradores propios; para compartir el bridge entre consumidores
    /// construir los viewmodels desde un mismo `IdentityContext`
    pub fn with_collaborators(
        provider: Rc<dyn AuthProvider>,
        api: Rc<dyn BackendApi>,
        storage: Rc<dyn KeyValueStorage>,
    ) -> Self {
        IdentityContext::new(provider, api, storage).viewmodel()
    }

    pub(crate) fn from_parts(provider: Rc<dyn AuthProvider>, sessions: AppSessionStore, bridge: Rc<SessionBridge>) -> Self {
        Self {
            inner: Rc::new(Inner {
                provider,
                sessions,
                bridge,
                identity: ReactiveState::new(None),
                last_provider_session: RefCell::new(None),
                alive: Cell::new(true),
                mounted: Cell::new(false),
                subscriptions: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn identity(&self) -> Option<Identity> {
        self.inner.identity.get()
    }

    pub fn bridge(&self) -> &Rc<SessionBridge> {
        &self.inner.bridge
    }

    pub fn is_alive(&self) -> bool {
        self.inner.alive.get()
    }

    /// `callback` recibe cada identidad publicada distinta de la anterior
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Option<Identity>) + 'static,
    {
        let weak: Weak<Inner> = Rc::downgrade(&self.inner);
        self.inner.identity.subscribe(move || {
            if let Some(inner) = weak.upgrade() {
                callback(inner.identity.get());
            }
        })
    }

    /// Registra listeners y lanza la resolución inicial. Idempotente.
    pub fn mount(&self) {
        let inner = &self.inner;
        if !inner.alive.get() || inner.mounted.replace(true) {
            return;
        }

        let weak = Rc::downgrade(inner);
        let provider_sub = inner.provider.on_auth_state_change(Rc::new(
            move |event: AuthChangeEvent, session: Option<ProviderSession>| {
                if let Some(inner) = weak.upgrade() {
                    log::debug!("🔔 [IDENTITY] Evento del proveedor: {:?}", event);
                    inner.apply_provider_session(session);
                }
            },
        ));

        let weak = Rc::downgrade(inner);
        let storage_sub = inner.sessions.subscribe(Rc::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.rederive_from_storage();
            }
        }));

        // Bridge completado por este u otro viewmodel del mismo contexto
        let weak = Rc::downgrade(inner);
        let bridge_sub = inner.bridge.on_bridged(move || {
            if let Some(inner) = weak.upgrade() {
                inner.rederive_from_storage();
            }
        });

        inner
            .subscriptions
            .borrow_mut()
            .extend([provider_sub, storage_sub, bridge_sub]);

        let viewmodel = self.clone();
        spawn_local(async move {
            viewmodel.refresh().await;
        });
    }

    /// Vuelve a consultar al proveedor y publica
    pub async fn refresh(&self) {
        let result = self.inner.provider.get_session().await;
        if !self.inner.alive.get() {
            return;
        }

        let session = match result {
            Ok(session) => session,
            Err(e) => {
                log::warn!("⚠️ [IDENTITY] El proveedor falló, se usa la sesión local: {}", e);
                None
            }
        };
        self.inner.apply_provider_session(session);
    }

    /// Suelta los listeners; nada se publica después
    pub fn dispose(&self) {
        self.inner.alive.set(false);
        let subscriptions = std::mem::take(&mut *self.inner.subscriptions.borrow_mut());
        drop(subscriptions);
    }
}

impl Default for IdentityViewModel {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for IdentityViewModel {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}
