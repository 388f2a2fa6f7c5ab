// ============================================================================
// IDENTITY CONTEXT - Colaboradores compartidos por pestaña
// ============================================================================
// Un solo proveedor, un solo storage y un solo bridge para todos los
// consumidores: los eventos in-tab del proveedor llegan a todos los
// viewmodels y el registro de bridges en curso es común.
// ============================================================================

use std::rc::Rc;

use crate::services::{ApiClient, AppSessionStore, AuthProvider, AuthService, BackendApi, GoTrueClient, SessionBridge};
use crate::utils::{BrowserStorage, KeyValueStorage};
use crate::viewmodels::IdentityViewModel;

thread_local! {
    static BROWSER_CONTEXT: IdentityContext = IdentityContext::build_browser();
}

/// Compartido vía `ContextProvider<IdentityContext>` o, sin provider, por pestaña
#[derive(Clone)]
pub struct IdentityContext {
    pub provider: Rc<dyn AuthProvider>,
    pub api: Rc<dyn BackendApi>,
    pub storage: Rc<dyn KeyValueStorage>,
    bridge: Rc<SessionBridge>,
}

impl IdentityContext {
    pub fn new(provider: Rc<dyn AuthProvider>, api: Rc<dyn BackendApi>, storage: Rc<dyn KeyValueStorage>) -> Self {
        let bridge = Rc::new(SessionBridge::new(api.clone(), AppSessionStore::new(storage.clone())));
        Self {
            provider,
            api,
            storage,
            bridge,
        }
    }

    /// Contexto único de la pestaña (localStorage, GoTrue, backend)
    pub fn browser() -> Self {
        BROWSER_CONTEXT.with(Clone::clone)
    }

    fn build_browser() -> Self {
        let storage: Rc<dyn KeyValueStorage> = Rc::new(BrowserStorage::new());
        let provider: Rc<dyn AuthProvider> = Rc::new(GoTrueClient::from_config(storage.clone()));
        let api: Rc<dyn BackendApi> =
            Rc::new(ApiClient::new().with_session_store(AppSessionStore::new(storage.clone())));
        Self::new(provider, api, storage)
    }

    pub fn bridge(&self) -> &Rc<SessionBridge> {
        &self.bridge
    }

    pub fn sessions(&self) -> AppSessionStore {
        AppSessionStore::new(self.storage.clone())
    }

    /// Viewmodel nuevo sobre los colaboradores (y el bridge) de este contexto
    pub fn viewmodel(&self) -> IdentityViewModel {
        IdentityViewModel::from_parts(self.provider.clone(), self.sessions(), self.bridge.clone())
    }

    pub fn auth_service(&self) -> AuthService {
        AuthService::new(self.api.clone(), self.provider.clone(), self.storage.clone())
    }
}

impl PartialEq for IdentityContext {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.provider, &other.provider)
            && Rc::ptr_eq(&self.api, &other.api)
            && Rc::ptr_eq(&self.storage, &other.storage)
            && Rc::ptr_eq(&self.bridge, &other.bridge)
    }
}
