// Dobles de prueba compartidos: backend con respuestas programadas, proveedor
// scriptable y helpers de tiempo/tokens.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{json, Map, Value};
use tokio::sync::Notify;

use pos_storefront::error::{ApiError, ProviderError};
use pos_storefront::models::{
    AuthChangeEvent, BridgeLoginRequest, CartSummary, CompleteRegistrationRequest, LoginRequest, LoginResponseData,
    ProviderSession, ProviderUser, RegisterRequest, RegistrationData, StandardResponse, StoredAppSession,
};
use pos_storefront::services::{AuthProvider, AuthStateListener, BackendApi};
use pos_storefront::utils::{now_millis, Subscription};

/// Deja correr las tareas locales pendientes
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// Token compacto sin firma con `claims` como payload
pub fn token(claims: Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.sig", header, payload)
}

pub fn provider_session(id: &str, email: Option<&str>) -> ProviderSession {
    let mut metadata = Map::new();
    metadata.insert("full_name".to_string(), json!("Provider Name"));
    ProviderSession {
        access_token: "provider-access".to_string(),
        refresh_token: Some("provider-refresh".to_string()),
        expires_at: None,
        expires_in: None,
        user: ProviderUser {
            id: id.to_string(),
            email: email.map(str::to_string),
            created_at: Some("2024-05-01T10:00:00Z".to_string()),
            user_metadata: metadata,
        },
    }
}

pub fn live_local_session(email: &str) -> StoredAppSession {
    let mut session = StoredAppSession::new(email, now_millis() + 60 * 60 * 1000);
    session.full_name = Some("Local Name".to_string());
    session.access_token = Some(token(json!({ "sub": "member-local", "role": "User" })));
    session
}

pub fn expired_local_session(email: &str) -> StoredAppSession {
    StoredAppSession::new(email, now_millis() - 1_000)
}

// ----------------------------------------------------------------------------
// Backend
// ----------------------------------------------------------------------------

/// Respuesta programada de un endpoint
#[derive(Clone)]
pub enum Reply<T> {
    Success(T),
    Rejected(String),
    Http(u16, String),
}

impl<T: Clone> Reply<T> {
    fn produce(&self) -> Result<StandardResponse<T>, ApiError> {
        match self {
            Reply::Success(data) => Ok(StandardResponse {
                success: true,
                message: Some("OK".to_string()),
                data: Some(data.clone()),
                timestamp: None,
            }),
            Reply::Rejected(message) => Ok(StandardResponse {
                success: false,
                message: Some(message.clone()),
                data: None,
                timestamp: None,
            }),
            Reply::Http(status, message) => Err(ApiError::Http {
                status: *status,
                message: message.clone(),
            }),
        }
    }
}

pub fn login_data(value: Value) -> LoginResponseData {
    serde_json::from_value(value).expect("valid login data")
}

pub struct MockBackend {
    pub login_reply: RefCell<Reply<LoginResponseData>>,
    pub bridge_reply: RefCell<Reply<LoginResponseData>>,
    pub register_reply: RefCell<Reply<RegistrationData>>,
    pub complete_reply: RefCell<Reply<Value>>,
    pub cart_fails: Cell<bool>,
    /// Si está puesto, `bridge_login` espera un `notify_one()` antes de responder
    pub bridge_gate: RefCell<Option<Rc<Notify>>>,

    pub login_calls: RefCell<Vec<LoginRequest>>,
    pub bridge_calls: RefCell<Vec<BridgeLoginRequest>>,
    pub register_calls: RefCell<Vec<RegisterRequest>>,
    pub complete_calls: RefCell<Vec<CompleteRegistrationRequest>>,
    pub created_carts: RefCell<Vec<String>>,
    pub fetched_carts: RefCell<Vec<String>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            login_reply: RefCell::new(Reply::Http(500, "login not scripted".to_string())),
            bridge_reply: RefCell::new(Reply::Http(500, "bridge not scripted".to_string())),
            register_reply: RefCell::new(Reply::Http(500, "register not scripted".to_string())),
            complete_reply: RefCell::new(Reply::Http(500, "complete not scripted".to_string())),
            cart_fails: Cell::new(false),
            bridge_gate: RefCell::new(None),
            login_calls: RefCell::default(),
            bridge_calls: RefCell::default(),
            register_calls: RefCell::default(),
            complete_calls: RefCell::default(),
            created_carts: RefCell::default(),
            fetched_carts: RefCell::default(),
        }
    }
}

impl MockBackend {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn gate_bridge(&self) -> Rc<Notify> {
        let gate = Rc::new(Notify::new());
        *self.bridge_gate.borrow_mut() = Some(gate.clone());
        gate
    }

    pub fn bridge_call_count(&self) -> usize {
        self.bridge_calls.borrow().len()
    }
}

#[async_trait(?Send)]
impl BackendApi for MockBackend {
    async fn login(&self, request: &LoginRequest) -> Result<StandardResponse<LoginResponseData>, ApiError> {
        self.login_calls.borrow_mut().push(request.clone());
        self.login_reply.borrow().produce()
    }

    async fn bridge_login(
        &self,
        request: &BridgeLoginRequest,
    ) -> Result<StandardResponse<LoginResponseData>, ApiError> {
        self.bridge_calls.borrow_mut().push(request.clone());
        let gate = self.bridge_gate.borrow().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.bridge_reply.borrow().produce()
    }

    async fn register(&self, request: &RegisterRequest) -> Result<StandardResponse<RegistrationData>, ApiError> {
        self.register_calls.borrow_mut().push(request.clone());
        self.register_reply.borrow().produce()
    }

    async fn complete_registration(
        &self,
        request: &CompleteRegistrationRequest,
    ) -> Result<StandardResponse<Value>, ApiError> {
        self.complete_calls.borrow_mut().push(request.clone());
        self.complete_reply.borrow().produce()
    }

    async fn create_cart(&self, identifier: &str) -> Result<(), ApiError> {
        self.created_carts.borrow_mut().push(identifier.to_string());
        if self.cart_fails.get() {
            return Err(ApiError::Network("connection reset".to_string()));
        }
        Ok(())
    }

    async fn fetch_cart(&self, member_id: &str) -> Result<CartSummary, ApiError> {
        self.fetched_carts.borrow_mut().push(member_id.to_string());
        Ok(CartSummary {
            cart_id: 1,
            member_id: member_id.to_string(),
            created_date: "2024-05-01".to_string(),
            cart_items: Vec::new(),
            total_quantity: 0,
            total_price: 0.0,
        })
    }
}

// ----------------------------------------------------------------------------
// Proveedor
// ----------------------------------------------------------------------------

#[derive(Default)]
pub struct ScriptedProvider {
    session: RefCell<Option<ProviderSession>>,
    pub fail_get_session: Cell<bool>,
    pub fail_sign_out: Cell<bool>,
    /// Si está puesto, `get_session` espera un `notify_one()` antes de responder
    pub session_gate: RefCell<Option<Rc<Notify>>>,
    listeners: Rc<RefCell<Vec<(u64, AuthStateListener)>>>,
    next_id: Cell<u64>,
    pub get_session_calls: Cell<usize>,
    pub sign_out_calls: Cell<usize>,
    pub oauth_redirects: RefCell<Vec<(String, String)>>,
}

impl ScriptedProvider {
    pub fn new(session: Option<ProviderSession>) -> Rc<Self> {
        let provider = Self::default();
        *provider.session.borrow_mut() = session;
        Rc::new(provider)
    }

    pub fn gate_session(&self) -> Rc<Notify> {
        let gate = Rc::new(Notify::new());
        *self.session_gate.borrow_mut() = Some(gate.clone());
        gate
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Cambia la sesión y notifica a los listeners
    pub fn emit(&self, event: AuthChangeEvent, session: Option<ProviderSession>) {
        *self.session.borrow_mut() = session.clone();
        let listeners: Vec<AuthStateListener> = self.listeners.borrow().iter().map(|(_, l)| l.clone()).collect();
        for listener in listeners {
            listener(event, session.clone());
        }
    }
}

#[async_trait(?Send)]
impl AuthProvider for ScriptedProvider {
    async fn get_session(&self) -> Result<Option<ProviderSession>, ProviderError> {
        self.get_session_calls.set(self.get_session_calls.get() + 1);
        let gate = self.session_gate.borrow().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_get_session.get() {
            return Err(ProviderError::Network("provider offline".to_string()));
        }
        Ok(self.session.borrow().clone())
    }

    fn on_auth_state_change(&self, listener: AuthStateListener) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push((id, listener));

        let listeners: Weak<RefCell<Vec<(u64, AuthStateListener)>>> = Rc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners.borrow_mut().retain(|(listener_id, _)| *listener_id != id);
            }
        })
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.sign_out_calls.set(self.sign_out_calls.get() + 1);
        // Como GoTrue: la sesión local del proveedor se olvida aunque el logout remoto falle
        self.emit(AuthChangeEvent::SignedOut, None);
        if self.fail_sign_out.get() {
            return Err(ProviderError::Http {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        Ok(())
    }

    async fn sign_in_with_oauth(&self, provider: &str, redirect_to: &str) -> Result<(), ProviderError> {
        self.oauth_redirects
            .borrow_mut()
            .push((provider.to_string(), redirect_to.to_string()));
        Ok(())
    }
}
