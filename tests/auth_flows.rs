mod common;

use std::rc::Rc;

use serde_json::json;
use tokio::task::LocalSet;

use common::{live_local_session, login_data, settle, token, MockBackend, Reply, ScriptedProvider};
use pos_storefront::error::{ApiError, AuthFlowError};
use pos_storefront::models::{AppRole, IdentitySource, RegistrationData};
use pos_storefront::services::{AuthService, CartProvisioning, CartService, GoTrueClient};
use pos_storefront::utils::{MemoryStorage, APP_SESSION_STORAGE_KEY, REGISTRATION_TOKEN_STORAGE_KEY};
use pos_storefront::IdentityContext;

fn service(api: &Rc<MockBackend>, provider: &Rc<ScriptedProvider>, storage: &MemoryStorage) -> AuthService {
    AuthService::new(api.clone(), provider.clone(), Rc::new(storage.clone())).with_domain_url(None)
}

fn registration(email: &str) -> RegistrationData {
    RegistrationData {
        email: email.to_string(),
        message: "Verification code sent".to_string(),
        registration_token: "reg-token-1".to_string(),
    }
}

#[tokio::test(flavor = "current_thread")]
async fn password_login_persists_session_and_creates_cart() {
    LocalSet::new()
        .run_until(async {
            let storage = MemoryStorage::new();
            let api = MockBackend::new();
            let provider = ScriptedProvider::new(None);
            *api.login_reply.borrow_mut() = Reply::Success(login_data(json!({
                "accessToken": token(json!({ "sub": "member-3" })),
                "role": "Manager",
            })));
            let auth = service(&api, &provider, &storage);
            auth.registrations().remember("ann@x.com", "stale").unwrap();

            let outcome = auth.login_with_password("  ann@x.com ", "secret").await.unwrap();

            assert_eq!(api.login_calls.borrow()[0].email, "ann@x.com");
            assert_eq!(outcome.role, AppRole::Manager);
            assert_eq!(outcome.session.email, "ann@x.com");
            assert_eq!(auth.sessions().load(), Some(outcome.session.clone()));
            assert!(!storage.contains_key(REGISTRATION_TOKEN_STORAGE_KEY));

            settle().await;
            assert_eq!(*api.created_carts.borrow(), vec!["member-3".to_string()]);
            assert!(auth.sessions().load().unwrap().cart_created);
        })
        .await;
}

#[tokio::test(flavor = "current_thread")]
async fn rejected_login_surfaces_backend_message() {
    LocalSet::new()
        .run_until(async {
            let storage = MemoryStorage::new();
            let api = MockBackend::new();
            let provider = ScriptedProvider::new(None);
            *api.login_reply.borrow_mut() = Reply::Rejected("Invalid credentials".to_string());
            let auth = service(&api, &provider, &storage);

            let err = auth.login_with_password("ann@x.com", "wrong").await.unwrap_err();

            assert!(matches!(err, AuthFlowError::Api(ApiError::Rejected(ref m)) if m == "Invalid credentials"));
            assert!(!storage.contains_key(APP_SESSION_STORAGE_KEY));
        })
        .await;
}

#[tokio::test(flavor = "current_thread")]
async fn unauthorized_login_is_reported_as_http_error() {
    LocalSet::new()
        .run_until(async {
            let storage = MemoryStorage::new();
            let api = MockBackend::new();
            let provider = ScriptedProvider::new(None);
            *api.login_reply.borrow_mut() = Reply::Http(401, "Unauthorized".to_string());
            let auth = service(&api, &provider, &storage);

            match auth.login_with_password("ann@x.com", "wrong").await {
                Err(AuthFlowError::Api(err)) => assert!(err.is_unauthorized()),
                other => panic!("unexpected result: {other:?}"),
            }
        })
        .await;
}

#[tokio::test(flavor = "current_thread")]
async fn empty_credentials_never_reach_the_backend() {
    LocalSet::new()
        .run_until(async {
            let storage = MemoryStorage::new();
            let api = MockBackend::new();
            let provider = ScriptedProvider::new(None);
            let auth = service(&api, &provider, &storage);

            let err = auth.login_with_password("   ", "secret").await.unwrap_err();
            assert!(matches!(err, AuthFlowError::Validation(_)));
            assert!(api.login_calls.borrow().is_empty());
        })
        .await;
}

#[tokio::test(flavor = "current_thread")]
async fn registration_requires_matching_confirmation() {
    LocalSet::new()
        .run_until(async {
            let storage = MemoryStorage::new();
            let api = MockBackend::new();
            let provider = ScriptedProvider::new(None);
            let auth = service(&api, &provider, &storage);

            let err = auth.register("new@x.com", "pass-1", "pass-2").await.unwrap_err();

            assert_eq!(err.to_string(), "Password and confirmation do not match.");
            assert!(api.register_calls.borrow().is_empty());
        })
        .await;
}

#[tokio::test(flavor = "current_thread")]
async fn registration_then_otp_completion() {
    LocalSet::new()
        .run_until(async {
            let storage = MemoryStorage::new();
            let api = MockBackend::new();
            let provider = ScriptedProvider::new(None);
            *api.register_reply.borrow_mut() = Reply::Success(registration("new@x.com"));
            *api.complete_reply.borrow_mut() = Reply::Success(json!({ "email": "new@x.com" }));
            let auth = service(&api, &provider, &storage);

            auth.register("new@x.com", "pass-1", "pass-1").await.unwrap();
            let pending = auth.registrations().load().expect("pending registration");
            assert_eq!(pending.registration_token, "reg-token-1");

            auth.complete_registration(" 123456 ").await.unwrap();

            let request = api.complete_calls.borrow()[0].clone();
            assert_eq!(request.email, "new@x.com");
            assert_eq!(request.registration_token, "reg-token-1");
            assert_eq!(request.otp_code, "123456");
            assert!(!storage.contains_key(REGISTRATION_TOKEN_STORAGE_KEY));
        })
        .await;
}

#[tokio::test(flavor = "current_thread")]
async fn otp_without_pending_registration_is_expired() {
    LocalSet::new()
        .run_until(async {
            let storage = MemoryStorage::new();
            let api = MockBackend::new();
            let provider = ScriptedProvider::new(None);
            let auth = service(&api, &provider, &storage);

            let err = auth.complete_registration("123456").await.unwrap_err();

            assert!(matches!(err, AuthFlowError::RegistrationExpired));
            assert!(api.complete_calls.borrow().is_empty());
        })
        .await;
}

#[tokio::test(flavor = "current_thread")]
async fn oauth_login_clears_local_state_and_redirects() {
    LocalSet::new()
        .run_until(async {
            let storage = MemoryStorage::new();
            let api = MockBackend::new();
            let provider = ScriptedProvider::new(None);
            let auth = service(&api, &provider, &storage).with_domain_url(Some("https://shop.example.com".to_string()));
            auth.sessions().store(&live_local_session("old@x.com")).unwrap();
            auth.registrations().remember("old@x.com", "reg").unwrap();

            auth.begin_oauth_login("google", "http://localhost:8080").await.unwrap();

            assert!(storage.is_empty());
            assert_eq!(
                *provider.oauth_redirects.borrow(),
                vec![("google".to_string(), "https://shop.example.com/".to_string())]
            );
        })
        .await;
}

#[tokio::test(flavor = "current_thread")]
async fn sign_out_clears_session_even_if_provider_fails() {
    LocalSet::new()
        .run_until(async {
            let storage = MemoryStorage::new();
            let api = MockBackend::new();
            let provider = ScriptedProvider::new(None);
            provider.fail_sign_out.set(true);
            let auth = service(&api, &provider, &storage);
            auth.sessions().store(&live_local_session("old@x.com")).unwrap();
            auth.registrations().remember("old@x.com", "reg").unwrap();

            auth.sign_out().await.unwrap();

            assert_eq!(provider.sign_out_calls.get(), 1);
            assert!(storage.is_empty());
        })
        .await;
}

#[tokio::test(flavor = "current_thread")]
async fn sign_out_leaves_mounted_viewmodels_anonymous() {
    LocalSet::new()
        .run_until(async {
            let storage = MemoryStorage::new();
            let api = MockBackend::new();
            let provider = ScriptedProvider::new(None);
            let context = IdentityContext::new(provider.clone(), api.clone(), Rc::new(storage.clone()));
            context.sessions().store(&live_local_session("ann@x.com")).unwrap();

            let vm = context.viewmodel();
            vm.mount();
            settle().await;
            assert_eq!(vm.identity().map(|i| i.provider), Some(IdentitySource::Local));

            context.auth_service().sign_out().await.unwrap();

            assert_eq!(vm.identity(), None);
        })
        .await;
}

#[tokio::test(flavor = "current_thread")]
async fn go_true_sign_out_reaches_viewmodels_of_the_same_context() {
    LocalSet::new()
        .run_until(async {
            let storage = MemoryStorage::new();
            let shared: Rc<MemoryStorage> = Rc::new(storage.clone());
            let api = MockBackend::new();
            let provider = Rc::new(GoTrueClient::new("http://localhost:9999", "anon-key", shared.clone()));
            let context = IdentityContext::new(provider, api.clone(), shared);
            context.sessions().store(&live_local_session("ann@x.com")).unwrap();

            let (header, menu) = (context.viewmodel(), context.viewmodel());
            header.mount();
            menu.mount();
            settle().await;
            assert_eq!(header.identity().map(|i| i.email), Some("ann@x.com".to_string()));

            context.auth_service().sign_out().await.unwrap();

            assert_eq!(header.identity(), None);
            assert_eq!(menu.identity(), None);
            assert!(storage.is_empty());
        })
        .await;
}

#[tokio::test(flavor = "current_thread")]
async fn cart_provisioning_is_idempotent_per_session() {
    LocalSet::new()
        .run_until(async {
            let storage = MemoryStorage::new();
            let api = MockBackend::new();
            let sessions = pos_storefront::services::AppSessionStore::new(Rc::new(storage.clone()));
            let cart = CartService::new(api.clone(), sessions.clone());

            assert_eq!(cart.ensure_cart().await, CartProvisioning::NoSession);

            let mut session = live_local_session("ann@x.com");
            session.access_token = Some("opaque".to_string());
            sessions.store(&session).unwrap();
            assert_eq!(cart.ensure_cart().await, CartProvisioning::MissingIdentifier);

            sessions.store(&live_local_session("ann@x.com")).unwrap();
            assert_eq!(cart.current_cart_identifier().as_deref(), Some("member-local"));
            assert_eq!(cart.ensure_cart().await, CartProvisioning::Created);
            assert_eq!(cart.ensure_cart().await, CartProvisioning::AlreadyCreated);
            assert_eq!(api.created_carts.borrow().len(), 1);

            let summary = cart.fetch_cart().await.unwrap().expect("cart");
            assert_eq!(summary.member_id, "member-local");
        })
        .await;
}
