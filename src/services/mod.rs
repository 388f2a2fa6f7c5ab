pub mod api_client;
pub mod auth_service;
pub mod avatar;
pub mod bridge;
pub mod cart_service;
pub mod provider_client;
pub mod roles;
pub mod session_store;
pub mod unverified_claims;

pub use api_client::{ApiClient, BackendApi};
pub use auth_service::{oauth_redirect_target, AuthService, LoginOutcome};
pub use avatar::build_default_avatar;
pub use bridge::{BridgeOutcome, SessionBridge, SkipReason};
pub use cart_service::{CartProvisioning, CartService};
pub use provider_client::{parse_oauth_fragment, AuthProvider, AuthStateListener, GoTrueClient, OAuthFragment};
pub use roles::{extract_role_from_claims, extract_role_from_session, extract_role_from_token, resolve_login_role};
pub use session_store::{build_app_session, AppSessionStore, RegistrationTokenStore};
pub use unverified_claims::{
    decode_unverified_claims, unverified_claim_str, unverified_user_identifier,
    unverified_user_identifier_from_token, UnverifiedClaims,
};
