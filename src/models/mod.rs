pub mod app_session;
pub mod auth;
pub mod cart;
pub mod identity;
pub mod provider;
pub mod role;

pub use app_session::{StoredAppSession, StoredRegistrationToken};
pub use auth::{
    BridgeLoginRequest, CompleteRegistrationRequest, LoginRequest, LoginResponseData, RegisterRequest,
    RegistrationData, StandardResponse,
};
pub use cart::{CartItem, CartSummary};
pub use identity::{Identity, IdentitySource};
pub use provider::{AuthChangeEvent, ProviderSession, ProviderUser};
pub use role::AppRole;
