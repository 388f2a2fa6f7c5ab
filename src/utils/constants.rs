// ============================================================================
// CONSTANTES - Claves de almacenamiento, duraciones y rutas del backend
// ============================================================================

/// Clave de la sesión de aplicación en localStorage
pub const APP_SESSION_STORAGE_KEY: &str = "pos_auth_session";

/// Clave del token de registro pendiente (flujo OTP)
pub const REGISTRATION_TOKEN_STORAGE_KEY: &str = "pos_registration_token";

/// Clave donde el cliente del proveedor persiste su propia sesión
pub const PROVIDER_SESSION_STORAGE_KEY: &str = "pos_provider_session";

/// Vida de una sesión de aplicación (login y bridge): 24 horas
pub const APP_SESSION_TTL_MS: i64 = 24 * 60 * 60 * 1000;

/// Vida del token de registro: 10 minutos
pub const REGISTRATION_TOKEN_TTL_MS: i64 = 10 * 60 * 1000;

pub const LOGIN_PATH: &str = "/Auth/login";
pub const BRIDGE_LOGIN_PATH: &str = "/Auth/bridge-login";
pub const REGISTER_PATH: &str = "/Auth/register";
pub const COMPLETE_REGISTRATION_PATH: &str = "/Auth/complete-registration";
pub const CART_PATH: &str = "/Cart";
pub const CREATE_CART_PATH: &str = "/Cart/create-cart";
