// ============================================================================
// ROLES - Lectura del rol para la UI (menú "Manager area", redirecciones)
// ============================================================================

use serde_json::Value;

use crate::models::{AppRole, StoredAppSession};
use crate::services::unverified_claims::{decode_unverified_claims, UnverifiedClaims};

pub const ROLE_CLAIM_URI: &str = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role";

/// Primer claim de rol presente (no nulo): URI de rol, `role`, `roles`
pub fn extract_role_from_claims(claims: &UnverifiedClaims) -> Option<AppRole> {
    present_claim(claims, ROLE_CLAIM_URI)
        .or_else(|| present_claim(claims, "role"))
        .or_else(|| present_claim(claims, "roles"))
        .and_then(AppRole::from_claim_value)
}

fn present_claim<'a>(claims: &'a UnverifiedClaims, key: &str) -> Option<&'a Value> {
    claims.get(key).filter(|value| !value.is_null())
}

pub fn extract_role_from_token(token: Option<&str>) -> Option<AppRole> {
    let claims = decode_unverified_claims(token?)?;
    extract_role_from_claims(&claims)
}

/// Rol guardado en la sesión; si no hay, el del access token
pub fn extract_role_from_session(session: Option<&StoredAppSession>) -> Option<AppRole> {
    let session = session?;
    session
        .role
        .or_else(|| extract_role_from_token(session.access_token.as_deref()))
}

/// Rol al construir una sesión nueva: access token, refresh token, y por último
/// lo que declare el backend (solo "Manager" cuenta, el resto es User).
pub fn resolve_login_role(access_token: Option<&str>, refresh_token: Option<&str>, declared: Option<&str>) -> AppRole {
    extract_role_from_token(access_token)
        .or_else(|| extract_role_from_token(refresh_token))
        .unwrap_or_else(|| match declared {
            Some("Manager") => AppRole::Manager,
            _ => AppRole::User,
        })
}
