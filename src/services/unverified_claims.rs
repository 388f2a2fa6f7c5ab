// ============================================================================
// CLAIMS SIN VERIFICAR - Solo para mostrar datos (rol, identificador)
// ============================================================================
// NO se verifica la firma. Nada de lo que sale de aquí puede usarse para
// decidir permisos: el backend es quien autoriza.
// ============================================================================

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde_json::{Map, Value};

pub type UnverifiedClaims = Map<String, Value>;

pub const NAME_IDENTIFIER_CLAIM: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier";

/// base64url con padding opcional (los JWT lo omiten, algunos emisores no)
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decodifica el payload (segundo segmento) de un token compacto `header.payload.firma`.
///
/// Devuelve `None` si el token no tiene tres segmentos, el payload no es
/// base64url, no es UTF-8 o no es un objeto JSON.
pub fn decode_unverified_claims(token: &str) -> Option<UnverifiedClaims> {
    if token.is_empty() {
        return None;
    }

    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        log::warn!("⚠️ [CLAIMS] Token con {} segmentos, se esperaban 3", segments.len());
        return None;
    }

    match decode_payload(segments[1]) {
        Ok(claims) => Some(claims),
        Err(reason) => {
            log::warn!("⚠️ [CLAIMS] Failed to decode token payload: {}", reason);
            None
        }
    }
}

fn decode_payload(segment: &str) -> Result<UnverifiedClaims, String> {
    // Tolerar el alfabeto estándar (+ /) igual que atob
    let normalized: String = segment
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    let bytes = URL_SAFE_LENIENT
        .decode(normalized.as_bytes())
        .map_err(|e| format!("invalid base64url: {}", e))?;
    let text = String::from_utf8(bytes).map_err(|e| format!("invalid UTF-8: {}", e))?;

    match serde_json::from_str::<Value>(&text).map_err(|e| format!("invalid JSON: {}", e))? {
        Value::Object(claims) => Ok(claims),
        other => Err(format!("payload is not an object: {}", other)),
    }
}

/// Claim string no vacío
pub fn unverified_claim_str<'a>(claims: &'a UnverifiedClaims, key: &str) -> Option<&'a str> {
    claims.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Identificador estable del usuario: `nameidentifier`, si no `sub`
pub fn unverified_user_identifier(claims: &UnverifiedClaims) -> Option<String> {
    unverified_claim_str(claims, NAME_IDENTIFIER_CLAIM)
        .or_else(|| unverified_claim_str(claims, "sub"))
        .map(str::to_string)
}

/// Atajo: token -> identificador
pub fn unverified_user_identifier_from_token(token: &str) -> Option<String> {
    decode_unverified_claims(token).and_then(|claims| unverified_user_identifier(&claims))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
    use serde_json::json;

    fn token(payload: &Value) -> String {
        format!("eyJhbGciOiJIUzI1NiJ9.{}.c2ln", URL_SAFE_NO_PAD.encode(payload.to_string()))
    }

    #[test]
    fn decodes_object_payload() {
        let claims = decode_unverified_claims(&token(&json!({ "sub": "42", "role": "User" }))).unwrap();
        assert_eq!(claims["sub"], "42");
    }

    #[test]
    fn accepts_padded_and_standard_alphabet_payloads() {
        let payload = json!({ "name": "Ñandú ~~??>>" }).to_string();
        let padded = format!("h.{}.s", STANDARD.encode(&payload));
        let claims = decode_unverified_claims(&padded).unwrap();
        assert_eq!(claims["name"], "Ñandú ~~??>>");
    }

    #[test]
    fn two_segment_string_yields_none() {
        assert_eq!(decode_unverified_claims("not.ajwt"), None);
        assert_eq!(decode_unverified_claims("abc.def"), None);
    }

    #[test]
    fn garbage_yields_none() {
        assert_eq!(decode_unverified_claims(""), None);
        assert_eq!(decode_unverified_claims("a.b.c.d"), None);
        assert_eq!(decode_unverified_claims("a.!!!.c"), None);
        assert_eq!(decode_unverified_claims("a..c"), None);
        let not_object = format!("a.{}.c", URL_SAFE_NO_PAD.encode("[1,2]"));
        assert_eq!(decode_unverified_claims(&not_object), None);
        let not_utf8 = format!("a.{}.c", URL_SAFE_NO_PAD.encode([0xff, 0xfe]));
        assert_eq!(decode_unverified_claims(&not_utf8), None);
    }

    #[test]
    fn identifier_prefers_name_identifier_claim() {
        let claims = decode_unverified_claims(&token(&json!({
            NAME_IDENTIFIER_CLAIM: "member-7",
            "sub": "42"
        })))
        .unwrap();
        assert_eq!(unverified_user_identifier(&claims).as_deref(), Some("member-7"));

        let claims = decode_unverified_claims(&token(&json!({ NAME_IDENTIFIER_CLAIM: "", "sub": "42" }))).unwrap();
        assert_eq!(unverified_user_identifier(&claims).as_deref(), Some("42"));

        assert_eq!(unverified_user_identifier_from_token(&token(&json!({ "sub": 42 }))), None);
    }
}
