const DEFAULT_AVATAR_BACKGROUND: &str = "4338CA";
const DEFAULT_AVATAR_COLOR: &str = "FFFFFF";
const DEFAULT_AVATAR_FALLBACK: &str = "POS";

/// Avatar generado (ui-avatars) cuando el backend no devuelve imagen
pub fn build_default_avatar(label: Option<&str>) -> String {
    let label = label
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_AVATAR_FALLBACK);

    format!(
        "https://ui-avatars.com/api/?name={}&background={}&color={}&bold=true",
        urlencoding::encode(label),
        DEFAULT_AVATAR_BACKGROUND,
        DEFAULT_AVATAR_COLOR
    )
}
