use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL del backend REST (login, bridge, carrito)
    pub api_base_url: String,
    /// Destino tras el login OAuth; si falta se usa el origin actual
    pub domain_url: Option<String>,
    /// Base URL del proveedor de identidad (GoTrue)
    pub auth_provider_url: String,
    pub auth_provider_anon_key: String,
    pub environment: String,
    pub enable_logging: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.example.com".to_string(),
            domain_url: None,
            auth_provider_url: "http://localhost:54321".to_string(),
            auth_provider_anon_key: String::new(),
            environment: "development".to_string(),
            enable_logging: true,
        }
    }
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno en tiempo de compilación
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base_url: option_env!("API_BASE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            domain_url: option_env!("DOMAIN_URL")
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string()),
            auth_provider_url: option_env!("AUTH_PROVIDER_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.auth_provider_url),
            auth_provider_anon_key: option_env!("AUTH_PROVIDER_ANON_KEY")
                .unwrap_or("")
                .to_string(),
            environment: option_env!("ENVIRONMENT")
                .unwrap_or("development")
                .to_string(),
            enable_logging: option_env!("ENABLE_LOGGING")
                .unwrap_or("true")
                .parse()
                .unwrap_or(true),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Verifica si el modo de logging está habilitado
    pub fn is_logging_enabled(&self) -> bool {
        self.enable_logging
    }

    /// Nivel de log para wasm_logger
    pub fn log_level(&self) -> log::Level {
        if !self.enable_logging {
            log::Level::Error
        } else if self.is_production() {
            log::Level::Info
        } else {
            log::Level::Debug
        }
    }
}

// Configuración global estática
lazy_static::lazy_static! {
    pub static ref CONFIG: AppConfig = AppConfig::from_env();
}
