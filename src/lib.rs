// ============================================================================
// POS STOREFRONT - CAPA DE IDENTIDAD (RUST + WASM)
// ============================================================================
// Arquitectura MVVM:
// - Models: sesiones, identidad, DTOs del backend
// - Services: HTTP (backend + proveedor), storage, bridge, carrito
// - State: estado reactivo con Rc<RefCell>
// - ViewModels: reconciliación de identidad
// - Hooks: puente hacia componentes Yew
// ============================================================================

pub mod config;
pub mod error;
pub mod hooks;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;
pub mod viewmodels;

pub use config::{AppConfig, CONFIG};
pub use error::{ApiError, AuthFlowError, ProviderError, StorageError};
pub use hooks::use_identity;
pub use models::{Identity, IdentitySource};
pub use viewmodels::{resolve, IdentityContext, IdentityViewModel};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::new(CONFIG.log_level()));
    log::info!(
        "🚀 POS Storefront identity layer ({}) - API: {}",
        CONFIG.environment,
        CONFIG.api_base_url
    );
}
