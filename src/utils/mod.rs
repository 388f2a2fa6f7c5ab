// Utils compartidos

pub mod constants;
pub mod spawn;
pub mod storage;
pub mod subscription;

pub use constants::*;
pub use spawn::spawn_local;
pub use storage::{BrowserStorage, KeyValueStorage, MemoryStorage, StorageListener};
pub use subscription::Subscription;

/// Milisegundos desde epoch (equivalente a `Date.now()`)
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Segundos desde epoch (las sesiones del proveedor expiran en segundos)
pub fn now_seconds() -> i64 {
    chrono::Utc::now().timestamp()
}
