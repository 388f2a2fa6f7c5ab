// ============================================================================
// STORAGE - Almacenamiento clave/valor duradero + notificaciones cross-tab
// ============================================================================
// `BrowserStorage` envuelve localStorage y el evento "storage" de window.
// `MemoryStorage` es la versión en memoria (tests y entornos sin window).
// ============================================================================

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use serde::{de::DeserializeOwned, Serialize};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{window, Storage, StorageEvent};

use crate::error::StorageError;
use crate::utils::Subscription;

/// Listener de cambios: recibe la clave modificada (`None` = storage vaciado)
pub type StorageListener = Rc<dyn Fn(Option<&str>)>;

pub trait KeyValueStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Cambios hechos por OTRA pestaña/contexto. Las escrituras propias no notifican.
    fn subscribe(&self, listener: StorageListener) -> Subscription;
}

pub fn save_to_storage<T: Serialize>(
    storage: &dyn KeyValueStorage,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let json = serde_json::to_string(value)?;
    storage.set_item(key, &json)
}

pub fn load_from_storage<T: DeserializeOwned>(storage: &dyn KeyValueStorage, key: &str) -> Option<T> {
    let json = storage.get_item(key).ok()??;
    serde_json::from_str(&json).ok()
}

// ----------------------------------------------------------------------------
// localStorage
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserStorage;

impl BrowserStorage {
    pub fn new() -> Self {
        Self
    }

    fn local_storage(&self) -> Result<Storage, StorageError> {
        window()
            .ok_or(StorageError::Unavailable)?
            .local_storage()
            .map_err(|_| StorageError::Unavailable)?
            .ok_or(StorageError::Unavailable)
    }
}

impl KeyValueStorage for BrowserStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.local_storage()?
            .get_item(key)
            .map_err(|e| StorageError::Access(format!("{:?}", e)))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.local_storage()?
            .set_item(key, value)
            .map_err(|e| StorageError::Access(format!("{:?}", e)))
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.local_storage()?
            .remove_item(key)
            .map_err(|e| StorageError::Access(format!("{:?}", e)))
    }

    fn subscribe(&self, listener: StorageListener) -> Subscription {
        let Some(win) = window() else {
            log::warn!("⚠️ [STORAGE] Sin window: no se escuchan cambios cross-tab");
            return Subscription::noop();
        };

        let closure = Closure::wrap(Box::new(move |event: StorageEvent| {
            listener(event.key().as_deref());
        }) as Box<dyn FnMut(StorageEvent)>);

        if let Err(e) = win.add_event_listener_with_callback("storage", closure.as_ref().unchecked_ref()) {
            log::error!("❌ [STORAGE] No se pudo registrar el listener: {:?}", e);
            return Subscription::noop();
        }

        // El closure vive dentro de la subscription: se libera al quitar el listener
        Subscription::new(move || {
            let _ = win.remove_event_listener_with_callback("storage", closure.as_ref().unchecked_ref());
            drop(closure);
        })
    }
}

// ----------------------------------------------------------------------------
// En memoria
// ----------------------------------------------------------------------------

#[derive(Default)]
struct MemoryInner {
    items: RefCell<HashMap<String, String>>,
    listeners: RefCell<Vec<(u64, StorageListener)>>,
    next_listener_id: Cell<u64>,
}

/// Storage en memoria. Los clones comparten contenido y listeners.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    inner: Rc<MemoryInner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.items.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Simula una escritura desde otra pestaña: escribe y notifica
    pub fn set_external(&self, key: &str, value: &str) {
        self.inner.items.borrow_mut().insert(key.to_string(), value.to_string());
        self.emit_external_change(Some(key));
    }

    /// Simula un borrado desde otra pestaña
    pub fn remove_external(&self, key: &str) {
        self.inner.items.borrow_mut().remove(key);
        self.emit_external_change(Some(key));
    }

    pub fn emit_external_change(&self, key: Option<&str>) {
        // Copia de la lista: un listener puede (des)suscribirse durante la notificación
        let listeners: Vec<StorageListener> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(key);
        }
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.inner.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.items.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.inner.items.borrow_mut().remove(key);
        Ok(())
    }

    fn subscribe(&self, listener: StorageListener) -> Subscription {
        let id = self.inner.next_listener_id.get();
        self.inner.next_listener_id.set(id + 1);
        self.inner.listeners.borrow_mut().push((id, listener));

        let weak: Weak<MemoryInner> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.borrow_mut().retain(|(listener_id, _)| *listener_id != id);
            }
        })
    }
}
