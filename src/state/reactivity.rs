// ============================================================================
// REACTIVITY - Sistema de notificaciones/subscribers para reactividad
// ============================================================================
// Los clones comparten valor y subscribers. `set` solo notifica si el valor
// cambia; los callbacks se invocan sin ningún borrow activo, así que pueden
// leer o escribir el estado.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::utils::Subscription;

type Callback = Rc<dyn Fn()>;

#[derive(Default)]
struct Subscribers {
    callbacks: RefCell<Vec<(u64, Callback)>>,
    next_id: Cell<u64>,
}

/// Estado reactivo con sistema de notificaciones
pub struct ReactiveState<T> {
    value: Rc<RefCell<T>>,
    subscribers: Rc<Subscribers>,
}

impl<T: Clone + PartialEq> ReactiveState<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Rc::new(RefCell::new(value)),
            subscribers: Rc::new(Subscribers::default()),
        }
    }

    /// Copia del valor actual
    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// Establecer nuevo valor; devuelve `true` si cambió (y se notificó)
    pub fn set(&self, new_value: T) -> bool {
        {
            let mut current = self.value.borrow_mut();
            if *current == new_value {
                return false;
            }
            *current = new_value;
        }
        self.notify();
        true
    }

    /// Actualizar valor usando closure y notificar si cambió
    pub fn update<F>(&self, updater: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        let mut next = self.get();
        updater(&mut next);
        self.set(next)
    }

    /// Suscribirse a cambios hasta soltar la `Subscription`
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn() + 'static,
    {
        let id = self.subscribers.next_id.get();
        self.subscribers.next_id.set(id + 1);
        self.subscribers
            .callbacks
            .borrow_mut()
            .push((id, Rc::new(callback)));

        let subscribers: Weak<Subscribers> = Rc::downgrade(&self.subscribers);
        Subscription::new(move || {
            if let Some(subscribers) = subscribers.upgrade() {
                subscribers.callbacks.borrow_mut().retain(|(cb_id, _)| *cb_id != id);
            }
        })
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.callbacks.borrow().len()
    }

    fn notify(&self) {
        let callbacks: Vec<Callback> = self
            .subscribers
            .callbacks
            .borrow()
            .iter()
            .map(|(_, cb)| cb.clone())
            .collect();
        for callback in callbacks {
            callback();
        }
    }
}

impl<T> Clone for ReactiveState<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            subscribers: self.subscribers.clone(),
        }
    }
}
