// ============================================================================
// SUBSCRIPTION - Handle RAII para listeners
// ============================================================================
// Al hacer drop se ejecuta la cancelación: el listener deja de recibir
// notificaciones (equivalente a removeEventListener / unsubscribe).
// ============================================================================

pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Subscription sin nada que cancelar (p. ej. sin `window`)
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    /// Cancela explícitamente (equivale a drop)
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn drop_runs_cancel_once() {
        let cancelled = Rc::new(Cell::new(0));
        let counter = cancelled.clone();
        let subscription = Subscription::new(move || counter.set(counter.get() + 1));
        subscription.unsubscribe();
        assert_eq!(cancelled.get(), 1);
    }

    #[test]
    fn noop_is_inert() {
        let subscription = Subscription::noop();
        assert!(format!("{:?}", subscription).contains("false"));
    }
}
