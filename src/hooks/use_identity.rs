// ============================================================================
// USE IDENTITY - Hook para el header / navegación
// ============================================================================
// Crea un `IdentityViewModel` por componente sobre el `IdentityContext`
// compartido, lo monta al renderizar por primera vez y lo desecha al desmontar.
// ============================================================================

use yew::prelude::*;

use crate::models::Identity;
use crate::viewmodels::IdentityContext;

/// Identidad actual (`None` = anónimo). Sin `ContextProvider` usa el contexto de la pestaña.
#[hook]
pub fn use_identity() -> Option<Identity> {
    let context = use_context::<IdentityContext>();
    let identity = use_state(|| None::<Identity>);

    {
        let identity = identity.clone();
        use_effect_with((), move |_| {
            let viewmodel = context.unwrap_or_else(IdentityContext::browser).viewmodel();

            let subscription = viewmodel.subscribe(move |next| identity.set(next));
            viewmodel.mount();

            move || {
                drop(subscription);
                viewmodel.dispose();
            }
        });
    }

    (*identity).clone()
}
