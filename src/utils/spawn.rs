use std::future::Future;

/// Lanza una tarea local (sin `Send`) en el event loop.
///
/// En el navegador usa `wasm_bindgen_futures`; fuera de wasm necesita estar
/// dentro de un `tokio::task::LocalSet` (tests).
pub fn spawn_local<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    #[cfg(target_arch = "wasm32")]
    wasm_bindgen_futures::spawn_local(future);

    #[cfg(not(target_arch = "wasm32"))]
    {
        tokio::task::spawn_local(future);
    }
}
