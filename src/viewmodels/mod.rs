pub mod identity_context;
pub mod identity_viewmodel;

pub use identity_context::IdentityContext;
pub use identity_viewmodel::{resolve, IdentityViewModel};
