pub mod use_identity;

pub use use_identity::use_identity;
