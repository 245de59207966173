//! AppRole login inputs, issued credentials, and the identifiers that tie them together.

pub mod credential;
pub mod id;
pub mod request;
pub mod secret;

pub use credential::*;
pub use id::*;
pub use request::*;
pub use secret::*;
