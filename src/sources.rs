//! Host-facing data sources: inputs, validation, and the records each read produces.

pub mod membership;
pub mod vault_token;

pub use membership::*;
pub use vault_token::*;
