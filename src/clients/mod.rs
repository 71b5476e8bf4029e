//! Clients - HTTP Clients for External APIs
//!
//! Este módulo contiene los clientes HTTP para servicios externos.

pub mod identity_client;

pub use identity_client::{
    IdentityError, IdentityProvider, SupabaseAuthClient, UnconfiguredIdentityProvider,
};
