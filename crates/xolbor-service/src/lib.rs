//! Xolbor HTTP API service.
//!
//! This crate wires the ledger store into an HTTP API:
//!
//! - Account registration, login and wallet reads
//! - The skin catalog
//! - Skin purchases and idempotent Xubor top-ups
//! - Signed payment-confirmation webhooks
//!
//! # Authentication
//!
//! 1. **Bearer access tokens** - HS256 JWTs issued at register/login
//! 2. **Admin API key** - `X-Admin-Key` header for catalog management
//! 3. **Webhook signatures** - HMAC-SHA256 over the raw body

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers must be async

pub mod auth;
pub mod config;
pub mod credentials;
pub mod crypto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod services;
pub mod state;
pub mod tokens;

pub use config::{ServiceConfig, StoreBackend};
pub use credentials::{Argon2Credentials, CredentialProvider};
pub use error::ApiError;
pub use routes::create_router;
pub use state::{open_store, AppState};
pub use tokens::TokenIssuer;
