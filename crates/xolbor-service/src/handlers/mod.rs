//! API handlers.

pub mod accounts;
pub mod catalog;
pub mod health;
pub mod purchases;
pub mod stats;
pub mod topups;
pub mod webhooks;
