//! Xolbor Client SDK.
//!
//! A typed client for the Xolbor ledger API: accounts, the skin catalog,
//! purchases and top-ups.
//!
//! # Example
//!
//! ```no_run
//! use xolbor_client::{ItemQuery, XolborClient};
//!
//! # async fn example() -> Result<(), xolbor_client::ClientError> {
//! let client = XolborClient::new("http://xolbor:8080")?;
//!
//! let session = client.login("ninja", "correct horse battery").await?;
//! let page = client.list_items(&ItemQuery::default()).await?;
//!
//! let receipt = client.purchase(&session.token, page.items[0].id).await?;
//! println!("New balance: {} Xubor", receipt.new_balance);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod types;

pub use client::{ClientOptions, XolborClient};
pub use error::ClientError;
pub use types::*;
