//! HTTP client library for the Client Records API.
//!
//! This crate provides a typed HTTP client for every REST endpoint of the
//! client records backend.
//!
//! # Example
//!
//! ```no_run
//! use client_records_client::{ClientConfig, ClientRecordsClient, NewClient};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), client_records_client::Error> {
//!     let client = ClientRecordsClient::new(ClientConfig {
//!         base_url: "http://localhost:3000".into(),
//!         timeout: Duration::from_secs(30),
//!     })?;
//!
//!     let created = client
//!         .create_client(&NewClient::new("Ada Lovelace", "ada@example.com"))
//!         .await?;
//!     println!("Created client {}", created.data.id);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::{ClientConfig, ClientRecordsClient};
pub use error::Error;
pub use types::*;
