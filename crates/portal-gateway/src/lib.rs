//! Portal Gateway
//!
//! Bridges captive-portal login and logout requests to a Network Access
//! Server over the Huawei Portal protocol, built on top of `portal-proto`.
//!
//! # Features
//!
//! - Async UDP transport with serial-number correlation (Tokio)
//! - CHAP and PAP login, logout and information requests
//! - Handling of NAS-initiated logout notifications
//! - CHAP/PAP verification services for external callers
//! - JSON configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use portal_gateway::{PortalClient, PortalTransport};
//! use portal_proto::ProtocolVersion;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = Arc::new(
//!         PortalTransport::bind(
//!             "0.0.0.0:50100".parse()?,
//!             ProtocolVersion::V1.codec(),
//!             Duration::from_secs(8),
//!         )
//!         .await?,
//!     );
//!
//!     let client = PortalClient::new(Arc::clone(&transport), "testing123", 2000);
//!     transport.register_fallback(Arc::new(client.clone()));
//!
//!     let runner = Arc::clone(&transport);
//!     tokio::spawn(async move { runner.run().await });
//!
//!     client
//!         .auth(
//!             "192.168.56.2".parse()?,
//!             "10.0.0.1".parse()?,
//!             b"alice",
//!             b"password",
//!         )
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod registry;
pub mod transport;

pub use auth::{AuthError, ChapAuthService, PapAuthService, SimpleAuthService};
pub use client::PortalClient;
pub use config::{Config, ConfigError, User};
pub use error::PortalError;
pub use registry::{CorrelationRegistry, PendingResponse};
pub use transport::{PortalTransport, UnsolicitedHandler};
