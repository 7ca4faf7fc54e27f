//! Crate for managing volumes through the Cloud Volumes Service API
//!
//! The control plane provisions volumes asynchronously and sheds load by answering with
//! a handful of well known "try again later" errors. This crate wraps that behaviour:
//! every call carries a freshly minted service account token, busy responses are retried
//! with randomized backoff, and a create keeps its creation token across retries so the
//! control plane never sees two different volumes for one request.
//!
//! # Example
//!
//! ```rust,no_run
//! use cvs_client::{api::VolumeApi, Client, Config};
//! use cvs_client::core::VolumeRequest;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads CVS_PROJECT and GOOGLE_APPLICATION_CREDENTIALS among others
//!     let config = Config::from_env()?;
//!     let volumes = VolumeApi::new(Client::try_from(config)?);
//!
//!     let created = volumes
//!         .create(VolumeRequest {
//!             name: "scratch".into(),
//!             region: "us-west2".into(),
//!             network: "default".into(),
//!             protocol_types: vec!["NFSv3".into()],
//!             size: 1 << 40,
//!             service_level: "standard".into(),
//!             ..VolumeRequest::default()
//!         })
//!         .await?;
//!     println!("created {:?} with token {}", created.volume_id(), created.creation_token);
//!
//!     for v in volumes.list("us-west2").await? {
//!         println!("{} is {}", v.name, v.lifecycle_state);
//!     }
//!     Ok(())
//! }
//! ```
#![forbid(unsafe_code)]

pub mod api;
pub mod client;
pub mod config;
pub mod error;

#[doc(inline)]
pub use api::VolumeApi;
#[doc(inline)]
pub use client::Client;
#[doc(inline)]
pub use config::Config;
#[doc(inline)]
pub use error::Error;

/// Convient alias for `Result<T, Error>`
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Re-exports from cvs_core
pub use cvs_core as core;
