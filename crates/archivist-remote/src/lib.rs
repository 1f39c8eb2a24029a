//! HTTP access to the archive service
//!
//! - `client` - ArchiveClient, the reqwest-backed `DocumentService`
//! - `config` - RemoteConfig (base URL and timeout)
//! - `models` - request bodies and response envelopes of the wire format

pub mod client;
pub mod config;
pub mod models;

pub use client::ArchiveClient;
pub use config::RemoteConfig;
