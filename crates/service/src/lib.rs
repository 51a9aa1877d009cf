//! Shared service infrastructure for the Farol local daemon.
//!
//! This crate provides the components the binary composes:
//! - Database (SQLite-backed test index)
//! - IPFS client (Kubo RPC adapter for content storage and IPNS naming)
//! - State management (wires the orchestrator to its collaborators)
//! - HTTP infrastructure (health checks, fallback handler)

pub mod config;
pub mod database;
pub mod http;
pub mod ipfs;
pub mod state;

// Re-export key types for convenience
pub use config::Config;
pub use database::{Database, DatabaseSetupError};
pub use ipfs::IpfsClient;
pub use state::{State as ServiceState, StateSetupError, Store};
