//! LedgerFlow Core
//!
//! Data model shared by every LedgerFlow crate: the persisted [`Stack`] record,
//! its [`Member`] nodes, deterministic port allocation, key material and the
//! per-node application configuration document.
//!
//! ```text
//! Stack ──┬── Member 0 ── PortSet (5100..5107, firefly 5000)
//!         ├── Member 1 ── PortSet (5200..5207, firefly 5001)
//!         └── VersionManifest (image + tag per subsystem)
//! ```

pub mod allocator;
pub mod core_config;
pub mod error;
pub mod keys;
pub mod merge;
pub mod model;

pub use allocator::{PortExtras, allocate};
pub use core_config::*;
pub use error::{CoreError, Result};
pub use keys::{KeyPair, generate_swarm_key};
pub use merge::merge_yaml;
pub use model::*;
