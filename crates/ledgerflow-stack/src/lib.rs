//! LedgerFlow Stack
//!
//! Lifecycle of a local multi-member FireFly network:
//!
//! - [`repository`]: stacks on disk (`<stacks>/<name>/stack.json`)
//! - [`generator`]: compose manifest, core and data exchange configs
//! - [`manager`]: init / start / stop / reset / remove / pull / upgrade / info / accounts
//! - [`setup`]: the numbered first-start steps and their observer
//! - [`identity`]: org and node registration
//! - [`manifest`]: pinned image versions
//! - [`credentials`]: data exchange TLS material

pub mod credentials;
pub mod error;
pub mod generator;
pub mod identity;
pub mod manager;
pub mod manifest;
pub mod repository;
pub mod setup;

pub use credentials::{CredentialGenerator, OpensslCli};
pub use error::{Result, StackError};
pub use manager::{Account, StackInfo, StackManager, Timing};
pub use manifest::{GithubReleases, ManifestSource, StaticManifest};
pub use repository::StackRepository;
pub use setup::{LogObserver, SetupObserver, SetupStep};
