//! Stack data model

mod kind;
mod manifest;
mod options;
mod port;
mod stack;

pub use kind::{BlockchainKind, DatabaseKind, TokenKind};
pub use manifest::{ManifestEntry, VersionManifest};
pub use options::{InitOptions, PullOptions, StartOptions};
pub use port::PortSet;
pub use stack::{DeployedContract, Member, Stack, StackLayout};
