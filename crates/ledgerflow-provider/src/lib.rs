//! LedgerFlow Provider
//!
//! Pluggable backends of a stack. A stack has exactly one
//! [`BlockchainProvider`] and zero or more [`TokenProvider`]s, chosen once per
//! invocation from the kind strings stored in `stack.json`.
//!
//! | kind         | node                 | connector   |
//! |--------------|----------------------|-------------|
//! | `geth`       | go-ethereum (clique) | ethconnect  |
//! | `besu`       | besu + signer        | ethconnect  |
//! | `remote-rpc` | signer → remote URL  | ethconnect  |
//! | `fabric`     | CA, orderer, peer    | fabconnect  |

pub mod blockchain;
pub mod context;
pub mod error;
pub mod ethereum;
pub mod fabric;
pub mod registry;
pub mod tokens;

#[cfg(test)]
mod testing;

pub use blockchain::{BlockchainProvider, ContractDeploymentResult};
pub use context::{ProviderContext, ProviderTiming};
pub use error::{ProviderError, Result};
pub use registry::{select_blockchain, select_tokens};
pub use tokens::TokenProvider;
