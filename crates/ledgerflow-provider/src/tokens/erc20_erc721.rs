//! ERC-20 / ERC-721 token factory connector

use super::{TokenConnector, TokenFlavor};
use crate::context::ProviderContext;
use ledgerflow_core::{ManifestEntry, TokenKind, VersionManifest};

pub const FLAVOR: TokenFlavor = TokenFlavor {
    kind: TokenKind::Erc20Erc721,
    instance: "/contracts/erc20erc721",
    artifact: "TokenFactory.json",
    contract_name: "TokenFactory",
    register_as: "erc20erc721",
    image,
    constructor_params,
};

fn image(manifest: &VersionManifest) -> &ManifestEntry {
    &manifest.tokens_erc20_erc721
}

fn constructor_params() -> serde_json::Value {
    serde_json::json!({})
}

pub fn new(ctx: ProviderContext) -> TokenConnector {
    TokenConnector::new(ctx, FLAVOR)
}
