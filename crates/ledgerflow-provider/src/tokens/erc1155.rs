//! ERC-1155 mixed fungible token connector

use super::{TokenConnector, TokenFlavor};
use crate::context::ProviderContext;
use ledgerflow_core::{ManifestEntry, TokenKind, VersionManifest};

pub const FLAVOR: TokenFlavor = TokenFlavor {
    kind: TokenKind::Erc1155,
    instance: "/contracts/erc1155",
    artifact: "ERC1155MixedFungible.json",
    contract_name: "ERC1155MixedFungible",
    register_as: "erc1155",
    image,
    constructor_params,
};

fn image(manifest: &VersionManifest) -> &ManifestEntry {
    &manifest.tokens_erc1155
}

fn constructor_params() -> serde_json::Value {
    serde_json::json!({ "uri": "https://api.example.com/api/item/{id}.json" })
}

pub fn new(ctx: ProviderContext) -> TokenConnector {
    TokenConnector::new(ctx, FLAVOR)
}
