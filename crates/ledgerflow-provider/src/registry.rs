//! Provider selection from the kind strings stored on a stack

use crate::blockchain::BlockchainProvider;
use crate::context::ProviderContext;
use crate::error::{ProviderError, Result};
use crate::ethereum::{BesuProvider, GethProvider, RemoteRpcProvider};
use crate::fabric::FabricProvider;
use crate::tokens::{self, TokenProvider};
use ledgerflow_core::{BlockchainKind, TokenKind};
use std::sync::Arc;

pub fn select_blockchain(ctx: &ProviderContext) -> Result<Arc<dyn BlockchainProvider>> {
    let kind: BlockchainKind = ctx.stack.blockchain_provider.parse()?;
    tracing::debug!("Selected blockchain provider {}", kind);
    let provider: Arc<dyn BlockchainProvider> = match kind {
        BlockchainKind::Geth => Arc::new(GethProvider::new(ctx.clone())),
        BlockchainKind::Besu => Arc::new(BesuProvider::new(ctx.clone())),
        BlockchainKind::Fabric => Arc::new(FabricProvider::new(ctx.clone())),
        BlockchainKind::RemoteRpc => Arc::new(RemoteRpcProvider::new(ctx.clone())),
    };
    Ok(provider)
}

/// One provider per entry of `token_providers`, in order
pub fn select_tokens(ctx: &ProviderContext) -> Result<Vec<Arc<dyn TokenProvider>>> {
    let names = &ctx.stack.token_providers;
    if names.is_empty() {
        return Ok(vec![]);
    }

    let blockchain: BlockchainKind = ctx.stack.blockchain_provider.parse()?;
    if !blockchain.is_ethereum() {
        return Err(ProviderError::TokensOnFabric);
    }

    names
        .iter()
        .map(|name| {
            let kind: TokenKind = name.parse()?;
            let provider: Arc<dyn TokenProvider> = match kind {
                TokenKind::Erc1155 => Arc::new(tokens::erc1155::new(ctx.clone())),
                TokenKind::Erc20Erc721 => Arc::new(tokens::erc20_erc721::new(ctx.clone())),
            };
            Ok(provider)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn context(provider: &str, tokens: &[&str]) -> (tempfile::TempDir, ProviderContext) {
        let (dir, layout) = testing::layout();
        let mut stack = testing::stack(provider, 1);
        stack.token_providers = tokens.iter().map(|t| t.to_string()).collect();
        let (ctx, _) = testing::context(stack, layout);
        (dir, ctx)
    }

    #[test]
    fn test_selects_each_blockchain_kind() {
        for kind in BlockchainKind::ALL {
            let (_dir, ctx) = context(kind.as_str(), &[]);
            assert_eq!(select_blockchain(&ctx).unwrap().kind(), kind);
        }
    }

    #[test]
    fn test_unknown_blockchain_is_rejected() {
        let (_dir, ctx) = context("corda", &[]);
        let err = select_blockchain(&ctx).err().unwrap();
        assert!(err.to_string().contains("unknown blockchain provider 'corda'"));
    }

    #[test]
    fn test_tokens_keep_stack_order() {
        let (_dir, ctx) = context("geth", &["erc20_erc721", "erc1155"]);
        let kinds: Vec<_> = select_tokens(&ctx)
            .unwrap()
            .iter()
            .map(|p| p.kind())
            .collect();
        assert_eq!(kinds, vec![TokenKind::Erc20Erc721, TokenKind::Erc1155]);
    }

    #[test]
    fn test_tokens_rejected_on_fabric() {
        let (_dir, ctx) = context("fabric", &["erc1155"]);
        assert!(matches!(select_tokens(&ctx), Err(ProviderError::TokensOnFabric)));

        let (_dir, ctx) = context("fabric", &[]);
        assert!(select_tokens(&ctx).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_token_is_rejected() {
        let (_dir, ctx) = context("besu", &["erc777"]);
        assert!(matches!(select_tokens(&ctx), Err(ProviderError::Core(_))));
    }
}
