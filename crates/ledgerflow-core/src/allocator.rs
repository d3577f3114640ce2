//! Deterministic per-member port allocation
//!
//! Each member owns a block of 100 host ports starting at
//! `services_base + index * 100`. Offset 0 of member 0's block is the shared
//! blockchain port, so member roles start at offset 1.

use crate::model::PortSet;

/// Optional ports appended after the fixed roles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortExtras {
    pub metrics: bool,
    pub token_count: usize,
}

const BLOCK_SIZE: u16 = 100;
const FIXED_ROLES: u16 = 8;

impl PortExtras {
    /// Token connectors that still fit inside one member block
    pub fn max_token_count(metrics: bool) -> usize {
        usize::from(BLOCK_SIZE - FIXED_ROLES - u16::from(metrics))
    }

    pub fn fits_block(&self) -> bool {
        self.token_count <= Self::max_token_count(self.metrics)
    }
}

pub fn allocate(services_base: u16, firefly_base: u16, index: usize, extras: PortExtras) -> PortSet {
    let index = index as u16;
    let service_base = services_base + index * BLOCK_SIZE;

    let mut next = service_base + FIXED_ROLES;
    let metrics = extras.metrics.then(|| {
        let port = next;
        next += 1;
        port
    });
    let tokens = (0..extras.token_count as u16).map(|i| next + i).collect();

    PortSet {
        firefly: firefly_base + index,
        admin: service_base + 1,
        connector: service_base + 2,
        ui: service_base + 3,
        database: service_base + 4,
        dataexchange: service_base + 5,
        ipfs_api: service_base + 6,
        ipfs_gateway: service_base + 7,
        metrics,
        tokens,
    }
}
