//! secp256k1 key material for member identities

use crate::error::{CoreError, Result};
use k256::ecdsa::SigningKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use rand::RngCore;
use sha3::{Digest, Keccak256};

/// Ethereum style key pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    /// `0x` + 40 hex characters
    pub address: String,
    /// 64 hex characters, no prefix
    pub private_key: String,
}

impl KeyPair {
    pub fn generate() -> Self {
        Self::from_signing_key(&SigningKey::random(&mut rand::thread_rng()))
    }

    pub fn from_private_key_hex(private_key: &str) -> Result<Self> {
        let bytes = hex::decode(private_key.trim_start_matches("0x"))
            .map_err(|e| CoreError::Key(e.to_string()))?;
        let key = SigningKey::from_slice(&bytes).map_err(|e| CoreError::Key(e.to_string()))?;
        Ok(Self::from_signing_key(&key))
    }

    fn from_signing_key(key: &SigningKey) -> Self {
        let point = key.verifying_key().as_affine().to_encoded_point(false);
        // drop the 0x04 uncompressed marker
        let hash = Keccak256::digest(&point.as_bytes()[1..]);
        Self {
            address: format!("0x{}", hex::encode(&hash[12..])),
            private_key: hex::encode(key.to_bytes()),
        }
    }
}

/// IPFS private network key
pub fn generate_swarm_key() -> String {
    let mut key = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut key);
    format!("/key/swarm/psk/1.0.0/\n/base16/\n{}", hex::encode(key))
}
