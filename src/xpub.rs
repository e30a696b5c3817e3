use crate::network::NetworkParams;
use bdk_wallet::bitcoin::base58;
use bdk_wallet::bitcoin::bip32::{self, Xpub};
use thiserror::Error;

/// Length of a serialized BIP-0032 extended key.
const EXTENDED_KEY_LEN: usize = 78;

/// Errors that can happen while normalizing an extended public key.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("malformed extended key: {0}")]
    Base58(#[from] base58::Error),

    #[error("malformed extended key: expected 78 bytes, got {0}")]
    InvalidLength(usize),

    /// The version prefix isn't a public prefix of the requested network,
    /// this includes private keys and keys of other networks.
    #[error("extended key version {0:02x?} is not a public key version of this network")]
    UnknownVersion([u8; 4]),

    #[error("malformed extended key: {0}")]
    Bip32(#[from] bip32::Error),
}

/// Normalize an extended public key encoded with any of the SLIP-0132
/// prefixes of `params` (`xpub`, `ypub`, `zpub`, ...) to the canonical
/// extended public key of the network.
///
/// Only the 4 version bytes are replaced, depth, parent fingerprint, child
/// number, chain code and public key are kept as is.
pub fn normalize(key: &str, params: &NetworkParams) -> Result<Xpub, NormalizeError> {
    let data = canonical_bytes(key, params)?;
    Ok(Xpub::decode(&data)?)
}

/// Same as [`normalize`] but returns the re-encoded key with a fresh checksum.
pub fn normalize_to_string(key: &str, params: &NetworkParams) -> Result<String, NormalizeError> {
    let data = canonical_bytes(key, params)?;
    // Decode anyway so that the key bytes are checked to be a valid point.
    Xpub::decode(&data)?;
    Ok(base58::encode_check(&data))
}

fn canonical_bytes(key: &str, params: &NetworkParams) -> Result<Vec<u8>, NormalizeError> {
    let mut data = base58::decode_check(key.trim())?;
    if data.len() != EXTENDED_KEY_LEN {
        return Err(NormalizeError::InvalidLength(data.len()));
    }

    let mut version = [0u8; 4];
    version.copy_from_slice(&data[..4]);
    if !params.is_known_version(&version) {
        return Err(NormalizeError::UnknownVersion(version));
    }

    data[..4].copy_from_slice(&params.canonical_xpub_version);
    Ok(data)
}
