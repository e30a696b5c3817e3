use bdk_wallet::bitcoin::CompressedPublicKey;
use bdk_wallet::bitcoin::bip32::{self, ChildNumber, DerivationPath, Xpub};
use bdk_wallet::bitcoin::secp256k1::{Secp256k1, Verification};
use thiserror::Error;

/// Errors that can happen during public key derivation.
#[derive(Debug, Error)]
pub enum DeriveError {
    /// Hardened children can't be derived without the private key.
    #[error("hardened derivation is not supported from a public key: {0}")]
    HardenedDerivationUnsupported(String),

    #[error("child index {0} is out of range for non-hardened derivation")]
    InvalidIndex(String),

    #[error("invalid derivation path segment: {0:?}")]
    InvalidSegment(String),

    #[error("derivation path {0} must have at least change and address index")]
    PathTooShort(DerivationPath),

    #[error("failed to derive key: {0}")]
    Bip32(#[from] bip32::Error),
}

/// Derive the child public key at `path` relative to `xpub`.
///
/// Every child number in `path` must be non-hardened.
pub fn derive_public_key<C>(
    secp: &Secp256k1<C>,
    xpub: &Xpub,
    path: impl AsRef<[ChildNumber]>,
) -> Result<CompressedPublicKey, DeriveError>
where
    C: Verification,
{
    let path = path.as_ref();
    if let Some(hardened) = path.iter().find(|child| child.is_hardened()) {
        return Err(DeriveError::HardenedDerivationUnsupported(hardened.to_string()));
    }

    let child = xpub.derive_pub(secp, &path)?;
    Ok(child.to_pub())
}

/// Returns the change and address index children of a full derivation path,
/// e.g. `1/6` for `m/84'/0'/0'/1/6`.
pub fn last_two_segments(path: &DerivationPath) -> Result<[ChildNumber; 2], DeriveError> {
    match path.as_ref() {
        [.., change, index] => Ok([*change, *index]),
        _ => Err(DeriveError::PathTooShort(path.clone())),
    }
}

/// Parse a relative, non-hardened derivation path such as `1/6` or `m/0/3`.
pub fn parse_relative_path(path: &str) -> Result<Vec<ChildNumber>, DeriveError> {
    let path = path.trim();
    let path = if path == "m" {
        ""
    } else {
        path.strip_prefix("m/").unwrap_or(path)
    };

    if path.is_empty() {
        return Ok(Vec::new());
    }

    path.split('/').map(parse_segment).collect()
}

fn parse_segment(segment: &str) -> Result<ChildNumber, DeriveError> {
    if segment.ends_with(['\'', 'h', 'H']) {
        return Err(DeriveError::HardenedDerivationUnsupported(segment.to_owned()));
    }

    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DeriveError::InvalidSegment(segment.to_owned()));
    }

    let index = segment
        .parse::<u32>()
        .map_err(|_| DeriveError::InvalidIndex(segment.to_owned()))?;

    ChildNumber::from_normal_idx(index).map_err(|_| DeriveError::InvalidIndex(segment.to_owned()))
}
