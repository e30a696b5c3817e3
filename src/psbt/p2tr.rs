use bdk_wallet::bitcoin::secp256k1::{Secp256k1, Verification, XOnlyPublicKey};
use bdk_wallet::bitcoin::{Address, Network};

/// Pay to Taproot (P2TR) key path address of the x-only `internal_key`.
///
/// # Notes
///
/// - This only supports single signature addresses based on BIP-0086, the
///   internal key is tweaked without a script tree.
pub fn address<C>(secp: &Secp256k1<C>, internal_key: XOnlyPublicKey, network: Network) -> Address
where
    C: Verification,
{
    Address::p2tr(secp, internal_key, None, network)
}
