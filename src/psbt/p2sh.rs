use bdk_wallet::bitcoin::{Address, CompressedPublicKey, Network};

/// P2WPKH nested in P2SH address of `pk`.
///
/// The redeem script is the P2WPKH witness program of `pk` and the output
/// script is `OP_HASH160 <HASH160(redeem_script)> OP_EQUAL`.
pub fn address(pk: &CompressedPublicKey, network: Network) -> Address {
    Address::p2shwpkh(pk, network)
}
