use bdk_wallet::bitcoin::{Address, CompressedPublicKey, Network};

/// Pay to Witness Public Key Hash (P2WPKH) address of `pk`, i.e. the
/// segwit v0 encoding of `OP_0 <HASH160(pk)>`.
pub fn address(pk: &CompressedPublicKey, network: Network) -> Address {
    Address::p2wpkh(pk, network)
}
