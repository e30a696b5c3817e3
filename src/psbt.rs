mod p2sh;
mod p2tr;
mod p2wpkh;

use crate::config::Purpose;
use crate::derive::DeriveError;
use crate::network::NetworkParams;
use crate::xpub::NormalizeError;
use bdk_wallet::bitcoin::bip32::{DerivationPath, Fingerprint};
use bdk_wallet::bitcoin::psbt;
use bdk_wallet::bitcoin::psbt::Psbt;
use bdk_wallet::bitcoin::secp256k1::{PublicKey, Secp256k1, Verification, XOnlyPublicKey};
use bdk_wallet::bitcoin::{Address, Amount, CompressedPublicKey, Network, ScriptBuf};
use log::debug;
use thiserror::Error;

/// Errors that can happen during PSBT validation.
#[derive(Debug, Error)]
pub enum Error {
    /// The PSBT is not valid hexadecimal.
    #[error("malformed PSBT hex: {0}")]
    MalformedInput(#[from] hex::FromHexError),

    /// The PSBT could not be decoded.
    #[error("PSBT error: {0}")]
    Psbt(#[from] psbt::Error),

    #[error("invalid extended public key: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("{0}")]
    Derive(#[from] DeriveError),

    /// Information missing for output.
    #[error("the output number {index} is missing")]
    MissingOutput { index: usize },

    #[error("invalid recipient address {address}: {reason}")]
    InvalidRecipientAddress { address: String, reason: String },

    /// A change output could not be attributed to any known account.
    #[error("Derived pubkey does not match for address")]
    ChangeMismatch { index: usize, address: String },

    /// A payment output does not exactly match any declared recipient.
    #[error("{address} does not match any recipient")]
    RecipientMismatch { index: usize, address: String },

    /// A declared recipient is not paid by any output.
    #[error("recipient {address} for {amount_sat} sat is not paid by any output")]
    UnpaidRecipient { address: String, amount_sat: u64 },

    #[error("Unable to determine base address for consolidation")]
    UnresolvableBaseAddress,

    #[error("{address} is not the base address of the consolidation")]
    ConsolidationMismatch { index: usize, address: String },
}

/// Public key disclosed in a derivation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivationKey {
    /// From the `bip32_derivation` map.
    Ecdsa(PublicKey),
    /// From the `tap_key_origins` map.
    XOnly(XOnlyPublicKey),
}

impl DerivationKey {
    /// Returns true if the disclosed key is `pk`, or its x-only form.
    pub fn matches(&self, pk: &CompressedPublicKey) -> bool {
        match self {
            DerivationKey::Ecdsa(key) => *key == pk.0,
            DerivationKey::XOnly(key) => *key == pk.0.x_only_public_key().0,
        }
    }
}

/// A BIP-0032 derivation disclosed for an output by the PSBT creator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationRecord {
    pub fingerprint: Fingerprint,
    pub path: DerivationPath,
    pub key: DerivationKey,
}

impl DerivationRecord {
    /// Records with an empty path can't point to an address of an account.
    pub fn is_usable(&self) -> bool {
        !self.path.as_ref().is_empty()
    }
}

/// A PSBT output reduced to what the withdrawal checks need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedOutput {
    /// Position of the output in the transaction.
    pub index: usize,
    /// `None` for scripts without an address form, e.g. OP_RETURN.
    pub address: Option<Address>,
    pub script_pubkey: ScriptBuf,
    pub amount: Amount,
    pub derivations: Vec<DerivationRecord>,
}

impl DecodedOutput {
    /// Returns true if the output discloses at least one usable derivation.
    pub fn is_change_candidate(&self) -> bool {
        self.derivations.iter().any(DerivationRecord::is_usable)
    }

    /// Human readable destination, the address or the raw script.
    pub fn destination(&self) -> String {
        match self.address {
            Some(ref address) => address.to_string(),
            None => self.script_pubkey.to_hex_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputClass {
    Change,
    Recipient,
}

/// Outputs split into change and recipient candidates.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub change: Vec<DecodedOutput>,
    pub recipients: Vec<DecodedOutput>,
}

impl Classification {
    /// Every output with its class, in transaction order.
    pub fn iter(&self) -> impl Iterator<Item = (OutputClass, &DecodedOutput)> {
        let mut all: Vec<_> = self
            .change
            .iter()
            .map(|output| (OutputClass::Change, output))
            .chain(
                self.recipients
                    .iter()
                    .map(|output| (OutputClass::Recipient, output)),
            )
            .collect();
        all.sort_by_key(|(_, output)| output.index);
        all.into_iter()
    }

    pub fn len(&self) -> usize {
        self.change.len() + self.recipients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decode a hex encoded PSBT.
pub fn decode_psbt(psbt_hex: &str) -> Result<Psbt, Error> {
    let bytes = hex::decode(psbt_hex.trim())?;
    Ok(Psbt::deserialize(&bytes)?)
}

/// Extract the address, amount and disclosed derivations of every output.
pub fn decode_outputs(psbt: &Psbt, params: &NetworkParams) -> Result<Vec<DecodedOutput>, Error> {
    psbt.outputs
        .iter()
        .enumerate()
        .map(|(index, output)| {
            let Some(txout) = psbt.unsigned_tx.output.get(index) else {
                return Err(Error::MissingOutput { index });
            };

            let address = Address::from_script(&txout.script_pubkey, params.network).ok();

            let ecdsa = output
                .bip32_derivation
                .iter()
                .map(|(pk, (fingerprint, path))| DerivationRecord {
                    fingerprint: *fingerprint,
                    path: path.clone(),
                    key: DerivationKey::Ecdsa(*pk),
                });
            let x_only = output.tap_key_origins.iter().map(
                |(x_only_pk, (_leaf_hashes, (fingerprint, path)))| DerivationRecord {
                    fingerprint: *fingerprint,
                    path: path.clone(),
                    key: DerivationKey::XOnly(*x_only_pk),
                },
            );

            Ok(DecodedOutput {
                index,
                address,
                script_pubkey: txout.script_pubkey.clone(),
                amount: txout.value,
                derivations: ecdsa.chain(x_only).collect(),
            })
        })
        .collect()
}

/// Split outputs into change candidates and recipient candidates.
///
/// Outputs without a usable derivation are always recipient candidates, even
/// if they pay to one of our addresses.
pub fn classify(outputs: Vec<DecodedOutput>) -> Classification {
    let (change, recipients): (Vec<_>, Vec<_>) = outputs
        .into_iter()
        .partition(DecodedOutput::is_change_candidate);

    debug!(
        "classified {} change candidate(s) and {} recipient candidate(s)",
        change.len(),
        recipients.len()
    );

    Classification { change, recipients }
}

/// Build the address of `pk` for the script type selected by `purpose`.
pub fn build_address<C>(
    secp: &Secp256k1<C>,
    pk: &CompressedPublicKey,
    purpose: Purpose,
    network: Network,
) -> Address
where
    C: Verification,
{
    match purpose {
        Purpose::Bip49 => p2sh::address(pk, network),
        Purpose::Bip84 => p2wpkh::address(pk, network),
        Purpose::Bip86 => p2tr::address(secp, pk.0.x_only_public_key().0, network),
    }
}
