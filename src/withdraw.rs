use crate::bip32::NgAccountPath;
use crate::config::{AccountDescriptor, Purpose, Recipient, ValidationOptions};
use crate::derive::{derive_public_key, last_two_segments};
use crate::network::NetworkParams;
use crate::psbt::{
    Classification, DecodedOutput, DerivationRecord, Error, OutputClass, build_address, classify,
    decode_outputs, decode_psbt,
};
use crate::xpub;
use bdk_wallet::bitcoin::bip32::Xpub;
use bdk_wallet::bitcoin::secp256k1::{Secp256k1, Verification, VerifyOnly};
use bdk_wallet::bitcoin::{Address, Amount};
use log::{debug, info, warn};
use std::str::FromStr;

/// An account descriptor with its extended public key normalized.
#[derive(Debug, Clone)]
pub struct AccountKey<'a> {
    pub descriptor: &'a AccountDescriptor,
    pub xpub: Xpub,
}

impl<'a> AccountKey<'a> {
    pub fn new(descriptor: &'a AccountDescriptor, params: &NetworkParams) -> Result<Self, Error> {
        Ok(Self {
            descriptor,
            xpub: xpub::normalize(&descriptor.xpub, params)?,
        })
    }

    fn purpose(&self) -> Purpose {
        self.descriptor.purpose
    }
}

fn normalize_accounts<'a>(
    accounts: &'a [AccountDescriptor],
    params: &NetworkParams,
) -> Result<Vec<AccountKey<'a>>, Error> {
    accounts
        .iter()
        .map(|account| AccountKey::new(account, params))
        .collect()
}

/// Verify that a change candidate pays to an address of one of `accounts`.
pub fn verify_change<C>(
    secp: &Secp256k1<C>,
    output: &DecodedOutput,
    accounts: &[AccountDescriptor],
    params: &NetworkParams,
) -> Result<(), Error>
where
    C: Verification,
{
    let keys = normalize_accounts(accounts, params)?;
    verify_change_with_keys(secp, output, &keys, params)
}

fn verify_change_with_keys<C>(
    secp: &Secp256k1<C>,
    output: &DecodedOutput,
    keys: &[AccountKey<'_>],
    params: &NetworkParams,
) -> Result<(), Error>
where
    C: Verification,
{
    for record in output.derivations.iter().filter(|r| r.is_usable()) {
        let relative_path = last_two_segments(&record.path)?;

        for key in keys {
            let child = derive_public_key(secp, &key.xpub, relative_path)?;
            let candidate = build_address(secp, &child, key.purpose(), params.network);
            if candidate.matches_script_pubkey(&output.script_pubkey) {
                debug!(
                    "output {} is change of account {} at {} (master {})",
                    output.index,
                    key.descriptor.origin_path(),
                    record.path,
                    record.fingerprint
                );
                if !record.key.matches(&child) {
                    warn!(
                        "output {} discloses {:?} but {} derives {}",
                        output.index, record.key, record.path, child
                    );
                }
                warn_on_origin_mismatch(output, record, key.descriptor);
                return Ok(());
            }
        }
    }

    warn!(
        "no account derives change output {} ({})",
        output.index,
        output.destination()
    );
    Err(Error::ChangeMismatch {
        index: output.index,
        address: output.destination(),
    })
}

/// The address already proves ownership, but a path that names another
/// account than the one that matched is worth flagging.
fn warn_on_origin_mismatch(
    output: &DecodedOutput,
    record: &DerivationRecord,
    descriptor: &AccountDescriptor,
) {
    match NgAccountPath::parse(&record.path) {
        Ok(Some(path)) if !path.matches_account(descriptor) => warn!(
            "output {} derivation path {} does not match account {}",
            output.index,
            record.path,
            descriptor.origin_path()
        ),
        Ok(Some(path)) if path.is_change() != Some(true) => debug!(
            "output {} is verified but {} is not a change path",
            output.index, record.path
        ),
        Err(e) => warn!(
            "output {} has a non-standard derivation path {}: {e}",
            output.index, record.path
        ),
        _ => (),
    }
}

/// The declared recipients not yet matched against an output.
///
/// Each recipient pays at most one output, so two outputs can't be
/// justified by a single declared payment.
#[derive(Debug, Clone)]
pub struct RecipientPool<'a> {
    remaining: Vec<(&'a Recipient, Address, Amount)>,
}

impl<'a> RecipientPool<'a> {
    pub fn new(recipients: &'a [Recipient], params: &NetworkParams) -> Result<Self, Error> {
        let remaining = recipients
            .iter()
            .map(|recipient| {
                let address = parse_address(&recipient.address, params)?;
                Ok((recipient, address, Amount::from_sat(recipient.amount_sat)))
            })
            .collect::<Result<_, Error>>()?;

        Ok(Self { remaining })
    }

    /// Consume the recipient paid exactly by `output`.
    ///
    /// Outputs without an address, e.g. OP_RETURN, never match and are
    /// reported with their script hex.
    pub fn match_output(&mut self, output: &DecodedOutput) -> Result<(), Error> {
        let position = self.remaining.iter().position(|(_, address, amount)| {
            *amount == output.amount && address.matches_script_pubkey(&output.script_pubkey)
        });

        match position {
            Some(position) => {
                self.remaining.swap_remove(position);
                debug!("output {} matches a recipient", output.index);
                Ok(())
            }
            None => {
                warn!(
                    "output {} pays {} to an undeclared recipient",
                    output.index, output.amount
                );
                Err(Error::RecipientMismatch {
                    index: output.index,
                    address: output.destination(),
                })
            }
        }
    }

    /// Declared recipients no output has paid.
    pub fn unpaid(&self) -> impl Iterator<Item = &'a Recipient> + '_ {
        self.remaining.iter().map(|(recipient, _, _)| *recipient)
    }
}

fn parse_address(address: &str, params: &NetworkParams) -> Result<Address, Error> {
    let invalid = |reason: String| Error::InvalidRecipientAddress {
        address: address.to_owned(),
        reason,
    };

    Address::from_str(address)
        .map_err(|e| invalid(e.to_string()))?
        .require_network(params.network)
        .map_err(|e| invalid(e.to_string()))
}

struct Validator<'a, C: Verification> {
    secp: Secp256k1<C>,
    params: &'a NetworkParams,
    keys: Vec<AccountKey<'a>>,
    recipients: RecipientPool<'a>,
}

impl<'a> Validator<'a, VerifyOnly> {
    fn new(
        params: &'a NetworkParams,
        recipients: &'a [Recipient],
        accounts: &'a [AccountDescriptor],
    ) -> Result<Self, Error> {
        Ok(Self {
            secp: Secp256k1::verification_only(),
            params,
            keys: normalize_accounts(accounts, params)?,
            recipients: RecipientPool::new(recipients, params)?,
        })
    }
}

impl<C: Verification> Validator<'_, C> {
    fn check(&mut self, class: OutputClass, output: &DecodedOutput) -> Result<(), Error> {
        match class {
            OutputClass::Change => {
                verify_change_with_keys(&self.secp, output, &self.keys, self.params)
            }
            OutputClass::Recipient => self.recipients.match_output(output),
        }
    }

    fn check_unpaid(&self) -> Option<Error> {
        self.recipients.unpaid().next().map(|recipient| {
            warn!("recipient {} is not paid", recipient.address);
            Error::UnpaidRecipient {
                address: recipient.address.clone(),
                amount_sat: recipient.amount_sat,
            }
        })
    }
}

fn decode(psbt_hex: &str, params: &NetworkParams) -> Result<Classification, Error> {
    let psbt = decode_psbt(psbt_hex)?;
    let outputs = decode_outputs(&psbt, params)?;
    Ok(classify(outputs))
}

/// Validate that every output of the withdrawal PSBT is either change of
/// one of `accounts` or an exact payment to one of `recipients`.
///
/// Stops at the first output that fails.
pub fn validate_psbt_for_withdraw(
    psbt_hex: &str,
    params: &NetworkParams,
    recipients: &[Recipient],
    accounts: &[AccountDescriptor],
) -> Result<(), Error> {
    validate_psbt_for_withdraw_with(
        psbt_hex,
        params,
        recipients,
        accounts,
        ValidationOptions::default(),
    )
}

/// Same as [`validate_psbt_for_withdraw`] with extra `options`.
pub fn validate_psbt_for_withdraw_with(
    psbt_hex: &str,
    params: &NetworkParams,
    recipients: &[Recipient],
    accounts: &[AccountDescriptor],
    options: ValidationOptions,
) -> Result<(), Error> {
    let classification = decode(psbt_hex, params)?;
    let mut validator = Validator::new(params, recipients, accounts)?;

    for (class, output) in classification.iter() {
        validator.check(class, output)?;
    }

    if options.require_all_recipients_paid {
        if let Some(e) = validator.check_unpaid() {
            return Err(e);
        }
    }

    info!(
        "withdraw PSBT is valid: {} output(s), {} change",
        classification.len(),
        classification.change.len()
    );
    Ok(())
}

/// Run every withdrawal check and report all the failures instead of only
/// the first one. An empty list means the PSBT is valid.
///
/// Failing to decode the PSBT or the inputs is still returned as an error.
pub fn audit_psbt_for_withdraw(
    psbt_hex: &str,
    params: &NetworkParams,
    recipients: &[Recipient],
    accounts: &[AccountDescriptor],
    options: ValidationOptions,
) -> Result<Vec<Error>, Error> {
    let classification = decode(psbt_hex, params)?;
    let mut validator = Validator::new(params, recipients, accounts)?;

    let mut failures: Vec<Error> = classification
        .iter()
        .filter_map(|(class, output)| validator.check(class, output).err())
        .collect();

    if options.require_all_recipients_paid {
        failures.extend(validator.check_unpaid());
    }

    info!("withdraw PSBT audit found {} failure(s)", failures.len());
    Ok(failures)
}

/// Validate that a consolidation PSBT only pays to the wallet base address,
/// or to change of one of `accounts`.
///
/// A missing `base_address` is an error, the check is never skipped.
pub fn validate_psbt_for_consolidation(
    psbt_hex: &str,
    params: &NetworkParams,
    base_address: Option<&str>,
    accounts: &[AccountDescriptor],
) -> Result<(), Error> {
    let base_address = base_address.ok_or(Error::UnresolvableBaseAddress)?;
    let base_address = parse_address(base_address, params)?;

    let classification = decode(psbt_hex, params)?;
    let secp = Secp256k1::verification_only();
    let keys = normalize_accounts(accounts, params)?;

    for (class, output) in classification.iter() {
        if base_address.matches_script_pubkey(&output.script_pubkey) {
            continue;
        }

        match class {
            OutputClass::Change => verify_change_with_keys(&secp, output, &keys, params)?,
            OutputClass::Recipient => {
                warn!(
                    "consolidation output {} leaves the wallet: {}",
                    output.index,
                    output.destination()
                );
                return Err(Error::ConsolidationMismatch {
                    index: output.index,
                    address: output.destination(),
                });
            }
        }
    }

    info!("consolidation PSBT to {base_address} is valid");
    Ok(())
}
