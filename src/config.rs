use crate::network::NetworkParams;
use crate::xpub::{self, NormalizeError};
use anyhow::Context;
use bdk_wallet::bitcoin::Network;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// BIP-0043 purpose of an account, selects the script type of its addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Purpose {
    /// Pay to witness pubkey hash nested in pay to script hash.
    Bip49,
    /// Pay to witness pubkey hash.
    Bip84,
    /// Pay to taproot, key path only.
    Bip86,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("unsupported purpose: {0}")]
pub struct PurposeError(pub u32);

impl TryFrom<u32> for Purpose {
    type Error = PurposeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            49 => Ok(Purpose::Bip49),
            84 => Ok(Purpose::Bip84),
            86 => Ok(Purpose::Bip86),
            other => Err(PurposeError(other)),
        }
    }
}

impl From<Purpose> for u32 {
    fn from(purpose: Purpose) -> Self {
        match purpose {
            Purpose::Bip49 => 49,
            Purpose::Bip84 => 84,
            Purpose::Bip86 => 86,
        }
    }
}

/// One cosigner account whose addresses may legitimately receive change.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AccountDescriptor {
    /// Account level extended public key, any prefix of the network
    /// (`xpub`, `ypub`, `zpub`, `tpub`, ...).
    pub xpub: String,
    pub purpose: Purpose,
    pub coin_type: u32,
    pub account_index: u32,
}

impl AccountDescriptor {
    pub fn new(
        xpub: impl Into<String>,
        purpose: u32,
        coin_type: u32,
        account_index: u32,
    ) -> Result<Self, PurposeError> {
        Ok(Self {
            xpub: xpub.into(),
            purpose: Purpose::try_from(purpose)?,
            coin_type,
            account_index,
        })
    }

    /// The derivation path of the account from the master key.
    pub fn origin_path(&self) -> String {
        format!(
            "m/{}'/{}'/{}'",
            u32::from(self.purpose),
            self.coin_type,
            self.account_index
        )
    }

    /// Check that the extended public key can be normalized for `params`.
    pub fn check(&self, params: &NetworkParams) -> Result<(), NormalizeError> {
        xpub::normalize(&self.xpub, params).map(|_| ())
    }
}

/// A payment the withdrawal is expected to make.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub address: String,
    #[serde(alias = "amount")]
    pub amount_sat: u64,
}

impl Recipient {
    pub fn new(address: impl Into<String>, amount_sat: u64) -> Self {
        Self {
            address: address.into(),
            amount_sat,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Also require every declared recipient to be paid by some output.
    #[serde(default)]
    pub require_all_recipients_paid: bool,
}

/// Everything needed to validate a withdrawal PSBT.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WithdrawRequest {
    /// Hex encoded PSBT.
    pub psbt: String,
    pub network: Network,
    pub recipients: Vec<Recipient>,
    pub accounts: Vec<AccountDescriptor>,
    #[serde(default)]
    pub options: ValidationOptions,
}

impl WithdrawRequest {
    pub fn params(&self) -> NetworkParams {
        NetworkParams::from(self.network)
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize withdraw request")
    }

    /// Parse a request from JSON, rejecting accounts whose extended public
    /// key can't be used on the request network.
    pub fn from_json(data: &str) -> anyhow::Result<Self> {
        let request: Self =
            serde_json::from_str(data).context("failed to parse withdraw request")?;

        let params = request.params();
        for (i, account) in request.accounts.iter().enumerate() {
            account
                .check(&params)
                .with_context(|| format!("account {i} ({}) is invalid", account.origin_path()))?;
        }

        Ok(request)
    }

    pub fn validate(&self) -> Result<(), crate::psbt::Error> {
        crate::withdraw::validate_psbt_for_withdraw_with(
            &self.psbt,
            &self.params(),
            &self.recipients,
            &self.accounts,
            self.options,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZPUB: &str = "zpub6rFR7y4Q2AijBEqTUquhVz398htDFrtymD9xYYfG1m4wAcvPhXNfE3EfH1r1ADqtfSdVCToUG868RvUUkgDKf31mGDtKsAYz2oz2AGutZYs";

    #[test]
    fn purpose_from_number() {
        assert_eq!(Purpose::try_from(84), Ok(Purpose::Bip84));
        assert_eq!(Purpose::try_from(44), Err(PurposeError(44)));
        assert!(AccountDescriptor::new(ZPUB, 48, 0, 0).is_err());
    }

    #[test]
    fn origin_path() {
        let account = AccountDescriptor::new(ZPUB, 84, 0, 3).unwrap();
        assert_eq!(account.origin_path(), "m/84'/0'/3'");
    }

    #[test]
    fn request_from_json() {
        let json = format!(
            r#"{{
                "psbt": "70736274ff",
                "network": "bitcoin",
                "recipients": [{{ "address": "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu", "amount": 1000 }}],
                "accounts": [{{ "xpub": "{ZPUB}", "purpose": 84, "coin_type": 0, "account_index": 0 }}]
            }}"#
        );

        let request = WithdrawRequest::from_json(&json).unwrap();
        assert_eq!(request.recipients[0].amount_sat, 1000);
        assert_eq!(request.accounts[0].purpose, Purpose::Bip84);
        assert!(!request.options.require_all_recipients_paid);

        let again = WithdrawRequest::from_json(&request.to_json().unwrap()).unwrap();
        assert_eq!(again.accounts, request.accounts);
    }

    #[test]
    fn request_rejects_unknown_purpose() {
        let json = format!(
            r#"{{
                "psbt": "",
                "network": "bitcoin",
                "recipients": [],
                "accounts": [{{ "xpub": "{ZPUB}", "purpose": 44, "coin_type": 0, "account_index": 0 }}]
            }}"#
        );
        assert!(WithdrawRequest::from_json(&json).is_err());
    }

    #[test]
    fn request_rejects_other_network_key() {
        let json = format!(
            r#"{{
                "psbt": "",
                "network": "testnet",
                "recipients": [],
                "accounts": [{{ "xpub": "{ZPUB}", "purpose": 84, "coin_type": 1, "account_index": 0 }}]
            }}"#
        );
        assert!(WithdrawRequest::from_json(&json).is_err());
    }
}
