use crate::config::AccountDescriptor;
use bdk_wallet::bitcoin::bip32::ChildNumber;
use thiserror::Error;

/// A parsed single-sig BIP-0044 like derivation path, i.e.
/// `m/purpose'/coin_type'/account'/change/address_index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NgAccountPath {
    /// The purpose number of the account (e.g. 84 for BIP-0084).
    pub purpose: u32,
    /// The coin type, indicates the network on Bitcoin.
    pub coin_type: u32,
    /// The account number.
    pub account: u32,
    /// If equal to one, indicates that this derivation path
    /// is for a change address.
    pub change: Option<u32>,
    /// The address index.
    pub address_index: Option<u32>,
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum ParsePathError {
    #[error("expected coin type in the derivation path")]
    ExpectedCoinType,
    #[error("expected account in the derivation path")]
    ExpectedAccount,
    #[error("expected a hardened child number in the derivation path")]
    ExpectedHardened,
    #[error("expected a normal child number in the derivation path")]
    ExpectedNormal,
    #[error("unexpected child number after the address index")]
    TrailingChildren,
}

impl NgAccountPath {
    /// Parse a BIP-0044 like derivation path.
    ///
    /// Returns `Ok(None)` if the purpose is not one of the single-sig
    /// purposes we know about.
    pub fn parse(path: impl AsRef<[ChildNumber]>) -> Result<Option<Self>, ParsePathError> {
        let mut iter = path.as_ref().iter().copied();

        let Ok(Some(purpose)) = Self::expect_hardened(&mut iter) else {
            return Ok(None);
        };

        if !matches!(purpose, 44 | 49 | 84 | 86) {
            return Ok(None);
        }

        let coin_type =
            Self::expect_hardened(&mut iter)?.ok_or(ParsePathError::ExpectedCoinType)?;
        let account = Self::expect_hardened(&mut iter)?.ok_or(ParsePathError::ExpectedAccount)?;

        // Change and address index are optional, but should still be valid.
        let change = Self::expect_normal(&mut iter)?;
        let address_index = if change.is_some() {
            Self::expect_normal(&mut iter)?
        } else {
            None
        };

        if iter.next().is_some() {
            return Err(ParsePathError::TrailingChildren);
        }

        Ok(Some(Self {
            purpose,
            coin_type,
            account,
            change,
            address_index,
        }))
    }

    fn expect_hardened(
        iter: &mut impl Iterator<Item = ChildNumber>,
    ) -> Result<Option<u32>, ParsePathError> {
        match iter.next() {
            Some(ChildNumber::Hardened { index }) => Ok(Some(index)),
            Some(_) => Err(ParsePathError::ExpectedHardened),
            None => Ok(None),
        }
    }

    fn expect_normal(
        iter: &mut impl Iterator<Item = ChildNumber>,
    ) -> Result<Option<u32>, ParsePathError> {
        match iter.next() {
            Some(ChildNumber::Normal { index }) => Ok(Some(index)),
            Some(_) => Err(ParsePathError::ExpectedNormal),
            None => Ok(None),
        }
    }

    /// Returns `true` if the derivation path is for a change address,
    /// `false` if not, `None` if the path stops at the account level.
    pub fn is_change(&self) -> Option<bool> {
        self.change.map(|change| change == 1)
    }

    /// Returns true if the account part of this path is the origin of
    /// `descriptor`.
    pub fn matches_account(&self, descriptor: &AccountDescriptor) -> bool {
        self.purpose == u32::from(descriptor.purpose)
            && self.coin_type == descriptor.coin_type
            && self.account == descriptor.account_index
    }
}
