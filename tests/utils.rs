#[allow(dead_code)]
pub mod tests_util {
    use bdk_wallet::bitcoin::absolute::LockTime;
    use bdk_wallet::bitcoin::base58;
    use bdk_wallet::bitcoin::bip32::{DerivationPath, Fingerprint, Xpriv, Xpub};
    use bdk_wallet::bitcoin::psbt::{self, Psbt};
    use bdk_wallet::bitcoin::secp256k1::{All, Secp256k1};
    use bdk_wallet::bitcoin::transaction::Version;
    use bdk_wallet::bitcoin::{
        Address, Amount, CompressedPublicKey, Network, ScriptBuf, Transaction, TxIn, TxOut,
    };
    use bdk_wallet::keys::bip39::Mnemonic;
    use ngwithdraw::config::{AccountDescriptor, Purpose};
    use std::collections::BTreeMap;
    use std::str::FromStr;

    /// Test mnemonic of BIP-0049, BIP-0084 and BIP-0086.
    pub const MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
    pub const OTHER_MNEMONIC: &str = "zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo wrong";

    pub const ZPUB_VERSION: [u8; 4] = [0x04, 0xb2, 0x47, 0x46];
    pub const YPUB_VERSION: [u8; 4] = [0x04, 0x9d, 0x7c, 0xb2];
    pub const VPUB_VERSION: [u8; 4] = [0x04, 0x5f, 0x1c, 0xf6];

    /// A hot key used to build fixtures with private derivation only.
    pub struct TestSigner {
        pub secp: Secp256k1<All>,
        pub master: Xpriv,
        pub network: Network,
    }

    impl TestSigner {
        pub fn from_mnemonic(words: &str, network: Network) -> Self {
            let mnemonic = Mnemonic::parse(words).unwrap();
            let seed = mnemonic.to_seed("");
            Self {
                secp: Secp256k1::new(),
                master: Xpriv::new_master(network, &seed).unwrap(),
                network,
            }
        }

        pub fn fingerprint(&self) -> Fingerprint {
            self.master.fingerprint(&self.secp)
        }

        pub fn coin_type(&self) -> u32 {
            if self.network == Network::Bitcoin { 0 } else { 1 }
        }

        pub fn account_xpub(&self, purpose: Purpose, account: u32) -> Xpub {
            let path = format!(
                "m/{}'/{}'/{}'",
                u32::from(purpose),
                self.coin_type(),
                account
            );
            let xpriv = self
                .master
                .derive_priv(&self.secp, &DerivationPath::from_str(&path).unwrap())
                .unwrap();
            Xpub::from_priv(&self.secp, &xpriv)
        }

        pub fn account(&self, purpose: Purpose, account: u32) -> AccountDescriptor {
            AccountDescriptor {
                xpub: self.account_xpub(purpose, account).to_string(),
                purpose,
                coin_type: self.coin_type(),
                account_index: account,
            }
        }

        pub fn key_at(&self, path: &DerivationPath) -> CompressedPublicKey {
            let xpriv = self.master.derive_priv(&self.secp, path).unwrap();
            Xpub::from_priv(&self.secp, &xpriv).to_pub()
        }

        pub fn address_at(&self, purpose: Purpose, path: &str) -> Address {
            let pk = self.key_at(&DerivationPath::from_str(path).unwrap());
            match purpose {
                Purpose::Bip49 => Address::p2shwpkh(&pk, self.network),
                Purpose::Bip84 => Address::p2wpkh(&pk, self.network),
                Purpose::Bip86 => {
                    Address::p2tr(&self.secp, pk.0.x_only_public_key().0, None, self.network)
                }
            }
        }

        /// An output paying to `path` with the derivation disclosed the way
        /// wallets fill PSBT outputs.
        pub fn change_output(
            &self,
            purpose: Purpose,
            path: &str,
            amount: u64,
        ) -> (TxOut, psbt::Output) {
            let path = DerivationPath::from_str(path).unwrap();
            let pk = self.key_at(&path);
            let address = match purpose {
                Purpose::Bip49 => Address::p2shwpkh(&pk, self.network),
                Purpose::Bip84 => Address::p2wpkh(&pk, self.network),
                Purpose::Bip86 => {
                    Address::p2tr(&self.secp, pk.0.x_only_public_key().0, None, self.network)
                }
            };

            let mut output = psbt::Output::default();
            let source = (self.fingerprint(), path);
            match purpose {
                Purpose::Bip49 => {
                    output.redeem_script = Some(ScriptBuf::new_p2wpkh(&pk.wpubkey_hash()));
                    output.bip32_derivation = BTreeMap::from([(pk.0, source)]);
                }
                Purpose::Bip84 => {
                    output.bip32_derivation = BTreeMap::from([(pk.0, source)]);
                }
                Purpose::Bip86 => {
                    let x_only = pk.0.x_only_public_key().0;
                    output.tap_internal_key = Some(x_only);
                    output.tap_key_origins = BTreeMap::from([(x_only, (vec![], source))]);
                }
            }

            let txout = TxOut {
                value: Amount::from_sat(amount),
                script_pubkey: address.script_pubkey(),
            };
            (txout, output)
        }
    }

    /// A plain payment output without any derivation.
    pub fn payment_output(address: &Address, amount: u64) -> (TxOut, psbt::Output) {
        let txout = TxOut {
            value: Amount::from_sat(amount),
            script_pubkey: address.script_pubkey(),
        };
        (txout, psbt::Output::default())
    }

    /// Hex encoded PSBT spending a dummy input to `outputs`.
    pub fn build_psbt(outputs: Vec<(TxOut, psbt::Output)>) -> String {
        let (txouts, psbt_outputs): (Vec<_>, Vec<_>) = outputs.into_iter().unzip();
        let tx = Transaction {
            version: Version::TWO,
            lock_time: LockTime::ZERO,
            input: vec![TxIn::default()],
            output: txouts,
        };

        let mut psbt = Psbt::from_unsigned_tx(tx).unwrap();
        psbt.outputs = psbt_outputs;
        psbt.serialize_hex()
    }

    /// Encode `xpub` with a SLIP-0132 version prefix.
    pub fn with_version(xpub: &Xpub, version: [u8; 4]) -> String {
        let mut data = xpub.encode();
        data[..4].copy_from_slice(&version);
        base58::encode_check(&data)
    }
}
