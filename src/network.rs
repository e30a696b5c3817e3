use bdk_wallet::bitcoin::{Network, NetworkKind};
use thiserror::Error;

/// `xpub`, the canonical mainnet extended public key version.
const XPUB: [u8; 4] = [0x04, 0x88, 0xb2, 0x1e];
/// `ypub`, SLIP-0132 P2SH-P2WPKH hint.
const YPUB: [u8; 4] = [0x04, 0x9d, 0x7c, 0xb2];
/// `zpub`, SLIP-0132 P2WPKH hint.
const ZPUB: [u8; 4] = [0x04, 0xb2, 0x47, 0x46];
/// `Ypub`, SLIP-0132 multi-sig P2SH-P2WSH hint.
const YPUB_MULTISIG: [u8; 4] = [0x02, 0x95, 0xb4, 0x3f];
/// `Zpub`, SLIP-0132 multi-sig P2WSH hint.
const ZPUB_MULTISIG: [u8; 4] = [0x02, 0xaa, 0x7e, 0xd3];

/// `tpub`, the canonical test network extended public key version.
const TPUB: [u8; 4] = [0x04, 0x35, 0x87, 0xcf];
const UPUB: [u8; 4] = [0x04, 0x4a, 0x52, 0x62];
const VPUB: [u8; 4] = [0x04, 0x5f, 0x1c, 0xf6];
const UPUB_MULTISIG: [u8; 4] = [0x02, 0x42, 0x89, 0xef];
const VPUB_MULTISIG: [u8; 4] = [0x02, 0x57, 0x54, 0x83];

const MAIN_VERSIONS: &[[u8; 4]] = &[XPUB, YPUB, ZPUB, YPUB_MULTISIG, ZPUB_MULTISIG];
const TEST_VERSIONS: &[[u8; 4]] = &[TPUB, UPUB, VPUB, UPUB_MULTISIG, VPUB_MULTISIG];

/// Protocol parameters of a Bitcoin network needed to verify outputs.
///
/// These are plain values passed into every call so that several networks
/// can be validated side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkParams {
    /// The network used for address encoding.
    pub network: Network,
    /// Version bytes that extended public keys are normalized to.
    pub canonical_xpub_version: [u8; 4],
    /// Every public version prefix accepted for this network.
    pub xpub_versions: &'static [[u8; 4]],
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown network: {0}")]
pub struct UnknownNetwork(pub String);

impl NetworkParams {
    pub const fn mainnet() -> Self {
        Self {
            network: Network::Bitcoin,
            canonical_xpub_version: XPUB,
            xpub_versions: MAIN_VERSIONS,
        }
    }

    pub const fn testnet() -> Self {
        Self::test_kind(Network::Testnet)
    }

    pub const fn signet() -> Self {
        Self::test_kind(Network::Signet)
    }

    pub const fn regtest() -> Self {
        Self::test_kind(Network::Regtest)
    }

    const fn test_kind(network: Network) -> Self {
        Self {
            network,
            canonical_xpub_version: TPUB,
            xpub_versions: TEST_VERSIONS,
        }
    }

    /// Look up the parameters of a network by name.
    pub fn from_name(name: &str) -> Result<Self, UnknownNetwork> {
        match name.to_ascii_lowercase().as_str() {
            "bitcoin" | "mainnet" | "main" => Ok(Self::mainnet()),
            "testnet" | "test" => Ok(Self::testnet()),
            "testnet4" => Ok(Self::test_kind(Network::Testnet4)),
            "signet" => Ok(Self::signet()),
            "regtest" => Ok(Self::regtest()),
            _ => Err(UnknownNetwork(name.to_owned())),
        }
    }

    /// Returns true if `version` is a public extended key prefix of this network.
    pub fn is_known_version(&self, version: &[u8]) -> bool {
        self.xpub_versions.iter().any(|v| v.as_slice() == version)
    }
}

impl From<Network> for NetworkParams {
    fn from(network: Network) -> Self {
        match NetworkKind::from(network) {
            NetworkKind::Main => Self::mainnet(),
            NetworkKind::Test => Self::test_kind(network),
        }
    }
}
