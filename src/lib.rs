pub mod bip32;
pub mod config;
pub mod derive;
pub mod network;
pub mod psbt;
pub mod withdraw;
pub mod xpub;

pub use config::{AccountDescriptor, Purpose, Recipient, ValidationOptions, WithdrawRequest};
pub use network::NetworkParams;
pub use psbt::Error;
pub use withdraw::{
    audit_psbt_for_withdraw, validate_psbt_for_consolidation, validate_psbt_for_withdraw,
    validate_psbt_for_withdraw_with,
};
