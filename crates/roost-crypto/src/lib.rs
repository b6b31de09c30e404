/// Roost Crypto Library
///
/// Seals custodial wallet material (private keys, mnemonics) before it is
/// written to the users table, with AES-256-GCM under a server-held key.

pub mod keys;
pub mod seal;

pub use keys::SealingKey;
pub use seal::{open_secret, seal_secret};
