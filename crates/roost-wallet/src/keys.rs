use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use bip39::Mnemonic;
use blake2::{Blake2b, Digest, digest::consts::U32};
use ed25519_dalek::{SigningKey, VerifyingKey};
use ed25519_dalek_bip32::{ChildIndex, ExtendedSigningKey};
use rand::RngCore;
use rand::rngs::OsRng;

use crate::WalletError;

pub(crate) type Blake2b256 = Blake2b<U32>;

/// Signature scheme flag for ed25519 in addresses, keys and signatures.
pub(crate) const ED25519_FLAG: u8 = 0x00;

/// m/44'/784'/0'/0'/0'
const DERIVATION_PATH: [ChildIndex; 5] = [
    ChildIndex::Hardened(44),
    ChildIndex::Hardened(784),
    ChildIndex::Hardened(0),
    ChildIndex::Hardened(0),
    ChildIndex::Hardened(0),
];

/// A generated custodial wallet. `private_key` is base64 of flag || secret.
#[derive(Clone)]
pub struct WalletKeys {
    pub address: String,
    pub private_key: String,
    pub mnemonic: String,
}

impl std::fmt::Debug for WalletKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletKeys")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// New 12-word mnemonic and the ed25519 wallet derived from it.
pub fn generate_wallet() -> Result<WalletKeys, WalletError> {
    let mut entropy = [0u8; 16];
    OsRng.fill_bytes(&mut entropy);
    let mnemonic =
        Mnemonic::from_entropy(&entropy).map_err(|e| WalletError::KeyGen(e.to_string()))?;
    wallet_from_mnemonic(&mnemonic.to_string())
}

pub fn wallet_from_mnemonic(phrase: &str) -> Result<WalletKeys, WalletError> {
    let mnemonic =
        Mnemonic::parse_normalized(phrase).map_err(|e| WalletError::KeyGen(e.to_string()))?;
    let seed = mnemonic.to_seed_normalized("");

    let signing = derive_signing_key(&seed, &DERIVATION_PATH)?;

    Ok(WalletKeys {
        address: address_of(&signing.verifying_key()),
        private_key: encode_private_key(&signing),
        mnemonic: mnemonic.to_string(),
    })
}

/// SLIP-0010 ed25519 derivation. ed25519 only has hardened children.
pub(crate) fn derive_extended(
    seed: &[u8],
    path: &[ChildIndex],
) -> Result<ExtendedSigningKey, WalletError> {
    ExtendedSigningKey::from_seed(seed)
        .and_then(|master| master.derive(&path))
        .map_err(|e| WalletError::KeyGen(format!("{:?}", e)))
}

fn derive_signing_key(seed: &[u8], path: &[ChildIndex]) -> Result<SigningKey, WalletError> {
    Ok(derive_extended(seed, path)?.signing_key)
}

/// `0x` + hex(blake2b-256(flag || public key)).
pub fn address_of(public: &VerifyingKey) -> String {
    let mut hasher = Blake2b256::new();
    hasher.update([ED25519_FLAG]);
    hasher.update(public.as_bytes());
    format!("0x{}", hex::encode(hasher.finalize()))
}

pub fn encode_private_key(signing: &SigningKey) -> String {
    let mut bytes = Vec::with_capacity(33);
    bytes.push(ED25519_FLAG);
    bytes.extend_from_slice(signing.as_bytes());
    BASE64.encode(bytes)
}

pub fn decode_private_key(encoded: &str) -> Result<SigningKey, WalletError> {
    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|_| WalletError::InvalidKey)?;
    match bytes.split_first() {
        Some((&ED25519_FLAG, secret)) if secret.len() == 32 => {
            let secret: [u8; 32] = secret.try_into().map_err(|_| WalletError::InvalidKey)?;
            Ok(SigningKey::from_bytes(&secret))
        }
        _ => Err(WalletError::InvalidKey),
    }
}
