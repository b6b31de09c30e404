use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit, OsRng, rand_core::RngCore},
};
use anyhow::{Result, anyhow};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

use crate::keys::SealingKey;

/// Marks a sealed value. Anything without it is treated as legacy plaintext.
const PREFIX: &str = "enc:v1:";

/// Encrypt `plaintext` into `enc:v1:<base64 nonce>:<base64 ciphertext>`.
pub fn seal_secret(key: &SealingKey, plaintext: &str) -> Result<String> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.bytes()));

    let mut nonce_bytes = [0u8; 12];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|e| anyhow!("Encryption failed: {}", e))?;

    Ok(format!(
        "{PREFIX}{}:{}",
        BASE64.encode(nonce_bytes),
        BASE64.encode(ciphertext)
    ))
}

/// Reverse of `seal_secret`. Values stored before sealing existed come
/// back unchanged.
pub fn open_secret(key: &SealingKey, stored: &str) -> Result<String> {
    let Some(body) = stored.strip_prefix(PREFIX) else {
        return Ok(stored.to_string());
    };

    let (nonce_b64, ct_b64) = body
        .split_once(':')
        .ok_or_else(|| anyhow!("Malformed sealed value"))?;
    let nonce_bytes = BASE64.decode(nonce_b64)?;
    if nonce_bytes.len() != 12 {
        return Err(anyhow!("Invalid nonce length"));
    }
    let ciphertext = BASE64.decode(ct_b64)?;

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.bytes()));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
        .map_err(|e| anyhow!("Decryption failed: {}", e))?;

    Ok(String::from_utf8(plaintext)?)
}
