//! Password encryption at rest.
//!
//! The key is the SHA-256 digest of the context host, so a password only
//! decrypts against the host it was saved for. Payloads are AES-256-GCM
//! sealed and stored as URL-safe base64 of `nonce || ciphertext || tag`.

use base64::{Engine as _, engine::general_purpose::URL_SAFE};
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};
use ring::digest::{SHA256, digest};
use ring::rand::{SecureRandom, SystemRandom};

use crate::error::{ConfigError, ConfigResult};
use crate::model::ClientConfiguration;

const fn crypto_error(reason: &'static str) -> ConfigError {
    ConfigError::Crypto { reason }
}

fn derive_key(key_base: &str) -> ConfigResult<LessSafeKey> {
    let hash = digest(&SHA256, key_base.as_bytes());
    let unbound = UnboundKey::new(&AES_256_GCM, hash.as_ref())
        .map_err(|_| crypto_error("invalid key material"))?;
    Ok(LessSafeKey::new(unbound))
}

/// Encrypt `plain` with a key derived from `key_base`.
///
/// # Errors
///
/// Returns an error when the random nonce cannot be generated or sealing
/// fails.
pub fn encrypt_string(plain: &str, key_base: &str) -> ConfigResult<String> {
    let key = derive_key(key_base)?;

    let mut nonce_bytes = [0_u8; NONCE_LEN];
    SystemRandom::new()
        .fill(&mut nonce_bytes)
        .map_err(|_| crypto_error("nonce generation failed"))?;

    let mut sealed = plain.as_bytes().to_vec();
    key.seal_in_place_append_tag(
        Nonce::assume_unique_for_key(nonce_bytes),
        Aad::empty(),
        &mut sealed,
    )
    .map_err(|_| crypto_error("seal failed"))?;

    let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&sealed);
    Ok(URL_SAFE.encode(out))
}

/// Decrypt a value produced by [`encrypt_string`] with the same `key_base`.
///
/// # Errors
///
/// Returns an error for malformed base64, truncated input, a wrong key or
/// tampered ciphertext.
pub fn decrypt_string(encrypted: &str, key_base: &str) -> ConfigResult<String> {
    let bytes = URL_SAFE
        .decode(encrypted.trim())
        .map_err(|_| crypto_error("invalid base64"))?;
    if bytes.len() < NONCE_LEN + AES_256_GCM.tag_len() {
        return Err(crypto_error("short cipher"));
    }

    let (nonce_bytes, sealed) = bytes.split_at(NONCE_LEN);
    let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
        .map_err(|_| crypto_error("invalid nonce"))?;
    let key = derive_key(key_base)?;
    let mut sealed = sealed.to_vec();
    let plain = key
        .open_in_place(nonce, Aad::empty(), &mut sealed)
        .map_err(|_| crypto_error("authentication failed"))?;

    String::from_utf8(plain.to_vec()).map_err(|_| crypto_error("invalid utf-8"))
}

/// Replace the context password with its encrypted form, keyed by host.
///
/// # Errors
///
/// Returns [`ConfigError::EmptyPassword`] when there is nothing to encrypt.
pub fn encrypt_password(cfg: &mut ClientConfiguration) -> ConfigResult<()> {
    if cfg.password.is_empty() {
        return Err(ConfigError::EmptyPassword);
    }
    cfg.password = encrypt_string(&cfg.password, &cfg.host)?;
    Ok(())
}

/// Replace an encrypted context password with the plain one.
///
/// # Errors
///
/// Returns an error when the stored value cannot be decrypted.
pub fn decrypt_password(cfg: &mut ClientConfiguration) -> ConfigResult<()> {
    if cfg.password.is_empty() {
        return Ok(());
    }
    cfg.password = decrypt_string(&cfg.password, &cfg.host)?;
    Ok(())
}
