use aes_gcm::{
    aead::{consts::U12, Aead, KeyInit, OsRng},
    aes::Aes192,
    Aes128Gcm, Aes256Gcm, AesGcm,
};
use aes_gcm::aead::rand_core::RngCore;
use crate::error::CsrfError;

/// The size of the AES-GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;

type Aes192Gcm = AesGcm<Aes192, U12>;

/// AES-GCM keyed with a 128, 192 or 256 bit secret.
///
/// The key schedule is computed once; the cipher is immutable afterwards and
/// safe to share between tasks.
#[derive(Clone)]
pub enum TokenCipher {
    Aes128(Aes128Gcm),
    Aes192(Aes192Gcm),
    Aes256(Aes256Gcm),
}

impl TokenCipher {
    /// Builds the cipher matching the secret length.
    ///
    /// # Arguments
    ///
    /// * `key` - 16, 24 or 32 raw key bytes.
    ///
    /// # Returns
    ///
    /// `CsrfError::InvalidKey` for any other length.
    pub fn new(key: &[u8]) -> Result<Self, CsrfError> {
        let cipher = match key.len() {
            16 => Aes128Gcm::new_from_slice(key).map(Self::Aes128),
            24 => Aes192Gcm::new_from_slice(key).map(Self::Aes192),
            32 => Aes256Gcm::new_from_slice(key).map(Self::Aes256),
            len => return Err(CsrfError::InvalidKey(len)),
        };
        cipher.map_err(|_| CsrfError::InvalidKey(key.len()))
    }

    /// Encrypts `plaintext` under a fresh random nonce.
    ///
    /// # Returns
    ///
    /// `nonce || ciphertext`, the ciphertext carrying the GCM tag.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CsrfError> {
        let nonce = generate_nonce()?;

        let ciphertext = match self {
            Self::Aes128(c) => encrypt(c, &nonce, plaintext),
            Self::Aes192(c) => encrypt(c, &nonce, plaintext),
            Self::Aes256(c) => encrypt(c, &nonce, plaintext),
        }
        .map_err(|e| CsrfError::CryptoFailure(format!("Encryption failed: {}", e)))?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Splits `nonce || ciphertext` and authenticates-then-decrypts it.
    ///
    /// Truncated input and tag mismatches both yield `MalformedToken`.
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, CsrfError> {
        if sealed.len() < NONCE_SIZE {
            return Err(CsrfError::MalformedToken);
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_SIZE);

        match self {
            Self::Aes128(c) => decrypt(c, nonce, ciphertext),
            Self::Aes192(c) => decrypt(c, nonce, ciphertext),
            Self::Aes256(c) => decrypt(c, nonce, ciphertext),
        }
        .map_err(|_| CsrfError::MalformedToken)
    }
}

/// Generates a new random AES-GCM nonce.
fn generate_nonce() -> Result<[u8; NONCE_SIZE], CsrfError> {
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|e| CsrfError::CryptoFailure(format!("Entropy source failed: {}", e)))?;
    Ok(nonce)
}

fn encrypt<C: Aead>(cipher: &C, nonce: &[u8], plaintext: &[u8]) -> aes_gcm::aead::Result<Vec<u8>> {
    cipher.encrypt(aes_gcm::aead::Nonce::<C>::from_slice(nonce), plaintext)
}

fn decrypt<C: Aead>(cipher: &C, nonce: &[u8], ciphertext: &[u8]) -> aes_gcm::aead::Result<Vec<u8>> {
    cipher.decrypt(aes_gcm::aead::Nonce::<C>::from_slice(nonce), ciphertext)
}
