//! Connection descriptor codec.
//!
//! Turns the descriptor attached to a request into a [`ConnectionConfig`].
//! Encrypted descriptors use the OpenSSL passphrase format that CryptoJS
//! produces for `AES.encrypt(text, passphrase)`:
//! base64(`"Salted__"` ‖ salt\[8\] ‖ AES-256-CBC ciphertext), with key and IV
//! derived by `EVP_BytesToKey` over MD5.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use md5::{Digest, Md5};

use common::errors::{AppError, AppResult};
use common::models::ConnectionConfig;

type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;

const SALT_MAGIC: &[u8] = b"Salted__";
const SALT_LEN: usize = 8;
const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;

/// Single message for every decryption failure.
const DECRYPT_FAILED: &str = "unable to decrypt connection descriptor";

/// A descriptor as it arrived with the request.
#[derive(Clone)]
pub enum RawDescriptor {
    /// A connection string in the clear (server-side default).
    Plain(String),
    /// The value of the `X-Connection-Encrypted` header.
    Encrypted(String),
}

/// Decrypts and parses connection descriptors.
#[derive(Clone)]
pub struct DescriptorCodec {
    key: Option<String>,
}

impl DescriptorCodec {
    /// Creates a codec holding the process-wide passphrase, if any.
    pub fn new(key: Option<String>) -> Self {
        Self { key }
    }

    /// Decodes a raw descriptor into connection parameters.
    ///
    /// # Errors
    /// `AppError::Descriptor` when decryption fails (with one fixed message
    /// regardless of cause) or when the connection string is malformed.
    pub fn decode(&self, raw: &RawDescriptor) -> AppResult<ConnectionConfig> {
        match raw {
            RawDescriptor::Plain(text) => text.parse(),
            RawDescriptor::Encrypted(blob) => self.decrypt(blob)?.parse(),
        }
    }

    /// Decrypts an encrypted descriptor to its connection string.
    pub fn decrypt(&self, blob: &str) -> AppResult<String> {
        let key = self.key.as_deref().ok_or_else(decrypt_failed)?;
        decrypt_with_passphrase(blob, key).ok_or_else(decrypt_failed)
    }

    /// Encrypts a connection string with a fresh random salt.
    pub fn encrypt(&self, plaintext: &str) -> AppResult<String> {
        let key = self
            .key
            .as_deref()
            .ok_or_else(|| AppError::Descriptor("no encryption key configured".into()))?;
        Ok(encrypt_with_salt(plaintext, key, rand::random()))
    }
}

pub(crate) fn decrypt_failed() -> AppError {
    AppError::Descriptor(DECRYPT_FAILED.to_string())
}

fn decrypt_with_passphrase(blob: &str, passphrase: &str) -> Option<String> {
    let data = BASE64.decode(blob.trim()).ok()?;
    let rest = data.strip_prefix(SALT_MAGIC)?;
    if rest.len() <= SALT_LEN {
        return None;
    }
    let (salt, ciphertext) = rest.split_at(SALT_LEN);
    let (key, iv) = derive_key_iv(passphrase.as_bytes(), salt);

    let plaintext = Aes256CbcDec::new(&key.into(), &iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .ok()?;
    String::from_utf8(plaintext).ok()
}

fn encrypt_with_salt(plaintext: &str, passphrase: &str, salt: [u8; SALT_LEN]) -> String {
    let (key, iv) = derive_key_iv(passphrase.as_bytes(), &salt);
    let ciphertext = Aes256CbcEnc::new(&key.into(), &iv.into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

    let mut out = Vec::with_capacity(SALT_MAGIC.len() + SALT_LEN + ciphertext.len());
    out.extend_from_slice(SALT_MAGIC);
    out.extend_from_slice(&salt);
    out.extend_from_slice(&ciphertext);
    BASE64.encode(out)
}

/// `EVP_BytesToKey` with MD5 and a single iteration.
fn derive_key_iv(passphrase: &[u8], salt: &[u8]) -> ([u8; KEY_LEN], [u8; IV_LEN]) {
    let mut material = Vec::with_capacity(KEY_LEN + IV_LEN + 16);
    let mut block: Vec<u8> = Vec::new();
    while material.len() < KEY_LEN + IV_LEN {
        let mut hasher = Md5::new();
        hasher.update(&block);
        hasher.update(passphrase);
        hasher.update(salt);
        block = hasher.finalize().to_vec();
        material.extend_from_slice(&block);
    }

    let mut key = [0u8; KEY_LEN];
    let mut iv = [0u8; IV_LEN];
    key.copy_from_slice(&material[..KEY_LEN]);
    iv.copy_from_slice(&material[KEY_LEN..KEY_LEN + IV_LEN]);
    (key, iv)
}
