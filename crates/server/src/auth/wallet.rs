//! Wallet-signature identities (EIP-191 personal messages on secp256k1).
//!
//! The signed payload is `"\x19Ethereum Signed Message:\n" ‖ len ‖ message`
//! hashed with Keccak-256. The signer's address is the last 20 bytes of the
//! Keccak-256 hash of its uncompressed public key (without the `0x04` tag).
//!
//! Messages end with a nonce from [`NonceRegistry`]; each signature is
//! accepted once.

use std::sync::Arc;

use axum::http::HeaderMap;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use sha3::{Digest, Keccak256};
use word_core::{Identity, IdentityScheme};

use super::nonce::{NonceRegistry, nonce_of};
use super::{AuthError, IdentityClaim, IdentityResolver};

const SIGNATURE_LEN: usize = 65;

pub fn personal_message_hash(message: &str) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(format!("\x19Ethereum Signed Message:\n{}", message.len()).as_bytes());
    hasher.update(message.as_bytes());
    hasher.finalize().into()
}

/// Lower-case `0x` address of a public key.
pub fn address_of(key: &VerifyingKey) -> String {
    let point = key.to_encoded_point(false);
    let hash = Keccak256::digest(&point.as_bytes()[1..]);
    format!("0x{}", hex::encode(&hash[12..]))
}

/// Recover the signer's address from a personal-message signature.
pub fn recover_address(message: &str, signature: &str) -> Result<String, AuthError> {
    let bytes = hex::decode(signature.trim().trim_start_matches("0x"))
        .map_err(|e| AuthError::MalformedSignature(e.to_string()))?;
    if bytes.len() != SIGNATURE_LEN {
        return Err(AuthError::MalformedSignature(format!(
            "expected {SIGNATURE_LEN} bytes, got {}",
            bytes.len()
        )));
    }

    // Legacy wallets use 27/28, newer ones 0/1.
    let v = match bytes[64] {
        v @ (27 | 28) => v - 27,
        v @ (0 | 1) => v,
        other => {
            return Err(AuthError::MalformedSignature(format!(
                "invalid recovery byte {other}"
            )));
        }
    };

    let signature = Signature::from_slice(&bytes[..64])
        .map_err(|e| AuthError::MalformedSignature(e.to_string()))?;
    let recovery = RecoveryId::from_byte(v)
        .ok_or_else(|| AuthError::MalformedSignature(format!("invalid recovery id {v}")))?;
    let key = VerifyingKey::recover_from_prehash(
        &personal_message_hash(message),
        &signature,
        recovery,
    )
    .map_err(|e| AuthError::MalformedSignature(e.to_string()))?;

    Ok(address_of(&key))
}

pub fn signing_key_from_hex(private_key: &str) -> Result<SigningKey, AuthError> {
    let bytes = hex::decode(private_key.trim().trim_start_matches("0x"))
        .map_err(|e| AuthError::InvalidKey(e.to_string()))?;
    SigningKey::from_slice(&bytes).map_err(|e| AuthError::InvalidKey(e.to_string()))
}

/// Sign `message` as a personal message, returning `0x`-prefixed `r‖s‖v`
/// with `v` in 27/28 form.
pub fn sign_personal_message(key: &SigningKey, message: &str) -> Result<String, AuthError> {
    let (signature, recovery) = key
        .sign_prehash_recoverable(&personal_message_hash(message))
        .map_err(|e| AuthError::InvalidKey(e.to_string()))?;

    let mut bytes = signature.to_bytes().to_vec();
    bytes.push(recovery.to_byte() + 27);
    Ok(format!("0x{}", hex::encode(bytes)))
}

/// Identity from `address` + `signature` + `message` body fields.
#[derive(Debug, Clone)]
pub struct WalletSignatureResolver {
    nonces: Arc<NonceRegistry>,
}

impl WalletSignatureResolver {
    pub fn new(nonces: Arc<NonceRegistry>) -> Self {
        Self { nonces }
    }
}

impl IdentityResolver for WalletSignatureResolver {
    fn scheme(&self) -> IdentityScheme {
        IdentityScheme::WalletSignature
    }

    fn resolve(&self, _headers: &HeaderMap, claim: IdentityClaim<'_>) -> Result<Identity, AuthError> {
        let address = claim.address.ok_or(AuthError::Missing("address"))?;
        let signature = claim.signature.ok_or(AuthError::Missing("signature"))?;
        let message = claim.message.ok_or(AuthError::Missing("message"))?;

        let expected = Identity::new(address);
        let recovered = Identity::new(recover_address(message, signature)?);
        if recovered != expected {
            return Err(AuthError::WrongSigner {
                recovered: recovered.to_string(),
                expected: expected.to_string(),
            });
        }

        let nonce = nonce_of(message).ok_or(AuthError::StaleNonce)?;
        if !self.nonces.consume(nonce) {
            return Err(AuthError::StaleNonce);
        }
        Ok(recovered)
    }

    fn has_credentials(&self, _headers: &HeaderMap, claim: IdentityClaim<'_>) -> bool {
        claim.address.is_some() || claim.signature.is_some()
    }
}
