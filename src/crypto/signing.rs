//! Issuer signing for attestation commitments.
//!
//! The registry holds one Ed25519 issuer keypair and signs every commitment
//! it anchors. Signatures travel hex-encoded.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey, SIGNATURE_LENGTH};
use rand::rngs::OsRng;

use super::hash::{attestation_signing_preimage, Hash256};

/// Error type for signing operations
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("invalid signature format")]
    InvalidSignatureFormat,

    #[error("signature verification failed")]
    VerificationFailed,
}

/// Ed25519 issuer keypair used to sign attestation commitments.
#[derive(Clone)]
pub struct IssuerSigningKey {
    signing_key: SigningKey,
}

impl IssuerSigningKey {
    /// Generate a fresh keypair.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Restore a keypair from its 32-byte seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Hex-encoded public key, published so clients can verify attestations.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.signing_key.verifying_key().as_bytes())
    }

    /// Sign a commitment for `user_address`, returning the hex signature.
    pub fn sign_commitment(
        &self,
        commitment: &Hash256,
        user_address: &str,
        expires_at_unix: i64,
    ) -> String {
        let preimage = attestation_signing_preimage(commitment, user_address, expires_at_unix);
        hex::encode(self.signing_key.sign(&preimage).to_bytes())
    }
}

/// Verify a hex-encoded commitment signature against an issuer public key.
pub fn verify_commitment_signature(
    verifying_key: &VerifyingKey,
    commitment: &Hash256,
    user_address: &str,
    expires_at_unix: i64,
    signature_hex: &str,
) -> Result<(), SigningError> {
    let bytes = hex::decode(signature_hex).map_err(|_| SigningError::InvalidSignatureFormat)?;
    let bytes: [u8; SIGNATURE_LENGTH] = bytes
        .try_into()
        .map_err(|_| SigningError::InvalidSignatureFormat)?;
    let signature = Signature::from_bytes(&bytes);
    let preimage = attestation_signing_preimage(commitment, user_address, expires_at_unix);
    verifying_key
        .verify(&preimage, &signature)
        .map_err(|_| SigningError::VerificationFailed)
}
