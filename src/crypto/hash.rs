//! Proof-commitment hashing with domain separation.
//!
//! Commitments are SHA-256 over a canonical, length-prefixed serialization of
//! `(proof, public_signals)`, so the same inputs always produce the same
//! commitment regardless of caller. The proof itself is never stored or
//! anchored, only this hash.

use sha2::{Digest, Sha256};

pub use crate::domain::Hash256;

/// Domain prefix for proof commitments.
pub const DOMAIN_PROOF_COMMITMENT: &[u8] = b"DELEGO_PROOF_COMMITMENT_V1";

/// Domain prefix for the attestation signing preimage.
pub const DOMAIN_ATTESTATION_SIG: &[u8] = b"DELEGO_ATTESTATION_SIG_V1";

/// Encode a u32 as 4 bytes big-endian
#[inline]
pub fn u32_be(n: u32) -> [u8; 4] {
    n.to_be_bytes()
}

/// Encode a u64 as 8 bytes big-endian
#[inline]
pub fn u64_be(n: u64) -> [u8; 8] {
    n.to_be_bytes()
}

fn update_length_prefixed(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update(u64_be(bytes.len() as u64));
    hasher.update(bytes);
}

/// Compute the commitment hash for a proof and its public signals.
///
/// Layout: `DOMAIN || lp(proof) || u32(count) || lp(signal)*`, where `lp` is
/// a u64 big-endian length prefix followed by the UTF-8 bytes. The length
/// prefixes make the encoding injective.
pub fn compute_proof_commitment(proof: &str, public_signals: &[String]) -> Hash256 {
    let mut hasher = Sha256::new();
    hasher.update(DOMAIN_PROOF_COMMITMENT);
    update_length_prefixed(&mut hasher, proof.as_bytes());
    hasher.update(u32_be(public_signals.len() as u32));
    for signal in public_signals {
        update_length_prefixed(&mut hasher, signal.as_bytes());
    }
    hasher.finalize().into()
}

/// Preimage the issuer signs when attesting to a commitment.
pub fn attestation_signing_preimage(
    commitment: &Hash256,
    user_address: &str,
    expires_at_unix: i64,
) -> Vec<u8> {
    let mut preimage =
        Vec::with_capacity(DOMAIN_ATTESTATION_SIG.len() + 32 + 8 + user_address.len() + 8);
    preimage.extend_from_slice(DOMAIN_ATTESTATION_SIG);
    preimage.extend_from_slice(commitment);
    preimage.extend_from_slice(&u64_be(user_address.len() as u64));
    preimage.extend_from_slice(user_address.as_bytes());
    preimage.extend_from_slice(&expires_at_unix.to_be_bytes());
    preimage
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commitment_is_deterministic() {
        let signals = vec!["a".to_string(), "b".to_string()];
        let first = compute_proof_commitment("proof", &signals);
        let second = compute_proof_commitment("proof", &signals);
        assert_eq!(first, second);
    }

    #[test]
    fn commitment_distinguishes_signal_boundaries() {
        // "ab" + "c" must not collide with "a" + "bc".
        let left = compute_proof_commitment("p", &["ab".to_string(), "c".to_string()]);
        let right = compute_proof_commitment("p", &["a".to_string(), "bc".to_string()]);
        assert_ne!(left, right);
    }

    #[test]
    fn commitment_depends_on_proof_and_signals() {
        let base = compute_proof_commitment("p", &["s".to_string()]);
        assert_ne!(base, compute_proof_commitment("q", &["s".to_string()]));
        assert_ne!(base, compute_proof_commitment("p", &["t".to_string()]));
        assert_ne!(base, compute_proof_commitment("p", &[]));
    }
}
