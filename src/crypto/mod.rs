//! Cryptographic utilities: commitment hashing and issuer signing.

mod hash;
mod signing;

pub use hash::{
    attestation_signing_preimage, compute_proof_commitment, u32_be, u64_be, Hash256,
    DOMAIN_ATTESTATION_SIG, DOMAIN_PROOF_COMMITMENT,
};
pub use signing::{verify_commitment_signature, IssuerSigningKey, SigningError};
