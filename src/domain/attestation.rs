//! Anchored identity attestations.
//!
//! Attestations are evidentiary records: nothing in the access path consults
//! them. Access is governed solely by delegations.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{hash256_hex, Address, Hash256};

/// The identity claim an attestation asserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttestationType {
    /// Proof of personhood.
    Human,
    /// Proof of being at least 18 years old.
    Age18,
}

impl AttestationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttestationType::Human => "human",
            AttestationType::Age18 => "age18",
        }
    }
}

impl fmt::Display for AttestationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttestationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "human" => Ok(AttestationType::Human),
            "age18" => Ok(AttestationType::Age18),
            other => Err(format!("unknown attestation type: {other}")),
        }
    }
}

/// A hash-anchored identity attestation. Immutable once anchored; considered
/// expired (not deleted) once `now > expires_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    pub attestation_id: u64,
    pub user_address: Address,
    pub attestation_type: AttestationType,
    /// Commitment to the proof, never the proof itself.
    #[serde(with = "hash256_hex")]
    pub proof_commitment: Hash256,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Issuer signature over the commitment, hex-encoded Ed25519.
    pub signature: String,
    /// Ledger transaction that anchored this record.
    pub transaction_id: String,
}

impl Attestation {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
