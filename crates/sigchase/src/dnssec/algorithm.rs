// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! DNSSEC signing and hashing algorithms

use std::fmt;

use ring::digest;

use crate::error::ProtoResult;
use crate::rr::Name;

/// DNSSEC signing algorithms, as assigned by IANA.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[allow(missing_docs)]
pub enum Algorithm {
    /// RSA/SHA-1, deprecated and treated as unsupported
    RSASHA1,
    /// RSA/SHA-1 for use with NSEC3, deprecated and treated as unsupported
    RSASHA1NSEC3SHA1,
    /// RSA/SHA-256
    RSASHA256,
    /// RSA/SHA-512
    RSASHA512,
    /// ECDSA Curve P-256 with SHA-256
    ECDSAP256SHA256,
    /// ECDSA Curve P-384 with SHA-384
    ECDSAP384SHA384,
    /// Ed25519
    ED25519,
    /// Unassigned or unsupported algorithm number
    Unknown(u8),
}

impl Algorithm {
    /// Whether this crate can cryptographically verify signatures made with
    /// the algorithm. Unsupported algorithms are never a hard failure, they
    /// are treated as failed matches by the verifier.
    pub fn is_supported(self) -> bool {
        matches!(
            self,
            Self::RSASHA256
                | Self::RSASHA512
                | Self::ECDSAP256SHA256
                | Self::ECDSAP384SHA384
                | Self::ED25519
        )
    }
}

impl From<u8> for Algorithm {
    fn from(value: u8) -> Self {
        match value {
            5 => Self::RSASHA1,
            7 => Self::RSASHA1NSEC3SHA1,
            8 => Self::RSASHA256,
            10 => Self::RSASHA512,
            13 => Self::ECDSAP256SHA256,
            14 => Self::ECDSAP384SHA384,
            15 => Self::ED25519,
            _ => Self::Unknown(value),
        }
    }
}

impl From<Algorithm> for u8 {
    fn from(a: Algorithm) -> Self {
        match a {
            Algorithm::RSASHA1 => 5,
            Algorithm::RSASHA1NSEC3SHA1 => 7,
            Algorithm::RSASHA256 => 8,
            Algorithm::RSASHA512 => 10,
            Algorithm::ECDSAP256SHA256 => 13,
            Algorithm::ECDSAP384SHA384 => 14,
            Algorithm::ED25519 => 15,
            Algorithm::Unknown(v) => v,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(v) => write!(f, "ALG{v}"),
            _ => write!(f, "{self:?}"),
        }
    }
}

/// NSEC3 hashing algorithms. Only SHA-1 is assigned.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Nsec3HashAlgorithm {
    /// SHA-1, the only assigned NSEC3 hash algorithm
    SHA1,
    /// Unassigned algorithm number; records using it are ignorable
    Unknown(u8),
}

impl Nsec3HashAlgorithm {
    /// Whether proofs can be computed with this hash algorithm
    pub fn is_supported(self) -> bool {
        matches!(self, Self::SHA1)
    }

    /// Computes the iterated, salted hash of `name` per RFC 5155, section 5:
    /// `H(x) = H(x || salt)` applied `iterations + 1` times over the
    /// canonical wire form of the name.
    pub fn hash(self, salt: &[u8], name: &Name, iterations: u16) -> ProtoResult<Vec<u8>> {
        match self {
            Self::SHA1 => {
                let mut buf = name.to_canonical_bytes();
                buf.extend_from_slice(salt);
                let mut hash = digest::digest(&digest::SHA1_FOR_LEGACY_USE_ONLY, &buf);

                for _ in 0..iterations {
                    let mut buf = hash.as_ref().to_vec();
                    buf.extend_from_slice(salt);
                    hash = digest::digest(&digest::SHA1_FOR_LEGACY_USE_ONLY, &buf);
                }

                Ok(hash.as_ref().to_vec())
            }
            Self::Unknown(v) => Err(format!("unsupported NSEC3 hash algorithm: {v}").into()),
        }
    }
}

impl From<u8> for Nsec3HashAlgorithm {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::SHA1,
            _ => Self::Unknown(value),
        }
    }
}

impl From<Nsec3HashAlgorithm> for u8 {
    fn from(a: Nsec3HashAlgorithm) -> Self {
        match a {
            Nsec3HashAlgorithm::SHA1 => 1,
            Nsec3HashAlgorithm::Unknown(v) => v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc5155_appendix_a_hash() {
        // H(example) with salt aabbccdd and 12 additional iterations, from
        // the RFC 5155 appendix A example zone
        let name = Name::from_ascii("example").unwrap();
        let salt = [0xaa, 0xbb, 0xcc, 0xdd];
        let hash = Nsec3HashAlgorithm::SHA1.hash(&salt, &name, 12).unwrap();

        let base32 = data_encoding::BASE32_DNSSEC.encode(&hash);
        assert_eq!(base32, "0p9mhaveqvm6t7vbl5lop2u3t2rp3tom");
    }

    #[test]
    fn test_unknown_hash_alg_errors() {
        let name = Name::from_ascii("example").unwrap();
        assert!(Nsec3HashAlgorithm::Unknown(6)
            .hash(&[], &name, 0)
            .is_err());
    }
}
