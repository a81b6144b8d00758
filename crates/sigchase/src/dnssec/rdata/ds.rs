// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! DS record, the delegation signer pointing at a child zone's key

use crate::dnssec::{Algorithm, DigestType};
use crate::error::ProtoResult;
use crate::rr::Name;

use super::DNSKEY;

/// RFC 4034, section 5: a digest of a child zone's DNSKEY, published in the
/// parent zone to form the chain of trust across the delegation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DS {
    key_tag: u16,
    algorithm: Algorithm,
    digest_type: DigestType,
    digest: Vec<u8>,
}

impl DS {
    /// Constructs a new DS rdata
    pub fn new(key_tag: u16, algorithm: Algorithm, digest_type: DigestType, digest: Vec<u8>) -> Self {
        Self {
            key_tag,
            algorithm,
            digest_type,
            digest,
        }
    }

    /// Builds the DS form of `key` as published at `name`.
    pub fn from_key(name: &Name, key: &DNSKEY, digest_type: DigestType) -> ProtoResult<Self> {
        Ok(Self {
            key_tag: key.calculate_key_tag(),
            algorithm: key.algorithm(),
            digest_type,
            digest: key.to_digest(name, digest_type)?,
        })
    }

    /// The key tag of the referenced DNSKEY
    pub fn key_tag(&self) -> u16 {
        self.key_tag
    }

    /// The algorithm of the referenced DNSKEY
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// The digest algorithm used for the digest field
    pub fn digest_type(&self) -> DigestType {
        self.digest_type
    }

    /// The digest over the owner name and DNSKEY rdata
    pub fn digest(&self) -> &[u8] {
        &self.digest
    }

    /// Returns true if the `key` at `name` hashes to the digest carried by
    /// this record.
    pub fn covers(&self, name: &Name, key: &DNSKEY) -> ProtoResult<bool> {
        Ok(key.to_digest(name, self.digest_type)? == self.digest)
    }

    /// Emits the canonical wire form of the rdata
    pub fn emit(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.key_tag.to_be_bytes());
        buf.push(self.algorithm.into());
        buf.push(self.digest_type.into());
        buf.extend_from_slice(&self.digest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_key_covers() {
        let name = Name::from_ascii("example.com").unwrap();
        let key = DNSKEY::new(true, true, false, Algorithm::ED25519, vec![7u8; 32]);

        let ds = DS::from_key(&name, &key, DigestType::SHA256).unwrap();
        assert!(ds.covers(&name, &key).unwrap());

        let other = DNSKEY::new(true, true, false, Algorithm::ED25519, vec![8u8; 32]);
        assert!(!ds.covers(&name, &other).unwrap());

        // the digest binds the owner name too
        let elsewhere = Name::from_ascii("example.net").unwrap();
        assert!(!ds.covers(&elsewhere, &key).unwrap());
    }
}
