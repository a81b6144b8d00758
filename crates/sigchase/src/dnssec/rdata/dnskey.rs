// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! DNSKEY records, the public keys published at a zone apex

use crate::dnssec::{Algorithm, DigestType};
use crate::error::ProtoResult;
use crate::rr::Name;

/// RFC 4034, section 2: a public key usable for verifying RRSIGs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DNSKEY {
    zone_key: bool,
    secure_entry_point: bool,
    revoke: bool,
    algorithm: Algorithm,
    public_key: Vec<u8>,
}

impl DNSKEY {
    /// Constructs a new DNSKEY rdata
    pub fn new(
        zone_key: bool,
        secure_entry_point: bool,
        revoke: bool,
        algorithm: Algorithm,
        public_key: Vec<u8>,
    ) -> Self {
        Self {
            zone_key,
            secure_entry_point,
            revoke,
            algorithm,
            public_key,
        }
    }

    /// Bit 7 of the flags: the key may be used to sign zone data
    pub fn zone_key(&self) -> bool {
        self.zone_key
    }

    /// Bit 15 of the flags: the key is a secure entry point (KSK hint)
    pub fn secure_entry_point(&self) -> bool {
        self.secure_entry_point
    }

    /// RFC 5011 revocation bit
    pub fn revoke(&self) -> bool {
        self.revoke
    }

    /// The signing algorithm of the key
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Raw public key material in DNSKEY wire encoding
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// The flags field reassembled into its wire value
    pub fn flags(&self) -> u16 {
        let mut flags = 0;
        if self.zone_key {
            flags |= 0x0100;
        }
        if self.secure_entry_point {
            flags |= 0x0001;
        }
        if self.revoke {
            flags |= 0x0080;
        }
        flags
    }

    /// Emits the canonical wire form of the rdata
    pub fn emit(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.flags().to_be_bytes());
        buf.push(3); // protocol, always 3
        buf.push(self.algorithm.into());
        buf.extend_from_slice(&self.public_key);
    }

    /// The key tag per RFC 4034, appendix B: ones-complement-free checksum
    /// over the rdata wire form.
    pub fn calculate_key_tag(&self) -> u16 {
        let mut rdata = Vec::with_capacity(4 + self.public_key.len());
        self.emit(&mut rdata);

        let mut ac: u32 = 0;
        for (i, b) in rdata.iter().enumerate() {
            if i % 2 == 0 {
                ac += u32::from(*b) << 8;
            } else {
                ac += u32::from(*b);
            }
        }
        ac += ac >> 16;
        (ac & 0xffff) as u16
    }

    /// The digest of this key as it would appear in a DS record at the
    /// parent: `digest(owner | rdata)` over canonical wire forms.
    pub fn to_digest(&self, name: &Name, digest_type: DigestType) -> ProtoResult<Vec<u8>> {
        let mut buf = name.to_canonical_bytes();
        self.emit(&mut buf);
        digest_type.digest(&buf)
    }

    /// A rough estimate of the key strength in bits, used to pick the NSEC3
    /// iteration cap that applies to zones signed with this key.
    pub fn key_len_bits(&self) -> usize {
        match self.algorithm {
            Algorithm::RSASHA1
            | Algorithm::RSASHA1NSEC3SHA1
            | Algorithm::RSASHA256
            | Algorithm::RSASHA512 => {
                // exponent length is 1 octet, or 3 when the first is zero
                let key = &self.public_key;
                let Some(&first) = key.first() else { return 0 };
                let (exp_len, off) = if first == 0 {
                    if key.len() < 3 {
                        return 0;
                    }
                    (usize::from(u16::from_be_bytes([key[1], key[2]])), 3)
                } else {
                    (usize::from(first), 1)
                };
                key.len().saturating_sub(off + exp_len) * 8
            }
            Algorithm::ECDSAP256SHA256 => 256,
            Algorithm::ECDSAP384SHA384 => 384,
            Algorithm::ED25519 => 256,
            Algorithm::Unknown(_) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_round_trip() {
        let key = DNSKEY::new(true, true, false, Algorithm::ED25519, vec![0u8; 32]);
        assert_eq!(key.flags(), 0x0101);

        let key = DNSKEY::new(true, false, false, Algorithm::ED25519, vec![0u8; 32]);
        assert_eq!(key.flags(), 0x0100);
    }

    #[test]
    fn test_key_len_rsa() {
        // 1 octet exponent length, 3 octet exponent, 256 octet modulus
        let mut public_key = vec![3u8, 1, 0, 1];
        public_key.extend(vec![0xffu8; 256]);
        let key = DNSKEY::new(true, false, false, Algorithm::RSASHA256, public_key);
        assert_eq!(key.key_len_bits(), 2048);
    }

    #[test]
    fn test_key_tag_stability() {
        let key = DNSKEY::new(true, true, false, Algorithm::ED25519, vec![1u8; 32]);
        assert_eq!(key.calculate_key_tag(), key.calculate_key_tag());
    }
}
