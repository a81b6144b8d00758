// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! RRSIG records, the signatures over one RRset

use crate::dnssec::Algorithm;
use crate::rr::{Name, RecordType};

/// RFC 4034, section 3: a signature covering exactly one RRset.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RRSIG {
    type_covered: RecordType,
    algorithm: Algorithm,
    num_labels: u8,
    original_ttl: u32,
    sig_expiration: u32,
    sig_inception: u32,
    key_tag: u16,
    signer_name: Name,
    sig: Vec<u8>,
}

impl RRSIG {
    /// Constructs a new RRSIG rdata
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        type_covered: RecordType,
        algorithm: Algorithm,
        num_labels: u8,
        original_ttl: u32,
        sig_expiration: u32,
        sig_inception: u32,
        key_tag: u16,
        signer_name: Name,
        sig: Vec<u8>,
    ) -> Self {
        Self {
            type_covered,
            algorithm,
            num_labels,
            original_ttl,
            sig_expiration,
            sig_inception,
            key_tag,
            signer_name,
            sig,
        }
    }

    /// The record type the signature covers
    pub fn type_covered(&self) -> RecordType {
        self.type_covered
    }

    /// The signing algorithm
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// The labels field: the label count of the name signed, which is lower
    /// than the owner's label count when the RRset was wildcard expanded.
    pub fn num_labels(&self) -> u8 {
        self.num_labels
    }

    /// The TTL of the RRset at signing time
    pub fn original_ttl(&self) -> u32 {
        self.original_ttl
    }

    /// Expiration as seconds since the epoch, serial number arithmetic
    pub fn sig_expiration(&self) -> u32 {
        self.sig_expiration
    }

    /// Inception as seconds since the epoch, serial number arithmetic
    pub fn sig_inception(&self) -> u32 {
        self.sig_inception
    }

    /// The key tag of the DNSKEY that made the signature
    pub fn key_tag(&self) -> u16 {
        self.key_tag
    }

    /// The apex of the zone that signed the RRset
    pub fn signer_name(&self) -> &Name {
        &self.signer_name
    }

    /// The signature bytes
    pub fn sig(&self) -> &[u8] {
        &self.sig
    }

    /// Emits the rdata prefix that is included in the signed data, i.e. all
    /// fields except the signature itself, RFC 4034, section 3.1.8.1.
    pub fn emit_tbs_prefix(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&u16::from(self.type_covered).to_be_bytes());
        buf.push(self.algorithm.into());
        buf.push(self.num_labels);
        buf.extend_from_slice(&self.original_ttl.to_be_bytes());
        buf.extend_from_slice(&self.sig_expiration.to_be_bytes());
        buf.extend_from_slice(&self.sig_inception.to_be_bytes());
        buf.extend_from_slice(&self.key_tag.to_be_bytes());
        self.signer_name.emit_canonical(buf);
    }

    /// Emits the canonical wire form of the rdata
    pub fn emit(&self, buf: &mut Vec<u8>) {
        self.emit_tbs_prefix(buf);
        buf.extend_from_slice(&self.sig);
    }
}
