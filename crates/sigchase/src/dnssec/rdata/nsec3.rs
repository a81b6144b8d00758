// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! NSEC3 records, the hashed denial of existence chain

use crate::dnssec::Nsec3HashAlgorithm;
use crate::rr::RecordType;

use super::emit_type_bit_maps;

/// RFC 5155, section 3: like NSEC, but over hashed owner names, with the
/// opt-out flag allowing unsigned delegations inside a span.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NSEC3 {
    hash_algorithm: Nsec3HashAlgorithm,
    opt_out: bool,
    iterations: u16,
    salt: Vec<u8>,
    next_hashed_owner_name: Vec<u8>,
    type_bit_maps: Vec<RecordType>,
}

impl NSEC3 {
    /// Constructs a new NSEC3 rdata
    pub fn new(
        hash_algorithm: Nsec3HashAlgorithm,
        opt_out: bool,
        iterations: u16,
        salt: Vec<u8>,
        next_hashed_owner_name: Vec<u8>,
        type_bit_maps: Vec<RecordType>,
    ) -> Self {
        Self {
            hash_algorithm,
            opt_out,
            iterations,
            salt,
            next_hashed_owner_name,
            type_bit_maps,
        }
    }

    /// The hash algorithm for owner names in this chain
    pub fn hash_algorithm(&self) -> Nsec3HashAlgorithm {
        self.hash_algorithm
    }

    /// The opt-out flag: unsigned delegations may exist inside the span
    pub fn opt_out(&self) -> bool {
        self.opt_out
    }

    /// Number of additional hash iterations
    pub fn iterations(&self) -> u16 {
        self.iterations
    }

    /// The salt appended to the name before each hash round
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    /// The raw hash of the next owner name in hash order
    pub fn next_hashed_owner_name(&self) -> &[u8] {
        &self.next_hashed_owner_name
    }

    /// The types present at the original owner name
    pub fn type_bit_maps(&self) -> &[RecordType] {
        &self.type_bit_maps
    }

    /// The flags field reassembled into its wire value
    pub fn flags(&self) -> u8 {
        if self.opt_out {
            1
        } else {
            0
        }
    }

    /// Emits the canonical wire form of the rdata
    pub fn emit(&self, buf: &mut Vec<u8>) {
        buf.push(self.hash_algorithm.into());
        buf.push(self.flags());
        buf.extend_from_slice(&self.iterations.to_be_bytes());
        buf.push(self.salt.len() as u8);
        buf.extend_from_slice(&self.salt);
        buf.push(self.next_hashed_owner_name.len() as u8);
        buf.extend_from_slice(&self.next_hashed_owner_name);
        emit_type_bit_maps(&self.type_bit_maps, buf);
    }
}
