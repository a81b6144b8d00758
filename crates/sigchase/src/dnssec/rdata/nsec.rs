// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! NSEC records, the unhashed denial of existence chain

use crate::rr::{Name, RecordType};

use super::emit_type_bit_maps;

/// RFC 4034, section 4: points at the next owner name in canonical zone
/// order and lists the types present at this owner.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NSEC {
    next_domain_name: Name,
    type_bit_maps: Vec<RecordType>,
}

impl NSEC {
    /// Constructs a new NSEC rdata
    pub fn new(next_domain_name: Name, type_bit_maps: Vec<RecordType>) -> Self {
        Self {
            next_domain_name,
            type_bit_maps,
        }
    }

    /// The next owner name in the zone's canonical ordering
    pub fn next_domain_name(&self) -> &Name {
        &self.next_domain_name
    }

    /// The types present at the NSEC's owner name
    pub fn type_bit_maps(&self) -> &[RecordType] {
        &self.type_bit_maps
    }

    /// Emits the canonical wire form of the rdata
    pub fn emit(&self, buf: &mut Vec<u8>) {
        self.next_domain_name.emit_canonical(buf);
        emit_type_bit_maps(&self.type_bit_maps, buf);
    }
}
