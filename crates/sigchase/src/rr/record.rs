// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! resource record implementation

use crate::rr::{DNSClass, Name, RData, RecordType};

/// A single resource record: owner, class, TTL and data.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Record {
    name: Name,
    dns_class: DNSClass,
    ttl: u32,
    rdata: RData,
}

impl Record {
    /// Creates a record from its parts; the record type is implied by the
    /// data.
    pub fn from_rdata(name: Name, ttl: u32, rdata: RData) -> Self {
        Self {
            name,
            dns_class: DNSClass::IN,
            ttl,
            rdata,
        }
    }

    /// Sets the class, builder style
    pub fn with_dns_class(mut self, dns_class: DNSClass) -> Self {
        self.dns_class = dns_class;
        self
    }

    /// The owner name of the record
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// The class of the record
    pub fn dns_class(&self) -> DNSClass {
        self.dns_class
    }

    /// The record type, derived from the data
    pub fn record_type(&self) -> RecordType {
        self.rdata.record_type()
    }

    /// Time to live
    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    /// Replaces the TTL
    pub fn set_ttl(&mut self, ttl: u32) {
        self.ttl = ttl;
    }

    /// The record data
    pub fn data(&self) -> &RData {
        &self.rdata
    }

    /// The canonical wire form of the rdata
    pub fn rdata_canonical(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.rdata.emit_canonical(&mut buf);
        buf
    }
}
