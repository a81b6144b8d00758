// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! A signed RRset: the records sharing an owner/type/class, their covering
//! RRSIGs, and the security status the validator has assigned so far.

use crate::dnssec::SecurityStatus;
use crate::rr::{DNSClass, Name, RData, Record, RecordType};

/// A set of records sharing (owner, type, class), carried together with the
/// RRSIG records covering it and a security status.
///
/// The status starts `Unchecked` and is only upgraded by the validator after
/// the cryptographic work has actually been done.
#[derive(Clone, Debug)]
pub struct Rrset {
    records: Vec<Record>,
    rrsigs: Vec<Record>,
    status: SecurityStatus,
}

impl Rrset {
    /// Starts an RRset from its first record
    pub fn new(record: Record) -> Self {
        let mut this = Self {
            records: Vec::new(),
            rrsigs: Vec::new(),
            status: SecurityStatus::Unchecked,
        };
        this.add(record);
        this
    }

    /// Adds a record to the set if it belongs to it. RRSIGs whose covered
    /// type matches are routed to the signature list; anything with a
    /// mismatched owner, type or class is dropped.
    pub fn add(&mut self, record: Record) {
        if let RData::RRSIG(rrsig) = record.data() {
            let fits = match self.records.first() {
                Some(first) => {
                    rrsig.type_covered() == first.record_type()
                        && record.name() == first.name()
                        && record.dns_class() == first.dns_class()
                }
                // a set seeded by its RRSIG; the data records follow
                None => true,
            };
            if fits {
                self.rrsigs.push(record);
            }
            return;
        }

        match self.records.first() {
            None => self.records.push(record),
            Some(first) => {
                if record.name() == first.name()
                    && record.record_type() == first.record_type()
                    && record.dns_class() == first.dns_class()
                {
                    self.records.push(record);
                }
            }
        }
    }

    /// The owner name of the set
    pub fn name(&self) -> &Name {
        self.records
            .first()
            .or_else(|| self.rrsigs.first())
            .map(Record::name)
            .expect("rrset can not be empty")
    }

    /// The record type of the set
    pub fn record_type(&self) -> RecordType {
        match self.records.first() {
            Some(r) => r.record_type(),
            None => self
                .rrsigs
                .first()
                .and_then(|s| s.data().as_rrsig())
                .map(|s| s.type_covered())
                .expect("rrset can not be empty"),
        }
    }

    /// The class of the set
    pub fn dns_class(&self) -> DNSClass {
        self.records
            .first()
            .or_else(|| self.rrsigs.first())
            .map(Record::dns_class)
            .expect("rrset can not be empty")
    }

    /// The minimum TTL across the set's records
    pub fn ttl(&self) -> u32 {
        self.records
            .iter()
            .map(Record::ttl)
            .min()
            .unwrap_or_default()
    }

    /// The first (main) record
    pub fn first(&self) -> Option<&Record> {
        self.records.first()
    }

    /// All data records of the set
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// The RRSIG records covering the set
    pub fn rrsigs(&self) -> &[Record] {
        &self.rrsigs
    }

    /// True if at least one RRSIG covers the set
    pub fn is_signed(&self) -> bool {
        !self.rrsigs.is_empty()
    }

    /// The signer field shared by all RRSIGs of this set, `None` when the
    /// set is unsigned or the signers disagree.
    pub fn signer_name(&self) -> Option<&Name> {
        let mut signers = self
            .rrsigs
            .iter()
            .filter_map(|r| r.data().as_rrsig())
            .map(|rrsig| rrsig.signer_name());
        let first = signers.next()?;
        if signers.all(|s| s == first) {
            Some(first)
        } else {
            None
        }
    }

    /// The security status assigned so far
    pub fn security_status(&self) -> SecurityStatus {
        self.status
    }

    /// Assigns a security status
    pub fn set_security_status(&mut self, status: SecurityStatus) {
        self.status = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dnssec::rdata::RRSIG;
    use crate::dnssec::Algorithm;

    fn a_record(name: &str, addr: [u8; 4]) -> Record {
        Record::from_rdata(
            Name::from_ascii(name).unwrap(),
            300,
            RData::A(addr.into()),
        )
    }

    fn rrsig(name: &str, covered: RecordType, signer: &str) -> Record {
        Record::from_rdata(
            Name::from_ascii(name).unwrap(),
            300,
            RData::RRSIG(RRSIG::new(
                covered,
                Algorithm::ED25519,
                2,
                300,
                0,
                0,
                42,
                Name::from_ascii(signer).unwrap(),
                vec![0u8; 64],
            )),
        )
    }

    #[test]
    fn test_add_rejects_mismatched() {
        let mut set = Rrset::new(a_record("example.com", [192, 0, 2, 1]));
        set.add(a_record("example.com", [192, 0, 2, 2]));
        set.add(a_record("other.com", [192, 0, 2, 3]));
        assert_eq!(set.records().len(), 2);
    }

    #[test]
    fn test_signer_name() {
        let mut set = Rrset::new(a_record("www.example.com", [192, 0, 2, 1]));
        assert_eq!(set.signer_name(), None);

        set.add(rrsig("www.example.com", RecordType::A, "example.com"));
        assert_eq!(
            set.signer_name(),
            Some(&Name::from_ascii("example.com").unwrap())
        );

        // disagreeing signers leave the signer undefined
        set.add(rrsig("www.example.com", RecordType::A, "example.net"));
        assert_eq!(set.signer_name(), None);
    }

    #[test]
    fn test_rrsig_routed_to_signatures() {
        let mut set = Rrset::new(a_record("www.example.com", [192, 0, 2, 1]));
        set.add(rrsig("www.example.com", RecordType::A, "example.com"));
        // an RRSIG covering another type does not belong here
        set.add(rrsig("www.example.com", RecordType::AAAA, "example.com"));

        assert_eq!(set.records().len(), 1);
        assert_eq!(set.rrsigs().len(), 1);
        assert!(set.is_signed());
    }

    #[test]
    fn test_ttl_is_minimum() {
        let mut set = Rrset::new(a_record("example.com", [192, 0, 2, 1]));
        let mut shorter = a_record("example.com", [192, 0, 2, 2]);
        shorter.set_ttl(60);
        set.add(shorter);
        assert_eq!(set.ttl(), 60);
    }
}
