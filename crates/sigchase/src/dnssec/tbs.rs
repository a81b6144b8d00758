// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! signed data, the cryptographic input to RRSIG verification

use crate::dnssec::rdata::RRSIG;
use crate::error::{ProtoError, ProtoResult};
use crate::rr::{DNSClass, Name, Record};

/// Data to be signed or verified, assembled per RFC 4034, section 3.1.8.1:
/// the RRSIG rdata minus the signature, followed by the canonical RRset.
pub struct TBS(Vec<u8>);

impl AsRef<[u8]> for TBS {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Assembles the signed data for one RRset and one of its RRSIGs.
///
/// When the RRSIG labels field is smaller than the owner's label count the
/// RRset is a wildcard expansion, and the wildcard form of the owner is what
/// was signed.
pub fn rrset_tbs(
    name: &Name,
    dns_class: DNSClass,
    rrsig: &RRSIG,
    records: &[Record],
) -> ProtoResult<TBS> {
    if records.is_empty() {
        return Err(ProtoError::from("rrset is empty"));
    }

    let owner_labels = name.num_labels();
    let sig_labels = rrsig.num_labels();
    let fqdn = match sig_labels.cmp(&owner_labels) {
        std::cmp::Ordering::Equal => name.clone(),
        std::cmp::Ordering::Less => name
            .trim_to(usize::from(sig_labels))
            .prepend_label(b"*")?,
        std::cmp::Ordering::Greater => {
            return Err(ProtoError::from("rrsig labels exceed owner name labels"))
        }
    };

    let mut buf = Vec::with_capacity(512);
    rrsig.emit_tbs_prefix(&mut buf);

    // canonical RRset form: records ordered by their rdata wire encoding,
    // duplicates collapsed
    let mut rdatas: Vec<Vec<u8>> = records.iter().map(Record::rdata_canonical).collect();
    rdatas.sort();
    rdatas.dedup();

    let name_bytes = fqdn.to_canonical_bytes();
    for rdata in rdatas {
        buf.extend_from_slice(&name_bytes);
        buf.extend_from_slice(&u16::from(records[0].record_type()).to_be_bytes());
        buf.extend_from_slice(&u16::from(dns_class).to_be_bytes());
        buf.extend_from_slice(&rrsig.original_ttl().to_be_bytes());
        buf.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        buf.extend_from_slice(&rdata);
    }

    Ok(TBS(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dnssec::Algorithm;
    use crate::rr::{RData, RecordType};

    fn name(s: &str) -> Name {
        Name::from_ascii(s).unwrap()
    }

    fn rrsig(labels: u8) -> RRSIG {
        RRSIG::new(
            RecordType::A,
            Algorithm::ED25519,
            labels,
            300,
            10_000,
            0,
            42,
            name("example.com"),
            Vec::new(),
        )
    }

    #[test]
    fn test_records_are_canonically_ordered() {
        let records = vec![
            Record::from_rdata(name("www.example.com"), 300, RData::A([192, 0, 2, 9].into())),
            Record::from_rdata(name("www.example.com"), 300, RData::A([192, 0, 2, 1].into())),
        ];

        let sorted = rrset_tbs(&name("www.example.com"), DNSClass::IN, &rrsig(3), &records).unwrap();
        let reversed: Vec<Record> = records.iter().rev().cloned().collect();
        let other = rrset_tbs(&name("www.example.com"), DNSClass::IN, &rrsig(3), &reversed).unwrap();

        assert_eq!(sorted.as_ref(), other.as_ref());
    }

    #[test]
    fn test_wildcard_reconstruction() {
        let expanded = vec![Record::from_rdata(
            name("x.wc.example.com"),
            300,
            RData::A([192, 0, 2, 1].into()),
        )];
        let original = vec![Record::from_rdata(
            name("*.wc.example.com"),
            300,
            RData::A([192, 0, 2, 1].into()),
        )];

        // labels = 3 < the 4 labels of x.wc.example.com: the signed name is
        // the wildcard itself
        let tbs = rrset_tbs(&name("x.wc.example.com"), DNSClass::IN, &rrsig(3), &expanded).unwrap();
        let wildcard_tbs =
            rrset_tbs(&name("*.wc.example.com"), DNSClass::IN, &rrsig(3), &original).unwrap();
        assert_eq!(tbs.as_ref(), wildcard_tbs.as_ref());
    }

    #[test]
    fn test_labels_exceeding_owner_fail() {
        let records = vec![Record::from_rdata(
            name("example.com"),
            300,
            RData::A([192, 0, 2, 1].into()),
        )];
        assert!(rrset_tbs(&name("example.com"), DNSClass::IN, &rrsig(5), &records).is_err());
    }
}
