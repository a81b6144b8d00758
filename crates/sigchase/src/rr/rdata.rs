// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Record data enumeration and the simple rdata structures

use std::net::{Ipv4Addr, Ipv6Addr};

use enum_as_inner::EnumAsInner;

use crate::dnssec::rdata::{DNSKEY, DS, NSEC, NSEC3, RRSIG};
use crate::rr::{Name, RecordType};

/// RFC 1035 start of authority rdata
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SOA {
    /// Primary name server for the zone
    pub mname: Name,
    /// Mailbox of the person responsible
    pub rname: Name,
    /// Version serial of the zone
    pub serial: u32,
    /// Secondary refresh interval
    pub refresh: u32,
    /// Secondary retry interval
    pub retry: u32,
    /// Secondary expiry interval
    pub expire: u32,
    /// Negative caching TTL
    pub minimum: u32,
}

/// RFC 1035 text rdata, one or more strings of up to 255 octets
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TXT {
    strings: Vec<Box<[u8]>>,
}

impl TXT {
    /// Builds a TXT rdata, chunking any string longer than 255 octets.
    pub fn new<S: AsRef<[u8]>>(strings: impl IntoIterator<Item = S>) -> Self {
        let mut chunked = Vec::new();
        for s in strings {
            let bytes = s.as_ref();
            if bytes.is_empty() {
                chunked.push(Box::from(&b""[..]));
                continue;
            }
            for chunk in bytes.chunks(255) {
                chunked.push(Box::from(chunk));
            }
        }
        Self { strings: chunked }
    }

    /// The character strings of the record
    pub fn txt_data(&self) -> &[Box<[u8]>] {
        &self.strings
    }
}

/// Record data for all the record types this crate works with.
///
/// Record types outside the validator's vocabulary are carried opaquely in
/// `NULL`, already in their canonical wire encoding.
#[derive(Clone, Debug, Eq, PartialEq, EnumAsInner)]
#[allow(clippy::upper_case_acronyms)]
pub enum RData {
    /// IPv4 address
    A(Ipv4Addr),
    /// IPv6 address
    AAAA(Ipv6Addr),
    /// Canonical name alias
    CNAME(Name),
    /// Delegation of a subtree
    DNAME(Name),
    /// Zone public key
    DNSKEY(DNSKEY),
    /// Delegation signer
    DS(DS),
    /// Mail exchange: preference and exchanger
    MX(u16, Name),
    /// Authoritative server for a delegation
    NS(Name),
    /// Denial of existence
    NSEC(NSEC),
    /// Hashed denial of existence
    NSEC3(NSEC3),
    /// Domain pointer
    PTR(Name),
    /// Signature over an RRset
    RRSIG(RRSIG),
    /// Start of authority
    SOA(SOA),
    /// Text data
    TXT(TXT),
    /// Opaque rdata carried in canonical wire form
    NULL(RecordType, Vec<u8>),
}

impl RData {
    /// The record type of this data
    pub fn record_type(&self) -> RecordType {
        match self {
            Self::A(..) => RecordType::A,
            Self::AAAA(..) => RecordType::AAAA,
            Self::CNAME(..) => RecordType::CNAME,
            Self::DNAME(..) => RecordType::DNAME,
            Self::DNSKEY(..) => RecordType::DNSKEY,
            Self::DS(..) => RecordType::DS,
            Self::MX(..) => RecordType::MX,
            Self::NS(..) => RecordType::NS,
            Self::NSEC(..) => RecordType::NSEC,
            Self::NSEC3(..) => RecordType::NSEC3,
            Self::PTR(..) => RecordType::PTR,
            Self::RRSIG(..) => RecordType::RRSIG,
            Self::SOA(..) => RecordType::SOA,
            Self::TXT(..) => RecordType::TXT,
            Self::NULL(rt, ..) => *rt,
        }
    }

    /// Emits the canonical wire form of the rdata, RFC 4034, section 6.2:
    /// embedded names of the RFC 3597 "well-known" types are lowercased and
    /// never compressed.
    pub fn emit_canonical(&self, buf: &mut Vec<u8>) {
        match self {
            Self::A(addr) => buf.extend_from_slice(&addr.octets()),
            Self::AAAA(addr) => buf.extend_from_slice(&addr.octets()),
            Self::CNAME(name) | Self::DNAME(name) | Self::NS(name) | Self::PTR(name) => {
                name.emit_canonical(buf)
            }
            Self::DNSKEY(dnskey) => dnskey.emit(buf),
            Self::DS(ds) => ds.emit(buf),
            Self::MX(preference, exchange) => {
                buf.extend_from_slice(&preference.to_be_bytes());
                exchange.emit_canonical(buf);
            }
            Self::NSEC(nsec) => nsec.emit(buf),
            Self::NSEC3(nsec3) => nsec3.emit(buf),
            Self::RRSIG(rrsig) => rrsig.emit(buf),
            Self::SOA(soa) => {
                soa.mname.emit_canonical(buf);
                soa.rname.emit_canonical(buf);
                buf.extend_from_slice(&soa.serial.to_be_bytes());
                buf.extend_from_slice(&soa.refresh.to_be_bytes());
                buf.extend_from_slice(&soa.retry.to_be_bytes());
                buf.extend_from_slice(&soa.expire.to_be_bytes());
                buf.extend_from_slice(&soa.minimum.to_be_bytes());
            }
            Self::TXT(txt) => {
                for s in txt.txt_data() {
                    buf.push(s.len() as u8);
                    buf.extend_from_slice(s);
                }
            }
            Self::NULL(_, data) => buf.extend_from_slice(data),
        }
    }
}
