// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The set of keys trusted a priori, from which every chain is built

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use crate::dnssec::rdata::{DNSKEY, DS};
use crate::dnssec::{Algorithm, DigestType};
use crate::error::{ProtoError, ProtoResult};
use crate::rr::{DNSClass, Name, RData, Record, Rrset};

/// The store of trust anchors, indexed by zone apex.
///
/// Anchors are accepted as DS or DNSKEY RRsets; DNSKEY anchors are converted
/// to DS form at store time (digest computed locally), so the key-finding
/// walk always starts from a DS RRset and treats the anchor as if it had
/// been securely delegated.
///
/// The store is written during initialization and read-only afterwards;
/// share it behind an `Arc`.
#[derive(Clone, Default)]
pub struct TrustAnchorStore {
    anchors: HashMap<(Name, DNSClass), Rrset>,
}

impl TrustAnchorStore {
    /// Creates a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of anchored zones
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// True when no anchors are loaded
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Stores an anchor RRset. DNSKEY sets are converted to DS form;
    /// anything that is neither DS nor DNSKEY is silently dropped. Multiple
    /// stores for the same apex merge.
    pub fn store(&mut self, rrset: &Rrset) {
        let name = rrset.name().clone();
        let dns_class = rrset.dns_class();
        let ttl = rrset.ttl();

        let mut ds_records = Vec::new();
        for record in rrset.records() {
            match record.data() {
                RData::DS(ds) => ds_records.push(Record::from_rdata(
                    name.clone(),
                    ttl,
                    RData::DS(ds.clone()),
                )
                .with_dns_class(dns_class)),
                RData::DNSKEY(dnskey) => {
                    let Ok(ds) = DS::from_key(&name, dnskey, DigestType::SHA256) else {
                        continue;
                    };
                    ds_records.push(
                        Record::from_rdata(name.clone(), ttl, RData::DS(ds))
                            .with_dns_class(dns_class),
                    );
                }
                _ => {}
            }
        }

        if ds_records.is_empty() {
            return;
        }

        debug!("anchoring {name} with {} DS records", ds_records.len());
        match self.anchors.entry((name, dns_class)) {
            Entry::Occupied(mut occupied) => {
                for record in ds_records {
                    occupied.get_mut().add(record);
                }
            }
            Entry::Vacant(vacant) => {
                let mut iter = ds_records.into_iter();
                let mut set = Rrset::new(iter.next().expect("checked non-empty"));
                for record in iter {
                    set.add(record);
                }
                vacant.insert(set);
            }
        }
    }

    /// Finds the anchor with the longest apex that is equal to or an
    /// ancestor of `name`.
    pub fn find(&self, name: &Name, dns_class: DNSClass) -> Option<&Rrset> {
        let mut current = name.clone();
        loop {
            if let Some(rrset) = self.anchors.get(&(current.clone(), dns_class)) {
                return Some(rrset);
            }
            if current.is_root() {
                return None;
            }
            current = current.base_name();
        }
    }

    /// Loads anchors from a zone-file-style listing of DS and DNSKEY
    /// records.
    pub fn from_file(path: &Path) -> ProtoResult<Self> {
        Self::from_str(&fs::read_to_string(path)?)
    }
}

impl FromStr for TrustAnchorStore {
    type Err = ProtoError;

    /// Parses a zone-file-style stream of DS and DNSKEY records. Comments
    /// start with `;`; record types that can not serve as anchors are
    /// silently dropped; the result is independent of record order.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut store = Self::new();

        for line in input.lines() {
            let line = line.split(';').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }

            let Some(record) = parse_anchor_line(line)? else {
                continue;
            };

            store.store(&Rrset::new(record));
        }

        Ok(store)
    }
}

/// One `<name> [<ttl>] [IN] <DS|DNSKEY> <rdata...>` line, `None` for types
/// that can not anchor anything.
fn parse_anchor_line(line: &str) -> ProtoResult<Option<Record>> {
    let mut tokens = line.split_whitespace().peekable();

    let name = Name::from_ascii(tokens.next().ok_or("missing name in trust anchor")?)?;

    let mut ttl = 0u32;
    if let Some(t) = tokens.peek() {
        if let Ok(parsed) = t.parse::<u32>() {
            ttl = parsed;
            tokens.next();
        }
    }

    let mut dns_class = DNSClass::IN;
    if let Some(t) = tokens.peek() {
        if t.eq_ignore_ascii_case("IN") {
            tokens.next();
        } else if let Some(num) = t.strip_prefix("CLASS") {
            if let Ok(parsed) = num.parse::<u16>() {
                dns_class = DNSClass::from(parsed);
                tokens.next();
            }
        }
    }

    let rtype = tokens.next().ok_or("missing type in trust anchor")?;
    let rdata = match rtype.to_ascii_uppercase().as_str() {
        "DS" => {
            let key_tag: u16 = tokens
                .next()
                .ok_or("missing DS key tag")?
                .parse()
                .map_err(|_| ProtoError::from("invalid DS key tag"))?;
            let algorithm: u8 = tokens
                .next()
                .ok_or("missing DS algorithm")?
                .parse()
                .map_err(|_| ProtoError::from("invalid DS algorithm"))?;
            let digest_type: u8 = tokens
                .next()
                .ok_or("missing DS digest type")?
                .parse()
                .map_err(|_| ProtoError::from("invalid DS digest type"))?;
            let hex: String = tokens.collect();
            let digest = data_encoding::HEXLOWER_PERMISSIVE
                .decode(hex.as_bytes())
                .map_err(|_| ProtoError::from("invalid DS digest"))?;
            RData::DS(DS::new(
                key_tag,
                Algorithm::from(algorithm),
                DigestType::from(digest_type),
                digest,
            ))
        }
        "DNSKEY" => {
            let flags: u16 = tokens
                .next()
                .ok_or("missing DNSKEY flags")?
                .parse()
                .map_err(|_| ProtoError::from("invalid DNSKEY flags"))?;
            let _protocol: u8 = tokens
                .next()
                .ok_or("missing DNSKEY protocol")?
                .parse()
                .map_err(|_| ProtoError::from("invalid DNSKEY protocol"))?;
            let algorithm: u8 = tokens
                .next()
                .ok_or("missing DNSKEY algorithm")?
                .parse()
                .map_err(|_| ProtoError::from("invalid DNSKEY algorithm"))?;
            let b64: String = tokens.collect();
            let public_key = data_encoding::BASE64
                .decode(b64.as_bytes())
                .map_err(|_| ProtoError::from("invalid DNSKEY public key"))?;
            RData::DNSKEY(DNSKEY::new(
                flags & 0x0100 != 0,
                flags & 0x0001 != 0,
                flags & 0x0080 != 0,
                Algorithm::from(algorithm),
                public_key,
            ))
        }
        _ => return Ok(None),
    };

    Ok(Some(
        Record::from_rdata(name, ttl, rdata).with_dns_class(dns_class),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANCHORS: &str = "\
; the root KSK in DS form
.      86400  IN  DS  20326 8 2 E06D44B80B8F1D39A95C0B0D7C65D08458E880409BBC683457104237C7F8EC8D
; a DNSKEY anchor for a test zone
test.  3600   IN  DNSKEY  257 3 15 O25gIQ1zpuZrJyDrHsukZir95V9xfEVpsYF286zloAY=
; records that can not anchor anything are dropped
test.  3600   IN  NS  ns.test.
";

    #[test]
    fn test_parse_and_find() {
        let store = TrustAnchorStore::from_str(ANCHORS).unwrap();
        assert_eq!(store.len(), 2);

        let root = store
            .find(&Name::from_ascii("example.com").unwrap(), DNSClass::IN)
            .unwrap();
        assert!(root.name().is_root());

        // the DNSKEY anchor was converted to DS form
        let test = store
            .find(&Name::from_ascii("www.test").unwrap(), DNSClass::IN)
            .unwrap();
        assert_eq!(test.name(), &Name::from_ascii("test").unwrap());
        assert!(test
            .records()
            .iter()
            .all(|r| r.data().as_ds().is_some()));
    }

    #[test]
    fn test_longest_anchor_wins() {
        let store = TrustAnchorStore::from_str(ANCHORS).unwrap();
        let found = store
            .find(&Name::from_ascii("a.b.test").unwrap(), DNSClass::IN)
            .unwrap();
        assert_eq!(found.name(), &Name::from_ascii("test").unwrap());
    }

    #[test]
    fn test_order_insensitive() {
        let mut lines: Vec<&str> = ANCHORS.lines().collect();
        lines.reverse();
        let reversed = lines.join("\n");

        let a = TrustAnchorStore::from_str(ANCHORS).unwrap();
        let b = TrustAnchorStore::from_str(&reversed).unwrap();

        assert_eq!(a.len(), b.len());
        for name in ["example.com", "www.test"] {
            let name = Name::from_ascii(name).unwrap();
            let left = a.find(&name, DNSClass::IN).unwrap();
            let right = b.find(&name, DNSClass::IN).unwrap();
            assert_eq!(left.name(), right.name());
            assert_eq!(left.records().len(), right.records().len());
        }
    }
}
