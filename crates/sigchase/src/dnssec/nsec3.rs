// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! NSEC3 denial of existence proofs, RFC 5155, section 8.
//!
//! Throughout this module several NSEC3 specific terms are used.
//!
//! "closest_encloser" - a name that is a longest parent / grandparent /
//!     great-grandparent, etc. of a `query_name`, that DOES exist.
//!
//! "next_closer" - a name that is one level deeper in the hierarchy from
//!     `closest_encloser`, that DOES NOT exist in the zone.
//!
//! "wildcard of closest encloser" - a name in a form of `*.closest_encloser`.
//!     If it exists then `query_name` would be serviced by the wildcard.
//!
//! "covering NSEC3 record" - NSEC3 record name has a hash (`hashed_owner_name`),
//!     and inside the record data there's `next_hashed_owner_name`.
//!     If the hash of `query_name` fits between the two hashes then the record
//!     "covers" `query_name`
//!
//! "matching NSEC3 record" - exists for *existing* names only.
//!     The `hashed_owner_name` would match one of the names *exactly*.
//!
//! In general:
//! * if a name exists we would expect to see its "matching" NSEC3 record,
//! * if the name doesn't exist we would expect to see a "covering" NSEC3 record.

use data_encoding::BASE32_DNSSEC;
use tracing::{debug, trace};

use crate::dnssec::key_cache::KeyCache;
use crate::dnssec::nsec::DsNodataProof;
use crate::dnssec::rdata::NSEC3;
use crate::dnssec::{ValidationError, ValidationErrorKind};
use crate::rr::{Name, RecordType, Rrset};

/// The per-key-size iteration caps of RFC 5155, section 10.3. A zone whose
/// chain exceeds the cap for its weakest key is treated as unable to prove
/// anything (insecure), never as bogus.
pub const DEFAULT_ITERATION_CAPS: [(u16, u16); 3] = [(1024, 150), (2048, 500), (4096, 2500)];

/// The NSEC3 proof engine, carrying the iteration policy.
#[derive(Clone, Debug)]
pub struct Nsec3Validator {
    /// (key bits, allowed iterations), ascending by key bits
    iteration_caps: Vec<(u16, u16)>,
}

impl Default for Nsec3Validator {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATION_CAPS.to_vec())
    }
}

/// One usable NSEC3 record: the decoded owner hash and the rdata.
struct Nsec3Record<'a> {
    owner_hash: Vec<u8>,
    data: &'a NSEC3,
}

impl Nsec3Validator {
    /// A validator with the given iteration caps, `(key bits, iterations)`.
    pub fn new(mut iteration_caps: Vec<(u16, u16)>) -> Self {
        iteration_caps.sort_unstable();
        Self { iteration_caps }
    }

    /// The iteration cap that applies to a zone signed with keys of
    /// `key_bits` strength.
    pub fn max_iterations(&self, key_bits: usize) -> u16 {
        for (bits, cap) in &self.iteration_caps {
            if usize::from(*bits) >= key_bits {
                return *cap;
            }
        }
        self.iteration_caps.last().map(|(_, cap)| *cap).unwrap_or(0)
    }

    /// Removes RRsets whose NSEC3 records use an unknown hash algorithm.
    pub fn strip_unknown_algorithms(&self, sets: &mut Vec<Rrset>) {
        sets.retain(|set| {
            set.records()
                .iter()
                .filter_map(|r| r.data().as_nsec3())
                .all(|n| n.hash_algorithm().is_supported())
        });
    }

    /// True iff every NSEC3 RRset is unusable: an unknown hash algorithm,
    /// or more iterations than the cap for the weakest key known for its
    /// signer.
    pub fn all_ignorable(&self, sets: &[Rrset], key_cache: &KeyCache) -> bool {
        if sets.is_empty() {
            return true;
        }

        sets.iter().all(|set| {
            set.records()
                .iter()
                .filter_map(|r| r.data().as_nsec3())
                .all(|nsec3| {
                    if !nsec3.hash_algorithm().is_supported() {
                        return true;
                    }
                    let cap = match set
                        .signer_name()
                        .and_then(|signer| key_cache.smallest_key_bits(signer, set.dns_class()))
                    {
                        Some(bits) => self.max_iterations(bits),
                        None => self
                            .iteration_caps
                            .last()
                            .map(|(_, cap)| *cap)
                            .unwrap_or(0),
                    };
                    nsec3.iterations() > cap
                })
        })
    }

    /// Proves that `qname` does not exist and no wildcard serves it: a
    /// matching closest encloser, a covered next closer and a covered
    /// wildcard of the closest encloser.
    pub fn prove_name_error(
        &self,
        sets: &[Rrset],
        qname: &Name,
        zone: &Name,
    ) -> Result<(), ValidationError> {
        let records = self.prepare(sets, zone, qname)?;

        // an NXDOMAIN while a record for qname exists
        if find_matching(&records, &self.hash(&records, qname)?).is_some() {
            return Err(ValidationError::bogus(ValidationErrorKind::Msg(format!(
                "NXDOMAIN response with NSEC3 record matching {qname}"
            ))));
        }

        let ce = self.closest_encloser_proof(&records, qname, zone)?;

        let wildcard = ce
            .closest_encloser
            .prepend_label(b"*")
            .map_err(|_| ValidationError::bogus(ValidationErrorKind::WildcardGeneration))?;
        if find_covering(&records, &self.hash(&records, &wildcard)?).is_none() {
            return Err(ValidationError::bogus(
                ValidationErrorKind::Nsec3WildcardNotCovered {
                    name: qname.clone(),
                },
            ));
        }

        if ce.next_closer_opt_out {
            // an opt-out span asserts nothing about the names inside it
            return Err(ValidationError::insecure(ValidationErrorKind::Nsec3OptOut {
                name: qname.clone(),
            }));
        }

        debug!("NSEC3 proved the name error for {qname}");
        Ok(())
    }

    /// Proves that `qname` exists but carries no `qtype` record, directly,
    /// via its closest encloser, or via the wildcard serving it.
    pub fn prove_nodata(
        &self,
        sets: &[Rrset],
        qname: &Name,
        qtype: RecordType,
        zone: &Name,
    ) -> Result<(), ValidationError> {
        let records = self.prepare(sets, zone, qname)?;

        if let Some(matching) = find_matching(&records, &self.hash(&records, qname)?) {
            let types = matching.data.type_bit_maps();
            if types.contains(&qtype) || types.contains(&RecordType::CNAME) {
                return Err(ValidationError::bogus(ValidationErrorKind::Msg(format!(
                    "NSEC3 type map at {qname} covers {qtype} or CNAME"
                ))));
            }
            // this also covers the empty non-terminal, whose bitmap is empty
            trace!("NSEC3 direct match proved NODATA for {qname}/{qtype}");
            return Ok(());
        }

        let ce = self.closest_encloser_proof(&records, qname, zone)?;

        if qtype == RecordType::DS && ce.next_closer_opt_out {
            // RFC 5155, section 8.6: DS NODATA via an opt-out span only
            // proves an insecure delegation
            return Err(ValidationError::insecure(ValidationErrorKind::Nsec3OptOut {
                name: qname.clone(),
            }));
        }

        // no direct match: only a wildcard expansion can make the name
        // exist, and then the wildcard must lack the type
        let wildcard = ce
            .closest_encloser
            .prepend_label(b"*")
            .map_err(|_| ValidationError::bogus(ValidationErrorKind::WildcardGeneration))?;
        match find_matching(&records, &self.hash(&records, &wildcard)?) {
            Some(matching) => {
                let types = matching.data.type_bit_maps();
                if types.contains(&qtype) || types.contains(&RecordType::CNAME) {
                    Err(ValidationError::bogus(ValidationErrorKind::Msg(format!(
                        "NSEC3 type map at {wildcard} covers {qtype} or CNAME"
                    ))))
                } else {
                    trace!("NSEC3 wildcard match proved NODATA for {qname}/{qtype}");
                    Ok(())
                }
            }
            None => Err(ValidationError::bogus(ValidationErrorKind::NodataProofMissing)),
        }
    }

    /// Proves that the wildcard expansion answering `qname` was legitimate:
    /// the next closer below the wildcard's parent must be covered.
    pub fn prove_wildcard(
        &self,
        sets: &[Rrset],
        qname: &Name,
        zone: &Name,
        wildcard: &Name,
    ) -> Result<(), ValidationError> {
        let records = self.prepare(sets, zone, qname)?;

        let closest_encloser = wildcard.base_name();
        if !closest_encloser.zone_of(qname) {
            return Err(ValidationError::bogus(ValidationErrorKind::Msg(format!(
                "wildcard {wildcard} can not serve {qname}"
            ))));
        }

        let next_closer = qname.trim_to(usize::from(closest_encloser.num_labels()) + 1);
        if find_covering(&records, &self.hash(&records, &next_closer)?).is_none() {
            return Err(ValidationError::bogus(
                ValidationErrorKind::Nsec3NextCloserNotCovered {
                    name: qname.clone(),
                },
            ));
        }

        debug!("NSEC3 proved the wildcard expansion of {wildcard} for {qname}");
        Ok(())
    }

    /// Analyzes a negative DS response: whether the delegation provably has
    /// no DS (secure space ends), is not a delegation at all (the walk
    /// continues), or the records contradict the response.
    pub fn prove_no_ds(
        &self,
        sets: &[Rrset],
        qname: &Name,
        zone: &Name,
    ) -> Result<DsNodataProof, ValidationError> {
        let records = self.prepare(sets, zone, qname)?;

        if let Some(matching) = find_matching(&records, &self.hash(&records, qname)?) {
            let types = matching.data.type_bit_maps();
            if types.contains(&RecordType::DS) {
                return Ok(DsNodataProof::Bogus);
            }
            if types.contains(&RecordType::SOA) && !qname.is_root() {
                // the child's apex record can not prove the parent side
                return Ok(DsNodataProof::Bogus);
            }
            if types.contains(&RecordType::NS) {
                return Ok(DsNodataProof::NoDs);
            }
            return Ok(DsNodataProof::NotDelegation);
        }

        let ce = self.closest_encloser_proof(&records, qname, zone)?;
        if ce.next_closer_opt_out {
            // opt-out: an unsigned delegation may exist in the span
            return Ok(DsNodataProof::NoDs);
        }

        // without opt-out the span proves the delegation does not exist at
        // all, contradicting the DS query being asked here
        Ok(DsNodataProof::Bogus)
    }

    /// Strips unusable records, binds them to the zone and checks the
    /// shared parameters, RFC 5155, section 8.2.
    fn prepare<'a>(
        &self,
        sets: &'a [Rrset],
        zone: &Name,
        qname: &Name,
    ) -> Result<Vec<Nsec3Record<'a>>, ValidationError> {
        let mut records = Vec::new();
        for set in sets {
            for record in set.records() {
                let Some(nsec3) = record.data().as_nsec3() else {
                    continue;
                };
                if !nsec3.hash_algorithm().is_supported() {
                    trace!("ignoring NSEC3 with unsupported hash algorithm");
                    continue;
                }

                // the owner must be `<base32 hash>.<zone>`
                let owner = record.name();
                if &owner.base_name() != zone {
                    continue;
                }
                let Some(label) = owner.iter().next() else {
                    continue;
                };
                let Ok(owner_hash) =
                    BASE32_DNSSEC.decode(&label.to_ascii_lowercase()) else {
                    continue;
                };

                records.push(Nsec3Record {
                    owner_hash,
                    data: nsec3,
                });
            }
        }

        if records.is_empty() {
            // everything was stripped: nothing can be proven, but the zone
            // is not provably broken either
            return Err(ValidationError::insecure(ValidationErrorKind::Nsec3Ignored));
        }

        let first = records[0].data;
        if records.iter().any(|r| {
            r.data.hash_algorithm() != first.hash_algorithm()
                || r.data.iterations() != first.iterations()
                || r.data.salt() != first.salt()
        }) {
            return Err(ValidationError::bogus(
                ValidationErrorKind::Nsec3ParameterMismatch,
            ));
        }

        trace!(
            "using {} NSEC3 records for proofs over {qname}",
            records.len()
        );
        Ok(records)
    }

    fn hash(&self, records: &[Nsec3Record<'_>], name: &Name) -> Result<Vec<u8>, ValidationError> {
        let params = records[0].data;
        params
            .hash_algorithm()
            .hash(params.salt(), name, params.iterations())
            .map_err(|e| ValidationError::bogus(ValidationErrorKind::Msg(e.to_string())))
    }

    /// Locates the closest encloser with a matching record and requires the
    /// next closer to be covered. The zone apex is assumed to exist, so its
    /// matching record may be omitted when the next closer is `qname`
    /// itself.
    fn closest_encloser_proof<'a>(
        &self,
        records: &[Nsec3Record<'a>],
        qname: &Name,
        zone: &Name,
    ) -> Result<CeProof, ValidationError> {
        if !zone.zone_of(qname) {
            return Err(ValidationError::bogus(ValidationErrorKind::Msg(format!(
                "{qname} is not within the signing zone {zone}"
            ))));
        }

        // candidates from qname up to the zone apex
        let mut candidates = Vec::new();
        let mut current = qname.clone();
        loop {
            candidates.push(current.clone());
            if &current == zone {
                break;
            }
            current = current.base_name();
        }

        let matched = candidates.iter().enumerate().skip(1).find_map(|(i, name)| {
            let hash = self.hash(records, name).ok()?;
            find_matching(records, &hash).map(|_| i)
        });

        let (closest_encloser, next_closer) = match matched {
            Some(i) => (candidates[i].clone(), candidates[i - 1].clone()),
            // the apex exists even without its matching record, but only
            // the direct child of the apex can rely on that
            None if &qname.base_name() == zone => (zone.clone(), qname.clone()),
            None => {
                return Err(ValidationError::bogus(
                    ValidationErrorKind::Nsec3ClosestEncloserMissing {
                        name: qname.clone(),
                    },
                ))
            }
        };

        let next_closer_hash = self.hash(records, &next_closer)?;
        let Some(covering) = find_covering(records, &next_closer_hash) else {
            return Err(ValidationError::bogus(
                ValidationErrorKind::Nsec3NextCloserNotCovered {
                    name: qname.clone(),
                },
            ));
        };

        Ok(CeProof {
            closest_encloser,
            next_closer_opt_out: covering.data.opt_out(),
        })
    }
}

struct CeProof {
    closest_encloser: Name,
    next_closer_opt_out: bool,
}

fn find_matching<'a, 'b>(
    records: &'a [Nsec3Record<'b>],
    hash: &[u8],
) -> Option<&'a Nsec3Record<'b>> {
    records.iter().find(|r| r.owner_hash == hash)
}

fn find_covering<'a, 'b>(
    records: &'a [Nsec3Record<'b>],
    hash: &[u8],
) -> Option<&'a Nsec3Record<'b>> {
    records.iter().find(|r| {
        let owner = r.owner_hash.as_slice();
        let next = r.data.next_hashed_owner_name();
        if owner < next {
            owner < hash && hash < next
        } else if owner == next {
            // a single-record chain covers everything but its owner
            hash != owner
        } else {
            // the span wraps around the end of the hash order
            hash > owner || hash < next
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dnssec::{Nsec3HashAlgorithm, SecurityStatus};
    use crate::rr::{RData, Record};
    use std::time::Duration;

    const ZONE: &str = "example.com";
    const SALT: [u8; 2] = [0xab, 0xcd];
    const ITERATIONS: u16 = 5;

    fn name(s: &str) -> Name {
        Name::from_ascii(s).unwrap()
    }

    fn hash_of(n: &str) -> Vec<u8> {
        Nsec3HashAlgorithm::SHA1
            .hash(&SALT, &name(n), ITERATIONS)
            .unwrap()
    }

    /// An NSEC3 RRset spanning `from` to `to` (hashes of existing names),
    /// with `types` present at `from`.
    fn span(from: &str, to: &str, opt_out: bool, types: &[RecordType]) -> Rrset {
        let from_hash = hash_of(from);
        let owner = name(&format!(
            "{}.{}",
            BASE32_DNSSEC.encode(&from_hash),
            ZONE
        ));
        Rrset::new(Record::from_rdata(
            owner,
            300,
            RData::NSEC3(NSEC3::new(
                Nsec3HashAlgorithm::SHA1,
                opt_out,
                ITERATIONS,
                SALT.to_vec(),
                hash_of(to),
                types.to_vec(),
            )),
        ))
    }

    /// A chain asserting that exactly `existing` exists in the zone.
    fn chain_of(existing: &[&str], opt_out: bool) -> Vec<Rrset> {
        let mut hashed: Vec<(&str, Vec<u8>)> =
            existing.iter().map(|n| (*n, hash_of(n))).collect();
        hashed.sort_by(|a, b| a.1.cmp(&b.1));

        let mut sets = Vec::new();
        for i in 0..hashed.len() {
            let (from, _) = &hashed[i];
            let (to, _) = &hashed[(i + 1) % hashed.len()];
            let types: &[RecordType] = if *from == ZONE {
                &[RecordType::SOA, RecordType::NS, RecordType::DNSKEY]
            } else {
                &[RecordType::A]
            };
            sets.push(span(from, to, opt_out, types));
        }
        sets
    }

    fn validator() -> Nsec3Validator {
        Nsec3Validator::default()
    }

    #[test]
    fn test_prove_name_error() {
        // the zone has its apex, an existing host, and the wildcard span
        // falls between the hashes of the chain
        let sets = chain_of(&[ZONE, "host.example.com", "zz.example.com"], false);

        let result = validator().prove_name_error(&sets, &name("missing.example.com"), &name(ZONE));
        assert!(result.is_ok(), "{result:?}");
    }

    #[test]
    fn test_name_error_with_matching_record_is_bogus() {
        let sets = chain_of(&[ZONE, "host.example.com", "zz.example.com"], false);

        let err = validator()
            .prove_name_error(&sets, &name("host.example.com"), &name(ZONE))
            .unwrap_err();
        assert!(err.status().is_bogus());
    }

    #[test]
    fn test_name_error_opt_out_is_insecure() {
        let sets = chain_of(&[ZONE, "host.example.com", "zz.example.com"], true);

        let err = validator()
            .prove_name_error(&sets, &name("missing.example.com"), &name(ZONE))
            .unwrap_err();
        assert_eq!(err.status(), SecurityStatus::Insecure);
        assert!(matches!(err.kind(), ValidationErrorKind::Nsec3OptOut { .. }));
    }

    #[test]
    fn test_prove_nodata_direct_match() {
        let sets = chain_of(&[ZONE, "host.example.com", "zz.example.com"], false);

        // host exists with only an A record
        let ok = validator().prove_nodata(
            &sets,
            &name("host.example.com"),
            RecordType::MX,
            &name(ZONE),
        );
        assert!(ok.is_ok(), "{ok:?}");

        let err = validator()
            .prove_nodata(&sets, &name("host.example.com"), RecordType::A, &name(ZONE))
            .unwrap_err();
        assert!(err.status().is_bogus());
    }

    #[test]
    fn test_prove_no_ds_on_delegation() {
        // the delegation child.example.com exists with NS but no DS
        let sets = vec![span(
            "child.example.com",
            ZONE,
            false,
            &[RecordType::NS],
        )];

        let proof = validator()
            .prove_no_ds(&sets, &name("child.example.com"), &name(ZONE))
            .unwrap();
        assert_eq!(proof, DsNodataProof::NoDs);
    }

    #[test]
    fn test_prove_no_ds_opt_out() {
        // the delegation is not in the chain at all; the covering span has
        // opt-out set
        let sets = chain_of(&[ZONE, "host.example.com", "zz.example.com"], true);

        let proof = validator()
            .prove_no_ds(&sets, &name("unsigned.example.com"), &name(ZONE))
            .unwrap();
        assert_eq!(proof, DsNodataProof::NoDs);
    }

    #[test]
    fn test_prove_no_ds_with_ds_bit_is_bogus() {
        let sets = vec![span(
            "child.example.com",
            ZONE,
            false,
            &[RecordType::NS, RecordType::DS],
        )];

        let proof = validator()
            .prove_no_ds(&sets, &name("child.example.com"), &name(ZONE))
            .unwrap();
        assert_eq!(proof, DsNodataProof::Bogus);
    }

    #[test]
    fn test_prove_wildcard() {
        let sets = chain_of(&[ZONE, "host.example.com", "zz.example.com"], false);

        // x.wc.example.com was answered from *.example.com: the next closer
        // of qname relative to example.com must be covered
        let result = validator().prove_wildcard(
            &sets,
            &name("x.example.com"),
            &name(ZONE),
            &name("*.example.com"),
        );
        assert!(result.is_ok(), "{result:?}");
    }

    #[test]
    fn test_unknown_algorithms_are_insecure() {
        let owner = name(&format!("{}.{}", BASE32_DNSSEC.encode(&hash_of(ZONE)), ZONE));
        let sets = vec![Rrset::new(Record::from_rdata(
            owner,
            300,
            RData::NSEC3(NSEC3::new(
                Nsec3HashAlgorithm::Unknown(6),
                false,
                ITERATIONS,
                SALT.to_vec(),
                hash_of("host.example.com"),
                vec![RecordType::A],
            )),
        ))];

        let err = validator()
            .prove_name_error(&sets, &name("missing.example.com"), &name(ZONE))
            .unwrap_err();
        assert_eq!(err.status(), SecurityStatus::Insecure);
    }

    #[test]
    fn test_strip_unknown_algorithms() {
        let mut sets = chain_of(&[ZONE, "host.example.com"], false);
        sets.push(span("zz.example.com", ZONE, false, &[RecordType::A]));
        let before = sets.len();

        validator().strip_unknown_algorithms(&mut sets);
        assert_eq!(sets.len(), before);
    }

    #[test]
    fn test_iteration_caps() {
        let v = validator();
        assert_eq!(v.max_iterations(1024), 150);
        assert_eq!(v.max_iterations(1536), 500);
        assert_eq!(v.max_iterations(2048), 500);
        assert_eq!(v.max_iterations(4096), 2500);
        assert_eq!(v.max_iterations(8192), 2500);
    }

    #[test]
    fn test_all_ignorable_against_cache() {
        let cache = KeyCache::new(16, Duration::from_secs(900));
        let v = validator();

        // with no key knowledge the most permissive cap applies
        let sets = chain_of(&[ZONE, "host.example.com"], false);
        assert!(!v.all_ignorable(&sets, &cache));

        // iterations beyond every cap are always ignorable
        let extreme = vec![Rrset::new(Record::from_rdata(
            name(&format!("{}.{}", BASE32_DNSSEC.encode(&hash_of(ZONE)), ZONE)),
            300,
            RData::NSEC3(NSEC3::new(
                Nsec3HashAlgorithm::SHA1,
                false,
                u16::MAX,
                SALT.to_vec(),
                hash_of("host.example.com"),
                vec![RecordType::A],
            )),
        ))];
        assert!(v.all_ignorable(&extreme, &cache));
    }
}
