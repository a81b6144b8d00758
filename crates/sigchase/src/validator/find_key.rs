// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The key-finding walk: from a trust anchor down to the zone that signed
//! a response, alternating DS and DNSKEY queries.
//!
//! The walk is a loop over an explicit [`Action`]: the caller issues one
//! subquery per iteration and feeds the response back into a transition
//! that involves no I/O of its own, so the whole chain logic is testable
//! against canned responses.

use tracing::{debug, trace};

use crate::dnssec::nsec::{self, DsNodataProof};
use crate::dnssec::verifier::{verify_new_dnskeys, verify_srrset};
use crate::dnssec::{KeyEntry, Nsec3Validator, SecurityStatus, ValidationErrorKind};
use crate::op::Message;
use crate::rr::{DNSClass, Name, RecordType, Rrset};
use crate::validator::classify::{classify_response, ResponseClassification};

/// The next step of a walk.
#[derive(Debug)]
pub(crate) enum Action {
    /// Ask the upstream for the DS RRset of this name
    QueryDs(Name),
    /// Ask the upstream for the DNSKEY RRset of this zone
    QueryDnskey(Name),
    /// The walk is over
    Done(Box<KeyEntry>),
}

/// The state of one walk. Lives for a single `find_key` call and is never
/// shared.
pub(crate) struct KeyWalk {
    target: Name,
    dns_class: DNSClass,
    /// the validated DS RRset whose DNSKEY is still outstanding
    ds: Option<Rrset>,
    /// the deepest validated key set so far
    key: Option<KeyEntry>,
    /// the deepest name proven not to be a delegation point
    empty_ds: Option<Name>,
    finished: Option<KeyEntry>,
    bad_key_ttl: u32,
}

impl KeyWalk {
    /// Starts a walk at a trust anchor, held in DS form.
    pub(crate) fn from_anchor(
        anchor: Rrset,
        target: Name,
        dns_class: DNSClass,
        bad_key_ttl: u32,
    ) -> Self {
        Self {
            target,
            dns_class,
            ds: Some(anchor),
            key: None,
            empty_ds: None,
            finished: None,
            bad_key_ttl,
        }
    }

    /// Resumes a walk from a cached good entry at an ancestor of the
    /// target.
    pub(crate) fn from_cached(
        entry: KeyEntry,
        target: Name,
        dns_class: DNSClass,
        bad_key_ttl: u32,
    ) -> Self {
        Self {
            target,
            dns_class,
            ds: None,
            key: Some(entry),
            empty_ds: None,
            finished: None,
            bad_key_ttl,
        }
    }

    /// The next step: query a DS, query a DNSKEY, or stop.
    pub(crate) fn next_action(&self) -> Action {
        if let Some(entry) = &self.finished {
            return Action::Done(Box::new(entry.clone()));
        }

        // an outstanding DS means its zone's keys come next
        if let Some(ds) = &self.ds {
            return Action::QueryDnskey(ds.name().clone());
        }

        let Some(key) = &self.key else {
            // neither a key nor a DS: the walk never had a starting point
            return Action::Done(Box::new(KeyEntry::bad(
                self.target.clone(),
                self.dns_class,
                self.bad_key_ttl,
                ValidationErrorKind::Message("key walk without anchor"),
            )));
        };

        let key_name = key.name();
        if key_name == &self.target {
            return Action::Done(Box::new(key.clone()));
        }

        // continue below the deepest name we have dealt with, whether it
        // produced keys or was proven not to be a delegation
        let current = match &self.empty_ds {
            Some(empty) if empty.num_labels() >= key_name.num_labels() => empty,
            _ => key_name,
        };

        if current == &self.target {
            // nothing deeper to ask for; the deepest keys stand
            return Action::Done(Box::new(key.clone()));
        }

        let next = self
            .target
            .trim_to(usize::from(current.num_labels()) + 1);
        trace!(
            "find_key: target = {}, current = {current}, next = {next}",
            self.target
        );
        Action::QueryDs(next)
    }

    /// Feeds a DS response into the walk. Returns an entry to cache, when
    /// the response concluded something cacheable.
    pub(crate) fn process_ds_response(
        &mut self,
        qname: &Name,
        response: &Message,
        nsec3: &Nsec3Validator,
        now: u32,
    ) -> Option<KeyEntry> {
        let Some(key_rrset) = self.key.as_ref().and_then(KeyEntry::rrset).cloned() else {
            self.finished = Some(KeyEntry::bad(
                qname.clone(),
                self.dns_class,
                self.bad_key_ttl,
                ValidationErrorKind::Message("DS response without a current key"),
            ));
            return None;
        };

        match self.ds_response_to_key_entry(qname, response, &key_rrset, nsec3, now) {
            DsOutcome::NotDelegation => {
                debug!("{qname} is not a delegation point, continuing below it");
                self.empty_ds = Some(qname.clone());
                None
            }
            DsOutcome::Ds(rrset) => {
                trace!("DS rrset was good");
                self.ds = Some(rrset);
                None
            }
            DsOutcome::Terminal(entry) => {
                self.finished = Some(entry.clone());
                Some(entry)
            }
        }
    }

    /// Feeds a DNSKEY response into the walk. Returns an entry to cache.
    pub(crate) fn process_dnskey_response(
        &mut self,
        qname: &Name,
        response: &Message,
        now: u32,
    ) -> Option<KeyEntry> {
        let Some(ds_rrset) = self.ds.take() else {
            self.finished = Some(KeyEntry::bad(
                qname.clone(),
                self.dns_class,
                self.bad_key_ttl,
                ValidationErrorKind::Message("DNSKEY response without a pending DS"),
            ));
            return None;
        };

        let Some(dnskey_rrset) = response.find_answer_rrset(qname, RecordType::DNSKEY, self.dns_class)
        else {
            let entry = KeyEntry::bad(
                qname.clone(),
                self.dns_class,
                self.bad_key_ttl,
                ValidationErrorKind::DnskeyMissing {
                    name: qname.clone(),
                },
            );
            self.finished = Some(entry.clone());
            return Some(entry);
        };

        let entry = verify_new_dnskeys(dnskey_rrset, &ds_rrset, self.bad_key_ttl, now);
        if entry.is_good() {
            self.key = Some(entry.clone());
        } else {
            self.finished = Some(entry.clone());
        }
        Some(entry)
    }

    /// Turns a DS response into its consequence for the walk, the
    /// counterpart of classifying an ordinary response.
    fn ds_response_to_key_entry(
        &self,
        qname: &Name,
        response: &Message,
        key_rrset: &Rrset,
        nsec3: &Nsec3Validator,
        now: u32,
    ) -> DsOutcome {
        let dns_class = self.dns_class;
        let bad = |kind| {
            DsOutcome::Terminal(KeyEntry::bad(
                qname.clone(),
                dns_class,
                self.bad_key_ttl,
                kind,
            ))
        };

        match classify_response(response) {
            ResponseClassification::Positive => {
                let Some(ds_rrset) = response.find_answer_rrset(qname, RecordType::DS, dns_class)
                else {
                    return bad(ValidationErrorKind::DsNotSecure {
                        name: qname.clone(),
                    });
                };

                let mut ds_rrset = ds_rrset.clone();
                if verify_srrset(&mut ds_rrset, key_rrset, now) != SecurityStatus::Secure {
                    return bad(ValidationErrorKind::DsNotSecure {
                        name: qname.clone(),
                    });
                }

                if !at_least_one_supported_algorithm(&ds_rrset) {
                    let entry = KeyEntry::null(qname.clone(), dns_class, ds_rrset.ttl())
                        .with_reason(ValidationErrorKind::DsUnsupportedAlgorithms {
                            name: qname.clone(),
                        });
                    return DsOutcome::Terminal(entry);
                }

                DsOutcome::Ds(ds_rrset)
            }

            ResponseClassification::Cname => {
                // a secure CNAME at the queried name: not a delegation
                // point, the walk continues one label deeper
                let Some(cname_rrset) =
                    response.find_answer_rrset(qname, RecordType::CNAME, dns_class)
                else {
                    return bad(ValidationErrorKind::DsCnameNotSecure {
                        name: qname.clone(),
                    });
                };

                let mut cname_rrset = cname_rrset.clone();
                if verify_srrset(&mut cname_rrset, key_rrset, now) == SecurityStatus::Secure {
                    DsOutcome::NotDelegation
                } else {
                    bad(ValidationErrorKind::DsCnameNotSecure {
                        name: qname.clone(),
                    })
                }
            }

            ResponseClassification::Nodata | ResponseClassification::NameError => {
                self.ds_nodata_to_key_entry(qname, response, key_rrset, nsec3, now)
            }

            other => bad(ValidationErrorKind::DsUnexpectedClassification {
                classification: other.to_string(),
            }),
        }
    }

    /// The negative DS case: decide between an insecure delegation, a
    /// non-delegation label, and a broken zone, first by NSEC, then by
    /// NSEC3.
    fn ds_nodata_to_key_entry(
        &self,
        qname: &Name,
        response: &Message,
        key_rrset: &Rrset,
        nsec3: &Nsec3Validator,
        now: u32,
    ) -> DsOutcome {
        let dns_class = self.dns_class;
        let bad = |kind| {
            DsOutcome::Terminal(KeyEntry::bad(
                qname.clone(),
                dns_class,
                self.bad_key_ttl,
                kind,
            ))
        };

        if !has_signed_denial(response) {
            return bad(ValidationErrorKind::DsNoNsecProof {
                name: qname.clone(),
            });
        }

        // NSEC first
        for set in response.name_servers() {
            if set.record_type() != RecordType::NSEC {
                continue;
            }
            let mut set = set.clone();
            if verify_srrset(&mut set, key_rrset, now) != SecurityStatus::Secure {
                debug!("skipping bad nsec");
                continue;
            }
            let Some(nsec_data) = set.first().and_then(|r| r.data().as_nsec()).cloned() else {
                continue;
            };

            match nsec::proves_nodata_ds_reply(set.name(), &nsec_data, qname) {
                DsNodataProof::NoDs => {
                    let entry = KeyEntry::null(qname.clone(), dns_class, self.bad_key_ttl)
                        .with_reason(ValidationErrorKind::DsAbsenceProvenNsec {
                            name: qname.clone(),
                        });
                    return DsOutcome::Terminal(entry);
                }
                DsNodataProof::NotDelegation => return DsOutcome::NotDelegation,
                DsNodataProof::Bogus => {
                    return bad(ValidationErrorKind::Msg(format!(
                        "NSEC at {qname} contradicts the negative DS response"
                    )))
                }
                DsNodataProof::Inconclusive => continue,
            }
        }

        // then NSEC3; unknown hash algorithms are silently skipped in this
        // path
        let mut nsec3_sets = Vec::new();
        let mut nsec3_ttl = u32::MAX;
        let mut nsec3_signer: Option<Name> = None;
        for set in response.name_servers() {
            if set.record_type() != RecordType::NSEC3 {
                continue;
            }
            let mut set = set.clone();
            if verify_srrset(&mut set, key_rrset, now) != SecurityStatus::Secure {
                debug!("skipping bad nsec3");
                continue;
            }
            nsec3_ttl = nsec3_ttl.min(set.ttl());
            nsec3_signer = set.signer_name().cloned().or(nsec3_signer);
            nsec3_sets.push(set);
        }

        if !nsec3_sets.is_empty() {
            let Some(signer) = nsec3_signer else {
                return bad(ValidationErrorKind::DsProofMissing {
                    name: qname.clone(),
                });
            };

            return match nsec3.prove_no_ds(&nsec3_sets, qname, &signer) {
                Ok(DsNodataProof::NoDs) => {
                    debug!("nsec3s proved the absence of a DS at {qname}");
                    let entry = KeyEntry::null(qname.clone(), dns_class, nsec3_ttl)
                        .with_reason(ValidationErrorKind::DsAbsenceProvenNsec3 {
                            name: qname.clone(),
                        });
                    DsOutcome::Terminal(entry)
                }
                Ok(DsNodataProof::NotDelegation) => DsOutcome::NotDelegation,
                Ok(_) => bad(ValidationErrorKind::DsNsec3ProofFailed {
                    name: qname.clone(),
                }),
                Err(e) if e.status() == SecurityStatus::Insecure => {
                    // everything was stripped for unknown algorithms
                    bad(ValidationErrorKind::DsProofMissing {
                        name: qname.clone(),
                    })
                }
                Err(_) => bad(ValidationErrorKind::DsNsec3ProofFailed {
                    name: qname.clone(),
                }),
            };
        }

        bad(ValidationErrorKind::DsProofMissing {
            name: qname.clone(),
        })
    }
}

/// What one DS response means for the walk.
enum DsOutcome {
    /// A validated DS RRset to chase into the child zone
    Ds(Rrset),
    /// The queried name is not a delegation point; step one label deeper
    NotDelegation,
    /// The walk is finished, with a null or bad conclusion
    Terminal(KeyEntry),
}

/// At least one DS in the set carries algorithms this crate can follow.
fn at_least_one_supported_algorithm(ds_rrset: &Rrset) -> bool {
    ds_rrset
        .records()
        .iter()
        .filter_map(|r| r.data().as_ds())
        .any(|ds| ds.algorithm().is_supported() && ds.digest_type().is_supported())
}

/// Any signed NSEC or NSEC3 present in the authority section.
fn has_signed_denial(response: &Message) -> bool {
    response.name_servers().iter().any(|set| {
        matches!(set.record_type(), RecordType::NSEC | RecordType::NSEC3) && set.is_signed()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dnssec::rdata::DS;
    use crate::dnssec::{Algorithm, DigestType};
    use crate::rr::{RData, Record};

    fn name(s: &str) -> Name {
        Name::from_ascii(s).unwrap()
    }

    fn ds_rrset(zone: &str) -> Rrset {
        Rrset::new(Record::from_rdata(
            name(zone),
            300,
            RData::DS(DS::new(
                42,
                Algorithm::ED25519,
                DigestType::SHA256,
                vec![0u8; 32],
            )),
        ))
    }

    fn good_entry(zone: &str) -> KeyEntry {
        use crate::dnssec::rdata::DNSKEY;
        KeyEntry::good(Rrset::new(Record::from_rdata(
            name(zone),
            300,
            RData::DNSKEY(DNSKEY::new(
                true,
                true,
                false,
                Algorithm::ED25519,
                vec![0u8; 32],
            )),
        )))
    }

    #[test]
    fn test_anchor_walk_starts_with_dnskey_query() {
        let walk = KeyWalk::from_anchor(ds_rrset("com"), name("example.com"), DNSClass::IN, 60);
        match walk.next_action() {
            Action::QueryDnskey(n) => assert_eq!(n, name("com")),
            other => panic!("expected a DNSKEY query, got {other:?}"),
        }
    }

    #[test]
    fn test_walk_steps_one_label_at_a_time() {
        let mut walk = KeyWalk::from_cached(
            good_entry("com"),
            name("a.b.example.com"),
            DNSClass::IN,
            60,
        );

        match walk.next_action() {
            Action::QueryDs(n) => assert_eq!(n, name("example.com")),
            other => panic!("expected a DS query, got {other:?}"),
        }

        // a non-delegation label advances the walk without new keys
        walk.empty_ds = Some(name("example.com"));
        match walk.next_action() {
            Action::QueryDs(n) => assert_eq!(n, name("b.example.com")),
            other => panic!("expected a DS query, got {other:?}"),
        }
    }

    #[test]
    fn test_walk_done_at_target() {
        let walk = KeyWalk::from_cached(
            good_entry("example.com"),
            name("example.com"),
            DNSClass::IN,
            60,
        );
        match walk.next_action() {
            Action::Done(entry) => {
                assert!(entry.is_good());
                assert_eq!(entry.name(), &name("example.com"));
            }
            other => panic!("expected the walk to finish, got {other:?}"),
        }
    }

    #[test]
    fn test_walk_stops_on_terminal_entry() {
        let mut walk = KeyWalk::from_cached(
            good_entry("com"),
            name("example.com"),
            DNSClass::IN,
            60,
        );
        walk.finished = Some(KeyEntry::null(name("example.com"), DNSClass::IN, 60));

        match walk.next_action() {
            Action::Done(entry) => assert!(entry.is_null()),
            other => panic!("expected the walk to finish, got {other:?}"),
        }
    }

    #[test]
    fn test_walk_gives_up_at_non_delegation_target() {
        let mut walk = KeyWalk::from_cached(
            good_entry("com"),
            name("example.com"),
            DNSClass::IN,
            60,
        );
        // the target itself turned out not to be a delegation point
        walk.empty_ds = Some(name("example.com"));

        match walk.next_action() {
            Action::Done(entry) => {
                assert!(entry.is_good());
                assert_eq!(entry.name(), &name("com"));
            }
            other => panic!("expected the walk to finish, got {other:?}"),
        }
    }

    #[test]
    fn test_unsigned_ds_response_concludes_bad() {
        let mut walk = KeyWalk::from_cached(
            good_entry("com"),
            name("example.com"),
            DNSClass::IN,
            60,
        );

        // a NODATA DS response with no denial records at all
        let mut response = Message::new();
        response.add_query(crate::op::Query::query(name("example.com"), RecordType::DS));

        let cached = walk.process_ds_response(
            &name("example.com"),
            &response,
            &Nsec3Validator::default(),
            0,
        );
        assert!(cached.as_ref().is_some_and(KeyEntry::is_bad));
        assert!(matches!(walk.next_action(), Action::Done(e) if e.is_bad()));
    }
}
