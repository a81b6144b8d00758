// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! NSEC denial of existence proofs, RFC 4035, section 5.4.
//!
//! An NSEC record with owner `O` and next name `N` asserts two things: no
//! name exists strictly between `O` and `N` in the zone's canonical order,
//! and exactly the types in the bit map exist at `O`. The proofs here are
//! different ways of combining those two assertions.

use crate::dnssec::rdata::NSEC;
use crate::error::ProtoResult;
use crate::rr::{Name, RecordType};

/// The outcome of a NODATA proof attempt: whether it proved the condition,
/// and, when a wildcard NSEC matched, the closest encloser implied by the
/// wildcard for the consistency check of wildcard NODATA responses.
#[derive(Debug, Default)]
pub struct NsecNodata {
    /// the NODATA condition was proven
    pub proven: bool,
    /// the parent of the matching wildcard NSEC, when one was used
    pub wildcard: Option<Name>,
}

/// What a negative DS response proves about the queried delegation.
#[derive(Debug, Eq, PartialEq)]
pub enum DsNodataProof {
    /// The name is a delegation and provably has no DS: secure space ends
    NoDs,
    /// The name exists but is not a delegation point; the walk continues
    /// below it
    NotDelegation,
    /// The records contradict the response
    Bogus,
    /// No applicable NSEC; other proofs may still apply
    Inconclusive,
}

/// Returns true if `name` falls into the span of the NSEC: strictly after
/// the owner and strictly before the next name, wrapping at the end of the
/// zone.
pub fn covers(owner: &Name, nsec: &NSEC, name: &Name) -> bool {
    let next = nsec.next_domain_name();
    if owner < next {
        owner < name && name < next
    } else if owner == next {
        // a single-NSEC zone covers everything but its apex
        name != owner
    } else {
        // the span wraps past the end of the zone
        name > owner || name < next
    }
}

/// Determines whether the NSEC proves that `qtype` does not exist at
/// `qname`, covering the direct match, the empty non-terminal, and the
/// wildcard cases.
pub fn proves_nodata(owner: &Name, nsec: &NSEC, qname: &Name, qtype: RecordType) -> NsecNodata {
    if owner == qname {
        let types = nsec.type_bit_maps();
        // a CNAME at qname means the caller should have chased it instead
        if types.contains(&qtype) || types.contains(&RecordType::CNAME) {
            return NsecNodata::default();
        }
        // an apex NSEC can not speak for the parent side of the delegation
        if qtype == RecordType::DS && types.contains(&RecordType::SOA) && !qname.is_root() {
            return NsecNodata::default();
        }
        return NsecNodata {
            proven: true,
            wildcard: None,
        };
    }

    // a wildcard NSEC matches every name below its parent
    if owner.is_wildcard() {
        let closest_encloser = owner.base_name();
        if closest_encloser.zone_of(qname) {
            let types = nsec.type_bit_maps();
            if types.contains(&qtype) || types.contains(&RecordType::CNAME) {
                return NsecNodata::default();
            }
            return NsecNodata {
                proven: true,
                wildcard: Some(closest_encloser),
            };
        }
        return NsecNodata::default();
    }

    // the empty non-terminal case: qname sits between the owner and a next
    // name that continues below it, so qname exists with no records at all
    if covers(owner, nsec, qname) && qname.zone_of(nsec.next_domain_name()) {
        return NsecNodata {
            proven: true,
            wildcard: None,
        };
    }

    NsecNodata::default()
}

/// Determines whether the NSEC proves that `qname` does not exist in the
/// signer's zone.
pub fn proves_name_error(owner: &Name, nsec: &NSEC, qname: &Name, signer: &Name) -> bool {
    covers(owner, nsec, qname) && signer.zone_of(qname)
}

/// The closest encloser of `qname` implied by the NSEC: the longer of the
/// common ancestors with the owner and with the next name.
pub fn closest_encloser(qname: &Name, owner: &Name, nsec: &NSEC) -> Name {
    let from_owner = qname.common_ancestor(owner);
    let from_next = qname.common_ancestor(nsec.next_domain_name());
    if from_owner.num_labels() > from_next.num_labels() {
        from_owner
    } else {
        from_next
    }
}

/// The wildcard that could have served `qname` given the NSEC's implied
/// closest encloser, i.e. `*.<closest encloser>`.
pub fn nsec_wildcard(qname: &Name, owner: &Name, nsec: &NSEC) -> ProtoResult<Name> {
    closest_encloser(qname, owner, nsec).prepend_label(b"*")
}

/// Determines whether the NSEC proves that no wildcard could have been
/// expanded to serve `qname`: some candidate wildcard between the signer's
/// apex and `qname` must be covered.
pub fn proves_no_wildcard(owner: &Name, nsec: &NSEC, qname: &Name, signer: &Name) -> bool {
    if !signer.zone_of(qname) {
        return false;
    }

    let qname_labels = usize::from(qname.num_labels());
    let signer_labels = usize::from(signer.num_labels());
    for depth in (signer_labels..qname_labels).rev() {
        let Ok(wildcard) = qname.trim_to(depth).prepend_label(b"*") else {
            continue;
        };
        if covers(owner, nsec, &wildcard) {
            return true;
        }
    }
    false
}

/// Analyzes the NSECs of a NODATA reply to a DS query, RFC 4035, section
/// 5.2: the type map at the delegation tells whether secure space ends
/// here, continues, or whether the response contradicts itself.
pub fn proves_nodata_ds_reply(owner: &Name, nsec: &NSEC, qname: &Name) -> DsNodataProof {
    if owner == qname {
        let types = nsec.type_bit_maps();
        if types.contains(&RecordType::DS) {
            // a NODATA answer while the NSEC says the DS exists
            return DsNodataProof::Bogus;
        }
        if types.contains(&RecordType::SOA) && !qname.is_root() {
            // this is the child's apex NSEC, useless for the parent side
            return DsNodataProof::Inconclusive;
        }
        if types.contains(&RecordType::NS) {
            // a delegation without a DS: provably insecure
            return DsNodataProof::NoDs;
        }
        // the name exists but delegates nothing
        return DsNodataProof::NotDelegation;
    }

    DsNodataProof::Inconclusive
}
