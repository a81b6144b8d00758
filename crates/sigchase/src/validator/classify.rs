// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Response classification: which validator a response must go through.

use std::fmt;

use tracing::trace;

use crate::op::{Message, ResponseCode};
use crate::rr::RecordType;

/// The classification of a response, deciding which of the per-class
/// validators applies. Tie-breaks follow RFC 4035, section 5.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResponseClassification {
    /// A direct answer to the question
    Positive,
    /// An answer to a qtype=ANY question
    Any,
    /// A CNAME chain ending in an answer
    Cname,
    /// A CNAME chain ending in nothing, rcode NOERROR
    CnameNodata,
    /// A CNAME chain ending in nothing, rcode NXDOMAIN
    CnameNameError,
    /// An empty answer with rcode NOERROR
    Nodata,
    /// rcode NXDOMAIN
    NameError,
    /// A delegation to another zone
    Referral,
    /// Anything else
    Unknown,
}

impl fmt::Display for ResponseClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Classifies a response against its question.
pub fn classify_response(message: &Message) -> ResponseClassification {
    let Some(query) = message.query() else {
        return ResponseClassification::Unknown;
    };

    let rcode = message.response_code();
    if rcode != ResponseCode::NoError && rcode != ResponseCode::NXDomain {
        trace!("classified as UNKNOWN: rcode {rcode}");
        return ResponseClassification::Unknown;
    }

    if message.answers().is_empty() {
        if rcode == ResponseCode::NXDomain {
            return ResponseClassification::NameError;
        }

        // NOERROR with nothing in the answer: either a referral (an NS set
        // without SOA or denial records) or a NODATA
        let has_ns = message
            .name_servers()
            .iter()
            .any(|set| set.record_type() == RecordType::NS);
        let has_soa_or_denial = message.name_servers().iter().any(|set| {
            matches!(
                set.record_type(),
                RecordType::SOA | RecordType::NSEC | RecordType::NSEC3
            )
        });

        if has_ns && !has_soa_or_denial {
            return ResponseClassification::Referral;
        }
        return ResponseClassification::Nodata;
    }

    if query.query_type() == RecordType::ANY {
        return ResponseClassification::Any;
    }

    // walk the answer section following the alias chain from qname
    let mut qname = query.name().clone();
    let mut had_cname = false;
    for set in message.answers() {
        if set.record_type() == query.query_type() && set.name() == &qname {
            return if had_cname {
                ResponseClassification::Cname
            } else {
                ResponseClassification::Positive
            };
        }

        if set.record_type() == RecordType::CNAME && set.name() == &qname {
            if let Some(target) = set.first().and_then(|r| r.data().as_cname()) {
                qname = target.clone();
                had_cname = true;
                continue;
            }
        }

        // a DNAME rewrites the chain through its synthesized CNAME, which
        // follows in the section; the DNAME itself never matches qname
        // unless it was the qtype, which the first arm caught
    }

    // the chain never reached an answer
    match rcode {
        ResponseCode::NXDomain if had_cname => ResponseClassification::CnameNameError,
        ResponseCode::NXDomain => ResponseClassification::NameError,
        _ if had_cname => ResponseClassification::CnameNodata,
        _ => ResponseClassification::Nodata,
    }
}
