// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The validator's cached conclusion about a zone's keys

use crate::dnssec::ValidationErrorKind;
use crate::rr::{DNSClass, Name, Rrset};

/// What the validator knows about one zone's DNSKEY set.
///
/// A `Good` entry is only ever created after the DS to DNSKEY chain from a
/// trust anchor validated cryptographically; a `Null` entry records a proven
/// insecure delegation, the end of secure space; a `Bad` entry throttles
/// revalidation of a broken zone.
#[derive(Clone, Debug)]
pub enum KeyEntry {
    /// A validated, usable DNSKEY RRset for a zone
    Good {
        /// the validated DNSKEY RRset
        rrset: Rrset,
        /// how long the conclusion may be cached
        ttl: u32,
    },
    /// A proven insecure delegation
    Null {
        /// the zone proven insecure
        name: Name,
        /// the class of the zone
        dns_class: DNSClass,
        /// how long the conclusion may be cached
        ttl: u32,
        /// why the zone is insecure, when known
        reason: Option<ValidationErrorKind>,
    },
    /// A zone whose chain failed validation
    Bad {
        /// the zone that failed
        name: Name,
        /// the class of the zone
        dns_class: DNSClass,
        /// how long the failure may be cached
        ttl: u32,
        /// why validation failed
        reason: ValidationErrorKind,
    },
}

impl KeyEntry {
    /// A good entry wrapping a validated DNSKEY RRset
    pub fn good(rrset: Rrset) -> Self {
        let ttl = rrset.ttl();
        Self::Good { rrset, ttl }
    }

    /// A null entry: `name` is a proven insecure delegation
    pub fn null(name: Name, dns_class: DNSClass, ttl: u32) -> Self {
        Self::Null {
            name,
            dns_class,
            ttl,
            reason: None,
        }
    }

    /// A bad entry: the chain to `name` failed
    pub fn bad(name: Name, dns_class: DNSClass, ttl: u32, reason: ValidationErrorKind) -> Self {
        Self::Bad {
            name,
            dns_class,
            ttl,
            reason,
        }
    }

    /// Attaches a reason to a null entry; no-op for the other variants
    pub fn with_reason(mut self, kind: ValidationErrorKind) -> Self {
        if let Self::Null { reason, .. } = &mut self {
            *reason = Some(kind);
        }
        self
    }

    /// The zone this entry is about
    pub fn name(&self) -> &Name {
        match self {
            Self::Good { rrset, .. } => rrset.name(),
            Self::Null { name, .. } | Self::Bad { name, .. } => name,
        }
    }

    /// The class of the zone
    pub fn dns_class(&self) -> DNSClass {
        match self {
            Self::Good { rrset, .. } => rrset.dns_class(),
            Self::Null { dns_class, .. } | Self::Bad { dns_class, .. } => *dns_class,
        }
    }

    /// How long this conclusion may be cached
    pub fn ttl(&self) -> u32 {
        match self {
            Self::Good { ttl, .. } | Self::Null { ttl, .. } | Self::Bad { ttl, .. } => *ttl,
        }
    }

    /// The DNSKEY RRset of a good entry
    pub fn rrset(&self) -> Option<&Rrset> {
        match self {
            Self::Good { rrset, .. } => Some(rrset),
            _ => None,
        }
    }

    /// The recorded reason, if any
    pub fn reason(&self) -> Option<&ValidationErrorKind> {
        match self {
            Self::Good { .. } => None,
            Self::Null { reason, .. } => reason.as_ref(),
            Self::Bad { reason, .. } => Some(reason),
        }
    }

    /// True for a usable key set
    pub fn is_good(&self) -> bool {
        matches!(self, Self::Good { .. })
    }

    /// True for a proven insecure delegation
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null { .. })
    }

    /// True for a failed chain
    pub fn is_bad(&self) -> bool {
        matches!(self, Self::Bad { .. })
    }
}
