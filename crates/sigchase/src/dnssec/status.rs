// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The security status of validated data, and the catalog of reasons a
//! validation can assign when it does not end in `Secure`.

use std::fmt;

use thiserror::Error;

use crate::rr::{Name, RecordType};

/// The status of a DNSSEC-verified RRset or message.
///
/// see [RFC 4035, DNSSEC Protocol Modifications, March 2005](https://datatracker.ietf.org/doc/html/rfc4035#section-4.3)
/// ```text
/// 4.3.  Determining Security Status of Data
///
///   A security-aware resolver MUST be able to determine whether it should
///   expect a particular RRset to be signed.  More precisely, a
///   security-aware resolver must be able to distinguish between four
///   cases:
/// ```
///
/// `Unchecked` is the fifth, pre-validation state data starts out in.
#[must_use = "a SecurityStatus should be interrogated before the data it describes is used"]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
#[repr(u8)]
pub enum SecurityStatus {
    /// Validation has not run over this data yet
    #[default]
    Unchecked = 0,

    /// A chain of trust ought to exist but could not be built, either from
    /// signatures failing to validate or required records being absent
    Bogus = 1,

    /// No applicable trust anchor, so no determination could be made
    Indeterminate = 2,

    /// The data provably sits below an unsigned delegation
    Insecure = 3,

    /// A chain of signed DNSKEY and DS records links the data to a trust
    /// anchor
    Secure = 4,
}

impl SecurityStatus {
    /// Returns true for validated, trusted data
    #[inline]
    pub fn is_secure(&self) -> bool {
        *self == Self::Secure
    }

    /// Returns true when the zone is proven not to be signed
    #[inline]
    pub fn is_insecure(&self) -> bool {
        *self == Self::Insecure
    }

    /// Returns true when validation failed
    #[inline]
    pub fn is_bogus(&self) -> bool {
        *self == Self::Bogus
    }

    /// Returns true before any validation has been done
    #[inline]
    pub fn is_unchecked(&self) -> bool {
        *self == Self::Unchecked
    }
}

impl fmt::Display for SecurityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unchecked => "Unchecked",
            Self::Bogus => "Bogus",
            Self::Indeterminate => "Indeterminate",
            Self::Insecure => "Insecure",
            Self::Secure => "Secure",
        };
        f.write_str(s)
    }
}

/// The catalog of reasons validation assigns to non-secure outcomes.
///
/// Tests and operators match on the variant; the rendered text is only for
/// the reason TXT record and the logs.
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum ValidationErrorKind {
    /// An error with an arbitrary message, referenced as &'static str
    #[error("{0}")]
    Message(&'static str),

    /// An error with an arbitrary message, stored as String
    #[error("{0}")]
    Msg(String),

    /// An answer RRset failed signature validation
    #[error("positive response has failed ANSWER rrset: {name}")]
    PositiveAnswerNotSecure {
        /// owner of the failed set
        name: Name,
    },

    /// An authority RRset of a positive response failed validation
    #[error("positive response has failed AUTHORITY rrset: {name}")]
    PositiveAuthorityNotSecure {
        /// owner of the failed set
        name: Name,
    },

    /// An authority RRset of a NODATA response failed validation
    #[error("NODATA response has failed AUTHORITY rrset: {name}")]
    NodataAuthorityNotSecure {
        /// owner of the failed set
        name: Name,
    },

    /// An authority RRset of an NXDOMAIN response failed validation
    #[error("NXDOMAIN response has failed AUTHORITY rrset: {name}")]
    NxdomainAuthorityNotSecure {
        /// owner of the failed set
        name: Name,
    },

    /// A CNAME in the chain leading to the NODATA was not secure
    #[error("CNAME in chain to NODATA is not secure: {name}")]
    CnameChainNotSecure {
        /// owner of the failed CNAME
        name: Name,
    },

    /// A CNAME in the chain leading to the NXDOMAIN was not secure
    #[error("CNAME in chain to NXDOMAIN is not secure: {name}")]
    NxdomainChainNotSecure {
        /// owner of the failed CNAME
        name: Name,
    },

    /// More than one CNAME claimed to be synthesized from one DNAME
    #[error("DNAME should have synthesized exactly one CNAME")]
    DnameSynthesisMultiple,

    /// The CNAME following a DNAME did not match the expected synthesis
    #[error("CNAME synthesized from DNAME is {found}, expected {expected}")]
    DnameSynthesisMismatch {
        /// the target found in the CNAME
        found: Name,
        /// the target synthesis requires
        expected: Name,
    },

    /// Synthesizing the CNAME target overflowed the name length limit
    #[error("name synthesized from DNAME exceeds 255 octets")]
    DnameSynthesisTooLong,

    /// A DNAME may not be wildcard expanded, RFC 4592, section 4.4
    #[error("DNAME in response was wildcard expanded: {name}")]
    WildcardDname {
        /// owner of the offending DNAME
        name: Name,
    },

    /// A wildcard-expanded answer lacked the proof that the expansion was
    /// legitimate
    #[error("wildcard expansion was not proven to use the correct wildcard")]
    WildcardTooBroad,

    /// Building the wildcard name for an expansion proof failed
    #[error("could not build the wildcard name for the expansion proof")]
    WildcardGeneration,

    /// All NSEC3 records are unusable under the iteration policy
    #[error("all NSEC3 records use unknown algorithms or too many iterations")]
    Nsec3Ignored,

    /// The NODATA condition could not be proven
    #[error("NODATA response was not proven by any NSEC or NSEC3")]
    NodataProofMissing,

    /// The NXDOMAIN condition could not be proven
    #[error("NXDOMAIN response was not proven to not exist: {name}")]
    NxdomainProofMissing {
        /// the name that should have been proven absent
        name: Name,
    },

    /// The absence of a covering wildcard could not be proven
    #[error("NXDOMAIN response did not prove the absence of a wildcard")]
    NxdomainWildcardProofMissing,

    /// NSEC3 records failed to prove the NXDOMAIN
    #[error("NSEC3 records failed to prove the NXDOMAIN")]
    NxdomainNsec3Bogus,

    /// An RRset that must be signed carried no signature
    #[error("missing signature for rrset under a secure zone: {name}")]
    MissingSignature {
        /// owner of the unsigned set
        name: Name,
    },

    /// The key for a zone failed validation earlier
    #[error("bad key for {name}: {reason}")]
    BadKey {
        /// the zone whose key is bad
        name: Name,
        /// why the key entry was marked bad
        reason: String,
    },

    /// An unsigned RRset under a proven insecure delegation
    #[error("unsigned rrset below an insecure delegation")]
    InsecureUnsigned,

    /// A proven insecure delegation above the signer
    #[error("rrset below an insecure delegation")]
    InsecureDelegation,

    /// The response did not match any known classification
    #[error("response classification {classification} can not be validated")]
    UnknownClassification {
        /// the classification encountered
        classification: String,
    },

    /// The DS RRset failed signature validation
    #[error("DS rrset failed to verify: {name}")]
    DsNotSecure {
        /// owner of the DS set
        name: Name,
    },

    /// The CNAME found at a DS query name failed validation
    #[error("CNAME at DS query failed to verify: {name}")]
    DsCnameNotSecure {
        /// the queried name
        name: Name,
    },

    /// A DS response fell into a classification the walk can not use
    #[error("DS response classified as {classification} can not be processed")]
    DsUnexpectedClassification {
        /// the classification encountered
        classification: String,
    },

    /// A negative DS response carried no signed NSEC or NSEC3 records
    #[error("no signed NSEC or NSEC3 in negative DS response: {name}")]
    DsNoNsecProof {
        /// the queried name
        name: Name,
    },

    /// NSEC3 records failed to prove the DS absence
    #[error("NSEC3 records failed to prove DS absence: {name}")]
    DsNsec3ProofFailed {
        /// the queried name
        name: Name,
    },

    /// Nothing in the negative DS response proved anything
    #[error("negative DS response proves neither existence nor absence: {name}")]
    DsProofMissing {
        /// the queried name
        name: Name,
    },

    /// The DS RRset lists only unsupported algorithms; the delegation is
    /// treated as unsigned
    #[error("no supported algorithm in DS rrset: {name}")]
    DsUnsupportedAlgorithms {
        /// owner of the DS set
        name: Name,
    },

    /// An NSEC proved the DS absent; the delegation is insecure
    #[error("NSEC proved no DS at delegation: {name}")]
    DsAbsenceProvenNsec {
        /// the delegation name
        name: Name,
    },

    /// An NSEC3 proved the DS absent (directly or by opt-out); the
    /// delegation is insecure
    #[error("NSEC3 proved no DS at delegation: {name}")]
    DsAbsenceProvenNsec3 {
        /// the delegation name
        name: Name,
    },

    /// The DNSKEY RRset was missing from the keys response
    #[error("no DNSKEY rrset in response: {name}")]
    DnskeyMissing {
        /// the queried zone
        name: Name,
    },

    /// No DNSKEY matched and verified against the validated DS set
    #[error("DNSKEY rrset did not verify against DS rrset: {name}")]
    DnskeyInvalid {
        /// the zone whose keys failed
        name: Name,
    },

    /// The RRSIGs for an RRset are not present
    #[error("rrsigs are not present for: {name} record_type: {record_type}")]
    RrsigsNotPresent {
        /// owner of the unsigned set
        name: Name,
        /// the type of the unsigned set
        record_type: RecordType,
    },

    /// No RRSIG over the RRset could be verified with any trusted key
    #[error("rrsigs were not able to be verified: {name}, type: {record_type}")]
    RrsigsUnverified {
        /// owner of the failed set
        name: Name,
        /// the type of the failed set
        record_type: RecordType,
    },

    /// The closest encloser could not be demonstrated from the NSEC3 set
    #[error("no NSEC3 closest encloser proof for: {name}")]
    Nsec3ClosestEncloserMissing {
        /// the name whose encloser is unproven
        name: Name,
    },

    /// No NSEC3 covered the next closer name
    #[error("no NSEC3 covers the next closer of: {name}")]
    Nsec3NextCloserNotCovered {
        /// the name whose next closer is uncovered
        name: Name,
    },

    /// No NSEC3 covered or matched the wildcard of the closest encloser
    #[error("no NSEC3 covers the wildcard for: {name}")]
    Nsec3WildcardNotCovered {
        /// the name whose wildcard is uncovered
        name: Name,
    },

    /// The covering NSEC3 carries the opt-out flag; only an insecure
    /// conclusion is possible
    #[error("NSEC3 with opt-out covers: {name}")]
    Nsec3OptOut {
        /// the covered name
        name: Name,
    },

    /// The NSEC3 parameters disagree within one response
    #[error("NSEC3 records carry inconsistent parameters")]
    Nsec3ParameterMismatch,
}

/// A non-secure validation outcome: the status reached and the reason for
/// reaching it.
#[derive(Debug, Clone, Error)]
pub struct ValidationError {
    status: SecurityStatus,
    kind: ValidationErrorKind,
}

impl ValidationError {
    /// An error with the given status and reason
    pub fn new(status: SecurityStatus, kind: ValidationErrorKind) -> Self {
        Self { status, kind }
    }

    /// A bogus outcome with the given reason
    pub fn bogus(kind: ValidationErrorKind) -> Self {
        Self::new(SecurityStatus::Bogus, kind)
    }

    /// An insecure outcome with the given reason
    pub fn insecure(kind: ValidationErrorKind) -> Self {
        Self::new(SecurityStatus::Insecure, kind)
    }

    /// The status this outcome assigns
    pub fn status(&self) -> SecurityStatus {
        self.status
    }

    /// The reason for the outcome
    pub fn kind(&self) -> &ValidationErrorKind {
        &self.kind
    }

    /// Splits the outcome into its parts
    pub fn into_parts(self) -> (SecurityStatus, ValidationErrorKind) {
        (self.status, self.kind)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_order() {
        assert!(SecurityStatus::Secure > SecurityStatus::Insecure);
        assert!(SecurityStatus::Insecure > SecurityStatus::Indeterminate);
        assert!(SecurityStatus::Indeterminate > SecurityStatus::Bogus);
        assert!(SecurityStatus::Bogus > SecurityStatus::Unchecked);
    }

    #[test]
    fn test_error_display() {
        let err = ValidationError::bogus(ValidationErrorKind::NodataProofMissing);
        assert_eq!(
            err.to_string(),
            "Bogus: NODATA response was not proven by any NSEC or NSEC3"
        );
    }
}
