// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! record type definitions

use std::fmt;

/// The type of the resource record.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[allow(missing_docs)]
pub enum RecordType {
    /// RFC 1035 IPv4 Address
    A,
    /// RFC 3596 IPv6 Address
    AAAA,
    /// RFC 1035 Query all record types
    ANY,
    /// RFC 1035 Canonical name
    CNAME,
    /// RFC 6672 Delegation name
    DNAME,
    /// RFC 4034 DNS public key
    DNSKEY,
    /// RFC 4034 Delegation signer
    DS,
    /// RFC 1035 Mail exchange
    MX,
    /// RFC 1035 Authoritative name server
    NS,
    /// RFC 4034 Next secure record
    NSEC,
    /// RFC 5155 Hashed next secure record
    NSEC3,
    /// RFC 5155 NSEC3 parameters
    NSEC3PARAM,
    /// RFC 6891 Option
    OPT,
    /// RFC 1035 Domain name pointer
    PTR,
    /// RFC 4034 RRset signature
    RRSIG,
    /// RFC 1035 Start of authority
    SOA,
    /// RFC 1035 Text record
    TXT,
    /// Unknown or unsupported record type
    Unknown(u16),
}

impl Default for RecordType {
    fn default() -> Self {
        Self::A
    }
}

impl RecordType {
    /// Returns true if this is one of the DNSSEC record types
    pub fn is_dnssec(self) -> bool {
        matches!(
            self,
            Self::DNSKEY | Self::DS | Self::NSEC | Self::NSEC3 | Self::NSEC3PARAM | Self::RRSIG
        )
    }
}

impl From<u16> for RecordType {
    fn from(value: u16) -> Self {
        match value {
            1 => Self::A,
            2 => Self::NS,
            5 => Self::CNAME,
            6 => Self::SOA,
            12 => Self::PTR,
            15 => Self::MX,
            16 => Self::TXT,
            28 => Self::AAAA,
            39 => Self::DNAME,
            41 => Self::OPT,
            43 => Self::DS,
            46 => Self::RRSIG,
            47 => Self::NSEC,
            48 => Self::DNSKEY,
            50 => Self::NSEC3,
            51 => Self::NSEC3PARAM,
            255 => Self::ANY,
            _ => Self::Unknown(value),
        }
    }
}

impl From<RecordType> for u16 {
    fn from(rt: RecordType) -> Self {
        match rt {
            RecordType::A => 1,
            RecordType::NS => 2,
            RecordType::CNAME => 5,
            RecordType::SOA => 6,
            RecordType::PTR => 12,
            RecordType::MX => 15,
            RecordType::TXT => 16,
            RecordType::AAAA => 28,
            RecordType::DNAME => 39,
            RecordType::OPT => 41,
            RecordType::DS => 43,
            RecordType::RRSIG => 46,
            RecordType::NSEC => 47,
            RecordType::DNSKEY => 48,
            RecordType::NSEC3 => 50,
            RecordType::NSEC3PARAM => 51,
            RecordType::ANY => 255,
            RecordType::Unknown(v) => v,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(v) => write!(f, "TYPE{v}"),
            _ => write!(f, "{self:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u16_round_trip() {
        for rt in [
            RecordType::A,
            RecordType::DS,
            RecordType::RRSIG,
            RecordType::NSEC3,
            RecordType::Unknown(4711),
        ] {
            assert_eq!(RecordType::from(u16::from(rt)), rt);
        }
    }
}
