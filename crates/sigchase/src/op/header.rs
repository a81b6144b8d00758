// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Message header and response codes

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// The flag bits of the DNS header, RFC 1035 section 4.1.1 plus the
    /// DNSSEC AD and CD bits of RFC 4035.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct Flags: u16 {
        /// Query/Response
        const QR = 0x8000;
        /// Authoritative Answer
        const AA = 0x0400;
        /// TrunCation
        const TC = 0x0200;
        /// Recursion Desired
        const RD = 0x0100;
        /// Recursion Available
        const RA = 0x0080;
        /// Authenticated Data
        const AD = 0x0020;
        /// Checking Disabled
        const CD = 0x0010;
    }
}

/// The response code of a message, RFC 1035 section 4.1.1 plus YXDOMAIN
/// from RFC 2136.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum ResponseCode {
    /// No error
    #[default]
    NoError,
    /// Format error
    FormErr,
    /// Server failure
    ServFail,
    /// Non-existent domain
    NXDomain,
    /// Not implemented
    NotImp,
    /// Query refused
    Refused,
    /// Name exists when it should not
    YXDomain,
    /// Any other response code
    Unknown(u8),
}

impl From<u8> for ResponseCode {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::NoError,
            1 => Self::FormErr,
            2 => Self::ServFail,
            3 => Self::NXDomain,
            4 => Self::NotImp,
            5 => Self::Refused,
            6 => Self::YXDomain,
            _ => Self::Unknown(value),
        }
    }
}

impl From<ResponseCode> for u8 {
    fn from(rc: ResponseCode) -> Self {
        match rc {
            ResponseCode::NoError => 0,
            ResponseCode::FormErr => 1,
            ResponseCode::ServFail => 2,
            ResponseCode::NXDomain => 3,
            ResponseCode::NotImp => 4,
            ResponseCode::Refused => 5,
            ResponseCode::YXDomain => 6,
            ResponseCode::Unknown(v) => v,
        }
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(v) => write!(f, "RCODE{v}"),
            _ => write!(f, "{self:?}"),
        }
    }
}

/// The fixed header of a DNS message, reduced to the fields the validator
/// reads and writes.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Header {
    id: u16,
    response_code: ResponseCode,
    flags: Flags,
}

impl Header {
    /// A new header with the given id
    pub fn new(id: u16) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// The transaction id
    pub fn id(&self) -> u16 {
        self.id
    }

    /// Replaces the transaction id
    pub fn set_id(&mut self, id: u16) {
        self.id = id;
    }

    /// The response code
    pub fn response_code(&self) -> ResponseCode {
        self.response_code
    }

    /// Replaces the response code
    pub fn set_response_code(&mut self, rc: ResponseCode) {
        self.response_code = rc;
    }

    /// Reads one of the flag bits
    pub fn flag(&self, flag: Flags) -> bool {
        self.flags.contains(flag)
    }

    /// Sets one of the flag bits
    pub fn set_flag(&mut self, flag: Flags) {
        self.flags.insert(flag);
    }

    /// Clears one of the flag bits
    pub fn unset_flag(&mut self, flag: Flags) {
        self.flags.remove(flag);
    }
}
