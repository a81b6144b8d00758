// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! DS record digest types

use ring::digest;

use crate::error::ProtoResult;

/// The digest algorithm of a DS record, as assigned by IANA.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum DigestType {
    /// SHA-1
    SHA1,
    /// SHA-256
    SHA256,
    /// SHA-384
    SHA384,
    /// Unassigned or unsupported digest number
    Unknown(u8),
}

impl DigestType {
    /// Whether digests of this type can be computed
    pub fn is_supported(self) -> bool {
        matches!(self, Self::SHA1 | Self::SHA256 | Self::SHA384)
    }

    /// Hashes the given data
    pub fn digest(self, data: &[u8]) -> ProtoResult<Vec<u8>> {
        let alg = match self {
            Self::SHA1 => &digest::SHA1_FOR_LEGACY_USE_ONLY,
            Self::SHA256 => &digest::SHA256,
            Self::SHA384 => &digest::SHA384,
            Self::Unknown(v) => return Err(format!("unsupported digest type: {v}").into()),
        };

        Ok(digest::digest(alg, data).as_ref().to_vec())
    }
}

impl From<u8> for DigestType {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::SHA1,
            2 => Self::SHA256,
            4 => Self::SHA384,
            _ => Self::Unknown(value),
        }
    }
}

impl From<DigestType> for u8 {
    fn from(d: DigestType) -> Self {
        match d {
            DigestType::SHA1 => 1,
            DigestType::SHA256 => 2,
            DigestType::SHA384 => 4,
            DigestType::Unknown(v) => v,
        }
    }
}
