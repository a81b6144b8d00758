// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! dns security extension related modules

mod algorithm;
mod digest_type;
mod key_cache;
mod key_entry;
pub mod nsec;
pub mod nsec3;
pub mod rdata;
mod status;
pub mod tbs;
mod trust_anchor;
pub mod verifier;

pub use self::algorithm::{Algorithm, Nsec3HashAlgorithm};
pub use self::digest_type::DigestType;
pub use self::key_cache::KeyCache;
pub use self::key_entry::KeyEntry;
pub use self::nsec3::Nsec3Validator;
pub use self::status::{SecurityStatus, ValidationError, ValidationErrorKind};
pub use self::trust_anchor::TrustAnchorStore;

#[cfg(test)]
pub(crate) mod test_support;
