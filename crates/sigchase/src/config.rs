// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Configuration for the validator

use std::path::PathBuf;
use std::time::Duration;

use crate::dnssec::nsec3::DEFAULT_ITERATION_CAPS;

/// Process-wide configuration, set when the validator is constructed.
#[derive(Clone, Debug)]
pub struct ValidatorConfig {
    /// Trust anchor file to load at startup, a zone-file-style listing of
    /// DS and DNSKEY records. `None` starts with an empty anchor store.
    pub trust_anchor_file: Option<PathBuf>,

    /// Upper bound for the number of cached key entries
    pub key_cache_capacity: u64,

    /// Upper bound on how long any key entry may be cached, whatever its
    /// own TTL says
    pub key_cache_max_ttl: Duration,

    /// How long a failed (bad) key entry is cached, throttling repeated
    /// validation of broken zones
    pub bad_key_ttl: Duration,

    /// NSEC3 iteration caps as `(key bits, allowed iterations)`
    pub nsec3_iteration_caps: Vec<(u16, u16)>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            trust_anchor_file: None,
            key_cache_capacity: 10_000,
            key_cache_max_ttl: Duration::from_secs(900),
            bad_key_ttl: Duration::from_secs(60),
            nsec3_iteration_caps: DEFAULT_ITERATION_CAPS.to_vec(),
        }
    }
}
