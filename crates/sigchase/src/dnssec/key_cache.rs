// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! A TTL-aware cache of key entries

use std::time::{Duration, Instant};

use moka::{sync::Cache, Expiry};

use crate::dnssec::KeyEntry;
use crate::rr::{DNSClass, Name};

#[derive(Clone)]
struct CachedEntry {
    entry: KeyEntry,
    valid_until: Instant,
}

/// Expires each entry exactly at its TTL deadline.
struct CachedEntryExpiry;

impl Expiry<(Name, DNSClass), CachedEntry> for CachedEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &(Name, DNSClass),
        value: &CachedEntry,
        created_at: Instant,
    ) -> Option<Duration> {
        Some(value.valid_until.saturating_duration_since(created_at))
    }
}

/// A cache of `KeyEntry` conclusions keyed by zone name and class.
///
/// Entries live until their TTL runs out, measured against monotonic time
/// from the moment of insertion; the cache is additionally bounded in size.
/// Lookups return the entry with the longest name that is equal to or an
/// ancestor of the asked-for name, the shape the key-finding walk needs.
#[derive(Clone)]
pub struct KeyCache {
    cache: Cache<(Name, DNSClass), CachedEntry>,
    max_ttl: Duration,
}

impl KeyCache {
    /// A cache bounded to `capacity` entries, with entry TTLs capped at
    /// `max_ttl`.
    pub fn new(capacity: u64, max_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .expire_after(CachedEntryExpiry)
            .build();
        Self { cache, max_ttl }
    }

    /// Stores an entry under its own name and class, overwriting any
    /// previous conclusion.
    pub fn store(&self, entry: KeyEntry) {
        let ttl = Duration::from_secs(u64::from(entry.ttl())).min(self.max_ttl);
        let key = (entry.name().clone(), entry.dns_class());
        self.cache.insert(
            key,
            CachedEntry {
                entry,
                valid_until: Instant::now() + ttl,
            },
        );
    }

    /// Finds the entry with the longest name equal to or enclosing `name`,
    /// ignoring anything expired.
    pub fn find(&self, name: &Name, dns_class: DNSClass) -> Option<KeyEntry> {
        let now = Instant::now();
        let mut current = name.clone();
        loop {
            if let Some(cached) = self.cache.get(&(current.clone(), dns_class)) {
                if cached.valid_until > now {
                    return Some(cached.entry);
                }
            }
            if current.is_root() {
                return None;
            }
            current = current.base_name();
        }
    }

    /// The smallest key size, in bits, among the cached good entry for
    /// `name` or its closest enclosing zone. Feeds the NSEC3 iteration
    /// policy.
    pub fn smallest_key_bits(&self, name: &Name, dns_class: DNSClass) -> Option<usize> {
        let entry = self.find(name, dns_class)?;
        let rrset = entry.rrset()?;
        rrset
            .records()
            .iter()
            .filter_map(|r| r.data().as_dnskey())
            .map(|k| k.key_len_bits())
            .filter(|bits| *bits > 0)
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dnssec::ValidationErrorKind;

    fn name(s: &str) -> Name {
        Name::from_ascii(s).unwrap()
    }

    #[test]
    fn test_find_walks_to_ancestor() {
        let cache = KeyCache::new(100, Duration::from_secs(900));
        cache.store(KeyEntry::null(name("example.com"), DNSClass::IN, 60));

        let found = cache.find(&name("deep.sub.example.com"), DNSClass::IN).unwrap();
        assert_eq!(found.name(), &name("example.com"));
        assert!(cache.find(&name("example.org"), DNSClass::IN).is_none());
    }

    #[test]
    fn test_deepest_entry_wins() {
        let cache = KeyCache::new(100, Duration::from_secs(900));
        cache.store(KeyEntry::null(name("com"), DNSClass::IN, 60));
        cache.store(KeyEntry::bad(
            name("example.com"),
            DNSClass::IN,
            60,
            ValidationErrorKind::Message("broken"),
        ));

        let found = cache.find(&name("www.example.com"), DNSClass::IN).unwrap();
        assert!(found.is_bad());
        assert_eq!(found.name(), &name("example.com"));
    }

    #[test]
    fn test_expired_entries_are_ignored() {
        let cache = KeyCache::new(100, Duration::from_secs(900));
        cache.store(KeyEntry::null(name("example.com"), DNSClass::IN, 0));

        // a zero TTL entry is expired the moment it lands
        assert!(cache.find(&name("example.com"), DNSClass::IN).is_none());
    }

    #[test]
    fn test_class_is_part_of_the_key() {
        let cache = KeyCache::new(100, Duration::from_secs(900));
        cache.store(KeyEntry::null(name("example.com"), DNSClass::IN, 60));
        assert!(cache.find(&name("example.com"), DNSClass::CH).is_none());
    }
}
