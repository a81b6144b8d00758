// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! RRSIG verification: pairing signatures with the keys that may have made
//! them and calling into the crypto to check them.

use ring::signature::{
    self, RsaPublicKeyComponents, UnparsedPublicKey, ECDSA_P256_SHA256_FIXED,
    ECDSA_P384_SHA384_FIXED, ED25519,
};
use tracing::{debug, trace, warn};

use crate::dnssec::rdata::{DNSKEY, RRSIG};
use crate::dnssec::tbs::rrset_tbs;
use crate::dnssec::{Algorithm, KeyEntry, SecurityStatus, ValidationError, ValidationErrorKind};
use crate::error::{ProtoError, ProtoResult};
use crate::rr::{Name, Rrset};

/// The maximum number of key tag collisions to accept when pairing DS
/// records or RRSIGs with DNSKEYs. Any colliding records encountered beyond
/// this limit are discarded, bounding the work one response can cause.
pub(crate) const MAX_KEY_TAG_COLLISIONS: usize = 2;

/// The maximum number of RRSIGs to attempt to validate for each RRSET.
pub(crate) const MAX_RRSIGS_PER_RRSET: usize = 8;

/// RFC 1982 serial number arithmetic over the 32 bit RRSIG timestamps
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct SerialNumber(u32);

impl SerialNumber {
    fn le(self, other: Self) -> bool {
        self == other || (other.0.wrapping_sub(self.0) as i32) > 0
    }
}

/// Verifies an RRset against a DNSKEY RRset at the signer's apex.
///
/// Every RRSIG of the set is tried against every DNSKEY whose algorithm,
/// key tag and owner match it; the first cryptographic success makes the
/// set `Secure`. Signatures outside their validity window and unknown
/// algorithms are failed matches, never hard errors.
pub fn verify_rrset(rrset: &Rrset, keys: &Rrset, now: u32) -> Result<(), ValidationError> {
    if rrset.rrsigs().is_empty() {
        return Err(ValidationError::bogus(
            ValidationErrorKind::RrsigsNotPresent {
                name: rrset.name().clone(),
                record_type: rrset.record_type(),
            },
        ));
    }

    for (i, sig_record) in rrset.rrsigs().iter().enumerate() {
        if i >= MAX_RRSIGS_PER_RRSET {
            warn!("too many RRSIGs for rrset {}; skipping the rest", rrset.name());
            break;
        }

        let Some(rrsig) = sig_record.data().as_rrsig() else {
            continue;
        };

        if let Err(e) = check_rrsig_validity(rrsig, rrset, now) {
            trace!("skipping rrsig for {}: {e}", rrset.name());
            continue;
        }

        if keys.name() != rrsig.signer_name() {
            trace!(
                "skipping rrsig for {}: signer {} is not the key owner {}",
                rrset.name(),
                rrsig.signer_name(),
                keys.name()
            );
            continue;
        }

        if verify_rrsig_with_keys(rrset, rrsig, keys).is_ok() {
            debug!(
                "validated ({}, {:?}) with key {}",
                rrset.name(),
                rrset.record_type(),
                keys.name()
            );
            return Ok(());
        }
    }

    Err(ValidationError::bogus(
        ValidationErrorKind::RrsigsUnverified {
            name: rrset.name().clone(),
            record_type: rrset.record_type(),
        },
    ))
}

/// Verifies the RRset and records the outcome on it, returning the status.
pub fn verify_srrset(rrset: &mut Rrset, keys: &Rrset, now: u32) -> SecurityStatus {
    match verify_rrset(rrset, keys, now) {
        Ok(()) => {
            rrset.set_security_status(SecurityStatus::Secure);
            SecurityStatus::Secure
        }
        Err(e) => {
            debug!("failed to verify ({}, {:?}): {e}", rrset.name(), rrset.record_type());
            rrset.set_security_status(SecurityStatus::Bogus);
            SecurityStatus::Bogus
        }
    }
}

/// Detects a wildcard expansion from the RRSIG labels field.
///
/// Returns the wildcard (`*.<closest encloser>`) the RRset was expanded
/// from, or `None` when it was not expanded.
pub fn rrset_wildcard(rrset: &Rrset) -> Result<Option<Name>, ValidationError> {
    let Some(rrsig) = rrset
        .rrsigs()
        .first()
        .and_then(|record| record.data().as_rrsig())
    else {
        return Ok(None);
    };

    let owner_labels = rrset.name().num_labels();
    let sig_labels = rrsig.num_labels();

    match sig_labels.cmp(&owner_labels) {
        std::cmp::Ordering::Equal => Ok(None),
        std::cmp::Ordering::Less => rrset
            .name()
            .trim_to(usize::from(sig_labels))
            .prepend_label(b"*")
            .map(Some)
            .map_err(|_| ValidationError::bogus(ValidationErrorKind::WildcardGeneration)),
        std::cmp::Ordering::Greater => Err(ValidationError::bogus(ValidationErrorKind::Msg(
            format!("rrsig labels exceed owner name labels for {}", rrset.name()),
        ))),
    }
}

/// Validates a freshly fetched DNSKEY RRset against the already validated
/// DS RRset from the parent zone.
///
/// At least one DS digest must match a DNSKEY (over the canonical wire
/// form), and that DNSKEY must have signed the DNSKEY RRset itself. A DS
/// set listing only unsupported algorithms yields a `Null` entry, ending
/// secure space.
pub fn verify_new_dnskeys(
    dnskey_rrset: &Rrset,
    ds_rrset: &Rrset,
    bad_key_ttl: u32,
    now: u32,
) -> KeyEntry {
    let name = dnskey_rrset.name().clone();
    let dns_class = dnskey_rrset.dns_class();

    let mut has_supported_ds = false;
    for ds_record in ds_rrset.records() {
        let Some(ds) = ds_record.data().as_ds() else {
            continue;
        };
        if !ds.algorithm().is_supported() || !ds.digest_type().is_supported() {
            trace!("skipping DS with unsupported algorithms for {name}");
            continue;
        }
        has_supported_ds = true;

        let mut collisions = 0;
        for key_record in dnskey_rrset.records() {
            let Some(dnskey) = key_record.data().as_dnskey() else {
                continue;
            };
            if dnskey.algorithm() != ds.algorithm() || dnskey.calculate_key_tag() != ds.key_tag() {
                continue;
            }

            collisions += 1;
            if collisions > MAX_KEY_TAG_COLLISIONS {
                warn!(
                    key_tag = ds.key_tag(),
                    "too many DNSKEYs with the same key tag; skipping"
                );
                break;
            }

            if !ds.covers(&name, dnskey).unwrap_or(false) {
                continue;
            }

            // the anchored key must also have signed the key set itself
            if verify_rrset_with_one_key(dnskey_rrset, dnskey, now).is_ok() {
                debug!("DNSKEY rrset validated against DS for {name}");
                let mut rrset = dnskey_rrset.clone();
                rrset.set_security_status(SecurityStatus::Secure);
                return KeyEntry::good(rrset);
            }
        }
    }

    if !has_supported_ds {
        return KeyEntry::null(name.clone(), dns_class, ds_rrset.ttl())
            .with_reason(ValidationErrorKind::DsUnsupportedAlgorithms { name });
    }

    trace!("bogus dnskey: {name}");
    KeyEntry::bad(
        name.clone(),
        dns_class,
        bad_key_ttl,
        ValidationErrorKind::DnskeyInvalid { name },
    )
}

/// Verifies one RRset against exactly one DNSKEY, used while a key is being
/// introduced and the full key set is not yet trusted.
fn verify_rrset_with_one_key(
    rrset: &Rrset,
    dnskey: &DNSKEY,
    now: u32,
) -> Result<(), ValidationError> {
    let key_tag = dnskey.calculate_key_tag();
    for (i, sig_record) in rrset.rrsigs().iter().enumerate() {
        if i >= MAX_RRSIGS_PER_RRSET {
            break;
        }
        let Some(rrsig) = sig_record.data().as_rrsig() else {
            continue;
        };
        if rrsig.algorithm() != dnskey.algorithm() || rrsig.key_tag() != key_tag {
            continue;
        }
        if rrsig.signer_name() != rrset.name() {
            continue;
        }
        if check_rrsig_validity(rrsig, rrset, now).is_err() {
            continue;
        }
        if verify_one(rrset, rrsig, dnskey).is_ok() {
            return Ok(());
        }
    }

    Err(ValidationError::bogus(
        ValidationErrorKind::RrsigsUnverified {
            name: rrset.name().clone(),
            record_type: rrset.record_type(),
        },
    ))
}

fn verify_rrsig_with_keys(rrset: &Rrset, rrsig: &RRSIG, keys: &Rrset) -> Result<(), ProtoError> {
    let mut collisions = 0;
    for key_record in keys.records() {
        let Some(dnskey) = key_record.data().as_dnskey() else {
            continue;
        };
        if !dnskey.zone_key() || dnskey.revoke() {
            continue;
        }
        if dnskey.algorithm() != rrsig.algorithm() {
            continue;
        }
        if dnskey.calculate_key_tag() != rrsig.key_tag() {
            continue;
        }

        collisions += 1;
        if collisions > MAX_KEY_TAG_COLLISIONS {
            warn!(
                key_tag = rrsig.key_tag(),
                "too many DNSKEYs with the same key tag; skipping"
            );
            break;
        }

        if verify_one(rrset, rrsig, dnskey).is_ok() {
            return Ok(());
        }
    }

    Err(ProtoError::from("no dnskey matched the rrsig"))
}

fn verify_one(rrset: &Rrset, rrsig: &RRSIG, dnskey: &DNSKEY) -> ProtoResult<()> {
    let tbs = rrset_tbs(rrset.name(), rrset.dns_class(), rrsig, rrset.records())?;
    verify_signature(
        dnskey.algorithm(),
        dnskey.public_key(),
        tbs.as_ref(),
        rrsig.sig(),
    )
}

/// RFC 4035, section 5.3.1 checks that do not need the key material
fn check_rrsig_validity(rrsig: &RRSIG, rrset: &Rrset, now: u32) -> Result<(), ValidationError> {
    if rrsig.type_covered() != rrset.record_type() {
        return Err(ValidationError::bogus(ValidationErrorKind::Message(
            "rrsig does not cover the rrset type",
        )));
    }

    if rrsig.num_labels() > rrset.name().num_labels() {
        return Err(ValidationError::bogus(ValidationErrorKind::Message(
            "rrsig labels exceed owner name labels",
        )));
    }

    // RFC 4034, section 3.1.5: all timestamp comparisons use serial number
    // arithmetic
    let now = SerialNumber(now);
    if !(SerialNumber(rrsig.sig_inception()).le(now)
        && now.le(SerialNumber(rrsig.sig_expiration())))
    {
        return Err(ValidationError::bogus(ValidationErrorKind::Message(
            "rrsig is outside its validity window",
        )));
    }

    if !rrsig.signer_name().zone_of(rrset.name()) {
        return Err(ValidationError::bogus(ValidationErrorKind::Message(
            "rrsig signer is not an ancestor of the owner",
        )));
    }

    Ok(())
}

/// DNSKEY wire encoding of an RSA public key: a one (or three) octet
/// exponent length, the exponent, then the modulus.
fn parse_rsa_public_key(key: &[u8]) -> ProtoResult<(&[u8], &[u8])> {
    let (exp_len, offset) = match key.first() {
        Some(0) if key.len() >= 3 => (usize::from(u16::from_be_bytes([key[1], key[2]])), 3),
        Some(&len) if len > 0 => (usize::from(len), 1),
        _ => return Err(ProtoError::from("invalid RSA public key")),
    };

    if key.len() < offset + exp_len + 1 {
        return Err(ProtoError::from("invalid RSA public key"));
    }

    Ok((&key[offset..offset + exp_len], &key[offset + exp_len..]))
}

/// Dispatches one signature verification to ring.
fn verify_signature(
    algorithm: Algorithm,
    public_key: &[u8],
    message: &[u8],
    sig: &[u8],
) -> ProtoResult<()> {
    match algorithm {
        Algorithm::RSASHA256 | Algorithm::RSASHA512 => {
            let params = match algorithm {
                Algorithm::RSASHA256 => &signature::RSA_PKCS1_1024_8192_SHA256_FOR_LEGACY_USE_ONLY,
                _ => &signature::RSA_PKCS1_1024_8192_SHA512_FOR_LEGACY_USE_ONLY,
            };
            let (e, n) = parse_rsa_public_key(public_key)?;
            RsaPublicKeyComponents { n, e }
                .verify(params, message, sig)
                .map_err(|_| ProtoError::from("RSA signature verification failed"))
        }
        Algorithm::ECDSAP256SHA256 | Algorithm::ECDSAP384SHA384 => {
            let params = match algorithm {
                Algorithm::ECDSAP256SHA256 => &ECDSA_P256_SHA256_FIXED,
                _ => &ECDSA_P384_SHA384_FIXED,
            };
            // DNSKEY stores the raw point; ring expects the uncompressed
            // form with the 0x04 prefix
            let mut uncompressed = Vec::with_capacity(public_key.len() + 1);
            uncompressed.push(0x04);
            uncompressed.extend_from_slice(public_key);
            UnparsedPublicKey::new(params, uncompressed)
                .verify(message, sig)
                .map_err(|_| ProtoError::from("ECDSA signature verification failed"))
        }
        Algorithm::ED25519 => UnparsedPublicKey::new(&ED25519, public_key)
            .verify(message, sig)
            .map_err(|_| ProtoError::from("Ed25519 signature verification failed")),
        _ => Err(ProtoError::from("unsupported signature algorithm")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dnssec::test_support::{SignedZone, TEST_TTL};
    use crate::rr::{Name, RData, Record};

    fn name(s: &str) -> Name {
        Name::from_ascii(s).unwrap()
    }

    fn now() -> u32 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs() as u32
    }

    #[test]
    fn test_verify_ed25519_round_trip() {
        let zone = SignedZone::new(name("example.com"));
        let rrset = zone.sign(vec![Record::from_rdata(
            name("www.example.com"),
            TEST_TTL,
            RData::A([192, 0, 2, 1].into()),
        )]);

        assert!(verify_rrset(&rrset, zone.dnskey_rrset(), now()).is_ok());
    }

    #[test]
    fn test_corrupted_signature_is_bogus() {
        let zone = SignedZone::new(name("example.com"));
        let mut rrset = zone.sign(vec![Record::from_rdata(
            name("www.example.com"),
            TEST_TTL,
            RData::A([192, 0, 2, 1].into()),
        )]);
        zone.corrupt_signature(&mut rrset);

        let err = verify_rrset(&rrset, zone.dnskey_rrset(), now()).unwrap_err();
        assert!(err.status().is_bogus());
    }

    #[test]
    fn test_expired_signature_is_bogus() {
        let zone = SignedZone::new(name("example.com"));
        let rrset = zone.sign(vec![Record::from_rdata(
            name("www.example.com"),
            TEST_TTL,
            RData::A([192, 0, 2, 1].into()),
        )]);

        // a clock far in the future is outside the validity window
        let err = verify_rrset(&rrset, zone.dnskey_rrset(), now().wrapping_add(30_000_000));
        assert!(err.is_err());
    }

    #[test]
    fn test_unsigned_rrset_is_bogus() {
        let zone = SignedZone::new(name("example.com"));
        let rrset = Rrset::new(Record::from_rdata(
            name("www.example.com"),
            TEST_TTL,
            RData::A([192, 0, 2, 1].into()),
        ));

        let err = verify_rrset(&rrset, zone.dnskey_rrset(), now()).unwrap_err();
        assert!(matches!(
            err.kind(),
            ValidationErrorKind::RrsigsNotPresent { .. }
        ));
    }

    #[test]
    fn test_wildcard_expansion_detected() {
        let zone = SignedZone::new(name("example.com"));
        // signed as *.wc.example.com (2 labels below the zone, 3 total),
        // expanded to x.wc.example.com
        let rrset = zone.sign_expanded(
            vec![Record::from_rdata(
                name("x.wc.example.com"),
                TEST_TTL,
                RData::A([192, 0, 2, 1].into()),
            )],
            3,
        );

        assert_eq!(
            rrset_wildcard(&rrset).unwrap(),
            Some(name("*.wc.example.com"))
        );
        assert!(verify_rrset(&rrset, zone.dnskey_rrset(), now()).is_ok());
    }

    #[test]
    fn test_verify_new_dnskeys() {
        let zone = SignedZone::new(name("example.com"));
        let parent = SignedZone::new(name("com"));
        let ds_rrset = parent.sign(vec![zone.ds_record()]);

        let entry = verify_new_dnskeys(zone.self_signed_dnskey_rrset(), &ds_rrset, 60, now());
        assert!(entry.is_good());

        // a DS set pointing at a different key yields a bad entry
        let other = SignedZone::new(name("example.com"));
        let wrong_ds = parent.sign(vec![other.ds_record()]);
        let entry = verify_new_dnskeys(zone.self_signed_dnskey_rrset(), &wrong_ds, 60, now());
        assert!(entry.is_bad());
    }

    #[test]
    fn test_parse_rsa_public_key() {
        let key = [3u8, 1, 0, 1, 0xde, 0xad, 0xbe, 0xef];
        let (e, n) = parse_rsa_public_key(&key).unwrap();
        assert_eq!(e, &[1, 0, 1]);
        assert_eq!(n, &[0xde, 0xad, 0xbe, 0xef]);

        assert!(parse_rsa_public_key(&[]).is_err());
    }
}
