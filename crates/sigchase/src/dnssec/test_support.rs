// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Ed25519-signed fixtures for the unit tests of the crate

use ring::rand::SystemRandom;
use ring::signature::{Ed25519KeyPair, KeyPair};

use crate::dnssec::rdata::{DNSKEY, DS, RRSIG};
use crate::dnssec::tbs::rrset_tbs;
use crate::dnssec::{Algorithm, DigestType, SecurityStatus};
use crate::rr::{DNSClass, Name, RData, Record, Rrset};

pub(crate) const TEST_TTL: u32 = 300;

/// A zone with a freshly generated Ed25519 key that can sign record sets.
pub(crate) struct SignedZone {
    name: Name,
    keypair: Ed25519KeyPair,
    dnskey: DNSKEY,
    dnskey_rrset: Rrset,
    self_signed_dnskey_rrset: Rrset,
}

impl SignedZone {
    pub(crate) fn new(name: Name) -> Self {
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&SystemRandom::new()).unwrap();
        let keypair = Ed25519KeyPair::from_pkcs8(pkcs8.as_ref()).unwrap();
        let dnskey = DNSKEY::new(
            true,
            true,
            false,
            Algorithm::ED25519,
            keypair.public_key().as_ref().to_vec(),
        );

        let dnskey_record =
            Record::from_rdata(name.clone(), TEST_TTL, RData::DNSKEY(dnskey.clone()));
        let mut dnskey_rrset = Rrset::new(dnskey_record);
        dnskey_rrset.set_security_status(SecurityStatus::Secure);

        let mut this = Self {
            name,
            keypair,
            dnskey,
            self_signed_dnskey_rrset: dnskey_rrset.clone(),
            dnskey_rrset,
        };
        this.self_signed_dnskey_rrset = this.sign(this.dnskey_rrset.records().to_vec());
        this
    }

    pub(crate) fn name(&self) -> &Name {
        &self.name
    }

    /// The DNSKEY rrset without its signature, for use as trusted keys
    pub(crate) fn dnskey_rrset(&self) -> &Rrset {
        &self.dnskey_rrset
    }

    /// The DNSKEY rrset signed by itself, as a keys response would carry it
    pub(crate) fn self_signed_dnskey_rrset(&self) -> &Rrset {
        &self.self_signed_dnskey_rrset
    }

    /// The DS record for this zone's key, to be signed into the parent
    pub(crate) fn ds_record(&self) -> Record {
        let ds = DS::from_key(&self.name, &self.dnskey, DigestType::SHA256).unwrap();
        Record::from_rdata(self.name.clone(), TEST_TTL, RData::DS(ds))
    }

    /// Signs the records into an RRset, with the labels field matching the
    /// owner (no wildcard expansion).
    pub(crate) fn sign(&self, records: Vec<Record>) -> Rrset {
        let labels = records[0].name().num_labels();
        self.sign_expanded(records, labels)
    }

    /// Signs the records with an explicit labels field, lower than the
    /// owner's label count for wildcard-expanded sets.
    pub(crate) fn sign_expanded(&self, records: Vec<Record>, labels: u8) -> Rrset {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs() as u32;

        let owner = records[0].name().clone();
        let record_type = records[0].record_type();
        let ttl = records[0].ttl();

        let mut rrsig = RRSIG::new(
            record_type,
            Algorithm::ED25519,
            labels,
            ttl,
            now.wrapping_add(7 * 86_400),
            now.wrapping_sub(3_600),
            self.dnskey.calculate_key_tag(),
            self.name.clone(),
            Vec::new(),
        );

        let tbs = rrset_tbs(&owner, DNSClass::IN, &rrsig, &records).unwrap();
        let sig = self.keypair.sign(tbs.as_ref()).as_ref().to_vec();
        rrsig = RRSIG::new(
            record_type,
            Algorithm::ED25519,
            labels,
            ttl,
            now.wrapping_add(7 * 86_400),
            now.wrapping_sub(3_600),
            self.dnskey.calculate_key_tag(),
            self.name.clone(),
            sig,
        );

        let mut set = Rrset::new(records[0].clone());
        for record in records.into_iter().skip(1) {
            set.add(record);
        }
        set.add(Record::from_rdata(owner, ttl, RData::RRSIG(rrsig)));
        set
    }

    /// Flips a byte in the first signature of the set.
    pub(crate) fn corrupt_signature(&self, rrset: &mut Rrset) {
        let records = rrset.records().to_vec();
        let rrsigs = rrset.rrsigs().to_vec();

        let mut rebuilt = Rrset::new(records[0].clone());
        for record in records.into_iter().skip(1) {
            rebuilt.add(record);
        }
        for (i, sig_record) in rrsigs.into_iter().enumerate() {
            if i == 0 {
                let rrsig = sig_record.data().as_rrsig().unwrap();
                let mut sig = rrsig.sig().to_vec();
                sig[10] = !sig[10];
                let corrupted = RRSIG::new(
                    rrsig.type_covered(),
                    rrsig.algorithm(),
                    rrsig.num_labels(),
                    rrsig.original_ttl(),
                    rrsig.sig_expiration(),
                    rrsig.sig_inception(),
                    rrsig.key_tag(),
                    rrsig.signer_name().clone(),
                    sig,
                );
                rebuilt.add(Record::from_rdata(
                    sig_record.name().clone(),
                    sig_record.ttl(),
                    RData::RRSIG(corrupted),
                ));
            } else {
                rebuilt.add(sig_record);
            }
        }

        *rrset = rebuilt;
    }
}
