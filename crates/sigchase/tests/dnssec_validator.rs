// Copyright 2015-2023 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! End to end validation against a scripted upstream serving a small
//! Ed25519-signed world: a signed root, `com`, and `example.com`, plus an
//! unsigned `example.org` behind an opt-out span.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use data_encoding::BASE32_DNSSEC;
use futures_util::future::BoxFuture;
use ring::rand::SystemRandom;
use ring::signature::{Ed25519KeyPair, KeyPair};

use sigchase::config::ValidatorConfig;
use sigchase::dnssec::rdata::{DNSKEY, DS, NSEC, NSEC3, RRSIG};
use sigchase::dnssec::tbs::rrset_tbs;
use sigchase::dnssec::{Algorithm, DigestType, Nsec3HashAlgorithm, TrustAnchorStore};
use sigchase::error::{ProtoErrorKind, ProtoResult};
use sigchase::op::{Flags, Message, Query, ResponseCode, Section};
use sigchase::rr::{DNSClass, Name, RData, Record, RecordType, Rrset, SOA};
use sigchase::validator::{Validator, VALIDATION_REASON_QCLASS};
use sigchase::xfer::DnsHandle;

const TTL: u32 = 3600;
const SALT: [u8; 2] = [0x12, 0x34];
const ITERATIONS: u16 = 5;

fn name(s: &str) -> Name {
    Name::from_ascii(s).unwrap()
}

fn now() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as u32
}

/// A zone with its own Ed25519 key.
struct TestZone {
    name: Name,
    keypair: Ed25519KeyPair,
    dnskey: DNSKEY,
}

impl TestZone {
    fn new(apex: &str) -> Self {
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&SystemRandom::new()).unwrap();
        let keypair = Ed25519KeyPair::from_pkcs8(pkcs8.as_ref()).unwrap();
        let dnskey = DNSKEY::new(
            true,
            true,
            false,
            Algorithm::ED25519,
            keypair.public_key().as_ref().to_vec(),
        );
        Self {
            name: name(apex),
            keypair,
            dnskey,
        }
    }

    fn dnskey_record(&self) -> Record {
        Record::from_rdata(self.name.clone(), TTL, RData::DNSKEY(self.dnskey.clone()))
    }

    fn ds_record(&self) -> Record {
        let ds = DS::from_key(&self.name, &self.dnskey, DigestType::SHA256).unwrap();
        Record::from_rdata(self.name.clone(), TTL, RData::DS(ds))
    }

    fn soa_record(&self) -> Record {
        Record::from_rdata(
            self.name.clone(),
            TTL,
            RData::SOA(SOA {
                mname: self.name.prepend_label(b"ns").unwrap(),
                rname: self.name.prepend_label(b"hostmaster").unwrap(),
                serial: 1,
                refresh: 7200,
                retry: 900,
                expire: 1_209_600,
                minimum: TTL,
            }),
        )
    }

    /// Signs the records and returns them together with their RRSIG.
    fn sign(&self, records: Vec<Record>) -> Vec<Record> {
        let labels = records[0].name().num_labels();
        self.sign_expanded(records, labels)
    }

    /// Signs with an explicit labels field, lower than the owner's label
    /// count for wildcard-expanded sets.
    fn sign_expanded(&self, records: Vec<Record>, labels: u8) -> Vec<Record> {
        let owner = records[0].name().clone();
        let record_type = records[0].record_type();
        let ttl = records[0].ttl();
        let build = |sig: Vec<u8>| {
            RRSIG::new(
                record_type,
                Algorithm::ED25519,
                labels,
                ttl,
                now().wrapping_add(7 * 86_400),
                now().wrapping_sub(3_600),
                self.dnskey.calculate_key_tag(),
                self.name.clone(),
                sig,
            )
        };

        let tbs = rrset_tbs(&owner, DNSClass::IN, &build(Vec::new()), &records).unwrap();
        let sig = self.keypair.sign(tbs.as_ref()).as_ref().to_vec();

        let mut out = records;
        out.push(Record::from_rdata(owner, ttl, RData::RRSIG(build(sig))));
        out
    }
}

/// An NSEC3 record of `zone` spanning `owner_hash` to `next_hash`.
fn nsec3_record(
    zone: &TestZone,
    owner_hash: &[u8],
    next_hash: &[u8],
    opt_out: bool,
    types: &[RecordType],
) -> Record {
    let owner = zone
        .name
        .prepend_label(BASE32_DNSSEC.encode(owner_hash).as_bytes())
        .unwrap();
    Record::from_rdata(
        owner,
        TTL,
        RData::NSEC3(NSEC3::new(
            Nsec3HashAlgorithm::SHA1,
            opt_out,
            ITERATIONS,
            SALT.to_vec(),
            next_hash.to_vec(),
            types.to_vec(),
        )),
    )
}

/// One span covering the whole hash circle except its endpoints; enough to
/// cover any name that provably does not exist.
fn covering_everything(zone: &TestZone, opt_out: bool) -> Record {
    nsec3_record(zone, &[0u8; 20], &[0xffu8; 20], opt_out, &[RecordType::A])
}

fn response(query: Query, rcode: ResponseCode) -> Message {
    let mut message = Message::new();
    message.header_mut().set_flag(Flags::QR);
    message.set_response_code(rcode);
    message.add_query(query);
    message
}

/// A scripted upstream: canned responses by (name, type), plus a set of
/// queries that time out.
#[derive(Clone, Default)]
struct MockHandle {
    responses: Arc<HashMap<(Name, RecordType), Message>>,
    timeouts: Arc<HashSet<(Name, RecordType)>>,
}

impl DnsHandle for MockHandle {
    fn send(&self, request: Message) -> BoxFuture<'_, ProtoResult<Message>> {
        let result = (|| {
            let query = request
                .query()
                .cloned()
                .ok_or(ProtoErrorKind::NoQuery)?;
            let key = (query.name().clone(), query.query_type());

            if self.timeouts.contains(&key) {
                return Err(ProtoErrorKind::Timeout.into());
            }

            let mut response = self
                .responses
                .get(&key)
                .cloned()
                .ok_or_else(|| ProtoErrorKind::Msg(format!("unscripted query: {query}")))?;
            response.set_id(request.id());
            Ok(response)
        })();

        Box::pin(async move { result })
    }
}

/// The signed world every test starts from.
struct World {
    root: TestZone,
    com: TestZone,
    example: TestZone,
    responses: HashMap<(Name, RecordType), Message>,
    timeouts: HashSet<(Name, RecordType)>,
}

impl World {
    fn new() -> Self {
        let root = TestZone::new(".");
        let com = TestZone::new("com");
        let example = TestZone::new("example.com");

        let mut world = Self {
            root,
            com,
            example,
            responses: HashMap::new(),
            timeouts: HashSet::new(),
        };

        // the DNSKEY and DS chain from the root to example.com
        world.script_keys();
        world
    }

    fn script_keys(&mut self) {
        let dnskey_response = |zone: &TestZone| {
            let mut m = response(
                Query::query(zone.name.clone(), RecordType::DNSKEY),
                ResponseCode::NoError,
            );
            m.insert_records(Section::Answer, zone.sign(vec![zone.dnskey_record()]));
            m
        };

        self.responses.insert(
            (self.root.name.clone(), RecordType::DNSKEY),
            dnskey_response(&self.root),
        );
        self.responses.insert(
            (self.com.name.clone(), RecordType::DNSKEY),
            dnskey_response(&self.com),
        );
        self.responses.insert(
            (self.example.name.clone(), RecordType::DNSKEY),
            dnskey_response(&self.example),
        );

        let mut com_ds = response(
            Query::query(self.com.name.clone(), RecordType::DS),
            ResponseCode::NoError,
        );
        com_ds.insert_records(Section::Answer, self.root.sign(vec![self.com.ds_record()]));
        self.responses
            .insert((self.com.name.clone(), RecordType::DS), com_ds);

        let mut example_ds = response(
            Query::query(self.example.name.clone(), RecordType::DS),
            ResponseCode::NoError,
        );
        example_ds.insert_records(Section::Answer, self.com.sign(vec![self.example.ds_record()]));
        self.responses
            .insert((self.example.name.clone(), RecordType::DS), example_ds);
    }

    fn script(&mut self, qname: &str, qtype: RecordType, message: Message) {
        self.responses.insert((name(qname), qtype), message);
    }

    fn validator(&self) -> Validator<MockHandle> {
        let handle = MockHandle {
            responses: Arc::new(self.responses.clone()),
            timeouts: Arc::new(self.timeouts.clone()),
        };

        let mut anchors = TrustAnchorStore::new();
        anchors.store(&Rrset::new(self.root.dnskey_record()));

        Validator::with_trust_anchors(handle, Arc::new(anchors), ValidatorConfig::default())
    }
}

fn request(qname: &str, qtype: RecordType) -> Message {
    let mut m = Message::new();
    m.set_id(0x1337);
    m.header_mut().set_flag(Flags::RD);
    m.add_query(Query::query(name(qname), qtype));
    m
}

fn reason_txts(message: &Message) -> Vec<String> {
    message
        .additionals()
        .iter()
        .filter(|set| {
            set.name().is_root()
                && set.dns_class() == DNSClass::from(VALIDATION_REASON_QCLASS)
        })
        .flat_map(|set| set.records())
        .filter_map(|r| r.data().as_txt())
        .flat_map(|txt| txt.txt_data())
        .map(|s| String::from_utf8_lossy(s).to_string())
        .collect()
}

/// A positive answer with a fully valid chain from the root comes back
/// NOERROR with AD set.
#[tokio::test]
async fn test_secure_chain_sets_ad() {
    let mut world = World::new();
    let mut answer = response(
        Query::query(name("www.example.com"), RecordType::A),
        ResponseCode::NoError,
    );
    answer.insert_records(
        Section::Answer,
        world.example.sign(vec![Record::from_rdata(
            name("www.example.com"),
            TTL,
            RData::A([192, 0, 2, 1].into()),
        )]),
    );
    world.script("www.example.com", RecordType::A, answer);

    let validator = world.validator();
    let result = validator
        .send(request("www.example.com", RecordType::A))
        .await
        .unwrap();

    assert_eq!(result.response_code(), ResponseCode::NoError);
    assert!(result.header().flag(Flags::AD));
    assert!(!result.answers().is_empty());
}

/// Running the same validated query twice yields identical outcomes; the
/// second run is served from the key cache.
#[tokio::test]
async fn test_cache_idempotence() {
    let mut world = World::new();
    let mut answer = response(
        Query::query(name("www.example.com"), RecordType::A),
        ResponseCode::NoError,
    );
    answer.insert_records(
        Section::Answer,
        world.example.sign(vec![Record::from_rdata(
            name("www.example.com"),
            TTL,
            RData::A([192, 0, 2, 1].into()),
        )]),
    );
    world.script("www.example.com", RecordType::A, answer);

    let validator = world.validator();
    let first = validator
        .send(request("www.example.com", RecordType::A))
        .await
        .unwrap();
    let second = validator
        .send(request("www.example.com", RecordType::A))
        .await
        .unwrap();

    assert_eq!(first.response_code(), second.response_code());
    assert_eq!(
        first.header().flag(Flags::AD),
        second.header().flag(Flags::AD)
    );
    assert_eq!(first.answers().len(), second.answers().len());
}

/// An empty NOERROR with an NSEC proving the type absent comes back with
/// AD set.
#[tokio::test]
async fn test_nodata_with_nsec_proof() {
    let mut world = World::new();

    let nsec = Record::from_rdata(
        name("example.com"),
        TTL,
        RData::NSEC(NSEC::new(
            name("www.example.com"),
            vec![
                RecordType::A,
                RecordType::SOA,
                RecordType::NS,
                RecordType::DNSKEY,
                RecordType::NSEC,
                RecordType::RRSIG,
            ],
        )),
    );

    let mut nodata = response(
        Query::query(name("example.com"), RecordType::MX),
        ResponseCode::NoError,
    );
    let mut authority = world.example.sign(vec![world.example.soa_record()]);
    authority.extend(world.example.sign(vec![nsec]));
    nodata.insert_records(Section::NameServer, authority);
    world.script("example.com", RecordType::MX, nodata);

    let validator = world.validator();
    let result = validator
        .send(request("example.com", RecordType::MX))
        .await
        .unwrap();

    assert_eq!(result.response_code(), ResponseCode::NoError);
    assert!(result.answers().is_empty());
    assert!(result.header().flag(Flags::AD));
}

/// An NXDOMAIN with an NSEC3 closest encloser proof comes back with AD
/// set and its rcode preserved.
#[tokio::test]
async fn test_nxdomain_with_nsec3_proof() {
    let mut world = World::new();

    let spans = vec![covering_everything(&world.example, false)];
    let mut nxdomain = response(
        Query::query(name("nonexistent.example.com"), RecordType::A),
        ResponseCode::NXDomain,
    );
    let mut authority = world.example.sign(vec![world.example.soa_record()]);
    for span in spans {
        authority.extend(world.example.sign(vec![span]));
    }
    nxdomain.insert_records(Section::NameServer, authority);
    world.script("nonexistent.example.com", RecordType::A, nxdomain);

    let validator = world.validator();
    let result = validator
        .send(request("nonexistent.example.com", RecordType::A))
        .await
        .unwrap();

    assert_eq!(result.response_code(), ResponseCode::NXDomain);
    assert!(result.header().flag(Flags::AD));
}

/// An unsigned answer behind an opt-out span at the parent passes through
/// unchanged with AD clear.
#[tokio::test]
async fn test_insecure_delegation_passes_through() {
    let mut world = World::new();

    // the unsigned answer itself
    let mut answer = response(
        Query::query(name("www.example.org"), RecordType::A),
        ResponseCode::NoError,
    );
    answer.insert_records(
        Section::Answer,
        vec![Record::from_rdata(
            name("www.example.org"),
            TTL,
            RData::A([198, 51, 100, 7].into()),
        )],
    );
    world.script("www.example.org", RecordType::A, answer);

    // the root answers the org DS query with an opt-out span
    let mut org_ds = response(
        Query::query(name("org"), RecordType::DS),
        ResponseCode::NoError,
    );
    let mut authority = world.root.sign(vec![world.root.soa_record()]);
    authority.extend(world.root.sign(vec![covering_everything(&world.root, true)]));
    org_ds.insert_records(Section::NameServer, authority);
    world.script("org", RecordType::DS, org_ds);

    let validator = world.validator();
    let result = validator
        .send(request("www.example.org", RecordType::A))
        .await
        .unwrap();

    assert_eq!(result.response_code(), ResponseCode::NoError);
    assert!(!result.header().flag(Flags::AD));
    assert_eq!(result.answers().len(), 1);
}

/// A corrupted signature turns the response into SERVFAIL, with the
/// reason attached as TXT at the root under the reserved class.
#[tokio::test]
async fn test_corrupted_signature_is_servfail_with_reason() {
    let mut world = World::new();

    let mut records = world.example.sign(vec![Record::from_rdata(
        name("www.example.com"),
        TTL,
        RData::A([192, 0, 2, 1].into()),
    )]);
    // flip a byte inside the signature
    let rrsig_record = records.pop().unwrap();
    let rrsig = rrsig_record.data().as_rrsig().unwrap();
    let mut sig = rrsig.sig().to_vec();
    sig[10] = !sig[10];
    records.push(Record::from_rdata(
        rrsig_record.name().clone(),
        rrsig_record.ttl(),
        RData::RRSIG(RRSIG::new(
            rrsig.type_covered(),
            rrsig.algorithm(),
            rrsig.num_labels(),
            rrsig.original_ttl(),
            rrsig.sig_expiration(),
            rrsig.sig_inception(),
            rrsig.key_tag(),
            rrsig.signer_name().clone(),
            sig,
        )),
    ));

    let mut answer = response(
        Query::query(name("www.example.com"), RecordType::A),
        ResponseCode::NoError,
    );
    answer.insert_records(Section::Answer, records);
    world.script("www.example.com", RecordType::A, answer);

    let validator = world.validator();
    let result = validator
        .send(request("www.example.com", RecordType::A))
        .await
        .unwrap();

    assert_eq!(result.response_code(), ResponseCode::ServFail);
    assert!(!result.header().flag(Flags::AD));

    let reasons = reason_txts(&result);
    assert!(!reasons.is_empty(), "expected a reason TXT record");
}

/// A wildcard-expanded answer with the NSEC3 proof of the expansion comes
/// back with AD set.
#[tokio::test]
async fn test_wildcard_expansion_with_nsec3_proof() {
    let mut world = World::new();

    // signed as *.wc.example.com (3 labels), expanded for x.wc.example.com
    let expanded = world.example.sign_expanded(
        vec![Record::from_rdata(
            name("x.wc.example.com"),
            TTL,
            RData::A([192, 0, 2, 8].into()),
        )],
        3,
    );

    let mut answer = response(
        Query::query(name("x.wc.example.com"), RecordType::A),
        ResponseCode::NoError,
    );
    answer.insert_records(Section::Answer, expanded);
    let authority = world
        .example
        .sign(vec![covering_everything(&world.example, false)]);
    answer.insert_records(Section::NameServer, authority);
    world.script("x.wc.example.com", RecordType::A, answer);

    let validator = world.validator();
    let result = validator
        .send(request("x.wc.example.com", RecordType::A))
        .await
        .unwrap();

    assert_eq!(result.response_code(), ResponseCode::NoError);
    assert!(result.header().flag(Flags::AD));
}

/// A checking-disabled query is passed through without validation, AD
/// cleared.
#[tokio::test]
async fn test_cd_flag_passes_through() {
    let mut world = World::new();

    // an unsigned answer that would never validate
    let mut answer = response(
        Query::query(name("www.example.com"), RecordType::A),
        ResponseCode::NoError,
    );
    answer.insert_records(
        Section::Answer,
        vec![Record::from_rdata(
            name("www.example.com"),
            TTL,
            RData::A([192, 0, 2, 1].into()),
        )],
    );
    answer.header_mut().set_flag(Flags::AD);
    world.script("www.example.com", RecordType::A, answer);

    let mut req = request("www.example.com", RecordType::A);
    req.header_mut().set_flag(Flags::CD);

    let validator = world.validator();
    let result = validator.send(req).await.unwrap();

    assert_eq!(result.response_code(), ResponseCode::NoError);
    assert!(!result.header().flag(Flags::AD));
    assert_eq!(result.answers().len(), 1);
}

/// Positive RRSIG answers bypass validation, signatures over signatures
/// are undefined.
#[tokio::test]
async fn test_rrsig_query_bypasses_validation() {
    let mut world = World::new();

    let signed = world.example.sign(vec![Record::from_rdata(
        name("www.example.com"),
        TTL,
        RData::A([192, 0, 2, 1].into()),
    )]);
    let rrsig_only: Vec<Record> = signed
        .into_iter()
        .filter(|r| r.record_type() == RecordType::RRSIG)
        .collect();

    let mut answer = response(
        Query::query(name("www.example.com"), RecordType::RRSIG),
        ResponseCode::NoError,
    );
    answer.insert_records(Section::Answer, rrsig_only);
    world.script("www.example.com", RecordType::RRSIG, answer);

    let validator = world.validator();
    let result = validator
        .send(request("www.example.com", RecordType::RRSIG))
        .await
        .unwrap();

    assert_eq!(result.response_code(), ResponseCode::NoError);
    assert!(!result.header().flag(Flags::AD));
}

/// A timeout on a chain subquery aborts the whole validation as SERVFAIL,
/// without a reason record.
#[tokio::test]
async fn test_subquery_timeout_is_servfail() {
    let mut world = World::new();

    let mut answer = response(
        Query::query(name("www.example.com"), RecordType::A),
        ResponseCode::NoError,
    );
    answer.insert_records(
        Section::Answer,
        world.example.sign(vec![Record::from_rdata(
            name("www.example.com"),
            TTL,
            RData::A([192, 0, 2, 1].into()),
        )]),
    );
    world.script("www.example.com", RecordType::A, answer);
    world.timeouts.insert((name("com"), RecordType::DS));

    let validator = world.validator();
    let result = validator
        .send(request("www.example.com", RecordType::A))
        .await
        .unwrap();

    assert_eq!(result.response_code(), ResponseCode::ServFail);
    assert!(reason_txts(&result).is_empty());
}

/// A delegation to a zone whose DS RRset only lists unsupported
/// algorithms is insecure, not bogus.
#[tokio::test]
async fn test_unsupported_ds_algorithms_are_insecure() {
    let mut world = World::new();

    let bogus_ds = Record::from_rdata(
        name("example.com"),
        TTL,
        RData::DS(DS::new(
            4711,
            Algorithm::Unknown(200),
            DigestType::SHA256,
            vec![0u8; 32],
        )),
    );
    let mut ds_response = response(
        Query::query(name("example.com"), RecordType::DS),
        ResponseCode::NoError,
    );
    ds_response.insert_records(Section::Answer, world.com.sign(vec![bogus_ds]));
    world.script("example.com", RecordType::DS, ds_response);

    let mut answer = response(
        Query::query(name("www.example.com"), RecordType::A),
        ResponseCode::NoError,
    );
    answer.insert_records(
        Section::Answer,
        world.example.sign(vec![Record::from_rdata(
            name("www.example.com"),
            TTL,
            RData::A([192, 0, 2, 1].into()),
        )]),
    );
    world.script("www.example.com", RecordType::A, answer);

    let validator = world.validator();
    let result = validator
        .send(request("www.example.com", RecordType::A))
        .await
        .unwrap();

    // internally insecure: the answer survives with AD clear
    assert_eq!(result.response_code(), ResponseCode::NoError);
    assert!(!result.header().flag(Flags::AD));
}
